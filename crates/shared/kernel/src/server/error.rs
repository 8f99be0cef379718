use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use beacon_derive::api_model;
use beacon_hub::HubError;
use std::borrow::Cow;

#[beacon_derive::beacon_error]
pub enum ApiError {
    #[error("Broadcast hub error{}: {source}", format_context(.context))]
    Hub { source: HubError, context: Option<Cow<'static, str>> },

    #[error("Bad request{}: {message}", format_context(.context))]
    BadRequest { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal server error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Error payload of the kernel endpoints.
#[api_model]
pub struct ApiErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Hub { source: HubError::Closed { .. } | HubError::ChannelFull { .. }, .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            },
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Hub { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::warn!(error = %self, "Request failed");
        }
        (status, Json(ApiErrorBody { error: self.to_string() })).into_response()
    }
}
