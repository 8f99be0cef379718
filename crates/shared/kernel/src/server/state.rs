use axum::extract::FromRef;
use beacon_domain::config::ApiConfig;
use beacon_hub::Hub;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

#[beacon_derive::beacon_error]
pub enum ApiStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[derive(Debug)]
pub struct ApiStateInner {
    pub config: ApiConfig,
    pub hub: Hub,
}

/// State shared by the kernel handlers. Cheap to clone.
///
/// Feature slices keep their own state; an application combines them with
/// this one in its router state.
#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<ApiState> for ApiConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<ApiState> for Hub {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.hub.clone()
    }
}

#[derive(Debug, Default)]
pub struct ApiStateBuilder {
    config: Option<ApiConfig>,
    hub: Option<Hub>,
}

impl ApiStateBuilder {
    #[must_use]
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn hub(mut self, hub: Hub) -> Self {
        self.hub = Some(hub);
        self
    }

    /// # Errors
    /// Returns [`ApiStateError::Validation`] when the hub is missing.
    pub fn build(self) -> Result<ApiState, ApiStateError> {
        let hub = self.hub.ok_or_else(|| ApiStateError::Validation {
            message: "Hub not provided".into(),
            context: None,
        })?;

        Ok(ApiState {
            inner: Arc::new(ApiStateInner { config: self.config.unwrap_or_default(), hub }),
        })
    }
}
