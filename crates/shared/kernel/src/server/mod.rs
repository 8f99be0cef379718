mod error;
mod events;
mod health;
mod router;
mod state;

pub use error::{ApiError, ApiErrorBody, ApiErrorExt};
pub use events::{DeliveryResponse, PublishQuery, hub_config, sse_frame};
pub use router::{events_router, system_router};
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateInner};
