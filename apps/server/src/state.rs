use axum::extract::FromRef;
use beacon_hub::Hub;
use beacon_jobs::JobTracker;
use beacon_kernel::domain::config::ApiConfig;
use beacon_kernel::server::ApiState;

/// Router state of the server: the kernel state plus the state of each feature slice.
#[derive(Debug, Clone)]
pub struct AppState {
    pub api: ApiState,
    pub jobs: JobTracker,
}

impl FromRef<AppState> for ApiConfig {
    fn from_ref(state: &AppState) -> Self {
        state.api.config.clone()
    }
}

impl FromRef<AppState> for Hub {
    fn from_ref(state: &AppState) -> Self {
        state.api.hub.clone()
    }
}

impl FromRef<AppState> for JobTracker {
    fn from_ref(state: &AppState) -> Self {
        state.jobs.clone()
    }
}
