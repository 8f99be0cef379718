use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything `beacon-server` reads from its config file and environment.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub hub: HubSettings,
    pub jobs: JobsConfig,
    pub producer: ProducerConfig,
    pub log: LogConfig,
}

/// Arc-wrapped config, cheap to clone into handlers and background tasks.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    /// How long in-flight requests get to finish after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

/// Sizing of the broadcast hub and its SSE streams.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    pub subscriber_capacity: usize,
    pub publish_capacity: usize,
    pub overflow: OverflowMode,
    /// Interval of SSE keep-alive comments; `0` disables them.
    pub keep_alive_secs: u64,
}

/// Config-file spelling of the hub overflow policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowMode {
    #[default]
    Drop,
    Disconnect,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Progress added per step, in percent.
    pub step: u8,
    pub step_interval_ms: u64,
    /// Publish every progress change to the hub as a `job` event.
    pub publish_progress: bool,
    /// Upper bound for `GET /jobs/{id}/wait`.
    pub max_wait_secs: u64,
    /// How long a finished or cancelled job stays queryable.
    pub retain_secs: u64,
}

/// The clock producer that publishes `tick` events.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub enabled: bool,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    /// `compact`, `pretty` or `json`.
    pub format: String,
    /// Extra filter directives, e.g. `beacon_hub=trace`.
    pub directives: Option<String>,
    /// Writes rolling log files here when set.
    pub directory: Option<PathBuf>,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 3000, shutdown_grace_secs: 10 }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            subscriber_capacity: 64,
            publish_capacity: 1024,
            overflow: OverflowMode::Drop,
            keep_alive_secs: 15,
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            step: 10,
            step_interval_ms: 2000,
            publish_progress: true,
            max_wait_secs: 60,
            retain_secs: 300,
        }
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self { enabled: true, interval_ms: 2000 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: None,
            directory: None,
        }
    }
}
