//! Kernel utilities shared by beacon services.
//!
//! * [`config::load_config`] layers an optional config file with `BEACON__`
//!   environment overrides.
//! * With the `server` feature, [`server`] provides the shared API state, the
//!   system routes and the SSE connection adapter for the broadcast hub.
//!
//! ```rust,no_run
//! use beacon_kernel::config::load_config;
//! use beacon_kernel::domain::config::ApiConfig;
//!
//! let config: ApiConfig = load_config(None::<&str>).unwrap_or_default();
//! assert!(config.hub.subscriber_capacity > 0);
//! ```

pub mod config;
#[cfg(feature = "server")]
pub mod server;

pub use beacon_domain as domain;
