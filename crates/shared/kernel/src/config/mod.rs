use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

const DEFAULT_CONFIG_FILE: &str = "server";
const ENV_PREFIX: &str = "BEACON";

#[beacon_derive::beacon_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Human-readable origin of the configuration [`load_config`] reads for `path`.
///
/// Binaries that install their logger from the loaded configuration log this
/// once the subscriber is up.
#[must_use]
pub fn config_source(path: Option<&Path>) -> String {
    match path {
        Some(path) => format!("{} with {ENV_PREFIX}__ overrides", path.display()),
        None => format!("optional '{DEFAULT_CONFIG_FILE}' file with {ENV_PREFIX}__ overrides"),
    }
}

/// Loads typed configuration from a file overlaid with environment variables.
///
/// 1. **File**: `path` if given (must exist), otherwise an optional `server.*`
///    file in the working directory (any format the `config` crate detects).
/// 2. **Environment**: variables prefixed with `BEACON__`, nested with double
///    underscores, e.g. `BEACON__HUB__SUBSCRIBER_CAPACITY=128`.
///
/// Sections missing from both sources keep the defaults of `T`.
///
/// # Errors
/// Returns [`ConfigError::Config`] if an explicit file is missing or a value
/// does not fit `T`.
///
/// # Example
/// ```rust,no_run
/// use beacon_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local.toml")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let file = match &path {
        Some(path) => File::from(path.as_ref()).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .convert_case(config::Case::Snake)
            .try_parsing(true),
    );

    info!("Loading config from {}", config_source(path.as_ref().map(|path| path.as_ref())));

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
