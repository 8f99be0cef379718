use anyhow::Context;
use beacon_kernel::config::{config_source, load_config};
use beacon_kernel::domain::config::ApiConfig;
use beacon_logger::{LogFormat, Logger, parse_level};
use beacon_server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig =
        load_config(None::<&str>).context("Critical: Configuration is malformed")?;

    // The subscriber depends on the config, so the load itself is reported afterwards.
    let _log = init_logger(&cfg)?;
    tracing::info!("Configuration loaded from {}", config_source(None));

    Server::builder().config(cfg).build()?.run().await
}

fn init_logger(cfg: &ApiConfig) -> anyhow::Result<Logger> {
    let log = &cfg.log;
    let builder = Logger::builder()
        .name(env!("CARGO_PKG_NAME"))
        .level(parse_level(&log.level)?)
        .format(log.format.parse::<LogFormat>()?)
        .directives(log.directives.clone().unwrap_or_default());

    let logger = match &log.directory {
        Some(directory) => builder.directory(directory).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}
