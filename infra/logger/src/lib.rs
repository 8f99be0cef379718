//! # Logger
//!
//! Installs the global `tracing` subscriber for beacon services.
//!
//! * Console output in a compact, pretty or JSON layout.
//! * Optional rolling log files written by a non-blocking background worker.
//! * Filtering by a default level, programmatic directives and `RUST_LOG`.
//!
//! ## Example
//!
//! ```rust
//! # use beacon_logger::{LogFormat, Logger, LevelFilter};
//! let _logger = Logger::builder()
//!     .name("beacon-server")
//!     .format(LogFormat::Compact)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const DEFAULT_KEEP_FILES: usize = 7;
const LOG_FILE_SUFFIX: &str = "log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Layout of emitted log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(LoggerError::InvalidConfiguration {
                message: format!("unknown log format '{other}'").into(),
                context: Some("expected compact, pretty or json".into()),
            }),
        }
    }
}

/// Parses a level name such as `"info"` or `"off"`.
///
/// # Errors
/// Returns [`LoggerError::InvalidConfiguration`] for unknown names.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    level.trim().parse::<LevelFilter>().map_err(|e| LoggerError::InvalidConfiguration {
        message: format!("invalid log level '{level}': {e}").into(),
        context: None,
    })
}

#[derive(Debug)]
struct Settings {
    console: Option<LogFormat>,
    directory: Option<PathBuf>,
    file_format: LogFormat,
    level: LevelFilter,
    directives: Option<String>,
    rotation: Rotation,
    keep_files: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            console: Some(LogFormat::Compact),
            directory: None,
            file_format: LogFormat::Compact,
            level: LevelFilter::INFO,
            directives: None,
            rotation: Rotation::DAILY,
            keep_files: DEFAULT_KEEP_FILES,
        }
    }
}

#[derive(Debug)]
pub struct Unnamed;
#[derive(Debug)]
pub struct Named(String);
#[derive(Debug)]
pub struct NoFile;
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl Sealed for Unnamed {}
impl Sealed for Named {}
impl Sealed for NoFile {}
impl Sealed for WithFile {}

/// Configures the global subscriber. A name is required before [`LoggerBuilder::init`]
/// becomes available; file-only knobs appear after [`LoggerBuilder::directory`].
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = Unnamed, F: Sealed = NoFile> {
    settings: Settings,
    name: N,
    file: PhantomData<F>,
}

impl<F: Sealed> LoggerBuilder<Unnamed, F> {
    /// Service name; also the prefix of rolling log files.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<Named, F> {
        LoggerBuilder { settings: self.settings, name: Named(name.into()), file: PhantomData }
    }
}

impl LoggerBuilder<Named, WithFile> {
    #[must_use]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.settings.rotation = rotation;
        self
    }

    /// How many rotated files to keep on disk.
    #[must_use]
    pub const fn keep_files(mut self, keep: usize) -> Self {
        self.settings.keep_files = keep;
        self
    }

    #[must_use]
    pub const fn file_format(mut self, format: LogFormat) -> Self {
        self.settings.file_format = format;
        self
    }
}

impl<F: Sealed> LoggerBuilder<Named, F> {
    #[must_use]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    /// Extra filter directives, e.g. `"beacon_hub=trace,tower_http=debug"`.
    ///
    /// `RUST_LOG` is ignored when directives are given.
    #[must_use]
    pub fn directives(mut self, directives: impl Into<String>) -> Self {
        let directives = directives.into();
        self.settings.directives = (!directives.trim().is_empty()).then_some(directives);
        self
    }

    /// Console layout.
    #[must_use]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.settings.console = Some(format);
        self
    }

    /// Turns console output off entirely.
    #[must_use]
    pub const fn quiet(mut self) -> Self {
        self.settings.console = None;
        self
    }

    /// Also writes rolling log files into `directory`.
    pub fn directory(self, directory: impl Into<PathBuf>) -> LoggerBuilder<Named, WithFile> {
        let mut settings = self.settings;
        settings.directory = Some(directory.into());
        LoggerBuilder { settings, name: self.name, file: PhantomData }
    }

    /// Installs the subscriber.
    ///
    /// Keep the returned [`Logger`] alive for as long as the process logs; dropping
    /// it stops the file worker.
    ///
    /// # Errors
    /// * [`LoggerError::Subscriber`] when a global subscriber already exists.
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, bad directives,
    ///   `keep_files(0)` or no enabled output.
    /// * [`LoggerError::Io`] / [`LoggerError::Appender`] when the log directory is unusable.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Named(name) = self.name;
        validate(&self.settings, &name)?;

        let filter = env_filter(&self.settings)?;
        let mut layers: Vec<BoxedLayer> = Vec::new();

        if let Some(format) = self.settings.console {
            let console = layer().with_ansi(true);
            layers.push(match format {
                LogFormat::Compact => console.compact().boxed(),
                LogFormat::Pretty => console.pretty().boxed(),
                LogFormat::Json => console.json().boxed(),
            });
        }

        let guard = match &self.settings.directory {
            Some(directory) => {
                fs::create_dir_all(directory)
                    .context(format!("creating {}", directory.display()))?;

                let appender = RollingFileAppender::builder()
                    .rotation(self.settings.rotation.clone())
                    .filename_prefix(&name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(self.settings.keep_files)
                    .build(directory)?;
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let file = layer().with_writer(writer).with_ansi(false);
                layers.push(match self.settings.file_format {
                    LogFormat::Json => file.json().boxed(),
                    LogFormat::Pretty => file.pretty().boxed(),
                    LogFormat::Compact => file.boxed(),
                });
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(layers).with(filter).try_init()?;

        tracing::debug!(service = %name, files = guard.is_some(), "Logging initialized");
        Ok(Logger { guard })
    }
}

/// Handle to the installed subscriber.
#[must_use = "dropping the logger stops the log file worker"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { settings: Settings::default(), name: Unnamed, file: PhantomData }
    }

    /// Whether log files are being written.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Flushing log files");
        }
    }
}

fn validate(settings: &Settings, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "logger name cannot be empty".into(),
            context: None,
        });
    }
    if settings.keep_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "keep_files must be greater than zero".into(),
            context: None,
        });
    }
    if settings.console.is_none() && settings.directory.is_none() {
        return Err(LoggerError::InvalidConfiguration {
            message: "no output enabled".into(),
            context: Some("enable console or file logging".into()),
        });
    }
    Ok(())
}

fn env_filter(settings: &Settings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level.into());
    match &settings.directives {
        Some(directives) => {
            builder.parse(directives).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("invalid filter '{directives}': {e}").into(),
                context: None,
            })
        },
        None => Ok(builder.from_env_lossy()),
    }
}
