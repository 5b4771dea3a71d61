//! Structured logging for Floorboard
//!
//! # Features
//!
//! - **JSONL Output**: structured JSON lines on the console (default)
//! - **Pretty Output**: human-readable console output for development
//! - **File Rotation**: daily/hourly log files via tracing-appender
//! - **Resident Context**: tag spans with the signed-in resident and floor
//!
//! # Quick Start
//!
//! ```ignore
//! use floorboard_logging::{FloorboardSubscriberBuilder, LogConfig};
//!
//! // JSONL to console
//! FloorboardSubscriberBuilder::new().init()?;
//!
//! // Development mode with pretty output
//! FloorboardSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init()?;
//! ```
//!
//! # Resident Context
//!
//! ```ignore
//! use floorboard_logging::ResidentContextGuard;
//!
//! let _guard = ResidentContextGuard::new(&principal.id).with_floor(floor);
//! tracing::info_span!("feed").in_scope(|| tracing::info!("snapshot applied"));
//! ```

pub mod config;
pub mod context;
pub mod layers;

pub use config::{
    ConsoleConfig, ConsoleFormat, DEFAULT_FILE_PREFIX, FileConfig, JsonlConfig, LogConfig,
    RotationStrategy,
};
pub use context::{ResidentContextData, ResidentContextGuard};
pub use layers::{ResidentContextExtension, ResidentContextLayer};
pub use tracing_appender::non_blocking::WorkerGuard;

use thiserror::Error;
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging setup failures
#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("failed to open log file: {0}")]
    File(#[from] tracing_appender::rolling::InitError),

    #[error("failed to install subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Builder for configuring and installing the Floorboard subscriber
///
/// By default console output uses JSONL. Use [`LogConfig::development()`]
/// for pretty output.
pub struct FloorboardSubscriberBuilder {
    config: LogConfig,
}

impl FloorboardSubscriberBuilder {
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Console output format, or [`ConsoleFormat::Off`]
    pub fn with_console(mut self, format: ConsoleFormat) -> Self {
        self.config.console.format = format;
        self
    }

    /// Override the level of one target
    pub fn with_target(mut self, target: impl Into<String>, level: impl Into<String>) -> Self {
        self.config = self.config.with_target(target, level);
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber globally.
    ///
    /// When file output is configured the returned guard must be kept alive
    /// for as long as logs should be flushed.
    pub fn init(self) -> Result<Option<WorkerGuard>, LogInitError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.filter_directives()));

        let (file_writer, guard) = match &self.config.file {
            Some(file_config) => {
                let (writer, guard) = file_writer(file_config)?;
                (Some(writer), Some(guard))
            }
            None => (None, None),
        };
        let jsonl = &self.config.jsonl;

        let registry = Registry::default()
            .with(env_filter)
            .with(ResidentContextLayer::new())
            .with(file_writer.map(|writer| layers::jsonl_layer(writer, jsonl)));

        match self.config.console.format {
            ConsoleFormat::Pretty => {
                let console_layer = tracing_subscriber::fmt::layer()
                    .with_ansi(self.config.console.ansi)
                    .with_target(true);
                registry.with(console_layer).try_init()?;
            }
            ConsoleFormat::Jsonl => {
                registry
                    .with(layers::jsonl_layer(std::io::stdout, jsonl))
                    .try_init()?;
            }
            ConsoleFormat::Off => registry.try_init()?,
        }

        Ok(guard)
    }
}

impl Default for FloorboardSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LogInitError> {
    let rotation = match config.rotation {
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
        RotationStrategy::Never => Rotation::NEVER,
    };
    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&config.prefix)
        .filename_suffix("log");
    if let Some(max_files) = config.max_files {
        builder = builder.max_log_files(max_files);
    }
    let appender = builder.build(&config.directory)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// JSONL to console at info
pub fn init_default() -> Result<(), LogInitError> {
    FloorboardSubscriberBuilder::new().init().map(|_| ())
}

/// Pretty console output at debug
pub fn init_development() -> Result<(), LogInitError> {
    FloorboardSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
        .map(|_| ())
}

/// Warnings only; ignores an already-installed subscriber
pub fn init_testing() {
    let _ = FloorboardSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_jsonl() {
        let builder = FloorboardSubscriberBuilder::new();
        assert_eq!(builder.config().default_level, "info");
        assert_eq!(builder.config().console.format, ConsoleFormat::Jsonl);
    }

    #[test]
    fn test_builder_with_config() {
        let builder = FloorboardSubscriberBuilder::new().with_config(LogConfig::development());
        assert_eq!(builder.config().default_level, "debug");
        assert_eq!(builder.config().console.format, ConsoleFormat::Pretty);
    }

    #[test]
    fn test_builder_overrides() {
        let builder = FloorboardSubscriberBuilder::new()
            .with_level("trace")
            .with_target("floorboard_core::memory", "debug")
            .with_console(ConsoleFormat::Off)
            .with_file_output(FileConfig::in_dir("/tmp/floorboard-logs"));
        assert_eq!(builder.config().default_level, "trace");
        assert_eq!(
            builder.config().filter_directives(),
            "trace,floorboard_core::memory=debug"
        );
        assert!(!builder.config().console.is_enabled());
        assert!(builder.config().file.is_some());
    }

    #[test]
    fn test_init_testing_twice_is_harmless() {
        init_testing();
        init_testing();
    }
}
