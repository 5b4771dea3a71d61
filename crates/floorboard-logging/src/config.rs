//! Logging configuration
//!
//! A [`LogConfig`] can be built from one of the presets or deserialized from
//! any serde format; missing fields take their defaults.
//!
//! ```toml
//! default_level = "info"
//!
//! [targets]
//! floorboard_core = "warn"
//!
//! [console]
//! format = "pretty"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Prefix of rotated log file names
pub const DEFAULT_FILE_PREFIX: &str = "floorboard";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for targets not listed in `targets`. `RUST_LOG` replaces the
    /// whole filter when set.
    pub default_level: String,
    /// Per-target level overrides, e.g. `floorboard_client::feed = "trace"`
    pub targets: BTreeMap<String, String>,
    pub console: ConsoleConfig,
    pub file: Option<FileConfig>,
    pub jsonl: JsonlConfig,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            targets: BTreeMap::new(),
            console: ConsoleConfig::default(),
            file: None,
            jsonl: JsonlConfig::default(),
        }
    }
}

impl LogConfig {
    /// Pretty, colored console output at debug
    pub fn development() -> Self {
        Self {
            default_level: "debug".to_string(),
            console: ConsoleConfig::pretty(),
            ..Self::default()
        }
    }

    /// Daily JSONL files under `log_dir`, a month retained, console off
    pub fn production(log_dir: PathBuf) -> Self {
        Self {
            console: ConsoleConfig::off(),
            file: Some(FileConfig {
                max_files: Some(30),
                ..FileConfig::in_dir(log_dir)
            }),
            ..Self::default()
        }
    }

    /// Warnings only, plain JSONL so test output stays greppable
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            ..Self::default()
        }
    }

    /// For an interactive terminal session.
    ///
    /// Logs must not interleave with the session's own output, so a log
    /// directory moves everything into files. Without one, only warnings
    /// reach the console.
    pub fn terminal(log_dir: Option<PathBuf>) -> Self {
        match log_dir {
            Some(dir) => Self {
                console: ConsoleConfig::off(),
                file: Some(FileConfig::in_dir(dir)),
                ..Self::default()
            },
            None => Self {
                default_level: "warn".to_string(),
                console: ConsoleConfig::pretty(),
                ..Self::default()
            },
        }
    }

    /// Override the level of one target
    pub fn with_target(mut self, target: impl Into<String>, level: impl Into<String>) -> Self {
        self.targets.insert(target.into(), level.into());
        self
    }

    /// `EnvFilter` directives: the default level, then each override
    pub fn filter_directives(&self) -> String {
        std::iter::once(self.default_level.clone())
            .chain(
                self.targets
                    .iter()
                    .map(|(target, level)| format!("{}={}", target, level)),
            )
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// How events are printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    Off,
    #[default]
    Jsonl,
    Pretty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub format: ConsoleFormat,
    /// ANSI colors; pretty output only
    pub ansi: bool,
}

impl ConsoleConfig {
    pub fn off() -> Self {
        Self {
            format: ConsoleFormat::Off,
            ansi: false,
        }
    }

    pub fn pretty() -> Self {
        Self {
            format: ConsoleFormat::Pretty,
            ansi: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.format != ConsoleFormat::Off
    }
}

/// Rolling JSONL files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub directory: PathBuf,
    pub prefix: String,
    pub rotation: RotationStrategy,
    /// Oldest files beyond this count are deleted on rotation
    pub max_files: Option<usize>,
}

impl FileConfig {
    /// Daily files under `directory`, a week retained
    pub fn in_dir(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            prefix: DEFAULT_FILE_PREFIX.to_string(),
            rotation: RotationStrategy::default(),
            max_files: Some(7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    Never,
}

/// Which fields the JSONL formatter emits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlConfig {
    /// Event fields at the top level instead of under `fields`
    pub flatten_events: bool,
    pub include_spans: bool,
    pub include_current_span: bool,
    pub include_thread_info: bool,
    /// File and line of the callsite
    pub include_location: bool,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            flatten_events: true,
            include_spans: true,
            include_current_span: true,
            include_thread_info: false,
            include_location: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.default_level, "info");
        assert_eq!(config.console.format, ConsoleFormat::Jsonl);
        assert!(config.file.is_none());
        assert_eq!(config.filter_directives(), "info");
    }

    #[test]
    fn test_production_config() {
        let config = LogConfig::production(PathBuf::from("/var/log/floorboard"));
        assert!(!config.console.is_enabled());
        let file = config.file.unwrap();
        assert_eq!(file.directory, PathBuf::from("/var/log/floorboard"));
        assert_eq!(file.prefix, DEFAULT_FILE_PREFIX);
        assert_eq!(file.max_files, Some(30));
    }

    #[test]
    fn test_terminal_config_keeps_console_clear() {
        let to_files = LogConfig::terminal(Some(PathBuf::from("/tmp/fb")));
        assert!(!to_files.console.is_enabled());
        assert_eq!(to_files.file.unwrap().rotation, RotationStrategy::Daily);

        let to_console = LogConfig::terminal(None);
        assert_eq!(to_console.default_level, "warn");
        assert_eq!(to_console.console.format, ConsoleFormat::Pretty);
    }

    #[test]
    fn test_filter_directives() {
        let config = LogConfig::testing()
            .with_target("floorboard_client::feed", "trace")
            .with_target("floorboard_core", "error");
        assert_eq!(
            config.filter_directives(),
            "warn,floorboard_client::feed=trace,floorboard_core=error"
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: LogConfig =
            serde_json::from_str(r#"{"default_level":"trace","console":{"format":"off"}}"#).unwrap();
        assert_eq!(config.default_level, "trace");
        assert_eq!(config.console.format, ConsoleFormat::Off);
        assert!(config.jsonl.flatten_events);
    }
}
