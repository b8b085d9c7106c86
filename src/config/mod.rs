//! Configuration initialization and hierarchy management
//!
//! Precedence: CLI > environment > file > defaults. Command-line flags and
//! their `STREAMTRIM_*` environment fallbacks arrive together through clap
//! as [`Overrides`]; the TOML file sits underneath them.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::domain::model::EndPolicy;
use crate::engine::TrimRequest;
use crate::error::{TrimError, TrimResult};
use crate::utils::logging::{LogFormat, LoggingConfig};
use crate::utils::time::format_time;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "streamtrim.toml";

/// Cut point in a config file: `"mm:ss"` or whole seconds
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Seconds(u32),
    Clock(String),
}

impl TimeValue {
    /// Seconds are rendered as `mm:ss` so every value goes through one parser
    pub fn to_clock(&self) -> String {
        match self {
            TimeValue::Seconds(seconds) => format_time(*seconds),
            TimeValue::Clock(clock) => clock.clone(),
        }
    }
}

/// `[trim]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrimSection {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub start: Option<TimeValue>,
    pub end: Option<TimeValue>,
    pub end_policy: Option<EndPolicy>,
}

/// `[log]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

/// Parsed TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub trim: TrimSection,
    #[serde(default)]
    pub log: LogSection,
}

impl FileConfig {
    pub fn parse(content: &str) -> TrimResult<Self> {
        toml::from_str(content)
            .map_err(|e| TrimError::config(format!("Failed to parse TOML config: {e}")))
    }

    /// Load an explicit path, or the default file if it exists
    pub fn load(explicit: Option<&Path>) -> TrimResult<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        debug!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(&path).map_err(|e| {
            TrimError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }
}

/// Values from the command line or environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub end_policy: Option<EndPolicy>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

/// Fully layered settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub end_policy: EndPolicy,
    pub logging: LoggingConfig,
}

impl Settings {
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Self {
        let defaults = LoggingConfig::default();
        Self {
            input: overrides.input.or(file.trim.input),
            output: overrides.output.or(file.trim.output),
            start: overrides
                .start
                .or_else(|| file.trim.start.as_ref().map(TimeValue::to_clock)),
            end: overrides
                .end
                .or_else(|| file.trim.end.as_ref().map(TimeValue::to_clock)),
            end_policy: overrides
                .end_policy
                .or(file.trim.end_policy)
                .unwrap_or_default(),
            logging: LoggingConfig {
                level: overrides
                    .log_level
                    .or(file.log.level)
                    .unwrap_or(defaults.level),
                format: overrides
                    .log_format
                    .or(file.log.format)
                    .unwrap_or(defaults.format),
            },
        }
    }

    pub fn input(&self) -> TrimResult<&Path> {
        self.input
            .as_deref()
            .ok_or_else(|| TrimError::config("input path not provided"))
    }

    /// Everything a trim needs, or a `Config` error naming what is missing
    pub fn trim_request(&self) -> TrimResult<TrimRequest> {
        let (Some(input), Some(output)) = (&self.input, &self.output) else {
            return Err(TrimError::config("input or output path not provided"));
        };
        let (Some(start), Some(end)) = (&self.start, &self.end) else {
            return Err(TrimError::config("start and end times are required"));
        };

        Ok(TrimRequest {
            input: input.clone(),
            output: output.clone(),
            start: start.clone(),
            end: end.clone(),
            end_policy: self.end_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[trim]
input = "in.mp4"
output = "out.mkv"
start = 10
end = "01:05"
end_policy = "drain"

[log]
level = "debug"
format = "json"
"#;

    #[test]
    fn test_file_values_fill_settings() {
        let settings = Settings::resolve(FileConfig::parse(SAMPLE).unwrap(), Overrides::default());

        assert_eq!(settings.input, Some(PathBuf::from("in.mp4")));
        assert_eq!(settings.start.as_deref(), Some("00:10"));
        assert_eq!(settings.end.as_deref(), Some("01:05"));
        assert_eq!(settings.end_policy, EndPolicy::DrainStreams);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_overrides_win_over_file() {
        let overrides = Overrides {
            output: Some(PathBuf::from("cli.mp4")),
            start: Some("00:20".to_string()),
            end_policy: Some(EndPolicy::StopAtBoundary),
            log_level: Some("warn".to_string()),
            ..Overrides::default()
        };
        let settings = Settings::resolve(FileConfig::parse(SAMPLE).unwrap(), overrides);

        assert_eq!(settings.input, Some(PathBuf::from("in.mp4")));
        assert_eq!(settings.output, Some(PathBuf::from("cli.mp4")));
        assert_eq!(settings.start.as_deref(), Some("00:20"));
        assert_eq!(settings.end_policy, EndPolicy::StopAtBoundary);
        assert_eq!(settings.logging.level, "warn");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::resolve(FileConfig::default(), Overrides::default());
        assert_eq!(settings.end_policy, EndPolicy::StopAtBoundary);
        assert_eq!(settings.logging, LoggingConfig::default());
    }

    #[test]
    fn test_missing_paths_are_config_errors() {
        let settings = Settings::resolve(
            FileConfig::default(),
            Overrides {
                input: Some(PathBuf::from("in.mp4")),
                start: Some("00:00".to_string()),
                end: Some("00:10".to_string()),
                ..Overrides::default()
            },
        );
        let err = settings.trim_request().unwrap_err();
        assert!(err.to_string().contains("input or output path not provided"));
    }

    #[test]
    fn test_missing_times_are_config_errors() {
        let settings = Settings::resolve(
            FileConfig::default(),
            Overrides {
                input: Some(PathBuf::from("in.mp4")),
                output: Some(PathBuf::from("out.mp4")),
                ..Overrides::default()
            },
        );
        assert!(matches!(settings.trim_request(), Err(TrimError::Config { .. })));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(FileConfig::parse("[trim]\nstart_time = 3\n").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = FileConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.trim.start, Some(TimeValue::Seconds(10)));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let err = FileConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, TrimError::Config { .. }));
    }
}
