//! Configuration loading for the monitor.
//!
//! The monitor reads `dibites-config.yaml` from the working directory (or
//! the file named by `DIBITES_CONFIG`). Every field has a default, so a
//! missing file is not an error. Environment variables override the file:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DIBITES_AUTOSAVE_DIR` | `autosave_dir` |
//! | `DIBITES_DATA_DIR` | `data_dir` |
//! | `DIBITES_POLL_INTERVAL_SECS` | `poll_interval_secs` |
//!
//! The ingestion loop itself only sees the resolved [`IngestSettings`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dibites-config.yaml";

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_VAR: &str = "DIBITES_CONFIG";

/// Folder created under the autosave folder when no data folder is set.
pub const DEFAULT_DATA_FOLDER: &str = "Dibite_Simulation_Data";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The config file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of range or an override does not parse.
    #[error("invalid {field}: {detail}")]
    Invalid {
        /// Offending field or environment variable.
        field: &'static str,
        /// What is wrong with it.
        detail: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Monitor configuration as written in `dibites-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonitorConfig {
    /// Folder the simulation drops autosave archives into.
    #[serde(default = "default_autosave_dir")]
    pub autosave_dir: PathBuf,

    /// Data root for tables and the ledger. Defaults to
    /// `<autosave_dir>/Dibite_Simulation_Data`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Seconds to wait between passes.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// File extension of autosave archives, compared case-insensitively.
    #[serde(default = "default_archive_extension")]
    pub archive_extension: String,

    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_autosave_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_poll_interval_secs() -> u64 {
    600
}

fn default_archive_extension() -> String {
    "zip".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            autosave_dir: default_autosave_dir(),
            data_dir: None,
            poll_interval_secs: default_poll_interval_secs(),
            archive_extension: default_archive_extension(),
            log_level: default_log_level(),
        }
    }
}

/// Values the ingestion loop runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    /// Folder scanned for archives.
    pub autosave_dir: PathBuf,
    /// Data root holding simulation folders and the ledger.
    pub data_dir: PathBuf,
    /// Wait between passes.
    pub poll_interval: Duration,
    /// Archive extension without the leading dot.
    pub archive_extension: String,
}

impl MonitorConfig {
    /// Load configuration from a YAML file, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, and
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML and
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse_with_lookup(yaml, |name| std::env::var(name).ok())
    }

    /// [`parse`](Self::parse) with overrides read through `lookup` instead of
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn parse_with_lookup<F>(yaml: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.finish(lookup)
    }

    /// Defaults plus environment overrides, for when no file exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().finish(|name| std::env::var(name).ok())
    }

    fn finish<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.apply_overrides(lookup)?;
        self.validate()?;
        Ok(self)
    }

    /// Override fields from variables returned by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `DIBITES_POLL_INTERVAL_SECS` is
    /// not an unsigned integer.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("DIBITES_AUTOSAVE_DIR") {
            self.autosave_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("DIBITES_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("DIBITES_POLL_INTERVAL_SECS") {
            self.poll_interval_secs =
                val.trim().parse().map_err(|e| ConfigError::Invalid {
                    field: "DIBITES_POLL_INTERVAL_SECS",
                    detail: format!("{val:?}: {e}"),
                })?;
        }
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero poll interval or an
    /// empty archive extension.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_secs",
                detail: "must be at least 1".to_owned(),
            });
        }
        if self.archive_extension.trim_start_matches('.').trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "archive_extension",
                detail: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }

    /// Resolve the values the ingestion loop runs with.
    pub fn settings(&self) -> IngestSettings {
        let data_dir = self
            .data_dir
            .clone()
            .unwrap_or_else(|| self.autosave_dir.join(DEFAULT_DATA_FOLDER));
        IngestSettings {
            autosave_dir: self.autosave_dir.clone(),
            data_dir,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            archive_extension: self
                .archive_extension
                .trim()
                .trim_start_matches('.')
                .to_owned(),
        }
    }
}

/// Locate and load the configuration.
///
/// Returns the config and the file it came from, or `None` if no file was
/// found and defaults were used.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be loaded, or if
/// `DIBITES_CONFIG` names a file that does not exist.
pub fn load() -> Result<(MonitorConfig, Option<PathBuf>), ConfigError> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_VAR) {
        let path = PathBuf::from(explicit);
        return Ok((MonitorConfig::from_file(&path)?, Some(path)));
    }
    let path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if path.exists() {
        Ok((MonitorConfig::from_file(&path)?, Some(path)))
    } else {
        Ok((MonitorConfig::from_env()?, None))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn parse_with(yaml: &str, env: &[(&str, &str)]) -> Result<MonitorConfig, ConfigError> {
        let vars: BTreeMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        MonitorConfig::parse_with_lookup(yaml, |name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_empty() {
        let config = parse_with("", &[]).ok();
        assert_eq!(config, Some(MonitorConfig::default()));

        let settings = MonitorConfig::default().settings();
        assert_eq!(settings.data_dir, Path::new(".").join(DEFAULT_DATA_FOLDER));
        assert_eq!(settings.poll_interval, Duration::from_secs(600));
        assert_eq!(settings.archive_extension, "zip");
    }

    #[test]
    fn whitespace_only_file_is_empty() {
        let config = parse_with("  \n\t\n", &[]).ok();
        assert_eq!(config, Some(MonitorConfig::default()));

        let overridden = parse_with("\n", &[("DIBITES_POLL_INTERVAL_SECS", "7")]);
        assert!(overridden.is_ok());
        assert_eq!(overridden.unwrap().settings().poll_interval.as_secs(), 7);
    }

    #[test]
    fn yaml_fields_are_read() {
        let yaml = "autosave_dir: /saves\npoll_interval_secs: 30\narchive_extension: .ZIP\n";
        let config = parse_with(yaml, &[]).ok();
        let settings = config.map(|c| c.settings());
        assert_eq!(
            settings.as_ref().map(|s| s.data_dir.clone()),
            Some(PathBuf::from("/saves").join(DEFAULT_DATA_FOLDER))
        );
        assert_eq!(
            settings.as_ref().map(|s| s.archive_extension.as_str()),
            Some("ZIP")
        );
        assert_eq!(settings.map(|s| s.poll_interval), Some(Duration::from_secs(30)));
    }

    #[test]
    fn env_overrides_file() {
        let config = parse_with(
            "autosave_dir: /saves\npoll_interval_secs: 30\n",
            &[
                ("DIBITES_AUTOSAVE_DIR", "/elsewhere"),
                ("DIBITES_DATA_DIR", "/data"),
                ("DIBITES_POLL_INTERVAL_SECS", " 5 "),
            ],
        )
        .ok();
        let settings = config.map(|c| c.settings());
        assert_eq!(
            settings,
            Some(IngestSettings {
                autosave_dir: PathBuf::from("/elsewhere"),
                data_dir: PathBuf::from("/data"),
                poll_interval: Duration::from_secs(5),
                archive_extension: "zip".to_owned(),
            })
        );
    }

    #[test]
    fn rejects_zero_interval() {
        let result = parse_with("poll_interval_secs: 0\n", &[]);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "poll_interval_secs",
                ..
            })
        ));
    }

    #[test]
    fn rejects_unparsable_override() {
        let result = parse_with("", &[("DIBITES_POLL_INTERVAL_SECS", "soon")]);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "DIBITES_POLL_INTERVAL_SECS",
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_extension() {
        assert!(parse_with("archive_extension: \".\"\n", &[]).is_err());
    }

    #[test]
    fn rejects_malformed_yaml() {
        let result = parse_with("poll_interval_secs: [1, 2", &[]);
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
