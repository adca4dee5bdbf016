//! Application configuration: optional YAML file for non-secret settings,
//! environment for everything else. Environment wins over the file.
//!
//! | Variable                       | Meaning                              |
//! |--------------------------------|--------------------------------------|
//! | `GEMINI_CONFIG`                | classifier credential, wins over `API_KEY` |
//! | `API_KEY`                      | classifier credential (analysis only)|
//! | `GEMINI_MODEL`                 | model name                           |
//! | `GEMINI_BASE_URL`              | API base URL                         |
//! | `DRIVE_OPTIMA_STORAGE_DIR`     | where the session file lives         |
//! | `DRIVE_OPTIMA_APPLY_DELAY_MS`  | simulated apply delay                |

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_APPLY_DELAY: Duration = Duration::from_millis(2000);

/// Settings for the HTTP classifier.
#[derive(Clone)]
pub struct ClassifierConfig {
    /// Absent keys only fail the analysis path.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_key_set", &self.api_key.is_some())
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    /// `None` means the platform default under the local data directory.
    pub storage_dir: Option<PathBuf>,
    pub apply_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            classifier: ClassifierConfig::default(),
            storage_dir: None,
            apply_delay: DEFAULT_APPLY_DELAY,
        }
    }
}

/// YAML shape. Secrets are never read from the file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    classifier: FileClassifierSection,
    storage_dir: Option<PathBuf>,
    apply_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileClassifierSection {
    model: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Defaults overlaid with the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Reads `path` as YAML, then overlays the environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        info!(config_path = ?path_ref, "Loading configuration from file");

        let content = fs::read_to_string(path_ref).map_err(|e| {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            ConfigError::Read {
                path: path_ref.to_path_buf(),
                source: e,
            }
        })?;

        let file: FileConfig = serde_yaml::from_str(&content).map_err(|e| {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            ConfigError::Parse(e)
        })?;
        info!(config_path = ?path_ref, "Parsed config YAML successfully");

        let mut config = AppConfig::default();
        if let Some(model) = file.classifier.model {
            config.classifier.model = model;
        }
        if let Some(base_url) = file.classifier.base_url {
            config.classifier.base_url = base_url;
        }
        if let Some(secs) = file.classifier.timeout_secs {
            config.classifier.timeout = Duration::from_secs(secs);
        }
        config.storage_dir = file.storage_dir;
        if let Some(ms) = file.apply_delay_ms {
            config.apply_delay = Duration::from_millis(ms);
        }

        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(key) = non_empty_var("GEMINI_CONFIG").or_else(|| non_empty_var("API_KEY")) {
            self.classifier.api_key = Some(key);
        }
        if let Some(model) = non_empty_var("GEMINI_MODEL") {
            self.classifier.model = model;
        }
        if let Some(base_url) = non_empty_var("GEMINI_BASE_URL") {
            self.classifier.base_url = base_url;
        }
        if let Some(dir) = non_empty_var("DRIVE_OPTIMA_STORAGE_DIR") {
            self.storage_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = non_empty_var("DRIVE_OPTIMA_APPLY_DELAY_MS") {
            let ms = raw.parse::<u64>().map_err(|_| {
                error!(value = %raw, "DRIVE_OPTIMA_APPLY_DELAY_MS must be an integer");
                ConfigError::InvalidValue {
                    key: "DRIVE_OPTIMA_APPLY_DELAY_MS",
                    value: raw.clone(),
                }
            })?;
            self.apply_delay = Duration::from_millis(ms);
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            model = %self.classifier.model,
            base_url = %self.classifier.base_url,
            api_key_set = self.classifier.api_key.is_some(),
            apply_delay_ms = self.apply_delay.as_millis() as u64,
            "Loaded AppConfig"
        );
        debug!(?self, "AppConfig loaded (full debug)");
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_key() {
        let config = ClassifierConfig {
            api_key: Some("super-secret".into()),
            ..ClassifierConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("api_key_set: true"));
    }

    #[test]
    fn defaults_point_at_the_public_api() {
        let config = AppConfig::default();
        assert_eq!(config.classifier.model, DEFAULT_MODEL);
        assert_eq!(config.classifier.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.apply_delay, Duration::from_millis(2000));
        assert!(config.classifier.api_key.is_none());
    }
}
