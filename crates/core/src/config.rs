use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, VidzproError};

pub const DEFAULT_API_URL: &str = "https://demo.vausm.co.in/vidzpro-iso/public/api";
pub const API_URL_ENV_VAR: &str = "VIDZPRO_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Thresholds shared by the position tracker and the completion gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum watched percentage before completion may be offered.
    pub completion_threshold: f64,
    /// Highest percentage shown before the user has confirmed completion.
    pub progress_ceiling: f64,
    /// Forward jitter accepted between two position samples, in seconds.
    pub seek_tolerance_secs: f64,
    pub confirmation_keyword: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            completion_threshold: 95.0,
            progress_ceiling: 99.0,
            seek_tolerance_secs: 0.75,
            confirmation_keyword: "complete".to_string(),
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(VidzproError::Config { reason });

        if !(0.0..=100.0).contains(&self.progress_ceiling) {
            return invalid(format!(
                "progress_ceiling must be within 0..=100, got {}",
                self.progress_ceiling
            ));
        }
        if !(0.0..=self.progress_ceiling).contains(&self.completion_threshold) {
            return invalid(format!(
                "completion_threshold {} must not exceed progress_ceiling {}",
                self.completion_threshold, self.progress_ceiling
            ));
        }
        if !self.seek_tolerance_secs.is_finite() || self.seek_tolerance_secs < 0.0 {
            return invalid(format!(
                "seek_tolerance_secs must be a non-negative number, got {}",
                self.seek_tolerance_secs
            ));
        }
        if self.confirmation_keyword.trim().is_empty() {
            return invalid("confirmation_keyword must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub gate: GateConfig,
    /// Location of the key-value store file. Defaults to the platform data dir.
    pub store_path: Option<PathBuf>,
}

pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("vidzpro")
}

pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("vidzpro")
}

/// Where downloaded certificates go: the user's documents folder when there is one.
pub fn get_download_dir() -> PathBuf {
    dirs::document_dir()
        .map(|dir| dir.join("vidzpro"))
        .unwrap_or_else(|| get_data_dir().join("certificates"))
}

impl AppConfig {
    /// Load `config.json` from the platform config dir, then apply env overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_dir().join("config.json"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            debug!(path = %path.display(), "loading config");
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
            if url.trim().is_empty() {
                warn!("{API_URL_ENV_VAR} is set but empty, ignoring");
            } else {
                config.api.base_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(VidzproError::Config {
                reason: "api.base_url must not be empty".to_string(),
            });
        }
        self.gate.validate()
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| get_data_dir().join("store.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn threshold_above_ceiling_is_rejected() {
        let gate = GateConfig {
            completion_threshold: 99.5,
            ..GateConfig::default()
        };
        assert!(matches!(gate.validate(), Err(VidzproError::Config { .. })));
    }

    #[test]
    fn blank_keyword_is_rejected() {
        let gate = GateConfig {
            confirmation_keyword: "  ".into(),
            ..GateConfig::default()
        };
        assert!(gate.validate().is_err());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "gate": { "seek_tolerance_secs": 2.0 } }"#).unwrap();
        assert_eq!(config.gate.seek_tolerance_secs, 2.0);
        assert_eq!(config.gate.completion_threshold, 95.0);
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
    }
}
