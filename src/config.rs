use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::models::ResponseLanguage;
use crate::pipeline::classify::{DEFAULT_CAUTION_THRESHOLD, DEFAULT_EMERGENCY_KEYWORDS};

/// Application-level constants
pub const APP_NAME: &str = "OmniHealth";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_ENGINE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_ENGINE_MODEL: &str = "gemini-2.0-flash-lite";
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Get the application data directory
/// ~/OmniHealth/ on all platforms
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(APP_NAME)
}

/// Get the triage settings file path
pub fn config_path() -> PathBuf {
    app_data_dir().join("config.json")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "omnihealth_lib=info,warn"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings consumed by the triage core. Every field has a default, so a
/// partial JSON file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub response_language: ResponseLanguage,
    pub confidence_caution_threshold: u8,
    pub emergency_keywords: Vec<String>,
    /// Simulated engine, no network (the sidebar "live demo" toggle).
    pub demo_mode: bool,
    pub engine: EngineConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            response_language: ResponseLanguage::default(),
            confidence_caution_threshold: DEFAULT_CAUTION_THRESHOLD,
            emergency_keywords: DEFAULT_EMERGENCY_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            demo_mode: false,
            engine: EngineConfig::default(),
        }
    }
}

impl TriageConfig {
    /// Load and validate a JSON settings file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Triage configuration loaded");
        Ok(config)
    }

    /// Load `config_path()`, falling back to defaults when the file is
    /// absent or unusable.
    pub fn load_or_default() -> Self {
        let path = config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring triage configuration, using defaults");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.confidence_caution_threshold > 100 {
            return Err(ConfigError::Invalid(format!(
                "confidence_caution_threshold must be 0-100 (got {})",
                self.confidence_caution_threshold
            )));
        }
        if self.emergency_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "emergency_keywords must contain at least one keyword".into(),
            ));
        }
        if self.engine.timeout_secs == 0 {
            return Err(ConfigError::Invalid("engine.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

/// Hosted model connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key. The key itself
    /// never lives in the settings file.
    pub api_key_env: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ENGINE_URL.into(),
            model: DEFAULT_ENGINE_MODEL.into(),
            timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
            api_key_env: DEFAULT_API_KEY_ENV.into(),
        }
    }
}

impl EngineConfig {
    /// Read the API key from the configured environment variable.
    /// Surrounding whitespace is stripped; blank values count as missing.
    pub fn api_key_from_env(&self) -> Option<ApiKey> {
        let raw = std::env::var(&self.api_key_env).ok()?;
        let key = ApiKey::new(raw.trim());
        (!key.is_empty()).then_some(key)
    }
}

/// Engine credential, zeroed on drop and redacted from debug output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: &str) -> Self {
        Self(key.to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
