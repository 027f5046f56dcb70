//! Application configuration loaded from YAML.
//!
//! ```yaml
//! http:
//!   bind: "0.0.0.0:8080"
//! security:
//!   bearer:
//!     signature: "change-me"
//!     token_url: "token"
//! logging:
//!   level: info
//!   format: pretty
//! ```
//!
//! Every section and key is optional. Logging settings from the environment
//! (`ROUTEBIND_LOG_*`) win over the file.

use crate::logging::{LogConfig, LogFormat};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_SIGNATURE: &str = "dev-signature";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    pub bearer: BearerConfig,
}

/// Settings of the demo's bearer scheme.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BearerConfig {
    /// Shared signature tokens must carry
    pub signature: String,
    pub token_url: String,
}

impl Default for BearerConfig {
    fn default() -> Self {
        Self {
            signature: DEFAULT_SIGNATURE.to_string(),
            token_url: "token".to_string(),
        }
    }
}

impl std::fmt::Debug for BearerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerConfig")
            .field("signature", &"<redacted>")
            .field("token_url", &self.token_url)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

impl AppConfig {
    /// Read and parse a YAML file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse YAML text; an empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML or unknown keys.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("Failed to parse YAML configuration")
    }

    /// Load `path` when given, defaults otherwise.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Logging settings: environment first, then this file, then defaults.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::from_env();
        if env::var("ROUTEBIND_LOG_LEVEL").is_err() {
            if let Some(level) = &self.logging.level {
                config.log_level = level.clone();
            }
        }
        if env::var("ROUTEBIND_LOG_FORMAT").is_err() {
            if let Some(format) = self.logging.format {
                config.format = format;
            }
        }
        config
    }

    /// Warn when the bearer signature was left at its built-in value.
    pub fn warn_insecure_defaults(&self) {
        if self.security.bearer.signature == DEFAULT_SIGNATURE {
            warn!("security.bearer.signature is the built-in development value; set it in the config file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(AppConfig::from_yaml_str("").unwrap(), AppConfig::default());
        assert_eq!(AppConfig::default().http.bind, DEFAULT_BIND);
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = AppConfig::from_yaml_str(
            "security:\n  bearer:\n    signature: s3cret\nlogging:\n  format: pretty\n",
        )
        .unwrap();
        assert_eq!(config.security.bearer.signature, "s3cret");
        assert_eq!(config.security.bearer.token_url, "token");
        assert_eq!(config.logging.format, Some(LogFormat::Pretty));
        assert_eq!(config.http, HttpConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(AppConfig::from_yaml_str("http:\n  port: 80\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "http:\n  bind: \"127.0.0.1:9000\"").unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.http.bind, "127.0.0.1:9000");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = AppConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn test_debug_redacts_signature() {
        let config = AppConfig::default();
        assert!(!format!("{config:?}").contains(DEFAULT_SIGNATURE));
    }
}
