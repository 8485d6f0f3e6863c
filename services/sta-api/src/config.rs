//! Server configuration loading and types.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sta_core::CoreConfig;
use std::path::Path;

/// Server configuration, optionally loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Public root of the service, used in self links.
    pub base_url: String,

    /// Paging defaults and observation handling.
    pub core: CoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1.1".to_string(),
            core: CoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;
        let mut config: ServerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse: {:?}", path))?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::info!(
            base_url = %config.base_url,
            default_top = config.core.default_top,
            max_top = config.core.max_top,
            "Loaded server configuration from {:?}",
            path
        );
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                tracing::warn!("No configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url: https://sta.example.org/v1.1/\ncore:\n  max_top: 500\n  derive_feature_of_interest: false"
        )
        .unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url, "https://sta.example.org/v1.1");
        assert_eq!(config.core.max_top, 500);
        assert_eq!(config.core.default_top, CoreConfig::default().default_top);
        assert!(!config.core.derive_feature_of_interest);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ServerConfig::load(&dir.path().join("absent.yaml")).is_err());
    }

    #[test]
    fn test_defaults_without_file() {
        let config = ServerConfig::load_or_default(None).unwrap();
        assert!(config.core.derive_feature_of_interest);
        assert!(config.base_url.ends_with("/v1.1"));
    }
}
