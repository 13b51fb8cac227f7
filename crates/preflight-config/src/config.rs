// crates/preflight-config/src/config.rs
// ============================================================================
// Module: Preflight Configuration File
// Description: Loading of server options and feature gates from TOML.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: preflight-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! A preflight file holds a `[feature_gates]` table and a `[server]` table.
//! Loading enforces path and size limits, rejects unknown fields, and runs the
//! completion step so the returned options are ready to validate. Loading
//! never validates the options themselves; invalid options come back from
//! [`PreflightConfig::validate`] as an error list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use preflight_core::ErrorList;
use preflight_core::FeatureGates;
use preflight_core::PreflightError;
use preflight_core::RegistrySet;
use serde::Deserialize;
use thiserror::Error;

use crate::options::ServerRunOptions;
use crate::validation::ValidationContext;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "apiserver-preflight.toml";
/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "APISERVER_PREFLIGHT_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Feature gates and server options loaded together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreflightConfig {
    /// Feature gate overrides on top of the defaults.
    #[serde(default)]
    pub feature_gates: FeatureGates,
    /// Server run options.
    #[serde(default)]
    pub server: ServerRunOptions,
}

impl PreflightConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path comes from `path`, then `APISERVER_PREFLIGHT_CONFIG`, then
    /// `apiserver-preflight.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path);
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid(
                "preflight file exceeds the 1 MiB size limit".to_string(),
            ));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("preflight file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses configuration from TOML text and completes the options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not a valid
    /// configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.server.complete();
        Ok(config)
    }

    /// Validates the server options against this file's feature gates.
    ///
    /// # Errors
    ///
    /// Returns [`PreflightError`] only when `registries` is empty.
    pub fn validate(&self, registries: &RegistrySet) -> Result<ErrorList, PreflightError> {
        self.server.validate(&ValidationContext::new(&self.feature_gates, registries))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Picks the preflight file: explicit argument, then the environment
/// variable, then the default name in the working directory.
fn resolve_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Rejects preflight file paths beyond the total or per-component limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let total = path.as_os_str().len();
    if total > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "preflight file path is {total} bytes, limit is {MAX_TOTAL_PATH_LENGTH}"
        )));
    }
    if let Some(component) = path
        .components()
        .map(Component::as_os_str)
        .find(|component| component.len() > MAX_PATH_COMPONENT_LENGTH)
    {
        return Err(ConfigError::Invalid(format!(
            "preflight file path component '{}' is too long (limit {MAX_PATH_COMPONENT_LENGTH} \
             bytes)",
            component.to_string_lossy()
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use preflight_core::Feature;
    use preflight_core::FeatureGate;

    use super::*;

    #[test]
    fn explicit_path_wins() {
        let resolved = resolve_path(Some(Path::new("custom.toml")));
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }

    #[test]
    fn validate_path_rejects_long_component() {
        let long = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let err = validate_path(Path::new(&long)).unwrap_err();
        assert!(err.to_string().contains("is too long"));
    }

    #[test]
    fn validate_path_rejects_long_path() {
        let long = "a/".repeat(MAX_TOTAL_PATH_LENGTH / 2 + 1);
        let err = validate_path(Path::new(&long)).unwrap_err();
        assert!(err.to_string().starts_with("invalid config: preflight file path is"));
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let config = PreflightConfig::from_toml_str("").unwrap();
        assert_eq!(config, PreflightConfig::default());
    }

    #[test]
    fn gates_and_server_sections_parse() {
        let config = PreflightConfig::from_toml_str(
            r#"
            [feature_gates]
            ExternalKeyService = true

            [server]
            apiserver_count = 3
            service_node_port_range = "30000-30100"
            "#,
        )
        .unwrap();
        assert_eq!(config.feature_gates.state(Feature::ExternalKeyService), Some(true));
        assert_eq!(config.server.apiserver_count, 3);
        assert_eq!(config.server.service_node_port_range.to_string(), "30000-30100");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = PreflightConfig::from_toml_str("[server]\nmaster_count = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err =
            PreflightConfig::from_toml_str("[feature_gates]\nNoSuchGate = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loading_runs_completion() {
        let config = PreflightConfig::from_toml_str(
            r#"
            [server]
            service_account_signing_key_file = "/etc/kubernetes/sa.key"

            [server.authentication.service_accounts]
            issuer = "https://kubernetes.default.svc"
            "#,
        )
        .unwrap();
        assert!(config.server.service_account_issuer.is_some());
        assert_eq!(config.server.authentication.api_audiences, vec![
            "https://kubernetes.default.svc".to_string()
        ]);
    }
}
