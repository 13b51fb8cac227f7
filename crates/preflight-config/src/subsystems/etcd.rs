// crates/preflight-config/src/subsystems/etcd.rs
// ============================================================================
// Module: Etcd Storage Options
// Description: Storage backend connection and cache settings.
// Purpose: Validate etcd settings as an opaque subsystem for the orchestrator.
// Dependencies: preflight-core, serde, url
// ============================================================================

//! ## Overview
//! Only the settings the preflight check can judge offline are modeled: the
//! server URLs, the storage backend, and the watch cache sizes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use preflight_core::ErrorKind;
use preflight_core::ErrorList;
use serde::Deserialize;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Rule identifier for etcd findings.
const RULE: &str = "etcd";
/// Only supported storage backend.
const STORAGE_BACKEND_ETCD3: &str = "etcd3";

// ============================================================================
// SECTION: Options
// ============================================================================

/// Etcd storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtcdOptions {
    /// Etcd server URLs.
    pub servers: Vec<String>,
    /// Key prefix for all resources.
    pub prefix: String,
    /// Storage backend; empty selects the default.
    pub storage_backend: String,
    /// Default watch cache size; zero disables caching for unlisted resources.
    pub default_watch_cache_size: i32,
    /// Per-resource watch cache sizes as `resource#size`.
    pub watch_cache_sizes: Vec<String>,
}

impl Default for EtcdOptions {
    fn default() -> Self {
        Self {
            servers: vec!["http://127.0.0.1:2379".to_string()],
            prefix: "/registry".to_string(),
            storage_backend: String::new(),
            default_watch_cache_size: 100,
            watch_cache_sizes: Vec::new(),
        }
    }
}

impl EtcdOptions {
    /// Validates etcd settings, reporting every finding.
    #[must_use]
    pub fn validate(&self) -> ErrorList {
        let mut errs = ErrorList::new();
        if self.servers.is_empty() {
            errs.push(ErrorKind::Missing, RULE, "--etcd-servers must be specified");
        }
        for server in &self.servers {
            if !is_server_url(server) {
                errs.push(
                    ErrorKind::Malformed,
                    RULE,
                    format!("--etcd-servers entry '{server}' is not a valid URL"),
                );
            }
        }
        if !self.storage_backend.is_empty() && self.storage_backend != STORAGE_BACKEND_ETCD3 {
            errs.push(
                ErrorKind::Malformed,
                RULE,
                format!(
                    "--storage-backend invalid, allowed values: {STORAGE_BACKEND_ETCD3}. If not \
                     specified, it will default to '{STORAGE_BACKEND_ETCD3}'"
                ),
            );
        }
        if self.default_watch_cache_size < 0 {
            errs.push(
                ErrorKind::OutOfRange,
                RULE,
                format!(
                    "--default-watch-cache-size {} must not be negative",
                    self.default_watch_cache_size
                ),
            );
        }
        for entry in &self.watch_cache_sizes {
            if !valid_watch_cache_size(entry) {
                errs.push(
                    ErrorKind::Malformed,
                    RULE,
                    format!("--watch-cache-sizes entry '{entry}' must be resource#size"),
                );
            }
        }
        errs
    }
}

/// Returns true when `server` parses as a URL with a host.
fn is_server_url(server: &str) -> bool {
    Url::parse(server.trim()).is_ok_and(|url| url.host_str().is_some())
}

/// Returns true for a `resource#size` entry with a non-negative size.
fn valid_watch_cache_size(entry: &str) -> bool {
    entry.split_once('#').is_some_and(|(resource, size)| {
        !resource.trim().is_empty() && size.trim().parse::<u32>().is_ok()
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EtcdOptions::default().validate().is_empty());
    }

    #[test]
    fn every_finding_is_reported() {
        let options = EtcdOptions {
            servers: Vec::new(),
            storage_backend: "etcd2".to_string(),
            default_watch_cache_size: -1,
            watch_cache_sizes: vec!["pods#10".to_string(), "nodes".to_string()],
            ..EtcdOptions::default()
        };
        assert_eq!(options.validate().kinds(), vec![
            ErrorKind::Missing,
            ErrorKind::Malformed,
            ErrorKind::OutOfRange,
            ErrorKind::Malformed
        ]);
    }

    #[test]
    fn server_urls_must_parse() {
        let options = EtcdOptions {
            servers: vec!["https://etcd-0:2379".to_string(), "127.0.0.1:2379".to_string()],
            ..EtcdOptions::default()
        };
        assert_eq!(options.validate().count_kind(ErrorKind::Malformed), 1);
    }
}
