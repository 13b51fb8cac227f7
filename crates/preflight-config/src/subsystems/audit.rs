// crates/preflight-config/src/subsystems/audit.rs
// ============================================================================
// Module: Audit Options
// Description: Audit log and audit webhook backend settings.
// Purpose: Validate backend retention limits, formats, and delivery modes.
// Dependencies: preflight-core, serde
// ============================================================================

//! ## Overview
//! Two backends are configured here: a log file and a webhook. Retention
//! limits must not be negative. Formats and delivery modes must be known.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use preflight_core::ErrorKind;
use preflight_core::ErrorList;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Rule identifier for audit findings.
const RULE: &str = "audit";
/// Accepted log formats.
const LOG_FORMATS: &[&str] = &["legacy", "json"];
/// Accepted backend delivery modes.
const BACKEND_MODES: &[&str] = &["batch", "blocking", "blocking-strict"];

// ============================================================================
// SECTION: Options
// ============================================================================

/// Audit configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditOptions {
    /// Audit policy file; no policy means auditing is off.
    pub policy_file: Option<PathBuf>,
    /// Log file backend.
    pub log: AuditLogOptions,
    /// Webhook backend.
    pub webhook: AuditWebhookOptions,
}

/// Audit log file backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditLogOptions {
    /// Log file path; `-` writes to stdout.
    pub path: Option<PathBuf>,
    /// Days to retain old log files.
    pub max_age: i32,
    /// Number of old log files to retain.
    pub max_backups: i32,
    /// Megabytes before rotation.
    pub max_size: i32,
    /// Event line format.
    pub format: String,
    /// Delivery mode.
    pub mode: String,
}

impl Default for AuditLogOptions {
    fn default() -> Self {
        Self {
            path: None,
            max_age: 0,
            max_backups: 0,
            max_size: 0,
            format: "json".to_string(),
            mode: "blocking".to_string(),
        }
    }
}

/// Audit webhook backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditWebhookOptions {
    /// Kubeconfig-format file describing the webhook.
    pub config_file: Option<PathBuf>,
    /// Delivery mode.
    pub mode: String,
    /// Seconds to wait before retrying the first failed request.
    pub initial_backoff_secs: i64,
}

impl Default for AuditWebhookOptions {
    fn default() -> Self {
        Self {
            config_file: None,
            mode: "batch".to_string(),
            initial_backoff_secs: 10,
        }
    }
}

impl AuditOptions {
    /// Validates audit backends, reporting every finding.
    #[must_use]
    pub fn validate(&self) -> ErrorList {
        let mut errs = ErrorList::new();
        let log = &self.log;
        for (flag, value) in [
            ("--audit-log-maxage", log.max_age),
            ("--audit-log-maxbackup", log.max_backups),
            ("--audit-log-maxsize", log.max_size),
        ] {
            if value < 0 {
                errs.push(
                    ErrorKind::OutOfRange,
                    RULE,
                    format!("{flag} {value} can't be a negative number"),
                );
            }
        }
        if !LOG_FORMATS.contains(&log.format.as_str()) {
            errs.push(
                ErrorKind::Malformed,
                RULE,
                format!(
                    "invalid audit log format '{}', allowed formats are '{}'",
                    log.format,
                    LOG_FORMATS.join(",")
                ),
            );
        }
        validate_mode(&mut errs, "--audit-log-mode", &log.mode);
        let webhook = &self.webhook;
        validate_mode(&mut errs, "--audit-webhook-mode", &webhook.mode);
        if webhook.config_file.is_some() && webhook.initial_backoff_secs <= 0 {
            errs.push(
                ErrorKind::OutOfRange,
                RULE,
                format!(
                    "--audit-webhook-initial-backoff {} must be a positive number of seconds",
                    webhook.initial_backoff_secs
                ),
            );
        }
        errs
    }
}

/// Validates a backend delivery mode.
fn validate_mode(errs: &mut ErrorList, flag: &str, mode: &str) {
    if !BACKEND_MODES.contains(&mode) {
        errs.push(
            ErrorKind::Malformed,
            RULE,
            format!("invalid {flag} '{mode}', allowed modes are '{}'", BACKEND_MODES.join(",")),
        );
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AuditOptions::default().validate().is_empty());
    }

    #[test]
    fn negative_retention_reported_per_flag() {
        let mut options = AuditOptions::default();
        options.log.max_age = -1;
        options.log.max_size = -5;
        let errs = options.validate();
        assert_eq!(errs.kinds(), vec![ErrorKind::OutOfRange, ErrorKind::OutOfRange]);
        assert!(errs.as_slice()[1].message.contains("--audit-log-maxsize"));
    }

    #[test]
    fn unknown_format_and_modes() {
        let mut options = AuditOptions::default();
        options.log.format = "yaml".to_string();
        options.log.mode = "async".to_string();
        options.webhook.mode = "fire-and-forget".to_string();
        assert_eq!(options.validate().kinds(), vec![
            ErrorKind::Malformed,
            ErrorKind::Malformed,
            ErrorKind::Malformed
        ]);
    }

    #[test]
    fn webhook_backoff_only_checked_with_config() {
        let mut options = AuditOptions::default();
        options.webhook.initial_backoff_secs = 0;
        assert!(options.validate().is_empty());
        options.webhook.config_file = Some(PathBuf::from("/etc/audit-webhook.kubeconfig"));
        assert_eq!(options.validate().kinds(), vec![ErrorKind::OutOfRange]);
    }
}
