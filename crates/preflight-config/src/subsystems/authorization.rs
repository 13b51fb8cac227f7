// crates/preflight-config/src/subsystems/authorization.rs
// ============================================================================
// Module: Authorization Options
// Description: Ordered authorizer chain and per-mode settings.
// Purpose: Validate that modes are known, unique, and fully configured.
// Dependencies: preflight-core, serde
// ============================================================================

//! ## Overview
//! Authorizers run in the order given. ABAC needs a policy file and Webhook
//! needs a kubeconfig, and each file is rejected when its mode is absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::PathBuf;

use preflight_core::ErrorKind;
use preflight_core::ErrorList;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Rule identifier for authorization findings.
const RULE: &str = "authorization";
/// Attribute-based policy mode.
pub const MODE_ABAC: &str = "ABAC";
/// Webhook mode.
pub const MODE_WEBHOOK: &str = "Webhook";
/// Authorization modes the server can build.
pub const AUTHORIZATION_MODES: &[&str] =
    &["AlwaysAllow", "AlwaysDeny", MODE_ABAC, MODE_WEBHOOK, "RBAC", "Node"];

// ============================================================================
// SECTION: Options
// ============================================================================

/// Authorizer chain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorizationOptions {
    /// Authorizers in evaluation order.
    pub modes: Vec<String>,
    /// Policy file for the ABAC authorizer.
    pub policy_file: Option<PathBuf>,
    /// Kubeconfig-format file for the webhook authorizer.
    pub webhook_config_file: Option<PathBuf>,
}

impl Default for AuthorizationOptions {
    fn default() -> Self {
        Self {
            modes: vec!["AlwaysAllow".to_string()],
            policy_file: None,
            webhook_config_file: None,
        }
    }
}

impl AuthorizationOptions {
    /// Validates the authorizer chain, reporting every finding.
    #[must_use]
    pub fn validate(&self) -> ErrorList {
        let mut errs = ErrorList::new();
        if self.modes.is_empty() {
            errs.push(ErrorKind::Missing, RULE, "at least one authorization-mode must be passed");
        }
        let mut seen = BTreeSet::new();
        for mode in &self.modes {
            if !AUTHORIZATION_MODES.contains(&mode.as_str()) {
                errs.push(
                    ErrorKind::Malformed,
                    RULE,
                    format!(
                        "authorization-mode '{mode}' is not a valid mode, allowed modes: {}",
                        AUTHORIZATION_MODES.join(",")
                    ),
                );
            }
            if !seen.insert(mode.as_str()) {
                errs.push(
                    ErrorKind::InconsistentSettings,
                    RULE,
                    format!("authorization-mode '{mode}' has mode specified more than once"),
                );
            }
        }
        let abac = seen.contains(MODE_ABAC);
        let webhook = seen.contains(MODE_WEBHOOK);
        if abac && self.policy_file.is_none() {
            errs.push(
                ErrorKind::Missing,
                RULE,
                "authorization-mode ABAC's authorization policy file not passed",
            );
        }
        if !abac && self.policy_file.is_some() {
            errs.push(
                ErrorKind::InconsistentSettings,
                RULE,
                "cannot specify --authorization-policy-file without mode ABAC",
            );
        }
        if webhook && self.webhook_config_file.is_none() {
            errs.push(
                ErrorKind::Missing,
                RULE,
                "authorization-mode Webhook's authorization config file not passed",
            );
        }
        if !webhook && self.webhook_config_file.is_some() {
            errs.push(
                ErrorKind::InconsistentSettings,
                RULE,
                "cannot specify --authorization-webhook-config-file without mode Webhook",
            );
        }
        errs
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
