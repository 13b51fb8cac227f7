// crates/preflight-config/src/subsystems/admission.rs
// ============================================================================
// Module: Admission Options
// Description: Admission plugin enable/disable lists.
// Purpose: Validate plugin names against the registered plugin set.
// Dependencies: preflight-core, serde
// ============================================================================

//! ## Overview
//! Plugins are named in two lists: plugins to turn on in addition to the
//! defaults and plugins to turn off. Every name must be a registered plugin,
//! and no plugin may appear in both lists.

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

/// Rule identifier for admission findings.
const RULE: &str = "admission";

/// Admission plugins compiled into the server.
pub const REGISTERED_PLUGINS: &[&str] = &[
    "AlwaysAdmit",
    "AlwaysDeny",
    "AlwaysPullImages",
    "DefaultStorageClass",
    "DefaultTolerationSeconds",
    "DenyEscalatingExec",
    "EventRateLimit",
    "ExtendedResourceToleration",
    "LimitRanger",
    "MutatingAdmissionWebhook",
    "NamespaceAutoProvision",
    "NamespaceExists",
    "NamespaceLifecycle",
    "NodeRestriction",
    "PersistentVolumeClaimResize",
    "PodNodeSelector",
    "PodSecurityPolicy",
    "Priority",
    "ResourceQuota",
    "ServiceAccount",
    "StorageObjectInUseProtection",
    "TaintNodesByCondition",
    "ValidatingAdmissionWebhook",
];

// ============================================================================
// SECTION: Options
// ============================================================================

/// Admission chain configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdmissionOptions {
    /// Plugins enabled in addition to the defaults.
    pub enable_plugins: Vec<String>,
    /// Default plugins to turn off.
    pub disable_plugins: Vec<String>,
    /// Plugin configuration file.
    pub config_file: Option<PathBuf>,
}

impl AdmissionOptions {
    /// Validates plugin lists, reporting every finding.
    #[must_use]
    pub fn validate(&self) -> ErrorList {
        let mut errs = ErrorList::new();
        for (flag, plugins) in [
            ("enable-admission-plugins", &self.enable_plugins),
            ("disable-admission-plugins", &self.disable_plugins),
        ] {
            for plugin in plugins {
                if !REGISTERED_PLUGINS.contains(&plugin.as_str()) {
                    errs.push(
                        ErrorKind::Malformed,
                        RULE,
                        format!("{flag} plugin '{plugin}' is unknown"),
                    );
                }
            }
        }
        let overlap: Vec<&str> = self
            .enable_plugins
            .iter()
            .filter(|plugin| self.disable_plugins.contains(plugin))
            .map(String::as_str)
            .collect();
        if !overlap.is_empty() {
            errs.push(
                ErrorKind::InconsistentSettings,
                RULE,
                format!(
                    "{} in enable-admission-plugins and disable-admission-plugins overlapped",
                    overlap.join(",")
                ),
            );
        }
        errs
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
