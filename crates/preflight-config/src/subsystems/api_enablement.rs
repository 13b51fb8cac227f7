// crates/preflight-config/src/subsystems/api_enablement.rs
// ============================================================================
// Module: API Enablement Options
// Description: Runtime switches for API group versions.
// Purpose: Validate runtime-config keys against the active type registries.
// Dependencies: preflight-core, serde
// ============================================================================

//! ## Overview
//! `runtime_config` maps `api/all`, `api/legacy`, or a `group/version` key to
//! an enable switch. Group versions are checked against the registry set the
//! caller hands in.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use preflight_core::ErrorKind;
use preflight_core::ErrorList;
use preflight_core::GroupVersion;
use preflight_core::RegistrySet;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Rule identifier for API enablement findings.
const RULE: &str = "api-enablement";
/// Key toggling every API group version.
const KEY_ALL: &str = "api/all";
/// Key toggling the legacy core group.
const KEY_LEGACY: &str = "api/legacy";

// ============================================================================
// SECTION: Options
// ============================================================================

/// Runtime API enablement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiEnablementOptions {
    /// `group/version` (or `api/all`, `api/legacy`) to `true`/`false`.
    pub runtime_config: BTreeMap<String, String>,
}

impl ApiEnablementOptions {
    /// Validates runtime-config entries against `registries`.
    ///
    /// Keys are visited in sorted order so findings are deterministic.
    #[must_use]
    pub fn validate(&self, registries: &RegistrySet) -> ErrorList {
        let mut errs = ErrorList::new();
        for (key, value) in &self.runtime_config {
            if !matches!(value.trim(), "" | "true" | "false") {
                errs.push(
                    ErrorKind::Malformed,
                    RULE,
                    format!("--runtime-config {key}={value}: value must be true or false"),
                );
            }
            if key == KEY_ALL || key == KEY_LEGACY {
                continue;
            }
            match key.parse::<GroupVersion>() {
                Ok(group_version) if registries.is_registered(&group_version) => {}
                Ok(group_version) => errs.push(
                    ErrorKind::Malformed,
                    RULE,
                    format!(
                        "--runtime-config {group_version} is not registered in any of [{}]",
                        registries.names().join(", ")
                    ),
                ),
                Err(err) => errs.push(
                    ErrorKind::Malformed,
                    RULE,
                    format!("--runtime-config key invalid: {err}"),
                ),
            }
        }
        errs
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
