// crates/preflight-config/tests/common/mod.rs
// =============================================================================
// Module: Preflight Test Helpers
// Description: Shared helpers for options validation tests.
// Purpose: Reduce duplication across integration tests for preflight-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use preflight_config::ConfigError;
use preflight_config::PreflightConfig;
use preflight_config::ServerRunOptions;
use preflight_config::ValidationContext;
use preflight_core::ErrorKind;
use preflight_core::ErrorList;
use preflight_core::Feature;
use preflight_core::FeatureGates;
use preflight_core::RegistrySet;

/// Parses a TOML document into completed options.
pub fn options_from_toml(toml_str: &str) -> Result<ServerRunOptions, ConfigError> {
    Ok(PreflightConfig::from_toml_str(toml_str)?.server)
}

/// Returns a gate table with defaults plus the given overrides.
pub fn gates_with(overrides: &[(Feature, bool)]) -> FeatureGates {
    let mut gates = FeatureGates::new();
    for (feature, enabled) in overrides {
        gates.set(*feature, *enabled);
    }
    gates
}

/// Validates `options` against `gates` and the built-in registries.
pub fn validate_with(
    options: &ServerRunOptions,
    gates: &FeatureGates,
) -> Result<ErrorList, String> {
    let registries = RegistrySet::builtin();
    options.validate(&ValidationContext::new(gates, &registries)).map_err(|err| err.to_string())
}

/// Validates `options` against default gates.
pub fn validate_defaults(options: &ServerRunOptions) -> Result<ErrorList, String> {
    validate_with(options, &FeatureGates::new())
}

/// Returns the rule identifiers of `errs` in order.
pub fn rules(errs: &ErrorList) -> Vec<&'static str> {
    errs.iter().map(|error| error.rule).collect()
}

/// Checks that `errs` has exactly the given kinds, in order.
pub fn expect_kinds(errs: &ErrorList, expected: &[ErrorKind]) -> Result<(), String> {
    let kinds = errs.kinds();
    if kinds == expected {
        Ok(())
    } else {
        Err(format!("expected kinds {expected:?}, got {kinds:?}:\n{errs}"))
    }
}
