// crates/preflight-core/src/feature.rs
// ============================================================================
// Module: Feature Gates
// Description: Named boolean toggles that permit optional capabilities.
// Purpose: Provide the read-only feature gate oracle consumed by validation.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Feature gates are process-wide, named booleans. Validation only ever
//! queries them through the [`FeatureGate`] trait; the concrete
//! [`FeatureGates`] table is built once at startup (defaults, then file
//! overrides, then command-line overrides) and handed to the validator by
//! reference.
//!
//! ## Invariants
//! - [`FeatureGates::new`] holds a state for every [`Feature`].
//! - Lookups never mutate the table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Features
// ============================================================================

/// Maturity stage of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStage {
    /// Experimental, off by default.
    Alpha,
    /// Well tested, on by default.
    Beta,
}

impl FeatureStage {
    /// Returns the stage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
        }
    }
}

/// Features the preflight core knows how to reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Feature {
    /// Issuing signed service-account tokens through the token request API.
    TokenRequest,
    /// Mounting bound service-account tokens into pods; requires
    /// [`Feature::TokenRequest`].
    BoundServiceAccountTokenVolume,
    /// Fetching token signing material from an external key service instead
    /// of a local key file; requires [`Feature::TokenRequest`].
    ExternalKeyService,
}

impl Feature {
    /// Every known feature, in declaration order.
    pub const ALL: [Self; 3] =
        [Self::TokenRequest, Self::BoundServiceAccountTokenVolume, Self::ExternalKeyService];

    /// Returns the canonical feature name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TokenRequest => "TokenRequest",
            Self::BoundServiceAccountTokenVolume => "BoundServiceAccountTokenVolume",
            Self::ExternalKeyService => "ExternalKeyService",
        }
    }

    /// Returns the maturity stage of the feature.
    #[must_use]
    pub const fn stage(self) -> FeatureStage {
        match self {
            Self::TokenRequest => FeatureStage::Beta,
            Self::BoundServiceAccountTokenVolume | Self::ExternalKeyService => FeatureStage::Alpha,
        }
    }

    /// Returns whether the feature is enabled when no override is given.
    #[must_use]
    pub const fn default_enabled(self) -> bool {
        matches!(self.stage(), FeatureStage::Beta)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = FeatureGateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.as_str() == value)
            .ok_or_else(|| FeatureGateError::UnknownFeature(value.to_string()))
    }
}

// ============================================================================
// SECTION: Oracle
// ============================================================================

/// Read-only feature gate query interface.
pub trait FeatureGate {
    /// Returns the state of `feature`, or `None` when the gate has no state
    /// for it (the oracle was not fully initialized).
    fn state(&self, feature: Feature) -> Option<bool>;
}

impl<T: FeatureGate + ?Sized> FeatureGate for &T {
    fn state(&self, feature: Feature) -> Option<bool> {
        (**self).state(feature)
    }
}

/// Feature gate table keyed by [`Feature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGates {
    /// Effective state for each known feature.
    states: BTreeMap<Feature, bool>,
}

impl FeatureGates {
    /// Returns a table with every feature at its default state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: Feature::ALL.into_iter().map(|f| (f, f.default_enabled())).collect(),
        }
    }

    /// Returns a table with no states at all.
    ///
    /// Useful for exercising the uninitialized-oracle path; validation
    /// rejects it as a programming error.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            states: BTreeMap::new(),
        }
    }

    /// Sets the state of a feature.
    pub fn set(&mut self, feature: Feature, enabled: bool) -> &mut Self {
        self.states.insert(feature, enabled);
        self
    }

    /// Applies a `Name=bool,Name=bool` override string.
    ///
    /// Overrides are applied only when the whole string parses.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureGateError`] for unknown names, missing `=`, or
    /// values other than `true`/`false`.
    pub fn apply_spec(&mut self, spec: &str) -> Result<(), FeatureGateError> {
        let mut parsed = Vec::new();
        for pair in spec.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
            let Some((name, value)) = pair.split_once('=') else {
                return Err(FeatureGateError::MissingValue(pair.to_string()));
            };
            let feature: Feature = name.trim().parse()?;
            let enabled = parse_bool(feature, value.trim())?;
            parsed.push((feature, enabled));
        }
        for (feature, enabled) in parsed {
            self.set(feature, enabled);
        }
        Ok(())
    }

    /// Iterates over every feature with a state.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, bool)> + '_ {
        self.states.iter().map(|(feature, enabled)| (*feature, *enabled))
    }
}

impl Default for FeatureGates {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureGate for FeatureGates {
    fn state(&self, feature: Feature) -> Option<bool> {
        self.states.get(&feature).copied()
    }
}

impl TryFrom<BTreeMap<String, bool>> for FeatureGates {
    type Error = FeatureGateError;

    fn try_from(overrides: BTreeMap<String, bool>) -> Result<Self, Self::Error> {
        let mut gates = Self::new();
        for (name, enabled) in overrides {
            let feature: Feature = name.parse()?;
            gates.set(feature, enabled);
        }
        Ok(gates)
    }
}

impl<'de> Deserialize<'de> for FeatureGates {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let overrides = BTreeMap::<String, bool>::deserialize(deserializer)?;
        Self::try_from(overrides).map_err(serde::de::Error::custom)
    }
}

/// Parses a feature gate boolean value.
fn parse_bool(feature: Feature, value: &str) -> Result<bool, FeatureGateError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(FeatureGateError::InvalidValue {
            feature,
            value: other.to_string(),
        }),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building a feature gate table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureGateError {
    /// The feature name is not known.
    #[error("unrecognized feature gate: {0}")]
    UnknownFeature(String),
    /// An override pair had no `=`.
    #[error("missing bool value for feature gate pair: {0}")]
    MissingValue(String),
    /// An override value was not a boolean.
    #[error("invalid value of {feature}={value}, must be true or false")]
    InvalidValue {
        /// Feature being overridden.
        feature: Feature,
        /// Rejected value.
        value: String,
    },
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

    use super::*;

    #[test]
    fn defaults_follow_stage() {
        let gates = FeatureGates::new();
        assert_eq!(gates.state(Feature::TokenRequest), Some(true));
        assert_eq!(gates.state(Feature::BoundServiceAccountTokenVolume), Some(false));
        assert_eq!(gates.state(Feature::ExternalKeyService), Some(false));
    }

    #[test]
    fn empty_table_has_no_state() {
        let gates = FeatureGates::empty();
        assert_eq!(gates.state(Feature::TokenRequest), None);
    }

    #[test]
    fn apply_spec_is_all_or_nothing() {
        let mut gates = FeatureGates::new();
        let err = gates.apply_spec("ExternalKeyService=true,TokenRequest=maybe").unwrap_err();
        assert!(matches!(err, FeatureGateError::InvalidValue { .. }));
        assert_eq!(gates.state(Feature::ExternalKeyService), Some(false));
    }
}
