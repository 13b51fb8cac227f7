// crates/preflight-core/src/error.rs
// ============================================================================
// Module: Validation Errors
// Description: Error taxonomy, ordered error collector, and programming errors.
// Purpose: Represent invalid configuration as data rather than as failure.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! An invalid configuration is the expected output of a preflight check, so it
//! is represented as an [`ErrorList`] value. Each [`ValidationError`] carries a
//! stable [`ErrorKind`], the rule that produced it, and a human-readable
//! message. [`PreflightError`] is reserved for misuse of the validator itself.
//!
//! ## Invariants
//! - [`ErrorList`] preserves insertion order and never deduplicates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::feature::Feature;

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Classification of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A numeric or network value lies outside an allowed bound.
    OutOfRange,
    /// A value is present but fails to parse or names an unknown choice.
    Malformed,
    /// A required value is absent.
    Missing,
    /// Settings imply a capability whose feature gate is disabled.
    FeatureGateRequired,
    /// A feature gate requires another gate that is disabled.
    FeatureDependencyUnmet,
    /// Related settings were supplied partially or contradict each other.
    InconsistentSettings,
}

impl ErrorKind {
    /// Returns the snake case label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutOfRange => "out_of_range",
            Self::Malformed => "malformed",
            Self::Missing => "missing",
            Self::FeatureGateRequired => "feature_gate_required",
            Self::FeatureDependencyUnmet => "feature_dependency_unmet",
            Self::InconsistentSettings => "inconsistent_settings",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Validation Error
// ============================================================================

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Kind of the finding.
    pub kind: ErrorKind,
    /// Identifier of the rule that produced the finding.
    pub rule: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    /// Builds a finding.
    pub fn new(kind: ErrorKind, rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.rule, self.message)
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// SECTION: Error List
// ============================================================================

/// Ordered collection of validation findings.
///
/// Validators build one of these and return it; the orchestrator appends each
/// sub-result in a fixed order. An empty list means the configuration is
/// valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorList {
    /// Findings in the order the checks ran.
    errors: Vec<ValidationError>,
}

impl ErrorList {
    /// Returns an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            errors: Vec::new(),
        }
    }

    /// Appends a finding built from its parts.
    pub fn push(&mut self, kind: ErrorKind, rule: &'static str, message: impl Into<String>) {
        self.errors.push(ValidationError::new(kind, rule, message));
    }

    /// Appends every finding of `other`, preserving its order.
    pub fn append(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }

    /// Returns true when no findings were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of findings.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates over the findings in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Returns the kinds of the findings in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.errors.iter().map(|error| error.kind).collect()
    }

    /// Counts the findings of one kind.
    #[must_use]
    pub fn count_kind(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|error| error.kind == kind).count()
    }

    /// Returns the findings as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.errors
    }
}

impl IntoIterator for ErrorList {
    type IntoIter = std::vec::IntoIter<ValidationError>;
    type Item = ValidationError;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type IntoIter = std::slice::Iter<'a, ValidationError>;
    type Item = &'a ValidationError;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorList {}

// ============================================================================
// SECTION: Programming Errors
// ============================================================================

/// Misuse of the validator, as opposed to invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreflightError {
    /// The feature gate oracle has no state for a queried feature.
    #[error("feature gate oracle has no state for {0}; gates must be initialized first")]
    UnregisteredFeature(Feature),
    /// No API type registries were supplied.
    #[error("api enablement requires at least one type registry")]
    NoRegistries,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
