// crates/preflight-core/src/registry.rs
// ============================================================================
// Module: Group-Version Registries
// Description: Registries of API group versions known to the server.
// Purpose: Let API enablement settings be checked against registered types.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The server assembles its API surface from several type registries (the
//! built-in types, custom resource definitions, and the aggregation layer).
//! Runtime enablement settings may only name group versions that one of those
//! registries knows about.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ============================================================================
// SECTION: Group Versions
// ============================================================================

/// An API group and version. The legacy core group has an empty group name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupVersion {
    /// API group name; empty for the legacy core group.
    pub group: String,
    /// Version within the group.
    pub version: String,
}

impl GroupVersion {
    /// Builds a group version from its parts.
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.version)
        } else {
            write!(f, "{}/{}", self.group, self.version)
        }
    }
}

impl FromStr for GroupVersion {
    type Err = GroupVersionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let (group, version) = match value.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", value),
        };
        if version.is_empty() || version.contains('/') || (value.contains('/') && group.is_empty())
        {
            return Err(GroupVersionError(value.to_string()));
        }
        Ok(Self::new(group, version))
    }
}

/// A group version string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected group version string: '{0}'")]
pub struct GroupVersionError(pub String);

// ============================================================================
// SECTION: Registries
// ============================================================================

/// A source of registered API group versions.
pub trait GroupVersionRegistry: Send + Sync {
    /// Returns the registry name used in diagnostics.
    fn name(&self) -> &str;

    /// Returns true when the registry serves `group_version`.
    fn is_registered(&self, group_version: &GroupVersion) -> bool;
}

/// Registry backed by a fixed set of group versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRegistry {
    /// Registry name.
    name: String,
    /// Registered group versions.
    versions: BTreeSet<GroupVersion>,
}

impl StaticRegistry {
    /// Builds a registry from `group/version` strings.
    ///
    /// # Errors
    ///
    /// Returns [`GroupVersionError`] when an entry does not parse.
    pub fn from_strs<'a>(
        name: impl Into<String>,
        versions: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, GroupVersionError> {
        let versions =
            versions.into_iter().map(str::parse).collect::<Result<BTreeSet<GroupVersion>, _>>()?;
        Ok(Self {
            name: name.into(),
            versions,
        })
    }

    /// Builds a registry from parsed group versions.
    pub fn new(name: impl Into<String>, versions: impl IntoIterator<Item = GroupVersion>) -> Self {
        Self {
            name: name.into(),
            versions: versions.into_iter().collect(),
        }
    }
}

impl GroupVersionRegistry for StaticRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_registered(&self, group_version: &GroupVersion) -> bool {
        self.versions.contains(group_version)
    }
}

/// Built-in types served by the core server.
const LEGACY_GROUP_VERSIONS: &[(&str, &str)] = &[
    ("", "v1"),
    ("admissionregistration.k8s.io", "v1beta1"),
    ("apps", "v1"),
    ("apps", "v1beta1"),
    ("apps", "v1beta2"),
    ("authentication.k8s.io", "v1"),
    ("authentication.k8s.io", "v1beta1"),
    ("authorization.k8s.io", "v1"),
    ("authorization.k8s.io", "v1beta1"),
    ("autoscaling", "v1"),
    ("autoscaling", "v2beta1"),
    ("batch", "v1"),
    ("batch", "v1beta1"),
    ("batch", "v2alpha1"),
    ("certificates.k8s.io", "v1beta1"),
    ("coordination.k8s.io", "v1beta1"),
    ("events.k8s.io", "v1beta1"),
    ("extensions", "v1beta1"),
    ("networking.k8s.io", "v1"),
    ("policy", "v1beta1"),
    ("rbac.authorization.k8s.io", "v1"),
    ("rbac.authorization.k8s.io", "v1beta1"),
    ("rbac.authorization.k8s.io", "v1alpha1"),
    ("scheduling.k8s.io", "v1beta1"),
    ("scheduling.k8s.io", "v1alpha1"),
    ("settings.k8s.io", "v1alpha1"),
    ("storage.k8s.io", "v1"),
    ("storage.k8s.io", "v1beta1"),
    ("storage.k8s.io", "v1alpha1"),
];

/// Custom resource definition types.
const EXTENSIONS_GROUP_VERSIONS: &[(&str, &str)] = &[("apiextensions.k8s.io", "v1beta1")];

/// Aggregation layer types.
const AGGREGATOR_GROUP_VERSIONS: &[(&str, &str)] =
    &[("apiregistration.k8s.io", "v1"), ("apiregistration.k8s.io", "v1beta1")];

/// Builds a static registry from a constant table.
fn table_registry(name: &str, table: &[(&str, &str)]) -> StaticRegistry {
    StaticRegistry::new(
        name,
        table.iter().map(|(group, version)| GroupVersion::new(*group, *version)),
    )
}

/// The set of registries consulted for API enablement.
#[derive(Default)]
pub struct RegistrySet {
    /// Registries in lookup order.
    registries: Vec<Box<dyn GroupVersionRegistry>>,
}

impl RegistrySet {
    /// Returns an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the legacy, extensions and aggregator registries.
    #[must_use]
    pub fn builtin() -> Self {
        let mut set = Self::new();
        set.push(table_registry("legacy", LEGACY_GROUP_VERSIONS));
        set.push(table_registry("apiextensions", EXTENSIONS_GROUP_VERSIONS));
        set.push(table_registry("aggregator", AGGREGATOR_GROUP_VERSIONS));
        set
    }

    /// Adds a registry.
    pub fn push(&mut self, registry: impl GroupVersionRegistry + 'static) -> &mut Self {
        self.registries.push(Box::new(registry));
        self
    }

    /// Returns true when no registry was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }

    /// Returns the registry names in lookup order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.registries.iter().map(|registry| registry.name()).collect()
    }

    /// Returns true when any registry serves `group_version`.
    #[must_use]
    pub fn is_registered(&self, group_version: &GroupVersion) -> bool {
        self.registries.iter().any(|registry| registry.is_registered(group_version))
    }
}

impl fmt::Debug for RegistrySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrySet").field("registries", &self.names()).finish()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
