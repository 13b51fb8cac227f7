// crates/preflight-core/src/lib.rs
// ============================================================================
// Module: Preflight Core Library
// Description: Shared vocabulary for control-plane startup validation.
// Purpose: Feature gates, error taxonomy, network values, and API registries.
// Dependencies: ipnetwork, serde, thiserror
// ============================================================================

//! ## Overview
//! `preflight-core` holds the types every preflight validator speaks in: the
//! read-only [`FeatureGate`] oracle, the [`ErrorList`] that validators return,
//! parsed network settings, and the group-version registries consulted for
//! API enablement. It performs no validation of its own.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod feature;
pub mod net;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::ErrorKind;
pub use error::ErrorList;
pub use error::PreflightError;
pub use error::ValidationError;
pub use feature::Feature;
pub use feature::FeatureGate;
pub use feature::FeatureGateError;
pub use feature::FeatureGates;
pub use feature::FeatureStage;
pub use net::CidrEntry;
pub use net::MAX_PORT;
pub use net::PortRange;
pub use net::PortRangeError;
pub use net::host_bits;
pub use registry::GroupVersion;
pub use registry::GroupVersionError;
pub use registry::GroupVersionRegistry;
pub use registry::RegistrySet;
pub use registry::StaticRegistry;
