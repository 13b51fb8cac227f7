// crates/preflight-config/src/subsystems/mod.rs
// ============================================================================
// Module: Subsystem Options
// Description: Option records for the subsystems the server delegates to.
// Purpose: Group per-subsystem settings and their self-contained validators.
// Dependencies: preflight-core, serde, url
// ============================================================================

//! ## Overview
//! Each subsystem validates only its own record and returns an
//! [`ErrorList`](preflight_core::ErrorList). The orchestrator treats them as
//! opaque and never inspects their findings beyond concatenation.

pub mod admission;
pub mod api_enablement;
pub mod audit;
pub mod authentication;
pub mod authorization;
pub mod etcd;
pub mod serving;

pub use admission::AdmissionOptions;
pub use api_enablement::ApiEnablementOptions;
pub use audit::AuditLogOptions;
pub use audit::AuditOptions;
pub use audit::AuditWebhookOptions;
pub use authentication::AuthenticationOptions;
pub use authentication::OidcOptions;
pub use authentication::ServiceAccountOptions;
pub use authorization::AuthorizationOptions;
pub use etcd::EtcdOptions;
pub use serving::InsecureServingOptions;
pub use serving::SecureServingOptions;
