// crates/preflight-config/src/validation.rs
// ============================================================================
// Module: Preflight Validation
// Description: Field-level checks, feature-dependency checks, and the
//              orchestrator that runs them all in a fixed order.
// Purpose: Turn a completed options snapshot into a complete error list.
// Dependencies: ipnetwork, preflight-core, tracing
// ============================================================================

//! ## Overview
//! Every validator here is a pure function over shared references that
//! returns an [`ErrorList`]. Validators evaluate all of their rules and never
//! return early, so one finding never hides another. The orchestrator,
//! [`ServerRunOptions::validate`], concatenates the sub-results in a fixed
//! order and picks exactly one of the two token delivery validators.
//!
//! ## Invariants
//! - Validation never mutates the options, the gates, or the registries.
//! - The same inputs always produce the same list, in the same order.
//! - Misconfiguration is never an `Err`; only collaborator misuse is.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use preflight_core::ErrorKind;
use preflight_core::ErrorList;
use preflight_core::Feature;
use preflight_core::FeatureGate;
use preflight_core::MAX_PORT;
use preflight_core::PreflightError;
use preflight_core::RegistrySet;
use preflight_core::host_bits;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::options::ServerRunOptions;
use crate::options::TokenSigner;
use crate::options::key_service_url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest host portion, in bits, allowed for the service cluster IP range.
pub const MAX_SERVICE_CLUSTER_HOST_BITS: u8 = 20;

/// Rule identifier for the API server count check.
const RULE_APISERVER_COUNT: &str = "apiserver-count";
/// Rule identifier for the proxy allowlist check.
const RULE_PROXY_ALLOWLIST: &str = "proxy-cidr-allowlist";
/// Rule identifier for the service cluster IP range check.
const RULE_CLUSTER_IP_RANGE: &str = "service-cluster-ip-range";
/// Rule identifier for the master service node port check.
const RULE_SERVICE_NODE_PORT: &str = "kubernetes-service-node-port";
/// Rule identifier for local key file token delivery.
const RULE_TOKEN_REQUEST: &str = "token-request";
/// Rule identifier for external key service token delivery.
const RULE_EXTERNAL_KEY_SERVICE: &str = "external-key-service";

/// Shared message for the bound volume dependency, reported by both branches.
const BOUND_VOLUME_DEPENDENCY: &str = "the BoundServiceAccountTokenVolume feature depends on the \
                                       TokenRequest feature, but the TokenRequest feature is not \
                                       enabled";

// ============================================================================
// SECTION: Context
// ============================================================================

/// Collaborators the orchestrator consults besides the options themselves.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Feature gate oracle.
    pub gates: &'a dyn FeatureGate,
    /// API type registries consulted for runtime enablement.
    pub registries: &'a RegistrySet,
}

impl<'a> ValidationContext<'a> {
    /// Bundles the gate oracle and the registries.
    #[must_use]
    pub fn new(gates: &'a dyn FeatureGate, registries: &'a RegistrySet) -> Self {
        Self {
            gates,
            registries,
        }
    }
}

impl fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("registries", self.registries)
            .finish_non_exhaustive()
    }
}

/// Gate states resolved once per validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSnapshot {
    /// State of [`Feature::TokenRequest`].
    pub token_request: bool,
    /// State of [`Feature::BoundServiceAccountTokenVolume`].
    pub bound_token_volume: bool,
    /// State of [`Feature::ExternalKeyService`].
    pub external_key_service: bool,
}

impl GateSnapshot {
    /// Reads every gate the validators depend on.
    ///
    /// # Errors
    ///
    /// Returns [`PreflightError::UnregisteredFeature`] when the oracle has no
    /// state for one of them.
    pub fn resolve(gates: &dyn FeatureGate) -> Result<Self, PreflightError> {
        let read = |feature: Feature| {
            gates.state(feature).ok_or(PreflightError::UnregisteredFeature(feature))
        };
        Ok(Self {
            token_request: read(Feature::TokenRequest)?,
            bound_token_volume: read(Feature::BoundServiceAccountTokenVolume)?,
            external_key_service: read(Feature::ExternalKeyService)?,
        })
    }

    /// Returns the token delivery mode these gates select.
    #[must_use]
    pub const fn delivery_mode(&self) -> DeliveryMode {
        if self.external_key_service {
            DeliveryMode::ExternalKeyService
        } else {
            DeliveryMode::LocalKeyFile
        }
    }

    /// Returns true when the bound volume gate is on without its prerequisite.
    const fn bound_volume_unmet(&self) -> bool {
        self.bound_token_volume && !self.token_request
    }
}

/// How service-account tokens get their signing material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// A private key file on local disk.
    LocalKeyFile,
    /// An external key service.
    ExternalKeyService,
}

impl DeliveryMode {
    /// Returns the mode label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalKeyFile => "local-key-file",
            Self::ExternalKeyService => "external-key-service",
        }
    }
}

// ============================================================================
// SECTION: Field Validators
// ============================================================================

/// Requires a positive API server count.
#[must_use]
pub fn validate_apiserver_count(options: &ServerRunOptions) -> ErrorList {
    let mut errs = ErrorList::new();
    if options.apiserver_count <= 0 {
        errs.push(
            ErrorKind::OutOfRange,
            RULE_APISERVER_COUNT,
            format!(
                "--apiserver-count should be a positive number, but value '{}' provided",
                options.apiserver_count
            ),
        );
    }
    errs
}

/// Reports one error per allowlist entry that is not a valid network.
#[must_use]
pub fn validate_proxy_cidr_allowlist(options: &ServerRunOptions) -> ErrorList {
    let mut errs = ErrorList::new();
    for entry in options.proxy_cidr_allowlist.iter().filter(|entry| entry.network().is_none()) {
        errs.push(
            ErrorKind::Malformed,
            RULE_PROXY_ALLOWLIST,
            format!("invalid --proxy-cidr-allowlist entry specified: {}", entry.raw()),
        );
    }
    errs
}

/// Requires a service cluster IP range no wider than 20 host bits.
///
/// The size rule only applies to a present range, so at most one error is
/// reported.
#[must_use]
pub fn validate_service_cluster_ip_range(options: &ServerRunOptions) -> ErrorList {
    let mut errs = ErrorList::new();
    match options.service_cluster_ip_range {
        None => {
            errs.push(
                ErrorKind::Missing,
                RULE_CLUSTER_IP_RANGE,
                "no --service-cluster-ip-range specified",
            );
        }
        Some(range) if host_bits(&range) > MAX_SERVICE_CLUSTER_HOST_BITS => {
            errs.push(
                ErrorKind::OutOfRange,
                RULE_CLUSTER_IP_RANGE,
                format!("specified --service-cluster-ip-range {range} is too large"),
            );
        }
        Some(_) => {}
    }
    errs
}

/// Checks the master service node port.
///
/// The port must be a valid port number. A valid non-zero port must also
/// fall inside the node port range; zero disables the node port entirely.
#[must_use]
pub fn validate_service_node_port(options: &ServerRunOptions) -> ErrorList {
    let mut errs = ErrorList::new();
    let port = i64::from(options.kubernetes_service_node_port);
    let valid = (0 ..= MAX_PORT).contains(&port);
    if !valid {
        errs.push(
            ErrorKind::OutOfRange,
            RULE_SERVICE_NODE_PORT,
            format!(
                "--kubernetes-service-node-port {port} must be between 0 and 65535, inclusive. If \
                 0, the Kubernetes master service will be of type ClusterIP"
            ),
        );
    }
    let range = options.service_node_port_range;
    if valid && port > 0 && !range.contains(port) {
        errs.push(
            ErrorKind::OutOfRange,
            RULE_SERVICE_NODE_PORT,
            format!("kubernetes service port range {range} doesn't contain {port}"),
        );
    }
    errs
}

// ============================================================================
// SECTION: Feature-Dependency Validators
// ============================================================================

/// Checks token issuance backed by a local signing key file.
///
/// Issuance is attempted when a signing key file, an issuer, or API audiences
/// are set. It succeeded only when completion derived an issuer signing with
/// a local key file; a key service signer does not count in this mode. All
/// four rules are evaluated.
#[must_use]
pub fn validate_token_request(options: &ServerRunOptions, gates: &GateSnapshot) -> ErrorList {
    let mut errs = ErrorList::new();
    let attempted = options.signing_key_file().is_some()
        || options.authentication.service_accounts.issuer().is_some()
        || !options.authentication.api_audiences.is_empty();
    let succeeded = options
        .service_account_issuer
        .as_ref()
        .is_some_and(|issuer| matches!(issuer.signer, TokenSigner::KeyFile(_)));

    if attempted && !gates.token_request {
        errs.push(
            ErrorKind::FeatureGateRequired,
            RULE_TOKEN_REQUEST,
            "the TokenRequest feature is not enabled but --service-account-signing-key-file, \
             --service-account-issuer and/or --api-audiences flags were passed",
        );
    }
    if gates.bound_volume_unmet() {
        errs.push(ErrorKind::FeatureDependencyUnmet, RULE_TOKEN_REQUEST, BOUND_VOLUME_DEPENDENCY);
    }
    if !attempted && gates.bound_token_volume {
        errs.push(
            ErrorKind::Missing,
            RULE_TOKEN_REQUEST,
            "--service-account-signing-key-file and --service-account-issuer are required flags",
        );
    }
    if attempted && !succeeded {
        errs.push(
            ErrorKind::InconsistentSettings,
            RULE_TOKEN_REQUEST,
            "--service-account-signing-key-file, --service-account-issuer, and --api-audiences \
             should be specified together",
        );
    }
    errs
}

/// Checks token issuance backed by an external key service.
///
/// Issuance is attempted when a key service URL is set and requires an
/// issuer. All five rules are evaluated.
#[must_use]
pub fn validate_external_key_service(
    options: &ServerRunOptions,
    gates: &GateSnapshot,
) -> ErrorList {
    let mut errs = ErrorList::new();
    let service_accounts = &options.authentication.service_accounts;
    let key_service = service_accounts.key_service_url();
    let issuer_set = service_accounts.issuer().is_some();

    if key_service.is_some() && !gates.external_key_service {
        errs.push(
            ErrorKind::FeatureGateRequired,
            RULE_EXTERNAL_KEY_SERVICE,
            "the ExternalKeyService feature is not enabled but --key-service-url flag was passed",
        );
    }
    if gates.external_key_service && !gates.token_request {
        errs.push(
            ErrorKind::FeatureDependencyUnmet,
            RULE_EXTERNAL_KEY_SERVICE,
            "the ExternalKeyService feature depends on the TokenRequest feature, but the \
             TokenRequest feature is not enabled",
        );
    }
    if gates.bound_volume_unmet() {
        errs.push(
            ErrorKind::FeatureDependencyUnmet,
            RULE_EXTERNAL_KEY_SERVICE,
            BOUND_VOLUME_DEPENDENCY,
        );
    }
    if let Some(url) = key_service
        && key_service_url(url).is_none()
    {
        errs.push(
            ErrorKind::Malformed,
            RULE_EXTERNAL_KEY_SERVICE,
            format!("--key-service-url {url} must be an absolute http or https URL"),
        );
    }
    if key_service.is_some() && !issuer_set {
        errs.push(
            ErrorKind::Missing,
            RULE_EXTERNAL_KEY_SERVICE,
            "the --key-service-url flag requires --service-account-issuer",
        );
    }
    errs
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

impl ServerRunOptions {
    /// Runs every check and returns all findings in execution order.
    ///
    /// The order is fixed: API server count, etcd, proxy allowlist, service
    /// cluster IP range, node port, secure serving, authentication,
    /// authorization, audit, admission, insecure serving, API enablement, and
    /// finally the token delivery validator selected by the
    /// [`Feature::ExternalKeyService`] gate. An empty list means the options
    /// are valid.
    ///
    /// # Errors
    ///
    /// Returns [`PreflightError`] when the gate oracle lacks a state for a
    /// queried feature or no API type registry was supplied. Invalid options
    /// are never an error.
    pub fn validate(&self, context: &ValidationContext<'_>) -> Result<ErrorList, PreflightError> {
        let gates = GateSnapshot::resolve(context.gates)?;
        if context.registries.is_empty() {
            return Err(PreflightError::NoRegistries);
        }

        let mut errs = ErrorList::new();
        run_stage(&mut errs, "apiserver-count", validate_apiserver_count(self));
        run_stage(&mut errs, "etcd", self.etcd.validate());
        run_stage(&mut errs, "proxy-cidr-allowlist", validate_proxy_cidr_allowlist(self));
        run_stage(&mut errs, "service-cluster-ip-range", validate_service_cluster_ip_range(self));
        run_stage(&mut errs, "kubernetes-service-node-port", validate_service_node_port(self));
        run_stage(&mut errs, "secure-serving", self.secure_serving.validate());
        run_stage(&mut errs, "authentication", self.authentication.validate());
        run_stage(&mut errs, "authorization", self.authorization.validate());
        run_stage(&mut errs, "audit", self.audit.validate());
        run_stage(&mut errs, "admission", self.admission.validate());
        run_stage(&mut errs, "insecure-serving", self.insecure_serving.validate());
        run_stage(&mut errs, "api-enablement", self.api_enablement.validate(context.registries));

        let mode = gates.delivery_mode();
        debug!(mode = mode.as_str(), "selected token delivery validator");
        let delivery = match mode {
            DeliveryMode::ExternalKeyService => validate_external_key_service(self, &gates),
            DeliveryMode::LocalKeyFile => validate_token_request(self, &gates),
        };
        run_stage(&mut errs, mode.as_str(), delivery);

        if errs.is_empty() {
            info!("preflight validation passed");
        } else {
            warn!(errors = errs.len(), "preflight validation found invalid options");
        }
        Ok(errs)
    }
}

/// Appends one stage's findings and records its count.
fn run_stage(errs: &mut ErrorList, stage: &'static str, found: ErrorList) {
    debug!(stage, errors = found.len(), "validator finished");
    errs.append(found);
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

    use preflight_core::CidrEntry;
    use preflight_core::FeatureGates;

    use super::*;

    /// Gate snapshot with every feature at its default.
    fn default_gates() -> GateSnapshot {
        GateSnapshot::resolve(&FeatureGates::new()).unwrap()
    }

    #[test]
    fn count_must_be_positive() {
        let mut options = ServerRunOptions::default();
        assert!(validate_apiserver_count(&options).is_empty());
        options.apiserver_count = 0;
        let errs = validate_apiserver_count(&options);
        assert_eq!(errs.kinds(), vec![ErrorKind::OutOfRange]);
        assert!(errs.as_slice()[0].message.contains("'0'"));
    }

    #[test]
    fn allowlist_reports_each_bad_entry() {
        let mut options = ServerRunOptions::default();
        options.proxy_cidr_allowlist = vec![
            CidrEntry::parse("10.0.0.0/8"),
            CidrEntry::parse("nope"),
            CidrEntry::parse("fd00::/64"),
            CidrEntry::parse("1.2.3.4/40"),
        ];
        assert_eq!(validate_proxy_cidr_allowlist(&options).count_kind(ErrorKind::Malformed), 2);
    }

    #[test]
    fn cluster_range_boundary_is_twenty_bits() {
        let mut options = ServerRunOptions::default();
        options.service_cluster_ip_range = Some("10.0.0.0/12".parse().unwrap());
        assert!(validate_service_cluster_ip_range(&options).is_empty());
        options.service_cluster_ip_range = Some("10.0.0.0/11".parse().unwrap());
        assert_eq!(validate_service_cluster_ip_range(&options).kinds(), vec![
            ErrorKind::OutOfRange
        ]);
        options.service_cluster_ip_range = None;
        assert_eq!(validate_service_cluster_ip_range(&options).kinds(), vec![ErrorKind::Missing]);
    }

    #[test]
    fn node_port_rules() {
        let mut options = ServerRunOptions::default();
        options.kubernetes_service_node_port = 30_080;
        assert!(validate_service_node_port(&options).is_empty());
        options.kubernetes_service_node_port = 8_080;
        assert_eq!(validate_service_node_port(&options).kinds(), vec![ErrorKind::OutOfRange]);
        options.kubernetes_service_node_port = -1;
        assert_eq!(validate_service_node_port(&options).len(), 1);
    }

    #[test]
    fn delivery_mode_follows_external_key_service_gate() {
        let mut gates = default_gates();
        assert_eq!(gates.delivery_mode(), DeliveryMode::LocalKeyFile);
        gates.external_key_service = true;
        assert_eq!(gates.delivery_mode(), DeliveryMode::ExternalKeyService);
    }

    #[test]
    fn token_request_defaults_are_silent() {
        assert!(validate_token_request(&ServerRunOptions::default(), &default_gates()).is_empty());
    }

    #[test]
    fn malformed_key_service_url_is_reported() {
        let mut options = ServerRunOptions::default();
        options.authentication.service_accounts.issuer = Some("issuer".to_string());
        options.authentication.service_accounts.key_service_url = Some("keys:9000".to_string());
        let mut gates = default_gates();
        gates.external_key_service = true;
        assert_eq!(validate_external_key_service(&options, &gates).kinds(), vec![
            ErrorKind::Malformed
        ]);
    }
}
