// crates/preflight-config/src/options.rs
// ============================================================================
// Module: Server Run Options
// Description: The full set of options the API server starts with.
// Purpose: Define the configuration snapshot and its completion step.
// Dependencies: ipnetwork, preflight-core, serde, url
// ============================================================================

//! ## Overview
//! [`ServerRunOptions`] is the snapshot that preflight validation inspects. It
//! is built from defaults and operator input, then completed once with
//! [`ServerRunOptions::complete`], which derives the runtime token issuer from
//! the raw service-account settings. Validation itself only ever borrows the
//! completed snapshot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::Ipv4Addr;
use std::path::Path;
use std::path::PathBuf;

use ipnetwork::IpNetwork;
use ipnetwork::Ipv4Network;
use preflight_core::CidrEntry;
use preflight_core::PortRange;
use serde::Deserialize;
use serde::Deserializer;
use url::Url;

use crate::subsystems::AdmissionOptions;
use crate::subsystems::ApiEnablementOptions;
use crate::subsystems::AuditOptions;
use crate::subsystems::AuthenticationOptions;
use crate::subsystems::AuthorizationOptions;
use crate::subsystems::EtcdOptions;
use crate::subsystems::InsecureServingOptions;
use crate::subsystems::SecureServingOptions;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default prefix length of the service cluster IP range (`10.0.0.0/24`).
const DEFAULT_SERVICE_CIDR_PREFIX: u8 = 24;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Options the API server runs with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerRunOptions {
    /// Number of API servers running in the cluster.
    pub apiserver_count: i32,
    /// Networks allowed to reach the proxy subresources.
    pub proxy_cidr_allowlist: Vec<CidrEntry>,
    /// Range that service cluster IPs are allocated from. An empty string in
    /// input means no range.
    #[serde(deserialize_with = "deserialize_optional_network")]
    pub service_cluster_ip_range: Option<IpNetwork>,
    /// Range that service node ports are allocated from.
    pub service_node_port_range: PortRange,
    /// Node port for the master service; zero keeps it a cluster IP service.
    pub kubernetes_service_node_port: i32,
    /// Private key used to sign service-account tokens.
    pub service_account_signing_key_file: Option<PathBuf>,
    /// Etcd storage settings.
    pub etcd: EtcdOptions,
    /// TLS listener settings.
    pub secure_serving: SecureServingOptions,
    /// Plain HTTP listener settings.
    pub insecure_serving: InsecureServingOptions,
    /// Authenticator settings.
    pub authentication: AuthenticationOptions,
    /// Authorizer settings.
    pub authorization: AuthorizationOptions,
    /// Audit settings.
    pub audit: AuditOptions,
    /// Admission plugin settings.
    pub admission: AdmissionOptions,
    /// Runtime API enablement.
    pub api_enablement: ApiEnablementOptions,
    /// Token issuer derived by [`ServerRunOptions::complete`]; never read
    /// from input.
    #[serde(skip)]
    pub service_account_issuer: Option<ServiceAccountTokenIssuer>,
}

impl Default for ServerRunOptions {
    fn default() -> Self {
        Self {
            apiserver_count: 1,
            proxy_cidr_allowlist: Vec::new(),
            service_cluster_ip_range: default_service_cluster_ip_range(),
            service_node_port_range: PortRange::default(),
            kubernetes_service_node_port: 0,
            service_account_signing_key_file: None,
            etcd: EtcdOptions::default(),
            secure_serving: SecureServingOptions::default(),
            insecure_serving: InsecureServingOptions::default(),
            authentication: AuthenticationOptions::default(),
            authorization: AuthorizationOptions::default(),
            audit: AuditOptions::default(),
            admission: AdmissionOptions::default(),
            api_enablement: ApiEnablementOptions::default(),
            service_account_issuer: None,
        }
    }
}

impl ServerRunOptions {
    /// Derives runtime objects from raw settings.
    ///
    /// Builds the service-account token issuer when an issuer name and a
    /// signing source are both present; a local signing key file wins over a
    /// key service. When an issuer is built and no API audiences were given,
    /// the audiences default to the issuer name. Reads no files.
    pub fn complete(&mut self) {
        self.service_account_issuer = self.derive_token_issuer();
        if let Some(issuer) = &self.service_account_issuer
            && self.authentication.api_audiences.is_empty()
        {
            self.authentication.api_audiences = vec![issuer.issuer.clone()];
        }
    }

    /// Returns the signing key file when it is set and non-empty.
    #[must_use]
    pub fn signing_key_file(&self) -> Option<&Path> {
        self.service_account_signing_key_file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Builds the token issuer from the current raw settings.
    fn derive_token_issuer(&self) -> Option<ServiceAccountTokenIssuer> {
        let service_accounts = &self.authentication.service_accounts;
        let issuer = service_accounts.issuer()?;
        let signer = if let Some(path) = self.signing_key_file() {
            TokenSigner::KeyFile(path.to_path_buf())
        } else {
            TokenSigner::KeyService(service_accounts.key_service_url().and_then(key_service_url)?)
        };
        Some(ServiceAccountTokenIssuer {
            issuer: issuer.to_string(),
            signer,
        })
    }
}

// ============================================================================
// SECTION: Token Issuer
// ============================================================================

/// Service-account token issuer built from completed options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccountTokenIssuer {
    /// Value of the `iss` claim.
    pub issuer: String,
    /// Source of signing material.
    pub signer: TokenSigner,
}

/// Where token signing material comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSigner {
    /// Private key file on local disk.
    KeyFile(PathBuf),
    /// External key service endpoint.
    KeyService(Url),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a key service endpoint; only absolute `http`/`https` URLs qualify.
pub(crate) fn key_service_url(value: &str) -> Option<Url> {
    Url::parse(value.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
}

/// Returns the default service cluster IP range.
///
/// The prefix is a constant below 32, so construction cannot fail. Were it
/// ever to fail, the range would be absent and validation would report it.
fn default_service_cluster_ip_range() -> Option<IpNetwork> {
    Ipv4Network::new(Ipv4Addr::new(10, 0, 0, 0), DEFAULT_SERVICE_CIDR_PREFIX)
        .ok()
        .map(IpNetwork::V4)
}

/// Deserializes an optional network where an empty string means `None`.
fn deserialize_optional_network<'de, D>(deserializer: D) -> Result<Option<IpNetwork>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse::<IpNetwork>().map(Some).map_err(serde::de::Error::custom),
    }
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
    fn default_range_is_ten_slash_twenty_four() {
        let options = ServerRunOptions::default();
        assert_eq!(options.service_cluster_ip_range, Some("10.0.0.0/24".parse().unwrap()));
    }

    #[test]
    fn complete_prefers_key_file() {
        let mut options = ServerRunOptions::default();
        options.service_account_signing_key_file = Some(PathBuf::from("/etc/sa.key"));
        options.authentication.service_accounts.issuer = Some("https://issuer".to_string());
        options.authentication.service_accounts.key_service_url =
            Some("https://keys.example.com".to_string());
        options.complete();
        let issuer = options.service_account_issuer.unwrap();
        assert_eq!(issuer.signer, TokenSigner::KeyFile(PathBuf::from("/etc/sa.key")));
        assert_eq!(options.authentication.api_audiences, vec!["https://issuer".to_string()]);
    }

    #[test]
    fn complete_uses_key_service_without_key_file() {
        let mut options = ServerRunOptions::default();
        options.authentication.service_accounts.issuer = Some("issuer".to_string());
        options.authentication.service_accounts.key_service_url =
            Some("https://keys.example.com/sign".to_string());
        options.authentication.api_audiences = vec!["api".to_string()];
        options.complete();
        let issuer = options.service_account_issuer.unwrap();
        assert!(matches!(issuer.signer, TokenSigner::KeyService(_)));
        assert_eq!(options.authentication.api_audiences, vec!["api".to_string()]);
    }

    #[test]
    fn complete_without_signer_builds_nothing() {
        let mut options = ServerRunOptions::default();
        options.authentication.service_accounts.issuer = Some("issuer".to_string());
        options.authentication.service_accounts.key_service_url = Some("ftp://keys".to_string());
        options.complete();
        assert!(options.service_account_issuer.is_none());
        assert!(options.authentication.api_audiences.is_empty());
    }

    #[test]
    fn empty_signing_key_path_counts_as_unset() {
        let mut options = ServerRunOptions::default();
        options.service_account_signing_key_file = Some(PathBuf::new());
        assert!(options.signing_key_file().is_none());
    }
}
