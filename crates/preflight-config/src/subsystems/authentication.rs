// crates/preflight-config/src/subsystems/authentication.rs
// ============================================================================
// Module: Authentication Options
// Description: Authenticator settings, including service-account tokens.
// Purpose: Validate authenticator settings in isolation from feature gates.
// Dependencies: preflight-core, serde, url
// ============================================================================

//! ## Overview
//! Service-account token settings live here because the authenticator
//! consumes them. Whether the features that issue those tokens are enabled is
//! checked by the orchestrator, not by this module.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use preflight_core::ErrorKind;
use preflight_core::ErrorList;
use serde::Deserialize;
use url::Url;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Rule identifier for authentication findings.
const RULE: &str = "authentication";

/// Authenticator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthenticationOptions {
    /// Allow anonymous requests.
    pub anonymous: bool,
    /// Audiences accepted for service-account tokens.
    pub api_audiences: Vec<String>,
    /// Client certificate authority bundle.
    pub client_ca_file: Option<PathBuf>,
    /// OpenID Connect authenticator.
    pub oidc: OidcOptions,
    /// Service-account token authenticator and issuer settings.
    pub service_accounts: ServiceAccountOptions,
}

/// OpenID Connect authenticator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OidcOptions {
    /// Issuer URL of the identity provider.
    pub issuer_url: Option<String>,
    /// Client identifier tokens must be issued for.
    pub client_id: Option<String>,
}

/// Service-account token configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceAccountOptions {
    /// Identifier placed in the `iss` claim of issued tokens.
    pub issuer: Option<String>,
    /// External key service that signs tokens.
    pub key_service_url: Option<String>,
    /// Public keys used to verify tokens.
    pub key_files: Vec<PathBuf>,
    /// Verify that token subjects still exist.
    pub lookup: bool,
}

impl Default for ServiceAccountOptions {
    fn default() -> Self {
        Self {
            issuer: None,
            key_service_url: None,
            key_files: Vec::new(),
            lookup: true,
        }
    }
}

impl ServiceAccountOptions {
    /// Returns the issuer when it is set and non-blank.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        non_blank(self.issuer.as_deref())
    }

    /// Returns the key service URL when it is set and non-blank.
    #[must_use]
    pub fn key_service_url(&self) -> Option<&str> {
        non_blank(self.key_service_url.as_deref())
    }
}

impl AuthenticationOptions {
    /// Validates authenticator settings, reporting every finding.
    #[must_use]
    pub fn validate(&self) -> ErrorList {
        let mut errs = ErrorList::new();
        let issuer_url = non_blank(self.oidc.issuer_url.as_deref());
        let client_id = non_blank(self.oidc.client_id.as_deref());
        if issuer_url.is_some() != client_id.is_some() {
            errs.push(
                ErrorKind::InconsistentSettings,
                RULE,
                "oidc-issuer-url and oidc-client-id should be specified together",
            );
        }
        if let Some(issuer) = self.service_accounts.issuer()
            && issuer.contains(':')
            && let Err(err) = Url::parse(issuer)
        {
            errs.push(
                ErrorKind::Malformed,
                RULE,
                format!("service-account-issuer contained a ':' but was not a valid URL: {err}"),
            );
        }
        if self.api_audiences.iter().any(|audience| audience.trim().is_empty()) {
            errs.push(ErrorKind::Malformed, RULE, "--api-audiences must not contain empty entries");
        }
        errs
    }
}

/// Filters out blank optional strings.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
