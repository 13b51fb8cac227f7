// crates/preflight-config/src/subsystems/serving.rs
// ============================================================================
// Module: Serving Options
// Description: Secure (TLS) and insecure listener settings.
// Purpose: Validate listener ports and certificate pairing.
// Dependencies: preflight-core, serde
// ============================================================================

//! ## Overview
//! Both listeners take a port where zero disables the listener. The secure
//! listener also needs its certificate and key set as a pair.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use preflight_core::ErrorKind;
use preflight_core::ErrorList;
use preflight_core::MAX_PORT;
use serde::Deserialize;

// ============================================================================
// SECTION: Secure Serving
// ============================================================================

/// Rule identifier for secure serving findings.
const SECURE_RULE: &str = "secure-serving";
/// Rule identifier for insecure serving findings.
const INSECURE_RULE: &str = "insecure-serving";

/// TLS listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecureServingOptions {
    /// Address to listen on.
    pub bind_address: IpAddr,
    /// Port to listen on; zero disables the listener.
    pub bind_port: i32,
    /// Serving certificate file.
    pub cert_file: Option<PathBuf>,
    /// Serving private key file.
    pub key_file: Option<PathBuf>,
}

impl Default for SecureServingOptions {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            bind_port: 6443,
            cert_file: None,
            key_file: None,
        }
    }
}

impl SecureServingOptions {
    /// Validates the secure listener, reporting every finding.
    #[must_use]
    pub fn validate(&self) -> ErrorList {
        let mut errs = ErrorList::new();
        if !port_in_range(self.bind_port) {
            errs.push(
                ErrorKind::OutOfRange,
                SECURE_RULE,
                format!(
                    "--secure-port {} must be between 0 and 65535, inclusive. 0 for turning off \
                     secure port",
                    self.bind_port
                ),
            );
        }
        if self.cert_file.is_some() != self.key_file.is_some() {
            errs.push(
                ErrorKind::InconsistentSettings,
                SECURE_RULE,
                "--tls-cert-file and --tls-private-key-file should be specified together",
            );
        }
        errs
    }
}

// ============================================================================
// SECTION: Insecure Serving
// ============================================================================

/// Plain HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InsecureServingOptions {
    /// Address to listen on.
    pub bind_address: IpAddr,
    /// Port to listen on; zero disables the listener.
    pub bind_port: i32,
}

impl Default for InsecureServingOptions {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            bind_port: 8080,
        }
    }
}

impl InsecureServingOptions {
    /// Validates the insecure listener.
    #[must_use]
    pub fn validate(&self) -> ErrorList {
        let mut errs = ErrorList::new();
        if !port_in_range(self.bind_port) {
            errs.push(
                ErrorKind::OutOfRange,
                INSECURE_RULE,
                format!(
                    "--insecure-port {} must be between 0 and 65535, inclusive. 0 for turning \
                     off insecure (HTTP) port",
                    self.bind_port
                ),
            );
        }
        errs
    }
}

/// Returns true when `port` lies in `[0, 65535]`.
fn port_in_range(port: i32) -> bool {
    (0 ..= MAX_PORT).contains(&i64::from(port))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
