// crates/preflight-config/src/lib.rs
// ============================================================================
// Module: Preflight Config Library
// Description: API server options, their validators, and file loading.
// Purpose: Single place that decides whether a server may start.
// Dependencies: preflight-core, serde, toml, tracing, url
// ============================================================================

//! ## Overview
//! `preflight-config` models the options an API server starts with and checks
//! them before the server begins serving. Options are loaded from TOML,
//! completed once, and then validated by [`ServerRunOptions::validate`],
//! which returns every problem it finds rather than stopping at the first.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod options;
pub mod subsystems;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::DEFAULT_CONFIG_NAME;
pub use config::PreflightConfig;
pub use options::ServerRunOptions;
pub use options::ServiceAccountTokenIssuer;
pub use options::TokenSigner;
pub use subsystems::*;
pub use validation::DeliveryMode;
pub use validation::GateSnapshot;
pub use validation::MAX_SERVICE_CLUSTER_HOST_BITS;
pub use validation::ValidationContext;
pub use validation::validate_apiserver_count;
pub use validation::validate_external_key_service;
pub use validation::validate_proxy_cidr_allowlist;
pub use validation::validate_service_cluster_ip_range;
pub use validation::validate_service_node_port;
pub use validation::validate_token_request;
