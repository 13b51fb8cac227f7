// crates/preflight-config/tests/proptest_validation.rs
// ============================================================================
// Module: Validation Property-Based Tests
// Description: Property tests for orchestrator determinism and rule isolation.
// Purpose: Detect ordering drift and cross-rule suppression across inputs.
// ============================================================================

//! Property-based tests for validation invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::net::Ipv4Addr;

use ipnetwork::IpNetwork;
use ipnetwork::Ipv4Network;
use preflight_config::ServerRunOptions;
use preflight_config::ValidationContext;
use preflight_core::CidrEntry;
use preflight_core::ErrorKind;
use preflight_core::Feature;
use preflight_core::FeatureGates;
use preflight_core::RegistrySet;
use proptest::prelude::*;

/// Builds options from generated scalar settings.
fn options_from(
    count: i32,
    prefix: Option<u8>,
    port: i32,
    allowlist: Vec<String>,
    issuer: Option<String>,
    key_service: Option<String>,
) -> ServerRunOptions {
    let mut options = ServerRunOptions::default();
    options.apiserver_count = count;
    options.service_cluster_ip_range = prefix.map(|prefix| {
        IpNetwork::V4(Ipv4Network::new(Ipv4Addr::new(10, 0, 0, 0), prefix).unwrap())
    });
    options.kubernetes_service_node_port = port;
    options.proxy_cidr_allowlist = allowlist.into_iter().map(CidrEntry::parse).collect();
    options.authentication.service_accounts.issuer = issuer;
    options.authentication.service_accounts.key_service_url = key_service;
    options.complete();
    options
}

/// Builds a gate table from generated states.
fn gates_from(states: [bool; 3]) -> FeatureGates {
    let mut gates = FeatureGates::empty();
    for (feature, enabled) in Feature::ALL.into_iter().zip(states) {
        gates.set(feature, enabled);
    }
    gates
}

proptest! {
    #[test]
    fn validation_is_deterministic(
        count in -3_i32 .. 4,
        prefix in proptest::option::of(0_u8 ..= 32),
        port in -10_i32 .. 80_000,
        allowlist in proptest::collection::vec("[0-9./a-z]{0,12}", 0 .. 4),
        issuer in proptest::option::of("[a-z:/.]{0,16}"),
        key_service in proptest::option::of("(https?://)?[a-z.]{0,10}"),
        states in any::<[bool; 3]>(),
    ) {
        let options = options_from(count, prefix, port, allowlist, issuer, key_service);
        let gates = gates_from(states);
        let registries = RegistrySet::builtin();
        let context = ValidationContext::new(&gates, &registries);
        let first = options.validate(&context).unwrap();
        let second = options.validate(&context).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn count_rule_fires_alone_and_exactly_once(
        count in -1_000_i32 .. 1_000,
        prefix in proptest::option::of(0_u8 ..= 32),
        port in -10_i32 .. 80_000,
    ) {
        let options = options_from(count, prefix, port, Vec::new(), None, None);
        let gates = FeatureGates::new();
        let registries = RegistrySet::builtin();
        let errs = options.validate(&ValidationContext::new(&gates, &registries)).unwrap();

        let count_errors = errs.iter().filter(|error| error.rule == "apiserver-count").count();
        prop_assert_eq!(count_errors, usize::from(count <= 0));

        let range_errors = errs.iter().filter(|error| error.rule == "service-cluster-ip-range").count();
        let expected_range = usize::from(prefix.is_none_or(|prefix| 32 - prefix > 20));
        prop_assert_eq!(range_errors, expected_range);

        let port_errors = errs.iter().filter(|error| error.rule == "kubernetes-service-node-port").count();
        prop_assert!(port_errors <= 1);
        prop_assert_eq!(port_errors == 0, port == 0 || (30_000 ..= 32_767).contains(&port));
    }

    #[test]
    fn delivery_branch_follows_external_key_service(states in any::<[bool; 3]>()) {
        let options = options_from(1, Some(24), 0, Vec::new(), None, Some("https://kms".to_string()));
        let gates = gates_from(states);
        let registries = RegistrySet::builtin();
        let errs = options.validate(&ValidationContext::new(&gates, &registries)).unwrap();
        let external = states[2];
        for error in &errs {
            let expected = if external { "external-key-service" } else { "token-request" };
            prop_assert_eq!(error.rule, expected);
        }
        if external {
            prop_assert!(errs.kinds().contains(&ErrorKind::Missing));
        }
    }
}
