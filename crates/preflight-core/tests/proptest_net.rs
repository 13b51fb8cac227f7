// crates/preflight-core/tests/proptest_net.rs
// ============================================================================
// Module: Network Value Property-Based Tests
// Description: Property tests for port ranges and CIDR host widths.
// Purpose: Detect panics and invariant breaks across wide input ranges.
// ============================================================================

//! Property-based tests for network value invariants.

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
use preflight_core::CidrEntry;
use preflight_core::PortRange;
use preflight_core::host_bits;
use proptest::prelude::*;

proptest! {
    #[test]
    fn port_range_contains_exactly_its_bounds(first in any::<u16>(), span in 0_u16 .. 4096, port in -70_000_i64 .. 140_000) {
        let last = first.saturating_add(span);
        let range = PortRange::new(first, last).unwrap();
        let expected = port >= i64::from(first) && port <= i64::from(last);
        prop_assert_eq!(range.contains(port), expected);
    }

    #[test]
    fn port_range_display_parses_back(first in any::<u16>(), span in 0_u16 .. 4096) {
        let range = PortRange::new(first, first.saturating_add(span)).unwrap();
        let reparsed: PortRange = range.to_string().parse().unwrap();
        prop_assert_eq!(reparsed, range);
    }

    #[test]
    fn host_bits_complements_prefix(addr in any::<u32>(), prefix in 0_u8 ..= 32) {
        let network = IpNetwork::V4(Ipv4Network::new(Ipv4Addr::from(addr), prefix).unwrap());
        prop_assert_eq!(host_bits(&network), 32 - prefix);
    }

    #[test]
    fn cidr_entry_never_panics(raw in ".*") {
        let entry = CidrEntry::parse(raw.clone());
        prop_assert_eq!(entry.raw(), raw.as_str());
    }
}
