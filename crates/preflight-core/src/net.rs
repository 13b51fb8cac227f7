// crates/preflight-core/src/net.rs
// ============================================================================
// Module: Network Values
// Description: CIDR entries and node-port ranges as seen by validation.
// Purpose: Carry parsed network settings, including parse failures.
// Dependencies: ipnetwork, serde, thiserror
// ============================================================================

//! ## Overview
//! Parsing is delegated to `ipnetwork`. A [`CidrEntry`] never fails to build:
//! text that does not parse is kept with no network so validation can report
//! every malformed entry instead of rejecting the whole input at load time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use ipnetwork::IpNetwork;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CIDR Entries
// ============================================================================

/// A configured network prefix and its parse result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CidrEntry {
    /// Text as supplied by the operator.
    raw: String,
    /// Parsed network, or `None` when the text did not parse.
    network: Option<IpNetwork>,
}

impl CidrEntry {
    /// Parses `raw`, keeping it even when it is not a valid prefix.
    #[must_use]
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let network = raw.trim().parse::<IpNetwork>().ok();
        Self {
            raw,
            network,
        }
    }

    /// Returns the text as supplied.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed network, if any.
    #[must_use]
    pub const fn network(&self) -> Option<IpNetwork> {
        self.network
    }
}

impl From<String> for CidrEntry {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<CidrEntry> for String {
    fn from(entry: CidrEntry) -> Self {
        entry.raw
    }
}

/// Returns the width of the host portion of `network` in bits.
#[must_use]
pub fn host_bits(network: &IpNetwork) -> u8 {
    match network {
        IpNetwork::V4(net) => 32 - net.prefix(),
        IpNetwork::V6(net) => 128 - net.prefix(),
    }
}

// ============================================================================
// SECTION: Port Ranges
// ============================================================================

/// Highest valid TCP/UDP port.
pub const MAX_PORT: i64 = 65_535;

/// A contiguous range of ports `[base, base + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortRange {
    /// First port of the range.
    base: u16,
    /// Number of ports in the range.
    size: u32,
}

impl PortRange {
    /// Builds the inclusive range `first..=last`.
    ///
    /// # Errors
    ///
    /// Returns [`PortRangeError::Inverted`] when `last < first`.
    pub fn new(first: u16, last: u16) -> Result<Self, PortRangeError> {
        if last < first {
            return Err(PortRangeError::Inverted {
                first,
                last,
            });
        }
        Ok(Self {
            base: first,
            size: u32::from(last) - u32::from(first) + 1,
        })
    }

    /// Returns the last port in the range.
    #[must_use]
    pub fn last(&self) -> i64 {
        i64::from(self.base) + i64::from(self.size) - 1
    }

    /// Returns true when `port` falls inside the range.
    #[must_use]
    pub fn contains(&self, port: i64) -> bool {
        port >= i64::from(self.base) && port <= self.last()
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            base: 30_000,
            size: 2_768,
        }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.last())
    }
}

impl FromStr for PortRange {
    type Err = PortRangeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(PortRangeError::Empty);
        }
        if let Some((first, last)) = value.split_once('-') {
            return Self::new(parse_port(first)?, parse_port(last)?);
        }
        if let Some((first, offset)) = value.split_once('+') {
            let first = parse_port(first)?;
            let offset = parse_port(offset)?;
            let last = first
                .checked_add(offset)
                .ok_or_else(|| PortRangeError::InvalidPort(value.to_string()))?;
            return Self::new(first, last);
        }
        let port = parse_port(value)?;
        Self::new(port, port)
    }
}

impl TryFrom<String> for PortRange {
    type Error = PortRangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PortRange> for String {
    fn from(range: PortRange) -> Self {
        range.to_string()
    }
}

/// Parses one port number of a range expression.
fn parse_port(value: &str) -> Result<u16, PortRangeError> {
    value.trim().parse::<u16>().map_err(|_| PortRangeError::InvalidPort(value.trim().to_string()))
}

/// Errors raised while parsing a port range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortRangeError {
    /// The expression was blank.
    #[error("port range must be non-empty")]
    Empty,
    /// A port number did not parse or overflowed.
    #[error("invalid port in range: {0}")]
    InvalidPort(String),
    /// The last port precedes the first.
    #[error("port range {first}-{last} is inverted")]
    Inverted {
        /// First port.
        first: u16,
        /// Last port.
        last: u16,
    },
}

// ============================================================================
// SECTION: Tests
// ============================================================================
