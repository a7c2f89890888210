// # IP Source Trait
//
// Defines the interface for discovering the machine's current public address.
//
// ## Implementations
//
// - HTTP address-echo services: `cfddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use cfddns_core::{IpFamily, IpSource};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let v4 = source.current(IpFamily::V4).await?;
//     let v6 = source.current(IpFamily::V6).await?;
//     println!("{v4} / {v6}");
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Address family (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// Both families, in reconciliation order
    pub const ALL: [IpFamily; 2] = [IpFamily::V4, IpFamily::V6];

    /// DNS record type holding addresses of this family
    pub fn record_type(self) -> &'static str {
        match self {
            IpFamily::V4 => "A",
            IpFamily::V6 => "AAAA",
        }
    }

    /// Family of a concrete address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpFamily::V4,
            IpAddr::V6(_) => IpFamily::V6,
        }
    }

    /// Parse a family name as used in configuration ("v4", "ipv4", "4", ...)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v4" | "ipv4" | "4" | "a" => Some(IpFamily::V4),
            "v6" | "ipv6" | "6" | "aaaa" => Some(IpFamily::V6),
            _ => None,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => f.write_str("IPv4"),
            IpFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Trait for public address discovery
///
/// One call, one lookup. Implementations must not cache between calls or
/// retry on failure: a failed lookup is reported to the engine, which aborts
/// the run.
///
/// # Errors
///
/// Implementations report every failure (transport, status, unparseable body,
/// wrong family) as [`crate::Error::AddressDiscovery`].
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public address for `family`
    ///
    /// The returned address must belong to `family`.
    async fn current(&self, family: IpFamily) -> Result<IpAddr, crate::Error>;

    /// Name of the source (for logging)
    fn source_name(&self) -> &'static str;
}
