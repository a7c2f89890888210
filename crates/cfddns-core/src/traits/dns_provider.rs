// # DNS Provider Trait
//
// Defines the interface for reading and updating DNS records via provider APIs.
//
// ## Implementations
//
// - Cloudflare: `cfddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use cfddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     if !provider.verify_token().await? {
//         anyhow::bail!("token rejected");
//     }
//     let zones = provider.list_zones("example.com").await?;
//     let records = provider.list_records(&zones[0].id, "home.example.com").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::traits::IpFamily;

/// A provider zone (administrative grouping of records for one domain)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider-assigned zone identifier
    pub id: String,
    /// Zone name (the domain)
    pub name: String,
}

/// One provider-stored DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned record identifier
    pub id: String,
    /// Record type ("A", "AAAA", ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record content (an IP address for A/AAAA)
    pub content: String,
    /// Time-to-live in seconds (1 means "automatic" on Cloudflare)
    pub ttl: u32,
    /// Whether traffic is routed through the provider's edge
    #[serde(default)]
    pub proxied: bool,
}

impl DnsRecord {
    /// Whether this record holds addresses of `family`
    pub fn is_family(&self, family: IpFamily) -> bool {
        self.record_type.eq_ignore_ascii_case(family.record_type())
    }
}

/// Payload for a record update
///
/// Built from an existing record so that only `content` changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

impl RecordUpdate {
    /// Copy `record`, replacing its content
    pub fn with_content(record: &DnsRecord, content: impl Into<String>) -> Self {
        Self {
            record_type: record.record_type.clone(),
            name: record.name.clone(),
            content: content.into(),
            ttl: record.ttl,
            proxied: record.proxied,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Each method is a single API call. Providers translate the provider's wire
/// format into these types and report failures; every decision (what counts as
/// "not found", whether to update, what to do on failure) belongs to
/// [`crate::SyncEngine`].
///
/// ## Allowed
/// - ✅ HTTP/HTTPS calls to the provider's own endpoints
/// - ✅ Parsing provider-specific responses
///
/// ## Forbidden
/// - ❌ Retry or backoff
/// - ❌ Caching between calls
/// - ❌ Creating or deleting records
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Check whether the configured credential is usable
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: the provider accepted the token
    /// - `Ok(false)`: the provider answered but reported the token unusable
    /// - `Err(Error)`: the provider could not be reached or answered garbage
    async fn verify_token(&self) -> Result<bool, crate::Error>;

    /// List zones whose name is exactly `domain`, in provider order
    async fn list_zones(&self, domain: &str) -> Result<Vec<Zone>, crate::Error>;

    /// List records named `record_name` in zone `zone_id`, in provider order
    async fn list_records(
        &self,
        zone_id: &str,
        record_name: &str,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Overwrite record `record_id` with `update`
    ///
    /// # Errors
    ///
    /// A provider-side rejection is reported as
    /// [`crate::Error::UpdateFailed`] carrying the provider's first message.
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
