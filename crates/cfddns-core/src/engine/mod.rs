//! Core sync engine
//!
//! The SyncEngine runs one reconciliation pass:
//! - Validating the API token
//! - Resolving the zone for the configured domain
//! - Fetching the A / AAAA records for the target hostname
//! - Discovering the current public addresses
//! - Updating each record whose content differs
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────┐
//!                  │  SyncEngine  │
//!                  └──────────────┘
//!                         │
//!          ┌──────────────┴──────────────┐
//!          │                             │
//!          ▼                             ▼
//! ┌─────────────────┐           ┌─────────────────┐
//! │  DnsProvider    │           │   IpSource      │
//! │ verify / zones  │           │ current(v4/v6)  │
//! │ records / update│           │                 │
//! └─────────────────┘           └─────────────────┘
//! ```
//!
//! ## Phases
//!
//! `Init → TokenValidated → ZoneResolved → RecordsFetched →
//! AddressesDiscovered → Done`. A failure before `AddressesDiscovered` aborts
//! the pass with a [`SyncFailure`] naming the last phase reached. Update
//! failures do not abort: every enabled family is reconciled and reported in
//! the [`SyncReport`].

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsRecord, IpFamily, IpSource, RecordUpdate};
use std::fmt;
use std::net::IpAddr;
use tracing::{debug, error, info, warn};

/// Progress of a sync pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyncPhase {
    Init,
    TokenValidated,
    ZoneResolved,
    RecordsFetched,
    AddressesDiscovered,
    Done,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Init => "init",
            SyncPhase::TokenValidated => "token validated",
            SyncPhase::ZoneResolved => "zone resolved",
            SyncPhase::RecordsFetched => "records fetched",
            SyncPhase::AddressesDiscovered => "addresses discovered",
            SyncPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// A pass that stopped before reconciliation
#[derive(Debug, thiserror::Error)]
#[error("sync aborted after phase '{phase}': {error}")]
pub struct SyncFailure {
    /// Last phase completed before the failure
    pub phase: SyncPhase,
    /// What went wrong
    #[source]
    pub error: Error,
}

impl SyncFailure {
    fn new(phase: SyncPhase, error: Error) -> Self {
        Self { phase, error }
    }
}

/// Result of reconciling one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyOutcome {
    /// Record already held the discovered address; no update issued
    Unchanged { address: IpAddr },
    /// Record content was replaced
    Updated { previous: String, current: IpAddr },
}

/// Per-family entry of a [`SyncReport`]
#[derive(Debug)]
pub struct FamilyReport {
    pub family: IpFamily,
    /// Provider identifier of the reconciled record
    pub record_id: String,
    pub result: Result<FamilyOutcome>,
}

/// Summary of a completed pass
#[derive(Debug)]
pub struct SyncReport {
    pub record_name: String,
    pub zone_id: String,
    pub phase: SyncPhase,
    pub families: Vec<FamilyReport>,
}

impl SyncReport {
    /// True when no family failed
    pub fn is_success(&self) -> bool {
        self.families.iter().all(|f| f.result.is_ok())
    }

    /// Errors of the families that failed, in reconciliation order
    pub fn failures(&self) -> impl Iterator<Item = (IpFamily, &Error)> {
        self.families
            .iter()
            .filter_map(|f| f.result.as_ref().err().map(|e| (f.family, e)))
    }

    /// Report for one family, if it was reconciled
    pub fn family(&self, family: IpFamily) -> Option<&FamilyReport> {
        self.families.iter().find(|f| f.family == family)
    }

    /// Number of records actually updated
    pub fn updated_count(&self) -> usize {
        self.families
            .iter()
            .filter(|f| matches!(f.result, Ok(FamilyOutcome::Updated { .. })))
            .count()
    }
}

/// Core sync engine
///
/// Drives a [`DnsProvider`] and an [`IpSource`] through one reconciliation
/// pass. Every step is awaited before the next begins; nothing runs
/// concurrently and nothing is retried. Repetition is the caller's job.
pub struct SyncEngine {
    /// DNS provider holding the records
    provider: Box<dyn DnsProvider>,

    /// Public address discovery
    ip_source: Box<dyn IpSource>,

    /// Validated configuration
    config: SyncConfig,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` does not validate.
    pub fn new(
        provider: Box<dyn DnsProvider>,
        ip_source: Box<dyn IpSource>,
        config: SyncConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            provider,
            ip_source,
            config,
        })
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(SyncReport)`: every step up to reconciliation succeeded; check
    ///   [`SyncReport::is_success`] for per-family update failures
    /// - `Err(SyncFailure)`: the pass aborted before reconciliation
    pub async fn run(&self) -> std::result::Result<SyncReport, SyncFailure> {
        let record_name = self.config.record_name();
        let mut phase = SyncPhase::Init;

        self.verify_credentials()
            .await
            .map_err(|e| SyncFailure::new(phase, e))?;
        phase = SyncPhase::TokenValidated;

        let zone_id = self
            .resolve_zone()
            .await
            .map_err(|e| SyncFailure::new(phase, e))?;
        phase = SyncPhase::ZoneResolved;

        let records = self
            .fetch_records(&zone_id, &record_name)
            .await
            .map_err(|e| SyncFailure::new(phase, e))?;
        phase = SyncPhase::RecordsFetched;

        let mut targets = Vec::with_capacity(records.len());
        for (family, record) in records {
            let address = self
                .discover(family)
                .await
                .map_err(|e| SyncFailure::new(phase, e))?;
            targets.push((family, record, address));
        }
        phase = SyncPhase::AddressesDiscovered;
        debug!("Sync phase: {}", phase);

        let mut families = Vec::with_capacity(targets.len());
        for (family, record, address) in targets {
            let result = self.reconcile(&zone_id, family, &record, address).await;
            if let Err(ref e) = result {
                error!("DNS {} record update failed. Error: {}", family, e);
            }
            families.push(FamilyReport {
                family,
                record_id: record.id,
                result,
            });
        }

        Ok(SyncReport {
            record_name,
            zone_id,
            phase: SyncPhase::Done,
            families,
        })
    }

    async fn verify_credentials(&self) -> Result<()> {
        if !self.provider.verify_token().await? {
            return Err(Error::auth(format!(
                "{} reported the token as invalid",
                self.provider.provider_name()
            )));
        }
        info!("API token validation success");
        Ok(())
    }

    async fn resolve_zone(&self) -> Result<String> {
        let domain = &self.config.domain;
        if domain.is_empty() {
            return Err(Error::invalid_input("Domain cannot be empty"));
        }

        let zones = self.provider.list_zones(domain).await?;
        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::zone_not_found(domain))?;

        info!("Domain zone {} ID: {}", domain, zone.id);
        Ok(zone.id)
    }

    async fn fetch_records(
        &self,
        zone_id: &str,
        record_name: &str,
    ) -> Result<Vec<(IpFamily, DnsRecord)>> {
        let records = self.provider.list_records(zone_id, record_name).await?;
        let selected = select_records(records, &self.config.families, record_name)?;

        for (family, record) in &selected {
            info!(
                "DNS record {} {}: Type={}, IP={}",
                record_name, family, record.record_type, record.content
            );
        }
        Ok(selected)
    }

    async fn discover(&self, family: IpFamily) -> Result<IpAddr> {
        let address = self.ip_source.current(family).await?;
        if IpFamily::of(&address) != family {
            return Err(Error::discovery(
                family,
                format!(
                    "{} returned {} which is not an {} address",
                    self.ip_source.source_name(),
                    address,
                    family
                ),
            ));
        }
        debug!("Current {} address: {}", family, address);
        Ok(address)
    }

    async fn reconcile(
        &self,
        zone_id: &str,
        family: IpFamily,
        record: &DnsRecord,
        address: IpAddr,
    ) -> Result<FamilyOutcome> {
        if content_matches(&record.content, &address) {
            info!(
                "The current {} address and DNS record {} address are the same. There's no need to update.",
                family, family
            );
            return Ok(FamilyOutcome::Unchanged { address });
        }

        info!(
            "The current {} address {} does not match the DNS record address {}. Attempting update.",
            family, address, record.content
        );

        let update = RecordUpdate::with_content(record, address.to_string());
        self.provider
            .update_record(zone_id, &record.id, &update)
            .await?;

        info!("DNS {} record update successful", family);
        Ok(FamilyOutcome::Updated {
            previous: record.content.clone(),
            current: address,
        })
    }
}

/// Pick one record per enabled family by record type
///
/// Records are matched on their `type` field, never on position. When several
/// records of one type exist, the first is used.
///
/// # Errors
///
/// - `RecordNotFound` with type "any" if `records` is empty
/// - `RecordNotFound` naming the type if an enabled family has no record
pub fn select_records(
    records: Vec<DnsRecord>,
    families: &[IpFamily],
    record_name: &str,
) -> Result<Vec<(IpFamily, DnsRecord)>> {
    if records.is_empty() {
        return Err(Error::record_not_found(record_name, "any"));
    }

    let mut selected = Vec::new();
    for family in IpFamily::ALL {
        if !families.contains(&family) {
            continue;
        }

        let mut matching = records.iter().filter(|r| r.is_family(family));
        let record = matching
            .next()
            .ok_or_else(|| Error::record_not_found(record_name, family.record_type()))?;

        let extra = matching.count();
        if extra > 0 {
            warn!(
                "{} additional {} record(s) for {} ignored; using {}",
                extra,
                family.record_type(),
                record_name,
                record.id
            );
        }

        selected.push((family, record.clone()));
    }

    Ok(selected)
}

/// Whether stored record content already holds `address`
///
/// Content that parses as an IP address is compared by value, so differently
/// written forms of one IPv6 address match; anything else falls back to
/// string equality.
pub fn content_matches(content: &str, address: &IpAddr) -> bool {
    match content.trim().parse::<IpAddr>() {
        Ok(stored) => stored == *address,
        Err(_) => content == address.to_string(),
    }
}
