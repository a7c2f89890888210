//! Test doubles and common utilities for sync contract tests
//!
//! The doubles record every call so tests can assert which steps of a pass
//! ran. Each double hands out a `Calls` handle that shares its counters, the
//! same way the engine takes ownership of the boxed double.

#![allow(dead_code)]

use cfddns_core::error::{Error, Result};
use cfddns_core::traits::{DnsProvider, DnsRecord, IpFamily, IpSource, RecordUpdate, Zone};
use cfddns_core::SyncConfig;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

/// One recorded update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub zone_id: String,
    pub record_id: String,
    pub update: RecordUpdate,
}

/// Shared call log of a [`MockDnsProvider`]
#[derive(Debug, Default)]
pub struct ProviderCalls {
    pub verify: usize,
    pub zone_lookups: Vec<String>,
    pub record_lookups: Vec<(String, String)>,
    pub updates: Vec<UpdateCall>,
}

/// A scripted DnsProvider that tracks calls
pub struct MockDnsProvider {
    token_valid: bool,
    zones: Vec<Zone>,
    records: Vec<DnsRecord>,
    /// Record id → provider error message returned for updates of that record
    update_errors: HashMap<String, String>,
    calls: Arc<Mutex<ProviderCalls>>,
}

impl MockDnsProvider {
    /// A provider that accepts the token and knows nothing
    pub fn new() -> Self {
        Self {
            token_valid: true,
            zones: Vec::new(),
            records: Vec::new(),
            update_errors: HashMap::new(),
            calls: Arc::new(Mutex::new(ProviderCalls::default())),
        }
    }

    pub fn with_token_valid(mut self, valid: bool) -> Self {
        self.token_valid = valid;
        self
    }

    pub fn with_zone(mut self, id: &str, name: &str) -> Self {
        self.zones.push(Zone {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_record(mut self, record: DnsRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn failing_update(mut self, record_id: &str, message: &str) -> Self {
        self.update_errors
            .insert(record_id.to_string(), message.to_string());
        self
    }

    /// Handle on the call log that outlives the boxed provider
    pub fn calls(&self) -> Arc<Mutex<ProviderCalls>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn verify_token(&self) -> Result<bool> {
        self.calls.lock().unwrap().verify += 1;
        Ok(self.token_valid)
    }

    async fn list_zones(&self, domain: &str) -> Result<Vec<Zone>> {
        self.calls
            .lock()
            .unwrap()
            .zone_lookups
            .push(domain.to_string());
        Ok(self
            .zones
            .iter()
            .filter(|z| z.name == domain)
            .cloned()
            .collect())
    }

    async fn list_records(&self, zone_id: &str, record_name: &str) -> Result<Vec<DnsRecord>> {
        self.calls
            .lock()
            .unwrap()
            .record_lookups
            .push((zone_id.to_string(), record_name.to_string()));
        Ok(self
            .records
            .iter()
            .filter(|r| r.name == record_name)
            .cloned()
            .collect())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord> {
        self.calls.lock().unwrap().updates.push(UpdateCall {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            update: update.clone(),
        });

        if let Some(message) = self.update_errors.get(record_id) {
            return Err(Error::update_failed(record_id, message.clone()));
        }

        Ok(DnsRecord {
            id: record_id.to_string(),
            record_type: update.record_type.clone(),
            name: update.name.clone(),
            content: update.content.clone(),
            ttl: update.ttl,
            proxied: update.proxied,
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IpSource returning fixed addresses and counting lookups
pub struct StaticIpSource {
    addresses: HashMap<IpFamily, std::result::Result<IpAddr, String>>,
    calls: Arc<Mutex<Vec<IpFamily>>>,
}

impl StaticIpSource {
    pub fn new(v4: &str, v6: &str) -> Self {
        let mut addresses = HashMap::new();
        addresses.insert(IpFamily::V4, Ok(v4.parse().unwrap()));
        addresses.insert(IpFamily::V6, Ok(v6.parse().unwrap()));
        Self {
            addresses,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make lookups for `family` fail
    pub fn failing(mut self, family: IpFamily, message: &str) -> Self {
        self.addresses.insert(family, Err(message.to_string()));
        self
    }

    /// Make lookups for `family` return `ip` whatever its family
    pub fn returning(mut self, family: IpFamily, ip: &str) -> Self {
        self.addresses.insert(family, Ok(ip.parse().unwrap()));
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<IpFamily>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self, family: IpFamily) -> Result<IpAddr> {
        self.calls.lock().unwrap().push(family);
        match self.addresses.get(&family) {
            Some(Ok(ip)) => Ok(*ip),
            Some(Err(message)) => Err(Error::discovery(family, message.clone())),
            None => Err(Error::discovery(family, "no address configured")),
        }
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// Build a record for `home.example.com`
pub fn record(id: &str, record_type: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        record_type: record_type.to_string(),
        name: "home.example.com".to_string(),
        content: content.to_string(),
        ttl: 300,
        proxied: false,
    }
}

/// Provider with zone Z1 for example.com and records R1 (A) / R2 (AAAA)
pub fn standard_provider(v4_content: &str, v6_content: &str) -> MockDnsProvider {
    MockDnsProvider::new()
        .with_zone("Z1", "example.com")
        .with_record(record("R1", "A", v4_content))
        .with_record(record("R2", "AAAA", v6_content))
}

/// Configuration targeting home.example.com
pub fn test_config() -> SyncConfig {
    SyncConfig::new("test-token", "example.com", "home")
}
