//! Core traits for the cfddns synchronizer
//!
//! This module defines the abstract interfaces the sync engine drives.
//!
//! - [`IpSource`]: Discover the current public address per family
//! - [`DnsProvider`]: Read and update DNS records via a provider API

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::{IpSource, IpFamily};
pub use dns_provider::{DnsProvider, DnsRecord, RecordUpdate, Zone};
