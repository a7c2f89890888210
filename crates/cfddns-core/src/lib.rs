// # cfddns-core
//
// Core library for the cfddns dynamic DNS synchronizer.
//
// ## Architecture Overview
//
// One pass keeps a hostname's A and AAAA records in line with the machine's
// public addresses:
// - **DnsProvider**: Trait for reading and updating records via a provider API
// - **IpSource**: Trait for discovering the current public address per family
// - **SyncEngine**: Runs the pass (token → zone → records → addresses → updates)
// - **SyncConfig**: Domain, record label, families, endpoints
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation logic lives here; HTTP lives in
//    the provider and source crates
// 2. **Single Pass**: No scheduling, no retries, no persistent state
// 3. **Independent Families**: An IPv4 update failure never skips IPv6
// 4. **Library-First**: The binary is a thin wrapper over this crate

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, DnsRecord, IpFamily, IpSource, RecordUpdate, Zone};
pub use engine::{FamilyOutcome, FamilyReport, SyncEngine, SyncFailure, SyncPhase, SyncReport};
pub use config::{IpSourceConfig, ProviderConfig, SyncConfig};
pub use error::{Error, Result};
