//! Contract Test: Early Abort
//!
//! Steps 1-4 of a pass (token, zone, records, addresses) are fatal: the first
//! failure stops the pass and no later step issues a call.
//!
//! Constraints verified:
//! - Rejected token → no zone lookup
//! - Zero zones → ZoneNotFound, no record lookup
//! - Zero records → RecordNotFound, no address discovery
//! - Discovery failure → no update calls

mod common;

use cfddns_core::{Error, IpFamily, SyncEngine, SyncPhase};
use common::*;

#[tokio::test]
async fn rejected_token_stops_before_zone_lookup() {
    let provider = standard_provider("1.1.1.1", "::1").with_token_valid(false);
    let provider_calls = provider.calls();
    let source = StaticIpSource::new("2.2.2.2", "::1");
    let source_calls = source.calls();

    let engine = SyncEngine::new(Box::new(provider), Box::new(source), test_config())
        .expect("engine construction succeeds");

    let failure = engine.run().await.unwrap_err();

    assert!(matches!(failure.error, Error::AuthFailure(_)));
    assert_eq!(failure.phase, SyncPhase::Init);
    assert_eq!(failure.error.exit_code(), 3);

    let calls = provider_calls.lock().unwrap();
    assert_eq!(calls.verify, 1);
    assert!(
        calls.zone_lookups.is_empty(),
        "Expected 0 zone lookups after a rejected token, got {}",
        calls.zone_lookups.len()
    );
    assert!(calls.updates.is_empty());
    assert!(source_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_zone_stops_before_record_lookup() {
    let provider = MockDnsProvider::new().with_zone("Z9", "other.org");
    let provider_calls = provider.calls();

    let engine = SyncEngine::new(
        Box::new(provider),
        Box::new(StaticIpSource::new("2.2.2.2", "::1")),
        test_config(),
    )
    .expect("engine construction succeeds");

    let failure = engine.run().await.unwrap_err();

    assert!(matches!(failure.error, Error::ZoneNotFound(ref d) if d == "example.com"));
    assert_eq!(failure.phase, SyncPhase::TokenValidated);

    let calls = provider_calls.lock().unwrap();
    assert_eq!(calls.zone_lookups, vec!["example.com".to_string()]);
    assert!(calls.record_lookups.is_empty());
}

#[tokio::test]
async fn first_zone_wins_when_several_match() {
    let provider = standard_provider("2.2.2.2", "::1").with_zone("Z2", "example.com");
    let provider_calls = provider.calls();

    let engine = SyncEngine::new(
        Box::new(provider),
        Box::new(StaticIpSource::new("2.2.2.2", "::1")),
        test_config(),
    )
    .unwrap();

    let report = engine.run().await.unwrap();

    assert_eq!(report.zone_id, "Z1");
    assert_eq!(
        provider_calls.lock().unwrap().record_lookups,
        vec![("Z1".to_string(), "home.example.com".to_string())]
    );
}

#[tokio::test]
async fn missing_records_stop_before_discovery() {
    let provider = MockDnsProvider::new().with_zone("Z1", "example.com");
    let source = StaticIpSource::new("2.2.2.2", "::1");
    let source_calls = source.calls();

    let engine =
        SyncEngine::new(Box::new(provider), Box::new(source), test_config()).unwrap();

    let failure = engine.run().await.unwrap_err();

    assert!(matches!(
        failure.error,
        Error::RecordNotFound { ref name, .. } if name == "home.example.com"
    ));
    assert_eq!(failure.phase, SyncPhase::ZoneResolved);
    assert!(
        source_calls.lock().unwrap().is_empty(),
        "No address discovery may happen without records"
    );
}

#[tokio::test]
async fn missing_aaaa_record_fails_when_v6_enabled() {
    let provider = MockDnsProvider::new()
        .with_zone("Z1", "example.com")
        .with_record(record("R1", "A", "1.1.1.1"));
    let provider_calls = provider.calls();
    let source = StaticIpSource::new("2.2.2.2", "::1");
    let source_calls = source.calls();

    let engine =
        SyncEngine::new(Box::new(provider), Box::new(source), test_config()).unwrap();

    let failure = engine.run().await.unwrap_err();

    assert!(matches!(
        failure.error,
        Error::RecordNotFound { ref record_type, .. } if record_type == "AAAA"
    ));
    assert!(source_calls.lock().unwrap().is_empty());
    assert!(provider_calls.lock().unwrap().updates.is_empty());
}

#[tokio::test]
async fn discovery_failure_is_fatal() {
    let provider = standard_provider("1.1.1.1", "::2");
    let provider_calls = provider.calls();
    let source = StaticIpSource::new("2.2.2.2", "::1").failing(IpFamily::V6, "connection refused");

    let engine =
        SyncEngine::new(Box::new(provider), Box::new(source), test_config()).unwrap();

    let failure = engine.run().await.unwrap_err();

    assert!(matches!(
        failure.error,
        Error::AddressDiscovery { family: IpFamily::V6, .. }
    ));
    assert_eq!(failure.phase, SyncPhase::RecordsFetched);
    assert_eq!(failure.error.exit_code(), 6);
    assert!(
        provider_calls.lock().unwrap().updates.is_empty(),
        "No update may be issued before both addresses are known"
    );
}

#[tokio::test]
async fn wrong_family_address_is_rejected() {
    let source = StaticIpSource::new("2.2.2.2", "::1").returning(IpFamily::V6, "3.3.3.3");

    let engine = SyncEngine::new(
        Box::new(standard_provider("1.1.1.1", "::1")),
        Box::new(source),
        test_config(),
    )
    .unwrap();

    let failure = engine.run().await.unwrap_err();
    assert!(matches!(
        failure.error,
        Error::AddressDiscovery { family: IpFamily::V6, .. }
    ));
}

#[test]
fn invalid_config_rejected_at_construction() {
    let config = cfddns_core::SyncConfig::new("", "example.com", "home");

    let result = SyncEngine::new(
        Box::new(MockDnsProvider::new()),
        Box::new(StaticIpSource::new("2.2.2.2", "::1")),
        config,
    );

    assert!(matches!(result, Err(Error::Config(_))));
}
