//! Contract Test: Cycle-Scoped Failure
//!
//! Constraints verified:
//! - A failed upsert leaves the last applied address untouched
//! - The next cycle retries the same transition from the top
//! - An unreachable IP-echo service skips the cycle without provider calls
//! - The scheduler loop survives any number of failed cycles
//!
//! If this test fails, an error path has become fatal to the process.

mod common;

use common::*;
use ddns_core::engine::{CycleOutcome, EngineEvent};
use ddns_core::error::Error;
use ddns_core::{DdnsEngine, LastApplied};
use std::time::Duration;

#[tokio::test]
async fn failed_upsert_is_retried_next_cycle() {
    let ip_source = ScriptedIpSource::addresses(&["203.0.113.7"]);
    let provider = MockDnsProvider::empty();
    provider.fail_next(&[Failure::Auth]);

    let (mut engine, _event_rx) = DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider.clone()),
        fast_config(),
    )
    .await
    .unwrap();

    let err = engine.run_cycle().await.unwrap_err();
    assert!(matches!(err, Error::Auth { status: 403, .. }));
    assert_eq!(engine.last_applied(), &LastApplied::Unknown);

    let outcome = engine.run_cycle().await.expect("retry succeeds");
    assert!(matches!(outcome, CycleOutcome::Applied { .. }));
    assert_eq!(provider.upserts(), vec!["203.0.113.7", "203.0.113.7"]);
    assert_eq!(engine.last_applied().address(), Some("203.0.113.7"));
}

#[tokio::test]
async fn zone_not_found_keeps_previous_address() {
    let ip_source = ScriptedIpSource::addresses(&["203.0.113.7", "203.0.113.9"]);
    let provider = MockDnsProvider::empty();

    let (mut engine, _event_rx) = DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider.clone()),
        fast_config(),
    )
    .await
    .unwrap();

    engine.run_cycle().await.unwrap();

    provider.fail_next(&[Failure::ZoneNotFound]);
    let err = engine.run_cycle().await.unwrap_err();

    assert!(matches!(err, Error::ZoneNotFound(_)));
    assert_eq!(engine.last_applied().address(), Some("203.0.113.7"));
    assert_eq!(provider.record_content().as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn ip_echo_outage_skips_cycle() {
    let ip_source = ScriptedIpSource::new([Resolve::Down, Resolve::Address("203.0.113.7")]);
    let provider = MockDnsProvider::empty();

    let (mut engine, _event_rx) = DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider.clone()),
        fast_config(),
    )
    .await
    .unwrap();

    let err = engine.run_cycle().await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));
    assert!(!err.is_fatal());
    assert_eq!(provider.upsert_call_count(), 0);

    engine.run_cycle().await.expect("service is back");
    assert_eq!(provider.upsert_call_count(), 1);
}

#[tokio::test]
async fn loop_survives_failed_cycles() {
    let ip_source = ScriptedIpSource::new([
        Resolve::Down,
        Resolve::Address("203.0.113.7"),
    ]);
    let provider = MockDnsProvider::empty();
    provider.fail_next(&[Failure::Provider, Failure::Auth]);

    let (mut engine, mut event_rx) = DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider.clone()),
        fast_config(),
    )
    .await
    .unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(shutdown_rx).await });

    // Wait for the first successful update
    let mut failures = 0;
    let succeeded = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = event_rx.recv().await {
            match event {
                EngineEvent::CycleFailed { .. } => failures += 1,
                EngineEvent::UpdateSucceeded { address, .. } => return Some(address),
                _ => {}
            }
        }
        None
    })
    .await
    .expect("update happens before timeout");

    shutdown_tx.send(()).unwrap();
    engine_handle.await.unwrap().unwrap();

    assert_eq!(succeeded.as_deref(), Some("203.0.113.7"));
    assert_eq!(failures, 3, "echo outage + provider error + auth error");
    assert_eq!(provider.upsert_call_count(), 3);
}
