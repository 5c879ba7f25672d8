//! Test doubles and common utilities for engine contract tests
//!
//! The doubles keep their state behind `Arc`s so a test can hand a clone to
//! the engine and keep another clone for assertions.

#![allow(dead_code)]

use ddns_core::config::EngineConfig;
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, IpSource, UpsertAction, UpsertOutcome};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted answer from the IP source
#[derive(Debug, Clone)]
pub enum Resolve {
    /// Return this text
    Address(&'static str),
    /// Fail as if the IP-echo service were unreachable
    Down,
}

/// An IpSource that answers from a script, repeating the last entry forever
#[derive(Clone)]
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<Resolve>>>,
    resolve_call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(script: impl IntoIterator<Item = Resolve>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shorthand for a script of plain addresses
    pub fn addresses(addresses: &[&'static str]) -> Self {
        Self::new(addresses.iter().map(|a| Resolve::Address(*a)))
    }

    /// Get the number of times resolve() was called
    pub fn resolve_call_count(&self) -> usize {
        self.resolve_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn resolve(&self) -> Result<String> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);

        let mut script = self.script.lock().unwrap();
        let step = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };

        match step {
            Some(Resolve::Address(address)) => Ok(address.to_string()),
            Some(Resolve::Down) => Err(Error::network("connection refused")),
            None => Err(Error::network("empty script")),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// Failure a MockDnsProvider can be told to produce
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Auth,
    ZoneNotFound,
    Provider,
}

impl Failure {
    fn into_error(self) -> Error {
        match self {
            Failure::Auth => Error::Auth {
                operation: "zone lookup",
                status: 403,
            },
            Failure::ZoneNotFound => Error::ZoneNotFound("example.com".to_string()),
            Failure::Provider => Error::provider("record update", 500, "internal error"),
        }
    }
}

/// A DnsProvider that simulates a single A record and tracks calls
#[derive(Clone)]
pub struct MockDnsProvider {
    /// Current (record_id, content), None when the record doesn't exist
    record: Arc<Mutex<Option<(String, String)>>>,
    /// Failures to return from upcoming upsert calls, in order
    upsert_failures: Arc<Mutex<VecDeque<Failure>>>,
    /// When set, current_content() fails
    lookup_fails: Arc<Mutex<bool>>,
    /// Addresses passed to upsert_record()
    upserts: Arc<Mutex<Vec<String>>>,
    /// Call counter for current_content()
    content_call_count: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    /// Provider whose record does not exist yet
    pub fn empty() -> Self {
        Self {
            record: Arc::new(Mutex::new(None)),
            upsert_failures: Arc::new(Mutex::new(VecDeque::new())),
            lookup_fails: Arc::new(Mutex::new(false)),
            upserts: Arc::new(Mutex::new(Vec::new())),
            content_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Provider whose record already points at `content`
    pub fn with_record(record_id: &str, content: &str) -> Self {
        let provider = Self::empty();
        *provider.record.lock().unwrap() = Some((record_id.to_string(), content.to_string()));
        provider
    }

    /// Queue failures for the next upsert calls
    pub fn fail_next(&self, failures: &[Failure]) {
        self.upsert_failures
            .lock()
            .unwrap()
            .extend(failures.iter().copied());
    }

    /// Make current_content() fail
    pub fn fail_lookups(&self) {
        *self.lookup_fails.lock().unwrap() = true;
    }

    /// Addresses passed to upsert_record(), including failed attempts
    pub fn upserts(&self) -> Vec<String> {
        self.upserts.lock().unwrap().clone()
    }

    /// Get the number of times upsert_record() was called
    pub fn upsert_call_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }

    /// Get the number of times current_content() was called
    pub fn content_call_count(&self) -> usize {
        self.content_call_count.load(Ordering::SeqCst)
    }

    /// What the simulated record currently holds
    pub fn record_content(&self) -> Option<String> {
        self.record
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, content)| content.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn upsert_record(&self, address: &str) -> Result<UpsertOutcome> {
        self.upserts.lock().unwrap().push(address.to_string());

        if let Some(failure) = self.upsert_failures.lock().unwrap().pop_front() {
            return Err(failure.into_error());
        }

        let mut record = self.record.lock().unwrap();
        let action = match record.as_mut() {
            Some((record_id, content)) => {
                *content = address.to_string();
                UpsertAction::Update {
                    record_id: record_id.clone(),
                }
            }
            None => {
                *record = Some(("r1".to_string(), address.to_string()));
                UpsertAction::Create
            }
        };

        Ok(UpsertOutcome {
            zone_id: "z1".to_string(),
            action,
            dry_run: false,
        })
    }

    async fn current_content(&self) -> Result<Option<String>> {
        self.content_call_count.fetch_add(1, Ordering::SeqCst);
        if *self.lookup_fails.lock().unwrap() {
            return Err(Error::network("provider unreachable"));
        }
        Ok(self.record_content())
    }

    fn record_name(&self) -> &str {
        "home.example.com"
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Engine configuration with a short interval for loop tests
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        interval: Duration::from_millis(10),
        state_file: None,
        event_channel_capacity: 100,
    }
}
