// # DNS Provider Trait
//
// Defines the interface for converging a provider's A record onto an address.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let outcome = provider.upsert_record("203.0.113.7").await?;
//     println!("{:?}", outcome.action);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::Serialize;

/// Desired state of the managed DNS record
///
/// Serializes to the body sent on create and update:
///
/// ```json
/// { "type": "A", "name": "home.example.com", "content": "203.0.113.7", "ttl": 1, "proxied": false }
/// ```
///
/// Provider-side proxying is never enabled; `proxied` has no setter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecordSpec {
    /// Record type, always "A"
    #[serde(rename = "type")]
    pub record_type: &'static str,
    /// Record name
    pub name: String,
    /// Address the record should point at
    pub content: String,
    /// Time-to-live in seconds (`1` = automatic)
    pub ttl: u32,
    proxied: bool,
}

impl DnsRecordSpec {
    /// Build an A record spec
    pub fn a(name: impl Into<String>, content: impl Into<String>, ttl: u32) -> Self {
        Self {
            record_type: "A",
            name: name.into(),
            content: content.into(),
            ttl,
            proxied: false,
        }
    }

    /// Whether provider-side proxying is requested (always false)
    pub fn proxied(&self) -> bool {
        self.proxied
    }
}

/// Which write the upsert protocol chose
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertAction {
    /// No record existed; one was created
    Create,
    /// An existing record was replaced
    Update {
        /// Identifier of the replaced record
        record_id: String,
    },
}

/// Result of a successful upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Zone the record lives in, as resolved during this upsert
    pub zone_id: String,
    /// Create or update
    pub action: UpsertAction,
    /// True when the write was skipped because the provider is in dry-run mode
    pub dry_run: bool,
}

/// Trait for DNS provider implementations
///
/// # Protocol
///
/// `upsert_record` runs the full lookup-then-write sequence every time:
///
/// 1. Resolve the zone identifier from the configured zone name
/// 2. Resolve the record identifier (absent means "create")
/// 3. Create the record, or replace the existing one
///
/// Identifiers are never cached across calls. A failure at any step aborts
/// the call without attempting later steps.
///
/// # Forbidden
///
/// - ❌ Retry logic or backoff (the next engine cycle is the retry)
/// - ❌ Deciding whether an update is needed (owned by `DdnsEngine`)
/// - ❌ Spawning tasks
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Converge the managed record onto `address`
    ///
    /// # Returns
    ///
    /// - `Ok(UpsertOutcome)`: the record now points at `address`
    /// - `Err(Error)`: `Auth`, `ZoneNotFound`, `Provider`, `Network` or
    ///   `MalformedResponse`, depending on where the protocol stopped
    async fn upsert_record(&self, address: &str) -> Result<UpsertOutcome, crate::Error>;

    /// Fetch the record's current content from the provider
    ///
    /// Used once at startup to re-sync the change detector.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(content))`: the record exists
    /// - `Ok(None)`: the record does not exist yet
    /// - `Err(Error)`: the lookup failed
    async fn current_content(&self) -> Result<Option<String>, crate::Error>;

    /// The managed record name (for logging)
    fn record_name(&self) -> &str;

    /// The provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
