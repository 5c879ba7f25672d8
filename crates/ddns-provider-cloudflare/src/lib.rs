// # Cloudflare DNS Provider
//
// This crate implements the DNS upsert protocol against Cloudflare API v4.
//
// ## Protocol
//
// Every upsert runs three steps in order and stops at the first failure:
//
// 1. Zone lookup: GET `/zones?name=<zone>&status=active`
//    - empty result → `Error::ZoneNotFound`
// 2. Record lookup: GET `/zones/:zone_id/dns_records?type=A&name=<record>`
//    - empty result → create mode
//    - otherwise the first result's id → update mode
// 3. Write: POST `/zones/:zone_id/dns_records` (create) or
//    PUT `/zones/:zone_id/dns_records/:record_id` (update)
//
// Identifiers are looked up fresh on every call; nothing is cached.
//
// ## Status Mapping
//
// - 401 / 403 → `Error::Auth`
// - any other non-2xx → `Error::Provider` with the response body
// - transport failure or timeout → `Error::Network`
// - unexpected JSON shape → `Error::MalformedResponse`
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Every request is authorized through the single `authorized()` helper

use async_trait::async_trait;
use ddns_core::config::ProviderConfig;
use ddns_core::traits::{DnsProvider, DnsRecordSpec, UpsertAction, UpsertOutcome};
use ddns_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const OP_ZONE_LOOKUP: &str = "zone lookup";
const OP_RECORD_LOOKUP: &str = "record lookup";
const OP_RECORD_CREATE: &str = "record create";
const OP_RECORD_UPDATE: &str = "record update";

/// List envelope returned by Cloudflare, e.g. `{ "result": [ { "id": "..." } ] }`
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    result: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ZoneResult {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RecordResult {
    id: String,
    #[serde(default)]
    content: Option<String>,
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform the zone and record lookups
/// - Log the intended create/update payload
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone name to look up
    zone: String,

    /// A record name to maintain
    record: String,

    /// TTL sent with every write
    ttl: u32,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform lookups but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone", &self.zone)
            .field("record", &self.record)
            .field("ttl", &self.ttl)
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token, zone or record is empty, or the HTTP
    /// client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        if config.api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }
        if config.zone.is_empty() || config.record.is_empty() {
            return Err(Error::config("Cloudflare zone and record names are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if config.dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            api_token: config.api_token.clone(),
            zone: config.zone.clone(),
            record: config.record.clone(),
            ttl: config.ttl,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
            dry_run: config.dry_run,
        })
    }

    /// Attach the bearer credential to a request
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.api_token)
    }

    /// Send an authorized request and map any failure to a typed error
    ///
    /// Returns the body of a successful response.
    async fn send(&self, request: reqwest::RequestBuilder, operation: &'static str) -> Result<String> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| Error::network(format!("Cloudflare {} failed: {}", operation, e)))?;

        let status = response.status();
        if status.is_success() {
            return response.text().await.map_err(|e| {
                Error::network(format!("Cloudflare {} response was cut short: {}", operation, e))
            });
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        match status.as_u16() {
            401 | 403 => Err(Error::Auth {
                operation,
                status: status.as_u16(),
            }),
            code => Err(Error::provider(operation, code, body)),
        }
    }

    /// Send a lookup and decode its list envelope
    async fn list<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<Vec<T>> {
        let body = self.send(request, operation).await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            Error::malformed(format!("Unexpected {} response: {}", operation, e))
        })?;
        Ok(envelope.result)
    }

    /// Step 1: resolve the active zone's identifier
    async fn lookup_zone(&self) -> Result<String> {
        tracing::debug!("Getting Zone ID for '{}'", self.zone);

        let request = self
            .client
            .get(format!("{}/zones", self.api_base))
            .query(&[("name", self.zone.as_str()), ("status", "active")]);

        let zones: Vec<ZoneResult> = self.list(request, OP_ZONE_LOOKUP).await?;
        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::ZoneNotFound(self.zone.clone()))?;

        tracing::debug!("Zone ID for '{}' is '{}'", self.zone, zone.id);
        Ok(zone.id)
    }

    /// Step 2: resolve the A record within the zone, if it exists
    async fn lookup_record(&self, zone_id: &str) -> Result<Option<RecordResult>> {
        tracing::debug!("Getting Record ID for '{}'", self.record);

        let request = self
            .client
            .get(format!("{}/zones/{}/dns_records", self.api_base, zone_id))
            .query(&[("type", "A"), ("name", self.record.as_str())]);

        let records: Vec<RecordResult> = self.list(request, OP_RECORD_LOOKUP).await?;
        let record = records.into_iter().next();

        match &record {
            Some(found) => tracing::debug!("Record ID for '{}' is '{}'", self.record, found.id),
            None => tracing::debug!("No A record named '{}' yet", self.record),
        }
        Ok(record)
    }

    /// Step 3 (create mode): POST a new record into the zone
    async fn create_record(&self, zone_id: &str, spec: &DnsRecordSpec) -> Result<()> {
        let url = format!("{}/zones/{}/dns_records", self.api_base, zone_id);
        let request = self.client.post(url).json(spec);
        self.send(request, OP_RECORD_CREATE).await?;
        Ok(())
    }

    /// Step 3 (update mode): PUT a full replacement of an existing record
    async fn replace_record(&self, zone_id: &str, record_id: &str, spec: &DnsRecordSpec) -> Result<()> {
        let url = format!("{}/zones/{}/dns_records/{}", self.api_base, zone_id, record_id);
        let request = self.client.put(url).json(spec);
        self.send(request, OP_RECORD_UPDATE).await?;
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn upsert_record(&self, address: &str) -> Result<UpsertOutcome> {
        let zone_id = self.lookup_zone().await?;
        let existing = self.lookup_record(&zone_id).await?;

        let spec = DnsRecordSpec::a(&self.record, address.trim(), self.ttl);
        let action = match existing {
            None => UpsertAction::Create,
            Some(record) => UpsertAction::Update {
                record_id: record.id,
            },
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would {} '{}' in zone {} with payload: {}",
                match action {
                    UpsertAction::Create => "create",
                    UpsertAction::Update { .. } => "update",
                },
                self.record,
                zone_id,
                serde_json::to_string(&spec).unwrap_or_default()
            );
            return Ok(UpsertOutcome {
                zone_id,
                action,
                dry_run: true,
            });
        }

        match &action {
            UpsertAction::Create => {
                tracing::debug!("Creating DNS record for '{}'", self.record);
                self.create_record(&zone_id, &spec).await?;
            }
            UpsertAction::Update { record_id } => {
                tracing::debug!("Updating DNS record for '{}'", self.record);
                self.replace_record(&zone_id, record_id, &spec).await?;
            }
        }

        tracing::debug!("Cloudflare accepted '{}' for '{}'", spec.content, self.record);
        Ok(UpsertOutcome {
            zone_id,
            action,
            dry_run: false,
        })
    }

    async fn current_content(&self) -> Result<Option<String>> {
        let zone_id = self.lookup_zone().await?;
        let record = self.lookup_record(&zone_id).await?;
        Ok(record.and_then(|r| r.content))
    }

    fn record_name(&self) -> &str {
        &self.record
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
