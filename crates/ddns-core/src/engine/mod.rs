//! Core DDNS engine
//!
//! The DdnsEngine owns the scheduler loop and everything that happens in
//! one cycle:
//! - Resolving the current public IP via IpSource
//! - Deciding whether it changed via ChangeDetector
//! - Converging the DNS record via DnsProvider
//! - Mirroring the applied address to the optional state file
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   address   ┌──────────────┐   changed?   ┌─────────────┐
//! │  IpSource   │────────────▶│  DdnsEngine  │─────────────▶│ DnsProvider │
//! └─────────────┘             └──────────────┘              └─────────────┘
//!                                │        │
//!                                ▼        ▼
//!                     ┌────────────────┐ ┌─────────────┐
//!                     │ ChangeDetector │ │   Events    │
//!                     └────────────────┘ └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Resolve the address and validate it as IPv4
//! 2. Compare against the last applied address
//! 3. If changed, run the provider's upsert protocol
//! 4. On success, record the address as applied and mirror it
//! 5. Sleep for the configured interval, then repeat
//!
//! A failed cycle is logged and the loop continues; nothing short of the
//! shutdown future ends it.

use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::state::{ChangeDetector, LastApplied, StateMirror};
use crate::traits::{DnsProvider, IpSource, UpsertAction, UpsertOutcome};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        record_name: String,
        interval: Duration,
    },

    /// Detector seeded from the provider's current record
    Resynced {
        address: String,
    },

    /// Resolved address equals the last applied one
    UpdateSkipped {
        address: String,
    },

    /// Upsert protocol started
    UpdateStarted {
        previous: Option<String>,
        address: String,
    },

    /// Upsert protocol succeeded
    UpdateSucceeded {
        previous: Option<String>,
        address: String,
        action: UpsertAction,
    },

    /// The cycle was abandoned
    CycleFailed {
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// What a successful cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The address matched the last applied one; no provider calls
    Unchanged {
        address: String,
    },
    /// The record was converged onto a new address
    Applied {
        previous: LastApplied,
        address: String,
        upsert: UpsertOutcome,
    },
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run_until()`] (or [`DdnsEngine::run_with_shutdown()`])
/// 3. The engine re-syncs from the provider, then cycles until shutdown
///
/// ## Threading
///
/// Everything runs serially on the caller's task. Cycles never overlap:
/// the interval sleep only begins once the previous cycle has finished.
pub struct DdnsEngine {
    /// IP source for resolving the current address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for converging the record
    provider: Box<dyn DnsProvider>,

    /// Last applied address, owned by this engine only
    detector: ChangeDetector,

    /// Optional file mirroring the applied address
    mirror: Option<StateMirror>,

    /// Time between cycles
    interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub async fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        if config.interval.is_zero() {
            return Err(Error::config("Engine interval must be > 0"));
        }

        let mirror = match &config.state_file {
            Some(path) => Some(StateMirror::new(path).await?),
            None => None,
        };

        let (tx, rx) = mpsc::channel(config.event_channel_capacity.max(1));

        let engine = Self {
            ip_source,
            provider,
            detector: ChangeDetector::new(),
            mirror,
            interval: config.interval,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// The last applied address as currently known
    pub fn last_applied(&self) -> &LastApplied {
        self.detector.last_applied()
    }

    /// Run the engine until a oneshot fires (or its sender is dropped)
    pub async fn run_with_shutdown(&mut self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_until(async {
            let _ = shutdown_rx.await;
        })
        .await
    }

    /// Run the engine until `shutdown` completes
    ///
    /// A cycle in flight when `shutdown` completes is dropped; the provider
    /// protocol is safe to abandon between steps because nothing is cached.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.emit_event(EngineEvent::Started {
            record_name: self.provider.record_name().to_string(),
            interval: self.interval,
        });

        let stopped = tokio::select! {
            _ = self.sync_from_provider() => false,
            _ = &mut shutdown => true,
        };

        if !stopped {
            loop {
                tokio::select! {
                    result = self.run_cycle() => {
                        if let Err(e) = result {
                            self.report_failure(&e);
                        }
                    }
                    _ = &mut shutdown => break,
                }

                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    _ = &mut shutdown => break,
                }
            }
        }

        info!("Shutdown signal received, engine stopped");
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        Ok(())
    }

    /// Seed the change detector from the provider's current record
    ///
    /// A restart then neither forces a redundant update nor trusts a stale
    /// in-memory value. Failure leaves the detector `Unknown`, so the first
    /// cycle performs a full upsert.
    pub async fn sync_from_provider(&mut self) {
        debug!(
            "Fetching current content of {} from {}",
            self.provider.record_name(),
            self.provider.provider_name()
        );

        match self.provider.current_content().await {
            Ok(Some(content)) => {
                if self.detector.seed(&content) {
                    info!(
                        "Current DNS record: {} -> {}",
                        self.provider.record_name(),
                        content.trim()
                    );
                    self.emit_event(EngineEvent::Resynced {
                        address: content.trim().to_string(),
                    });
                }
            }
            Ok(None) => {
                info!(
                    "DNS record {} does not exist yet; it will be created",
                    self.provider.record_name()
                );
            }
            Err(e) => {
                warn!(
                    "Could not read current DNS record {}: {}. First cycle will update unconditionally.",
                    self.provider.record_name(),
                    e
                );
            }
        }
    }

    /// Run one resolve → detect → upsert cycle
    ///
    /// # Returns
    ///
    /// - `Ok(CycleOutcome::Unchanged)`: no provider calls were made
    /// - `Ok(CycleOutcome::Applied)`: the record now matches the address
    /// - `Err(Error)`: the cycle was abandoned; the last applied address is untouched
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        debug!("Getting IP from {}", self.ip_source.source_name());
        let raw = self.ip_source.resolve().await?;
        let address = validate_ipv4(&raw)?;
        debug!("Acquired IP: {}", address);

        if !self.detector.has_changed(&address) {
            self.emit_event(EngineEvent::UpdateSkipped {
                address: address.clone(),
            });
            return Ok(CycleOutcome::Unchanged { address });
        }

        let previous_address = self.detector.last_applied().address().map(str::to_string);
        info!(
            "Updating IP ({} -> {})",
            self.detector.last_applied(),
            address
        );
        self.emit_event(EngineEvent::UpdateStarted {
            previous: previous_address.clone(),
            address: address.clone(),
        });

        let upsert = self.provider.upsert_record(&address).await?;

        let previous = self.detector.record_applied(&address);
        info!(
            "{} ({} -> {}){}",
            match upsert.action {
                UpsertAction::Create => "DNS record created",
                UpsertAction::Update { .. } => "DNS record updated",
            },
            previous,
            address,
            if upsert.dry_run { " [dry-run]" } else { "" }
        );

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.write(&address).await {
                warn!(
                    "Failed to mirror IP to {}: {}",
                    mirror.path().display(),
                    e
                );
            }
        }

        self.emit_event(EngineEvent::UpdateSucceeded {
            previous: previous_address,
            address: address.clone(),
            action: upsert.action.clone(),
        });

        Ok(CycleOutcome::Applied {
            previous,
            address,
            upsert,
        })
    }

    fn report_failure(&self, e: &Error) {
        match e {
            Error::Network(_) => error!("Cycle skipped, could not reach service: {}", e),
            Error::Auth { .. } => error!("Cycle failed for {}: {}", self.provider.record_name(), e),
            _ => error!(
                "Cycle failed for {} via {}: {}",
                self.provider.record_name(),
                self.provider.provider_name(),
                e
            ),
        }
        self.emit_event(EngineEvent::CycleFailed {
            error: e.to_string(),
        });
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Channel full means nobody is draining events; drop rather than block
        if self.event_tx.try_send(event).is_err() && !self.event_tx.is_closed() {
            warn!("Event channel full, dropping event");
        }
    }
}

/// Check that resolved text is an IPv4 dotted quad
fn validate_ipv4(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    trimmed
        .parse::<Ipv4Addr>()
        .map(|_| trimmed.to_string())
        .map_err(|_| Error::malformed(format!("IP-echo returned '{}', not an IPv4 address", trimmed)))
}
