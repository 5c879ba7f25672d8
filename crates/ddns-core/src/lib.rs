// # ddns-core
//
// Core library for the Cloudflare DDNS updater.
//
// ## Architecture Overview
//
// This library provides everything between "what is my IP?" and "the DNS
// record says so":
// - **IpSource**: Trait for resolving the current public IP
// - **DnsProvider**: Trait for the zone → record → create-or-update protocol
// - **ChangeDetector**: Last applied address and the "did it change?" decision
// - **StateMirror**: Optional file mirroring the last applied address
// - **DdnsEngine**: Scheduler loop running resolve → detect → upsert → sleep
//
// ## Design Principles
//
// 1. **Explicit state**: Configuration is a value built once at startup; the
//    last applied address is owned by the engine, never global
// 2. **Cycle-scoped failure**: Any error abandons the current cycle only
// 3. **No caching**: Zone and record identifiers are resolved on every upsert
// 4. **Library-First**: The daemon is a thin wrapper around this crate

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, DnsRecordSpec, UpsertAction, UpsertOutcome};
pub use engine::{DdnsEngine, EngineEvent, CycleOutcome};
pub use config::{DdnsConfig, EngineConfig, IpSourceConfig, ProviderConfig};
pub use error::{Error, Result};
pub use state::{ChangeDetector, LastApplied, StateMirror};
