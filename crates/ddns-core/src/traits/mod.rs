//! Core traits for the DDNS updater
//!
//! - [`IpSource`]: resolve the current public IP
//! - [`DnsProvider`]: converge the DNS record onto that IP

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecordSpec, UpsertAction, UpsertOutcome};
