// # IP Source Trait
//
// Defines the interface for resolving the caller's current public IP.
//
// ## Implementations
//
// - HTTP IP-echo: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let address = source.resolve().await?;
//     println!("Current IP: {}", address);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for IP source implementations
///
/// An IP source answers one question: what is the public address right now?
/// It is called once per cycle by the engine and keeps no state between
/// calls.
///
/// ## Contract
///
/// - Surrounding whitespace and newlines are stripped from the returned text
/// - The text is otherwise passed through untouched; validating it as an
///   address is the caller's job
/// - Transport failures are reported as [`crate::Error::Network`]
/// - No retries and no background tasks; the next cycle is the retry
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Resolve the current public IP address as trimmed text
    async fn resolve(&self) -> Result<String, crate::Error>;

    /// Short name for logging (e.g. "http")
    fn source_name(&self) -> &'static str;
}
