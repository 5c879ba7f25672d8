//! Error types for the DDNS updater
//!
//! Every failure a cycle can hit maps to one variant here. Only the
//! configuration variants are fatal; the engine logs everything else and
//! carries on with the next cycle.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS updater
#[derive(Error, Debug)]
pub enum Error {
    /// One or more required settings are absent
    #[error("Missing required ENVs: {}", .0.join(","))]
    MissingConfig(Vec<String>),

    /// A setting is present but unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure reaching the IP-echo service or the provider
    #[error("Network error: {0}")]
    Network(String),

    /// The provider rejected the bearer token
    #[error("Unauthorized during {operation} (status {status}). Check your Cloudflare token!")]
    Auth {
        /// Protocol step that was rejected
        operation: &'static str,
        /// HTTP status returned
        status: u16,
    },

    /// Zone lookup returned no results
    #[error("Could not find an active zone named '{0}'")]
    ZoneNotFound(String),

    /// Any other non-success provider response
    #[error("Provider error during {operation} (status {status}): {body}")]
    Provider {
        /// Protocol step that failed
        operation: &'static str,
        /// HTTP status returned
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },

    /// A response did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// State mirror file I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a provider error
    pub fn provider(operation: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self::Provider {
            operation,
            status,
            body: body.into(),
        }
    }

    /// Whether this error should stop the process rather than just the cycle
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingConfig(_) | Self::Config(_))
    }
}
