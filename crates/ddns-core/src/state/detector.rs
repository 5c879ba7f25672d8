// # Change Detector
//
// Holds the last address confirmed as written to the provider and decides
// whether a freshly resolved address needs an upsert.
//
// ## Lifecycle
//
// - Starts as `LastApplied::Unknown`, which never equals a real address,
//   so the first resolved address always counts as changed
// - `seed()` fills it from the provider's current record at startup
// - `record_applied()` overwrites it after a successful upsert
//
// It never writes on its own: `has_changed()` only decides.

use chrono::{DateTime, Utc};
use tracing::debug;

/// Last address known to be live at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastApplied {
    /// Nothing confirmed yet in this process
    Unknown,
    /// Confirmed address
    Known {
        /// The address text
        address: String,
        /// When it was confirmed
        applied_at: DateTime<Utc>,
    },
}

impl LastApplied {
    /// The address, if known
    pub fn address(&self) -> Option<&str> {
        match self {
            LastApplied::Unknown => None,
            LastApplied::Known { address, .. } => Some(address),
        }
    }

    /// When the address was confirmed, if known
    pub fn applied_at(&self) -> Option<DateTime<Utc>> {
        match self {
            LastApplied::Unknown => None,
            LastApplied::Known { applied_at, .. } => Some(*applied_at),
        }
    }
}

impl std::fmt::Display for LastApplied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LastApplied::Unknown => f.write_str("N/A"),
            LastApplied::Known { address, .. } => f.write_str(address),
        }
    }
}

/// Compares resolved addresses against the last applied one
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    last: LastApplied,
}

impl ChangeDetector {
    /// Create a detector in the `Unknown` state
    pub fn new() -> Self {
        Self {
            last: LastApplied::Unknown,
        }
    }

    /// The current last-applied value
    pub fn last_applied(&self) -> &LastApplied {
        &self.last
    }

    /// Whether `current` differs from the last applied address
    ///
    /// Comparison is byte-for-byte on trimmed text.
    pub fn has_changed(&self, current: &str) -> bool {
        let current = current.trim();
        match &self.last {
            LastApplied::Known {
                address,
                applied_at,
            } if address == current => {
                debug!(
                    "IP ({}) hasn't changed since {}. No update required.",
                    current,
                    applied_at.to_rfc3339()
                );
                false
            }
            _ => true,
        }
    }

    /// Record a successful upsert and return the previous value
    pub fn record_applied(&mut self, address: &str) -> LastApplied {
        let next = LastApplied::Known {
            address: address.trim().to_string(),
            applied_at: Utc::now(),
        };
        std::mem::replace(&mut self.last, next)
    }

    /// Fill an `Unknown` detector from the provider's current content
    ///
    /// Returns false and leaves the state alone if an address is already known.
    pub fn seed(&mut self, address: &str) -> bool {
        if self.last != LastApplied::Unknown {
            return false;
        }
        self.record_applied(address);
        true
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}
