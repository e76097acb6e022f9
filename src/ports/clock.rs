//! Wall-clock port.

use chrono::{DateTime, Utc};

/// Source of "now" for cache stamps and cache expiry.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}
