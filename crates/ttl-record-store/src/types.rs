//! Record store types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored record: the relative file path a key maps to, and when the
/// mapping stops being valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEntry {
    pub relative_path: String,
    pub expires_at: DateTime<Utc>,
}

impl RecordEntry {
    /// Whether this entry has passed its expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
