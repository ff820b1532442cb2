//! Events exchanged between slices over the event bus.

use crate::broadcast::Broadcast;
use crate::status::PackageStatus;
use chrono::{DateTime, Utc};

/// Published whenever a write appends a history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageStatusChanged {
    pub tracking_number: String,
    pub user_code: Option<String>,
    /// `None` when the package was just created.
    pub previous: Option<PackageStatus>,
    pub current: PackageStatus,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

/// Published after a broadcast is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastPublished {
    pub broadcast: Broadcast,
}
