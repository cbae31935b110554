//! Device bookkeeping model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per `(user, ip, device_class)` observed at token issuance.
/// Best-effort session bookkeeping, not security-critical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub user_id: Uuid,
    pub ip_address: String,
    /// Coarse OS classification derived from the user agent string.
    pub device_class: String,
    pub last_active_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertDevice {
    pub user_id: Uuid,
    pub ip_address: String,
    pub device_class: String,
}
