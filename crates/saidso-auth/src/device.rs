//! Best-effort device bookkeeping at token issuance.

use saidso_core::models::device::UpsertDevice;
use saidso_core::repository::DeviceRepository;
use tracing::warn;
use uuid::Uuid;

/// Ordered substring lookup; first match wins. Android user agents
/// also contain "Linux", so ordering is significant.
const DEVICE_CLASSES: &[(&str, &str)] = &[
    ("Windows", "Windows PC"),
    ("Macintosh", "Mac"),
    ("Linux", "Linux PC"),
    ("Android", "Android Device"),
    ("iPhone", "iPhone"),
];

pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Classify a user agent string into a coarse device class.
pub fn classify_user_agent(agent: &str) -> &'static str {
    DEVICE_CLASSES
        .iter()
        .find(|(needle, _)| agent.contains(needle))
        .map(|(_, class)| *class)
        .unwrap_or(UNKNOWN_DEVICE)
}

/// Records `(user, ip, device_class)` sightings. Failures are logged
/// and swallowed — bookkeeping must never fail the calling operation.
#[derive(Clone)]
pub struct DeviceRecorder<D: DeviceRepository> {
    devices: D,
}

impl<D: DeviceRepository> DeviceRecorder<D> {
    pub fn new(devices: D) -> Self {
        Self { devices }
    }

    pub async fn record(&self, user_id: Uuid, ip_address: &str, user_agent: Option<&str>) {
        let device_class = user_agent
            .map(classify_user_agent)
            .unwrap_or(UNKNOWN_DEVICE);

        let result = self
            .devices
            .upsert(UpsertDevice {
                user_id,
                ip_address: ip_address.to_string(),
                device_class: device_class.to_string(),
            })
            .await;

        if let Err(e) = result {
            warn!(%user_id, ip = %ip_address, error = %e, "failed to record device");
        }
    }
}
