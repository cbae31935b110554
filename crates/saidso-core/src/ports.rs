//! Collaborator ports — interfaces to systems outside the identity
//! core. Implementations live at the composition root (`saidso-server`
//! provides Resend-backed email and a filesystem blob store).

use crate::error::SaidsoResult;

/// Outbound message templates the identity core can dispatch.
#[derive(Debug, Clone)]
pub enum Notification {
    VerifyEmail {
        recipient_name: String,
        verification_url: String,
    },
    ResetPassword {
        reset_url: String,
    },
}

/// Fire-and-forget message delivery. Failures bubble up as
/// `SaidsoError::Upstream`; the core never retries.
pub trait Notifier: Send + Sync {
    fn send(
        &self,
        to: &str,
        notification: Notification,
    ) -> impl Future<Output = SaidsoResult<()>> + Send;
}

/// Binary object storage. Given raw bytes, returns an opaque reference
/// string that can later be served or resolved elsewhere.
pub trait BlobStore: Send + Sync {
    fn put(
        &self,
        folder: &str,
        extension: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = SaidsoResult<String>> + Send;
}

/// In-memory blob store for tests: remembers every stored object and
/// hands back deterministic references.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: std::sync::Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| {
                objects
                    .iter()
                    .map(|(reference, _)| reference.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl BlobStore for MemoryBlobStore {
    async fn put(&self, folder: &str, extension: &str, bytes: Vec<u8>) -> SaidsoResult<String> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| crate::SaidsoError::Internal("blob store lock poisoned".into()))?;
        let reference = format!("{}/{}-{}.{}", folder, "blob", objects.len(), extension);
        objects.push((reference.clone(), bytes));
        Ok(reference)
    }
}
