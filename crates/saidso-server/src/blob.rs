//! Filesystem-backed blob store for development deployments.
//!
//! Production points this at a mounted volume or swaps in an object
//! storage implementation of the same port.

use std::path::PathBuf;

use rand::Rng;
use saidso_core::SaidsoResult;
use saidso_core::ports::BlobStore;

#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

impl BlobStore for LocalBlobStore {
    async fn put(&self, folder: &str, extension: &str, bytes: Vec<u8>) -> SaidsoResult<String> {
        let file_name = format!("{}-{}.{}", folder, random_suffix(10), extension);
        let reference = format!("{folder}/{file_name}");

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await.map_err(io_error)?;
        tokio::fs::write(dir.join(&file_name), bytes)
            .await
            .map_err(io_error)?;

        Ok(reference)
    }
}

fn io_error(e: std::io::Error) -> saidso_core::SaidsoError {
    saidso_core::SaidsoError::Upstream {
        service: "blob-store".into(),
        message: e.to_string(),
    }
}
