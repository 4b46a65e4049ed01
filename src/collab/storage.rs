//! # Object storage seam.
//!
//! Sessions may stage input objects from remote storage onto the local disk
//! before spawning, and stage output objects back after the process exits.
//! The transfer mechanics (clients, retries, checksums) belong to the
//! implementation.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// A storage transfer failed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StorageError {
    /// The remote object does not exist.
    #[error("remote object '{remote}' not found")]
    NotFound {
        /// The remote path that was requested.
        remote: String,
    },

    /// Any other transfer failure.
    #[error("storage transfer for '{remote}' failed: {reason}")]
    Transfer {
        /// The remote path involved.
        remote: String,
        /// Backend-specific failure description.
        reason: String,
    },
}

/// Moves objects between remote storage and the local filesystem.
///
/// Remote paths are opaque to the core (`bucket/key`-style strings in the
/// reference deployment).
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Downloads the remote object to the local path.
    ///
    /// Fails with [`StorageError::NotFound`] if the remote object is absent.
    async fn get(&self, remote: &str, local: &Path) -> Result<(), StorageError>;

    /// Uploads the local file to the remote path.
    async fn put(&self, local: &Path, remote: &str) -> Result<(), StorageError>;
}
