//! Collaborator seams consumed by the core.
//!
//! Mounting remote filesystems, moving objects in and out of storage, and
//! validating caller credentials are all someone else's job: the core consumes
//! these capabilities behind traits and never assumes a concrete backend.

mod auth;
mod mounts;
mod storage;

pub use auth::{AuthError, CredentialValidator};
pub use mounts::{MountError, MountGuard, ResourceMounter};
pub use storage::{ObjectStore, StorageError};
