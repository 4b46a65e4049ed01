//! # Credential validation seam.
//!
//! Every call carries an opaque credential (an API key in the reference
//! deployment). Validation is delegated; the core only needs a yes/no before
//! it will create a session.

use async_trait::async_trait;
use thiserror::Error;

/// The caller's credential was not accepted.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthError {
    /// No credential was supplied.
    #[error("missing credential")]
    Missing,

    /// The credential was supplied but rejected.
    #[error("credential rejected")]
    Rejected,
}

/// Validates the opaque per-call credential.
#[async_trait]
pub trait CredentialValidator: Send + Sync + 'static {
    /// Returns `Ok(())` when the credential is acceptable.
    async fn validate(&self, credential: &str) -> Result<(), AuthError>;
}
