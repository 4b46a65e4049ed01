//! Error types used by the transvisor runtime and streaming sessions.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`] — errors raised by the process-wide runtime (shutdown drain).
//! - [`SessionError`] — failures that end a single streaming session.
//!
//! Both types provide `as_label` / `as_message` helpers for logging and metrics.
//!
//! A non-zero exit code or a signal death of the supervised process is **not**
//! an error at this layer — it is ordinary exit telemetry, reported through the
//! terminal status event and interpreted by the caller.

use std::time::Duration;
use thiserror::Error;

use crate::collab::{MountError, StorageError};

/// # Errors produced by the transvisor runtime.
///
/// These represent failures of the orchestration layer itself, such as a
/// shutdown drain exceeding its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period elapsed with sessions still in flight.
    ///
    /// The named sessions are abandoned; their processes may be reaped
    /// independently by host teardown.
    #[error("shutdown grace {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of sessions that had not reached a terminal state in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck sessions={stuck:?}")
            }
        }
    }
}

/// # Failures that terminate a single streaming session.
///
/// Every variant is fatal to its session and surfaces as exactly one terminal
/// status event, with any already-mounted resources unmounted on the way out.
///
/// Client cancellation and shutdown aborts are deliberately **not** variants
/// here: the first ends a session silently, the second is an `Unavailable`
/// terminal status, and neither is a fault of the session itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SessionError {
    /// The external program could not be started (missing executable, or the
    /// OS refused to create the process).
    #[error("failed to spawn transcoder: {source}")]
    Spawn {
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A required resource could not be mounted.
    #[error(transparent)]
    Mount(#[from] MountError),

    /// Staging an object in or out of remote storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Reaping the process and collecting its exit status failed.
    #[error("failed to collect exit status: {source}")]
    Wait {
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionError::Spawn { .. } => "session_spawn_failed",
            SessionError::Mount(_) => "session_mount_failed",
            SessionError::Storage(_) => "session_storage_failed",
            SessionError::Wait { .. } => "session_wait_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let err = RuntimeError::GraceExceeded {
            grace: Duration::from_secs(5),
            stuck: vec!["session-3".into()],
        };
        assert_eq!(err.as_label(), "runtime_grace_exceeded");
        assert!(err.as_message().contains("session-3"));

        let err = SessionError::Spawn {
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.as_label(), "session_spawn_failed");
    }
}
