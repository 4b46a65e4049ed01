//! # Stream elements delivered to the caller.
//!
//! A session's response stream carries zero or more [`SessionEvent::Line`]s
//! followed by at most one [`SessionEvent::Terminal`]. A client-cancelled
//! session ends with neither: the stream just closes, because there is no
//! receiver left to notify.

use crate::process::ExitTelemetry;

/// One element of a session's response stream.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// One line of the process's merged output.
    Line(String),
    /// The single terminal event ending the session.
    Terminal(TerminalStatus),
}

/// How a session ended.
///
/// The transport layer maps these onto its status codes; the names follow the
/// reference deployment's gRPC vocabulary.
#[derive(Clone, Debug)]
pub enum TerminalStatus {
    /// The process ran to completion; its exit telemetry is attached. A
    /// non-zero exit code or a signal death still completes the session —
    /// interpreting the code is the caller's business.
    Completed(ExitTelemetry),

    /// The session was aborted by host shutdown; the caller should retry
    /// elsewhere.
    Unavailable {
        /// Human-readable context.
        reason: String,
    },

    /// A server-side fault ended the session (spawn, mount, staging, or reap
    /// failure).
    Internal {
        /// Human-readable context.
        reason: String,
    },

    /// A remote input object named by the request does not exist.
    NotFound {
        /// Human-readable context.
        reason: String,
    },
}

impl TerminalStatus {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TerminalStatus::Completed(_) => "completed",
            TerminalStatus::Unavailable { .. } => "unavailable",
            TerminalStatus::Internal { .. } => "internal",
            TerminalStatus::NotFound { .. } => "not_found",
        }
    }
}
