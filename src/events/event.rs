//! # Runtime events emitted by sessions and the drain controller.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Session lifecycle**: starting, process spawned, completed, aborted, failed
//! - **Shutdown**: shutdown requested, drain outcome
//!
//! The [`Event`] struct carries optional metadata such as the session name,
//! the OS pid, the decoded exit code, and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! observed out of order across subscribers.
//!
//! ## Example
//! ```rust
//! use transvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::SessionCompleted)
//!     .with_session("session-7")
//!     .with_exit_code(0);
//!
//! assert_eq!(ev.kind, EventKind::SessionCompleted);
//! assert_eq!(ev.session.as_deref(), Some("session-7"));
//! assert_eq!(ev.exit_code, Some(0));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Session lifecycle events ===
    /// A session was created and is about to mount resources and spawn.
    ///
    /// Sets:
    /// - `session`: session name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SessionStarting,

    /// The external process was spawned.
    ///
    /// Sets:
    /// - `session`: session name
    /// - `pid`: OS process id
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SessionSpawned,

    /// The process exited and the session emitted its telemetry.
    ///
    /// Sets:
    /// - `session`: session name
    /// - `exit_code`: decoded exit code (negative = killed by signal)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SessionCompleted,

    /// The session was cut short by a cancellation source.
    ///
    /// Sets:
    /// - `session`: session name
    /// - `reason`: `"client"` or `"shutdown"`
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SessionAborted,

    /// The session failed before or after streaming (spawn, mount, staging,
    /// or reap failure).
    ///
    /// Sets:
    /// - `session`: session name
    /// - `reason`: failure message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SessionFailed,

    // === Shutdown events ===
    /// Shutdown requested; the shutdown token has been cancelled.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ShutdownRequested,

    /// Every in-flight session reached a terminal state within the grace
    /// period.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    AllDrainedWithin,

    /// Grace period elapsed with sessions still in flight.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the session, if applicable.
    pub session: Option<Arc<str>>,
    /// Human-readable reason (abort cause, failure message).
    pub reason: Option<Arc<str>>,
    /// OS process id of the supervised process.
    pub pid: Option<u32>,
    /// Decoded exit code (0–255 normal, negative = killed by signal).
    pub exit_code: Option<i32>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next global sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            session: None,
            reason: None,
            pid: None,
            exit_code: None,
        }
    }

    /// Attaches a session name.
    #[inline]
    pub fn with_session(mut self, session: impl Into<Arc<str>>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an OS process id.
    #[inline]
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Attaches a decoded exit code.
    #[inline]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// True for the three kinds that end a session's lifecycle.
    #[inline]
    pub fn is_session_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SessionCompleted | EventKind::SessionAborted | EventKind::SessionFailed
        )
    }
}
