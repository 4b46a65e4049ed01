//! # DrainController: bounded-grace shutdown across all in-flight sessions.
//!
//! Created once at startup. Owns the two pieces of process-wide shutdown
//! state:
//!
//! - a **write-once shutdown token** — cancelled exactly once, visible to
//!   every live and future session through its
//!   [`CancelState`](crate::CancelState),
//! - a **task tracker** holding every in-flight session.
//!
//! ## Shutdown path
//! ```text
//! drain():
//!   ├─► Bus.publish(ShutdownRequested)
//!   ├─► shutdown token.cancel()          → sessions observe at checkpoints
//!   ├─► tracker.close()
//!   └─► timeout(grace, tracker.wait()):
//!         ├─ Ok  (all terminal)  → Bus.publish(AllDrainedWithin)
//!         └─ Err (grace elapsed) → Bus.publish(GraceExceeded)
//!                                  ActiveSessions.snapshot() names the
//!                                  abandoned sessions
//! ```
//!
//! Sessions still running when the grace elapses are abandoned; their
//! processes may be reaped independently by host teardown. Sessions created
//! after the token is cancelled observe it at their first checkpoint and
//! refuse new work.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{ActiveSessions, Subscribe};

/// Coordinates bounded-grace shutdown for every session of one service.
pub struct DrainController {
    shutdown: CancellationToken,
    tracker: TaskTracker,
    grace: Duration,
    bus: Bus,
    active: Arc<ActiveSessions>,
}

impl DrainController {
    /// Creates the controller with the given grace window.
    ///
    /// `active` must be subscribed to the same bus the sessions publish to;
    /// it supplies the names for the grace-exceeded report.
    pub fn new(grace: Duration, bus: Bus, active: Arc<ActiveSessions>) -> Self {
        Self {
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
            grace,
            bus,
            active,
        }
    }

    /// A clone of the shutdown token, for wiring into a session's
    /// [`CancelState`](crate::CancelState).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// True once shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Spawns a session future and tracks it until it completes.
    pub fn track<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(fut);
    }

    /// Requests shutdown and waits up to the grace period for in-flight
    /// sessions to reach their terminal state.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] naming the abandoned sessions
    /// when the grace elapses first.
    pub async fn drain(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.shutdown.cancel();
        self.tracker.close();

        match time::timeout(self.grace, self.tracker.wait()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllDrainedWithin));
                Ok(())
            }
            Err(_) => {
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                let stuck = self.active.snapshot().await;
                Err(RuntimeError::GraceExceeded {
                    grace: self.grace,
                    stuck,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(grace: Duration) -> (DrainController, Arc<ActiveSessions>) {
        let active = Arc::new(ActiveSessions::new());
        let ctl = DrainController::new(grace, Bus::new(16), Arc::clone(&active));
        (ctl, active)
    }

    #[tokio::test]
    async fn token_is_visible_to_future_sessions() {
        let (ctl, _active) = controller(Duration::from_secs(1));
        let token = ctl.shutdown_token();
        assert!(!ctl.is_shutting_down());

        ctl.drain().await.unwrap();
        assert!(ctl.is_shutting_down());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn drain_waits_for_tracked_work() {
        let (ctl, _active) = controller(Duration::from_secs(5));
        let token = ctl.shutdown_token();
        ctl.track(async move {
            token.cancelled().await;
            time::sleep(Duration::from_millis(20)).await;
        });
        ctl.drain().await.unwrap();
    }

    #[tokio::test]
    async fn grace_overrun_names_the_stuck_sessions() {
        let (ctl, active) = controller(Duration::from_millis(50));
        active
            .on_event(
                &Event::new(EventKind::SessionStarting).with_session("session-9"),
            )
            .await;
        ctl.track(async {
            time::sleep(Duration::from_secs(30)).await;
        });

        let err = ctl.drain().await.unwrap_err();
        match err {
            RuntimeError::GraceExceeded { grace, stuck } => {
                assert_eq!(grace, Duration::from_millis(50));
                assert_eq!(stuck, vec!["session-9".to_string()]);
            }
        }
    }
}
