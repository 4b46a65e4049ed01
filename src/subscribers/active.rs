//! # Stateful subscriber that tracks currently running sessions.
//!
//! [`ActiveSessions`] maintains an in-memory set of live session names by
//! listening to [`EventKind::SessionStarting`] and the terminal session
//! events.
//!
//! The [`DrainController`](crate::DrainController) consults it when the
//! shutdown grace period elapses to name the sessions being abandoned.
//!
//! Updates flow through the subscriber queues, so a snapshot taken at the
//! instant of a transition may lag by a few events; the drain controller only
//! reads it after the full grace period, where that slack is irrelevant.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Tracks which sessions are currently in flight.
///
/// Thread-safe and cloneable — clones share the same internal state.
#[derive(Clone, Default)]
pub struct ActiveSessions {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl ActiveSessions {
    /// Creates a new, empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the names of sessions that have started but not
    /// yet reached a terminal state.
    pub async fn snapshot(&self) -> Vec<String> {
        let g = self.inner.lock().await;
        g.iter().cloned().collect()
    }
}

#[async_trait]
impl Subscribe for ActiveSessions {
    async fn on_event(&self, event: &Event) {
        let Some(session) = event.session.as_deref() else {
            return;
        };
        match event.kind {
            EventKind::SessionStarting => {
                self.inner.lock().await.insert(session.to_string());
            }
            _ if event.is_session_terminal() => {
                self.inner.lock().await.remove(session);
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "active-sessions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracks_session_lifecycle() {
        let tracker = ActiveSessions::new();

        tracker
            .on_event(&Event::new(EventKind::SessionStarting).with_session("session-0"))
            .await;
        tracker
            .on_event(&Event::new(EventKind::SessionStarting).with_session("session-1"))
            .await;
        assert_eq!(tracker.snapshot().await.len(), 2);

        tracker
            .on_event(
                &Event::new(EventKind::SessionCompleted)
                    .with_session("session-0")
                    .with_exit_code(0),
            )
            .await;
        assert_eq!(tracker.snapshot().await, vec!["session-1".to_string()]);

        tracker
            .on_event(&Event::new(EventKind::SessionAborted).with_session("session-1"))
            .await;
        assert!(tracker.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn ignores_events_without_session() {
        let tracker = ActiveSessions::new();
        tracker
            .on_event(&Event::new(EventKind::ShutdownRequested))
            .await;
        assert!(tracker.snapshot().await.is_empty());
    }
}
