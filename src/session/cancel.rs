//! # Per-session cancellation state.
//!
//! Two independent, monotonic cancellation sources can end a session early:
//!
//! - **client** — the caller disconnected or explicitly cancelled; set by the
//!   transport from its own execution context,
//! - **shutdown** — the host is draining; the shared token is cancelled once
//!   by the drain controller and observed by every live and future session.
//!
//! Both are `CancellationToken`s: write-once, never cleared, safe for
//! concurrent readers. Sessions consult them only at checkpoints (before the
//! first line, and after each forwarded line), so at most one in-flight line
//! can follow a cancellation.
//!
//! ## Precedence
//! When both flags are set, **client wins**: a disconnected caller must never
//! be written to, so the silent path takes priority over the `Unavailable`
//! status the shutdown path would emit.

use tokio_util::sync::CancellationToken;

/// Which source cancelled the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelCause {
    /// The caller disconnected or cancelled; end silently.
    Client,
    /// The host is shutting down; tell the still-connected caller.
    Shutdown,
}

/// The pair of cancellation sources wired into one session.
#[derive(Clone)]
pub struct CancelState {
    client: CancellationToken,
    shutdown: CancellationToken,
}

impl CancelState {
    /// Wires a session to its transport token and the process-wide shutdown
    /// token.
    pub fn new(client: CancellationToken, shutdown: CancellationToken) -> Self {
        Self { client, shutdown }
    }

    /// Non-blocking checkpoint: the cancellation cause, if any flag is set.
    ///
    /// Client takes precedence when both are set.
    pub fn checkpoint(&self) -> Option<CancelCause> {
        if self.client.is_cancelled() {
            Some(CancelCause::Client)
        } else if self.shutdown.is_cancelled() {
            Some(CancelCause::Shutdown)
        } else {
            None
        }
    }

    /// Suspends until either source fires, resolving to the cause.
    ///
    /// Client is polled first, preserving the precedence of
    /// [`checkpoint`](Self::checkpoint) when both are already set.
    pub async fn cancelled(&self) -> CancelCause {
        tokio::select! {
            biased;
            _ = self.client.cancelled() => CancelCause::Client,
            _ = self.shutdown.cancelled() => CancelCause::Shutdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_reports_nothing_by_default() {
        let state = CancelState::new(CancellationToken::new(), CancellationToken::new());
        assert_eq!(state.checkpoint(), None);
    }

    #[test]
    fn client_takes_precedence_over_shutdown() {
        let client = CancellationToken::new();
        let shutdown = CancellationToken::new();
        let state = CancelState::new(client.clone(), shutdown.clone());

        shutdown.cancel();
        assert_eq!(state.checkpoint(), Some(CancelCause::Shutdown));

        client.cancel();
        assert_eq!(state.checkpoint(), Some(CancelCause::Client));
    }

    #[tokio::test]
    async fn cancelled_resolves_to_the_firing_source() {
        let client = CancellationToken::new();
        let shutdown = CancellationToken::new();
        let state = CancelState::new(client.clone(), shutdown.clone());

        let wait = tokio::spawn(async move { state.cancelled().await });
        shutdown.cancel();
        assert_eq!(wait.await.unwrap(), CancelCause::Shutdown);
    }

    #[tokio::test]
    async fn cancelled_prefers_client_when_both_set() {
        let client = CancellationToken::new();
        let shutdown = CancellationToken::new();
        client.cancel();
        shutdown.cancel();

        let state = CancelState::new(client, shutdown);
        assert_eq!(state.cancelled().await, CancelCause::Client);
    }
}
