//! # Session: per-call state machine.
//!
//! Bridges one supervised process into one outbound event stream:
//!
//! ```text
//! Created ──► Spawning ──► Streaming ──► Draining ──► Terminal
//!    │            │            │                         ▲
//!    └────────────┴────────────┴─────────────────────────┘
//!              (cancellation / failure short-circuits)
//! ```
//!
//! - *Spawning*: mount resources, stage inputs, spawn the process. Any
//!   failure jumps to Terminal with everything already mounted unmounted.
//! - *Streaming*: pull a line, forward it, evaluate the cancellation
//!   checkpoint; repeat until the output closes or a cancellation fires.
//! - *Draining*: reap the process, stage outputs, emit the terminal event.
//! - *Terminal*: absorbing; the session is released and has no further
//!   effects.
//!
//! ## Rules
//! - Exactly one terminal event per session, and none at all when the client
//!   cancelled (there is no receiver left to notify).
//! - No line events after the terminal event.
//! - Mount/unmount is paired on **every** path, including failures and
//!   cancellations.
//! - The process is reaped on every path that spawned it; a cancelled session
//!   never leaves a zombie behind.
//! - An illegal state transition is a programming error and panics.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::collab::{MountGuard, ObjectStore, ResourceMounter, StorageError};
use crate::error::SessionError;
use crate::events::{Bus, Event, EventKind};
use crate::process::ProcessSupervisor;

use super::cancel::{CancelCause, CancelState};
use super::reply::{SessionEvent, TerminalStatus};
use super::request::TranscodeRequest;

/// Session lifecycle states. `Terminal` is absorbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Created,
    Spawning,
    Streaming,
    Draining,
    Terminal,
}

/// True for the transitions the lifecycle permits.
fn legal_transition(from: State, to: State) -> bool {
    use State::*;
    matches!(
        (from, to),
        (Created, Spawning)
            | (Spawning, Streaming)
            | (Streaming, Draining)
            | (Created, Terminal)
            | (Spawning, Terminal)
            | (Streaming, Terminal)
            | (Draining, Terminal)
    )
}

/// How the streaming loop ended.
enum StreamEnd {
    /// The process closed its output; proceed to Draining.
    Eof,
    /// A cancellation source fired; terminate and abort.
    Cancelled(CancelCause),
}

/// Everything a session needs at construction.
pub(crate) struct SessionParams {
    pub name: Arc<str>,
    pub request: TranscodeRequest,
    pub cancel: CancelState,
    pub tx: mpsc::Sender<SessionEvent>,
    pub mounter: Arc<dyn ResourceMounter>,
    pub store: Arc<dyn ObjectStore>,
    pub bus: Bus,
    pub program: String,
    pub line_buffer: usize,
}

/// One call's worth of state: owns the supervisor, the outbound stream
/// sender, and the cancellation pair.
pub(crate) struct Session {
    name: Arc<str>,
    request: TranscodeRequest,
    cancel: CancelState,
    tx: mpsc::Sender<SessionEvent>,
    mounter: Arc<dyn ResourceMounter>,
    store: Arc<dyn ObjectStore>,
    bus: Bus,
    program: String,
    line_buffer: usize,
    state: State,
}

impl Session {
    pub(crate) fn new(params: SessionParams) -> Self {
        let SessionParams {
            name,
            request,
            cancel,
            tx,
            mounter,
            store,
            bus,
            program,
            line_buffer,
        } = params;
        Self {
            name,
            request,
            cancel,
            tx,
            mounter,
            store,
            bus,
            program,
            line_buffer,
            state: State::Created,
        }
    }

    /// Drives the session to its terminal state.
    pub(crate) async fn run(mut self) {
        self.bus
            .publish(Event::new(EventKind::SessionStarting).with_session(Arc::clone(&self.name)));

        // Checkpoint 1: refuse work that is already cancelled, before any
        // resource is touched or any output consumed.
        if let Some(cause) = self.cancel.checkpoint() {
            self.abort(cause).await;
            return;
        }

        self.advance(State::Spawning);

        let guard =
            match MountGuard::mount_all(Arc::clone(&self.mounter), &self.request.resources).await {
                Ok(guard) => guard,
                Err(e) => {
                    // mount_all already unmounted everything it attempted.
                    self.fail(e.into()).await;
                    return;
                }
            };

        if let Err(e) = self.stage_inputs().await {
            guard.release().await;
            self.fail(e).await;
            return;
        }

        let mut sup = match ProcessSupervisor::spawn(
            &self.program,
            &self.request.args,
            self.line_buffer,
        ) {
            Ok(sup) => sup,
            Err(source) => {
                guard.release().await;
                self.fail(SessionError::Spawn { source }).await;
                return;
            }
        };
        self.bus.publish(
            Event::new(EventKind::SessionSpawned)
                .with_session(Arc::clone(&self.name))
                .with_pid(sup.pid()),
        );

        self.advance(State::Streaming);
        match self.stream(&mut sup).await {
            StreamEnd::Eof => {
                self.advance(State::Draining);
                match sup.wait().await {
                    Ok(telemetry) => {
                        if let Err(e) = self.stage_outputs().await {
                            guard.release().await;
                            self.fail(e).await;
                            return;
                        }
                        guard.release().await;
                        self.bus.publish(
                            Event::new(EventKind::SessionCompleted)
                                .with_session(Arc::clone(&self.name))
                                .with_exit_code(telemetry.exit_code),
                        );
                        self.finish(Some(TerminalStatus::Completed(telemetry))).await;
                    }
                    Err(source) => {
                        guard.release().await;
                        self.fail(SessionError::Wait { source }).await;
                    }
                }
            }
            StreamEnd::Cancelled(cause) => {
                sup.terminate();
                // Reap on the cancellation path too; the telemetry itself has
                // no recipient and is discarded.
                let _ = sup.wait().await;
                guard.release().await;
                self.abort(cause).await;
            }
        }
    }

    /// Streaming loop: forward lines until the output closes or a
    /// cancellation source fires.
    ///
    /// Cancellation is observed while suspended between lines and at the
    /// checkpoint after each forwarded line, so at most one already-in-flight
    /// line follows a cancellation request.
    async fn stream(&mut self, sup: &mut ProcessSupervisor) -> StreamEnd {
        loop {
            tokio::select! {
                biased;
                cause = self.cancel.cancelled() => return StreamEnd::Cancelled(cause),
                line = sup.next_line() => match line {
                    None => return StreamEnd::Eof,
                    Some(text) => {
                        // A dropped receiver is the caller disconnecting,
                        // observed from the send side.
                        if self.tx.send(SessionEvent::Line(text)).await.is_err() {
                            return StreamEnd::Cancelled(CancelCause::Client);
                        }
                        // Checkpoint 2.
                        if let Some(cause) = self.cancel.checkpoint() {
                            return StreamEnd::Cancelled(cause);
                        }
                    }
                }
            }
        }
    }

    async fn stage_inputs(&self) -> Result<(), SessionError> {
        for transfer in &self.request.fetches {
            self.store.get(&transfer.remote, &transfer.local).await?;
        }
        Ok(())
    }

    async fn stage_outputs(&self) -> Result<(), SessionError> {
        for transfer in &self.request.stores {
            self.store.put(&transfer.local, &transfer.remote).await?;
        }
        Ok(())
    }

    /// Ends a cancelled session: silently for a client cancel, with an
    /// `Unavailable` terminal status for a shutdown abort.
    async fn abort(&mut self, cause: CancelCause) {
        let reason = match cause {
            CancelCause::Client => "client",
            CancelCause::Shutdown => "shutdown",
        };
        self.bus.publish(
            Event::new(EventKind::SessionAborted)
                .with_session(Arc::clone(&self.name))
                .with_reason(reason),
        );
        match cause {
            CancelCause::Client => self.finish(None).await,
            CancelCause::Shutdown => {
                self.finish(Some(TerminalStatus::Unavailable {
                    reason: "host is shutting down; retry elsewhere".to_string(),
                }))
                .await;
            }
        }
    }

    /// Ends a failed session with the terminal status the error maps to.
    async fn fail(&mut self, error: SessionError) {
        self.bus.publish(
            Event::new(EventKind::SessionFailed)
                .with_session(Arc::clone(&self.name))
                .with_reason(error.to_string()),
        );
        let status = match &error {
            SessionError::Storage(StorageError::NotFound { remote }) => TerminalStatus::NotFound {
                reason: format!("remote object '{remote}' not found"),
            },
            _ => TerminalStatus::Internal {
                reason: error.to_string(),
            },
        };
        self.finish(Some(status)).await;
    }

    /// The single funnel into `Terminal`: sends the terminal event, if any.
    async fn finish(&mut self, status: Option<TerminalStatus>) {
        self.advance(State::Terminal);
        if let Some(status) = status {
            // The receiver may already be gone; a refused terminal event is
            // indistinguishable from a disconnect and needs no handling.
            let _ = self.tx.send(SessionEvent::Terminal(status)).await;
        }
    }

    fn advance(&mut self, next: State) {
        assert!(
            legal_transition(self.state, next),
            "illegal session state transition: {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }
}
