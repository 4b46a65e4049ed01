//! # TranscodeService: the per-call front of the worker.
//!
//! Ties the pieces together for each incoming call:
//!
//! ```text
//! transcode(request, credential, client_token)
//!   ├─► CredentialValidator::validate()        (delegated; Err = no session)
//!   ├─► mpsc::channel(stream_buffer)           (the response stream)
//!   ├─► Session::new(...)                      (wired to client + shutdown tokens)
//!   └─► DrainController::track(session.run())  (optional semaphore permit first)
//!         └─► caller pulls SessionEvents from the receiver
//! ```
//!
//! The service also owns the event bus and the subscriber fan-out: a single
//! listener task forwards every bus event to the [`SubscriberSet`]
//! (fire-and-forget), and an [`ActiveSessions`] tracker is always part of the
//! set so the drain controller can name abandoned sessions.
//!
//! ## Concurrency cap
//! `Config::max_concurrent` (0 = unlimited) bounds how many supervised
//! processes run at once. Queued sessions hold no resources yet; a session
//! that acquires its permit after shutdown began still refuses work at its
//! first checkpoint.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::collab::{AuthError, CredentialValidator, ObjectStore, ResourceMounter};
use crate::config::Config;
use crate::drain::DrainController;
use crate::error::RuntimeError;
use crate::events::{Bus, Event};
use crate::session::{CancelState, Session, SessionEvent, SessionParams, TranscodeRequest};
use crate::shutdown;
use crate::subscribers::{ActiveSessions, Subscribe, SubscriberSet};

/// Serves transcode calls: one streaming session per call, all sessions
/// drained on shutdown.
pub struct TranscodeService {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    drain: DrainController,
    mounter: Arc<dyn ResourceMounter>,
    store: Arc<dyn ObjectStore>,
    auth: Arc<dyn CredentialValidator>,
    semaphore: Option<Arc<Semaphore>>,
    next_id: AtomicU64,
}

impl TranscodeService {
    /// Creates the service with its collaborators and subscribers.
    ///
    /// An [`ActiveSessions`] tracker is appended to the subscriber set
    /// automatically. Must be called from within a Tokio runtime (subscriber
    /// workers and the bus listener are spawned here).
    pub fn new(
        cfg: Config,
        mounter: Arc<dyn ResourceMounter>,
        store: Arc<dyn ObjectStore>,
        auth: Arc<dyn CredentialValidator>,
        mut subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let active = Arc::new(ActiveSessions::new());
        subscribers.push(Arc::clone(&active) as Arc<dyn Subscribe>);
        let subs = Arc::new(SubscriberSet::new(subscribers));
        let drain = DrainController::new(cfg.grace, bus.clone(), active);
        let semaphore = cfg
            .concurrency_limit()
            .map(|n| Arc::new(Semaphore::new(n)));

        let service = Self {
            cfg,
            bus,
            subs,
            drain,
            mounter,
            store,
            auth,
            semaphore,
            next_id: AtomicU64::new(0),
        };
        service.subscriber_listener();
        service
    }

    /// Handles one call: validates the credential, then starts a streaming
    /// session and returns its response stream.
    ///
    /// `client` is the transport's cancellation token — cancel it when the
    /// caller disconnects or explicitly cancels. Dropping the returned
    /// receiver has the same effect.
    ///
    /// A rejected credential creates no session state at all; the transport
    /// maps the error onto its UNAUTHENTICATED status.
    pub async fn transcode(
        &self,
        request: TranscodeRequest,
        credential: &str,
        client: CancellationToken,
    ) -> Result<mpsc::Receiver<SessionEvent>, AuthError> {
        self.auth.validate(credential).await?;

        let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        let name: Arc<str> = format!("session-{id}").into();
        let (tx, rx) = mpsc::channel(self.cfg.stream_buffer_clamped());

        let session = Session::new(SessionParams {
            name,
            request,
            cancel: CancelState::new(client, self.drain.shutdown_token()),
            tx,
            mounter: Arc::clone(&self.mounter),
            store: Arc::clone(&self.store),
            bus: self.bus.clone(),
            program: self.cfg.program.clone(),
            line_buffer: self.cfg.line_buffer_clamped(),
        });

        let semaphore = self.semaphore.clone();
        self.drain.track(async move {
            let _permit = match semaphore {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };
            session.run().await;
        });
        Ok(rx)
    }

    /// A receiver observing every runtime event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// True once shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.drain.is_shutting_down()
    }

    /// Requests shutdown and waits up to the configured grace period for
    /// in-flight sessions to finish.
    pub async fn drain(&self) -> Result<(), RuntimeError> {
        self.drain.drain().await
    }

    /// Blocks until the process receives a termination signal, then drains.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        if let Err(e) = shutdown::wait_for_shutdown_signal().await {
            eprintln!("[transvisor] signal listener failed: {e}; draining immediately");
        }
        self.drain().await
    }

    /// Subscribes to the bus and forwards events to the subscriber set
    /// (fire-and-forget).
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                set.emit(&ev);
            }
        });
    }
}
