//! # transvisor
//!
//! **Transvisor** is the process-supervision and streaming-response core of a
//! transcode worker: it runs one external transcoding process per call,
//! streams the process's merged output to the caller line by line, honors
//! cancellation from either side mid-flight, and reports structured exit
//! telemetry (exit code or signal, wall time, OS resource counters).
//!
//! The transcoder itself is an opaque black box; nothing here knows about
//! codecs. Object storage, filesystem mounting, and credential checking are
//! consumed behind traits and implemented elsewhere.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  call ──► TranscodeService::transcode(request, credential, client_token)
//!              │ CredentialValidator (delegated)
//!              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Session (per-call state machine)                                 │
//! │  Created ─► Spawning ─► Streaming ─► Draining ─► Terminal         │
//! │     │          │ mount + stage (collaborators)                    │
//! │     │          ▼                                                  │
//! │     │    ProcessSupervisor ── merged stdout/stderr ── lines ──►   │──► caller stream
//! │     │          │                                                  │
//! │     │     CancelState {client, shutdown} at checkpoints           │
//! │     └── exactly one terminal event (telemetry or status)          │
//! └───────────────┬───────────────────────────────────────────────────┘
//!                 │ publishes lifecycle events
//!                 ▼
//!          Bus (broadcast) ──► SubscriberSet ──► subscribers
//!                                   └── ActiveSessions (drain report)
//!
//!  OS signal ──► DrainController: cancel shutdown token,
//!                wait ≤ grace for all tracked sessions
//! ```
//!
//! ### Lifecycle
//! ```text
//! transcode() ──► Session::run()
//!
//!   ├─► checkpoint 1: already cancelled?
//!   │     ├─ client   → end silently (no events at all)
//!   │     └─ shutdown → terminal Unavailable
//!   ├─► mount resources, stage inputs, spawn process
//!   │     └─ failure  → terminal Internal/NotFound, unmount what mounted
//!   ├─► loop: next_line ─► forward ─► checkpoint 2
//!   │     ├─ output closed → wait() → stage outputs
//!   │     │                  → terminal Completed(ExitTelemetry)
//!   │     ├─ client cancel  → terminate() + reap → end silently
//!   │     └─ shutdown       → terminate() + reap → terminal Unavailable
//!   └─► unmount resources (every path)
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Spawn, stream, terminate, and reap one process per call.           | [`ProcessSupervisor`], [`ExitTelemetry`]    |
//! | **Sessions**      | Per-call streaming with cancellation checkpoints.                  | [`SessionEvent`], [`TerminalStatus`]        |
//! | **Cancellation**  | Client + shutdown sources, write-once, checkpoint semantics.       | [`CancelState`], [`CancelCause`]            |
//! | **Shutdown**      | Bounded-grace drain of all in-flight sessions.                     | [`DrainController`], [`RuntimeError`]       |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics).                     | [`Subscribe`], [`SubscriberSet`]            |
//! | **Collaborators** | Storage, mounting, and credential seams consumed by the core.      | [`ObjectStore`], [`ResourceMounter`], [`CredentialValidator`] |
//! | **Configuration** | Centralized runtime settings.                                      | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use transvisor::{
//!     AuthError, Config, CredentialValidator, MountError, ObjectStore, ResourceMounter,
//!     SessionEvent, StorageError, TranscodeRequest, TranscodeService,
//! };
//!
//! struct Fuse;
//!
//! #[async_trait]
//! impl ResourceMounter for Fuse {
//!     async fn mount(&self, _resource: &str) -> Result<(), MountError> { Ok(()) }
//!     async fn unmount(&self, _resource: &str) -> Result<(), MountError> { Ok(()) }
//! }
//!
//! struct Gcs;
//!
//! #[async_trait]
//! impl ObjectStore for Gcs {
//!     async fn get(&self, _remote: &str, _local: &Path) -> Result<(), StorageError> { Ok(()) }
//!     async fn put(&self, _local: &Path, _remote: &str) -> Result<(), StorageError> { Ok(()) }
//! }
//!
//! struct ApiKeys;
//!
//! #[async_trait]
//! impl CredentialValidator for ApiKeys {
//!     async fn validate(&self, _credential: &str) -> Result<(), AuthError> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = TranscodeService::new(
//!         Config::default(),
//!         Arc::new(Fuse),
//!         Arc::new(Gcs),
//!         Arc::new(ApiKeys),
//!         Vec::new(),
//!     );
//!
//!     let request = TranscodeRequest::new(["-i", "in.mp4", "-y", "out.avi"])
//!         .with_resources(["media-bucket"]);
//!     let mut stream = service
//!         .transcode(request, "api-key", CancellationToken::new())
//!         .await
//!         .expect("credential accepted");
//!
//!     while let Some(event) = stream.recv().await {
//!         match event {
//!             SessionEvent::Line(line) => println!("{line}"),
//!             SessionEvent::Terminal(status) => println!("finished: {}", status.as_label()),
//!         }
//!     }
//!
//!     service.run_until_signal().await.expect("drained within grace");
//! }
//! ```

mod collab;
mod config;
mod drain;
mod error;
mod events;
mod process;
mod service;
mod session;
mod shutdown;
mod subscribers;

// ---- Public re-exports ----

pub use collab::{
    AuthError, CredentialValidator, MountError, MountGuard, ObjectStore, ResourceMounter,
    StorageError,
};
pub use config::Config;
pub use drain::DrainController;
pub use error::{RuntimeError, SessionError};
pub use events::{Bus, Event, EventKind};
pub use process::{ExitTelemetry, ProcessSupervisor, ResourceUsage};
pub use service::TranscodeService;
pub use session::{CancelCause, CancelState, SessionEvent, TerminalStatus, TranscodeRequest, Transfer};
pub use shutdown::wait_for_shutdown_signal;
pub use subscribers::{ActiveSessions, Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
