//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [starting] session=session-0
//! [spawned] session=session-0 pid=4242
//! [completed] session=session-0 exit_code=0
//! [aborted] session=session-1 reason=shutdown
//! [failed] session=session-2 reason="failed to spawn transcoder: ..."
//! [shutdown-requested]
//! [all-drained-within-grace]
//! [grace-exceeded]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions for debugging and demonstration purposes.
///
/// Not intended for production use — implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::SessionStarting => {
                if let Some(session) = &e.session {
                    println!("[starting] session={session}");
                }
            }
            EventKind::SessionSpawned => {
                println!("[spawned] session={:?} pid={:?}", e.session, e.pid);
            }
            EventKind::SessionCompleted => {
                println!(
                    "[completed] session={:?} exit_code={:?}",
                    e.session, e.exit_code
                );
            }
            EventKind::SessionAborted => {
                println!("[aborted] session={:?} reason={:?}", e.session, e.reason);
            }
            EventKind::SessionFailed => {
                println!("[failed] session={:?} reason={:?}", e.session, e.reason);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllDrainedWithin => {
                println!("[all-drained-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
