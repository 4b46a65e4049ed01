//! # ProcessSupervisor: one external process, one merged line stream.
//!
//! Supervises a single run of the external transcoder:
//! - spawns it with **stdout and stderr merged** into one anonymous pipe, so
//!   lines arrive in true process-output order,
//! - pumps the pipe on the blocking pool and exposes it as an async,
//!   **lazy, finite, non-restartable** line stream,
//! - supports idempotent forced termination,
//! - finalizes [`ExitTelemetry`] with a single reap-and-usage `wait()`.
//!
//! ## Architecture
//! ```text
//!   spawn(program, args)
//!        │  one pipe, writer duplicated into stdout + stderr
//!        ▼
//!   ┌──────────────┐   blocking pump    ┌──────────────┐
//!   │ child process │ ──── lines ─────► │ mpsc channel │ ──► next_line().await
//!   └──────────────┘  (read_until \n)   └──────────────┘
//!        │
//!        └─ terminate(): SIGTERM, idempotent
//!        └─ wait(): consumes the supervisor, wait4(2) reap + rusage
//! ```
//!
//! ## Rules
//! - One suspension point per completed line: `next_line()` parks until the
//!   pump delivers the next line or the output closes. After the stream ends
//!   it returns `None` forever.
//! - `wait()` takes the supervisor **by value**: reaping twice, or signalling
//!   a reaped (possibly recycled) pid, does not compile.
//! - The channel is bounded; a slow consumer parks the pump, never the child
//!   (the child blocks on the pipe, which is the same backpressure).

use std::io::{BufRead, BufReader, PipeReader};
use std::process::{Command, Stdio};
use std::time::Instant;

use tokio::sync::mpsc;

use super::telemetry::ExitTelemetry;
#[cfg(not(unix))]
use super::telemetry::ResourceUsage;

/// Supervises one run of an external program.
///
/// Exclusively owned by the session that spawned it; the handle is never
/// reused after the process is reaped.
#[derive(Debug)]
pub struct ProcessSupervisor {
    pid: u32,
    started: Instant,
    lines: mpsc::Receiver<String>,
    #[cfg(not(unix))]
    child: std::process::Child,
}

impl ProcessSupervisor {
    /// Launches `program` with the given arguments, stdout and stderr merged.
    ///
    /// Fails when the executable is missing or the OS refuses to create the
    /// process. Must be called from within a Tokio runtime (the output pump
    /// runs on the blocking pool).
    pub fn spawn(
        program: &str,
        args: &[String],
        line_buffer: usize,
    ) -> std::io::Result<Self> {
        let (reader, writer) = std::io::pipe()?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);

        let started = Instant::now();
        let child = cmd.spawn()?;
        let pid = child.id();
        // `cmd` still holds the pipe writers; drop it so the parent's copies
        // close and the reader sees EOF when the child exits.
        drop(cmd);

        let (tx, lines) = mpsc::channel(line_buffer.max(1));
        tokio::task::spawn_blocking(move || pump_lines(reader, tx));

        #[cfg(unix)]
        {
            // The pid is enough on Unix: termination goes through kill(2) and
            // the reap through wait4(2). The child stays a zombie (its pid
            // reserved) until `wait()` runs.
            drop(child);
            Ok(Self {
                pid,
                started,
                lines,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {
                pid,
                started,
                lines,
                child,
            })
        }
    }

    /// The OS process id.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns the next line of merged output, or `None` once the output has
    /// closed.
    ///
    /// Lines are delivered in strict process-output order, trailing newline
    /// stripped, invalid UTF-8 replaced lossily. The sequence is finite and
    /// non-restartable: after the first `None`, every later call returns
    /// `None`.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Requests termination of the process (SIGTERM).
    ///
    /// Idempotent: safe to call repeatedly, and safe after the process has
    /// already exited (signalling an unreaped zombie is harmless; errors such
    /// as `ESRCH` are ignored).
    pub fn terminate(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;
            let _ = kill(Pid::from_raw(self.pid as i32), Signal::SIGTERM);
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.kill();
        }
    }

    /// Waits for the process to exit and finalizes its telemetry.
    ///
    /// Consumes the supervisor, which makes the exactly-once contract a
    /// compile-time fact. Call after the line stream has ended, or after
    /// [`terminate`](Self::terminate).
    ///
    /// Resource-usage collection is best-effort: on platforms without
    /// per-child accounting all counters are zero.
    pub async fn wait(self) -> std::io::Result<ExitTelemetry> {
        let started = self.started;

        // Unblock the pump if it is parked on a full channel; it drains the
        // pipe to EOF and exits on its own.
        drop(self.lines);

        #[cfg(unix)]
        let (exit_code, usage) = {
            let pid = self.pid as i32;
            tokio::task::spawn_blocking(move || super::telemetry::reap(pid))
                .await
                .expect("process reap task panicked")?
        };
        #[cfg(not(unix))]
        let (exit_code, usage) = {
            let mut child = self.child;
            let status = tokio::task::spawn_blocking(move || child.wait())
                .await
                .expect("process reap task panicked")?;
            (status.code().unwrap_or_default(), ResourceUsage::default())
        };

        Ok(ExitTelemetry {
            exit_code,
            wall_time: started.elapsed(),
            usage,
        })
    }
}

/// Blocking pump: reads the merged pipe line-by-line into the channel.
///
/// Exits on EOF, on a read error, or when the receiving side is dropped.
fn pump_lines(reader: PipeReader, tx: mpsc::Sender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        }
    }
}
