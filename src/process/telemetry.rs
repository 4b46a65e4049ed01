//! # Exit telemetry: how a process finished.
//!
//! [`ExitTelemetry`] is produced exactly once per supervised process, by
//! [`ProcessSupervisor::wait`](super::ProcessSupervisor::wait). It combines
//! the decoded exit code, the wall-clock duration, and a best-effort
//! [`ResourceUsage`] snapshot from the OS.
//!
//! ## Exit-code encoding
//! - `0..=255` — the process exited normally with that status
//! - negative — the process was killed by a signal; the magnitude is the
//!   signal number (`-15` = SIGTERM)
//!
//! A single sign check distinguishes the two causes.
//!
//! ## Resource usage
//! On Unix the reap goes through `wait4(2)`, which reports the child's
//! `rusage` in the same call. Platforms or kernels without rich process
//! accounting simply leave fields at zero; consumers must tolerate absent
//! counters.

use std::time::Duration;

/// Best-effort OS resource counters for a finished process.
///
/// All fields default to zero when the platform does not report them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    /// CPU time spent in user mode.
    pub user_time: Duration,
    /// CPU time spent in kernel mode.
    pub system_time: Duration,
    /// Peak resident set size, in the platform's native unit (KiB on Linux).
    pub max_rss: u64,
    /// Block input operations.
    pub block_reads: u64,
    /// Block output operations.
    pub block_writes: u64,
    /// Voluntary context switches.
    pub voluntary_switches: u64,
    /// Involuntary context switches.
    pub involuntary_switches: u64,
}

/// Structured record of how a supervised process finished.
#[derive(Clone, Debug)]
pub struct ExitTelemetry {
    /// Decoded exit code: `0..=255` normal, negative = killed by signal
    /// (magnitude = signal number).
    pub exit_code: i32,
    /// Wall-clock time from spawn to reap.
    pub wall_time: Duration,
    /// OS resource counters (zeroed when unavailable).
    pub usage: ResourceUsage,
}

impl ExitTelemetry {
    /// True when the process was killed by a signal rather than exiting.
    #[inline]
    pub fn signalled(&self) -> bool {
        self.exit_code < 0
    }

    /// The signal number that killed the process, if any.
    #[inline]
    pub fn signal(&self) -> Option<i32> {
        self.signalled().then(|| -self.exit_code)
    }
}

/// Reaps the child and collects its resource usage in one `wait4(2)` call.
///
/// Returns the decoded exit code and the usage snapshot. Retries on `EINTR`.
#[cfg(unix)]
pub(crate) fn reap(pid: i32) -> std::io::Result<(i32, ResourceUsage)> {
    let mut status: libc::c_int = 0;
    // SAFETY: zero is a valid bit pattern for `rusage` (plain counters).
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    loop {
        // SAFETY: `status` and `usage` are valid for writes for the duration
        // of the call; `pid` names a child this process has not reaped yet.
        let rc = unsafe { libc::wait4(pid, &mut status, 0, &mut usage) };
        if rc == -1 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(err);
        }
        return Ok((decode_status(status), ResourceUsage::from_rusage(&usage)));
    }
}

/// Decodes a raw wait status into the signed exit-code encoding.
#[cfg(unix)]
fn decode_status(status: libc::c_int) -> i32 {
    if libc::WIFEXITED(status) {
        libc::WEXITSTATUS(status)
    } else if libc::WIFSIGNALED(status) {
        -libc::WTERMSIG(status)
    } else {
        // Stopped/continued states are impossible without WUNTRACED.
        status
    }
}

#[cfg(unix)]
impl ResourceUsage {
    fn from_rusage(ru: &libc::rusage) -> Self {
        fn tv(tv: &libc::timeval) -> Duration {
            let secs = tv.tv_sec.max(0) as u64;
            let micros = tv.tv_usec.clamp(0, 999_999) as u32;
            Duration::new(secs, micros * 1_000)
        }
        fn count(n: libc::c_long) -> u64 {
            n.max(0) as u64
        }

        Self {
            user_time: tv(&ru.ru_utime),
            system_time: tv(&ru.ru_stime),
            max_rss: count(ru.ru_maxrss),
            block_reads: count(ru.ru_inblock),
            block_writes: count(ru.ru_oublock),
            voluntary_switches: count(ru.ru_nvcsw),
            involuntary_switches: count(ru.ru_nivcsw),
        }
    }
}
