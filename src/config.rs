//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the transcode service runtime.
//!
//! Config is consumed in two places:
//! 1. **Service creation**: `TranscodeService::new(config, ...)`
//! 2. **Session construction**: each streaming session copies the fields it needs
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no global semaphore created)
//! - channel capacities are clamped to a minimum of 1

use std::time::Duration;

/// Global configuration for the transcode service runtime.
///
/// ## Field semantics
/// - `program`: the external transcoder binary to supervise
/// - `grace`: maximum wait for in-flight sessions to drain on shutdown
/// - `max_concurrent`: session concurrency limit (`0` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1, clamped)
/// - `line_buffer`: capacity of the pump → session line channel (backpressure
///   on the reading thread when the session falls behind)
/// - `stream_buffer`: capacity of the session → caller event channel
///   (backpressure on the session when the caller falls behind)
#[derive(Clone, Debug)]
pub struct Config {
    /// External program launched for every session.
    ///
    /// The request supplies only the argument vector; the binary itself is a
    /// deployment decision, not a caller decision.
    pub program: String,

    /// Maximum time to wait for in-flight sessions during shutdown.
    ///
    /// When shutdown is requested:
    /// - the shutdown token is cancelled (visible to every session)
    /// - the drain controller waits up to `grace` for sessions to finish
    /// - on overrun it returns `RuntimeError::GraceExceeded` naming the
    ///   sessions that were abandoned
    pub grace: Duration,

    /// Maximum number of sessions running simultaneously.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` supervised processes at once
    pub max_concurrent: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events
    /// observe `Lagged` and skip older items. Minimum value is 1.
    pub bus_capacity: usize,

    /// Capacity of the per-process line channel.
    ///
    /// Bounds how far the blocking output pump can run ahead of the session
    /// loop before it is parked.
    pub line_buffer: usize,

    /// Capacity of the per-call response stream.
    pub stream_buffer: usize,
}

impl Config {
    /// Returns the global session concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent sessions
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the line channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn line_buffer_clamped(&self) -> usize {
        self.line_buffer.max(1)
    }

    /// Returns the response stream capacity clamped to a minimum of 1.
    #[inline]
    pub fn stream_buffer_clamped(&self) -> usize {
        self.stream_buffer.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `program = "ffmpeg"`
    /// - `grace = 30s` (shutdown drain window)
    /// - `max_concurrent = 0` (unlimited)
    /// - `bus_capacity = 1024`
    /// - `line_buffer = 256`
    /// - `stream_buffer = 64`
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            grace: Duration::from_secs(30),
            max_concurrent: 0,
            bus_capacity: 1024,
            line_buffer: 256,
            stream_buffer: 64,
        }
    }
}
