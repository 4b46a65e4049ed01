//! Supervision of one external transcoder process: spawn, merged line
//! stream, termination, and exit telemetry.

mod supervisor;
mod telemetry;

pub use supervisor::ProcessSupervisor;
pub use telemetry::{ExitTelemetry, ResourceUsage};
