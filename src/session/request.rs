//! # The per-call request.
//!
//! [`TranscodeRequest`] is immutable once received: the session reads it, the
//! caller never mutates it mid-flight.

use std::path::PathBuf;

/// One remote↔local staging pair.
#[derive(Clone, Debug)]
pub struct Transfer {
    /// Opaque remote path (`bucket/key` style in the reference deployment).
    pub remote: String,
    /// Local path the object is staged at for the process.
    pub local: PathBuf,
}

impl Transfer {
    /// Creates a staging pair.
    pub fn new(remote: impl Into<String>, local: impl Into<PathBuf>) -> Self {
        Self {
            remote: remote.into(),
            local: local.into(),
        }
    }
}

/// Everything one call asks for: the argument vector for the external
/// program, plus the resources and object transfers it needs around the run.
#[derive(Clone, Debug, Default)]
pub struct TranscodeRequest {
    /// Ordered arguments passed to the external program.
    pub args: Vec<String>,
    /// Resource identifiers mounted before and unmounted after execution,
    /// unconditionally.
    pub resources: Vec<String>,
    /// Objects staged from remote storage to local paths before spawning.
    pub fetches: Vec<Transfer>,
    /// Local files staged back to remote storage after the process exits.
    pub stores: Vec<Transfer>,
}

impl TranscodeRequest {
    /// Creates a request with the given program arguments.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Adds resource identifiers to mount around the run.
    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    /// Adds an object to stage in before spawning.
    pub fn with_fetch(mut self, transfer: Transfer) -> Self {
        self.fetches.push(transfer);
        self
    }

    /// Adds a file to stage out after the process exits.
    pub fn with_store(mut self, transfer: Transfer) -> Self {
        self.stores.push(transfer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_everything() {
        let req = TranscodeRequest::new(["-i", "in.mp4", "out.avi"])
            .with_resources(["bucket-a"])
            .with_fetch(Transfer::new("bucket-a/in.mp4", "/tmp/in.mp4"))
            .with_store(Transfer::new("bucket-a/out.avi", "/tmp/out.avi"));

        assert_eq!(req.args, vec!["-i", "in.mp4", "out.avi"]);
        assert_eq!(req.resources, vec!["bucket-a"]);
        assert_eq!(req.fetches.len(), 1);
        assert_eq!(req.stores.len(), 1);
    }
}
