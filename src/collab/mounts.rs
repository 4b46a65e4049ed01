//! # Remote filesystem mounting seam.
//!
//! A session may name resources (buckets, shares) that must be mounted before
//! the external program starts and unmounted after it ends, **unconditionally**
//! — success, failure, and cancellation paths all unmount.
//!
//! [`MountGuard`] enforces the pairing: it records every identifier for which
//! a mount was *attempted* and releases all of them. Implementations must make
//! `unmount` idempotent, including after a failed `mount`, so the guard never
//! has to reason about how far a mount got.
//!
//! Mount points must be uniquely namespaced per session by the implementation;
//! sessions run concurrently and never coordinate paths with each other.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// A mount or unmount operation failed.
#[derive(Error, Debug)]
#[error("mount operation on '{resource}' failed: {reason}")]
pub struct MountError {
    /// The resource identifier the operation was for.
    pub resource: String,
    /// Backend-specific failure description.
    pub reason: String,
}

/// Mounts and unmounts named resources for the lifetime of one session.
#[async_trait]
pub trait ResourceMounter: Send + Sync + 'static {
    /// Makes the resource available on the local filesystem.
    async fn mount(&self, resource: &str) -> Result<(), MountError>;

    /// Removes the resource from the local filesystem.
    ///
    /// Must be idempotent: unmounting something that is not mounted (or whose
    /// mount failed halfway) succeeds.
    async fn unmount(&self, resource: &str) -> Result<(), MountError>;
}

/// Tracks attempted mounts and releases them all, exactly once.
///
/// On a mount failure partway through, [`MountGuard::mount_all`] unmounts
/// everything attempted so far (including the failed identifier) before
/// returning the error, so callers on the failure path hold no guard and owe
/// no cleanup.
pub struct MountGuard {
    mounter: Arc<dyn ResourceMounter>,
    mounted: Vec<String>,
}

impl std::fmt::Debug for MountGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountGuard")
            .field("mounted", &self.mounted)
            .finish_non_exhaustive()
    }
}

impl MountGuard {
    /// Mounts every resource in order, returning a guard that owns the
    /// cleanup obligation.
    pub async fn mount_all(
        mounter: Arc<dyn ResourceMounter>,
        resources: &[String],
    ) -> Result<Self, MountError> {
        let mut guard = Self {
            mounter,
            mounted: Vec::with_capacity(resources.len()),
        };
        for resource in resources {
            // Record before the attempt: a half-finished mount still needs the
            // idempotent unmount.
            guard.mounted.push(resource.clone());
            if let Err(e) = guard.mounter.mount(resource).await {
                guard.release().await;
                return Err(e);
            }
        }
        Ok(guard)
    }

    /// Unmounts every attempted resource, in reverse mount order.
    ///
    /// Unmount failures are reported on stderr and do not stop the sweep;
    /// there is no caller left that could act on them.
    pub async fn release(self) {
        for resource in self.mounted.iter().rev() {
            if let Err(e) = self.mounter.unmount(resource).await {
                eprintln!("[transvisor] unmount '{resource}' failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records calls; `fail_on` makes that one mount fail.
    struct RecordingMounter {
        fail_on: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingMounter {
        fn new(fail_on: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                fail_on: fail_on.map(str::to_string),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceMounter for RecordingMounter {
        async fn mount(&self, resource: &str) -> Result<(), MountError> {
            self.calls.lock().unwrap().push(format!("mount:{resource}"));
            if self.fail_on.as_deref() == Some(resource) {
                return Err(MountError {
                    resource: resource.to_string(),
                    reason: "backend refused".to_string(),
                });
            }
            Ok(())
        }

        async fn unmount(&self, resource: &str) -> Result<(), MountError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("unmount:{resource}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn release_unmounts_in_reverse_order() {
        let mounter = RecordingMounter::new(None);
        let guard = MountGuard::mount_all(
            mounter.clone(),
            &["alpha".to_string(), "beta".to_string()],
        )
        .await
        .unwrap();
        guard.release().await;

        assert_eq!(
            mounter.calls(),
            vec!["mount:alpha", "mount:beta", "unmount:beta", "unmount:alpha"]
        );
    }

    #[tokio::test]
    async fn failed_mount_unmounts_everything_attempted() {
        let mounter = RecordingMounter::new(Some("beta"));
        let err = MountGuard::mount_all(
            mounter.clone(),
            &["alpha".to_string(), "beta".to_string(), "gamma".to_string()],
        )
        .await
        .unwrap_err();
        assert_eq!(err.resource, "beta");

        // gamma was never attempted; beta gets the idempotent unmount.
        assert_eq!(
            mounter.calls(),
            vec!["mount:alpha", "mount:beta", "unmount:beta", "unmount:alpha"]
        );
    }

    #[tokio::test]
    async fn empty_resource_list_is_a_no_op() {
        let mounter = RecordingMounter::new(None);
        let guard = MountGuard::mount_all(mounter.clone(), &[]).await.unwrap();
        guard.release().await;
        assert!(mounter.calls().is_empty());
    }
}
