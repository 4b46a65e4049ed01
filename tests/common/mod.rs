//! Shared fixtures: in-memory collaborators and a service builder.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use transvisor::{
    AuthError, Config, CredentialValidator, Event, EventKind, MountError, ObjectStore,
    ResourceMounter, SessionEvent, StorageError, TerminalStatus, TranscodeRequest,
    TranscodeService,
};

pub const API_KEY: &str = "test-api-key";

/// Records mount/unmount calls; optionally fails one mount.
pub struct FakeMounter {
    fail_on: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeMounter {
    pub fn new(fail_on: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            fail_on: fail_on.map(str::to_string),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Every attempted mount has a matching unmount.
    pub fn balanced(&self) -> bool {
        let calls = self.calls();
        let mounted: Vec<_> = calls
            .iter()
            .filter_map(|c| c.strip_prefix("mount:"))
            .collect();
        mounted.iter().all(|resource| {
            calls
                .iter()
                .any(|c| c.strip_prefix("unmount:") == Some(resource))
        })
    }
}

#[async_trait]
impl ResourceMounter for FakeMounter {
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

/// In-memory object store: a set of existing remote paths plus an upload log.
pub struct FakeStore {
    objects: Mutex<HashSet<String>>,
    puts: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn new(objects: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            objects: Mutex::new(objects.iter().map(|s| s.to_string()).collect()),
            puts: Mutex::new(Vec::new()),
        })
    }

    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn get(&self, remote: &str, _local: &Path) -> Result<(), StorageError> {
        if self.objects.lock().unwrap().contains(remote) {
            Ok(())
        } else {
            Err(StorageError::NotFound {
                remote: remote.to_string(),
            })
        }
    }

    async fn put(&self, _local: &Path, remote: &str) -> Result<(), StorageError> {
        self.puts.lock().unwrap().push(remote.to_string());
        Ok(())
    }
}

/// Accepts only [`API_KEY`].
pub struct FakeAuth;

#[async_trait]
impl CredentialValidator for FakeAuth {
    async fn validate(&self, credential: &str) -> Result<(), AuthError> {
        if credential == API_KEY {
            Ok(())
        } else {
            Err(AuthError::Rejected)
        }
    }
}

/// A service plus handles on its fakes.
pub struct TestWorld {
    pub service: TranscodeService,
    pub mounter: Arc<FakeMounter>,
    pub store: Arc<FakeStore>,
}

impl TestWorld {
    pub fn new(cfg: Config) -> Self {
        Self::with_fakes(cfg, FakeMounter::new(None), FakeStore::new(&[]))
    }

    pub fn with_fakes(cfg: Config, mounter: Arc<FakeMounter>, store: Arc<FakeStore>) -> Self {
        let service = TranscodeService::new(
            cfg,
            mounter.clone(),
            store.clone(),
            Arc::new(FakeAuth),
            Vec::new(),
        );
        Self {
            service,
            mounter,
            store,
        }
    }
}

/// Configuration that supervises `/bin/sh` instead of a real transcoder.
pub fn sh_config() -> Config {
    Config {
        program: "/bin/sh".to_string(),
        grace: Duration::from_secs(5),
        ..Config::default()
    }
}

/// A request running the given shell script.
pub fn sh_request(script: &str) -> TranscodeRequest {
    TranscodeRequest::new(["-c", script])
}

/// Drains the stream to the end and returns everything it carried.
pub async fn collect(rx: &mut mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Some(ev) = timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("stream stalled")
    {
        events.push(ev);
    }
    events
}

/// The text of every line event, in order.
pub fn lines(events: &[SessionEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|ev| match ev {
            SessionEvent::Line(text) => Some(text.as_str()),
            SessionEvent::Terminal(_) => None,
        })
        .collect()
}

/// The terminal status, asserting it is the final element and unique.
pub fn terminal(events: &[SessionEvent]) -> &TerminalStatus {
    let terminals: Vec<_> = events
        .iter()
        .enumerate()
        .filter_map(|(i, ev)| match ev {
            SessionEvent::Terminal(status) => Some((i, status)),
            SessionEvent::Line(_) => None,
        })
        .collect();
    assert_eq!(terminals.len(), 1, "expected exactly one terminal event");
    let (index, status) = terminals[0];
    assert_eq!(index, events.len() - 1, "terminal event must come last");
    status
}

/// Waits for the `SessionSpawned` event and returns the child pid.
pub async fn spawned_pid(events: &mut broadcast::Receiver<Event>) -> u32 {
    loop {
        let ev = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no SessionSpawned event")
            .expect("bus closed");
        if ev.kind == EventKind::SessionSpawned {
            return ev.pid.expect("SessionSpawned carries a pid");
        }
    }
}

/// True while the pid names a live (or zombie) process.
pub fn pid_alive(pid: u32) -> bool {
    std::process::Command::new("/bin/sh")
        .args(["-c", &format!("kill -0 {pid} 2>/dev/null")])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
