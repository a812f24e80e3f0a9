//! Singleton enforcement via a lock file in the mission directory (§4.8).
//! "My pid wins, old pid dies": on conflict, read the peer's pid, signal it,
//! wait up to 10 seconds, then take the lock — or abort if it won't die.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::process::ProcessProbe;

const EVICTION_TIMEOUT: Duration = Duration::from_secs(10);
const EVICTION_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum LockError {
    #[error("existing monitor (pid {0}) did not exit after eviction, aborting")]
    PeerDidNotExit(i32),
    #[error("lock file io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    pub fn new(mission_dir: &Path) -> Self {
        Self {
            path: mission_dir.join(".shore-monitor.lock"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquires the lock, evicting a stale peer if one is found and alive.
    pub async fn acquire(&self, probe: &impl ProcessProbe) -> Result<(), LockError> {
        loop {
            match self.try_create() {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    self.evict_peer(probe).await?;
                }
                Err(e) => {
                    return Err(LockError::Io {
                        path: self.path.clone(),
                        source: e,
                    })
                }
            }
        }
    }

    fn try_create(&self) -> std::io::Result<()> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(&self.path)?;
        write!(file, "{}", std::process::id())
    }

    async fn evict_peer(&self, probe: &impl ProcessProbe) -> Result<(), LockError> {
        let peer_pid = self.read_pid().map_err(|e| LockError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        if let Some(pid) = peer_pid {
            if probe.exists(pid) {
                tracing::warn!(peer_pid = pid, "evicting stale monitor holding the lock");
                probe.kill(pid).map_err(|e| LockError::Io {
                    path: self.path.clone(),
                    source: e,
                })?;

                let mut waited = Duration::ZERO;
                while probe.exists(pid) {
                    if waited >= EVICTION_TIMEOUT {
                        return Err(LockError::PeerDidNotExit(pid));
                    }
                    tokio::time::sleep(EVICTION_POLL_INTERVAL).await;
                    waited += EVICTION_POLL_INTERVAL;
                }
            }
        }

        std::fs::remove_file(&self.path).ok();
        Ok(())
    }

    fn read_pid(&self) -> std::io::Result<Option<i32>> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(s.trim().parse().ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn release(&self) {
        std::fs::remove_file(&self.path).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeProcessTable;
    use tempfile::tempdir;

    #[tokio::test]
    async fn acquires_lock_when_none_exists() {
        let dir = tempdir().unwrap();
        let lock = LockFile::new(dir.path());
        let probe = FakeProcessTable::with_alive([]);
        lock.acquire(&probe).await.unwrap();
        assert!(lock.path().exists());
    }

    #[tokio::test]
    async fn evicts_stale_peer_and_acquires() {
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join(".shore-monitor.lock");
        std::fs::write(&lock_path, "4242").unwrap();

        let probe = std::sync::Arc::new(FakeProcessTable::with_alive([4242]));
        let lock = LockFile::new(dir.path());

        // Simulate the peer actually dying shortly after being signaled.
        tokio::spawn({
            let probe = probe.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                probe.kill_now(4242);
            }
        });

        lock.acquire(probe.as_ref()).await.unwrap();
        let contents = std::fs::read_to_string(&lock_path).unwrap();
        assert_eq!(contents, std::process::id().to_string());
    }

    #[tokio::test]
    async fn peer_refusing_to_die_is_an_error() {
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join(".shore-monitor.lock");
        std::fs::write(&lock_path, "4242").unwrap();
        let lock = LockFile::new(dir.path());

        // A probe whose pid never disappears models a peer that ignores
        // SIGKILL (e.g. a zombie or a misbehaving process).
        struct NeverDies;
        impl ProcessProbe for NeverDies {
            fn exists(&self, _pid: i32) -> bool {
                true
            }
            fn kill(&self, _pid: i32) -> std::io::Result<()> {
                Ok(())
            }
        }
        let result = tokio::time::timeout(Duration::from_secs(15), lock.acquire(&NeverDies)).await;
        match result {
            Ok(Err(LockError::PeerDidNotExit(4242))) => {}
            other => panic!("expected PeerDidNotExit within the timeout, got {other:?}"),
        }
    }
}
