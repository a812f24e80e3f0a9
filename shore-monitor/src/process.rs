//! Process-liveness capability, hidden behind a trait so the lock-eviction
//! protocol and the parent-shell watchdog can be tested with a fake process
//! table instead of real PIDs (§9 design notes).

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

pub trait ProcessProbe: Send + Sync {
    fn exists(&self, pid: i32) -> bool;
    fn kill(&self, pid: i32) -> std::io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessProbe;

impl<T: ProcessProbe + ?Sized> ProcessProbe for std::sync::Arc<T> {
    fn exists(&self, pid: i32) -> bool {
        (**self).exists(pid)
    }

    fn kill(&self, pid: i32) -> std::io::Result<()> {
        (**self).kill(pid)
    }
}

impl ProcessProbe for SystemProcessProbe {
    fn exists(&self, pid: i32) -> bool {
        // Sending signal 0 performs no action but still validates that the
        // process exists and is signalable.
        signal::kill(Pid::from_raw(pid), None).is_ok()
    }

    fn kill(&self, pid: i32) -> std::io::Result<()> {
        signal::kill(Pid::from_raw(pid), Signal::SIGKILL).map_err(|errno| std::io::Error::from_raw_os_error(errno as i32))
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod fake {
    use super::ProcessProbe;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// A fake process table for tests: `alive` starts populated, and `kill`
    /// removes the pid instead of sending a real signal.
    #[derive(Debug, Default)]
    pub struct FakeProcessTable {
        alive: Mutex<HashSet<i32>>,
    }

    impl FakeProcessTable {
        pub fn with_alive(pids: impl IntoIterator<Item = i32>) -> Self {
            Self {
                alive: Mutex::new(pids.into_iter().collect()),
            }
        }

        pub fn kill_now(&self, pid: i32) {
            self.alive.lock().unwrap().remove(&pid);
        }

        pub fn revive(&self, pid: i32) {
            self.alive.lock().unwrap().insert(pid);
        }
    }

    impl ProcessProbe for FakeProcessTable {
        fn exists(&self, pid: i32) -> bool {
            self.alive.lock().unwrap().contains(&pid)
        }

        fn kill(&self, pid: i32) -> std::io::Result<()> {
            self.alive.lock().unwrap().remove(&pid);
            Ok(())
        }
    }
}
