//! Parent-shell watchdog (§4.8, S3): when the login shell that launched the
//! monitor disappears, treat it as an abnormal disconnect after a few
//! consecutive misses rather than on the very first one, to ride out a
//! momentary scheduling hiccup in the process table.

use crate::process::ProcessProbe;

const ABSENCE_THRESHOLD: u32 = 4;

pub struct ParentWatchdog<P: ProcessProbe> {
    probe: P,
    parent_pid: i32,
    consecutive_absent: u32,
}

impl<P: ProcessProbe> ParentWatchdog<P> {
    pub fn new(probe: P, parent_pid: i32) -> Self {
        Self {
            probe,
            parent_pid,
            consecutive_absent: 0,
        }
    }

    /// Call once per run-loop iteration. Returns `true` the first time the
    /// parent has been observed absent for `ABSENCE_THRESHOLD` consecutive
    /// ticks; stays `true` on every subsequent tick until reset.
    pub fn tick(&mut self) -> bool {
        if self.probe.exists(self.parent_pid) {
            self.consecutive_absent = 0;
        } else {
            self.consecutive_absent = self.consecutive_absent.saturating_add(1);
        }
        self.consecutive_absent >= ABSENCE_THRESHOLD
    }
}
