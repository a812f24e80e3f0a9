//! The append-only historical record of sessions for one glider (§3).

use crate::session::Session;
use shore_common::{CoordFormat, GliderId};

/// Completed sessions in connect-instant order, plus the currently-open one.
/// Invariant: `closed` is strictly time-ordered by `connected_at`.
#[derive(Debug, Default)]
pub struct CommLog {
    closed: Vec<Session>,
    open: Option<Session>,
}

impl CommLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) -> Option<&Session> {
        self.open.as_ref()
    }

    pub fn set_open(&mut self, session: Option<Session>) {
        self.open = session;
    }

    /// Appends a just-closed session. Panics in debug builds if it would
    /// violate the time-ordering invariant; callers only ever pass sessions
    /// returned by `SessionReducer::apply`, which closes at most one session
    /// per call in log order.
    pub fn push_closed(&mut self, session: Session) {
        debug_assert!(
            self.closed
                .last()
                .is_none_or(|prev| prev.connected_at <= session.connected_at),
            "sessions must be appended in connect-instant order"
        );
        self.closed.push(session);
    }

    pub fn closed(&self) -> &[Session] {
        &self.closed
    }

    pub fn last_surfacing(&self) -> Option<&Session> {
        self.open.as_ref().or_else(|| self.closed.last())
    }

    /// True if a dive number was seen that is lower than a previously seen
    /// one for an earlier session — a sign the glider's persistent counter
    /// was reset (e.g. after a firmware reflash), rather than merely skipped
    /// (0/unknown dive numbers are not compared, per invariant 6 in §8).
    pub fn has_glider_rebooted(&self) -> bool {
        let mut last_dive = None;
        for session in self.closed.iter().chain(self.open.iter()) {
            if let Some(dive) = session.dive.filter(|d| *d != 0) {
                if let Some(prev) = last_dive {
                    if dive < prev {
                        return true;
                    }
                }
                last_dive = Some(dive);
            }
        }
        false
    }

    /// Formats the most recent GPS fix and recovery state for display, in
    /// the requested coordinate representation.
    pub fn format_last_fix(&self, glider_id: GliderId, fmt: CoordFormat) -> Option<String> {
        let session = self.last_surfacing()?;
        let fix = session.gps_fix?;
        let (lat, lon) = fix.format(fmt);
        let recovery = session
            .recovery_code
            .as_deref()
            .or(session.escape_reason.as_deref())
            .unwrap_or("none");
        Some(format!(
            "SG{glider_id} last fix {lat},{lon} at {} (recovery: {recovery})",
            fix.time.to_rfc3339()
        ))
    }
}
