//! Folds a stream of [`LogRecord`]s into an evolving [`Session`], invoking a
//! visitor on each state transition (§4.2).

use crate::session::{Session, Transfer, TransferDirection};
use shore_parser::LogRecord;

/// Receives one callback per state transition. Default methods are no-ops so
/// a caller only overrides what it cares about; scan-back mode uses the
/// blanket no-op impl below instead of calling any of these.
pub trait SessionCallbacks {
    fn connected(&mut self, _session: &Session) {}
    fn reconnected(&mut self, _session: &Session) {}
    fn disconnected(&mut self, _session: &Session) {}
    fn transferred(&mut self, _session: &Session, _transfer: &Transfer) {}
    fn received(&mut self, _session: &Session, _transfer: &Transfer) {}
    fn recovery(&mut self, _session: &Session) {}
    fn counter_line(&mut self, _session: &Session) {}
    fn iridium(&mut self, _session: &Session, _lat: f64, _lon: f64, _cep: f64) {}
}

/// The visitor scan-back mode supplies: observes nothing, fires nothing.
pub struct NoopCallbacks;

impl SessionCallbacks for NoopCallbacks {}

/// Owns the currently-open session, if any, and applies records to it.
///
/// Reducer state is exactly `Option<Session>`: replaying any log prefix `L`
/// in one call or split across two calls at the same offset produces the
/// same final value, which is the idempotent-replay invariant (§8, law 1).
#[derive(Debug, Default)]
pub struct SessionReducer {
    current: Option<Session>,
}

impl SessionReducer {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Rehydrates a reducer that already has an open session, e.g. after
    /// scan-back has materialized one without firing callbacks.
    pub fn with_current(current: Option<Session>) -> Self {
        Self { current }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Applies one record. When `first_time` is true (scan-back), callbacks
    /// are suppressed entirely regardless of which visitor is passed in —
    /// this makes the suppression a property of the call, not of the
    /// visitor, so any visitor can be reused for both modes.
    ///
    /// Returns the just-closed session when this record produced a
    /// `Disconnected` transition, so the caller can append it to the
    /// historical comm log.
    pub fn apply(
        &mut self,
        record: LogRecord,
        first_time: bool,
        callbacks: &mut impl SessionCallbacks,
    ) -> Option<Session> {
        match record {
            LogRecord::Connected { ts, glider_id } => {
                let mut session = Session::new(ts);
                session.glider_id = glider_id;
                self.current = Some(session);
                if !first_time {
                    if let Some(session) = &self.current {
                        callbacks.connected(session);
                    }
                }
                None
            }
            LogRecord::Reconnected { .. } => {
                if let Some(session) = &mut self.current {
                    session.reconnect_count += 1;
                }
                if !first_time {
                    if let Some(session) = &self.current {
                        callbacks.reconnected(session);
                    }
                }
                None
            }
            LogRecord::Disconnected {
                ts, logout_seen, ..
            } => {
                if let Some(session) = &mut self.current {
                    session.disconnected_at = Some(ts);
                    session.logout_seen = logout_seen;
                }
                let closed = self.current.take();
                if !first_time {
                    if let Some(session) = &closed {
                        callbacks.disconnected(session);
                    }
                }
                closed
            }
            LogRecord::FileTransferred { name, bytes } => {
                let transfer = Transfer {
                    name,
                    bytes,
                    direction: TransferDirection::Sent,
                };
                if let Some(session) = &mut self.current {
                    session.transfers.push(transfer.clone());
                }
                if !first_time {
                    if let Some(session) = &self.current {
                        callbacks.transferred(session, &transfer);
                    }
                }
                None
            }
            LogRecord::FileReceived { name, bytes } => {
                let transfer = Transfer {
                    name,
                    bytes,
                    direction: TransferDirection::Received,
                };
                if let Some(session) = &mut self.current {
                    session.transfers.push(transfer.clone());
                }
                if !first_time {
                    if let Some(session) = &self.current {
                        callbacks.received(session, &transfer);
                    }
                }
                None
            }
            LogRecord::InRecovery { reason } => {
                if let Some(session) = &mut self.current {
                    // The source log doesn't distinguish a bare recovery code
                    // from an escape reason at this line; that split happens
                    // on the CounterLine fields instead, so here we only
                    // backfill whichever field is still empty.
                    if session.recovery_code.is_none() {
                        session.recovery_code = Some(reason);
                    } else if session.escape_reason.is_none() {
                        session.escape_reason = Some(reason);
                    }
                }
                if !first_time {
                    if let Some(session) = &self.current {
                        callbacks.recovery(session);
                    }
                }
                None
            }
            LogRecord::CounterLine(fields) => {
                if let Some(session) = &mut self.current {
                    if !session.first_counter_seen {
                        session.dive = fields.dive.or(session.dive);
                        session.gps_fix = fields.gps_fix.or(session.gps_fix);
                        session.depth = fields.depth.or(session.depth);
                        session.pitch = fields.pitch.or(session.pitch);
                        session.temperature = fields.temperature.or(session.temperature);
                        if !fields.voltages.is_empty() {
                            session.voltages = fields.voltages.clone();
                        }
                        if let Some(code) = fields.recov_code {
                            session.recovery_code.get_or_insert(code);
                        }
                        if let Some(reason) = fields.escape_reason {
                            session.escape_reason.get_or_insert(reason);
                        }
                        session.first_counter_seen = true;
                    } else {
                        // Second bracketing line: only logout-adjacent state
                        // updates, GPS/dive are intentionally not re-applied
                        // so the callback below does not re-notify (§4.2).
                        session.logout_seen = session.logout_seen || fields.logout_seen;
                    }
                }
                if !first_time {
                    if let Some(session) = &self.current {
                        callbacks.counter_line(session);
                    }
                }
                None
            }
            LogRecord::IridiumGeolocation { lat, lon, cep } => {
                if !first_time {
                    if let Some(session) = &self.current {
                        callbacks.iridium(session, lat, lon, cep);
                    }
                }
                None
            }
            LogRecord::Ver | LogRecord::Ignored => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shore_common::coord::DdmmCoord;
    use shore_parser::CounterFields;

    #[derive(Default)]
    struct Recorder {
        connected: u32,
        disconnected: u32,
        counter_lines: u32,
    }

    impl SessionCallbacks for Recorder {
        fn connected(&mut self, _session: &Session) {
            self.connected += 1;
        }
        fn disconnected(&mut self, _session: &Session) {
            self.disconnected += 1;
        }
        fn counter_line(&mut self, _session: &Session) {
            self.counter_lines += 1;
        }
    }

    fn ts(h: u32, m: u32, s: u32) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2024, 1, 15, h, m, s).unwrap()
    }

    #[test]
    fn scan_back_suppresses_all_callbacks_but_preserves_state() {
        let mut reducer = SessionReducer::new();
        let mut recorder = Recorder::default();
        reducer.apply(
            LogRecord::Connected { ts: ts(0, 0, 0), glider_id: None },
            true,
            &mut recorder,
        );
        reducer.apply(
            LogRecord::CounterLine(CounterFields {
                dive: Some(7),
                ..Default::default()
            }),
            true,
            &mut recorder,
        );
        assert_eq!(recorder.connected, 0);
        assert_eq!(recorder.counter_lines, 0);
        assert_eq!(reducer.current().unwrap().dive, Some(7));
    }

    #[test]
    fn second_counter_line_suppresses_gps_but_not_callback() {
        let mut reducer = SessionReducer::new();
        let mut recorder = Recorder::default();
        reducer.apply(
            LogRecord::Connected { ts: ts(0, 0, 0), glider_id: None },
            false,
            &mut recorder,
        );
        let first_fix = shore_common::GpsFix {
            lat: DdmmCoord::new(4730.0, false),
            lon: DdmmCoord::new(12215.0, true),
            time: ts(0, 0, 10),
        };
        reducer.apply(
            LogRecord::CounterLine(CounterFields {
                dive: Some(1),
                gps_fix: Some(first_fix),
                ..Default::default()
            }),
            false,
            &mut recorder,
        );
        let second_fix = shore_common::GpsFix {
            lat: DdmmCoord::new(9999.0, false),
            lon: DdmmCoord::new(9999.0, true),
            time: ts(0, 4, 0),
        };
        reducer.apply(
            LogRecord::CounterLine(CounterFields {
                dive: Some(2),
                gps_fix: Some(second_fix),
                logout_seen: true,
                ..Default::default()
            }),
            false,
            &mut recorder,
        );
        assert_eq!(recorder.counter_lines, 2);
        let session = reducer.current().unwrap();
        assert_eq!(session.dive, Some(1));
        assert_eq!(session.gps_fix, Some(first_fix));
        assert!(session.logout_seen);
    }

    #[test]
    fn connected_line_glider_id_populates_the_session() {
        let mut reducer = SessionReducer::new();
        let mut recorder = Recorder::default();
        reducer.apply(
            LogRecord::Connected {
                ts: ts(0, 0, 0),
                glider_id: Some(shore_common::GliderId(230)),
            },
            false,
            &mut recorder,
        );
        assert_eq!(reducer.current().unwrap().glider_id, Some(shore_common::GliderId(230)));
    }

    #[test]
    fn disconnected_closes_and_returns_session() {
        let mut reducer = SessionReducer::new();
        let mut recorder = Recorder::default();
        reducer.apply(
            LogRecord::Connected { ts: ts(0, 0, 0), glider_id: None },
            false,
            &mut recorder,
        );
        let closed = reducer.apply(
            LogRecord::Disconnected {
                ts: ts(0, 5, 0),
                reason: None,
                logout_seen: true,
            },
            false,
            &mut recorder,
        );
        assert!(closed.is_some());
        assert!(reducer.current().is_none());
        assert_eq!(recorder.disconnected, 1);
    }

    #[test]
    fn idempotent_replay_matches_split_replay() {
        let records = vec![
            LogRecord::Connected { ts: ts(0, 0, 0), glider_id: None },
            LogRecord::CounterLine(CounterFields {
                dive: Some(3),
                ..Default::default()
            }),
            LogRecord::Disconnected {
                ts: ts(0, 5, 0),
                reason: None,
                logout_seen: true,
            },
        ];

        let mut whole = SessionReducer::new();
        let mut cb1 = Recorder::default();
        let mut closed_whole = None;
        for r in records.clone() {
            if let Some(s) = whole.apply(r, false, &mut cb1) {
                closed_whole = Some(s);
            }
        }

        let mut split = SessionReducer::new();
        let mut cb2 = Recorder::default();
        let mut closed_split = None;
        for r in records[..2].iter().cloned() {
            if let Some(s) = split.apply(r, false, &mut cb2) {
                closed_split = Some(s);
            }
        }
        for r in records[2..].iter().cloned() {
            if let Some(s) = split.apply(r, false, &mut cb2) {
                closed_split = Some(s);
            }
        }

        assert_eq!(closed_whole, closed_split);
    }
}
