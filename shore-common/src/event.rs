//! The closed set of notification triggers.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Lategps,
    Gps,
    Recov,
    Critical,
    Drift,
    Divetar,
    Comp,
    Alerts,
    Errors,
    Upload,
    Traceback,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::Lategps,
        EventKind::Gps,
        EventKind::Recov,
        EventKind::Critical,
        EventKind::Drift,
        EventKind::Divetar,
        EventKind::Comp,
        EventKind::Alerts,
        EventKind::Errors,
        EventKind::Upload,
        EventKind::Traceback,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Lategps => "lategps",
            EventKind::Gps => "gps",
            EventKind::Recov => "recov",
            EventKind::Critical => "critical",
            EventKind::Drift => "drift",
            EventKind::Divetar => "divetar",
            EventKind::Comp => "comp",
            EventKind::Alerts => "alerts",
            EventKind::Errors => "errors",
            EventKind::Upload => "upload",
            EventKind::Traceback => "traceback",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or(())
    }
}
