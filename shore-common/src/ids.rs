//! Small identifier newtypes shared across the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A glider's numeric identifier, e.g. `230` for mission directory `sg230`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GliderId(pub u32);

impl fmt::Display for GliderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl GliderId {
    /// Parses a mission directory name of the conventional form `sgNNN`.
    pub fn from_mission_dir_name(name: &str) -> Option<Self> {
        let digits = name.strip_prefix("sg")?;
        digits.parse().ok().map(GliderId)
    }
}
