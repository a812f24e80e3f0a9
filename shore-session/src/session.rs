//! The `Session` value: one radio contact between a glider and the shore.

use chrono::{DateTime, Utc};
use shore_common::{GliderId, GpsFix};

/// Direction of one logged file movement, recorded for the comp/divetar/errors
/// notification kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferDirection {
    Sent,
    Received,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub name: String,
    pub bytes: u64,
    pub direction: TransferDirection,
}

/// One glider connection, from `Connected` to `Disconnected`. Created on
/// `Connected`, mutated only by the reducer, closed on `Disconnected` or a
/// synthetic watchdog disconnect. Never revived once closed (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub glider_id: Option<GliderId>,
    pub dive: Option<u32>,
    pub connected_at: DateTime<Utc>,
    pub reconnect_count: u32,
    pub disconnected_at: Option<DateTime<Utc>>,
    pub logout_seen: bool,
    pub gps_fix: Option<GpsFix>,
    pub recovery_code: Option<String>,
    pub escape_reason: Option<String>,
    pub depth: Option<f64>,
    pub pitch: Option<f64>,
    pub temperature: Option<f64>,
    pub voltages: Vec<f64>,
    pub transfers: Vec<Transfer>,

    /// Set once the first `CounterLine` of the pair has populated dive/gps.
    /// The second bracketing CounterLine observes logout-adjacent flags only;
    /// its GPS/dive are suppressed from callbacks per §4.2.
    pub(crate) first_counter_seen: bool,
}

impl Session {
    pub fn new(connected_at: DateTime<Utc>) -> Self {
        Self {
            glider_id: None,
            dive: None,
            connected_at,
            reconnect_count: 0,
            disconnected_at: None,
            logout_seen: false,
            gps_fix: None,
            recovery_code: None,
            escape_reason: None,
            depth: None,
            pitch: None,
            temperature: None,
            voltages: Vec::new(),
            transfers: Vec::new(),
            first_counter_seen: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.disconnected_at.is_some()
    }

    /// True once a `recov_code` or `escape_reason` has been observed and the
    /// glider reconnected at least once since — the dispatcher's "rebooted"
    /// condition (§4.7).
    pub fn rebooted(&self) -> bool {
        self.reconnect_count > 0 && (self.recovery_code.is_some() || self.escape_reason.is_some())
    }
}
