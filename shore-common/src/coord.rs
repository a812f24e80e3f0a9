//! GPS fix representation and the three selectable coordinate renderings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One hemisphere-tagged `ddmm.mmmm` value, e.g. `4730.1234N` or `12215.5678W`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DdmmCoord {
    /// `degrees * 100 + minutes`, always non-negative; sign comes from the hemisphere.
    value: f64,
    negative: bool,
}

impl DdmmCoord {
    pub fn new(value: f64, negative: bool) -> Self {
        Self { value, negative }
    }

    fn degrees_minutes(&self) -> (f64, f64) {
        let degrees = (self.value / 100.0).trunc();
        let minutes = self.value - degrees * 100.0;
        (degrees, minutes)
    }

    /// Converts to signed decimal degrees (`dd.dddd`).
    pub fn to_decimal_degrees(self) -> f64 {
        let (degrees, minutes) = self.degrees_minutes();
        let dd = degrees + minutes / 60.0;
        if self.negative {
            -dd
        } else {
            dd
        }
    }
}

/// The three textual coordinate encodings a user may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordFormat {
    Ddmm,
    Dddd,
    Ddmmss,
}

impl Default for CoordFormat {
    fn default() -> Self {
        CoordFormat::Ddmm
    }
}

impl fmt::Display for CoordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordFormat::Ddmm => write!(f, "ddmm"),
            CoordFormat::Dddd => write!(f, "dddd"),
            CoordFormat::Ddmmss => write!(f, "ddmmss"),
        }
    }
}

impl std::str::FromStr for CoordFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ddmm" => Ok(CoordFormat::Ddmm),
            "dddd" => Ok(CoordFormat::Dddd),
            "ddmmss" => Ok(CoordFormat::Ddmmss),
            _ => Err(()),
        }
    }
}

/// A complete, valid GPS fix. Per the invariant in the data model, a fix
/// missing any of lat/lon/time is absent, never represented as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub lat: DdmmCoord,
    pub lon: DdmmCoord,
    pub time: DateTime<Utc>,
}

impl GpsFix {
    pub fn format(&self, fmt: CoordFormat) -> (String, String) {
        match fmt {
            CoordFormat::Dddd => (
                format!("{:.4}", self.lat.to_decimal_degrees()),
                format!("{:.4}", self.lon.to_decimal_degrees()),
            ),
            CoordFormat::Ddmm => (format_ddmm(self.lat), format_ddmm(self.lon)),
            CoordFormat::Ddmmss => (format_ddmmss(self.lat), format_ddmmss(self.lon)),
        }
    }
}

fn format_ddmm(c: DdmmCoord) -> String {
    let (degrees, minutes) = c.degrees_minutes();
    let sign = if c.negative { "-" } else { "" };
    format!("{sign}{degrees:02.0}{minutes:07.4}")
}

fn format_ddmmss(c: DdmmCoord) -> String {
    let (degrees, minutes) = c.degrees_minutes();
    let whole_minutes = minutes.trunc();
    let seconds = (minutes - whole_minutes) * 60.0;
    let sign = if c.negative { "-" } else { "" };
    format!("{sign}{degrees:02.0}:{whole_minutes:02.0}:{seconds:05.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_fix() -> GpsFix {
        GpsFix {
            lat: DdmmCoord::new(4730.1234, false),
            lon: DdmmCoord::new(12215.5678, true),
            time: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 10).unwrap(),
        }
    }

    #[test]
    fn dddd_matches_spec_example() {
        let (lat, lon) = sample_fix().format(CoordFormat::Dddd);
        assert_eq!(lat, "47.5021");
        assert_eq!(lon, "-122.2595");
    }

    #[test]
    fn ddmm_round_trips_source_digits() {
        let (lat, lon) = sample_fix().format(CoordFormat::Ddmm);
        assert_eq!(lat, "4730.1234");
        assert_eq!(lon, "-12215.5678");
    }
}
