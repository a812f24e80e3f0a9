//! Classifies one communications-log line into a tagged record.
//!
//! Parsing is purely syntactic and does no I/O: the tailer (`shore-session`)
//! owns reading the file, this crate only turns a `&str` into a [`LogRecord`].

use chrono::{DateTime, Utc};
use shore_common::coord::DdmmCoord;
use shore_common::{parse_timestamp, GliderId, GpsFix};

/// Fields carried by the two `Counter:` lines that bracket a data exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterFields {
    pub dive: Option<u32>,
    pub gps_fix: Option<GpsFix>,
    pub recov_code: Option<String>,
    pub escape_reason: Option<String>,
    pub logout_seen: bool,
    pub depth: Option<f64>,
    pub pitch: Option<f64>,
    pub temperature: Option<f64>,
    pub voltages: Vec<f64>,
}

/// One classified line. Unrecognized or malformed lines become `Ignored`
/// rather than aborting the stream (§4.1).
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    Connected {
        ts: DateTime<Utc>,
        /// Present when the line carries a trailing `id=<NNN>` field; most
        /// comm logs don't, in which case the glider id is resolved later
        /// from the mission directory name instead (§4.2).
        glider_id: Option<GliderId>,
    },
    Reconnected {
        ts: DateTime<Utc>,
    },
    Disconnected {
        ts: DateTime<Utc>,
        reason: Option<String>,
        logout_seen: bool,
    },
    FileTransferred {
        name: String,
        bytes: u64,
    },
    FileReceived {
        name: String,
        bytes: u64,
    },
    InRecovery {
        reason: String,
    },
    CounterLine(CounterFields),
    IridiumGeolocation {
        lat: f64,
        lon: f64,
        cep: f64,
    },
    Ver,
    Ignored,
}

/// Parses one log line (trailing newline already stripped by the caller).
///
/// Malformed-but-recognized lines (e.g. an unparsable timestamp on a
/// `Connected at ...` line) are reported via `tracing` and returned as
/// `Ignored`, matching the "never abort the stream" contract in §4.1.
pub fn parse_line(line: &str) -> LogRecord {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(rest) = line.strip_prefix("Connected at ") {
        let (ts_part, glider_id) = match rest.split_once(" id=") {
            Some((ts_part, id)) => (ts_part, id.trim().parse().ok().map(GliderId)),
            None => (rest, None),
        };
        return match parse_timestamp(ts_part) {
            Ok(ts) => LogRecord::Connected { ts, glider_id },
            Err(e) => {
                tracing::warn!(line, error = %e, "unparsable Connected timestamp");
                LogRecord::Ignored
            }
        };
    }

    if let Some(rest) = line.strip_prefix("Reconnected at ") {
        return match parse_timestamp(rest) {
            Ok(ts) => LogRecord::Reconnected { ts },
            Err(e) => {
                tracing::warn!(line, error = %e, "unparsable Reconnected timestamp");
                LogRecord::Ignored
            }
        };
    }

    if let Some(rest) = line.strip_prefix("Disconnected at ") {
        return parse_disconnected(rest, line);
    }

    if let Some(rest) = line.strip_prefix("Received file ") {
        return parse_received(rest, line);
    }

    if let Some(rest) = line.strip_prefix("Transferred ") {
        return parse_transferred(rest, line);
    }

    if let Some(rest) = line.strip_prefix("Counter:") {
        return LogRecord::CounterLine(parse_counter(rest.trim()));
    }

    if let Some(rest) = line.strip_prefix("Iridium geolocation: ") {
        return parse_iridium(rest, line);
    }

    if let Some(rest) = line.strip_prefix("In Recovery: ") {
        return LogRecord::InRecovery {
            reason: rest.trim().to_string(),
        };
    }

    if line.starts_with("Ver") {
        return LogRecord::Ver;
    }

    LogRecord::Ignored
}

fn parse_disconnected(rest: &str, full_line: &str) -> LogRecord {
    let (ts_part, reason) = match rest.split_once(" (") {
        Some((ts, tail)) => (ts, tail.strip_suffix(')').map(str::to_string)),
        None => (rest, None),
    };
    match parse_timestamp(ts_part.trim()) {
        Ok(ts) => {
            let logout_seen = matches!(reason.as_deref(), None | Some("logout"));
            LogRecord::Disconnected {
                ts,
                reason,
                logout_seen,
            }
        }
        Err(e) => {
            tracing::warn!(line = full_line, error = %e, "unparsable Disconnected timestamp");
            LogRecord::Ignored
        }
    }
}

fn parse_received(rest: &str, full_line: &str) -> LogRecord {
    match rest.split_once(" (") {
        Some((name, tail)) => match tail.strip_suffix(" bytes)").and_then(|n| n.parse().ok()) {
            Some(bytes) => LogRecord::FileReceived {
                name: name.to_string(),
                bytes,
            },
            None => {
                tracing::warn!(line = full_line, "unparsable Received file byte count");
                LogRecord::Ignored
            }
        },
        None => LogRecord::Ignored,
    }
}

fn parse_transferred(rest: &str, full_line: &str) -> LogRecord {
    match rest.split_once(" bytes of ") {
        Some((n, name)) => match n.parse() {
            Ok(bytes) => LogRecord::FileTransferred {
                name: name.to_string(),
                bytes,
            },
            Err(_) => {
                tracing::warn!(line = full_line, "unparsable Transferred byte count");
                LogRecord::Ignored
            }
        },
        None => LogRecord::Ignored,
    }
}

fn parse_iridium(rest: &str, full_line: &str) -> LogRecord {
    let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
    let [lat, lon, cep] = parts.as_slice() else {
        tracing::warn!(line = full_line, "malformed Iridium geolocation line");
        return LogRecord::Ignored;
    };
    match (lat.parse(), lon.parse(), cep.parse()) {
        (Ok(lat), Ok(lon), Ok(cep)) => LogRecord::IridiumGeolocation { lat, lon, cep },
        _ => {
            tracing::warn!(line = full_line, "unparsable Iridium geolocation values");
            LogRecord::Ignored
        }
    }
}

/// Parses `key=value` pairs separated by `", "`. A `gps=` value itself
/// contains an internal comma (`lat,lon`) with no following space, so the
/// `", "` delimiter keeps it intact as a single field.
///
/// `ts=` is read in its own pass first since a `gps=` fix needs it to build
/// its timestamp and the two fields are not guaranteed to appear in any
/// particular order on the line.
fn parse_counter(fields: &str) -> CounterFields {
    let ts = fields
        .split(", ")
        .filter_map(|field| field.split_once('='))
        .find(|(key, _)| key.trim() == "ts")
        .and_then(|(_, value)| parse_timestamp(value.trim()).ok());

    let mut out = CounterFields::default();
    for field in fields.split(", ") {
        let Some((key, value)) = field.split_once('=') else {
            continue;
        };
        match key.trim() {
            "dive" => out.dive = value.trim().parse().ok(),
            // Absent without a valid `ts=` on the same line: a fix with no
            // time is treated as no fix at all (§3), never a zero time.
            "gps" => out.gps_fix = ts.and_then(|ts| parse_gps_value(value.trim(), ts)),
            "recov_code" => out.recov_code = Some(value.trim().to_string()),
            "escape_reason" => out.escape_reason = Some(value.trim().to_string()),
            "logout" => out.logout_seen = value.trim().eq_ignore_ascii_case("true"),
            "depth" => out.depth = value.trim().parse().ok(),
            "pitch" => out.pitch = value.trim().parse().ok(),
            "temp" => out.temperature = value.trim().parse().ok(),
            "ts" => {}
            key if key.starts_with("volt") => {
                if let Ok(v) = value.trim().parse() {
                    out.voltages.push(v);
                }
            }
            _ => {}
        }
    }
    out
}

/// Parses a `gps=<ddmm.mmmm><N|S>,<ddmm.mmmm><E|W>` value, using `time` (the
/// same counter line's `ts=` field) as the fix's instant.
fn parse_gps_value(value: &str, time: DateTime<Utc>) -> Option<GpsFix> {
    let (lat_str, lon_str) = value.split_once(',')?;
    let lat = parse_hemisphere_coord(lat_str, 'N', 'S')?;
    let lon = parse_hemisphere_coord(lon_str, 'E', 'W')?;
    Some(GpsFix { lat, lon, time })
}

fn parse_hemisphere_coord(raw: &str, positive: char, negative: char) -> Option<DdmmCoord> {
    let raw = raw.trim();
    let last = raw.chars().last()?;
    let digits = &raw[..raw.len() - last.len_utf8()];
    let value: f64 = digits.parse().ok()?;
    if last == positive {
        Some(DdmmCoord::new(value, false))
    } else if last == negative {
        Some(DdmmCoord::new(value, true))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connected() {
        let rec = parse_line("Connected at 2024-01-15T00:00:00Z");
        match rec {
            LogRecord::Connected { glider_id, .. } => assert_eq!(glider_id, None),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_connected_with_glider_id() {
        let rec = parse_line("Connected at 2024-01-15T00:00:00Z id=230");
        match rec {
            LogRecord::Connected { glider_id, .. } => {
                assert_eq!(glider_id, Some(shore_common::GliderId(230)))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_disconnected_with_reason() {
        let rec = parse_line("Disconnected at 2024-01-15T00:05:00Z (shell_disappeared)");
        match rec {
            LogRecord::Disconnected {
                reason,
                logout_seen,
                ..
            } => {
                assert_eq!(reason.as_deref(), Some("shell_disappeared"));
                assert!(!logout_seen);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_disconnected_without_reason_as_logout() {
        let rec = parse_line("Disconnected at 2024-01-15T00:05:00Z");
        match rec {
            LogRecord::Disconnected { logout_seen, .. } => assert!(logout_seen),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_counter_line_with_gps() {
        let rec = parse_line("Counter: dive=42, gps=4730.1234N,12215.5678W, ts=2024-01-15T00:00:10Z");
        match rec {
            LogRecord::CounterLine(fields) => {
                assert_eq!(fields.dive, Some(42));
                let fix = fields.gps_fix.expect("gps fix");
                let (lat, lon) = fix.format(shore_common::CoordFormat::Dddd);
                assert_eq!(lat, "47.5021");
                assert_eq!(lon, "-122.2595");
                assert_eq!(fix.time, "2024-01-15T00:00:10Z".parse::<DateTime<Utc>>().unwrap());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn gps_fix_time_comes_from_ts_regardless_of_field_order() {
        let rec = parse_line("Counter: ts=2024-01-15T00:00:10Z, dive=42, gps=4730.1234N,12215.5678W");
        match rec {
            LogRecord::CounterLine(fields) => {
                let fix = fields.gps_fix.expect("gps fix");
                assert_eq!(fix.time, "2024-01-15T00:00:10Z".parse::<DateTime<Utc>>().unwrap());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn gps_without_a_ts_field_is_absent_not_zero_time() {
        let rec = parse_line("Counter: dive=42, gps=4730.1234N,12215.5678W");
        match rec {
            LogRecord::CounterLine(fields) => assert!(fields.gps_fix.is_none()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_received_file() {
        let rec = parse_line("Received file foo.dat (1024 bytes)");
        assert_eq!(
            rec,
            LogRecord::FileReceived {
                name: "foo.dat".to_string(),
                bytes: 1024,
            }
        );
    }

    #[test]
    fn parses_transferred_file() {
        let rec = parse_line("Transferred 2048 bytes of bar.dat");
        assert_eq!(
            rec,
            LogRecord::FileTransferred {
                name: "bar.dat".to_string(),
                bytes: 2048,
            }
        );
    }

    #[test]
    fn parses_in_recovery() {
        let rec = parse_line("In Recovery: DEEP_PRESSURE");
        assert_eq!(
            rec,
            LogRecord::InRecovery {
                reason: "DEEP_PRESSURE".to_string()
            }
        );
    }

    #[test]
    fn unrecognized_line_is_ignored() {
        assert_eq!(parse_line("some gibberish"), LogRecord::Ignored);
    }

    #[test]
    fn malformed_timestamp_is_ignored_not_fatal() {
        assert_eq!(parse_line("Connected at not-a-timestamp"), LogRecord::Ignored);
    }
}
