//! Builds the subject/body for an event kind from the current session
//! snapshot, resolves subscribers, and invokes each sink with per-sink fault
//! isolation (§4.7).

use shore_common::{EventKind, GliderId, GpsFix};
use shore_session::{CommLog, Session};
use shore_subscriptions::{resolve, SubscriptionTable};

use crate::context::{DispatchContext, NotifyConfig};
use crate::registry::SinkRegistry;

/// Auxiliary bodies produced by the out-of-scope collaborators this monitor
/// narrowly interfaces with (file conversion, uploads) — see §1 and §6.
#[derive(Debug, Clone, Default)]
pub struct AuxInputs {
    pub processed_files_body: Option<String>,
    pub upload_body: Option<String>,
    pub critical_capture_body: Option<String>,
}

enum BodyKind {
    Fixed(String),
    Gps(GpsFix),
}

/// Decides whether an event fires at all and, if so, its subject/body. A
/// `None` result means the subject resolved to null and the dispatch is
/// suppressed (§4.7). The returned `EventKind` is the one sinks should use
/// for tag/priority selection — ordinarily the same as `event_kind`, except
/// an elevated `alerts` event reports `critical` (§4.7, the "Elevation"
/// glossary entry).
fn decide(
    event_kind: EventKind,
    glider_id: GliderId,
    session: Option<&Session>,
    commlog: &CommLog,
    aux: &AuxInputs,
) -> Option<(String, BodyKind, EventKind)> {
    match event_kind {
        EventKind::Gps | EventKind::Lategps => {
            let session = session?;
            let prefix = session.connected_at.to_rfc3339();
            let body = match session.gps_fix {
                Some(fix) => BodyKind::Gps(fix),
                None => BodyKind::Fixed("no GPS fix yet this session".to_string()),
            };
            Some((format!("GPS SG{glider_id} {prefix}"), body, event_kind))
        }
        EventKind::Critical => {
            let session = session?;
            let prefix = session.connected_at.to_rfc3339();
            if commlog.has_glider_rebooted() {
                return Some((
                    format!("REBOOTED SG{glider_id} {prefix}"),
                    BodyKind::Fixed(format!("glider SG{glider_id} rebooted")),
                    EventKind::Critical,
                ));
            }
            if let Some(code) = session.recovery_code.as_deref().filter(|c| *c != "QUIT_COMMAND") {
                return Some((
                    format!("IN NON-QUIT RECOVERY SG{glider_id} {prefix}"),
                    BodyKind::Fixed(format!("recovery code: {code}")),
                    EventKind::Critical,
                ));
            }
            None
        }
        EventKind::Recov => {
            let session = session?;
            let prefix = session.connected_at.to_rfc3339();
            if commlog.has_glider_rebooted() {
                return Some((
                    format!("REBOOTED SG{glider_id} {prefix}"),
                    BodyKind::Fixed(format!("glider SG{glider_id} rebooted")),
                    EventKind::Recov,
                ));
            }
            if let Some(code) = &session.recovery_code {
                return Some((
                    format!("IN RECOVERY SG{glider_id} {prefix}"),
                    BodyKind::Fixed(format!("recovery code: {code}")),
                    EventKind::Recov,
                ));
            }
            if let Some(reason) = &session.escape_reason {
                return Some((
                    format!("IN ESCAPE SG{glider_id} {prefix}"),
                    BodyKind::Fixed(format!("escape reason: {reason}")),
                    EventKind::Recov,
                ));
            }
            None
        }
        EventKind::Drift => {
            let session = session.or_else(|| commlog.last_surfacing())?;
            let fix = session.gps_fix?;
            Some((
                format!("Drift SG{glider_id}"),
                BodyKind::Gps(fix),
                EventKind::Drift,
            ))
        }
        EventKind::Alerts => {
            let body = aux.critical_capture_body.as_ref()?;
            Some((
                format!("CRITICAL ERROR IN CAPTURE SG{glider_id}"),
                BodyKind::Fixed(body.clone()),
                EventKind::Critical,
            ))
        }
        EventKind::Comp => {
            let body = aux.processed_files_body.as_ref()?;
            Some((
                format!("Processing Complete SG{glider_id}"),
                BodyKind::Fixed(body.clone()),
                EventKind::Comp,
            ))
        }
        EventKind::Divetar => {
            let body = aux.processed_files_body.as_ref()?;
            Some((
                format!("New Dive Tarball(s) SG{glider_id}"),
                BodyKind::Fixed(body.clone()),
                EventKind::Divetar,
            ))
        }
        EventKind::Errors | EventKind::Traceback => {
            let body = aux.processed_files_body.as_ref()?;
            Some((
                format!("Warnings and Errors from SG{glider_id} conversion"),
                BodyKind::Fixed(body.clone()),
                event_kind,
            ))
        }
        EventKind::Upload => {
            let body = aux.upload_body.as_ref()?;
            Some((
                format!("SG{glider_id} NETWORK EVENT"),
                BodyKind::Fixed(body.clone()),
                EventKind::Upload,
            ))
        }
    }
}

pub struct Dispatcher {
    registry: SinkRegistry,
    config: NotifyConfig,
}

impl Dispatcher {
    pub fn new(config: NotifyConfig) -> Self {
        let registry = SinkRegistry::new(&config);
        Self { registry, config }
    }

    /// Dispatches one event. Never panics or propagates a sink error; each
    /// failure is logged at error level and does not affect siblings (§4.7,
    /// §8 law 5).
    pub async fn dispatch(
        &self,
        event_kind: EventKind,
        table: &SubscriptionTable,
        glider_id: GliderId,
        session: Option<&Session>,
        commlog: &CommLog,
        aux: &AuxInputs,
    ) {
        let Some((subject, body_kind, tag_kind)) = decide(event_kind, glider_id, session, commlog, aux) else {
            tracing::debug!(event = %event_kind, glider = %glider_id, "subject resolved to null, suppressing dispatch");
            return;
        };

        // Subscription routing always keys off the event a user actually
        // subscribed to; only tag/priority selection uses the elevated kind.
        let items = resolve(table, event_kind);
        for item in items {
            let body = match &body_kind {
                BodyKind::Fixed(s) => s.clone(),
                BodyKind::Gps(fix) => {
                    let (lat, lon) = fix.format(item.latlon_format);
                    format!("lat={lat} lon={lon} at {}", fix.time.to_rfc3339())
                }
            };
            let gps_fix = match &body_kind {
                BodyKind::Gps(fix) => Some(*fix),
                BodyKind::Fixed(_) => session.and_then(|s| s.gps_fix),
            };

            let ctx = DispatchContext {
                glider_id,
                event_kind: tag_kind,
                subject: &subject,
                body: &body,
                gps_fix,
            };

            let Some(sink) = self.registry.get(item.sink) else {
                continue;
            };
            if let Err(e) = sink.send(&self.config, item.endpoint, &ctx).await {
                tracing::error!(
                    user = item.user,
                    sink = item.sink.as_doc_key(),
                    event = %event_kind,
                    error = %e,
                    "sink delivery failed"
                );
            }
        }
    }

    /// Best-effort sidechannel POST to the visualization base URL (§6),
    /// fired for each major reducer callback independent of whether any
    /// subscriber is actually routed to `event_kind` — a no-op when no
    /// base URL is configured. Failures are logged and swallowed.
    pub async fn notify_visualization(&self, glider_id: GliderId, event_kind: EventKind, session: Option<&Session>) {
        let Some(base_url) = &self.config.visualization_base_url else {
            return;
        };

        let dive = session.and_then(|s| s.dive);
        let time = session
            .and_then(|s| s.disconnected_at.or_else(|| s.gps_fix.map(|f| f.time)))
            .unwrap_or_else(chrono::Utc::now);
        let payload = serde_json::json!({
            "glider": glider_id.0,
            "dive": dive,
            "content": event_kind.to_string(),
            "time": time.to_rfc3339(),
        });

        let url = format!("{base_url}/notify");
        if let Err(e) = self.registry.client().post(&url).json(&payload).send().await {
            tracing::warn!(error = %e, glider = %glider_id, event = %event_kind, "visualization sidechannel POST failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn visualization_sidechannel_is_a_noop_without_a_base_url() {
        let dispatcher = Dispatcher::new(NotifyConfig::default());
        // No base URL configured: must return without attempting a POST.
        dispatcher
            .notify_visualization(GliderId(230), EventKind::Gps, None)
            .await;
    }
}
