//! Push notification sink. `actions` deep links are only attached when a
//! visualization base URL is configured; `tags` come from a fixed
//! event-kind lookup (§4.6).

use async_trait::async_trait;
use serde_json::json;
use shore_common::EventKind;
use shore_subscriptions::Endpoint;

use crate::context::{DispatchContext, NotifyConfig};
use crate::error::SinkError;
use crate::sink::{require_field, Sink};

/// The literal marker a body may contain to name a baselog timestamp for
/// the deep-link action, e.g. `...[baselog:2024-01-15T00:05:00Z]`.
const BASELOG_MARKER: &str = "[baselog:";

fn default_tag(event_kind: EventKind) -> &'static str {
    match event_kind {
        EventKind::Lategps => "late",
        EventKind::Gps => "location_pin",
        EventKind::Recov => "stop_sign",
        EventKind::Critical => "rotating_light",
        EventKind::Drift => "ocean",
        EventKind::Divetar => "package",
        EventKind::Comp => "white_check_mark",
        EventKind::Alerts => "warning",
        EventKind::Errors => "x",
        EventKind::Upload => "satellite",
        EventKind::Traceback => "bug",
    }
}

fn default_priority(event_kind: EventKind) -> i64 {
    match event_kind {
        EventKind::Recov | EventKind::Critical => 5,
        _ => 3,
    }
}

fn endpoint_priority(endpoint: &Endpoint, event_kind: EventKind) -> i64 {
    match endpoint.fields.get("priority") {
        Some(serde_yaml::Value::Mapping(map)) => map
            .get(event_kind.to_string())
            .and_then(|v| v.as_i64())
            .unwrap_or_else(|| default_priority(event_kind)),
        Some(serde_yaml::Value::Number(n)) => n.as_i64().unwrap_or_else(|| default_priority(event_kind)),
        _ => default_priority(event_kind),
    }
}

fn baselog_timestamp(body: &str) -> Option<&str> {
    let start = body.find(BASELOG_MARKER)? + BASELOG_MARKER.len();
    let end = body[start..].find(']')? + start;
    Some(&body[start..end])
}

pub struct PushSink {
    pub client: reqwest::Client,
}

#[async_trait]
impl Sink for PushSink {
    async fn send(
        &self,
        config: &NotifyConfig,
        endpoint: &Endpoint,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), SinkError> {
        let topic = require_field(endpoint, "topic")?;

        let mut payload = json!({
            "title": ctx.subject,
            "message": ctx.body,
            "topic": topic,
            "priority": endpoint_priority(endpoint, ctx.event_kind),
            "tags": [default_tag(ctx.event_kind)],
        });

        if let Some(base_url) = &config.visualization_base_url {
            let mut actions = vec![
                json!({ "action": "view", "label": "dives", "url": format!("{base_url}/dives/{}", ctx.glider_id) }),
                json!({ "action": "view", "label": "map", "url": format!("{base_url}/map/{}", ctx.glider_id) }),
            ];
            if let Some(ts) = baselog_timestamp(ctx.body) {
                actions.push(json!({
                    "action": "view",
                    "label": "baselog",
                    "url": format!("{base_url}/baselog/{ts}"),
                }));
            }
            payload
                .as_object_mut()
                .expect("constructed as object")
                .insert("actions".to_string(), json!(actions));
        }

        let base_url = config
            .push_gateway_url
            .as_deref()
            .ok_or(SinkError::MissingField("push_gateway_url"))?;
        let response = self
            .client
            .post(format!("{base_url}/{topic}"))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::NonSuccessStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baselog_marker_extracts_timestamp() {
        let body = "drift exceeded [baselog:2024-01-15T00:05:00Z] threshold";
        assert_eq!(baselog_timestamp(body), Some("2024-01-15T00:05:00Z"));
    }

    #[test]
    fn no_marker_yields_none() {
        assert_eq!(baselog_timestamp("nothing here"), None);
    }

    #[test]
    fn recov_default_tag_and_priority_match_scenario() {
        assert_eq!(default_tag(EventKind::Recov), "stop_sign");
        assert_eq!(default_priority(EventKind::Recov), 5);
    }
}
