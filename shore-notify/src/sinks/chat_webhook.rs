//! The two chat-webhook wire formats (§4.6).

use async_trait::async_trait;
use serde_json::json;
use shore_subscriptions::Endpoint;

use crate::context::{DispatchContext, NotifyConfig};
use crate::error::SinkError;
use crate::sink::{require_field, Sink};

async fn post_json(client: &reqwest::Client, url: &str, body: serde_json::Value) -> Result<(), SinkError> {
    let response = client.post(url).json(&body).send().await?;
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

/// Type A: `{text: "<subject>:<body>"}`, no extra fields.
pub struct ChatWebhookASink {
    pub client: reqwest::Client,
}

#[async_trait]
impl Sink for ChatWebhookASink {
    async fn send(
        &self,
        _config: &NotifyConfig,
        endpoint: &Endpoint,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), SinkError> {
        let hook = require_field(endpoint, "hook")?;
        let text = format!("{}:{}", ctx.subject, ctx.body);
        post_json(&self.client, hook, json!({ "text": text })).await
    }
}

/// Type B: `{text, username?, channel?}`, with an optional mention
/// prefix (a single string, or the concatenation of an ordered list)
/// prepended to `text`.
pub struct ChatWebhookBSink {
    pub client: reqwest::Client,
}

#[async_trait]
impl Sink for ChatWebhookBSink {
    async fn send(
        &self,
        _config: &NotifyConfig,
        endpoint: &Endpoint,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), SinkError> {
        let hook = require_field(endpoint, "hook")?;
        let mention = mention_prefix(endpoint);
        let text = format!("{mention}{}:{}", ctx.subject, ctx.body);

        let mut payload = json!({ "text": text });
        let obj = payload.as_object_mut().expect("constructed as object");
        if let Some(username) = endpoint.field_str("username") {
            obj.insert("username".to_string(), json!(username));
        }
        if let Some(channel) = endpoint.field_str("channel") {
            obj.insert("channel".to_string(), json!(channel));
        }

        post_json(&self.client, hook, payload).await
    }
}

fn mention_prefix(endpoint: &Endpoint) -> String {
    match endpoint.fields.get("mention") {
        Some(serde_yaml::Value::String(s)) => s.clone(),
        Some(serde_yaml::Value::Sequence(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .concat(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_prefix_concatenates_list_preserving_order() {
        let endpoint = Endpoint {
            sink: shore_subscriptions::SinkKind::ChatWebhookB,
            fields: [(
                "mention".to_string(),
                serde_yaml::from_str("[\"@alice \", \"@bob \"]").unwrap(),
            )]
            .into_iter()
            .collect(),
            filters: None,
            status: None,
            latlon: None,
        };
        assert_eq!(mention_prefix(&endpoint), "@alice @bob ");
    }
}
