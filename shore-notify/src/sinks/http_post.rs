//! Plain HTTP POST sink. The body is the raw `"<subject>:<body>"` string
//! with `content-type: application/json` — a historical choice preserved
//! for compatibility rather than an actually-valid JSON payload (§4.6).

use async_trait::async_trait;
use shore_subscriptions::Endpoint;

use crate::context::{DispatchContext, NotifyConfig};
use crate::error::SinkError;
use crate::sink::{require_field, Sink};

pub struct HttpPostSink {
    pub client: reqwest::Client,
}

#[async_trait]
impl Sink for HttpPostSink {
    async fn send(
        &self,
        _config: &NotifyConfig,
        endpoint: &Endpoint,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), SinkError> {
        let url = require_field(endpoint, "url")?;
        let body = format!("{}:{}", ctx.subject, ctx.body);

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
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
