//! Satellite-text gateway sink. Requires a valid GPS fix; skipped (not
//! failed) with a log line otherwise, since "no fix yet" is routine early in
//! a session rather than a transport fault (§4.6).

use async_trait::async_trait;
use serde_json::json;
use shore_common::CoordFormat;
use shore_subscriptions::Endpoint;

use crate::context::{DispatchContext, NotifyConfig};
use crate::error::SinkError;
use crate::sink::{require_field, Sink};

pub struct SatelliteSink {
    pub client: reqwest::Client,
    pub gateway_url: String,
}

#[async_trait]
impl Sink for SatelliteSink {
    async fn send(
        &self,
        _config: &NotifyConfig,
        endpoint: &Endpoint,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), SinkError> {
        let Some(fix) = ctx.gps_fix else {
            tracing::info!(glider = %ctx.glider_id, "skipping satellite-text notification: no GPS fix yet");
            return Ok(());
        };

        let imei = require_field(endpoint, "imei")?;
        let usr = require_field(endpoint, "usr")?;
        let pwd = require_field(endpoint, "pwd")?;

        let (lat, lon) = fix.format(CoordFormat::Dddd);
        let epoch_ms = fix.time.timestamp_millis();
        let label = format!("SG{:03}", ctx.glider_id.0);

        let payload = json!({
            "Messages": [{
                "Message": format!("{}:{}", ctx.subject, ctx.body),
                "Recipients": [imei],
                "ReferencePoint": {
                    "Altitude": 0,
                    "Coordinate": { "Latitude": lat.parse::<f64>().unwrap_or(0.0), "Longitude": lon.parse::<f64>().unwrap_or(0.0) },
                    "Course": 0,
                    "Label": label,
                    "LocationType": 0,
                    "Speed": 0,
                },
                "Sender": usr,
                "Timestamp": format!("/Date({epoch_ms})/"),
            }],
        });

        let response = self
            .client
            .post(&self.gateway_url)
            .basic_auth(usr, Some(pwd))
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
