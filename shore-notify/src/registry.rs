//! Maps each [`SinkKind`] to its adapter, sharing one pooled `reqwest::Client`
//! across the HTTP-based sinks (grounded in the connection-pooling backend
//! pattern used for the teacher's own HTTP client).

use std::collections::HashMap;

use shore_subscriptions::SinkKind;

use crate::context::NotifyConfig;
use crate::sink::Sink;
use crate::sinks::{ChatWebhookASink, ChatWebhookBSink, EmailSink, HttpPostSink, PushSink, SatelliteSink};

pub struct SinkRegistry {
    sinks: HashMap<SinkKind, Box<dyn Sink>>,
    client: reqwest::Client,
}

impl SinkRegistry {
    pub fn new(config: &NotifyConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .expect("reqwest client configuration is valid");

        let mut sinks: HashMap<SinkKind, Box<dyn Sink>> = HashMap::new();
        sinks.insert(SinkKind::Email, Box::new(EmailSink));
        sinks.insert(
            SinkKind::ChatWebhookA,
            Box::new(ChatWebhookASink { client: client.clone() }),
        );
        sinks.insert(
            SinkKind::ChatWebhookB,
            Box::new(ChatWebhookBSink { client: client.clone() }),
        );
        sinks.insert(
            SinkKind::Satellite,
            Box::new(SatelliteSink {
                client: client.clone(),
                gateway_url: config.satellite_gateway_url.clone().unwrap_or_default(),
            }),
        );
        sinks.insert(SinkKind::Http, Box::new(HttpPostSink { client: client.clone() }));
        sinks.insert(SinkKind::Push, Box::new(PushSink { client: client.clone() }));

        Self { sinks, client }
    }

    pub fn get(&self, kind: SinkKind) -> Option<&dyn Sink> {
        self.sinks.get(&kind).map(|b| b.as_ref())
    }

    /// The pooled client shared by the HTTP-based sinks, reused for the
    /// visualization sidechannel POST (§6) since it isn't itself a sink.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}
