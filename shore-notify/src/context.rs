//! The inputs a sink adapter needs to format and send one notification.

use shore_common::{EventKind, GliderId, GpsFix};

/// Shared runtime configuration for the sink adapters: transport endpoints
/// and credentials that don't vary per dispatch, only loaded once at startup
/// (unlike `SubscriptionTable`, which is reloaded per event — see the
/// `RuntimeConfig` glossary entry).
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// `None` submits locally on port 25; `Some` authenticates via STARTTLS
    /// on port 587 against this relay (§4.6).
    pub smtp_relay: Option<SmtpRelay>,
    pub http_timeout: std::time::Duration,
    /// Base URL of the push gateway; each message posts to `<base>/<topic>`.
    pub push_gateway_url: Option<String>,
    /// URL of the satellite-text gateway's message-submission endpoint.
    pub satellite_gateway_url: Option<String>,
    /// Base URL for the visualization sidechannel; when set, push
    /// notifications gain deep-link `actions` and major callbacks also POST
    /// a compact JSON record here (§6).
    pub visualization_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpRelay {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            smtp_relay: None,
            http_timeout: std::time::Duration::from_secs(10),
            push_gateway_url: None,
            satellite_gateway_url: None,
            visualization_base_url: None,
        }
    }
}

/// One dispatch's worth of context, built fresh by the dispatcher per event.
pub struct DispatchContext<'a> {
    pub glider_id: GliderId,
    pub event_kind: EventKind,
    pub subject: &'a str,
    pub body: &'a str,
    pub gps_fix: Option<GpsFix>,
}
