//! Typed subscription model, produced by canonicalizing a merged raw document.

use std::collections::HashMap;

use serde::Deserialize;
use serde_yaml::Value;
use shore_common::{CoordFormat, EventKind};

/// The recognized sink kinds, keyed by the document key under a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Email,
    ChatWebhookA,
    ChatWebhookB,
    Satellite,
    Http,
    Push,
}

impl SinkKind {
    pub const ALL: [SinkKind; 6] = [
        SinkKind::Email,
        SinkKind::ChatWebhookA,
        SinkKind::ChatWebhookB,
        SinkKind::Satellite,
        SinkKind::Http,
        SinkKind::Push,
    ];

    pub fn from_doc_key(key: &str) -> Option<Self> {
        match key {
            "email" => Some(SinkKind::Email),
            "chat_a" => Some(SinkKind::ChatWebhookA),
            "chat_b" => Some(SinkKind::ChatWebhookB),
            "satellite" => Some(SinkKind::Satellite),
            "http" => Some(SinkKind::Http),
            "push" => Some(SinkKind::Push),
            _ => None,
        }
    }

    pub fn as_doc_key(self) -> &'static str {
        match self {
            SinkKind::Email => "email",
            SinkKind::ChatWebhookA => "chat_a",
            SinkKind::ChatWebhookB => "chat_b",
            SinkKind::Satellite => "satellite",
            SinkKind::Http => "http",
            SinkKind::Push => "push",
        }
    }
}

/// One concrete destination: sink-specific fields plus the common per-endpoint
/// overrides (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub sink: SinkKind,
    /// Sink-specific fields (`address`, `hook`, `imei`, `url`, `topic`, ...),
    /// kept as a loosely-typed map so each sink adapter in `shore-notify`
    /// extracts what it needs and validates presence itself (§4.6).
    pub fields: HashMap<String, Value>,
    pub filters: Option<Vec<EventKind>>,
    pub status: Option<bool>,
    pub latlon: Option<CoordFormat>,
}

impl Endpoint {
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key)?.as_str()
    }
}

/// A subscriber: per-sink-kind endpoint lists plus user-level defaults (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub endpoints: HashMap<SinkKind, Vec<Endpoint>>,
    pub status: bool,
    pub latlon: CoordFormat,
}

/// The canonicalized two-map document: event kind to subscribed user names,
/// and user name to `User` record (§3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionTable {
    pub subscriptions: HashMap<EventKind, Vec<String>>,
    pub users: HashMap<String, User>,
}

/// Raw shape deserialized straight from the merged YAML tree, before
/// canonicalization validates and fills in defaults.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct RawDoc {
    #[serde(default)]
    pub subscriptions: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub users: HashMap<String, RawUser>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct RawUser {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub latlon: Option<Value>,
    #[serde(flatten)]
    pub sinks: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct RawEndpoint {
    #[serde(default)]
    pub filters: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub latlon: Option<Value>,
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}
