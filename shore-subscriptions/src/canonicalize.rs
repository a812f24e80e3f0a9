//! Canonicalizes a merged raw document into a validated [`SubscriptionTable`]
//! (§4.4). Validation failures are logged and degrade gracefully rather than
//! failing the load — an unknown filter name drops just that filter, an
//! unknown sink-kind drops the user that named it.

use std::collections::HashMap;

use serde_yaml::Value;
use shore_common::{CoordFormat, EventKind};

use crate::model::{Endpoint, RawDoc, RawEndpoint, RawUser, SinkKind, SubscriptionTable, User};

pub fn canonicalize(raw: Value) -> SubscriptionTable {
    let doc: RawDoc = serde_yaml::from_value(raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "subscription document did not match the expected shape, treating as empty");
        RawDoc::default()
    });

    let mut users = HashMap::new();
    for (name, raw_user) in doc.users {
        match canonicalize_user(&name, raw_user) {
            Some(user) => {
                users.insert(name, user);
            }
            None => continue,
        }
    }

    let mut subscriptions = HashMap::new();
    for (event_kind, user_names) in doc.subscriptions {
        match event_kind.parse::<EventKind>() {
            Ok(kind) => {
                // Set semantics across subscription groups: a user named
                // twice for the same event resolves to one dispatch item,
                // not two (§4.5, §8 law 4).
                let mut seen = std::collections::HashSet::new();
                let known: Vec<String> = user_names
                    .into_iter()
                    .filter(|name| {
                        let known = users.contains_key(name);
                        if !known {
                            tracing::warn!(user = name, event = event_kind, "subscription names an unknown user, dropping");
                        }
                        known
                    })
                    .filter(|name| seen.insert(name.clone()))
                    .collect();
                subscriptions.insert(kind, known);
            }
            Err(()) => {
                tracing::warn!(event = event_kind, "subscriptions key is not a known event kind, dropping");
            }
        }
    }

    SubscriptionTable { subscriptions, users }
}

fn canonicalize_user(name: &str, raw: RawUser) -> Option<User> {
    let mut endpoints: HashMap<SinkKind, Vec<Endpoint>> = HashMap::new();
    for (key, value) in raw.sinks {
        let Some(sink) = SinkKind::from_doc_key(&key) else {
            tracing::warn!(user = name, sink = key, "unknown sink kind, dropping user");
            return None;
        };
        let list = lift_to_list(value);
        let mut canon = Vec::with_capacity(list.len());
        for item in list {
            if let Some(endpoint) = canonicalize_endpoint(name, sink, item) {
                canon.push(endpoint);
            }
        }
        endpoints.entry(sink).or_default().extend(canon);
    }

    let status = match raw.status {
        None => true,
        Some(Value::Bool(b)) => b,
        Some(other) => {
            tracing::warn!(user = name, value = ?other, "user status is not boolean, forcing true");
            true
        }
    };

    let latlon = match raw.latlon {
        None => CoordFormat::Ddmm,
        Some(Value::String(s)) => s.parse().unwrap_or_else(|()| {
            tracing::warn!(user = name, latlon = s, "invalid latlon token, forcing ddmm");
            CoordFormat::Ddmm
        }),
        Some(other) => {
            tracing::warn!(user = name, value = ?other, "latlon is not a string, forcing ddmm");
            CoordFormat::Ddmm
        }
    };

    Some(User {
        endpoints,
        status,
        latlon,
    })
}

fn lift_to_list(value: Value) -> Vec<Value> {
    match value {
        Value::Sequence(items) => items,
        single => vec![single],
    }
}

fn canonicalize_endpoint(user: &str, sink: SinkKind, value: Value) -> Option<Endpoint> {
    let raw: RawEndpoint = match serde_yaml::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(user, sink = sink.as_doc_key(), error = %e, "malformed endpoint, dropping");
            return None;
        }
    };

    let filters = raw.filters.map(|names| {
        names
            .into_iter()
            .filter_map(|n| match n.parse::<EventKind>() {
                Ok(k) => Some(k),
                Err(()) => {
                    tracing::warn!(user, sink = sink.as_doc_key(), filter = n, "unknown filter name, removing");
                    None
                }
            })
            .collect::<Vec<_>>()
    });

    let status = match raw.status {
        None => None,
        Some(Value::Bool(b)) => Some(b),
        Some(other) => {
            tracing::warn!(user, sink = sink.as_doc_key(), value = ?other, "endpoint status is not boolean, ignoring");
            None
        }
    };

    let latlon = match raw.latlon {
        None => None,
        Some(Value::String(s)) => match s.parse() {
            Ok(fmt) => Some(fmt),
            Err(()) => {
                tracing::warn!(user, sink = sink.as_doc_key(), latlon = s, "invalid endpoint latlon, ignoring");
                None
            }
        },
        Some(other) => {
            tracing::warn!(user, sink = sink.as_doc_key(), value = ?other, "endpoint latlon is not a string, ignoring");
            None
        }
    };

    Some(Endpoint {
        sink,
        fields: raw.fields,
        filters,
        status,
        latlon,
    })
}
