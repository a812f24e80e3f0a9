//! Given an event kind, produces the ordered list of destinations to notify
//! (§4.5).

use shore_common::{CoordFormat, EventKind};

use crate::model::{Endpoint, SinkKind, SubscriptionTable};

/// One resolved destination. Borrows from the table it was resolved against;
/// per §3 it must not outlive the call that produced it — the table is
/// reloaded fresh per event, never cached.
#[derive(Debug, Clone, Copy)]
pub struct DispatchItem<'a> {
    pub user: &'a str,
    pub sink: SinkKind,
    pub endpoint: &'a Endpoint,
    pub latlon_format: CoordFormat,
    pub event_kind: EventKind,
}

/// Resolves `event_kind` against `table`, producing one item per
/// (user, endpoint) pair that isn't filtered out or disabled. De-duplication
/// across subscription groups falls out of `SubscriptionTable::subscriptions`
/// being a plain vector per event kind with no duplicate user names expected
/// after canonicalization; within one user, every endpoint is distinct by
/// construction, so no further dedup is needed here (§8, law 4).
pub fn resolve(table: &SubscriptionTable, event_kind: EventKind) -> Vec<DispatchItem<'_>> {
    let mut items = Vec::new();
    let Some(user_names) = table.subscriptions.get(&event_kind) else {
        return items;
    };

    for user_name in user_names {
        let Some(user) = table.users.get(user_name) else {
            continue;
        };
        for sink in SinkKind::ALL {
            let Some(endpoints) = user.endpoints.get(&sink) else {
                continue;
            };
            for endpoint in endpoints {
                if let Some(filters) = &endpoint.filters {
                    if !filters.contains(&event_kind) {
                        continue;
                    }
                }
                let effective_status = endpoint.status.unwrap_or(user.status);
                if !effective_status {
                    continue;
                }
                let latlon_format = endpoint.latlon.unwrap_or(user.latlon);
                items.push(DispatchItem {
                    user: user_name,
                    sink,
                    endpoint,
                    latlon_format,
                    event_kind,
                });
            }
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalize::canonicalize;

    fn table_from(yaml: &str) -> SubscriptionTable {
        canonicalize(serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn filter_excludes_unlisted_event_kind() {
        let table = table_from(
            "subscriptions:\n  gps: [carol]\n  recov: [carol]\nusers:\n  carol:\n    chat_a:\n      hook: https://x\n      filters: [recov]\n",
        );
        assert!(resolve(&table, EventKind::Gps).is_empty());
        assert_eq!(resolve(&table, EventKind::Recov).len(), 1);
    }

    #[test]
    fn disabled_user_is_skipped() {
        let table = table_from(
            "subscriptions:\n  gps: [alice]\nusers:\n  alice:\n    status: false\n    email:\n      address: a@example.org\n",
        );
        assert!(resolve(&table, EventKind::Gps).is_empty());
    }

    #[test]
    fn endpoint_status_overrides_user_status() {
        let table = table_from(
            "subscriptions:\n  gps: [alice]\nusers:\n  alice:\n    status: false\n    email:\n      address: a@example.org\n      status: true\n",
        );
        assert_eq!(resolve(&table, EventKind::Gps).len(), 1);
    }

    #[test]
    fn duplicate_subscriber_entries_collapse_to_one_item() {
        let table = table_from(
            "subscriptions:\n  gps: [alice, alice]\nusers:\n  alice:\n    email:\n      address: a@example.org\n",
        );
        let items = resolve(&table, EventKind::Gps);
        assert_eq!(items.len(), 1);
    }
}
