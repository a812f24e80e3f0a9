//! Loads up to three layered config files from disk and merges them (§4.4).

use std::path::Path;

use serde_yaml::Value;

use crate::error::ConfigError;
use crate::merge::merge_layers;
use crate::model::SubscriptionTable;

/// The three layers in increasing priority order: basestation-wide,
/// group-wide, per-mission. Each is optional; a missing file contributes
/// nothing rather than failing the load.
#[derive(Debug, Default)]
pub struct ConfigLayers<'a> {
    pub basestation: Option<&'a Path>,
    pub group: Option<&'a Path>,
    pub mission: Option<&'a Path>,
}

fn read_layer(path: &Path) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_yaml::from_str(&text).map_err(|e| ConfigError::Yaml {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Loads and merges the configured layers, then canonicalizes the result.
/// `allow_override` controls whether a scalar conflict between layers wins
/// silently (true) or fails the whole load (false), per §4.4.
pub fn load(layers: ConfigLayers<'_>, allow_override: bool) -> Result<SubscriptionTable, ConfigError> {
    let mut docs = Vec::with_capacity(3);
    for path in [layers.basestation, layers.group, layers.mission].into_iter().flatten() {
        docs.push(read_layer(path)?);
    }
    let merged = merge_layers(docs, allow_override)?;
    Ok(crate::canonicalize::canonicalize(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_layers_yield_empty_table() {
        let table = load(ConfigLayers::default(), true).unwrap();
        assert!(table.users.is_empty());
    }

    #[test]
    fn merges_group_and_mission_layers() {
        let mut group = tempfile::NamedTempFile::new().unwrap();
        writeln!(group, "users:\n  alice:\n    email:\n      address: a@example.org\n").unwrap();
        let mut mission = tempfile::NamedTempFile::new().unwrap();
        writeln!(mission, "subscriptions:\n  gps: [alice]\n").unwrap();

        let table = load(
            ConfigLayers {
                basestation: None,
                group: Some(group.path()),
                mission: Some(mission.path()),
            },
            true,
        )
        .unwrap();

        assert!(table.users.contains_key("alice"));
        assert_eq!(table.subscriptions[&shore_common::EventKind::Gps], vec!["alice"]);
    }
}
