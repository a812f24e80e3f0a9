//! Deep-merge of two YAML document trees with list concatenation (§4.4).
//!
//! Merge order matters: `base` is the accumulated lower-priority value,
//! `incoming` the next layer up. Basestation-wide merges into nothing,
//! group-wide merges into that, per-mission merges into that result.

use serde_yaml::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("conflicting scalar at merge: {base:?} vs {incoming:?} (allow_override=false)")]
pub struct MergeConflict {
    pub base: Value,
    pub incoming: Value,
}

/// Merges `incoming` onto `base`. Mappings recurse key-by-key; two lists
/// concatenate left-then-right; a list and a scalar combine by appending the
/// scalar to the list; two differing scalars override (incoming wins)
/// unless `allow_override` is false, in which case that's a load failure.
pub fn merge(base: Value, incoming: Value, allow_override: bool) -> Result<Value, MergeConflict> {
    match (base, incoming) {
        (Value::Mapping(mut base_map), Value::Mapping(incoming_map)) => {
            for (key, incoming_value) in incoming_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => merge(base_value, incoming_value, allow_override)?,
                    None => incoming_value,
                };
                base_map.insert(key, merged);
            }
            Ok(Value::Mapping(base_map))
        }
        (Value::Sequence(mut base_seq), Value::Sequence(incoming_seq)) => {
            base_seq.extend(incoming_seq);
            Ok(Value::Sequence(base_seq))
        }
        (Value::Sequence(mut base_seq), scalar) => {
            base_seq.push(scalar);
            Ok(Value::Sequence(base_seq))
        }
        (scalar, Value::Sequence(mut incoming_seq)) => {
            incoming_seq.push(scalar);
            Ok(Value::Sequence(incoming_seq))
        }
        (Value::Null, incoming) => Ok(incoming),
        (base, Value::Null) => Ok(base),
        (base, incoming) => {
            if base == incoming {
                Ok(incoming)
            } else if allow_override {
                Ok(incoming)
            } else {
                Err(MergeConflict { base, incoming })
            }
        }
    }
}

/// Merges an ordered sequence of optional documents, lowest priority first.
pub fn merge_layers(
    layers: impl IntoIterator<Item = Value>,
    allow_override: bool,
) -> Result<Value, MergeConflict> {
    let mut acc = Value::Null;
    for layer in layers {
        acc = merge(acc, layer, allow_override)?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn mappings_recurse() {
        let base = yaml("a:\n  x: 1\n  y: 2\n");
        let incoming = yaml("a:\n  y: 3\n  z: 4\n");
        let merged = merge(base, incoming, true).unwrap();
        assert_eq!(merged, yaml("a:\n  x: 1\n  y: 3\n  z: 4\n"));
    }

    #[test]
    fn lists_concatenate_left_then_right() {
        let base = yaml("items:\n  - a\n  - b\n");
        let incoming = yaml("items:\n  - c\n");
        let merged = merge(base, incoming, true).unwrap();
        assert_eq!(merged, yaml("items:\n  - a\n  - b\n  - c\n"));
    }

    #[test]
    fn conflicting_scalar_fails_when_override_disallowed() {
        let base = yaml("x: 1\n");
        let incoming = yaml("x: 2\n");
        assert!(merge(base, incoming, false).is_err());
    }

    #[test]
    fn conflicting_scalar_overrides_when_allowed() {
        let base = yaml("x: 1\n");
        let incoming = yaml("x: 2\n");
        assert_eq!(merge(base, incoming, true).unwrap(), yaml("x: 2\n"));
    }

    #[test]
    fn duplicate_user_endpoint_lists_concatenate_with_duplicates() {
        // Open question resolved in SPEC_FULL.md: preserved surprising behavior.
        let base = yaml("users:\n  alice:\n    email:\n      - address: a@example.org\n");
        let incoming = yaml("users:\n  alice:\n    email:\n      - address: a@example.org\n");
        let merged = merge(base, incoming, true).unwrap();
        let rendered = serde_yaml::to_string(&merged).unwrap();
        assert_eq!(rendered.matches("a@example.org").count(), 2);
    }
}
