//! JSON patch collaborators
//!
//! Diffing and patch application are delegated to the `json-patch` crate. The
//! engine only stores patches, orders them, and replays them.

use serde_json::{Map, Value};

pub use json_patch::{Patch, PatchError};

/// Compute the patch that turns `source` into `target`.
pub fn compute_patch(source: &Value, target: &Value) -> Patch {
    json_patch::diff(source, target)
}

/// Apply `patch` to a copy of `document`; the input is never modified.
pub fn apply_patch(document: &Value, patch: &Patch) -> Result<Value, PatchError> {
    let mut next = document.clone();
    json_patch::patch(&mut next, &patch.0)?;
    Ok(next)
}

/// Canonical text of a patch with object keys sorted at every level.
///
/// Two structurally equal patches always yield the same text, so the text can
/// serve as the identity and secondary sort key of an update.
pub fn canonical_text(patch: &Patch) -> serde_json::Result<String> {
    let value = serde_json::to_value(patch)?;
    serde_json::to_string(&sorted(value))
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut out = Map::new();
            for (key, inner) in entries {
                out.insert(key, sorted(inner));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
