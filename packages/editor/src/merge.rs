//! # Deep Merge
//!
//! Combines a base document with a partial overlay.
//!
//! ## Rules
//!
//! - Object + object → recurse key by key
//! - Anything else → overlay value replaces base wholesale (arrays included,
//!   list properties such as nav links are edited as whole units)
//! - Keys only in base are kept
//! - A key absent from the overlay means "not provided"; an explicit `null`
//!   is a value and overwrites
//!
//! Inputs are never mutated.

use crate::defaults::default_document;
use crate::ConfigDocument;
use serde_json::{Map, Value};

/// Merge `overlay` onto `base`, returning a new value
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => Value::Object(merge_maps(base, overlay)),
        (_, overlay) => overlay.clone(),
    }
}

/// Object-level merge used by [`merge`]
pub fn merge_maps(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();

    for (key, value) in overlay {
        let next = match merged.get(key) {
            Some(existing) => merge(existing, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), next);
    }

    merged
}

pub fn merge_documents(base: &ConfigDocument, overlay: &ConfigDocument) -> ConfigDocument {
    ConfigDocument::from_map(merge_maps(base.as_map(), overlay.as_map()))
}

/// Fill gaps in a fetched payload from the canonical default document
///
/// Anything that is not a JSON object cannot be a document; it is dropped
/// and the defaults are used as-is.
pub fn hydrate(remote: &Value) -> ConfigDocument {
    let defaults = default_document();

    match remote {
        Value::Object(map) => ConfigDocument::from_map(merge_maps(defaults.as_map(), map)),
        other => {
            tracing::warn!(
                kind = value_kind(other),
                "Fetched document is not an object, falling back to defaults"
            );
            defaults
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
