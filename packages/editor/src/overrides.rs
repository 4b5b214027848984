//! # Override Resolution
//!
//! Produces the effective configuration for one device class by layering
//! the section's `tablet` / `mobile` partial overrides onto its desktop
//! values.
//!
//! ```text
//! hero: { a: 1, b: 2, mobile: { a: 9 } }
//!
//! desktop → hero: { a: 1, b: 2 }
//! tablet  → hero: { a: 1, b: 2 }
//! mobile  → hero: { a: 9, b: 2 }
//! ```
//!
//! Override keys never appear in an [`EffectiveDocument`]. Sections outside
//! [`OVERRIDE_SECTIONS`](crate::document::OVERRIDE_SECTIONS) pass through
//! untouched on every device.

use crate::document::{supports_overrides, DEVICE_OVERRIDE_KEYS};
use crate::merge::merge_maps;
use crate::{ConfigDocument, Device, EditorError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::ops::Deref;

/// A document with device overrides resolved, ready for rendering
///
/// Read-only projection: it has no conversion back into a
/// [`ConfigDocument`], so it cannot be fed into the store by accident.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EffectiveDocument(Map<String, Value>);

impl EffectiveDocument {
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Look up a dotted path such as `hero.titleSize`
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl Deref for EffectiveDocument {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Resolve `document` for `device`
///
/// Pure: identical inputs always give structurally equal output.
pub fn resolve(document: &ConfigDocument, device: Device) -> EffectiveDocument {
    let sections = document
        .as_map()
        .iter()
        .map(|(name, value)| {
            let resolved = if supports_overrides(name) {
                resolve_section(name, value, device)
            } else {
                value.clone()
            };
            (name.clone(), resolved)
        })
        .collect();

    EffectiveDocument(sections)
}

fn resolve_section(name: &str, section: &Value, device: Device) -> Value {
    let Value::Object(properties) = section else {
        return section.clone();
    };

    let mut resolved = match device.override_key().and_then(|key| properties.get(key)) {
        Some(Value::Object(overlay)) => merge_maps(properties, overlay),
        Some(other) => {
            tracing::debug!(
                section = name,
                device = %device,
                value = %other,
                "Ignoring non-object device override"
            );
            properties.clone()
        }
        None => properties.clone(),
    };

    for key in DEVICE_OVERRIDE_KEYS {
        resolved.remove(*key);
    }

    Value::Object(resolved)
}

/// Properties overridden for `device` in `section`
pub fn overridden_properties(document: &ConfigDocument, section: &str, device: Device) -> Vec<String> {
    device
        .override_key()
        .and_then(|key| document.section(section)?.as_object()?.get(key)?.as_object())
        .map(|overlay| overlay.keys().cloned().collect())
        .unwrap_or_default()
}

/// Copy of `document` with `property` set for `device`
///
/// Desktop writes go straight onto the section; other devices write into
/// the section's override object, creating it if needed.
pub fn set_override(
    document: &ConfigDocument,
    section: &str,
    device: Device,
    property: &str,
    value: Value,
) -> Result<ConfigDocument, EditorError> {
    let mut properties = section_properties(document, section)?;

    match device.override_key() {
        None => {
            properties.insert(property.to_string(), value);
        }
        Some(key) => {
            if !supports_overrides(section) {
                return Err(EditorError::OverrideNotSupported(section.to_string()));
            }
            let overlay = properties
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match overlay {
                Value::Object(overlay) => {
                    overlay.insert(property.to_string(), value);
                }
                other => {
                    // A malformed override is replaced rather than merged into
                    let mut overlay = Map::new();
                    overlay.insert(property.to_string(), value);
                    *other = Value::Object(overlay);
                }
            }
        }
    }

    Ok(document.with_section(section, Value::Object(properties)))
}

/// Copy of `document` with the `device` override of `property` removed
///
/// Removing the last overridden property drops the override object. For
/// desktop there is nothing to clear and the document is returned as-is.
pub fn clear_override(
    document: &ConfigDocument,
    section: &str,
    device: Device,
    property: &str,
) -> Result<ConfigDocument, EditorError> {
    let Some(key) = device.override_key() else {
        return Ok(document.clone());
    };
    if !supports_overrides(section) {
        return Err(EditorError::OverrideNotSupported(section.to_string()));
    }

    let mut properties = section_properties(document, section)?;
    let now_empty = match properties.get_mut(key) {
        Some(Value::Object(overlay)) => {
            overlay.remove(property);
            overlay.is_empty()
        }
        _ => return Ok(document.clone()),
    };
    if now_empty {
        properties.remove(key);
    }

    Ok(document.with_section(section, Value::Object(properties)))
}

fn section_properties(
    document: &ConfigDocument,
    section: &str,
) -> Result<Map<String, Value>, EditorError> {
    match document.section(section) {
        None => Ok(Map::new()),
        Some(Value::Object(properties)) => Ok(properties.clone()),
        Some(_) => Err(EditorError::InvalidPath(format!(
            "{} (section is not an object)",
            section
        ))),
    }
}
