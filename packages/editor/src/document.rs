//! # Configuration Document
//!
//! The site configuration is a tree of named sections (`header`, `hero`,
//! `gallery`, `footer`, `theme`, `effects`, ...). Each section maps property
//! names to scalars, enums, arrays or nested objects.
//!
//! ## Device overrides
//!
//! Sections listed in [`OVERRIDE_SECTIONS`] may carry partial copies of
//! themselves under the reserved `tablet` / `mobile` keys:
//!
//! ```text
//! hero: {
//!   title: "Hello",
//!   titleSize: 64,
//!   mobile: { titleSize: 32 }    ← only the properties that differ
//! }
//! ```
//!
//! Desktop values live directly on the section and never get an override key.

use crate::EditorError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Sections that accept per-device overrides
pub const OVERRIDE_SECTIONS: &[&str] = &["header", "hero", "gallery", "footer", "effects"];

/// Reserved keys holding device overrides inside a section
pub const DEVICE_OVERRIDE_KEYS: &[&str] = &["tablet", "mobile"];

/// Whether `section` resolves device overrides
pub fn supports_overrides(section: &str) -> bool {
    OVERRIDE_SECTIONS.contains(&section)
}

/// Target device class for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Desktop,
    Tablet,
    Mobile,
}

impl Device {
    pub const ALL: [Device; 3] = [Device::Desktop, Device::Tablet, Device::Mobile];

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Desktop => "desktop",
            Device::Tablet => "tablet",
            Device::Mobile => "mobile",
        }
    }

    /// Key under which this device's overrides are stored (none for desktop)
    pub fn override_key(&self) -> Option<&'static str> {
        match self {
            Device::Desktop => None,
            Device::Tablet => Some("tablet"),
            Device::Mobile => Some("mobile"),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "desktop" => Ok(Device::Desktop),
            "tablet" => Ok(Device::Tablet),
            "mobile" => Ok(Device::Mobile),
            other => Err(format!(
                "Invalid device: {}. Use: desktop, tablet, or mobile",
                other
            )),
        }
    }
}

/// The two addressable slots in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKey {
    /// Mutable work-in-progress
    Draft,
    /// What the public site serves
    Published,
}

impl DocumentKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKey::Draft => "draft",
            DocumentKey::Published => "published",
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(DocumentKey::Draft),
            "published" => Ok(DocumentKey::Published),
            other => Err(format!("Invalid document key: {}. Use: draft or published", other)),
        }
    }
}

/// Full configuration tree for a site
///
/// Equality is structural, which is what the store uses to suppress
/// no-op edits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument(Map<String, Value>);

impl ConfigDocument {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wrap a JSON value, rejecting anything that is not an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0.get_mut(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Copy of this document with one section replaced
    ///
    /// Panels always send complete documents to the store; this is the
    /// read-modify-write step they use to build one.
    pub fn with_section(&self, name: &str, value: Value) -> ConfigDocument {
        let mut next = self.clone();
        next.0.insert(name.to_string(), value);
        next
    }

    /// Look up a dotted path such as `hero.title`
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Write a value at a dotted path, creating missing intermediate objects
    pub fn set_path(&mut self, path: &str, value: Value) -> Result<(), EditorError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(EditorError::InvalidPath(path.to_string()));
        }

        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| EditorError::InvalidPath(path.to_string()))?;

        let mut current = &mut self.0;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = entry.as_object_mut().ok_or_else(|| {
                EditorError::InvalidPath(format!("{} ('{}' is not an object)", path, segment))
            })?;
        }

        current.insert(last.to_string(), value);
        Ok(())
    }
}

impl From<Map<String, Value>> for ConfigDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
