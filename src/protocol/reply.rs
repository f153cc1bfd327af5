//! Reply accessors and list entry types.
//!
//! Query paths answer with `{"data": {...}}`. Status replies carry their
//! payload directly in `data`; list and live replies nest it one level
//! deeper in `data.result`.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ============================================================================
// Accessors
// ============================================================================

/// Returns `reply.data`, if present and non-null.
#[inline]
#[must_use]
pub fn data(reply: &Value) -> Option<&Value> {
    reply.get("data").filter(|v| !v.is_null())
}

/// Returns `reply.data.result`, if present and non-null.
#[inline]
#[must_use]
pub fn result(reply: &Value) -> Option<&Value> {
    data(reply)
        .and_then(|d| d.get("result"))
        .filter(|v| !v.is_null())
}

// ============================================================================
// List Entries
// ============================================================================

/// A program source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Director {
    /// Source id.
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    /// Display name.
    pub director_name: Option<String>,
    /// Whether this source is on program.
    #[serde(deserialize_with = "lenient_bool")]
    pub is_selected: bool,
}

impl Director {
    /// Returns the display label, falling back to the id.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.director_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

/// An overlay.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Material {
    /// Overlay id.
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    /// Whether the overlay is shown.
    #[serde(deserialize_with = "lenient_bool")]
    pub is_selected: bool,
}

/// An audio channel.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mixer {
    /// Channel id. Some channels only carry a name.
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    /// Channel name.
    pub mixer_name: Option<String>,
    /// Channel on/off. `None` unless the device sent a boolean.
    #[serde(deserialize_with = "strict_bool")]
    pub is_selected: Option<bool>,
    /// Audio follows video. `None` unless the device sent a boolean.
    #[serde(rename = "AFV", deserialize_with = "strict_bool")]
    pub afv: Option<bool>,
    /// Volume in `0.0..=1.0`.
    pub volume: Option<f64>,
}

impl Mixer {
    /// Returns the key used to address this channel in orders: the id, or
    /// the name when the id is empty.
    #[must_use]
    pub fn key(&self) -> &str {
        if self.id.is_empty() {
            self.mixer_name.as_deref().unwrap_or_default()
        } else {
            &self.id
        }
    }
}

/// Streaming state.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveStatus {
    /// Whether the device is streaming.
    #[serde(deserialize_with = "lenient_bool")]
    pub living: bool,
    /// Stream start, milliseconds since the Unix epoch.
    pub start_time: Option<i64>,
}

/// Accepts ids sent either as strings or numbers.
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Reads a flag by truthiness: `null`, `0`, `""` and `false` are false,
/// anything else is true.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Keeps a flag only when it is a real boolean.
fn strict_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool())
}

// ============================================================================
// Tests
// ============================================================================
