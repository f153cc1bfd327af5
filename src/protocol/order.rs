//! Orders: named commands that change device state.
//!
//! Every order travels as one envelope posted to
//! [`POST_ORDER`](super::paths::POST_ORDER):
//!
//! ```json
//! { "orderID": "order_live_status", "data": { "status": "start" } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// OrderEnvelope
// ============================================================================

/// Wire envelope of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEnvelope {
    /// Order name, e.g. `order_director_change`.
    #[serde(rename = "orderID")]
    pub order_id: String,

    /// Order arguments. Always an object on the wire.
    pub data: Value,
}

impl OrderEnvelope {
    /// Builds an envelope, defaulting missing data to `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `order_id` is empty.
    pub fn new(order_id: impl Into<String>, data: Option<Value>) -> Result<Self> {
        let order_id = order_id.into();
        if order_id.is_empty() {
            return Err(Error::invalid_argument("orderId is required"));
        }

        let data = match data {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(value) => value,
        };

        Ok(Self { order_id, data })
    }
}

// ============================================================================
// Order
// ============================================================================

/// Typed orders understood by the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "orderID", content = "data")]
pub enum Order {
    /// Put a source on program.
    #[serde(rename = "order_director_change")]
    DirectorChange {
        /// Director (source) id.
        id: String,
        /// Whether it is selected.
        #[serde(rename = "isSelected")]
        is_selected: bool,
    },

    /// Show or hide an overlay.
    #[serde(rename = "order_material_change")]
    MaterialChange {
        /// Material (overlay) id.
        id: String,
        /// Whether it is shown.
        #[serde(rename = "isSelected")]
        is_selected: bool,
    },

    /// Adjust an audio channel.
    #[serde(rename = "order_mixer_change")]
    MixerChange(MixerChange),

    /// Start or stop streaming.
    #[serde(rename = "order_live_status")]
    LiveStatus {
        /// Desired streaming state.
        status: LiveAction,
    },

    /// Switch the tab shown on the device screen.
    #[serde(rename = "order_tab_change")]
    TabChange {
        /// Tab index.
        id: u32,
    },
}

impl Order {
    /// Returns the order name used in the envelope.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::DirectorChange { .. } => "order_director_change",
            Self::MaterialChange { .. } => "order_material_change",
            Self::MixerChange(_) => "order_mixer_change",
            Self::LiveStatus { .. } => "order_live_status",
            Self::TabChange { .. } => "order_tab_change",
        }
    }

    /// Converts the order into its wire envelope.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if a mixer change has no channel or a
    ///   volume that is not a number
    /// - [`Error::Json`] if serialization fails
    pub fn to_envelope(&self) -> Result<OrderEnvelope> {
        if let Self::MixerChange(change) = self {
            change.validate()?;
        }

        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Returns the order's data object.
    ///
    /// # Errors
    ///
    /// Same as [`Order::to_envelope`].
    pub fn data(&self) -> Result<Value> {
        Ok(self.to_envelope()?.data)
    }

    /// Shorthand for a live status order.
    #[inline]
    #[must_use]
    pub const fn live(status: LiveAction) -> Self {
        Self::LiveStatus { status }
    }
}

// ============================================================================
// LiveAction
// ============================================================================

/// Streaming state requested by [`Order::LiveStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveAction {
    /// Go live.
    Start,
    /// Stop streaming.
    Stop,
}

impl LiveAction {
    /// Returns the action that flips the given live state.
    #[inline]
    #[must_use]
    pub const fn toggle_from(is_live: bool) -> Self {
        if is_live { Self::Stop } else { Self::Start }
    }
}

// ============================================================================
// MixerChange
// ============================================================================

/// Arguments of an audio channel change. Unset fields are left as they are.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixerChange {
    /// Mixer id (or name, for channels without an id).
    pub id: String,

    /// Volume in `0.0..=1.0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,

    /// Channel on/off.
    #[serde(rename = "isSelected", skip_serializing_if = "Option::is_none")]
    pub is_selected: Option<bool>,

    /// Audio follows video.
    #[serde(rename = "AFV", skip_serializing_if = "Option::is_none")]
    pub afv: Option<bool>,
}

impl MixerChange {
    /// Creates a change that touches nothing yet.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            volume: None,
            is_selected: None,
            afv: None,
        }
    }

    /// Sets the volume from a percentage, clamped to `0..=100` and scaled to
    /// three decimals. A NaN percentage is kept and rejected when the order
    /// is built.
    #[must_use]
    pub fn with_volume_percent(mut self, percent: f64) -> Self {
        let scaled = percent.clamp(0.0, 100.0) / 100.0;
        self.volume = Some((scaled * 1000.0).round() / 1000.0);
        self
    }

    /// Turns the channel on or off.
    #[inline]
    #[must_use]
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.is_selected = Some(selected);
        self
    }

    /// Enables or disables audio-follows-video.
    #[inline]
    #[must_use]
    pub fn with_afv(mut self, afv: bool) -> Self {
        self.afv = Some(afv);
        self
    }

    /// Checks that the change names a channel and carries a usable volume.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::invalid_argument("No audio channel selected"));
        }
        if self.volume.is_some_and(|v| !v.is_finite()) {
            return Err(Error::invalid_argument("Invalid volume value"));
        }
        Ok(())
    }
}

impl From<MixerChange> for Order {
    fn from(change: MixerChange) -> Self {
        Self::MixerChange(change)
    }
}

// ============================================================================
// Tests
// ============================================================================
