//! Declarative event definitions supplied by the content loader.
//!
//! Definitions arrive already shape-checked. The loop engine binds each one
//! to a behavior; the definition itself is handed back to that behavior on
//! every fire so handlers can read the type tag, position and payload.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vec3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Vec3 {
    /// Construct a point from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A content-defined in-world event (crime, patrol, interaction, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    /// Unique id of the event within its content pack.
    pub id: String,
    /// Offset within the loop at which the event fires, in seconds.
    pub trigger_time: f64,
    /// Free-form type tag interpreted by the bound handler.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Where in the world the event happens, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub position: Option<Vec3>,
    /// Arbitrary handler payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub metadata: Option<serde_json::Value>,
    /// Whether the event repeats within a loop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub repeat: Option<bool>,
    /// Repeat interval in seconds, required when `repeat` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub repeat_interval: Option<f64>,
}

impl EventDefinition {
    /// Whether this definition asks for a repeating event.
    pub fn is_repeating(&self) -> bool {
        self.repeat.unwrap_or(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_definition() {
        let raw = r#"{
            "id": "pickpocket_market",
            "triggerTime": 42.5,
            "type": "crime",
            "position": { "x": 1.0, "y": 0.0, "z": -4.0 },
            "metadata": { "suspect": "npc_07" }
        }"#;
        let def: EventDefinition = serde_json::from_str(raw).unwrap();
        assert_eq!(def.event_type, "crime");
        assert_eq!(def.position, Some(Vec3::new(1.0, 0.0, -4.0)));
        assert!(!def.is_repeating());
        assert_eq!(
            def.metadata
                .as_ref()
                .and_then(|m| m.get("suspect"))
                .and_then(|s| s.as_str()),
            Some("npc_07")
        );
    }

    #[test]
    fn repeat_flag_defaults_to_false() {
        let raw = r#"{ "id": "guard_patrol", "triggerTime": 0, "type": "patrol",
                       "repeat": true, "repeatInterval": 15 }"#;
        let def: EventDefinition = serde_json::from_str(raw).unwrap();
        assert!(def.is_repeating());
        assert_eq!(def.repeat_interval, Some(15.0));
    }
}
