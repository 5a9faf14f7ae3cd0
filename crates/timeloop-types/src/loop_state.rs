//! Serialized form of the loop engine's timing state.
//!
//! A [`LoopState`] is the only shape of the loop that is ever written to
//! persistent storage. It carries elapsed time, loop duration, time scale,
//! the run flag, and one [`SerializedEvent`] per active event. Event
//! behaviors are never part of it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Loop duration used when seeding a new session, in simulated seconds.
pub const DEFAULT_LOOP_DURATION_SECONDS: f64 = 120.0;

/// Timing-only snapshot of a loop engine.
///
/// Field names are camelCase on the wire and must stay stable: saved games
/// written by earlier builds are read back through this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct LoopState {
    /// Current offset within the loop, in seconds.
    pub elapsed_seconds: f64,
    /// Length of one loop iteration, in seconds.
    pub loop_duration_seconds: f64,
    /// Multiplier applied to every update delta.
    pub time_scale: f64,
    /// Active events in registry order.
    pub events: Vec<SerializedEvent>,
    /// Whether the engine was running when the snapshot was taken.
    pub is_running: bool,
}

impl LoopState {
    /// A stopped loop at offset zero with no events and the default duration.
    pub const fn empty() -> Self {
        Self {
            elapsed_seconds: 0.0,
            loop_duration_seconds: DEFAULT_LOOP_DURATION_SECONDS,
            time_scale: 1.0,
            events: Vec::new(),
            is_running: false,
        }
    }

    /// Ids of the events in this snapshot, in order.
    pub fn event_ids(&self) -> Vec<String> {
        self.events.iter().map(|e| e.id.clone()).collect()
    }
}

impl Default for LoopState {
    fn default() -> Self {
        Self::empty()
    }
}

/// Timing metadata of one scheduled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct SerializedEvent {
    /// Caller-assigned event id, used to re-attach behavior after a restore.
    pub id: String,
    /// Current trigger time within the loop (not the original one).
    pub trigger_time: f64,
    /// Whether the event reschedules itself after firing.
    pub is_repeating: bool,
    /// Seconds added to `triggerTime` after each fire of a repeating event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub repeat_interval: Option<f64>,
    /// Trigger time as first scheduled, when it differs from `triggerTime`.
    ///
    /// Older saves do not carry this field; a missing value means the
    /// current trigger time is also the original one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub original_trigger_time: Option<f64>,
}

impl SerializedEvent {
    /// The trigger time to rewind to on reset.
    pub fn origin(&self) -> f64 {
        self.original_trigger_time.unwrap_or(self.trigger_time)
    }
}
