//! The full persisted game-state document.
//!
//! The loop engine owns only the `loopManager` block. The sibling blocks
//! belong to other subsystems (NPCs, doors, photos, day/night and hourly
//! cycles); they are carried here so the whole document can be validated
//! and round-tripped as one unit.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::definition::Vec3;
use crate::loop_state::{DEFAULT_LOOP_DURATION_SECONDS, LoopState};

/// Version string written into every new game-state document.
pub const GAME_STATE_VERSION: &str = "1.0.0";

/// Number of in-world hours in one loop.
const HOURS_PER_LOOP: f64 = 24.0;

/// Top-level persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Document format version.
    pub version: String,
    /// Save time in milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub timestamp: i64,
    /// Loop engine timing state.
    pub loop_manager: LoopState,
    /// NPC positions and behavior states.
    pub npcs: NpcManagerState,
    /// Door open/locked flags.
    pub doors: DoorManagerState,
    /// Photos taken by the player.
    pub photos: PhotoAlbumState,
    /// Day/night lighting cycle.
    pub day_night_cycle: DayNightCycleState,
    /// In-world clock hours.
    pub hourly_cycle: HourlyCycleState,
}

impl GameState {
    /// A fresh document stamped with the current time.
    pub fn empty() -> Self {
        Self::empty_at(Utc::now().timestamp_millis())
    }

    /// A fresh document with an explicit timestamp.
    pub fn empty_at(timestamp: i64) -> Self {
        Self {
            version: GAME_STATE_VERSION.to_owned(),
            timestamp,
            loop_manager: LoopState::empty(),
            npcs: NpcManagerState::default(),
            doors: DoorManagerState::default(),
            photos: PhotoAlbumState::default(),
            day_night_cycle: DayNightCycleState::default(),
            hourly_cycle: HourlyCycleState::default(),
        }
    }
}

/// NPC block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NpcManagerState {
    /// One entry per spawned NPC.
    pub npcs: Vec<NpcState>,
}

/// Persisted state of a single NPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct NpcState {
    /// NPC id.
    pub id: String,
    /// World position.
    pub position: Vec3,
    /// Heading around the vertical axis, in radians.
    pub rotation: f64,
    /// Index of the waypoint the NPC is walking towards.
    pub current_waypoint: u32,
    /// Behavior state tag (idle, walking, fleeing, ...).
    pub state: String,
}

/// Door block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DoorManagerState {
    /// One entry per door in the scene.
    pub doors: Vec<DoorState>,
}

/// Persisted state of a single door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct DoorState {
    /// Door id.
    pub id: String,
    /// Whether the door is open.
    pub is_open: bool,
    /// Whether the door is locked.
    pub is_locked: bool,
}

/// Photo block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PhotoAlbumState {
    /// Photos in the order they were taken.
    pub photos: Vec<PhotoRecord>,
}

/// Metadata of one photo taken in-world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    /// Photo id.
    pub id: String,
    /// Loop offset at which the photo was taken.
    pub taken_at_seconds: f64,
    /// Loop iteration in which the photo was taken.
    pub loop_iteration: u32,
    /// Ids of the NPCs or objects captured in frame.
    pub subject_ids: Vec<String>,
}

/// Day/night block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct DayNightCycleState {
    /// Offset within the lighting cycle, in seconds.
    pub current_time: f64,
    /// Length of one lighting cycle, in seconds.
    pub cycle_duration_seconds: f64,
    /// Whether the lighting cycle is frozen.
    pub is_paused: bool,
}

impl Default for DayNightCycleState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            cycle_duration_seconds: DEFAULT_LOOP_DURATION_SECONDS,
            is_paused: false,
        }
    }
}

/// Hourly clock block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct HourlyCycleState {
    /// Hour currently shown on in-world clocks.
    pub current_hour: u32,
    /// Simulated seconds per in-world hour.
    pub hour_duration_seconds: f64,
    /// Hour shown at loop offset zero.
    pub start_hour: u32,
}

impl Default for HourlyCycleState {
    fn default() -> Self {
        Self {
            current_hour: 0,
            hour_duration_seconds: DEFAULT_LOOP_DURATION_SECONDS / HOURS_PER_LOOP,
            start_hour: 0,
        }
    }
}
