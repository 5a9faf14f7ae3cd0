//! Shared serialized shapes for the Timeloop scheduler.
//!
//! Everything in this crate is plain data: it is what gets written to and
//! read back from persistent storage. Types flow downstream to `TypeScript`
//! via `ts-rs` for the game client.
//!
//! # Modules
//!
//! - [`loop_state`] -- [`LoopState`] and [`SerializedEvent`], the timing-only
//!   snapshot of the loop engine
//! - [`definition`] -- Declarative [`EventDefinition`] records from content
//! - [`game_state`] -- The full [`GameState`] document and its subsystem blocks

pub mod definition;
pub mod game_state;
pub mod loop_state;

pub use definition::{EventDefinition, Vec3};
pub use game_state::{
    DayNightCycleState, DoorManagerState, DoorState, GAME_STATE_VERSION, GameState,
    HourlyCycleState, NpcManagerState, NpcState, PhotoAlbumState, PhotoRecord,
};
pub use loop_state::{DEFAULT_LOOP_DURATION_SECONDS, LoopState, SerializedEvent};
