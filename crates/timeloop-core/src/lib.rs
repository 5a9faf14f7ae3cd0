//! Loop engine, event registry, and state codec for the Timeloop scheduler.
//!
//! A simulated world replays on a fixed cycle. This crate owns the clock of
//! that cycle: it tracks elapsed time under a variable time scale, fires
//! scheduled events in order, handles updates that cross one or more loop
//! boundaries, and converts its timing state to and from a persisted
//! snapshot that never contains behavior.
//!
//! # Modules
//!
//! - [`engine`] -- [`LoopEngine`]: run state, time advance, wraps, firing.
//! - [`registry`] -- [`EventRegistry`] and [`ScheduledEvent`].
//! - [`behavior`] -- The [`EventBehavior`] seam for executable callbacks.
//! - [`definition`] -- Binding content definitions to handlers.
//! - [`codec`] -- Validation, decoding and encoding of persisted state.
//! - [`store`] -- [`StateStore`] persistence capability and [`MemoryStore`].
//! - [`session`] -- Save/load of an engine through codec and store.
//! - [`config`] -- Configuration loading from `timeloop-config.yaml`.
//! - [`error`] -- [`LoopError`] and [`BehaviorError`].
//!
//! [`LoopEngine`]: engine::LoopEngine
//! [`EventRegistry`]: registry::EventRegistry
//! [`ScheduledEvent`]: registry::ScheduledEvent
//! [`EventBehavior`]: behavior::EventBehavior
//! [`StateStore`]: store::StateStore
//! [`MemoryStore`]: store::MemoryStore
//! [`LoopError`]: error::LoopError
//! [`BehaviorError`]: error::BehaviorError

pub mod behavior;
pub mod codec;
pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod registry;
pub mod session;
pub mod store;

pub use behavior::{EventBehavior, NoOpBehavior};
pub use engine::{FirePhase, LoopEngine, UpdateSummary};
pub use error::{BehaviorError, LoopError};
pub use registry::{EventRegistry, Recurrence, RepeatInterval, ScheduledEvent};
