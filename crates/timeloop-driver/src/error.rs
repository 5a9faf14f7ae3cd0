//! Error types for the driver binary.
//!
//! [`DriverError`] wraps every failure mode of startup, the tick run, and
//! the save/restore cycle so `main` can propagate with `?`.

/// Top-level error for the driver binary.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: timeloop_core::config::ConfigError,
    },

    /// The engine rejected a parameter or definition.
    #[error("loop error: {source}")]
    Loop {
        /// The underlying engine error.
        #[from]
        source: timeloop_core::LoopError,
    },

    /// Saving or loading the game state failed.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: timeloop_core::session::SessionError,
    },

    /// The slot that was just written came back empty.
    #[error("save slot {slot} is empty after saving")]
    MissingSave {
        /// The slot name.
        slot: String,
    },
}
