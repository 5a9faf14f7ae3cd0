//! Error types for the loop engine.
//!
//! [`LoopError`] covers rejected engine inputs (durations, time scales,
//! repeat intervals, restored snapshots). [`BehaviorError`] is what an event
//! behavior returns when it fails; the engine logs it and moves on.

/// Errors raised by loop engine operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoopError {
    /// Loop duration must be finite and strictly positive.
    #[error("invalid loop duration: {duration} (must be finite and > 0)")]
    InvalidDuration {
        /// The rejected duration in seconds.
        duration: f64,
    },

    /// Time scale must be finite and not negative.
    #[error("invalid time scale: {scale} (must be finite and >= 0)")]
    InvalidTimeScale {
        /// The rejected multiplier.
        scale: f64,
    },

    /// A repeating event needs a finite, positive interval.
    #[error("invalid repeat interval for {event_id}: {interval:?}")]
    InvalidRepeatInterval {
        /// The event the interval belongs to.
        event_id: String,
        /// The rejected interval, if one was supplied at all.
        interval: Option<f64>,
    },

    /// A snapshot carried values the engine cannot run with.
    #[error("invalid loop state: {reason}")]
    InvalidState {
        /// Explanation of which value was rejected.
        reason: String,
    },

    /// No restored event with this id is waiting for a behavior.
    #[error("no pending event with id {0}")]
    UnknownEvent(String),
}

/// Failure reported by an event behavior while firing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BehaviorError {
    /// The behavior could not complete.
    #[error("behavior failed: {message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },
}

impl BehaviorError {
    /// Shorthand for [`BehaviorError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
