//! Save and load of a loop engine through the codec and a store.
//!
//! Saving stamps a [`GameState`] with the engine's current [`LoopState`],
//! encodes it, and writes it to the injected [`StateStore`]. Loading reads
//! the document back, validates it before trusting it, and restores the
//! engine. Behaviors are not restored: the caller re-attaches them using
//! [`LoopEngine::pending_ids`].

use chrono::Utc;
use timeloop_types::GameState;
use tracing::info;

use crate::codec::{self, CodecError};
use crate::engine::LoopEngine;
use crate::error::LoopError;
use crate::store::{StateStore, StoreError};

/// Errors from a save or load operation.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The storage backend failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The document failed validation or encoding.
    #[error("codec error: {source}")]
    Codec {
        /// The underlying codec error.
        #[from]
        source: CodecError,
    },

    /// The engine refused the restored loop state.
    #[error("loop error: {source}")]
    Loop {
        /// The underlying engine error.
        #[from]
        source: LoopError,
    },
}

/// Copy `base` with the engine's loop state and a fresh timestamp.
pub fn snapshot<C>(engine: &LoopEngine<C>, base: &GameState) -> GameState {
    GameState {
        timestamp: Utc::now().timestamp_millis(),
        loop_manager: engine.serialize(),
        ..base.clone()
    }
}

/// Snapshot the engine into `slot`. Returns the document that was written.
///
/// # Errors
///
/// Returns [`SessionError::Codec`] if the state cannot be encoded, or
/// [`SessionError::Store`] if the write fails.
pub fn save_game<C, S>(
    engine: &LoopEngine<C>,
    store: &mut S,
    slot: &str,
    base: &GameState,
) -> Result<GameState, SessionError>
where
    S: StateStore + ?Sized,
{
    let state = snapshot(engine, base);
    let document = codec::encode(&state)?;
    store.save(slot, &document)?;
    info!(
        slot,
        events = state.loop_manager.events.len(),
        elapsed = state.loop_manager.elapsed_seconds,
        "Game saved"
    );
    Ok(state)
}

/// Restore the engine from `slot`. Returns the full document, or `None` if
/// the slot is empty (the engine is untouched in that case).
///
/// # Errors
///
/// Returns [`SessionError::Codec`] if the document fails validation,
/// [`SessionError::Loop`] if the engine refuses its timing values, or
/// [`SessionError::Store`] if the read fails.
pub fn load_game<C, S>(
    engine: &mut LoopEngine<C>,
    store: &S,
    slot: &str,
) -> Result<Option<GameState>, SessionError>
where
    S: StateStore + ?Sized,
{
    let Some(document) = store.load(slot)? else {
        return Ok(None);
    };
    let state = codec::decode_str(&document)?;
    engine.deserialize(&state.loop_manager)?;
    info!(slot, pending = engine.pending_ids().len(), "Game loaded");
    Ok(Some(state))
}
