//! Headless update driver for the Timeloop scheduler.
//!
//! Plays the part of the game's render/update loop without a renderer:
//!
//! 1. Load configuration from `timeloop-config.yaml` (or defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Create the loop engine and bind the configured event definitions
//! 4. Tick the engine with a fixed delta for the configured number of ticks
//! 5. Save the game state into an in-memory store
//! 6. Restore it into a fresh engine and re-attach behaviors by event id

mod error;
mod scenario;

use std::path::{Path, PathBuf};

use timeloop_core::config::LoopConfig;
use timeloop_core::session;
use timeloop_core::store::MemoryStore;
use timeloop_core::{LoopEngine, NoOpBehavior, definition};
use timeloop_types::GameState;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::DriverError;
use crate::scenario::TownContext;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "timeloop-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, engine setup, or the save/restore
/// cycle fails.
fn main() -> Result<(), DriverError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        loop_duration = config.timing.duration_seconds,
        time_scale = config.timing.time_scale,
        tick_seconds = config.driver.tick_seconds,
        ticks = config.driver.ticks,
        events = config.events.len(),
        "timeloop-driver starting"
    );

    // 3. Create the engine and bind definitions.
    let mut engine = build_engine(&config)?;
    if config.timing.start_running {
        engine.start();
    }

    // 4. Run the ticks.
    let mut context = TownContext::default();
    let mut fired: usize = 0;
    let mut failures: usize = 0;
    for _ in 0..config.driver.ticks {
        let summary = engine.update(config.driver.tick_seconds, &mut context);
        context.loop_iteration = engine.loop_count();
        fired = fired.saturating_add(summary.fired.len());
        failures = failures.saturating_add(summary.failures.len());
    }
    info!(
        elapsed = engine.elapsed(),
        loops = engine.loop_count(),
        fired,
        failures,
        crimes = context.crimes,
        patrols = context.patrols,
        interactions = context.interactions,
        "Tick run complete"
    );

    // 5. Save.
    let slot = config.driver.save_slot.as_str();
    let mut store = MemoryStore::new();
    let saved = session::save_game(&engine, &mut store, slot, &GameState::empty())?;
    match serde_json::to_string_pretty(&saved.loop_manager) {
        Ok(document) => debug!(slot, document, "Saved loop state"),
        Err(err) => warn!(slot, error = %err, "Could not render saved loop state"),
    }

    // 6. Restore into a fresh engine and re-attach behaviors.
    let mut restored: LoopEngine<TownContext> =
        LoopEngine::new(config.timing.duration_seconds, config.timing.time_scale)?;
    if session::load_game(&mut restored, &store, slot)?.is_none() {
        return Err(DriverError::MissingSave {
            slot: slot.to_owned(),
        });
    }
    reattach_all(&mut restored, &config)?;

    info!(
        elapsed = restored.elapsed(),
        running = restored.is_running(),
        events = restored.registry().len(),
        matches_saved = restored.serialize() == saved.loop_manager,
        "Restore complete"
    );
    Ok(())
}

/// Load configuration from `TIMELOOP_CONFIG` or the default path.
///
/// Falls back to defaults (with environment overrides) if the file does
/// not exist.
fn load_config() -> Result<LoopConfig, DriverError> {
    let path = std::env::var("TIMELOOP_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    load_config_from(&path)
}

fn load_config_from(path: &Path) -> Result<LoopConfig, DriverError> {
    if path.exists() {
        Ok(LoopConfig::from_file(path)?)
    } else {
        let mut config = LoopConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

/// Create an engine from config and schedule every configured definition.
fn build_engine(config: &LoopConfig) -> Result<LoopEngine<TownContext>, DriverError> {
    let mut engine = LoopEngine::new(config.timing.duration_seconds, config.timing.time_scale)?;
    for event in &config.events {
        engine.schedule_definition(event.clone(), scenario::handle)?;
    }
    Ok(engine)
}

/// Re-bind behaviors to every restored event by id.
///
/// Events no longer present in the configuration keep their timing but get
/// a no-op behavior.
fn reattach_all(
    engine: &mut LoopEngine<TownContext>,
    config: &LoopConfig,
) -> Result<(), DriverError> {
    for id in engine.pending_ids() {
        match config.events.iter().find(|event| event.id == id) {
            Some(event) => {
                engine.reattach_boxed(&id, definition::bind(event.clone(), scenario::handle))?;
            }
            None => {
                warn!(event_id = id, "No definition for restored event, attaching no-op");
                engine.reattach_boxed(&id, Box::new(NoOpBehavior))?;
            }
        }
    }
    Ok(())
}
