//! In-world reactions to fired events.
//!
//! Stands in for the game's render/update layer: each fired definition is
//! routed by its type tag and tallied in a [`TownContext`].

use timeloop_core::BehaviorError;
use timeloop_types::EventDefinition;
use tracing::info;

/// Render/update context handed to every behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TownContext {
    /// Completed loop iterations, refreshed by the driver after each update.
    pub loop_iteration: u64,
    /// Crimes staged so far.
    pub crimes: u32,
    /// Patrol steps taken so far.
    pub patrols: u32,
    /// NPC interactions played so far.
    pub interactions: u32,
}

/// Route a fired definition by its `type` tag.
///
/// # Errors
///
/// Returns [`BehaviorError`] for a type tag this scenario does not know.
pub fn handle(context: &mut TownContext, definition: &EventDefinition) -> Result<(), BehaviorError> {
    let counter = match definition.event_type.as_str() {
        "crime" => &mut context.crimes,
        "patrol" => &mut context.patrols,
        "interaction" => &mut context.interactions,
        other => {
            return Err(BehaviorError::failed(format!(
                "no handler for event type {other}"
            )));
        }
    };
    *counter = counter.saturating_add(1);

    info!(
        event_id = definition.id,
        event_type = definition.event_type,
        loop_iteration = context.loop_iteration,
        position = ?definition.position,
        "Event played"
    );
    Ok(())
}
