//! Binding declarative event definitions to behaviors.
//!
//! The content loader hands over [`EventDefinition`]s that are already
//! shape-checked. Binding wraps a handler so that on every fire it sees
//! both the render/update context and the definition it was bound from.

use timeloop_types::EventDefinition;

use crate::behavior::EventBehavior;
use crate::error::{BehaviorError, LoopError};
use crate::registry::Recurrence;

/// Recurrence requested by a definition.
///
/// # Errors
///
/// Returns [`LoopError::InvalidRepeatInterval`] if `repeat` is set without
/// a positive `repeatInterval`.
pub fn recurrence_of(definition: &EventDefinition) -> Result<Recurrence, LoopError> {
    Recurrence::from_parts(
        &definition.id,
        definition.is_repeating(),
        definition.repeat_interval,
    )
}

/// Wrap `handler` into a behavior that owns `definition`.
pub fn bind<C, F>(definition: EventDefinition, mut handler: F) -> Box<dyn EventBehavior<C>>
where
    C: 'static,
    F: FnMut(&mut C, &EventDefinition) -> Result<(), BehaviorError> + 'static,
{
    Box::new(move |context: &mut C| handler(context, &definition))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use timeloop_types::Vec3;

    use super::*;
    use crate::engine::LoopEngine;

    fn definition(id: &str, trigger_time: f64, event_type: &str) -> EventDefinition {
        EventDefinition {
            id: id.to_owned(),
            trigger_time,
            event_type: event_type.to_owned(),
            position: None,
            metadata: None,
            repeat: None,
            repeat_interval: None,
        }
    }

    #[test]
    fn handler_sees_definition() {
        let mut def = definition("mugging", 2.0, "crime");
        def.position = Some(Vec3::new(3.0, 0.0, 1.0));

        let mut behavior = bind(def, |log: &mut Vec<String>, def: &EventDefinition| {
            log.push(format!("{}:{}", def.event_type, def.id));
            Ok(())
        });
        let mut log = Vec::new();
        behavior.fire(&mut log).unwrap();
        assert_eq!(log, vec!["crime:mugging"]);
    }

    #[test]
    fn repeat_without_interval_is_rejected() {
        let mut def = definition("patrol", 0.0, "patrol");
        def.repeat = Some(true);
        assert!(recurrence_of(&def).is_err());

        def.repeat_interval = Some(15.0);
        assert_eq!(recurrence_of(&def).unwrap().interval(), Some(15.0));
    }

    #[test]
    fn engine_schedules_definitions() {
        let mut engine: LoopEngine<Vec<String>> = LoopEngine::new(30.0, 1.0).unwrap();
        let mut patrol = definition("patrol", 5.0, "patrol");
        patrol.repeat = Some(true);
        patrol.repeat_interval = Some(10.0);

        engine
            .schedule_definition(patrol, |log: &mut Vec<String>, def: &EventDefinition| {
                log.push(def.id.clone());
                Ok(())
            })
            .unwrap();
        engine.start();

        let mut log = Vec::new();
        engine.update(6.0, &mut log);
        engine.update(10.0, &mut log);
        assert_eq!(log, vec!["patrol", "patrol"]);
        let event = engine.registry().get("patrol").unwrap();
        assert!((event.trigger_time() - 25.0).abs() < 1e-9);
    }
}
