//! The event registry: the in-memory set of scheduled events.
//!
//! Events are kept in insertion order. That order is the firing order for
//! events due in the same pass, so two events with the same trigger time
//! fire in the order they were scheduled. All operations are total; id
//! uniqueness and trigger-time ranges are the caller's business.

use std::fmt;

use timeloop_types::SerializedEvent;

use crate::behavior::EventBehavior;
use crate::error::{BehaviorError, LoopError};

/// A finite, strictly positive repeat interval in seconds.
///
/// Only [`Recurrence::every`] and [`Recurrence::from_parts`] can build one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatInterval(f64);

impl RepeatInterval {
    /// The interval in seconds.
    pub const fn seconds(self) -> f64 {
        self.0
    }
}

/// How an event behaves after it fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recurrence {
    /// Fire once, then stay inactive until the next reset.
    Once,
    /// Fire, then advance the trigger time by this interval.
    Every(RepeatInterval),
}

impl Recurrence {
    /// A repeating schedule with the given interval.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::InvalidRepeatInterval`] unless `interval` is
    /// finite and strictly positive.
    pub fn every(event_id: &str, interval: f64) -> Result<Self, LoopError> {
        if interval.is_finite() && interval > 0.0 {
            Ok(Self::Every(RepeatInterval(interval)))
        } else {
            Err(LoopError::InvalidRepeatInterval {
                event_id: event_id.to_owned(),
                interval: Some(interval),
            })
        }
    }

    /// Build a recurrence from the loose `repeat` / `repeatInterval` pair
    /// used by content definitions and snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::InvalidRepeatInterval`] if `repeat` is set
    /// without a valid interval.
    pub fn from_parts(
        event_id: &str,
        repeat: bool,
        interval: Option<f64>,
    ) -> Result<Self, LoopError> {
        if !repeat {
            return Ok(Self::Once);
        }
        match interval {
            Some(interval) => Self::every(event_id, interval),
            None => Err(LoopError::InvalidRepeatInterval {
                event_id: event_id.to_owned(),
                interval: None,
            }),
        }
    }

    /// Whether the event reschedules itself.
    pub const fn is_repeating(self) -> bool {
        matches!(self, Self::Every(_))
    }

    /// The repeat interval, if any.
    pub const fn interval(self) -> Option<f64> {
        match self {
            Self::Once => None,
            Self::Every(interval) => Some(interval.seconds()),
        }
    }
}

/// A scheduled event: timing data plus its behavior.
pub struct ScheduledEvent<C> {
    id: String,
    trigger_time: f64,
    original_trigger_time: f64,
    recurrence: Recurrence,
    active: bool,
    behavior: Box<dyn EventBehavior<C>>,
}

impl<C> ScheduledEvent<C> {
    /// Caller-assigned id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current trigger time within the loop.
    pub const fn trigger_time(&self) -> f64 {
        self.trigger_time
    }

    /// Trigger time as first scheduled.
    pub const fn original_trigger_time(&self) -> f64 {
        self.original_trigger_time
    }

    /// Repeat configuration.
    pub const fn recurrence(&self) -> Recurrence {
        self.recurrence
    }

    /// Whether the event is eligible to fire.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Run the behavior.
    pub(crate) fn fire(&mut self, context: &mut C) -> Result<(), BehaviorError> {
        self.behavior.fire(context)
    }

    /// Apply the post-fire rule: repeating events advance, one-shots go
    /// inactive.
    pub(crate) fn settle(&mut self) {
        match self.recurrence {
            Recurrence::Every(interval) => self.trigger_time += interval.seconds(),
            Recurrence::Once => self.active = false,
        }
    }

    /// Loop-boundary rewind: reactivate and restore the original trigger time.
    pub(crate) const fn rewind(&mut self) {
        self.active = true;
        if self.recurrence.is_repeating() {
            self.trigger_time = self.original_trigger_time;
        }
    }

    /// Timing-only record of this event.
    pub fn to_serialized(&self) -> SerializedEvent {
        let moved = (self.original_trigger_time - self.trigger_time).abs() > f64::EPSILON;
        SerializedEvent {
            id: self.id.clone(),
            trigger_time: self.trigger_time,
            is_repeating: self.recurrence.is_repeating(),
            repeat_interval: self.recurrence.interval(),
            original_trigger_time: moved.then_some(self.original_trigger_time),
        }
    }
}

impl<C> fmt::Debug for ScheduledEvent<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledEvent")
            .field("id", &self.id)
            .field("trigger_time", &self.trigger_time)
            .field("original_trigger_time", &self.original_trigger_time)
            .field("recurrence", &self.recurrence)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of [`ScheduledEvent`]s.
pub struct EventRegistry<C> {
    events: Vec<ScheduledEvent<C>>,
}

impl<C> EventRegistry<C> {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append a new active event.
    pub fn schedule(
        &mut self,
        id: impl Into<String>,
        trigger_time: f64,
        behavior: Box<dyn EventBehavior<C>>,
        recurrence: Recurrence,
    ) {
        self.schedule_from(id, trigger_time, trigger_time, behavior, recurrence);
    }

    /// Append an event whose current trigger time has already moved away
    /// from its original one (used when re-attaching restored events).
    pub(crate) fn schedule_from(
        &mut self,
        id: impl Into<String>,
        trigger_time: f64,
        original_trigger_time: f64,
        behavior: Box<dyn EventBehavior<C>>,
        recurrence: Recurrence,
    ) {
        self.events.push(ScheduledEvent {
            id: id.into(),
            trigger_time,
            original_trigger_time,
            recurrence,
            active: true,
            behavior,
        });
    }

    /// Delete every event with this id. Returns how many were removed.
    pub fn remove(&mut self, id: &str) -> usize {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        before.saturating_sub(self.events.len())
    }

    /// Delete all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Ids of active events, in registry order.
    pub fn active_ids(&self) -> Vec<String> {
        self.events
            .iter()
            .filter(|e| e.active)
            .map(|e| e.id.clone())
            .collect()
    }

    /// First event with this id.
    pub fn get(&self, id: &str) -> Option<&ScheduledEvent<C>> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Iterate over events in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent<C>> {
        self.events.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ScheduledEvent<C>> {
        self.events.iter_mut()
    }

    /// Reactivate every event and rewind repeating ones.
    pub(crate) fn rewind_all(&mut self) {
        for event in &mut self.events {
            event.rewind();
        }
    }

    /// Number of events, active or not.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the registry holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<C> Default for EventRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for EventRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.events).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::behavior::NoOpBehavior;

    fn registry_with(ids: &[&str]) -> EventRegistry<()> {
        let mut registry = EventRegistry::new();
        for (offset, id) in ids.iter().enumerate() {
            let trigger = f64::from(u32::try_from(offset).unwrap());
            registry.schedule(*id, trigger, Box::new(NoOpBehavior), Recurrence::Once);
        }
        registry
    }

    #[test]
    fn schedule_appends_in_order() {
        let registry = registry_with(&["a", "b", "c"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.active_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn remove_deletes_every_match() {
        let mut registry = registry_with(&["a", "dup", "b", "dup"]);
        assert_eq!(registry.remove("dup"), 2);
        assert_eq!(registry.active_ids(), vec!["a", "b"]);
        assert_eq!(registry.remove("missing"), 0);
    }

    #[test]
    fn clear_empties() {
        let mut registry = registry_with(&["a", "b"]);
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.active_ids().is_empty());
    }

    #[test]
    fn active_ids_skip_settled_one_shots() {
        let mut registry = registry_with(&["a", "b"]);
        if let Some(first) = registry.iter_mut().next() {
            first.settle();
        }
        assert_eq!(registry.active_ids(), vec!["b"]);

        registry.rewind_all();
        assert_eq!(registry.active_ids(), vec!["a", "b"]);
    }

    #[test]
    fn repeating_events_advance_and_rewind() {
        let mut registry: EventRegistry<()> = EventRegistry::new();
        let every = Recurrence::every("patrol", 10.0).unwrap();
        registry.schedule("patrol", 5.0, Box::new(NoOpBehavior), every);

        for event in registry.iter_mut() {
            event.settle();
            event.settle();
        }
        let patrol = registry.get("patrol").unwrap();
        assert!(patrol.is_active());
        assert!((patrol.trigger_time() - 25.0).abs() < f64::EPSILON);

        registry.rewind_all();
        let patrol = registry.get("patrol").unwrap();
        assert!((patrol.trigger_time() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn recurrence_rejects_bad_intervals() {
        assert!(Recurrence::every("x", 0.0).is_err());
        assert!(Recurrence::every("x", -1.0).is_err());
        assert!(Recurrence::every("x", f64::NAN).is_err());
        assert!(Recurrence::from_parts("x", true, None).is_err());
        assert_eq!(Recurrence::from_parts("x", false, None).unwrap(), Recurrence::Once);
        assert_eq!(
            Recurrence::from_parts("x", true, Some(2.5)).unwrap().interval(),
            Some(2.5)
        );
    }

    #[test]
    fn serialized_record_carries_origin_only_when_moved() {
        let mut registry: EventRegistry<()> = EventRegistry::new();
        registry.schedule(
            "patrol",
            5.0,
            Box::new(NoOpBehavior),
            Recurrence::every("patrol", 10.0).unwrap(),
        );
        let fresh = registry.get("patrol").unwrap().to_serialized();
        assert!(fresh.original_trigger_time.is_none());
        assert_eq!(fresh.repeat_interval, Some(10.0));

        for event in registry.iter_mut() {
            event.settle();
        }
        let moved = registry.get("patrol").unwrap().to_serialized();
        assert_eq!(moved.original_trigger_time, Some(5.0));
        assert!((moved.trigger_time - 15.0).abs() < f64::EPSILON);
    }
}
