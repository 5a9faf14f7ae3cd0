//! The loop engine: elapsed time, wraps, and event firing.
//!
//! Each [`LoopEngine::update`] call runs through these steps:
//!
//! 1. **Advance** -- scale the caller's delta by the time scale and add it
//!    to elapsed time. Stopped engines ignore the call.
//!
//! 2. **Wrap** -- while elapsed time has reached the loop duration, fire
//!    every active event still due in the finishing iteration, rewind the
//!    registry (reactivate everything, restore repeating trigger times),
//!    and carry the overflow into the next iteration. A single call can
//!    wrap any number of times.
//!
//! 3. **Settle** -- fire active events whose trigger time has been reached
//!    in the current iteration.
//!
//! Firing the finishing iteration before the rewind is what keeps an event
//! near the end of the loop from being lost when a large delta jumps over
//! it. Behavior failures are logged per event and never abort the update.

use std::fmt;

use timeloop_types::{EventDefinition, LoopState, SerializedEvent};
use tracing::{debug, info, warn};

use crate::behavior::EventBehavior;
use crate::definition;
use crate::error::{BehaviorError, LoopError};
use crate::registry::{EventRegistry, Recurrence};

/// Upper bound on wraps resolved one by one inside a single update.
///
/// Beyond this the remaining iterations are folded with a modulo and their
/// events are skipped, so a pathological delta cannot stall the caller.
pub const MAX_WRAPS_PER_UPDATE: u32 = 10_000;

/// Which pass of an update fired an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirePhase {
    /// The finishing iteration, just before a wrap.
    Wrap,
    /// The current iteration, after all wraps.
    Normal,
}

impl fmt::Display for FirePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wrap => f.write_str("wrap"),
            Self::Normal => f.write_str("normal"),
        }
    }
}

/// What happened during one update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSummary {
    /// Number of loop boundaries crossed.
    pub wraps: u32,
    /// Ids of fired events, in firing order (an id repeats if it fired more
    /// than once).
    pub fired: Vec<String>,
    /// Ids of events whose behavior failed, in firing order.
    pub failures: Vec<String>,
}

impl UpdateSummary {
    /// How many times the given event fired.
    pub fn fire_count(&self, id: &str) -> usize {
        self.fired.iter().filter(|fired| *fired == id).count()
    }
}

/// Repeating time loop that fires scheduled events.
///
/// `C` is the render/update context passed through to event behaviors.
pub struct LoopEngine<C> {
    elapsed: f64,
    loop_duration: f64,
    time_scale: f64,
    running: bool,
    loop_count: u64,
    registry: EventRegistry<C>,
    /// Restored events still waiting for a behavior.
    pending: Vec<SerializedEvent>,
}

impl<C> LoopEngine<C> {
    /// Create a stopped engine at elapsed time zero.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::InvalidDuration`] or
    /// [`LoopError::InvalidTimeScale`] for out-of-range parameters.
    pub fn new(loop_duration: f64, time_scale: f64) -> Result<Self, LoopError> {
        check_duration(loop_duration)?;
        check_time_scale(time_scale)?;
        Ok(Self {
            elapsed: 0.0,
            loop_duration,
            time_scale,
            running: false,
            loop_count: 0,
            registry: EventRegistry::new(),
            pending: Vec::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Run state
    // -----------------------------------------------------------------------

    /// Begin advancing time on [`update`](Self::update).
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            info!(elapsed = self.elapsed, "Time loop started");
        }
    }

    /// Stop advancing time. Elapsed time is kept.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!(elapsed = self.elapsed, "Time loop stopped");
        }
    }

    /// Whether updates currently advance time.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Rewind to the start of the loop: elapsed time zero, every event
    /// active again, repeating events back at their original trigger time.
    /// The run state is left as it is.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.registry.rewind_all();
        info!(events = self.registry.len(), "Time loop reset");
    }

    // -----------------------------------------------------------------------
    // Timing
    // -----------------------------------------------------------------------

    /// Current offset within the loop, in seconds.
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Length of one loop iteration, in seconds.
    pub const fn loop_duration(&self) -> f64 {
        self.loop_duration
    }

    /// Multiplier applied to update deltas.
    pub const fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Change the time scale. Zero freezes time while staying running.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::InvalidTimeScale`] for negative or non-finite
    /// values.
    pub fn set_time_scale(&mut self, scale: f64) -> Result<(), LoopError> {
        check_time_scale(scale)?;
        self.time_scale = scale;
        debug!(scale, "Time scale changed");
        Ok(())
    }

    /// Number of loop boundaries crossed since this engine was created.
    pub const fn loop_count(&self) -> u64 {
        self.loop_count
    }

    /// Fraction of the current iteration that has passed, in `[0, 1)`.
    pub fn progress(&self) -> f64 {
        self.elapsed / self.loop_duration
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Schedule a closure to run at `trigger_time` within the loop.
    pub fn schedule_event<F>(
        &mut self,
        id: impl Into<String>,
        trigger_time: f64,
        behavior: F,
        recurrence: Recurrence,
    ) where
        F: FnMut(&mut C) -> Result<(), BehaviorError> + 'static,
    {
        self.schedule_boxed(id, trigger_time, Box::new(behavior), recurrence);
    }

    /// Schedule an already boxed behavior.
    pub fn schedule_boxed(
        &mut self,
        id: impl Into<String>,
        trigger_time: f64,
        behavior: Box<dyn EventBehavior<C>>,
        recurrence: Recurrence,
    ) {
        let id = id.into();
        debug!(event_id = %id, trigger_time, ?recurrence, "Event scheduled");
        self.registry.schedule(id, trigger_time, behavior, recurrence);
    }

    /// Bind a content definition to a handler and schedule it.
    ///
    /// The handler receives the context and the definition on every fire.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::InvalidRepeatInterval`] if the definition asks
    /// to repeat without a valid interval.
    pub fn schedule_definition<F>(
        &mut self,
        definition: EventDefinition,
        handler: F,
    ) -> Result<(), LoopError>
    where
        F: FnMut(&mut C, &EventDefinition) -> Result<(), BehaviorError> + 'static,
        C: 'static,
    {
        let recurrence = definition::recurrence_of(&definition)?;
        let id = definition.id.clone();
        let trigger_time = definition.trigger_time;
        let behavior = definition::bind(definition, handler);
        self.schedule_boxed(id, trigger_time, behavior, recurrence);
        Ok(())
    }

    /// Delete every event with this id, including restored events still
    /// waiting for a behavior. Returns how many were removed.
    pub fn remove_event(&mut self, id: &str) -> usize {
        let before = self.pending.len();
        self.pending.retain(|e| e.id != id);
        let removed = self
            .registry
            .remove(id)
            .saturating_add(before.saturating_sub(self.pending.len()));
        debug!(event_id = id, removed, "Event removed");
        removed
    }

    /// Delete all events, including restored ones waiting for a behavior.
    pub fn clear_events(&mut self) {
        self.registry.clear();
        self.pending.clear();
    }

    /// Read access to the scheduled events.
    pub const fn registry(&self) -> &EventRegistry<C> {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Advance the loop by `delta_seconds` of caller time and fire due
    /// events, passing `context` to each behavior.
    ///
    /// Stopped engines and negative or non-finite deltas leave all state
    /// untouched and return an empty summary.
    pub fn update(&mut self, delta_seconds: f64, context: &mut C) -> UpdateSummary {
        let mut summary = UpdateSummary::default();
        if !self.running {
            return summary;
        }

        let scaled = delta_seconds * self.time_scale;
        if !delta_seconds.is_finite() || delta_seconds < 0.0 || !scaled.is_finite() {
            warn!(delta_seconds, time_scale = self.time_scale, "Ignoring unusable delta");
            return summary;
        }
        self.elapsed += scaled;

        while self.elapsed >= self.loop_duration {
            if summary.wraps >= MAX_WRAPS_PER_UPDATE {
                let skipped = whole_iterations(self.elapsed / self.loop_duration);
                warn!(
                    wraps = summary.wraps,
                    skipped, "Wrap limit reached, folding remaining iterations"
                );
                self.elapsed = self.elapsed.rem_euclid(self.loop_duration);
                self.registry.rewind_all();
                self.loop_count = self.loop_count.saturating_add(skipped);
                summary.wraps = summary
                    .wraps
                    .saturating_add(u32::try_from(skipped).unwrap_or(u32::MAX));
                break;
            }

            self.fire_due(FirePhase::Wrap, context, &mut summary);

            let overflow = self.elapsed - self.loop_duration;
            self.registry.rewind_all();
            self.elapsed = overflow;
            self.loop_count = self.loop_count.saturating_add(1);
            summary.wraps = summary.wraps.saturating_add(1);
            debug!(loop_count = self.loop_count, overflow, "Loop wrapped");
        }

        self.fire_due(FirePhase::Normal, context, &mut summary);
        summary
    }

    /// Fire every active event due in this phase, once, in registry order.
    fn fire_due(&mut self, phase: FirePhase, context: &mut C, summary: &mut UpdateSummary) {
        let elapsed = self.elapsed;
        let loop_duration = self.loop_duration;

        for event in self.registry.iter_mut() {
            if !event.is_active() {
                continue;
            }
            let due = match phase {
                FirePhase::Wrap => event.trigger_time() < loop_duration,
                FirePhase::Normal => event.trigger_time() <= elapsed,
            };
            if !due {
                continue;
            }

            if let Err(err) = event.fire(context) {
                warn!(event_id = event.id(), %phase, error = %err, "Event behavior failed");
                summary.failures.push(event.id().to_owned());
            }
            summary.fired.push(event.id().to_owned());
            event.settle();
        }
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Timing-only snapshot: active events with their current trigger
    /// times, followed by restored events still waiting for a behavior.
    pub fn serialize(&self) -> LoopState {
        let events = self
            .registry
            .iter()
            .filter(|e| e.is_active())
            .map(crate::registry::ScheduledEvent::to_serialized)
            .chain(self.pending.iter().cloned())
            .collect();

        LoopState {
            elapsed_seconds: self.elapsed,
            loop_duration_seconds: self.loop_duration,
            time_scale: self.time_scale,
            events,
            is_running: self.running,
        }
    }

    /// Replace the engine's timing state with a snapshot.
    ///
    /// The registry is cleared. The snapshot's events are held as records
    /// without behavior until [`reattach`](Self::reattach) binds one;
    /// [`serialized_event_ids`](Self::serialized_event_ids) lists them.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError`] if the snapshot's duration, time scale, elapsed
    /// time or any event's timing is unusable. The engine is unchanged on
    /// error.
    pub fn deserialize(&mut self, state: &LoopState) -> Result<(), LoopError> {
        check_duration(state.loop_duration_seconds)?;
        check_time_scale(state.time_scale)?;
        if !state.elapsed_seconds.is_finite() || state.elapsed_seconds < 0.0 {
            return Err(LoopError::InvalidState {
                reason: format!(
                    "elapsedSeconds {} is not a finite value >= 0",
                    state.elapsed_seconds
                ),
            });
        }
        for event in &state.events {
            check_record(event)?;
        }

        self.elapsed = state.elapsed_seconds;
        self.loop_duration = state.loop_duration_seconds;
        self.time_scale = state.time_scale;
        self.running = state.is_running;
        self.registry.clear();
        self.pending.clone_from(&state.events);

        info!(
            elapsed = self.elapsed,
            loop_duration = self.loop_duration,
            pending = self.pending.len(),
            "Time loop restored"
        );
        Ok(())
    }

    /// Ids of every event a [`serialize`](Self::serialize) would write.
    ///
    /// Right after [`deserialize`](Self::deserialize) these are exactly the
    /// events that need a behavior re-attached.
    pub fn serialized_event_ids(&self) -> Vec<String> {
        let mut ids = self.registry.active_ids();
        ids.extend(self.pending.iter().map(|e| e.id.clone()));
        ids
    }

    /// Ids of restored events still waiting for a behavior.
    pub fn pending_ids(&self) -> Vec<String> {
        self.pending.iter().map(|e| e.id.clone()).collect()
    }

    /// Bind a behavior to a restored event and put it back on the schedule
    /// with its saved timing.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::UnknownEvent`] if no restored event with this id
    /// is pending.
    pub fn reattach<F>(&mut self, id: &str, behavior: F) -> Result<(), LoopError>
    where
        F: FnMut(&mut C) -> Result<(), BehaviorError> + 'static,
    {
        self.reattach_boxed(id, Box::new(behavior))
    }

    /// [`reattach`](Self::reattach) for an already boxed behavior.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::UnknownEvent`] if no restored event with this id
    /// is pending.
    pub fn reattach_boxed(
        &mut self,
        id: &str,
        behavior: Box<dyn EventBehavior<C>>,
    ) -> Result<(), LoopError> {
        let position = self
            .pending
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| LoopError::UnknownEvent(id.to_owned()))?;
        let recurrence = self.pending.get(position).map_or(Ok(Recurrence::Once), |record| {
            Recurrence::from_parts(&record.id, record.is_repeating, record.repeat_interval)
        })?;
        let record = self.pending.remove(position);
        let origin = record.origin();
        debug!(event_id = id, trigger_time = record.trigger_time, "Event re-attached");
        self.registry
            .schedule_from(record.id, record.trigger_time, origin, behavior, recurrence);
        Ok(())
    }
}

impl<C> fmt::Debug for LoopEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopEngine")
            .field("elapsed", &self.elapsed)
            .field("loop_duration", &self.loop_duration)
            .field("time_scale", &self.time_scale)
            .field("running", &self.running)
            .field("loop_count", &self.loop_count)
            .field("registry", &self.registry)
            .field("pending", &self.pending)
            .finish()
    }
}

/// Whole loop iterations in `ratio`, saturating at `u64::MAX`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_iterations(ratio: f64) -> u64 {
    // Float-to-int `as` saturates and maps NaN to zero.
    ratio.floor() as u64
}

fn check_duration(duration: f64) -> Result<(), LoopError> {
    if duration.is_finite() && duration > 0.0 {
        Ok(())
    } else {
        Err(LoopError::InvalidDuration { duration })
    }
}

fn check_time_scale(scale: f64) -> Result<(), LoopError> {
    if scale.is_finite() && scale >= 0.0 {
        Ok(())
    } else {
        Err(LoopError::InvalidTimeScale { scale })
    }
}

fn check_record(event: &SerializedEvent) -> Result<(), LoopError> {
    if !event.trigger_time.is_finite() || !event.origin().is_finite() {
        return Err(LoopError::InvalidState {
            reason: format!("event {} has a non-finite trigger time", event.id),
        });
    }
    Recurrence::from_parts(&event.id, event.is_repeating, event.repeat_interval).map(|_| ())
}
