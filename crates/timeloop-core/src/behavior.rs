//! The behavior seam between scheduled events and the outside world.
//!
//! A behavior is whatever runs when an event fires: spawn a crime, move a
//! patrol, open a door. The engine only ever sees it through
//! [`EventBehavior`], hands it the caller's render/update context, and
//! never serializes it.

use crate::error::BehaviorError;

/// Executable half of a scheduled event.
///
/// `C` is the render/update context supplied to
/// [`LoopEngine::update`](crate::engine::LoopEngine::update) and passed
/// through unchanged. Any `FnMut(&mut C) -> Result<(), BehaviorError>`
/// closure is a behavior.
pub trait EventBehavior<C> {
    /// Run the behavior once.
    ///
    /// # Errors
    ///
    /// Returns [`BehaviorError`] if the behavior fails. The engine logs the
    /// failure and keeps firing other events.
    fn fire(&mut self, context: &mut C) -> Result<(), BehaviorError>;
}

impl<C, F> EventBehavior<C> for F
where
    F: FnMut(&mut C) -> Result<(), BehaviorError>,
{
    fn fire(&mut self, context: &mut C) -> Result<(), BehaviorError> {
        self(context)
    }
}

/// Behavior that does nothing; useful as a placeholder when re-attaching.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpBehavior;

impl<C> EventBehavior<C> for NoOpBehavior {
    fn fire(&mut self, _context: &mut C) -> Result<(), BehaviorError> {
        Ok(())
    }
}
