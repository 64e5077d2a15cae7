//! Guard predicates for controlling state transitions.
//!
//! A guard inspects the current state and answers whether an edge may be
//! taken. Guards never mutate anything.

use super::state::State;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Pure predicate that determines if a transition can execute.
///
/// Guards are cheap to clone so the same predicate can sit on several edges
/// of a transition table.
///
/// # Example
///
/// ```rust
/// use lockerflow::core::Guard;
/// use lockerflow::flow::RentalState;
///
/// let has_selection = Guard::new(|s: &RentalState| {
///     matches!(s, RentalState::SelectingLocker { selected: Some(_) })
/// });
///
/// assert!(!has_selection.check(&RentalState::SelectingLocker { selected: None }));
/// assert!(!has_selection.check(&RentalState::Idle));
/// ```
pub struct Guard<S: State> {
    predicate: Arc<dyn Fn(&S) -> bool + Send + Sync>,
    _phantom: PhantomData<S>,
}

impl<S: State> Guard<S> {
    /// Create a guard from a pure predicate function.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
            _phantom: PhantomData,
        }
    }

    /// Check if the guard allows a transition out of `state`.
    pub fn check(&self, state: &S) -> bool {
        (self.predicate)(state)
    }

    /// Both guards must pass.
    pub fn and(self, other: Guard<S>) -> Self
    where
        S: 'static,
    {
        Guard::new(move |s: &S| self.check(s) && other.check(s))
    }
}

impl<S: State> Clone for Guard<S> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
            _phantom: PhantomData,
        }
    }
}

impl<S: State> fmt::Debug for Guard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}
