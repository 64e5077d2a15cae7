//! State transition history tracking.
//!
//! A session keeps an append-only trail of every accepted event. Recording
//! returns a new history value and leaves the old one untouched.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single accepted event.
///
/// `from` and `to` may be equal: self-loops such as a rejected OTP or a
/// held locker selection are recorded too.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// Name of the event that caused the transition
    pub event: String,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
    /// How many events `from` has absorbed so far, this one included
    pub attempt: usize,
}

impl<S: State> StateTransition<S> {
    /// True when the event left the state where it was.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Ordered history of state transitions.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use lockerflow::core::{StateHistory, StateTransition};
/// use lockerflow::flow::Phase;
///
/// let history = StateHistory::new().record(StateTransition {
///     from: Phase::Idle,
///     to: Phase::AwaitingVerification,
///     event: "request_verification".to_string(),
///     timestamp: Utc::now(),
///     attempt: 1,
/// });
///
/// assert_eq!(history.get_path(), vec![&Phase::Idle, &Phase::AwaitingVerification]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// States visited in order: the first `from`, then every `to`.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Like [`get_path`](Self::get_path) with self-loops collapsed.
    pub fn distinct_path(&self) -> Vec<&S> {
        let mut path: Vec<&S> = Vec::new();
        for state in self.get_path() {
            if path.last() != Some(&state) {
                path.push(state);
            }
        }
        path
    }

    /// Number of consecutive self-loops most recently recorded on `state`.
    pub fn trailing_loops(&self, state: &S) -> usize {
        self.transitions
            .iter()
            .rev()
            .take_while(|t| t.is_self_loop() && &t.from == state)
            .count()
    }

    /// Time between the first and the last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all transitions.
    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }

    /// The most recent transition, if any.
    pub fn last(&self) -> Option<&StateTransition<S>> {
        self.transitions.last()
    }
}
