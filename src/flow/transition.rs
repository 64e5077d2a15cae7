//! Declarative transition table for the rental workflow.

use super::{EventKind, Phase, RentalState};
use crate::core::Guard;

/// One legal edge: `from --event--> to`, optionally guarded.
#[derive(Clone, Debug)]
pub struct Transition {
    pub from: Phase,
    pub event: EventKind,
    pub to: Phase,
    pub guard: Option<Guard<RentalState>>,
}

impl Transition {
    pub fn new(from: Phase, event: EventKind, to: Phase) -> Self {
        Self {
            from,
            event,
            to,
            guard: None,
        }
    }

    /// Attach a guard, combining with any guard already present.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RentalState) -> bool + Send + Sync + 'static,
    {
        let guard = Guard::new(predicate);
        self.guard = Some(match self.guard.take() {
            Some(existing) => existing.and(guard),
            None => guard,
        });
        self
    }

    /// Check if this edge may fire for `event` from `current` (pure).
    pub fn can_execute(&self, current: &RentalState, event: EventKind) -> bool {
        if current.phase() != self.from || event != self.event {
            return false;
        }
        self.guard.as_ref().is_none_or(|g| g.check(current))
    }
}

/// The set of legal edges a session is checked against.
#[derive(Clone, Debug, Default)]
pub struct TransitionTable {
    transitions: Vec<Transition>,
}

fn has_selection(state: &RentalState) -> bool {
    matches!(state, RentalState::SelectingLocker { selected: Some(_) })
}

fn not_extending(state: &RentalState) -> bool {
    !state.is_extending()
}

fn extending(state: &RentalState) -> bool {
    state.is_extending()
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Edges of the locker rental wizard, including retry loops, back
    /// navigation and abandonment.
    pub fn rental() -> Self {
        use EventKind as E;
        use Phase as P;

        let mut table = Self::new()
            .with(Transition::new(P::Idle, E::RequestVerification, P::AwaitingVerification))
            .with(Transition::new(P::AwaitingVerification, E::VerificationSent, P::AwaitingOtp))
            .with(Transition::new(P::AwaitingVerification, E::VerificationFailed, P::Idle))
            .with(Transition::new(P::AwaitingOtp, E::SubmitCode, P::SelectingLocker))
            .with(Transition::new(P::AwaitingOtp, E::SubmitCode, P::AwaitingOtp))
            .with(Transition::new(P::AwaitingOtp, E::Resend, P::AwaitingOtp))
            .with(Transition::new(P::AwaitingOtp, E::GoBack, P::Idle))
            .with(Transition::new(P::SelectingLocker, E::SelectLocker, P::SelectingLocker))
            .with(
                Transition::new(P::SelectingLocker, E::ConfirmLocker, P::SelectingPaymentPlan)
                    .when(has_selection),
            )
            .with(Transition::new(P::SelectingPaymentPlan, E::SubmitPayment, P::CreatingPin))
            .with(
                Transition::new(P::SelectingPaymentPlan, E::GoBack, P::SelectingLocker)
                    .when(not_extending),
            )
            .with(Transition::new(P::SelectingPaymentPlan, E::GoBack, P::Active).when(extending))
            .with(Transition::new(P::CreatingPin, E::EnterPin, P::ConfirmingPin))
            .with(Transition::new(P::ConfirmingPin, E::ConfirmPin, P::Active))
            .with(Transition::new(P::ConfirmingPin, E::ConfirmPin, P::CreatingPin))
            .with(Transition::new(P::ConfirmingPin, E::GoBack, P::CreatingPin))
            .with(Transition::new(P::Active, E::Unlock, P::Active))
            .with(Transition::new(P::Active, E::EndRental, P::Ended))
            .with(Transition::new(P::Active, E::ExtendRental, P::SelectingPaymentPlan));

        for from in [
            P::Idle,
            P::AwaitingVerification,
            P::AwaitingOtp,
            P::SelectingLocker,
            P::SelectingPaymentPlan,
            P::CreatingPin,
            P::ConfirmingPin,
        ] {
            table = table.with(Transition::new(from, E::Abandon, P::Ended).when(not_extending));
        }
        table
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Whether `phase` has any edge for `event`, ignoring guards.
    pub fn handles(&self, phase: Phase, event: EventKind) -> bool {
        self.transitions
            .iter()
            .any(|t| t.from == phase && t.event == event)
    }

    /// Whether `current --event--> to` is an edge whose guard passes.
    pub fn permits(&self, current: &RentalState, event: EventKind, to: Phase) -> bool {
        self.transitions
            .iter()
            .any(|t| t.to == to && t.can_execute(current, event))
    }

    /// Possible destinations of `event` from `phase`.
    pub fn targets(&self, phase: Phase, event: EventKind) -> Vec<Phase> {
        self.transitions
            .iter()
            .filter(|t| t.from == phase && t.event == event)
            .map(|t| t.to)
            .collect()
    }

    /// Events whose guards currently pass, in table order without
    /// duplicates.
    pub fn available_events(&self, current: &RentalState) -> Vec<EventKind> {
        let mut events = Vec::new();
        for t in &self.transitions {
            if t.can_execute(current, t.event) && !events.contains(&t.event) {
                events.push(t.event);
            }
        }
        events
    }
}
