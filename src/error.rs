//! Error taxonomy for rental sessions.
//!
//! No variant is fatal. Each one is scoped to the event that produced it
//! and the session stays usable afterwards.

use crate::flow::{EventKind, Phase};
use crate::model::LockerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Malformed or incomplete input. Never advances the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Phone number is required")]
    MissingPhone,

    #[error("Please enter a valid phone number (got {digits} digits, need 10 to 15)")]
    InvalidPhone { digits: usize },

    #[error("Verification code must be 6 digits")]
    MalformedCode,

    #[error("Invalid verification code. Please try again")]
    CodeRejected,

    #[error("No locker named {0}")]
    UnknownLocker(LockerId),

    #[error("Select a locker first")]
    NoLockerSelected,

    #[error("Please select a duration")]
    MissingDuration,

    #[error("Please enter valid hours (got {0:?})")]
    InvalidCustomDuration(String),

    #[error("{0} hours is not an offered duration")]
    UnlistedDuration(u32),

    #[error("Rentals are limited to {max} hours")]
    DurationTooLong { max: u32 },

    #[error("Please select a payment method")]
    MissingPaymentMethod,

    #[error("Please enter a 4-digit PIN")]
    IncompletePin,

    #[error("Ending a rental must be confirmed")]
    ConfirmationRequired,

    #[error("{}", join(.0))]
    Several(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Collapse a list of problems into one error.
    pub fn from_many(mut errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::Several(errors)
        }
    }

    /// Flattened view, one entry per problem.
    pub fn problems(&self) -> Vec<&ValidationError> {
        match self {
            Self::Several(errors) => errors.iter().flat_map(|e| e.problems()).collect(),
            other => vec![other],
        }
    }
}

/// External collaborator the session called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Service {
    VerificationSender,
    LockerDirectory,
    PaymentProcessor,
    LockerController,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VerificationSender => "verification sender",
            Self::LockerDirectory => "locker directory",
            Self::PaymentProcessor => "payment processor",
            Self::LockerController => "locker controller",
        })
    }
}

/// A collaborator failed or declined. The triggering action may be retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{service} failed: {reason}")]
pub struct ExternalFailure {
    pub service: Service,
    pub reason: String,
}

impl ExternalFailure {
    pub fn new(service: Service, reason: impl Into<String>) -> Self {
        Self {
            service,
            reason: reason.into(),
        }
    }
}

/// Errors returned by [`RentalSession`](crate::session::RentalSession)
/// operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RentalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Locker {0} is occupied")]
    LockerUnavailable(LockerId),

    #[error("PINs do not match. Please create your PIN again")]
    PinMismatch,

    #[error(transparent)]
    External(#[from] ExternalFailure),

    #[error("A new code can be requested in {remaining_secs}s")]
    ResendCooldown { remaining_secs: u64 },

    #[error("Cannot {event} while {phase}")]
    InvalidTransition { phase: Phase, event: EventKind },
}

impl RentalError {
    /// Whether repeating the same call later may succeed without new input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::External(_) | Self::ResendCooldown { .. })
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}
