//! Rental workflow states and events.
//!
//! [`RentalState`] is the tagged-variant state of a session: each variant
//! carries only the data that is meaningful in that step. [`Phase`] is its
//! data-free discriminant, used for logging, history and the transition
//! table.
//!
//! ```text
//! Idle -> AwaitingVerification -> AwaitingOtp -> SelectingLocker
//!      -> SelectingPaymentPlan -> CreatingPin -> ConfirmingPin -> Active -> Ended
//! ```

mod transition;

pub use transition::{Transition, TransitionTable};

use crate::core::State;
use crate::model::{Booking, LockerId, Pin, Rental};
use crate::state_enum;
use serde::{Deserialize, Serialize};
use std::fmt;

state_enum! {
    /// Step of the rental wizard without its data.
    #[derive(Copy, Eq, Hash)]
    pub enum Phase {
        Idle,
        AwaitingVerification,
        AwaitingOtp,
        SelectingLocker,
        SelectingPaymentPlan,
        CreatingPin,
        ConfirmingPin,
        Active,
        Ended,
    }
    final: [Ended]
}

/// Current step of a session together with the data gathered for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RentalState {
    Idle,
    /// Waiting for the verification sender to acknowledge.
    AwaitingVerification,
    AwaitingOtp {
        failed_attempts: u32,
    },
    /// A held selection is always an available locker.
    SelectingLocker {
        selected: Option<LockerId>,
    },
    /// `extending` holds the still-running rental when paying for more
    /// time, so backing out can resume it.
    SelectingPaymentPlan {
        locker_id: LockerId,
        extending: Option<Rental>,
    },
    CreatingPin {
        booking: Booking,
    },
    ConfirmingPin {
        booking: Booking,
        created: Pin,
    },
    Active {
        rental: Rental,
    },
    Ended,
}

impl RentalState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::AwaitingVerification => Phase::AwaitingVerification,
            Self::AwaitingOtp { .. } => Phase::AwaitingOtp,
            Self::SelectingLocker { .. } => Phase::SelectingLocker,
            Self::SelectingPaymentPlan { .. } => Phase::SelectingPaymentPlan,
            Self::CreatingPin { .. } => Phase::CreatingPin,
            Self::ConfirmingPin { .. } => Phase::ConfirmingPin,
            Self::Active { .. } => Phase::Active,
            Self::Ended => Phase::Ended,
        }
    }

    /// Locker held or booked in this step, if any.
    pub fn locker_id(&self) -> Option<&LockerId> {
        match self {
            Self::SelectingLocker { selected } => selected.as_ref(),
            Self::SelectingPaymentPlan { locker_id, .. } => Some(locker_id),
            Self::CreatingPin { booking } | Self::ConfirmingPin { booking, .. } => {
                Some(&booking.locker_id)
            }
            Self::Active { rental } => Some(&rental.booking.locker_id),
            _ => None,
        }
    }

    pub fn booking(&self) -> Option<&Booking> {
        match self {
            Self::CreatingPin { booking } | Self::ConfirmingPin { booking, .. } => Some(booking),
            Self::Active { rental } => Some(&rental.booking),
            _ => None,
        }
    }

    pub fn rental(&self) -> Option<&Rental> {
        match self {
            Self::Active { rental } => Some(rental),
            _ => None,
        }
    }

    /// True while the session is paying for an extension of an earlier
    /// rental.
    pub fn is_extending(&self) -> bool {
        match self {
            Self::SelectingPaymentPlan { extending, .. } => extending.is_some(),
            Self::CreatingPin { booking } | Self::ConfirmingPin { booking, .. } => {
                booking.extension
            }
            _ => false,
        }
    }
}

impl State for RentalState {
    fn name(&self) -> &str {
        self.phase().as_str()
    }

    fn is_final(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

/// Events a session reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RequestVerification,
    VerificationSent,
    VerificationFailed,
    SubmitCode,
    Resend,
    SelectLocker,
    ConfirmLocker,
    SubmitPayment,
    EnterPin,
    ConfirmPin,
    Unlock,
    EndRental,
    ExtendRental,
    GoBack,
    Abandon,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequestVerification => "request_verification",
            Self::VerificationSent => "verification_sent",
            Self::VerificationFailed => "verification_failed",
            Self::SubmitCode => "submit_code",
            Self::Resend => "resend",
            Self::SelectLocker => "select_locker",
            Self::ConfirmLocker => "confirm_locker",
            Self::SubmitPayment => "submit_payment",
            Self::EnterPin => "enter_pin",
            Self::ConfirmPin => "confirm_pin",
            Self::Unlock => "unlock",
            Self::EndRental => "end_rental",
            Self::ExtendRental => "extend_rental",
            Self::GoBack => "go_back",
            Self::Abandon => "abandon",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
