//! Display helpers and serializable session snapshots.
//!
//! A [`SessionView`] is what a front end renders: the current phase, the
//! masked phone number, countdowns already formatted, the rental summary and
//! the events it may offer. PINs and codes never appear in a view.

use crate::core::StateHistory;
use crate::flow::{EventKind, Phase, RentalState};
use crate::model::{LockerId, Money, PaymentMethod, PhoneNumber};
use crate::session::RentalSession;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Snapshot format version.
pub const VIEW_VERSION: u32 = 1;

/// `(555) 123-4567` for ten digit numbers, E.164 otherwise.
pub fn format_phone(phone: &PhoneNumber) -> String {
    let digits = phone.digits();
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        phone.e164()
    }
}

/// Progressive formatting of a number as it is typed. Non-digits are
/// dropped and input past ten digits is ignored.
pub fn format_phone_input(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).take(10).collect();
    match digits.len() {
        0..=3 => digits,
        4..=6 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

/// Country code followed by the number with all but the last four digits
/// hidden, e.g. `+1******4567`.
pub fn mask_phone(phone: &PhoneNumber) -> String {
    let digits = phone.digits();
    let visible = digits.len().saturating_sub(4);
    let mut masked = String::with_capacity(phone.country_code().len() + digits.len());
    masked.push_str(phone.country_code());
    masked.push_str(&"*".repeat(visible));
    masked.push_str(&digits[visible..]);
    masked
}

/// `mm:ss`, used for the resend cooldown.
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `HH:MM:SS`, used for rental time. Hours are not wrapped at 24.
pub fn format_remaining(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Summary of a booked or running rental.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RentalView {
    pub locker_id: LockerId,
    pub duration_hours: u32,
    pub amount: Money,
    pub method: PaymentMethod,
    pub extension: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// `HH:MM:SS`, once the rental is active.
    pub time_remaining: Option<String>,
    pub progress_percent: Option<f64>,
}

/// Serializable snapshot of a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub version: u32,
    pub session_id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub phase: Phase,
    pub phone: Option<String>,
    pub phone_masked: Option<String>,
    pub failed_attempts: u32,
    /// `mm:ss` until a new code may be requested.
    pub resend_in: Option<String>,
    pub can_resend: bool,
    pub selected_locker: Option<LockerId>,
    pub extending: bool,
    pub rental: Option<RentalView>,
    pub available_events: Vec<EventKind>,
    pub history: StateHistory<Phase>,
}

impl SessionView {
    pub fn from_session(session: &RentalSession) -> Self {
        let now = Utc::now();
        let state = session.state();

        let failed_attempts = match state {
            RentalState::AwaitingOtp { failed_attempts } => *failed_attempts,
            _ => 0,
        };

        let rental = match state {
            RentalState::Active { rental } => Some(RentalView {
                locker_id: rental.booking.locker_id.clone(),
                duration_hours: rental.booking.duration_hours,
                amount: rental.booking.amount_due(),
                method: rental.booking.method,
                extension: rental.booking.extension,
                started_at: Some(rental.started_at),
                ends_at: Some(rental.ends_at),
                time_remaining: session.time_remaining().map(format_remaining),
                progress_percent: Some(rental.progress_at(now)),
            }),
            _ => state.booking().map(|booking| RentalView {
                locker_id: booking.locker_id.clone(),
                duration_hours: booking.duration_hours,
                amount: booking.amount_due(),
                method: booking.method,
                extension: booking.extension,
                started_at: None,
                ends_at: None,
                time_remaining: None,
                progress_percent: None,
            }),
        };

        Self {
            version: VIEW_VERSION,
            session_id: session.id(),
            taken_at: now,
            phase: session.phase(),
            phone: session.phone().map(format_phone),
            phone_masked: session.phone().map(mask_phone),
            failed_attempts,
            resend_in: session.resend_remaining().map(format_clock),
            can_resend: session.can_resend(),
            selected_locker: state.locker_id().cloned(),
            extending: state.is_extending(),
            rental,
            available_events: session.available_events(),
            history: session.history().clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl RentalSession {
    /// Snapshot for rendering.
    pub fn view(&self) -> SessionView {
        SessionView::from_session(self)
    }
}
