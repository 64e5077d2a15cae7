//! Domain values carried through a rental session.
//!
//! Every input type has a `parse` constructor that normalizes raw user text
//! and reports a [`ValidationError`] instead of panicking.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Digits in a verification code.
pub const OTP_LENGTH: usize = 6;
/// Digits in a locker PIN.
pub const PIN_LENGTH: usize = 4;
/// Shortest accepted national phone number.
pub const MIN_PHONE_DIGITS: usize = 10;
/// Longest accepted phone number.
pub const MAX_PHONE_DIGITS: usize = 15;

fn is_digits(raw: &str, len: usize) -> bool {
    raw.len() == len && raw.bytes().all(|b| b.is_ascii_digit())
}

/// A normalized phone number: the digits the user typed plus the country
/// code used for delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    country_code: String,
    digits: String,
}

impl PhoneNumber {
    /// Strip everything but digits and check the 10 to 15 digit range.
    ///
    /// ```
    /// use lockerflow::model::PhoneNumber;
    ///
    /// let phone = PhoneNumber::parse("(555) 123-4567", "+1").unwrap();
    /// assert_eq!(phone.digits(), "5551234567");
    /// assert_eq!(phone.e164(), "+15551234567");
    /// assert!(PhoneNumber::parse("555-1234", "+1").is_err());
    /// ```
    pub fn parse(raw: &str, country_code: &str) -> Result<Self, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::MissingPhone);
        }
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
            return Err(ValidationError::InvalidPhone {
                digits: digits.len(),
            });
        }
        Ok(Self {
            country_code: country_code.to_string(),
            digits,
        })
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Country code followed by the digits, e.g. `+15551234567`.
    pub fn e164(&self) -> String {
        format!("{}{}", self.country_code, self.digits)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.e164())
    }
}

/// A well-formed six digit verification code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if is_digits(raw, OTP_LENGTH) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::MalformedCode)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

/// A four digit locker PIN. `Debug` never prints the digits.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pin(String);

impl Pin {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if is_digits(raw, PIN_LENGTH) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::IncompletePin)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

/// Identifier of a storage unit, e.g. `A1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockerId(String);

impl LockerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LockerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for LockerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockerStatus {
    Available,
    Occupied,
}

/// One entry of the locker directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locker {
    pub id: LockerId,
    pub status: LockerStatus,
}

impl Locker {
    pub fn new(id: impl Into<String>, status: LockerStatus) -> Self {
        Self {
            id: LockerId::new(id),
            status,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == LockerStatus::Available
    }
}

/// An amount of money in cents.
///
/// ```
/// use lockerflow::model::Money;
///
/// let rate = Money::from_cents(250);
/// assert_eq!(rate.times(4), Money::from_cents(1000));
/// assert_eq!(rate.times(4).to_string(), "$10.00");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Price of `hours` at this hourly rate.
    pub const fn times(self, hours: u32) -> Self {
        Self(self.0.saturating_mul(hours as u64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Upi,
    Wallet,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [Self::Card, Self::Upi, Self::Wallet];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Upi => "upi",
            Self::Wallet => "wallet",
        }
    }

    /// Label shown next to the option.
    pub fn label(self) -> &'static str {
        match self {
            Self::Card => "Credit/Debit Card",
            Self::Upi => "UPI",
            Self::Wallet => "Wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "wallet" => Ok(Self::Wallet),
            _ => Err(ValidationError::MissingPaymentMethod),
        }
    }
}

/// How the renter picked a duration: a catalog entry or free-text hours.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationChoice {
    Preset(u32),
    Custom(String),
}

impl DurationChoice {
    /// Resolve to whole hours. Presets must be in `catalog`; custom input
    /// must parse as a positive integer. Both are capped at `max_hours`.
    pub fn hours(&self, catalog: &[u32], max_hours: u32) -> Result<u32, ValidationError> {
        let hours = match self {
            Self::Preset(hours) if catalog.contains(hours) => *hours,
            Self::Preset(hours) => return Err(ValidationError::UnlistedDuration(*hours)),
            Self::Custom(raw) => match raw.trim().parse::<u32>() {
                Ok(hours) if hours >= 1 => hours,
                _ => return Err(ValidationError::InvalidCustomDuration(raw.clone())),
            },
        };
        if hours > max_hours {
            return Err(ValidationError::DurationTooLong { max: max_hours });
        }
        Ok(hours)
    }
}

/// The payment screen's form: both fields may still be unset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub duration: Option<DurationChoice>,
    pub method: Option<PaymentMethod>,
}

impl PaymentPlan {
    pub fn preset(hours: u32, method: PaymentMethod) -> Self {
        Self {
            duration: Some(DurationChoice::Preset(hours)),
            method: Some(method),
        }
    }

    pub fn custom(hours: impl Into<String>, method: PaymentMethod) -> Self {
        Self {
            duration: Some(DurationChoice::Custom(hours.into())),
            method: Some(method),
        }
    }
}

/// Acknowledgement that a verification code was dispatched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub sent_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeVerdict {
    Accepted,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnlockOutcome {
    Unlocked,
    Denied,
}

/// Proof of a successful charge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub amount: Money,
    pub method: PaymentMethod,
    pub charged_at: DateTime<Utc>,
}

/// A paid-for locker booking awaiting its PIN.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub locker_id: LockerId,
    pub duration_hours: u32,
    pub hourly_rate: Money,
    pub method: PaymentMethod,
    pub receipt: Receipt,
    /// Set when the booking extends an earlier rental of the same locker.
    pub extension: bool,
}

impl Booking {
    /// Always `duration_hours * hourly_rate`; never stored separately.
    pub fn amount_due(&self) -> Money {
        self.hourly_rate.times(self.duration_hours)
    }
}

/// Returned by the locker controller once a locker is armed with a PIN.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub id: Uuid,
    pub locker_id: LockerId,
    pub duration_hours: u32,
    pub activated_at: DateTime<Utc>,
}

/// An active rental window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rental {
    pub booking: Booking,
    pub pin: Pin,
    pub activation: ActivationRecord,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Rental {
    pub fn total(&self) -> Duration {
        Duration::from_secs(u64::from(self.booking.duration_hours) * 3600)
    }

    /// Remaining time at `now`, floored at zero.
    pub fn time_remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.ends_at
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.time_remaining_at(now).is_zero()
    }

    /// Elapsed share of the window in percent, clamped to `0..=100`.
    pub fn progress_at(&self, now: DateTime<Utc>) -> f64 {
        let total = self.total().as_secs_f64();
        if total == 0.0 {
            return 100.0;
        }
        let elapsed = total - self.time_remaining_at(now).as_secs_f64();
        (elapsed / total * 100.0).clamp(0.0, 100.0)
    }
}
