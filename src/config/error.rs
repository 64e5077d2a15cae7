//! Configuration errors.

use thiserror::Error;

/// Errors raised while building or loading a [`RentalConfig`](super::RentalConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Hourly rate must be greater than zero")]
    ZeroHourlyRate,

    #[error("Duration catalog is empty. Offer at least one duration")]
    EmptyDurationCatalog,

    #[error("Duration option {hours}h is outside 1..={max}")]
    InvalidDurationOption { hours: u32, max: u32 },

    #[error("Maximum rental duration must be at least one hour")]
    ZeroMaxDuration,

    #[error("Maximum rental duration {max}h exceeds the {limit}h limit")]
    MaxDurationTooLong { max: u32, limit: u32 },

    #[error("Resend cooldown must be greater than zero")]
    ZeroCooldown,

    #[error("Countdown tick must be greater than zero")]
    ZeroTick,

    #[error("Rejection sentinel {0:?} is not a 6-digit code")]
    MalformedSentinel(String),

    #[error("Country code {0:?} must be '+' followed by 1 to 3 digits")]
    MalformedCountryCode(String),

    #[error("Could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
