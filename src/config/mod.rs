//! Session configuration: pricing, duration catalog, countdown timing and
//! the OTP rejection sentinel.
//!
//! Configuration is plain data. Build it in code with
//! [`RentalConfigBuilder`] or load it from JSON with
//! [`RentalConfig::from_json`]; both paths run the same checks.

pub mod builder;
pub mod error;

pub use builder::RentalConfigBuilder;
pub use error::ConfigError;

use crate::model::{Money, OTP_LENGTH};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest `max_duration_hours` a deployment may configure: one year.
pub const MAX_DURATION_LIMIT_HOURS: u32 = 24 * 365;

/// Settings shared by every session of a deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalConfig {
    /// Price of one hour, in cents.
    pub hourly_rate: Money,
    /// Preset durations offered on the payment screen, in hours.
    pub duration_catalog: Vec<u32>,
    /// Upper bound for any duration, preset or custom.
    pub max_duration_hours: u32,
    /// Prefix used when delivering verification codes.
    pub country_code: String,
    pub resend_cooldown_secs: u64,
    /// How often countdowns publish their remaining time.
    pub tick_millis: u64,
    /// Code the simulated verification sender always rejects.
    pub otp_rejection_sentinel: Option<String>,
}

impl Default for RentalConfig {
    fn default() -> Self {
        Self {
            hourly_rate: Money::from_cents(250),
            duration_catalog: vec![1, 2, 4, 8, 24],
            max_duration_hours: 720,
            country_code: "+1".to_string(),
            resend_cooldown_secs: 60,
            tick_millis: 1000,
            otp_rejection_sentinel: Some("555555".to_string()),
        }
    }
}

impl RentalConfig {
    pub fn builder() -> RentalConfigBuilder {
        RentalConfigBuilder::new()
    }

    /// Parse JSON; missing fields take their defaults.
    ///
    /// ```
    /// use lockerflow::config::RentalConfig;
    ///
    /// let config = RentalConfig::from_json(r#"{ "hourly_rate": 400 }"#).unwrap();
    /// assert_eq!(config.hourly_rate.cents(), 400);
    /// assert_eq!(config.duration_catalog, vec![1, 2, 4, 8, 24]);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn resend_cooldown(&self) -> Duration {
        Duration::from_secs(self.resend_cooldown_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    /// Amount due for `hours` at the configured rate.
    pub fn quote(&self, hours: u32) -> Money {
        self.hourly_rate.times(hours)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.hourly_rate.is_zero() {
            return Err(ConfigError::ZeroHourlyRate);
        }
        if self.max_duration_hours == 0 {
            return Err(ConfigError::ZeroMaxDuration);
        }
        if self.max_duration_hours > MAX_DURATION_LIMIT_HOURS {
            return Err(ConfigError::MaxDurationTooLong {
                max: self.max_duration_hours,
                limit: MAX_DURATION_LIMIT_HOURS,
            });
        }
        if self.duration_catalog.is_empty() {
            return Err(ConfigError::EmptyDurationCatalog);
        }
        if let Some(&hours) = self
            .duration_catalog
            .iter()
            .find(|h| **h == 0 || **h > self.max_duration_hours)
        {
            return Err(ConfigError::InvalidDurationOption {
                hours,
                max: self.max_duration_hours,
            });
        }
        if self.resend_cooldown_secs == 0 {
            return Err(ConfigError::ZeroCooldown);
        }
        if self.tick_millis == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if let Some(sentinel) = &self.otp_rejection_sentinel {
            if sentinel.len() != OTP_LENGTH || !sentinel.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ConfigError::MalformedSentinel(sentinel.clone()));
            }
        }
        let code = self.country_code.strip_prefix('+').unwrap_or("");
        if code.is_empty() || code.len() > 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::MalformedCountryCode(self.country_code.clone()));
        }
        Ok(())
    }
}
