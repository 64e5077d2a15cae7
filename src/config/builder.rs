//! Fluent builder for [`RentalConfig`].

use super::error::ConfigError;
use super::RentalConfig;
use crate::model::Money;
use std::time::Duration;

/// Builder for rental configuration. Starts from the defaults and validates
/// everything in [`build`](Self::build).
///
/// ```
/// use lockerflow::config::RentalConfigBuilder;
/// use lockerflow::model::Money;
///
/// let config = RentalConfigBuilder::new()
///     .hourly_rate(Money::from_cents(300))
///     .durations(vec![1, 3, 6])
///     .build()
///     .unwrap();
///
/// assert_eq!(config.quote(3), Money::from_cents(900));
/// ```
#[derive(Clone, Debug)]
pub struct RentalConfigBuilder {
    config: RentalConfig,
}

impl RentalConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RentalConfig::default(),
        }
    }

    pub fn hourly_rate(mut self, rate: Money) -> Self {
        self.config.hourly_rate = rate;
        self
    }

    /// Replace the preset durations (hours).
    pub fn durations(mut self, hours: Vec<u32>) -> Self {
        self.config.duration_catalog = hours;
        self
    }

    pub fn max_duration_hours(mut self, hours: u32) -> Self {
        self.config.max_duration_hours = hours;
        self
    }

    pub fn country_code(mut self, code: impl Into<String>) -> Self {
        self.config.country_code = code.into();
        self
    }

    /// Time before a new verification code may be requested. Sub-second
    /// parts are dropped.
    pub fn resend_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.resend_cooldown_secs = cooldown.as_secs();
        self
    }

    pub fn tick(mut self, tick: Duration) -> Self {
        self.config.tick_millis = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Code the simulated sender always rejects. `None` accepts every
    /// well-formed code.
    pub fn rejection_sentinel(mut self, sentinel: Option<&str>) -> Self {
        self.config.otp_rejection_sentinel = sentinel.map(str::to_string);
        self
    }

    pub fn build(self) -> Result<RentalConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for RentalConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
