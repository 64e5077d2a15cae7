//! Payment plan validation.
//!
//! The payment form is checked with Stillwater's `Validation` so a renter
//! sees every problem with the form in one pass (no duration *and* no
//! payment method) instead of fixing them one at a time.

use crate::config::RentalConfig;
use crate::error::ValidationError;
use crate::model::{DurationChoice, PaymentMethod, PaymentPlan};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Result type of a single form check.
pub type Check = Validation<(), NonEmptyVec<ValidationError>>;

/// A payment plan that passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidPlan {
    pub hours: u32,
    pub method: PaymentMethod,
}

fn resolve_hours(choice: Option<&DurationChoice>, config: &RentalConfig) -> Result<u32, ValidationError> {
    choice
        .ok_or(ValidationError::MissingDuration)?
        .hours(&config.duration_catalog, config.max_duration_hours)
}

/// Duration is present, offered (or a positive custom value) and within
/// the configured maximum.
pub fn check_duration(choice: Option<&DurationChoice>, config: &RentalConfig) -> Check {
    match resolve_hours(choice, config) {
        Ok(_) => Validation::success(()),
        Err(e) => Validation::fail(e),
    }
}

pub fn check_method(method: Option<PaymentMethod>) -> Check {
    if method.is_some() {
        Validation::success(())
    } else {
        Validation::fail(ValidationError::MissingPaymentMethod)
    }
}

/// Run every check, accumulating ALL failures.
pub fn validate_plan(plan: &PaymentPlan, config: &RentalConfig) -> Result<ValidPlan, ValidationError> {
    let checks = vec![
        check_duration(plan.duration.as_ref(), config),
        check_method(plan.method),
    ];

    if let Validation::Failure(errors) = Validation::all_vec(checks) {
        return Err(ValidationError::from_many(errors.iter().cloned().collect()));
    }

    let hours = resolve_hours(plan.duration.as_ref(), config)?;
    let method = plan.method.ok_or(ValidationError::MissingPaymentMethod)?;
    Ok(ValidPlan { hours, method })
}
