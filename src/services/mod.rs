//! External collaborators and the effects that call them.
//!
//! The session never calls a collaborator directly. Each call is described
//! as a Stillwater effect over the [`Services`] environment and run by the
//! session's shell, keeping transition logic separate from I/O.
//!
//! Following Stillwater conventions, constructors return `impl Effect` and
//! are built with the free-standing `from_fn`.

pub mod simulated;

use crate::error::ExternalFailure;
use crate::model::{
    Ack, ActivationRecord, CodeVerdict, Locker, LockerId, Money, OtpCode, PaymentMethod,
    PhoneNumber, Pin, Receipt, UnlockOutcome,
};
use std::sync::Arc;
use stillwater::effect::Effect;
use stillwater::prelude::*;

/// Delivers and checks one-time passcodes.
pub trait VerificationSender: Send + Sync {
    fn send(&self, phone: &PhoneNumber) -> Result<Ack, ExternalFailure>;

    fn check_code(&self, phone: &PhoneNumber, code: &OtpCode) -> Result<CodeVerdict, ExternalFailure>;
}

/// Source of locker availability. Other renters may change statuses at any
/// time, so callers should not cache listings.
pub trait LockerDirectory: Send + Sync {
    fn list_lockers(&self) -> Result<Vec<Locker>, ExternalFailure>;
}

/// Charges the renter. A declined charge is an [`ExternalFailure`].
pub trait PaymentProcessor: Send + Sync {
    fn charge(&self, amount: Money, method: PaymentMethod) -> Result<Receipt, ExternalFailure>;
}

/// Arms, opens and releases physical lockers.
pub trait LockerController: Send + Sync {
    fn activate(
        &self,
        locker_id: &LockerId,
        pin: &Pin,
        duration_hours: u32,
    ) -> Result<ActivationRecord, ExternalFailure>;

    fn unlock(&self, locker_id: &LockerId, pin: &Pin) -> Result<UnlockOutcome, ExternalFailure>;

    fn release(&self, locker_id: &LockerId) -> Result<(), ExternalFailure>;
}

/// Environment every collaborator effect runs against.
#[derive(Clone)]
pub struct Services {
    pub sender: Arc<dyn VerificationSender>,
    pub lockers: Arc<dyn LockerDirectory>,
    pub payments: Arc<dyn PaymentProcessor>,
    pub controller: Arc<dyn LockerController>,
}

impl Services {
    pub fn new(
        sender: Arc<dyn VerificationSender>,
        lockers: Arc<dyn LockerDirectory>,
        payments: Arc<dyn PaymentProcessor>,
        controller: Arc<dyn LockerController>,
    ) -> Self {
        Self {
            sender,
            lockers,
            payments,
            controller,
        }
    }
}

pub fn send_code(
    phone: PhoneNumber,
) -> impl Effect<Output = Ack, Error = ExternalFailure, Env = Services> {
    from_fn(move |env: &Services| env.sender.send(&phone))
}

pub fn check_code(
    phone: PhoneNumber,
    code: OtpCode,
) -> impl Effect<Output = CodeVerdict, Error = ExternalFailure, Env = Services> {
    from_fn(move |env: &Services| env.sender.check_code(&phone, &code))
}

pub fn list_lockers() -> impl Effect<Output = Vec<Locker>, Error = ExternalFailure, Env = Services>
{
    from_fn(|env: &Services| env.lockers.list_lockers())
}

pub fn charge(
    amount: Money,
    method: PaymentMethod,
) -> impl Effect<Output = Receipt, Error = ExternalFailure, Env = Services> {
    from_fn(move |env: &Services| env.payments.charge(amount, method))
}

pub fn activate(
    locker_id: LockerId,
    pin: Pin,
    duration_hours: u32,
) -> impl Effect<Output = ActivationRecord, Error = ExternalFailure, Env = Services> {
    from_fn(move |env: &Services| env.controller.activate(&locker_id, &pin, duration_hours))
}

pub fn unlock(
    locker_id: LockerId,
    pin: Pin,
) -> impl Effect<Output = UnlockOutcome, Error = ExternalFailure, Env = Services> {
    from_fn(move |env: &Services| env.controller.unlock(&locker_id, &pin))
}

pub fn release(
    locker_id: LockerId,
) -> impl Effect<Output = (), Error = ExternalFailure, Env = Services> {
    from_fn(move |env: &Services| env.controller.release(&locker_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RentalConfig;
    use crate::error::Service;
    use crate::model::LockerStatus;

    struct Unreachable;

    impl LockerDirectory for Unreachable {
        fn list_lockers(&self) -> Result<Vec<Locker>, ExternalFailure> {
            Err(ExternalFailure::new(Service::LockerDirectory, "timeout"))
        }
    }

    fn services() -> Services {
        Services::simulated(&RentalConfig::default())
    }

    #[tokio::test]
    async fn send_code_runs_against_environment() {
        let env = services();
        let phone = PhoneNumber::parse("5551234567", "+1").unwrap();

        let ack = send_code(phone).run(&env).await;
        assert!(ack.is_ok());
    }

    #[tokio::test]
    async fn check_code_uses_the_sender_verdict() {
        let env = services();
        let phone = PhoneNumber::parse("5551234567", "+1").unwrap();

        let ok = check_code(phone.clone(), OtpCode::parse("123456").unwrap())
            .run(&env)
            .await
            .unwrap();
        let rejected = check_code(phone, OtpCode::parse("555555").unwrap())
            .run(&env)
            .await
            .unwrap();

        assert_eq!(ok, CodeVerdict::Accepted);
        assert_eq!(rejected, CodeVerdict::Rejected);
    }

    #[tokio::test]
    async fn failures_surface_as_effect_errors() {
        let mut env = services();
        env.lockers = Arc::new(Unreachable);

        let result = list_lockers().run(&env).await;
        assert_eq!(
            result,
            Err(ExternalFailure::new(Service::LockerDirectory, "timeout"))
        );
    }

    #[tokio::test]
    async fn listing_reports_statuses() {
        let env = services();
        let lockers = list_lockers().run(&env).await.unwrap();

        let a2 = lockers.iter().find(|l| l.id.as_str() == "A2").unwrap();
        assert_eq!(a2.status, LockerStatus::Occupied);
    }
}
