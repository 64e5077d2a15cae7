//! In-memory collaborators that mirror the demo backend: every well-formed
//! code is accepted except the configured sentinel, lockers come from a fixed
//! two-row grid, payments always clear and the controller remembers PINs.

use super::{LockerController, LockerDirectory, PaymentProcessor, Services, VerificationSender};
use crate::config::RentalConfig;
use crate::error::{ExternalFailure, Service};
use crate::model::{
    Ack, ActivationRecord, CodeVerdict, Locker, LockerId, LockerStatus, Money, OtpCode,
    PaymentMethod, PhoneNumber, Pin, Receipt, UnlockOutcome,
};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct SimulatedSender {
    rejection_sentinel: Option<String>,
    outbox: Mutex<Vec<PhoneNumber>>,
}

impl SimulatedSender {
    pub fn new(rejection_sentinel: Option<String>) -> Self {
        Self {
            rejection_sentinel,
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Numbers a code was sent to, oldest first.
    pub fn sent_to(&self) -> Vec<PhoneNumber> {
        self.outbox.lock().clone()
    }
}

impl VerificationSender for SimulatedSender {
    fn send(&self, phone: &PhoneNumber) -> Result<Ack, ExternalFailure> {
        debug!(phone = %phone, "simulated verification code sent");
        self.outbox.lock().push(phone.clone());
        Ok(Ack { sent_at: Utc::now() })
    }

    fn check_code(&self, _phone: &PhoneNumber, code: &OtpCode) -> Result<CodeVerdict, ExternalFailure> {
        match &self.rejection_sentinel {
            Some(sentinel) if sentinel == code.as_str() => Ok(CodeVerdict::Rejected),
            _ => Ok(CodeVerdict::Accepted),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLockerDirectory {
    lockers: Mutex<Vec<Locker>>,
}

impl InMemoryLockerDirectory {
    pub fn new(lockers: Vec<Locker>) -> Self {
        Self {
            lockers: Mutex::new(lockers),
        }
    }

    /// Rows A and B, six lockers each; A2, A6, B3 and B5 are occupied.
    pub fn demo() -> Self {
        use LockerStatus::{Available, Occupied};
        Self::new(vec![
            Locker::new("A1", Available),
            Locker::new("A2", Occupied),
            Locker::new("A3", Available),
            Locker::new("A4", Available),
            Locker::new("A5", Available),
            Locker::new("A6", Occupied),
            Locker::new("B1", Available),
            Locker::new("B2", Available),
            Locker::new("B3", Occupied),
            Locker::new("B4", Available),
            Locker::new("B5", Occupied),
            Locker::new("B6", Available),
        ])
    }

    /// Change a locker's status, as another renter would. Returns `false`
    /// for unknown ids.
    pub fn set_status(&self, id: &LockerId, status: LockerStatus) -> bool {
        let mut lockers = self.lockers.lock();
        match lockers.iter_mut().find(|l| &l.id == id) {
            Some(locker) => {
                locker.status = status;
                true
            }
            None => false,
        }
    }
}

impl LockerDirectory for InMemoryLockerDirectory {
    fn list_lockers(&self) -> Result<Vec<Locker>, ExternalFailure> {
        Ok(self.lockers.lock().clone())
    }
}

#[derive(Debug, Default)]
pub struct SimulatedPayments {
    charges: Mutex<Vec<Receipt>>,
}

impl SimulatedPayments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charges(&self) -> Vec<Receipt> {
        self.charges.lock().clone()
    }
}

impl PaymentProcessor for SimulatedPayments {
    fn charge(&self, amount: Money, method: PaymentMethod) -> Result<Receipt, ExternalFailure> {
        if amount.is_zero() {
            return Err(ExternalFailure::new(Service::PaymentProcessor, "declined: zero amount"));
        }
        let receipt = Receipt {
            id: Uuid::new_v4(),
            amount,
            method,
            charged_at: Utc::now(),
        };
        debug!(receipt = %receipt.id, amount = %amount, %method, "simulated charge approved");
        self.charges.lock().push(receipt.clone());
        Ok(receipt)
    }
}

#[derive(Debug, Default)]
pub struct SimulatedController {
    armed: Mutex<HashMap<LockerId, Pin>>,
}

impl SimulatedController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self, locker_id: &LockerId) -> bool {
        self.armed.lock().contains_key(locker_id)
    }
}

impl LockerController for SimulatedController {
    fn activate(
        &self,
        locker_id: &LockerId,
        pin: &Pin,
        duration_hours: u32,
    ) -> Result<ActivationRecord, ExternalFailure> {
        self.armed.lock().insert(locker_id.clone(), pin.clone());
        Ok(ActivationRecord {
            id: Uuid::new_v4(),
            locker_id: locker_id.clone(),
            duration_hours,
            activated_at: Utc::now(),
        })
    }

    fn unlock(&self, locker_id: &LockerId, pin: &Pin) -> Result<UnlockOutcome, ExternalFailure> {
        match self.armed.lock().get(locker_id) {
            Some(armed) if armed == pin => Ok(UnlockOutcome::Unlocked),
            Some(_) => Ok(UnlockOutcome::Denied),
            None => Err(ExternalFailure::new(
                Service::LockerController,
                format!("locker {locker_id} is not armed"),
            )),
        }
    }

    fn release(&self, locker_id: &LockerId) -> Result<(), ExternalFailure> {
        self.armed.lock().remove(locker_id);
        Ok(())
    }
}

/// All four simulated collaborators, kept so tests can inspect them.
#[derive(Clone)]
pub struct SimulatedBackend {
    pub sender: Arc<SimulatedSender>,
    pub lockers: Arc<InMemoryLockerDirectory>,
    pub payments: Arc<SimulatedPayments>,
    pub controller: Arc<SimulatedController>,
}

impl SimulatedBackend {
    pub fn new(config: &RentalConfig) -> Self {
        Self {
            sender: Arc::new(SimulatedSender::new(config.otp_rejection_sentinel.clone())),
            lockers: Arc::new(InMemoryLockerDirectory::demo()),
            payments: Arc::new(SimulatedPayments::new()),
            controller: Arc::new(SimulatedController::new()),
        }
    }

    pub fn services(&self) -> Services {
        Services::new(
            self.sender.clone(),
            self.lockers.clone(),
            self.payments.clone(),
            self.controller.clone(),
        )
    }
}

impl Services {
    /// Environment backed entirely by the simulated collaborators.
    pub fn simulated(config: &RentalConfig) -> Self {
        SimulatedBackend::new(config).services()
    }
}
