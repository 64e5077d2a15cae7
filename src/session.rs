//! Rental session: the imperative shell around the rental workflow.
//!
//! A [`RentalSession`] owns the current [`RentalState`], the phone number it
//! was verified with, an immutable history of phase changes and the two
//! countdowns (OTP resend and rental time). Every state change goes through
//! [`RentalSession::advance`], which checks the transition table, cancels
//! timers that belong to the step being left and records history.
//!
//! Collaborator calls are Stillwater effects from [`crate::services`], run
//! against the [`Services`] environment passed to each async operation. A
//! failed call leaves the session in the step it was in before the call.

use crate::config::{ConfigError, RentalConfig};
use crate::core::{State, StateHistory, StateTransition};
use crate::error::{RentalError, ValidationError};
use crate::flow::{EventKind, Phase, RentalState, TransitionTable};
use crate::model::{
    Booking, CodeVerdict, Locker, LockerId, Money, OtpCode, PaymentPlan, PhoneNumber, Pin,
    Rental, UnlockOutcome,
};
use crate::services::{self, Services};
use crate::timer::Countdown;
use crate::validation::validate_plan;
use chrono::{DateTime, Utc};
use std::time::Duration;
use stillwater::effect::Effect;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One renter's walk through the rental wizard.
#[derive(Debug)]
pub struct RentalSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    config: RentalConfig,
    table: TransitionTable,
    state: RentalState,
    phone: Option<PhoneNumber>,
    history: StateHistory<Phase>,
    otp_timer: Option<Countdown>,
    rental_timer: Option<Countdown>,
}

impl RentalSession {
    /// Start a session in `Idle`. Fails when `config` would not hold up at
    /// runtime, e.g. a zero tick period.
    pub fn new(config: RentalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let id = Uuid::new_v4();
        debug!(session = %id, "session created");
        Ok(Self {
            id,
            created_at: Utc::now(),
            config,
            table: TransitionTable::rental(),
            state: RentalState::Idle,
            phone: None,
            history: StateHistory::new(),
            otp_timer: None,
            rental_timer: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn config(&self) -> &RentalConfig {
        &self.config
    }

    pub fn state(&self) -> &RentalState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_final(&self) -> bool {
        self.state.is_final()
    }

    /// Verified phone number, retained until the session ends.
    pub fn phone(&self) -> Option<&PhoneNumber> {
        self.phone.as_ref()
    }

    pub fn history(&self) -> &StateHistory<Phase> {
        &self.history
    }

    pub fn otp_countdown(&self) -> Option<&Countdown> {
        self.otp_timer.as_ref()
    }

    pub fn rental_countdown(&self) -> Option<&Countdown> {
        self.rental_timer.as_ref()
    }

    /// Time until a new code may be requested, while awaiting one.
    pub fn resend_remaining(&self) -> Option<Duration> {
        match self.state {
            RentalState::AwaitingOtp { .. } => {
                Some(self.otp_timer.as_ref().map_or(Duration::ZERO, Countdown::remaining))
            }
            _ => None,
        }
    }

    pub fn can_resend(&self) -> bool {
        self.resend_remaining().is_some_and(|left| left.is_zero())
    }

    /// Rental time left, while a rental is active.
    pub fn time_remaining(&self) -> Option<Duration> {
        match (&self.state, &self.rental_timer) {
            (RentalState::Active { .. }, Some(timer)) => Some(timer.remaining()),
            (RentalState::Active { rental }, None) => Some(rental.time_remaining_at(Utc::now())),
            _ => None,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.time_remaining().is_some_and(|left| left.is_zero())
    }

    /// Price of `hours` at the configured rate.
    pub fn quote(&self, hours: u32) -> Money {
        self.config.quote(hours)
    }

    /// Events the current state accepts.
    pub fn available_events(&self) -> Vec<EventKind> {
        self.table.available_events(&self.state)
    }

    /// Step 1: validate the phone number and ask for a code.
    ///
    /// On a sender failure the session returns to `Idle` so the renter can
    /// try again.
    pub async fn request_verification(
        &mut self,
        raw_phone: &str,
        env: &Services,
    ) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::RequestVerification;
        self.expect(EVENT)?;
        let phone = PhoneNumber::parse(raw_phone, &self.config.country_code)
            .map_err(|e| self.reject(EVENT, e))?;

        self.advance(EVENT, RentalState::AwaitingVerification)?;
        self.phone = Some(phone.clone());

        match services::send_code(phone).run(env).await {
            Ok(ack) => {
                debug!(session = %self.id, sent_at = %ack.sent_at, "verification code sent");
                self.advance(EventKind::VerificationSent, RentalState::AwaitingOtp { failed_attempts: 0 })?;
                self.start_otp_timer();
                Ok(())
            }
            Err(failure) => {
                self.phone = None;
                self.advance(EventKind::VerificationFailed, RentalState::Idle)?;
                Err(self.reject(EVENT, failure))
            }
        }
    }

    /// Ask for a new code once the cooldown has run out. Restarts the
    /// cooldown.
    pub async fn resend(&mut self, env: &Services) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::Resend;
        self.expect(EVENT)?;
        if let Some(left) = self.resend_remaining().filter(|left| !left.is_zero()) {
            let remaining_secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
            return Err(self.reject(EVENT, RentalError::ResendCooldown { remaining_secs }));
        }
        let phone = self.require_phone(EVENT)?;

        services::send_code(phone)
            .run(env)
            .await
            .map_err(|f| self.reject(EVENT, f))?;

        let failed_attempts = self.failed_attempts();
        self.advance(EVENT, RentalState::AwaitingOtp { failed_attempts })?;
        self.start_otp_timer();
        Ok(())
    }

    /// Step 2: check a six digit code. A rejected code keeps the session
    /// waiting for another one.
    pub async fn submit_code(&mut self, raw_code: &str, env: &Services) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::SubmitCode;
        self.expect(EVENT)?;
        let code = OtpCode::parse(raw_code).map_err(|e| self.reject(EVENT, e))?;
        let phone = self.require_phone(EVENT)?;

        let verdict = services::check_code(phone, code)
            .run(env)
            .await
            .map_err(|f| self.reject(EVENT, f))?;

        match verdict {
            CodeVerdict::Accepted => {
                self.advance(EVENT, RentalState::SelectingLocker { selected: None })
            }
            CodeVerdict::Rejected => {
                let failed_attempts = self.failed_attempts() + 1;
                self.advance(EVENT, RentalState::AwaitingOtp { failed_attempts })?;
                Err(self.reject(EVENT, ValidationError::CodeRejected))
            }
        }
    }

    /// Current locker listing. Never cached.
    pub async fn available_lockers(&self, env: &Services) -> Result<Vec<Locker>, RentalError> {
        services::list_lockers()
            .run(env)
            .await
            .map_err(|f| self.reject(EventKind::SelectLocker, f))
    }

    /// Step 3: hold a locker. Occupied and unknown lockers leave any earlier
    /// selection in place.
    pub async fn select_locker(
        &mut self,
        id: impl Into<LockerId>,
        env: &Services,
    ) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::SelectLocker;
        self.expect(EVENT)?;
        let id = id.into();

        let lockers = self.available_lockers(env).await?;
        let locker = lockers
            .into_iter()
            .find(|l| l.id == id)
            .ok_or_else(|| self.reject(EVENT, ValidationError::UnknownLocker(id.clone())))?;
        if !locker.is_available() {
            return Err(self.reject(EVENT, RentalError::LockerUnavailable(id)));
        }

        self.advance(EVENT, RentalState::SelectingLocker { selected: Some(id) })
    }

    pub fn confirm_locker(&mut self) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::ConfirmLocker;
        self.expect(EVENT)?;
        let locker_id = match &self.state {
            RentalState::SelectingLocker { selected: Some(id) } => id.clone(),
            _ => return Err(self.reject(EVENT, ValidationError::NoLockerSelected)),
        };
        self.advance(
            EVENT,
            RentalState::SelectingPaymentPlan {
                locker_id,
                extending: None,
            },
        )
    }

    /// Step 4: validate the plan and charge for it. A declined charge keeps
    /// the renter on the payment step.
    pub async fn submit_payment(
        &mut self,
        plan: &PaymentPlan,
        env: &Services,
    ) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::SubmitPayment;
        self.expect(EVENT)?;
        let (locker_id, extending) = match &self.state {
            RentalState::SelectingPaymentPlan {
                locker_id,
                extending,
            } => (locker_id.clone(), extending.is_some()),
            _ => return Err(self.invalid(EVENT)),
        };
        let plan = validate_plan(plan, &self.config).map_err(|e| self.reject(EVENT, e))?;
        let amount = self.config.quote(plan.hours);

        let receipt = services::charge(amount, plan.method)
            .run(env)
            .await
            .map_err(|f| self.reject(EVENT, f))?;
        info!(
            session = %self.id,
            locker = %locker_id,
            hours = plan.hours,
            amount = %amount,
            method = %plan.method,
            extension = extending,
            "payment accepted"
        );

        let booking = Booking {
            locker_id,
            duration_hours: plan.hours,
            hourly_rate: self.config.hourly_rate,
            method: plan.method,
            receipt,
            extension: extending,
        };
        self.advance(EVENT, RentalState::CreatingPin { booking })
    }

    /// Step 5: choose a four digit PIN.
    pub fn enter_pin(&mut self, raw_pin: &str) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::EnterPin;
        self.expect(EVENT)?;
        let booking = match &self.state {
            RentalState::CreatingPin { booking } => booking.clone(),
            _ => return Err(self.invalid(EVENT)),
        };
        let created = Pin::parse(raw_pin).map_err(|e| self.reject(EVENT, e))?;
        self.advance(EVENT, RentalState::ConfirmingPin { booking, created })
    }

    /// Step 6: repeat the PIN. A mismatch discards both entries and returns
    /// to PIN creation; a match arms the locker and starts the rental clock.
    pub async fn confirm_pin(&mut self, raw_pin: &str, env: &Services) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::ConfirmPin;
        self.expect(EVENT)?;
        let (booking, created) = match &self.state {
            RentalState::ConfirmingPin { booking, created } => (booking.clone(), created.clone()),
            _ => return Err(self.invalid(EVENT)),
        };
        let confirmed = Pin::parse(raw_pin).map_err(|e| self.reject(EVENT, e))?;

        if confirmed != created {
            self.advance(EVENT, RentalState::CreatingPin { booking })?;
            return Err(self.reject(EVENT, RentalError::PinMismatch));
        }

        let started_at = Utc::now();
        let ends_at = started_at
            .checked_add_signed(chrono::Duration::hours(i64::from(booking.duration_hours)))
            .ok_or_else(|| {
                self.reject(
                    EVENT,
                    ValidationError::DurationTooLong {
                        max: self.config.max_duration_hours,
                    },
                )
            })?;

        let activation = services::activate(
            booking.locker_id.clone(),
            created.clone(),
            booking.duration_hours,
        )
        .run(env)
        .await
        .map_err(|f| self.reject(EVENT, f))?;
        let rental = Rental {
            booking,
            pin: created,
            activation,
            started_at,
            ends_at,
        };
        let total = rental.total();

        self.advance(EVENT, RentalState::Active { rental })?;
        self.rental_timer = Some(Countdown::start("rental", total, self.config.tick()));
        Ok(())
    }

    /// Open the rented locker with its PIN. A wrong PIN is reported as
    /// [`UnlockOutcome::Denied`] and leaves the rental untouched.
    pub async fn unlock(&mut self, raw_pin: &str, env: &Services) -> Result<UnlockOutcome, RentalError> {
        const EVENT: EventKind = EventKind::Unlock;
        self.expect(EVENT)?;
        let locker_id = self.active_locker(EVENT)?;
        let pin = Pin::parse(raw_pin).map_err(|e| self.reject(EVENT, e))?;

        let outcome = services::unlock(locker_id.clone(), pin)
            .run(env)
            .await
            .map_err(|f| self.reject(EVENT, f))?;

        match outcome {
            UnlockOutcome::Unlocked => self.advance(EVENT, self.state.clone())?,
            UnlockOutcome::Denied => {
                warn!(session = %self.id, locker = %locker_id, "unlock denied");
            }
        }
        Ok(outcome)
    }

    /// End the rental and release the locker. Requires explicit
    /// confirmation; the session is finished afterwards.
    pub async fn end_rental(&mut self, confirmed: bool, env: &Services) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::EndRental;
        self.expect(EVENT)?;
        if !confirmed {
            return Err(self.reject(EVENT, ValidationError::ConfirmationRequired));
        }
        let locker_id = self.active_locker(EVENT)?;

        services::release(locker_id)
            .run(env)
            .await
            .map_err(|f| self.reject(EVENT, f))?;

        self.advance(EVENT, RentalState::Ended)?;
        self.phone = None;
        Ok(())
    }

    /// Pay for more time on the current locker.
    pub fn extend_rental(&mut self) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::ExtendRental;
        self.expect(EVENT)?;
        let rental = match &self.state {
            RentalState::Active { rental } => rental.clone(),
            _ => return Err(self.invalid(EVENT)),
        };
        self.advance(
            EVENT,
            RentalState::SelectingPaymentPlan {
                locker_id: rental.booking.locker_id.clone(),
                extending: Some(rental),
            },
        )
    }

    /// Return to the previous step where one exists. Backing out of an
    /// extension resumes the running rental and its clock.
    pub fn go_back(&mut self) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::GoBack;
        self.expect(EVENT)?;
        let previous = match &self.state {
            RentalState::AwaitingOtp { .. } => RentalState::Idle,
            RentalState::SelectingPaymentPlan {
                extending: Some(rental),
                ..
            } => RentalState::Active {
                rental: rental.clone(),
            },
            RentalState::SelectingPaymentPlan { locker_id, .. } => RentalState::SelectingLocker {
                selected: Some(locker_id.clone()),
            },
            RentalState::ConfirmingPin { booking, .. } => RentalState::CreatingPin {
                booking: booking.clone(),
            },
            _ => return Err(self.invalid(EVENT)),
        };
        let leaving_otp = previous == RentalState::Idle;
        self.advance(EVENT, previous)?;
        if leaving_otp {
            self.phone = None;
        }
        if let RentalState::Active { rental } = &self.state {
            let left = rental.time_remaining_at(Utc::now());
            self.rental_timer = Some(Countdown::start("rental", left, self.config.tick()));
        }
        Ok(())
    }

    /// Leave the wizard before a rental starts.
    pub fn abandon(&mut self) -> Result<(), RentalError> {
        const EVENT: EventKind = EventKind::Abandon;
        self.expect(EVENT)?;
        self.advance(EVENT, RentalState::Ended)?;
        self.phone = None;
        Ok(())
    }

    /// Move to `next` if the table allows it.
    ///
    /// Timers owned by the step being left are cancelled here, so every exit
    /// path stops them.
    fn advance(&mut self, event: EventKind, next: RentalState) -> Result<(), RentalError> {
        let from = self.state.phase();
        let to = next.phase();
        if !self.table.permits(&self.state, event, to) {
            return Err(self.reject(event, self.invalid(event)));
        }

        if to != Phase::AwaitingOtp {
            if let Some(mut timer) = self.otp_timer.take() {
                timer.cancel();
            }
        }
        if to != Phase::Active {
            if let Some(mut timer) = self.rental_timer.take() {
                timer.cancel();
            }
        }

        let attempt = self.history.trailing_loops(&from) + 1;
        self.history = self.history.record(StateTransition {
            from,
            to,
            event: event.to_string(),
            timestamp: Utc::now(),
            attempt,
        });
        info!(session = %self.id, %from, %to, %event, attempt, "transition");
        self.state = next;
        Ok(())
    }

    /// Fail fast when the current phase has no edge for `event`.
    fn expect(&self, event: EventKind) -> Result<(), RentalError> {
        if self.table.handles(self.state.phase(), event) {
            Ok(())
        } else {
            Err(self.reject(event, self.invalid(event)))
        }
    }

    fn invalid(&self, event: EventKind) -> RentalError {
        RentalError::InvalidTransition {
            phase: self.state.phase(),
            event,
        }
    }

    fn reject(&self, event: EventKind, error: impl Into<RentalError>) -> RentalError {
        let error = error.into();
        warn!(
            session = %self.id,
            phase = %self.state.phase(),
            %event,
            error = %error,
            "event rejected"
        );
        error
    }

    fn require_phone(&self, event: EventKind) -> Result<PhoneNumber, RentalError> {
        self.phone
            .clone()
            .ok_or_else(|| self.reject(event, self.invalid(event)))
    }

    fn active_locker(&self, event: EventKind) -> Result<LockerId, RentalError> {
        self.state
            .rental()
            .map(|rental| rental.booking.locker_id.clone())
            .ok_or_else(|| self.reject(event, self.invalid(event)))
    }

    fn failed_attempts(&self) -> u32 {
        match self.state {
            RentalState::AwaitingOtp { failed_attempts } => failed_attempts,
            _ => 0,
        }
    }

    fn start_otp_timer(&mut self) {
        self.otp_timer = Some(Countdown::start(
            "otp_resend",
            self.config.resend_cooldown(),
            self.config.tick(),
        ));
    }
}
