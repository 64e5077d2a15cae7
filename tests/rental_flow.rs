//! End-to-end rental sessions against the simulated collaborators.

use lockerflow::error::{ExternalFailure, Service};
use lockerflow::model::{Ack, Receipt};
use lockerflow::services::simulated::SimulatedBackend;
use lockerflow::services::{PaymentProcessor, VerificationSender};
use lockerflow::{
    EventKind, LockerId, LockerStatus, Money, PaymentMethod, PaymentPlan, Phase, PhoneNumber,
    RentalConfig, RentalError, RentalSession, RentalState, Services, UnlockOutcome,
    ValidationError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

struct DownSender;

impl VerificationSender for DownSender {
    fn send(&self, _phone: &PhoneNumber) -> Result<Ack, ExternalFailure> {
        Err(ExternalFailure::new(Service::VerificationSender, "gateway unreachable"))
    }

    fn check_code(
        &self,
        _phone: &PhoneNumber,
        _code: &lockerflow::model::OtpCode,
    ) -> Result<lockerflow::model::CodeVerdict, ExternalFailure> {
        Err(ExternalFailure::new(Service::VerificationSender, "gateway unreachable"))
    }
}

struct DecliningPayments;

impl PaymentProcessor for DecliningPayments {
    fn charge(&self, _amount: Money, _method: PaymentMethod) -> Result<Receipt, ExternalFailure> {
        Err(ExternalFailure::new(Service::PaymentProcessor, "card declined"))
    }
}

fn setup() -> (RentalSession, SimulatedBackend, Services) {
    let config = RentalConfig::default();
    let backend = SimulatedBackend::new(&config);
    let env = backend.services();
    (RentalSession::new(config).unwrap(), backend, env)
}

async fn to_locker_selection(session: &mut RentalSession, env: &Services) {
    session.request_verification("5551234567", env).await.unwrap();
    session.submit_code("123456", env).await.unwrap();
}

async fn to_active(session: &mut RentalSession, env: &Services, locker: &str, hours: u32) {
    to_locker_selection(session, env).await;
    session.select_locker(locker, env).await.unwrap();
    session.confirm_locker().unwrap();
    session
        .submit_payment(&PaymentPlan::preset(hours, PaymentMethod::Card), env)
        .await
        .unwrap();
    session.enter_pin("1234").unwrap();
    session.confirm_pin("1234", env).await.unwrap();
}

#[tokio::test]
async fn full_rental_reaches_active() {
    let (mut session, backend, env) = setup();

    session.request_verification("5551234567", &env).await.unwrap();
    assert_eq!(session.phase(), Phase::AwaitingOtp);
    assert!(!session.can_resend());

    session.submit_code("123456", &env).await.unwrap();
    assert_eq!(session.phase(), Phase::SelectingLocker);

    session.select_locker("A1", &env).await.unwrap();
    session.confirm_locker().unwrap();
    assert_eq!(session.state().locker_id(), Some(&LockerId::new("A1")));

    session
        .submit_payment(&PaymentPlan::preset(4, PaymentMethod::Card), &env)
        .await
        .unwrap();
    let booking = session.state().booking().unwrap().clone();
    assert_eq!(booking.amount_due(), Money::from_cents(1000));
    assert_eq!(booking.amount_due().to_string(), "$10.00");
    assert_eq!(booking.receipt.amount, booking.amount_due());

    session.enter_pin("1234").unwrap();
    session.confirm_pin("1234", &env).await.unwrap();

    assert_eq!(session.phase(), Phase::Active);
    let rental = session.state().rental().unwrap();
    assert_eq!(rental.ends_at - rental.started_at, chrono::Duration::hours(4));
    assert_eq!(rental.activation.duration_hours, 4);
    assert!(backend.controller.is_armed(&LockerId::new("A1")));
    assert_eq!(backend.payments.charges().len(), 1);
    assert!(session.otp_countdown().is_none());
    assert!(session.rental_countdown().is_some());

    assert_eq!(
        session.history().distinct_path(),
        vec![
            &Phase::Idle,
            &Phase::AwaitingVerification,
            &Phase::AwaitingOtp,
            &Phase::SelectingLocker,
            &Phase::SelectingPaymentPlan,
            &Phase::CreatingPin,
            &Phase::ConfirmingPin,
            &Phase::Active,
        ]
    );
}

#[tokio::test]
async fn occupied_locker_is_a_conflict() {
    let (mut session, _, env) = setup();
    to_locker_selection(&mut session, &env).await;

    let err = session.select_locker("A2", &env).await.unwrap_err();

    assert_eq!(err, RentalError::LockerUnavailable(LockerId::new("A2")));
    assert_eq!(session.state(), &RentalState::SelectingLocker { selected: None });
}

#[tokio::test]
async fn occupied_locker_keeps_earlier_selection() {
    let (mut session, _, env) = setup();
    to_locker_selection(&mut session, &env).await;
    session.select_locker("B1", &env).await.unwrap();

    assert!(session.select_locker("B3", &env).await.is_err());

    assert_eq!(session.state().locker_id(), Some(&LockerId::new("B1")));
}

#[tokio::test]
async fn locker_taken_by_another_renter_cannot_be_selected() {
    let (mut session, backend, env) = setup();
    to_locker_selection(&mut session, &env).await;
    backend
        .lockers
        .set_status(&LockerId::new("A3"), LockerStatus::Occupied);

    let err = session.select_locker("A3", &env).await.unwrap_err();
    assert_eq!(err, RentalError::LockerUnavailable(LockerId::new("A3")));
}

#[tokio::test]
async fn sentinel_code_never_advances() {
    let (mut session, _, env) = setup();
    session.request_verification("5551234567", &env).await.unwrap();

    let err = session.submit_code("555555", &env).await.unwrap_err();

    assert_eq!(err, RentalError::Validation(ValidationError::CodeRejected));
    assert_eq!(session.phase(), Phase::AwaitingOtp);

    session.submit_code("123456", &env).await.unwrap();
    assert_eq!(session.phase(), Phase::SelectingLocker);
}

#[tokio::test]
async fn sentinel_can_be_disabled() {
    let config = RentalConfig::builder()
        .rejection_sentinel(None)
        .build()
        .unwrap();
    let env = Services::simulated(&config);
    let mut session = RentalSession::new(config).unwrap();
    session.request_verification("5551234567", &env).await.unwrap();

    session.submit_code("555555", &env).await.unwrap();
    assert_eq!(session.phase(), Phase::SelectingLocker);
}

#[tokio::test]
async fn pin_mismatch_loops_back_and_recovers() {
    let (mut session, _, env) = setup();
    to_locker_selection(&mut session, &env).await;
    session.select_locker("A1", &env).await.unwrap();
    session.confirm_locker().unwrap();
    session
        .submit_payment(&PaymentPlan::preset(1, PaymentMethod::Upi), &env)
        .await
        .unwrap();

    session.enter_pin("1234").unwrap();
    let err = session.confirm_pin("4321", &env).await.unwrap_err();

    assert_eq!(err, RentalError::PinMismatch);
    assert!(matches!(session.state(), RentalState::CreatingPin { .. }));

    session.enter_pin("9876").unwrap();
    session.confirm_pin("9876", &env).await.unwrap();
    assert_eq!(session.phase(), Phase::Active);
    assert_eq!(session.state().rental().unwrap().pin.as_str(), "9876");
}

#[tokio::test]
async fn incomplete_confirmation_pin_stays_put() {
    let (mut session, _, env) = setup();
    to_locker_selection(&mut session, &env).await;
    session.select_locker("A1", &env).await.unwrap();
    session.confirm_locker().unwrap();
    session
        .submit_payment(&PaymentPlan::preset(1, PaymentMethod::Card), &env)
        .await
        .unwrap();
    session.enter_pin("1234").unwrap();

    let err = session.confirm_pin("12", &env).await.unwrap_err();

    assert_eq!(err, RentalError::Validation(ValidationError::IncompletePin));
    assert_eq!(session.phase(), Phase::ConfirmingPin);
}

#[tokio::test(start_paused = true)]
async fn going_back_from_otp_cancels_the_timer() {
    let (mut session, _, env) = setup();
    session.request_verification("5551234567", &env).await.unwrap();
    let ticks = session.otp_countdown().unwrap().subscribe();

    time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(*ticks.borrow(), 58);

    session.go_back().unwrap();
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.otp_countdown().is_none());
    assert!(session.phone().is_none());

    time::sleep(Duration::from_secs(10)).await;
    assert_eq!(*ticks.borrow(), 58);
}

#[tokio::test(start_paused = true)]
async fn abandoning_during_otp_cancels_the_timer() {
    let (mut session, _, env) = setup();
    session.request_verification("5551234567", &env).await.unwrap();
    let ticks = session.otp_countdown().unwrap().subscribe();

    time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(*ticks.borrow(), 58);

    session.abandon().unwrap();
    assert!(session.is_final());
    assert!(session.otp_countdown().is_none());

    time::sleep(Duration::from_secs(10)).await;
    assert_eq!(*ticks.borrow(), 58);
}

#[tokio::test(start_paused = true)]
async fn leaving_otp_forward_also_cancels_the_timer() {
    let (mut session, _, env) = setup();
    session.request_verification("5551234567", &env).await.unwrap();
    let ticks = session.otp_countdown().unwrap().subscribe();

    time::sleep(Duration::from_millis(1500)).await;
    session.submit_code("123456", &env).await.unwrap();
    time::sleep(Duration::from_secs(5)).await;

    assert_eq!(*ticks.borrow(), 59);
}

#[tokio::test(start_paused = true)]
async fn resend_waits_for_the_cooldown() {
    let (mut session, backend, env) = setup();
    session.request_verification("5551234567", &env).await.unwrap();

    time::sleep(Duration::from_secs(20)).await;
    let err = session.resend(&env).await.unwrap_err();
    assert_eq!(err, RentalError::ResendCooldown { remaining_secs: 40 });
    assert!(err.is_retryable());

    time::sleep(Duration::from_secs(40)).await;
    assert!(session.can_resend());
    session.resend(&env).await.unwrap();

    assert_eq!(backend.sender.sent_to().len(), 2);
    assert_eq!(session.phase(), Phase::AwaitingOtp);
    assert_eq!(session.resend_remaining(), Some(Duration::from_secs(60)));
    assert!(!session.can_resend());
}

#[tokio::test(start_paused = true)]
async fn rental_clock_counts_down() {
    let (mut session, _, env) = setup();
    to_active(&mut session, &env, "A1", 1).await;

    time::sleep(Duration::from_secs(600)).await;
    assert_eq!(session.time_remaining(), Some(Duration::from_secs(3000)));

    time::sleep(Duration::from_secs(3000)).await;
    assert!(session.is_expired());
    assert_eq!(session.view().rental.unwrap().time_remaining.as_deref(), Some("00:00:00"));
}

#[tokio::test]
async fn unlock_checks_the_pin() {
    let (mut session, _, env) = setup();
    to_active(&mut session, &env, "B2", 2).await;

    assert_eq!(session.unlock("0000", &env).await.unwrap(), UnlockOutcome::Denied);
    assert_eq!(session.unlock("1234", &env).await.unwrap(), UnlockOutcome::Unlocked);
    assert_eq!(session.phase(), Phase::Active);
    assert_eq!(
        session.history().last().unwrap().event,
        EventKind::Unlock.to_string()
    );
}

#[tokio::test]
async fn extension_pays_again_for_the_same_locker() {
    let (mut session, backend, env) = setup();
    to_active(&mut session, &env, "A1", 4).await;

    session.extend_rental().unwrap();
    assert_eq!(session.phase(), Phase::SelectingPaymentPlan);
    assert!(session.state().is_extending());
    assert_eq!(session.state().locker_id(), Some(&LockerId::new("A1")));
    assert!(session.rental_countdown().is_none());
    assert!(session.abandon().is_err());

    session
        .submit_payment(&PaymentPlan::custom("3", PaymentMethod::Wallet), &env)
        .await
        .unwrap();
    let booking = session.state().booking().unwrap();
    assert!(booking.extension);
    assert_eq!(booking.amount_due(), Money::from_cents(750));

    session.enter_pin("1234").unwrap();
    session.confirm_pin("1234", &env).await.unwrap();
    assert_eq!(session.phase(), Phase::Active);
    assert_eq!(backend.payments.charges().len(), 2);
}

#[tokio::test]
async fn declined_extension_can_return_to_the_running_rental() {
    let (mut session, backend, env) = setup();
    to_active(&mut session, &env, "A1", 4).await;
    let original = session.state().rental().cloned().unwrap();

    session.extend_rental().unwrap();
    let mut declining = backend.services();
    declining.payments = Arc::new(DecliningPayments);
    let err = session
        .submit_payment(&PaymentPlan::preset(2, PaymentMethod::Card), &declining)
        .await
        .unwrap_err();
    assert!(matches!(err, RentalError::External(_)));
    assert!(session.state().is_extending());

    session.go_back().unwrap();

    assert_eq!(session.phase(), Phase::Active);
    let rental = session.state().rental().unwrap();
    assert_eq!(rental, &original);
    assert_eq!(rental.ends_at, original.ends_at);
    assert!(session.rental_countdown().is_some());
    let left = session.time_remaining().unwrap();
    assert!(left <= Duration::from_secs(4 * 3600));
    assert!(left > Duration::from_secs(4 * 3600 - 60));
    assert_eq!(
        session.history().last().unwrap().event,
        EventKind::GoBack.to_string()
    );

    session.end_rental(true, &env).await.unwrap();
    assert!(session.is_final());
}

#[tokio::test]
async fn ending_requires_confirmation_and_releases_the_locker() {
    let (mut session, backend, env) = setup();
    to_active(&mut session, &env, "A1", 4).await;

    let err = session.end_rental(false, &env).await.unwrap_err();
    assert_eq!(err, RentalError::Validation(ValidationError::ConfirmationRequired));
    assert_eq!(session.phase(), Phase::Active);

    session.end_rental(true, &env).await.unwrap();

    assert_eq!(session.phase(), Phase::Ended);
    assert!(session.is_final());
    assert!(session.rental_countdown().is_none());
    assert!(session.phone().is_none());
    assert!(!backend.controller.is_armed(&LockerId::new("A1")));
}

#[tokio::test]
async fn ended_session_rejects_every_event() {
    let (mut session, _, env) = setup();
    session.abandon().unwrap();

    let err = session
        .request_verification("5551234567", &env)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RentalError::InvalidTransition {
            phase: Phase::Ended,
            event: EventKind::RequestVerification,
        }
    );
}

#[tokio::test]
async fn sender_failure_returns_to_idle() {
    let (mut session, backend, _) = setup();
    let mut env = backend.services();
    env.sender = Arc::new(DownSender);

    let err = session
        .request_verification("5551234567", &env)
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(err, RentalError::External(_)));
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.otp_countdown().is_none());

    session
        .request_verification("5551234567", &backend.services())
        .await
        .unwrap();
    assert_eq!(session.phase(), Phase::AwaitingOtp);
}

#[tokio::test]
async fn declined_payment_stays_on_payment_step() {
    let (mut session, backend, env) = setup();
    to_locker_selection(&mut session, &env).await;
    session.select_locker("A1", &env).await.unwrap();
    session.confirm_locker().unwrap();

    let mut declining = backend.services();
    declining.payments = Arc::new(DecliningPayments);
    let plan = PaymentPlan::preset(2, PaymentMethod::Card);

    let err = session.submit_payment(&plan, &declining).await.unwrap_err();
    assert_eq!(
        err,
        RentalError::External(ExternalFailure::new(Service::PaymentProcessor, "card declined"))
    );
    assert_eq!(session.phase(), Phase::SelectingPaymentPlan);

    session.submit_payment(&plan, &env).await.unwrap();
    assert_eq!(session.phase(), Phase::CreatingPin);
}

#[tokio::test]
async fn custom_durations_are_checked() {
    let (mut session, _, env) = setup();
    to_locker_selection(&mut session, &env).await;
    session.select_locker("A1", &env).await.unwrap();
    session.confirm_locker().unwrap();

    for raw in ["0", "abc", "-2"] {
        let err = session
            .submit_payment(&PaymentPlan::custom(raw, PaymentMethod::Card), &env)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RentalError::Validation(ValidationError::InvalidCustomDuration(raw.to_string()))
        );
    }
    assert_eq!(session.phase(), Phase::SelectingPaymentPlan);
}

#[tokio::test]
async fn events_out_of_order_are_rejected() {
    let (mut session, _, env) = setup();

    assert!(matches!(
        session.confirm_locker(),
        Err(RentalError::InvalidTransition { phase: Phase::Idle, .. })
    ));
    assert!(matches!(
        session.submit_code("123456", &env).await,
        Err(RentalError::InvalidTransition { phase: Phase::Idle, .. })
    ));
    assert!(session.extend_rental().is_err());
    assert!(session.go_back().is_err());
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.history().transitions().is_empty());
}
