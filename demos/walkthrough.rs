//! Locker Rental Walkthrough
//!
//! This example drives one rental session from phone verification to the
//! end of the rental against the simulated backend.
//!
//! Key concepts:
//! - Tagged-variant rental states (Idle -> ... -> Active -> Ended)
//! - Collaborators supplied through the `Services` environment
//! - Recoverable errors that never leave the session in a broken step
//! - Cancellable countdowns for the resend cooldown and the rental clock
//!
//! Run with: RUST_LOG=lockerflow=debug cargo run --example walkthrough

use lockerflow::services::simulated::SimulatedBackend;
use lockerflow::view::{format_clock, format_remaining};
use lockerflow::{
    PaymentMethod, PaymentPlan, RentalConfig, RentalError, RentalSession, UnlockOutcome,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn report(step: &str, result: &Result<(), RentalError>) {
    match result {
        Ok(()) => println!("  {step}: ok"),
        Err(e) => println!("  {step}: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lockerflow=info")),
        )
        .with_target(false)
        .try_init();

    println!("=== Locker Rental Walkthrough ===\n");

    let config = RentalConfig::builder()
        .resend_cooldown(Duration::from_secs(2))
        .tick(Duration::from_millis(500))
        .build()?;
    let backend = SimulatedBackend::new(&config);
    let env = backend.services();
    let mut session = RentalSession::new(config)?;

    println!("1. Phone verification");
    report("phone 555-1234", &session.request_verification("555-1234", &env).await);
    report(
        "phone (555) 123-4567",
        &session.request_verification("(555) 123-4567", &env).await,
    );
    let view = session.view();
    println!(
        "  code sent to {}, resend in {}",
        view.phone_masked.unwrap_or_default(),
        view.resend_in.unwrap_or_default()
    );

    println!("\n2. Code entry");
    report("code 555555", &session.submit_code("555555", &env).await);
    report("resend", &session.resend(&env).await);
    tokio::time::sleep(Duration::from_secs(2)).await;
    report("resend after cooldown", &session.resend(&env).await);
    report("code 123456", &session.submit_code("123456", &env).await);

    println!("\n3. Locker selection");
    for locker in session.available_lockers(&env).await? {
        let mark = if locker.is_available() { "free" } else { "taken" };
        print!(" {}:{}", locker.id, mark);
    }
    println!();
    report("select A2", &session.select_locker("A2", &env).await);
    report("select A1", &session.select_locker("A1", &env).await);
    report("confirm", &session.confirm_locker());

    println!("\n4. Payment");
    let bad = PaymentPlan::custom("abc", PaymentMethod::Card);
    report("custom 'abc' hours", &session.submit_payment(&bad, &env).await);
    println!("  4 hours cost {}", session.quote(4));
    let plan = PaymentPlan::preset(4, PaymentMethod::Card);
    report("4 hours by card", &session.submit_payment(&plan, &env).await);

    println!("\n5. PIN");
    report("create 1234", &session.enter_pin("1234"));
    report("confirm 4321", &session.confirm_pin("4321", &env).await);
    report("create 1234", &session.enter_pin("1234"));
    report("confirm 1234", &session.confirm_pin("1234", &env).await);

    println!("\n6. Active rental");
    if let Some(rental) = session.view().rental {
        println!(
            "  locker {} for {}h, paid {} by {}, {} left",
            rental.locker_id,
            rental.duration_hours,
            rental.amount,
            rental.method.label(),
            rental.time_remaining.unwrap_or_default()
        );
    }
    match session.unlock("1234", &env).await? {
        UnlockOutcome::Unlocked => println!("  locker opened"),
        UnlockOutcome::Denied => println!("  wrong PIN"),
    }

    println!("\n7. Extension");
    report("extend", &session.extend_rental());
    let plan = PaymentPlan::preset(2, PaymentMethod::Wallet);
    report("2 hours by wallet", &session.submit_payment(&plan, &env).await);
    report("create 1234", &session.enter_pin("1234"));
    report("confirm 1234", &session.confirm_pin("1234", &env).await);
    if let Some(left) = session.time_remaining() {
        println!("  {} left", format_remaining(left));
    }

    println!("\n8. End");
    report("end without confirming", &session.end_rental(false, &env).await);
    report("end", &session.end_rental(true, &env).await);

    println!("\nPath:");
    for transition in session.history().transitions() {
        println!(
            "  {} --{}--> {} (attempt {})",
            transition.from, transition.event, transition.to, transition.attempt
        );
    }
    println!(
        "\nCharges: {}, session lasted {}",
        backend.payments.charges().len(),
        format_clock(session.history().duration().unwrap_or_default())
    );

    Ok(())
}
