//! Lockerflow: a locker rental session as a pure state machine.
//!
//! Lockerflow follows Stillwater's "pure core, imperative shell" split. The
//! workflow itself (states, the transition table, validation rules, pricing)
//! is made of pure values and functions. Calls to the outside world
//! (verification codes, locker listings, payments, the locker hardware) are
//! Stillwater effects run by [`RentalSession`] against a [`Services`]
//! environment.
//!
//! # Core Concepts
//!
//! - **State**: [`RentalState`] carries only the data valid for its step;
//!   [`Phase`] is its data-free tag
//! - **Transitions**: a declarative [`TransitionTable`] with [`Guard`]s
//! - **History**: immutable [`StateHistory`] of accepted events
//! - **Timers**: cancellable [`Countdown`]s for the OTP resend cooldown and
//!   the rental clock
//!
//! # Example
//!
//! ```rust
//! use lockerflow::{PaymentMethod, PaymentPlan, Phase, RentalConfig, RentalSession, Services};
//!
//! # async fn walk() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RentalConfig::default();
//! let env = Services::simulated(&config);
//! let mut session = RentalSession::new(config)?;
//!
//! session.request_verification("(555) 123-4567", &env).await?;
//! session.submit_code("123456", &env).await?;
//! session.select_locker("A1", &env).await?;
//! session.confirm_locker()?;
//! session
//!     .submit_payment(&PaymentPlan::preset(4, PaymentMethod::Card), &env)
//!     .await?;
//! session.enter_pin("1234")?;
//! session.confirm_pin("1234", &env).await?;
//!
//! assert_eq!(session.phase(), Phase::Active);
//! assert_eq!(session.state().booking().unwrap().amount_due().to_string(), "$10.00");
//! # Ok(())
//! # }
//! # tokio::runtime::Builder::new_current_thread()
//! #     .enable_all()
//! #     .build()
//! #     .unwrap()
//! #     .block_on(walk())
//! #     .unwrap();
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod flow;
mod macros;
pub mod model;
pub mod services;
pub mod session;
pub mod timer;
pub mod validation;
pub mod view;

// Re-export commonly used types
pub use config::{ConfigError, RentalConfig, RentalConfigBuilder};
pub use core::{Guard, State, StateHistory, StateTransition};
pub use error::{ExternalFailure, RentalError, Service, ValidationError};
pub use flow::{EventKind, Phase, RentalState, TransitionTable};
pub use model::{
    DurationChoice, Locker, LockerId, LockerStatus, Money, PaymentMethod, PaymentPlan,
    PhoneNumber, Pin, Rental, UnlockOutcome,
};
pub use services::Services;
pub use session::RentalSession;
pub use timer::Countdown;
pub use view::SessionView;
