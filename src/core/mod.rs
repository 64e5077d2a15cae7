//! Pure building blocks of the rental state machine:
//! - the `State` trait
//! - `Guard` predicates attached to transition edges
//! - the immutable `StateHistory` audit trail
//!
//! Nothing in this module performs I/O or touches a clock other than to
//! stamp history entries handed to it.

mod guard;
mod history;
mod state;

pub use guard::Guard;
pub use history::{StateHistory, StateTransition};
pub use state::State;
