//! The `State` trait shared by every state enum in the crate.
//!
//! States are plain values. Inspecting them never has side effects, which
//! keeps guards and history free of I/O.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine states.
///
/// Implemented by the unit [`Phase`](crate::flow::Phase) discriminant (via
/// [`state_enum!`](crate::state_enum)) and by the data-carrying
/// [`RentalState`](crate::flow::RentalState).
///
/// # Example
///
/// ```rust
/// use lockerflow::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum DoorState {
///     Locked,
///     Unlocked,
///     Jammed,
/// }
///
/// impl State for DoorState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Locked => "Locked",
///             Self::Unlocked => "Unlocked",
///             Self::Jammed => "Jammed",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Jammed)
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Jammed)
///     }
/// }
///
/// assert!(DoorState::Jammed.is_final());
/// assert!(!DoorState::Locked.is_error());
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Name used in logs and history.
    fn name(&self) -> &str;

    /// Terminal states accept no further events.
    ///
    /// Defaults to `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Error states describe a failed flow. Usually also final, though
    /// nothing enforces that.
    ///
    /// Defaults to `false`.
    fn is_error(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum DoorState {
        Locked,
        Unlocked,
        Jammed,
    }

    impl State for DoorState {
        fn name(&self) -> &str {
            match self {
                Self::Locked => "Locked",
                Self::Unlocked => "Unlocked",
                Self::Jammed => "Jammed",
            }
        }

        fn is_final(&self) -> bool {
            matches!(self, Self::Jammed)
        }

        fn is_error(&self) -> bool {
            matches!(self, Self::Jammed)
        }
    }

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct Plain;

    impl State for Plain {
        fn name(&self) -> &str {
            "Plain"
        }
    }

    #[test]
    fn names_are_reported() {
        assert_eq!(DoorState::Locked.name(), "Locked");
        assert_eq!(DoorState::Unlocked.name(), "Unlocked");
        assert_eq!(DoorState::Jammed.name(), "Jammed");
    }

    #[test]
    fn defaults_are_neither_final_nor_error() {
        assert!(!Plain.is_final());
        assert!(!Plain.is_error());
    }

    #[test]
    fn overrides_take_effect() {
        assert!(!DoorState::Locked.is_final());
        assert!(DoorState::Jammed.is_final());
        assert!(DoorState::Jammed.is_error());
    }

    #[test]
    fn state_survives_json() {
        let json = serde_json::to_string(&DoorState::Unlocked).unwrap();
        let back: DoorState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DoorState::Unlocked);
    }
}
