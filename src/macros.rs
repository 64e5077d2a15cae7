//! Macros for declaring unit state enums.

/// Declare a unit-variant enum and implement [`State`](crate::core::State),
/// `Display` and an `ALL` constant listing every variant in declaration
/// order.
///
/// # Example
///
/// ```
/// use lockerflow::state_enum;
/// use lockerflow::core::State;
///
/// state_enum! {
///     #[derive(Copy, Eq, Hash)]
///     pub enum DoorState {
///         Locked,
///         Unlocked,
///         Jammed,
///     }
///     final: [Jammed]
///     error: [Jammed]
/// }
///
/// assert_eq!(DoorState::ALL.len(), 3);
/// assert_eq!(DoorState::Unlocked.to_string(), "Unlocked");
/// assert!(DoorState::Jammed.is_error());
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
        $(error: [$($error:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            $vis const ALL: &'static [$name] = &[$($name::$variant),*];

            /// Variant name with a `'static` lifetime.
            $vis fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                self.as_str()
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    _ => false,
                }
            }

            fn is_error(&self) -> bool {
                match self {
                    $($(Self::$error => true,)*)?
                    _ => false,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::core::State::name(self))
            }
        }
    };
}
