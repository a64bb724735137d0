//! Concrete workflow definitions registered with the engine.

/// Declares a closed vocabulary of state or trigger names.
macro_rules! vocabulary {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const fn ordered() -> &'static [Self] {
                &[$(Self::$variant),+]
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.name()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

pub mod change_of_name;
pub mod shared;
pub mod sole_to_joint;

/// Team that owns a process until it needs a manager's decision.
pub const HOUSING_OFFICER_TEAM: &str = "housing-officer";
/// Team that signs off tenure investigations.
pub const AREA_MANAGER_TEAM: &str = "area-housing-manager";
