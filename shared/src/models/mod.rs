//! Data models
//!
//! Shared between dispatch-server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes; timestamps are Unix milliseconds.

/// `as_str` / `FromStr` / `Display` for the snake_case status enums
macro_rules! impl_str_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s,)+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    other => Err($crate::models::UnknownVariant::new($kind, other)),
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod branch;
pub mod delivery;
pub mod delivery_charges;
pub mod inventory;
pub mod kitchen_ticket;
pub mod loyalty;
pub mod order;
pub mod pos_session;
pub mod rider;

// Re-exports
pub use branch::*;
pub use delivery::*;
pub use delivery_charges::*;
pub use inventory::*;
pub use kitchen_ticket::*;
pub use loyalty::*;
pub use order::*;
pub use pos_session::*;
pub use rider::*;

/// Error returned by the `FromStr` impls of model enums
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
