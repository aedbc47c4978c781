//! Monetary wire format
//!
//! Amounts are `f64` in memory and in SQLite, but travel over the wire as
//! decimal strings with two places (`"12.50"`) so clients never see binary
//! floating-point drift. Deserialization accepts either a string or a JSON
//! number.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// Decimal places for all currency amounts
pub const DECIMAL_PLACES: u32 = 2;

/// Format an amount as a 2-dp decimal string (half-up)
pub fn format_amount(value: f64) -> String {
    let d = Decimal::from_f64(value).unwrap_or_default();
    let rounded = d.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Parse a decimal string into an amount
pub fn parse_amount(value: &str) -> Option<f64> {
    Decimal::from_str(value.trim()).ok().and_then(|d| d.to_f64())
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        parse_amount(v).ok_or_else(|| E::custom(format!("invalid amount: {v}")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }
}

/// `#[serde(with = "shared::money::amount")]`
pub mod amount {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_amount(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        d.deserialize_any(AmountVisitor)
    }
}

/// `#[serde(with = "shared::money::option_amount")]`
pub mod option_amount {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_str(&format_amount(*v)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        struct OptVisitor;

        impl<'de> Visitor<'de> for OptVisitor {
            type Value = Option<f64>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("null, a decimal string or number")
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
                d.deserialize_any(AmountVisitor).map(Some)
            }
        }

        d.deserialize_option(OptVisitor)
    }
}
