//! Serde helpers for money fields that must hold whole units.
//!
//! JSON clients routinely send `100.0` for `100`; both are accepted, while
//! `100.5`, strings and booleans are rejected.

use std::fmt;

use serde::{
    Deserializer,
    de::{self, Visitor},
};

struct WholeNumberVisitor;

impl<'de> Visitor<'de> for WholeNumberVisitor {
    type Value = i64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a whole number")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
        i64::try_from(value).map_err(|_| E::custom(format!("{value} is too large")))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(E::custom(format!("{value} is not a whole number")));
        }
        if value < i64::MIN as f64 || value > i64::MAX as f64 {
            return Err(E::custom(format!("{value} is out of range")));
        }
        Ok(value as i64)
    }
}

struct OptionalWholeNumberVisitor;

impl<'de> Visitor<'de> for OptionalWholeNumberVisitor {
    type Value = Option<i64>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a whole number or null")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(WholeNumberVisitor).map(Some)
    }
}

/// `Option<i64>` where `null` and a missing field both mean "no value".
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(OptionalWholeNumberVisitor)
}

/// PATCH semantics: a missing field stays `None` (via `#[serde(default)]`),
/// an explicit `null` becomes `Some(None)`.
pub fn deserialize_patch<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional(deserializer).map(Some)
}
