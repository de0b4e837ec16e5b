//! Serde helpers for query-string parameters.
//!
//! Filter structs are deserialized by axum's `Query` extractor, and most of
//! them `#[serde(flatten)]` the pagination parameters. Flattening buffers every
//! value as a string, so numeric and boolean fields have to be parsed by hand.

use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrValue<T> {
    String(String),
    Value(T),
}

/// Deserializes an optional value that may arrive either as its native JSON
/// type or as a string. Empty strings are treated as `None`.
pub fn deserialize_optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    match Option::<StringOrValue<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(StringOrValue::String(s)) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(StringOrValue::Value(v)) => Ok(Some(v)),
    }
}

/// Deserializes an optional free-text filter, treating blank strings as `None`.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.filter(|s| !s.trim().is_empty()))
}

/// Deserializes a nullable field of a partial update. Combined with
/// `#[serde(default)]`, an absent field stays `None` while an explicit
/// `null` becomes `Some(None)` and clears the stored value.
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
