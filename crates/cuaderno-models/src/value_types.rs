//! Strongly-typed value types for domain primitives.
//!
//! [`ClassTime`] is a wall-clock time of day with minute precision. It is
//! written to the database and to JSON as `HH:MM`, so lexical order matches
//! chronological order and SQLite's `time()` accepts every stored value.
//!
//! # Example
//!
//! ```ignore
//! use cuaderno_models::value_types::ClassTime;
//!
//! let start: ClassTime = "08:30".parse().unwrap();
//! let end: ClassTime = "10:00".parse().unwrap();
//! assert!(start < end);
//! assert_eq!(start.to_string(), "08:30");
//! ```

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::{Database, Decode, Encode, Sqlite, Type, sqlite::SqliteTypeInfo};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Error type for value type parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTypeError {
    InvalidTime(String),
}

impl std::error::Error for ValueTypeError {}

impl fmt::Display for ValueTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTime(value) => {
                write!(f, "Invalid time '{}', expected HH:MM", value)
            }
        }
    }
}

/// A class start or end time, `HH:MM`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema)]
#[schema(value_type = String, example = "08:30")]
pub struct ClassTime(NaiveTime);

impl ClassTime {
    /// Builds a time from hour and minute, `None` when out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }
}

impl fmt::Debug for ClassTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassTime({})", self)
    }
}

impl fmt::Display for ClassTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for ClassTime {
    type Err = ValueTypeError;

    /// Accepts `HH:MM` and `HH:MM:SS`; seconds are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .ok()
            .and_then(|t| Self::from_hm(t.hour(), t.minute()))
            .ok_or_else(|| ValueTypeError::InvalidTime(s.to_string()))
    }
}

impl Serialize for ClassTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClassTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Type<Sqlite> for ClassTime {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for ClassTime {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as Encode<'q, Sqlite>>::encode(self.to_string(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for ClassTime {
    fn decode(value: <Sqlite as Database>::ValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <&str as Decode<'r, Sqlite>>::decode(value)?;
        Ok(raw.parse()?)
    }
}
