//! Strongly-typed ID newtypes for domain entities.
//!
//! Every table uses an `INTEGER PRIMARY KEY`, and each entity gets its own
//! wrapper around `i64` so a `SubjectId` can never be passed where a
//! `CommissionId` is expected.
//!
//! # Example
//!
//! ```ignore
//! use cuaderno_models::ids::{SubjectId, CommissionId};
//!
//! fn get_subject(id: SubjectId) { /* ... */ }
//!
//! get_subject(SubjectId::new(3));       // OK
//! // get_subject(CommissionId::new(3)); // Compile error! Type mismatch.
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Sqlite, Type,
    sqlite::SqliteTypeInfo,
};
use std::fmt;
use utoipa::ToSchema;

/// Macro to define a strongly-typed ID newtype over an SQLite row id.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
        #[schema(value_type = i64, example = 1)]
        pub struct $name(pub i64);

        impl $name {
            #[inline]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[inline]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            #[inline]
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            #[inline]
            fn from(id: $name) -> i64 {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl Type<Sqlite> for $name {
            fn type_info() -> SqliteTypeInfo {
                <i64 as Type<Sqlite>>::type_info()
            }

            fn compatible(ty: &SqliteTypeInfo) -> bool {
                <i64 as Type<Sqlite>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, Sqlite> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <i64 as Encode<'q, Sqlite>>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> Decode<'r, Sqlite> for $name {
            fn decode(
                value: <Sqlite as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                <i64 as Decode<'r, Sqlite>>::decode(value).map(Self)
            }
        }

        // Transparent so JSON bodies carry plain numbers.
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                i64::deserialize(deserializer).map(Self)
            }
        }
    };
}

define_id!(
    /// Strongly-typed ID for User entities.
    UserId
);

define_id!(
    /// Strongly-typed ID for Subject entities.
    SubjectId
);

define_id!(
    /// Strongly-typed ID for Commission entities.
    CommissionId
);

define_id!(
    /// Strongly-typed ID for Schedule entities.
    ScheduleId
);

define_id!(
    /// Strongly-typed ID for Content entities.
    ContentId
);

define_id!(
    /// Strongly-typed ID for Evaluation entities.
    EvaluationId
);

define_id!(
    /// Strongly-typed ID for Grade entities.
    GradeId
);

define_id!(
    /// Strongly-typed ID for Notification entities.
    NotificationId
);
