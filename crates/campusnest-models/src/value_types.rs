//! Validated value types for domain primitives.
//!
//! # Example
//!
//! ```ignore
//! use campusnest_models::value_types::IdNumber;
//!
//! let id: IdNumber = "9001015009087".parse().unwrap();
//! assert_eq!(id.as_str(), "9001015009087");
//! assert!("12345".parse::<IdNumber>().is_err());
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Error type for value type parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueTypeError {
    /// The national ID number is invalid.
    #[error("Invalid ID number: {0}")]
    InvalidIdNumber(String),
}

// ============================================================================
// IdNumber
// ============================================================================

/// A student's national identity number: exactly 13 ASCII digits.
///
/// This is the natural key used for duplicate detection across every
/// persisted student.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "9001015009087")]
pub struct IdNumber(String);

impl IdNumber {
    /// Number of digits in a valid ID number.
    pub const LENGTH: usize = 13;

    /// Create a new IdNumber, validating length and digits.
    pub fn new(id_number: impl Into<String>) -> Result<Self, ValueTypeError> {
        let id_number = id_number.into();
        Self::validate(&id_number)?;
        Ok(Self(id_number))
    }

    /// Create an IdNumber without validation.
    ///
    /// Intended for values that already passed row validation or come from
    /// the database.
    #[inline]
    pub fn new_unchecked(id_number: impl Into<String>) -> Self {
        Self(id_number.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// True when `value` has exactly [`Self::LENGTH`] characters.
    pub fn has_valid_length(value: &str) -> bool {
        value.chars().count() == Self::LENGTH
    }

    /// True when `value` is non-empty and made of ASCII digits only.
    pub fn is_all_digits(value: &str) -> bool {
        !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
    }

    fn validate(id_number: &str) -> Result<(), ValueTypeError> {
        if id_number.is_empty() {
            return Err(ValueTypeError::InvalidIdNumber(
                "ID number cannot be empty".into(),
            ));
        }

        if !Self::is_all_digits(id_number) {
            return Err(ValueTypeError::InvalidIdNumber(format!(
                "'{}' must contain digits only",
                id_number
            )));
        }

        if !Self::has_valid_length(id_number) {
            return Err(ValueTypeError::InvalidIdNumber(format!(
                "'{}' must be exactly {} digits",
                id_number,
                Self::LENGTH
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for IdNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdNumber({})", self.0)
    }
}

impl fmt::Display for IdNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IdNumber {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for IdNumber {
    type Error = ValueTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for IdNumber {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<IdNumber> for String {
    fn from(id_number: IdNumber) -> String {
        id_number.0
    }
}

impl Type<sqlx::Postgres> for IdNumber {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, sqlx::Postgres> for IdNumber {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for IdNumber {
    fn decode(
        value: <sqlx::Postgres as Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as Decode<'r, sqlx::Postgres>>::decode(value)?;
        // The unique column only ever receives validated values
        Ok(Self::new_unchecked(s))
    }
}

impl PgHasArrayType for IdNumber {
    fn array_type_info() -> PgTypeInfo {
        <String as PgHasArrayType>::array_type_info()
    }
}

impl<'de> Deserialize<'de> for IdNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
