//! Core type definitions with validation.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for malformed input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// An attendance event kind that the ledger does not know.
    #[error("unknown event kind: {value}")]
    UnknownEventKind { value: String },

    /// The end of a date range precedes its start.
    #[error("date range end {end} is before start {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    /// Manual hours must be a finite, non-negative number.
    #[error("invalid manual hours: {value}")]
    InvalidHours { value: String },

    /// A monetary configuration value was negative.
    #[error("{field} cannot be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    /// A shift descriptor that is not `<h:mm am|pm>-<h:mm am|pm>`.
    #[error("invalid shift descriptor: {value}")]
    InvalidShift { value: String },

    /// A payroll amount does not fit in a decimal.
    #[error("{field} overflows for {key}")]
    AmountOverflow { field: &'static str, key: String },

    /// Invalid deduction component name.
    #[error("unknown deduction component: {value}")]
    UnknownDeduction { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

define_string_id!(
    /// A validated employee identifier.
    ///
    /// Employee IDs must be non-blank. Uniqueness is enforced by the directory.
    EmployeeId, "employee ID"
);

define_string_id!(
    /// A validated principal name.
    ///
    /// Principals own employees; every operation is scoped to the employees
    /// linked to the requesting principal.
    Principal, "principal"
);

/// An inclusive range of full calendar days.
///
/// Used both for worked-hours queries and as the pay period of a payroll record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting an end before the start.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns true if `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn employee_id_rejects_blank() {
        assert!(EmployeeId::new("").is_err());
        assert!(EmployeeId::new("   ").is_err());
        assert!(EmployeeId::new("E-001").is_ok());
    }

    #[test]
    fn employee_id_serde_rejects_empty() {
        let result: Result<EmployeeId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());

        let id: EmployeeId = serde_json::from_str("\"E-001\"").unwrap();
        assert_eq!(id.as_str(), "E-001");
    }

    #[test]
    fn principal_parses_from_str() {
        let principal: Principal = "hr-manila".parse().unwrap();
        assert_eq!(principal.to_string(), "hr-manila");
        assert!("".parse::<Principal>().is_err());
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let err = DateRange::new(date(2026, 1, 10), date(2026, 1, 9)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvertedRange {
                start: date(2026, 1, 10),
                end: date(2026, 1, 9),
            }
        );
    }

    #[test]
    fn date_range_single_day_is_valid() {
        let range = DateRange::new(date(2026, 1, 10), date(2026, 1, 10)).unwrap();
        assert!(range.contains(date(2026, 1, 10)));
        assert!(!range.contains(date(2026, 1, 11)));
    }
}
