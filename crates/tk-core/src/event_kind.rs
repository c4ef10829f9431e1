//! Attendance event kinds as the single source of truth for event strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::ValidationError;

/// The four punches an employee can record against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CheckIn,
    BreakOut,
    BreakIn,
    CheckOut,
}

impl EventKind {
    /// String representation for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CheckIn => "check_in",
            Self::BreakOut => "break_out",
            Self::BreakIn => "break_in",
            Self::CheckOut => "check_out",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "check_in" | "checkin" | "in" => Ok(Self::CheckIn),
            "break_out" | "breakout" => Ok(Self::BreakOut),
            "break_in" | "breakin" => Ok(Self::BreakIn),
            "check_out" | "checkout" | "out" => Ok(Self::CheckOut),
            _ => Err(ValidationError::UnknownEventKind {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        let variants = [
            EventKind::CheckIn,
            EventKind::BreakOut,
            EventKind::BreakIn,
            EventKind::CheckOut,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed: EventKind = s.parse().expect("should parse");
            assert_eq!(parsed, *variant, "roundtrip failed for {variant:?}");
        }
    }

    #[test]
    fn cli_spellings_parse() {
        assert_eq!("check-in".parse::<EventKind>().unwrap(), EventKind::CheckIn);
        assert_eq!("Break-Out".parse::<EventKind>().unwrap(), EventKind::BreakOut);
        assert_eq!("breakin".parse::<EventKind>().unwrap(), EventKind::BreakIn);
        assert_eq!("out".parse::<EventKind>().unwrap(), EventKind::CheckOut);
    }

    #[test]
    fn unknown_kind_errors() {
        let err = "lunch".parse::<EventKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown event kind: lunch");
    }
}
