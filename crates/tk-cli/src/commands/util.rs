//! Shared utilities for CLI commands.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use tk_core::{DateRange, DeductionKind, EmployeeId};

use crate::cli::PeriodArgs;

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a wall-clock timestamp.
///
/// Supports:
/// - "2026-03-02T08:00", "2026-03-02T08:00:30", "2026-03-02T08:00:30.250"
/// - the same with a space instead of `T`
/// - "now", resolved to `now`
pub fn parse_timestamp(s: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        return Ok(now);
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .with_context(|| {
            format!("Invalid timestamp: {s}. Use YYYY-MM-DDTHH:MM[:SS] (e.g., 2026-03-02T08:00) or 'now'")
        })
}

/// Parse a calendar date (`YYYY-MM-DD`).
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {s}. Use YYYY-MM-DD (e.g., 2026-03-01)"))
}

/// Parse `--from`/`--to` into an inclusive range.
pub fn parse_period(period: &PeriodArgs) -> Result<DateRange> {
    let start = parse_date(&period.from)?;
    let end = parse_date(&period.to)?;
    Ok(DateRange::new(start, end)?)
}

pub fn parse_employee_id(s: &str) -> Result<EmployeeId> {
    Ok(EmployeeId::new(s)?)
}

/// Parse a non-negative decimal amount such as a rate.
pub fn parse_amount(field: &str, s: &str) -> Result<Decimal> {
    let value: Decimal = s
        .trim()
        .parse()
        .with_context(|| format!("Invalid {field}: {s}"))?;
    if value.is_sign_negative() && !value.is_zero() {
        bail!("{field} cannot be negative, got {s}");
    }
    Ok(value)
}

/// Parse `component=amount`, e.g. `sss=50`.
pub fn parse_deduction(s: &str) -> Result<(DeductionKind, Decimal)> {
    let Some((component, amount)) = s.split_once('=') else {
        bail!("Invalid deduction: {s}. Use COMPONENT=AMOUNT (e.g., sss=50)");
    };
    let kind: DeductionKind = component.parse()?;
    let amount = parse_amount(kind.as_str(), amount)?;
    Ok((kind, amount))
}

/// Formats a decimal with exactly two places, rounding half away from zero.
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Formats a whole number of minutes as `1h05m` or `15m`.
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h{mins:02}m")
    } else {
        format!("{mins}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-03-02 12:34", "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        for input in [
            "2026-03-02T08:00",
            "2026-03-02T08:00:00",
            "2026-03-02 08:00",
            "2026-03-02 08:00:00.000",
        ] {
            let parsed = parse_timestamp(input, now()).unwrap();
            assert_eq!(parsed.to_string(), "2026-03-02 08:00:00", "{input}");
        }
    }

    #[test]
    fn test_parse_timestamp_now() {
        assert_eq!(parse_timestamp("now", now()).unwrap(), now());
        assert_eq!(parse_timestamp("NOW", now()).unwrap(), now());
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        let err = parse_timestamp("yesterday", now()).unwrap_err();
        assert!(err.to_string().contains("Invalid timestamp"));
        assert!(parse_timestamp("2026-03-02", now()).is_err());
    }

    #[test]
    fn test_parse_period_rejects_inverted() {
        let period = PeriodArgs {
            from: "2026-03-15".to_string(),
            to: "2026-03-01".to_string(),
        };
        assert!(parse_period(&period).is_err());
    }

    #[test]
    fn test_parse_deduction() {
        let (kind, amount) = parse_deduction("SSS=50.5").unwrap();
        assert_eq!(kind, DeductionKind::Sss);
        assert_eq!(amount, Decimal::from_str("50.5").unwrap());
        assert!(parse_deduction("sss").is_err());
        assert!(parse_deduction("bonus=5").is_err());
        assert!(parse_deduction("tin=-5").is_err());
        assert!(parse_deduction("tin=abc").is_err());
    }

    #[test]
    fn test_format_amount_rounds_half_up() {
        assert_eq!(format_amount(Decimal::from_str("2.125").unwrap()), "2.13");
        assert_eq!(format_amount(Decimal::from(17)), "17.00");
        assert_eq!(format_amount(Decimal::from_str("-25").unwrap()), "-25.00");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(15), "15m");
        assert_eq!(format_minutes(65), "1h05m");
        assert_eq!(format_minutes(-3), "0m");
    }
}
