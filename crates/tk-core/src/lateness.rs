//! Lateness evaluation against a configured shift window.
//!
//! Shifts are described as `"<start>-<end>"` with 12-hour clock bounds, e.g.
//! `"9:00am-5:00pm"`. Only the start bound matters for lateness. A graveyard
//! shift starting in the early morning is compared against its next
//! occurrence when the employee checks in late in the evening.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;

use crate::types::ValidationError;

/// Pre-compiled regex for a single 12-hour clock bound.
static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([ap])\.?m\.?$").unwrap());

/// Shift starts before this hour are treated as graveyard starts.
const GRAVEYARD_START_BEFORE_HOUR: u32 = 5;

/// Check-ins from this hour on are matched against the next day's graveyard start.
const LATE_EVENING_FROM_HOUR: u32 = 20;

/// A parsed shift window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ShiftWindow {
    /// The shift start this check-in is measured against.
    pub fn shift_start_for(&self, check_in: NaiveDateTime) -> NaiveDateTime {
        let start = check_in.date().and_time(self.start);
        if self.start.hour() < GRAVEYARD_START_BEFORE_HOUR
            && check_in.hour() >= LATE_EVENING_FROM_HOUR
        {
            start + Duration::days(1)
        } else {
            start
        }
    }

    /// Late when the check-in is strictly after the shift start.
    pub fn is_late(&self, check_in: NaiveDateTime) -> bool {
        check_in > self.shift_start_for(check_in)
    }

    /// How late the check-in was, if at all.
    pub fn late_by(&self, check_in: NaiveDateTime) -> Option<Duration> {
        let start = self.shift_start_for(check_in);
        (check_in > start).then(|| check_in - start)
    }
}

impl FromStr for ShiftWindow {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidShift {
            value: s.to_string(),
        };
        let (start, end) = s.split_once('-').ok_or_else(invalid)?;
        Ok(Self {
            start: parse_clock(start).ok_or_else(invalid)?,
            end: parse_clock(end).ok_or_else(invalid)?,
        })
    }
}

impl fmt::Display for ShiftWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%-I:%M%P"),
            self.end.format("%-I:%M%P")
        )
    }
}

/// Parses `h:mm am|pm` into a 24-hour time.
fn parse_clock(s: &str) -> Option<NaiveTime> {
    let caps = CLOCK_RE.captures(s.trim())?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let pm = caps[3].eq_ignore_ascii_case("p");
    let hour = hour % 12 + if pm { 12 } else { 0 };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Evaluates lateness for a raw shift descriptor.
///
/// Unparseable descriptors are never late: the flag is informational only.
pub fn is_late(shift: &str, check_in: NaiveDateTime) -> bool {
    match shift.parse::<ShiftWindow>() {
        Ok(window) => window.is_late(check_in),
        Err(err) => {
            tracing::debug!(error = %err, "skipping lateness check");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_ordinary_shift() {
        let window: ShiftWindow = "9:00am-5:00pm".parse().unwrap();
        assert_eq!(window.start, time(9, 0));
        assert_eq!(window.end, time(17, 0));
        assert_eq!(window.to_string(), "9:00am-5:00pm");
    }

    #[test]
    fn parses_loose_spelling() {
        let window: ShiftWindow = " 10:30 PM - 6:45 a.m. ".parse().unwrap();
        assert_eq!(window.start, time(22, 30));
        assert_eq!(window.end, time(6, 45));
    }

    #[test]
    fn twelve_oclock_bounds_normalize() {
        let window: ShiftWindow = "12:00am-12:30pm".parse().unwrap();
        assert_eq!(window.start, time(0, 0));
        assert_eq!(window.end, time(12, 30));
    }

    #[test]
    fn rejects_malformed_descriptors() {
        for shift in ["", "whenever", "9am-5pm", "13:00pm-5:00pm", "9:75am-5:00pm", "9:00am"] {
            assert!(shift.parse::<ShiftWindow>().is_err(), "{shift} should not parse");
        }
    }

    #[test]
    fn ordinary_shift_lateness() {
        assert!(is_late("9:00am-5:00pm", ts("2026-03-02 09:01")));
        assert!(!is_late("9:00am-5:00pm", ts("2026-03-02 08:59")));
        assert!(!is_late("9:00am-5:00pm", ts("2026-03-02 09:00")));
    }

    #[test]
    fn overnight_shift_compares_against_next_day() {
        let window: ShiftWindow = "1:00am-9:00am".parse().unwrap();
        let monday_evening = ts("2026-03-02 23:50");
        assert_eq!(window.shift_start_for(monday_evening), ts("2026-03-03 01:00"));
        assert!(!window.is_late(monday_evening));
    }

    #[test]
    fn overnight_shift_late_after_midnight() {
        let window: ShiftWindow = "1:00am-9:00am".parse().unwrap();
        let check_in = ts("2026-03-03 01:10");
        assert!(window.is_late(check_in));
        assert_eq!(window.late_by(check_in), Some(Duration::minutes(10)));
    }

    #[test]
    fn midnight_start_uses_next_day_for_evening_check_in() {
        let window: ShiftWindow = "12:00am-8:00am".parse().unwrap();
        assert!(!window.is_late(ts("2026-03-02 21:00")));
        assert!(window.is_late(ts("2026-03-02 00:05")));
    }

    #[test]
    fn late_evening_check_in_for_day_shift_is_late() {
        // Correction only applies to graveyard starts.
        assert!(is_late("9:00am-5:00pm", ts("2026-03-02 21:00")));
    }

    #[test]
    fn on_time_has_no_late_duration() {
        let window: ShiftWindow = "9:00am-5:00pm".parse().unwrap();
        assert_eq!(window.late_by(ts("2026-03-02 08:30")), None);
    }

    #[test]
    fn unparseable_shift_is_never_late() {
        assert!(!is_late("flexible", ts("2026-03-02 23:59")));
    }
}
