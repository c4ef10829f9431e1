//! Session reconciliation: raw punches to billable durations.
//!
//! # Algorithm Summary
//!
//! 1. A session without a check-out contributes nothing (incomplete work is not billed)
//! 2. Gross duration is `check_out - check_in`, floored at zero for clock skew
//! 3. Every closed break owned by the session whose `[break_out, break_in)`
//!    interval lies inside `[check_in, check_out)` is subtracted
//! 4. Net duration is floored at zero
//!
//! Breaks are matched to sessions by ownership, never by position across
//! independent lists. Durations are computed in milliseconds and exposed as
//! decimal hours.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::{AttendanceDay, Session};

/// Internal time unit per hour.
pub const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Computed durations for a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionWork {
    pub check_in: NaiveDateTime,
    pub check_out: Option<NaiveDateTime>,

    /// Check-in to check-out, zero when open or skewed.
    pub gross_ms: i64,

    /// Contained, closed break time.
    pub break_ms: i64,

    /// Billable time.
    pub net_ms: i64,
}

impl SessionWork {
    pub fn net_hours(&self) -> Decimal {
        ms_to_hours(self.net_ms)
    }
}

/// Computed durations for one attendance day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayWork {
    pub date: NaiveDate,
    pub sessions: Vec<SessionWork>,

    /// Sum of the sessions' net time.
    pub worked_ms: i64,

    /// Sessions still missing a check-out.
    pub open_sessions: usize,
}

impl DayWork {
    pub fn worked_hours(&self) -> Decimal {
        ms_to_hours(self.worked_ms)
    }
}

/// Converts milliseconds into decimal hours.
pub fn ms_to_hours(ms: i64) -> Decimal {
    (Decimal::from(ms) / Decimal::from(MILLIS_PER_HOUR)).normalize()
}

/// Computes the billable duration of a single session.
pub fn reconcile_session(session: &Session) -> SessionWork {
    let mut work = SessionWork {
        check_in: session.check_in,
        check_out: session.check_out,
        gross_ms: 0,
        break_ms: 0,
        net_ms: 0,
    };

    let Some(check_out) = session.check_out else {
        return work;
    };

    let gross_ms = check_out
        .signed_duration_since(session.check_in)
        .num_milliseconds();
    if gross_ms <= 0 {
        if gross_ms < 0 {
            tracing::warn!(
                check_in = %session.check_in,
                %check_out,
                "check-out precedes check-in; session counts as zero"
            );
        }
        return work;
    }

    let mut break_ms = 0;
    for brk in &session.breaks {
        let Some(break_in) = brk.break_in else {
            continue;
        };
        let length_ms = break_in.signed_duration_since(brk.break_out).num_milliseconds();
        if length_ms < 0 {
            tracing::warn!(
                break_out = %brk.break_out,
                %break_in,
                "break ends before it starts; ignored"
            );
            continue;
        }
        if brk.break_out < session.check_in || break_in > check_out {
            tracing::warn!(
                check_in = %session.check_in,
                %check_out,
                break_out = %brk.break_out,
                %break_in,
                "break lies outside its session; ignored"
            );
            continue;
        }
        break_ms += length_ms;
    }

    work.gross_ms = gross_ms;
    work.break_ms = break_ms;
    work.net_ms = (gross_ms - break_ms).max(0);
    work
}

/// Computes per-session and total durations for a day.
pub fn reconcile_day(day: &AttendanceDay) -> DayWork {
    let sessions: Vec<SessionWork> = day.sessions.iter().map(reconcile_session).collect();
    let worked_ms = sessions.iter().map(|s| s.net_ms).sum();
    let open_sessions = day.sessions.iter().filter(|s| s.is_open()).count();

    DayWork {
        date: day.date,
        sessions,
        worked_ms,
        open_sessions,
    }
}

/// Total billable milliseconds across days.
pub fn worked_ms(days: &[AttendanceDay]) -> i64 {
    days.iter().map(|day| reconcile_day(day).worked_ms).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Break;
    use crate::types::EmployeeId;
    use rust_decimal_macros::dec;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn session(check_in: &str, check_out: Option<&str>, breaks: &[(&str, Option<&str>)]) -> Session {
        Session {
            check_in: ts(check_in),
            check_out: check_out.map(ts),
            breaks: breaks
                .iter()
                .map(|(out, back)| Break {
                    break_out: ts(out),
                    break_in: back.map(ts),
                })
                .collect(),
        }
    }

    #[test]
    fn session_without_breaks_is_check_out_minus_check_in() {
        let work = reconcile_session(&session("2026-03-02 08:00", Some("2026-03-02 17:00"), &[]));
        assert_eq!(work.gross_ms, 9 * MILLIS_PER_HOUR);
        assert_eq!(work.net_ms, 9 * MILLIS_PER_HOUR);
    }

    #[test]
    fn contained_break_is_subtracted() {
        let work = reconcile_session(&session(
            "2026-03-02 08:00",
            Some("2026-03-02 17:00"),
            &[("2026-03-02 12:00", Some("2026-03-02 12:30"))],
        ));
        assert_eq!(work.break_ms, MILLIS_PER_HOUR / 2);
        assert_eq!(work.net_hours(), dec!(8.5));
    }

    #[test]
    fn skewed_session_is_zero_never_negative() {
        let work = reconcile_session(&session("2026-03-02 17:00", Some("2026-03-02 08:00"), &[]));
        assert_eq!(work.gross_ms, 0);
        assert_eq!(work.net_ms, 0);

        let work = reconcile_session(&session("2026-03-02 08:00", Some("2026-03-02 08:00"), &[]));
        assert_eq!(work.net_ms, 0);
    }

    #[test]
    fn open_session_contributes_nothing() {
        let work = reconcile_session(&session(
            "2026-03-02 08:00",
            None,
            &[("2026-03-02 10:00", Some("2026-03-02 10:15"))],
        ));
        assert_eq!(work.net_ms, 0);
        assert_eq!(work.check_out, None);
    }

    #[test]
    fn open_break_contributes_nothing() {
        let work = reconcile_session(&session(
            "2026-03-02 08:00",
            Some("2026-03-02 12:00"),
            &[("2026-03-02 10:00", None)],
        ));
        assert_eq!(work.break_ms, 0);
        assert_eq!(work.net_ms, 4 * MILLIS_PER_HOUR);
    }

    #[test]
    fn uncontained_and_inverted_breaks_are_ignored() {
        let work = reconcile_session(&session(
            "2026-03-02 08:00",
            Some("2026-03-02 12:00"),
            &[
                ("2026-03-02 07:30", Some("2026-03-02 08:30")),
                ("2026-03-02 11:00", Some("2026-03-02 10:00")),
                ("2026-03-02 09:00", Some("2026-03-02 09:15")),
            ],
        ));
        assert_eq!(work.break_ms, MILLIS_PER_HOUR / 4);
        assert_eq!(work.net_hours(), dec!(3.75));
    }

    #[test]
    fn net_time_is_floored_at_zero() {
        // Overlapping breaks can sum to more than the session itself.
        let work = reconcile_session(&session(
            "2026-03-02 08:00",
            Some("2026-03-02 09:00"),
            &[
                ("2026-03-02 08:00", Some("2026-03-02 09:00")),
                ("2026-03-02 08:10", Some("2026-03-02 08:50")),
            ],
        ));
        assert_eq!(work.net_ms, 0);
    }

    #[test]
    fn day_sums_sessions_and_counts_open_ones() {
        let day = AttendanceDay {
            employee_id: EmployeeId::new("E-1").unwrap(),
            date: ts("2026-03-02 00:00").date(),
            sessions: vec![
                session("2026-03-02 08:00", Some("2026-03-02 11:00"), &[]),
                session(
                    "2026-03-02 13:00",
                    Some("2026-03-02 17:30"),
                    &[("2026-03-02 15:00", Some("2026-03-02 15:30"))],
                ),
                session("2026-03-02 19:00", None, &[]),
            ],
        };

        let work = reconcile_day(&day);
        assert_eq!(work.sessions.len(), 3);
        assert_eq!(work.worked_hours(), dec!(7));
        assert_eq!(work.open_sessions, 1);
        assert_eq!(worked_ms(&[day.clone(), day]), 14 * MILLIS_PER_HOUR);
    }

    #[test]
    fn overnight_session_spans_midnight() {
        let work = reconcile_session(&session(
            "2026-03-02 22:00",
            Some("2026-03-03 06:00"),
            &[("2026-03-03 02:00", Some("2026-03-03 02:30"))],
        ));
        assert_eq!(work.net_hours(), dec!(7.5));
    }

    #[test]
    fn hours_conversion_is_exact_for_minutes() {
        assert_eq!(ms_to_hours(0), Decimal::ZERO);
        assert_eq!(ms_to_hours(90 * 60_000), dec!(1.5));
        assert_eq!(ms_to_hours(15 * 60_000), dec!(0.25));
    }
}
