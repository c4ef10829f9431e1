//! Attendance command: per-day sessions, worked hours and lateness.

use std::io::Write;

use anyhow::Result;
use rust_decimal::Decimal;
use tk_core::{DateRange, DayReport, Scope, SessionWork};
use tk_db::Database;

use super::util::{format_amount, format_minutes, parse_employee_id};

const MILLIS_PER_MINUTE: i64 = 60_000;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    scope: &Scope,
    employee: &str,
    period: DateRange,
    json: bool,
) -> Result<()> {
    let employee_id = parse_employee_id(employee)?;
    let reports = db.attendance(scope, &employee_id, period)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&reports)?)?;
        return Ok(());
    }

    writeln!(writer, "Attendance for {employee_id}, {period}")?;
    if reports.is_empty() {
        writeln!(writer, "No attendance recorded.")?;
        return Ok(());
    }
    for report in &reports {
        writeln!(writer, "{}", format_day(report))?;
    }
    let total: Decimal = reports.iter().map(|r| r.worked_hours).sum();
    writeln!(writer, "Total: {}h", format_amount(total))?;
    Ok(())
}

/// One line per day: date, sessions, worked hours and lateness.
pub fn format_day(report: &DayReport) -> String {
    let sessions: Vec<String> = report.sessions.iter().map(format_session).collect();
    let mut line = format!(
        "{}  {}  {}h",
        report.date,
        sessions.join(", "),
        format_amount(report.worked_hours)
    );
    if let Some(minutes) = report.late_minutes {
        line.push_str(&format!("  late {}", format_minutes(minutes)));
    }
    line
}

fn format_session(session: &SessionWork) -> String {
    let check_in = session.check_in.format("%H:%M");
    let mut text = match session.check_out {
        Some(out) if out.date() > session.check_in.date() => {
            format!("{check_in}-{}+1", out.format("%H:%M"))
        }
        Some(out) => format!("{check_in}-{}", out.format("%H:%M")),
        None => format!("{check_in}-open"),
    };
    if session.break_ms > 0 {
        text.push_str(&format!(
            " (break {})",
            format_minutes(session.break_ms / MILLIS_PER_MINUTE)
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{NaiveDate, NaiveDateTime};
    use insta::assert_snapshot;
    use tk_core::{EmployeeId, EmployeeProfile, EventKind};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn period() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        )
        .unwrap()
    }

    fn seeded() -> Database {
        let id = EmployeeId::new("E-1").unwrap();
        let mut db = Database::open_in_memory().unwrap();
        let mut employee = EmployeeProfile::new(id.clone(), "Ana Reyes");
        employee.shift = Some("8:00am-5:00pm".to_string());
        db.upsert_employee(&employee).unwrap();

        for (kind, at) in [
            (EventKind::CheckIn, "2026-03-02 08:00"),
            (EventKind::BreakOut, "2026-03-02 12:00"),
            (EventKind::BreakIn, "2026-03-02 12:30"),
            (EventKind::CheckOut, "2026-03-02 17:00"),
            (EventKind::CheckIn, "2026-03-03 08:15"),
            (EventKind::CheckOut, "2026-03-03 16:15"),
            (EventKind::CheckIn, "2026-03-04 22:00"),
            (EventKind::CheckOut, "2026-03-05 06:30"),
            (EventKind::CheckIn, "2026-03-06 07:55"),
        ] {
            db.record_event(&Scope::All, &id, kind, ts(at)).unwrap();
        }
        db
    }

    #[test]
    fn attendance_lists_days_with_lateness() {
        let db = seeded();
        let mut output = Vec::new();
        run(&mut output, &db, &Scope::All, "E-1", period(), false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Attendance for E-1, 2026-03-01..2026-03-15
        2026-03-02  08:00-17:00 (break 30m)  8.50h
        2026-03-03  08:15-16:15  8.00h  late 15m
        2026-03-04  22:00-06:30+1  8.50h  late 14h00m
        2026-03-06  07:55-open  0.00h
        Total: 25.00h
        ");
    }

    #[test]
    fn attendance_json_includes_sessions() {
        let db = seeded();
        let mut output = Vec::new();
        run(&mut output, &db, &Scope::All, "E-1", period(), true).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let days = json.as_array().unwrap();
        assert_eq!(days.len(), 4);
        assert_eq!(days[1]["late"], true);
        assert_eq!(days[1]["late_minutes"], 15);
        assert_eq!(days[3]["open_sessions"], 1);
    }

    #[test]
    fn attendance_empty_range() {
        let db = seeded();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
        )
        .unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, &Scope::All, "E-1", range, false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Attendance for E-1, 2026-04-01..2026-04-02
        No attendance recorded.
        ");
    }
}
