//! Punch command for recording attendance events.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;
use tk_core::{AttendanceDay, EventKind, Scope};
use tk_db::Database;

use super::util::{parse_employee_id, parse_timestamp};

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    scope: &Scope,
    employee: &str,
    kind: &str,
    at: &str,
    now: NaiveDateTime,
) -> Result<()> {
    let employee_id = parse_employee_id(employee)?;
    let kind: EventKind = kind.parse()?;
    let at = parse_timestamp(at, now)?;

    let day = db.record_event(scope, &employee_id, kind, at)?;

    writeln!(
        writer,
        "Recorded {kind} for {employee_id} at {}",
        at.format("%Y-%m-%d %H:%M")
    )?;
    writeln!(writer, "{}", describe_day(&day))?;
    Ok(())
}

fn describe_day(day: &AttendanceDay) -> String {
    let state = match day.open_session() {
        Some(session) if session.open_break().is_some() => "on break",
        Some(_) => "checked in",
        None => "checked out",
    };
    format!(
        "Day {}: {} session(s), {state}",
        day.date,
        day.sessions.len()
    )
}
