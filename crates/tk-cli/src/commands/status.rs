//! Status command for showing what the database holds.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use tk_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let status = db.status()?;

    writeln!(writer, "Timekeep status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer, "Employees: {}", status.employees)?;
    writeln!(writer, "Attendance days: {}", status.attendance_days)?;
    writeln!(writer, "Open sessions: {}", status.open_sessions)?;
    writeln!(writer, "Hour overrides: {}", status.hour_overrides)?;
    writeln!(writer, "Payroll records: {}", status.payroll_records)?;

    match status.last_attendance_date {
        Some(date) => writeln!(writer, "Last attendance: {date}")?,
        None => writeln!(writer, "No attendance recorded.")?,
    }
    Ok(())
}
