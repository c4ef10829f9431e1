//! Override commands: set or clear manual hours for a pay period.

use std::io::Write;

use anyhow::Result;
use tk_core::{DateRange, ManualHours, PayrollKey, Scope};
use tk_db::Database;

use super::payroll::write_record;
use super::util::parse_employee_id;

pub fn set<W: Write>(
    writer: &mut W,
    db: &mut Database,
    scope: &Scope,
    employee: &str,
    period: DateRange,
    hours: &str,
) -> Result<()> {
    let key = PayrollKey {
        employee_id: parse_employee_id(employee)?,
        period,
    };
    let hours: ManualHours = hours.parse()?;
    let record = db.set_manual_hours_override(scope, &key, hours)?;

    writeln!(writer, "Override set: {key} = {hours}h")?;
    write_record(writer, &record)
}

pub fn clear<W: Write>(
    writer: &mut W,
    db: &mut Database,
    scope: &Scope,
    employee: &str,
    period: DateRange,
) -> Result<()> {
    let key = PayrollKey {
        employee_id: parse_employee_id(employee)?,
        period,
    };
    let record = db.clear_manual_hours_override(scope, &key)?;

    writeln!(writer, "Override cleared: {key}")?;
    write_record(writer, &record)
}
