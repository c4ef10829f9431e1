//! Hours command: net worked hours over a date range.

use std::io::Write;

use anyhow::Result;
use tk_core::{DateRange, Scope};
use tk_db::Database;

use super::util::{format_amount, parse_employee_id};

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    scope: &Scope,
    employee: &str,
    period: DateRange,
) -> Result<()> {
    let employee_id = parse_employee_id(employee)?;
    let hours = db.worked_hours(scope, &employee_id, period)?;
    writeln!(
        writer,
        "{employee_id} worked {}h from {} to {}",
        format_amount(hours),
        period.start(),
        period.end()
    )?;
    Ok(())
}
