//! Payroll command: generate and store records for a pay period.

use std::io::Write;

use anyhow::Result;
use tk_core::{DateRange, HoursSource, PayrollRecord, Scope};
use tk_db::Database;

use super::util::{format_amount, parse_employee_id};

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    scope: &Scope,
    employees: &[String],
    period: DateRange,
    json: bool,
) -> Result<()> {
    let ids = employees
        .iter()
        .map(|id| parse_employee_id(id))
        .collect::<Result<Vec<_>>>()?;
    let records = db.generate_payroll(scope, &ids, period)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&records)?)?;
        return Ok(());
    }

    writeln!(writer, "Payroll {period}")?;
    if records.is_empty() {
        writeln!(writer, "No employees in scope.")?;
        return Ok(());
    }
    for record in &records {
        write_record(writer, record)?;
    }
    Ok(())
}

/// Summary line plus any warnings for one record.
pub fn write_record<W: Write>(writer: &mut W, record: &PayrollRecord) -> Result<()> {
    writeln!(
        writer,
        "{}  hours {} ({})  days {}  rate {}  gross {}  deductions {}  net {}",
        record.employee_id,
        format_amount(record.total_hours),
        format_source(record),
        format_amount(record.total_days),
        format_amount(record.rate_per_hour),
        format_amount(record.gross_pay),
        format_amount(record.deductions.total()),
        format_amount(record.net_pay),
    )?;
    for warning in &record.warnings {
        writeln!(writer, "  warning: {warning}")?;
    }
    Ok(())
}

/// `ledger`, or `override; ledger 8.50` when an override won.
pub fn format_source(record: &PayrollRecord) -> String {
    match record.hours_source {
        HoursSource::Ledger => HoursSource::Ledger.to_string(),
        HoursSource::Override => format!(
            "override; ledger {}",
            format_amount(record.computed_hours)
        ),
    }
}
