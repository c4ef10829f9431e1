//! Payslip command: one employee's record with attendance attached.

use std::io::Write;

use anyhow::Result;
use tk_core::{DateRange, DeductionKind, Payslip, Scope};
use tk_db::Database;

use super::payroll::format_source;
use super::util::{format_amount, format_minutes, parse_employee_id};

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    scope: &Scope,
    employee: &str,
    period: DateRange,
    json: bool,
) -> Result<()> {
    let employee_id = parse_employee_id(employee)?;
    let payslip = db.payslip(scope, &employee_id, period)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&payslip)?)?;
        return Ok(());
    }
    write_payslip(writer, &payslip)
}

fn write_payslip<W: Write>(writer: &mut W, payslip: &Payslip) -> Result<()> {
    let record = &payslip.record;

    writeln!(
        writer,
        "PAYSLIP: {} ({})",
        payslip.employee_name, record.employee_id
    )?;
    writeln!(
        writer,
        "Period: {} to {}",
        record.period.start(),
        record.period.end()
    )?;
    if let Some(shift) = &payslip.shift {
        writeln!(writer, "Shift:  {shift}")?;
    }

    writeln!(writer)?;
    writeln!(writer, "ATTENDANCE")?;
    writeln!(writer, "──────────")?;
    if payslip.days.is_empty() {
        writeln!(writer, "(no attendance)")?;
    }
    for day in &payslip.days {
        let first_in = day
            .first_check_in
            .map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string());
        let mut line = format!(
            "{}  in {first_in}  {:>6}h",
            day.date,
            format_amount(day.worked_hours)
        );
        if let Some(minutes) = day.late_minutes {
            line.push_str(&format!("  late {}", format_minutes(minutes)));
        }
        writeln!(writer, "{line}")?;
    }
    writeln!(writer, "Days late: {}", payslip.days_late)?;

    writeln!(writer)?;
    writeln!(writer, "PAY")?;
    writeln!(writer, "───")?;
    writeln!(
        writer,
        "Hours:      {:>10}  ({})",
        format_amount(record.total_hours),
        format_source(record)
    )?;
    writeln!(writer, "Days:       {:>10}", format_amount(record.total_days))?;
    writeln!(writer, "Rate:       {:>10}", format_amount(record.rate_per_hour))?;
    writeln!(writer, "Gross pay:  {:>10}", format_amount(record.gross_pay))?;
    for kind in DeductionKind::ALL {
        let label = format!("- {kind}:");
        writeln!(
            writer,
            "{label:<14}{:>8}",
            format_amount(record.deductions.get(kind))
        )?;
    }
    writeln!(
        writer,
        "Deductions: {:>10}",
        format_amount(record.deductions.total())
    )?;
    writeln!(writer, "Net pay:    {:>10}", format_amount(record.net_pay))?;

    if !record.warnings.is_empty() {
        writeln!(writer)?;
        for warning in &record.warnings {
            writeln!(writer, "Warning: {warning}")?;
        }
    }
    Ok(())
}
