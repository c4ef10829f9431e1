//! Employee directory commands.

use std::io::Write;

use anyhow::{Context, Result};
use tk_core::{DeductionConfig, EmployeeProfile, Principal, Scope, ShiftWindow};
use tk_db::Database;

use super::util::{format_amount, parse_amount, parse_deduction, parse_employee_id};

/// Raw `tk employee add` arguments.
#[derive(Debug, Clone, Default)]
pub struct AddArgs {
    pub id: String,
    pub name: String,
    pub owner: Option<String>,
    pub rate: Option<String>,
    pub shift: Option<String>,
    pub deductions: Vec<String>,
}

/// Builds a profile from raw arguments.
///
/// Unparseable shifts are stored anyway, since lateness is only informational,
/// but a warning is logged.
pub fn build_profile(args: &AddArgs) -> Result<EmployeeProfile> {
    let mut employee = EmployeeProfile::new(parse_employee_id(&args.id)?, args.name.trim());
    employee.owner = args.owner.as_deref().map(Principal::new).transpose()?;
    employee.rate_per_hour = args
        .rate
        .as_deref()
        .map(|rate| parse_amount("rate", rate))
        .transpose()?;

    if let Some(shift) = &args.shift {
        if let Err(err) = shift.parse::<ShiftWindow>() {
            tracing::warn!(error = %err, "shift will never flag lateness");
        }
        employee.shift = Some(shift.clone());
    }

    let mut deductions = DeductionConfig::default();
    for raw in &args.deductions {
        let (kind, amount) = parse_deduction(raw)?;
        deductions.set(kind, Some(amount));
    }
    employee.deductions = deductions;
    Ok(employee)
}

pub fn add<W: Write>(writer: &mut W, db: &mut Database, args: &AddArgs) -> Result<()> {
    let employee = build_profile(args)?;
    db.upsert_employee(&employee)
        .with_context(|| format!("failed to save employee {}", employee.id))?;
    writeln!(writer, "Saved employee {} ({})", employee.id, employee.name)?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, scope: &Scope, json: bool) -> Result<()> {
    let employees = db.list_employees(scope)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&employees)?)?;
        return Ok(());
    }

    if employees.is_empty() {
        writeln!(writer, "No employees.")?;
        return Ok(());
    }

    for employee in employees {
        let rate = employee
            .rate_per_hour
            .map_or_else(|| "-".to_string(), format_amount);
        let owner = employee.owner.as_ref().map_or("-", Principal::as_str);
        let shift = employee.shift.as_deref().unwrap_or("-");
        writeln!(
            writer,
            "{:<8} {:<20} owner {:<8} rate {:>8}  shift {}",
            employee.id.as_str(),
            employee.name,
            owner,
            rate,
            shift
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use rust_decimal::Decimal;
    use tk_core::{DeductionKind, EmployeeId};

    fn args(id: &str, name: &str) -> AddArgs {
        AddArgs {
            id: id.to_string(),
            name: name.to_string(),
            ..AddArgs::default()
        }
    }

    #[test]
    fn build_profile_parses_rate_and_deductions() {
        let mut raw = args("E-1", " Ana Reyes ");
        raw.rate = Some("100".to_string());
        raw.owner = Some("hr".to_string());
        raw.deductions = vec!["sss=50".to_string(), "tin=12.5".to_string()];

        let employee = build_profile(&raw).unwrap();
        assert_eq!(employee.name, "Ana Reyes");
        assert_eq!(employee.rate_per_hour, Some(Decimal::from(100)));
        assert_eq!(employee.owner.as_ref().map(Principal::as_str), Some("hr"));
        assert_eq!(
            employee.deductions.get(DeductionKind::Sss),
            Some(Decimal::from(50))
        );
        assert_eq!(
            employee.deductions.get(DeductionKind::Tin),
            Some(Decimal::new(125, 1))
        );
        assert_eq!(employee.deductions.get(DeductionKind::Late), None);
    }

    #[test]
    fn build_profile_rejects_bad_input() {
        assert!(build_profile(&args("", "Nobody")).is_err());

        let mut raw = args("E-1", "Ana");
        raw.rate = Some("-10".to_string());
        assert!(build_profile(&raw).is_err());

        let mut raw = args("E-1", "Ana");
        raw.deductions = vec!["bonus=5".to_string()];
        assert!(build_profile(&raw).is_err());
    }

    #[test]
    fn build_profile_keeps_unparseable_shift() {
        let mut raw = args("E-1", "Ana");
        raw.shift = Some("flexible".to_string());
        let employee = build_profile(&raw).unwrap();
        assert_eq!(employee.shift.as_deref(), Some("flexible"));
    }

    #[test]
    fn add_then_list() {
        let mut db = Database::open_in_memory().unwrap();
        let mut raw = args("E-1", "Ana Reyes");
        raw.rate = Some("100".to_string());
        raw.owner = Some("hr".to_string());
        raw.shift = Some("9:00am-5:00pm".to_string());

        let mut output = Vec::new();
        add(&mut output, &mut db, &raw).unwrap();
        add(&mut output, &mut db, &args("E-2", "Ben Cruz")).unwrap();
        list(&mut output, &db, &Scope::All, false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Saved employee E-1 (Ana Reyes)
        Saved employee E-2 (Ben Cruz)
        E-1      Ana Reyes            owner hr       rate   100.00  shift 9:00am-5:00pm
        E-2      Ben Cruz             owner -        rate        -  shift -
        ");
    }

    #[test]
    fn list_respects_scope() {
        let mut db = Database::open_in_memory().unwrap();
        let mut raw = args("E-1", "Ana Reyes");
        raw.owner = Some("hr".to_string());
        let mut output = Vec::new();
        add(&mut output, &mut db, &raw).unwrap();

        let scope = Scope::Principal(Principal::new("ops").unwrap());
        let mut output = Vec::new();
        list(&mut output, &db, &scope, false).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No employees.\n");

        let mut output = Vec::new();
        list(&mut output, &db, &Scope::All, true).unwrap();
        let listed: Vec<EmployeeProfile> = serde_json::from_slice(&output).unwrap();
        assert_eq!(listed[0].id, EmployeeId::new("E-1").unwrap());
    }
}
