//! Payroll aggregation.
//!
//! Sums reconciled work over a pay period, applies a manual hours override
//! when one exists for the exact pay-period key, and derives gross pay,
//! deductions and net pay. Unset rate and deduction values default to zero
//! but are reported through [`PayrollWarning`]s so a zero outcome can be told
//! apart from a misconfigured employee.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

use crate::ledger::AttendanceDay;
use crate::reconcile::{ms_to_hours, reconcile_day};
use crate::types::{DateRange, EmployeeId, ValidationError};

/// Fixed business constant: one payroll day is eight hours.
pub const HOURS_PER_DAY: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

/// The seven deduction components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductionKind {
    Absent,
    Late,
    Sss,
    Philhealth,
    Pagibig,
    Tin,
    Other,
}

impl DeductionKind {
    pub const ALL: [Self; 7] = [
        Self::Absent,
        Self::Late,
        Self::Sss,
        Self::Philhealth,
        Self::Pagibig,
        Self::Tin,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Late => "late",
            Self::Sss => "sss",
            Self::Philhealth => "philhealth",
            Self::Pagibig => "pagibig",
            Self::Tin => "tin",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for DeductionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeductionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownDeduction {
                value: s.to_string(),
            })
    }
}

/// Configured deduction values; `None` means not configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sss: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub philhealth: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagibig: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tin: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<Decimal>,
}

impl DeductionConfig {
    pub const fn get(&self, kind: DeductionKind) -> Option<Decimal> {
        match kind {
            DeductionKind::Absent => self.absent,
            DeductionKind::Late => self.late,
            DeductionKind::Sss => self.sss,
            DeductionKind::Philhealth => self.philhealth,
            DeductionKind::Pagibig => self.pagibig,
            DeductionKind::Tin => self.tin,
            DeductionKind::Other => self.other,
        }
    }

    pub fn set(&mut self, kind: DeductionKind, value: Option<Decimal>) {
        let slot = match kind {
            DeductionKind::Absent => &mut self.absent,
            DeductionKind::Late => &mut self.late,
            DeductionKind::Sss => &mut self.sss,
            DeductionKind::Philhealth => &mut self.philhealth,
            DeductionKind::Pagibig => &mut self.pagibig,
            DeductionKind::Tin => &mut self.tin,
            DeductionKind::Other => &mut self.other,
        };
        *slot = value;
    }

    /// Rejects negative component values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for kind in DeductionKind::ALL {
            if let Some(value) = self.get(kind) {
                if value.is_sign_negative() && !value.is_zero() {
                    return Err(ValidationError::NegativeAmount {
                        field: kind.as_str(),
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolves configured values, defaulting unset components to zero.
    ///
    /// Returns the breakdown and the components that were defaulted.
    pub fn resolve(&self) -> (DeductionBreakdown, Vec<DeductionKind>) {
        let mut breakdown = DeductionBreakdown::default();
        let mut defaulted = Vec::new();
        for kind in DeductionKind::ALL {
            match self.get(kind) {
                Some(value) => breakdown.set(kind, value),
                None => defaulted.push(kind),
            }
        }
        (breakdown, defaulted)
    }
}

/// Resolved deductions. The total is always derived from the components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeductionBreakdown {
    pub absent: Decimal,
    pub late: Decimal,
    pub sss: Decimal,
    pub philhealth: Decimal,
    pub pagibig: Decimal,
    pub tin: Decimal,
    pub other: Decimal,
}

impl DeductionBreakdown {
    pub const fn get(&self, kind: DeductionKind) -> Decimal {
        match kind {
            DeductionKind::Absent => self.absent,
            DeductionKind::Late => self.late,
            DeductionKind::Sss => self.sss,
            DeductionKind::Philhealth => self.philhealth,
            DeductionKind::Pagibig => self.pagibig,
            DeductionKind::Tin => self.tin,
            DeductionKind::Other => self.other,
        }
    }

    fn set(&mut self, kind: DeductionKind, value: Decimal) {
        let slot = match kind {
            DeductionKind::Absent => &mut self.absent,
            DeductionKind::Late => &mut self.late,
            DeductionKind::Sss => &mut self.sss,
            DeductionKind::Philhealth => &mut self.philhealth,
            DeductionKind::Pagibig => &mut self.pagibig,
            DeductionKind::Tin => &mut self.tin,
            DeductionKind::Other => &mut self.other,
        };
        *slot = value;
    }

    /// Sum of the seven components, or `None` if it does not fit.
    pub fn checked_total(&self) -> Option<Decimal> {
        DeductionKind::ALL
            .into_iter()
            .try_fold(Decimal::ZERO, |sum, kind| sum.checked_add(self.get(kind)))
    }

    /// Sum of the seven components, saturating at `Decimal::MAX`.
    ///
    /// Breakdowns produced by [`compute_payroll`] never saturate.
    pub fn total(&self) -> Decimal {
        DeductionKind::ALL
            .into_iter()
            .fold(Decimal::ZERO, |sum, kind| sum.saturating_add(self.get(kind)))
    }
}

impl Serialize for DeductionBreakdown {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DeductionBreakdown", 8)?;
        for kind in DeductionKind::ALL {
            state.serialize_field(kind.as_str(), &self.get(kind))?;
        }
        state.serialize_field("total", &self.total())?;
        state.end()
    }
}

/// A manually entered total-hours value.
///
/// Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ManualHours(Decimal);

impl ManualHours {
    pub fn new(hours: Decimal) -> Result<Self, ValidationError> {
        if hours.is_sign_negative() && !hours.is_zero() {
            return Err(ValidationError::InvalidHours {
                value: hours.to_string(),
            });
        }
        Ok(Self(hours.normalize()))
    }

    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl FromStr for ManualHours {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hours = Decimal::from_str(s.trim()).map_err(|_| ValidationError::InvalidHours {
            value: s.to_string(),
        })?;
        Self::new(hours)
    }
}

impl fmt::Display for ManualHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one payroll record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayrollKey {
    pub employee_id: EmployeeId,
    pub period: DateRange,
}

impl fmt::Display for PayrollKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.employee_id, self.period)
    }
}

/// Where a record's total hours came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoursSource {
    Ledger,
    Override,
}

impl HoursSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ledger => "ledger",
            Self::Override => "override",
        }
    }
}

impl fmt::Display for HoursSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal conditions surfaced alongside a payroll record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayrollWarning {
    /// No rate configured; zero was used.
    RateMissing,
    /// Hours were worked but the rate is zero.
    ZeroRateWithHours { hours: Decimal },
    /// Deduction components that were not configured and counted as zero.
    DeductionsDefaulted { components: Vec<DeductionKind> },
    /// Sessions inside the period without a check-out; they were not billed.
    OpenSessionsExcluded { count: usize },
    /// Deductions exceed gross pay.
    NegativeNetPay { net_pay: Decimal },
}

impl fmt::Display for PayrollWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateMissing => write!(f, "rate per hour not configured; using 0"),
            Self::ZeroRateWithHours { hours } => {
                write!(f, "{hours} hours worked at a rate of 0; check the employee rate")
            }
            Self::DeductionsDefaulted { components } => {
                let names: Vec<&str> = components.iter().map(DeductionKind::as_str).collect();
                write!(f, "deductions not configured, using 0: {}", names.join(", "))
            }
            Self::OpenSessionsExcluded { count } => {
                write!(f, "{count} session(s) without check-out were not billed")
            }
            Self::NegativeNetPay { net_pay } => write!(f, "net pay is negative: {net_pay}"),
        }
    }
}

/// Everything needed to compute one employee's payroll for a period.
#[derive(Debug, Clone)]
pub struct PayrollInput {
    pub employee_id: EmployeeId,
    pub period: DateRange,
    pub rate_per_hour: Option<Decimal>,
    pub deductions: DeductionConfig,
    /// Attendance days for the employee; days outside the period are ignored.
    pub days: Vec<AttendanceDay>,
    pub manual_override_hours: Option<ManualHours>,
}

/// Derived payroll figures for one pay-period key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayrollRecord {
    pub employee_id: EmployeeId,
    pub period: DateRange,
    pub total_hours: Decimal,
    pub total_days: Decimal,
    pub rate_per_hour: Decimal,
    pub gross_pay: Decimal,
    pub deductions: DeductionBreakdown,
    pub net_pay: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_override_hours: Option<Decimal>,
    /// Ledger-derived hours, kept even when an override wins.
    pub computed_hours: Decimal,
    pub hours_source: HoursSource,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PayrollWarning>,
}

impl PayrollRecord {
    pub fn key(&self) -> PayrollKey {
        PayrollKey {
            employee_id: self.employee_id.clone(),
            period: self.period,
        }
    }
}

/// Computes the payroll record for one employee and period.
///
/// Fails with [`ValidationError::AmountOverflow`] when gross pay, the deduction
/// total or net pay does not fit in a `Decimal`.
pub fn compute_payroll(input: &PayrollInput) -> Result<PayrollRecord, ValidationError> {
    let mut worked_ms = 0;
    let mut open_sessions = 0;
    for day in input.days.iter().filter(|d| input.period.contains(d.date)) {
        let work = reconcile_day(day);
        worked_ms += work.worked_ms;
        open_sessions += work.open_sessions;
    }
    let computed_hours = ms_to_hours(worked_ms);

    let (total_hours, hours_source) = match input.manual_override_hours {
        Some(hours) => (hours.value(), HoursSource::Override),
        None => (computed_hours, HoursSource::Ledger),
    };

    let mut warnings = Vec::new();

    let rate_per_hour = input.rate_per_hour.unwrap_or_else(|| {
        warnings.push(PayrollWarning::RateMissing);
        Decimal::ZERO
    });
    if rate_per_hour.is_zero() && total_hours > Decimal::ZERO {
        warnings.push(PayrollWarning::ZeroRateWithHours { hours: total_hours });
    }

    let (deductions, defaulted) = input.deductions.resolve();
    if !defaulted.is_empty() {
        warnings.push(PayrollWarning::DeductionsDefaulted {
            components: defaulted,
        });
    }

    if open_sessions > 0 {
        warnings.push(PayrollWarning::OpenSessionsExcluded {
            count: open_sessions,
        });
    }

    let overflow = |field| ValidationError::AmountOverflow {
        field,
        key: format!("{} {}", input.employee_id, input.period),
    };
    let total_days = (total_hours / HOURS_PER_DAY).normalize();
    let gross_pay = total_hours
        .checked_mul(rate_per_hour)
        .ok_or_else(|| overflow("gross pay"))?;
    let deductions_total = deductions
        .checked_total()
        .ok_or_else(|| overflow("deductions total"))?;
    let net_pay = gross_pay
        .checked_sub(deductions_total)
        .ok_or_else(|| overflow("net pay"))?;
    if net_pay.is_sign_negative() && !net_pay.is_zero() {
        warnings.push(PayrollWarning::NegativeNetPay { net_pay });
    }

    for warning in &warnings {
        tracing::warn!(
            employee_id = %input.employee_id,
            period = %input.period,
            %warning,
            "payroll warning"
        );
    }

    Ok(PayrollRecord {
        employee_id: input.employee_id.clone(),
        period: input.period,
        total_hours,
        total_days,
        rate_per_hour,
        gross_pay,
        deductions,
        net_pay,
        manual_override_hours: input.manual_override_hours.map(ManualHours::value),
        computed_hours,
        hours_source,
        warnings,
    })
}

/// Computes independent employees' records in parallel.
///
/// Output order matches input order. Any failing record fails the batch.
pub fn compute_payroll_batch(
    inputs: &[PayrollInput],
) -> Result<Vec<PayrollRecord>, ValidationError> {
    inputs.par_iter().map(compute_payroll).collect()
}
