//! Display-oriented views: per-day attendance reports and payslips.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::employee::EmployeeProfile;
use crate::lateness::ShiftWindow;
use crate::ledger::AttendanceDay;
use crate::payroll::PayrollRecord;
use crate::reconcile::{SessionWork, reconcile_day};

/// One attendance day with reconciled durations and lateness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub sessions: Vec<SessionWork>,
    pub worked_hours: Decimal,
    pub open_sessions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_check_in: Option<NaiveDateTime>,
    pub late: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub late_minutes: Option<i64>,
}

/// Builds day reports, flagging the first check-in of each day against `shift`.
pub fn day_reports(days: &[AttendanceDay], shift: Option<&str>) -> Vec<DayReport> {
    let window = shift.and_then(|s| match s.parse::<ShiftWindow>() {
        Ok(window) => Some(window),
        Err(err) => {
            tracing::debug!(error = %err, "lateness not evaluated");
            None
        }
    });

    let mut reports: Vec<DayReport> = days
        .iter()
        .map(|day| {
            let work = reconcile_day(day);
            let first_check_in = day.first_check_in();
            let late_by = window
                .zip(first_check_in)
                .and_then(|(window, check_in)| window.late_by(check_in));
            DayReport {
                date: day.date,
                worked_hours: work.worked_hours(),
                open_sessions: work.open_sessions,
                sessions: work.sessions,
                first_check_in,
                late: late_by.is_some(),
                late_minutes: late_by.map(|d| d.num_minutes()),
            }
        })
        .collect();
    reports.sort_by_key(|r| r.date);
    reports
}

/// A payroll record with display fields attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payslip {
    pub employee_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
    pub record: PayrollRecord,
    pub days: Vec<DayReport>,
    pub days_late: usize,
}

pub fn build_payslip(
    employee: &EmployeeProfile,
    record: PayrollRecord,
    days: &[AttendanceDay],
) -> Payslip {
    let days: Vec<DayReport> = day_reports(days, employee.shift.as_deref())
        .into_iter()
        .filter(|d| record.period.contains(d.date))
        .collect();
    let days_late = days.iter().filter(|d| d.late).count();

    Payslip {
        employee_name: employee.name.clone(),
        shift: employee.shift.clone(),
        record,
        days,
        days_late,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_kind::EventKind;
    use crate::ledger::record_event;
    use crate::payroll::{PayrollInput, compute_payroll};
    use crate::types::{DateRange, EmployeeId};
    use rust_decimal_macros::dec;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn worked(id: &EmployeeId, check_in: &str, check_out: &str) -> AttendanceDay {
        let day = record_event(id, None, None, EventKind::CheckIn, ts(check_in)).unwrap();
        record_event(id, Some(day), None, EventKind::CheckOut, ts(check_out)).unwrap()
    }

    #[test]
    fn day_reports_flag_late_first_check_in() {
        let id = EmployeeId::new("E-1").unwrap();
        let days = vec![
            worked(&id, "2026-03-03 09:30", "2026-03-03 17:00"),
            worked(&id, "2026-03-02 08:55", "2026-03-02 17:00"),
        ];

        let reports = day_reports(&days, Some("9:00am-5:00pm"));
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].date.to_string(), "2026-03-02");
        assert!(!reports[0].late);
        assert_eq!(reports[0].late_minutes, None);
        assert!(reports[1].late);
        assert_eq!(reports[1].late_minutes, Some(30));
        assert_eq!(reports[1].worked_hours, dec!(7.5));
    }

    #[test]
    fn no_shift_means_never_late() {
        let id = EmployeeId::new("E-1").unwrap();
        let days = vec![worked(&id, "2026-03-02 11:00", "2026-03-02 17:00")];
        assert!(!day_reports(&days, None)[0].late);
        assert!(!day_reports(&days, Some("anytime"))[0].late);
    }

    #[test]
    fn payslip_attaches_days_in_period() {
        let id = EmployeeId::new("E-1").unwrap();
        let mut employee = EmployeeProfile::new(id.clone(), "Ana Reyes");
        employee.rate_per_hour = Some(dec!(100));
        employee.shift = Some("9:00am-5:00pm".to_string());

        let days = vec![
            worked(&id, "2026-03-02 09:10", "2026-03-02 17:10"),
            worked(&id, "2026-03-20 09:00", "2026-03-20 17:00"),
        ];
        let period = DateRange::new(ts("2026-03-01 00:00").date(), ts("2026-03-15 00:00").date())
            .unwrap();
        let record = compute_payroll(&PayrollInput {
            employee_id: id,
            period,
            rate_per_hour: employee.rate_per_hour,
            deductions: employee.deductions.clone(),
            days: days.clone(),
            manual_override_hours: None,
        })
        .unwrap();

        let payslip = build_payslip(&employee, record, &days);
        assert_eq!(payslip.employee_name, "Ana Reyes");
        assert_eq!(payslip.days.len(), 1);
        assert_eq!(payslip.days_late, 1);
        assert_eq!(payslip.record.total_hours, dec!(8));
        assert_eq!(payslip.record.gross_pay, dec!(800));
    }
}
