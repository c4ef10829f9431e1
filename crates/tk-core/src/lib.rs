//! Core domain logic for attendance and payroll.
//!
//! This crate contains the fundamental types and logic for:
//! - Ledger: per-employee, per-day sessions and breaks built from punch events
//! - Reconciliation: net worked time per session and per day
//! - Lateness: comparing the first check-in of a day to a shift window
//! - Payroll: aggregating hours over a pay period into gross and net pay
//!
//! Nothing here touches storage; see `tk-db` for persistence.

pub mod employee;
pub mod event_kind;
pub mod lateness;
pub mod ledger;
pub mod payroll;
pub mod payslip;
pub mod reconcile;
pub mod types;

pub use employee::{EmployeeProfile, Scope};
pub use event_kind::EventKind;
pub use lateness::{ShiftWindow, is_late};
pub use ledger::{AttendanceDay, Break, SequenceError, Session, previous_date, record_event};
pub use payroll::{
    DeductionBreakdown, DeductionConfig, DeductionKind, HOURS_PER_DAY, HoursSource, ManualHours,
    PayrollInput, PayrollKey, PayrollRecord, PayrollWarning, compute_payroll,
    compute_payroll_batch,
};
pub use payslip::{DayReport, Payslip, build_payslip, day_reports};
pub use reconcile::{DayWork, SessionWork, ms_to_hours, reconcile_day, reconcile_session, worked_ms};
pub use types::{DateRange, EmployeeId, Principal, ValidationError};
