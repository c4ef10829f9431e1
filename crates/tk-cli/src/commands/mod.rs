//! CLI subcommand implementations.

pub mod attendance;
pub mod employee;
pub mod hours;
pub mod override_cmd;
pub mod payroll;
pub mod payslip;
pub mod punch;
pub mod status;
pub mod util;
