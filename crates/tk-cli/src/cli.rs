//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Attendance and payroll engine.
///
/// Records check-in, break and check-out punches, reconciles them into worked
/// hours and turns pay periods into payroll records.
#[derive(Debug, Parser)]
#[command(name = "tk", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Act as this principal; only employees it owns are visible.
    #[arg(long = "as", global = true, value_name = "PRINCIPAL")]
    pub principal: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage the employee directory.
    #[command(subcommand)]
    Employee(EmployeeAction),

    /// Record an attendance event.
    Punch {
        /// Employee ID.
        employee: String,

        /// One of check-in, break-out, break-in, check-out.
        kind: String,

        /// When the event happened (YYYY-MM-DDTHH:MM[:SS] or "now").
        #[arg(long, default_value = "now")]
        at: String,
    },

    /// Show reconciled sessions and lateness per day.
    Attendance {
        /// Employee ID.
        employee: String,

        #[command(flatten)]
        period: PeriodArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show net worked hours over a date range.
    Hours {
        /// Employee ID.
        employee: String,

        #[command(flatten)]
        period: PeriodArgs,
    },

    /// Generate payroll records for a pay period.
    Payroll {
        /// Employee IDs (default: every employee in scope).
        employees: Vec<String>,

        #[command(flatten)]
        period: PeriodArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate one employee's payslip.
    Payslip {
        /// Employee ID.
        employee: String,

        #[command(flatten)]
        period: PeriodArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage manual hours overrides.
    #[command(subcommand)]
    Override(OverrideAction),

    /// Show database status.
    Status,
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Args)]
pub struct PeriodArgs {
    /// First day (YYYY-MM-DD).
    #[arg(long)]
    pub from: String,

    /// Last day, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub to: String,
}

#[derive(Debug, Subcommand)]
pub enum EmployeeAction {
    /// Add or update an employee.
    Add {
        /// Employee ID.
        id: String,

        /// Display name.
        #[arg(long)]
        name: String,

        /// Principal the employee belongs to.
        #[arg(long)]
        owner: Option<String>,

        /// Pay rate per hour.
        #[arg(long)]
        rate: Option<String>,

        /// Shift window, e.g. 9:00am-5:00pm.
        #[arg(long)]
        shift: Option<String>,

        /// Deduction component, e.g. sss=50 (repeatable).
        #[arg(long = "deduction", value_name = "COMPONENT=AMOUNT")]
        deductions: Vec<String>,
    },

    /// List employees.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum OverrideAction {
    /// Replace computed hours for one employee and pay period.
    Set {
        /// Employee ID.
        employee: String,

        #[command(flatten)]
        period: PeriodArgs,

        /// Total hours for the period.
        #[arg(long)]
        hours: String,
    },

    /// Remove an override and fall back to ledger hours.
    Clear {
        /// Employee ID.
        employee: String,

        #[command(flatten)]
        period: PeriodArgs,
    },
}
