//! Attendance and payroll CLI library.
//!
//! This crate provides the CLI interface for the attendance and payroll engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, EmployeeAction, OverrideAction, PeriodArgs};
pub use config::Config;
