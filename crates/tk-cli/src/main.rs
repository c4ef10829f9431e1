use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tk_cli::commands::employee::AddArgs;
use tk_cli::commands::util::parse_period;
use tk_cli::commands::{
    attendance, employee, hours, override_cmd, payroll, payslip, punch, status,
};
use tk_cli::{Cli, Commands, Config, EmployeeAction, OverrideAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(tk_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = tk_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init so tests that already installed a subscriber don't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let scope = config.scope(cli.principal.as_deref())?;
    let mut out = std::io::stdout().lock();

    match command {
        Commands::Employee(EmployeeAction::Add {
            id,
            name,
            owner,
            rate,
            shift,
            deductions,
        }) => {
            let args = AddArgs {
                id: id.clone(),
                name: name.clone(),
                owner: owner.clone(),
                rate: rate.clone(),
                shift: shift.clone(),
                deductions: deductions.clone(),
            };
            employee::add(&mut out, &mut db, &args)?;
        }
        Commands::Employee(EmployeeAction::List { json }) => {
            employee::list(&mut out, &db, &scope, *json)?;
        }
        Commands::Punch { employee, kind, at } => {
            let now = chrono::Local::now().naive_local();
            punch::run(&mut out, &mut db, &scope, employee, kind, at, now)?;
        }
        Commands::Attendance {
            employee,
            period,
            json,
        } => {
            let period = parse_period(period)?;
            attendance::run(&mut out, &db, &scope, employee, period, *json)?;
        }
        Commands::Hours { employee, period } => {
            let period = parse_period(period)?;
            hours::run(&mut out, &db, &scope, employee, period)?;
        }
        Commands::Payroll {
            employees,
            period,
            json,
        } => {
            let period = parse_period(period)?;
            payroll::run(&mut out, &mut db, &scope, employees, period, *json)?;
        }
        Commands::Payslip {
            employee,
            period,
            json,
        } => {
            let period = parse_period(period)?;
            payslip::run(&mut out, &mut db, &scope, employee, period, *json)?;
        }
        Commands::Override(OverrideAction::Set {
            employee,
            period,
            hours,
        }) => {
            let period = parse_period(period)?;
            override_cmd::set(&mut out, &mut db, &scope, employee, period, hours)?;
        }
        Commands::Override(OverrideAction::Clear { employee, period }) => {
            let period = parse_period(period)?;
            override_cmd::clear(&mut out, &mut db, &scope, employee, period)?;
        }
        Commands::Status => {
            status::run(&mut out, &db, &config.database_path)?;
        }
    }

    Ok(())
}
