//! Storage layer for attendance and payroll.
//!
//! Provides persistence for the employee directory, the attendance ledger,
//! manual hours overrides and derived payroll records using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! Separate `Database` instances on the same file are safe to use concurrently:
//! every write runs in a `BEGIN IMMEDIATE` transaction, so the write lock is held
//! from the first read of an attendance day until its updated sessions are stored.
//! Competing writers wait up to [`BUSY_TIMEOUT`] for the lock.
//!
//! # Schema
//!
//! ## Dates and Timestamps
//!
//! Dates are stored as TEXT in `YYYY-MM-DD` form, so lexicographic ordering matches
//! chronological ordering and range queries can use plain comparisons. Session
//! timestamps live inside the `sessions` JSON in chrono's ISO 8601 form.
//!
//! ## Money and Hours
//!
//! Decimal amounts are stored as TEXT to round-trip exactly. A payroll record's
//! deduction total is never stored; only the seven components are.
//!
//! ## Upsert Tables
//!
//! `attendance_days` is keyed by (employee, check-in date) and `payroll_records` by
//! (employee, period start, period end). Both are overwritten in place; no history of
//! recomputations is kept.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tk_core::{
    AttendanceDay, DateRange, DeductionBreakdown, DeductionConfig, DeductionKind, DayReport,
    EmployeeId, EmployeeProfile, EventKind, HoursSource, ManualHours, PayrollInput, PayrollKey,
    PayrollRecord, PayrollWarning, Payslip, Principal, Scope, SequenceError, ValidationError,
    build_payslip, compute_payroll_batch, day_reports, ms_to_hours, previous_date,
    record_event, worked_ms,
};

/// How long a writer waits for a competing transaction before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Malformed input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An attendance event out of legal order; nothing was stored.
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    /// Unknown, or not visible to the requesting principal.
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },
    /// A stored row could not be decoded.
    #[error("invalid data in {table} for {key}: {message}")]
    InvalidStoredData {
        table: &'static str,
        key: String,
        message: String,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Store-wide row counts for `tk status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub employees: i64,
    pub attendance_days: i64,
    pub open_sessions: i64,
    pub hour_overrides: i64,
    pub payroll_records: i64,
    pub last_attendance_date: Option<String>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS employees (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                owner TEXT,
                rate_per_hour TEXT,
                shift TEXT,
                deductions TEXT NOT NULL DEFAULT '{}'
            );

            CREATE INDEX IF NOT EXISTS idx_employees_owner ON employees(owner);

            -- One row per (employee, check-in date)
            -- sessions: JSON array of sessions, each owning its breaks
            CREATE TABLE IF NOT EXISTS attendance_days (
                employee_id TEXT NOT NULL,
                date TEXT NOT NULL,
                sessions TEXT NOT NULL,
                PRIMARY KEY (employee_id, date),
                FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS hour_overrides (
                employee_id TEXT NOT NULL,
                period_start TEXT NOT NULL,
                period_end TEXT NOT NULL,
                hours TEXT NOT NULL,
                PRIMARY KEY (employee_id, period_start, period_end),
                FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
            );

            -- deductions: JSON object of the seven components (no total)
            -- warnings: JSON array of tagged warnings
            CREATE TABLE IF NOT EXISTS payroll_records (
                employee_id TEXT NOT NULL,
                period_start TEXT NOT NULL,
                period_end TEXT NOT NULL,
                total_hours TEXT NOT NULL,
                total_days TEXT NOT NULL,
                rate_per_hour TEXT NOT NULL,
                gross_pay TEXT NOT NULL,
                deductions TEXT NOT NULL,
                net_pay TEXT NOT NULL,
                manual_override_hours TEXT,
                computed_hours TEXT NOT NULL,
                hours_source TEXT NOT NULL,
                warnings TEXT NOT NULL DEFAULT '[]',
                PRIMARY KEY (employee_id, period_start, period_end),
                FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_payroll_records_period
                ON payroll_records(period_start, period_end);
            ",
        )?;
        Ok(())
    }

    /// Inserts or replaces an employee's directory entry.
    pub fn upsert_employee(&mut self, employee: &EmployeeProfile) -> Result<(), DbError> {
        employee.validate()?;
        let deductions = to_json(&employee.deductions, "employees", employee.id.as_str())?;
        self.conn.execute(
            "
            INSERT INTO employees (id, name, owner, rate_per_hour, shift, deductions)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                owner = excluded.owner,
                rate_per_hour = excluded.rate_per_hour,
                shift = excluded.shift,
                deductions = excluded.deductions
            ",
            params![
                employee.id.as_str(),
                employee.name,
                employee.owner.as_ref().map(Principal::as_str),
                employee.rate_per_hour.map(|rate| rate.to_string()),
                employee.shift,
                deductions,
            ],
        )?;
        Ok(())
    }

    /// Looks up one employee visible to `scope`.
    pub fn employee(&self, scope: &Scope, id: &EmployeeId) -> Result<EmployeeProfile, DbError> {
        require_employee(&self.conn, scope, id)
    }

    /// Lists employees visible to `scope`, ordered by ID.
    pub fn list_employees(&self, scope: &Scope) -> Result<Vec<EmployeeProfile>, DbError> {
        load_employees(&self.conn, scope)
    }

    /// Records one attendance event and returns the day it modified.
    ///
    /// The day is fetched, or created, and updated inside a single immediate
    /// transaction. Rejected events leave the stored day untouched.
    pub fn record_event(
        &mut self,
        scope: &Scope,
        employee_id: &EmployeeId,
        kind: EventKind,
        at: chrono::NaiveDateTime,
    ) -> Result<AttendanceDay, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        require_employee(&tx, scope, employee_id)?;

        let date = at.date();
        let today = load_day(&tx, employee_id, date)?;
        let previous = load_day(&tx, employee_id, previous_date(date))?;
        let day = record_event(employee_id, today, previous, kind, at)?;

        let sessions = to_json(&day.sessions, "attendance_days", employee_id.as_str())?;
        tx.execute(
            "
            INSERT INTO attendance_days (employee_id, date, sessions)
            VALUES (?, ?, ?)
            ON CONFLICT(employee_id, date) DO UPDATE SET sessions = excluded.sessions
            ",
            params![employee_id.as_str(), format_date(day.date), sessions],
        )?;
        tx.commit()?;

        tracing::debug!(%employee_id, %kind, %at, date = %day.date, "recorded attendance event");
        Ok(day)
    }

    /// Attendance days whose check-in date falls inside `range`, ordered by date.
    pub fn attendance_days(
        &self,
        scope: &Scope,
        employee_id: &EmployeeId,
        range: DateRange,
    ) -> Result<Vec<AttendanceDay>, DbError> {
        require_employee(&self.conn, scope, employee_id)?;
        load_days(&self.conn, employee_id, range)
    }

    /// Per-day reconciled work with lateness flags.
    pub fn attendance(
        &self,
        scope: &Scope,
        employee_id: &EmployeeId,
        range: DateRange,
    ) -> Result<Vec<DayReport>, DbError> {
        let employee = require_employee(&self.conn, scope, employee_id)?;
        let days = load_days(&self.conn, employee_id, range)?;
        Ok(day_reports(&days, employee.shift.as_deref()))
    }

    /// Net worked hours over `range`. Read-only.
    pub fn worked_hours(
        &self,
        scope: &Scope,
        employee_id: &EmployeeId,
        range: DateRange,
    ) -> Result<Decimal, DbError> {
        let days = self.attendance_days(scope, employee_id, range)?;
        Ok(ms_to_hours(worked_ms(&days)))
    }

    /// Computes and stores payroll records for `employee_ids` over `period`.
    ///
    /// An empty ID list means every employee visible to `scope`. Any unknown
    /// or out-of-scope ID fails the whole batch before anything is written.
    pub fn generate_payroll(
        &mut self,
        scope: &Scope,
        employee_ids: &[EmployeeId],
        period: DateRange,
    ) -> Result<Vec<PayrollRecord>, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let employees = if employee_ids.is_empty() {
            load_employees(&tx, scope)?
        } else {
            let mut seen = HashSet::new();
            employee_ids
                .iter()
                .filter(|id| seen.insert(*id))
                .map(|id| require_employee(&tx, scope, id))
                .collect::<Result<Vec<_>, _>>()?
        };
        let records = compute_records(&tx, &employees, period)?;
        store_records(&tx, &records)?;
        tx.commit()?;

        tracing::debug!(
            employees = records.len(),
            %period,
            "generated payroll"
        );
        Ok(records)
    }

    /// Regenerates one employee's record and attaches display fields.
    pub fn payslip(
        &mut self,
        scope: &Scope,
        employee_id: &EmployeeId,
        period: DateRange,
    ) -> Result<Payslip, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let employee = require_employee(&tx, scope, employee_id)?;
        let record = single_record(compute_records(&tx, std::slice::from_ref(&employee), period)?)?;
        store_records(&tx, std::slice::from_ref(&record))?;
        let days = load_days(&tx, employee_id, period)?;
        tx.commit()?;

        Ok(build_payslip(&employee, record, &days))
    }

    /// The stored override for an exact pay-period key, if any.
    pub fn manual_hours_override(
        &self,
        scope: &Scope,
        key: &PayrollKey,
    ) -> Result<Option<ManualHours>, DbError> {
        require_employee(&self.conn, scope, &key.employee_id)?;
        load_override(&self.conn, key)
    }

    /// Stores a manual hours override and regenerates the record for that key.
    ///
    /// The override stays in force for every later regeneration of the same key
    /// until cleared.
    pub fn set_manual_hours_override(
        &mut self,
        scope: &Scope,
        key: &PayrollKey,
        hours: ManualHours,
    ) -> Result<PayrollRecord, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let employee = require_employee(&tx, scope, &key.employee_id)?;
        tx.execute(
            "
            INSERT INTO hour_overrides (employee_id, period_start, period_end, hours)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(employee_id, period_start, period_end) DO UPDATE SET
                hours = excluded.hours
            ",
            params![
                key.employee_id.as_str(),
                format_date(key.period.start()),
                format_date(key.period.end()),
                hours.value().to_string(),
            ],
        )?;
        let record = single_record(compute_records(&tx, &[employee], key.period)?)?;
        store_records(&tx, std::slice::from_ref(&record))?;
        tx.commit()?;

        tracing::debug!(%key, %hours, "set manual hours override");
        Ok(record)
    }

    /// Removes the override for an exact key and regenerates from the ledger.
    pub fn clear_manual_hours_override(
        &mut self,
        scope: &Scope,
        key: &PayrollKey,
    ) -> Result<PayrollRecord, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let employee = require_employee(&tx, scope, &key.employee_id)?;
        let removed = tx.execute(
            "
            DELETE FROM hour_overrides
            WHERE employee_id = ? AND period_start = ? AND period_end = ?
            ",
            params![
                key.employee_id.as_str(),
                format_date(key.period.start()),
                format_date(key.period.end()),
            ],
        )?;
        if removed == 0 {
            return Err(DbError::NotFound {
                what: "hours override",
                key: key.to_string(),
            });
        }
        let record = single_record(compute_records(&tx, &[employee], key.period)?)?;
        store_records(&tx, std::slice::from_ref(&record))?;
        tx.commit()?;

        tracing::debug!(%key, "cleared manual hours override");
        Ok(record)
    }

    /// The most recently stored record for `key`, without recomputing it.
    pub fn payroll_record(
        &self,
        scope: &Scope,
        key: &PayrollKey,
    ) -> Result<Option<PayrollRecord>, DbError> {
        require_employee(&self.conn, scope, &key.employee_id)?;
        let row = self
            .conn
            .query_row(
                "
                SELECT total_hours, total_days, rate_per_hour, gross_pay, deductions, net_pay,
                       manual_override_hours, computed_hours, hours_source, warnings
                FROM payroll_records
                WHERE employee_id = ? AND period_start = ? AND period_end = ?
                ",
                params![
                    key.employee_id.as_str(),
                    format_date(key.period.start()),
                    format_date(key.period.end()),
                ],
                |row| {
                    Ok(PayrollRow {
                        total_hours: row.get(0)?,
                        total_days: row.get(1)?,
                        rate_per_hour: row.get(2)?,
                        gross_pay: row.get(3)?,
                        deductions: row.get(4)?,
                        net_pay: row.get(5)?,
                        manual_override_hours: row.get(6)?,
                        computed_hours: row.get(7)?,
                        hours_source: row.get(8)?,
                        warnings: row.get(9)?,
                    })
                },
            )
            .optional()?;
        row.map(|row| row.into_record(key)).transpose()
    }

    /// Store-wide row counts.
    pub fn status(&self) -> Result<StoreStatus, DbError> {
        let count = |sql: &str| -> Result<i64, DbError> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };
        Ok(StoreStatus {
            employees: count("SELECT COUNT(*) FROM employees")?,
            attendance_days: count("SELECT COUNT(*) FROM attendance_days")?,
            open_sessions: count(
                "
                SELECT COUNT(*)
                FROM attendance_days, json_each(attendance_days.sessions) AS session
                WHERE json_extract(session.value, '$.check_out') IS NULL
                ",
            )?,
            hour_overrides: count("SELECT COUNT(*) FROM hour_overrides")?,
            payroll_records: count("SELECT COUNT(*) FROM payroll_records")?,
            last_attendance_date: self.conn.query_row(
                "SELECT MAX(date) FROM attendance_days",
                [],
                |row| row.get(0),
            )?,
        })
    }
}

#[derive(Debug)]
struct EmployeeRow {
    id: String,
    name: String,
    owner: Option<String>,
    rate_per_hour: Option<String>,
    shift: Option<String>,
    deductions: String,
}

impl EmployeeRow {
    fn into_profile(self) -> Result<EmployeeProfile, DbError> {
        let invalid = |message: String| DbError::InvalidStoredData {
            table: "employees",
            key: self.id.clone(),
            message,
        };
        let id = EmployeeId::new(self.id.clone()).map_err(|e| invalid(e.to_string()))?;
        let owner = self
            .owner
            .as_deref()
            .map(Principal::new)
            .transpose()
            .map_err(|e| invalid(e.to_string()))?;
        let rate_per_hour = self
            .rate_per_hour
            .as_deref()
            .map(|rate| parse_decimal(rate, "employees", &self.id))
            .transpose()?;
        let deductions: DeductionConfig =
            serde_json::from_str(&self.deductions).map_err(|e| invalid(e.to_string()))?;

        Ok(EmployeeProfile {
            id,
            name: self.name,
            owner,
            rate_per_hour,
            shift: self.shift,
            deductions,
        })
    }
}

fn employee_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmployeeRow> {
    Ok(EmployeeRow {
        id: row.get(0)?,
        name: row.get(1)?,
        owner: row.get(2)?,
        rate_per_hour: row.get(3)?,
        shift: row.get(4)?,
        deductions: row.get(5)?,
    })
}

fn load_employees(conn: &Connection, scope: &Scope) -> Result<Vec<EmployeeProfile>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT id, name, owner, rate_per_hour, shift, deductions
        FROM employees
        ORDER BY id ASC
        ",
    )?;
    let rows = stmt.query_map([], employee_row)?;
    let mut employees = Vec::new();
    for row in rows {
        let employee = row?.into_profile()?;
        if scope.permits(&employee) {
            employees.push(employee);
        }
    }
    Ok(employees)
}

/// Loads an employee, reporting missing and out-of-scope alike as not found.
fn require_employee(
    conn: &Connection,
    scope: &Scope,
    id: &EmployeeId,
) -> Result<EmployeeProfile, DbError> {
    let row = conn
        .query_row(
            "
            SELECT id, name, owner, rate_per_hour, shift, deductions
            FROM employees
            WHERE id = ?
            ",
            [id.as_str()],
            employee_row,
        )
        .optional()?;
    let employee = row.map(EmployeeRow::into_profile).transpose()?;
    match employee {
        Some(employee) if scope.permits(&employee) => Ok(employee),
        Some(_) => {
            tracing::debug!(employee_id = %id, ?scope, "employee outside scope");
            Err(not_found_employee(id))
        }
        None => Err(not_found_employee(id)),
    }
}

fn not_found_employee(id: &EmployeeId) -> DbError {
    DbError::NotFound {
        what: "employee",
        key: id.to_string(),
    }
}

fn load_day(
    conn: &Connection,
    employee_id: &EmployeeId,
    date: NaiveDate,
) -> Result<Option<AttendanceDay>, DbError> {
    let sessions: Option<String> = conn
        .query_row(
            "SELECT sessions FROM attendance_days WHERE employee_id = ? AND date = ?",
            params![employee_id.as_str(), format_date(date)],
            |row| row.get(0),
        )
        .optional()?;
    sessions
        .map(|json| decode_day(employee_id, date, &json))
        .transpose()
}

fn load_days(
    conn: &Connection,
    employee_id: &EmployeeId,
    range: DateRange,
) -> Result<Vec<AttendanceDay>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT date, sessions
        FROM attendance_days
        WHERE employee_id = ? AND date >= ? AND date <= ?
        ORDER BY date ASC
        ",
    )?;
    let rows = stmt.query_map(
        params![
            employee_id.as_str(),
            format_date(range.start()),
            format_date(range.end()),
        ],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
    )?;
    let mut days = Vec::new();
    for row in rows {
        let (date, sessions) = row?;
        let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| {
            DbError::InvalidStoredData {
                table: "attendance_days",
                key: format!("{employee_id} {date}"),
                message: e.to_string(),
            }
        })?;
        days.push(decode_day(employee_id, date, &sessions)?);
    }
    Ok(days)
}

fn decode_day(
    employee_id: &EmployeeId,
    date: NaiveDate,
    sessions: &str,
) -> Result<AttendanceDay, DbError> {
    let sessions = serde_json::from_str(sessions).map_err(|e| DbError::InvalidStoredData {
        table: "attendance_days",
        key: format!("{employee_id} {date}"),
        message: e.to_string(),
    })?;
    Ok(AttendanceDay {
        employee_id: employee_id.clone(),
        date,
        sessions,
    })
}

fn load_override(conn: &Connection, key: &PayrollKey) -> Result<Option<ManualHours>, DbError> {
    let hours: Option<String> = conn
        .query_row(
            "
            SELECT hours FROM hour_overrides
            WHERE employee_id = ? AND period_start = ? AND period_end = ?
            ",
            params![
                key.employee_id.as_str(),
                format_date(key.period.start()),
                format_date(key.period.end()),
            ],
            |row| row.get(0),
        )
        .optional()?;
    hours
        .map(|hours| {
            let value = parse_decimal(&hours, "hour_overrides", &key.to_string())?;
            ManualHours::new(value).map_err(|e| DbError::InvalidStoredData {
                table: "hour_overrides",
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

/// Reads ledger days and overrides, then computes records in parallel.
fn compute_records(
    conn: &Connection,
    employees: &[EmployeeProfile],
    period: DateRange,
) -> Result<Vec<PayrollRecord>, DbError> {
    let inputs = employees
        .iter()
        .map(|employee| {
            let key = PayrollKey {
                employee_id: employee.id.clone(),
                period,
            };
            Ok(PayrollInput {
                employee_id: employee.id.clone(),
                period,
                rate_per_hour: employee.rate_per_hour,
                deductions: employee.deductions.clone(),
                days: load_days(conn, &employee.id, period)?,
                manual_override_hours: load_override(conn, &key)?,
            })
        })
        .collect::<Result<Vec<_>, DbError>>()?;
    Ok(compute_payroll_batch(&inputs)?)
}

fn single_record(mut records: Vec<PayrollRecord>) -> Result<PayrollRecord, DbError> {
    records.pop().ok_or_else(|| DbError::NotFound {
        what: "payroll record",
        key: String::new(),
    })
}

fn store_records(conn: &Connection, records: &[PayrollRecord]) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "
        INSERT INTO payroll_records (
            employee_id, period_start, period_end, total_hours, total_days, rate_per_hour,
            gross_pay, deductions, net_pay, manual_override_hours, computed_hours,
            hours_source, warnings
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(employee_id, period_start, period_end) DO UPDATE SET
            total_hours = excluded.total_hours,
            total_days = excluded.total_days,
            rate_per_hour = excluded.rate_per_hour,
            gross_pay = excluded.gross_pay,
            deductions = excluded.deductions,
            net_pay = excluded.net_pay,
            manual_override_hours = excluded.manual_override_hours,
            computed_hours = excluded.computed_hours,
            hours_source = excluded.hours_source,
            warnings = excluded.warnings
        ",
    )?;
    for record in records {
        let key = record.key().to_string();
        stmt.execute(params![
            record.employee_id.as_str(),
            format_date(record.period.start()),
            format_date(record.period.end()),
            record.total_hours.to_string(),
            record.total_days.to_string(),
            record.rate_per_hour.to_string(),
            record.gross_pay.to_string(),
            deduction_components_json(&record.deductions),
            record.net_pay.to_string(),
            record.manual_override_hours.map(|hours| hours.to_string()),
            record.computed_hours.to_string(),
            record.hours_source.as_str(),
            to_json(&record.warnings, "payroll_records", &key)?,
        ])?;
    }
    Ok(())
}

#[derive(Debug)]
struct PayrollRow {
    total_hours: String,
    total_days: String,
    rate_per_hour: String,
    gross_pay: String,
    deductions: String,
    net_pay: String,
    manual_override_hours: Option<String>,
    computed_hours: String,
    hours_source: String,
    warnings: String,
}

impl PayrollRow {
    fn into_record(self, key: &PayrollKey) -> Result<PayrollRecord, DbError> {
        let key_str = key.to_string();
        let decimal = |value: &str| parse_decimal(value, "payroll_records", &key_str);
        let invalid = |message: String| DbError::InvalidStoredData {
            table: "payroll_records",
            key: key_str.clone(),
            message,
        };

        let hours_source = match self.hours_source.as_str() {
            "ledger" => HoursSource::Ledger,
            "override" => HoursSource::Override,
            other => return Err(invalid(format!("unknown hours source: {other}"))),
        };
        let deductions: DeductionBreakdown =
            serde_json::from_str(&self.deductions).map_err(|e| invalid(e.to_string()))?;
        let warnings: Vec<PayrollWarning> =
            serde_json::from_str(&self.warnings).map_err(|e| invalid(e.to_string()))?;

        Ok(PayrollRecord {
            employee_id: key.employee_id.clone(),
            period: key.period,
            total_hours: decimal(&self.total_hours)?,
            total_days: decimal(&self.total_days)?,
            rate_per_hour: decimal(&self.rate_per_hour)?,
            gross_pay: decimal(&self.gross_pay)?,
            deductions,
            net_pay: decimal(&self.net_pay)?,
            manual_override_hours: self
                .manual_override_hours
                .as_deref()
                .map(decimal)
                .transpose()?,
            computed_hours: decimal(&self.computed_hours)?,
            hours_source,
            warnings,
        })
    }
}

/// The seven deduction components as a JSON object, without the total.
fn deduction_components_json(deductions: &DeductionBreakdown) -> String {
    let components: serde_json::Map<String, Value> = DeductionKind::ALL
        .into_iter()
        .map(|kind| {
            (
                kind.as_str().to_string(),
                Value::String(deductions.get(kind).to_string()),
            )
        })
        .collect();
    Value::Object(components).to_string()
}

fn to_json<T: serde::Serialize>(
    value: &T,
    table: &'static str,
    key: &str,
) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(|e| DbError::InvalidStoredData {
        table,
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_decimal(value: &str, table: &'static str, key: &str) -> Result<Decimal, DbError> {
    Decimal::from_str(value).map_err(|e| DbError::InvalidStoredData {
        table,
        key: key.to_string(),
        message: format!("invalid decimal {value:?}: {e}"),
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
