//! Per-employee, per-day attendance ledger.
//!
//! An [`AttendanceDay`] owns an ordered list of [`Session`]s and each session
//! owns its own [`Break`]s. Events are only ever appended to the currently
//! open session, and the legal ordering is enforced here:
//!
//! - `CheckIn` requires that no session is open.
//! - `BreakOut` requires an open session without an open break.
//! - `BreakIn` requires an open break.
//! - `CheckOut` requires an open session whose breaks are all closed.
//!
//! Rejected events leave the day untouched.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event_kind::EventKind;
use crate::types::EmployeeId;

/// An event arrived out of legal order for the day's current state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("a session checked in at {since} is still open")]
    SessionAlreadyOpen { since: NaiveDateTime },

    #[error("no open session to record {kind} against")]
    NoOpenSession { kind: EventKind },

    #[error("a break started at {since} is still open")]
    BreakAlreadyOpen { since: NaiveDateTime },

    #[error("no open break to end")]
    NoOpenBreak,

    #[error("cannot check out while the break started at {since} is open")]
    BreakStillOpen { since: NaiveDateTime },
}

/// A pause inside a session. Open until `break_in` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Break {
    pub break_out: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_in: Option<NaiveDateTime>,
}

impl Break {
    pub const fn is_open(&self) -> bool {
        self.break_in.is_none()
    }
}

/// One check-in to check-out work interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub check_in: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_out: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breaks: Vec<Break>,
}

impl Session {
    pub const fn new(check_in: NaiveDateTime) -> Self {
        Self {
            check_in,
            check_out: None,
            breaks: Vec::new(),
        }
    }

    pub const fn is_open(&self) -> bool {
        self.check_out.is_none()
    }

    /// The break currently in progress, if any.
    pub fn open_break(&self) -> Option<&Break> {
        self.breaks.iter().find(|b| b.is_open())
    }

    fn latest_timestamp(&self) -> NaiveDateTime {
        let mut latest = self.check_in;
        for brk in &self.breaks {
            latest = latest.max(brk.break_out);
            if let Some(break_in) = brk.break_in {
                latest = latest.max(break_in);
            }
        }
        self.check_out.map_or(latest, |out| latest.max(out))
    }
}

/// All sessions an employee opened on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceDay {
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl AttendanceDay {
    pub const fn new(employee_id: EmployeeId, date: NaiveDate) -> Self {
        Self {
            employee_id,
            date,
            sessions: Vec::new(),
        }
    }

    /// The session currently accepting events, if any.
    pub fn open_session(&self) -> Option<&Session> {
        self.sessions.iter().find(|s| s.is_open())
    }

    fn open_session_mut(&mut self) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.is_open())
    }

    pub fn has_open_session(&self) -> bool {
        self.open_session().is_some()
    }

    /// Earliest check-in of the day, used for lateness flagging.
    pub fn first_check_in(&self) -> Option<NaiveDateTime> {
        self.sessions.iter().map(|s| s.check_in).min()
    }

    fn latest_timestamp(&self) -> Option<NaiveDateTime> {
        self.sessions.iter().map(Session::latest_timestamp).max()
    }

    /// Applies one event to this day, enforcing the legal event ordering.
    pub fn apply(&mut self, kind: EventKind, at: NaiveDateTime) -> Result<(), SequenceError> {
        if let Some(latest) = self.latest_timestamp() {
            if at < latest {
                tracing::warn!(
                    employee_id = %self.employee_id,
                    date = %self.date,
                    %kind,
                    %at,
                    %latest,
                    "event timestamp precedes earlier events of the day"
                );
            }
        }

        match kind {
            EventKind::CheckIn => {
                if let Some(open) = self.open_session() {
                    return Err(SequenceError::SessionAlreadyOpen {
                        since: open.check_in,
                    });
                }
                self.sessions.push(Session::new(at));
            }
            EventKind::BreakOut => {
                let session = self
                    .open_session_mut()
                    .ok_or(SequenceError::NoOpenSession { kind })?;
                if let Some(open) = session.open_break() {
                    return Err(SequenceError::BreakAlreadyOpen {
                        since: open.break_out,
                    });
                }
                session.breaks.push(Break {
                    break_out: at,
                    break_in: None,
                });
            }
            EventKind::BreakIn => {
                let session = self
                    .open_session_mut()
                    .ok_or(SequenceError::NoOpenSession { kind })?;
                let open = session
                    .breaks
                    .iter_mut()
                    .find(|b| b.is_open())
                    .ok_or(SequenceError::NoOpenBreak)?;
                open.break_in = Some(at);
            }
            EventKind::CheckOut => {
                let session = self
                    .open_session_mut()
                    .ok_or(SequenceError::NoOpenSession { kind })?;
                if let Some(open) = session.open_break() {
                    return Err(SequenceError::BreakStillOpen {
                        since: open.break_out,
                    });
                }
                session.check_out = Some(at);
            }
        }
        Ok(())
    }
}

/// Longest a session may run and still be continued on the next calendar day.
///
/// Older open sessions are treated as forgotten check-outs: they stay open (and
/// unbilled) on their own day while the new day starts fresh.
const MAX_OVERNIGHT_SESSION_HOURS: i64 = 16;

/// Returns the calendar date preceding `date`, used for overnight carry-over.
pub fn previous_date(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date - Duration::days(1))
}

/// The previous day's open session, if it can still be continued at `at`.
fn overnight_session(previous: Option<&AttendanceDay>, at: NaiveDateTime) -> Option<&Session> {
    let open = previous?.open_session()?;
    if at - open.check_in <= Duration::hours(MAX_OVERNIGHT_SESSION_HOURS) {
        return Some(open);
    }
    tracing::debug!(
        since = %open.check_in,
        %at,
        "previous day's open session is too old to continue"
    );
    None
}

/// Records one event against an employee's ledger.
///
/// `today` is the stored day for `at`'s calendar date and `previous` the day
/// before it. A session that checked in yesterday, is still open and started
/// no more than `MAX_OVERNIGHT_SESSION_HOURS` before `at` receives today's
/// break and check-out events (overnight shifts), and blocks a new check-in.
/// Anything older is left alone and today starts its own day.
///
/// Returns the day that was modified, ready to be persisted.
pub fn record_event(
    employee_id: &EmployeeId,
    today: Option<AttendanceDay>,
    previous: Option<AttendanceDay>,
    kind: EventKind,
    at: NaiveDateTime,
) -> Result<AttendanceDay, SequenceError> {
    let date = at.date();
    let overnight_since = overnight_session(previous.as_ref(), at).map(|open| open.check_in);

    let mut day = match kind {
        EventKind::CheckIn => {
            if let Some(since) = overnight_since {
                return Err(SequenceError::SessionAlreadyOpen { since });
            }
            today.unwrap_or_else(|| AttendanceDay::new(employee_id.clone(), date))
        }
        EventKind::BreakOut | EventKind::BreakIn | EventKind::CheckOut => {
            let today_open = today.as_ref().is_some_and(AttendanceDay::has_open_session);
            match (today, previous) {
                (Some(today), _) if today_open => today,
                (_, Some(previous)) if overnight_since.is_some() => {
                    tracing::debug!(
                        %employee_id,
                        session_date = %previous.date,
                        %kind,
                        "applying event to overnight session"
                    );
                    previous
                }
                (today, _) => {
                    today.unwrap_or_else(|| AttendanceDay::new(employee_id.clone(), date))
                }
            }
        }
    };

    day.apply(kind, at)?;
    Ok(day)
}
