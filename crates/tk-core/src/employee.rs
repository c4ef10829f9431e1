//! Employee directory entries and authorization scope.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::payroll::DeductionConfig;
use crate::types::{EmployeeId, Principal, ValidationError};

/// Payroll-relevant configuration for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub id: EmployeeId,
    pub name: String,

    /// Principal the employee is linked to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Principal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_per_hour: Option<Decimal>,

    /// Shift descriptor such as `9:00am-5:00pm`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,

    #[serde(default)]
    pub deductions: DeductionConfig,
}

impl EmployeeProfile {
    pub fn new(id: EmployeeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
            rate_per_hour: None,
            shift: None,
            deductions: DeductionConfig::default(),
        }
    }

    /// Rejects negative rate and deduction values.
    ///
    /// Shift descriptors are stored as given; unparseable ones simply never
    /// flag lateness.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(rate) = self.rate_per_hour {
            if rate.is_sign_negative() && !rate.is_zero() {
                return Err(ValidationError::NegativeAmount {
                    field: "rate_per_hour",
                    value: rate,
                });
            }
        }
        self.deductions.validate()
    }
}

/// Which employees a request may act upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Administrative access to every employee.
    All,
    /// Only employees linked to this principal.
    Principal(Principal),
}

impl Scope {
    pub fn from_principal(principal: Option<Principal>) -> Self {
        principal.map_or(Self::All, Self::Principal)
    }

    pub fn permits(&self, employee: &EmployeeProfile) -> bool {
        match self {
            Self::All => true,
            Self::Principal(principal) => employee.owner.as_ref() == Some(principal),
        }
    }
}
