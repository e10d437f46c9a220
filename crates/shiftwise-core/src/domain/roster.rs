//! Data received from the staffing collaborators: employees, leave and demand.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::plan::{overlap_minutes, EmployeeId, ShiftDefinition};

/// An employee as seen by the scheduler; identity is already resolved upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub id: EmployeeId,
    #[serde(default)]
    pub hourly_rate_cents: Option<i64>,
    /// Areas the employee may work in; empty means any area.
    #[serde(default)]
    pub areas: Vec<String>,
}

impl EmployeeProfile {
    pub fn new(id: impl Into<EmployeeId>) -> Self {
        Self {
            id: id.into(),
            hourly_rate_cents: None,
            areas: Vec::new(),
        }
    }

    pub fn with_rate(mut self, cents: i64) -> Self {
        self.hourly_rate_cents = Some(cents);
        self
    }

    pub fn with_area(mut self, area: &str) -> Self {
        self.areas.push(area.to_string());
        self
    }

    pub fn can_work_in(&self, area: &str) -> bool {
        self.areas.is_empty() || self.areas.iter().any(|a| a == area)
    }
}

/// A period where an employee cannot be scheduled (leave, absence, training).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unavailability {
    pub employee_id: EmployeeId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub reason: String,
}

impl Unavailability {
    pub fn new(employee_id: impl Into<EmployeeId>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            employee_id: employee_id.into(),
            start,
            end,
            reason: String::new(),
        }
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = reason.to_string();
        self
    }

    pub fn blocks(&self, employee_id: &str, shift: &ShiftDefinition) -> bool {
        self.employee_id == employee_id
            && overlap_minutes(self.start, self.end, shift.start, shift.end) > 0
    }
}

/// Required headcount at an area over an interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StaffingRequirement {
    pub area: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub headcount: u32,
}

impl StaffingRequirement {
    pub fn new(area: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime, headcount: u32) -> Self {
        Self {
            area: area.into(),
            start,
            end,
            headcount,
        }
    }

    pub fn as_shift(&self) -> ShiftDefinition {
        ShiftDefinition::new(self.start, self.end, self.area.clone())
    }
}
