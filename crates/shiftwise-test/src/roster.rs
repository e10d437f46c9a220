//! Employees, leave and staffing demand.

use chrono::NaiveDateTime;
use shiftwise_core::{EmployeeProfile, StaffingRequirement, Unavailability};

use crate::plan::DEFAULT_AREA;

/// Profiles for the given ids, any area, default rate.
pub fn employees(ids: &[&str]) -> Vec<EmployeeProfile> {
    ids.iter().map(|id| EmployeeProfile::new(*id)).collect()
}

pub fn leave(employee: &str, start: NaiveDateTime, end: NaiveDateTime) -> Unavailability {
    Unavailability::new(employee, start, end).with_reason("annual leave")
}

/// Headcount required in [`DEFAULT_AREA`].
pub fn demand(start: NaiveDateTime, end: NaiveDateTime, headcount: u32) -> StaffingRequirement {
    StaffingRequirement::new(DEFAULT_AREA, start, end, headcount)
}
