//! Schedule plans and shift assignments.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

pub type EmployeeId = String;
pub type AssignmentId = String;

/// Lifecycle status of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Draft,
    Validated,
    Conflicted,
    Optimized,
    Published,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlanStatus::Draft => "DRAFT",
            PlanStatus::Validated => "VALIDATED",
            PlanStatus::Conflicted => "CONFLICTED",
            PlanStatus::Optimized => "OPTIMIZED",
            PlanStatus::Published => "PUBLISHED",
        };
        f.write_str(s)
    }
}

/// Where an assignment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentSource {
    /// Entered by a planner; pinned against automatic moves.
    Manual,
    Generated,
    Resolved,
}

impl AssignmentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentSource::Manual => "MANUAL",
            AssignmentSource::Generated => "GENERATED",
            AssignmentSource::Resolved => "RESOLVED",
        }
    }
}

/// A time interval at an area that needs staffing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftDefinition {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub area: String,
}

impl ShiftDefinition {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, area: impl Into<String>) -> Self {
        Self {
            start,
            end,
            area: area.into(),
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Calendar date the shift starts on.
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Returns overlap in minutes with another interval, or 0 if disjoint.
    pub fn overlap_minutes(&self, other: &ShiftDefinition) -> i64 {
        overlap_minutes(self.start, self.end, other.start, other.end)
    }

    /// Same interval moved by `minutes`.
    pub fn shifted(&self, minutes: i64) -> Self {
        Self {
            start: self.start + Duration::minutes(minutes),
            end: self.end + Duration::minutes(minutes),
            area: self.area.clone(),
        }
    }
}

/// Overlap of two half-open intervals in minutes.
pub fn overlap_minutes(
    start1: NaiveDateTime,
    end1: NaiveDateTime,
    start2: NaiveDateTime,
    end2: NaiveDateTime,
) -> i64 {
    let start = start1.max(start2);
    let end = end1.min(end2);
    if start < end {
        (end - start).num_minutes()
    } else {
        0
    }
}

/// One employee working one shift.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub id: AssignmentId,
    pub employee_id: EmployeeId,
    pub shift: ShiftDefinition,
    pub source: AssignmentSource,
    /// Produced by splitting a longer shift; split parts may overlap each other.
    #[serde(default)]
    pub permitted_split: bool,
}

impl ShiftAssignment {
    pub fn new(
        id: impl Into<AssignmentId>,
        employee_id: impl Into<EmployeeId>,
        shift: ShiftDefinition,
    ) -> Self {
        Self {
            id: id.into(),
            employee_id: employee_id.into(),
            shift,
            source: AssignmentSource::Generated,
            permitted_split: false,
        }
    }

    pub fn with_source(mut self, source: AssignmentSource) -> Self {
        self.source = source;
        self
    }

    pub fn as_split(mut self) -> Self {
        self.permitted_split = true;
        self
    }

    pub fn is_pinned(&self) -> bool {
        self.source == AssignmentSource::Manual
    }

    /// Overlap in minutes that counts as a conflict with `other`.
    ///
    /// Different employees never conflict; two permitted split parts never conflict.
    pub fn conflicting_overlap(&self, other: &ShiftAssignment) -> i64 {
        if self.employee_id != other.employee_id || (self.permitted_split && other.permitted_split) {
            return 0;
        }
        self.shift.overlap_minutes(&other.shift)
    }
}

/// A bounded-date-range set of shift assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePlan {
    pub id: String,
    /// First day of the plan.
    pub start_date: NaiveDate,
    /// Last day of the plan (inclusive).
    pub end_date: NaiveDate,
    pub assignments: Vec<ShiftAssignment>,
    pub status: PlanStatus,
    /// Optimistic concurrency version; bumped on every committed change.
    pub version: u64,
}

impl SchedulePlan {
    pub fn new(id: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            start_date,
            end_date,
            assignments: Vec::new(),
            status: PlanStatus::Draft,
            version: 0,
        }
    }

    pub fn with_assignment(mut self, assignment: ShiftAssignment) -> Self {
        self.assignments.push(assignment);
        self.sort_assignments();
        self
    }

    /// Adds an assignment, rejecting ones outside the plan's date range.
    pub fn add_assignment(&mut self, assignment: ShiftAssignment) -> Result<()> {
        if !self.covers(&assignment.shift) {
            return Err(ScheduleError::OutOfRange {
                plan_id: self.id.clone(),
                assignment_id: assignment.id,
            });
        }
        self.assignments.push(assignment);
        self.sort_assignments();
        Ok(())
    }

    /// Returns true if the shift lies within `[start_date 00:00, end_date+1 00:00)`.
    pub fn covers(&self, shift: &ShiftDefinition) -> bool {
        let (lower, upper) = self.bounds();
        shift.start >= lower && shift.end <= upper && shift.start < shift.end
    }

    /// Half-open datetime bounds of the plan.
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        let lower = self.start_date.and_time(chrono::NaiveTime::MIN);
        let upper = (self.end_date + Duration::days(1)).and_time(chrono::NaiveTime::MIN);
        (lower, upper)
    }

    /// Checks the date-range invariant for every assignment.
    pub fn check_range(&self) -> Result<()> {
        match self.assignments.iter().find(|a| !self.covers(&a.shift)) {
            Some(a) => Err(ScheduleError::OutOfRange {
                plan_id: self.id.clone(),
                assignment_id: a.id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Keeps assignments ordered by start time, then employee, then id.
    pub fn sort_assignments(&mut self) {
        self.assignments.sort_by(|a, b| {
            a.shift
                .start
                .cmp(&b.shift.start)
                .then_with(|| a.employee_id.cmp(&b.employee_id))
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    pub fn assignment(&self, id: &str) -> Option<&ShiftAssignment> {
        self.assignments.iter().find(|a| a.id == id)
    }

    pub fn assignment_mut(&mut self, id: &str) -> Result<&mut ShiftAssignment> {
        let plan_id = self.id.clone();
        self.assignments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ScheduleError::AssignmentNotFound {
                plan_id,
                assignment_id: id.to_string(),
            })
    }

    pub fn remove_assignment(&mut self, id: &str) -> Result<ShiftAssignment> {
        match self.assignments.iter().position(|a| a.id == id) {
            Some(idx) => Ok(self.assignments.remove(idx)),
            None => Err(ScheduleError::AssignmentNotFound {
                plan_id: self.id.clone(),
                assignment_id: id.to_string(),
            }),
        }
    }

    pub fn assignments_for<'a>(
        &'a self,
        employee_id: &'a str,
    ) -> impl Iterator<Item = &'a ShiftAssignment> + 'a {
        self.assignments
            .iter()
            .filter(move |a| a.employee_id == employee_id)
    }

    pub fn employees(&self) -> BTreeSet<&str> {
        self.assignments
            .iter()
            .map(|a| a.employee_id.as_str())
            .collect()
    }

    /// Every date of the plan in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start_date;
        let days = (self.end_date - self.start_date).num_days().max(-1) + 1;
        (0..days).map(move |d| start + Duration::days(d))
    }

    /// An assignment id not yet used in this plan, derived from `base`.
    pub fn fresh_assignment_id(&self, base: &str) -> AssignmentId {
        let mut n = 1usize;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.assignment(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn total_minutes(&self) -> i64 {
        self.assignments
            .iter()
            .map(|a| a.shift.duration_minutes())
            .sum()
    }

    pub fn is_published(&self) -> bool {
        self.status == PlanStatus::Published
    }
}
