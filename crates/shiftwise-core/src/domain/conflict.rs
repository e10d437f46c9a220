//! Conflicts found in a plan and the resolutions that remove them.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::plan::{AssignmentId, AssignmentSource, EmployeeId, SchedulePlan, ShiftAssignment};
use super::rule::RuleId;
use crate::error::{Result, ScheduleError};

/// Kind of scheduling conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    Overlap,
    RestViolation,
    MaxHours,
    LeaveCollision,
    RuleViolation,
    /// A rule could not be evaluated and was skipped for this pass.
    RuleEvaluationFailed,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::Overlap => "OVERLAP",
            ConflictType::RestViolation => "REST_VIOLATION",
            ConflictType::MaxHours => "MAX_HOURS",
            ConflictType::LeaveCollision => "LEAVE_COLLISION",
            ConflictType::RuleViolation => "RULE_VIOLATION",
            ConflictType::RuleEvaluationFailed => "RULE_EVALUATION_FAILED",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conflict severity; `High` and `Critical` are hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn is_hard(&self) -> bool {
        *self >= Severity::High
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown severity '{}'", s))
    }
}

/// Identity of a conflict independent of its transient id and message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConflictKey {
    pub conflict_type: ConflictType,
    pub assignment_ids: Vec<AssignmentId>,
    pub rule_id: Option<RuleId>,
}

/// A detected violation of a hard or rule-derived constraint.
///
/// Transient: lives only as long as the detection pass result it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: String,
    pub conflict_type: ConflictType,
    /// Offending assignments, sorted.
    pub assignment_ids: Vec<AssignmentId>,
    pub employee_id: Option<EmployeeId>,
    pub date: NaiveDate,
    pub area: Option<String>,
    pub severity: Severity,
    pub rule_id: Option<RuleId>,
    pub detail: String,
    /// Facts read while evaluating the triggering rule.
    #[serde(default)]
    pub consulted_facts: Vec<String>,
}

impl Conflict {
    pub fn new(
        conflict_type: ConflictType,
        mut assignment_ids: Vec<AssignmentId>,
        date: NaiveDate,
        severity: Severity,
    ) -> Self {
        assignment_ids.sort();
        assignment_ids.dedup();
        Self {
            id: String::new(),
            conflict_type,
            assignment_ids,
            employee_id: None,
            date,
            area: None,
            severity,
            rule_id: None,
            detail: String::new(),
            consulted_facts: Vec::new(),
        }
    }

    pub fn for_employee(mut self, employee_id: &str) -> Self {
        self.employee_id = Some(employee_id.to_string());
        self
    }

    pub fn in_area(mut self, area: &str) -> Self {
        self.area = Some(area.to_string());
        self
    }

    pub fn from_rule(mut self, rule_id: &str, consulted_facts: Vec<String>) -> Self {
        self.rule_id = Some(rule_id.to_string());
        self.consulted_facts = consulted_facts;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn key(&self) -> ConflictKey {
        ConflictKey {
            conflict_type: self.conflict_type,
            assignment_ids: self.assignment_ids.clone(),
            rule_id: self.rule_id.clone(),
        }
    }

    pub fn is_hard(&self) -> bool {
        self.severity.is_hard()
    }

    pub fn involves(&self, assignment_id: &str) -> bool {
        self.assignment_ids.iter().any(|id| id == assignment_id)
    }
}

/// One change to a plan's assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentChange {
    /// Hand an assignment to a different employee.
    Reassign {
        assignment_id: AssignmentId,
        from_employee: EmployeeId,
        to_employee: EmployeeId,
    },
    /// Exchange the employees of two assignments.
    Swap {
        first_id: AssignmentId,
        second_id: AssignmentId,
    },
    /// Replace one assignment by two shorter parts.
    Split {
        original_id: AssignmentId,
        kept: ShiftAssignment,
        handed_off: ShiftAssignment,
    },
}

impl AssignmentChange {
    /// Applies the change in place; touched assignments become `Resolved`.
    pub fn apply(&self, plan: &mut SchedulePlan) -> Result<()> {
        match self {
            AssignmentChange::Reassign {
                assignment_id,
                to_employee,
                ..
            } => {
                let assignment = plan.assignment_mut(assignment_id)?;
                assignment.employee_id = to_employee.clone();
                assignment.source = AssignmentSource::Resolved;
            }
            AssignmentChange::Swap {
                first_id,
                second_id,
            } => {
                let first_employee = plan.assignment_mut(first_id)?.employee_id.clone();
                let second = plan.assignment_mut(second_id)?;
                let second_employee = std::mem::replace(&mut second.employee_id, first_employee);
                second.source = AssignmentSource::Resolved;
                let first = plan.assignment_mut(first_id)?;
                first.employee_id = second_employee;
                first.source = AssignmentSource::Resolved;
            }
            AssignmentChange::Split {
                original_id,
                kept,
                handed_off,
            } => {
                plan.remove_assignment(original_id)?;
                plan.add_assignment(kept.clone())?;
                plan.add_assignment(handed_off.clone())?;
            }
        }
        plan.sort_assignments();
        Ok(())
    }

    /// Ids of assignments whose employee or interval the change alters.
    pub fn touched(&self) -> Vec<&str> {
        match self {
            AssignmentChange::Reassign { assignment_id, .. } => vec![assignment_id.as_str()],
            AssignmentChange::Swap {
                first_id,
                second_id,
            } => vec![first_id.as_str(), second_id.as_str()],
            AssignmentChange::Split {
                kept, handed_off, ..
            } => vec![kept.id.as_str(), handed_off.id.as_str()],
        }
    }
}

/// Why a conflict remained after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResidualReason {
    /// Every candidate step would have introduced an equal or worse conflict.
    NoSafeResolution,
    /// Left for manual handling by the ESCALATE strategy.
    Escalated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualConflict {
    pub conflict: Conflict,
    pub reason: ResidualReason,
}

/// Outcome of one resolution call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub strategy: String,
    /// Ids of the conflicts the call was asked to address.
    pub addressed: Vec<String>,
    /// Changes in application order.
    pub changes: Vec<AssignmentChange>,
    pub residual: Vec<ResidualConflict>,
}

impl Resolution {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            addressed: Vec::new(),
            changes: Vec::new(),
            residual: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.residual.is_empty()
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Applies every change in order to `plan`.
    pub fn apply_to(&self, plan: &mut SchedulePlan) -> Result<()> {
        for change in &self.changes {
            change.apply(plan)?;
        }
        Ok(())
    }

    /// Fails with `NoSafeResolution` when any residual conflict had no safe step.
    pub fn require_safe(&self) -> Result<()> {
        let unsafe_ids: Vec<String> = self
            .residual
            .iter()
            .filter(|r| r.reason == ResidualReason::NoSafeResolution)
            .map(|r| r.conflict.id.clone())
            .collect();
        if unsafe_ids.is_empty() {
            Ok(())
        } else {
            Err(ScheduleError::NoSafeResolution {
                conflict_ids: unsafe_ids,
            })
        }
    }
}
