//! Plan statistics for monitoring dashboards.

use std::collections::BTreeMap;

use serde::Serialize;
use shiftwise_core::{Conflict, ConflictType, PlanStatus, SchedulePlan};
use shiftwise_rules::RuleStatistics;

/// Summary of a stored plan and the rule cache it was checked against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanStatistics {
    pub plan_id: String,
    pub version: u64,
    pub status: PlanStatus,
    pub assignment_count: usize,
    pub employee_count: usize,
    pub total_hours: f64,
    pub hours_per_employee: BTreeMap<String, f64>,
    pub conflicts_by_type: BTreeMap<ConflictType, usize>,
    pub coverage_ratio: f64,
    pub rules: RuleStatistics,
}

impl PlanStatistics {
    pub fn collect(
        plan: &SchedulePlan,
        conflicts: &[Conflict],
        coverage_ratio: f64,
        rules: RuleStatistics,
    ) -> Self {
        let mut hours_per_employee: BTreeMap<String, f64> = BTreeMap::new();
        for assignment in &plan.assignments {
            *hours_per_employee
                .entry(assignment.employee_id.clone())
                .or_default() += assignment.shift.duration_minutes() as f64 / 60.0;
        }
        let mut conflicts_by_type = BTreeMap::new();
        for conflict in conflicts {
            *conflicts_by_type.entry(conflict.conflict_type).or_insert(0) += 1;
        }

        Self {
            plan_id: plan.id.clone(),
            version: plan.version,
            status: plan.status,
            assignment_count: plan.assignments.len(),
            employee_count: hours_per_employee.len(),
            total_hours: plan.total_minutes() as f64 / 60.0,
            hours_per_employee,
            conflicts_by_type,
            coverage_ratio,
            rules,
        }
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts_by_type.values().sum()
    }
}
