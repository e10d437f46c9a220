//! Conflict detection.
//!
//! Checks run in a fixed order: overlap, rest, rolling max hours, leave and
//! finally `SCHEDULE_CONSTRAINT` rules. Every violation is collected; the
//! pass never stops at the first one.

mod checks;
mod rules;


use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use shiftwise_config::DetectionConfig;
use shiftwise_core::{Conflict, ConflictKey, RuleCategory, SchedulePlan, ShiftAssignment};
use tracing::debug;

use crate::context::PlanningContext;
use crate::facts::FactBuilder;

pub use rules::rule_severity;

/// Scans plans for conflicts.
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    config: DetectionConfig,
}

impl ConflictDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Every conflict in `plan`, ordered by check, date and assignment ids.
    ///
    /// Ids are `C-1`, `C-2`, ... in that order, so the same plan and context
    /// always yield the same list.
    pub fn validate_schedule_conflicts(
        &self,
        plan: &SchedulePlan,
        ctx: &PlanningContext,
    ) -> Vec<Conflict> {
        let groups = employee_groups(plan);
        let leave = ctx.leave_by_employee();

        let mut conflicts: Vec<Conflict> = groups
            .par_iter()
            .flat_map_iter(|(employee, shifts)| {
                let mut found = Vec::new();
                checks::overlaps(shifts, &mut found);
                checks::rest(shifts, self.config.min_rest_minutes, &mut found);
                checks::max_hours(shifts, &self.config, &mut found);
                if let Some(unavailable) = leave.get(employee) {
                    checks::leave(shifts, unavailable, &mut found);
                }
                found
            })
            .collect();

        let constraints = ctx.active_rules(RuleCategory::ScheduleConstraint);
        if !constraints.is_empty() {
            let builder = FactBuilder::new(plan, &self.config);
            let facts: Vec<_> = plan
                .assignments
                .par_iter()
                .map(|a| builder.facts_for(a))
                .collect();
            conflicts.extend(rules::constraint_conflicts(plan, &facts, &constraints));
        }

        conflicts.sort_by(|a, b| {
            a.conflict_type
                .cmp(&b.conflict_type)
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.assignment_ids.cmp(&b.assignment_ids))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        for (n, conflict) in conflicts.iter_mut().enumerate() {
            conflict.id = format!("C-{}", n + 1);
        }

        debug!(
            event = "detect_end",
            plan_id = %plan.id,
            assignments = plan.assignments.len(),
            conflicts = conflicts.len(),
            hard = conflicts.iter().filter(|c| c.is_hard()).count(),
        );
        conflicts
    }
}

/// Each employee's assignments, ordered by start.
fn employee_groups(plan: &SchedulePlan) -> Vec<(&str, Vec<&ShiftAssignment>)> {
    let mut grouped: BTreeMap<&str, Vec<&ShiftAssignment>> = BTreeMap::new();
    for assignment in &plan.assignments {
        grouped
            .entry(assignment.employee_id.as_str())
            .or_default()
            .push(assignment);
    }
    grouped
        .into_iter()
        .map(|(employee, mut shifts)| {
            shifts.sort_by(|a, b| a.shift.start.cmp(&b.shift.start).then_with(|| a.id.cmp(&b.id)));
            (employee, shifts)
        })
        .collect()
}

/// Keys of the conflicts in `conflicts`.
pub fn conflict_keys(conflicts: &[Conflict]) -> BTreeSet<ConflictKey> {
    conflicts.iter().map(Conflict::key).collect()
}

/// Keys of the hard conflicts in `conflicts`.
pub fn hard_keys(conflicts: &[Conflict]) -> BTreeSet<ConflictKey> {
    conflicts
        .iter()
        .filter(|c| c.is_hard())
        .map(Conflict::key)
        .collect()
}
