//! Replacement candidates: who may take a shift, and in which order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use shiftwise_config::DetectionConfig;
use shiftwise_core::{
    AssignmentSource, Conflict, RuleCategory, SchedulePlan, ShiftAssignment, ShiftDefinition,
};
use shiftwise_rules::CompiledRule;
use tracing::debug;

use crate::context::PlanningContext;
use crate::facts::FactBuilder;

/// Eligibility and ranking over one working plan.
///
/// An employee is eligible for a shift when their profile allows the area,
/// they are not on leave, they have no overlapping assignment and no active
/// `ELIGIBILITY` rule excludes them. Eligible employees are ranked by
/// assigned minutes, then assignment count, then id, so the least-loaded
/// employee comes first.
pub struct CandidatePool<'a> {
    plan: &'a SchedulePlan,
    ctx: &'a PlanningContext,
    facts: FactBuilder<'a>,
    eligibility_rules: Vec<Arc<CompiledRule>>,
    split_rules: Vec<Arc<CompiledRule>>,
    employees: Vec<&'a str>,
    load: BTreeMap<&'a str, (i64, usize)>,
}

impl<'a> CandidatePool<'a> {
    pub fn new(plan: &'a SchedulePlan, ctx: &'a PlanningContext, config: &'a DetectionConfig) -> Self {
        let mut employees: BTreeSet<&str> = ctx.roster.iter().map(|e| e.id.as_str()).collect();
        employees.extend(plan.employees());

        let mut load: BTreeMap<&str, (i64, usize)> = BTreeMap::new();
        for assignment in &plan.assignments {
            let entry = load.entry(assignment.employee_id.as_str()).or_default();
            entry.0 += assignment.shift.duration_minutes();
            entry.1 += 1;
        }

        Self {
            plan,
            ctx,
            facts: FactBuilder::new(plan, config),
            eligibility_rules: ctx.active_rules(RuleCategory::Eligibility),
            split_rules: ctx.active_rules(RuleCategory::SplitPolicy),
            employees: employees.into_iter().collect(),
            load,
        }
    }

    pub fn plan(&self) -> &'a SchedulePlan {
        self.plan
    }

    /// Assignments of `conflict` that may be moved, in id order.
    pub fn movable(&self, conflict: &Conflict) -> Vec<&'a ShiftAssignment> {
        conflict
            .assignment_ids
            .iter()
            .filter_map(|id| self.plan.assignment(id))
            .filter(|a| !a.is_pinned())
            .collect()
    }

    /// Whether `employee` may work `shift` as assignment `assignment_id`.
    ///
    /// Plan assignments listed in `ignoring` are treated as already gone.
    pub fn is_eligible(
        &self,
        employee: &str,
        shift: &ShiftDefinition,
        assignment_id: &str,
        ignoring: &[&str],
    ) -> bool {
        if self
            .ctx
            .profile(employee)
            .is_some_and(|p| !p.can_work_in(&shift.area))
        {
            return false;
        }
        if self.ctx.unavailability.iter().any(|u| u.blocks(employee, shift)) {
            return false;
        }
        let busy = self
            .plan
            .assignments_for(employee)
            .filter(|a| !ignoring.contains(&a.id.as_str()))
            .any(|a| a.shift.overlap_minutes(shift) > 0);
        if busy {
            return false;
        }
        !self.is_excluded(employee, shift, assignment_id)
    }

    fn is_excluded(&self, employee: &str, shift: &ShiftDefinition, assignment_id: &str) -> bool {
        if self.eligibility_rules.is_empty() {
            return false;
        }
        let hypothetical = ShiftAssignment::new(assignment_id, employee, shift.clone())
            .with_source(AssignmentSource::Resolved);
        let facts = self.facts.facts_for(&hypothetical);
        self.eligibility_rules.iter().any(|rule| match rule.evaluate(&facts) {
            Ok(result) => result.value,
            Err(err) => {
                debug!(event = "eligibility_skipped", rule_id = rule.id(), error = %err);
                false
            }
        })
    }

    /// Eligible employees other than `current`, best first.
    pub fn ranked(
        &self,
        shift: &ShiftDefinition,
        assignment_id: &str,
        current: &str,
        ignoring: &[&str],
    ) -> Vec<&'a str> {
        let mut eligible: Vec<&str> = self
            .employees
            .iter()
            .copied()
            .filter(|e| *e != current)
            .filter(|e| self.is_eligible(e, shift, assignment_id, ignoring))
            .collect();
        eligible.sort_by_key(|e| {
            let (minutes, count) = self.load.get(e).copied().unwrap_or_default();
            (minutes, count, *e)
        });
        eligible
    }

    /// Minimum part length if an active `SPLIT_POLICY` rule permits
    /// splitting `assignment`.
    pub fn split_allowance(&self, assignment: &ShiftAssignment) -> Option<i64> {
        if self.split_rules.is_empty() {
            return None;
        }
        let facts = self.facts.facts_for(assignment);
        self.split_rules
            .iter()
            .find(|rule| rule.evaluate(&facts).is_ok_and(|r| r.value))
            .map(|rule| {
                rule.param("min_part_minutes")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0)
            })
    }
}
