//! Evaluation of `SCHEDULE_CONSTRAINT` rules against every assignment.

use std::sync::Arc;

use rayon::prelude::*;
use shiftwise_core::{Conflict, ConflictType, SchedulePlan, Severity};
use shiftwise_rules::{CompiledRule, FactContext};
use tracing::warn;

const DEFAULT_RULE_SEVERITY: Severity = Severity::Medium;

/// Severity a matching rule reports, from its `severity` parameter.
pub fn rule_severity(rule: &CompiledRule) -> Severity {
    rule.param("severity")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_RULE_SEVERITY)
}

/// Runs every rule over every assignment; `facts[i]` belongs to
/// `plan.assignments[i]`.
///
/// A rule that fails to evaluate on any assignment is dropped for the whole
/// pass and reported once as `RULE_EVALUATION_FAILED`.
pub(super) fn constraint_conflicts(
    plan: &SchedulePlan,
    facts: &[FactContext],
    rules: &[Arc<CompiledRule>],
) -> Vec<Conflict> {
    rules
        .par_iter()
        .flat_map_iter(|rule| evaluate_rule(plan, facts, rule))
        .collect()
}

fn evaluate_rule(plan: &SchedulePlan, facts: &[FactContext], rule: &CompiledRule) -> Vec<Conflict> {
    let severity = rule_severity(rule);
    let mut found = Vec::new();
    for (assignment, ctx) in plan.assignments.iter().zip(facts) {
        match rule.evaluate(ctx) {
            Ok(result) if result.value => {
                let detail = rule
                    .param("message")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        format!(
                            "{} matched: {}",
                            rule.definition.action_type().unwrap_or("rule"),
                            rule.definition.condition
                        )
                    });
                found.push(
                    Conflict::new(
                        ConflictType::RuleViolation,
                        vec![assignment.id.clone()],
                        assignment.shift.date(),
                        severity,
                    )
                    .for_employee(&assignment.employee_id)
                    .in_area(&assignment.shift.area)
                    .from_rule(rule.id(), result.consulted)
                    .with_detail(detail),
                );
            }
            Ok(_) => {}
            Err(err) => {
                warn!(
                    event = "rule_evaluation_failed",
                    rule_id = rule.id(),
                    assignment_id = %assignment.id,
                    error = %err,
                );
                return vec![Conflict::new(
                    ConflictType::RuleEvaluationFailed,
                    vec![assignment.id.clone()],
                    assignment.shift.date(),
                    Severity::Low,
                )
                .for_employee(&assignment.employee_id)
                .in_area(&assignment.shift.area)
                .from_rule(rule.id(), Vec::new())
                .with_detail(err.to_string())];
            }
        }
    }
    found
}
