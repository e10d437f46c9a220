//! Plan scoring under an optimization target.
//!
//! The hard level is minus the number of hard conflicts. The soft level is
//! the target's objective minus the weight of every `SOFT_PREFERENCE` rule
//! that holds for an assignment.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Datelike;
use shiftwise_config::OptimizerConfig;
use shiftwise_core::{ConflictKey, OptimizationTarget, PlanScore, RuleCategory, SchedulePlan};
use shiftwise_rules::CompiledRule;
use tracing::debug;

use crate::context::PlanningContext;
use crate::coverage;
use crate::detect::{hard_keys, ConflictDetector};
use crate::facts::FactBuilder;

/// Score of one plan together with the hard conflicts behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub score: PlanScore,
    pub hard_keys: BTreeSet<ConflictKey>,
}

/// Scores plans for one target against one planning context.
pub struct Objective<'a> {
    target: OptimizationTarget,
    detector: &'a ConflictDetector,
    ctx: &'a PlanningContext,
    config: &'a OptimizerConfig,
    slot_minutes: i64,
    preferences: Vec<Arc<CompiledRule>>,
}

impl<'a> Objective<'a> {
    pub fn new(
        target: OptimizationTarget,
        detector: &'a ConflictDetector,
        ctx: &'a PlanningContext,
        config: &'a OptimizerConfig,
        slot_minutes: i64,
    ) -> Self {
        Self {
            target,
            detector,
            ctx,
            config,
            slot_minutes,
            preferences: ctx.active_rules(RuleCategory::SoftPreference),
        }
    }

    pub fn evaluate(&self, plan: &SchedulePlan) -> Evaluation {
        let conflicts = self.detector.validate_schedule_conflicts(plan, self.ctx);
        let hard_keys = hard_keys(&conflicts);
        let objective = match self.target {
            OptimizationTarget::MinCost => -self.labor_cost_cents(plan),
            OptimizationTarget::MaxFairness => -self.imbalance_minutes(plan),
            OptimizationTarget::MaxCoverage => {
                coverage::totals(plan, &self.ctx.demand, self.slot_minutes).1
            }
        };
        Evaluation {
            score: PlanScore::of(-(hard_keys.len() as i64), objective - self.preference_penalty(plan)),
            hard_keys,
        }
    }

    /// Wages per employee and ISO week, with hours past the weekly
    /// threshold paid at the overtime multiplier.
    fn labor_cost_cents(&self, plan: &SchedulePlan) -> i64 {
        let mut weekly: BTreeMap<(&str, i32, u32), i64> = BTreeMap::new();
        for assignment in &plan.assignments {
            let week = assignment.shift.start.iso_week();
            *weekly
                .entry((assignment.employee_id.as_str(), week.year(), week.week()))
                .or_default() += assignment.shift.duration_minutes();
        }

        let threshold = self.detector.config().weekly_hours_threshold * 60;
        let cost: f64 = weekly
            .into_iter()
            .map(|((employee, _, _), minutes)| {
                let rate = self
                    .ctx
                    .profile(employee)
                    .and_then(|p| p.hourly_rate_cents)
                    .unwrap_or(self.config.default_hourly_rate_cents) as f64;
                let regular = minutes.min(threshold) as f64;
                let overtime = (minutes - threshold).max(0) as f64;
                rate * (regular + overtime * self.config.overtime_multiplier) / 60.0
            })
            .sum();
        cost.round() as i64
    }

    /// Sum of absolute deviations from the mean assigned minutes.
    fn imbalance_minutes(&self, plan: &SchedulePlan) -> i64 {
        let mut minutes: BTreeMap<&str, i64> = self
            .ctx
            .roster
            .iter()
            .map(|e| (e.id.as_str(), 0))
            .collect();
        for assignment in &plan.assignments {
            *minutes.entry(assignment.employee_id.as_str()).or_default() +=
                assignment.shift.duration_minutes();
        }
        if minutes.is_empty() {
            return 0;
        }
        let mean = minutes.values().sum::<i64>() as f64 / minutes.len() as f64;
        minutes
            .values()
            .map(|m| (*m as f64 - mean).abs())
            .sum::<f64>()
            .round() as i64
    }

    fn preference_penalty(&self, plan: &SchedulePlan) -> i64 {
        if self.preferences.is_empty() {
            return 0;
        }
        let facts = FactBuilder::new(plan, self.detector.config());
        let mut penalty = 0;
        for assignment in &plan.assignments {
            let context = facts.facts_for(assignment);
            for rule in &self.preferences {
                match rule.evaluate(&context) {
                    Ok(result) if result.value => {
                        penalty += rule.param("weight").and_then(|w| w.as_i64()).unwrap_or(0);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        debug!(event = "preference_skipped", rule_id = rule.id(), error = %err);
                    }
                }
            }
        }
        penalty
    }
}
