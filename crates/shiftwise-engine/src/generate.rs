//! Initial plan construction from demand and availability.

use chrono::NaiveDate;
use shiftwise_config::{DetectionConfig, GenerationConfig, GenerationHeuristic};
use shiftwise_core::{
    CancellationToken, Result, ScheduleError, SchedulePlan, ShiftAssignment, ShiftDefinition,
    StaffingRequirement,
};
use tracing::{debug, info};

use crate::context::PlanningContext;
use crate::resolve::CandidatePool;

/// Builds a DRAFT plan by filling every requirement head by head.
///
/// Requirements are filled in start order. For each head the generator
/// picks among eligible employees (same rules as replacement candidates),
/// preferring those who keep the minimum rest. Heads nobody can take are
/// left open for the detector and predictor to report.
#[derive(Debug, Clone, Default)]
pub struct PlanGenerator {
    config: GenerationConfig,
    detection: DetectionConfig,
}

impl PlanGenerator {
    pub fn new(config: GenerationConfig, detection: DetectionConfig) -> Self {
        Self { config, detection }
    }

    pub fn generate(
        &self,
        plan_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        ctx: &PlanningContext,
        cancel: &CancellationToken,
    ) -> Result<SchedulePlan> {
        if end < start {
            return Err(ScheduleError::InvalidTimeRange(plan_id.to_string()));
        }
        let mut plan = SchedulePlan::new(plan_id, start, end);

        let mut requirements: Vec<&StaffingRequirement> = ctx
            .demand
            .iter()
            .filter(|r| r.headcount > 0 && plan.covers(&r.as_shift()))
            .collect();
        requirements.sort_by(|a, b| (a.start, &a.area, a.end).cmp(&(b.start, &b.area, b.end)));

        let mut roster: Vec<&str> = ctx.roster.iter().map(|e| e.id.as_str()).collect();
        roster.sort_unstable();
        roster.dedup();

        let mut next_id = 1usize;
        let mut cursor = 0usize;
        let mut unfilled = 0u32;
        for requirement in requirements {
            let shift = requirement.as_shift();
            for _ in 0..requirement.headcount {
                if cancel.is_cancelled() {
                    return Err(ScheduleError::Cancelled);
                }
                let id = format!("G-{}", next_id);
                let Some(employee) = self.pick(&plan, ctx, &roster, &shift, &id, &mut cursor) else {
                    debug!(
                        event = "slot_unfilled",
                        plan_id,
                        area = %shift.area,
                        start = %shift.start,
                    );
                    unfilled += 1;
                    continue;
                };
                plan.add_assignment(ShiftAssignment::new(id, employee, shift.clone()))?;
                next_id += 1;
            }
        }

        info!(
            event = "plan_generated",
            plan_id,
            heuristic = ?self.config.heuristic,
            assignments = plan.assignments.len(),
            unfilled,
        );
        Ok(plan)
    }

    fn pick(
        &self,
        plan: &SchedulePlan,
        ctx: &PlanningContext,
        roster: &[&str],
        shift: &ShiftDefinition,
        assignment_id: &str,
        cursor: &mut usize,
    ) -> Option<String> {
        let pool = CandidatePool::new(plan, ctx, &self.detection);
        match self.config.heuristic {
            GenerationHeuristic::LeastLoaded => {
                // Ranked least loaded first; the stable sort keeps that order
                // among employees with the same rest outcome.
                let mut ranked = pool.ranked(shift, assignment_id, "", &[]);
                ranked.sort_by_key(|e| !self.keeps_rest(plan, e, shift));
                ranked.first().map(|e| e.to_string())
            }
            GenerationHeuristic::RoundRobin => {
                if roster.is_empty() {
                    return None;
                }
                let rotation: Vec<(usize, &str)> = (0..roster.len())
                    .map(|offset| (*cursor + offset) % roster.len())
                    .map(|i| (i, roster[i]))
                    .filter(|(_, e)| pool.is_eligible(e, shift, assignment_id, &[]))
                    .collect();
                let (index, employee) = rotation
                    .iter()
                    .find(|(_, e)| self.keeps_rest(plan, e, shift))
                    .or_else(|| rotation.first())
                    .copied()?;
                *cursor = index + 1;
                Some(employee.to_string())
            }
        }
    }

    fn keeps_rest(&self, plan: &SchedulePlan, employee: &str, shift: &ShiftDefinition) -> bool {
        let min_rest = self.detection.min_rest_minutes;
        plan.assignments_for(employee).all(|a| {
            let gap = if a.shift.end <= shift.start {
                (shift.start - a.shift.end).num_minutes()
            } else {
                (a.shift.start - shift.end).num_minutes()
            };
            gap >= min_rest
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftwise_core::{ConflictType, EmployeeProfile};
    use shiftwise_test::roster::{demand, employees, leave};
    use shiftwise_test::rules::excluded_candidates_rule;
    use shiftwise_test::{at, date};

    use crate::detect::ConflictDetector;
    use crate::test_utils::context_with;

    fn week_demand() -> Vec<StaffingRequirement> {
        (3..=7)
            .flat_map(|day| {
                [
                    demand(at(2025, 3, day, 6, 0), at(2025, 3, day, 14, 0), 1),
                    demand(at(2025, 3, day, 14, 0), at(2025, 3, day, 22, 0), 1),
                ]
            })
            .collect()
    }

    fn generate(heuristic: GenerationHeuristic, ctx: &PlanningContext) -> SchedulePlan {
        PlanGenerator::new(GenerationConfig { heuristic }, DetectionConfig::default())
            .generate("P-GEN", date(2025, 3, 3), date(2025, 3, 9), ctx, &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_least_loaded_fills_every_head_without_conflicts() {
        let ctx = context_with(vec![], employees(&["E1", "E2", "E3"]), vec![], week_demand());
        let plan = generate(GenerationHeuristic::LeastLoaded, &ctx);

        assert_eq!(plan.assignments.len(), 10);
        assert_eq!(plan.assignments[0].id, "G-1");
        assert!(ConflictDetector::default()
            .validate_schedule_conflicts(&plan, &ctx)
            .is_empty());

        let load = |e: &str| plan.assignments_for(e).count();
        assert!(load("E1").abs_diff(load("E3")) <= 1);
    }

    #[test]
    fn test_round_robin_rotates_through_roster() {
        let ctx = context_with(
            vec![],
            employees(&["E1", "E2"]),
            vec![],
            vec![
                demand(at(2025, 3, 3, 8, 0), at(2025, 3, 3, 12, 0), 1),
                demand(at(2025, 3, 4, 8, 0), at(2025, 3, 4, 12, 0), 1),
                demand(at(2025, 3, 5, 8, 0), at(2025, 3, 5, 12, 0), 1),
            ],
        );
        let plan = generate(GenerationHeuristic::RoundRobin, &ctx);
        let who: Vec<&str> = plan.assignments.iter().map(|a| a.employee_id.as_str()).collect();
        assert_eq!(who, vec!["E1", "E2", "E1"]);
    }

    #[test]
    fn test_skips_ineligible_employees() {
        let ctx = context_with(
            vec![excluded_candidates_rule(&["E2"])],
            vec![
                EmployeeProfile::new("E1"),
                EmployeeProfile::new("E2"),
                EmployeeProfile::new("E3").with_area("KITCHEN"),
                EmployeeProfile::new("E4"),
            ],
            vec![leave("E1", at(2025, 3, 3, 0, 0), at(2025, 3, 4, 0, 0))],
            vec![demand(at(2025, 3, 3, 8, 0), at(2025, 3, 3, 16, 0), 1)],
        );
        let plan = generate(GenerationHeuristic::LeastLoaded, &ctx);
        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.assignments[0].employee_id, "E4");
    }

    #[test]
    fn test_unfillable_heads_stay_open() {
        let ctx = context_with(
            vec![],
            employees(&["E1"]),
            vec![],
            vec![demand(at(2025, 3, 3, 8, 0), at(2025, 3, 3, 16, 0), 2)],
        );
        let plan = generate(GenerationHeuristic::LeastLoaded, &ctx);
        assert_eq!(plan.assignments.len(), 1);
        let conflicts = ConflictDetector::default().validate_schedule_conflicts(&plan, &ctx);
        assert!(conflicts.iter().all(|c| c.conflict_type != ConflictType::Overlap));
    }

    #[test]
    fn test_rejects_inverted_range_and_cancellation() {
        let ctx = context_with(vec![], employees(&["E1"]), vec![], week_demand());
        let generator = PlanGenerator::default();
        assert!(matches!(
            generator.generate("P", date(2025, 3, 9), date(2025, 3, 3), &ctx, &CancellationToken::new()),
            Err(ScheduleError::InvalidTimeRange(_))
        ));

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            generator.generate("P", date(2025, 3, 3), date(2025, 3, 9), &ctx, &cancel),
            Err(ScheduleError::Cancelled)
        ));
    }
}
