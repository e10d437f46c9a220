use shiftwise_config::{DetectionConfig, OptimizerConfig};
use shiftwise_core::{
    CancellationToken, OptimizationTarget, SchedulePlan, TerminationReason,
};
use shiftwise_test::plan::{clean_week, overlap_plan};
use shiftwise_test::roster::{demand, employees};
use shiftwise_test::rules::weekend_penalty_rule;
use shiftwise_test::{at, date, PlanBuilder};

use super::*;
use crate::detect::hard_keys;
use crate::test_utils::{context, context_with};

fn optimizer(iteration_limit: u64, unimproved_iteration_limit: u64) -> ScheduleOptimizer {
    ScheduleOptimizer::new(
        OptimizerConfig {
            iteration_limit,
            unimproved_iteration_limit,
            ..OptimizerConfig::default()
        },
        ConflictDetector::new(DetectionConfig::default()),
        60,
    )
}

fn run(
    optimizer: &ScheduleOptimizer,
    plan: &SchedulePlan,
    target: OptimizationTarget,
    ctx: &PlanningContext,
) -> OptimizationResult {
    optimizer
        .optimize_schedule(plan, target, ctx, &CancellationToken::new())
        .unwrap()
}

#[test]
fn test_never_returns_a_worse_plan() {
    let ctx = context_with(
        vec![weekend_penalty_rule()],
        employees(&["E1", "E2", "E3", "E4"]),
        vec![],
        vec![demand(at(2025, 3, 3, 6, 0), at(2025, 3, 3, 22, 0), 2)],
    );
    let plan = clean_week();
    let optimizer = optimizer(150, 60);
    for target in [
        OptimizationTarget::MinCost,
        OptimizationTarget::MaxFairness,
        OptimizationTarget::MaxCoverage,
    ] {
        let result = run(&optimizer, &plan, target, &ctx);
        assert!(result.score >= result.initial_score, "{} regressed", target);

        let objective = Objective::new(target, &optimizer.detector, &ctx, optimizer.config(), 60);
        assert_eq!(objective.evaluate(&plan).score, result.initial_score);
        assert_eq!(objective.evaluate(&result.plan).score, result.score);
    }
}

#[test]
fn test_trajectory_only_climbs() {
    let ctx = context_with(vec![], employees(&["E1", "E2", "E3", "E4"]), vec![], vec![]);
    let result = run(&optimizer(300, 100), &clean_week(), OptimizationTarget::MaxFairness, &ctx);

    assert_eq!(result.trajectory.first(), Some(&result.initial_score));
    assert_eq!(result.trajectory.last(), Some(&result.score));
    assert!(result.trajectory.windows(2).all(|w| w[0] < w[1]));
    // E4 starts idle, so spreading the week is an improvement.
    assert!(result.improved());
}

#[test]
fn test_same_seed_same_result() {
    let ctx = context_with(vec![], employees(&["E1", "E2", "E3", "E4"]), vec![], vec![]);
    let optimizer = optimizer(200, 80);
    let first = run(&optimizer, &clean_week(), OptimizationTarget::MaxFairness, &ctx);
    let second = run(&optimizer, &clean_week(), OptimizationTarget::MaxFairness, &ctx);
    assert_eq!(first, second);
}

#[test]
fn test_never_introduces_hard_conflicts() {
    let ctx = context_with(vec![], employees(&["E1", "E2", "E3"]), vec![], vec![]);
    let plan = clean_week();
    let result = run(&optimizer(300, 100), &plan, OptimizationTarget::MinCost, &ctx);

    let detector = ConflictDetector::default();
    let after = detector.validate_schedule_conflicts(&result.plan, &ctx);
    assert!(hard_keys(&after).is_empty());
}

#[test]
fn test_removes_overlap_when_a_free_employee_exists() {
    let ctx = context_with(vec![], employees(&["E7", "E8"]), vec![], vec![]);
    let result = run(&optimizer(500, 200), &overlap_plan(), OptimizationTarget::MaxFairness, &ctx);
    assert_eq!(result.initial_score.hard(), -1);
    assert_eq!(result.score.hard(), 0);
}

#[test]
fn test_nudge_lines_shift_up_with_demand() {
    let plan = PlanBuilder::new("P", date(2025, 3, 3), date(2025, 3, 3))
        .assign("A", "E1", at(2025, 3, 3, 8, 30), at(2025, 3, 3, 16, 30))
        .build();
    let ctx = context_with(
        vec![],
        vec![],
        vec![],
        vec![demand(at(2025, 3, 3, 8, 0), at(2025, 3, 3, 16, 0), 1)],
    );
    let result = run(&optimizer(200, 100), &plan, OptimizationTarget::MaxCoverage, &ctx);

    assert_eq!(result.initial_score.soft(), 420);
    assert_eq!(result.score.soft(), 480);
    assert_eq!(result.plan.assignments[0].shift.start, at(2025, 3, 3, 8, 0));
}

#[test]
fn test_pinned_assignments_stay_put() {
    let plan = PlanBuilder::new("P", date(2025, 3, 3), date(2025, 3, 3))
        .manual("M", "E1", at(2025, 3, 3, 8, 0), at(2025, 3, 3, 16, 0))
        .assign("G", "E1", at(2025, 3, 3, 17, 0), at(2025, 3, 3, 21, 0))
        .build();
    let ctx = context_with(vec![], employees(&["E1", "E2"]), vec![], vec![]);
    let result = run(&optimizer(200, 100), &plan, OptimizationTarget::MaxFairness, &ctx);
    assert_eq!(result.plan.assignment("M"), plan.assignment("M"));
}

#[test]
fn test_only_pinned_assignments_means_no_moves() {
    let plan = PlanBuilder::new("P", date(2025, 3, 3), date(2025, 3, 3))
        .manual("M", "E1", at(2025, 3, 3, 8, 0), at(2025, 3, 3, 16, 0))
        .build();
    let result = run(&optimizer(200, 100), &plan, OptimizationTarget::MinCost, &context(vec![]));
    assert_eq!(result.termination, TerminationReason::NoMoves);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.plan, plan);
}

#[test]
fn test_cancelled_search_returns_input() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let plan = clean_week();
    let result = optimizer(200, 100)
        .optimize_schedule(&plan, OptimizationTarget::MinCost, &context(vec![]), &cancel)
        .unwrap();
    assert_eq!(result.termination, TerminationReason::Cancelled);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.plan, plan);
    assert_eq!(result.score, result.initial_score);
}

#[test]
fn test_stops_on_plateau() {
    let plan = PlanBuilder::new("P", date(2025, 3, 3), date(2025, 3, 3))
        .assign("A", "E1", at(2025, 3, 3, 8, 0), at(2025, 3, 3, 16, 0))
        .build();
    // One employee and no demand: nothing can ever improve.
    let result = run(&optimizer(1000, 25), &plan, OptimizationTarget::MaxFairness, &context(vec![]));
    assert_eq!(result.termination, TerminationReason::Plateau);
    assert_eq!(result.iterations, 25);
}
