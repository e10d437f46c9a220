//! Stored-plan lifecycle: versions, status transitions and publishing.

use std::sync::Arc;

use shiftwise::prelude::*;
use shiftwise::{
    ChangeState, InMemoryAvailability, InMemoryDemand, InMemoryPlanRepository, PlanRepository,
};
use shiftwise_test::plan::{clean_week, swap_plan};
use shiftwise_test::roster::{demand, employees};
use shiftwise_test::{at, date, utc};

struct Setup {
    engine: ScheduleEngine,
    plans: Arc<InMemoryPlanRepository>,
}

fn setup(config: EngineConfig, stored: Vec<SchedulePlan>) -> Setup {
    shiftwise::logging::init();

    let plans = Arc::new(InMemoryPlanRepository::new());
    for mut plan in stored {
        plan.version = 1;
        plans.insert(plan);
    }
    let needs = (3..=7)
        .flat_map(|day| {
            [
                demand(at(2025, 3, day, 6, 0), at(2025, 3, day, 14, 0), 1),
                demand(at(2025, 3, day, 14, 0), at(2025, 3, day, 22, 0), 1),
            ]
        })
        .collect();
    let engine = ScheduleEngine::builder()
        .with_config(config)
        .with_availability(Arc::new(InMemoryAvailability::with_roster(employees(&[
            "E1", "E2", "E3", "E4",
        ]))))
        .with_demand(Arc::new(InMemoryDemand::with_requirements(needs)))
        .with_plans(plans.clone())
        .with_evaluation_time(utc(2025, 6, 1))
        .build();
    engine.start().unwrap();
    Setup { engine, plans }
}

fn quick() -> EngineConfig {
    EngineConfig::default().with_iteration_limit(100)
}

#[test]
fn test_clean_week_goes_from_draft_to_published() {
    let s = setup(quick(), vec![clean_week()]);
    let never = CancellationToken::new();

    let validated = s.engine.validate_plan("P-WEEK", 1).unwrap();
    assert!(validated.conflicts.is_empty());
    assert_eq!(validated.plan.status, PlanStatus::Validated);
    assert_eq!(validated.plan.version, 2);

    let optimized = s
        .engine
        .optimize_plan("P-WEEK", OptimizationTarget::MinCost, 2, &never)
        .unwrap();
    assert_eq!(optimized.plan.status, PlanStatus::Optimized);
    assert_eq!(optimized.plan.version, 3);

    let published = s.engine.mark_published("P-WEEK", 3).unwrap();
    assert_eq!(published.status, PlanStatus::Published);
    assert_eq!(published.version, 4);

    let err = s
        .engine
        .resolve_plan("P-WEEK", "REASSIGN", 4, &never)
        .unwrap_err();
    assert!(matches!(err, ScheduleError::PlanPublished(_)));

    // Read-only calls still work on a published plan.
    assert!(s.engine.validate_plan("P-WEEK", 4).unwrap().conflicts.is_empty());
    assert!(s.engine.predict_plan("P-WEEK", &never).unwrap().complete);
    assert_eq!(s.plans.load("P-WEEK").unwrap(), published);
}

#[test]
fn test_concurrent_edit_is_rejected_as_stale() {
    let s = setup(quick(), vec![clean_week()]);
    let read_by_both = s.plans.load("P-WEEK").unwrap().version;

    s.engine.validate_plan("P-WEEK", read_by_both).unwrap();
    let err = s
        .engine
        .optimize_plan(
            "P-WEEK",
            OptimizationTarget::MaxFairness,
            read_by_both,
            &CancellationToken::new(),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        ScheduleError::StaleVersion { expected: 1, actual: 2, .. }
    ));
    assert_eq!(err.change_state(), ChangeState::Unchanged);
    assert_eq!(s.plans.load("P-WEEK").unwrap().status, PlanStatus::Validated);
}

#[test]
fn test_refine_with_config_from_toml() {
    let config = EngineConfig::from_toml_str(
        r#"
        [resolution]
        retry_budget = 2

        [optimizer]
        iteration_limit = 50
        random_seed = 7
        "#,
    )
    .unwrap();
    config.validate().unwrap();
    let s = setup(config, vec![swap_plan()]);

    let refined = s
        .engine
        .refine_plan(
            "P-SWAP",
            "SWAP",
            OptimizationTarget::MaxFairness,
            1,
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(refined.validation.conflicts.len(), 1);
    assert!(refined.resolution.conflicts.is_empty());
    assert!(refined.resolution.rounds <= 2);
    let optimization = refined.optimization.unwrap();
    assert!(optimization.score >= optimization.initial_score);
    assert_eq!(s.plans.load("P-SWAP").unwrap(), optimization.plan);
}

#[test]
fn test_generation_with_yaml_config() {
    let config = EngineConfig::from_yaml_str("generation:\n  heuristic: round_robin\n").unwrap();
    assert_eq!(config.generation.heuristic, shiftwise::GenerationHeuristic::RoundRobin);
    let s = setup(config, vec![]);

    let generated = s
        .engine
        .generate_smart_schedule_plan(
            "P-GEN",
            date(2025, 3, 3),
            date(2025, 3, 9),
            &CancellationToken::new(),
        )
        .unwrap();
    assert_eq!(generated.plan.assignments.len(), 10);
    assert!(generated.conflicts.is_empty());
    assert_eq!(generated.plan.status, PlanStatus::Validated);
    assert_eq!(s.plans.load("P-GEN").unwrap().version, 1);
}

#[test]
fn test_statistics_serialize_for_dashboards() {
    let s = setup(quick(), vec![clean_week()]);
    let stats = s.engine.statistics("P-WEEK").unwrap();
    assert_eq!(stats.assignment_count, 15);
    assert_eq!(stats.coverage_ratio, 1.0);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["plan_id"], "P-WEEK");
    assert_eq!(json["status"], "DRAFT");
    assert_eq!(json["total_hours"], 120.0);
    assert_eq!(json["rules"]["total_rules"], 0);
}

#[test]
fn test_missing_plan_is_reported() {
    let s = setup(quick(), vec![]);
    assert!(matches!(
        s.engine.validate_plan("P-NOPE", 1),
        Err(ScheduleError::PlanNotFound(_))
    ));
}
