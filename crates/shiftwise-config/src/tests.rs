//! Tests for engine configuration.

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        [detection]
        min_rest_minutes = 600
        max_hours_window_days = 14
        max_hours_in_window = 80
        holidays = ["2025-12-25", "2025-12-26"]

        [resolution]
        retry_budget = 5
        default_strategy = "SWAP"

        [optimizer]
        iteration_limit = 100
        random_seed = 9

        [generation]
        heuristic = "round_robin"

        [rules.permissions]
        planner = ["SOFT_PREFERENCE"]
    "#;

    let config = EngineConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.detection.min_rest_minutes, 600);
    assert_eq!(config.detection.max_hours_window_days, 14);
    assert!(config
        .detection
        .is_holiday(NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()));
    assert_eq!(config.resolution.retry_budget, 5);
    assert_eq!(config.resolution.default_strategy, "SWAP");
    assert_eq!(config.optimizer.iteration_limit, 100);
    assert_eq!(config.optimizer.seed(), 9);
    // Fields not given keep their defaults
    assert_eq!(config.optimizer.nudge_minutes, 30);
    assert_eq!(config.generation.heuristic, GenerationHeuristic::RoundRobin);
    assert!(config.rules.permits("planner", RuleCategory::SoftPreference));
    assert!(!config.rules.permits("planner", RuleCategory::ScheduleConstraint));
    assert!(config.validate().is_ok());
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        detection:
          min_rest_minutes: 480
        prediction:
          slot_minutes: 30
        optimizer:
          random_seed: 42
    "#;

    let config = EngineConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.detection.min_rest_minutes, 480);
    assert_eq!(config.prediction.slot_minutes, 30);
    assert_eq!(config.optimizer.random_seed, Some(42));
}

#[test]
fn test_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.detection.min_rest_minutes, 660);
    assert_eq!(config.detection.max_hours_in_window, 48);
    assert_eq!(config.resolution.retry_budget, 3);
    assert_eq!(config.optimizer.seed(), OptimizerConfig::DEFAULT_SEED);
    assert_eq!(config.rules.required_action_key, "action");
    assert!(config.rules.permits("anyone", RuleCategory::Eligibility));
    assert!(config.validate().is_ok());
}

#[test]
fn test_builder() {
    let config = EngineConfig::new()
        .with_random_seed(123)
        .with_iteration_limit(50)
        .with_retry_budget(2)
        .with_max_hours(7, 40)
        .with_permission("ops", &[RuleCategory::ScheduleConstraint]);

    assert_eq!(config.optimizer.random_seed, Some(123));
    assert_eq!(config.optimizer.iteration_limit, 50);
    assert_eq!(config.resolution.retry_budget, 2);
    assert_eq!(config.detection.max_hours_in_window, 40);
    assert!(!config.rules.permits("ops", RuleCategory::SplitPolicy));
}

#[test]
fn test_validate_rejects_bad_values() {
    let config = EngineConfig::new().with_retry_budget(0);
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = EngineConfig::new();
    config.optimizer.tolerance_decay = 1.5;
    assert!(config.validate().is_err());

    let mut config = EngineConfig::new();
    config.prediction.slot_minutes = 7;
    assert!(config.validate().is_err());
}

#[test]
fn test_load_missing_file_is_io_error() {
    let err = EngineConfig::load("/nonexistent/shiftwise.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
