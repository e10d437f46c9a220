//! Rule cache behaviour: ordering, reload, history and concurrent reads.

use std::sync::Arc;
use std::thread;

use shiftwise_config::RulesConfig;
use shiftwise_core::{FactValue, RuleCategory, RuleDefinition, ScheduleError};
use shiftwise_rules::{ActionRegistry, FactContext, InMemoryRuleStore, RuleLoader};
use shiftwise_test::rules::{
    excluded_candidates_rule, long_shift_split_rule, overtime_rule, weekend_penalty_rule,
};
use shiftwise_test::utc;

fn loader(store: &Arc<InMemoryRuleStore>) -> RuleLoader {
    RuleLoader::new(
        Arc::clone(store) as Arc<dyn shiftwise_rules::RuleStore>,
        Arc::new(ActionRegistry::with_builtins()),
        RulesConfig::default(),
    )
}

fn constraint(id: &str, priority: i32) -> RuleDefinition {
    RuleDefinition::new(id, RuleCategory::ScheduleConstraint, "true")
        .with_action("WARN")
        .with_priority(priority)
}

#[test]
fn test_active_rules_ordered_by_category_then_priority() {
    let store = Arc::new(InMemoryRuleStore::with_rules([
        weekend_penalty_rule(),
        constraint("C-LOW", 1),
        constraint("C-HIGH", 9),
        constraint("C-ALSO-HIGH", 9),
        long_shift_split_rule(),
        overtime_rule(),
    ]));
    let loader = loader(&store);

    let ids = loader.load_all_active_rules().unwrap();
    assert_eq!(
        ids,
        vec!["R-OT", "C-ALSO-HIGH", "C-HIGH", "C-LOW", "R-SPLIT", "R-WEEKEND"]
    );
    assert_eq!(
        loader.get_rules_by_category(RuleCategory::SplitPolicy),
        vec!["R-SPLIT"]
    );
}

#[test]
fn test_disabled_and_expired_rules_are_not_active() {
    let store = Arc::new(InMemoryRuleStore::with_rules([
        overtime_rule().disabled(),
        constraint("OLD", 0).with_window(utc(2020, 1, 1), Some(utc(2021, 1, 1))),
        constraint("LIVE", 0),
    ]));
    let loader = loader(&store);

    assert_eq!(loader.load_all_active_rules().unwrap(), vec!["LIVE"]);
    // Still cached, just not effective.
    assert!(!loader.is_rule_effective("R-OT", utc(2025, 6, 1)).unwrap());
    assert!(loader.is_rule_effective("OLD", utc(2020, 6, 1)).unwrap());
    assert!(!loader.is_rule_effective("OLD", utc(2021, 1, 1)).unwrap());
    assert!(matches!(
        loader.is_rule_effective("GHOST", utc(2025, 1, 1)),
        Err(ScheduleError::RuleNotFound(_))
    ));
}

#[test]
fn test_invalid_rules_are_skipped_on_full_reload() {
    let store = Arc::new(InMemoryRuleStore::with_rules([
        overtime_rule(),
        RuleDefinition::new("BROKEN", RuleCategory::ScheduleConstraint, "a = = 1").with_action("WARN"),
    ]));
    let loader = loader(&store);

    let report = loader.reload_all_rules().unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].0, "BROKEN");
    assert!(loader.load_rule_config("R-OT").is_ok());
}

#[test]
fn test_validate_reload_load_round_trip() {
    let rule = excluded_candidates_rule(&["E1", "E2"]);
    let store = Arc::new(InMemoryRuleStore::with_rules([rule.clone()]));
    let loader = loader(&store);

    loader.validator().validate_rule("R-EXCLUDE").unwrap();
    loader.reload_rule("R-EXCLUDE").unwrap();
    assert_eq!(loader.load_rule_config("R-EXCLUDE").unwrap(), rule.action);
}

#[test]
fn test_missing_rule_config() {
    let store = Arc::new(InMemoryRuleStore::new());
    let loader = loader(&store);
    assert!(matches!(
        loader.load_rule_config("R-NONE"),
        Err(ScheduleError::RuleNotFound(_))
    ));
}

#[test]
fn test_failed_reload_keeps_previous_version() {
    let store = Arc::new(InMemoryRuleStore::with_rules([overtime_rule()]));
    let loader = loader(&store);
    loader.reload_all_rules().unwrap();

    store.put(
        overtime_rule()
            .with_version(2)
            .with_action("NOT_AN_ACTION"),
    );
    assert!(matches!(
        loader.reload_rule("R-OT"),
        Err(ScheduleError::InvalidAction { .. })
    ));
    let active = loader.rule("R-OT").unwrap();
    assert_eq!(active.definition.version, 1);
}

#[test]
fn test_version_history_survives_retirement() {
    let store = Arc::new(InMemoryRuleStore::with_rules([overtime_rule()]));
    let loader = loader(&store);
    loader.reload_all_rules().unwrap();

    let v2 = RuleDefinition {
        condition: "employee.weeklyHours > 40".to_string(),
        ..overtime_rule().with_version(2)
    };
    store.put(v2);
    loader.reload_rule("R-OT").unwrap();
    store.remove("R-OT");
    assert!(loader.reload_rule("R-OT").is_err());

    assert!(loader.rule_version("R-OT", 1).is_ok());
    assert_eq!(
        loader.rule_version("R-OT", 2).unwrap().condition,
        "employee.weeklyHours > 40"
    );
    assert!(loader.get_rules_by_category(RuleCategory::ScheduleConstraint).is_empty());
}

#[test]
fn test_statistics_track_cache_hits() {
    let store = Arc::new(InMemoryRuleStore::with_rules([overtime_rule(), weekend_penalty_rule()]));
    let loader = loader(&store);
    loader.reload_all_rules().unwrap();

    loader.load_rule_config("R-OT").unwrap();
    loader.load_rule_config("R-OT").unwrap();
    loader.load_rule_config("R-WEEKEND").unwrap();
    let _ = loader.load_rule_config("R-GONE");

    let stats = loader.rule_statistics();
    assert_eq!(stats.total_rules, 2);
    assert_eq!(stats.active_rules, 2);
    assert_eq!(stats.per_category[&RuleCategory::SoftPreference], 1);
    assert_eq!(stats.cache_hits, 3);
    assert_eq!(stats.cache_misses, 1);
    assert!((stats.hit_ratio - 0.75).abs() < 1e-9);
}

#[test]
fn test_clear_empties_cache() {
    let store = Arc::new(InMemoryRuleStore::with_rules([overtime_rule()]));
    let loader = loader(&store);
    loader.reload_all_rules().unwrap();
    loader.clear();

    let stats = loader.rule_statistics();
    assert_eq!(stats.total_rules, 0);
    assert_eq!(stats.history_versions, 0);
}

#[test]
fn test_compiled_condition_evaluates() {
    let store = Arc::new(InMemoryRuleStore::with_rules([overtime_rule()]));
    let loader = loader(&store);
    let rule = loader.rule("R-OT").unwrap();

    let facts = FactContext::new().with("employee.weeklyHours", 50);
    let result = rule.evaluate(&facts).unwrap();
    assert!(result.value);
    assert_eq!(result.consulted, vec!["employee.weeklyHours"]);
}

#[test]
fn test_reload_never_exposes_partial_rule() {
    let unrelated: Vec<RuleDefinition> = (0..20)
        .map(|i| constraint(&format!("U{}", i), 0).with_param("message", format!("rule {}", i)))
        .collect();
    let hot_v1 = constraint("HOT", 0)
        .with_param("message", "one")
        .with_param("severity", "LOW");
    let store = Arc::new(InMemoryRuleStore::with_rules(
        unrelated.iter().cloned().chain([hot_v1]),
    ));
    let loader = Arc::new(loader(&store));
    loader.reload_all_rules().unwrap();

    thread::scope(|scope| {
        let writer_store = Arc::clone(&store);
        let writer_loader = Arc::clone(&loader);
        scope.spawn(move || {
            for round in 0..50u32 {
                let (message, severity) = if round % 2 == 0 {
                    ("two", "HIGH")
                } else {
                    ("one", "LOW")
                };
                writer_store.put(
                    constraint("HOT", 0)
                        .with_version(round + 2)
                        .with_param("message", message)
                        .with_param("severity", severity),
                );
                writer_loader.reload_rule("HOT").unwrap();
            }
        });

        for reader in 0..100usize {
            let loader = Arc::clone(&loader);
            let expected = unrelated[reader % unrelated.len()].clone();
            scope.spawn(move || {
                let config = loader.load_rule_config(&expected.id).unwrap();
                assert_eq!(config, expected.action);

                // The hot rule is either fully old or fully new.
                let hot = loader.load_rule_config("HOT").unwrap();
                let pair = (hot.get("message").cloned(), hot.get("severity").cloned());
                assert!(
                    pair == (Some(FactValue::from("one")), Some(FactValue::from("LOW")))
                        || pair == (Some(FactValue::from("two")), Some(FactValue::from("HIGH"))),
                    "torn read: {:?}",
                    pair
                );
            });
        }
    });
}
