//! Test utilities for shiftwise-engine
//!
//! Builds planning contexts over real rule snapshots so detector, resolver
//! and optimizer tests exercise the same admission path as the engine.

use std::sync::Arc;

use shiftwise_config::RulesConfig;
use shiftwise_core::{EmployeeProfile, RuleDefinition, StaffingRequirement, Unavailability};
use shiftwise_rules::{ActionRegistry, InMemoryRuleStore, RuleLoader, RuleSnapshot};
use shiftwise_test::utc;

use crate::context::PlanningContext;

/// A snapshot holding every valid rule in `rules`.
pub fn snapshot(rules: Vec<RuleDefinition>) -> Arc<RuleSnapshot> {
    let loader = RuleLoader::new(
        Arc::new(InMemoryRuleStore::with_rules(rules)),
        Arc::new(ActionRegistry::with_builtins()),
        RulesConfig::default(),
    );
    loader.reload_all_rules().unwrap();
    loader.snapshot()
}

/// Context evaluated at 2025-06-01 with the given rules and nothing else.
pub fn context(rules: Vec<RuleDefinition>) -> PlanningContext {
    PlanningContext::new(snapshot(rules), utc(2025, 6, 1))
}

pub fn context_with(
    rules: Vec<RuleDefinition>,
    roster: Vec<EmployeeProfile>,
    unavailability: Vec<Unavailability>,
    demand: Vec<StaffingRequirement>,
) -> PlanningContext {
    context(rules)
        .with_roster(roster)
        .with_unavailability(unavailability)
        .with_demand(demand)
}
