//! Builder for ScheduleEngine wiring.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shiftwise_config::EngineConfig;
use shiftwise_rules::{ActionRegistry, InMemoryRuleStore, RuleLoader, RuleStore};

use super::ScheduleEngine;
use crate::detect::ConflictDetector;
use crate::generate::PlanGenerator;
use crate::optimize::ScheduleOptimizer;
use crate::predict::SchedulePredictor;
use crate::resolve::{ConflictResolver, ResolutionStrategy, StrategyRegistry};
use crate::sources::{
    AvailabilitySource, DemandSource, InMemoryAvailability, InMemoryDemand,
    InMemoryPlanRepository, PlanRepository,
};

/// Builder for [`ScheduleEngine`].
///
/// Every collaborator defaults to an empty in-memory implementation.
pub struct ScheduleEngineBuilder {
    config: EngineConfig,
    rule_store: Arc<dyn RuleStore>,
    actions: ActionRegistry,
    strategies: StrategyRegistry,
    availability: Arc<dyn AvailabilitySource>,
    demand: Arc<dyn DemandSource>,
    plans: Arc<dyn PlanRepository>,
    evaluation_time: Option<DateTime<Utc>>,
}

impl ScheduleEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            rule_store: Arc::new(InMemoryRuleStore::new()),
            actions: ActionRegistry::with_builtins(),
            strategies: StrategyRegistry::with_builtins(),
            availability: Arc::new(InMemoryAvailability::new()),
            demand: Arc::new(InMemoryDemand::new()),
            plans: Arc::new(InMemoryPlanRepository::new()),
            evaluation_time: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_rule_store(mut self, store: Arc<dyn RuleStore>) -> Self {
        self.rule_store = store;
        self
    }

    /// Replaces the action registry, e.g. one with custom schemas.
    pub fn with_action_registry(mut self, actions: ActionRegistry) -> Self {
        self.actions = actions;
        self
    }

    /// Registers an extra resolution strategy next to the built-ins.
    pub fn with_strategy(mut self, strategy: Arc<dyn ResolutionStrategy>) -> Self {
        self.strategies.register(strategy);
        self
    }

    pub fn with_availability(mut self, availability: Arc<dyn AvailabilitySource>) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_demand(mut self, demand: Arc<dyn DemandSource>) -> Self {
        self.demand = demand;
        self
    }

    pub fn with_plans(mut self, plans: Arc<dyn PlanRepository>) -> Self {
        self.plans = plans;
        self
    }

    /// Evaluates rule effective windows at a fixed instant instead of now.
    pub fn with_evaluation_time(mut self, at: DateTime<Utc>) -> Self {
        self.evaluation_time = Some(at);
        self
    }

    pub fn build(self) -> ScheduleEngine {
        let config = self.config;
        let detector = ConflictDetector::new(config.detection.clone());
        let slot_minutes = config.prediction.slot_minutes;
        ScheduleEngine {
            rules: RuleLoader::new(self.rule_store, Arc::new(self.actions), config.rules.clone()),
            resolver: ConflictResolver::new(detector.clone(), self.strategies),
            optimizer: ScheduleOptimizer::new(config.optimizer.clone(), detector.clone(), slot_minutes),
            predictor: SchedulePredictor::new(detector.clone(), slot_minutes),
            generator: PlanGenerator::new(config.generation.clone(), config.detection.clone()),
            detector,
            availability: self.availability,
            demand: self.demand,
            plans: self.plans,
            evaluation_time: self.evaluation_time,
            config,
        }
    }
}

impl Default for ScheduleEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
