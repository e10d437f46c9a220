//! Shiftwise - A rule-driven staff scheduling engine in Rust
//!
//! Business rules decide what a valid schedule looks like; the engine
//! detects conflicts, resolves them with named strategies, optimizes
//! against a target and predicts staffing coverage.
//!
//! # Example
//!
//! ```rust
//! use shiftwise::prelude::*;
//!
//! let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
//! let plan = SchedulePlan::new("P1", day, day)
//!     .with_assignment(ShiftAssignment::new(
//!         "A",
//!         "E7",
//!         ShiftDefinition::new(day.and_hms_opt(8, 0, 0).unwrap(), day.and_hms_opt(16, 0, 0).unwrap(), "FRONT"),
//!     ))
//!     .with_assignment(ShiftAssignment::new(
//!         "B",
//!         "E7",
//!         ShiftDefinition::new(day.and_hms_opt(14, 0, 0).unwrap(), day.and_hms_opt(22, 0, 0).unwrap(), "FRONT"),
//!     ));
//!
//! let engine = ScheduleEngine::builder().build();
//! engine.start().unwrap();
//!
//! let conflicts = engine.validate_schedule_conflicts(&plan).unwrap();
//! assert_eq!(conflicts.len(), 1);
//! assert_eq!(conflicts[0].conflict_type, ConflictType::Overlap);
//! ```

pub mod logging;

// Domain model
pub use shiftwise_core::{
    ActionConfig, AreaForecast, AssignmentChange, AssignmentId, AssignmentSource, Conflict,
    ConflictKey, ConflictType, EmployeeId, EmployeeProfile, OptimizationResult,
    OptimizationTarget, PlanStatus, Prediction, ResidualConflict, ResidualReason, Resolution,
    RuleCategory, RuleDefinition, RuleId, SchedulePlan, Severity, ShiftAssignment,
    ShiftDefinition, SlotGap, StaffingRequirement, TerminationReason, Unavailability,
};

// Scores, facts and cancellation
pub use shiftwise_core::{CancellationToken, FactValue, PlanScore};

// Errors
pub use shiftwise_core::{ChangeState, Result, ScheduleError};

// Configuration
pub use shiftwise_config::{
    ConfigError, DetectionConfig, EngineConfig, GenerationConfig, GenerationHeuristic,
    OptimizerConfig, PredictionConfig, ResolutionConfig, RulesConfig,
};

// Rule lifecycle
pub use shiftwise_rules::{
    ActionRegistry, ActionSchema, CompiledRule, FactContext, InMemoryRuleStore, ParamType,
    ReloadReport, RuleLoader, RuleSnapshot, RuleStatistics, RuleStore, RuleValidator,
};

// Condition language
pub use shiftwise_rules::condition;

// Engine
pub use shiftwise_engine::{
    PlanStatistics, RefinedPlan, ResolvedPlan, ScheduleEngine, ScheduleEngineBuilder,
    ValidatedPlan,
};

// Engine components, for callers wiring their own pipeline
pub use shiftwise_engine::{
    ConflictDetector, ConflictResolver, PlanGenerator, PlanningContext, ResolutionStrategy,
    ScheduleOptimizer, SchedulePredictor, StrategyRegistry,
};

// Collaborator seams
pub use shiftwise_engine::{
    AvailabilitySource, DemandSource, InMemoryAvailability, InMemoryDemand,
    InMemoryPlanRepository, PlanRepository,
};

pub mod prelude {
    pub use super::{
        CancellationToken, Conflict, ConflictType, EmployeeProfile, EngineConfig,
        OptimizationTarget, PlanStatus, RuleCategory, RuleDefinition, ScheduleEngine,
        ScheduleError, SchedulePlan, Severity, ShiftAssignment, ShiftDefinition,
        StaffingRequirement, Unavailability,
    };
    pub use chrono::{NaiveDate, NaiveDateTime};
}
