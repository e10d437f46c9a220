//! Shiftwise Engine
//!
//! This crate provides the scheduling engine on top of the rule cache:
//! - Conflict detection (overlap, rest, rolling max hours, leave, rules)
//! - Conflict resolution with named strategies
//! - Local-search optimization against a target
//! - Read-only staffing prediction
//! - Initial plan generation
//! - [`ScheduleEngine`], which runs the plan lifecycle over the collaborator
//!   traits in [`sources`]

pub mod context;
pub mod coverage;
pub mod detect;
pub mod engine;
pub mod facts;
pub mod generate;
pub mod optimize;
pub mod predict;
pub mod resolve;
pub mod sources;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_utils;

pub use context::PlanningContext;
pub use detect::{conflict_keys, hard_keys, rule_severity, ConflictDetector};
pub use engine::{RefinedPlan, ResolvedPlan, ScheduleEngine, ScheduleEngineBuilder, ValidatedPlan};
pub use facts::FactBuilder;
pub use generate::PlanGenerator;
pub use optimize::{
    Acceptor, HillClimbingAcceptor, MoveSelector, Objective, PlanMove, ScheduleOptimizer,
    SimulatedAnnealingAcceptor,
};
pub use predict::SchedulePredictor;
pub use resolve::{
    CandidatePool, ConflictResolver, EscalateStrategy, Proposal, ReassignStrategy,
    ResolutionStrategy, SplitStrategy, StrategyRegistry, SwapStrategy,
};
pub use sources::{
    AvailabilitySource, DemandSource, InMemoryAvailability, InMemoryDemand,
    InMemoryPlanRepository, PlanRepository,
};
pub use stats::PlanStatistics;
