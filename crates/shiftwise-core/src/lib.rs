//! Shiftwise Core - Domain types for the rule-driven scheduling engine
//!
//! This crate provides the fundamental abstractions shared by every
//! Shiftwise crate:
//! - Domain model (rules, plans, assignments, conflicts, resolutions)
//! - `PlanScore` for ranking plans under an objective
//! - `FactValue` for rule facts and action parameters
//! - The `ScheduleError` taxonomy
//! - `CancellationToken` for cooperative cancellation

pub mod cancel;
pub mod domain;
pub mod error;
pub mod score;
pub mod value;

pub use cancel::CancellationToken;
pub use domain::{
    ActionConfig, AreaForecast, AssignmentChange, AssignmentId, AssignmentSource, Conflict,
    ConflictKey, ConflictType, EmployeeId, EmployeeProfile, OptimizationResult,
    OptimizationTarget, PlanStatus, Prediction, ResidualConflict, ResidualReason, Resolution,
    RuleCategory, RuleDefinition, RuleId, SchedulePlan, Severity, ShiftAssignment,
    ShiftDefinition, SlotGap, StaffingRequirement, TerminationReason, Unavailability,
};
pub use error::{ChangeState, Result, ScheduleError};
pub use score::PlanScore;
pub use value::FactValue;
