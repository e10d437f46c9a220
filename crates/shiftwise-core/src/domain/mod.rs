//! Domain model: rules, plans, conflicts and pass results.

mod conflict;
mod outcome;
mod plan;
mod roster;
mod rule;

#[cfg(test)]
mod tests;

pub use conflict::{
    AssignmentChange, Conflict, ConflictKey, ConflictType, ResidualConflict, ResidualReason,
    Resolution, Severity,
};
pub use outcome::{
    AreaForecast, OptimizationResult, OptimizationTarget, Prediction, SlotGap, TerminationReason,
};
pub use plan::{
    overlap_minutes, AssignmentId, AssignmentSource, EmployeeId, PlanStatus, SchedulePlan,
    ShiftAssignment, ShiftDefinition,
};
pub use roster::{EmployeeProfile, StaffingRequirement, Unavailability};
pub use rule::{ActionConfig, RuleCategory, RuleDefinition, RuleId, ACTION_KEY};
