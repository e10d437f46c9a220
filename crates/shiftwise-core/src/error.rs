//! Error types for Shiftwise

use thiserror::Error;

/// Whether a failed operation left persistent state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeState {
    /// Nothing was changed; the call is safe to retry as-is.
    Unchanged,
    /// Part of the work was committed; re-fetch the plan before retrying.
    PartiallyApplied,
}

/// Main error type for Shiftwise operations
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// No rule with the given id exists in the store or cache.
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    /// A condition expression could not be parsed.
    #[error("Syntax error at position {position} near '{token}': {message}")]
    Syntax {
        message: String,
        token: String,
        position: usize,
    },

    /// Operands of an operator had incompatible types at evaluation time.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// A condition referenced a fact that the context does not provide.
    #[error("Unknown fact: {0}")]
    UnknownFact(String),

    /// Rule "requires" references form a cycle.
    #[error("Cyclic rule dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// The action configuration is missing or names an unregistered action.
    #[error("Invalid action for rule {rule_id}: {message}")]
    InvalidAction { rule_id: String, message: String },

    /// A declared parameter is missing, unknown or of the wrong type.
    #[error("Invalid parameter '{parameter}' for {rule_type}: {message}")]
    InvalidParameter {
        rule_type: String,
        parameter: String,
        message: String,
    },

    /// The rule author may not publish rules of this category.
    #[error("Author '{author}' may not manage {category} rules")]
    PermissionDenied { author: String, category: String },

    /// The effective window is empty or inverted.
    #[error("Invalid effective time range for rule {0}")]
    InvalidTimeRange(String),

    /// No resolution strategy is registered under this name.
    #[error("Unknown resolution strategy: {0}")]
    UnknownStrategy(String),

    /// No optimization objective is known under this name.
    #[error("Unknown optimization target: {0}")]
    UnknownTarget(String),

    /// Every candidate resolution step would introduce an equal or worse conflict.
    #[error("No safe resolution for conflicts: {}", conflict_ids.join(", "))]
    NoSafeResolution { conflict_ids: Vec<String> },

    /// The plan was modified by someone else since it was read.
    #[error("Stale version for plan {plan_id}: expected {expected}, found {actual}")]
    StaleVersion {
        plan_id: String,
        expected: u64,
        actual: u64,
    },

    /// The operation observed a cancellation request.
    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error("Assignment {assignment_id} not found in plan {plan_id}")]
    AssignmentNotFound {
        plan_id: String,
        assignment_id: String,
    },

    /// Published plans are immutable to the engine.
    #[error("Plan {0} is published and cannot be changed")]
    PlanPublished(String),

    /// The requested lifecycle transition is not allowed from the current status.
    #[error("Invalid transition for plan {plan_id}: {from} -> {to}")]
    InvalidTransition {
        plan_id: String,
        from: String,
        to: String,
    },

    /// An assignment lies outside the plan's date range.
    #[error("Assignment {assignment_id} falls outside the range of plan {plan_id}")]
    OutOfRange {
        plan_id: String,
        assignment_id: String,
    },

    /// A collaborator (rule store, plan repository, ...) failed.
    #[error("Store error: {0}")]
    Store(String),

    /// An earlier stage of a multi-stage call was committed before `source` failed.
    #[error("Partially applied (committed version {committed_version}): {source}")]
    PartiallyApplied {
        committed_version: u64,
        #[source]
        source: Box<ScheduleError>,
    },
}

impl ScheduleError {
    /// Reports whether the failure left the plan untouched.
    pub fn change_state(&self) -> ChangeState {
        match self {
            ScheduleError::PartiallyApplied { .. } => ChangeState::PartiallyApplied,
            _ => ChangeState::Unchanged,
        }
    }

    /// Returns true when the same call can simply be repeated.
    pub fn is_retry_safe(&self) -> bool {
        self.change_state() == ChangeState::Unchanged
    }

    /// Wraps an error raised after `committed_version` was already persisted.
    pub fn after_commit(self, committed_version: u64) -> Self {
        match self {
            partial @ ScheduleError::PartiallyApplied { .. } => partial,
            other => ScheduleError::PartiallyApplied {
                committed_version,
                source: Box::new(other),
            },
        }
    }

    pub fn syntax(message: impl Into<String>, token: impl Into<String>, position: usize) -> Self {
        ScheduleError::Syntax {
            message: message.into(),
            token: token.into(),
            position,
        }
    }
}

/// Result type alias for Shiftwise operations
pub type Result<T> = std::result::Result<T, ScheduleError>;
