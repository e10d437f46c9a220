//! Plan builders and canned conflict scenarios.
//!
//! # Example
//!
//! ```
//! use shiftwise_test::{at, date, PlanBuilder};
//!
//! let plan = PlanBuilder::new("P1", date(2025, 3, 1), date(2025, 3, 7))
//!     .assign("A1", "E1", at(2025, 3, 1, 8, 0), at(2025, 3, 1, 16, 0))
//!     .build();
//! assert_eq!(plan.assignments[0].shift.area, shiftwise_test::plan::DEFAULT_AREA);
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use shiftwise_core::{AssignmentSource, SchedulePlan, ShiftAssignment, ShiftDefinition};

use crate::time::{at, date};

/// Area used when a fixture does not name one.
pub const DEFAULT_AREA: &str = "FRONT";

/// A generated assignment in [`DEFAULT_AREA`].
pub fn assign(id: &str, employee: &str, start: NaiveDateTime, end: NaiveDateTime) -> ShiftAssignment {
    ShiftAssignment::new(id, employee, ShiftDefinition::new(start, end, DEFAULT_AREA))
}

/// Fluent builder for plans.
pub struct PlanBuilder {
    plan: SchedulePlan,
}

impl PlanBuilder {
    pub fn new(id: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            plan: SchedulePlan::new(id, start, end),
        }
    }

    pub fn assign(self, id: &str, employee: &str, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.push(assign(id, employee, start, end))
    }

    pub fn assign_in(
        self,
        id: &str,
        employee: &str,
        area: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        self.push(ShiftAssignment::new(id, employee, ShiftDefinition::new(start, end, area)))
    }

    /// Adds a pinned, planner-entered assignment.
    pub fn manual(self, id: &str, employee: &str, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.push(assign(id, employee, start, end).with_source(AssignmentSource::Manual))
    }

    pub fn push(mut self, assignment: ShiftAssignment) -> Self {
        self.plan = self.plan.with_assignment(assignment);
        self
    }

    pub fn build(self) -> SchedulePlan {
        self.plan
    }
}

/// E7 works 08:00-16:00 and 14:00-22:00 on 2025-03-01: one 4-hour overlap.
pub fn overlap_plan() -> SchedulePlan {
    PlanBuilder::new("P-OVERLAP", date(2025, 3, 1), date(2025, 3, 2))
        .assign("A", "E7", at(2025, 3, 1, 8, 0), at(2025, 3, 1, 16, 0))
        .assign("B", "E7", at(2025, 3, 1, 14, 0), at(2025, 3, 1, 22, 0))
        .build()
}

/// [`overlap_plan`] plus E9 working 08:00-16:00 on 2025-03-02 and free on
/// 2025-03-01 14:00-22:00, so exchanging B and C removes the overlap.
pub fn swap_plan() -> SchedulePlan {
    let mut plan = overlap_plan();
    plan.id = "P-SWAP".to_string();
    plan.add_assignment(assign("C", "E9", at(2025, 3, 2, 8, 0), at(2025, 3, 2, 16, 0)))
        .unwrap();
    plan
}

/// One week of conflict-free day shifts for three employees in one area.
pub fn clean_week() -> SchedulePlan {
    let mut builder = PlanBuilder::new("P-WEEK", date(2025, 3, 3), date(2025, 3, 9));
    for (offset, day) in (3..=7).enumerate() {
        for (slot, employee) in ["E1", "E2", "E3"].iter().enumerate() {
            let id = format!("W{}-{}", offset + 1, slot + 1);
            let start = 6 + slot as u32 * 4;
            builder = builder.assign(
                &id,
                employee,
                at(2025, 3, day, start, 0),
                at(2025, 3, day, start + 8, 0),
            );
        }
    }
    builder.build()
}
