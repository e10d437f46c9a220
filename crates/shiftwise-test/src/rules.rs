//! Rule definitions shared by loader, detector and engine tests.
//!
//! Every fixture is effective from 2020-01-01 to 2100-01-01.

use shiftwise_core::{RuleCategory, RuleDefinition};

use crate::time::utc;

fn windowed(rule: RuleDefinition) -> RuleDefinition {
    rule.with_window(utc(2020, 1, 1), Some(utc(2100, 1, 1)))
}

/// `employee.weeklyHours > 48` flags overtime.
pub fn overtime_rule() -> RuleDefinition {
    windowed(
        RuleDefinition::new("R-OT", RuleCategory::ScheduleConstraint, "employee.weeklyHours > 48")
            .with_action("FLAG_OVERTIME")
            .with_priority(10),
    )
}

/// Shifts longer than ten hours may be split.
pub fn long_shift_split_rule() -> RuleDefinition {
    windowed(
        RuleDefinition::new("R-SPLIT", RuleCategory::SplitPolicy, "shift.durationMinutes > 600")
            .with_action("ALLOW_SPLIT")
            .with_param("min_part_minutes", 120),
    )
}

/// Weekend work costs soft score.
pub fn weekend_penalty_rule() -> RuleDefinition {
    windowed(
        RuleDefinition::new("R-WEEKEND", RuleCategory::SoftPreference, "date.isWeekend")
            .with_action("PENALIZE")
            .with_param("weight", 10),
    )
}

/// Excludes the listed employees as replacement candidates.
pub fn excluded_candidates_rule(ids: &[&str]) -> RuleDefinition {
    let list = ids
        .iter()
        .map(|id| format!("'{}'", id))
        .collect::<Vec<_>>()
        .join(", ");
    windowed(
        RuleDefinition::new(
            "R-EXCLUDE",
            RuleCategory::Eligibility,
            format!("employee.id in [{}]", list),
        )
        .with_action("EXCLUDE_CANDIDATE")
        .with_param("reason", "not trained"),
    )
}

/// Parses and validates, but reads a fact no context provides.
pub fn unknown_fact_rule() -> RuleDefinition {
    windowed(
        RuleDefinition::new("R-MOOD", RuleCategory::ScheduleConstraint, "employee.mood = 'grumpy'")
            .with_action("WARN"),
    )
}
