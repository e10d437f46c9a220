//! Tests for the domain model.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::*;
use crate::error::{ChangeState, ScheduleError};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    date(2025, 3, day).and_hms_opt(hour, 0, 0).unwrap()
}

fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn assignment(id: &str, employee: &str, day: u32, from: u32, to: u32) -> ShiftAssignment {
    ShiftAssignment::new(id, employee, ShiftDefinition::new(at(day, from), at(day, to), "North"))
}

#[test]
fn test_plan_rejects_assignment_outside_range() {
    let mut plan = SchedulePlan::new("P1", date(2025, 3, 1), date(2025, 3, 2));
    assert!(plan.add_assignment(assignment("A1", "E1", 2, 8, 16)).is_ok());

    let err = plan
        .add_assignment(assignment("A2", "E1", 3, 8, 16))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::OutOfRange { .. }));
    assert_eq!(plan.assignments.len(), 1);
}

#[test]
fn test_plan_keeps_assignments_ordered() {
    let plan = SchedulePlan::new("P1", date(2025, 3, 1), date(2025, 3, 3))
        .with_assignment(assignment("A2", "E1", 2, 8, 16))
        .with_assignment(assignment("A1", "E2", 1, 8, 16))
        .with_assignment(assignment("A3", "E1", 1, 8, 16));

    let ids: Vec<&str> = plan.assignments.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["A3", "A1", "A2"]);
    assert_eq!(plan.dates().count(), 3);
    assert_eq!(plan.employees().len(), 2);
}

#[test]
fn test_overlap_ignores_permitted_split_parts() {
    let first = assignment("A1", "E7", 1, 8, 16);
    let second = assignment("A2", "E7", 1, 14, 22);
    assert_eq!(first.conflicting_overlap(&second), 240);

    let first = first.as_split();
    let second = second.as_split();
    assert_eq!(first.conflicting_overlap(&second), 0);

    let other = assignment("A3", "E9", 1, 14, 22);
    assert_eq!(assignment("A1", "E7", 1, 8, 16).conflicting_overlap(&other), 0);
}

#[test]
fn test_rule_effective_window_is_half_open() {
    let rule = RuleDefinition::new("R1", RuleCategory::ScheduleConstraint, "true")
        .with_window(utc(2025, 1, 1), Some(utc(2025, 2, 1)));

    assert!(rule.is_effective_at(utc(2025, 1, 1)));
    assert!(rule.is_effective_at(utc(2025, 1, 31)));
    assert!(!rule.is_effective_at(utc(2025, 2, 1)));
    assert!(!rule.is_effective_at(utc(2024, 12, 31)));
    assert!(!rule.clone().disabled().is_effective_at(utc(2025, 1, 15)));
}

#[test]
fn test_swap_change_exchanges_employees() {
    let mut plan = SchedulePlan::new("P1", date(2025, 3, 1), date(2025, 3, 2))
        .with_assignment(assignment("A1", "E7", 1, 14, 22))
        .with_assignment(assignment("A2", "E9", 2, 8, 16));

    AssignmentChange::Swap {
        first_id: "A1".into(),
        second_id: "A2".into(),
    }
    .apply(&mut plan)
    .unwrap();

    assert_eq!(plan.assignment("A1").unwrap().employee_id, "E9");
    assert_eq!(plan.assignment("A2").unwrap().employee_id, "E7");
    assert_eq!(plan.assignment("A1").unwrap().source, AssignmentSource::Resolved);
}

#[test]
fn test_split_change_replaces_original() {
    let mut plan = SchedulePlan::new("P1", date(2025, 3, 1), date(2025, 3, 1))
        .with_assignment(assignment("A1", "E7", 1, 8, 20));
    let kept = assignment("A1-1", "E7", 1, 8, 14).as_split();
    let handed_off = assignment("A1-2", "E9", 1, 14, 20).as_split();

    AssignmentChange::Split {
        original_id: "A1".into(),
        kept,
        handed_off,
    }
    .apply(&mut plan)
    .unwrap();

    assert!(plan.assignment("A1").is_none());
    assert_eq!(plan.assignments.len(), 2);
    assert_eq!(plan.total_minutes(), 12 * 60);
}

#[test]
fn test_change_on_missing_assignment_fails() {
    let mut plan = SchedulePlan::new("P1", date(2025, 3, 1), date(2025, 3, 1));
    let err = AssignmentChange::Reassign {
        assignment_id: "nope".into(),
        from_employee: "E1".into(),
        to_employee: "E2".into(),
    }
    .apply(&mut plan)
    .unwrap_err();
    assert!(matches!(err, ScheduleError::AssignmentNotFound { .. }));
}

#[test]
fn test_severity_order_and_parse() {
    assert!(Severity::Critical > Severity::High);
    assert!(Severity::High.is_hard());
    assert!(!Severity::Medium.is_hard());
    assert_eq!("high".parse::<Severity>(), Ok(Severity::High));
    assert!("urgent".parse::<Severity>().is_err());
}

#[test]
fn test_conflict_key_is_order_independent() {
    let a = Conflict::new(
        ConflictType::Overlap,
        vec!["A2".into(), "A1".into()],
        date(2025, 3, 1),
        Severity::Critical,
    );
    let b = Conflict::new(
        ConflictType::Overlap,
        vec!["A1".into(), "A2".into()],
        date(2025, 3, 1),
        Severity::Critical,
    )
    .with_detail("different text");
    assert_eq!(a.key(), b.key());
}

#[test]
fn test_partial_application_is_not_retry_safe() {
    let err = ScheduleError::Cancelled;
    assert_eq!(err.change_state(), ChangeState::Unchanged);

    let wrapped = ScheduleError::Cancelled.after_commit(4);
    assert_eq!(wrapped.change_state(), ChangeState::PartiallyApplied);
    assert!(!wrapped.is_retry_safe());

    // Wrapping twice keeps the first committed version.
    let twice = wrapped.after_commit(9);
    assert!(matches!(
        twice,
        ScheduleError::PartiallyApplied {
            committed_version: 4,
            ..
        }
    ));
}

#[test]
fn test_target_parse() {
    assert_eq!(
        "max_fairness".parse::<OptimizationTarget>().unwrap(),
        OptimizationTarget::MaxFairness
    );
    assert!(matches!(
        "MAX_PROFIT".parse::<OptimizationTarget>(),
        Err(ScheduleError::UnknownTarget(_))
    ));
}

#[test]
fn test_conflict_report_serializes() {
    let conflict = Conflict::new(
        ConflictType::RuleViolation,
        vec!["A1".into()],
        date(2025, 3, 1),
        Severity::Medium,
    )
    .from_rule("R-OT", vec!["employee.weeklyHours".into()]);

    let json = serde_json::to_value(&conflict).unwrap();
    assert_eq!(json["conflict_type"], "RULE_VIOLATION");
    assert_eq!(json["severity"], "MEDIUM");
    assert_eq!(json["rule_id"], "R-OT");
}

#[test]
fn test_shifted_definition_keeps_duration() {
    let shift = ShiftDefinition::new(at(1, 8), at(1, 16), "North");
    let moved = shift.shifted(30);
    assert_eq!(moved.start, at(1, 8) + Duration::minutes(30));
    assert_eq!(moved.duration_minutes(), shift.duration_minutes());
}
