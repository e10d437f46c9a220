//! Builds the fact context a rule condition sees for one assignment.

use std::collections::{BTreeMap, BTreeSet};
use std::iter;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike, Weekday};
use shiftwise_config::DetectionConfig;
use shiftwise_core::domain::overlap_minutes;
use shiftwise_core::{SchedulePlan, ShiftAssignment, ShiftDefinition};
use shiftwise_rules::facts::names;
use shiftwise_rules::FactContext;

/// Per-plan index used to derive employee aggregates.
///
/// # Example
///
/// ```
/// use shiftwise_config::DetectionConfig;
/// use shiftwise_engine::facts::FactBuilder;
/// use shiftwise_core::FactValue;
/// use shiftwise_test::plan::clean_week;
///
/// let plan = clean_week();
/// let config = DetectionConfig::default();
/// let builder = FactBuilder::new(&plan, &config);
/// let facts = builder.facts_for(&plan.assignments[0]);
/// assert_eq!(facts.get("employee.weeklyHours"), Some(&FactValue::Float(40.0)));
/// ```
pub struct FactBuilder<'a> {
    config: &'a DetectionConfig,
    by_employee: BTreeMap<&'a str, Vec<&'a ShiftAssignment>>,
}

impl<'a> FactBuilder<'a> {
    pub fn new(plan: &'a SchedulePlan, config: &'a DetectionConfig) -> Self {
        let mut by_employee: BTreeMap<&str, Vec<&ShiftAssignment>> = BTreeMap::new();
        for assignment in &plan.assignments {
            by_employee
                .entry(assignment.employee_id.as_str())
                .or_default()
                .push(assignment);
        }
        Self {
            config,
            by_employee,
        }
    }

    /// Facts for `assignment`, which need not be part of the plan.
    ///
    /// Employee aggregates count the employee's plan assignments with
    /// `assignment` replacing any plan assignment of the same id.
    pub fn facts_for(&self, assignment: &ShiftAssignment) -> FactContext {
        let shift = &assignment.shift;
        let worked: Vec<&ShiftAssignment> = self
            .by_employee
            .get(assignment.employee_id.as_str())
            .into_iter()
            .flatten()
            .copied()
            .filter(|a| a.id != assignment.id)
            .chain(iter::once(assignment))
            .collect();

        let week = shift.start.iso_week();
        let weekly_minutes: i64 = worked
            .iter()
            .filter(|a| a.shift.start.iso_week() == week)
            .map(|a| a.shift.duration_minutes())
            .sum();

        let window_start = shift.end - Duration::days(self.config.max_hours_window_days);
        let window_minutes: i64 = worked
            .iter()
            .map(|a| overlap_minutes(a.shift.start, a.shift.end, window_start, shift.end))
            .sum();

        let worked_days: BTreeSet<NaiveDate> = worked.iter().map(|a| a.shift.date()).collect();
        let date = shift.date();
        let consecutive = iter::successors(Some(date), |d| d.pred_opt())
            .take_while(|d| worked_days.contains(d))
            .count();

        let weekday = date.weekday();
        FactContext::new()
            .with(names::EMPLOYEE_ID, assignment.employee_id.as_str())
            .with(names::EMPLOYEE_WEEKLY_HOURS, weekly_minutes as f64 / 60.0)
            .with(names::EMPLOYEE_WINDOW_HOURS, window_minutes as f64 / 60.0)
            .with(names::EMPLOYEE_SHIFT_COUNT, worked.len() as i64)
            .with(names::EMPLOYEE_CONSECUTIVE_DAYS, consecutive as i64)
            .with(names::SHIFT_DURATION_MINUTES, shift.duration_minutes())
            .with(names::SHIFT_START_HOUR, shift.start.hour())
            .with(names::SHIFT_END_HOUR, shift.end.hour())
            .with(names::SHIFT_AREA, shift.area.as_str())
            .with(names::SHIFT_IS_NIGHT, touches_night(shift))
            .with(names::SHIFT_IS_SPLIT, assignment.permitted_split)
            .with(names::SHIFT_SOURCE, assignment.source.as_str())
            .with(names::DATE_DAY_OF_WEEK, weekday.number_from_monday())
            .with(
                names::DATE_IS_WEEKEND,
                matches!(weekday, Weekday::Sat | Weekday::Sun),
            )
            .with(names::DATE_IS_HOLIDAY, self.config.is_holiday(date))
            .with(names::DATE_ISO, date.format("%Y-%m-%d").to_string())
    }
}

const NIGHT_START_HOUR: i64 = 22;
const NIGHT_HOURS: i64 = 8;

/// True if any part of the shift falls between 22:00 and 06:00.
pub fn touches_night(shift: &ShiftDefinition) -> bool {
    let mut day = shift.start.date() - Duration::days(1);
    while day <= shift.end.date() {
        let night_start = day.and_time(NaiveTime::MIN) + Duration::hours(NIGHT_START_HOUR);
        let night_end = night_start + Duration::hours(NIGHT_HOURS);
        if overlap_minutes(shift.start, shift.end, night_start, night_end) > 0 {
            return true;
        }
        day += Duration::days(1);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftwise_core::FactValue;
    use shiftwise_test::{assign, at, date, PlanBuilder};

    #[test]
    fn test_weekly_hours_counts_iso_week_only() {
        // Sunday 2025-03-09 belongs to the week of Monday 03-03; 03-10 does not.
        let plan = PlanBuilder::new("P", date(2025, 3, 3), date(2025, 3, 10))
            .assign("A", "E1", at(2025, 3, 3, 8, 0), at(2025, 3, 3, 18, 0))
            .assign("B", "E1", at(2025, 3, 9, 8, 0), at(2025, 3, 9, 18, 0))
            .assign("C", "E1", at(2025, 3, 10, 8, 0), at(2025, 3, 10, 18, 0))
            .build();
        let config = DetectionConfig::default();
        let builder = FactBuilder::new(&plan, &config);

        let facts = builder.facts_for(plan.assignment("B").unwrap());
        assert_eq!(facts.get(names::EMPLOYEE_WEEKLY_HOURS), Some(&FactValue::Float(20.0)));
        assert_eq!(facts.get(names::EMPLOYEE_SHIFT_COUNT), Some(&FactValue::Int(3)));
        assert_eq!(facts.get(names::DATE_IS_WEEKEND), Some(&FactValue::Bool(true)));
        assert_eq!(facts.get(names::DATE_DAY_OF_WEEK), Some(&FactValue::Int(7)));
        assert_eq!(facts.get(names::EMPLOYEE_CONSECUTIVE_DAYS), Some(&FactValue::Int(1)));
    }

    #[test]
    fn test_hypothetical_assignment_is_counted_once() {
        let plan = PlanBuilder::new("P", date(2025, 3, 3), date(2025, 3, 9))
            .assign("A", "E1", at(2025, 3, 3, 8, 0), at(2025, 3, 3, 16, 0))
            .assign("B", "E2", at(2025, 3, 4, 8, 0), at(2025, 3, 4, 16, 0))
            .build();
        let config = DetectionConfig::default();
        let builder = FactBuilder::new(&plan, &config);

        // B as if E1 worked it.
        let moved = assign("B", "E1", at(2025, 3, 4, 8, 0), at(2025, 3, 4, 16, 0));
        let facts = builder.facts_for(&moved);
        assert_eq!(facts.get(names::EMPLOYEE_WEEKLY_HOURS), Some(&FactValue::Float(16.0)));
        assert_eq!(facts.get(names::EMPLOYEE_CONSECUTIVE_DAYS), Some(&FactValue::Int(2)));
        assert_eq!(facts.get(names::EMPLOYEE_ID), Some(&FactValue::from("E1")));
    }

    #[test]
    fn test_every_named_fact_is_populated() {
        let plan = shiftwise_test::plan::clean_week();
        let config = DetectionConfig::default();
        let facts = FactBuilder::new(&plan, &config).facts_for(&plan.assignments[0]);
        for name in names::ALL {
            assert!(facts.contains(name), "{} missing", name);
        }
    }

    #[test]
    fn test_holiday_and_night() {
        let plan = PlanBuilder::new("P", date(2025, 12, 24), date(2025, 12, 26))
            .assign("N", "E1", at(2025, 12, 25, 20, 0), at(2025, 12, 26, 4, 0))
            .build();
        let config = DetectionConfig::default();
        let config = DetectionConfig {
            holidays: vec![date(2025, 12, 25)],
            ..config
        };
        let facts = FactBuilder::new(&plan, &config).facts_for(&plan.assignments[0]);
        assert_eq!(facts.get(names::DATE_IS_HOLIDAY), Some(&FactValue::Bool(true)));
        assert_eq!(facts.get(names::SHIFT_IS_NIGHT), Some(&FactValue::Bool(true)));
        assert_eq!(facts.get(names::DATE_ISO), Some(&FactValue::from("2025-12-25")));
    }

    #[test]
    fn test_day_shift_is_not_night() {
        let day = assign("D", "E1", at(2025, 3, 3, 6, 0), at(2025, 3, 3, 22, 0));
        assert!(!touches_night(&day.shift));
        let early = assign("X", "E1", at(2025, 3, 3, 5, 0), at(2025, 3, 3, 13, 0));
        assert!(touches_night(&early.shift));
    }
}
