//! Slot coverage model: required versus assigned headcount per area and slot.
//!
//! A day is cut into fixed slots starting at midnight. A requirement or an
//! assignment counts toward a slot when it is active at the slot start.
//! Slots never run past midnight, so totals weight each slot by its length.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use shiftwise_core::{SchedulePlan, StaffingRequirement};

/// Headcount in one slot of one area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCoverage {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub required: u32,
    pub assigned: u32,
}

impl SlotCoverage {
    pub fn covered(&self) -> u32 {
        self.required.min(self.assigned)
    }

    pub fn is_understaffed(&self) -> bool {
        self.assigned < self.required
    }

    pub fn is_overstaffed(&self) -> bool {
        self.assigned > self.required
    }

    /// Slot length; the last slot of a day may be shorter than the step.
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Areas with demand or assignments starting on `date`.
pub fn areas_on(plan: &SchedulePlan, demand: &[StaffingRequirement], date: NaiveDate) -> BTreeSet<String> {
    let (day_start, day_end) = day_bounds(date);
    let mut areas: BTreeSet<String> = demand
        .iter()
        .filter(|r| r.start < day_end && r.end > day_start)
        .map(|r| r.area.clone())
        .collect();
    areas.extend(
        plan.assignments
            .iter()
            .filter(|a| a.shift.start < day_end && a.shift.end > day_start)
            .map(|a| a.shift.area.clone()),
    );
    areas
}

/// Slots of `area` on `date`.
pub fn area_slots(
    plan: &SchedulePlan,
    demand: &[StaffingRequirement],
    date: NaiveDate,
    area: &str,
    slot_minutes: i64,
) -> Vec<SlotCoverage> {
    let (day_start, day_end) = day_bounds(date);
    let step = Duration::minutes(slot_minutes.max(1));
    let mut slots = Vec::new();
    let mut start = day_start;
    while start < day_end {
        let required = demand
            .iter()
            .filter(|r| r.area == area && r.start <= start && start < r.end)
            .map(|r| r.headcount)
            .sum();
        let assigned = plan
            .assignments
            .iter()
            .filter(|a| a.shift.area == area && a.shift.start <= start && start < a.shift.end)
            .count() as u32;
        let end = (start + step).min(day_end);
        slots.push(SlotCoverage {
            start,
            end,
            required,
            assigned,
        });
        start = end;
    }
    slots
}

/// Required and covered headcount-minutes over every plan date.
pub fn totals(plan: &SchedulePlan, demand: &[StaffingRequirement], slot_minutes: i64) -> (i64, i64) {
    let mut required = 0;
    let mut covered = 0;
    for date in plan.dates() {
        for area in areas_on(plan, demand, date) {
            for slot in area_slots(plan, demand, date, &area, slot_minutes) {
                required += i64::from(slot.required) * slot.minutes();
                covered += i64::from(slot.covered()) * slot.minutes();
            }
        }
    }
    (required, covered)
}

fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftwise_test::roster::demand;
    use shiftwise_test::{at, date, PlanBuilder};

    #[test]
    fn test_slots_compare_required_and_assigned() {
        let plan = PlanBuilder::new("P", date(2025, 3, 3), date(2025, 3, 3))
            .assign("A", "E1", at(2025, 3, 3, 8, 0), at(2025, 3, 3, 12, 0))
            .assign("B", "E2", at(2025, 3, 3, 10, 0), at(2025, 3, 3, 14, 0))
            .build();
        let needs = vec![demand(at(2025, 3, 3, 8, 0), at(2025, 3, 3, 12, 0), 2)];

        let slots = area_slots(&plan, &needs, date(2025, 3, 3), "FRONT", 60);
        assert_eq!(slots.len(), 24);
        let nine = &slots[9];
        assert_eq!((nine.required, nine.assigned), (2, 1));
        assert!(nine.is_understaffed());
        let eleven = &slots[11];
        assert_eq!((eleven.required, eleven.assigned), (2, 2));
        let twelve = &slots[12];
        assert!(twelve.is_overstaffed());

        // 4 slots × 2 heads required; 08 and 09 half covered.
        assert_eq!(totals(&plan, &needs, 60), (480, 360));
    }

    #[test]
    fn test_areas_include_unstaffed_demand() {
        let plan = PlanBuilder::new("P", date(2025, 3, 3), date(2025, 3, 3)).build();
        let needs = vec![StaffingRequirement::new(
            "BAR",
            at(2025, 3, 3, 18, 0),
            at(2025, 3, 3, 23, 0),
            1,
        )];
        let areas = areas_on(&plan, &needs, date(2025, 3, 3));
        assert_eq!(areas.into_iter().collect::<Vec<_>>(), vec!["BAR"]);
    }

    #[test]
    fn test_last_slot_stops_at_midnight() {
        let plan = PlanBuilder::new("P", date(2025, 3, 3), date(2025, 3, 3)).build();
        let needs = vec![demand(at(2025, 3, 3, 21, 0), at(2025, 3, 4, 0, 0), 1)];

        // 420-minute steps: 00:00, 07:00, 14:00, then a 3-hour tail.
        let slots = area_slots(&plan, &needs, date(2025, 3, 3), "FRONT", 420);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[3].start, at(2025, 3, 3, 21, 0));
        assert_eq!(slots[3].end, at(2025, 3, 4, 0, 0));
        assert_eq!(slots[3].minutes(), 180);
        assert_eq!(totals(&plan, &needs, 420), (180, 0));
    }
}
