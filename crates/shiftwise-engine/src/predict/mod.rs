//! Read-only staffing forecast for a draft plan.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use shiftwise_core::{
    AreaForecast, CancellationToken, Conflict, Prediction, SchedulePlan, SlotGap,
};
use tracing::info;

use crate::context::PlanningContext;
use crate::coverage::{self, SlotCoverage};
use crate::detect::ConflictDetector;

/// Projects coverage and likely violations per date and area.
///
/// Holds no state between calls: the same plan and context always yield
/// the same [`Prediction`].
#[derive(Debug, Clone)]
pub struct SchedulePredictor {
    detector: ConflictDetector,
    slot_minutes: i64,
}

impl SchedulePredictor {
    pub fn new(detector: ConflictDetector, slot_minutes: i64) -> Self {
        Self {
            detector,
            slot_minutes,
        }
    }

    /// Forecasts `plan` without modifying it.
    ///
    /// Cancellation is checked before each date. A cancelled run returns the
    /// dates projected so far with `complete` set to false.
    pub fn predict_schedule_effect(
        &self,
        plan: &SchedulePlan,
        ctx: &PlanningContext,
        cancel: &CancellationToken,
    ) -> Prediction {
        let conflicts = self.detector.validate_schedule_conflicts(plan, ctx);
        let mut conflicts_by_type = BTreeMap::new();
        for conflict in &conflicts {
            *conflicts_by_type.entry(conflict.conflict_type).or_insert(0) += 1;
        }

        let mut forecasts = Vec::new();
        let mut complete = true;
        for date in plan.dates() {
            if cancel.is_cancelled() {
                complete = false;
                break;
            }
            let areas: Vec<String> = coverage::areas_on(plan, &ctx.demand, date)
                .into_iter()
                .collect();
            let mut day: Vec<AreaForecast> = areas
                .par_iter()
                .map(|area| self.forecast(plan, ctx, &conflicts, date, area))
                .collect();
            day.sort_by(|a, b| a.area.cmp(&b.area));
            forecasts.extend(day);
        }

        let required_minutes = forecasts.iter().map(|f| f.required_minutes).sum();
        let covered_minutes = forecasts.iter().map(|f| f.covered_minutes).sum();
        let prediction = Prediction {
            plan_id: plan.id.clone(),
            plan_version: plan.version,
            forecasts,
            conflicts_by_type,
            required_minutes,
            covered_minutes,
            complete,
        };
        info!(
            event = "predict_end",
            plan_id = %plan.id,
            forecasts = prediction.forecasts.len(),
            coverage = prediction.coverage_ratio(),
            conflicts = conflicts.len(),
            complete,
        );
        prediction
    }

    fn forecast(
        &self,
        plan: &SchedulePlan,
        ctx: &PlanningContext,
        conflicts: &[Conflict],
        date: NaiveDate,
        area: &str,
    ) -> AreaForecast {
        let mut forecast = AreaForecast::new(date, area);
        let slots = coverage::area_slots(plan, &ctx.demand, date, area, self.slot_minutes);
        for slot in &slots {
            let minutes = slot.minutes();
            forecast.required_minutes += i64::from(slot.required) * minutes;
            forecast.covered_minutes += i64::from(slot.covered()) * minutes;
            forecast.assigned_minutes += i64::from(slot.assigned) * minutes;
            if slot.is_overstaffed() {
                forecast.overstaffed_slots += 1;
            }
        }
        forecast.understaffed = gaps(&slots);

        for conflict in conflicts
            .iter()
            .filter(|c| c.date == date && c.area.as_deref() == Some(area))
        {
            *forecast
                .predicted_violations
                .entry(conflict.conflict_type)
                .or_insert(0) += 1;
        }
        forecast
    }
}

/// Understaffed slots, with adjacent slots of equal headcount merged.
fn gaps(slots: &[SlotCoverage]) -> Vec<SlotGap> {
    let mut gaps: Vec<SlotGap> = Vec::new();
    for slot in slots.iter().filter(|s| s.is_understaffed()) {
        if let Some(last) = gaps.last_mut() {
            if last.end == slot.start && last.required == slot.required && last.assigned == slot.assigned {
                last.end = slot.end;
                continue;
            }
        }
        gaps.push(SlotGap {
            start: slot.start,
            end: slot.end,
            required: slot.required,
            assigned: slot.assigned,
        });
    }
    gaps
}
