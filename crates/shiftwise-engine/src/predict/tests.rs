use shiftwise_core::{CancellationToken, ConflictType, StaffingRequirement};
use shiftwise_test::plan::{clean_week, overlap_plan};
use shiftwise_test::roster::demand;
use shiftwise_test::{at, date};

use super::*;
use crate::test_utils::{context, context_with};

fn predictor() -> SchedulePredictor {
    SchedulePredictor::new(ConflictDetector::default(), 60)
}

#[test]
fn test_prediction_is_idempotent() {
    let ctx = context_with(
        vec![],
        vec![],
        vec![],
        vec![
            demand(at(2025, 3, 3, 6, 0), at(2025, 3, 3, 22, 0), 2),
            StaffingRequirement::new("BAR", at(2025, 3, 4, 18, 0), at(2025, 3, 4, 23, 0), 1),
        ],
    );
    let plan = clean_week();
    let first = predictor().predict_schedule_effect(&plan, &ctx, &CancellationToken::new());
    let second = predictor().predict_schedule_effect(&plan, &ctx, &CancellationToken::new());
    assert_eq!(first, second);
    assert!(first.complete);
}

#[test]
fn test_understaffed_slots_are_reported() {
    // Monday needs two heads from 06:00 to 22:00; shifts overlap only 10-14 and 14-18.
    let ctx = context_with(
        vec![],
        vec![],
        vec![],
        vec![demand(at(2025, 3, 3, 6, 0), at(2025, 3, 3, 22, 0), 2)],
    );
    let prediction = predictor().predict_schedule_effect(&clean_week(), &ctx, &CancellationToken::new());

    let monday = prediction.forecast(date(2025, 3, 3), "FRONT").unwrap();
    assert_eq!(monday.required_minutes, 16 * 2 * 60);
    assert_eq!(monday.covered_minutes, 24 * 60);
    assert!(!monday.is_adequate());
    assert_eq!(
        monday.understaffed.first().map(|g| (g.start, g.end, g.assigned)),
        Some((at(2025, 3, 3, 6, 0), at(2025, 3, 3, 10, 0), 1))
    );
    assert_eq!(monday.coverage_ratio(), 0.75);

    // Tuesday has no demand: every assigned slot is overstaffed.
    let tuesday = prediction.forecast(date(2025, 3, 4), "FRONT").unwrap();
    assert_eq!(tuesday.required_minutes, 0);
    assert_eq!(tuesday.coverage_ratio(), 1.0);
    assert_eq!(tuesday.overstaffed_slots, 16);
}

#[test]
fn test_violations_are_attributed_to_date_and_area() {
    let prediction =
        predictor().predict_schedule_effect(&overlap_plan(), &context(vec![]), &CancellationToken::new());
    assert_eq!(prediction.conflicts_by_type.get(&ConflictType::Overlap), Some(&1));
    let day = prediction.forecast(date(2025, 3, 1), "FRONT").unwrap();
    assert_eq!(day.predicted_violations.get(&ConflictType::Overlap), Some(&1));
    assert!(prediction.forecast(date(2025, 3, 2), "FRONT").is_none());
}

#[test]
fn test_cancelled_prediction_is_incomplete() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let prediction = predictor().predict_schedule_effect(&clean_week(), &context(vec![]), &cancel);
    assert!(!prediction.complete);
    assert!(prediction.forecasts.is_empty());
}

#[test]
fn test_prediction_does_not_touch_the_plan() {
    let plan = clean_week();
    let before = plan.clone();
    predictor().predict_schedule_effect(&plan, &context(vec![]), &CancellationToken::new());
    assert_eq!(plan, before);
}
