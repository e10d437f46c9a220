//! Built-in per-employee checks.
//!
//! Each check receives one employee's assignments ordered by start time.

use std::collections::BTreeSet;

use chrono::Duration;
use shiftwise_config::DetectionConfig;
use shiftwise_core::domain::overlap_minutes;
use shiftwise_core::{Conflict, ConflictType, Severity, ShiftAssignment, Unavailability};

fn conflict(
    conflict_type: ConflictType,
    assignments: &[&ShiftAssignment],
    severity: Severity,
) -> Option<Conflict> {
    let first = assignments.first()?;
    Some(
        Conflict::new(
            conflict_type,
            assignments.iter().map(|a| a.id.clone()).collect(),
            first.shift.date(),
            severity,
        )
        .for_employee(&first.employee_id)
        .in_area(&first.shift.area),
    )
}

/// Pairwise overlap between the employee's own assignments.
pub(super) fn overlaps(shifts: &[&ShiftAssignment], out: &mut Vec<Conflict>) {
    for (i, first) in shifts.iter().enumerate() {
        for second in &shifts[i + 1..] {
            if second.shift.start >= first.shift.end {
                break;
            }
            let minutes = first.conflicting_overlap(second);
            if minutes > 0 {
                out.extend(
                    conflict(ConflictType::Overlap, &[*first, *second], Severity::Critical)
                        .map(|c| c.with_detail(format!("{} minutes overlap", minutes))),
                );
            }
        }
    }
}

/// Rest below the minimum, measured from the latest earlier shift end to
/// each shift start.
pub(super) fn rest(shifts: &[&ShiftAssignment], min_rest_minutes: i64, out: &mut Vec<Conflict>) {
    for (i, next) in shifts.iter().enumerate() {
        // A long shift can end after a shorter one it contains.
        let prev = shifts[..i]
            .iter()
            .filter(|a| a.shift.end <= next.shift.start)
            .max_by_key(|a| a.shift.end);
        let Some(prev) = prev else {
            continue;
        };
        if prev.permitted_split && next.permitted_split {
            continue;
        }
        let gap = (next.shift.start - prev.shift.end).num_minutes();
        if gap < min_rest_minutes {
            out.extend(
                conflict(ConflictType::RestViolation, &[*prev, *next], Severity::High).map(|c| {
                    c.with_detail(format!(
                        "{} minutes rest, {} required",
                        gap, min_rest_minutes
                    ))
                }),
            );
        }
    }
}

/// Rolling-window hours above the configured maximum.
///
/// Every shift end anchors a window; consecutive violating anchors merge
/// into one conflict holding every assignment that contributed.
pub(super) fn max_hours(
    shifts: &[&ShiftAssignment],
    config: &DetectionConfig,
    out: &mut Vec<Conflict>,
) {
    let limit = config.max_hours_in_window * 60;
    let window = Duration::days(config.max_hours_window_days);
    let mut run: Vec<&ShiftAssignment> = Vec::new();
    let mut peak = 0;

    for anchor in shifts {
        let end = anchor.shift.end;
        let start = end - window;
        let inside: Vec<(&ShiftAssignment, i64)> = shifts
            .iter()
            .map(|a| (*a, overlap_minutes(a.shift.start, a.shift.end, start, end)))
            .filter(|(_, minutes)| *minutes > 0)
            .collect();
        let total: i64 = inside.iter().map(|(_, minutes)| minutes).sum();

        if total > limit {
            let seen: BTreeSet<&str> = run.iter().map(|a| a.id.as_str()).collect();
            let fresh: Vec<&ShiftAssignment> = inside
                .iter()
                .map(|(a, _)| *a)
                .filter(|a| !seen.contains(a.id.as_str()))
                .collect();
            run.extend(fresh);
            peak = peak.max(total);
        } else if !run.is_empty() {
            out.extend(max_hours_conflict(&run, peak, config));
            run.clear();
            peak = 0;
        }
    }
    out.extend(max_hours_conflict(&run, peak, config));
}

fn max_hours_conflict(
    run: &[&ShiftAssignment],
    peak_minutes: i64,
    config: &DetectionConfig,
) -> Option<Conflict> {
    conflict(ConflictType::MaxHours, run, Severity::High).map(|c| {
        c.with_detail(format!(
            "{:.1} hours in {} days, limit {}",
            peak_minutes as f64 / 60.0,
            config.max_hours_window_days,
            config.max_hours_in_window
        ))
    })
}

/// Assignments that fall into the employee's leave.
pub(super) fn leave(
    shifts: &[&ShiftAssignment],
    unavailability: &[&Unavailability],
    out: &mut Vec<Conflict>,
) {
    for assignment in shifts {
        for leave in unavailability
            .iter()
            .filter(|u| u.blocks(&assignment.employee_id, &assignment.shift))
        {
            out.extend(
                conflict(ConflictType::LeaveCollision, &[*assignment], Severity::Critical).map(
                    |c| {
                        let reason = if leave.reason.is_empty() {
                            "unavailable"
                        } else {
                            leave.reason.as_str()
                        };
                        c.with_detail(format!("employee is on {}", reason))
                    },
                ),
            );
        }
    }
}
