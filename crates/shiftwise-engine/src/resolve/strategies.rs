//! Built-in resolution strategies.

use chrono::Duration;
use shiftwise_core::{
    AssignmentChange, AssignmentSource, Conflict, SchedulePlan, ShiftAssignment, ShiftDefinition,
};

use super::candidates::CandidatePool;

/// Upper bound on candidate steps a strategy proposes per moved assignment.
pub const MAX_CANDIDATES_PER_ASSIGNMENT: usize = 8;

/// What a strategy offers for one conflict.
#[derive(Debug, Clone, PartialEq)]
pub enum Proposal {
    /// Candidate steps, most preferred first.
    Candidates(Vec<AssignmentChange>),
    /// Leave the conflict for manual handling.
    Escalate,
}

/// A named algorithm for removing conflicts by altering assignments.
///
/// Strategies only propose; the resolver evaluates each step against the
/// detector and keeps the safest one.
pub trait ResolutionStrategy: Send + Sync {
    /// Registry key, upper case.
    fn name(&self) -> &str;

    fn propose(&self, conflict: &Conflict, pool: &CandidatePool<'_>) -> Proposal;
}

/// Hands a conflicting assignment to the next eligible employee.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReassignStrategy;

impl ResolutionStrategy for ReassignStrategy {
    fn name(&self) -> &str {
        "REASSIGN"
    }

    fn propose(&self, conflict: &Conflict, pool: &CandidatePool<'_>) -> Proposal {
        let mut changes = Vec::new();
        for assignment in pool.movable(conflict) {
            let ignoring = [assignment.id.as_str()];
            changes.extend(
                pool.ranked(
                    &assignment.shift,
                    &assignment.id,
                    &assignment.employee_id,
                    &ignoring,
                )
                .into_iter()
                .take(MAX_CANDIDATES_PER_ASSIGNMENT)
                .map(|employee| AssignmentChange::Reassign {
                    assignment_id: assignment.id.clone(),
                    from_employee: assignment.employee_id.clone(),
                    to_employee: employee.to_string(),
                }),
            );
        }
        Proposal::Candidates(changes)
    }
}

/// Exchanges a conflicting assignment with another employee's assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwapStrategy;

impl ResolutionStrategy for SwapStrategy {
    fn name(&self) -> &str {
        "SWAP"
    }

    fn propose(&self, conflict: &Conflict, pool: &CandidatePool<'_>) -> Proposal {
        let mut changes = Vec::new();
        for assignment in pool.movable(conflict) {
            let mut partners: Vec<&ShiftAssignment> = pool
                .plan()
                .assignments
                .iter()
                .filter(|other| {
                    other.employee_id != assignment.employee_id
                        && !other.is_pinned()
                        && swappable(pool, assignment, other)
                })
                .collect();
            partners.sort_by_key(|other| {
                (
                    (other.shift.start - assignment.shift.start).num_minutes().abs(),
                    other.id.clone(),
                )
            });
            changes.extend(
                partners
                    .into_iter()
                    .take(MAX_CANDIDATES_PER_ASSIGNMENT)
                    .map(|other| AssignmentChange::Swap {
                        first_id: assignment.id.clone(),
                        second_id: other.id.clone(),
                    }),
            );
        }
        Proposal::Candidates(changes)
    }
}

fn swappable(pool: &CandidatePool<'_>, first: &ShiftAssignment, second: &ShiftAssignment) -> bool {
    let ignoring = [first.id.as_str(), second.id.as_str()];
    pool.is_eligible(&second.employee_id, &first.shift, &first.id, &ignoring)
        && pool.is_eligible(&first.employee_id, &second.shift, &second.id, &ignoring)
}

/// Divides a shift at its midpoint and hands one half to another employee.
///
/// Only offered for assignments an active `SPLIT_POLICY` rule permits, and
/// only when both halves meet the rule's `min_part_minutes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitStrategy;

impl ResolutionStrategy for SplitStrategy {
    fn name(&self) -> &str {
        "SPLIT"
    }

    fn propose(&self, conflict: &Conflict, pool: &CandidatePool<'_>) -> Proposal {
        let mut changes = Vec::new();
        for assignment in pool.movable(conflict) {
            let Some(min_part) = pool.split_allowance(assignment) else {
                continue;
            };
            let Some((first, second)) = halves(&assignment.shift, min_part) else {
                continue;
            };
            let (kept_id, handed_id) = split_ids(pool.plan(), &assignment.id);

            for (kept_shift, handed_shift) in [(&first, &second), (&second, &first)] {
                let ignoring = [assignment.id.as_str()];
                let kept = ShiftAssignment::new(
                    kept_id.clone(),
                    assignment.employee_id.clone(),
                    kept_shift.clone(),
                )
                .with_source(AssignmentSource::Resolved)
                .as_split();
                changes.extend(
                    pool.ranked(handed_shift, &handed_id, &assignment.employee_id, &ignoring)
                        .into_iter()
                        .take(MAX_CANDIDATES_PER_ASSIGNMENT)
                        .map(|employee| AssignmentChange::Split {
                            original_id: assignment.id.clone(),
                            kept: kept.clone(),
                            handed_off: ShiftAssignment::new(
                                handed_id.clone(),
                                employee,
                                handed_shift.clone(),
                            )
                            .with_source(AssignmentSource::Resolved)
                            .as_split(),
                        }),
                );
            }
        }
        Proposal::Candidates(changes)
    }
}

/// The two halves of `shift`, if each is at least `min_part` minutes.
fn halves(shift: &ShiftDefinition, min_part: i64) -> Option<(ShiftDefinition, ShiftDefinition)> {
    let duration = shift.duration_minutes();
    let half = duration / 2;
    if half <= 0 || half < min_part || duration - half < min_part {
        return None;
    }
    let mid = shift.start + Duration::minutes(half);
    Some((
        ShiftDefinition::new(shift.start, mid, shift.area.clone()),
        ShiftDefinition::new(mid, shift.end, shift.area.clone()),
    ))
}

/// Two unused ids derived from `base`.
fn split_ids(plan: &SchedulePlan, base: &str) -> (String, String) {
    let first = plan.fresh_assignment_id(base);
    let mut n = 1usize;
    loop {
        let candidate = format!("{}-{}", base, n);
        if candidate != first && plan.assignment(&candidate).is_none() {
            return (first, candidate);
        }
        n += 1;
    }
}

/// Leaves every conflict for manual handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscalateStrategy;

impl ResolutionStrategy for EscalateStrategy {
    fn name(&self) -> &str {
        "ESCALATE"
    }

    fn propose(&self, _conflict: &Conflict, _pool: &CandidatePool<'_>) -> Proposal {
        Proposal::Escalate
    }
}
