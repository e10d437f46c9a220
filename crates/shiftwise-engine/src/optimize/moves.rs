//! Single-assignment perturbations and their random selection.

use rand::Rng;
use shiftwise_core::{AssignmentId, EmployeeId, Result, ScheduleError, SchedulePlan, ShiftAssignment};

use crate::context::PlanningContext;

/// A perturbation of one assignment (two for a swap).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanMove {
    Reassign {
        assignment_id: AssignmentId,
        to_employee: EmployeeId,
    },
    Swap {
        first_id: AssignmentId,
        second_id: AssignmentId,
    },
    /// Moves the shift interval by `minutes`, keeping its length.
    Nudge {
        assignment_id: AssignmentId,
        minutes: i64,
    },
}

impl PlanMove {
    pub fn apply(&self, plan: &mut SchedulePlan) -> Result<()> {
        match self {
            PlanMove::Reassign {
                assignment_id,
                to_employee,
            } => {
                plan.assignment_mut(assignment_id)?.employee_id = to_employee.clone();
            }
            PlanMove::Swap {
                first_id,
                second_id,
            } => {
                let first_employee = plan.assignment_mut(first_id)?.employee_id.clone();
                let second = plan.assignment_mut(second_id)?;
                let second_employee = std::mem::replace(&mut second.employee_id, first_employee);
                plan.assignment_mut(first_id)?.employee_id = second_employee;
            }
            PlanMove::Nudge {
                assignment_id,
                minutes,
            } => {
                let shifted = plan.assignment_mut(assignment_id)?.shift.shifted(*minutes);
                if !plan.covers(&shifted) {
                    return Err(ScheduleError::OutOfRange {
                        plan_id: plan.id.clone(),
                        assignment_id: assignment_id.clone(),
                    });
                }
                plan.assignment_mut(assignment_id)?.shift = shifted;
            }
        }
        plan.sort_assignments();
        Ok(())
    }
}

/// Draws random moves over the unpinned assignments of a plan.
///
/// Employees are the roster plus everyone already in the plan. A move never
/// hands an assignment to an employee whose profile excludes its area.
#[derive(Debug, Clone)]
pub struct MoveSelector {
    movable: Vec<AssignmentId>,
    employees: Vec<EmployeeId>,
    nudge_minutes: i64,
}

impl MoveSelector {
    pub fn new(plan: &SchedulePlan, ctx: &PlanningContext, nudge_minutes: i64) -> Self {
        let movable = plan
            .assignments
            .iter()
            .filter(|a| !a.is_pinned())
            .map(|a| a.id.clone())
            .collect();
        let mut employees: Vec<EmployeeId> = ctx.roster.iter().map(|e| e.id.clone()).collect();
        employees.extend(plan.employees().into_iter().map(str::to_string));
        employees.sort();
        employees.dedup();
        Self {
            movable,
            employees,
            nudge_minutes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.movable.is_empty()
    }

    pub fn movable_count(&self) -> usize {
        self.movable.len()
    }

    /// A random move against `plan`, or `None` if the drawn kind has no
    /// option for the drawn assignment.
    pub fn select<R: Rng>(&self, plan: &SchedulePlan, ctx: &PlanningContext, rng: &mut R) -> Option<PlanMove> {
        if self.movable.is_empty() {
            return None;
        }
        let id = &self.movable[rng.random_range(0..self.movable.len())];
        let assignment = plan.assignment(id)?;
        match rng.random_range(0..3u8) {
            0 => self.reassign(assignment, ctx, rng),
            1 => self.swap(assignment, plan, ctx, rng),
            _ => self.nudge(assignment, plan, rng),
        }
    }

    fn reassign<R: Rng>(&self, assignment: &ShiftAssignment, ctx: &PlanningContext, rng: &mut R) -> Option<PlanMove> {
        let options: Vec<&EmployeeId> = self
            .employees
            .iter()
            .filter(|e| **e != assignment.employee_id && may_work(ctx, e, &assignment.shift.area))
            .collect();
        if options.is_empty() {
            return None;
        }
        Some(PlanMove::Reassign {
            assignment_id: assignment.id.clone(),
            to_employee: options[rng.random_range(0..options.len())].clone(),
        })
    }

    fn swap<R: Rng>(
        &self,
        assignment: &ShiftAssignment,
        plan: &SchedulePlan,
        ctx: &PlanningContext,
        rng: &mut R,
    ) -> Option<PlanMove> {
        let partners: Vec<&ShiftAssignment> = self
            .movable
            .iter()
            .filter_map(|id| plan.assignment(id))
            .filter(|other| {
                other.employee_id != assignment.employee_id
                    && may_work(ctx, &other.employee_id, &assignment.shift.area)
                    && may_work(ctx, &assignment.employee_id, &other.shift.area)
            })
            .collect();
        if partners.is_empty() {
            return None;
        }
        Some(PlanMove::Swap {
            first_id: assignment.id.clone(),
            second_id: partners[rng.random_range(0..partners.len())].id.clone(),
        })
    }

    fn nudge<R: Rng>(&self, assignment: &ShiftAssignment, plan: &SchedulePlan, rng: &mut R) -> Option<PlanMove> {
        if self.nudge_minutes <= 0 {
            return None;
        }
        let first = if rng.random_bool(0.5) {
            self.nudge_minutes
        } else {
            -self.nudge_minutes
        };
        [first, -first]
            .into_iter()
            .find(|minutes| plan.covers(&assignment.shift.shifted(*minutes)))
            .map(|minutes| PlanMove::Nudge {
                assignment_id: assignment.id.clone(),
                minutes,
            })
    }
}

fn may_work(ctx: &PlanningContext, employee: &str, area: &str) -> bool {
    ctx.profile(employee).map_or(true, |p| p.can_work_in(area))
}
