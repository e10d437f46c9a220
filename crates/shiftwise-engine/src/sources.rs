//! Collaborator seams: availability, demand and plan persistence.
//!
//! The engine only ever talks to these traits. In-memory implementations are
//! provided for tests and embedding.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use parking_lot::RwLock;
use shiftwise_core::domain::overlap_minutes;
use shiftwise_core::{
    EmployeeProfile, Result, ScheduleError, SchedulePlan, StaffingRequirement, Unavailability,
};

/// Employees and their leave, by date range.
pub trait AvailabilitySource: Send + Sync {
    /// Every employee that may be scheduled.
    fn roster(&self) -> Result<Vec<EmployeeProfile>>;

    /// Unavailability touching `[start, end]` (inclusive dates).
    fn unavailability(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Unavailability>>;
}

/// Required headcount per area and interval.
pub trait DemandSource: Send + Sync {
    /// Requirements touching `[start, end]` (inclusive dates).
    fn requirements(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<StaffingRequirement>>;
}

/// Plan persistence with optimistic concurrency.
pub trait PlanRepository: Send + Sync {
    /// Fails with `PlanNotFound` for unknown ids.
    fn load(&self, plan_id: &str) -> Result<SchedulePlan>;

    /// Stores `plan` if the stored version still equals `expected_version`
    /// (0 for a plan that does not exist yet) and returns the stored copy
    /// with its version bumped.
    fn save(&self, plan: &SchedulePlan, expected_version: u64) -> Result<SchedulePlan>;
}

#[derive(Debug, Default)]
pub struct InMemoryAvailability {
    roster: RwLock<Vec<EmployeeProfile>>,
    leave: RwLock<Vec<Unavailability>>,
}

impl InMemoryAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(roster: Vec<EmployeeProfile>) -> Self {
        Self {
            roster: RwLock::new(roster),
            leave: RwLock::new(Vec::new()),
        }
    }

    pub fn add_employee(&self, employee: EmployeeProfile) {
        self.roster.write().push(employee);
    }

    pub fn add_leave(&self, leave: Unavailability) {
        self.leave.write().push(leave);
    }
}

impl AvailabilitySource for InMemoryAvailability {
    fn roster(&self) -> Result<Vec<EmployeeProfile>> {
        Ok(self.roster.read().clone())
    }

    fn unavailability(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Unavailability>> {
        let (lower, upper) = date_range_bounds(start, end);
        Ok(self
            .leave
            .read()
            .iter()
            .filter(|u| overlap_minutes(u.start, u.end, lower, upper) > 0)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDemand {
    requirements: RwLock<Vec<StaffingRequirement>>,
}

impl InMemoryDemand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requirements(requirements: Vec<StaffingRequirement>) -> Self {
        Self {
            requirements: RwLock::new(requirements),
        }
    }

    pub fn add(&self, requirement: StaffingRequirement) {
        self.requirements.write().push(requirement);
    }
}

impl DemandSource for InMemoryDemand {
    fn requirements(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<StaffingRequirement>> {
        let (lower, upper) = date_range_bounds(start, end);
        Ok(self
            .requirements
            .read()
            .iter()
            .filter(|r| overlap_minutes(r.start, r.end, lower, upper) > 0)
            .cloned()
            .collect())
    }
}

/// Plans keyed by id; `save` checks and writes under one lock.
#[derive(Debug, Default)]
pub struct InMemoryPlanRepository {
    plans: RwLock<BTreeMap<String, SchedulePlan>>,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a plan as-is, bypassing the version check. For seeding.
    pub fn insert(&self, plan: SchedulePlan) {
        self.plans.write().insert(plan.id.clone(), plan);
    }

    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.read().is_empty()
    }
}

impl PlanRepository for InMemoryPlanRepository {
    fn load(&self, plan_id: &str) -> Result<SchedulePlan> {
        self.plans
            .read()
            .get(plan_id)
            .cloned()
            .ok_or_else(|| ScheduleError::PlanNotFound(plan_id.to_string()))
    }

    fn save(&self, plan: &SchedulePlan, expected_version: u64) -> Result<SchedulePlan> {
        let mut plans = self.plans.write();
        let actual = plans.get(&plan.id).map_or(0, |p| p.version);
        if actual != expected_version {
            return Err(ScheduleError::StaleVersion {
                plan_id: plan.id.clone(),
                expected: expected_version,
                actual,
            });
        }
        let mut stored = plan.clone();
        stored.version = actual + 1;
        plans.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }
}

/// Datetime bounds of the inclusive date range `[start, end]`.
pub(crate) fn date_range_bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (
        start.and_time(NaiveTime::MIN),
        (end + Duration::days(1)).and_time(NaiveTime::MIN),
    )
}
