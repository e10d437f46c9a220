//! Everything a pass needs besides the plan itself.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use shiftwise_core::{EmployeeProfile, RuleCategory, StaffingRequirement, Unavailability};
use shiftwise_rules::{CompiledRule, RuleSnapshot};

/// Collaborator data and a pinned rule snapshot for one engine call.
///
/// Passes never reach the rule cache directly; they read the snapshot held
/// here, so one call sees one consistent rule set even while a reload runs.
#[derive(Debug, Clone)]
pub struct PlanningContext {
    pub roster: Vec<EmployeeProfile>,
    pub unavailability: Vec<Unavailability>,
    pub demand: Vec<StaffingRequirement>,
    pub rules: Arc<RuleSnapshot>,
    /// Instant rule effectiveness is judged at.
    pub at: DateTime<Utc>,
}

impl PlanningContext {
    pub fn new(rules: Arc<RuleSnapshot>, at: DateTime<Utc>) -> Self {
        Self {
            roster: Vec::new(),
            unavailability: Vec::new(),
            demand: Vec::new(),
            rules,
            at,
        }
    }

    pub fn with_roster(mut self, roster: Vec<EmployeeProfile>) -> Self {
        self.roster = roster;
        self
    }

    pub fn with_unavailability(mut self, unavailability: Vec<Unavailability>) -> Self {
        self.unavailability = unavailability;
        self
    }

    pub fn with_demand(mut self, demand: Vec<StaffingRequirement>) -> Self {
        self.demand = demand;
        self
    }

    /// Active rules of `category` at [`Self::at`].
    pub fn active_rules(&self, category: RuleCategory) -> Vec<Arc<CompiledRule>> {
        self.rules.active(category, self.at)
    }

    pub fn profile(&self, employee_id: &str) -> Option<&EmployeeProfile> {
        self.roster.iter().find(|e| e.id == employee_id)
    }

    /// Unavailability grouped by employee.
    pub fn leave_by_employee(&self) -> BTreeMap<&str, Vec<&Unavailability>> {
        let mut grouped: BTreeMap<&str, Vec<&Unavailability>> = BTreeMap::new();
        for leave in &self.unavailability {
            grouped.entry(leave.employee_id.as_str()).or_default().push(leave);
        }
        grouped
    }
}
