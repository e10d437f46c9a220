//! Read-only results of optimization and prediction passes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::conflict::ConflictType;
use super::plan::SchedulePlan;
use crate::error::ScheduleError;
use crate::score::PlanScore;

/// Scalar objective an optimization pass maximizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationTarget {
    MinCost,
    MaxFairness,
    MaxCoverage,
}

impl OptimizationTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationTarget::MinCost => "MIN_COST",
            OptimizationTarget::MaxFairness => "MAX_FAIRNESS",
            OptimizationTarget::MaxCoverage => "MAX_COVERAGE",
        }
    }
}

impl fmt::Display for OptimizationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationTarget {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            OptimizationTarget::MinCost,
            OptimizationTarget::MaxFairness,
            OptimizationTarget::MaxCoverage,
        ]
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| ScheduleError::UnknownTarget(s.to_string()))
    }
}

/// Why the local search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminationReason {
    IterationLimit,
    /// No improvement for the configured number of iterations.
    Plateau,
    Cancelled,
    /// The plan offers no movable assignment.
    NoMoves,
}

/// Best plan found by an optimization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub plan: SchedulePlan,
    pub target: OptimizationTarget,
    pub initial_score: PlanScore,
    pub score: PlanScore,
    /// Best score after every improving iteration, starting with the initial score.
    pub trajectory: Vec<PlanScore>,
    pub iterations: u64,
    pub accepted_moves: u64,
    pub termination: TerminationReason,
}

impl OptimizationResult {
    pub fn improved(&self) -> bool {
        self.score > self.initial_score
    }
}

/// A time slot whose assigned headcount misses the requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGap {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub required: u32,
    pub assigned: u32,
}

/// Forecast for one area on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaForecast {
    pub date: NaiveDate,
    pub area: String,
    /// Sum over slots of required headcount × slot minutes.
    pub required_minutes: i64,
    /// Sum over slots of min(assigned, required) × slot minutes.
    pub covered_minutes: i64,
    /// Sum over slots of assigned headcount × slot minutes.
    pub assigned_minutes: i64,
    pub understaffed: Vec<SlotGap>,
    pub overstaffed_slots: usize,
    /// Conflicts expected on this date and area, by type.
    pub predicted_violations: BTreeMap<ConflictType, usize>,
}

impl AreaForecast {
    pub fn new(date: NaiveDate, area: impl Into<String>) -> Self {
        Self {
            date,
            area: area.into(),
            required_minutes: 0,
            covered_minutes: 0,
            assigned_minutes: 0,
            understaffed: Vec::new(),
            overstaffed_slots: 0,
            predicted_violations: BTreeMap::new(),
        }
    }

    /// Covered share of required headcount-minutes; 1.0 when nothing is required.
    pub fn coverage_ratio(&self) -> f64 {
        if self.required_minutes == 0 {
            1.0
        } else {
            self.covered_minutes as f64 / self.required_minutes as f64
        }
    }

    pub fn is_adequate(&self) -> bool {
        self.understaffed.is_empty()
    }
}

/// Read-only projection of a plan's staffing adequacy and likely violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub plan_id: String,
    pub plan_version: u64,
    /// Ordered by date, then area.
    pub forecasts: Vec<AreaForecast>,
    pub conflicts_by_type: BTreeMap<ConflictType, usize>,
    pub required_minutes: i64,
    pub covered_minutes: i64,
    /// False when cancelled before every date was projected.
    pub complete: bool,
}

impl Prediction {
    pub fn coverage_ratio(&self) -> f64 {
        if self.required_minutes == 0 {
            1.0
        } else {
            self.covered_minutes as f64 / self.required_minutes as f64
        }
    }

    pub fn forecast(&self, date: NaiveDate, area: &str) -> Option<&AreaForecast> {
        self.forecasts
            .iter()
            .find(|f| f.date == date && f.area == area)
    }
}
