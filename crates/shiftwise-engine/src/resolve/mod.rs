//! Conflict resolution.
//!
//! A [`StrategyRegistry`] maps strategy names to statically registered
//! [`ResolutionStrategy`] handlers. The [`ConflictResolver`] asks the chosen
//! strategy for candidate steps and keeps only steps that remove the target
//! conflict without introducing a conflict of equal or higher severity.

mod candidates;
mod strategies;


use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use shiftwise_core::{
    AssignmentChange, CancellationToken, Conflict, ResidualConflict, ResidualReason, Resolution,
    Result, ScheduleError, SchedulePlan, Severity,
};
use tracing::{debug, info};

use crate::context::PlanningContext;
use crate::detect::{conflict_keys, ConflictDetector};

pub use candidates::CandidatePool;
pub use strategies::{
    EscalateStrategy, Proposal, ReassignStrategy, ResolutionStrategy, SplitStrategy,
    SwapStrategy, MAX_CANDIDATES_PER_ASSIGNMENT,
};

/// Strategies keyed by upper-case name.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Arc<dyn ResolutionStrategy>>,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// REASSIGN, SWAP, SPLIT and ESCALATE.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ReassignStrategy));
        registry.register(Arc::new(SwapStrategy));
        registry.register(Arc::new(SplitStrategy));
        registry.register(Arc::new(EscalateStrategy));
        registry
    }

    /// Registers or replaces a strategy under its name.
    pub fn register(&mut self, strategy: Arc<dyn ResolutionStrategy>) {
        self.strategies
            .insert(strategy.name().to_ascii_uppercase(), strategy);
    }

    /// Looks a strategy up by name, ignoring case.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ResolutionStrategy>> {
        self.strategies
            .get(&name.trim().to_ascii_uppercase())
            .cloned()
            .ok_or_else(|| ScheduleError::UnknownStrategy(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A candidate step that passed the safety check.
struct SafeStep {
    introduced: usize,
    introduced_weight: u32,
    rank: usize,
    change: AssignmentChange,
    plan: SchedulePlan,
    conflicts: Vec<Conflict>,
}

fn severity_weight(severity: Severity) -> u32 {
    match severity {
        Severity::Low => 1,
        Severity::Medium => 2,
        Severity::High => 4,
        Severity::Critical => 8,
    }
}

/// Applies strategies conflict by conflict on a private copy of the plan.
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    detector: ConflictDetector,
    registry: StrategyRegistry,
}

impl ConflictResolver {
    pub fn new(detector: ConflictDetector, registry: StrategyRegistry) -> Self {
        Self { detector, registry }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Resolves `conflicts` found in `plan` with the strategy `strategy_name`.
    ///
    /// Conflicts are handled most severe first. A conflict that an earlier
    /// step already removed needs no change; one with no safe step is
    /// returned as residual with `NO_SAFE_RESOLUTION`. `plan` is not
    /// modified: apply the returned changes to commit them.
    pub fn resolve_schedule_conflicts(
        &self,
        plan: &SchedulePlan,
        conflicts: &[Conflict],
        strategy_name: &str,
        ctx: &PlanningContext,
        cancel: &CancellationToken,
    ) -> Result<Resolution> {
        let strategy = self.registry.get(strategy_name)?;
        let mut resolution = Resolution::new(strategy.name());
        resolution.addressed = conflicts.iter().map(|c| c.id.clone()).collect();

        let mut ordered: Vec<&Conflict> = conflicts.iter().collect();
        ordered.sort_by(|a, b| b.severity.cmp(&a.severity));

        let mut working = plan.clone();
        let mut current = self.detector.validate_schedule_conflicts(&working, ctx);

        for conflict in ordered {
            if cancel.is_cancelled() {
                return Err(ScheduleError::Cancelled);
            }
            let key = conflict.key();
            if !current.iter().any(|c| c.key() == key) {
                debug!(event = "conflict_gone", conflict_id = %conflict.id);
                continue;
            }

            let proposal = {
                let pool = CandidatePool::new(&working, ctx, self.detector.config());
                strategy.propose(conflict, &pool)
            };
            let candidates = match proposal {
                Proposal::Escalate => {
                    resolution.residual.push(ResidualConflict {
                        conflict: conflict.clone(),
                        reason: ResidualReason::Escalated,
                    });
                    continue;
                }
                Proposal::Candidates(candidates) => candidates,
            };

            match self.safest_step(&working, &current, conflict, candidates, ctx) {
                Some(step) => {
                    debug!(
                        event = "step_accepted",
                        conflict_id = %conflict.id,
                        introduced = step.introduced,
                    );
                    resolution.changes.push(step.change);
                    working = step.plan;
                    current = step.conflicts;
                }
                None => resolution.residual.push(ResidualConflict {
                    conflict: conflict.clone(),
                    reason: ResidualReason::NoSafeResolution,
                }),
            }
        }

        info!(
            event = "resolve_end",
            plan_id = %plan.id,
            strategy = %resolution.strategy,
            addressed = resolution.addressed.len(),
            changes = resolution.changes.len(),
            residual = resolution.residual.len(),
        );
        Ok(resolution)
    }

    /// The candidate that removes `target` and introduces the fewest and
    /// mildest new conflicts, none as severe as `target`.
    fn safest_step(
        &self,
        working: &SchedulePlan,
        current: &[Conflict],
        target: &Conflict,
        candidates: Vec<AssignmentChange>,
        ctx: &PlanningContext,
    ) -> Option<SafeStep> {
        let before = conflict_keys(current);
        let target_key = target.key();

        candidates
            .into_par_iter()
            .enumerate()
            .filter_map(|(rank, change)| {
                let mut trial = working.clone();
                change.apply(&mut trial).ok()?;
                let after = self.detector.validate_schedule_conflicts(&trial, ctx);
                if after.iter().any(|c| c.key() == target_key) {
                    return None;
                }
                let introduced: Vec<&Conflict> = after
                    .iter()
                    .filter(|c| !before.contains(&c.key()))
                    .collect();
                if introduced.iter().any(|c| c.severity >= target.severity) {
                    return None;
                }
                Some(SafeStep {
                    introduced: introduced.len(),
                    introduced_weight: introduced.iter().map(|c| severity_weight(c.severity)).sum(),
                    rank,
                    change,
                    plan: trial,
                    conflicts: after,
                })
            })
            .min_by_key(|step| (step.introduced, step.introduced_weight, step.rank))
    }
}
