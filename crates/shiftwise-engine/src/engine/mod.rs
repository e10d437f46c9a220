//! ScheduleEngine: plan lifecycle over the detector, resolver, optimizer and predictor.
//!
//! Plans move DRAFT → VALIDATED | CONFLICTED → VALIDATED → OPTIMIZED →
//! PUBLISHED. Every mutating call names the plan version it was based on;
//! work happens on a private copy and is committed once through the
//! [`PlanRepository`] version check, so a concurrent edit is never
//! overwritten.

mod builder;


use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use shiftwise_config::EngineConfig;
use shiftwise_core::{
    CancellationToken, Conflict, ConflictType, OptimizationResult, OptimizationTarget, PlanStatus,
    Prediction, ResidualConflict, Resolution, Result, ScheduleError, SchedulePlan, Severity,
    TerminationReason,
};
use shiftwise_rules::{ReloadReport, RuleLoader};
use tracing::{info, warn};

use crate::context::PlanningContext;
use crate::coverage;
use crate::detect::{conflict_keys, ConflictDetector};
use crate::generate::PlanGenerator;
use crate::optimize::ScheduleOptimizer;
use crate::predict::SchedulePredictor;
use crate::resolve::ConflictResolver;
use crate::sources::{AvailabilitySource, DemandSource, PlanRepository};
use crate::stats::PlanStatistics;

pub use builder::ScheduleEngineBuilder;

/// A stored plan together with the conflicts found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPlan {
    pub plan: SchedulePlan,
    pub conflicts: Vec<Conflict>,
}

/// Outcome of [`ScheduleEngine::resolve_plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlan {
    pub plan: SchedulePlan,
    /// Every change applied across all rounds, with the last round's residue.
    pub resolution: Resolution,
    /// Conflicts left in the stored plan.
    pub conflicts: Vec<Conflict>,
    pub rounds: u32,
}

/// Outcome of [`ScheduleEngine::refine_plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedPlan {
    pub validation: ValidatedPlan,
    pub resolution: ResolvedPlan,
    /// `None` when conflicts remained after resolution.
    pub optimization: Option<OptimizationResult>,
}

/// Conflicts the resolver is asked to remove: MEDIUM and above, except
/// evaluation failures, which no assignment change can fix.
fn is_resolvable(conflict: &Conflict) -> bool {
    conflict.severity >= Severity::Medium && conflict.conflict_type != ConflictType::RuleEvaluationFailed
}

fn blocks_validation(conflicts: &[Conflict]) -> bool {
    conflicts.iter().any(|c| c.severity >= Severity::Medium)
}

/// The scheduling engine.
///
/// Safe to share across request-handling threads: rule reads go through
/// copy-on-write snapshots and plan writes through optimistic versioning.
pub struct ScheduleEngine {
    config: EngineConfig,
    rules: RuleLoader,
    detector: ConflictDetector,
    resolver: ConflictResolver,
    optimizer: ScheduleOptimizer,
    predictor: SchedulePredictor,
    generator: PlanGenerator,
    availability: Arc<dyn AvailabilitySource>,
    demand: Arc<dyn DemandSource>,
    plans: Arc<dyn PlanRepository>,
    evaluation_time: Option<DateTime<Utc>>,
}

impl ScheduleEngine {
    pub fn builder() -> ScheduleEngineBuilder {
        ScheduleEngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleLoader {
        &self.rules
    }

    /// Loads every rule from the store.
    pub fn start(&self) -> Result<ReloadReport> {
        let report = self.rules.reload_all_rules()?;
        info!(
            event = "engine_started",
            loaded = report.loaded,
            rejected = report.rejected.len(),
        );
        Ok(report)
    }

    /// Drops the rule cache; call [`start`](Self::start) to load it again.
    pub fn shutdown(&self) {
        self.rules.clear();
        info!(event = "engine_stopped");
    }

    /// Roster, leave, demand and active rules for a date range.
    pub fn context(&self, start: NaiveDate, end: NaiveDate) -> Result<PlanningContext> {
        let at = self.evaluation_time.unwrap_or_else(Utc::now);
        Ok(PlanningContext::new(self.rules.snapshot(), at)
            .with_roster(self.availability.roster()?)
            .with_unavailability(self.availability.unavailability(start, end)?)
            .with_demand(self.demand.requirements(start, end)?))
    }

    fn context_for(&self, plan: &SchedulePlan) -> Result<PlanningContext> {
        self.context(plan.start_date, plan.end_date)
    }

    // Operations on caller-supplied plans. Nothing is loaded or stored.

    pub fn validate_schedule_conflicts(&self, plan: &SchedulePlan) -> Result<Vec<Conflict>> {
        let ctx = self.context_for(plan)?;
        Ok(self.detector.validate_schedule_conflicts(plan, &ctx))
    }

    pub fn resolve_schedule_conflicts(
        &self,
        plan: &SchedulePlan,
        conflicts: &[Conflict],
        strategy: &str,
        cancel: &CancellationToken,
    ) -> Result<Resolution> {
        let ctx = self.context_for(plan)?;
        self.resolver
            .resolve_schedule_conflicts(plan, conflicts, strategy, &ctx, cancel)
    }

    pub fn optimize_schedule(
        &self,
        plan: &SchedulePlan,
        target: OptimizationTarget,
        cancel: &CancellationToken,
    ) -> Result<OptimizationResult> {
        let ctx = self.context_for(plan)?;
        self.optimizer.optimize_schedule(plan, target, &ctx, cancel)
    }

    pub fn predict_schedule_effect(
        &self,
        plan: &SchedulePlan,
        cancel: &CancellationToken,
    ) -> Result<Prediction> {
        let ctx = self.context_for(plan)?;
        Ok(self.predictor.predict_schedule_effect(plan, &ctx, cancel))
    }

    // Lifecycle operations on stored plans.

    /// Builds and validates a fresh plan, replacing any unpublished plan
    /// stored under `plan_id`.
    pub fn generate_smart_schedule_plan(
        &self,
        plan_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<ValidatedPlan> {
        let expected_version = match self.plans.load(plan_id) {
            Ok(existing) if existing.is_published() => {
                return Err(ScheduleError::PlanPublished(plan_id.to_string()))
            }
            Ok(existing) => existing.version,
            Err(ScheduleError::PlanNotFound(_)) => 0,
            Err(err) => return Err(err),
        };

        let ctx = self.context(start, end)?;
        let mut plan = self.generator.generate(plan_id, start, end, &ctx, cancel)?;
        let conflicts = self.detector.validate_schedule_conflicts(&plan, &ctx);
        plan.status = if blocks_validation(&conflicts) {
            PlanStatus::Conflicted
        } else {
            PlanStatus::Validated
        };
        let plan = self.commit(plan, expected_version)?;
        Ok(ValidatedPlan { plan, conflicts })
    }

    /// Validates a stored plan and records VALIDATED or CONFLICTED.
    ///
    /// A published plan is checked but never written. An OPTIMIZED plan
    /// without blocking conflicts stays OPTIMIZED. Nothing is written when
    /// the status does not change.
    pub fn validate_plan(&self, plan_id: &str, expected_version: u64) -> Result<ValidatedPlan> {
        let plan = self.plans.load(plan_id)?;
        let ctx = self.context_for(&plan)?;
        if plan.is_published() {
            let conflicts = self.detector.validate_schedule_conflicts(&plan, &ctx);
            return Ok(ValidatedPlan { plan, conflicts });
        }
        self.check_version(&plan, expected_version)?;

        let conflicts = self.detector.validate_schedule_conflicts(&plan, &ctx);
        let status = match (blocks_validation(&conflicts), plan.status) {
            (true, _) => PlanStatus::Conflicted,
            (false, PlanStatus::Optimized) => PlanStatus::Optimized,
            (false, _) => PlanStatus::Validated,
        };
        if status == plan.status {
            return Ok(ValidatedPlan { plan, conflicts });
        }
        let mut plan = plan;
        plan.status = status;
        let plan = self.commit(plan, expected_version)?;
        Ok(ValidatedPlan { plan, conflicts })
    }

    /// Resolves the plan's conflicts with `strategy`, re-detecting between
    /// rounds, for at most `resolution.retry_budget` rounds.
    ///
    /// Cancellation between rounds fails with `Cancelled` before anything
    /// is written. An OPTIMIZED plan that needs no change stays OPTIMIZED
    /// and is not rewritten.
    pub fn resolve_plan(
        &self,
        plan_id: &str,
        strategy: &str,
        expected_version: u64,
        cancel: &CancellationToken,
    ) -> Result<ResolvedPlan> {
        let plan = self.load_mutable(plan_id, expected_version)?;
        let ctx = self.context_for(&plan)?;

        let mut working = plan.clone();
        let mut combined: Option<Resolution> = None;
        let mut rounds = 0;
        let mut conflicts = self.detector.validate_schedule_conflicts(&working, &ctx);
        while rounds < self.config.resolution.retry_budget {
            if cancel.is_cancelled() {
                return Err(ScheduleError::Cancelled);
            }
            let targets: Vec<Conflict> = conflicts.iter().filter(|c| is_resolvable(c)).cloned().collect();
            if targets.is_empty() {
                break;
            }
            rounds += 1;
            let round = self
                .resolver
                .resolve_schedule_conflicts(&working, &targets, strategy, &ctx, cancel)?;
            round.apply_to(&mut working)?;
            conflicts = self.detector.validate_schedule_conflicts(&working, &ctx);

            let progressed = round.has_changes();
            combined = Some(match combined.take() {
                None => round,
                Some(mut so_far) => {
                    so_far.changes.extend(round.changes);
                    so_far.residual = round.residual;
                    so_far
                }
            });
            if !progressed {
                break;
            }
        }

        let mut resolution = match combined {
            Some(resolution) => resolution,
            None => {
                let mut empty = Resolution::new(self.resolver.registry().get(strategy)?.name());
                empty.addressed = conflicts.iter().map(|c| c.id.clone()).collect();
                empty
            }
        };
        let remaining = conflict_keys(&conflicts);
        resolution
            .residual
            .retain(|r: &ResidualConflict| remaining.contains(&r.conflict.key()));

        working.status = match (blocks_validation(&conflicts), resolution.has_changes(), plan.status) {
            (true, _, _) => PlanStatus::Conflicted,
            (false, false, PlanStatus::Optimized) => PlanStatus::Optimized,
            (false, _, _) => PlanStatus::Validated,
        };
        let plan = if resolution.has_changes() || working.status != plan.status {
            self.commit(working, expected_version)?
        } else {
            plan
        };
        Ok(ResolvedPlan {
            plan,
            resolution,
            conflicts,
            rounds,
        })
    }

    /// Optimizes a VALIDATED or OPTIMIZED plan and stores the best plan found.
    ///
    /// A cancelled search returns its best plan without storing it.
    pub fn optimize_plan(
        &self,
        plan_id: &str,
        target: OptimizationTarget,
        expected_version: u64,
        cancel: &CancellationToken,
    ) -> Result<OptimizationResult> {
        let plan = self.load_mutable(plan_id, expected_version)?;
        if !matches!(plan.status, PlanStatus::Validated | PlanStatus::Optimized) {
            return Err(ScheduleError::InvalidTransition {
                plan_id: plan.id.clone(),
                from: plan.status.to_string(),
                to: PlanStatus::Optimized.to_string(),
            });
        }
        let ctx = self.context_for(&plan)?;
        let mut result = self.optimizer.optimize_schedule(&plan, target, &ctx, cancel)?;
        if result.termination == TerminationReason::Cancelled {
            return Ok(result);
        }

        let conflicts = self.detector.validate_schedule_conflicts(&result.plan, &ctx);
        let mut best = result.plan.clone();
        best.status = if blocks_validation(&conflicts) {
            PlanStatus::Conflicted
        } else {
            PlanStatus::Optimized
        };
        result.plan = self.commit(best, expected_version)?;
        Ok(result)
    }

    /// Forecast for a stored plan; never writes.
    pub fn predict_plan(&self, plan_id: &str, cancel: &CancellationToken) -> Result<Prediction> {
        let plan = self.plans.load(plan_id)?;
        self.predict_schedule_effect(&plan, cancel)
    }

    pub fn statistics(&self, plan_id: &str) -> Result<PlanStatistics> {
        let plan = self.plans.load(plan_id)?;
        let ctx = self.context_for(&plan)?;
        let conflicts = self.detector.validate_schedule_conflicts(&plan, &ctx);
        let (required, covered) =
            coverage::totals(&plan, &ctx.demand, self.config.prediction.slot_minutes);
        let coverage_ratio = if required == 0 {
            1.0
        } else {
            covered as f64 / required as f64
        };
        Ok(PlanStatistics::collect(
            &plan,
            &conflicts,
            coverage_ratio,
            self.rules.rule_statistics(),
        ))
    }

    /// Records that a VALIDATED or OPTIMIZED plan was published externally.
    pub fn mark_published(&self, plan_id: &str, expected_version: u64) -> Result<SchedulePlan> {
        let mut plan = self.load_mutable(plan_id, expected_version)?;
        if !matches!(plan.status, PlanStatus::Validated | PlanStatus::Optimized) {
            return Err(ScheduleError::InvalidTransition {
                plan_id: plan.id.clone(),
                from: plan.status.to_string(),
                to: PlanStatus::Published.to_string(),
            });
        }
        plan.status = PlanStatus::Published;
        self.commit(plan, expected_version)
    }

    /// Validate, resolve, then optimize, committing after each stage.
    ///
    /// Optimization is skipped when conflicts remain. A failure after the
    /// first commit comes back as `PartiallyApplied` with the last
    /// committed version.
    pub fn refine_plan(
        &self,
        plan_id: &str,
        strategy: &str,
        target: OptimizationTarget,
        expected_version: u64,
        cancel: &CancellationToken,
    ) -> Result<RefinedPlan> {
        let validation = self.validate_plan(plan_id, expected_version)?;
        let mut version = validation.plan.version;
        let committed = |version: u64| version != expected_version;
        let partial = |err: ScheduleError, version: u64| {
            if committed(version) {
                err.after_commit(version)
            } else {
                err
            }
        };

        let resolution = self
            .resolve_plan(plan_id, strategy, version, cancel)
            .map_err(|err| partial(err, version))?;
        version = resolution.plan.version;

        let optimization = if resolution.plan.status == PlanStatus::Validated
            || resolution.plan.status == PlanStatus::Optimized
        {
            Some(
                self.optimize_plan(plan_id, target, version, cancel)
                    .map_err(|err| partial(err, version))?,
            )
        } else {
            None
        };

        Ok(RefinedPlan {
            validation,
            resolution,
            optimization,
        })
    }

    /// Loads a plan that is about to change, failing early when it is
    /// published or the caller's version is stale.
    fn load_mutable(&self, plan_id: &str, expected_version: u64) -> Result<SchedulePlan> {
        let plan = self.plans.load(plan_id)?;
        if plan.is_published() {
            return Err(ScheduleError::PlanPublished(plan_id.to_string()));
        }
        self.check_version(&plan, expected_version)?;
        Ok(plan)
    }

    fn check_version(&self, plan: &SchedulePlan, expected_version: u64) -> Result<()> {
        if plan.version == expected_version {
            return Ok(());
        }
        warn!(
            event = "stale_version",
            plan_id = %plan.id,
            expected = expected_version,
            actual = plan.version,
        );
        Err(ScheduleError::StaleVersion {
            plan_id: plan.id.clone(),
            expected: expected_version,
            actual: plan.version,
        })
    }

    fn commit(&self, plan: SchedulePlan, expected_version: u64) -> Result<SchedulePlan> {
        match self.plans.save(&plan, expected_version) {
            Ok(saved) => {
                info!(
                    event = "plan_committed",
                    plan_id = %saved.id,
                    version = saved.version,
                    status = %saved.status,
                    assignments = saved.assignments.len(),
                );
                Ok(saved)
            }
            Err(err @ ScheduleError::StaleVersion { .. }) => {
                warn!(event = "stale_version", plan_id = %plan.id, error = %err);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for ScheduleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleEngine")
            .field("config", &self.config)
            .field("strategies", self.resolver.registry())
            .finish()
    }
}
