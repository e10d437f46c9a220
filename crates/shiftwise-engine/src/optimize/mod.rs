//! Local-search optimization of a schedule plan.
//!
//! The search perturbs one assignment at a time on a private copy of the
//! plan. A move is rejected outright when it introduces a hard conflict the
//! current plan does not have; otherwise the [`Acceptor`] decides. The best
//! plan seen is kept, so the result never scores below the input.

mod acceptor;
mod moves;
mod objective;
mod termination;

#[cfg(test)]
mod tests;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shiftwise_config::OptimizerConfig;
use shiftwise_core::{
    CancellationToken, OptimizationResult, OptimizationTarget, Result, SchedulePlan,
    TerminationReason,
};
use tracing::{info, trace};

use crate::context::PlanningContext;
use crate::detect::ConflictDetector;

pub use acceptor::{Acceptor, HillClimbingAcceptor, SimulatedAnnealingAcceptor};
pub use moves::{MoveSelector, PlanMove};
pub use objective::{Evaluation, Objective};
pub use termination::{
    ExternalTermination, IterationCountTermination, OrTermination, SearchProgress, Termination,
    UnimprovedIterationTermination,
};

/// Improves a plan against an [`OptimizationTarget`].
#[derive(Debug, Clone)]
pub struct ScheduleOptimizer {
    config: OptimizerConfig,
    detector: ConflictDetector,
    slot_minutes: i64,
}

impl ScheduleOptimizer {
    pub fn new(config: OptimizerConfig, detector: ConflictDetector, slot_minutes: i64) -> Self {
        Self {
            config,
            detector,
            slot_minutes,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Runs the search and returns the best plan seen.
    ///
    /// Cancellation is checked before every iteration; a cancelled search
    /// still returns its best plan, with [`TerminationReason::Cancelled`].
    /// The same seed, plan and context always produce the same result.
    pub fn optimize_schedule(
        &self,
        plan: &SchedulePlan,
        target: OptimizationTarget,
        ctx: &PlanningContext,
        cancel: &CancellationToken,
    ) -> Result<OptimizationResult> {
        let seed = self.config.seed();
        info!(
            event = "optimize_start",
            plan_id = %plan.id,
            target = %target,
            assignments = plan.assignments.len(),
            seed,
        );

        let objective = Objective::new(target, &self.detector, ctx, &self.config, self.slot_minutes);
        let selector = MoveSelector::new(plan, ctx, self.config.nudge_minutes);
        let mut acceptor = SimulatedAnnealingAcceptor::new(
            self.config.starting_temperature,
            self.config.starting_tolerance,
            self.config.tolerance_decay,
            seed,
        );
        let termination = OrTermination::new(vec![
            Box::new(ExternalTermination::new(cancel.clone())),
            Box::new(IterationCountTermination::new(self.config.iteration_limit)),
            Box::new(UnimprovedIterationTermination::new(
                self.config.unimproved_iteration_limit,
            )),
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let initial = objective.evaluate(plan);
        let initial_score = initial.score;
        let mut current_plan = plan.clone();
        let mut current = initial;
        let mut best_plan = plan.clone();
        let mut best_score = initial_score;
        let mut trajectory = vec![initial_score];
        let mut progress = SearchProgress::default();
        let mut accepted_moves = 0u64;

        acceptor.phase_started(&initial_score);
        let reason = loop {
            if selector.is_empty() {
                break TerminationReason::NoMoves;
            }
            if let Some(reason) = termination.is_terminated(&progress) {
                break reason;
            }
            progress.iterations += 1;

            if let Some(candidate) = selector.select(&current_plan, ctx, &mut rng) {
                let mut trial = current_plan.clone();
                if candidate.apply(&mut trial).is_ok() {
                    let evaluation = objective.evaluate(&trial);
                    let new_hard = evaluation
                        .hard_keys
                        .iter()
                        .any(|k| !current.hard_keys.contains(k));
                    let accepted =
                        !new_hard && acceptor.is_accepted(&current.score, &evaluation.score);
                    trace!(
                        event = "step",
                        iteration = progress.iterations,
                        candidate = ?candidate,
                        score = ?evaluation.score,
                        accepted,
                    );
                    if accepted {
                        accepted_moves += 1;
                        current_plan = trial;
                        current = evaluation;
                    }
                }
            }

            if current.score > best_score {
                best_score = current.score;
                best_plan = current_plan.clone();
                trajectory.push(best_score);
                progress.unimproved_iterations = 0;
            } else {
                progress.unimproved_iterations += 1;
            }
            acceptor.step_ended(&current.score);
        };
        acceptor.phase_ended();

        info!(
            event = "optimize_end",
            plan_id = %plan.id,
            target = %target,
            iterations = progress.iterations,
            accepted_moves,
            initial_score = ?initial_score,
            best_score = ?best_score,
            termination = ?reason,
        );

        Ok(OptimizationResult {
            plan: best_plan,
            target,
            initial_score,
            score: best_score,
            trajectory,
            iterations: progress.iterations,
            accepted_moves,
            termination: reason,
        })
    }
}
