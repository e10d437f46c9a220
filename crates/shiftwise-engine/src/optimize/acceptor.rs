//! Acceptors decide whether a perturbed plan replaces the current one.

use std::fmt::Debug;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shiftwise_core::PlanScore;

/// Decides whether a move's score is accepted against the last step's score.
pub trait Acceptor: Send + Debug {
    /// Returns true if a move leading to `move_score` should be taken.
    fn is_accepted(&mut self, last_step_score: &PlanScore, move_score: &PlanScore) -> bool;

    /// Called when the search starts.
    fn phase_started(&mut self, _initial_score: &PlanScore) {}

    /// Called when the search ends.
    fn phase_ended(&mut self) {}

    /// Called after every iteration with the current score.
    fn step_ended(&mut self, _step_score: &PlanScore) {}
}

/// Accepts only moves that do not make the score worse.
#[derive(Debug, Clone, Copy, Default)]
pub struct HillClimbingAcceptor;

impl Acceptor for HillClimbingAcceptor {
    fn is_accepted(&mut self, last_step_score: &PlanScore, move_score: &PlanScore) -> bool {
        move_score >= last_step_score
    }
}

/// Simulated annealing with a hard cap on the accepted soft loss.
///
/// A move that loses soft score is taken with probability
/// `exp(-loss / temperature)`, and only while the loss stays within the
/// current tolerance. Moves that lose hard score are never taken. Both the
/// temperature and the tolerance shrink by `decay_rate` after every step,
/// so the search grows greedier as it runs.
///
/// # Example
///
/// ```
/// use shiftwise_engine::optimize::{Acceptor, SimulatedAnnealingAcceptor};
/// use shiftwise_core::PlanScore;
///
/// let mut acceptor = SimulatedAnnealingAcceptor::new(10.0, 50.0, 0.99, 7);
/// acceptor.phase_started(&PlanScore::ZERO);
/// assert!(acceptor.is_accepted(&PlanScore::of_soft(-10), &PlanScore::of_soft(-5)));
/// assert!(!acceptor.is_accepted(&PlanScore::of_soft(-10), &PlanScore::of_soft(-100)));
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedAnnealingAcceptor {
    starting_temperature: f64,
    current_temperature: f64,
    starting_tolerance: f64,
    current_tolerance: f64,
    decay_rate: f64,
    rng: ChaCha8Rng,
}

impl SimulatedAnnealingAcceptor {
    pub fn new(starting_temperature: f64, starting_tolerance: f64, decay_rate: f64, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        // Keep the acceptance rolls apart from the move-selection stream.
        rng.set_stream(1);
        Self {
            starting_temperature,
            current_temperature: starting_temperature,
            starting_tolerance,
            current_tolerance: starting_tolerance,
            decay_rate,
            rng,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.current_temperature
    }

    pub fn tolerance(&self) -> f64 {
        self.current_tolerance
    }
}

impl Acceptor for SimulatedAnnealingAcceptor {
    fn is_accepted(&mut self, last_step_score: &PlanScore, move_score: &PlanScore) -> bool {
        if move_score >= last_step_score {
            return true;
        }
        if move_score.hard() < last_step_score.hard() {
            return false;
        }
        let loss = (last_step_score.soft() - move_score.soft()) as f64;
        if loss > self.current_tolerance || self.current_temperature <= 0.0 {
            return false;
        }
        let probability = (-loss / self.current_temperature).exp();
        self.rng.random::<f64>() < probability
    }

    fn phase_started(&mut self, _initial_score: &PlanScore) {
        self.current_temperature = self.starting_temperature;
        self.current_tolerance = self.starting_tolerance;
    }

    fn step_ended(&mut self, _step_score: &PlanScore) {
        self.current_temperature *= self.decay_rate;
        self.current_tolerance *= self.decay_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hill_climbing_rejects_losses() {
        let mut acceptor = HillClimbingAcceptor;
        assert!(acceptor.is_accepted(&PlanScore::of_soft(-5), &PlanScore::of_soft(-5)));
        assert!(!acceptor.is_accepted(&PlanScore::of_soft(-5), &PlanScore::of_soft(-6)));
    }

    #[test]
    fn test_annealing_never_accepts_hard_loss() {
        let mut acceptor = SimulatedAnnealingAcceptor::new(1e9, 1e9, 1.0, 1);
        acceptor.phase_started(&PlanScore::ZERO);
        for _ in 0..100 {
            assert!(!acceptor.is_accepted(&PlanScore::of(0, -10), &PlanScore::of(-1, 1000)));
        }
    }

    #[test]
    fn test_tolerance_shrinks_each_step() {
        let mut acceptor = SimulatedAnnealingAcceptor::new(10.0, 50.0, 0.5, 1);
        acceptor.phase_started(&PlanScore::ZERO);
        acceptor.step_ended(&PlanScore::ZERO);
        acceptor.step_ended(&PlanScore::ZERO);
        assert_eq!(acceptor.tolerance(), 12.5);
        assert_eq!(acceptor.temperature(), 2.5);

        // A loss of 20 was within the starting tolerance but no longer is.
        for _ in 0..100 {
            assert!(!acceptor.is_accepted(&PlanScore::of_soft(0), &PlanScore::of_soft(-20)));
        }

        acceptor.phase_started(&PlanScore::ZERO);
        assert_eq!(acceptor.tolerance(), 50.0);
    }

    #[test]
    fn test_same_seed_same_decisions() {
        let decisions = |seed| {
            let mut acceptor = SimulatedAnnealingAcceptor::new(5.0, 50.0, 1.0, seed);
            acceptor.phase_started(&PlanScore::ZERO);
            (0..64)
                .map(|_| acceptor.is_accepted(&PlanScore::of_soft(0), &PlanScore::of_soft(-4)))
                .collect::<Vec<_>>()
        };
        assert_eq!(decisions(9), decisions(9));
        let taken = decisions(9).into_iter().filter(|d| *d).count();
        assert!(taken > 0 && taken < 64);
    }
}
