//! Termination conditions for the local search.

use std::fmt::Debug;

use shiftwise_core::{CancellationToken, TerminationReason};

/// Counters a termination condition looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchProgress {
    pub iterations: u64,
    pub unimproved_iterations: u64,
}

/// Decides when the search should stop.
pub trait Termination: Send + Debug {
    /// The reason to stop now, if any.
    fn is_terminated(&self, progress: &SearchProgress) -> Option<TerminationReason>;
}

/// Stops after a fixed number of iterations.
#[derive(Debug, Clone, Copy)]
pub struct IterationCountTermination {
    limit: u64,
}

impl IterationCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for IterationCountTermination {
    fn is_terminated(&self, progress: &SearchProgress) -> Option<TerminationReason> {
        (progress.iterations >= self.limit).then_some(TerminationReason::IterationLimit)
    }
}

/// Stops when the best score has not improved for `limit` iterations.
#[derive(Debug, Clone, Copy)]
pub struct UnimprovedIterationTermination {
    limit: u64,
}

impl UnimprovedIterationTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for UnimprovedIterationTermination {
    fn is_terminated(&self, progress: &SearchProgress) -> Option<TerminationReason> {
        (progress.unimproved_iterations >= self.limit).then_some(TerminationReason::Plateau)
    }
}

/// Stops once the caller cancels.
#[derive(Debug, Clone)]
pub struct ExternalTermination {
    token: CancellationToken,
}

impl ExternalTermination {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Termination for ExternalTermination {
    fn is_terminated(&self, _progress: &SearchProgress) -> Option<TerminationReason> {
        self.token
            .is_cancelled()
            .then_some(TerminationReason::Cancelled)
    }
}

/// Stops when any inner condition does, reporting the first one that fired.
#[derive(Debug)]
pub struct OrTermination {
    terminations: Vec<Box<dyn Termination>>,
}

impl OrTermination {
    pub fn new(terminations: Vec<Box<dyn Termination>>) -> Self {
        Self { terminations }
    }
}

impl Termination for OrTermination {
    fn is_terminated(&self, progress: &SearchProgress) -> Option<TerminationReason> {
        self.terminations
            .iter()
            .find_map(|t| t.is_terminated(progress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(iterations: u64, unimproved_iterations: u64) -> SearchProgress {
        SearchProgress {
            iterations,
            unimproved_iterations,
        }
    }

    #[test]
    fn test_first_firing_condition_wins() {
        let cancel = CancellationToken::new();
        let termination = OrTermination::new(vec![
            Box::new(ExternalTermination::new(cancel.clone())),
            Box::new(IterationCountTermination::new(10)),
            Box::new(UnimprovedIterationTermination::new(3)),
        ]);

        assert_eq!(termination.is_terminated(&progress(2, 2)), None);
        assert_eq!(
            termination.is_terminated(&progress(5, 3)),
            Some(TerminationReason::Plateau)
        );
        assert_eq!(
            termination.is_terminated(&progress(10, 3)),
            Some(TerminationReason::IterationLimit)
        );
        cancel.cancel();
        assert_eq!(
            termination.is_terminated(&progress(0, 0)),
            Some(TerminationReason::Cancelled)
        );
    }
}
