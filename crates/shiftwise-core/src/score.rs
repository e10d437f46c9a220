//! PlanScore - Two-level score with hard and soft levels

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A plan score with separate hard and soft levels.
///
/// The hard level counts broken hard constraints (as a negative number),
/// the soft level carries the objective being optimized.
///
/// When comparing scores:
/// 1. Hard scores are compared first
/// 2. Soft scores are only compared when hard scores are equal
///
/// # Examples
///
/// ```
/// use shiftwise_core::PlanScore;
///
/// let score1 = PlanScore::of(-1, -100);  // 1 hard conflict left
/// let score2 = PlanScore::of(0, -200);   // Feasible but expensive
///
/// // Feasible plans are always better than infeasible ones
/// assert!(score2 > score1);
///
/// let score3 = PlanScore::of(0, -50);
/// assert!(score3 > score2);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlanScore {
    hard: i64,
    soft: i64,
}

impl PlanScore {
    /// The zero score.
    pub const ZERO: PlanScore = PlanScore { hard: 0, soft: 0 };

    /// Creates a new PlanScore.
    #[inline]
    pub const fn of(hard: i64, soft: i64) -> Self {
        PlanScore { hard, soft }
    }

    /// Creates a score with only a hard component.
    #[inline]
    pub const fn of_hard(hard: i64) -> Self {
        PlanScore { hard, soft: 0 }
    }

    /// Creates a score with only a soft component.
    #[inline]
    pub const fn of_soft(soft: i64) -> Self {
        PlanScore { hard: 0, soft }
    }

    /// Returns the hard score component.
    #[inline]
    pub const fn hard(&self) -> i64 {
        self.hard
    }

    /// Returns the soft score component.
    #[inline]
    pub const fn soft(&self) -> i64 {
        self.soft
    }

    /// A plan is feasible when no hard constraint is broken.
    #[inline]
    pub const fn is_feasible(&self) -> bool {
        self.hard >= 0
    }
}

impl Ord for PlanScore {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.hard.cmp(&other.hard) {
            Ordering::Equal => self.soft.cmp(&other.soft),
            other => other,
        }
    }
}

impl PartialOrd for PlanScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for PlanScore {
    type Output = PlanScore;

    fn add(self, rhs: Self) -> Self::Output {
        PlanScore::of(self.hard + rhs.hard, self.soft + rhs.soft)
    }
}

impl Sub for PlanScore {
    type Output = PlanScore;

    fn sub(self, rhs: Self) -> Self::Output {
        PlanScore::of(self.hard - rhs.hard, self.soft - rhs.soft)
    }
}

impl Neg for PlanScore {
    type Output = PlanScore;

    fn neg(self) -> Self::Output {
        PlanScore::of(-self.hard, -self.soft)
    }
}

impl fmt::Debug for PlanScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlanScore({}, {})", self.hard, self.soft)
    }
}

impl fmt::Display for PlanScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}hard/{}soft", self.hard, self.soft)
    }
}
