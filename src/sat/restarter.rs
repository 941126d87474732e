#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Restart policies for the CDCL search.
//!
//! A restart abandons the current branch, backtracks to level 0 and re-simplifies the
//! formula while keeping learned clauses and activity scores. The search loop restarts once
//! the number of conflicts since the previous restart reaches `max_conflicts`; the policy
//! then decides the budgets of the next round.
//!
//! This module provides:
//! - The `Restarter` trait, the common interface of all policies.
//! - `Minisat`: geometric growth of both budgets.
//! - `Rsat`: a fixed base interval scaled by the lowest set bit of the restart count, with
//!   the learned clause budget growing on every database reduction instead.
//! - `Picosat`: an inner budget growing by a fifth until it reaches an outer bound, at which
//!   point both budgets are recomputed from the size of the formula.
//! - `RestarterImpls` and `RestartStrategy`, used to pick a policy at configuration time.

use crate::sat::config::SolverConfig;
use crate::sat::error::SolverError;
use clap::ValueEnum;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Base conflict interval of the rsat policy.
const RSAT_INTERVAL: usize = 512;

/// Growth of the picosat outer factor per outer cycle.
const PICOSAT_FACTOR_GROWTH: f64 = 1.03;

/// The two limits steering the search between restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchBudget {
    /// Conflicts allowed since the last restart before the next one.
    pub max_conflicts: usize,
    /// Learned clause limit; the database is reduced once `max_learned - trail length` is
    /// at most the number of learned clauses.
    pub max_learned: usize,
}

/// Trait defining the interface for restart policies.
pub trait Restarter: Debug + Clone {
    /// Conflict budget before the first restart.
    fn initial_conflicts(&self) -> usize;

    /// Updates the budgets after restart number `restarts` (starting at 1).
    ///
    /// `original_clauses` is the number of original clauses still alive after the
    /// post-restart simplification.
    fn on_restart(&mut self, restarts: usize, original_clauses: usize, budget: &mut SearchBudget);

    /// Called after every learned clause database reduction.
    fn on_reduce(&mut self, _budget: &mut SearchBudget) {}
}

/// Conflict budget grows by one half and the learned limit by one tenth per restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minisat {
    initial: usize,
}

impl Minisat {
    #[must_use]
    pub const fn new(initial: usize) -> Self {
        Self { initial }
    }
}

impl Restarter for Minisat {
    fn initial_conflicts(&self) -> usize {
        self.initial
    }

    fn on_restart(&mut self, _restarts: usize, _original_clauses: usize, budget: &mut SearchBudget) {
        budget.max_learned += budget.max_learned / 10;
        // a budget below 2 would never learn a clause unless it keeps growing
        budget.max_conflicts += (budget.max_conflicts / 2).max(1);
    }
}

/// Conflict budget is `512 * f`, where `f` is the lowest set bit of the restart count
/// (1, 2, 1, 4, 1, 2, 1, 8, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rsat {
    initial: usize,
}

impl Rsat {
    #[must_use]
    pub const fn new(initial: usize) -> Self {
        Self { initial }
    }

    /// Lowest set bit of `restarts`; 1 for zero.
    #[must_use]
    pub const fn factor(restarts: usize) -> usize {
        if restarts == 0 {
            1
        } else {
            1 << restarts.trailing_zeros()
        }
    }
}

impl Restarter for Rsat {
    fn initial_conflicts(&self) -> usize {
        self.initial
    }

    fn on_restart(&mut self, restarts: usize, _original_clauses: usize, budget: &mut SearchBudget) {
        budget.max_conflicts = RSAT_INTERVAL * Self::factor(restarts);
    }

    fn on_reduce(&mut self, budget: &mut SearchBudget) {
        budget.max_learned += budget.max_learned / 10;
    }
}

/// Inner/outer scheme. Both budgets grow by a fifth per restart; once the conflict budget
/// reaches `outer`, `outer` grows by a tenth and both budgets are reset to
/// `original_clauses * learn_factor * factor`, with `factor` growing by 3% per reset.
#[derive(Debug, Clone, PartialEq)]
pub struct Picosat {
    initial: usize,
    outer: usize,
    factor: f64,
    learn_factor: f64,
}

impl Picosat {
    #[must_use]
    pub fn new(initial: usize, learn_factor: f32) -> Self {
        Self {
            initial,
            outer: initial,
            factor: 1.0,
            learn_factor: f64::from(learn_factor),
        }
    }

    #[must_use]
    pub const fn outer(&self) -> usize {
        self.outer
    }
}

impl Restarter for Picosat {
    fn initial_conflicts(&self) -> usize {
        self.initial
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn on_restart(&mut self, _restarts: usize, original_clauses: usize, budget: &mut SearchBudget) {
        if budget.max_conflicts >= self.outer {
            self.outer += (self.outer / 10).max(1);
            let recomputed = (original_clauses as f64 * self.learn_factor * self.factor) as usize;
            // a budget of zero would restart on every conflict
            let recomputed = recomputed.max(self.initial);
            budget.max_conflicts = recomputed;
            budget.max_learned = recomputed;
            self.factor *= PICOSAT_FACTOR_GROWTH;
        } else {
            budget.max_conflicts += (budget.max_conflicts / 5).max(1);
            budget.max_learned += budget.max_learned / 5;
        }
    }
}

/// Static dispatch over the available restart policies.
#[derive(Debug, Clone, PartialEq)]
pub enum RestarterImpls {
    Minisat(Minisat),
    Rsat(Rsat),
    Picosat(Picosat),
}

impl Restarter for RestarterImpls {
    fn initial_conflicts(&self) -> usize {
        match self {
            Self::Minisat(r) => r.initial_conflicts(),
            Self::Rsat(r) => r.initial_conflicts(),
            Self::Picosat(r) => r.initial_conflicts(),
        }
    }

    fn on_restart(&mut self, restarts: usize, original_clauses: usize, budget: &mut SearchBudget) {
        match self {
            Self::Minisat(r) => r.on_restart(restarts, original_clauses, budget),
            Self::Rsat(r) => r.on_restart(restarts, original_clauses, budget),
            Self::Picosat(r) => r.on_restart(restarts, original_clauses, budget),
        }
    }

    fn on_reduce(&mut self, budget: &mut SearchBudget) {
        match self {
            Self::Minisat(r) => r.on_reduce(budget),
            Self::Rsat(r) => r.on_reduce(budget),
            Self::Picosat(r) => r.on_reduce(budget),
        }
    }
}

/// Enum representing the restart policy to use, selectable from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum RestartStrategy {
    /// Geometric growth of the conflict and learned clause budgets.
    #[default]
    Minisat,
    /// Conflict budget of 512 times the lowest set bit of the restart count.
    Rsat,
    /// Inner budget growth with periodic recomputation from the formula size.
    Picosat,
}

impl Display for RestartStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minisat => write!(f, "minisat"),
            Self::Rsat => write!(f, "rsat"),
            Self::Picosat => write!(f, "picosat"),
        }
    }
}

impl FromStr for RestartStrategy {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minisat" => Ok(Self::Minisat),
            "rsat" => Ok(Self::Rsat),
            "picosat" => Ok(Self::Picosat),
            other => Err(SolverError::UnknownRestartStrategy(other.to_string())),
        }
    }
}

impl RestartStrategy {
    /// Converts the `RestartStrategy` to a concrete `RestarterImpls`.
    #[must_use]
    pub fn to_impl(self, config: &SolverConfig) -> RestarterImpls {
        match self {
            Self::Minisat => RestarterImpls::Minisat(Minisat::new(config.initial_conflicts)),
            Self::Rsat => RestarterImpls::Rsat(Rsat::new(config.initial_conflicts)),
            Self::Picosat => RestarterImpls::Picosat(Picosat::new(
                config.picosat_initial_conflicts,
                config.learn_factor,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(max_conflicts: usize, max_learned: usize) -> SearchBudget {
        SearchBudget {
            max_conflicts,
            max_learned,
        }
    }

    #[test]
    fn test_minisat_growth() {
        let mut r = Minisat::new(100);
        let mut b = budget(r.initial_conflicts(), 50);
        r.on_restart(1, 10, &mut b);
        assert_eq!(b, budget(150, 55));
        r.on_restart(2, 10, &mut b);
        assert_eq!(b, budget(225, 60));
    }

    #[test]
    fn test_rsat_sequence() {
        let mut r = Rsat::new(100);
        let mut b = budget(r.initial_conflicts(), 40);
        let intervals: Vec<_> = (1..=8)
            .map(|n| {
                r.on_restart(n, 10, &mut b);
                b.max_conflicts
            })
            .collect();
        assert_eq!(intervals, vec![512, 1024, 512, 2048, 512, 1024, 512, 4096]);
        assert_eq!(b.max_learned, 40);

        r.on_reduce(&mut b);
        assert_eq!(b.max_learned, 44);
    }

    #[test]
    fn test_picosat_inner_and_outer() {
        let mut r = Picosat::new(400, 0.5);
        let mut b = budget(r.initial_conflicts(), 100);

        r.on_restart(1, 2000, &mut b);
        assert_eq!(b, budget(1000, 1000));
        assert_eq!(r.outer(), 440);

        r.on_restart(2, 2000, &mut b);
        let expected = (2000.0 * 0.5 * 1.03) as usize;
        assert_eq!(b, budget(expected, expected));
        assert_eq!(r.outer(), 484);
    }

    #[test]
    fn test_picosat_budget_floor() {
        let mut r = Picosat::new(400, 0.2);
        let mut b = budget(400, 10);
        r.on_restart(1, 3, &mut b);
        assert_eq!(b, budget(400, 400));

        let mut b = budget(100, 10);
        r.on_restart(2, 3, &mut b);
        assert_eq!(b, budget(120, 12));
    }

    #[test]
    fn test_small_budgets_keep_growing() {
        let mut r = Minisat::new(0);
        let mut b = budget(r.initial_conflicts(), 1);
        let minisat: Vec<_> = (1..=4)
            .map(|n| {
                r.on_restart(n, 6, &mut b);
                b.max_conflicts
            })
            .collect();
        assert_eq!(minisat, vec![1, 2, 3, 4]);

        let mut r = Picosat::new(1, 0.2);
        let mut b = budget(r.initial_conflicts(), 1);
        let picosat: Vec<_> = (1..=6)
            .map(|n| {
                r.on_restart(n, 6, &mut b);
                b.max_conflicts
            })
            .collect();
        assert_eq!(picosat, vec![1, 2, 1, 2, 3, 1]);
        assert_eq!(r.outer(), 4);
    }

    #[test]
    fn test_strategy_names() {
        for strategy in RestartStrategy::value_variants() {
            assert_eq!(strategy.to_string().parse::<RestartStrategy>(), Ok(*strategy));
        }
        assert!("luby".parse::<RestartStrategy>().is_err());

        let config = SolverConfig::default();
        assert_eq!(RestartStrategy::Picosat.to_impl(&config).initial_conflicts(), 400);
        assert_eq!(RestartStrategy::Rsat.to_impl(&config).initial_conflicts(), 100);
    }
}
