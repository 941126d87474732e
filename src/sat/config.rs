#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Solver configuration.

use crate::sat::error::SolverError;
use crate::sat::restarter::RestartStrategy;

/// Configurable parameters used during solving.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Restart policy.
    ///
    /// Default: minisat
    pub restart_strategy: RestartStrategy,

    /// Initial learned clause limit as a fraction of the original clause count.
    ///
    /// Default: 0.2
    pub learn_factor: f32,

    /// Initial learned clause limit; overrides `learn_factor` when non-zero.
    ///
    /// Default: 0
    pub learn_start: u32,

    /// Growth of the variable score increment after every conflict.
    ///
    /// Default: 1 / 0.95
    pub var_score_growth: f64,

    /// Variable scores above this value trigger a rescale.
    ///
    /// Default: 1e100
    pub var_score_limit: f64,

    /// Factor applied to every variable score on rescale.
    ///
    /// Default: 1e-100
    pub var_score_rescale: f64,

    /// Growth of the clause score increment after every conflict.
    ///
    /// Default: 1 / 0.999
    pub clause_score_growth: f64,

    /// Clause scores reaching this value trigger a rescale.
    ///
    /// Default: 1e20
    pub clause_score_limit: f64,

    /// Factor applied to every learned clause score on rescale.
    ///
    /// Default: 1e-20
    pub clause_score_rescale: f64,

    /// Conflicts allowed before the first restart (minisat and rsat).
    ///
    /// Default: 100
    pub initial_conflicts: usize,

    /// Conflicts allowed before the first restart, and the first outer bound, for picosat.
    ///
    /// Default: 400
    pub picosat_initial_conflicts: usize,

    /// Number of decisions between two progress reports.
    ///
    /// Default: 4096
    pub progress_interval: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            restart_strategy: RestartStrategy::default(),
            learn_factor: 0.2,
            learn_start: 0,
            var_score_growth: 1.0 / 0.95,
            var_score_limit: 1e100,
            var_score_rescale: 1e-100,
            clause_score_growth: 1.0 / 0.999,
            clause_score_limit: 1e20,
            clause_score_rescale: 1e-20,
            initial_conflicts: 100,
            picosat_initial_conflicts: 400,
            progress_interval: 4096,
        }
    }
}

impl SolverConfig {
    #[must_use]
    pub fn with_restart_strategy(mut self, strategy: RestartStrategy) -> Self {
        self.restart_strategy = strategy;
        self
    }

    /// Selects the restart strategy by name.
    ///
    /// # Errors
    ///
    /// `SolverError::UnknownRestartStrategy` if `name` is not a known strategy.
    pub fn with_restart_strategy_name(self, name: &str) -> Result<Self, SolverError> {
        Ok(self.with_restart_strategy(name.parse()?))
    }

    #[must_use]
    pub const fn with_learn_factor(mut self, learn_factor: f32) -> Self {
        self.learn_factor = learn_factor;
        self
    }

    #[must_use]
    pub const fn with_learn_start(mut self, learn_start: u32) -> Self {
        self.learn_start = learn_start;
        self
    }

    /// Initial learned clause limit for a formula with `original_clauses` clauses.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn initial_max_learned(&self, original_clauses: usize) -> usize {
        if self.learn_start == 0 {
            (original_clauses as f64 * f64::from(self.learn_factor)) as usize
        } else {
            self.learn_start as usize
        }
    }
}
