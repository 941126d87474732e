#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Defines the baseline DPLL (Davis-Putnam-Logemann-Loveland) SAT solver.
//!
//! The `Dpll` solver runs on the same clause store, trail and watched-literal propagation
//! as the CDCL search, but without learning, scoring or restarts. It serves as a reference
//! point for benchmarks and as a cross-check in tests.
//!
//! The core logic involves:
//! 1.  **Unit Propagation:** two-watched-literal BCP, exactly as in the CDCL search.
//! 2.  **Decision:** the lowest-numbered unassigned variable is set to `true` first.
//! 3.  **Backtracking:** chronological. On a conflict the most recent decision that has
//!     not been flipped yet is undone and its negation is tried at the same depth; decisions
//!     whose both values failed are popped on the way.

use crate::sat::cnf::Cnf;
use crate::sat::config::SolverConfig;
use crate::sat::error::SolverError;
use crate::sat::literal::{Literal, Variable};
use crate::sat::progress::{CancellationToken, ProgressObserver, ProgressReport};
use crate::sat::solver::{SolutionStats, SolveResult, Solver, import};
use crate::sat::state::SearchState;
use std::fmt::{Debug, Formatter};

/// Decisions between two progress reports.
const DPLL_PROGRESS_INTERVAL: usize = 65536;

/// Represents a DPLL SAT solver.
pub struct Dpll {
    /// Clause store, variable values, trail and watches.
    pub state: SearchState,
    /// One entry per open decision level: the decided variable and whether the decision
    /// already is the flipped (negative) value.
    stack: Vec<(Variable, bool)>,
    /// Every variable below `cursor` is assigned.
    cursor: Variable,
    stats: SolutionStats,
    trivially_unsat: bool,
    cancel: Option<CancellationToken>,
    observer: Option<Box<dyn ProgressObserver + Send>>,
}

impl Debug for Dpll {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dpll")
            .field("num_vars", &self.state.num_vars())
            .field("depth", &self.stack.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Dpll {
    /// Lowest-numbered unassigned variable, if any.
    fn next_unassigned(&mut self) -> Option<Variable> {
        #[allow(clippy::cast_possible_truncation)]
        let num_vars = self.state.num_vars() as Variable;
        while self.cursor <= num_vars {
            if !self.state.vars.is_assigned(self.cursor) {
                return Some(self.cursor);
            }
            self.cursor += 1;
        }
        None
    }

    /// Undoes every decision above `level`.
    fn backtrack(&mut self, level: u32) {
        let cursor = &mut self.cursor;
        self.state
            .backtrack(level, |var| *cursor = (*cursor).min(var));
    }

    /// Flips the most recent unflipped decision. Returns `false` once every decision has
    /// been tried both ways.
    #[allow(clippy::cast_possible_truncation)]
    fn backtrack_and_flip(&mut self) -> bool {
        while let Some((var, flipped)) = self.stack.pop() {
            if flipped {
                continue;
            }
            self.backtrack(self.stack.len() as u32);
            self.stack.push((var, true));
            self.state.decide(Literal::negative(var));
            self.stats.decisions += 1;
            return true;
        }
        false
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn report(&mut self) {
        let report = ProgressReport {
            decision_level: self.state.decision_level(),
            decisions: self.stats.decisions,
            conflicts: self.stats.conflicts,
            live_vars: self.state.num_vars() - self.state.vars.num_assigned(),
            original_clauses: self.state.db.num_original(),
            original_literals: self.state.db.original_literals,
            ..ProgressReport::default()
        };
        tracing::debug!(
            decisions = report.decisions,
            assigned = self.state.vars.num_assigned(),
            depth = self.stack.len(),
            "dpll progress"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.report(&report);
        }
    }

    fn search(&mut self) -> SolveResult {
        if self.trivially_unsat {
            return SolveResult::Unsatisfiable;
        }

        loop {
            if self.is_cancelled() {
                return SolveResult::Interrupted;
            }

            if self.state.propagate().is_err() {
                self.stats.conflicts += 1;
                if !self.backtrack_and_flip() {
                    return SolveResult::Unsatisfiable;
                }
                continue;
            }

            let Some(var) = self.next_unassigned() else {
                return SolveResult::Satisfiable(self.state.vars.model());
            };
            self.stack.push((var, false));
            self.state.decide(Literal::positive(var));
            self.stats.decisions += 1;
            if self.stats.decisions % DPLL_PROGRESS_INTERVAL == 0 {
                self.report();
            }
        }
    }
}

impl Solver for Dpll {
    /// Creates an empty DPLL solver.
    fn new(_config: SolverConfig) -> Self {
        Self {
            state: SearchState::default(),
            stack: Vec::new(),
            cursor: 1,
            stats: SolutionStats::default(),
            trivially_unsat: false,
            cancel: None,
            observer: None,
        }
    }

    fn fetch_problem(&mut self, cnf: &Cnf) -> Result<(), SolverError> {
        let (state, refuted) = import(cnf)?.load();
        self.state = state;
        self.trivially_unsat = refuted;
        self.stack.clear();
        self.cursor = 1;
        self.stats = SolutionStats::default();
        Ok(())
    }

    fn solve(&mut self) -> Result<SolveResult, SolverError> {
        let result = self.search();
        self.report();
        tracing::info!(
            result = %result,
            conflicts = self.stats.conflicts,
            decisions = self.stats.decisions,
            "search finished"
        );
        Ok(result)
    }

    fn stats(&self) -> SolutionStats {
        SolutionStats {
            propagations: self.state.propagations,
            ..self.stats
        }
    }

    fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancel = Some(token);
    }

    fn set_observer(&mut self, observer: Box<dyn ProgressObserver + Send>) {
        self.observer = Some(observer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(cnf: &Cnf) -> (SolveResult, SolutionStats) {
        let mut solver = Dpll::new(SolverConfig::default());
        solver.fetch_problem(cnf).unwrap();
        let result = solver.solve().unwrap();
        (result, solver.stats())
    }

    #[test]
    fn test_solve_sat() {
        let cnf = Cnf::new(vec![vec![1, 2, 3], vec![-3, 1], vec![-2, -1], vec![1, -2, 3]]);
        let (result, _) = solve(&cnf);
        assert!(cnf.verify(result.model().unwrap()));
    }

    #[test]
    fn test_solve_unsat() {
        let cnf = Cnf::new(vec![
            vec![1, 2],
            vec![-1, -2],
            vec![2, 3],
            vec![-2, -3],
            vec![1, 3],
            vec![-1, -3],
        ]);
        let (result, stats) = solve(&cnf);
        assert_eq!(result, SolveResult::Unsatisfiable);
        assert!(stats.conflicts >= 2);
    }

    #[test]
    fn test_positive_first() {
        let cnf = Cnf::with_vars(3, vec![vec![-1, -2], vec![2, 3]]);
        let (result, stats) = solve(&cnf);
        assert_eq!(result, SolveResult::Satisfiable(vec![true, false, true]));
        assert_eq!(stats.decisions, 1);
        assert_eq!(stats.conflicts, 0);
    }

    #[test]
    fn test_flip_after_conflict() {
        // x1 = true forces both x2 and -x2
        let cnf = Cnf::new(vec![vec![-1, 2], vec![-1, -2], vec![1, 3]]);
        let (result, stats) = solve(&cnf);
        assert_eq!(result, SolveResult::Satisfiable(vec![false, true, true]));
        assert_eq!(stats.conflicts, 1);
    }

    #[test]
    fn test_conflicting_units() {
        let cnf = Cnf::new(vec![vec![1], vec![-1]]);
        let (result, stats) = solve(&cnf);
        assert_eq!(result, SolveResult::Unsatisfiable);
        assert_eq!(stats.decisions, 0);
    }

    #[test]
    fn test_cancelled() {
        let mut solver = Dpll::new(SolverConfig::default());
        solver
            .fetch_problem(&Cnf::new(vec![vec![1, 2], vec![-1, 2]]))
            .unwrap();
        let token = CancellationToken::new();
        solver.set_cancellation(token.clone());
        token.cancel();
        assert_eq!(solver.solve().unwrap(), SolveResult::Interrupted);
    }
}
