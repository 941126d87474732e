#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The interface shared by every solver, and the result and statistics types it returns.
//!
//! A solver is created from a `SolverConfig`, loads a formula with `fetch_problem` (which
//! copies the clauses in) and is then run once with `solve`.

use crate::sat::cdcl::Cdcl;
use crate::sat::cnf::Cnf;
use crate::sat::config::SolverConfig;
use crate::sat::dpll::Dpll;
use crate::sat::error::SolverError;
use crate::sat::literal::Literal;
use crate::sat::progress::{CancellationToken, ProgressObserver};
use crate::sat::state::SearchState;
use clap::ValueEnum;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Outcome of a call to `Solver::solve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    /// A satisfying assignment; variable `i` is at index `i - 1`.
    Satisfiable(Vec<bool>),
    Unsatisfiable,
    /// The cancellation token was raised before a verdict was reached.
    Interrupted,
}

impl SolveResult {
    #[must_use]
    pub const fn is_sat(&self) -> bool {
        matches!(self, Self::Satisfiable(_))
    }

    #[must_use]
    pub const fn is_unsat(&self) -> bool {
        matches!(self, Self::Unsatisfiable)
    }

    #[must_use]
    pub fn model(&self) -> Option<&[bool]> {
        match self {
            Self::Satisfiable(model) => Some(model),
            _ => None,
        }
    }
}

impl Display for SolveResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Satisfiable(_) => write!(f, "SATISFIABLE"),
            Self::Unsatisfiable => write!(f, "UNSATISFIABLE"),
            Self::Interrupted => write!(f, "UNKNOWN"),
        }
    }
}

/// Counters collected during a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolutionStats {
    pub conflicts: usize,
    pub decisions: usize,
    pub propagations: usize,
    pub restarts: usize,
    pub learned_clauses: usize,
    /// Literals dropped from learned clauses by minimization.
    pub removed_literals: usize,
    /// Number of learned clause database reductions.
    pub reductions: usize,
    /// Learned clauses deleted by those reductions.
    pub deleted_clauses: usize,
}

/// Trait defining the interface for SAT solvers.
pub trait Solver {
    /// Creates an empty solver.
    fn new(config: SolverConfig) -> Self
    where
        Self: Sized;

    /// Copies `cnf` into the solver's own clause store.
    ///
    /// # Errors
    ///
    /// `SolverError::LiteralOutOfRange` if a clause mentions a variable outside
    /// `1..=cnf.num_vars`.
    fn fetch_problem(&mut self, cnf: &Cnf) -> Result<(), SolverError>;

    /// Runs the search to completion or until cancelled.
    ///
    /// # Errors
    ///
    /// `SolverError::InternalFault` if an internal consistency check fails.
    fn solve(&mut self) -> Result<SolveResult, SolverError>;

    fn stats(&self) -> SolutionStats;

    /// Installs a token polled once per search iteration.
    fn set_cancellation(&mut self, token: CancellationToken);

    /// Installs a receiver for periodic progress reports.
    fn set_observer(&mut self, observer: Box<dyn ProgressObserver + Send>);
}

/// A clause set ready to be loaded into a `SearchState`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ImportedProblem {
    pub num_vars: usize,
    pub clauses: Vec<Vec<Literal>>,
    /// The input contained a clause with no literals.
    pub has_empty_clause: bool,
}

/// Validates the literal range of `cnf` and removes repeated literals, keeping first
/// occurrences in order.
pub(crate) fn import(cnf: &Cnf) -> Result<ImportedProblem, SolverError> {
    let mut clauses = Vec::with_capacity(cnf.len());
    let mut has_empty_clause = false;

    for (index, clause) in cnf.iter().enumerate() {
        if let Some(&literal) = clause
            .iter()
            .find(|&&l| l == 0 || l.unsigned_abs() as usize > cnf.num_vars)
        {
            return Err(SolverError::LiteralOutOfRange {
                literal,
                clause: index,
                num_vars: cnf.num_vars,
            });
        }
        if clause.is_empty() {
            has_empty_clause = true;
            continue;
        }
        clauses.push(
            clause
                .iter()
                .unique()
                .map(|&l| Literal::from_i32(l))
                .collect_vec(),
        );
    }

    Ok(ImportedProblem {
        num_vars: cnf.num_vars,
        clauses,
        has_empty_clause,
    })
}

impl ImportedProblem {
    /// Builds a search state holding every clause, with unit clauses assigned at level 0.
    ///
    /// The flag is set when the problem is refuted without search: it contains an empty
    /// clause or two complementary unit clauses.
    pub fn load(&self) -> (SearchState, bool) {
        let mut state = SearchState::new(self.num_vars, self.clauses.len());
        let mut refuted = self.has_empty_clause;
        for clause in &self.clauses {
            state.add_clause(clause, false);
            if let [unit] = clause.as_slice() {
                if state.vars.is_false(*unit) {
                    refuted = true;
                } else if !state.vars.is_true(*unit) {
                    state.assign(*unit, None);
                }
            }
        }
        (state, refuted)
    }
}

/// Enum representing the search algorithm to use.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum SolverType {
    /// Conflict-driven clause learning.
    #[default]
    Cdcl,
    /// Chronological backtracking with unit propagation.
    Dpll,
}

impl Display for SolverType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cdcl => write!(f, "cdcl"),
            Self::Dpll => write!(f, "dpll"),
        }
    }
}

impl SolverType {
    #[must_use]
    pub fn to_impl(self, config: SolverConfig) -> SolverImpls {
        match self {
            Self::Cdcl => SolverImpls::Cdcl(Box::new(Cdcl::new(config))),
            Self::Dpll => SolverImpls::Dpll(Box::new(Dpll::new(config))),
        }
    }
}

/// Static dispatch over the available solvers.
#[derive(Debug)]
pub enum SolverImpls {
    Cdcl(Box<Cdcl>),
    Dpll(Box<Dpll>),
}

impl Solver for SolverImpls {
    fn new(config: SolverConfig) -> Self {
        Self::Cdcl(Box::new(Cdcl::new(config)))
    }

    fn fetch_problem(&mut self, cnf: &Cnf) -> Result<(), SolverError> {
        match self {
            Self::Cdcl(s) => s.fetch_problem(cnf),
            Self::Dpll(s) => s.fetch_problem(cnf),
        }
    }

    fn solve(&mut self) -> Result<SolveResult, SolverError> {
        match self {
            Self::Cdcl(s) => s.solve(),
            Self::Dpll(s) => s.solve(),
        }
    }

    fn stats(&self) -> SolutionStats {
        match self {
            Self::Cdcl(s) => s.stats(),
            Self::Dpll(s) => s.stats(),
        }
    }

    fn set_cancellation(&mut self, token: CancellationToken) {
        match self {
            Self::Cdcl(s) => s.set_cancellation(token),
            Self::Dpll(s) => s.set_cancellation(token),
        }
    }

    fn set_observer(&mut self, observer: Box<dyn ProgressObserver + Send>) {
        match self {
            Self::Cdcl(s) => s.set_observer(observer),
            Self::Dpll(s) => s.set_observer(observer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_dedupes_in_order() {
        let cnf = Cnf::new(vec![vec![2, -1, 2, 3, -1]]);
        let problem = import(&cnf).unwrap();
        let lits: Vec<i32> = problem.clauses[0].iter().map(|l| l.to_i32()).collect();
        assert_eq!(lits, vec![2, -1, 3]);
        assert!(!problem.has_empty_clause);
    }

    #[test]
    fn test_import_rejects_out_of_range() {
        let cnf = Cnf::with_vars(2, vec![vec![1, 2], vec![-3]]);
        assert_eq!(
            import(&cnf).unwrap_err(),
            SolverError::LiteralOutOfRange {
                literal: -3,
                clause: 1,
                num_vars: 2
            }
        );
    }

    #[test]
    fn test_import_flags_empty_clause() {
        let cnf = Cnf::with_vars(1, vec![vec![1], vec![]]);
        let problem = import(&cnf).unwrap();
        assert!(problem.has_empty_clause);
        assert_eq!(problem.clauses.len(), 1);
        assert!(problem.load().1);
    }

    #[test]
    fn test_load_assigns_units() {
        let cnf = Cnf::new(vec![vec![1], vec![-2], vec![1, 2, 3]]);
        let (state, refuted) = import(&cnf).unwrap().load();
        assert!(!refuted);
        assert_eq!(state.trail.len(), 2);
        assert_eq!(state.queue.len(), 2);
        assert_eq!(state.db.num_original(), 3);

        let cnf = Cnf::new(vec![vec![1], vec![2], vec![-1]]);
        assert!(import(&cnf).unwrap().load().1);
    }

    #[test]
    fn test_result_display() {
        assert_eq!(SolveResult::Satisfiable(vec![]).to_string(), "SATISFIABLE");
        assert_eq!(SolveResult::Unsatisfiable.to_string(), "UNSATISFIABLE");
        assert_eq!(SolveResult::Interrupted.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_solver_impls_dispatch() {
        let cnf = Cnf::new(vec![vec![1, 2], vec![-1], vec![-2, 3]]);
        for solver_type in SolverType::value_variants() {
            let mut solver = solver_type.to_impl(SolverConfig::default());
            solver.fetch_problem(&cnf).unwrap();
            let result = solver.solve().unwrap();
            assert!(cnf.verify(result.model().unwrap()), "{solver_type}");
        }
    }
}
