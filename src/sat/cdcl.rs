#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Conflict-driven clause learning search.
//!
//! The loop alternates between propagation and decisions. A conflict is analysed into a
//! first-UIP clause, the search backjumps to the clause's assertion level and the UIP is
//! asserted there. Once the conflicts since the last restart exhaust the budget, the
//! conflict is dropped instead and the search restarts from level 0.
//!
//! Whenever the search is back at level 0 the formula is simplified: satisfied clauses are
//! deleted for good and variables that no longer occur anywhere are fixed to `true`.

use crate::sat::clause_management::{self, ClauseActivity, should_reduce};
use crate::sat::clause_storage::ClauseId;
use crate::sat::cnf::Cnf;
use crate::sat::config::SolverConfig;
use crate::sat::conflict_analysis::ConflictAnalyser;
use crate::sat::error::SolverError;
use crate::sat::literal::{Literal, Variable};
use crate::sat::progress::{CancellationToken, ProgressObserver, ProgressReport};
use crate::sat::restarter::{Restarter, RestarterImpls, SearchBudget};
use crate::sat::solver::{SolutionStats, SolveResult, Solver, import};
use crate::sat::state::SearchState;
use crate::sat::variable_selection::ActivityTable;
use bit_vec::BitVec;
use rustc_hash::FxHashSet;
use std::fmt::{Debug, Formatter};

pub struct Cdcl {
    config: SolverConfig,

    state: SearchState,

    activity: ActivityTable,

    analyser: ConflictAnalyser,

    clause_activity: ClauseActivity,

    restarter: RestarterImpls,

    budget: SearchBudget,

    stats: SolutionStats,

    /// Conflicts since the last restart, compared against `budget.max_conflicts`.
    since_restart: usize,

    /// Unassigned variables occurring in some clause, as of the last simplification.
    live_vars: usize,

    /// Set by `fetch_problem` when the input is refuted without search.
    trivially_unsat: bool,

    cancel: Option<CancellationToken>,

    observer: Option<Box<dyn ProgressObserver + Send>>,
}

impl Debug for Cdcl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cdcl")
            .field("config", &self.config)
            .field("num_vars", &self.state.num_vars())
            .field("decision_level", &self.state.decision_level())
            .field("budget", &self.budget)
            .field("stats", &self.stats)
            .field("live_vars", &self.live_vars)
            .finish_non_exhaustive()
    }
}

impl Cdcl {
    #[must_use]
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    #[must_use]
    pub const fn activity(&self) -> &ActivityTable {
        &self.activity
    }

    #[must_use]
    pub const fn budget(&self) -> SearchBudget {
        self.budget
    }

    #[must_use]
    pub const fn live_vars(&self) -> usize {
        self.live_vars
    }

    /// Backtracks to `level`, returning every variable above it to the decision table.
    pub fn undo_propagate(&mut self, level: u32) {
        let expected_len = if level < self.state.decision_level() {
            self.state.trail.level_start(level + 1)
        } else {
            self.state.trail.len()
        };
        let activity = &mut self.activity;
        self.state.backtrack(level, |var| activity.touch(var));
        debug_assert!(self.state.check_backtrack(level, expected_len));
    }

    /// Level-0 simplification. Returns `false` if the formula was refuted.
    ///
    /// Propagates pending units, deletes every satisfied clause, recounts the variables
    /// still occurring in some clause and fixes all other unassigned variables to `true`.
    pub fn simplify_formulae(&mut self) -> bool {
        debug_assert_eq!(self.state.decision_level(), 0);
        if self.state.propagate().is_err() {
            return false;
        }

        let deleted = self.remove_satisfied();

        for pos in 0..self.state.trail.len() {
            if let Some(id) = self.state.trail.reason_at(pos) {
                if !self.state.db.is_live(id) {
                    self.state.trail.clear_reason(pos);
                }
            }
        }

        let num_vars = self.state.num_vars();
        let mut live = BitVec::from_elem(num_vars + 1, false);
        for (_, clause) in self.state.db.iter() {
            for &lit in clause.iter() {
                if !self.state.vars.is_assigned(lit.variable()) {
                    live.set(lit.variable() as usize, true);
                }
            }
        }
        self.live_vars = live.iter().filter(|&b| b).count();

        let mut fixed = 0_usize;
        for var in 1..=num_vars {
            #[allow(clippy::cast_possible_truncation)]
            let var = var as Variable;
            if !live[var as usize] && !self.state.vars.is_assigned(var) {
                self.state.assign(Literal::positive(var), None);
                fixed += 1;
            }
        }
        // nothing watches a variable that occurs in no clause
        self.state.queue.clear();

        self.activity.resort();

        tracing::debug!(
            deleted,
            fixed,
            live_vars = self.live_vars,
            original = self.state.db.num_original(),
            learned = self.state.db.num_learned(),
            "simplified formula"
        );
        true
    }

    /// Deletes every original and learned clause containing a true literal.
    fn remove_satisfied(&mut self) -> usize {
        let original = std::mem::take(&mut self.state.db.original);
        let learned = std::mem::take(&mut self.state.db.learned);

        let vars = &self.state.vars;
        let db = &self.state.db;
        let satisfied = |id: &ClauseId| db[*id].iter().any(|&lit| vars.is_true(lit));
        let (gone_original, kept_original): (Vec<_>, Vec<_>) =
            original.into_iter().partition(satisfied);
        let (gone_learned, kept_learned): (Vec<_>, Vec<_>) =
            learned.into_iter().partition(satisfied);

        let mut removed = FxHashSet::default();
        let mut touched = Vec::new();
        for id in gone_original.into_iter().chain(gone_learned) {
            if let Some((a, b)) = self.state.db[id].watched() {
                touched.push(!a);
                touched.push(!b);
            }
            removed.insert(id);
        }
        touched.sort_unstable();
        touched.dedup();

        self.state.watches.remove_all(&removed, &touched);
        for &id in &removed {
            self.state.db.remove(id);
        }
        self.state.db.original = kept_original;
        self.state.db.learned = kept_learned;
        removed.len()
    }

    fn reduce_learned(&mut self) {
        let deleted =
            clause_management::reduce_learned(&mut self.state, self.clause_activity.increment());
        self.stats.reductions += 1;
        self.stats.deleted_clauses += deleted;
        self.restarter.on_reduce(&mut self.budget);
    }

    /// Abandons the current branch. Returns `false` if the formula was refuted.
    fn restart(&mut self) -> bool {
        self.undo_propagate(0);
        if !self.simplify_formulae() {
            return false;
        }
        self.since_restart = 0;
        self.stats.restarts += 1;
        self.restarter.on_restart(
            self.stats.restarts,
            self.state.db.num_original(),
            &mut self.budget,
        );
        tracing::debug!(
            restarts = self.stats.restarts,
            max_conflicts = self.budget.max_conflicts,
            max_learned = self.budget.max_learned,
            "restart"
        );
        self.report(true);
        true
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    #[must_use]
    pub fn progress(&self, restart: bool) -> ProgressReport {
        ProgressReport {
            restart,
            restarts: self.stats.restarts,
            decision_level: self.state.decision_level(),
            decisions: self.stats.decisions,
            conflicts: self.stats.conflicts,
            live_vars: self.live_vars,
            original_clauses: self.state.db.num_original(),
            original_literals: self.state.db.original_literals,
            learned_clauses: self.state.db.num_learned(),
            learned_literals: self.state.db.learned_literals,
            max_learned: self.budget.max_learned,
            max_conflicts: self.budget.max_conflicts,
        }
    }

    fn report(&mut self, restart: bool) {
        let report = self.progress(restart);
        if let Some(observer) = self.observer.as_mut() {
            observer.report(&report);
        }
    }

    fn finish(&mut self, result: SolveResult) -> SolveResult {
        self.report(false);
        tracing::info!(
            result = %result,
            conflicts = self.stats.conflicts,
            decisions = self.stats.decisions,
            restarts = self.stats.restarts,
            learned = self.stats.learned_clauses,
            "search finished"
        );
        result
    }

    fn model(&self) -> SolveResult {
        SolveResult::Satisfiable(self.state.vars.model())
    }

    fn search(&mut self) -> Result<SolveResult, SolverError> {
        if self.trivially_unsat || !self.simplify_formulae() {
            return Ok(SolveResult::Unsatisfiable);
        }
        self.budget = SearchBudget {
            max_conflicts: self.restarter.initial_conflicts(),
            max_learned: self
                .config
                .initial_max_learned(self.state.db.num_original()),
        };
        if self.state.vars.all_assigned() {
            return Ok(self.model());
        }

        loop {
            if self.is_cancelled() {
                return Ok(SolveResult::Interrupted);
            }

            let propagated = if self.state.decision_level() == 0 {
                Ok(())
            } else {
                self.state.propagate()
            };

            match propagated {
                Ok(()) => {
                    if should_reduce(
                        &self.budget,
                        self.state.trail.len(),
                        self.state.db.num_learned(),
                    ) {
                        self.reduce_learned();
                    }
                    if self.state.vars.all_assigned() {
                        return Ok(self.model());
                    }

                    debug_assert!(self.activity.is_consistent());
                    let Some(lit) = self.activity.next_literal(&self.state.vars) else {
                        return Err(SolverError::InternalFault(
                            "no unassigned variable left in the decision table".to_string(),
                        ));
                    };
                    self.state.decide(lit);
                    self.stats.decisions += 1;
                    if self.config.progress_interval > 0
                        && self.stats.decisions % self.config.progress_interval == 0
                    {
                        self.report(false);
                    }
                }
                Err(conflict) => {
                    self.stats.conflicts += 1;
                    self.since_restart += 1;
                    if self.state.decision_level() == 0 {
                        return Ok(SolveResult::Unsatisfiable);
                    }

                    if self.since_restart < self.budget.max_conflicts {
                        let learned = self.analyser.analyse(
                            &mut self.state,
                            conflict,
                            &mut self.activity,
                            &mut self.clause_activity,
                        )?;
                        self.undo_propagate(learned.backjump_level);

                        let reason = if learned.is_unit() {
                            None
                        } else {
                            let id = self.state.add_clause(&learned.literals, true);
                            self.state.db[id].score = self.clause_activity.increment();
                            Some(id)
                        };
                        self.stats.learned_clauses += 1;
                        self.clause_activity.grow();
                        self.state.assign(learned.uip, reason);

                        if self.state.decision_level() == 0 {
                            if !self.simplify_formulae() {
                                return Ok(SolveResult::Unsatisfiable);
                            }
                            if self.state.vars.all_assigned() {
                                return Ok(self.model());
                            }
                        }
                    } else {
                        if !self.restart() {
                            return Ok(SolveResult::Unsatisfiable);
                        }
                        if self.state.vars.all_assigned() {
                            return Ok(self.model());
                        }
                    }
                }
            }
        }
    }
}

impl Solver for Cdcl {
    fn new(config: SolverConfig) -> Self {
        Self {
            state: SearchState::default(),
            activity: ActivityTable::default(),
            analyser: ConflictAnalyser::new(&config),
            clause_activity: ClauseActivity::new(&config),
            restarter: config.restart_strategy.to_impl(&config),
            budget: SearchBudget::default(),
            stats: SolutionStats::default(),
            since_restart: 0,
            live_vars: 0,
            trivially_unsat: false,
            cancel: None,
            observer: None,
            config,
        }
    }

    fn fetch_problem(&mut self, cnf: &Cnf) -> Result<(), SolverError> {
        let problem = import(cnf)?;

        let (state, refuted) = problem.load();
        self.state = state;
        self.activity = ActivityTable::from_occurrences(
            problem.num_vars,
            problem.clauses.iter().flatten().map(|lit| lit.variable()),
        );
        self.analyser = ConflictAnalyser::new(&self.config);
        self.clause_activity = ClauseActivity::new(&self.config);
        self.restarter = self.config.restart_strategy.to_impl(&self.config);
        self.budget = SearchBudget::default();
        self.stats = SolutionStats::default();
        self.since_restart = 0;
        self.live_vars = problem.num_vars;
        self.trivially_unsat = refuted;

        tracing::debug!(
            vars = problem.num_vars,
            clauses = self.state.db.num_original(),
            literals = self.state.db.original_literals,
            trivially_unsat = self.trivially_unsat,
            "problem loaded"
        );
        Ok(())
    }

    fn solve(&mut self) -> Result<SolveResult, SolverError> {
        let result = self.search()?;
        Ok(self.finish(result))
    }

    fn stats(&self) -> SolutionStats {
        SolutionStats {
            propagations: self.state.propagations,
            removed_literals: self.analyser.removed_literals,
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
    use crate::sat::restarter::RestartStrategy;
    use std::sync::mpsc;

    fn solve_with(config: SolverConfig, cnf: &Cnf) -> (SolveResult, SolutionStats) {
        let mut solver = Cdcl::new(config);
        solver.fetch_problem(cnf).unwrap();
        let result = solver.solve().unwrap();
        (result, solver.stats())
    }

    fn solve(cnf: &Cnf) -> (SolveResult, SolutionStats) {
        solve_with(SolverConfig::default(), cnf)
    }

    /// `n + 1` pigeons in `n` holes; variable `p * n + h + 1` puts pigeon `p` in hole `h`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn pigeonhole(n: usize) -> Cnf {
        let var = |p: usize, h: usize| (p * n + h + 1) as i32;
        let mut clauses = Vec::new();
        for p in 0..=n {
            clauses.push((0..n).map(|h| var(p, h)).collect::<Vec<_>>());
        }
        for h in 0..n {
            for p in 0..=n {
                for q in p + 1..=n {
                    clauses.push(vec![-var(p, h), -var(q, h)]);
                }
            }
        }
        Cnf::with_vars((n + 1) * n, clauses)
    }

    #[test]
    fn test_solve_sat() {
        let cnf = Cnf::new(vec![vec![1, 2, 3], vec![-3, 1], vec![-2, -1], vec![1, -2, 3]]);
        let (result, _) = solve(&cnf);
        assert!(cnf.verify(result.model().unwrap()));
    }

    #[test]
    fn test_solve_unsat() {
        let cnf = Cnf::new(vec![vec![1], vec![-1]]);
        let (result, stats) = solve(&cnf);
        assert_eq!(result, SolveResult::Unsatisfiable);
        assert_eq!(stats.decisions, 0);
        assert_eq!(stats.learned_clauses, 0);
    }

    #[test]
    fn test_unit_chain_needs_no_decision() {
        let cnf = Cnf::new(vec![vec![1], vec![-1, 2], vec![-2, 3]]);
        let (result, stats) = solve(&cnf);
        assert_eq!(result, SolveResult::Satisfiable(vec![true, true, true]));
        assert_eq!(stats.decisions, 0);
    }

    #[test]
    fn test_empty_clause_is_unsat() {
        let cnf = Cnf::with_vars(2, vec![vec![1, 2], vec![]]);
        assert_eq!(solve(&cnf).0, SolveResult::Unsatisfiable);
    }

    #[test]
    fn test_empty_formula_is_sat() {
        let cnf = Cnf::with_vars(3, vec![]);
        assert_eq!(solve(&cnf).0, SolveResult::Satisfiable(vec![true; 3]));
    }

    #[test]
    fn test_odd_cycle_learns() {
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
        assert!(stats.conflicts >= 1);
        assert!(stats.learned_clauses >= 1);
    }

    #[test]
    fn test_pigeonhole_all_strategies() {
        let cnf = pigeonhole(5);
        for strategy in [
            RestartStrategy::Minisat,
            RestartStrategy::Rsat,
            RestartStrategy::Picosat,
        ] {
            let config = SolverConfig::default()
                .with_restart_strategy(strategy)
                .with_learn_start(20);
            let (result, stats) = solve_with(config, &cnf);
            assert_eq!(result, SolveResult::Unsatisfiable, "{strategy}");
            assert!(stats.learned_clauses > 0);
        }
    }

    #[test]
    fn test_restarts_and_reductions_happen() {
        let config = SolverConfig {
            initial_conflicts: 2,
            learn_start: 40,
            ..SolverConfig::default()
        };
        let (result, stats) = solve_with(config, &pigeonhole(5));
        assert_eq!(result, SolveResult::Unsatisfiable);
        assert!(stats.restarts > 0);
        assert!(stats.reductions > 0);
    }

    #[test]
    fn test_simplify_fixes_unused_variables() {
        let cnf = Cnf::with_vars(4, vec![vec![1], vec![-1, 2], vec![2, 3, -4]]);
        let mut solver = Cdcl::new(SolverConfig::default());
        solver.fetch_problem(&cnf).unwrap();
        assert!(solver.simplify_formulae());
        assert_eq!(solver.state().db.num_original(), 0);
        assert_eq!(solver.live_vars(), 0);
        assert!(solver.state().vars.all_assigned());
        assert_eq!(solver.state().vars.model(), vec![true, true, true, true]);
    }

    #[test]
    fn test_undo_propagate() {
        let cnf = Cnf::new(vec![vec![-1, 2], vec![-3, 4], vec![2, 4, 5]]);
        let mut solver = Cdcl::new(SolverConfig::default());
        solver.fetch_problem(&cnf).unwrap();
        assert!(solver.simplify_formulae());

        solver.state.decide(Literal::from(1));
        assert_eq!(solver.state.propagate(), Ok(()));
        let boundary = solver.state.trail.len();
        solver.state.decide(Literal::from(3));
        assert_eq!(solver.state.propagate(), Ok(()));

        solver.undo_propagate(1);
        assert!(solver.state().check_backtrack(1, boundary));
        assert!(solver.state().vars.is_assigned(2));
        assert!(!solver.state().vars.is_assigned(4));
        assert!(solver.activity.next_decision(&solver.state.vars).is_some());
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut solver = Cdcl::new(SolverConfig::default());
        solver.fetch_problem(&pigeonhole(6)).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        solver.set_cancellation(token);
        assert_eq!(solver.solve().unwrap(), SolveResult::Interrupted);
    }

    #[test]
    fn test_progress_reports() {
        let (tx, rx) = mpsc::channel();
        let config = SolverConfig {
            initial_conflicts: 2,
            ..SolverConfig::default()
        };
        let mut solver = Cdcl::new(config);
        solver.fetch_problem(&pigeonhole(4)).unwrap();
        solver.set_observer(Box::new(tx));
        assert_eq!(solver.solve().unwrap(), SolveResult::Unsatisfiable);

        let reports: Vec<_> = rx.try_iter().collect();
        assert!(reports.iter().any(|r| r.restart));
        assert_eq!(reports.last().map(|r| r.restart), Some(false));
    }

    #[test]
    fn test_decision_progress_interval() {
        let (tx, rx) = mpsc::channel();
        let config = SolverConfig {
            progress_interval: 4,
            ..SolverConfig::default()
        };
        let mut solver = Cdcl::new(config);
        solver.fetch_problem(&pigeonhole(4)).unwrap();
        solver.set_observer(Box::new(tx));
        assert_eq!(solver.solve().unwrap(), SolveResult::Unsatisfiable);
        let decisions = solver.stats().decisions;
        assert!(decisions >= 8);

        let mut reports: Vec<_> = rx.try_iter().collect();
        let last = reports.pop().unwrap();
        assert!(!last.restart);
        assert_eq!(last.decisions, decisions);

        let periodic: Vec<_> = reports.iter().filter(|r| !r.restart).collect();
        assert_eq!(periodic.len(), decisions / 4);
        assert!(periodic.iter().all(|r| r.decisions % 4 == 0 && r.decisions > 0));
        assert!(periodic.windows(2).all(|w| w[0].decisions < w[1].decisions));
    }

    #[test]
    fn test_tiny_conflict_budgets_still_learn() {
        let cnf = Cnf::new(vec![
            vec![1, 2],
            vec![-1, -2],
            vec![2, 3],
            vec![-2, -3],
            vec![1, 3],
            vec![-1, -3],
        ]);
        for initial in [0, 1] {
            for strategy in [
                RestartStrategy::Minisat,
                RestartStrategy::Rsat,
                RestartStrategy::Picosat,
            ] {
                let config = SolverConfig {
                    initial_conflicts: initial,
                    picosat_initial_conflicts: initial,
                    ..SolverConfig::default().with_restart_strategy(strategy)
                };
                let (result, stats) = solve_with(config, &cnf);
                assert_eq!(result, SolveResult::Unsatisfiable, "{strategy} from {initial}");
                assert!(stats.learned_clauses >= 1);
                assert!(stats.restarts <= 10, "{strategy} from {initial}: {stats:?}");
            }
        }
    }

    #[test]
    fn test_rejects_out_of_range_literal() {
        let mut solver = Cdcl::new(SolverConfig::default());
        let cnf = Cnf::with_vars(1, vec![vec![1, 2]]);
        assert!(matches!(
            solver.fetch_problem(&cnf),
            Err(SolverError::LiteralOutOfRange { literal: 2, .. })
        ));
    }
}
