#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! First-UIP conflict analysis with recursive clause minimization.
//!
//! Starting from the conflicting clause, every unmarked variable is marked (and its activity
//! bumped). Literals from lower levels go straight into the learned clause; literals of the
//! current level are counted. The trail is then walked backwards to the most recent marked
//! variable: while more than one current-level literal is pending, its reason is resolved
//! in; the last one is the first unique implication point, whose negation asserts the
//! learned clause after backjumping.
//!
//! Level-0 literals are permanent and never enter a learned clause.
//!
//! Minimization removes a literal when every path through its implication graph ends in
//! marked variables or in variables whose level already occurs in the learned clause. The
//! set of levels is a bitset indexed by level, so arbitrarily deep searches are handled.

use crate::sat::clause_management::ClauseActivity;
use crate::sat::clause_storage::ClauseId;
use crate::sat::config::SolverConfig;
use crate::sat::error::SolverError;
use crate::sat::literal::{Literal, Variable};
use crate::sat::state::SearchState;
use crate::sat::variable_selection::ActivityTable;
use bit_vec::BitVec;
use smallvec::SmallVec;

/// An asserting clause produced by `ConflictAnalyser::analyse`.
///
/// For two or more literals, position 1 holds the UIP and position 0 a literal of the
/// backjump level, so the clause is correctly watched once the UIP is asserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedClause {
    pub literals: SmallVec<[Literal; 8]>,
    pub uip: Literal,
    pub backjump_level: u32,
    /// Literals dropped by minimization.
    pub removed: usize,
}

impl LearnedClause {
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }
}

/// Scratch state and variable score increment for conflict analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictAnalyser {
    var_inc: f64,
    var_growth: f64,
    var_limit: f64,
    var_rescale: f64,
    /// Variables marked during the current analysis.
    marked: Vec<Variable>,
    levels: BitVec,
    stack: Vec<Variable>,
    /// Literals removed by minimization so far.
    pub removed_literals: usize,
}

impl Default for ConflictAnalyser {
    fn default() -> Self {
        Self::new(&SolverConfig::default())
    }
}

impl ConflictAnalyser {
    #[must_use]
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            var_inc: 1.0,
            var_growth: config.var_score_growth,
            var_limit: config.var_score_limit,
            var_rescale: config.var_score_rescale,
            marked: Vec::new(),
            levels: BitVec::new(),
            stack: Vec::new(),
            removed_literals: 0,
        }
    }

    #[must_use]
    pub const fn var_increment(&self) -> f64 {
        self.var_inc
    }

    /// Derives the first-UIP clause for `conflict` at the current decision level.
    ///
    /// Bumps every variable met and every learned clause resolved, then grows the variable
    /// score increment. The clause score increment is left to the caller, since the new
    /// clause starts with the increment in effect before it grows.
    ///
    /// # Errors
    ///
    /// `SolverError::InternalFault` if the walk leaves the current level with literals
    /// still pending, which means the implication graph is inconsistent.
    pub fn analyse(
        &mut self,
        state: &mut SearchState,
        conflict: ClauseId,
        activity: &mut ActivityTable,
        clauses: &mut ClauseActivity,
    ) -> Result<LearnedClause, SolverError> {
        let level = state.decision_level();
        let start = state.trail.level_start(level);
        let mut pos = state.trail.len();
        let mut lower: SmallVec<[Literal; 8]> = SmallVec::new();
        let mut pending = 0_usize;
        let mut reason = Some(conflict);
        let mut over_limit = false;

        let uip = loop {
            if let Some(cid) = reason {
                if state.db[cid].is_learned() {
                    clauses.bump(&mut state.db, cid);
                }
                for k in 0..state.db[cid].len() {
                    let lit = state.db[cid][k];
                    let var = lit.variable();
                    if state.vars.is_used(var) || state.vars.level(var) == 0 {
                        continue;
                    }
                    over_limit |= activity.bump(var, self.var_inc, self.var_limit);
                    state.vars.set_used(var, true);
                    self.marked.push(var);
                    if state.vars.level(var) < level {
                        lower.push(lit);
                    } else {
                        pending += 1;
                    }
                }
            }

            let step = loop {
                if pos <= start {
                    debug_assert!(false, "{pending} literals pending at level {level}");
                    self.clear_marks(state);
                    return Err(SolverError::InternalFault(format!(
                        "conflict analysis left level {level} with {pending} literals pending"
                    )));
                }
                pos -= 1;
                let step = state.trail[pos];
                if state.vars.is_used(step.lit.variable()) {
                    break step;
                }
            };

            if pending > 1 {
                pending -= 1;
                reason = step.reason;
            } else {
                break !step.lit;
            }
        };

        let removed = if lower.is_empty() {
            0
        } else {
            self.minimize(state, &mut lower, level)
        };
        self.removed_literals += removed;
        self.clear_marks(state);

        if over_limit {
            activity.rescale(self.var_rescale);
            self.var_inc *= self.var_rescale;
        }
        self.var_inc *= self.var_growth;

        let mut literals: SmallVec<[Literal; 8]> = SmallVec::with_capacity(lower.len() + 1);
        let backjump_level = match lower
            .iter()
            .enumerate()
            .max_by_key(|(_, lit)| state.vars.level(lit.variable()))
        {
            Some((max_idx, &max_lit)) => {
                literals.push(max_lit);
                literals.push(uip);
                literals.extend(
                    lower
                        .iter()
                        .enumerate()
                        .filter(|&(i, _)| i != max_idx)
                        .map(|(_, &l)| l),
                );
                state.vars.level(max_lit.variable())
            }
            None => {
                literals.push(uip);
                0
            }
        };

        tracing::trace!(
            size = literals.len(),
            backjump_level,
            removed,
            "learned clause"
        );

        Ok(LearnedClause {
            literals,
            uip,
            backjump_level,
            removed,
        })
    }

    /// Drops redundant literals from `lower`; returns how many were dropped.
    fn minimize(
        &mut self,
        state: &mut SearchState,
        lower: &mut SmallVec<[Literal; 8]>,
        level: u32,
    ) -> usize {
        self.levels.truncate(0);
        self.levels.grow(level as usize + 1, false);
        self.levels.set(level as usize, true);
        for lit in lower.iter() {
            self.levels.set(state.vars.level(lit.variable()) as usize, true);
        }

        let before = lower.len();
        let mut kept = 0;
        for i in 0..lower.len() {
            let lit = lower[i];
            if !self.is_redundant(state, lit.variable()) {
                lower[kept] = lit;
                kept += 1;
            }
        }
        lower.truncate(kept);
        before - kept
    }

    /// Depth-first search over the reasons of `var`. Variables marked by a successful
    /// search stay marked; a failed search unmarks them again.
    fn is_redundant(&mut self, state: &mut SearchState, var: Variable) -> bool {
        let checkpoint = self.marked.len();
        let mut redundant = true;
        self.stack.clear();
        self.stack.push(var);

        'search: while let Some(v) = self.stack.pop() {
            let reason = state.trail.reason_at(state.vars.trail_pos(v) as usize);
            let Some(cid) = reason else {
                if state.vars.level(v) == 0 {
                    continue;
                }
                redundant = false;
                break;
            };

            for &lit in state.db[cid].iter() {
                let v2 = lit.variable();
                let level2 = state.vars.level(v2);
                if state.vars.is_used(v2) || level2 == 0 {
                    continue;
                }
                if self.levels.get(level2 as usize) != Some(true) {
                    redundant = false;
                    break 'search;
                }
                state.vars.set_used(v2, true);
                self.marked.push(v2);
                self.stack.push(v2);
            }
        }

        if !redundant {
            self.unmark_from(state, checkpoint);
        }
        redundant
    }

    fn unmark_from(&mut self, state: &mut SearchState, checkpoint: usize) {
        for &v in &self.marked[checkpoint..] {
            state.vars.set_used(v, false);
        }
        self.marked.truncate(checkpoint);
    }

    fn clear_marks(&mut self, state: &mut SearchState) {
        self.unmark_from(state, 0);
    }
}
