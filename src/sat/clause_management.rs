#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Learned clause scoring and database reduction.
//!
//! Learned clauses are scored like variables: every clause met during conflict analysis
//! gains the current increment, and the increment grows geometrically after each conflict
//! so that recent activity outweighs old activity without an explicit decay pass.
//!
//! A reduction sorts the learned clauses by score and drops the lower half together with
//! any clause in the upper half scoring below `increment / learned_count`. Binary clauses
//! and clauses currently justifying an assignment are always kept.

use crate::sat::clause_storage::{ClauseDb, ClauseId};
use crate::sat::config::SolverConfig;
use crate::sat::literal::Literal;
use crate::sat::restarter::SearchBudget;
use crate::sat::state::SearchState;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashSet;

/// Geometric clause score increment.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseActivity {
    inc: f64,
    growth: f64,
    limit: f64,
    rescale: f64,
}

impl Default for ClauseActivity {
    fn default() -> Self {
        Self::new(&SolverConfig::default())
    }
}

impl ClauseActivity {
    #[must_use]
    pub const fn new(config: &SolverConfig) -> Self {
        Self {
            inc: 1.0,
            growth: config.clause_score_growth,
            limit: config.clause_score_limit,
            rescale: config.clause_score_rescale,
        }
    }

    /// Current increment; also the starting score of a new learned clause.
    #[must_use]
    pub const fn increment(&self) -> f64 {
        self.inc
    }

    /// Adds the increment to the score of `id`, rescaling every learned clause once the
    /// score reaches the limit.
    pub fn bump(&mut self, db: &mut ClauseDb, id: ClauseId) {
        let Some(clause) = db.get_mut(id) else {
            return;
        };
        clause.bump_score(self.inc);
        if clause.score >= self.limit {
            self.rescale_all(db);
        }
    }

    /// Grows the increment; called once per analysed conflict.
    pub fn grow(&mut self) {
        self.inc *= self.growth;
    }

    fn rescale_all(&mut self, db: &mut ClauseDb) {
        for i in 0..db.learned.len() {
            let id = db.learned[i];
            if let Some(clause) = db.get_mut(id) {
                clause.score *= self.rescale;
            }
        }
        self.inc *= self.rescale;
    }
}

/// Whether the learned clause database has outgrown `budget`.
#[must_use]
pub fn should_reduce(budget: &SearchBudget, trail_len: usize, learned: usize) -> bool {
    budget
        .max_learned
        .checked_sub(trail_len)
        .is_some_and(|room| room <= learned)
}

/// Removes low scoring learned clauses. Returns the number of clauses removed.
#[allow(clippy::cast_precision_loss)]
pub fn reduce_learned(state: &mut SearchState, score_inc: f64) -> usize {
    if state.db.learned.is_empty() {
        return 0;
    }

    let mut learned = std::mem::take(&mut state.db.learned);
    learned.sort_by_key(|&id| OrderedFloat(state.db[id].score));

    let half = learned.len() / 2;
    let limit = score_inc / learned.len() as f64;

    let mut removed = FxHashSet::default();
    let mut touched: Vec<Literal> = Vec::new();
    let mut kept = Vec::with_capacity(learned.len());

    for (i, id) in learned.into_iter().enumerate() {
        let clause = &state.db[id];
        let removable =
            clause.len() > 2 && !state.is_locked(id) && (i < half || clause.score < limit);
        if removable {
            touched.push(!clause[0]);
            touched.push(!clause[1]);
            removed.insert(id);
        } else {
            kept.push(id);
        }
    }

    touched.sort_unstable();
    touched.dedup();
    state.watches.remove_all(&removed, &touched);
    for &id in &removed {
        state.db.remove(id);
    }
    state.db.learned = kept;

    tracing::debug!(
        removed = removed.len(),
        kept = state.db.learned.len(),
        "reduced learned clauses"
    );
    removed.len()
}
