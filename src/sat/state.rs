#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Search state shared by the CDCL and DPLL engines.
//!
//! `SearchState` bundles the clause arena, the variable table, the trail, the watch lists
//! and the propagation queue. Literals are assigned as soon as they are enqueued, so a
//! queued literal is already visible as true to every clause inspected afterwards.

use crate::sat::assignment::Assignment;
use crate::sat::clause_storage::{ClauseDb, ClauseId};
use crate::sat::literal::{Literal, Variable};
use crate::sat::trail::Trail;
use crate::sat::watch::WatchedLiterals;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub vars: Assignment,
    pub db: ClauseDb,
    pub trail: Trail,
    pub watches: WatchedLiterals,
    /// Assigned literals whose watch lists have not been visited yet.
    pub queue: VecDeque<Literal>,
    /// Number of literals taken from the queue by propagation.
    pub propagations: usize,
}

impl SearchState {
    #[must_use]
    pub fn new(num_vars: usize, num_clauses: usize) -> Self {
        Self {
            vars: Assignment::new(num_vars),
            db: ClauseDb::with_capacity(num_clauses),
            trail: Trail::new(num_vars),
            watches: WatchedLiterals::new(num_vars),
            queue: VecDeque::with_capacity(num_vars),
            propagations: 0,
        }
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.vars.num_vars()
    }

    #[must_use]
    pub fn decision_level(&self) -> u32 {
        self.trail.decision_level()
    }

    /// Stores a clause and, if it has at least two literals, watches positions 0 and 1.
    pub fn add_clause(&mut self, literals: &[Literal], learned: bool) -> ClauseId {
        let id = self.db.add_clause(literals, learned);
        self.watches.install(id, &self.db[id]);
        id
    }

    /// Unwatches and frees a clause. The id lists of the arena are left to the caller.
    pub fn remove_clause(&mut self, id: ClauseId) {
        if let Some(clause) = self.db.get(id) {
            self.watches.remove(id, clause);
        }
        self.db.remove(id);
    }

    /// Makes `lit` true at the current level and queues it for propagation.
    pub fn assign(&mut self, lit: Literal, reason: Option<ClauseId>) {
        let level = self.trail.decision_level();
        let pos = self.trail.push(lit, reason);
        self.vars.assign(lit, level, pos);
        self.queue.push_back(lit);
    }

    /// Opens a new decision level and assigns `lit` as its decision.
    pub fn decide(&mut self, lit: Literal) {
        self.trail.new_level();
        self.assign(lit, None);
    }

    /// Unassigns every variable above `level`, newest first, reporting each to `on_unassign`.
    pub fn backtrack(&mut self, level: u32, mut on_unassign: impl FnMut(Variable)) {
        for step in self.trail.truncate_to_level(level).rev() {
            let var = step.lit.variable();
            self.vars.unassign(var);
            on_unassign(var);
        }
        self.queue.clear();
    }

    /// Whether `id` is the recorded antecedent of one of its two watched literals.
    #[must_use]
    pub fn is_locked(&self, id: ClauseId) -> bool {
        let Some(clause) = self.db.get(id) else {
            return false;
        };
        clause.iter().take(2).any(|&lit| {
            self.vars.is_true(lit)
                && self.trail.reason_at(self.vars.trail_pos(lit.variable()) as usize) == Some(id)
        })
    }

    /// Checks that every watched clause sits in exactly the buckets of its two watches, and
    /// that no clause has a false watch unless its other watch is true.
    ///
    /// Only meaningful while the propagation queue is empty.
    #[must_use]
    pub fn check_watch_invariant(&self) -> bool {
        self.db.iter().filter(|(_, c)| c.len() >= 2).all(|(id, clause)| {
            let (a, b) = (clause[0], clause[1]);
            let placed = self.watches[!a].contains(&id)
                && self.watches[!b].contains(&id)
                && self.watches.occurrences(id) == 2;
            let a_ok = !self.vars.is_false(a) || self.vars.is_true(b);
            let b_ok = !self.vars.is_false(b) || self.vars.is_true(a);
            placed && a_ok && b_ok
        })
    }

    /// Whether every variable above `level` is unassigned and the trail ends at the start of
    /// level `level + 1`.
    #[must_use]
    pub fn check_backtrack(&self, level: u32, expected_len: usize) -> bool {
        self.trail.len() == expected_len
            && self.trail.decision_level() == level
            && (1..=self.num_vars())
                .filter_map(|v| u32::try_from(v).ok())
                .all(|v| !self.vars.is_assigned(v) || self.vars.level(v) <= level)
    }
}
