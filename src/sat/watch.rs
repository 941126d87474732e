#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Watch lists for two-watched-literal propagation.
//!
//! The bucket of literal `l` holds the clauses watching `¬l`, i.e. the clauses that have
//! to be revisited once `l` becomes true. A clause of two or more literals sits in exactly
//! two buckets: those of the negations of its literals at positions 0 and 1.

use crate::sat::clause::Clause;
use crate::sat::clause_storage::ClauseId;
use crate::sat::literal::Literal;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

pub type WatchList = SmallVec<[ClauseId; 6]>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchedLiterals(Vec<WatchList>);

impl WatchedLiterals {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![WatchList::new(); 2 * (num_vars + 1)])
    }

    /// Registers `clause` under its two watched literals.
    pub fn install(&mut self, id: ClauseId, clause: &Clause) {
        if let Some((a, b)) = clause.watched() {
            debug_assert_ne!(a, b, "clause {id} watches the same literal twice");
            self[!a].push(id);
            self[!b].push(id);
        }
    }

    /// Moves the watch of `id` onto `lit`.
    pub fn watch(&mut self, id: ClauseId, lit: Literal) {
        self[!lit].push(id);
    }

    /// Drops `id` from the buckets of its two watched literals.
    pub fn remove(&mut self, id: ClauseId, clause: &Clause) {
        if let Some((a, b)) = clause.watched() {
            self[!a].retain(|c| *c != id);
            self[!b].retain(|c| *c != id);
        }
    }

    /// Drops every clause in `removed` from the buckets listed in `touched`.
    pub fn remove_all(&mut self, removed: &FxHashSet<ClauseId>, touched: &[Literal]) {
        if removed.is_empty() {
            return;
        }
        for &lit in touched {
            self[lit].retain(|c| !removed.contains(c));
        }
    }

    /// Takes the bucket of `lit` out for in-place compaction during propagation.
    pub fn take(&mut self, lit: Literal) -> WatchList {
        std::mem::take(&mut self[lit])
    }

    /// Puts a compacted bucket back. Watches added to `lit` in the meantime are kept.
    pub fn restore(&mut self, lit: Literal, mut list: WatchList) {
        let bucket = &mut self[lit];
        if !bucket.is_empty() {
            list.extend(bucket.drain(..));
        }
        *bucket = list;
    }

    /// Number of buckets containing `id`.
    #[must_use]
    pub fn occurrences(&self, id: ClauseId) -> usize {
        self.0
            .iter()
            .map(|bucket| bucket.iter().filter(|&&c| c == id).count())
            .sum()
    }
}

impl Index<Literal> for WatchedLiterals {
    type Output = WatchList;

    fn index(&self, index: Literal) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl IndexMut<Literal> for WatchedLiterals {
    fn index_mut(&mut self, index: Literal) -> &mut Self::Output {
        &mut self.0[index.index()]
    }
}
