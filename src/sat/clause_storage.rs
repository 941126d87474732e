#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Arena owning every clause of the formula, original and learned.
//!
//! Clauses are addressed by `ClauseId`. A freed slot is recycled by the next `add_clause`,
//! so an id must not be used after `remove` returned it.

use crate::sat::clause::Clause;
use crate::sat::literal::Literal;
use core::fmt;
use core::ops::{Index, IndexMut};

/// Opaque handle to a clause stored in a `ClauseDb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClauseId(u32);

impl ClauseId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClauseDb {
    slots: Vec<Option<Clause>>,
    free: Vec<ClauseId>,
    /// Live original clauses, in input order.
    pub original: Vec<ClauseId>,
    /// Live learned clauses, in creation order (until a reduction sorts them by score).
    pub learned: Vec<ClauseId>,
    pub original_literals: usize,
    pub learned_literals: usize,
}

impl ClauseDb {
    #[must_use]
    pub fn with_capacity(clauses: usize) -> Self {
        Self {
            slots: Vec::with_capacity(clauses),
            original: Vec::with_capacity(clauses),
            ..Self::default()
        }
    }

    /// Copies `literals` into a new clause record and registers it as original or learned.
    pub fn add_clause(&mut self, literals: &[Literal], learned: bool) -> ClauseId {
        let clause = Clause::new(literals, learned);
        let id = if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(clause);
            id
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let id = ClauseId(self.slots.len() as u32);
            self.slots.push(Some(clause));
            id
        };

        if learned {
            self.learned.push(id);
            self.learned_literals += literals.len();
        } else {
            self.original.push(id);
            self.original_literals += literals.len();
        }
        id
    }

    /// Frees the slot of `id` and returns the clause it held.
    ///
    /// The caller is responsible for dropping `id` from `original`/`learned` and from the
    /// watch lists; bulk removals compact those lists themselves.
    pub fn remove(&mut self, id: ClauseId) -> Option<Clause> {
        let clause = self.slots.get_mut(id.index())?.take()?;
        if clause.is_learned() {
            self.learned_literals -= clause.len();
        } else {
            self.original_literals -= clause.len();
        }
        self.free.push(id);
        Some(clause)
    }

    #[must_use]
    pub fn get(&self, id: ClauseId) -> Option<&Clause> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ClauseId) -> Option<&mut Clause> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    #[must_use]
    pub fn is_live(&self, id: ClauseId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn num_original(&self) -> usize {
        self.original.len()
    }

    #[must_use]
    pub fn num_learned(&self) -> usize {
        self.learned.len()
    }

    /// Iterates over every live clause.
    pub fn iter(&self) -> impl Iterator<Item = (ClauseId, &Clause)> {
        self.original
            .iter()
            .chain(self.learned.iter())
            .filter_map(|&id| self.get(id).map(|c| (id, c)))
    }
}

impl Index<ClauseId> for ClauseDb {
    type Output = Clause;

    fn index(&self, index: ClauseId) -> &Self::Output {
        self.slots[index.index()]
            .as_ref()
            .unwrap_or_else(|| panic!("clause {index} was already removed"))
    }
}

impl IndexMut<ClauseId> for ClauseDb {
    fn index_mut(&mut self, index: ClauseId) -> &mut Self::Output {
        self.slots[index.index()]
            .as_mut()
            .unwrap_or_else(|| panic!("clause {index} was already removed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(values: &[i32]) -> Vec<Literal> {
        values.iter().copied().map(Literal::from_i32).collect()
    }

    #[test]
    fn test_add_and_index() {
        let mut db = ClauseDb::default();
        let a = db.add_clause(&lits(&[1, -2]), false);
        let b = db.add_clause(&lits(&[2, 3, -4]), true);

        assert_eq!(db[a].len(), 2);
        assert!(db[b].is_learned());
        assert_eq!(db.num_original(), 1);
        assert_eq!(db.num_learned(), 1);
        assert_eq!(db.original_literals, 2);
        assert_eq!(db.learned_literals, 3);
    }

    #[test]
    fn test_remove_recycles_slot() {
        let mut db = ClauseDb::default();
        let a = db.add_clause(&lits(&[1, 2, 3]), true);
        db.learned.retain(|&id| id != a);
        let removed = db.remove(a).map(|c| c.len());

        assert_eq!(removed, Some(3));
        assert!(!db.is_live(a));
        assert_eq!(db.learned_literals, 0);
        assert!(db.remove(a).is_none());

        let b = db.add_clause(&lits(&[-1, 4]), false);
        assert_eq!(a, b);
        assert_eq!(db[b][1], Literal::from(4));
    }

    #[test]
    fn test_caller_copy_is_independent() {
        let mut db = ClauseDb::default();
        let mut input = lits(&[1, 2]);
        let id = db.add_clause(&input, false);
        input[0] = Literal::from(-9);

        assert_eq!(db[id][0], Literal::from(1));
    }
}
