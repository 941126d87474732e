#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A single clause record.
//!
//! For clauses of two or more literals, positions 0 and 1 hold the two watched literals.
//! Propagation only ever reorders literals; it never adds or drops them.

use crate::sat::literal::Literal;
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;

/// Inline storage used for clause literals.
pub type ClauseLiterals = SmallVec<[Literal; 8]>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Clause {
    pub literals: ClauseLiterals,
    learned: bool,
    /// Activity score; only meaningful for learned clauses.
    pub score: f64,
}

impl Clause {
    #[must_use]
    pub fn new(literals: &[Literal], learned: bool) -> Self {
        Self {
            literals: SmallVec::from_slice(literals),
            learned,
            score: 0.0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    #[must_use]
    pub const fn is_learned(&self) -> bool {
        self.learned
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    pub fn swap(&mut self, i: usize, j: usize) {
        self.literals.swap(i, j);
    }

    /// The two watched literals, if the clause is long enough to be watched.
    #[must_use]
    pub fn watched(&self) -> Option<(Literal, Literal)> {
        (self.len() >= 2).then(|| (self.literals[0], self.literals[1]))
    }

    pub fn bump_score(&mut self, inc: f64) {
        self.score += inc;
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl IndexMut<usize> for Clause {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.literals[index]
    }
}

impl From<&[i32]> for Clause {
    fn from(literals: &[i32]) -> Self {
        let literals: ClauseLiterals = literals.iter().copied().map(Literal::from_i32).collect();
        Self {
            literals,
            learned: false,
            score: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let clause = Clause::from(&[1, 2, 3][..]);
        assert_eq!(clause.len(), 3);
        assert!(!clause.is_learned());
        assert!(!clause.is_unit());
    }

    #[test]
    fn test_iter() {
        let clause = Clause::from(&[1, -2, 3][..]);
        let mut iter = clause.iter();
        assert_eq!(iter.next(), Some(&Literal::from(1)));
        assert_eq!(iter.next(), Some(&Literal::from(-2)));
        assert_eq!(iter.next(), Some(&Literal::from(3)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_swap() {
        let mut clause = Clause::from(&[1, 2, 3][..]);
        clause.swap(0, 2);
        assert_eq!(clause[0], Literal::from(3));
        assert_eq!(clause[1], Literal::from(2));
        assert_eq!(clause[2], Literal::from(1));
    }

    #[test]
    fn test_watched() {
        let unit = Clause::new(&[Literal::from(4)], true);
        assert!(unit.is_unit());
        assert_eq!(unit.watched(), None);

        let clause = Clause::from(&[-1, 2][..]);
        assert_eq!(clause.watched(), Some((Literal::from(-1), Literal::from(2))));
    }
}
