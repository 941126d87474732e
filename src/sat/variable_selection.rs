#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Activity-ordered variable table used to pick decision variables.
//!
//! Variables live in a dense array sorted ascending by score; `rank[var]` is the position
//! of `var` in that array. A bump only ever increases a score, so the bumped entry is
//! restored to order by bubbling it towards the tail. Decisions are taken from the tail,
//! skipping assigned entries.

use crate::sat::assignment::Assignment;
use crate::sat::literal::{Literal, Variable};

/// Sorted `(variable, score)` table with an inverse `rank` map and a decision cursor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivityTable {
    entries: Vec<(Variable, f64)>,
    /// `rank[var]` is the position of `var` in `entries`; slot 0 is unused.
    rank: Vec<u32>,
    /// Every unassigned variable sits at a position below `cursor`.
    cursor: usize,
}

impl ActivityTable {
    /// Builds the table with one unit of score per occurrence of each variable.
    #[must_use]
    pub fn from_occurrences(num_vars: usize, occurrences: impl IntoIterator<Item = Variable>) -> Self {
        let mut scores = vec![0.0; num_vars + 1];
        for var in occurrences {
            scores[var as usize] += 1.0;
        }

        #[allow(clippy::cast_possible_truncation)]
        let entries = scores
            .iter()
            .enumerate()
            .skip(1)
            .map(|(var, &score)| (var as Variable, score))
            .collect();

        let mut table = Self {
            entries,
            rank: vec![0; num_vars + 1],
            cursor: num_vars,
        };
        table.resort();
        table
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn score(&self, var: Variable) -> f64 {
        self.entries[self.rank[var as usize] as usize].1
    }

    #[must_use]
    pub fn rank(&self, var: Variable) -> usize {
        self.rank[var as usize] as usize
    }

    /// Adds `inc` to the score of `var` and moves it to its sorted position.
    ///
    /// Returns `true` when the new score exceeds `limit`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn bump(&mut self, var: Variable, inc: f64, limit: f64) -> bool {
        let start = self.rank[var as usize] as usize;
        let mut pos = start;
        self.entries[pos].1 += inc;
        let over = self.entries[pos].1 > limit;

        while pos + 1 < self.entries.len() && self.entries[pos + 1].1 < self.entries[pos].1 {
            self.entries.swap(pos, pos + 1);
            self.rank[self.entries[pos].0 as usize] = pos as u32;
            pos += 1;
        }
        self.rank[var as usize] = pos as u32;

        if start < self.cursor {
            self.cursor = self.cursor.max(pos + 1);
        }
        over
    }

    /// Multiplies every score by `factor`. Relative order is unchanged.
    pub fn rescale(&mut self, factor: f64) {
        for entry in &mut self.entries {
            entry.1 *= factor;
        }
    }

    /// Fully re-sorts the table and resets the decision cursor.
    #[allow(clippy::cast_possible_truncation)]
    pub fn resort(&mut self) {
        self.entries.sort_by(|a, b| a.1.total_cmp(&b.1));
        for (pos, &(var, _)) in self.entries.iter().enumerate() {
            self.rank[var as usize] = pos as u32;
        }
        self.cursor = self.entries.len();
    }

    /// Tells the table that `var` became unassigned.
    pub fn touch(&mut self, var: Variable) {
        self.cursor = self.cursor.max(self.rank[var as usize] as usize + 1);
    }

    /// Highest-scoring unassigned variable, if any.
    pub fn next_decision(&mut self, vars: &Assignment) -> Option<Variable> {
        while self.cursor > 0 {
            let var = self.entries[self.cursor - 1].0;
            if !vars.is_assigned(var) {
                return Some(var);
            }
            self.cursor -= 1;
        }
        None
    }

    /// The decision literal for the highest-scoring unassigned variable. Always negative.
    pub fn next_literal(&mut self, vars: &Assignment) -> Option<Literal> {
        self.next_decision(vars).map(Literal::negative)
    }

    /// Whether the table is sorted and `rank` is its exact inverse.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let sorted = self.entries.windows(2).all(|w| w[0].1 <= w[1].1);
        let inverse = self
            .entries
            .iter()
            .enumerate()
            .all(|(pos, &(var, _))| self.rank[var as usize] as usize == pos);
        sorted && inverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_occurrences_sorts() {
        let table = ActivityTable::from_occurrences(3, [2, 2, 3, 2, 3]);
        assert!(table.is_consistent());
        assert_eq!(table.rank(1), 0);
        assert_eq!(table.rank(3), 1);
        assert_eq!(table.rank(2), 2);
        assert!((table.score(2) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bump_bubbles_up() {
        let mut table = ActivityTable::from_occurrences(3, [2, 3, 3]);
        assert!(!table.bump(1, 5.0, 1e100));
        assert!(table.is_consistent());
        assert_eq!(table.rank(1), 2);

        let vars = Assignment::new(3);
        assert_eq!(table.next_decision(&vars), Some(1));
        assert_eq!(table.next_literal(&vars), Some(Literal::from(-1)));
    }

    #[test]
    fn test_bump_reports_limit() {
        let mut table = ActivityTable::from_occurrences(2, [1]);
        assert!(table.bump(2, 10.0, 5.0));
        table.rescale(0.5);
        assert!((table.score(2) - 5.0).abs() < f64::EPSILON);
        assert!(table.is_consistent());
    }

    #[test]
    fn test_next_decision_skips_assigned_and_touch_restores() {
        let mut table = ActivityTable::from_occurrences(3, [1, 2, 2, 3, 3, 3]);
        let mut vars = Assignment::new(3);
        vars.assign(Literal::from(3), 1, 0);
        vars.assign(Literal::from(2), 1, 1);

        assert_eq!(table.next_decision(&vars), Some(1));

        vars.unassign(3);
        table.touch(3);
        assert_eq!(table.next_decision(&vars), Some(3));

        vars.assign(Literal::from(3), 1, 0);
        vars.assign(Literal::from(1), 1, 2);
        assert_eq!(table.next_decision(&vars), None);
    }
}
