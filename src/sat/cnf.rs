#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Plain CNF formulas as handed to a solver.
//!
//! A `Cnf` keeps clauses in DIMACS form (`i32` literals, variables `1..=num_vars`). Solvers
//! copy what they need out of it, so the caller keeps ownership and may reuse or mutate the
//! formula after `fetch_problem` returns.

use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// A formula in conjunctive normal form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf {
    pub num_vars: usize,
    pub clauses: Vec<Vec<i32>>,
}

impl Cnf {
    /// Builds a formula, sizing the variable range from the largest variable mentioned.
    pub fn new<I, J>(clauses: I) -> Self
    where
        I: IntoIterator<Item = J>,
        J: IntoIterator<Item = i32>,
    {
        let clauses = clauses
            .into_iter()
            .map(|c| c.into_iter().collect_vec())
            .collect_vec();
        let num_vars = clauses
            .iter()
            .flatten()
            .map(|l| l.unsigned_abs() as usize)
            .max()
            .unwrap_or(0);
        Self { num_vars, clauses }
    }

    /// Builds a formula with an explicit variable count.
    #[must_use]
    pub const fn with_vars(num_vars: usize, clauses: Vec<Vec<i32>>) -> Self {
        Self { num_vars, clauses }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<i32>> {
        self.clauses.iter()
    }

    /// Total number of literal occurrences.
    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(Vec::len).sum()
    }

    /// Sorts the literals of every clause by variable and drops repeated literals.
    pub fn normalize(&mut self) {
        for clause in &mut self.clauses {
            clause.sort_unstable_by_key(|l| (l.unsigned_abs(), *l < 0));
            clause.dedup();
        }
    }

    /// Whether `model` (variable `i` at index `i - 1`) satisfies every clause.
    #[must_use]
    pub fn verify(&self, model: &[bool]) -> bool {
        self.clauses.iter().all(|clause| {
            clause.iter().any(|&lit| {
                model
                    .get(lit.unsigned_abs() as usize - 1)
                    .is_some_and(|&value| value == (lit > 0))
            })
        })
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            writeln!(f, "{} 0", clause.iter().join(" "))?;
        }
        Ok(())
    }
}
