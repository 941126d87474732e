#![deny(missing_docs)]
//! This crate provides a conflict-driven clause-learning SAT solver together with a
//! chronological DPLL baseline, a DIMACS reader and the supporting data structures.

/// The `sat` module implements the SAT solvers, which determine the satisfiability of
/// Boolean formulas in conjunctive normal form.
#[allow(missing_docs)]
pub mod sat;
