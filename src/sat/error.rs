#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Error types reported by the solver and the DIMACS reader.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while configuring or running a solver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The restart strategy name is not one of `minisat`, `rsat` or `picosat`.
    #[error("unknown restart strategy `{0}` (expected minisat, rsat or picosat)")]
    UnknownRestartStrategy(String),

    /// A clause refers to a variable outside `1..=num_vars`.
    #[error("literal {literal} in clause {clause} is out of range for {num_vars} variables")]
    LiteralOutOfRange {
        literal: i32,
        clause: usize,
        num_vars: usize,
    },

    /// An internal consistency check failed; continuing could produce a wrong verdict.
    #[error("internal solver fault: {0}")]
    InternalFault(String),
}

/// Failures raised while reading a DIMACS CNF file.
#[derive(Debug, Error)]
pub enum DimacsError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid literal `{token}`")]
    InvalidLiteral { line: usize, token: String },

    #[error("line {line}: invalid problem line `{text}`")]
    InvalidHeader { line: usize, text: String },
}
