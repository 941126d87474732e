#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for the DIMACS CNF (Conjunctive Normal Form) file format.
//!
//! The DIMACS CNF format is a standard text-based format for representing
//! boolean satisfiability problems. This module provides functions to parse
//! such files into an in-memory `Cnf` structure.
//!
//! The format includes:
//! - Comment lines starting with 'c'.
//! - A problem line 'p cnf <`num_variables`> <`num_clauses`>'. The variable count is
//!   taken from it, raised if a clause mentions a larger variable. The clause count is
//!   informational only.
//! - Clauses: whitespace-separated integers (positive for the variable, negative for its
//!   negation), terminated by '0'. A clause may span several lines, and several clauses
//!   may share a line.
//! - An optional '%' line to indicate end-of-data (often used in competitions).

use crate::sat::cnf::Cnf;
use crate::sat::error::DimacsError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parses DIMACS formatted data from a `BufRead` source into a `Cnf` structure.
///
/// A trailing clause without its terminating '0' is still added. A lone '0' yields an
/// empty clause, which makes the formula unsatisfiable.
///
/// # Errors
///
/// - `DimacsError::InvalidLiteral` if a token in a clause is not an integer.
/// - `DimacsError::InvalidHeader` if the problem line is malformed.
/// - `DimacsError::Io` if reading from `reader` fails.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Cnf, DimacsError> {
    let mut num_vars = 0_usize;
    let mut clauses: Vec<Vec<i32>> = Vec::new();
    let mut current: Vec<i32> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| DimacsError::Io {
            path: "<input>".into(),
            source,
        })?;
        if line.trim_start().starts_with('c') {
            continue;
        }
        let mut parts = line.split_whitespace().peekable();

        match parts.peek() {
            Some(&"%") => break,
            None => {}
            Some(&"p") => num_vars = parse_header(&line, line_no)?,
            Some(_) => {
                for token in parts {
                    let lit = token
                        .parse::<i32>()
                        .map_err(|_| DimacsError::InvalidLiteral {
                            line: line_no,
                            token: token.to_string(),
                        })?;
                    if lit == 0 {
                        clauses.push(std::mem::take(&mut current));
                    } else {
                        current.push(lit);
                    }
                }
            }
        }
    }
    if !current.is_empty() {
        clauses.push(current);
    }

    let largest = clauses
        .iter()
        .flatten()
        .map(|l| l.unsigned_abs() as usize)
        .max()
        .unwrap_or(0);
    Ok(Cnf::with_vars(num_vars.max(largest), clauses))
}

/// Reads the variable count from a `p cnf V C` line.
fn parse_header(line: &str, line_no: usize) -> Result<usize, DimacsError> {
    let invalid = || DimacsError::InvalidHeader {
        line: line_no,
        text: line.to_string(),
    };
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        ["p", "cnf", vars, clauses] => {
            clauses.parse::<usize>().map_err(|_| invalid())?;
            vars.parse::<usize>().map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

/// Parses a DIMACS CNF file specified by its path.
///
/// # Errors
///
/// `DimacsError::Io` if the file cannot be opened or read, otherwise as `parse_dimacs`.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf, DimacsError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DimacsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dimacs(BufReader::new(file)).map_err(|err| match err {
        DimacsError::Io { source, .. } => DimacsError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}
