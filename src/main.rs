//! # cdcl-sat
//!
//! `cdcl-sat` is a command-line SAT (Satisfiability) solver for formulas in DIMACS CNF
//! format. It prints its verdict in the usual competition format and exits with the
//! matching status code.
//!
//! The solver supports two algorithms:
//! 1.  **CDCL (Conflict-Driven Clause Learning)**: watched-literal propagation, first-UIP
//!     learning with clause minimization, activity-ordered decisions, learned clause
//!     database reduction and a choice of restart policies (`minisat`, `rsat`, `picosat`).
//! 2.  **DPLL (Davis-Putnam-Logemann-Loveland)**: chronological backtracking over the same
//!     propagation engine, kept as a baseline.
//!
//! ## Usage
//!
//! ```sh
//! cdcl-sat [OPTIONS] [PATH]
//! cdcl-sat file --path <FILE> [OPTIONS]
//! cdcl-sat text --input "<CLAUSES>" [OPTIONS]
//! cdcl-sat dir --path <DIR> [OPTIONS]
//! cdcl-sat completions <SHELL>
//! ```
//!
//! ### Options
//!
//! -   `--solver <cdcl|dpll>`: search algorithm (default: `cdcl`).
//! -   `--restarts <minisat|rsat|picosat>`: restart policy (default: `minisat`).
//! -   `--learn-factor <F>`: initial learned clause limit relative to the clause count.
//! -   `--learn-start <N>`: fixed initial learned clause limit, overriding the factor.
//! -   `--timeout <SECS>`: stop after the given time and report `s UNKNOWN`.
//! -   `--progress`: print a progress table while searching.
//! -   `--no-model`: omit the `v` line.
//! -   `--check-model`: verify a model before printing it.
//! -   `--stats`: print problem and search statistics.
//! -   `-v, --verbose` / `-d, --debug`: log search events to stderr.
//!
//! ## Exit status
//!
//! `10` satisfiable, `20` unsatisfiable, `0` unknown (timeout), `40` a model failed
//! verification, `1` unreadable input or invalid arguments.

use crate::command_line::cli::{Cli, run};
use clap::Parser;
use std::process::ExitCode;

mod command_line;

/// Global allocator using `tikv-jemallocator`; its statistics feed the memory figures of
/// `--stats`.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.options().log_level())
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("c error: {e}");
            ExitCode::from(1)
        }
    }
}
