#![allow(clippy::cast_precision_loss)]

use cdcl_sat::sat::cnf::Cnf;
use cdcl_sat::sat::config::SolverConfig;
use cdcl_sat::sat::dimacs::{parse_dimacs, parse_file};
use cdcl_sat::sat::progress::{CancellationToken, PROGRESS_HEADER, PROGRESS_RULE, ProgressReport};
use cdcl_sat::sat::restarter::RestartStrategy;
use cdcl_sat::sat::solver::{SolutionStats, SolveResult, Solver, SolverType};
use clap::{Args, CommandFactory, Parser, Subcommand};
use itertools::Itertools;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};

/// Exit status for a satisfiable formula.
pub(crate) const EXIT_SAT: u8 = 10;
/// Exit status for an unsatisfiable formula.
pub(crate) const EXIT_UNSAT: u8 = 20;
/// Exit status when the search was interrupted.
pub(crate) const EXIT_UNKNOWN: u8 = 0;
/// Exit status when a returned model does not satisfy the formula.
pub(crate) const EXIT_BAD_MODEL: u8 = 40;

/// Defines the command-line interface for the solver application.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(
    name = "cdcl-sat",
    version,
    about = "A conflict-driven clause-learning SAT solver"
)]
pub(crate) struct Cli {
    /// Path to a DIMACS .cnf file to solve when no subcommand is given.
    pub path: Option<PathBuf>,

    /// Specifies the subcommand to execute (e.g. `file`, `text`, `dir`).
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub common: CommonOptions,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        /// Path to the DIMACS .cnf file.
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a CNF formula provided as plain text.
    Text {
        /// DIMACS clauses as a string (e.g. "1 -2 0 2 3 0").
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every `.cnf` file below a directory.
    Dir {
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Search algorithm.
    #[arg(long, default_value_t = SolverType::Cdcl)]
    pub(crate) solver: SolverType,

    /// Restart policy of the CDCL search.
    #[arg(long, default_value_t = RestartStrategy::Minisat)]
    pub(crate) restarts: RestartStrategy,

    /// Initial learned clause limit as a fraction of the original clause count.
    #[arg(long, default_value_t = 0.2)]
    pub(crate) learn_factor: f32,

    /// Initial learned clause limit; overrides `--learn-factor` when non-zero.
    #[arg(long, default_value_t = 0)]
    pub(crate) learn_start: u32,

    /// Give up after this many seconds and report UNKNOWN.
    #[arg(long)]
    pub(crate) timeout: Option<u64>,

    /// Print a progress line every few thousand decisions and at every restart.
    #[arg(long, default_value_t = false)]
    pub(crate) progress: bool,

    /// Do not print the `v` model line.
    #[arg(long, default_value_t = false)]
    pub(crate) no_model: bool,

    /// Check a returned model against the formula before reporting it.
    #[arg(long, default_value_t = false)]
    pub(crate) check_model: bool,

    /// Print problem and search statistics after solving.
    #[arg(long, default_value_t = false)]
    pub(crate) stats: bool,

    /// Log restarts, reductions and simplifications.
    #[arg(short, long, default_value_t = false)]
    pub(crate) verbose: bool,

    /// Also log every learned clause.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            solver: SolverType::Cdcl,
            restarts: RestartStrategy::Minisat,
            learn_factor: 0.2,
            learn_start: 0,
            timeout: None,
            progress: false,
            no_model: false,
            check_model: false,
            stats: false,
            verbose: false,
            debug: false,
        }
    }
}

impl CommonOptions {
    pub(crate) fn solver_config(&self) -> SolverConfig {
        SolverConfig::default()
            .with_restart_strategy(self.restarts)
            .with_learn_factor(self.learn_factor)
            .with_learn_start(self.learn_start)
    }

    pub(crate) const fn log_level(&self) -> tracing::Level {
        if self.debug {
            tracing::Level::TRACE
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }
}

impl Cli {
    /// The options in effect for the selected command.
    pub(crate) fn options(&self) -> &CommonOptions {
        match &self.command {
            Some(
                Commands::File { common, .. }
                | Commands::Text { common, .. }
                | Commands::Dir { common, .. },
            ) => common,
            Some(Commands::Completions { .. }) | None => &self.common,
        }
    }
}

/// Runs the selected command and returns the process exit status.
///
/// # Errors
///
/// A message describing an unreadable input or an invalid configuration.
pub(crate) fn run(cli: Cli) -> Result<u8, String> {
    match cli.command {
        Some(Commands::File { path, common }) => solve_path(&path, &common),
        Some(Commands::Text { input, common }) => {
            let time = Instant::now();
            let mut cnf = parse_dimacs(Cursor::new(input)).map_err(|e| e.to_string())?;
            cnf.normalize();
            solve_and_report(&cnf, &common, None, time.elapsed())
        }
        Some(Commands::Dir { path, common }) => solve_dir(&path, &common).map(|()| EXIT_UNKNOWN),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "cdcl-sat",
                &mut std::io::stdout(),
            );
            Ok(0)
        }
        None => match cli.path {
            Some(path) => solve_path(&path, &cli.common),
            None => Err("no input given; use --help for more information".to_string()),
        },
    }
}

fn solve_path(path: &Path, common: &CommonOptions) -> Result<u8, String> {
    let time = Instant::now();
    let mut cnf = parse_file(path).map_err(|e| e.to_string())?;
    cnf.normalize();
    solve_and_report(&cnf, common, Some(path), time.elapsed())
}

/// Solves a directory of CNF files.
///
/// Iterates over all `.cnf` files below `path`, parses each file, solves it and reports
/// the result. Files that cannot be parsed are reported and skipped.
///
/// # Errors
///
/// If `path` is not a directory.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> Result<(), String> {
    if !path.is_dir() {
        return Err(format!("not a directory: {}", path.display()));
    }

    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();
        if !file_path.is_file() {
            continue;
        }
        if file_path.extension().is_none_or(|ext| ext != "cnf") {
            eprintln!("c skipping non-CNF file: {}", file_path.display());
            continue;
        }
        if let Err(e) = solve_path(file_path, common) {
            eprintln!("c {e}");
        }
    }

    Ok(())
}

/// Solves `cnf` with the configured solver, prints the result in competition format and
/// returns the matching exit status.
///
/// # Errors
///
/// If the solver rejects the formula or reports an internal fault.
pub(crate) fn solve_and_report(
    cnf: &Cnf,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> Result<u8, String> {
    if let Some(name) = label {
        println!("c solving {}", name.display());
    }

    let mut solver = common.solver.to_impl(common.solver_config());
    solver.fetch_problem(cnf).map_err(|e| e.to_string())?;

    let token = CancellationToken::new();
    solver.set_cancellation(token.clone());
    if let Some(secs) = common.timeout {
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            token.cancel();
        });
    }

    let printer = common.progress.then(|| {
        let (tx, rx) = mpsc::channel::<ProgressReport>();
        solver.set_observer(Box::new(tx));
        println!("c {PROGRESS_RULE}");
        println!("c {PROGRESS_HEADER}");
        println!("c {PROGRESS_RULE}");
        std::thread::spawn(move || {
            for report in rx {
                println!("c {report}");
            }
        })
    });

    let time = Instant::now();
    let result = solver.solve().map_err(|e| e.to_string())?;
    let elapsed = time.elapsed();
    let solver_stats = solver.stats();

    drop(solver);
    if let Some(handle) = printer {
        let _ = handle.join();
        println!("c {PROGRESS_RULE}");
    }

    if common.stats {
        print_stats(parse_time, elapsed, cnf, &solver_stats, memory_usage());
    }

    if let SolveResult::Satisfiable(model) = &result {
        if common.check_model && !cnf.verify(model) {
            println!("c model does not satisfy the formula");
            return Ok(EXIT_BAD_MODEL);
        }
    }

    println!("s {result}");
    if let (Some(model), false) = (result.model(), common.no_model) {
        println!("{}", model_line(model));
    }
    Ok(exit_code(&result))
}

pub(crate) const fn exit_code(result: &SolveResult) -> u8 {
    match result {
        SolveResult::Satisfiable(_) => EXIT_SAT,
        SolveResult::Unsatisfiable => EXIT_UNSAT,
        SolveResult::Interrupted => EXIT_UNKNOWN,
    }
}

/// The `v` line of a model: signed variables in order, terminated by `0`.
pub(crate) fn model_line(model: &[bool]) -> String {
    let literals = model
        .iter()
        .enumerate()
        .map(|(i, &value)| if value { format!("{}", i + 1) } else { format!("-{}", i + 1) })
        .join(" ");
    if literals.is_empty() {
        "v 0".to_string()
    } else {
        format!("v {literals} 0")
    }
}

/// Allocated and resident memory in MiB, as reported by jemalloc.
fn memory_usage() -> Option<(f64, f64)> {
    epoch::advance().ok()?;
    let allocated = stats::allocated::mib().ok()?.read().ok()?;
    let resident = stats::resident::mib().ok()?.read().ok()?;
    Some((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

/// Helper function to print a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("c |  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate (value/second).
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("c |  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and search statistics.
pub(crate) fn print_stats(
    parse_time: Duration,
    elapsed: Duration,
    cnf: &Cnf,
    s: &SolutionStats,
    memory: Option<(f64, f64)>,
) {
    let elapsed_secs = elapsed.as_secs_f64();

    println!("c =======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.num_vars);
    stat_line("Clauses (original)", cnf.len());
    stat_line("Literals (original)", cnf.num_literals());

    println!("c ========================[ Search Statistics ]========================");
    stat_line("Learnt clauses", s.learned_clauses);
    stat_line("Minimized literals", s.removed_literals);
    stat_line("Database reductions", s.reductions);
    stat_line("Deleted clauses", s.deleted_clauses);
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Propagations", s.propagations, elapsed_secs);
    stat_line_with_rate("Restarts", s.restarts, elapsed_secs);
    if let Some((allocated, resident)) = memory {
        stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
        stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    }
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("c =====================================================================");
}
