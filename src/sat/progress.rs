#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Progress reporting and cooperative cancellation.
//!
//! Reports are plain values handed to a `ProgressObserver`; the solver never reads anything
//! back from the observer. Cancellation is a shared flag polled once per search iteration.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

/// Ruler printed above and below the progress table header.
pub const PROGRESS_RULE: &str =
    "--------------------------------------------------------------------------------------------------";

/// Column titles matching `ProgressReport`'s `Display` output.
pub const PROGRESS_HEADER: &str =
    "| Rst|Level|Decisions|Conflict|  Vars| Clauses|Literals|Learned |LearnLts| LPC| LearnMax|ConflMax|";

/// A snapshot of the search counters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressReport {
    /// Set on the report emitted right after a restart.
    pub restart: bool,
    pub restarts: usize,
    pub decision_level: u32,
    pub decisions: usize,
    pub conflicts: usize,
    /// Unassigned variables still occurring in some clause, as of the last simplification.
    pub live_vars: usize,
    pub original_clauses: usize,
    pub original_literals: usize,
    pub learned_clauses: usize,
    pub learned_literals: usize,
    pub max_learned: usize,
    pub max_conflicts: usize,
}

impl ProgressReport {
    /// Average length of the learned clauses.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn literals_per_learned(&self) -> f64 {
        if self.learned_clauses == 0 {
            0.0
        } else {
            self.learned_literals as f64 / self.learned_clauses as f64
        }
    }
}

impl Display for ProgressReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "|{}{:>3}|{:>5}|{:>9}|{:>8}|{:>6}|{:>8}|{:>8}|{:>8}|{:>8}|{:.1}|{:>8}|{:>8}|",
            if self.restart { 'N' } else { '-' },
            self.restarts,
            self.decision_level,
            self.decisions,
            self.conflicts,
            self.live_vars,
            self.original_clauses,
            self.original_literals,
            self.learned_clauses,
            self.learned_literals,
            self.literals_per_learned(),
            self.max_learned,
            self.max_conflicts,
        )
    }
}

/// Receives progress reports. Must not block the solver.
pub trait ProgressObserver {
    fn report(&mut self, report: &ProgressReport);
}

impl<F: FnMut(&ProgressReport)> ProgressObserver for F {
    fn report(&mut self, report: &ProgressReport) {
        self(report);
    }
}

impl ProgressObserver for Sender<ProgressReport> {
    fn report(&mut self, report: &ProgressReport) {
        // a dropped receiver only means nobody is listening any more
        let _ = self.send(*report);
    }
}

/// Shared flag asking a running search to stop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_report_line() {
        let report = ProgressReport {
            restart: true,
            restarts: 3,
            decision_level: 0,
            decisions: 4096,
            conflicts: 250,
            live_vars: 90,
            original_clauses: 400,
            original_literals: 1200,
            learned_clauses: 4,
            learned_literals: 18,
            max_learned: 88,
            max_conflicts: 337,
        };
        assert_eq!(
            report.to_string(),
            "|N  3|    0|     4096|     250|    90|     400|    1200|       4|      18|4.5|      88|     337|"
        );
    }

    #[test]
    fn test_report_line_without_learned_clauses() {
        let report = ProgressReport {
            decisions: 4096,
            live_vars: 20,
            original_clauses: 91,
            original_literals: 273,
            ..ProgressReport::default()
        };
        assert!(report.literals_per_learned().abs() < f64::EPSILON);
        assert_eq!(
            report.to_string(),
            "|-  0|    0|     4096|       0|    20|      91|     273|       0|       0|0.0|       0|       0|"
        );
    }

    #[test]
    fn test_sender_observer() {
        let (tx, rx) = mpsc::channel();
        let mut observer = tx;
        observer.report(&ProgressReport::default());
        assert_eq!(rx.try_recv().map(|r| r.decisions), Ok(0));
    }

    #[test]
    fn test_cancellation_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
