#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Two-watched-literal unit propagation.
//!
//! When a literal `l` becomes true, only the clauses in the watch bucket of `l` (those
//! watching `¬l`) are visited. For each one the falsified watch is moved to position 0:
//!
//! * if the other watch `c[1]` is already true the clause is satisfied and keeps its watch;
//! * otherwise `c[2..]` is scanned for a literal that is not false, which is swapped into
//!   position 0 and watched instead;
//! * failing that, `c[1]` is either false (conflict) or unassigned, in which case it is
//!   implied with the clause as its reason.
//!
//! A conflict aborts the pass: the unvisited watches are kept and the queue is cleared.

use crate::sat::clause_storage::ClauseId;
use crate::sat::state::SearchState;

impl SearchState {
    /// Propagates every queued literal. Returns the conflicting clause, if any.
    ///
    /// # Errors
    ///
    /// Returns `Err(clause)` when `clause` has all of its literals false.
    pub fn propagate(&mut self) -> Result<(), ClauseId> {
        while let Some(lit) = self.queue.pop_front() {
            self.propagations += 1;
            let false_lit = !lit;
            let mut watchers = self.watches.take(lit);
            let mut kept = 0;
            let mut i = 0;

            while i < watchers.len() {
                let id = watchers[i];
                i += 1;

                let clause = &mut self.db[id];
                if clause[0] != false_lit {
                    clause.swap(0, 1);
                }
                debug_assert_eq!(clause[0], false_lit, "clause {id} is in the wrong bucket");

                let other = clause[1];
                if self.vars.is_true(other) {
                    watchers[kept] = id;
                    kept += 1;
                    continue;
                }

                let replacement = (2..clause.len()).find(|&k| !self.vars.is_false(clause[k]));
                if let Some(k) = replacement {
                    clause.swap(0, k);
                    self.watches.watch(id, clause[0]);
                    continue;
                }

                watchers[kept] = id;
                kept += 1;

                if self.vars.is_false(other) {
                    while i < watchers.len() {
                        watchers[kept] = watchers[i];
                        kept += 1;
                        i += 1;
                    }
                    watchers.truncate(kept);
                    self.watches.restore(lit, watchers);
                    self.queue.clear();
                    return Err(id);
                }

                self.assign(other, Some(id));
            }

            watchers.truncate(kept);
            self.watches.restore(lit, watchers);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::Literal;

    fn lits(values: &[i32]) -> Vec<Literal> {
        values.iter().copied().map(Literal::from_i32).collect()
    }

    #[test]
    fn test_implication_chain() {
        let mut state = SearchState::new(3, 2);
        let a = state.add_clause(&lits(&[-1, 2]), false);
        let b = state.add_clause(&lits(&[-2, 3]), false);

        state.decide(Literal::from(1));
        assert_eq!(state.propagate(), Ok(()));

        assert!(state.vars.is_true(Literal::from(2)));
        assert!(state.vars.is_true(Literal::from(3)));
        assert_eq!(state.trail.reason_at(1), Some(a));
        assert_eq!(state.trail.reason_at(2), Some(b));
        assert_eq!(state.propagations, 3);
        assert!(state.check_watch_invariant());
    }

    #[test]
    fn test_moves_watch_to_free_literal() {
        let mut state = SearchState::new(3, 1);
        let id = state.add_clause(&lits(&[1, 2, 3]), false);

        state.decide(Literal::from(-1));
        assert_eq!(state.propagate(), Ok(()));

        assert!(!state.vars.is_assigned(2));
        assert!(!state.vars.is_assigned(3));
        assert!(state.watches[Literal::from(-1)].is_empty());
        assert_eq!(state.db[id][0], Literal::from(3));
        assert!(state.check_watch_invariant());
    }

    #[test]
    fn test_satisfied_other_watch_keeps_watch() {
        let mut state = SearchState::new(3, 1);
        let id = state.add_clause(&lits(&[1, 2, 3]), false);

        state.decide(Literal::from(2));
        assert_eq!(state.propagate(), Ok(()));
        state.decide(Literal::from(-1));
        assert_eq!(state.propagate(), Ok(()));

        assert_eq!(state.watches[Literal::from(-1)].as_slice(), &[id]);
        assert!(!state.vars.is_assigned(3));
        assert!(state.check_watch_invariant());
    }

    #[test]
    fn test_conflict_clears_queue_and_keeps_watches() {
        let mut state = SearchState::new(3, 3);
        let _ = state.add_clause(&lits(&[-1, 2]), false);
        let _ = state.add_clause(&lits(&[-1, -2]), false);
        let _ = state.add_clause(&lits(&[-1, 2, 3]), false);

        state.decide(Literal::from(1));
        let conflict = state.propagate();

        assert!(conflict.is_err());
        assert!(state.queue.is_empty());
        assert_eq!(state.watches[Literal::from(1)].len(), 3);
    }
}
