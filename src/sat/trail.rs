#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

use crate::sat::clause_storage::ClauseId;
use crate::sat::literal::Literal;
use core::ops::Index;

/// One assignment on the trail. `reason` is `None` for decisions and for literals forced
/// from outside the clause database (input units, learned units, fixed free variables).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub lit: Literal,
    pub reason: Option<ClauseId>,
}

/// Chronological record of all current assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trail {
    steps: Vec<Step>,
    /// `level_boundaries[l]` is the trail length when level `l` was opened.
    level_boundaries: Vec<u32>,
}

impl Default for Trail {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Index<usize> for Trail {
    type Output = Step;

    fn index(&self, index: usize) -> &Self::Output {
        &self.steps[index]
    }
}

impl Trail {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            steps: Vec::with_capacity(num_vars),
            level_boundaries: vec![0],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Current decision level.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn decision_level(&self) -> u32 {
        (self.level_boundaries.len() - 1) as u32
    }

    #[must_use]
    pub fn level_boundaries(&self) -> &[u32] {
        &self.level_boundaries
    }

    /// Trail position of the first assignment made at `level`.
    #[must_use]
    pub fn level_start(&self, level: u32) -> usize {
        self.level_boundaries[level as usize] as usize
    }

    /// Appends an assignment and returns its position.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push(&mut self, lit: Literal, reason: Option<ClauseId>) -> u32 {
        self.steps.push(Step { lit, reason });
        (self.steps.len() - 1) as u32
    }

    /// Opens a new decision level at the current trail length.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new_level(&mut self) {
        self.level_boundaries.push(self.steps.len() as u32);
    }

    /// Drops every step above `level` and returns them, most recent last.
    pub fn truncate_to_level(&mut self, level: u32) -> std::vec::Drain<'_, Step> {
        debug_assert!(level <= self.decision_level());
        let end = self
            .level_boundaries
            .get(level as usize + 1)
            .map_or(self.steps.len(), |&b| b as usize);
        self.level_boundaries.truncate(level as usize + 1);
        self.steps.drain(end..)
    }

    #[must_use]
    pub fn reason_at(&self, pos: usize) -> Option<ClauseId> {
        self.steps.get(pos).and_then(|s| s.reason)
    }

    /// Forgets the justification at `pos`; used when the justifying clause is deleted.
    pub fn clear_reason(&mut self, pos: usize) {
        if let Some(step) = self.steps.get_mut(pos) {
            step.reason = None;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_and_truncate() {
        let mut trail = Trail::new(4);
        trail.push(Literal::from(1), None);
        trail.new_level();
        trail.push(Literal::from(-2), None);
        trail.push(Literal::from(3), None);
        trail.new_level();
        trail.push(Literal::from(4), None);

        assert_eq!(trail.decision_level(), 2);
        assert_eq!(trail.level_boundaries(), &[0, 1, 3]);

        let boundary = trail.level_boundaries()[1] as usize;
        let undone: Vec<_> = trail.truncate_to_level(0).map(|s| s.lit.to_i32()).collect();
        assert_eq!(undone, vec![-2, 3, 4]);
        assert_eq!(trail.len(), boundary);
        assert_eq!(trail.decision_level(), 0);
    }

    #[test]
    fn test_truncate_to_current_level_is_noop() {
        let mut trail = Trail::new(2);
        trail.new_level();
        trail.push(Literal::from(2), None);
        assert_eq!(trail.truncate_to_level(1).count(), 0);
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn test_clear_reason() {
        let mut trail = Trail::new(1);
        let mut db = crate::sat::clause_storage::ClauseDb::default();
        let id = db.add_clause(&[Literal::from(1)], false);
        let pos = trail.push(Literal::from(1), Some(id)) as usize;

        assert_eq!(trail.reason_at(pos), Some(id));
        trail.clear_reason(pos);
        assert_eq!(trail.reason_at(pos), None);
    }
}
