#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Per-variable search state.

use crate::sat::literal::{Literal, Variable};
use core::ops::{Index, IndexMut};

/// Marks a variable that has no position on the trail.
pub const NO_TRAIL_POS: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }

    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::Assigned(true))
    }

    #[must_use]
    pub const fn is_false(self) -> bool {
        matches!(self, Self::Assigned(false))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarData {
    pub value: VarState,
    /// Decision level of the assignment; stale once unassigned.
    pub level: u32,
    pub trail_pos: u32,
    /// Scratch mark owned by a single conflict analysis.
    pub used: bool,
}

impl Default for VarData {
    fn default() -> Self {
        Self {
            value: VarState::Unassigned,
            level: 0,
            trail_pos: NO_TRAIL_POS,
            used: false,
        }
    }
}

/// Variable table indexed by `Variable` (slot 0 is unused).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    vars: Vec<VarData>,
    assigned: usize,
}

impl Assignment {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            vars: vec![VarData::default(); num_vars + 1],
            assigned: 0,
        }
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.vars.len() - 1
    }

    #[must_use]
    pub const fn num_assigned(&self) -> usize {
        self.assigned
    }

    #[must_use]
    pub fn all_assigned(&self) -> bool {
        self.assigned == self.num_vars()
    }

    /// Makes `lit` true at `level`, recorded at trail position `pos`.
    pub fn assign(&mut self, lit: Literal, level: u32, pos: u32) {
        let data = &mut self.vars[lit.variable() as usize];
        debug_assert!(data.value.is_unassigned(), "variable {} assigned twice", lit.variable());
        data.value = VarState::Assigned(lit.polarity());
        data.level = level;
        data.trail_pos = pos;
        self.assigned += 1;
    }

    pub fn unassign(&mut self, var: Variable) {
        let data = &mut self.vars[var as usize];
        if data.value.is_assigned() {
            self.assigned -= 1;
        }
        data.value = VarState::Unassigned;
        data.trail_pos = NO_TRAIL_POS;
    }

    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        match self.vars[var as usize].value {
            VarState::Assigned(b) => Some(b),
            VarState::Unassigned => None,
        }
    }

    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.var_value(lit.variable()).map(|b| b == lit.polarity())
    }

    #[must_use]
    pub fn is_true(&self, lit: Literal) -> bool {
        self.literal_value(lit) == Some(true)
    }

    #[must_use]
    pub fn is_false(&self, lit: Literal) -> bool {
        self.literal_value(lit) == Some(false)
    }

    #[must_use]
    pub fn is_assigned(&self, var: Variable) -> bool {
        self.vars[var as usize].value.is_assigned()
    }

    #[must_use]
    pub fn level(&self, var: Variable) -> u32 {
        self.vars[var as usize].level
    }

    #[must_use]
    pub fn trail_pos(&self, var: Variable) -> u32 {
        self.vars[var as usize].trail_pos
    }

    #[must_use]
    pub fn is_used(&self, var: Variable) -> bool {
        self.vars[var as usize].used
    }

    pub fn set_used(&mut self, var: Variable, used: bool) {
        self.vars[var as usize].used = used;
    }

    /// Truth values for variables `1..=N`, unassigned ones reported as `false`.
    #[must_use]
    pub fn model(&self) -> Vec<bool> {
        self.vars
            .iter()
            .skip(1)
            .map(|d| d.value.is_true())
            .collect()
    }
}

impl Index<Variable> for Assignment {
    type Output = VarData;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.vars[index as usize]
    }
}

impl IndexMut<Variable> for Assignment {
    fn index_mut(&mut self, index: Variable) -> &mut Self::Output {
        &mut self.vars[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_and_values() {
        let mut a = Assignment::new(3);
        a.assign(Literal::from(-2), 4, 0);

        assert_eq!(a.var_value(2), Some(false));
        assert!(a.is_true(Literal::from(-2)));
        assert!(a.is_false(Literal::from(2)));
        assert_eq!(a.literal_value(Literal::from(1)), None);
        assert_eq!(a.level(2), 4);
        assert_eq!(a.trail_pos(2), 0);
        assert_eq!(a.num_assigned(), 1);
    }

    #[test]
    fn test_unassign_resets_position() {
        let mut a = Assignment::new(2);
        a.assign(Literal::from(1), 0, 0);
        a.assign(Literal::from(2), 1, 1);
        assert!(a.all_assigned());

        a.unassign(2);
        assert!(!a.is_assigned(2));
        assert_eq!(a.trail_pos(2), NO_TRAIL_POS);
        assert_eq!(a.num_assigned(), 1);
        assert_eq!(a.model(), vec![true, false]);
    }
}
