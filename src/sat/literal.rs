#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Variables and literals.
//!
//! Variables are numbered `1..=N` exactly as in DIMACS. A `Literal` packs the variable and
//! its sign into a single `u32` (`var << 1 | negative`), so the two literals of a variable
//! are adjacent and `index()` can address per-literal tables such as watch lists directly.

use core::fmt;
use core::ops::{Neg, Not};

/// A propositional variable, `1..=N`.
pub type Variable = u32;

/// A variable together with a polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Literal(u32);

impl Literal {
    /// Builds the literal of `var` that is true when `var` is assigned `polarity`.
    #[must_use]
    pub const fn new(var: Variable, polarity: bool) -> Self {
        Self((var << 1) | (!polarity) as u32)
    }

    /// The positive literal of `var`.
    #[must_use]
    pub const fn positive(var: Variable) -> Self {
        Self::new(var, true)
    }

    /// The negative literal of `var`.
    #[must_use]
    pub const fn negative(var: Variable) -> Self {
        Self::new(var, false)
    }

    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0 >> 1
    }

    /// `true` for `x`, `false` for `¬x`.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0 & 1 == 0
    }

    #[must_use]
    pub const fn is_negated(self) -> bool {
        !self.polarity()
    }

    #[must_use]
    pub const fn negated(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Dense index of this literal, suitable for tables of size `2 * (N + 1)`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Converts a non-zero DIMACS literal.
    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        Self::new(value.unsigned_abs(), value > 0)
    }

    /// The DIMACS form of this literal.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_i32(self) -> i32 {
        let var = self.variable() as i32;
        if self.polarity() { var } else { -var }
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_neg() {
        assert_eq!(Literal::new(1, false).negated(), Literal::new(1, true));
        assert_eq!(!Literal::new(1, true), Literal::new(1, false));
        assert_eq!(-Literal::from_i32(-7), Literal::from_i32(7));
    }

    #[test]
    fn test_variable_and_polarity() {
        let lit = Literal::from_i32(-12);
        assert_eq!(lit.variable(), 12);
        assert!(!lit.polarity());
        assert!(lit.is_negated());
        assert_eq!(lit.to_i32(), -12);

        let lit = Literal::positive(3);
        assert_eq!(lit.variable(), 3);
        assert!(lit.polarity());
        assert_eq!(lit.to_string(), "3");
    }

    #[test]
    fn test_adjacent_indices() {
        let pos = Literal::positive(5);
        let neg = Literal::negative(5);
        assert_eq!(pos.index() + 1, neg.index());
        assert_eq!(pos.index() / 2, 5);
    }
}
