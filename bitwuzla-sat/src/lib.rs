//! SAT backend interface and the built-in CDCL engine.
//!
//! The [`SatSolver`] trait is the uniform contract the solver core expects
//! from a SAT backend: DIMACS-style clause addition terminated by `0`,
//! single-shot assumptions, satisfiability queries, model values, failed
//! assumption extraction and an asynchronous termination hook.
//!
//! [`Cdcl`] is the built-in backend: a conflict-driven clause-learning
//! engine with two-watched-literal propagation, first-UIP learning,
//! activity-based decisions and Luby restarts. [`Oneshot`] restricts it to
//! non-incremental queries, mirroring backends without assumption support.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cdcl;

use std::fmt;

pub use cdcl::Cdcl;

/// A Boolean variable identifier, numbered from 0.
pub type Var = u32;

/// A literal (signed Boolean variable), encoded as `var << 1 | sign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit(u32);

impl Lit {
    /// Create a positive literal from a variable.
    pub const fn positive(var: Var) -> Self {
        Self(var << 1)
    }

    /// Create a negative literal from a variable.
    pub const fn negative(var: Var) -> Self {
        Self((var << 1) | 1)
    }

    /// Create a literal from a DIMACS-style non-zero integer.
    pub fn from_dimacs(lit: i32) -> Self {
        debug_assert!(lit != 0);
        let var = (lit.unsigned_abs() - 1) as Var;
        if lit > 0 {
            Self::positive(var)
        } else {
            Self::negative(var)
        }
    }

    /// The DIMACS-style integer of this literal.
    pub fn to_dimacs(self) -> i32 {
        let v = (self.var() + 1) as i32;
        if self.is_positive() {
            v
        } else {
            -v
        }
    }

    /// The variable of this literal.
    pub const fn var(self) -> Var {
        self.0 >> 1
    }

    /// True iff this literal is positive.
    pub const fn is_positive(self) -> bool {
        (self.0 & 1) == 0
    }

    /// The negation of this literal.
    pub const fn negate(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// The raw encoding, usable as an index.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// Result of a satisfiability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatResult {
    /// A satisfying assignment was found.
    Sat,
    /// The clause set (under the given assumptions) is unsatisfiable.
    Unsat,
    /// The query was aborted by the terminator.
    Unknown,
}

/// Callback polled during search; returning true aborts the query.
pub type Terminator = Box<dyn FnMut() -> bool>;

/// The uniform SAT backend contract.
pub trait SatSolver {
    /// Append a DIMACS-style literal to the current clause; `0` terminates
    /// the clause and commits it.
    fn add(&mut self, lit: i32);

    /// Add a single-shot assumption, valid until the next [`solve`].
    ///
    /// [`solve`]: SatSolver::solve
    fn assume(&mut self, lit: i32);

    /// Decide satisfiability of the clause set under the current
    /// assumptions.
    fn solve(&mut self) -> SatResult;

    /// After [`SatResult::Sat`]: `+1` if the literal is true, `-1` if
    /// false, `0` if unassigned (don't care).
    fn value(&self, lit: i32) -> i8;

    /// After [`SatResult::Unsat`] under assumptions: true iff the literal
    /// is part of the failed assumption core.
    fn failed(&self, lit: i32) -> bool;

    /// Install or clear the termination callback.
    fn set_terminate(&mut self, cb: Option<Terminator>);

    /// True iff the backend supports incremental solving (assumptions and
    /// repeated queries).
    fn supports_incremental(&self) -> bool {
        true
    }

    /// True iff the backend supports failed-assumption extraction.
    fn supports_unsat_cores(&self) -> bool {
        true
    }

    /// A short backend name for diagnostics.
    fn name(&self) -> &'static str;
}

/// A wrapper restricting the built-in engine to single-shot queries, the
/// shape of backends like Kissat that implement neither `assume` nor
/// `failed`.
#[derive(Default)]
pub struct Oneshot {
    inner: Cdcl,
    solved: bool,
}

impl Oneshot {
    /// Create a fresh single-shot backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SatSolver for Oneshot {
    fn add(&mut self, lit: i32) {
        self.inner.add(lit);
    }

    fn assume(&mut self, _lit: i32) {
        unreachable!("single-shot backend does not support assumptions");
    }

    fn solve(&mut self) -> SatResult {
        assert!(!self.solved, "single-shot backend supports one query only");
        self.solved = true;
        self.inner.solve()
    }

    fn value(&self, lit: i32) -> i8 {
        self.inner.value(lit)
    }

    fn failed(&self, _lit: i32) -> bool {
        unreachable!("single-shot backend does not support failed assumptions");
    }

    fn set_terminate(&mut self, cb: Option<Terminator>) {
        self.inner.set_terminate(cb);
    }

    fn supports_incremental(&self) -> bool {
        false
    }

    fn supports_unsat_cores(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "oneshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lit_encoding() {
        let p = Lit::positive(5);
        assert!(p.is_positive());
        assert_eq!(p.var(), 5);
        assert_eq!(p.negate().var(), 5);
        assert!(!p.negate().is_positive());
        assert_eq!(p, p.negate().negate());
        assert_eq!(Lit::from_dimacs(6), p);
        assert_eq!(Lit::from_dimacs(-6), p.negate());
        assert_eq!(p.to_dimacs(), 6);
        assert_eq!(p.negate().to_dimacs(), -6);
    }
}
