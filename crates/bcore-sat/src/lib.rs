//! An incremental SAT wrapper (C9 sub-component): the abstract interface
//! named in spec.md §9's design notes — `add_literal`, `finalize_clause`,
//! `assume`, `solve`, `model_value`, a terminate callback, `reset`,
//! `clause_count` — backed by a two-watched-literal CDCL core with
//! first-UIP clause learning.
//!
//! Not a general-purpose SAT library: no DIMACS I/O, no proof logging.
//! This exists to drive `bcore-exact`'s per-minterm encoding and
//! `bcore-rewire`'s care-set equality checks.

mod core_solver;

pub use core_solver::{BulkBackend, IncrementalBackend};

use bcore_entity::{entity_impl, EntityRef};

/// A Boolean variable.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SatVar(u32);
entity_impl!(SatVar, "x");

/// A literal: a variable plus a polarity, packed the same way as the
/// GIA crate's own literal (`var * 2 + negated`).
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Lit(u32);

impl Lit {
    pub fn new(var: SatVar, negated: bool) -> Self {
        Lit((var.index() as u32) << 1 | negated as u32)
    }

    pub fn positive(var: SatVar) -> Self {
        Self::new(var, false)
    }

    pub fn negative(var: SatVar) -> Self {
        Self::new(var, true)
    }

    pub fn var(self) -> SatVar {
        SatVar::new((self.0 >> 1) as usize)
    }

    pub fn is_negated(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn negate(self) -> Lit {
        Lit(self.0 ^ 1)
    }
}

impl std::fmt::Debug for Lit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_negated() {
            write!(f, "-{:?}", self.var())
        } else {
            write!(f, "{:?}", self.var())
        }
    }
}

/// The outcome of a [`SatSolver::solve`] call.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SatResult {
    Sat,
    Unsat,
    /// The terminate callback fired, or a configured conflict budget was
    /// exhausted, before a verdict was reached.
    Timeout,
}

/// The abstract incremental SAT interface spec.md §9 asks for, so
/// `bcore-exact` can be written against a trait rather than a concrete
/// solver.
pub trait SatSolver {
    /// Allocate a fresh variable.
    fn new_var(&mut self) -> SatVar;

    /// Append one literal to the clause currently being built.
    fn add_literal(&mut self, lit: Lit);

    /// Commit the literals accumulated since the last `finalize_clause`
    /// (or since the solver was created) as one clause.
    fn finalize_clause(&mut self);

    /// Add `lit` to the assumption list used by the next `solve` call.
    fn assume(&mut self, lit: Lit);

    /// Run the solver under the assumptions accumulated via `assume`
    /// since the last `solve` call, then clear them.
    fn solve(&mut self) -> SatResult;

    /// The model value of `var` after a `solve` call returned
    /// [`SatResult::Sat`]; `None` if the variable was never assigned.
    fn model_value(&self, var: SatVar) -> Option<bool>;

    /// Install a callback polled between decisions; returning `true`
    /// aborts the current `solve` with [`SatResult::Timeout`].
    fn set_terminate_callback(&mut self, cb: Box<dyn FnMut() -> bool>);

    /// Forget the current assumption trail (not the learnt clause
    /// database) so the solver is ready for another incremental call.
    fn reset(&mut self);

    fn clause_count(&self) -> usize;
}
