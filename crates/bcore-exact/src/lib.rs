//! Exact synthesis (C9): does an N-node K-input-LUT network realize a
//! given truth table, and if so, which one with the fewest nodes.
//!
//! [`encoding`] builds the CNF described in spec.md §4.5 against a
//! [`bcore_sat::SatSolver`]; [`search`] walks node counts upward from
//! the minimum the function's arity allows, trying the bulk,
//! incremental, or CEGAR solving strategy per [`params::ExactSynthParams`];
//! [`solution`] decodes a model back into a concrete network, simulates
//! it, and renders it as text or `.blif`.

mod encoding;
mod params;
mod search;
mod solution;

pub use params::{min_node_count, ExactSynthParams, SolveStrategy};
pub use search::{synthesize, ExactSynthError, SynthOutcome};
pub use solution::{NodeSolution, Solution};
