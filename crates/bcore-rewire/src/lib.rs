//! MIAIG — a reference-counted multi-input AND network with
//! fanin-rewiring primitives and a randomized rewire loop (C8).
//!
//! [`Miaig`] is the mutable object model (§4.4's "value-with-shared-data
//! handle" design: every node tracks its own refcount and rewrite
//! state). [`care`] computes the observability care-set that gates every
//! rewrite. [`primitives`] implements `expand-one`/`reduce-one`/`share`
//! directly against that care-set; [`rewire_loop`] drives them inside
//! the top-level randomized search.

mod care;
mod miaig;
mod primitives;
mod rewire_loop;
mod verify;

pub use care::observability_care;
pub use miaig::{Lit, Miaig, NodeId, NodeState, Obj};
pub use primitives::{expand_one, expand_then_reduce_one, reduce_one, share};
pub use rewire_loop::{rewire, CostMode, RewireParams};
pub use verify::{check_equivalence, RewireError};
