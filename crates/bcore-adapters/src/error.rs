//! [`AdapterError`]: the failure kinds a C10 converter can surface to a
//! caller. Every other malformed-input shape (a `Box` object reaching a
//! GIA-bound walk, a latch roster inconsistency) is a caller bug and
//! surfaces as a panic per spec.md §7's "programmer error" row rather
//! than growing this enum further.

use bcore_ntk::FuncKind;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AdapterError {
    /// `ntk_to_gia` was asked to convert a network whose function tag
    /// isn't `FuncKind::Aig`.
    #[error("cannot convert a {actual:?}-tagged network to an AND-only substrate; only FuncKind::Aig qualifies")]
    MixedFunctionTags { actual: FuncKind },

    /// A node has a fanin count a strictly two-input (or zero-fanin
    /// constant) AND representation can't hold.
    #[error("object {object} has {fanins} fanins, which a strictly two-input AND representation can't hold")]
    FaninArityOverflow { object: String, fanins: usize },

    /// The source network has a combinational cycle.
    #[error("network contains a combinational cycle")]
    CyclicNetwork,
}
