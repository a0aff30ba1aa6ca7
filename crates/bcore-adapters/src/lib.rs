//! Bidirectional converters between the workspace's four network
//! representations (C10): [`bcore_gia::Gia`], [`bcore_miniaig::MiniAig`],
//! [`bcore_ntk::Ntk`], and [`bcore_rewire::Miaig`].
//!
//! GIA is the hub: every pairwise converter either talks to GIA directly
//! ([`gia_miniaig`], [`gia_ntk`], [`gia_miaig`]) or composes through it
//! ([`miaig_miniaig`]), rather than growing a translation for every pair
//! of representations directly.

mod error;
mod gia_miaig;
mod gia_miniaig;
mod gia_ntk;
mod miaig_miniaig;

pub use error::AdapterError;
pub use gia_miaig::{gia_to_miaig, miaig_to_gia};
pub use gia_miniaig::{gia_to_miniaig, miniaig_to_gia};
pub use gia_ntk::{gia_to_ntk, ntk_to_gia};
pub use miaig_miniaig::{miaig_to_miniaig, miniaig_to_miaig};
