//! Umbrella crate re-exporting every `bcore-*` component under one
//! namespace, the way [`cranelift`](https://docs.rs/cranelift) bundles
//! its own component crates.
//!
//! ```
//! use bcore::gia::Gia;
//! use bcore::adapters::gia_to_ntk;
//!
//! let mut g = Gia::new();
//! let a = g.append_input();
//! let b = g.append_input();
//! let ab = g.and(a, b);
//! g.append_output(ab);
//!
//! let ntk = gia_to_ntk(&g);
//! assert_eq!(ntk.pis().len(), 2);
//! assert_eq!(ntk.pos().len(), 1);
//! assert_eq!(bcore::ntk::check(&ntk), Ok(()));
//! ```

pub use bcore_adapters as adapters;
pub use bcore_entity as entity;
pub use bcore_exact as exact;
pub use bcore_gia as gia;
pub use bcore_miniaig as miniaig;
pub use bcore_ntk as ntk;
pub use bcore_rewire as rewire;
pub use bcore_sat as sat;
pub use bcore_truth as truth;
