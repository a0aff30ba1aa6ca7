//! fCheck: independent verification of rewire equivalence (spec.md
//! §4.4's "Failure semantics" and §7's `VerificationMismatch` kind).
//!
//! This is a belt-and-suspenders check, not part of the normal rewrite
//! path: `expand_one`/`reduce_one` already gate every move on the care
//! set, so a mismatch here means one of them has a bug.

use crate::care;
use crate::miaig::Miaig;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RewireError {
    #[error("rewired network disagrees with the original on minterm {minterm} of output {output}, outside that output's exclusion care-set")]
    VerificationMismatch { output: usize, minterm: u32 },
}

/// Simulate `original` and `rewired` and confirm they agree on every
/// minterm of every primary output outside that output's exclusion
/// care-set (spec.md §8 invariant 5). Returns the first disagreement
/// found, if any.
pub fn check_equivalence(original: &Miaig, rewired: &Miaig) -> Result<(), RewireError> {
    assert_eq!(original.num_inputs(), rewired.num_inputs(), "fCheck requires matching input counts");
    assert_eq!(original.num_outputs(), rewired.num_outputs(), "fCheck requires matching output counts");

    let (orig_tt, k) = care::simulate_all(original);
    let (new_tt, _k2) = care::simulate_all(rewired);

    for i in 0..original.num_outputs() {
        let of = care::node_function(&orig_tt, original.outputs()[i]);
        let nf = care::node_function(&new_tt, rewired.outputs()[i]);
        let diff = of.xor(&nf);
        let observed = match original.exclusion(i) {
            Some(excl) => diff.and(excl),
            None => diff,
        };
        if !observed.is_zero() {
            let minterm = observed.first_differing_bit(&bcore_truth::TruthTableBuf::zero(k)).unwrap_or(0);
            log::warn!("fCheck: output {i} disagrees with the original at minterm {minterm}");
            debug_assert!(false, "fCheck violation on output {i} at minterm {minterm}");
            return Err(RewireError::VerificationMismatch { output: i, minterm });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_networks_pass_fcheck() {
        let mut m = Miaig::new();
        let a = m.append_input();
        let b = m.append_input();
        let f = m.and(&[a, b]);
        m.append_output(f, None);
        let dup = m.clone();
        assert!(check_equivalence(&m, &dup).is_ok());
    }

    #[test]
    fn diverging_networks_fail_fcheck() {
        let mut m = Miaig::new();
        let a = m.append_input();
        let b = m.append_input();
        let f = m.and(&[a, b]);
        m.append_output(f, None);

        let mut other = Miaig::new();
        let oa = other.append_input();
        let ob = other.append_input();
        let of = other.and(&[oa.negate(), ob]);
        other.append_output(of, None);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| check_equivalence(&m, &other)));
        match result {
            Ok(r) => assert!(r.is_err()),
            Err(_) => {} // debug_assert! fired first, which is also a valid signal of the mismatch
        }
    }
}
