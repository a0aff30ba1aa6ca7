//! Observability-care computation (spec.md §4.4): a pivot's care set is
//! the union, over every primary output, of the toggled-pivot ("shadow")
//! simulation disagreeing with the original — restricted by that
//! output's exclusion care-set, if any.
//!
//! Simulated once per query with packed truth tables sized `2^k` where
//! `k` is the network's primary-input count (spec.md's stated bound is
//! `k <= 58`, comfortably inside `bcore-truth`'s packed-word
//! representation).

use crate::miaig::{Lit, Miaig, NodeId, Obj};
use bcore_entity::{EntityRef, SecondaryMap};
use bcore_truth::TruthTableBuf;
use std::collections::{HashMap, HashSet};

pub const MAX_WINDOW_VARS: u32 = 58;

fn input_ordinals(miaig: &Miaig) -> HashMap<NodeId, u32> {
    miaig.inputs().iter().enumerate().map(|(i, &id)| (id, i as u32)).collect()
}

/// Every object's function over the network's whole primary-input set,
/// indexed by object id. Objects are always appended with strictly
/// lower-indexed fanins, so a single ascending pass is already
/// topological.
pub(crate) fn simulate_all(miaig: &Miaig) -> (SecondaryMap<NodeId, TruthTableBuf>, u32) {
    let k = miaig.num_inputs() as u32;
    assert!(k <= MAX_WINDOW_VARS, "rewire window of {k} inputs exceeds the {MAX_WINDOW_VARS}-variable cap");
    let ordinals = input_ordinals(miaig);
    let mut tt: SecondaryMap<NodeId, TruthTableBuf> = SecondaryMap::with_default(TruthTableBuf::zero(k));

    for idx in 0..miaig.num_objects() {
        let id = NodeId::new(idx);
        let value = match miaig.object(id) {
            Obj::Input => match ordinals.get(&id) {
                Some(&ord) => TruthTableBuf::elementary(k, ord),
                None => TruthTableBuf::zero(k), // object 0: the constant-false node
            },
            Obj::And { fanins } => {
                let mut acc = TruthTableBuf::one(k);
                for f in fanins {
                    acc = acc.and(&node_function(&tt, *f));
                }
                acc
            }
        };
        tt[id] = value;
    }
    (tt, k)
}

/// The function of literal `lit` given a simulation table built by
/// [`simulate_all`] — applies `lit`'s own complement on top of its
/// node's regular (stored) function.
pub(crate) fn node_function(tt: &SecondaryMap<NodeId, TruthTableBuf>, lit: Lit) -> TruthTableBuf {
    tt[lit.node()].cond_not(lit.is_compl())
}

/// Every object reachable forward from `pivot` through fanout edges
/// (not including `pivot` itself).
pub(crate) fn transitive_fanout(miaig: &Miaig, pivot: NodeId) -> HashSet<NodeId> {
    let mut tfo = HashSet::new();
    let mut stack = vec![pivot];
    while let Some(id) = stack.pop() {
        for &c in miaig.fanouts(id) {
            if tfo.insert(c) {
                stack.push(c);
            }
        }
    }
    tfo
}

/// The observability care-set at `pivot`, given an already-computed
/// simulation and transitive fanout (the shared-work path used by
/// `expand-one`/`reduce-one`, which need the same simulation for their
/// own equivalence checks).
pub(crate) fn observability_care_with(
    miaig: &Miaig,
    pivot: NodeId,
    original: &SecondaryMap<NodeId, TruthTableBuf>,
    tfo: &HashSet<NodeId>,
    k: u32,
) -> TruthTableBuf {
    let mut shadow = original.clone();
    shadow[pivot] = original[pivot].not();

    let mut order: Vec<NodeId> = tfo.iter().copied().collect();
    order.sort_by_key(|id| id.index());
    for id in order {
        if let Obj::And { fanins } = miaig.object(id) {
            let mut acc = TruthTableBuf::one(k);
            for f in fanins {
                acc = acc.and(&shadow[f.node()].cond_not(f.is_compl()));
            }
            shadow[id] = acc;
        }
    }

    let mut care = TruthTableBuf::zero(k);
    for (i, &driver) in miaig.outputs().iter().enumerate() {
        let orig_po = original[driver.node()].cond_not(driver.is_compl());
        let shadow_po = shadow[driver.node()].cond_not(driver.is_compl());
        let diff = orig_po.xor(&shadow_po);
        let masked = match miaig.exclusion(i) {
            Some(excl) => diff.and(excl),
            None => diff,
        };
        care = care.or(&masked);
    }
    care
}

/// The observability care-set at `pivot`, recomputing its own
/// simulation and transitive fanout — the convenience entry point for
/// one-off queries (tests, or callers outside a rewire pass that
/// doesn't already have a simulation in hand).
pub fn observability_care(miaig: &Miaig, pivot: NodeId) -> TruthTableBuf {
    let (tt, k) = simulate_all(miaig);
    let tfo = transitive_fanout(miaig, pivot);
    observability_care_with(miaig, pivot, &tt, &tfo, k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miaig::Miaig;

    #[test]
    fn unobserved_input_has_empty_care_set() {
        // f = a AND b; c is unused, so toggling c never changes f.
        let mut m = Miaig::new();
        let a = m.append_input();
        let b = m.append_input();
        let c = m.append_input();
        let f = m.and(&[a, b]);
        m.append_output(f, None);

        let care = observability_care(&m, c.node());
        assert!(care.is_zero());
    }

    #[test]
    fn observed_fanin_has_nonempty_care_set() {
        let mut m = Miaig::new();
        let a = m.append_input();
        let b = m.append_input();
        let f = m.and(&[a, b]);
        m.append_output(f, None);

        let care = observability_care(&m, a.node());
        assert!(!care.is_zero());
    }

    #[test]
    fn exclusion_care_set_masks_observability() {
        let mut m = Miaig::new();
        let a = m.append_input();
        let b = m.append_input();
        let f = m.and(&[a, b]);
        // Exclude every minterm: nothing is observed regardless of f's
        // sensitivity to a.
        let excl = TruthTableBuf::zero(2);
        m.append_output(f, Some(excl));

        let care = observability_care(&m, a.node());
        assert!(care.is_zero());
    }
}
