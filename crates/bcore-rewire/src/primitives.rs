//! The four fanin-rewiring primitives of spec.md §4.4: `expand-one`,
//! `reduce-one`, their bounded sequential pairing, and `share`.

use crate::care::{self, node_function};
use crate::miaig::{Lit, Miaig, NodeId, NodeState, Obj};
use bcore_entity::EntityRef;
use bcore_truth::TruthTableBuf;
use std::collections::HashMap;

/// Point every fanin edge and output driver currently reading `from`
/// (at whatever polarity) at `to` instead — the rewrite shared by
/// `reduce-one`'s buffer/constant cases.
fn redirect(miaig: &mut Miaig, from: NodeId, to: Lit) {
    let consumers = miaig.fanouts(from).to_vec();
    for consumer in consumers {
        if let Obj::And { fanins } = miaig.object(consumer).clone() {
            let new_fanins: Vec<Lit> = fanins
                .iter()
                .map(|f| if f.node() == from { to.negate_if(f.is_compl()) } else { *f })
                .collect();
            miaig.rewrite_fanins(consumer, new_fanins);
        }
    }
    for i in 0..miaig.num_outputs() {
        let driver = miaig.outputs()[i];
        if driver.node() == from {
            miaig.replace_output(i, to.negate_if(driver.is_compl()));
        }
    }
}

/// Try to add one candidate fanin to `pivot` without changing its
/// observable behavior. Candidates are tried in descending-level order
/// (ties broken by descending refcount, per spec.md §4.4's ordering
/// rule), each at whichever polarity works first. Returns whether a
/// fanin was actually added.
pub fn expand_one(miaig: &mut Miaig, pivot: NodeId, candidates: &[NodeId], max_fanins: usize) -> bool {
    let fanins = match miaig.object(pivot) {
        Obj::And { fanins } => fanins.clone(),
        Obj::Input => return false,
    };
    if fanins.len() >= max_fanins {
        return false;
    }

    let tfo = care::transitive_fanout(miaig, pivot);
    let (tt, k) = care::simulate_all(miaig);
    let care_set = care::observability_care_with(miaig, pivot, &tt, &tfo, k);
    let old_fn = node_function(&tt, Lit::new(pivot.index() as u32, false));

    let mut ordered: Vec<NodeId> = candidates
        .iter()
        .copied()
        .filter(|c| *c != pivot && !tfo.contains(c) && !fanins.iter().any(|f| f.node() == *c))
        .collect();
    ordered.sort_by(|a, b| {
        miaig
            .level(*b)
            .cmp(&miaig.level(*a))
            .then(miaig.refcount(*b).cmp(&miaig.refcount(*a)))
    });

    for cand in ordered {
        for &polarity in &[false, true] {
            let cand_lit = Lit::new(cand.index() as u32, polarity);
            let new_fn = old_fn.and(&node_function(&tt, cand_lit));
            if old_fn.equal_on_care(&new_fn, &care_set) {
                let mut new_fanins = fanins.clone();
                new_fanins.push(cand_lit);
                miaig.rewrite_fanins(pivot, new_fanins);
                miaig.set_state(pivot, NodeState::Expanded);
                return true;
            }
        }
    }
    false
}

/// Try to shrink `pivot`'s fanin list without changing its observable
/// behavior: first check whether the node is now constant or equal to
/// one of its own fanins on the care set (dropping straight to
/// [`NodeState::Final`]), then try dropping fanins one at a time in
/// ascending-level order. Returns whether anything changed.
pub fn reduce_one(miaig: &mut Miaig, pivot: NodeId) -> bool {
    let fanins = match miaig.object(pivot) {
        Obj::And { fanins } => fanins.clone(),
        Obj::Input => return false,
    };
    if fanins.is_empty() {
        return false;
    }

    let tfo = care::transitive_fanout(miaig, pivot);
    let (tt, k) = care::simulate_all(miaig);
    let care_set = care::observability_care_with(miaig, pivot, &tt, &tfo, k);
    let old_fn = node_function(&tt, Lit::new(pivot.index() as u32, false));

    if old_fn.equal_on_care(&TruthTableBuf::zero(k), &care_set) {
        redirect(miaig, pivot, Lit::const0());
        miaig.set_state(pivot, NodeState::Final);
        return true;
    }
    if old_fn.equal_on_care(&TruthTableBuf::one(k), &care_set) {
        redirect(miaig, pivot, Lit::const1());
        miaig.set_state(pivot, NodeState::Final);
        return true;
    }
    for &f in &fanins {
        if old_fn.equal_on_care(&node_function(&tt, f), &care_set) {
            redirect(miaig, pivot, f);
            miaig.set_state(pivot, NodeState::Final);
            return true;
        }
    }

    let mut slots: Vec<usize> = (0..fanins.len()).collect();
    slots.sort_by_key(|&i| miaig.level(fanins[i].node()));
    for i in slots {
        let reduced: Vec<Lit> = fanins.iter().copied().enumerate().filter(|(j, _)| *j != i).map(|(_, f)| f).collect();
        if reduced.is_empty() {
            continue;
        }
        let reduced_fn = reduced
            .iter()
            .fold(TruthTableBuf::one(k), |acc, f| acc.and(&node_function(&tt, *f)));
        if old_fn.equal_on_care(&reduced_fn, &care_set) {
            miaig.rewrite_fanins(pivot, reduced);
            miaig.set_state(pivot, NodeState::Reduced);
            return true;
        }
    }
    false
}

/// Run `expand-one` then `reduce-one` once each, bounded to a single
/// attempt apiece.
pub fn expand_then_reduce_one(miaig: &mut Miaig, pivot: NodeId, candidates: &[NodeId], max_fanins: usize) -> bool {
    let expanded = expand_one(miaig, pivot, candidates, max_fanins);
    let reduced = reduce_one(miaig, pivot);
    expanded || reduced
}

/// Factor out common fanin pairs across the whole network: repeatedly
/// find the pair of literals appearing in the most distinct AND nodes
/// (at least two), introduce one shared AND realizing it, and rewrite
/// every node that used the pair to use the shared node instead. Stops
/// after `budget` pairs or once no pair repeats.
pub fn share(miaig: &mut Miaig, budget: usize) -> usize {
    let mut applied = 0;
    for _ in 0..budget {
        let mut counts: HashMap<(Lit, Lit), Vec<NodeId>> = HashMap::new();
        for idx in 0..miaig.num_objects() {
            let id = NodeId::new(idx);
            if let Obj::And { fanins } = miaig.object(id) {
                if fanins.len() < 2 {
                    continue;
                }
                for i in 0..fanins.len() {
                    for j in (i + 1)..fanins.len() {
                        let (a, b) = (fanins[i].min(fanins[j]), fanins[i].max(fanins[j]));
                        counts.entry((a, b)).or_default().push(id);
                    }
                }
            }
        }

        // `HashMap` iteration order is randomized per-instance; break
        // ties on pair identity so the choice doesn't depend on it.
        let mut ranked: Vec<((Lit, Lit), Vec<NodeId>)> = counts.into_iter().filter(|(_, nodes)| nodes.len() >= 2).collect();
        ranked.sort_by(|(pa, na), (pb, nb)| nb.len().cmp(&na.len()).then(pa.cmp(pb)));
        let Some(((a, b), nodes)) = ranked.into_iter().next() else {
            break;
        };

        let shared_lit = miaig.and(&[a, b]);
        for node in nodes {
            if node == shared_lit.node() {
                continue;
            }
            if let Obj::And { fanins } = miaig.object(node).clone() {
                let mut new_fanins: Vec<Lit> = fanins.iter().copied().filter(|f| *f != a && *f != b).collect();
                new_fanins.push(shared_lit);
                miaig.rewrite_fanins(node, new_fanins);
                miaig.set_state(node, NodeState::Shared);
            }
        }
        applied += 1;
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miaig::Miaig;

    #[test]
    fn expand_one_inserts_a_redundant_fanin() {
        // f = a AND b; (a OR b) is already implied whenever f is, so
        // AND-ing it in changes nothing observable.
        let mut m = Miaig::new();
        let a = m.append_input();
        let b = m.append_input();
        let f = m.and(&[a, b]);
        m.append_output(f, None);

        // c = a OR b, built as NOT(NOT a AND NOT b).
        let not_a_and_not_b = m.and(&[a.negate(), b.negate()]);
        let or_ab = not_a_and_not_b.negate();
        let candidate = or_ab.node();

        let expanded = expand_one(&mut m, f.node(), &[candidate], 4);
        assert!(expanded);
        if let Obj::And { fanins } = m.object(f.node()) {
            assert_eq!(fanins.len(), 3);
        } else {
            panic!("pivot should still be an AND node");
        }
    }

    #[test]
    fn reduce_one_drops_a_redundant_fanin() {
        let mut m = Miaig::new();
        let a = m.append_input();
        let b = m.append_input();
        let not_a_and_not_b = m.and(&[a.negate(), b.negate()]);
        let or_ab = not_a_and_not_b.negate();
        let f = m.and(&[a, b, or_ab]);
        m.append_output(f, None);

        let reduced = reduce_one(&mut m, f.node());
        assert!(reduced);
        if let Obj::And { fanins } = m.object(f.node()) {
            assert_eq!(fanins.len(), 2);
        } else {
            panic!("pivot should still be an AND node");
        }
    }

    #[test]
    fn reduce_one_collapses_to_a_buffer() {
        // f = a AND b, where b = a OR c, so f's function is just a.
        let mut m = Miaig::new();
        let a = m.append_input();
        let c = m.append_input();
        let not_a_and_not_c = m.and(&[a.negate(), c.negate()]);
        let b = not_a_and_not_c.negate(); // a OR c
        let f = m.and(&[a, b]);
        m.append_output(f, None);

        let reduced = reduce_one(&mut m, f.node());
        assert!(reduced);
        // `f`'s own object entry is left in place (only its consumers and
        // the output are redirected); the PO driver should now bypass it
        // and point straight at `a`.
        assert_eq!(m.outputs()[0], a);
    }

    #[test]
    fn share_factors_a_repeated_pair() {
        let mut m = Miaig::new();
        let a = m.append_input();
        let b = m.append_input();
        let c = m.append_input();
        let d = m.append_input();
        let n1 = m.and(&[a, b, c]);
        let n2 = m.and(&[a, b, d]);
        m.append_output(n1, None);
        m.append_output(n2, None);

        let before = m.cost();
        let applied = share(&mut m, 4);
        assert_eq!(applied, 1);
        assert!(m.cost() < before, "sharing the (a, b) pair should reduce AND2 cost");
    }
}
