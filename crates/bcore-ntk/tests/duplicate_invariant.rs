//! Invariant 4: round-trip Ntk DFS duplication (spec.md §8). `duplicate`
//! must produce a network that passes integrity checking and has
//! identical PI/PO order, names, and per-node fanin arity to the
//! original, up to the old-id -> new-id copy mapping.

use bcore_ntk::{check, duplicate, Fanin, FuncKind, LocalFunc, Ntk, NtkType, Obj, ResetValue};
use smallvec::SmallVec;

fn aig_and(ntk: &mut Ntk, a: Fanin, b: Fanin) -> bcore_ntk::ObjId {
    let mut fanins = SmallVec::new();
    fanins.push(a);
    fanins.push(b);
    ntk.append_node(fanins, LocalFunc::Aig)
}

#[test]
fn duplicate_preserves_shape_names_and_passes_integrity() {
    let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Aig);
    let a = ntk.append_pi("a");
    let b = ntk.append_pi("b");
    let c = ntk.append_pi("c");
    let ab = aig_and(&mut ntk, Fanin::new(a, false), Fanin::new(b, true));
    let abc = aig_and(&mut ntk, Fanin::new(ab, false), Fanin::new(c, false));
    ntk.append_po(Fanin::new(abc, false), "y0");
    ntk.append_po(Fanin::new(a, true), "y1");

    let copy = duplicate(&ntk);
    assert_eq!(check(&copy), Ok(()));

    assert_eq!(copy.pis().len(), ntk.pis().len());
    assert_eq!(copy.pos().len(), ntk.pos().len());
    assert_eq!(copy.num_objects(), ntk.num_objects());

    for i in 0..ntk.pis().len() {
        assert_eq!(copy.name_of(copy.pis()[i]), ntk.name_of(ntk.pis()[i]));
    }
    for i in 0..ntk.pos().len() {
        assert_eq!(copy.name_of(copy.pos()[i]), ntk.name_of(ntk.pos()[i]));
        let (Obj::Po(orig_fanin), Obj::Po(copy_fanin)) = (ntk.object(ntk.pos()[i]), copy.object(copy.pos()[i])) else {
            unreachable!("pos() only holds Po objects");
        };
        assert_eq!(orig_fanin.complement, copy_fanin.complement);
    }
}

/// The feedback case duplicate.rs is actually built for: a latch whose
/// data input depends on its own (not yet built) output.
#[test]
fn duplicate_resolves_latch_feedback_without_leaving_a_self_loop() {
    let mut ntk = Ntk::new(NtkType::Sequential, FuncKind::Aig);
    let en = ntk.append_pi("en");
    let latch = ntk.append_latch(Fanin::new(en, false), ResetValue::Zero, "q");
    let fedback = aig_and(&mut ntk, Fanin::new(en, false), Fanin::new(latch, false));
    ntk.redirect_fanin(latch, Fanin::new(fedback, false));

    let copy = duplicate(&ntk);
    assert_eq!(check(&copy), Ok(()));
    assert_eq!(copy.latches().len(), 1);

    let new_latch = copy.latches()[0];
    let Obj::Latch { fanin, .. } = copy.object(new_latch) else {
        unreachable!("latches() only holds Latch objects");
    };
    assert_ne!(fanin.id, new_latch, "placeholder self-loop must be redirected");
}
