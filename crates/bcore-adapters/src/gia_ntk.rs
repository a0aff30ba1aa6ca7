//! GIA <-> Ntk: `gia_to_ntk` builds a strashed, AIG-tagged [`Ntk`] whose
//! nodes are exactly GIA's AND nodes; `ntk_to_gia` requires the reverse
//! (spec.md §4.2's duplication-algorithm note that converting a
//! non-AIG-tagged network through an AND-only substrate is a programmer
//! error, not a recoverable one).
//!
//! Neither GIA nor Ntk has a first-class constant object (GIA folds
//! constants into its literal encoding instead; Ntk has no `Obj::Const`
//! variant at all). `gia_to_ntk` represents GIA's constant-false node,
//! when actually referenced by a driver, as a zero-fanin `Aig` node.
//! `Ntk`'s own integrity checker never enforces an arity on `Aig` nodes,
//! so this is accepted without any change to `bcore-ntk` itself.
//!
//! GIA's trailing `num_regs` CI/CO pairs round-trip as `Ntk` latches:
//! `gia_to_ntk` gives every imported latch a placeholder data-input fanin
//! (the lazily-created constant node) and redirects it once the real
//! driver cone has been built, the same self-loop-then-redirect idiom
//! `bcore-ntk`'s own duplication pass uses for sequential feedback.

use crate::AdapterError;
use bcore_entity::EntityRef;
use bcore_gia::{Gia, GiaId, GiaObj, Lit as GiaLit};
use bcore_ntk::{Fanin, FuncKind, IntegrityError, LocalFunc, Ntk, NtkType, Obj};
use smallvec::SmallVec;

fn translate_fanin(
    ntk: &mut Ntk,
    map: &mut [Option<bcore_ntk::ObjId>],
    const_node: &mut Option<bcore_ntk::ObjId>,
    lit: GiaLit,
) -> Fanin {
    let var = lit.var();
    let id = if var == 0 {
        *const_node.get_or_insert_with(|| ntk.append_node(SmallVec::new(), LocalFunc::Aig))
    } else {
        map[var as usize].expect("fanin visited before use (GIA objects precede their consumers)")
    };
    Fanin::new(id, lit.is_compl())
}

/// Build a strashed, AIG-tagged [`Ntk`] with the same PI/AND/PO/latch
/// structure as `gia`. Always succeeds: every GIA is already a valid
/// AND-only network.
pub fn gia_to_ntk(gia: &Gia) -> Ntk {
    let num_regs = gia.num_regs() as usize;
    let ty = if num_regs > 0 { NtkType::Sequential } else { NtkType::Strashed };
    let mut ntk = Ntk::new(ty, FuncKind::Aig);
    let mut map: Vec<Option<bcore_ntk::ObjId>> = vec![None; gia.num_objects()];
    let mut const_node: Option<bcore_ntk::ObjId> = None;

    let num_plain_inputs = gia.inputs().len() - num_regs;
    for (idx, &ci) in gia.inputs()[..num_plain_inputs].iter().enumerate() {
        let id = ntk.append_pi(&format!("pi{idx}"));
        map[ci.index()] = Some(id);
    }

    // Register outputs (the latches' Q side) get a placeholder
    // data-input fanin now; the real driver is wired up below once the
    // AND cone that computes it exists.
    let mut latch_ids = Vec::with_capacity(num_regs);
    for (idx, &ci) in gia.inputs()[num_plain_inputs..].iter().enumerate() {
        let placeholder = *const_node.get_or_insert_with(|| ntk.append_node(SmallVec::new(), LocalFunc::Aig));
        let id = ntk.append_latch(Fanin::new(placeholder, false), bcore_ntk::ResetValue::DontCare, &format!("reg{idx}"));
        map[ci.index()] = Some(id);
        latch_ids.push(id);
    }

    for id in gia.dfs_order() {
        if let GiaObj::And { f0, f1 } = gia.object(id) {
            let mut fanins = SmallVec::new();
            fanins.push(translate_fanin(&mut ntk, &mut map, &mut const_node, *f0));
            fanins.push(translate_fanin(&mut ntk, &mut map, &mut const_node, *f1));
            let node = ntk.append_node(fanins, LocalFunc::Aig);
            map[id.index()] = Some(node);
        }
    }

    let num_plain_outputs = gia.outputs().len() - num_regs;
    for (idx, &po) in gia.outputs()[..num_plain_outputs].iter().enumerate() {
        let driver = gia.output_driver(po);
        let fanin = translate_fanin(&mut ntk, &mut map, &mut const_node, driver);
        ntk.append_po(fanin, &format!("po{idx}"));
    }
    for (idx, &po) in gia.outputs()[num_plain_outputs..].iter().enumerate() {
        let driver = gia.output_driver(po);
        let fanin = translate_fanin(&mut ntk, &mut map, &mut const_node, driver);
        ntk.redirect_fanin(latch_ids[idx], fanin);
    }

    ntk
}

fn translate_ntk_fanin(map: &[Option<GiaLit>], fanin: Fanin) -> GiaLit {
    map[fanin.id.index()]
        .expect("fanin visited before use (topo_order is a valid topological order)")
        .negate_if(fanin.complement)
}

/// Rebuild a [`Gia`] from an AIG-tagged [`Ntk`]. Every `Node` must have
/// exactly two fanins (the ordinary AND case) or zero (the constant
/// convention `gia_to_ntk` uses); any other arity can't be placed in
/// GIA's strictly binary substrate.
pub fn ntk_to_gia(ntk: &Ntk) -> Result<Gia, AdapterError> {
    if ntk.func() != FuncKind::Aig {
        return Err(AdapterError::MixedFunctionTags { actual: ntk.func() });
    }
    match bcore_ntk::check(ntk) {
        Ok(()) => {}
        Err(IntegrityError::CombinationalCycle(_)) => return Err(AdapterError::CyclicNetwork),
        Err(other) => panic!("ntk_to_gia: malformed network reached the adapter ({other})"),
    }

    let mut gia = Gia::new();
    let mut map: Vec<Option<GiaLit>> = vec![None; ntk.num_objects()];

    for &pi in ntk.pis() {
        map[pi.index()] = Some(gia.append_input());
    }
    for &latch in ntk.latches() {
        map[latch.index()] = Some(gia.append_input());
    }

    for id in ntk.topo_order() {
        if let Obj::Node { fanins, .. } = ntk.object(id) {
            match fanins.len() {
                0 => map[id.index()] = Some(gia.const0()),
                2 => {
                    let f0 = translate_ntk_fanin(&map, fanins[0]);
                    let f1 = translate_ntk_fanin(&map, fanins[1]);
                    map[id.index()] = Some(gia.and(f0, f1));
                }
                n => {
                    return Err(AdapterError::FaninArityOverflow {
                        object: id.to_string(),
                        fanins: n,
                    })
                }
            }
        }
    }

    for &po in ntk.pos() {
        let driver = match ntk.object(po) {
            Obj::Po(f) => *f,
            _ => unreachable!("Ntk::pos() only holds Po objects"),
        };
        let lit = translate_ntk_fanin(&map, driver);
        gia.append_output(lit);
    }
    for &latch in ntk.latches() {
        let driver = match ntk.object(latch) {
            Obj::Latch { fanin, .. } => *fanin,
            _ => unreachable!("Ntk::latches() only holds Latch objects"),
        };
        let lit = translate_ntk_fanin(&map, driver);
        gia.append_output(lit);
    }
    gia.set_num_regs(ntk.latches().len() as u32);

    Ok(gia)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gia_to_ntk_carries_over_the_and_structure() {
        let mut g = Gia::new();
        let a = g.append_input();
        let b = g.append_input();
        let ab = g.and(a, b);
        g.append_output(ab);

        let ntk = gia_to_ntk(&g);
        assert_eq!(ntk.pis().len(), 2);
        assert_eq!(ntk.pos().len(), 1);
        assert_eq!(bcore_ntk::check(&ntk), Ok(()));
    }

    #[test]
    fn ntk_to_gia_rejects_non_aig_function_tags() {
        let ntk = Ntk::new(NtkType::Strashed, FuncKind::Sop);
        let err = ntk_to_gia(&ntk).unwrap_err();
        assert_eq!(err, AdapterError::MixedFunctionTags { actual: FuncKind::Sop });
    }

    #[test]
    fn round_trip_gia_ntk_gia_preserves_output_count() {
        let mut g = Gia::new();
        let a = g.append_input();
        let b = g.append_input();
        let c = g.append_input();
        let ab = g.and(a, b);
        let abc = g.and(ab, c);
        g.append_output(abc);
        g.append_output(a.negate());

        let ntk = gia_to_ntk(&g);
        let back = ntk_to_gia(&ntk).unwrap();
        assert_eq!(back.num_inputs(), g.num_inputs());
        assert_eq!(back.num_outputs(), g.num_outputs());
    }

    #[test]
    fn constant_output_survives_the_round_trip() {
        let mut g = Gia::new();
        let a = g.append_input();
        let driver = g.and(a, a.negate());
        g.append_output(driver);
        assert!(driver.is_const0());

        let ntk = gia_to_ntk(&g);
        let back = ntk_to_gia(&ntk).unwrap();
        assert_eq!(back.output_driver(back.outputs()[0]), GiaLit::const0());
    }

    #[test]
    fn sequential_registers_round_trip_through_latches() {
        let mut g = Gia::new();
        let en = g.append_input();
        let reg_out = g.append_input();
        let fed = g.and(en, reg_out);
        g.append_output(fed);
        g.set_num_regs(1);

        let ntk = gia_to_ntk(&g);
        assert_eq!(ntk.latches().len(), 1);
        assert_eq!(bcore_ntk::check(&ntk), Ok(()));

        let back = ntk_to_gia(&ntk).unwrap();
        assert_eq!(back.num_regs(), 1);
        assert_eq!(back.num_inputs(), g.num_inputs());
        assert_eq!(back.num_outputs(), g.num_outputs());
    }
}
