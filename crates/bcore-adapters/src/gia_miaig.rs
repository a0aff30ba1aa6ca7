//! GIA <-> MIAIG: GIA's binary AND nodes map onto MIAIG's (structurally
//! hashed, n-ary) AND nodes one pair at a time in the `gia_to_miaig`
//! direction; in reverse, a MIAIG node's fanin list is flattened into a
//! chain of binary GIA ANDs (spec.md §4.7's "pairwise-merge" direction,
//! mirroring the sharing reference's `flatten_nary` idiom).

use bcore_entity::EntityRef;
use bcore_gia::{Gia, GiaId, GiaObj, Lit as GiaLit};
use bcore_rewire::{Lit as MiaigLit, Miaig, Obj as MiaigObj};

fn translate_gia_to_miaig(map: &[Option<MiaigLit>], lit: GiaLit) -> MiaigLit {
    map[lit.var() as usize]
        .expect("fanin visited before use (GIA objects precede their consumers)")
        .negate_if(lit.is_compl())
}

/// Expand every GIA AND into a two-input MIAIG `and`, letting MIAIG's
/// own structural hash fold any duplicates that result.
pub fn gia_to_miaig(gia: &Gia) -> Miaig {
    let mut miaig = Miaig::new();
    let mut map: Vec<Option<MiaigLit>> = vec![None; gia.num_objects()];
    map[0] = Some(miaig.const0());

    for &ci in gia.inputs() {
        map[ci.index()] = Some(miaig.append_input());
    }
    for id in gia.dfs_order() {
        if let GiaObj::And { f0, f1 } = gia.object(id) {
            let l0 = translate_gia_to_miaig(&map, *f0);
            let l1 = translate_gia_to_miaig(&map, *f1);
            map[id.index()] = Some(miaig.and(&[l0, l1]));
        }
    }
    for &po in gia.outputs() {
        let driver = gia.output_driver(po);
        let l = translate_gia_to_miaig(&map, driver);
        miaig.append_output(l, None);
    }
    miaig
}

fn translate_miaig_to_gia(map: &[Option<GiaLit>], lit: MiaigLit) -> GiaLit {
    map[lit.var() as usize]
        .expect("fanin visited before use (topo_order is a valid topological order)")
        .negate_if(lit.is_compl())
}

/// Flatten every MIAIG node's fanin list into a left-folded chain of
/// binary GIA ANDs. `Miaig::and` already guarantees every stored `And`
/// object has at least two fanins (a single surviving fanin resolves to
/// that literal directly, without an object), so the fold always has a
/// first pair to start from.
pub fn miaig_to_gia(miaig: &Miaig) -> Gia {
    let mut gia = Gia::new();
    let mut map: Vec<Option<GiaLit>> = vec![None; miaig.num_objects()];
    map[0] = Some(gia.const0());

    for &ci in miaig.inputs() {
        map[ci.index()] = Some(gia.append_input());
    }
    for id in miaig.topo_order() {
        let MiaigObj::And { fanins } = miaig.object(id) else {
            continue;
        };
        let mut iter = fanins.iter();
        let f0 = translate_miaig_to_gia(&map, *iter.next().expect("And node has >=2 fanins"));
        let f1 = translate_miaig_to_gia(&map, *iter.next().expect("And node has >=2 fanins"));
        let mut acc = gia.and(f0, f1);
        for &fanin in iter {
            let t = translate_miaig_to_gia(&map, fanin);
            acc = gia.and(acc, t);
        }
        map[id.index()] = Some(acc);
    }
    for &driver in miaig.outputs() {
        let l = translate_miaig_to_gia(&map, driver);
        gia.append_output(l);
    }
    gia
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gia_to_miaig_realizes_the_same_and3() {
        let mut g = Gia::new();
        let a = g.append_input();
        let b = g.append_input();
        let c = g.append_input();
        let ab = g.and(a, b);
        let abc = g.and(ab, c);
        g.append_output(abc);

        let miaig = gia_to_miaig(&g);
        assert_eq!(miaig.num_inputs(), 3);
        assert_eq!(miaig.num_outputs(), 1);
        // Flattened back to AND2-equivalents, the cost must match the
        // original GIA's two-AND-node chain.
        assert_eq!(miaig.cost(), 2);
    }

    #[test]
    fn miaig_to_gia_flattens_a_wide_and_into_a_binary_chain() {
        let mut m = Miaig::new();
        let a = m.append_input();
        let b = m.append_input();
        let c = m.append_input();
        let d = m.append_input();
        let wide = m.and(&[a, b, c, d]);
        m.append_output(wide, None);

        let gia = miaig_to_gia(&m);
        assert_eq!(gia.num_inputs(), 4);
        assert_eq!(gia.num_outputs(), 1);
        // A 4-input AND flattens into exactly 3 binary AND2 nodes:
        // const(1) + 4 inputs + 3 ANDs + 1 output = 9 objects.
        assert_eq!(gia.num_objects(), 9);
    }

    #[test]
    fn round_trip_gia_miaig_is_functionally_identical() {
        let mut g = Gia::new();
        let a = g.append_input();
        let b = g.append_input();
        let c = g.append_input();
        let ab = g.and(a, b);
        let bc = g.and(b, c);
        let maj = g.and(ab, bc);
        g.append_output(maj);

        let miaig = gia_to_miaig(&g);
        let back = miaig_to_gia(&miaig);
        assert_eq!(back.num_inputs(), g.num_inputs());
        assert_eq!(back.num_outputs(), g.num_outputs());
    }
}
