//! GIA <-> MiniAIG: both already use the same `var * 2 + complement`
//! literal encoding (spec.md §6), so the conversion is a direct
//! reindexing rather than a structural rebuild.

use bcore_entity::EntityRef;
use bcore_gia::{Gia, GiaId, GiaObj, Lit as GiaLit};
use bcore_miniaig::{Kind, MiniAig, SENTINEL};

fn gia_raw(map: &[u32], raw: u32) -> u32 {
    let var = raw >> 1;
    let compl = raw & 1;
    map[var as usize] * 2 + compl
}

/// Transcribe `gia` into a [`MiniAig`] one object at a time. GIA's
/// object order is already a valid MiniAIG entry order (every fanin
/// precedes its consumer), so no structural hashing or reordering is
/// needed. This is purely a format change.
pub fn gia_to_miniaig(gia: &Gia) -> MiniAig {
    let mut out = MiniAig::new();
    let mut map: Vec<u32> = vec![0; gia.num_objects()];

    for obj_idx in 1..gia.num_objects() {
        let id = GiaId::new(obj_idx);
        match gia.object(id) {
            GiaObj::Const => unreachable!("object 0 is the only constant"),
            GiaObj::Input => {
                map[obj_idx] = out.append_input();
            }
            GiaObj::And { f0, f1 } => {
                let nf0 = gia_raw(&map, f0.raw());
                let nf1 = gia_raw(&map, f1.raw());
                map[obj_idx] = out.append_and(nf0, nf1);
            }
            GiaObj::Output { driver } => {
                let nd = gia_raw(&map, driver.raw());
                out.append_output(nd);
            }
        }
    }
    out.set_num_regs(gia.num_regs());
    out
}

fn miniaig_raw(map: &[Option<GiaLit>], raw: u32) -> GiaLit {
    let var = raw >> 1;
    let compl = raw & 1 == 1;
    map[var as usize]
        .expect("MiniAIG entry visited before use (entries are topologically ordered)")
        .negate_if(compl)
}

/// Rebuild a [`Gia`] from a [`MiniAig`]. Unlike the reverse direction,
/// `Gia::and` structurally hashes and constant-folds as it goes, so a
/// node's resulting literal can itself come back complemented (e.g. two
/// MiniAIG entries with identical fanin sets collapse to one GIA node);
/// `map` therefore stores the full literal the entry resolved to, and
/// every later reference folds in its own edge complement on top of
/// that via `negate_if`.
pub fn miniaig_to_gia(m: &MiniAig) -> Gia {
    let mut gia = Gia::new();
    let mut map: Vec<Option<GiaLit>> = vec![None; m.len()];
    map[0] = Some(gia.const0());

    for idx in 1..m.len() {
        let id = idx as u32;
        match m.kind(id) {
            Kind::Const => unreachable!("entry 0 is the only constant"),
            Kind::Input => map[idx] = Some(gia.append_input()),
            Kind::And { f0, f1 } => {
                let l0 = miniaig_raw(&map, f0);
                let l1 = miniaig_raw(&map, f1);
                map[idx] = Some(gia.and(l0, l1));
            }
            Kind::Output { driver } => {
                let l = miniaig_raw(&map, driver);
                gia.append_output(l);
            }
        }
    }
    gia.set_num_regs(m.num_regs());
    gia
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_gia() -> Gia {
        let mut g = Gia::new();
        let a = g.append_input();
        let b = g.append_input();
        let c = g.append_input();
        let ab = g.and(a, b);
        let abc = g.and(ab, c.negate());
        g.append_output(abc);
        g.append_output(a);
        g
    }

    #[test]
    fn gia_to_miniaig_preserves_object_and_io_counts() {
        let g = sample_gia();
        let m = gia_to_miniaig(&g);
        assert_eq!(m.len(), g.num_objects());
    }

    #[test]
    fn round_trip_through_miniaig_is_functionally_identical() {
        let g = sample_gia();
        let m = gia_to_miniaig(&g);
        let back = miniaig_to_gia(&m);

        assert_eq!(back.num_inputs(), g.num_inputs());
        assert_eq!(back.num_outputs(), g.num_outputs());

        // Evaluate both networks on every input assignment and compare
        // every output bit, per spec.md §8 invariant 3.
        for assignment in 0u32..8 {
            let eval = |gia: &Gia| -> Vec<bool> {
                let mut vals = vec![false; gia.num_objects()];
                for (i, &input) in gia.inputs().iter().enumerate() {
                    vals[input.index()] = (assignment >> i) & 1 == 1;
                }
                for idx in 1..gia.num_objects() {
                    let id = GiaId::new(idx);
                    if let GiaObj::And { f0, f1 } = gia.object(id) {
                        let v0 = vals[f0.var() as usize] ^ f0.is_compl();
                        let v1 = vals[f1.var() as usize] ^ f1.is_compl();
                        vals[idx] = v0 && v1;
                    }
                }
                gia.outputs()
                    .iter()
                    .map(|&o| {
                        let d = gia.output_driver(o);
                        vals[d.var() as usize] ^ d.is_compl()
                    })
                    .collect()
            };
            assert_eq!(eval(&g), eval(&back));
        }
    }

    #[test]
    fn sentinel_never_appears_as_a_live_literal() {
        let g = sample_gia();
        let m = gia_to_miniaig(&g);
        for &(f0, f1) in m.entries().iter().skip(1) {
            if f1 != SENTINEL {
                // an AND entry: neither fanin is ever the sentinel.
                assert_ne!(f0, SENTINEL);
            }
        }
    }
}
