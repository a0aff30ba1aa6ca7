//! Invariant 3: round-trip GIA <-> MiniAIG (spec.md §8, test placement
//! note: round-trips are integration tests here since conversion is
//! this crate's whole job).

use bcore_adapters::{gia_to_miniaig, miniaig_to_gia};
use bcore_entity::EntityRef;
use bcore_gia::{Gia, GiaId, GiaObj};

fn simulate(gia: &Gia, assignment: u32) -> Vec<bool> {
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
}

#[test]
fn gia_is_functionally_equivalent_after_a_miniaig_round_trip() {
    let mut g = Gia::new();
    let a = g.append_input();
    let b = g.append_input();
    let c = g.append_input();
    let d = g.append_input();
    let ab = g.and(a, b);
    let cd = g.and(c, d.negate());
    let out = g.and(ab, cd);
    g.append_output(out);
    g.append_output(a.negate());
    g.append_output(b);

    let m = gia_to_miniaig(&g);
    let back = miniaig_to_gia(&m);

    assert_eq!(back.num_inputs(), g.num_inputs());
    assert_eq!(back.num_outputs(), g.num_outputs());

    for assignment in 0u32..16 {
        assert_eq!(simulate(&g, assignment), simulate(&back, assignment));
    }
}
