//! MIAIG <-> MiniAIG, composed through GIA rather than duplicated
//! (spec.md §4.7: "both ends already define a GIA conversion").

use crate::{gia_to_miaig, gia_to_miniaig, miaig_to_gia, miniaig_to_gia};
use bcore_miniaig::MiniAig;
use bcore_rewire::Miaig;

pub fn miniaig_to_miaig(m: &MiniAig) -> Miaig {
    gia_to_miaig(&miniaig_to_gia(m))
}

pub fn miaig_to_miniaig(m: &Miaig) -> MiniAig {
    gia_to_miniaig(&miaig_to_gia(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miniaig_round_trips_through_miaig_and_back() {
        let mut g = bcore_gia::Gia::new();
        let a = g.append_input();
        let b = g.append_input();
        let c = g.append_input();
        let ab = g.and(a, b);
        let abc = g.and(ab, c);
        g.append_output(abc);
        let m = gia_to_miniaig(&g);

        let miaig = miniaig_to_miaig(&m);
        assert_eq!(miaig.num_inputs(), 3);
        assert_eq!(miaig.num_outputs(), 1);

        let back = miaig_to_miniaig(&miaig);
        assert_eq!(back.len(), m.len());
    }
}
