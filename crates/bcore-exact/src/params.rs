/// Which of the two solving strategies described in spec.md §4.5 to use.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SolveStrategy {
    /// Build every per-minterm clause up front and issue a single
    /// `solve` call on a [`bcore_sat::BulkBackend`].
    Bulk,
    /// Start with only the structural (parameter/connection) clauses on
    /// a [`bcore_sat::IncrementalBackend`], then alternately solve,
    /// decode, simulate, and feed back the first minterm where the
    /// candidate disagrees with the target — growing the clause set
    /// only as counterexamples demand it.
    Incremental,
    /// The two-solver counterexample-guided variant: an incremental
    /// "QBF" solver proposes parameter assignments from accumulated
    /// counterexamples, and every proposal is checked for full
    /// equivalence (the "CEC" half) before being accepted.
    Cegar,
}

/// Knobs for [`crate::search::synthesize`], named after spec.md §4.5 and
/// §6's exact-synthesis parameter surface.
#[derive(Clone, Debug)]
pub struct ExactSynthParams {
    /// Maximum LUT fanin, K ≤ 8.
    pub lut_size: u32,
    /// Restrict every node to computing the AND of its (possibly
    /// complemented) slot literals instead of a free K-input LUT — a
    /// classic AND-network search (spec.md §6's "allow only AND gates").
    pub allow_only_and_gates: bool,
    /// Try the root both uncomplemented and complemented before
    /// concluding the current node count is infeasible.
    pub allow_root_complement: bool,
    /// Stop searching node counts beyond this many (a safety bound
    /// distinct from per-attempt solver timeouts).
    pub max_node_count: usize,
    pub strategy: SolveStrategy,
    /// Cap on conflicts per `solve` call, enforced via the solver's
    /// terminate callback; `None` means no cap.
    pub conflict_budget: Option<usize>,
    pub dump_blif: bool,
}

impl Default for ExactSynthParams {
    fn default() -> Self {
        Self {
            lut_size: 2,
            allow_only_and_gates: false,
            allow_root_complement: true,
            max_node_count: 64,
            strategy: SolveStrategy::Incremental,
            conflict_budget: None,
            dump_blif: false,
        }
    }
}

/// `ceil((n - 1) / (K - 1))`, the minimum node count below which no
/// K-LUT network can possibly realize a function of `n` non-trivial
/// inputs (spec.md §4.5's search schedule).
pub fn min_node_count(n: u32, k: u32) -> usize {
    assert!(k >= 2, "a 1-input LUT can't merge any fanins");
    if n <= 1 {
        return 0;
    }
    let num = (n - 1) as usize;
    let den = (k - 1) as usize;
    (num + den - 1) / den
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_node_count_matches_the_ceiling_formula() {
        assert_eq!(min_node_count(3, 2), 2);
        assert_eq!(min_node_count(1, 2), 0);
        assert_eq!(min_node_count(14, 8), 2);
        assert_eq!(min_node_count(9, 3), 4);
    }
}
