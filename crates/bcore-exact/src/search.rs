//! The top-level search of spec.md §4.5: fix `n` and `K`, walk node
//! counts upward from [`min_node_count`], and at each node count try to
//! decide realizability via one of the three solving strategies.

use crate::encoding::{assert_root_equals_target, assert_root_equals_target_at, build, clause, Encoding};
use crate::params::{min_node_count, ExactSynthParams, SolveStrategy};
use crate::solution::{decode, Solution};
use bcore_sat::{BulkBackend, IncrementalBackend, SatResult, SatSolver};
use bcore_truth::TruthTableBuf;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ExactSynthError {
    #[error("exact synthesis supports at most 14 inputs, got {n}")]
    TooManyInputs { n: u32 },
    #[error("exact synthesis supports LUTs of at most 8 inputs, got {k}")]
    LutTooWide { k: u32 },
    #[error("target truth table has {actual} variables, expected {expected}")]
    ArityMismatch { expected: u32, actual: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SynthOutcome {
    Solved { solution: Solution, node_count: usize },
    /// Every node count up to `max_node_count_tried` was proven UNSAT.
    ProvenNoSolution { max_node_count_tried: usize },
    /// A solver call ran out of its conflict budget before a verdict.
    TimedOut { node_count: usize },
}

impl SynthOutcome {
    /// spec.md §6's process exit convention: 1 success, 2 proven
    /// infeasible, 0 undecided/timeout.
    pub fn exit_code(&self) -> i32 {
        match self {
            SynthOutcome::Solved { .. } => 1,
            SynthOutcome::ProvenNoSolution { .. } => 2,
            SynthOutcome::TimedOut { .. } => 0,
        }
    }
}

enum Attempt {
    Sat(Solution),
    Unsat,
    Timeout,
}

fn complement_options(allow: bool) -> Vec<bool> {
    if allow {
        vec![false, true]
    } else {
        vec![false]
    }
}

fn install_conflict_budget<S: SatSolver>(solver: &mut S, budget: Option<usize>) {
    if let Some(limit) = budget {
        let mut seen = 0usize;
        solver.set_terminate_callback(Box::new(move || {
            seen += 1;
            seen > limit
        }));
    }
}

/// The first minterm where `actual` disagrees with `target`.
///
/// `actual` comes from [`Solution::simulate`], which already folds the
/// trial root complement back out (`val[root] == target ^ complement`,
/// so `root ^ complement == target` at every minterm) — so no further
/// adjustment is needed here.
fn first_differing_minterm(actual: &TruthTableBuf, target: &TruthTableBuf) -> Option<u32> {
    actual.first_differing_bit(target)
}

fn try_bulk(n: u32, k: u32, node_count: usize, target: &TruthTableBuf, params: &ExactSynthParams) -> Attempt {
    for complement in complement_options(params.allow_root_complement) {
        let mut solver = BulkBackend::new();
        let enc = build(&mut solver, n, k, node_count, params.allow_only_and_gates);
        assert_root_equals_target(&mut solver, &enc, target, complement);
        install_conflict_budget(&mut solver, params.conflict_budget);
        match solver.solve() {
            SatResult::Sat => return Attempt::Sat(decode(&solver, &enc, complement)),
            SatResult::Unsat => continue,
            SatResult::Timeout => return Attempt::Timeout,
        }
    }
    Attempt::Unsat
}

/// Re-check a decoded solution with a brand-new, one-shot solver that
/// fixes every connection/parameter variable to the decoded choice and
/// re-asserts the full target — the "CEC" half of the CEGAR variant.
/// Since the candidate network is already fully concrete, this can only
/// fail to come back `Sat` if `Solution::simulate` itself disagrees with
/// the encoding, so it doubles as a consistency check on the encoder.
fn confirm_with_fresh_solver(n: u32, k: u32, node_count: usize, and_gates_only: bool, solution: &Solution, target: &TruthTableBuf, complement: bool) -> bool {
    let mut solver = BulkBackend::new();
    let enc = build(&mut solver, n, k, node_count, and_gates_only);
    for (i, node) in enc.nodes.iter().enumerate() {
        let sol_node = &solution.nodes[i];
        for (s, slot) in node.conn.iter().enumerate() {
            let chosen = sol_node.fanins[s];
            for (j, &v) in slot.iter().enumerate() {
                clause(&mut solver, &[if j == chosen { bcore_sat::Lit::positive(v) } else { bcore_sat::Lit::negative(v) }]);
            }
        }
        if and_gates_only {
            for (s, &v) in node.pol.iter().enumerate() {
                let bit = sol_node.pol[s];
                clause(&mut solver, &[if bit { bcore_sat::Lit::positive(v) } else { bcore_sat::Lit::negative(v) }]);
            }
        } else {
            for p in 1..(1usize << k) {
                let v = node.param[p - 1];
                clause(&mut solver, &[if sol_node.lut[p] { bcore_sat::Lit::positive(v) } else { bcore_sat::Lit::negative(v) }]);
            }
        }
    }
    assert_root_equals_target(&mut solver, &enc, target, complement);
    matches!(solver.solve(), SatResult::Sat)
}

fn try_incremental_or_cegar(n: u32, k: u32, node_count: usize, target: &TruthTableBuf, params: &ExactSynthParams, cegar: bool) -> Attempt {
    for complement in complement_options(params.allow_root_complement) {
        let mut solver = IncrementalBackend::new();
        let enc = build(&mut solver, n, k, node_count, params.allow_only_and_gates);
        install_conflict_budget(&mut solver, params.conflict_budget);
        assert_root_equals_target_at(&mut solver, &enc, target, complement, 0);

        loop {
            match solver.solve() {
                SatResult::Sat => {
                    let solution = decode(&solver, &enc, complement);
                    let actual = solution.simulate();
                    match first_differing_minterm(&actual, target) {
                        None => {
                            if !cegar || confirm_with_fresh_solver(n, k, node_count, params.allow_only_and_gates, &solution, target, complement) {
                                return Attempt::Sat(solution);
                            }
                            log::warn!("exact-synth: CEC confirmation disagreed with the QBF solver's own model; treating node count {node_count} as unresolved");
                            return Attempt::Unsat;
                        }
                        Some(m) => {
                            assert_root_equals_target_at(&mut solver, &enc, target, complement, m as usize);
                        }
                    }
                }
                SatResult::Unsat => break,
                SatResult::Timeout => return Attempt::Timeout,
            }
        }
    }
    Attempt::Unsat
}

fn try_node_count(n: u32, k: u32, node_count: usize, target: &TruthTableBuf, params: &ExactSynthParams) -> Attempt {
    match params.strategy {
        SolveStrategy::Bulk => try_bulk(n, k, node_count, target, params),
        SolveStrategy::Incremental => try_incremental_or_cegar(n, k, node_count, target, params, false),
        SolveStrategy::Cegar => try_incremental_or_cegar(n, k, node_count, target, params, true),
    }
}

/// Search for the minimum-node K-LUT network realizing `target`, a
/// function of `n` inputs, starting at `min_node_count(n, K)` and
/// walking upward to `params.max_node_count`.
pub fn synthesize(n: u32, target: &TruthTableBuf, params: &ExactSynthParams) -> Result<SynthOutcome, ExactSynthError> {
    if n > 14 {
        return Err(ExactSynthError::TooManyInputs { n });
    }
    if params.lut_size > 8 {
        return Err(ExactSynthError::LutTooWide { k: params.lut_size });
    }
    if target.num_vars() != n {
        return Err(ExactSynthError::ArityMismatch { expected: n, actual: target.num_vars() });
    }

    let start = min_node_count(n, params.lut_size).max(1);
    for node_count in start..=params.max_node_count {
        match try_node_count(n, params.lut_size, node_count, target, params) {
            Attempt::Sat(solution) => return Ok(SynthOutcome::Solved { solution, node_count }),
            Attempt::Unsat => continue,
            Attempt::Timeout => return Ok(SynthOutcome::TimedOut { node_count }),
        }
    }
    Ok(SynthOutcome::ProvenNoSolution { max_node_count_tried: params.max_node_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SolveStrategy;
    use bcore_truth::TruthTableBuf;

    fn majority3() -> TruthTableBuf {
        // a, b, c as vars 0, 1, 2; truth table 0xE8 over 8 minterms.
        let mut words = vec![0u64; 1];
        let bits: u64 = 0xE8;
        words[0] = bits;
        TruthTableBuf::from_words(3, words)
    }

    fn parity3() -> TruthTableBuf {
        let mut words = vec![0u64; 1];
        words[0] = 0x96;
        TruthTableBuf::from_words(3, words)
    }

    #[test]
    fn scenario_a_majority_needs_exactly_four_and2_nodes() {
        let target = majority3();
        let params = ExactSynthParams {
            lut_size: 2,
            max_node_count: 6,
            allow_only_and_gates: true,
            strategy: SolveStrategy::Bulk,
            ..ExactSynthParams::default()
        };
        let outcome = synthesize(3, &target, &params).unwrap();
        match outcome {
            SynthOutcome::Solved { solution, node_count } => {
                assert_eq!(node_count, 4);
                assert_eq!(solution.simulate(), target);
            }
            other => panic!("expected a solution, got {other:?}"),
        }
    }

    #[test]
    fn scenario_f_three_input_parity_is_unsat_at_two_and2_nodes() {
        let target = parity3();
        let params = ExactSynthParams {
            lut_size: 2,
            max_node_count: 2,
            allow_only_and_gates: true,
            strategy: SolveStrategy::Bulk,
            ..ExactSynthParams::default()
        };
        let outcome = synthesize(3, &target, &params).unwrap();
        assert_eq!(outcome, SynthOutcome::ProvenNoSolution { max_node_count_tried: 2 });
        assert_eq!(outcome.exit_code(), 2);
    }

    #[test]
    fn incremental_and_bulk_agree_on_majority() {
        let target = majority3();
        let bulk_params = ExactSynthParams {
            lut_size: 2,
            max_node_count: 6,
            allow_only_and_gates: true,
            strategy: SolveStrategy::Bulk,
            ..ExactSynthParams::default()
        };
        let inc_params = ExactSynthParams { strategy: SolveStrategy::Incremental, ..bulk_params.clone() };
        let bulk = synthesize(3, &target, &bulk_params).unwrap();
        let inc = synthesize(3, &target, &inc_params).unwrap();
        match (bulk, inc) {
            (SynthOutcome::Solved { node_count: nb, .. }, SynthOutcome::Solved { node_count: ni, .. }) => {
                assert_eq!(nb, ni);
            }
            other => panic!("expected both strategies to solve, got {other:?}"),
        }
    }

    #[test]
    fn cegar_solves_majority_and_confirms_its_own_model() {
        let target = majority3();
        let params = ExactSynthParams {
            lut_size: 2,
            max_node_count: 6,
            allow_only_and_gates: true,
            strategy: SolveStrategy::Cegar,
            ..ExactSynthParams::default()
        };
        let outcome = synthesize(3, &target, &params).unwrap();
        match outcome {
            SynthOutcome::Solved { solution, .. } => assert_eq!(solution.simulate(), target),
            other => panic!("expected a solution, got {other:?}"),
        }
    }

    #[test]
    fn rejects_inputs_past_the_fourteen_variable_bound() {
        let target = TruthTableBuf::zero(15);
        let params = ExactSynthParams::default();
        let err = synthesize(15, &target, &params).unwrap_err();
        assert_eq!(err, ExactSynthError::TooManyInputs { n: 15 });
    }
}
