//! The top-level randomized rewire loop of spec.md §4.4: seed a pool of
//! roots and bests, repeatedly perturb a random root with `dupMulti`,
//! run `expand -> share -> reduce`, and keep whatever improves cost
//! (or, short of that, whatever keeps the search diverse).

use crate::miaig::{Lit, Miaig, Obj};
use crate::primitives::{expand_then_reduce_one, reduce_one, share};
use bcore_entity::EntityRef;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// AND2-count, mapped area, or mapped delay — which scalar `rewire`
/// tries to shrink. `bcore-rewire` only implements AND2-count; the
/// other two are placeholders for a technology-mapping pass this crate
/// does not own.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CostMode {
    And2Count,
    MappedArea,
    MappedDelay,
}

/// Knobs for [`rewire`], named directly after spec.md §4.4's top-level
/// loop parameter list.
#[derive(Clone, Debug)]
pub struct RewireParams {
    pub iteration_cap: usize,
    /// Reject a candidate whose `max_level()` exceeds
    /// `original_level * level_growth_ratio`, when set.
    pub level_growth_ratio: Option<f64>,
    pub expansion_budget: usize,
    pub max_fanins: usize,
    pub share_budget: usize,
    pub mode: CostMode,
    /// Consecutive non-improving iterations before restarting from a
    /// `bests` sample.
    pub stall_restart_after: usize,
    pub bests_pool_size: usize,
    pub roots_pool_size: usize,
    /// Keep every equal-or-better candidate in the bests pool instead
    /// of only the single best-so-far (Open Question 3).
    pub retain_all_choices: bool,
    /// Re-simulate every candidate against the original network before
    /// accepting it as a new best (spec.md §4.4's `fCheck`).
    pub fcheck: bool,
}

impl Default for RewireParams {
    fn default() -> Self {
        Self {
            iteration_cap: 200,
            level_growth_ratio: None,
            expansion_budget: 4,
            max_fanins: 6,
            share_budget: 4,
            mode: CostMode::And2Count,
            stall_restart_after: 20,
            bests_pool_size: 8,
            roots_pool_size: 8,
            retain_all_choices: false,
            fcheck: false,
        }
    }
}

fn cost_of(miaig: &Miaig, mode: CostMode) -> usize {
    match mode {
        CostMode::And2Count => miaig.cost(),
        // No technology mapper lives in this crate; area/delay modes
        // fall back to AND2-count rather than silently miscounting.
        CostMode::MappedArea | CostMode::MappedDelay => miaig.cost(),
    }
}

/// Every object reachable from the outputs in topological order
/// (inputs included — callers skip them via `Obj::Input` match arms).
fn reachable_nodes(miaig: &Miaig) -> Vec<crate::miaig::NodeId> {
    miaig.topo_order()
}

/// Structurally perturb `miaig` by merging some adjacent binary ANDs
/// into wider nodes (`dupMulti`): walk its AND nodes, and whenever a
/// node's single fanin chain can be flattened into its parent without
/// exceeding `max_fanins`, do so with probability proportional to the
/// configured growth slack.
fn dup_multi(miaig: &Miaig, max_fanins: usize, rng: &mut Pcg64Mcg) -> Miaig {
    let mut out = Miaig::new();
    let mut copy: Vec<Option<Lit>> = vec![None; miaig.num_objects()];
    copy[0] = Some(Lit::const0());
    for &ci in miaig.inputs() {
        let lit = out.append_input();
        copy[ci.index()] = Some(lit);
    }

    for id in reachable_nodes(miaig) {
        if copy[id.index()].is_some() {
            continue;
        }
        if let Obj::And { fanins } = miaig.object(id) {
            let mut flat: Vec<Lit> = Vec::with_capacity(fanins.len());
            for &f in fanins {
                let translated = translate(&copy, f);
                // Occasionally flatten a fanin's own conjunction straight
                // into this node, mirroring `flatten_nary`'s absorption
                // of nested ANDs, bounded by max_fanins and a coin flip.
                if !translated.is_compl() {
                    if let Obj::And { fanins: inner } = out.object(translated.node()) {
                        if flat.len() + inner.len() <= max_fanins && rng.gen_bool(0.3) {
                            flat.extend(inner.iter().copied());
                            continue;
                        }
                    }
                }
                flat.push(translated);
            }
            let new_lit = out.and(&flat);
            copy[id.index()] = Some(new_lit);
        }
    }

    for &driver in miaig.outputs() {
        let new_driver = translate(&copy, driver);
        let exclusion = miaig.exclusion(out.num_outputs()).cloned();
        out.append_output(new_driver, exclusion);
    }
    out
}

fn translate(copy: &[Option<Lit>], lit: Lit) -> Lit {
    let base = copy[lit.node().index()].expect("fanin visited before its consumer");
    base.negate_if(lit.is_compl())
}

/// One full `expand -> share -> reduce` sweep over every AND node.
fn expand_share_reduce(miaig: &mut Miaig, params: &RewireParams) {
    let candidates = reachable_nodes(miaig);
    for &node in &candidates {
        expand_then_reduce_one(miaig, node, &candidates, params.max_fanins);
    }
    share(miaig, params.share_budget);
    for &node in &candidates {
        reduce_one(miaig, node);
    }
}

/// Run the randomized rewire loop starting from `initial`, returning
/// the best network found (or `initial` itself if nothing ever
/// improved on it).
pub fn rewire(initial: &Miaig, params: &RewireParams, seed: u64) -> Miaig {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);

    let mut roots: Vec<Miaig> = vec![dup_multi(initial, params.max_fanins, &mut rng)];
    let mut bests: Vec<Miaig> = vec![dup_multi(initial, params.max_fanins, &mut rng)];
    let mut best_cost = cost_of(initial, params.mode);
    let original_level = initial.max_level();
    let mut best = dup_multi(initial, params.max_fanins, &mut rng);

    let mut stall = 0usize;

    for iter in 0..params.iteration_cap {
        if best_cost == 0 {
            break;
        }
        let root_idx = rng.gen_range(0..roots.len());
        let mut candidate = dup_multi(&roots[root_idx], params.max_fanins, &mut rng);

        if iter % 2 == 0 {
            let nodes = reachable_nodes(&candidate);
            for &node in &nodes {
                expand_then_reduce_one(&mut candidate, node, &nodes, params.max_fanins);
            }
        }
        expand_share_reduce(&mut candidate, params);

        if let Some(ratio) = params.level_growth_ratio {
            let cap = (original_level as f64 * ratio).ceil() as u32;
            if candidate.max_level() > cap {
                stall += 1;
                continue;
            }
        }

        if params.fcheck {
            if let Err(e) = crate::verify::check_equivalence(initial, &candidate) {
                log::warn!("rewire: discarding a candidate that failed fCheck: {e}");
                stall += 1;
                continue;
            }
        }

        let candidate_cost = cost_of(&candidate, params.mode);
        if candidate_cost < best_cost {
            best_cost = candidate_cost;
            best = candidate.clone();
            bests = vec![candidate];
            stall = 0;
        } else if candidate_cost == best_cost && params.retain_all_choices {
            if bests.len() < params.bests_pool_size {
                bests.push(candidate);
            }
            stall += 1;
        } else {
            stall += 1;
            if rng.gen_bool(0.1) && roots.len() < params.roots_pool_size {
                roots.push(candidate);
            }
        }

        if stall >= params.stall_restart_after && !bests.is_empty() {
            let pick = rng.gen_range(0..bests.len());
            let mut restarted = bests[pick].clone();
            expand_share_reduce(&mut restarted, params);
            roots = vec![restarted];
            stall = 0;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_adder_sum(m: &mut Miaig) -> Lit {
        let a = m.append_input();
        let b = m.append_input();
        let c = m.append_input();
        let axb = {
            let not_a_and_b = m.and(&[a.negate(), b]);
            let a_and_not_b = m.and(&[a, b.negate()]);
            let not_both = m.and(&[not_a_and_b.negate(), a_and_not_b.negate()]);
            not_both.negate()
        };
        let not_axb_and_c = m.and(&[axb.negate(), c]);
        let axb_and_not_c = m.and(&[axb, c.negate()]);
        let not_both = m.and(&[not_axb_and_c.negate(), axb_and_not_c.negate()]);
        not_both.negate()
    }

    #[test]
    fn rewire_never_increases_cost_over_the_seed_network() {
        let mut m = Miaig::new();
        let sum = full_adder_sum(&mut m);
        m.append_output(sum, None);
        let initial_cost = m.cost();

        let params = RewireParams {
            iteration_cap: 25,
            ..RewireParams::default()
        };
        let result = rewire(&m, &params, 42);
        assert!(result.cost() <= initial_cost);
        assert_eq!(result.num_outputs(), m.num_outputs());
    }

    #[test]
    fn rewire_is_deterministic_given_a_fixed_seed() {
        let mut m = Miaig::new();
        let sum = full_adder_sum(&mut m);
        m.append_output(sum, None);

        let params = RewireParams {
            iteration_cap: 10,
            ..RewireParams::default()
        };
        let r1 = rewire(&m, &params, 7);
        let r2 = rewire(&m, &params, 7);
        assert_eq!(r1.cost(), r2.cost());
    }
}
