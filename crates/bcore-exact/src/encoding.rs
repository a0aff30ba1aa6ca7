//! CNF encoding of "does an N-node K-LUT network realize truth table T",
//! spec.md §4.5.
//!
//! Three families of variables, one per node `i` (0-indexed among the
//! `N` internal nodes; node `i` may be driven by any of the `n + i`
//! lower-indexed objects, the `n` primary inputs followed by nodes
//! `0..i`):
//!
//! - **Connection** variables `conn[i][s][j]`: slot `s` of node `i` is
//!   driven by object `j`, one-hot per slot.
//! - **Parameter** variables `param[i][p]` for `p` in `1..2^K`: the
//!   node's K-input LUT value at input pattern `p` (`p == 0` is fixed
//!   false rather than given a variable, per spec.md's "minterm 0 is
//!   forced to 0"). Only allocated in the general K-LUT mode.
//! - **Value** variables `val[i][m]` for every minterm `m` of the `n`
//!   top-level inputs: node `i`'s output at that minterm.
//!
//! A fifth, auxiliary family (`slotval[i][s][m]`, "whichever object
//! slot `s` resolves to, evaluated at minterm `m`") keeps the value
//! constraint polynomial: without it, tying a node's value to its LUT
//! parameters would require enumerating every combination of concrete
//! driver objects across all K slots, which is exponential in the
//! candidate pool rather than in K.
//!
//! When the "allow only AND gates" parameter is set (spec.md §6's
//! exact-synthesis parameter surface), nodes aren't given a free LUT:
//! instead each slot gets a **polarity** variable `pol[i][s]` and the
//! node computes the AND of its (possibly complemented) slot values —
//! a classic AND2/AND-N network search rather than a general K-LUT one.

use bcore_sat::{Lit, SatSolver, SatVar};

pub struct NodeVars {
    /// `conn[s][j]`: slot `s` selects candidate object `j`.
    pub conn: Vec<Vec<SatVar>>,
    /// `slotval[s][m]`.
    pub slotval: Vec<Vec<SatVar>>,
    /// `pol[s]`, AND-gate-only mode only: slot `s`'s literal is
    /// complemented before the AND.
    pub pol: Vec<SatVar>,
    /// `andlit[s][m] == slotval[s][m] ^ pol[s]`, AND-gate-only mode only.
    pub andlit: Vec<Vec<SatVar>>,
    /// `param[p - 1]` for `p` in `1..2^K`, general K-LUT mode only.
    pub param: Vec<SatVar>,
    /// `val[m]`.
    pub val: Vec<SatVar>,
}

pub struct Encoding {
    pub n: u32,
    pub k: u32,
    pub node_count: usize,
    pub and_gates_only: bool,
    pub nodes: Vec<NodeVars>,
}

impl Encoding {
    pub fn num_minterms(&self) -> usize {
        1 << self.n
    }

    pub fn num_candidates(&self, node_idx: usize) -> usize {
        self.n as usize + node_idx
    }

    /// The object's name-space index: inputs are `0..n`, node `i` is
    /// `n + i`.
    pub fn root_object(&self) -> usize {
        self.n as usize + self.node_count - 1
    }

    /// `driverval(object, minterm)`: either a fixed bit of the minterm
    /// (object is a primary input) or `val[i][m]` of an already-built
    /// node.
    pub fn driver_value_var(&self, object: usize, minterm: usize) -> Option<SatVar> {
        if object < self.n as usize {
            None
        } else {
            Some(self.nodes[object - self.n as usize].val[minterm])
        }
    }

    pub fn driver_value_const(&self, object: usize, minterm: usize) -> Option<bool> {
        if object < self.n as usize {
            Some((minterm >> object) & 1 == 1)
        } else {
            None
        }
    }
}

pub(crate) fn clause<S: SatSolver>(solver: &mut S, lits: &[Lit]) {
    for &l in lits {
        solver.add_literal(l);
    }
    solver.finalize_clause();
}

/// Build the structural part of the encoding (connection/parameter/value
/// variables and the clauses that are independent of the target truth
/// table) against `solver`, leaving only the root-equals-target unit
/// clauses for the caller to add per minterm.
pub fn build<S: SatSolver>(solver: &mut S, n: u32, k: u32, node_count: usize, and_gates_only: bool) -> Encoding {
    let num_minterms = 1usize << n;
    let num_patterns = 1usize << k;

    let mut nodes = Vec::with_capacity(node_count);
    for i in 0..node_count {
        let num_cand = n as usize + i;
        let conn: Vec<Vec<SatVar>> = (0..k as usize)
            .map(|_| (0..num_cand).map(|_| solver.new_var()).collect())
            .collect();
        let slotval: Vec<Vec<SatVar>> = (0..k as usize)
            .map(|_| (0..num_minterms).map(|_| solver.new_var()).collect())
            .collect();

        let (pol, andlit, param) = if and_gates_only {
            let pol: Vec<SatVar> = (0..k as usize).map(|_| solver.new_var()).collect();
            let andlit: Vec<Vec<SatVar>> = (0..k as usize)
                .map(|_| (0..num_minterms).map(|_| solver.new_var()).collect())
                .collect();
            (pol, andlit, Vec::new())
        } else {
            let param: Vec<SatVar> = (0..num_patterns - 1).map(|_| solver.new_var()).collect();
            (Vec::new(), Vec::new(), param)
        };

        let val: Vec<SatVar> = (0..num_minterms).map(|_| solver.new_var()).collect();
        nodes.push(NodeVars { conn, slotval, pol, andlit, param, val });
    }

    let enc = Encoding { n, k, node_count, and_gates_only, nodes };
    add_structural_clauses(solver, &enc);
    enc
}

fn add_structural_clauses<S: SatSolver>(solver: &mut S, enc: &Encoding) {
    for (i, node) in enc.nodes.iter().enumerate() {
        let num_cand = enc.num_candidates(i);

        // Exactly-one selected driver per slot.
        for slot in &node.conn {
            clause(solver, &slot.iter().map(|&v| Lit::positive(v)).collect::<Vec<_>>());
            for a in 0..slot.len() {
                for b in (a + 1)..slot.len() {
                    clause(solver, &[Lit::negative(slot[a]), Lit::negative(slot[b])]);
                }
            }
        }

        // Symmetry breaking: slot s's selected object index is strictly
        // less than slot s+1's, so permuting a node's own fanins never
        // yields a second model for the same network.
        for s in 0..node.conn.len().saturating_sub(1) {
            for j in 0..num_cand {
                for j2 in 0..=j {
                    clause(solver, &[Lit::negative(node.conn[s][j]), Lit::negative(node.conn[s + 1][j2])]);
                }
            }
        }

        // slotval[s][m] <-> driverval(selected object, m), gated by conn.
        for (s, slot) in node.conn.iter().enumerate() {
            for (j, &sel) in slot.iter().enumerate() {
                for m in 0..enc.num_minterms() {
                    let sv = node.slotval[s][m];
                    match enc.driver_value_const(j, m) {
                        Some(true) => clause(solver, &[Lit::negative(sel), Lit::positive(sv)]),
                        Some(false) => clause(solver, &[Lit::negative(sel), Lit::negative(sv)]),
                        None => {
                            let dv = enc.driver_value_var(j, m).expect("non-input candidate has a value variable");
                            clause(solver, &[Lit::negative(sel), Lit::negative(dv), Lit::positive(sv)]);
                            clause(solver, &[Lit::negative(sel), Lit::positive(dv), Lit::negative(sv)]);
                        }
                    }
                }
            }
        }

        if enc.and_gates_only {
            add_and_gate_value_clauses(solver, enc, node);
        } else {
            add_general_lut_value_clauses(solver, enc, node);
        }
    }

    // No danglers: every object but the root is consumed by at least
    // one later node's slot.
    let root = enc.root_object();
    for object in 0..(enc.n as usize + enc.node_count) {
        if object == root {
            continue;
        }
        let mut lits = Vec::new();
        for (i, node) in enc.nodes.iter().enumerate() {
            if object >= enc.num_candidates(i) {
                continue;
            }
            for slot in &node.conn {
                lits.push(Lit::positive(slot[object]));
            }
        }
        if !lits.is_empty() {
            clause(solver, &lits);
        }
    }
}

/// `val[m]` tied to the LUT parameter selected by the slotval pattern at
/// minterm `m`, for every one of the node's 2^K input combinations.
fn add_general_lut_value_clauses<S: SatSolver>(solver: &mut S, enc: &Encoding, node: &NodeVars) {
    let num_patterns = 1usize << enc.k;
    for m in 0..enc.num_minterms() {
        for p in 0..num_patterns {
            let mut antecedent_neg: Vec<Lit> = Vec::with_capacity(enc.k as usize);
            for s in 0..enc.k as usize {
                let bit = (p >> s) & 1 == 1;
                let sv = node.slotval[s][m];
                antecedent_neg.push(if bit { Lit::negative(sv) } else { Lit::positive(sv) });
            }
            if p == 0 {
                let mut lits = antecedent_neg.clone();
                lits.push(Lit::negative(node.val[m]));
                clause(solver, &lits);
            } else {
                let param_var = node.param[p - 1];
                let mut a = antecedent_neg.clone();
                a.push(Lit::negative(node.val[m]));
                a.push(Lit::positive(param_var));
                clause(solver, &a);
                let mut b = antecedent_neg;
                b.push(Lit::positive(node.val[m]));
                b.push(Lit::negative(param_var));
                clause(solver, &b);
            }
        }
    }
}

/// `val[m] == AND_s andlit[s][m]`, with `andlit[s][m] == slotval[s][m] ^
/// pol[s]` — a Tseitin encoding of an N-input AND of possibly-negated
/// slot literals.
fn add_and_gate_value_clauses<S: SatSolver>(solver: &mut S, enc: &Encoding, node: &NodeVars) {
    for m in 0..enc.num_minterms() {
        for s in 0..enc.k as usize {
            let x = node.slotval[s][m];
            let y = node.pol[s];
            let z = node.andlit[s][m];
            clause(solver, &[Lit::negative(x), Lit::negative(y), Lit::negative(z)]);
            clause(solver, &[Lit::positive(x), Lit::positive(y), Lit::negative(z)]);
            clause(solver, &[Lit::positive(x), Lit::negative(y), Lit::positive(z)]);
            clause(solver, &[Lit::negative(x), Lit::positive(y), Lit::positive(z)]);
        }

        for s in 0..enc.k as usize {
            clause(solver, &[Lit::negative(node.val[m]), Lit::positive(node.andlit[s][m])]);
        }
        let mut all_true = Vec::with_capacity(enc.k as usize + 1);
        all_true.push(Lit::positive(node.val[m]));
        for s in 0..enc.k as usize {
            all_true.push(Lit::negative(node.andlit[s][m]));
        }
        clause(solver, &all_true);
    }
}

/// Force `val[root][m] == target_bit(m) ^ complement` for every minterm
/// — the root-equals-target constraint. Call once per attempted node
/// count/complement combination, after [`build`].
pub fn assert_root_equals_target<S: SatSolver>(solver: &mut S, enc: &Encoding, target: &bcore_truth::TruthTableBuf, complement: bool) {
    let root = &enc.nodes[enc.node_count - 1];
    for m in 0..enc.num_minterms() {
        let bit = target.bit(m as u32) ^ complement;
        let v = root.val[m];
        clause(solver, &[if bit { Lit::positive(v) } else { Lit::negative(v) }]);
    }
}

/// Force only minterm `m`'s root-equals-target clause — the
/// counterexample-driven constraint the incremental and CEGAR solving
/// variants add one at a time.
pub fn assert_root_equals_target_at<S: SatSolver>(solver: &mut S, enc: &Encoding, target: &bcore_truth::TruthTableBuf, complement: bool, m: usize) {
    let root = &enc.nodes[enc.node_count - 1];
    let bit = target.bit(m as u32) ^ complement;
    let v = root.val[m];
    clause(solver, &[if bit { Lit::positive(v) } else { Lit::negative(v) }]);
}
