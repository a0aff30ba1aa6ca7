//! GIA — a compact, index-addressed And-Inverter Graph (C4).
//!
//! A [`Gia`] is an append-only table of objects in topological order:
//! object 0 is always the constant-false node, followed by primary
//! inputs, AND nodes (each referencing two strictly-lower-indexed
//! fanin literals), and primary outputs. AND construction always goes
//! through [`Gia::and`], which structurally hashes the fanin pair so that
//! at most one AND node ever realizes a given `(lit0, lit1)`.

mod hash;
mod lit;

pub use lit::Lit;

use bcore_entity::{entity_impl, EntityRef, PrimaryMap};
use hash::StructHash;

/// An index into a [`Gia`]'s object table.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GiaId(u32);
entity_impl!(GiaId, "n");

/// The payload of one GIA object.
#[derive(Clone, Debug)]
pub enum GiaObj {
    /// The single constant-false node, always object 0.
    Const,
    /// A primary input (or, under sequential semantics, the combined CI
    /// roster — see [`Gia::num_regs`]).
    Input,
    /// A primary output, or latch input under sequential semantics.
    Output { driver: Lit },
    /// A two-input AND with both fanins `< ` this object's own index.
    And { f0: Lit, f1: Lit },
}

/// A compact And-Inverter Graph with structural hashing.
pub struct Gia {
    objects: PrimaryMap<GiaId, GiaObj>,
    inputs: Vec<GiaId>,
    outputs: Vec<GiaId>,
    hash: StructHash,
    /// Number of the trailing CIs/COs that are latch boundaries rather
    /// than true primary I/O (spec.md §3's "register count").
    num_regs: u32,
}

impl Default for Gia {
    fn default() -> Self {
        Self::new()
    }
}

impl Gia {
    /// Create an empty GIA (just the constant-false node).
    pub fn new() -> Self {
        let mut objects = PrimaryMap::new();
        objects.push(GiaObj::Const);
        Self {
            objects,
            inputs: Vec::new(),
            outputs: Vec::new(),
            hash: StructHash::new(),
            num_regs: 0,
        }
    }

    /// The constant-false literal.
    pub fn const0(&self) -> Lit {
        Lit::const0()
    }

    /// Append a fresh primary input, returning its (non-complemented)
    /// literal.
    pub fn append_input(&mut self) -> Lit {
        let id = self.objects.push(GiaObj::Input);
        self.inputs.push(id);
        Lit::new(id.index() as u32, false)
    }

    /// Append a primary output driven by `driver`.
    pub fn append_output(&mut self, driver: Lit) -> GiaId {
        let id = self.objects.push(GiaObj::Output { driver });
        self.outputs.push(id);
        id
    }

    /// Set the number of trailing CI/CO pairs that are latch boundaries.
    pub fn set_num_regs(&mut self, n: u32) {
        assert!(n as usize <= self.inputs.len() && n as usize <= self.outputs.len());
        self.num_regs = n;
    }

    pub fn num_regs(&self) -> u32 {
        self.num_regs
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn inputs(&self) -> &[GiaId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[GiaId] {
        &self.outputs
    }

    pub fn object(&self, id: GiaId) -> &GiaObj {
        &self.objects[id]
    }

    /// The driver literal of output object `id`.
    pub fn output_driver(&self, id: GiaId) -> Lit {
        match &self.objects[id] {
            GiaObj::Output { driver } => *driver,
            _ => panic!("{id} is not a primary output"),
        }
    }

    /// Construct (or reuse, via structural hashing) the AND of two
    /// fanin literals, applying the constant-propagation rules of
    /// spec.md §4.1 first:
    ///
    /// `lit & 0 = 0`, `lit & 1 = lit`, `lit & lit = lit`, `lit & ¬lit = 0`.
    pub fn and(&mut self, lit0: Lit, lit1: Lit) -> Lit {
        if lit0 == lit1 {
            return lit0;
        }
        if lit0 == lit1.negate() {
            return Lit::const0();
        }
        if lit0.is_const0() || lit1.is_const0() {
            return Lit::const0();
        }
        if lit0.is_const1() {
            return lit1;
        }
        if lit1.is_const1() {
            return lit0;
        }

        // Canonical ordering makes the hash key independent of argument
        // order, so `and(x, y)` and `and(y, x)` hit the same slot.
        let (a, b) = if lit0.raw() <= lit1.raw() {
            (lit0, lit1)
        } else {
            (lit1, lit0)
        };

        if let Some(existing) = self.hash.find(a, b) {
            return Lit::new(existing.index() as u32, false);
        }

        let id = self.objects.push(GiaObj::And { f0: a, f1: b });
        self.hash.insert(a, b, id);
        debug_assert!(a.var() < id.index() as u32 && b.var() < id.index() as u32);
        Lit::new(id.index() as u32, false)
    }

    /// Compute a topological (DFS) ordering of AND nodes reachable from
    /// the primary outputs. CIs are not included; the constant node is
    /// not included.
    pub fn dfs_order(&self) -> Vec<GiaId> {
        let mut order = Vec::new();
        let mut visited = vec![false; self.objects.len()];
        let mut stack = Vec::new();

        for &out in &self.outputs {
            stack.push((self.output_driver(out).var(), true));
            while let Some((var, first_visit)) = stack.pop() {
                let id = GiaId::new(var as usize);
                if visited[var as usize] {
                    continue;
                }
                if let GiaObj::And { f0, f1 } = &self.objects[id] {
                    if first_visit {
                        stack.push((var, false));
                        if !visited[f0.var() as usize] {
                            stack.push((f0.var(), true));
                        }
                        if !visited[f1.var() as usize] {
                            stack.push((f1.var(), true));
                        }
                        continue;
                    }
                }
                visited[var as usize] = true;
                if matches!(self.objects[id], GiaObj::And { .. }) {
                    order.push(id);
                }
            }
        }
        order
    }

    /// Duplicate this GIA into a new one. When `remove_dangling` is set,
    /// only objects reachable from a primary output survive; otherwise
    /// every CI and AND is copied regardless of reachability.
    pub fn duplicate(&self, remove_dangling: bool) -> Gia {
        let mut out = Gia::new();
        // `copy[old_var]` is the new literal's variable id, once created.
        let mut copy: Vec<Option<u32>> = vec![None; self.objects.len()];
        copy[0] = Some(0);

        for &ci in &self.inputs {
            let new_lit = out.append_input();
            copy[ci.index()] = Some(new_lit.var());
        }

        let order: Vec<GiaId> = if remove_dangling {
            self.dfs_order()
        } else {
            (1..self.objects.len())
                .map(GiaId::new)
                .filter(|id| matches!(self.objects[*id], GiaObj::And { .. }))
                .collect()
        };

        for id in order {
            if let GiaObj::And { f0, f1 } = &self.objects[id] {
                let nf0 = translate(&copy, *f0);
                let nf1 = translate(&copy, *f1);
                let new_lit = out.and(nf0, nf1);
                copy[id.index()] = Some(new_lit.var());
            }
        }

        for &po in &self.outputs {
            let driver = self.output_driver(po);
            // A PO's own driver is always in `order`: when `remove_dangling`
            // is set, `dfs_order` walked from this very driver; otherwise
            // every AND was copied regardless of reachability.
            out.append_output(translate(&copy, driver));
        }
        out.set_num_regs(self.num_regs);
        out
    }

    /// `duplicate(true)` — the conventional "cleanup" pass that removes
    /// dangling (unreachable) AND nodes and dangling CIs are kept (every
    /// original CI is always recreated so the CI/CO roster size doesn't
    /// shift under callers holding onto input indices).
    pub fn cleanup(&self) -> Gia {
        self.duplicate(true)
    }
}

fn translate(copy: &[Option<u32>], lit: Lit) -> Lit {
    let new_var = copy[lit.var() as usize].expect("fanin visited before use (topological order)");
    Lit::new(new_var, lit.is_compl())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_idempotent() {
        let mut g = Gia::new();
        let a = g.append_input();
        let b = g.append_input();
        let n1 = g.and(a, b);
        let before = g.num_objects();
        let n2 = g.and(a, b);
        assert_eq!(n1, n2);
        assert_eq!(g.num_objects(), before, "re-AND must not grow the table");

        // Commuted argument order must hit the same node.
        let n3 = g.and(b, a);
        assert_eq!(n1, n3);
        assert_eq!(g.num_objects(), before);
    }

    #[test]
    fn constant_propagation_rules() {
        let mut g = Gia::new();
        let a = g.append_input();
        assert_eq!(g.and(a, Lit::const0()), Lit::const0());
        assert_eq!(g.and(a, Lit::const1()), a);
        assert_eq!(g.and(a, a), a);
        assert_eq!(g.and(a, a.negate()), Lit::const0());
    }

    #[test]
    fn fanins_precede_their_and_node() {
        let mut g = Gia::new();
        let a = g.append_input();
        let b = g.append_input();
        let c = g.append_input();
        let ab = g.and(a, b);
        let abc = g.and(ab, c);
        if let GiaObj::And { f0, f1 } = g.object(GiaId::new(abc.var() as usize)) {
            assert!(f0.var() < abc.var());
            assert!(f1.var() < abc.var());
        } else {
            panic!("expected an AND node");
        }
    }

    #[test]
    fn scenario_b_constant_zero_cone() {
        // spec.md §8 Scenario B: PO driven by AND(v1, !v1) must collapse
        // to constant-false via constant propagation alone.
        let mut g = Gia::new();
        let a = g.append_input();
        let driver = g.and(a, a.negate());
        g.append_output(driver);
        assert_eq!(driver, Lit::const0());
        let cleaned = g.cleanup();
        assert_eq!(cleaned.output_driver(cleaned.outputs()[0]), Lit::const0());
    }

    #[test]
    fn cleanup_drops_dangling_and_keeps_live_logic() {
        let mut g = Gia::new();
        let a = g.append_input();
        let b = g.append_input();
        let live = g.and(a, b);
        // A dangling AND that no PO reaches.
        let _dangling = g.and(a.negate(), b.negate());
        g.append_output(live);
        let before = g.num_objects();

        let cleaned = g.cleanup();
        assert!(cleaned.num_objects() < before);
        assert_eq!(cleaned.num_inputs(), g.num_inputs());
        assert_eq!(cleaned.num_outputs(), g.num_outputs());
    }

    #[test]
    fn dfs_order_is_topological() {
        let mut g = Gia::new();
        let a = g.append_input();
        let b = g.append_input();
        let c = g.append_input();
        let ab = g.and(a, b);
        let abc = g.and(ab, c);
        g.append_output(abc);

        let order = g.dfs_order();
        let pos_ab = order.iter().position(|&id| id.index() as u32 == ab.var()).unwrap();
        let pos_abc = order.iter().position(|&id| id.index() as u32 == abc.var()).unwrap();
        assert!(pos_ab < pos_abc);
    }
}
