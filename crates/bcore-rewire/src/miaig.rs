//! The MIAIG object model (C8): a multi-input AND network with
//! reference-counted handles to its objects and a per-node rewrite state
//! machine, per spec.md §4.4 and §9's "value-with-shared-data handle"
//! design note.
//!
//! Unlike [`bcore_gia::Gia`], an AND node here may have more than two
//! fanins — the top-level rewire loop's `dupMulti` step deliberately
//! merges adjacent binary ANDs into wider nodes (mirroring
//! `flatten_nary` in the sharing reference), and `share` later factors
//! common pairs back out.

use bcore_entity::{entity_impl, EntityRef, PrimaryMap, SecondaryMap};
use std::collections::HashMap;

/// An index into a [`Miaig`]'s object table.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);
entity_impl!(NodeId, "m");

/// A literal: `var * 2 + complement`, variable 0 reserved for the
/// constant-false node (mirrors the GIA crate's own convention, kept
/// independent here since `bcore-rewire` has no dependency on it).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(u32);

impl Lit {
    pub const fn new(var: u32, complement: bool) -> Self {
        Lit(var * 2 + complement as u32)
    }

    pub const fn const0() -> Self {
        Lit(0)
    }

    pub const fn const1() -> Self {
        Lit(1)
    }

    pub const fn var(self) -> u32 {
        self.0 >> 1
    }

    pub const fn is_compl(self) -> bool {
        self.0 & 1 != 0
    }

    pub const fn negate(self) -> Self {
        Lit(self.0 ^ 1)
    }

    pub const fn negate_if(self, cond: bool) -> Self {
        Lit(self.0 ^ (cond as u32))
    }

    pub const fn is_const(self) -> bool {
        self.var() == 0
    }

    pub(crate) fn node(self) -> NodeId {
        NodeId::new(self.var() as usize)
    }
}

impl std::fmt::Debug for Lit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_compl() {
            write!(f, "!{}", self.var())
        } else {
            write!(f, "{}", self.var())
        }
    }
}

/// Where a node sits in one pass of `expand -> share -> reduce`.
/// Constant or single-fanin resolution jumps straight to `Final`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NodeState {
    Fresh,
    Expanded,
    Shared,
    Reduced,
    Final,
}

#[derive(Clone, Debug)]
pub enum Obj {
    Input,
    /// Fanins are kept sorted by raw literal value — both the canonical
    /// form structural hashing needs and the ordering `share`'s
    /// pairwise-combination scan relies on.
    And { fanins: Vec<Lit> },
}

/// A multi-input AND network with exclusion care-sets at its outputs.
#[derive(Clone)]
pub struct Miaig {
    objects: PrimaryMap<NodeId, Obj>,
    inputs: Vec<NodeId>,
    /// Output driver literals; parallel to `exclusions`.
    outputs: Vec<Lit>,
    /// Per-output exclusion care-set: `None` means "every minterm is
    /// observed"; `Some(tt)` restricts observability to minterms where
    /// `tt` is 1 (spec.md §4.4's "free on `careset_exclusion`").
    exclusions: Vec<Option<bcore_truth::TruthTableBuf>>,
    fanouts: SecondaryMap<NodeId, Vec<NodeId>>,
    level: SecondaryMap<NodeId, u32>,
    refcount: SecondaryMap<NodeId, u32>,
    state: SecondaryMap<NodeId, NodeState>,
    hash: HashMap<Vec<Lit>, NodeId>,
}

impl Default for Miaig {
    fn default() -> Self {
        Self::new()
    }
}

impl Miaig {
    pub fn new() -> Self {
        let mut objects = PrimaryMap::new();
        objects.push(Obj::Input); // object 0: the constant-false node, an input with no driving fanins
        Self {
            objects,
            inputs: Vec::new(),
            outputs: Vec::new(),
            exclusions: Vec::new(),
            fanouts: SecondaryMap::new(),
            level: SecondaryMap::new(),
            refcount: SecondaryMap::new(),
            state: SecondaryMap::with_default(NodeState::Fresh),
            hash: HashMap::new(),
        }
    }

    pub fn const0(&self) -> Lit {
        Lit::const0()
    }

    pub fn append_input(&mut self) -> Lit {
        let id = self.objects.push(Obj::Input);
        self.inputs.push(id);
        Lit::new(id.index() as u32, false)
    }

    pub fn append_output(&mut self, driver: Lit, exclusion: Option<bcore_truth::TruthTableBuf>) {
        self.retain(driver);
        self.outputs.push(driver);
        self.exclusions.push(exclusion);
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

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Lit] {
        &self.outputs
    }

    pub fn exclusion(&self, output: usize) -> Option<&bcore_truth::TruthTableBuf> {
        self.exclusions[output].as_ref()
    }

    pub fn object(&self, id: NodeId) -> &Obj {
        &self.objects[id]
    }

    pub fn fanouts(&self, id: NodeId) -> &[NodeId] {
        &self.fanouts[id]
    }

    pub fn level(&self, id: NodeId) -> u32 {
        *self.level.get(id)
    }

    pub fn refcount(&self, id: NodeId) -> u32 {
        *self.refcount.get(id)
    }

    pub fn state(&self, id: NodeId) -> NodeState {
        self.state[id]
    }

    pub fn set_state(&mut self, id: NodeId, s: NodeState) {
        self.state[id] = s;
    }

    /// Bump `lit`'s node's reference count (following it through a
    /// fanin-list insertion, an output, or an explicit caller-held
    /// handle).
    pub fn retain(&mut self, lit: Lit) {
        if lit.is_const() {
            return;
        }
        let n = lit.node();
        let c = *self.refcount.get(n);
        self.refcount[n] = c + 1;
    }

    /// Drop a reference. Underflowing past zero is a programmer error:
    /// spec.md §4.4 names this explicitly as a bug, not a recoverable
    /// condition.
    pub fn release(&mut self, lit: Lit) {
        if lit.is_const() {
            return;
        }
        let n = lit.node();
        let c = *self.refcount.get(n);
        assert!(c > 0, "refcount underflow releasing {n}");
        self.refcount[n] = c - 1;
    }

    fn recompute_level(&mut self, id: NodeId) {
        let lvl = match &self.objects[id] {
            Obj::Input => 0,
            Obj::And { fanins } => fanins.iter().map(|f| self.level(f.node())).max().unwrap_or(0) + 1,
        };
        self.level[id] = lvl;
    }

    fn link_fanout(&mut self, driver: NodeId, consumer: NodeId) {
        self.fanouts[driver].push(consumer);
    }

    fn unlink_fanout(&mut self, driver: NodeId, consumer: NodeId) {
        if let Some(pos) = self.fanouts[driver].iter().position(|&c| c == consumer) {
            self.fanouts[driver].swap_remove(pos);
        }
    }

    /// Build (or structurally reuse) the n-ary AND of `fanins`, applying
    /// constant folding, duplicate-literal removal, and
    /// complementary-pair annihilation before hashing.
    pub fn and(&mut self, fanins: &[Lit]) -> Lit {
        let mut lits: Vec<Lit> = fanins.to_vec();
        lits.sort_unstable();
        lits.dedup();

        if lits.iter().any(|l| *l == Lit::const0()) {
            return Lit::const0();
        }
        lits.retain(|l| *l != Lit::const1());
        for w in lits.windows(2) {
            if w[0].negate() == w[1] {
                return Lit::const0();
            }
        }
        match lits.len() {
            0 => return Lit::const1(),
            1 => return lits[0],
            _ => {}
        }

        if let Some(&id) = self.hash.get(&lits) {
            return Lit::new(id.index() as u32, false);
        }

        let id = self.objects.push(Obj::And { fanins: lits.clone() });
        self.hash.insert(lits.clone(), id);
        for f in &lits {
            self.retain(*f);
            self.link_fanout(f.node(), id);
        }
        self.recompute_level(id);
        Lit::new(id.index() as u32, false)
    }

    /// Replace node `id`'s fanin list, updating fanout reciprocity,
    /// refcounts, the level, and the structural-hash entry.
    pub fn rewrite_fanins(&mut self, id: NodeId, new_fanins: Vec<Lit>) {
        let old = match &self.objects[id] {
            Obj::And { fanins } => fanins.clone(),
            Obj::Input => panic!("{id} is a primary input, not an AND node"),
        };
        self.hash.remove(&old);
        for f in &old {
            self.unlink_fanout(f.node(), id);
            self.release(*f);
        }
        let mut new_sorted = new_fanins;
        new_sorted.sort_unstable();
        new_sorted.dedup();
        for f in &new_sorted {
            self.retain(*f);
            self.link_fanout(f.node(), id);
        }
        self.hash.insert(new_sorted.clone(), id);
        self.objects[id] = Obj::And { fanins: new_sorted };
        self.recompute_level(id);
        let affected = self.fanouts(id).to_vec();
        for consumer in affected {
            self.recompute_level(consumer);
        }
    }

    /// Point `from`'s consumers at `to` instead, decrementing `from`'s
    /// refcount and incrementing `to`'s. Used by `reduce-one`'s
    /// single-fanin-buffer and constant-replacement cases, and by
    /// `share`'s consumer rewrite.
    pub fn replace_output(&mut self, output: usize, new_driver: Lit) {
        let old = self.outputs[output];
        self.retain(new_driver);
        self.release(old);
        self.outputs[output] = new_driver;
    }

    /// AND2-equivalent cost: an n-ary AND of k fanins costs `k - 1`
    /// binary ANDs once flattened, matching spec.md §4.4's "AND2-count"
    /// optimization metric.
    pub fn cost(&self) -> usize {
        let mut seen = vec![false; self.objects.len()];
        let mut total = 0usize;
        let mut stack: Vec<NodeId> = self.outputs.iter().map(|l| l.node()).collect();
        while let Some(id) = stack.pop() {
            if seen[id.index()] {
                continue;
            }
            seen[id.index()] = true;
            if let Obj::And { fanins } = &self.objects[id] {
                total += fanins.len().saturating_sub(1);
                for f in fanins {
                    stack.push(f.node());
                }
            }
        }
        total
    }

    pub fn max_level(&self) -> u32 {
        self.outputs.iter().map(|l| self.level(l.node())).max().unwrap_or(0)
    }

    /// Every AND reachable from the outputs, in topological (fanins
    /// before consumer) order.
    pub fn topo_order(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut visited = vec![false; self.objects.len()];
        let mut stack: Vec<(NodeId, bool)> = self.outputs.iter().map(|l| (l.node(), true)).collect();
        while let Some((id, enter)) = stack.pop() {
            if visited[id.index()] {
                continue;
            }
            if enter {
                stack.push((id, false));
                if let Obj::And { fanins } = &self.objects[id] {
                    for f in fanins {
                        if !visited[f.node().index()] {
                            stack.push((f.node(), true));
                        }
                    }
                }
            } else {
                visited[id.index()] = true;
                order.push(id);
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_folds_constants_and_complementary_pairs() {
        let mut m = Miaig::new();
        let a = m.append_input();
        assert_eq!(m.and(&[a, Lit::const0()]), Lit::const0());
        assert_eq!(m.and(&[a, Lit::const1()]), a);
        assert_eq!(m.and(&[a, a.negate()]), Lit::const0());
        assert_eq!(m.and(&[a]), a);
    }

    #[test]
    fn and_structurally_hashes_equal_fanin_sets() {
        let mut m = Miaig::new();
        let a = m.append_input();
        let b = m.append_input();
        let c = m.append_input();
        let n1 = m.and(&[a, b, c]);
        let n2 = m.and(&[c, b, a]);
        assert_eq!(n1, n2);
    }

    #[test]
    fn cost_counts_and2_equivalents() {
        let mut m = Miaig::new();
        let a = m.append_input();
        let b = m.append_input();
        let c = m.append_input();
        let n = m.and(&[a, b, c]); // one 3-input AND == 2 AND2s
        m.append_output(n, None);
        assert_eq!(m.cost(), 2);
    }

    #[test]
    fn refcount_underflow_is_a_programmer_error() {
        let mut m = Miaig::new();
        let a = m.append_input();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            m.release(a);
        }));
        assert!(result.is_err());
    }
}
