//! A minimal reduced-ordered BDD manager, shared by every `FuncKind::Bdd`
//! node in an [`crate::Ntk`] (spec.md §3's "rebuild in the target's BDD
//! manager" duplication rule needs somewhere to rebuild into).
//!
//! This is deliberately small: hash-consed nodes, `ite`-based apply with
//! memoization, and a support-set query. It does not attempt dynamic
//! variable reordering or complemented edges — neither is named by any
//! spec.md operation.

use std::collections::HashMap;

/// A node id in a [`BddManager`]. `BddId(0)`/`BddId(1)` are the terminal
/// constants 0 and 1.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct BddId(u32);

impl BddId {
    pub const ZERO: BddId = BddId(0);
    pub const ONE: BddId = BddId(1);

    pub fn is_terminal(self) -> bool {
        self.0 <= 1
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct Node {
    var: u32,
    lo: BddId,
    hi: BddId,
}

/// A shared BDD manager: one unique table, one `ite` memo.
pub struct BddManager {
    nodes: Vec<Node>,
    unique: HashMap<Node, BddId>,
    ite_memo: HashMap<(BddId, BddId, BddId), BddId>,
}

impl Default for BddManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BddManager {
    pub fn new() -> Self {
        // Terminal placeholders at index 0 and 1; `var = u32::MAX` marks
        // a terminal so `Node` equality never collides with a real node.
        let terminal = Node {
            var: u32::MAX,
            lo: BddId::ZERO,
            hi: BddId::ZERO,
        };
        Self {
            nodes: vec![terminal, terminal],
            unique: HashMap::new(),
            ite_memo: HashMap::new(),
        }
    }

    pub fn zero(&self) -> BddId {
        BddId::ZERO
    }

    pub fn one(&self) -> BddId {
        BddId::ONE
    }

    /// The BDD for elementary variable `var`.
    pub fn var(&mut self, var: u32) -> BddId {
        self.unique_node(var, BddId::ZERO, BddId::ONE)
    }

    fn unique_node(&mut self, var: u32, lo: BddId, hi: BddId) -> BddId {
        if lo == hi {
            return lo;
        }
        let node = Node { var, lo, hi };
        if let Some(&id) = self.unique.get(&node) {
            return id;
        }
        let id = BddId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.unique.insert(node, id);
        id
    }

    fn node(&self, id: BddId) -> Option<Node> {
        if id.is_terminal() {
            None
        } else {
            Some(self.nodes[id.0 as usize])
        }
    }

    /// `if f then g else h`, the universal BDD combinator: AND/OR/XOR/NOT
    /// are all small wrappers around this.
    pub fn ite(&mut self, f: BddId, g: BddId, h: BddId) -> BddId {
        if f == BddId::ONE {
            return g;
        }
        if f == BddId::ZERO {
            return h;
        }
        if g == h {
            return g;
        }
        if g == BddId::ONE && h == BddId::ZERO {
            return f;
        }
        let key = (f, g, h);
        if let Some(&cached) = self.ite_memo.get(&key) {
            return cached;
        }

        let top_var = [f, g, h]
            .iter()
            .filter_map(|&id| self.node(id).map(|n| n.var))
            .min()
            .expect("at least one of f, g, h is non-terminal here");

        let restrict = |mgr: &Self, id: BddId, value: bool| -> BddId {
            match mgr.node(id) {
                Some(n) if n.var == top_var => {
                    if value {
                        n.hi
                    } else {
                        n.lo
                    }
                }
                _ => id,
            }
        };

        let f0 = restrict(self, f, false);
        let f1 = restrict(self, f, true);
        let g0 = restrict(self, g, false);
        let g1 = restrict(self, g, true);
        let h0 = restrict(self, h, false);
        let h1 = restrict(self, h, true);

        let lo = self.ite(f0, g0, h0);
        let hi = self.ite(f1, g1, h1);
        let result = self.unique_node(top_var, lo, hi);
        self.ite_memo.insert(key, result);
        result
    }

    pub fn and(&mut self, a: BddId, b: BddId) -> BddId {
        self.ite(a, b, BddId::ZERO)
    }

    pub fn or(&mut self, a: BddId, b: BddId) -> BddId {
        self.ite(a, BddId::ONE, b)
    }

    pub fn not(&mut self, a: BddId) -> BddId {
        self.ite(a, BddId::ZERO, BddId::ONE)
    }

    pub fn xor(&mut self, a: BddId, b: BddId) -> BddId {
        let not_b = self.not(b);
        self.ite(a, not_b, b)
    }

    /// The set of variables `id` depends on, in increasing order.
    pub fn support(&self, id: BddId) -> Vec<u32> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(n) = self.node(cur) {
                if seen.insert(n.var) {
                    out.push(n.var);
                }
                stack.push(n.lo);
                stack.push(n.hi);
            }
        }
        out.sort_unstable();
        out
    }

    pub fn is_constant(&self, id: BddId) -> bool {
        id.is_terminal()
    }

    /// Rebuild `id` (a node of `self`) inside `into`, returning its id
    /// there. Two `Ntk`s never share a `BddManager`, so duplication has
    /// to walk the source graph and re-`ite` each node into the
    /// destination's own unique table rather than copy indices directly.
    pub fn transfer(&self, id: BddId, into: &mut BddManager) -> BddId {
        let mut memo = HashMap::new();
        self.transfer_rec(id, into, &mut memo)
    }

    fn transfer_rec(
        &self,
        id: BddId,
        into: &mut BddManager,
        memo: &mut HashMap<BddId, BddId>,
    ) -> BddId {
        if id == BddId::ZERO {
            return into.zero();
        }
        if id == BddId::ONE {
            return into.one();
        }
        if let Some(&done) = memo.get(&id) {
            return done;
        }
        let node = self.node(id).expect("non-terminal checked above");
        let lo = self.transfer_rec(node.lo, into, memo);
        let hi = self.transfer_rec(node.hi, into, memo);
        let result = into.unique_node(node.var, lo, hi);
        memo.insert(id, result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_or_not_basic() {
        let mut m = BddManager::new();
        let a = m.var(0);
        let b = m.var(1);
        let ab = m.and(a, b);
        assert_ne!(ab, BddId::ZERO);
        assert_eq!(m.support(ab), vec![0, 1]);

        let not_a = m.not(a);
        let tautology = m.or(a, not_a);
        assert_eq!(tautology, BddId::ONE);

        let contradiction = m.and(a, not_a);
        assert_eq!(contradiction, BddId::ZERO);
    }

    #[test]
    fn hash_consing_dedupes_equal_functions() {
        let mut m = BddManager::new();
        let a = m.var(0);
        let b = m.var(1);
        let ab1 = m.and(a, b);
        let ab2 = m.and(a, b);
        assert_eq!(ab1, ab2);
    }
}
