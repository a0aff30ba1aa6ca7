//! Ntk — the multi-level network substrate (C5) and its timing model (C6).
//!
//! An [`Ntk`] is a typed object graph: a type tag (netlist / strashed /
//! logic / sequential) crossed with a function tag (none / SOP / BDD /
//! AIG / mapped) that says how to interpret each internal node's local
//! function. Objects live in one arena ([`bcore_entity::PrimaryMap`]) and
//! are addressed by [`ObjId`]; fanout edges are reciprocal side tables,
//! not back-pointers, per spec.md §9's arena+index design note.

mod bdd;
mod duplicate;
mod integrity;
mod timing;

pub use bdd::{BddId, BddManager};
pub use duplicate::{duplicate, extract_cone, split_outputs};
pub use integrity::{check, IntegrityError};
pub use timing::{
    compute_arrival, compute_required, critical_path, lut_critical_path, CriticalPath, Phase, PinTiming,
    TimingConstraints,
};

use bcore_entity::names::{NameId, NameTable};
use bcore_entity::{entity_impl, EntityRef, PackedOption, PrimaryMap, SecondaryMap};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::rc::Rc;

/// An index into an [`Ntk`]'s object arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(u32);
entity_impl!(ObjId, "o");

/// The overall shape of an [`Ntk`] (spec.md §3).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NtkType {
    Netlist,
    Strashed,
    Logic,
    Sequential,
}

impl NtkType {
    pub fn is_sequential(self) -> bool {
        matches!(self, NtkType::Sequential)
    }

    pub fn is_netlist(self) -> bool {
        matches!(self, NtkType::Netlist)
    }
}

/// How an internal node's local function is represented (spec.md §3).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FuncKind {
    None,
    Sop,
    Bdd,
    Aig,
    Mapped,
}

/// A latch's reset value: `{0, 1, don't-care}` (spec.md open question 4 —
/// the `{0,1,3}` legacy aliasing is intentionally unrepresentable).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ResetValue {
    Zero,
    One,
    DontCare,
}

/// A fanin edge: the driving object plus whether it is read complemented.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Fanin {
    pub id: ObjId,
    pub complement: bool,
}

impl Fanin {
    pub fn new(id: ObjId, complement: bool) -> Self {
        Self { id, complement }
    }
}

/// A node's local function payload, interpreted according to the owning
/// [`Ntk`]'s [`FuncKind`].
#[derive(Clone, Debug)]
pub enum LocalFunc {
    /// `FuncKind::None` — a logic node that hasn't been given a function
    /// yet (an integrity-check violation, spec.md §7's `FunctionMissing`).
    None,
    /// `FuncKind::Sop` — a sum-of-products cube string; one character per
    /// fanin per cube ('0'/'1'/'-'), cubes separated by `;`.
    Sop(Rc<str>),
    /// `FuncKind::Bdd` — a node in the Ntk's shared [`BddManager`].
    Bdd(BddId),
    /// `FuncKind::Aig` — no payload: the node's function is simply the
    /// AND of its (exactly two) fanins, complemented per-edge.
    Aig,
    /// `FuncKind::Mapped` — an index into the active gate library.
    Mapped(GateId),
}

/// An opaque reference to a cell in an external gate library (the
/// "context parameter" spec.md §9 asks for in place of global library
/// lookups).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct GateId(pub u32);

/// A minimal gate library: just enough structure for the integrity
/// checker's `LibraryMismatch` rule and the timing model's per-pin
/// delays. Genlib parsing itself is out of scope (spec.md §1).
#[derive(Clone, Debug, Default)]
pub struct Library {
    pub gates: Vec<GateInfo>,
}

#[derive(Clone, Debug)]
pub struct GateInfo {
    pub name: Rc<str>,
    pub num_pins: usize,
}

impl Library {
    pub fn contains(&self, gate: GateId) -> bool {
        (gate.0 as usize) < self.gates.len()
    }

    pub fn pin_count(&self, gate: GateId) -> usize {
        self.gates[gate.0 as usize].num_pins
    }
}

/// One object in an [`Ntk`]'s arena.
#[derive(Clone, Debug)]
pub enum Obj {
    Pi,
    Po(Fanin),
    Node {
        fanins: SmallVec<[Fanin; 4]>,
        local: LocalFunc,
    },
    Latch {
        fanin: Fanin,
        reset: ResetValue,
    },
    /// Netlist-only wire object.
    Net {
        driver: PackedOption<ObjId>,
    },
    /// A hierarchy instance (spec.md §3's "box").
    Box {
        instance_of: Rc<str>,
        fanins: SmallVec<[Fanin; 4]>,
    },
    /// A deleted object (spec.md §4.2's object-deletion step). The arena
    /// is append-only like [`bcore_entity::PrimaryMap`] elsewhere in this
    /// crate, so `ObjId`s are never recycled; deletion instead overwrites
    /// the slot with this tombstone, which carries no fanins and belongs
    /// to no roster. [`duplicate::duplicate`]'s DFS sweep never reaches
    /// one, since nothing may hold a live fanin edge into a deleted
    /// object (see [`Ntk::delete_object`]).
    Dead,
}

impl Obj {
    pub fn fanins(&self) -> &[Fanin] {
        match self {
            Obj::Pi | Obj::Net { .. } | Obj::Dead => &[],
            Obj::Po(f) | Obj::Latch { fanin: f, .. } => std::slice::from_ref(f),
            Obj::Node { fanins, .. } | Obj::Box { fanins, .. } => fanins.as_slice(),
        }
    }

    pub fn is_ci(&self) -> bool {
        matches!(self, Obj::Pi | Obj::Latch { .. })
    }

    pub fn is_co(&self) -> bool {
        matches!(self, Obj::Po(_) | Obj::Latch { .. })
    }
}

/// A multi-level Boolean network.
pub struct Ntk {
    ty: NtkType,
    func: FuncKind,
    objects: PrimaryMap<ObjId, Obj>,
    fanouts: SecondaryMap<ObjId, Vec<ObjId>>,
    pis: Vec<ObjId>,
    pos: Vec<ObjId>,
    latches: Vec<ObjId>,
    nets: Vec<ObjId>,
    names: NameTable,
    obj_name: SecondaryMap<ObjId, PackedOption<NameId>>,
    net_by_name: HashMap<NameId, ObjId>,
    library: Option<Rc<Library>>,
    bdd: BddManager,
    levels: SecondaryMap<ObjId, u32>,
    trav_id: SecondaryMap<ObjId, u32>,
    cur_trav_id: u32,
    exdc: Option<Box<Ntk>>,
}

impl Ntk {
    /// Create an empty network of the given type/function classification.
    pub fn new(ty: NtkType, func: FuncKind) -> Self {
        Self {
            ty,
            func,
            objects: PrimaryMap::new(),
            fanouts: SecondaryMap::new(),
            pis: Vec::new(),
            pos: Vec::new(),
            latches: Vec::new(),
            nets: Vec::new(),
            names: NameTable::new(),
            obj_name: SecondaryMap::new(),
            net_by_name: HashMap::new(),
            library: None,
            bdd: BddManager::new(),
            levels: SecondaryMap::new(),
            trav_id: SecondaryMap::new(),
            cur_trav_id: 0,
            exdc: None,
        }
    }

    /// Create an empty network of the same type/function/name-domain as
    /// `self`, copying its I/O skeleton — spec.md §3's "start-from-existing"
    /// lifecycle step. See [`duplicate::duplicate`] for the full DFS copy.
    pub fn start_from_existing(&self) -> Self {
        let mut out = Self::new(self.ty, self.func);
        out.names = self.names.clone();
        out.library = self.library.clone();
        out
    }

    pub fn ty(&self) -> NtkType {
        self.ty
    }

    /// Retag the network's type in place, bypassing the constraints
    /// each constructor path enforces (e.g. [`Ntk::append_net`]'s
    /// netlist-only assertion). Exists so integrity checks can be
    /// exercised against states the public API itself refuses to build.
    #[cfg(test)]
    pub(crate) fn force_ty(&mut self, ty: NtkType) {
        self.ty = ty;
    }

    pub fn func(&self) -> FuncKind {
        self.func
    }

    pub fn set_library(&mut self, lib: Rc<Library>) {
        self.library = Some(lib);
    }

    pub fn library(&self) -> Option<&Rc<Library>> {
        self.library.as_ref()
    }

    pub fn bdd(&self) -> &BddManager {
        &self.bdd
    }

    pub fn bdd_mut(&mut self) -> &mut BddManager {
        &mut self.bdd
    }

    pub fn pis(&self) -> &[ObjId] {
        &self.pis
    }

    pub fn pos(&self) -> &[ObjId] {
        &self.pos
    }

    pub fn latches(&self) -> &[ObjId] {
        &self.latches
    }

    pub fn nets(&self) -> &[ObjId] {
        &self.nets
    }

    /// Number of combinational inputs (PIs + latch outputs).
    pub fn num_cis(&self) -> usize {
        self.pis.len() + self.latches.len()
    }

    /// Number of combinational outputs (POs + latch inputs).
    pub fn num_cos(&self) -> usize {
        self.pos.len() + self.latches.len()
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn object(&self, id: ObjId) -> &Obj {
        &self.objects[id]
    }

    pub fn fanouts(&self, id: ObjId) -> &[ObjId] {
        &self.fanouts[id]
    }

    pub fn level(&self, id: ObjId) -> u32 {
        self.levels[id]
    }

    pub fn name_of(&self, id: ObjId) -> Option<Box<str>> {
        self.obj_name[id].expand().map(|n| self.names.resolve(n))
    }

    pub fn name_table(&self) -> &NameTable {
        &self.names
    }

    pub fn exdc(&self) -> Option<&Ntk> {
        self.exdc.as_deref()
    }

    pub fn set_exdc(&mut self, exdc: Ntk) {
        self.exdc = Some(Box::new(exdc));
    }

    /// Allocate a fresh traversal id, for the O(1)-amortized "has this
    /// object been visited in the current pass" marks spec.md §3 asks
    /// for (no need to clear a visited set between passes).
    pub fn new_trav_id(&mut self) -> u32 {
        self.cur_trav_id += 1;
        self.cur_trav_id
    }

    pub fn mark_visited(&mut self, id: ObjId, trav_id: u32) {
        self.trav_id[id] = trav_id;
    }

    pub fn is_visited(&self, id: ObjId, trav_id: u32) -> bool {
        self.trav_id[id] == trav_id
    }

    fn set_name(&mut self, id: ObjId, name: &str) {
        let nid = self.names.intern(name);
        self.obj_name[id] = Some(nid).into();
    }

    #[cfg(test)]
    pub(crate) fn clear_name(&mut self, id: ObjId) {
        self.obj_name[id] = None.into();
    }

    /// Append a fresh primary input named `name`.
    pub fn append_pi(&mut self, name: &str) -> ObjId {
        let id = self.objects.push(Obj::Pi);
        self.pis.push(id);
        self.set_name(id, name);
        id
    }

    /// Append a fresh primary output driven by `fanin`, named `name`.
    pub fn append_po(&mut self, fanin: Fanin, name: &str) -> ObjId {
        let id = self.objects.push(Obj::Po(fanin));
        self.link_fanout(fanin.id, id);
        self.pos.push(id);
        self.set_name(id, name);
        self.recompute_level(id);
        id
    }

    /// Append a fresh latch with the given data-input fanin and reset
    /// value, named `name`. The latch acts both as a CO (its data input)
    /// and a CI (its output, fed back as a fanin source for downstream
    /// logic) — both share this one `ObjId`.
    pub fn append_latch(&mut self, fanin: Fanin, reset: ResetValue, name: &str) -> ObjId {
        let id = self.objects.push(Obj::Latch { fanin, reset });
        self.link_fanout(fanin.id, id);
        self.latches.push(id);
        self.set_name(id, name);
        id
    }

    /// Append an internal logic node with the given fanins and (as-yet
    /// possibly absent) local function.
    pub fn append_node(&mut self, fanins: SmallVec<[Fanin; 4]>, local: LocalFunc) -> ObjId {
        let id = self.objects.push(Obj::Node {
            fanins: fanins.clone(),
            local,
        });
        for f in &fanins {
            self.link_fanout(f.id, id);
        }
        self.recompute_level(id);
        id
    }

    /// Append a netlist wire object, optionally already driven.
    pub fn append_net(&mut self, name: &str, driver: Option<ObjId>) -> ObjId {
        assert!(self.ty.is_netlist(), "nets only exist in netlists");
        let id = self.objects.push(Obj::Net {
            driver: driver.into(),
        });
        if let Some(d) = driver {
            self.link_fanout(d, id);
        }
        self.nets.push(id);
        let nid = self.names.intern(name);
        self.obj_name[id] = Some(nid).into();
        self.net_by_name.insert(nid, id);
        id
    }

    /// Look up a net by name (spec.md §4.2's "look up nets by name").
    pub fn net_by_name(&self, name: &str) -> Option<ObjId> {
        self.names.lookup(name).and_then(|n| self.net_by_name.get(&n).copied())
    }

    fn link_fanout(&mut self, driver: ObjId, consumer: ObjId) {
        self.fanouts[driver].push(consumer);
    }

    fn unlink_fanout(&mut self, driver: ObjId, consumer: ObjId) {
        if let Some(pos) = self.fanouts[driver].iter().position(|&c| c == consumer) {
            self.fanouts[driver].swap_remove(pos);
        }
    }

    /// Remove one fanin edge from `consumer` to whichever object sits at
    /// fanin slot `slot`, updating both the fanin list and the reciprocal
    /// fanout list (spec.md §4.2's fanin-edge algorithm).
    pub fn remove_fanin(&mut self, consumer: ObjId, slot: usize) {
        let driver = match &mut self.objects[consumer] {
            Obj::Node { fanins, .. } | Obj::Box { fanins, .. } => {
                let f = fanins.remove(slot);
                f.id
            }
            _ => panic!("object at {consumer} does not support fanin removal by slot"),
        };
        self.unlink_fanout(driver, consumer);
    }

    /// Add a fanin edge to `consumer`, appending to its fanin list and
    /// the driver's fanout list.
    pub fn add_fanin(&mut self, consumer: ObjId, fanin: Fanin) {
        match &mut self.objects[consumer] {
            Obj::Node { fanins, .. } | Obj::Box { fanins, .. } => fanins.push(fanin),
            _ => panic!("object at {consumer} does not support fanin addition"),
        }
        self.link_fanout(fanin.id, consumer);
        self.recompute_level(consumer);
    }

    /// Replace a Po's or Latch's single fanin, maintaining reciprocity.
    pub fn redirect_fanin(&mut self, consumer: ObjId, new_fanin: Fanin) {
        let old = match &self.objects[consumer] {
            Obj::Po(f) | Obj::Latch { fanin: f, .. } => *f,
            _ => panic!("object at {consumer} has no single fanin to redirect"),
        };
        self.unlink_fanout(old.id, consumer);
        match &mut self.objects[consumer] {
            Obj::Po(f) => *f = new_fanin,
            Obj::Latch { fanin, .. } => *fanin = new_fanin,
            _ => unreachable!(),
        }
        self.link_fanout(new_fanin.id, consumer);
        self.recompute_level(consumer);
    }

    /// Delete an object: detach every fanin edge it drives (updating the
    /// reciprocal fanout side tables), drop it from whichever CI/CO/net
    /// roster it belongs to, and erase its net-hash binding if it is a
    /// net (spec.md §4.2's fanin-edge algorithm, "If called as part of
    /// object deletion, remove the object from its CI/CO/latch roster
    /// and its name from the net hash").
    ///
    /// Panics if `id` still has fanouts — a live consumer must be
    /// redirected or deleted first.
    pub fn delete_object(&mut self, id: ObjId) {
        assert!(
            self.fanouts[id].is_empty(),
            "object {id} still has fanouts; redirect or delete its consumers first"
        );

        let fanin_ids: SmallVec<[ObjId; 4]> = self.objects[id].fanins().iter().map(|f| f.id).collect();
        for fanin_id in fanin_ids {
            self.unlink_fanout(fanin_id, id);
        }

        self.pis.retain(|&x| x != id);
        self.pos.retain(|&x| x != id);
        self.latches.retain(|&x| x != id);
        if matches!(self.objects[id], Obj::Net { .. }) {
            self.nets.retain(|&x| x != id);
            if let Some(name) = self.obj_name[id].expand() {
                self.net_by_name.remove(&name);
            }
        }

        self.objects[id] = Obj::Dead;
    }

    fn recompute_level(&mut self, id: ObjId) {
        let level = self
            .objects
            .get(id)
            .map(|obj| {
                obj.fanins()
                    .iter()
                    .map(|f| self.levels[f.id])
                    .max()
                    .map_or(0, |m| m + 1)
            })
            .unwrap_or(0);
        self.levels[id] = level;
    }

    /// Topological (DFS) order of every object reachable from the
    /// network's POs and latch data-inputs.
    pub fn topo_order(&self) -> Vec<ObjId> {
        let mut order = Vec::with_capacity(self.objects.len());
        let mut visited = vec![false; self.objects.len()];
        let mut stack: Vec<(ObjId, bool)> = Vec::new();

        let roots: Vec<ObjId> = self
            .pos
            .iter()
            .chain(self.latches.iter())
            .copied()
            .collect();

        for root in roots {
            stack.push((root, true));
            while let Some((id, first)) = stack.pop() {
                if visited[id.index()] {
                    continue;
                }
                if first {
                    stack.push((id, false));
                    for f in self.objects[id].fanins() {
                        if !visited[f.id.index()] {
                            stack.push((f.id, true));
                        }
                    }
                    continue;
                }
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

    fn two_input(ntk: &mut Ntk, a: ObjId, b: ObjId) -> ObjId {
        let mut fanins = SmallVec::new();
        fanins.push(Fanin::new(a, false));
        fanins.push(Fanin::new(b, false));
        ntk.append_node(fanins, LocalFunc::Aig)
    }

    #[test]
    fn delete_object_detaches_fanins_and_clears_its_roster_slot() {
        let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Aig);
        let a = ntk.append_pi("a");
        let b = ntk.append_pi("b");
        let n = two_input(&mut ntk, a, b);

        ntk.delete_object(n);

        assert!(matches!(ntk.object(n), Obj::Dead));
        assert!(!ntk.fanouts(a).contains(&n));
        assert!(!ntk.fanouts(b).contains(&n));
    }

    #[test]
    fn delete_object_unlinks_a_net_from_its_roster_and_name_table() {
        let mut ntk = Ntk::new(NtkType::Netlist, FuncKind::Aig);
        let net = ntk.append_net("w", None);

        ntk.delete_object(net);

        assert!(matches!(ntk.object(net), Obj::Dead));
        assert!(!ntk.nets().contains(&net));
        assert!(ntk.net_by_name("w").is_none());
    }

    #[test]
    #[should_panic(expected = "still has fanouts")]
    fn delete_object_panics_if_a_live_consumer_remains() {
        let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Aig);
        let a = ntk.append_pi("a");
        let b = ntk.append_pi("b");
        two_input(&mut ntk, a, b);

        ntk.delete_object(a);
    }
}
