//! The integrity-check sequence: everything a well-formed [`Ntk`] must
//! satisfy beyond what the type system already enforces. Every operation
//! that restructures a network (duplication, cone extraction, MIAIG
//! round-tripping) should be checkable against this before being trusted.

use crate::{FuncKind, GateId, LocalFunc, Ntk, Obj, ObjId};
use bcore_entity::EntityRef;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("{0} is listed on a PI/PO/latch/net roster but is not that kind of object")]
    RosterKindMismatch(ObjId),

    #[error("node {0}'s local function doesn't match the network's function tag")]
    FunctionTagMismatch(ObjId),

    #[error("node {0} has no local function, but the network's function tag isn't `None`")]
    FunctionMissing(ObjId),

    #[error("node {0} is mapped but the network has no gate library set")]
    LibraryMissing(ObjId),

    #[error("node {0} references gate {1:?}, which is out of range for the active library")]
    GateOutOfRange(ObjId, GateId),

    #[error("node {0} has {actual} fanins but its mapped gate {gate:?} takes {expected}")]
    GateArityMismatch {
        id: ObjId,
        gate: GateId,
        expected: usize,
        actual: usize,
    },

    #[error("node {id}'s SOP cube {cube} has {actual} literals, expected {expected} (one per fanin)")]
    SopArityMismatch {
        id: ObjId,
        cube: usize,
        expected: usize,
        actual: usize,
    },

    #[error("node {id}'s BDD depends on {support} variables but the node only has {fanins} fanins")]
    BddSupportOverflow {
        id: ObjId,
        support: usize,
        fanins: usize,
    },

    #[error("node {id}'s fanin slot {slot} points at an object that doesn't exist")]
    FaninOutOfRange { id: ObjId, slot: usize },

    #[error("fanin edge {consumer} -> {driver} has no matching fanout entry on {driver}")]
    ReciprocityBroken { driver: ObjId, consumer: ObjId },

    #[error("net name {0:?} is bound to more than one net object")]
    DuplicateNetName(String),

    #[error("object {0} sits on a combinational cycle (a path that never crosses a latch)")]
    CombinationalCycle(ObjId),

    #[error("network is a netlist but has no nets")]
    NetlistHasNoNets,

    #[error("net {0} found on a non-netlist network")]
    StrayNet(ObjId),

    #[error("PO {0} has {1} fanouts; a PO must have none")]
    PoHasFanouts(ObjId, usize),

    #[error("{0} is a PI/PO/latch but carries no name")]
    UnnamedBoundaryObject(ObjId),
}

/// Run every integrity check, stopping at (and returning) the first
/// violation found. Order roughly follows the severity a human would
/// want to hear about first: structural roster mismatches, then the
/// netlist/non-netlist net count and PI/PO/latch shape and naming,
/// then function-tag bookkeeping, then edge-level wiring, then global
/// properties (name uniqueness, acyclicity).
pub fn check(ntk: &Ntk) -> Result<(), IntegrityError> {
    check_rosters(ntk)?;
    check_net_count(ntk)?;
    check_boundary_shape(ntk)?;
    check_boundary_names(ntk)?;
    check_functions(ntk)?;
    check_fanin_wiring(ntk)?;
    check_net_names(ntk)?;
    check_acyclic(ntk)?;
    Ok(())
}

fn check_rosters(ntk: &Ntk) -> Result<(), IntegrityError> {
    for &pi in ntk.pis() {
        if !matches!(ntk.object(pi), Obj::Pi) {
            return Err(IntegrityError::RosterKindMismatch(pi));
        }
    }
    for &po in ntk.pos() {
        if !matches!(ntk.object(po), Obj::Po(_)) {
            return Err(IntegrityError::RosterKindMismatch(po));
        }
    }
    for &latch in ntk.latches() {
        if !matches!(ntk.object(latch), Obj::Latch { .. }) {
            return Err(IntegrityError::RosterKindMismatch(latch));
        }
    }
    for &net in ntk.nets() {
        if !matches!(ntk.object(net), Obj::Net { .. }) {
            return Err(IntegrityError::RosterKindMismatch(net));
        }
    }
    Ok(())
}

/// A netlist is the one [`NtkType`](crate::NtkType) whose wires are
/// first-class objects; every other type folds wires into fanin edges
/// and carries none.
fn check_net_count(ntk: &Ntk) -> Result<(), IntegrityError> {
    if ntk.ty().is_netlist() {
        if ntk.nets().is_empty() {
            return Err(IntegrityError::NetlistHasNoNets);
        }
    } else if let Some(&net) = ntk.nets().first() {
        return Err(IntegrityError::StrayNet(net));
    }
    Ok(())
}

/// A PI carries no fanins and no local function, and a PO carries
/// exactly one fanin and no fanouts. The fanin shape is already
/// guaranteed by [`Obj::Pi`]/[`Obj::Po`]'s own field layout; what isn't
/// is a PO that something else has wired a fanin into, which nothing
/// else here rejects.
fn check_boundary_shape(ntk: &Ntk) -> Result<(), IntegrityError> {
    for &po in ntk.pos() {
        let fanouts = ntk.fanouts(po).len();
        if fanouts != 0 {
            return Err(IntegrityError::PoHasFanouts(po, fanouts));
        }
    }
    Ok(())
}

fn check_boundary_names(ntk: &Ntk) -> Result<(), IntegrityError> {
    for &id in ntk.pis().iter().chain(ntk.pos()).chain(ntk.latches()) {
        if ntk.name_of(id).is_none() {
            return Err(IntegrityError::UnnamedBoundaryObject(id));
        }
    }
    Ok(())
}

fn check_functions(ntk: &Ntk) -> Result<(), IntegrityError> {
    for id in (0..ntk.num_objects()).map(ObjId::new) {
        let Obj::Node { fanins, local } = ntk.object(id) else {
            continue;
        };
        let tag_matches = matches!(
            (ntk.func(), local),
            (FuncKind::None, LocalFunc::None)
                | (FuncKind::Sop, LocalFunc::Sop(_))
                | (FuncKind::Bdd, LocalFunc::Bdd(_))
                | (FuncKind::Aig, LocalFunc::Aig)
                | (FuncKind::Mapped, LocalFunc::Mapped(_))
        );
        if !tag_matches {
            return Err(IntegrityError::FunctionTagMismatch(id));
        }
        if ntk.func() != FuncKind::None && matches!(local, LocalFunc::None) {
            return Err(IntegrityError::FunctionMissing(id));
        }

        match local {
            LocalFunc::Sop(cubes) => {
                for (i, cube) in cubes.split(';').enumerate() {
                    if cube.is_empty() {
                        continue;
                    }
                    if cube.chars().count() != fanins.len() {
                        return Err(IntegrityError::SopArityMismatch {
                            id,
                            cube: i,
                            expected: fanins.len(),
                            actual: cube.chars().count(),
                        });
                    }
                }
            }
            LocalFunc::Bdd(bdd_id) => {
                let support = ntk.bdd().support(*bdd_id).len();
                if support > fanins.len() {
                    return Err(IntegrityError::BddSupportOverflow {
                        id,
                        support,
                        fanins: fanins.len(),
                    });
                }
            }
            LocalFunc::Mapped(gate) => {
                let lib = match ntk.library() {
                    Some(lib) => lib,
                    None => return Err(IntegrityError::LibraryMissing(id)),
                };
                if !lib.contains(*gate) {
                    return Err(IntegrityError::GateOutOfRange(id, *gate));
                }
                let expected = lib.pin_count(*gate);
                if expected != fanins.len() {
                    return Err(IntegrityError::GateArityMismatch {
                        id,
                        gate: *gate,
                        expected,
                        actual: fanins.len(),
                    });
                }
            }
            LocalFunc::None | LocalFunc::Aig => {}
        }
    }
    Ok(())
}

fn check_fanin_wiring(ntk: &Ntk) -> Result<(), IntegrityError> {
    for id in (0..ntk.num_objects()).map(ObjId::new) {
        for (slot, fanin) in ntk.object(id).fanins().iter().enumerate() {
            if fanin.id.index() >= ntk.num_objects() {
                return Err(IntegrityError::FaninOutOfRange { id, slot });
            }
            if !ntk.fanouts(fanin.id).contains(&id) {
                return Err(IntegrityError::ReciprocityBroken {
                    driver: fanin.id,
                    consumer: id,
                });
            }
        }
    }
    Ok(())
}

fn check_net_names(ntk: &Ntk) -> Result<(), IntegrityError> {
    let mut seen = std::collections::HashSet::new();
    for &net in ntk.nets() {
        if let Some(name) = ntk.name_of(net) {
            if !seen.insert(name.clone()) {
                return Err(IntegrityError::DuplicateNetName(name.to_string()));
            }
        }
    }
    Ok(())
}

/// Detect a cycle among purely combinational objects (`Node`/`Box`/`Po`):
/// a latch's own data-input fanin is a legitimate place for a path to
/// originate from, not somewhere a path may pass back through, so the
/// walk never descends past a `Pi` or `Latch`.
fn check_acyclic(ntk: &Ntk) -> Result<(), IntegrityError> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let n = ntk.num_objects();
    let mut color = vec![Color::White; n];

    for start in (0..n).map(ObjId::new) {
        if color[start.index()] != Color::White {
            continue;
        }
        let mut stack: Vec<(ObjId, bool)> = vec![(start, true)];
        while let Some((id, enter)) = stack.pop() {
            if enter {
                match color[id.index()] {
                    Color::Black => continue,
                    Color::Gray => return Err(IntegrityError::CombinationalCycle(id)),
                    Color::White => {}
                }
                color[id.index()] = Color::Gray;
                stack.push((id, false));
                if matches!(ntk.object(id), Obj::Node { .. } | Obj::Box { .. } | Obj::Po(_)) {
                    for f in ntk.object(id).fanins() {
                        if color[f.id.index()] != Color::Black {
                            stack.push((f.id, true));
                        }
                    }
                }
            } else {
                color[id.index()] = Color::Black;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fanin, NtkType, ResetValue};
    use smallvec::SmallVec;

    fn aig_and(ntk: &mut Ntk, a: Fanin, b: Fanin) -> ObjId {
        let mut fanins = SmallVec::new();
        fanins.push(a);
        fanins.push(b);
        ntk.append_node(fanins, LocalFunc::Aig)
    }

    #[test]
    fn well_formed_network_passes() {
        let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Aig);
        let a = ntk.append_pi("a");
        let b = ntk.append_pi("b");
        let g = aig_and(&mut ntk, Fanin::new(a, false), Fanin::new(b, false));
        ntk.append_po(Fanin::new(g, false), "y");
        assert_eq!(check(&ntk), Ok(()));
    }

    #[test]
    fn sequential_feedback_is_not_a_cycle() {
        let mut ntk = Ntk::new(NtkType::Sequential, FuncKind::Aig);
        let en = ntk.append_pi("en");
        let latch = ntk.append_latch(Fanin::new(en, false), ResetValue::Zero, "q");
        let fed = aig_and(&mut ntk, Fanin::new(en, false), Fanin::new(latch, false));
        ntk.redirect_fanin(latch, Fanin::new(fed, false));
        assert_eq!(check(&ntk), Ok(()));
    }

    #[test]
    fn netlist_with_no_nets_is_caught() {
        let mut ntk = Ntk::new(NtkType::Netlist, FuncKind::Aig);
        ntk.append_pi("a");
        assert_eq!(check(&ntk), Err(IntegrityError::NetlistHasNoNets));
    }

    #[test]
    fn stray_net_on_non_netlist_is_caught() {
        let mut ntk = Ntk::new(NtkType::Netlist, FuncKind::Aig);
        let net = ntk.append_net("w", None);
        ntk.force_ty(NtkType::Strashed);
        assert_eq!(check(&ntk), Err(IntegrityError::StrayNet(net)));
    }

    #[test]
    fn po_with_a_fanout_is_caught() {
        let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Aig);
        let a = ntk.append_pi("a");
        let b = ntk.append_pi("b");
        let po = ntk.append_po(Fanin::new(a, false), "y");
        // Wire a node's fanin directly at the PO, which nothing upstream
        // of check_boundary_shape prevents.
        aig_and(&mut ntk, Fanin::new(po, false), Fanin::new(b, false));
        assert_eq!(check(&ntk), Err(IntegrityError::PoHasFanouts(po, 1)));
    }

    #[test]
    fn unnamed_pi_is_caught() {
        let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Aig);
        let a = ntk.append_pi("a");
        ntk.clear_name(a);
        assert_eq!(check(&ntk), Err(IntegrityError::UnnamedBoundaryObject(a)));
    }

    #[test]
    fn function_tag_mismatch_is_caught() {
        let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Sop);
        let a = ntk.append_pi("a");
        let mut fanins = SmallVec::new();
        fanins.push(Fanin::new(a, false));
        let bad = ntk.append_node(fanins, LocalFunc::Aig);
        assert_eq!(check(&ntk), Err(IntegrityError::FunctionTagMismatch(bad)));
    }

    #[test]
    fn sop_cube_arity_mismatch_is_caught() {
        let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Sop);
        let a = ntk.append_pi("a");
        let b = ntk.append_pi("b");
        let mut fanins = SmallVec::new();
        fanins.push(Fanin::new(a, false));
        fanins.push(Fanin::new(b, false));
        // Two fanins but a single-literal cube.
        let bad = ntk.append_node(fanins, LocalFunc::Sop("1".into()));
        assert_eq!(
            check(&ntk),
            Err(IntegrityError::SopArityMismatch {
                id: bad,
                cube: 0,
                expected: 2,
                actual: 1,
            })
        );
    }
}
