//! Duplication, single-output cone extraction, and multi-output split.
//!
//! All three walk the same fanin graph; they differ only in which
//! objects seed the walk and how sequential boundaries (latches) are
//! treated. Full duplication preserves latches as latches; cone
//! extraction and output splitting treat a latch output reached while
//! walking backward as an opaque primary input, since both feed
//! combinational-only engines (MIAIG, exact synthesis).

use crate::{Fanin, LocalFunc, Ntk, NtkType, Obj, ObjId};
use bcore_entity::EntityRef;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

fn translate_local(ntk: &Ntk, out: &mut Ntk, local: &LocalFunc) -> LocalFunc {
    match local {
        LocalFunc::None => LocalFunc::None,
        LocalFunc::Sop(cubes) => LocalFunc::Sop(cubes.clone()),
        LocalFunc::Bdd(id) => {
            let (src, dst) = (ntk.bdd(), out.bdd_mut());
            LocalFunc::Bdd(src.transfer(*id, dst))
        }
        LocalFunc::Aig => LocalFunc::Aig,
        LocalFunc::Mapped(gate) => LocalFunc::Mapped(*gate),
    }
}

fn owned_name(ntk: &Ntk, id: ObjId) -> String {
    ntk.name_of(id).map(|n| n.to_string()).unwrap_or_default()
}

fn copy_box(out: &mut Ntk, instance_of: &std::rc::Rc<str>, new_fanins: SmallVec<[Fanin; 4]>) -> ObjId {
    let new_id = out.objects.push(Obj::Box {
        instance_of: instance_of.clone(),
        fanins: new_fanins.clone(),
    });
    for f in &new_fanins {
        out.link_fanout(f.id, new_id);
    }
    out.recompute_level(new_id);
    new_id
}

/// Copy the whole network: every PI, latch, net, node, box, and PO, with
/// fanin/fanout reciprocity and levels recomputed from scratch.
pub fn duplicate(ntk: &Ntk) -> Ntk {
    let mut out = ntk.start_from_existing();
    let mut map: HashMap<ObjId, ObjId> = HashMap::new();

    for &pi in ntk.pis() {
        map.insert(pi, out.append_pi(&owned_name(ntk, pi)));
    }

    // Latches get a self-loop placeholder so a node whose fanin is a
    // latch output (the common feedback case — e.g. a counter's adder
    // reading its own latch) has a real id to point at before the
    // latch's data-input cone is built.
    for &latch in ntk.latches() {
        let reset = match ntk.object(latch) {
            Obj::Latch { reset, .. } => *reset,
            _ => unreachable!("Ntk::latches() only holds Latch objects"),
        };
        let id = out.objects.push(Obj::Latch {
            fanin: Fanin::new(ObjId::new(0), false),
            reset,
        });
        out.objects[id] = Obj::Latch {
            fanin: Fanin::new(id, false),
            reset,
        };
        out.latches.push(id);
        out.set_name(id, &owned_name(ntk, latch));
        map.insert(latch, id);
    }

    // Nets are placeholders too: a node's fanin may be a net, but (per
    // this Ntk's level/traversal model) a net never exposes its own
    // driver as part of someone else's fanin cone, so the driver can be
    // wired up after every node exists.
    for &net in ntk.nets() {
        let id = out.append_net(&owned_name(ntk, net), None);
        map.insert(net, id);
    }

    for old_id in ntk.topo_order() {
        if map.contains_key(&old_id) {
            continue;
        }
        match ntk.object(old_id) {
            Obj::Node { fanins, local } => {
                let new_fanins: SmallVec<[Fanin; 4]> = fanins
                    .iter()
                    .map(|f| Fanin::new(map[&f.id], f.complement))
                    .collect();
                let new_local = translate_local(ntk, &mut out, local);
                let new_id = out.append_node(new_fanins, new_local);
                map.insert(old_id, new_id);
            }
            Obj::Box { instance_of, fanins } => {
                let new_fanins: SmallVec<[Fanin; 4]> = fanins
                    .iter()
                    .map(|f| Fanin::new(map[&f.id], f.complement))
                    .collect();
                let new_id = copy_box(&mut out, instance_of, new_fanins);
                map.insert(old_id, new_id);
            }
            // Pi/Latch/Net are pre-seeded above; Po is appended below
            // once every node it might fan out from exists. Dead objects
            // are unreachable from topo_order (nothing holds a live
            // fanin into one) and never appear here.
            Obj::Pi | Obj::Latch { .. } | Obj::Net { .. } | Obj::Po(_) | Obj::Dead => {}
        }
    }

    for &latch in ntk.latches() {
        if let Obj::Latch { fanin, .. } = ntk.object(latch) {
            let new_fanin = Fanin::new(map[&fanin.id], fanin.complement);
            out.redirect_fanin(map[&latch], new_fanin);
        }
    }

    for &net in ntk.nets() {
        if let Obj::Net { driver } = ntk.object(net) {
            if let Some(d) = driver.expand() {
                let new_net = map[&net];
                let new_driver = map[&d];
                out.objects[new_net] = Obj::Net {
                    driver: Some(new_driver).into(),
                };
                out.link_fanout(new_driver, new_net);
            }
        }
    }

    for &po in ntk.pos() {
        if let Obj::Po(fanin) = ntk.object(po) {
            let new_fanin = Fanin::new(map[&fanin.id], fanin.complement);
            out.append_po(new_fanin, &owned_name(ntk, po));
        }
    }

    out
}

/// Extract the purely combinational fanin cone of `outputs` into a fresh
/// single-level-function [`Ntk`] of type [`NtkType::Logic`], one PO per
/// requested output. A latch reached while walking backward becomes a
/// primary input named after the latch plus a `_ci` suffix.
pub fn extract_cone(ntk: &Ntk, outputs: &[ObjId]) -> Ntk {
    let mut out = Ntk::new(NtkType::Logic, ntk.func());
    if let Some(lib) = ntk.library() {
        out.set_library(lib.clone());
    }
    let mut map: HashMap<ObjId, ObjId> = HashMap::new();
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut stack: Vec<(ObjId, bool)> = outputs.iter().map(|&o| (o, true)).collect();

    while let Some((id, first)) = stack.pop() {
        if visited.contains(&id) {
            continue;
        }
        if first {
            stack.push((id, false));
            if !matches!(ntk.object(id), Obj::Pi | Obj::Latch { .. }) {
                for f in ntk.object(id).fanins() {
                    if !visited.contains(&f.id) {
                        stack.push((f.id, true));
                    }
                }
            }
            continue;
        }
        visited.insert(id);
        order.push(id);
    }

    for &id in &order {
        match ntk.object(id) {
            Obj::Pi => {
                map.insert(id, out.append_pi(&owned_name(ntk, id)));
            }
            Obj::Latch { .. } => {
                let name = format!("{}_ci", owned_name(ntk, id));
                map.insert(id, out.append_pi(&name));
            }
            Obj::Node { fanins, local } => {
                let new_fanins: SmallVec<[Fanin; 4]> = fanins
                    .iter()
                    .map(|f| Fanin::new(map[&f.id], f.complement))
                    .collect();
                let new_local = translate_local(ntk, &mut out, local);
                map.insert(id, out.append_node(new_fanins, new_local));
            }
            Obj::Box { instance_of, fanins } => {
                let new_fanins: SmallVec<[Fanin; 4]> = fanins
                    .iter()
                    .map(|f| Fanin::new(map[&f.id], f.complement))
                    .collect();
                let new_id = copy_box(&mut out, instance_of, new_fanins);
                map.insert(id, new_id);
            }
            Obj::Po(_) | Obj::Net { .. } | Obj::Dead => {
                // Outputs must name a Pi/Latch/Node/Box; POs, nets, and
                // dead (deleted) objects passed in here simply aren't
                // copied.
            }
        }
    }

    for (i, &root) in outputs.iter().enumerate() {
        let name = ntk
            .name_of(root)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("cone_out{i}"));
        out.append_po(Fanin::new(map[&root], false), &name);
    }

    out
}

/// Split a multi-output network into one single-output network per PO,
/// preserving each PO's own inversion.
pub fn split_outputs(ntk: &Ntk) -> Vec<Ntk> {
    ntk.pos()
        .iter()
        .map(|&po| {
            let fanin = match ntk.object(po) {
                Obj::Po(f) => *f,
                _ => unreachable!("Ntk::pos() only holds Po objects"),
            };
            let mut cone = extract_cone(ntk, &[fanin.id]);
            if fanin.complement {
                let out_id = cone.pos()[0];
                if let Obj::Po(f) = &mut cone.objects[out_id] {
                    f.complement = !f.complement;
                }
            }
            cone
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FuncKind, LocalFunc, ResetValue};

    fn aig_and(ntk: &mut Ntk, a: Fanin, b: Fanin) -> ObjId {
        let mut fanins = SmallVec::new();
        fanins.push(a);
        fanins.push(b);
        ntk.append_node(fanins, LocalFunc::Aig)
    }

    #[test]
    fn duplicate_preserves_io_shape_and_aig_function() {
        let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Aig);
        let a = ntk.append_pi("a");
        let b = ntk.append_pi("b");
        let and_ab = aig_and(&mut ntk, Fanin::new(a, false), Fanin::new(b, true));
        ntk.append_po(Fanin::new(and_ab, false), "y");

        let copy = duplicate(&ntk);
        assert_eq!(copy.pis().len(), ntk.pis().len());
        assert_eq!(copy.pos().len(), ntk.pos().len());
        assert_eq!(copy.num_objects(), ntk.num_objects());
        assert_eq!(copy.name_of(copy.pos()[0]).unwrap(), "y".into());
    }

    #[test]
    fn duplicate_resolves_latch_feedback_loop() {
        let mut ntk = Ntk::new(NtkType::Sequential, FuncKind::Aig);
        let en = ntk.append_pi("en");
        // A latch whose own (not-yet-existing) output feeds its data
        // input through one AND gate — the standard counter-enable
        // shape that makes naive single-pass duplication impossible.
        let latch = ntk.append_latch(Fanin::new(en, false), ResetValue::Zero, "q");
        let fedback = aig_and(&mut ntk, Fanin::new(en, false), Fanin::new(latch, false));
        ntk.redirect_fanin(latch, Fanin::new(fedback, false));

        let copy = duplicate(&ntk);
        assert_eq!(copy.latches().len(), 1);
        let new_latch = copy.latches()[0];
        let new_fanin = match copy.object(new_latch) {
            Obj::Latch { fanin, .. } => *fanin,
            _ => unreachable!(),
        };
        assert_ne!(new_fanin.id, new_latch, "placeholder self-loop must be redirected");
    }

    #[test]
    fn extract_cone_treats_latch_as_primary_input() {
        let mut ntk = Ntk::new(NtkType::Sequential, FuncKind::Aig);
        let a = ntk.append_pi("a");
        let latch = ntk.append_latch(Fanin::new(a, false), ResetValue::Zero, "state");
        let gate = aig_and(&mut ntk, Fanin::new(a, false), Fanin::new(latch, false));
        ntk.append_po(Fanin::new(gate, false), "y");

        let cone = extract_cone(&ntk, &[gate]);
        assert_eq!(cone.latches().len(), 0);
        assert_eq!(cone.pis().len(), 2);
        assert!(cone.pis().iter().any(|&p| cone.name_of(p).unwrap() == "state_ci".into()));
    }

    #[test]
    fn split_outputs_preserves_po_inversion() {
        let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Aig);
        let a = ntk.append_pi("a");
        let b = ntk.append_pi("b");
        let and_ab = aig_and(&mut ntk, Fanin::new(a, false), Fanin::new(b, false));
        ntk.append_po(Fanin::new(and_ab, false), "y0");
        ntk.append_po(Fanin::new(and_ab, true), "y1");

        let split = split_outputs(&ntk);
        assert_eq!(split.len(), 2);
        for cone in &split {
            assert_eq!(cone.pos().len(), 1);
        }
        let f0 = match split[0].object(split[0].pos()[0]) {
            Obj::Po(f) => *f,
            _ => unreachable!(),
        };
        let f1 = match split[1].object(split[1].pos()[0]) {
            Obj::Po(f) => *f,
            _ => unreachable!(),
        };
        assert_ne!(f0.complement, f1.complement);
    }
}
