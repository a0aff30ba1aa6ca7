//! A per-pin rise/fall timing model (C6): forward arrival propagation,
//! backward required-time propagation, and a critical-path walk between
//! them. Independent of [`FuncKind`](crate::FuncKind) — it only reads
//! fanin structure and, for mapped nodes, gate delays out of a
//! [`TimingConstraints`] table.

use crate::{LocalFunc, Ntk, Obj, ObjId};
use bcore_entity::SecondaryMap;

/// How an input pin relates an input transition to an output transition.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Phase {
    /// An input rise causes an output rise (and fall causes fall).
    NonInverting,
    /// An input rise causes an output fall (and fall causes rise).
    Inverting,
    /// Either input transition may cause either output transition; both
    /// are charged the worse of the two delays.
    Either,
}

/// Rise/fall delay through one pin, plus its phase.
#[derive(Copy, Clone, Debug)]
pub struct PinTiming {
    pub rise: f64,
    pub fall: f64,
    pub phase: Phase,
}

impl PinTiming {
    pub fn new(rise: f64, fall: f64, phase: Phase) -> Self {
        Self { rise, fall, phase }
    }
}

/// The delay library and global period used by [`compute_arrival`] and
/// [`compute_required`].
#[derive(Clone, Debug)]
pub struct TimingConstraints {
    /// Applied to every fanin of a node whose [`LocalFunc`] isn't
    /// `Mapped` (i.e. every AIG/SOP/BDD node, and any node with no
    /// function yet) — a flat unit-delay-style stand-in for gates that
    /// haven't been through technology mapping.
    pub default_pin: PinTiming,
    /// Indexed by [`crate::GateId`]: the characterized delay of a
    /// mapped gate, applied uniformly to each of its input pins.
    pub gate_pins: Vec<PinTiming>,
    /// The global required arrival time at every primary output and
    /// latch data-input (a single-clock-period assumption).
    pub required_time_at_po: f64,
}

impl TimingConstraints {
    pub fn unit_delay(required_time_at_po: f64) -> Self {
        Self {
            default_pin: PinTiming::new(1.0, 1.0, Phase::Either),
            gate_pins: Vec::new(),
            required_time_at_po,
        }
    }
}

fn pin_timing(constraints: &TimingConstraints, local: &LocalFunc) -> PinTiming {
    match local {
        LocalFunc::Mapped(gate) => constraints
            .gate_pins
            .get(gate.0 as usize)
            .copied()
            .unwrap_or(constraints.default_pin),
        _ => constraints.default_pin,
    }
}

/// Swap `(rise, fall)` when the edge reads its driver complemented: a
/// complemented edge observes the driver's rise as a local fall and
/// vice versa before the pin's own phase is applied.
fn uncomplement(complement: bool, rise: f64, fall: f64) -> (f64, f64) {
    if complement {
        (fall, rise)
    } else {
        (rise, fall)
    }
}

fn propagate(pin: PinTiming, complement: bool, in_rise: f64, in_fall: f64) -> (f64, f64) {
    let (eff_rise, eff_fall) = uncomplement(complement, in_rise, in_fall);
    match pin.phase {
        Phase::NonInverting => (eff_rise + pin.rise, eff_fall + pin.fall),
        Phase::Inverting => (eff_fall + pin.rise, eff_rise + pin.fall),
        Phase::Either => {
            let worst = eff_rise.max(eff_fall) + pin.rise.max(pin.fall);
            (worst, worst)
        }
    }
}

fn back_propagate(pin: PinTiming, complement: bool, req_rise: f64, req_fall: f64) -> (f64, f64) {
    let (eff_req_rise, eff_req_fall) = match pin.phase {
        Phase::NonInverting => (req_rise - pin.rise, req_fall - pin.fall),
        Phase::Inverting => (req_fall - pin.rise, req_rise - pin.fall),
        Phase::Either => {
            let worst = (req_rise - pin.rise).min(req_fall - pin.fall);
            (worst, worst)
        }
    };
    uncomplement(complement, eff_req_rise, eff_req_fall)
}

/// Forward-propagate arrival times from every PI/latch output (time 0)
/// to every object reachable from a PO or latch data-input, in
/// [`Ntk::topo_order`] (fanins always precede their consumer there).
pub fn compute_arrival(ntk: &Ntk, constraints: &TimingConstraints) -> SecondaryMap<ObjId, (f64, f64)> {
    let mut arrival: SecondaryMap<ObjId, (f64, f64)> = SecondaryMap::new();
    for id in ntk.topo_order() {
        let value = match ntk.object(id) {
            Obj::Pi | Obj::Latch { .. } => (0.0, 0.0),
            Obj::Node { fanins, local } => {
                let pin = pin_timing(constraints, local);
                let mut rise = f64::NEG_INFINITY;
                let mut fall = f64::NEG_INFINITY;
                for f in fanins {
                    let (in_rise, in_fall) = arrival[f.id];
                    let (c_rise, c_fall) = propagate(pin, f.complement, in_rise, in_fall);
                    rise = rise.max(c_rise);
                    fall = fall.max(c_fall);
                }
                if fanins.is_empty() {
                    (0.0, 0.0)
                } else {
                    (rise, fall)
                }
            }
            Obj::Po(f) => arrival[f.id],
            Obj::Box { .. } | Obj::Net { .. } | Obj::Dead => (0.0, 0.0),
        };
        arrival[id] = value;
    }
    arrival
}

/// Backward-propagate required times from the global period at every
/// PO/latch data-input toward the objects that feed them.
pub fn compute_required(ntk: &Ntk, constraints: &TimingConstraints) -> SecondaryMap<ObjId, (f64, f64)> {
    let target = constraints.required_time_at_po;
    let mut required: SecondaryMap<ObjId, (f64, f64)> =
        SecondaryMap::with_default((f64::INFINITY, f64::INFINITY));

    for &po in ntk.pos() {
        required[po] = (target, target);
    }
    for &latch in ntk.latches() {
        required[latch] = (target, target);
    }

    let mut order = ntk.topo_order();
    order.reverse();
    for id in order {
        match ntk.object(id) {
            Obj::Node { fanins, local } => {
                let pin = pin_timing(constraints, local);
                let (req_rise, req_fall) = required[id];
                for f in fanins {
                    let (back_rise, back_fall) = back_propagate(pin, f.complement, req_rise, req_fall);
                    let cur = required[f.id];
                    required[f.id] = (cur.0.min(back_rise), cur.1.min(back_fall));
                }
            }
            Obj::Po(f) => {
                let req = required[id];
                let cur = required[f.id];
                required[f.id] = (cur.0.min(req.0), cur.1.min(req.1));
            }
            _ => {}
        }
    }
    required
}

/// The full slack-window set gathered by [`critical_path`], plus the
/// worst (least) slack found at any endpoint.
#[derive(Clone, Debug)]
pub struct CriticalPath {
    /// Every object within the slack window, in reverse topological
    /// order (an endpoint's objects precede the objects that feed them).
    pub path: Vec<ObjId>,
    /// `min(required - arrival)` over rise and fall, over every endpoint.
    pub slack: f64,
}

fn slack_at(
    id: ObjId,
    arrival: &SecondaryMap<ObjId, (f64, f64)>,
    required: &SecondaryMap<ObjId, (f64, f64)>,
) -> f64 {
    let (ar, af) = arrival[id];
    let (rr, rf) = required[id];
    (rr - ar).min(rf - af)
}

fn walk_within_slack(
    ntk: &Ntk,
    id: ObjId,
    arrival: &SecondaryMap<ObjId, (f64, f64)>,
    required: &SecondaryMap<ObjId, (f64, f64)>,
    slack_max: f64,
    visited: &mut std::collections::HashSet<ObjId>,
    order: &mut Vec<ObjId>,
) {
    if !visited.insert(id) {
        return;
    }
    if !ntk.object(id).is_ci() {
        for f in ntk.object(id).fanins() {
            if slack_at(f.id, arrival, required) <= slack_max {
                walk_within_slack(ntk, f.id, arrival, required, slack_max, visited, order);
            }
        }
    }
    order.push(id);
}

/// Enumerate every object within `window` percent of the network's max
/// delay of its endpoint's slack (spec.md §4.3): `SlackMax = Delay *
/// window / 100`, where `Delay` is the latest rise/fall arrival over
/// every CO driver (PO or latch data-input). Starting from every
/// endpoint whose own slack is within `SlackMax`, walk fanins whose
/// slack is also within `SlackMax`, using a visited set to avoid
/// revisiting shared objects. The result is reported in reverse
/// topological order, matching the order a single worst-path walk would
/// produce, but covering every endpoint within the window rather than
/// only the single worst one.
pub fn critical_path(
    ntk: &Ntk,
    arrival: &SecondaryMap<ObjId, (f64, f64)>,
    required: &SecondaryMap<ObjId, (f64, f64)>,
    window_percent: f64,
) -> CriticalPath {
    let endpoints: Vec<ObjId> = ntk.pos().iter().chain(ntk.latches().iter()).copied().collect();
    assert!(!endpoints.is_empty(), "a network with no POs or latches has no timing path");

    let worst_slack = endpoints
        .iter()
        .map(|&id| slack_at(id, arrival, required))
        .fold(f64::INFINITY, f64::min);
    let delay = endpoints
        .iter()
        .map(|&id| {
            let (ar, af) = arrival[id];
            ar.max(af)
        })
        .fold(0.0_f64, f64::max);
    let slack_max = delay * window_percent / 100.0;

    let mut visited = std::collections::HashSet::new();
    let mut order = Vec::new();
    for &endpoint in &endpoints {
        if slack_at(endpoint, arrival, required) <= slack_max {
            walk_within_slack(ntk, endpoint, arrival, required, slack_max, &mut visited, &mut order);
        }
    }
    order.reverse();

    CriticalPath {
        path: order,
        slack: worst_slack,
    }
}

/// The "LUT critical path" (spec.md §4.3's last sentence): restricted to
/// the `LocalFunc::Mapped` (technology-mapped LUT) objects already on
/// `delay_path`, tag whichever of their fanins sit on the level-critical
/// frontier of the network's own structural level map (`Ntk::level`),
/// the LUT-technology analogue of the delay-based walk above using
/// levels instead of the rise/fall delay units `critical_path` uses.
pub fn lut_critical_path(ntk: &Ntk, delay_path: &CriticalPath) -> Vec<ObjId> {
    let mut seen = std::collections::HashSet::new();
    let mut tagged = Vec::new();
    for &id in &delay_path.path {
        let Obj::Node {
            fanins,
            local: LocalFunc::Mapped(_),
        } = ntk.object(id)
        else {
            continue;
        };
        let my_level = ntk.level(id);
        for f in fanins {
            if my_level > 0 && ntk.level(f.id) + 1 == my_level && seen.insert(f.id) {
                tagged.push(f.id);
            }
        }
    }
    tagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fanin, FuncKind, NtkType};
    use smallvec::SmallVec;

    fn chain_of_ands(depth: usize) -> (Ntk, ObjId) {
        let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Aig);
        let a = ntk.append_pi("a");
        let b = ntk.append_pi("b");
        let mut cur = {
            let mut fanins = SmallVec::new();
            fanins.push(Fanin::new(a, false));
            fanins.push(Fanin::new(b, false));
            ntk.append_node(fanins, LocalFunc::Aig)
        };
        for _ in 1..depth {
            let mut fanins = SmallVec::new();
            fanins.push(Fanin::new(cur, false));
            fanins.push(Fanin::new(a, false));
            cur = ntk.append_node(fanins, LocalFunc::Aig);
        }
        let po = ntk.append_po(Fanin::new(cur, false), "y");
        (ntk, po)
    }

    #[test]
    fn arrival_grows_monotonically_along_the_chain() {
        let (ntk, po) = chain_of_ands(5);
        let constraints = TimingConstraints::unit_delay(100.0);
        let arrival = compute_arrival(&ntk, &constraints);

        let mut cur = match ntk.object(po) {
            Obj::Po(f) => f.id,
            _ => unreachable!(),
        };
        let mut prev = arrival[cur].0;
        loop {
            let fanins = ntk.object(cur).fanins();
            let Some(next) = fanins.iter().find(|f| !matches!(ntk.object(f.id), Obj::Pi)) else {
                break;
            };
            let next_arrival = arrival[next.id].0;
            assert!(next_arrival <= prev);
            prev = next_arrival;
            cur = next.id;
        }
    }

    #[test]
    fn critical_path_slack_matches_the_worst_endpoint() {
        let (ntk, _po) = chain_of_ands(4);
        let constraints = TimingConstraints::unit_delay(3.0);
        let arrival = compute_arrival(&ntk, &constraints);
        let required = compute_required(&ntk, &constraints);
        let cp = critical_path(&ntk, &arrival, &required, 0.0);

        assert_eq!(cp.path[0], ntk.pos()[0]);
        // Four two-input AND levels at unit delay blow through a period
        // of 3: slack must go negative.
        assert!(cp.slack < 0.0);
    }

    #[test]
    fn inverting_gate_swaps_rise_and_fall() {
        let mut ntk = Ntk::new(NtkType::Strashed, FuncKind::Aig);
        let a = ntk.append_pi("a");
        let mut fanins = SmallVec::new();
        fanins.push(Fanin::new(a, false));
        let inv = ntk.append_node(fanins, LocalFunc::Aig);
        let po = ntk.append_po(Fanin::new(inv, false), "y");

        let constraints = TimingConstraints {
            default_pin: PinTiming::new(2.0, 5.0, Phase::Inverting),
            gate_pins: Vec::new(),
            required_time_at_po: 100.0,
        };
        let arrival = compute_arrival(&ntk, &constraints);
        // PI rise (0.0) becomes an output fall charged at `pin.fall`;
        // PI fall (0.0) becomes an output rise charged at `pin.rise`.
        assert_eq!(arrival[inv], (2.0, 5.0));
        assert_eq!(arrival[po], arrival[inv]);
    }
}
