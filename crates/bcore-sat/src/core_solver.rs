//! The shared two-watched-literal CDCL engine behind both backends.

use crate::{Lit, SatResult, SatSolver, SatVar};
use bcore_entity::{entity_impl, EntityRef, PrimaryMap};
use rustc_hash::FxHashMap;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct ClauseId(u32);
entity_impl!(ClauseId, "c");

struct Clause {
    lits: Vec<Lit>,
    learnt: bool,
}

/// The CDCL engine: trail-based assignment, two-watched-literal unit
/// propagation, first-UIP conflict analysis, non-chronological
/// backtracking. Shared by [`IncrementalBackend`] and [`BulkBackend`],
/// which differ only in what they allow between `solve` calls.
pub(crate) struct CdclCore {
    clauses: PrimaryMap<ClauseId, Clause>,
    watches: FxHashMap<Lit, Vec<ClauseId>>,
    cur_clause: Vec<Lit>,

    assignment: Vec<Option<bool>>,
    var_level: Vec<Option<usize>>,
    var_reason: Vec<Option<ClauseId>>,
    activity: Vec<f64>,
    polarity: Vec<bool>,
    var_inc: f64,

    trail: Vec<Lit>,
    trail_lim: Vec<usize>,
    qhead: usize,

    assumptions: Vec<Lit>,
    assumption_idx: usize,

    /// Set once an empty clause (or a unit clause contradicting an
    /// existing fact at level 0) is finalized; every future `solve`
    /// short-circuits to `Unsat`.
    contradiction: bool,

    terminate: Option<Box<dyn FnMut() -> bool>>,
}

impl CdclCore {
    pub(crate) fn new() -> Self {
        Self {
            clauses: PrimaryMap::new(),
            watches: FxHashMap::default(),
            cur_clause: Vec::new(),
            assignment: Vec::new(),
            var_level: Vec::new(),
            var_reason: Vec::new(),
            activity: Vec::new(),
            polarity: Vec::new(),
            var_inc: 1.0,
            trail: Vec::new(),
            trail_lim: Vec::new(),
            qhead: 0,
            assumptions: Vec::new(),
            assumption_idx: 0,
            contradiction: false,
            terminate: None,
        }
    }

    pub(crate) fn new_var(&mut self) -> SatVar {
        let v = SatVar::new(self.assignment.len());
        self.assignment.push(None);
        self.var_level.push(None);
        self.var_reason.push(None);
        self.activity.push(0.0);
        self.polarity.push(true);
        v
    }

    fn num_vars(&self) -> usize {
        self.assignment.len()
    }

    fn decision_level(&self) -> usize {
        self.trail_lim.len()
    }

    fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.assignment[lit.var().index()].map(|v| v != lit.is_negated())
    }

    pub(crate) fn add_literal(&mut self, lit: Lit) {
        while self.num_vars() <= lit.var().index() {
            self.new_var();
        }
        self.cur_clause.push(lit);
    }

    pub(crate) fn finalize_clause(&mut self) {
        let lits = std::mem::take(&mut self.cur_clause);
        self.add_clause(lits, false);
    }

    fn add_clause(&mut self, lits: Vec<Lit>, learnt: bool) -> Option<ClauseId> {
        if lits.is_empty() {
            self.contradiction = true;
            return None;
        }
        let cid = self.clauses.push(Clause {
            lits: lits.clone(),
            learnt,
        });
        if lits.len() >= 2 {
            self.watches.entry(lits[0]).or_default().push(cid);
            self.watches.entry(lits[1]).or_default().push(cid);
        } else {
            match self.lit_value(lits[0]) {
                Some(false) => self.contradiction = true,
                Some(true) => {}
                None => self.enqueue(lits[0], Some(cid)),
            }
        }
        Some(cid)
    }

    pub(crate) fn assume(&mut self, lit: Lit) {
        self.assumptions.push(lit);
    }

    pub(crate) fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    pub(crate) fn model_value(&self, var: SatVar) -> Option<bool> {
        self.assignment.get(var.index()).copied().flatten()
    }

    pub(crate) fn set_terminate_callback(&mut self, cb: Box<dyn FnMut() -> bool>) {
        self.terminate = Some(cb);
    }

    /// Undo every assignment back to (but not including) `level`.
    fn backtrack_to(&mut self, level: usize) {
        if self.decision_level() <= level {
            return;
        }
        let lim = self.trail_lim[level];
        for &lit in self.trail[lim..].iter().rev() {
            let v = lit.var();
            self.polarity[v.index()] = !lit.is_negated();
            self.assignment[v.index()] = None;
            self.var_level[v.index()] = None;
            self.var_reason[v.index()] = None;
        }
        self.trail.truncate(lim);
        self.trail_lim.truncate(level);
        self.qhead = self.trail.len();
    }

    /// Drop the current assumption trail (everything above level 0) but
    /// keep every clause, learnt or original — the hook that makes
    /// incremental reuse across `solve` calls possible.
    pub(crate) fn reset(&mut self) {
        self.backtrack_to(0);
        self.assumptions.clear();
        self.assumption_idx = 0;
    }

    fn enqueue(&mut self, lit: Lit, reason: Option<ClauseId>) {
        let v = lit.var();
        self.assignment[v.index()] = Some(!lit.is_negated());
        self.var_level[v.index()] = Some(self.decision_level());
        self.var_reason[v.index()] = reason;
        self.trail.push(lit);
    }

    fn new_decision_level(&mut self) {
        self.trail_lim.push(self.trail.len());
    }

    /// Two-watched-literal unit propagation. Returns the conflicting
    /// clause, if any.
    fn propagate(&mut self) -> Option<ClauseId> {
        while self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            let falsified = p.negate();

            let watchers = self.watches.remove(&falsified).unwrap_or_default();
            let mut keep: Vec<ClauseId> = Vec::with_capacity(watchers.len());
            let mut idx = 0;

            while idx < watchers.len() {
                let cid = watchers[idx];
                idx += 1;

                let mut lits = self.clauses[cid].lits.clone();
                if lits[1] == falsified {
                    lits.swap(0, 1);
                }
                let other = lits[1];

                if self.lit_value(other) == Some(true) {
                    keep.push(cid);
                    continue;
                }

                let mut relocated = false;
                for k in 2..lits.len() {
                    if self.lit_value(lits[k]) != Some(false) {
                        lits.swap(0, k);
                        let new_watch = lits[0];
                        self.clauses[cid].lits = lits;
                        self.watches.entry(new_watch).or_default().push(cid);
                        relocated = true;
                        break;
                    }
                }
                if relocated {
                    continue;
                }

                if self.lit_value(other) == Some(false) {
                    keep.push(cid);
                    keep.extend_from_slice(&watchers[idx..]);
                    self.watches.insert(falsified, keep);
                    return Some(cid);
                }

                self.enqueue(other, Some(cid));
                keep.push(cid);
            }

            self.watches.insert(falsified, keep);
        }
        None
    }

    fn bump_activity(&mut self, var: SatVar) {
        self.activity[var.index()] += self.var_inc;
        if self.activity[var.index()] > 1e100 {
            for a in &mut self.activity {
                *a *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }
    }

    fn decay_activities(&mut self) {
        self.var_inc *= 1.0 / 0.95;
    }

    /// First-UIP conflict analysis. Returns the learnt clause (with the
    /// asserting literal at index 0, the highest-level remaining
    /// literal at index 1) and the decision level to backtrack to.
    fn analyze(&mut self, conflict: ClauseId) -> (Vec<Lit>, usize) {
        let mut seen = vec![false; self.num_vars()];
        let mut learnt: Vec<Lit> = vec![Lit::positive(SatVar::new(0))];
        let cur_level = self.decision_level();
        let mut counter = 0usize;
        let mut p: Option<Lit> = None;
        let mut reason = conflict;
        let mut trail_idx = self.trail.len();

        loop {
            let lits = self.clauses[reason].lits.clone();
            for &lit in &lits {
                if Some(lit.var()) == p.map(Lit::var) {
                    continue;
                }
                let v = lit.var();
                if seen[v.index()] {
                    continue;
                }
                seen[v.index()] = true;
                self.bump_activity(v);
                let lvl = self.var_level[v.index()].unwrap_or(0);
                if lvl == cur_level {
                    counter += 1;
                } else if lvl > 0 {
                    learnt.push(lit);
                }
            }

            loop {
                trail_idx -= 1;
                let lit = self.trail[trail_idx];
                if seen[lit.var().index()] {
                    p = Some(lit);
                    break;
                }
            }
            seen[p.unwrap().var().index()] = false;
            counter -= 1;
            if counter == 0 {
                break;
            }
            reason = self.var_reason[p.unwrap().var().index()]
                .expect("a non-decision trail literal always has a reason clause");
        }

        let uip = p.unwrap();
        learnt[0] = uip.negate();

        let mut backtrack_level = 0;
        if learnt.len() > 1 {
            let mut max_i = 1;
            for i in 2..learnt.len() {
                let li = self.var_level[learnt[i].var().index()].unwrap_or(0);
                let lmax = self.var_level[learnt[max_i].var().index()].unwrap_or(0);
                if li > lmax {
                    max_i = i;
                }
            }
            learnt.swap(1, max_i);
            backtrack_level = self.var_level[learnt[1].var().index()].unwrap_or(0);
        }

        (learnt, backtrack_level)
    }

    fn pick_decision_literal(&mut self) -> Option<Lit> {
        while self.assumption_idx < self.assumptions.len() {
            let lit = self.assumptions[self.assumption_idx];
            self.assumption_idx += 1;
            match self.lit_value(lit) {
                Some(true) => continue,
                Some(false) => return None,
                None => return Some(lit),
            }
        }

        let mut best: Option<(usize, f64)> = None;
        for (idx, slot) in self.assignment.iter().enumerate() {
            if slot.is_none() {
                let act = self.activity[idx];
                let better = match best {
                    Some((_, ba)) => act > ba,
                    None => true,
                };
                if better {
                    best = Some((idx, act));
                }
            }
        }
        best.map(|(idx, _)| {
            let v = SatVar::new(idx);
            Lit::new(v, !self.polarity[idx])
        })
    }

    fn should_terminate(&mut self) -> bool {
        match &mut self.terminate {
            Some(cb) => cb(),
            None => false,
        }
    }

    /// Run CDCL search to completion under the pending assumptions.
    pub(crate) fn solve(&mut self) -> SatResult {
        if self.contradiction {
            self.assumptions.clear();
            self.assumption_idx = 0;
            return SatResult::Unsat;
        }
        self.assumption_idx = 0;

        let result = loop {
            match self.propagate() {
                Some(conflict) => {
                    if self.decision_level() == 0 {
                        break SatResult::Unsat;
                    }
                    let (learnt, backtrack_level) = self.analyze(conflict);
                    self.backtrack_to(backtrack_level);
                    let cid = self
                        .add_clause(learnt.clone(), true)
                        .expect("a learnt clause from a real conflict is never empty");
                    self.enqueue(learnt[0], Some(cid));
                    self.decay_activities();
                }
                None => {
                    if self.assignment.iter().all(Option::is_some) {
                        break SatResult::Sat;
                    }
                    if self.should_terminate() {
                        break SatResult::Timeout;
                    }
                    match self.pick_decision_literal() {
                        Some(lit) => {
                            self.new_decision_level();
                            self.enqueue(lit, None);
                        }
                        None => break SatResult::Unsat,
                    }
                }
            }
        };

        self.assumptions.clear();
        self.assumption_idx = 0;
        result
    }
}

/// A CDCL backend that supports repeated `solve` calls with fresh
/// assumptions each time, reusing every clause learnt by earlier calls —
/// the incremental variant of `bcore-exact`'s per-minterm constraint
/// accumulation.
pub struct IncrementalBackend {
    core: CdclCore,
}

impl IncrementalBackend {
    pub fn new() -> Self {
        Self { core: CdclCore::new() }
    }
}

impl Default for IncrementalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SatSolver for IncrementalBackend {
    fn new_var(&mut self) -> SatVar {
        self.core.new_var()
    }

    fn add_literal(&mut self, lit: Lit) {
        self.core.add_literal(lit);
    }

    fn finalize_clause(&mut self) {
        self.core.finalize_clause();
    }

    fn assume(&mut self, lit: Lit) {
        self.core.assume(lit);
    }

    fn solve(&mut self) -> SatResult {
        self.core.reset();
        self.core.solve()
    }

    fn model_value(&self, var: SatVar) -> Option<bool> {
        self.core.model_value(var)
    }

    fn set_terminate_callback(&mut self, cb: Box<dyn FnMut() -> bool>) {
        self.core.set_terminate_callback(cb);
    }

    fn reset(&mut self) {
        self.core.reset();
    }

    fn clause_count(&self) -> usize {
        self.core.clause_count()
    }
}

/// A CDCL backend restricted to one `solve` call per instance — for the
/// CEGAR variant, which rebuilds its whole per-round clause set anyway
/// and has no use for cross-round assumption reuse.
pub struct BulkBackend {
    core: CdclCore,
    solved: bool,
}

impl BulkBackend {
    pub fn new() -> Self {
        Self {
            core: CdclCore::new(),
            solved: false,
        }
    }
}

impl Default for BulkBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SatSolver for BulkBackend {
    fn new_var(&mut self) -> SatVar {
        self.core.new_var()
    }

    fn add_literal(&mut self, lit: Lit) {
        self.core.add_literal(lit);
    }

    fn finalize_clause(&mut self) {
        self.core.finalize_clause();
    }

    fn assume(&mut self, lit: Lit) {
        self.core.assume(lit);
    }

    fn solve(&mut self) -> SatResult {
        assert!(!self.solved, "BulkBackend::solve called more than once");
        self.solved = true;
        self.core.solve()
    }

    fn model_value(&self, var: SatVar) -> Option<bool> {
        self.core.model_value(var)
    }

    fn set_terminate_callback(&mut self, cb: Box<dyn FnMut() -> bool>) {
        self.core.set_terminate_callback(cb);
    }

    fn reset(&mut self) {
        self.core.reset();
        self.solved = false;
    }

    fn clause_count(&self) -> usize {
        self.core.clause_count()
    }
}
