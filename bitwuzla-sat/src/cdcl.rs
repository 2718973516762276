//! The built-in CDCL engine.

use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use crate::{Lit, SatResult, SatSolver, Terminator, Var};

const RESTART_UNIT: u64 = 128;
const VAR_DECAY: f64 = 0.95;
const ACTIVITY_RESCALE: f64 = 1e100;

struct Clause {
    lits: Vec<Lit>,
}

/// Conflict-driven clause-learning SAT solver with two-watched-literal
/// propagation, first-UIP learning, VSIDS-style decisions and Luby
/// restarts. Supports incremental use: clauses may be added between
/// queries, assumptions hold for a single query.
pub struct Cdcl {
    clauses: Vec<Clause>,
    /// Indexed by literal encoding: clauses to inspect when the literal
    /// becomes true (they watch its negation).
    watches: Vec<Vec<u32>>,
    assigns: Vec<i8>,
    phase: Vec<bool>,
    level: Vec<u32>,
    /// Reason clause index per variable, -1 for decisions and units.
    reason: Vec<i32>,
    trail: Vec<Lit>,
    trail_lim: Vec<usize>,
    qhead: usize,
    activity: Vec<f64>,
    var_inc: f64,
    heap: BinaryHeap<(u64, Var)>,
    seen: Vec<bool>,
    clause_buf: Vec<i32>,
    assumptions: Vec<Lit>,
    failed_set: FxHashSet<Lit>,
    model: Vec<i8>,
    ok: bool,
    terminate: Option<Terminator>,
    num_conflicts: u64,
}

impl Default for Cdcl {
    fn default() -> Self {
        Self::new()
    }
}

impl Cdcl {
    /// Create an empty solver.
    pub fn new() -> Self {
        Self {
            clauses: Vec::new(),
            watches: Vec::new(),
            assigns: Vec::new(),
            phase: Vec::new(),
            level: Vec::new(),
            reason: Vec::new(),
            trail: Vec::new(),
            trail_lim: Vec::new(),
            qhead: 0,
            activity: Vec::new(),
            var_inc: 1.0,
            heap: BinaryHeap::new(),
            seen: Vec::new(),
            clause_buf: Vec::new(),
            assumptions: Vec::new(),
            failed_set: FxHashSet::default(),
            model: Vec::new(),
            ok: true,
            terminate: None,
            num_conflicts: 0,
        }
    }

    /// Total number of conflicts over the solver's lifetime.
    pub fn num_conflicts(&self) -> u64 {
        self.num_conflicts
    }

    /// The number of variables seen so far.
    pub fn num_vars(&self) -> usize {
        self.assigns.len()
    }

    fn ensure_var(&mut self, var: Var) {
        while self.assigns.len() <= var as usize {
            self.assigns.push(0);
            self.phase.push(false);
            self.level.push(0);
            self.reason.push(-1);
            self.activity.push(0.0);
            self.seen.push(false);
            self.watches.push(Vec::new());
            self.watches.push(Vec::new());
            let v = (self.assigns.len() - 1) as Var;
            self.heap.push((0, v));
        }
    }

    fn lit_value(&self, lit: Lit) -> i8 {
        let a = self.assigns[lit.var() as usize];
        if lit.is_positive() {
            a
        } else {
            -a
        }
    }

    fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    fn enqueue(&mut self, lit: Lit, reason: i32) {
        let var = lit.var() as usize;
        debug_assert_eq!(self.assigns[var], 0);
        self.assigns[var] = if lit.is_positive() { 1 } else { -1 };
        self.level[var] = self.decision_level();
        self.reason[var] = reason;
        self.trail.push(lit);
    }

    fn bump(&mut self, var: Var) {
        let v = var as usize;
        self.activity[v] += self.var_inc;
        if self.activity[v] > ACTIVITY_RESCALE {
            for a in self.activity.iter_mut() {
                *a *= 1.0 / ACTIVITY_RESCALE;
            }
            self.var_inc *= 1.0 / ACTIVITY_RESCALE;
        }
        self.heap.push((self.activity[v].to_bits(), var));
    }

    fn decay(&mut self) {
        self.var_inc /= VAR_DECAY;
    }

    fn backtrack(&mut self, target: u32) {
        if self.decision_level() <= target {
            return;
        }
        let bound = self.trail_lim[target as usize];
        while self.trail.len() > bound {
            let lit = self.trail.pop().unwrap();
            let var = lit.var() as usize;
            self.phase[var] = lit.is_positive();
            self.assigns[var] = 0;
            self.reason[var] = -1;
            self.heap.push((self.activity[var].to_bits(), lit.var()));
        }
        self.trail_lim.truncate(target as usize);
        self.qhead = self.trail.len();
    }

    /// Unit propagation; returns the index of a conflicting clause.
    fn propagate(&mut self) -> Option<u32> {
        while self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            let false_lit = p.negate();
            let widx = p.raw() as usize;
            let mut ws = std::mem::take(&mut self.watches[widx]);
            let mut i = 0;
            let mut j = 0;
            while i < ws.len() {
                let ci = ws[i];
                i += 1;
                {
                    let c = &mut self.clauses[ci as usize];
                    if c.lits[0] == false_lit {
                        c.lits.swap(0, 1);
                    }
                }
                let first = self.clauses[ci as usize].lits[0];
                if self.lit_value(first) == 1 {
                    ws[j] = ci;
                    j += 1;
                    continue;
                }
                // Look for a non-false replacement watch.
                let len = self.clauses[ci as usize].lits.len();
                let mut replacement = None;
                for k in 2..len {
                    let lk = self.clauses[ci as usize].lits[k];
                    if self.lit_value(lk) != -1 {
                        replacement = Some((k, lk));
                        break;
                    }
                }
                if let Some((k, lk)) = replacement {
                    self.clauses[ci as usize].lits.swap(1, k);
                    self.watches[lk.negate().raw() as usize].push(ci);
                    continue;
                }
                // Unit or conflict; the watch stays.
                ws[j] = ci;
                j += 1;
                if self.lit_value(first) == -1 {
                    // Conflict: keep the remaining watches and bail out.
                    while i < ws.len() {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                    ws.truncate(j);
                    self.watches[widx] = ws;
                    self.qhead = self.trail.len();
                    return Some(ci);
                }
                self.enqueue(first, ci as i32);
            }
            ws.truncate(j);
            self.watches[widx] = ws;
        }
        None
    }

    /// First-UIP conflict analysis. Returns the learnt clause (asserting
    /// literal first) and the backtrack level.
    fn analyze(&mut self, confl: u32) -> (Vec<Lit>, u32) {
        let mut learnt: Vec<Lit> = vec![Lit::positive(0)]; // placeholder
        let mut counter = 0u32;
        let mut confl = confl as usize;
        let mut idx = self.trail.len();
        let mut resolved: Option<Lit> = None;

        loop {
            let skip = usize::from(resolved.is_some());
            let lits = self.clauses[confl].lits.clone();
            for &q in &lits[skip..] {
                let v = q.var() as usize;
                if !self.seen[v] && self.level[v] > 0 {
                    self.seen[v] = true;
                    self.bump(q.var());
                    if self.level[v] >= self.decision_level() {
                        counter += 1;
                    } else {
                        learnt.push(q);
                    }
                }
            }
            // Walk the trail back to the next marked literal.
            loop {
                idx -= 1;
                if self.seen[self.trail[idx].var() as usize] {
                    break;
                }
            }
            let p = self.trail[idx];
            self.seen[p.var() as usize] = false;
            counter -= 1;
            if counter == 0 {
                learnt[0] = p.negate();
                break;
            }
            confl = self.reason[p.var() as usize] as usize;
            resolved = Some(p);
        }

        let bt_level = learnt[1..]
            .iter()
            .map(|l| self.level[l.var() as usize])
            .max()
            .unwrap_or(0);
        // Move a literal of the backtrack level into the second watch slot.
        if learnt.len() > 1 {
            let pos = learnt[1..]
                .iter()
                .position(|l| self.level[l.var() as usize] == bt_level)
                .unwrap()
                + 1;
            learnt.swap(1, pos);
        }
        for l in &learnt {
            self.seen[l.var() as usize] = false;
        }
        (learnt, bt_level)
    }

    fn record_learnt(&mut self, learnt: Vec<Lit>) {
        if learnt.len() == 1 {
            self.backtrack(0);
            if self.lit_value(learnt[0]) == -1 {
                self.ok = false;
            } else if self.lit_value(learnt[0]) == 0 {
                self.enqueue(learnt[0], -1);
            }
            return;
        }
        let ci = self.clauses.len() as u32;
        self.watches[learnt[0].negate().raw() as usize].push(ci);
        self.watches[learnt[1].negate().raw() as usize].push(ci);
        let first = learnt[0];
        self.clauses.push(Clause { lits: learnt });
        self.enqueue(first, ci as i32);
    }

    /// Collect the failed assumption core for the assumption `a` whose
    /// negation is implied by the previous assumptions.
    fn analyze_final(&mut self, a: Lit) {
        self.failed_set.insert(a);
        if self.decision_level() == 0 {
            return;
        }
        self.seen[a.var() as usize] = true;
        let bound = self.trail_lim[0];
        for i in (bound..self.trail.len()).rev() {
            let lit = self.trail[i];
            let v = lit.var() as usize;
            if !self.seen[v] {
                continue;
            }
            let reason = self.reason[v];
            if reason < 0 {
                // A decision below the assumption boundary is an
                // assumption.
                self.failed_set.insert(lit);
            } else {
                let lits = self.clauses[reason as usize].lits.clone();
                for &l in &lits[1..] {
                    if self.level[l.var() as usize] > 0 {
                        self.seen[l.var() as usize] = true;
                    }
                }
            }
            self.seen[v] = false;
        }
        self.seen[a.var() as usize] = false;
    }

    fn pick_branch(&mut self) -> Option<Var> {
        while let Some((_, v)) = self.heap.pop() {
            if self.assigns[v as usize] == 0 {
                return Some(v);
            }
        }
        // Heap entries are lazy; fall back to a scan.
        (0..self.assigns.len() as Var).find(|&v| self.assigns[v as usize] == 0)
    }

    fn should_stop(&mut self) -> bool {
        match &mut self.terminate {
            Some(cb) => cb(),
            None => false,
        }
    }

    fn commit_clause(&mut self) {
        let mut lits: Vec<Lit> = self
            .clause_buf
            .iter()
            .map(|&l| Lit::from_dimacs(l))
            .collect();
        self.clause_buf.clear();
        for &l in &lits {
            self.ensure_var(l.var());
        }
        lits.sort();
        lits.dedup();
        // Tautologies and clauses satisfied at the root are dropped;
        // root-false literals are removed.
        for w in lits.windows(2) {
            if w[0].var() == w[1].var() {
                return;
            }
        }
        debug_assert_eq!(self.decision_level(), 0);
        lits.retain(|&l| {
            !(self.lit_value(l) == -1 && self.level[l.var() as usize] == 0)
        });
        if lits
            .iter()
            .any(|&l| self.lit_value(l) == 1 && self.level[l.var() as usize] == 0)
        {
            return;
        }
        match lits.len() {
            0 => self.ok = false,
            1 => {
                if self.lit_value(lits[0]) == 0 {
                    self.enqueue(lits[0], -1);
                }
            }
            _ => {
                let ci = self.clauses.len() as u32;
                self.watches[lits[0].negate().raw() as usize].push(ci);
                self.watches[lits[1].negate().raw() as usize].push(ci);
                self.clauses.push(Clause { lits });
            }
        }
    }

    fn luby(mut x: u64) -> u64 {
        // Knuth's formulation of the Luby sequence.
        let (mut size, mut seq) = (1u64, 0u32);
        while size < x + 1 {
            seq += 1;
            size = 2 * size + 1;
        }
        while size - 1 != x {
            size = (size - 1) >> 1;
            seq -= 1;
            x %= size;
        }
        1u64 << seq
    }

    fn search(&mut self) -> SatResult {
        let mut restarts = 0u64;
        let mut limit = RESTART_UNIT * Self::luby(restarts);
        let mut conflicts_here = 0u64;
        loop {
            if let Some(confl) = self.propagate() {
                self.num_conflicts += 1;
                conflicts_here += 1;
                if self.should_stop() {
                    return SatResult::Unknown;
                }
                if self.decision_level() == 0 {
                    self.ok = false;
                    return SatResult::Unsat;
                }
                let (learnt, bt) = self.analyze(confl);
                self.backtrack(bt);
                self.record_learnt(learnt);
                if !self.ok {
                    return SatResult::Unsat;
                }
                self.decay();
                continue;
            }
            if conflicts_here >= limit {
                restarts += 1;
                conflicts_here = 0;
                limit = RESTART_UNIT * Self::luby(restarts);
                self.backtrack(0);
                if self.should_stop() {
                    return SatResult::Unknown;
                }
                continue;
            }
            let dl = self.decision_level() as usize;
            if dl < self.assumptions.len() {
                let a = self.assumptions[dl];
                match self.lit_value(a) {
                    1 => {
                        // Already implied: open an empty level to keep the
                        // assumption index aligned with the decision level.
                        self.trail_lim.push(self.trail.len());
                    }
                    -1 => {
                        self.analyze_final(a);
                        return SatResult::Unsat;
                    }
                    _ => {
                        self.trail_lim.push(self.trail.len());
                        self.enqueue(a, -1);
                    }
                }
            } else {
                match self.pick_branch() {
                    Some(v) => {
                        let lit = if self.phase[v as usize] {
                            Lit::positive(v)
                        } else {
                            Lit::negative(v)
                        };
                        self.trail_lim.push(self.trail.len());
                        self.enqueue(lit, -1);
                    }
                    None => {
                        self.model = self.assigns.clone();
                        return SatResult::Sat;
                    }
                }
            }
        }
    }
}

impl SatSolver for Cdcl {
    fn add(&mut self, lit: i32) {
        if lit == 0 {
            self.commit_clause();
        } else {
            self.clause_buf.push(lit);
        }
    }

    fn assume(&mut self, lit: i32) {
        let l = Lit::from_dimacs(lit);
        self.ensure_var(l.var());
        self.assumptions.push(l);
    }

    fn solve(&mut self) -> SatResult {
        self.failed_set.clear();
        let result = if self.ok {
            self.search()
        } else {
            SatResult::Unsat
        };
        self.backtrack(0);
        self.assumptions.clear();
        result
    }

    fn value(&self, lit: i32) -> i8 {
        let l = Lit::from_dimacs(lit);
        let var = l.var() as usize;
        if var >= self.model.len() {
            return 0;
        }
        if l.is_positive() {
            self.model[var]
        } else {
            -self.model[var]
        }
    }

    fn failed(&self, lit: i32) -> bool {
        self.failed_set.contains(&Lit::from_dimacs(lit))
    }

    fn set_terminate(&mut self, cb: Option<Terminator>) {
        self.terminate = cb;
    }

    fn name(&self) -> &'static str {
        "cdcl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_clause(s: &mut Cdcl, lits: &[i32]) {
        for &l in lits {
            s.add(l);
        }
        s.add(0);
    }

    #[test]
    fn test_trivial_sat() {
        let mut s = Cdcl::new();
        add_clause(&mut s, &[1, 2]);
        assert_eq!(s.solve(), SatResult::Sat);
        assert!(s.value(1) == 1 || s.value(2) == 1);
    }

    #[test]
    fn test_trivial_unsat() {
        let mut s = Cdcl::new();
        add_clause(&mut s, &[1]);
        add_clause(&mut s, &[-1]);
        assert_eq!(s.solve(), SatResult::Unsat);
    }

    #[test]
    fn test_all_binary_combinations_unsat() {
        let mut s = Cdcl::new();
        add_clause(&mut s, &[1, 2]);
        add_clause(&mut s, &[-1, 2]);
        add_clause(&mut s, &[1, -2]);
        add_clause(&mut s, &[-1, -2]);
        assert_eq!(s.solve(), SatResult::Unsat);
    }

    #[test]
    fn test_model_satisfies_clauses() {
        let mut s = Cdcl::new();
        let clauses: Vec<Vec<i32>> = vec![
            vec![1, 2, 3],
            vec![-1, -2],
            vec![-2, -3],
            vec![-1, -3],
            vec![2, 3],
        ];
        for c in &clauses {
            add_clause(&mut s, c);
        }
        assert_eq!(s.solve(), SatResult::Sat);
        for c in &clauses {
            assert!(c.iter().any(|&l| s.value(l) == 1), "clause {c:?} unsatisfied");
        }
    }

    #[test]
    fn test_pigeonhole_3_into_2() {
        // Pigeon i in hole j: var 2*i + j + 1 for i in 0..3, j in 0..2.
        let mut s = Cdcl::new();
        let v = |i: i32, j: i32| 2 * i + j + 1;
        for i in 0..3 {
            add_clause(&mut s, &[v(i, 0), v(i, 1)]);
        }
        for j in 0..2 {
            for i1 in 0..3 {
                for i2 in (i1 + 1)..3 {
                    add_clause(&mut s, &[-v(i1, j), -v(i2, j)]);
                }
            }
        }
        assert_eq!(s.solve(), SatResult::Unsat);
    }

    #[test]
    fn test_propagation_chain() {
        let mut s = Cdcl::new();
        // 1 -> 2 -> 3 -> 4, with 1 forced.
        add_clause(&mut s, &[1]);
        add_clause(&mut s, &[-1, 2]);
        add_clause(&mut s, &[-2, 3]);
        add_clause(&mut s, &[-3, 4]);
        assert_eq!(s.solve(), SatResult::Sat);
        for l in 1..=4 {
            assert_eq!(s.value(l), 1);
        }
    }

    #[test]
    fn test_assumptions_and_failed() {
        let mut s = Cdcl::new();
        add_clause(&mut s, &[-1, 2]); // 1 -> 2
        s.assume(1);
        s.assume(-2);
        assert_eq!(s.solve(), SatResult::Unsat);
        assert!(s.failed(-2));
        // Without assumptions the problem is satisfiable again.
        assert_eq!(s.solve(), SatResult::Sat);
    }

    #[test]
    fn test_incremental_clause_addition() {
        let mut s = Cdcl::new();
        add_clause(&mut s, &[1, 2]);
        assert_eq!(s.solve(), SatResult::Sat);
        add_clause(&mut s, &[-1]);
        assert_eq!(s.solve(), SatResult::Sat);
        assert_eq!(s.value(2), 1);
        add_clause(&mut s, &[-2]);
        assert_eq!(s.solve(), SatResult::Unsat);
    }

    #[test]
    fn test_terminator_aborts() {
        let mut s = Cdcl::new();
        // Hard enough to guarantee at least one conflict.
        let v = |i: i32, j: i32| 3 * i + j + 1;
        for i in 0..4 {
            add_clause(&mut s, &[v(i, 0), v(i, 1), v(i, 2)]);
        }
        for j in 0..3 {
            for i1 in 0..4 {
                for i2 in (i1 + 1)..4 {
                    add_clause(&mut s, &[-v(i1, j), -v(i2, j)]);
                }
            }
        }
        s.set_terminate(Some(Box::new(|| true)));
        assert_eq!(s.solve(), SatResult::Unknown);
        // A terminated solver stays usable.
        s.set_terminate(None);
        assert_eq!(s.solve(), SatResult::Unsat);
    }

    #[test]
    fn test_duplicate_and_tautology_clauses() {
        let mut s = Cdcl::new();
        add_clause(&mut s, &[1, 1, 2]);
        add_clause(&mut s, &[3, -3]); // tautology, dropped
        add_clause(&mut s, &[-1]);
        add_clause(&mut s, &[-2, 1]);
        assert_eq!(s.solve(), SatResult::Unsat);
    }
}
