//! The eager bit-blasting solver.
//!
//! Boolean assertions are lowered through the AIG layer into CNF and
//! handed to the SAT backend. When unsat-core tracking is enabled,
//! assertions are attached through assumption literals instead of unit
//! clauses so the backend's failed-assumption set identifies the core.

use rustc_hash::{FxHashMap, FxHashSet};

use bitwuzla_bv::BvValue;
use bitwuzla_core::node::{Node, NodeManager};
use bitwuzla_sat::{SatResult, SatSolver, Terminator};

use crate::aig::AigCnf;
use crate::bv::AigBitblaster;

/// Bit-blasting BV solver over an incremental SAT backend.
pub struct BitblastSolver {
    bb: AigBitblaster,
    cnf: AigCnf,
    sat: Box<dyn SatSolver>,
    asserted: FxHashSet<Node>,
    /// Assertion nodes attached via assumption literals (core tracking).
    tracked: Vec<(Node, i32)>,
    /// Assumption literals of the most recent check.
    assumption_lits: FxHashMap<Node, i32>,
    track_cores: bool,
}

impl BitblastSolver {
    /// Create a solver over the given SAT backend.
    pub fn new(sat: Box<dyn SatSolver>, track_cores: bool) -> Self {
        Self {
            bb: AigBitblaster::new(),
            cnf: AigCnf::new(),
            sat,
            asserted: FxHashSet::default(),
            tracked: Vec::new(),
            assumption_lits: FxHashMap::default(),
            track_cores,
        }
    }

    /// Access the bit-blaster (for model reconstruction).
    pub fn bitblaster(&self) -> &AigBitblaster {
        &self.bb
    }

    /// Number of asserted formulas.
    pub fn num_assertions(&self) -> usize {
        self.asserted.len()
    }

    /// Lower and assert a Boolean formula.
    pub fn assert_formula(&mut self, nm: &NodeManager, node: Node) {
        if !self.asserted.insert(node) {
            return;
        }
        let root = self.bb.bit(nm, node);
        if self.track_cores {
            let lit = self.cnf.assumption_lit(&self.bb.aig, self.sat.as_mut(), root);
            self.tracked.push((node, lit));
        } else {
            self.cnf.assert_root(&self.bb.aig, self.sat.as_mut(), root);
        }
    }

    /// Drop assertions not in `keep`, rebuilding the SAT state. Called
    /// after `pop`; the AIG and its encodings are kept, only the clause
    /// database is rebuilt.
    pub fn retain_assertions(&mut self, nm: &NodeManager, keep: &[Node]) {
        let keep_set: FxHashSet<Node> = keep.iter().copied().collect();
        if self
            .asserted
            .iter()
            .all(|a| keep_set.contains(a))
        {
            return;
        }
        self.sat = self.sat_factory();
        self.cnf = AigCnf::new();
        self.asserted.clear();
        self.tracked.clear();
        self.assumption_lits.clear();
        for &a in keep {
            self.assert_formula(nm, a);
        }
    }

    fn sat_factory(&self) -> Box<dyn SatSolver> {
        // The rebuilt backend matches the original's capabilities.
        if self.sat.supports_incremental() {
            Box::new(bitwuzla_sat::Cdcl::new())
        } else {
            Box::new(bitwuzla_sat::Oneshot::new())
        }
    }

    /// Check satisfiability under the given Boolean assumptions.
    pub fn check(&mut self, nm: &NodeManager, assumptions: &[Node]) -> SatResult {
        self.assumption_lits.clear();
        for (_, lit) in &self.tracked {
            self.sat.assume(*lit);
        }
        for &a in assumptions {
            let root = self.bb.bit(nm, a);
            let lit = self.cnf.assumption_lit(&self.bb.aig, self.sat.as_mut(), root);
            self.assumption_lits.insert(a, lit);
            self.sat.assume(lit);
        }
        self.sat.solve()
    }

    /// After an unsatisfiable check with core tracking: the asserted
    /// formulas participating in the conflict.
    pub fn failed_assertions(&self) -> Vec<Node> {
        self.tracked
            .iter()
            .filter(|(_, lit)| self.sat.failed(*lit))
            .map(|&(node, _)| node)
            .collect()
    }

    /// After an unsatisfiable check: the failed assumptions among those
    /// passed to [`check`].
    ///
    /// [`check`]: BitblastSolver::check
    pub fn failed_assumptions(&self) -> Vec<Node> {
        self.assumption_lits
            .iter()
            .filter(|(_, &lit)| self.sat.failed(lit))
            .map(|(&node, _)| node)
            .collect()
    }

    /// The model value of a Boolean node, if it was encoded.
    pub fn value_bool(&self, node: Node) -> Option<bool> {
        let r = self.bb.cached_bit(node)?;
        Some(self.cnf.value(self.sat.as_ref(), r) == 1)
    }

    /// The model value of a bit-vector node, if it was encoded.
    /// Don't-care bits are zero.
    pub fn value_bv(&self, node: Node) -> Option<BvValue> {
        let bits = self.bb.cached_bits(node)?;
        let mut v = BvValue::zero(bits.len() as u64);
        let w = bits.len() as u64;
        for (i, &r) in bits.iter().enumerate() {
            if self.cnf.value(self.sat.as_ref(), r) == 1 {
                let bit = BvValue::one(w).shl(&BvValue::from_u64(w, w - 1 - i as u64));
                v = v.or(&bit);
            }
        }
        Some(v)
    }

    /// Install the termination callback on the backend.
    pub fn set_terminate(&mut self, cb: Option<Terminator>) {
        self.sat.set_terminate(cb);
    }

    /// Backend capability check.
    pub fn supports_incremental(&self) -> bool {
        self.sat.supports_incremental()
    }
}
