//! And-Inverter Graph with structural hashing and CNF encoding.
//!
//! Nodes are binary AND gates; edges carry inversion bits. Constructors
//! apply two-level minimisation: neutral and absorbing elements,
//! idempotence, complement contradiction, and a resource-free subsumption
//! check over the fanin literals of AND children. CNF is produced by
//! Tseitin encoding with Plaisted-Greenbaum polarity splitting; SAT
//! variables are allocated lazily per AIG node.

use rustc_hash::{FxHashMap, FxHashSet};

use bitwuzla_sat::SatSolver;

/// A reference to an AIG node with an inversion bit, encoded as a non-zero
/// integer whose sign is the inversion. `1` is the constant true, `-1`
/// false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AigRef(i32);

impl AigRef {
    /// The constant true.
    pub const TRUE: AigRef = AigRef(1);
    /// The constant false.
    pub const FALSE: AigRef = AigRef(-1);

    /// The negated reference.
    pub fn not(self) -> AigRef {
        AigRef(-self.0)
    }

    /// True iff this is the constant true.
    pub fn is_true(self) -> bool {
        self.0 == 1
    }

    /// True iff this is the constant false.
    pub fn is_false(self) -> bool {
        self.0 == -1
    }

    /// True iff this is either constant.
    pub fn is_const(self) -> bool {
        self.0.abs() == 1
    }

    /// The underlying node index.
    fn index(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// True iff the edge is inverted.
    fn inverted(self) -> bool {
        self.0 < 0
    }
}

enum AigNode {
    /// Reserved slot for the constant.
    Const,
    Input,
    And(AigRef, AigRef),
}

/// The AIG node store.
pub struct AigManager {
    nodes: Vec<AigNode>,
    table: FxHashMap<(AigRef, AigRef), AigRef>,
    num_ands: u64,
    num_inputs: u64,
}

impl Default for AigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AigManager {
    /// Create a manager holding only the constants.
    pub fn new() -> Self {
        Self {
            nodes: vec![AigNode::Const],
            table: FxHashMap::default(),
            num_ands: 0,
            num_inputs: 0,
        }
    }

    /// Number of AND gates.
    pub fn num_ands(&self) -> u64 {
        self.num_ands
    }

    /// Number of inputs.
    pub fn num_inputs(&self) -> u64 {
        self.num_inputs
    }

    /// A fresh boolean input.
    pub fn mk_input(&mut self) -> AigRef {
        let idx = self.nodes.len() as i32;
        self.nodes.push(AigNode::Input);
        self.num_inputs += 1;
        AigRef(idx + 1)
    }

    /// `a AND b` with two-level minimisation and structural hashing.
    pub fn mk_and(&mut self, a: AigRef, b: AigRef) -> AigRef {
        // Level-one rules.
        if a.is_false() || b.is_false() || a == b.not() {
            return AigRef::FALSE;
        }
        if a.is_true() {
            return b;
        }
        if b.is_true() || a == b {
            return a;
        }
        // Level-two rules over AND fanins: contradiction and subsumption.
        if let Some(r) = self.try_two_level(a, b) {
            return r;
        }
        if let Some(r) = self.try_two_level(b, a) {
            return r;
        }
        let key = if a.0 <= b.0 { (a, b) } else { (b, a) };
        if let Some(&r) = self.table.get(&key) {
            return r;
        }
        let idx = self.nodes.len() as i32;
        self.nodes.push(AigNode::And(key.0, key.1));
        self.num_ands += 1;
        let r = AigRef(idx + 1);
        self.table.insert(key, r);
        r
    }

    /// Rules looking one level into an AND operand `a`:
    /// contradiction `(x & y) & ~x -> false`, idempotence
    /// `(x & y) & x -> x & y`, and subsumption on the inverted operand
    /// `~(x & y) & x` staying as is (no simplification), `~(x & y) & ~x ->
    /// ~x` requires the other fanin check.
    fn try_two_level(&self, a: AigRef, b: AigRef) -> Option<AigRef> {
        if let AigNode::And(x, y) = &self.nodes[(a.index() - 1) as usize] {
            let (x, y) = (*x, *y);
            if !a.inverted() {
                // (x & y) & b
                if b == x.not() || b == y.not() {
                    return Some(AigRef::FALSE);
                }
                if b == x || b == y {
                    return Some(a);
                }
            } else {
                // ~(x & y) & b subsumes to b when b contradicts a fanin.
                if b == x.not() || b == y.not() {
                    return Some(b);
                }
            }
        }
        None
    }

    /// `a OR b` through De Morgan.
    pub fn mk_or(&mut self, a: AigRef, b: AigRef) -> AigRef {
        self.mk_and(a.not(), b.not()).not()
    }

    /// `a XOR b`.
    pub fn mk_xor(&mut self, a: AigRef, b: AigRef) -> AigRef {
        let l = self.mk_and(a, b.not());
        let r = self.mk_and(a.not(), b);
        self.mk_or(l, r)
    }

    /// `a XNOR b` (equivalence).
    pub fn mk_iff(&mut self, a: AigRef, b: AigRef) -> AigRef {
        self.mk_xor(a, b).not()
    }

    /// `if c then t else e` as a multiplexer.
    pub fn mk_ite(&mut self, c: AigRef, t: AigRef, e: AigRef) -> AigRef {
        if t == e {
            return t;
        }
        let l = self.mk_and(c, t);
        let r = self.mk_and(c.not(), e);
        self.mk_or(l, r)
    }

    fn children(&self, r: AigRef) -> Option<(AigRef, AigRef)> {
        match &self.nodes[(r.index() - 1) as usize] {
            AigNode::And(a, b) => Some((*a, *b)),
            _ => None,
        }
    }
}

/// Tseitin CNF encoder with Plaisted-Greenbaum polarity splitting. SAT
/// variables are allocated lazily and cached by AIG node index.
pub struct AigCnf {
    vars: FxHashMap<u32, i32>,
    encoded_pos: FxHashSet<u32>,
    encoded_neg: FxHashSet<u32>,
    next_var: i32,
}

impl Default for AigCnf {
    fn default() -> Self {
        Self::new()
    }
}

impl AigCnf {
    /// Create an encoder with no allocated variables.
    pub fn new() -> Self {
        Self {
            vars: FxHashMap::default(),
            encoded_pos: FxHashSet::default(),
            encoded_neg: FxHashSet::default(),
            next_var: 0,
        }
    }

    /// The number of allocated SAT variables.
    pub fn num_vars(&self) -> i32 {
        self.next_var
    }

    /// The SAT literal of an AIG reference, allocating the variable on
    /// first use.
    pub fn lit(&mut self, r: AigRef) -> i32 {
        debug_assert!(!r.is_const());
        let var = match self.vars.get(&r.index()) {
            Some(&v) => v,
            None => {
                self.next_var += 1;
                self.vars.insert(r.index(), self.next_var);
                self.next_var
            }
        };
        if r.inverted() {
            -var
        } else {
            var
        }
    }

    /// The SAT value (+1/-1/0) of a reference under the backend's model.
    pub fn value(&self, sat: &dyn SatSolver, r: AigRef) -> i8 {
        if r.is_true() {
            return 1;
        }
        if r.is_false() {
            return -1;
        }
        match self.vars.get(&r.index()) {
            Some(&v) => {
                let val = sat.value(v);
                if r.inverted() {
                    -val
                } else {
                    val
                }
            }
            None => 0,
        }
    }

    /// Assert `r` as a unit clause, encoding its cone.
    pub fn assert_root(&mut self, mgr: &AigManager, sat: &mut dyn SatSolver, r: AigRef) {
        if r.is_true() {
            return;
        }
        if r.is_false() {
            // An unsatisfiable root: the empty clause.
            sat.add(0);
            return;
        }
        self.encode(mgr, sat, r);
        let lit = self.lit(r);
        sat.add(lit);
        sat.add(0);
    }

    /// Prepare `r` for use as an assumption, encoding its cone in both
    /// polarities, and return its literal.
    pub fn assumption_lit(
        &mut self,
        mgr: &AigManager,
        sat: &mut dyn SatSolver,
        r: AigRef,
    ) -> i32 {
        if r.is_const() {
            // Pin a fresh literal to the constant so callers can assume
            // and fail it uniformly.
            self.next_var += 1;
            let v = self.next_var;
            sat.add(if r.is_true() { v } else { -v });
            sat.add(0);
            return v;
        }
        self.encode(mgr, sat, r);
        self.encode(mgr, sat, r.not());
        self.lit(r)
    }

    /// Plaisted-Greenbaum encoding of the cone of `r` in the polarity
    /// given by its inversion bit.
    fn encode(&mut self, mgr: &AigManager, sat: &mut dyn SatSolver, r: AigRef) {
        let mut stack = vec![r];
        while let Some(cur) = stack.pop() {
            if cur.is_const() {
                continue;
            }
            let idx = cur.index();
            let positive = !cur.inverted();
            let seen = if positive {
                !self.encoded_pos.insert(idx)
            } else {
                !self.encoded_neg.insert(idx)
            };
            if seen {
                continue;
            }
            let Some((a, b)) = mgr.children(AigRef(idx as i32)) else {
                continue;
            };
            let n = self.lit(AigRef(idx as i32));
            let la = self.lit_or_const(a);
            let lb = self.lit_or_const(b);
            if positive {
                // n -> a, n -> b
                if let Some(la) = la {
                    sat.add(-n);
                    sat.add(la);
                    sat.add(0);
                }
                if let Some(lb) = lb {
                    sat.add(-n);
                    sat.add(lb);
                    sat.add(0);
                }
                stack.push(a);
                stack.push(b);
            } else {
                // (a & b) -> n
                sat.add(n);
                if let Some(la) = la {
                    sat.add(-la);
                }
                if let Some(lb) = lb {
                    sat.add(-lb);
                }
                sat.add(0);
                stack.push(a.not());
                stack.push(b.not());
            }
        }
    }

    fn lit_or_const(&mut self, r: AigRef) -> Option<i32> {
        if r.is_const() {
            // Constants vanish from clauses: true children impose nothing
            // in positive polarity and drop from the negative clause.
            None
        } else {
            Some(self.lit(r))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitwuzla_sat::{Cdcl, SatResult};

    #[test]
    fn test_constant_rules() {
        let mut mgr = AigManager::new();
        let a = mgr.mk_input();
        assert_eq!(mgr.mk_and(a, AigRef::FALSE), AigRef::FALSE);
        assert_eq!(mgr.mk_and(AigRef::TRUE, a), a);
        assert_eq!(mgr.mk_and(a, a), a);
        assert_eq!(mgr.mk_and(a, a.not()), AigRef::FALSE);
    }

    #[test]
    fn test_structural_hashing() {
        let mut mgr = AigManager::new();
        let a = mgr.mk_input();
        let b = mgr.mk_input();
        let x = mgr.mk_and(a, b);
        let y = mgr.mk_and(b, a);
        assert_eq!(x, y);
        assert_eq!(mgr.num_ands(), 1);
    }

    #[test]
    fn test_two_level_rules() {
        let mut mgr = AigManager::new();
        let a = mgr.mk_input();
        let b = mgr.mk_input();
        let ab = mgr.mk_and(a, b);
        // (a & b) & ~a -> false
        assert_eq!(mgr.mk_and(ab, a.not()), AigRef::FALSE);
        // (a & b) & a -> (a & b)
        assert_eq!(mgr.mk_and(ab, a), ab);
        // ~(a & b) & ~a -> ~a
        assert_eq!(mgr.mk_and(ab.not(), a.not()), a.not());
    }

    #[test]
    fn test_xor_ite() {
        let mut mgr = AigManager::new();
        let a = mgr.mk_input();
        assert_eq!(mgr.mk_xor(a, a), AigRef::FALSE);
        assert_eq!(mgr.mk_xor(a, AigRef::FALSE), a);
        let b = mgr.mk_input();
        assert_eq!(mgr.mk_ite(AigRef::TRUE, a, b), a);
        assert_eq!(mgr.mk_ite(a, b, b), b);
    }

    #[test]
    fn test_cnf_sat_roundtrip() {
        let mut mgr = AigManager::new();
        let a = mgr.mk_input();
        let b = mgr.mk_input();
        let conj = mgr.mk_and(a, b.not());
        let mut sat = Cdcl::new();
        let mut cnf = AigCnf::new();
        cnf.assert_root(&mgr, &mut sat, conj);
        assert_eq!(sat.solve(), SatResult::Sat);
        assert_eq!(cnf.value(&sat, a), 1);
        assert_eq!(cnf.value(&sat, b), -1);
    }

    #[test]
    fn test_cnf_unsat() {
        let mut mgr = AigManager::new();
        let a = mgr.mk_input();
        let b = mgr.mk_input();
        let x = mgr.mk_and(a, b);
        let y = mgr.mk_and(a, b.not());
        let both = mgr.mk_and(x, y);
        let mut sat = Cdcl::new();
        let mut cnf = AigCnf::new();
        cnf.assert_root(&mgr, &mut sat, both);
        assert_eq!(sat.solve(), SatResult::Unsat);
    }

    #[test]
    fn test_assumption_lit() {
        let mut mgr = AigManager::new();
        let a = mgr.mk_input();
        let b = mgr.mk_input();
        let conj = mgr.mk_and(a, b);
        let mut sat = Cdcl::new();
        let mut cnf = AigCnf::new();
        let lit = cnf.assumption_lit(&mgr, &mut sat, conj);
        sat.assume(lit);
        assert_eq!(sat.solve(), SatResult::Sat);
        assert_eq!(cnf.value(&sat, a), 1);
        // Assuming the negation forces one input false.
        sat.assume(-lit);
        assert_eq!(sat.solve(), SatResult::Sat);
        assert!(cnf.value(&sat, a) == -1 || cnf.value(&sat, b) == -1);
    }
}
