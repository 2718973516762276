//! Propagation-based local search over concrete bit-vector assignments.
//!
//! The solver keeps a concrete value for every input, repeatedly selects a
//! falsified assertion, walks down to an input along a selected path and
//! moves that input to an inverse value (a value making the parent take
//! its target value given the siblings) or a random consistent value.
//! Budgets on the number of moves bound the search; exhaustion yields
//! `Unknown`.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use rustc_hash::FxHashMap;
use tracing::trace;

use bitwuzla_bv::BvValue;
use bitwuzla_core::eval::eval_node;
use bitwuzla_core::node::{utils, Kind, Node, NodeManager, Value as NodeValue};
use bitwuzla_core::option::{Options, PropPathSelection};
use bitwuzla_sat::SatResult;

/// Search statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropStats {
    /// Number of downward propagation steps.
    pub num_props: u64,
    /// Number of input moves.
    pub num_updates: u64,
    /// Number of full evaluation rounds.
    pub num_iterations: u64,
}

/// The local-search engine.
pub struct PropSolver {
    assignment: FxHashMap<Node, NodeValue>,
    rng: SmallRng,
    stats: PropStats,
}

impl PropSolver {
    /// Create a solver seeded from the session seed.
    pub fn new(seed: u64) -> Self {
        Self {
            assignment: FxHashMap::default(),
            rng: SmallRng::seed_from_u64(seed),
            stats: PropStats::default(),
        }
    }

    /// Search statistics.
    pub fn stats(&self) -> PropStats {
        self.stats
    }

    /// The current value of an input, if assigned.
    pub fn value(&self, node: Node) -> Option<&NodeValue> {
        self.assignment.get(&node)
    }

    /// Run the search on the given Boolean roots. `extra_budget` callers
    /// (preprop) may pass explicit move budgets overriding the options'
    /// zero meaning unlimited.
    pub fn solve(
        &mut self,
        nm: &NodeManager,
        roots: &[Node],
        options: &Options,
        budget_override: Option<u64>,
        terminator: &mut dyn FnMut() -> bool,
    ) -> SatResult {
        let nprops_budget = budget_override.unwrap_or(options.prop_nprops);
        let nupdates_budget = options.prop_nupdates;
        // Budgets bound a single search, not the solver lifetime.
        let props_base = self.stats.num_props;
        let updates_base = self.stats.num_updates;
        // Inputs are the free constants below the roots.
        let inputs = utils::collect_consts(nm, roots);
        for &c in &inputs {
            let sort = nm.sort(c);
            self.assignment.entry(c).or_insert_with(|| {
                if nm.sorts.is_bool(sort) {
                    NodeValue::Bool(false)
                } else {
                    NodeValue::Bv(BvValue::zero(nm.sorts.bv_size(sort)))
                }
            });
        }
        loop {
            if terminator() {
                return SatResult::Unknown;
            }
            self.stats.num_iterations += 1;
            let values = self.evaluate(nm, roots);
            let falsified: Vec<Node> = roots
                .iter()
                .copied()
                .filter(|r| values[r] != NodeValue::Bool(true))
                .collect();
            if falsified.is_empty() {
                return SatResult::Sat;
            }
            let root = falsified[self.rng.gen_range(0..falsified.len())];
            if !self.propagate(nm, root, options, &values) {
                return SatResult::Unknown;
            }
            if nprops_budget > 0 && self.stats.num_props - props_base >= nprops_budget {
                trace!("propagation budget exhausted");
                return SatResult::Unknown;
            }
            if nupdates_budget > 0 && self.stats.num_updates - updates_base >= nupdates_budget {
                trace!("update budget exhausted");
                return SatResult::Unknown;
            }
        }
    }

    /// Evaluate all roots bottom-up under the current assignment.
    fn evaluate(&self, nm: &NodeManager, roots: &[Node]) -> FxHashMap<Node, NodeValue> {
        let mut values: FxHashMap<Node, NodeValue> = FxHashMap::default();
        for node in utils::post_order(nm, roots) {
            let value = if let Some(v) = nm.value(node) {
                v.clone()
            } else if let Some(v) = self.assignment.get(&node) {
                v.clone()
            } else {
                let children: Vec<&NodeValue> =
                    nm.children(node).iter().map(|c| &values[c]).collect();
                eval_node(nm.kind(node), &children, nm.indices(node))
                    .expect("local search restricted to evaluable kinds")
            };
            values.insert(node, value);
        }
        values
    }

    /// Walk from a falsified root down to an input and move it. Returns
    /// false if no move is possible.
    fn propagate(
        &mut self,
        nm: &NodeManager,
        root: Node,
        options: &Options,
        values: &FxHashMap<Node, NodeValue>,
    ) -> bool {
        let mut cur = root;
        let mut target = NodeValue::Bool(true);
        while !nm.is_const(cur) {
            self.stats.num_props += 1;
            let candidates: Vec<usize> = (0..nm.num_children(cur))
                .filter(|&i| !nm.is_value(nm.child(cur, i)))
                .collect();
            if candidates.is_empty() {
                return false;
            }
            let pick_random_input =
                self.coin(options.prop_prob_pick_random_input);
            let idx = if pick_random_input {
                candidates[self.rng.gen_range(0..candidates.len())]
            } else {
                match options.prop_path_sel {
                    PropPathSelection::Random => {
                        candidates[self.rng.gen_range(0..candidates.len())]
                    }
                    PropPathSelection::Essential => {
                        // A child is essential when an inverse value for it
                        // exists; fall back to a random candidate.
                        let essential: Vec<usize> = candidates
                            .iter()
                            .copied()
                            .filter(|&i| {
                                self.inverse_value(nm, cur, i, &target, values, options)
                                    .is_some()
                            })
                            .collect();
                        if essential.is_empty() {
                            candidates[self.rng.gen_range(0..candidates.len())]
                        } else {
                            essential[self.rng.gen_range(0..essential.len())]
                        }
                    }
                }
            };
            let child = nm.child(cur, idx);
            let use_inverse = self.coin(options.prop_prob_pick_inv_value);
            let next_target = if use_inverse {
                self.inverse_value(nm, cur, idx, &target, values, options)
            } else {
                None
            };
            target = match next_target {
                Some(v) => v,
                None => self.consistent_value(nm, child),
            };
            cur = child;
        }
        self.assignment.insert(cur, target);
        self.stats.num_updates += 1;
        true
    }

    /// A biased coin with probability given in per mille.
    fn coin(&mut self, per_mille: u64) -> bool {
        self.rng.gen_range(0..1000u64) < per_mille
    }

    fn random_bv(&mut self, width: u64) -> BvValue {
        let mut bytes = vec![0u8; width.div_ceil(8) as usize];
        self.rng.fill_bytes(&mut bytes);
        BvValue::from_le_bytes(width, &bytes)
    }

    /// A uniform value in the inclusive unsigned range `[lo, hi]`.
    fn random_bv_range(&mut self, lo: &BvValue, hi: &BvValue) -> BvValue {
        let w = lo.width();
        if lo.is_zero() && hi.is_ones() {
            return self.random_bv(w);
        }
        let span = hi.sub(lo).inc();
        let r = self.random_bv(w);
        lo.add(&r.urem(&span))
    }

    /// A random value of the child's sort.
    fn consistent_value(&mut self, nm: &NodeManager, child: Node) -> NodeValue {
        let sort = nm.sort(child);
        if nm.sorts.is_bool(sort) {
            NodeValue::Bool(self.rng.gen())
        } else {
            NodeValue::Bv(self.random_bv(nm.sorts.bv_size(sort)))
        }
    }

    /// A value for child `idx` that makes `node` evaluate to `target`,
    /// given the current values of the siblings. `None` when no such value
    /// exists or the kind has no inverse computation.
    fn inverse_value(
        &mut self,
        nm: &NodeManager,
        node: Node,
        idx: usize,
        target: &NodeValue,
        values: &FxHashMap<Node, NodeValue>,
        options: &Options,
    ) -> Option<NodeValue> {
        use Kind::*;
        let kind = nm.kind(node);
        let child = nm.child(node, idx);
        let child_val = |i: usize| &values[&nm.child(node, i)];
        match kind {
            Not => match target {
                NodeValue::Bool(b) => Some(NodeValue::Bool(!b)),
                _ => None,
            },
            And | Or => {
                let NodeValue::Bool(t) = target else { return None };
                let neutral = kind == And;
                if *t == neutral {
                    // Every child must take the neutral-breaking value.
                    Some(NodeValue::Bool(neutral))
                } else {
                    // One falsifying (resp. satisfying) child suffices;
                    // only useful if the siblings do not already decide.
                    let others_decide = (0..nm.num_children(node))
                        .filter(|&i| i != idx)
                        .any(|i| matches!(child_val(i), NodeValue::Bool(b) if *b != neutral));
                    if others_decide {
                        None
                    } else {
                        Some(NodeValue::Bool(!neutral))
                    }
                }
            }
            Xor => {
                let NodeValue::Bool(t) = target else { return None };
                let others = (0..nm.num_children(node))
                    .filter(|&i| i != idx)
                    .filter(|&i| matches!(child_val(i), NodeValue::Bool(true)))
                    .count();
                Some(NodeValue::Bool(*t != (others % 2 == 1)))
            }
            Implies => {
                let NodeValue::Bool(t) = target else { return None };
                if *t {
                    if idx == 0 {
                        Some(NodeValue::Bool(false))
                    } else {
                        Some(NodeValue::Bool(true))
                    }
                } else if idx == 0 {
                    match child_val(1) {
                        NodeValue::Bool(false) => Some(NodeValue::Bool(true)),
                        _ => None,
                    }
                } else {
                    match child_val(0) {
                        NodeValue::Bool(true) => Some(NodeValue::Bool(false)),
                        _ => None,
                    }
                }
            }
            Equal => {
                let NodeValue::Bool(t) = target else { return None };
                let other = child_val(1 - idx).clone();
                if *t {
                    Some(other)
                } else {
                    // Any different value; for bit-vectors flip one bit.
                    match other {
                        NodeValue::Bool(b) => Some(NodeValue::Bool(!b)),
                        NodeValue::Bv(v) => {
                            let w = v.width();
                            let flip = BvValue::one(w)
                                .shl(&BvValue::from_u64(w, self.rng.gen_range(0..w)));
                            Some(NodeValue::Bv(v.xor(&flip)))
                        }
                        _ => None,
                    }
                }
            }
            Ite => {
                if idx == 0 {
                    // Select the branch currently matching the target.
                    let then_matches = child_val(1) == target;
                    let else_matches = child_val(2) == target;
                    match (then_matches, else_matches) {
                        (true, _) => Some(NodeValue::Bool(true)),
                        (_, true) => Some(NodeValue::Bool(false)),
                        _ => None,
                    }
                } else {
                    // Descending into a branch only helps if it is taken.
                    let cond = matches!(child_val(0), NodeValue::Bool(true));
                    let taken = if cond { 1 } else { 2 };
                    if idx == taken {
                        Some(target.clone())
                    } else {
                        None
                    }
                }
            }
            BvNot => self.bv_target(target).map(|t| NodeValue::Bv(t.bvnot())),
            BvNeg => self.bv_target(target).map(|t| NodeValue::Bv(t.neg())),
            BvInc => self.bv_target(target).map(|t| NodeValue::Bv(t.dec())),
            BvDec => self.bv_target(target).map(|t| NodeValue::Bv(t.inc())),
            BvAdd => {
                let t = self.bv_target(target)?;
                let mut rest = BvValue::zero(t.width());
                for i in 0..nm.num_children(node) {
                    if i != idx {
                        let NodeValue::Bv(v) = child_val(i) else { return None };
                        rest = rest.add(v);
                    }
                }
                Some(NodeValue::Bv(t.sub(&rest)))
            }
            BvSub => {
                let t = self.bv_target(target)?;
                let NodeValue::Bv(other) = child_val(1 - idx) else { return None };
                if idx == 0 {
                    Some(NodeValue::Bv(t.add(other)))
                } else {
                    Some(NodeValue::Bv(other.sub(&t)))
                }
            }
            BvMul => {
                let t = self.bv_target(target)?;
                let mut s = BvValue::one(t.width());
                for i in 0..nm.num_children(node) {
                    if i != idx {
                        let NodeValue::Bv(v) = child_val(i) else { return None };
                        s = s.mul(v);
                    }
                }
                if s.is_zero() {
                    return None;
                }
                if s.lsb() {
                    Some(NodeValue::Bv(t.mul(&mod_inverse(&s))))
                } else {
                    None
                }
            }
            BvXor => {
                let t = self.bv_target(target)?;
                let mut s = BvValue::zero(t.width());
                for i in 0..nm.num_children(node) {
                    if i != idx {
                        let NodeValue::Bv(v) = child_val(i) else { return None };
                        s = s.xor(v);
                    }
                }
                Some(NodeValue::Bv(t.xor(&s)))
            }
            BvAnd => {
                let t = self.bv_target(target)?;
                let mut s = BvValue::ones(t.width());
                for i in 0..nm.num_children(node) {
                    if i != idx {
                        let NodeValue::Bv(v) = child_val(i) else { return None };
                        s = s.and(v);
                    }
                }
                // x & s = t solvable iff t is contained in s.
                if !t.and(&s).comp(&t).is_true() {
                    return None;
                }
                // With constant-bits propagation the bits masked off by the
                // siblings stay free and are sampled randomly.
                if options.prop_const_bits {
                    let free = self.random_bv(t.width()).and(&s.bvnot());
                    Some(NodeValue::Bv(t.or(&free)))
                } else {
                    Some(NodeValue::Bv(t))
                }
            }
            BvOr => {
                let t = self.bv_target(target)?;
                let mut s = BvValue::zero(t.width());
                for i in 0..nm.num_children(node) {
                    if i != idx {
                        let NodeValue::Bv(v) = child_val(i) else { return None };
                        s = s.or(v);
                    }
                }
                // x | s = t solvable iff s is contained in t.
                if !s.and(&t).comp(&s).is_true() {
                    return None;
                }
                if options.prop_const_bits {
                    let free = self.random_bv(t.width()).and(&t).and(&s);
                    Some(NodeValue::Bv(t.and(&s.bvnot()).or(&free)))
                } else {
                    Some(NodeValue::Bv(t.and(&s.bvnot())))
                }
            }
            BvConcat => {
                let t = self.bv_target(target)?;
                // Slice the target at the chosen child's position.
                let mut hi = t.width();
                for i in 0..nm.num_children(node) {
                    let w = nm.bv_width(nm.child(node, i));
                    let lo = hi - w;
                    if i == idx {
                        return Some(NodeValue::Bv(t.extract(hi - 1, lo)));
                    }
                    hi = lo;
                }
                None
            }
            BvExtract => {
                let t = self.bv_target(target)?;
                let NodeValue::Bv(cur) = child_val(0) else { return None };
                let (hi, lo) = (nm.indices(node)[0], nm.indices(node)[1]);
                // Keep the bits outside the extracted range.
                let w = cur.width();
                let mut result = cur.clone();
                let cleared = {
                    let range_mask = BvValue::ones(hi - lo + 1)
                        .zero_extend(w - (hi - lo + 1))
                        .shl(&BvValue::from_u64(w, lo));
                    result.and(&range_mask.bvnot())
                };
                result = cleared.or(
                    &t.zero_extend(w - t.width()).shl(&BvValue::from_u64(w, lo)),
                );
                Some(NodeValue::Bv(result))
            }
            BvShl | BvShr => {
                let t = self.bv_target(target)?;
                if idx != 0 {
                    return None;
                }
                let NodeValue::Bv(s) = child_val(1) else { return None };
                let w = t.width();
                if s.to_u64().map_or(true, |n| n >= w) {
                    return t.is_zero().then(|| NodeValue::Bv(self.random_bv(w)));
                }
                if nm.kind(node) == BvShl {
                    // x << s = t requires the low s bits of t to be zero.
                    let back = t.shr(s);
                    if back.shl(s).comp(&t).is_true() {
                        Some(NodeValue::Bv(back))
                    } else {
                        None
                    }
                } else {
                    let back = t.shl(s);
                    if back.shr(s).comp(&t).is_true() {
                        Some(NodeValue::Bv(back))
                    } else {
                        None
                    }
                }
            }
            BvUlt | BvUle | BvSlt | BvSle => {
                if !options.prop_ineq_bounds {
                    return None;
                }
                self.inverse_cmp(nm, node, idx, target, values, options)
            }
            BvZeroExtend => {
                let t = self.bv_target(target)?;
                let n = nm.indices(node)[0];
                let w = t.width() - n;
                if n == 0 || t.extract(t.width() - 1, w).is_zero() {
                    Some(NodeValue::Bv(t.extract(w - 1, 0)))
                } else {
                    None
                }
            }
            BvSignExtend => {
                if !options.prop_sext {
                    return None;
                }
                let t = self.bv_target(target)?;
                let n = nm.indices(node)[0];
                let w = t.width() - n;
                let low = t.extract(w - 1, 0);
                if low.sign_extend(n).comp(&t).is_true() {
                    Some(NodeValue::Bv(low))
                } else {
                    None
                }
            }
            BvRedand => {
                let NodeValue::Bv(t) = target else { return None };
                let w = nm.bv_width(child);
                if t.is_one() {
                    Some(NodeValue::Bv(BvValue::ones(w)))
                } else {
                    let mut v = self.random_bv(w);
                    if v.is_ones() {
                        v = v.dec();
                    }
                    Some(NodeValue::Bv(v))
                }
            }
            BvRedor => {
                let NodeValue::Bv(t) = target else { return None };
                let w = nm.bv_width(child);
                if t.is_one() {
                    let mut v = self.random_bv(w);
                    if v.is_zero() {
                        v = v.inc();
                    }
                    Some(NodeValue::Bv(v))
                } else {
                    Some(NodeValue::Bv(BvValue::zero(w)))
                }
            }
            _ => None,
        }
    }

    fn inverse_cmp(
        &mut self,
        nm: &NodeManager,
        node: Node,
        idx: usize,
        target: &NodeValue,
        values: &FxHashMap<Node, NodeValue>,
        options: &Options,
    ) -> Option<NodeValue> {
        let NodeValue::Bool(t) = target else { return None };
        let NodeValue::Bv(other) = &values[&nm.child(node, 1 - idx)] else {
            return None;
        };
        let w = other.width();
        let kind = nm.kind(node);
        let signed = matches!(kind, Kind::BvSlt | Kind::BvSle);
        let strict = matches!(kind, Kind::BvUlt | Kind::BvSlt);
        let (min, max) = if signed {
            (BvValue::min_signed(w), BvValue::max_signed(w))
        } else {
            (BvValue::zero(w), BvValue::ones(w))
        };
        // Work out the unsigned sampling range; signed ranges are biased
        // through the offset trick.
        let bias = |v: &BvValue| {
            if signed {
                v.sub(&BvValue::min_signed(w))
            } else {
                v.clone()
            }
        };
        let unbias = |v: &BvValue| {
            if signed {
                v.add(&BvValue::min_signed(w))
            } else {
                v.clone()
            }
        };
        let ob = bias(other);
        // lhs-position: x (cmp) other; rhs-position: other (cmp) x.
        let lhs = idx == 0;
        let (lo, hi) = match (lhs, *t, strict) {
            (true, true, true) => {
                if ob.is_zero() {
                    return None;
                }
                (bias(&min), ob.dec())
            }
            (true, true, false) => (bias(&min), ob.clone()),
            (true, false, true) => (ob.clone(), bias(&max)),
            (true, false, false) => {
                if ob.is_ones() {
                    return None;
                }
                (ob.inc(), bias(&max))
            }
            (false, true, true) => {
                if ob == bias(&max) {
                    return None;
                }
                (ob.inc(), bias(&max))
            }
            (false, true, false) => (ob.clone(), bias(&max)),
            (false, false, true) => (bias(&min), ob.clone()),
            (false, false, false) => {
                if ob.is_zero() {
                    return None;
                }
                (bias(&min), ob.dec())
            }
        };
        if lo.ugt(&hi) {
            return None;
        }
        // For concatenations and sign extensions a boundary value keeps
        // the high part stable, which makes the move more likely to stick.
        let child = nm.child(node, idx);
        let sample = if options.prop_opt_lt_concat_sext
            && matches!(nm.kind(child), Kind::BvConcat | Kind::BvSignExtend)
        {
            if lhs == *t {
                hi.clone()
            } else {
                lo.clone()
            }
        } else {
            self.random_bv_range(&lo, &hi)
        };
        Some(NodeValue::Bv(unbias(&sample)))
    }

    fn bv_target(&self, target: &NodeValue) -> Option<BvValue> {
        match target {
            NodeValue::Bv(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Multiplicative inverse of an odd value modulo `2^width` by Hensel
/// lifting.
fn mod_inverse(s: &BvValue) -> BvValue {
    debug_assert!(s.lsb());
    let w = s.width();
    let two = BvValue::from_u64(w, 2);
    let mut x = BvValue::one(w);
    let mut bits = 1;
    while bits < w {
        // x' = x * (2 - s * x); doubles the number of correct bits.
        let sx = s.mul(&x);
        x = x.mul(&two.sub(&sx));
        bits *= 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitwuzla_core::option::Options;

    fn never() -> impl FnMut() -> bool {
        || false
    }

    fn solve(nm: &mut NodeManager, roots: &[Node]) -> SatResult {
        let mut solver = PropSolver::new(42);
        let options = Options::default();
        solver.solve(nm, roots, &options, Some(200_000), &mut never())
    }

    #[test]
    fn test_mod_inverse() {
        for v in [1u64, 3, 5, 7, 9, 251, 255] {
            let s = BvValue::from_u64(8, v);
            let inv = mod_inverse(&s);
            assert!(s.mul(&inv).is_one(), "inverse of {v}");
        }
    }

    #[test]
    fn test_simple_equality() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        let c = nm.mk_bv_value(BvValue::from_u64(8, 42));
        let eq = nm.mk_eq(x, c);
        let mut solver = PropSolver::new(7);
        let options = Options::default();
        let res = solver.solve(&nm, &[eq], &options, Some(100_000), &mut never());
        assert_eq!(res, SatResult::Sat);
        assert_eq!(
            solver.value(x),
            Some(&NodeValue::Bv(BvValue::from_u64(8, 42)))
        );
    }

    #[test]
    fn test_addition_goal() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        let y = nm.mk_const(bv8, Some("y"));
        let sum = nm.mk_node(Kind::BvAdd, &[x, y], &[]);
        let c = nm.mk_bv_value(BvValue::from_u64(8, 100));
        let eq = nm.mk_eq(sum, c);
        let hundred = nm.mk_bv_value(BvValue::from_u64(8, 10));
        let xgt = nm.mk_node(Kind::BvUlt, &[hundred, x], &[]);
        assert_eq!(solve(&mut nm, &[eq, xgt]), SatResult::Sat);
    }

    #[test]
    fn test_multiplication_inverse() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        let three = nm.mk_bv_value(BvValue::from_u64(8, 3));
        let prod = nm.mk_node(Kind::BvMul, &[x, three], &[]);
        let c = nm.mk_bv_value(BvValue::from_u64(8, 99));
        let eq = nm.mk_eq(prod, c);
        assert_eq!(solve(&mut nm, &[eq]), SatResult::Sat);
    }

    #[test]
    fn test_budget_exhaustion_returns_unknown() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        // x + x = 3 is unsatisfiable at width 8 (even sum, odd target).
        let sum = nm.mk_node(Kind::BvAdd, &[x, x], &[]);
        let three = nm.mk_bv_value(BvValue::from_u64(8, 3));
        let eq = nm.mk_eq(sum, three);
        let mut solver = PropSolver::new(3);
        let options = Options::default();
        let res = solver.solve(&nm, &[eq], &options, Some(5_000), &mut never());
        assert_eq!(res, SatResult::Unknown);
    }

    #[test]
    fn test_terminator_stops_search() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        let sum = nm.mk_node(Kind::BvAdd, &[x, x], &[]);
        let three = nm.mk_bv_value(BvValue::from_u64(8, 3));
        let eq = nm.mk_eq(sum, three);
        let mut solver = PropSolver::new(3);
        let options = Options::default();
        let mut fired = false;
        let res = solver.solve(&nm, &[eq], &options, None, &mut || {
            let stop = fired;
            fired = true;
            stop
        });
        assert_eq!(res, SatResult::Unknown);
    }
}
