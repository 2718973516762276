//! Floating-point solver: eager word-blasting into bit-vector terms.
//!
//! Registered terms are rewritten into the bit-vector theory at
//! registration: packed IEEE encodings for FP-sorted terms, 3-bit codes
//! for rounding modes, comparison and classification circuits for the FP
//! predicates, and full unpack-compute-round circuits (see [`blast`]) for
//! the rounding arithmetic. Once everything is lowered there is nothing
//! left for a theory check to do; the solver's consistency follows from
//! the soundness of the bit-vector layer.

mod blast;

use rustc_hash::FxHashMap;

use bitwuzla_bv::BvValue;
use bitwuzla_fp::{FpFormat, RoundingMode};
use bitwuzla_core::node::{Kind, Node, NodeManager};

/// Width of the rounding-mode code.
const RM_BITS: u64 = 3;

/// The floating-point theory solver.
#[derive(Default)]
pub struct FpSolver {
    /// Term to word-blasted encoding. FP-sorted terms map to bit-vector
    /// terms of their packed width, rounding modes to 3-bit codes, other
    /// sorts to rebuilt terms of the same sort.
    map: FxHashMap<Node, Node>,
    /// Range constraints and other side conditions produced by blasting.
    constraints: Vec<Node>,
}

impl FpSolver {
    /// Create an empty solver.
    pub fn new() -> Self {
        Self::default()
    }

    /// The encoding of a previously blasted term.
    pub fn encoding(&self, node: Node) -> Option<Node> {
        self.map.get(&node).copied()
    }

    /// Side constraints produced since the last drain; the engine asserts
    /// them alongside the blasted assertions.
    pub fn drain_constraints(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.constraints)
    }

    /// Word-blast a term, returning its floating-point-free image.
    pub fn word_blast(&mut self, nm: &mut NodeManager, node: Node) -> Node {
        if let Some(&r) = self.map.get(&node) {
            return r;
        }
        use Kind::*;
        let kind = nm.kind(node);
        let result = match kind {
            Value => match nm.value(node).cloned() {
                Some(bitwuzla_core::node::Value::Fp(fp)) => nm.mk_bv_value(fp.as_bv().clone()),
                Some(bitwuzla_core::node::Value::Rm(rm)) => {
                    nm.mk_bv_value(BvValue::from_u64(RM_BITS, rm_code(rm)))
                }
                _ => node,
            },
            Constant => {
                let sort = nm.sort(node);
                if nm.sorts.is_fp(sort) {
                    let (e, s) = nm.sorts.fp_sizes(sort);
                    self.fresh_bv(nm, node, e + s)
                } else if nm.sorts.is_rm(sort) {
                    let enc = self.fresh_bv(nm, node, RM_BITS);
                    // Exactly five rounding modes exist.
                    let five = nm.mk_bv_value(BvValue::from_u64(RM_BITS, 5));
                    let in_range = nm.mk_node(BvUlt, &[enc, five], &[]);
                    self.constraints.push(in_range);
                    enc
                } else {
                    node
                }
            }
            Variable | Exists | Forall | Lambda | Store | ConstArray => {
                // Left untouched: quantified structure is out of reach for
                // blasting and theory structure is handled by its solver.
                node
            }
            Select | Apply => {
                // Theory leaves stay as they are, but a floating-point
                // result still needs a bit-vector image for evaluation.
                let sort = nm.sort(node);
                if nm.sorts.is_fp(sort) {
                    let (e, s) = nm.sorts.fp_sizes(sort);
                    self.fresh_bv(nm, node, e + s)
                } else if nm.sorts.is_rm(sort) {
                    self.fresh_bv(nm, node, RM_BITS)
                } else {
                    node
                }
            }
            FpFp => {
                let (c0, c1, c2) = (nm.child(node, 0), nm.child(node, 1), nm.child(node, 2));
                let sign = self.word_blast(nm, c0);
                let exp = self.word_blast(nm, c1);
                let sig = self.word_blast(nm, c2);
                nm.mk_node(BvConcat, &[sign, exp, sig], &[])
            }
            FpToFpFromBv => {
                let c0 = nm.child(node, 0);
                self.word_blast(nm, c0)
            }
            FpAbs => {
                let c0 = nm.child(node, 0);
                let enc = self.word_blast(nm, c0);
                let w = nm.bv_width(enc);
                let rest = nm.mk_node(BvExtract, &[enc], &[w - 2, 0]);
                let zero = nm.mk_bv_value(BvValue::zero(1));
                nm.mk_node(BvConcat, &[zero, rest], &[])
            }
            FpNeg => {
                let c0 = nm.child(node, 0);
                let enc = self.word_blast(nm, c0);
                let w = nm.bv_width(enc);
                let sign = nm.mk_node(BvExtract, &[enc], &[w - 1, w - 1]);
                let flipped = nm.mk_node(BvNot, &[sign], &[]);
                let rest = nm.mk_node(BvExtract, &[enc], &[w - 2, 0]);
                nm.mk_node(BvConcat, &[flipped, rest], &[])
            }
            FpIsNan | FpIsInf | FpIsZero | FpIsNormal | FpIsSubnormal | FpIsNeg | FpIsPos => {
                let child = nm.child(node, 0);
                let fmt = nm.fp_format(child);
                let enc = self.word_blast(nm, child);
                match kind {
                    FpIsNan => self.is_nan(nm, enc, fmt),
                    FpIsInf => self.is_inf(nm, enc, fmt),
                    FpIsZero => self.is_zero(nm, enc, fmt),
                    FpIsSubnormal => self.is_subnormal(nm, enc, fmt),
                    FpIsNormal => self.is_normal(nm, enc, fmt),
                    FpIsNeg => {
                        let nan = self.is_nan(nm, enc, fmt);
                        let not_nan = nm.mk_not(nan);
                        let sign = self.sign_bit(nm, enc);
                        nm.mk_and(&[sign, not_nan])
                    }
                    _ => {
                        let nan = self.is_nan(nm, enc, fmt);
                        let not_nan = nm.mk_not(nan);
                        let sign = self.sign_bit(nm, enc);
                        let not_sign = nm.mk_not(sign);
                        nm.mk_and(&[not_sign, not_nan])
                    }
                }
            }
            FpEqual | FpLt | FpLeq | FpGt | FpGeq => {
                let lhs = nm.child(node, 0);
                let rhs = nm.child(node, 1);
                let fmt = nm.fp_format(lhs);
                let a = self.word_blast(nm, lhs);
                let b = self.word_blast(nm, rhs);
                match kind {
                    FpEqual => self.fp_eq(nm, a, b, fmt),
                    FpLt => self.fp_lt(nm, a, b, fmt),
                    FpGt => self.fp_lt(nm, b, a, fmt),
                    FpLeq => {
                        let lt = self.fp_lt(nm, a, b, fmt);
                        let eq = self.fp_eq(nm, a, b, fmt);
                        nm.mk_or(&[lt, eq])
                    }
                    _ => {
                        let lt = self.fp_lt(nm, b, a, fmt);
                        let eq = self.fp_eq(nm, a, b, fmt);
                        nm.mk_or(&[lt, eq])
                    }
                }
            }
            FpMin | FpMax => {
                let lhs = nm.child(node, 0);
                let rhs = nm.child(node, 1);
                let fmt = nm.fp_format(lhs);
                let a = self.word_blast(nm, lhs);
                let b = self.word_blast(nm, rhs);
                self.min_max(nm, a, b, fmt, kind == FpMin)
            }
            Equal if nm.sorts.is_fp(nm.sort(nm.child(node, 0))) => {
                // Object equality: there is exactly one NaN value.
                let lhs = nm.child(node, 0);
                let rhs = nm.child(node, 1);
                let fmt = nm.fp_format(lhs);
                let a = self.word_blast(nm, lhs);
                let b = self.word_blast(nm, rhs);
                let nan_a = self.is_nan(nm, a, fmt);
                let nan_b = self.is_nan(nm, b, fmt);
                let both_nan = nm.mk_and(&[nan_a, nan_b]);
                let bits_eq = nm.mk_eq(a, b);
                nm.mk_or(&[both_nan, bits_eq])
            }
            Equal if nm.sorts.is_rm(nm.sort(nm.child(node, 0))) => {
                let (c0, c1) = (nm.child(node, 0), nm.child(node, 1));
                let a = self.word_blast(nm, c0);
                let b = self.word_blast(nm, c1);
                nm.mk_eq(a, b)
            }
            FpAdd | FpSub | FpMul | FpDiv => {
                let fmt = nm.fp_format(node);
                let (c0, c1, c2) = (nm.child(node, 0), nm.child(node, 1), nm.child(node, 2));
                let rm = self.word_blast(nm, c0);
                let x = self.word_blast(nm, c1);
                let y = self.word_blast(nm, c2);
                match kind {
                    FpAdd => blast::blast_add(nm, fmt, rm, x, y, false),
                    FpSub => blast::blast_add(nm, fmt, rm, x, y, true),
                    FpMul => blast::blast_mul(nm, fmt, rm, x, y),
                    _ => blast::blast_div(nm, fmt, rm, x, y),
                }
            }
            FpFma => {
                let fmt = nm.fp_format(node);
                let children = nm.children(node).to_vec();
                let rm = self.word_blast(nm, children[0]);
                let x = self.word_blast(nm, children[1]);
                let y = self.word_blast(nm, children[2]);
                let z = self.word_blast(nm, children[3]);
                blast::blast_fma(nm, fmt, rm, x, y, z)
            }
            FpSqrt | FpRti => {
                let fmt = nm.fp_format(node);
                let (c0, c1) = (nm.child(node, 0), nm.child(node, 1));
                let rm = self.word_blast(nm, c0);
                let x = self.word_blast(nm, c1);
                if kind == FpSqrt {
                    blast::blast_sqrt(nm, fmt, rm, x)
                } else {
                    blast::blast_rti(nm, fmt, rm, x)
                }
            }
            FpRem => {
                let fmt = nm.fp_format(node);
                let (c0, c1) = (nm.child(node, 0), nm.child(node, 1));
                let x = self.word_blast(nm, c0);
                let y = self.word_blast(nm, c1);
                blast::blast_rem(nm, fmt, x, y)
            }
            FpToFpFromFp => {
                let (c0, c1) = (nm.child(node, 0), nm.child(node, 1));
                let from = nm.fp_format(c1);
                let to = nm.fp_format(node);
                let rm = self.word_blast(nm, c0);
                let x = self.word_blast(nm, c1);
                blast::blast_from_fp(nm, from, to, rm, x)
            }
            FpToFpFromSbv | FpToFpFromUbv => {
                let fmt = nm.fp_format(node);
                let (c0, c1) = (nm.child(node, 0), nm.child(node, 1));
                let rm = self.word_blast(nm, c0);
                let x = self.word_blast(nm, c1);
                blast::blast_from_bv(nm, fmt, rm, x, kind == FpToFpFromSbv)
            }
            FpToSbv | FpToUbv => {
                let (c0, c1) = (nm.child(node, 0), nm.child(node, 1));
                let fmt = nm.fp_format(c1);
                let n = nm.indices(node)[0];
                let rm = self.word_blast(nm, c0);
                let x = self.word_blast(nm, c1);
                blast::blast_to_bv(nm, fmt, rm, x, n, kind == FpToSbv)
            }
            _ => {
                // Structural rebuild with blasted children.
                let children = nm.children(node).to_vec();
                let mut changed = false;
                let mut blasted = Vec::with_capacity(children.len());
                for &c in &children {
                    let bc = self.word_blast(nm, c);
                    changed |= bc != c;
                    blasted.push(bc);
                }
                if changed {
                    let indices = nm.indices(node).to_vec();
                    nm.mk_node(kind, &blasted, &indices)
                } else {
                    node
                }
            }
        };
        self.map.insert(node, result);
        result
    }

    /* ---- circuit helpers -------------------------------------------------- */

    fn fresh_bv(&mut self, nm: &mut NodeManager, node: Node, width: u64) -> Node {
        let symbol = nm.symbol(node).map(str::to_owned);
        let sort = nm.sorts.mk_bv(width).unwrap();
        nm.mk_const(sort, symbol.as_deref())
    }

    fn sign_bit(&self, nm: &mut NodeManager, enc: Node) -> Node {
        let w = nm.bv_width(enc);
        let bit = nm.mk_node(Kind::BvExtract, &[enc], &[w - 1, w - 1]);
        let one = nm.mk_bv_value(BvValue::one(1));
        nm.mk_eq(bit, one)
    }

    fn exp_field(&self, nm: &mut NodeManager, enc: Node, fmt: FpFormat) -> Node {
        let w = fmt.width();
        nm.mk_node(Kind::BvExtract, &[enc], &[w - 2, fmt.sig_size - 1])
    }

    fn sig_field(&self, nm: &mut NodeManager, enc: Node, fmt: FpFormat) -> Node {
        nm.mk_node(Kind::BvExtract, &[enc], &[fmt.sig_size - 2, 0])
    }

    fn exp_all_ones(&self, nm: &mut NodeManager, enc: Node, fmt: FpFormat) -> Node {
        let exp = self.exp_field(nm, enc, fmt);
        let ones = nm.mk_bv_value(BvValue::ones(fmt.exp_size));
        nm.mk_eq(exp, ones)
    }

    fn exp_zero(&self, nm: &mut NodeManager, enc: Node, fmt: FpFormat) -> Node {
        let exp = self.exp_field(nm, enc, fmt);
        let zero = nm.mk_bv_value(BvValue::zero(fmt.exp_size));
        nm.mk_eq(exp, zero)
    }

    fn sig_zero(&self, nm: &mut NodeManager, enc: Node, fmt: FpFormat) -> Node {
        let sig = self.sig_field(nm, enc, fmt);
        let zero = nm.mk_bv_value(BvValue::zero(fmt.sig_size - 1));
        nm.mk_eq(sig, zero)
    }

    fn is_nan(&self, nm: &mut NodeManager, enc: Node, fmt: FpFormat) -> Node {
        let ones = self.exp_all_ones(nm, enc, fmt);
        let sz = self.sig_zero(nm, enc, fmt);
        let nsz = nm.mk_not(sz);
        nm.mk_and(&[ones, nsz])
    }

    fn is_inf(&self, nm: &mut NodeManager, enc: Node, fmt: FpFormat) -> Node {
        let ones = self.exp_all_ones(nm, enc, fmt);
        let sz = self.sig_zero(nm, enc, fmt);
        nm.mk_and(&[ones, sz])
    }

    fn is_zero(&self, nm: &mut NodeManager, enc: Node, fmt: FpFormat) -> Node {
        let ez = self.exp_zero(nm, enc, fmt);
        let sz = self.sig_zero(nm, enc, fmt);
        nm.mk_and(&[ez, sz])
    }

    fn is_subnormal(&self, nm: &mut NodeManager, enc: Node, fmt: FpFormat) -> Node {
        let ez = self.exp_zero(nm, enc, fmt);
        let sz = self.sig_zero(nm, enc, fmt);
        let nsz = nm.mk_not(sz);
        nm.mk_and(&[ez, nsz])
    }

    fn is_normal(&self, nm: &mut NodeManager, enc: Node, fmt: FpFormat) -> Node {
        let ez = self.exp_zero(nm, enc, fmt);
        let eo = self.exp_all_ones(nm, enc, fmt);
        let nez = nm.mk_not(ez);
        let neo = nm.mk_not(eo);
        nm.mk_and(&[nez, neo])
    }

    /// Magnitude: the packed encoding without the sign bit.
    fn magnitude(&self, nm: &mut NodeManager, enc: Node, fmt: FpFormat) -> Node {
        nm.mk_node(Kind::BvExtract, &[enc], &[fmt.width() - 2, 0])
    }

    fn fp_eq(&self, nm: &mut NodeManager, a: Node, b: Node, fmt: FpFormat) -> Node {
        let nan_a = self.is_nan(nm, a, fmt);
        let nan_b = self.is_nan(nm, b, fmt);
        let zero_a = self.is_zero(nm, a, fmt);
        let zero_b = self.is_zero(nm, b, fmt);
        let both_zero = nm.mk_and(&[zero_a, zero_b]);
        let bits_eq = nm.mk_eq(a, b);
        let value_eq = nm.mk_or(&[both_zero, bits_eq]);
        let nn_a = nm.mk_not(nan_a);
        let nn_b = nm.mk_not(nan_b);
        nm.mk_and(&[nn_a, nn_b, value_eq])
    }

    fn fp_lt(&self, nm: &mut NodeManager, a: Node, b: Node, fmt: FpFormat) -> Node {
        let nan_a = self.is_nan(nm, a, fmt);
        let nan_b = self.is_nan(nm, b, fmt);
        let zero_a = self.is_zero(nm, a, fmt);
        let zero_b = self.is_zero(nm, b, fmt);
        let both_zero = nm.mk_and(&[zero_a, zero_b]);
        let sa = self.sign_bit(nm, a);
        let sb = self.sign_bit(nm, b);
        let mag_a = self.magnitude(nm, a, fmt);
        let mag_b = self.magnitude(nm, b, fmt);
        let nsa = nm.mk_not(sa);
        let nsb = nm.mk_not(sb);
        // negative < positive
        let neg_pos = nm.mk_and(&[sa, nsb]);
        // both negative: larger magnitude is smaller
        let mag_gt = nm.mk_node(Kind::BvUlt, &[mag_b, mag_a], &[]);
        let both_neg = nm.mk_and(&[sa, sb, mag_gt]);
        // both positive: smaller magnitude is smaller
        let mag_lt = nm.mk_node(Kind::BvUlt, &[mag_a, mag_b], &[]);
        let both_pos = nm.mk_and(&[nsa, nsb, mag_lt]);
        let ordered = nm.mk_or(&[neg_pos, both_neg, both_pos]);
        let nn_a = nm.mk_not(nan_a);
        let nn_b = nm.mk_not(nan_b);
        let nbz = nm.mk_not(both_zero);
        nm.mk_and(&[nn_a, nn_b, nbz, ordered])
    }

    fn min_max(
        &self,
        nm: &mut NodeManager,
        a: Node,
        b: Node,
        fmt: FpFormat,
        is_min: bool,
    ) -> Node {
        let nan_a = self.is_nan(nm, a, fmt);
        let nan_b = self.is_nan(nm, b, fmt);
        let zero_a = self.is_zero(nm, a, fmt);
        let zero_b = self.is_zero(nm, b, fmt);
        let both_zero = nm.mk_and(&[zero_a, zero_b]);
        let sa = self.sign_bit(nm, a);
        let sb = self.sign_bit(nm, b);
        // Mixed-sign zeros merge towards -0 for min, +0 for max.
        let zero_sign = if is_min {
            nm.mk_or(&[sa, sb])
        } else {
            nm.mk_and(&[sa, sb])
        };
        let w = fmt.width();
        let signed_zero = {
            let one = nm.mk_bv_value(BvValue::one(1));
            let zero1 = nm.mk_bv_value(BvValue::zero(1));
            let sign = nm.mk_ite(zero_sign, one, zero1);
            let rest = nm.mk_bv_value(BvValue::zero(w - 1));
            nm.mk_node(Kind::BvConcat, &[sign, rest], &[])
        };
        let lt = if is_min {
            self.fp_lt(nm, b, a, fmt)
        } else {
            self.fp_lt(nm, a, b, fmt)
        };
        // lt holds when b should be picked.
        let picked = nm.mk_ite(lt, b, a);
        let merged = nm.mk_ite(both_zero, signed_zero, picked);
        let no_b = nm.mk_ite(nan_b, a, merged);
        nm.mk_ite(nan_a, b, no_b)
    }
}

/// The rounding-mode code, in declaration order.
pub fn rm_code(rm: RoundingMode) -> u64 {
    RoundingMode::ALL
        .iter()
        .position(|&m| m == rm)
        .expect("mode in table") as u64
}

/// The rounding mode of a code, clamping out-of-range codes.
pub fn rm_from_code(code: u64) -> RoundingMode {
    RoundingMode::ALL
        .get(code as usize)
        .copied()
        .unwrap_or(RoundingMode::Rne)
}
