//! Lowering of bit-vector and Boolean terms to AIG circuits.
//!
//! Encodings are memoised per node and MSB-first: `bits(n)[0]` is the most
//! significant bit. Terms the circuit layer cannot express (free
//! constants, array reads, function applications, quantified formulas) are
//! abstracted as fresh AIG inputs; the theory layer refines them with
//! lemmas.

use rustc_hash::{FxHashMap, FxHashSet};

use bitwuzla_bv::BvValue;
use bitwuzla_core::node::{Kind, Node, NodeManager};

use crate::aig::{AigManager, AigRef};

/// Bit-blaster state: the AIG and the node-to-encoding maps.
pub struct AigBitblaster {
    /// The circuit.
    pub aig: AigManager,
    bv_map: FxHashMap<Node, Vec<AigRef>>,
    bool_map: FxHashMap<Node, AigRef>,
    inputs: FxHashSet<Node>,
}

impl Default for AigBitblaster {
    fn default() -> Self {
        Self::new()
    }
}

impl AigBitblaster {
    /// Create an empty bit-blaster.
    pub fn new() -> Self {
        Self {
            aig: AigManager::new(),
            bv_map: FxHashMap::default(),
            bool_map: FxHashMap::default(),
            inputs: FxHashSet::default(),
        }
    }

    /// True iff `node` was abstracted as an input.
    pub fn is_input(&self, node: Node) -> bool {
        self.inputs.contains(&node)
    }

    /// All abstracted inputs.
    pub fn inputs(&self) -> impl Iterator<Item = Node> + '_ {
        self.inputs.iter().copied()
    }

    /// The cached encoding of a bit-vector node, if present.
    pub fn cached_bits(&self, node: Node) -> Option<&[AigRef]> {
        self.bv_map.get(&node).map(|v| v.as_slice())
    }

    /// The cached encoding of a Boolean node, if present.
    pub fn cached_bit(&self, node: Node) -> Option<AigRef> {
        self.bool_map.get(&node).copied()
    }

    /// Encode a Boolean node as a single AIG reference.
    pub fn bit(&mut self, nm: &NodeManager, node: Node) -> AigRef {
        debug_assert!(nm.sorts.is_bool(nm.sort(node)));
        if let Some(&r) = self.bool_map.get(&node) {
            return r;
        }
        use Kind::*;
        let r = match nm.kind(node) {
            Value => {
                if nm.bool_value(node) == Some(true) {
                    AigRef::TRUE
                } else {
                    AigRef::FALSE
                }
            }
            Not => {
                let c = self.bit(nm, nm.child(node, 0));
                c.not()
            }
            And => self.fold_bool(nm, node, |aig, a, b| aig.mk_and(a, b)),
            Or => self.fold_bool(nm, node, |aig, a, b| aig.mk_or(a, b)),
            Xor => self.fold_bool(nm, node, |aig, a, b| aig.mk_xor(a, b)),
            Implies => {
                let a = self.bit(nm, nm.child(node, 0));
                let b = self.bit(nm, nm.child(node, 1));
                self.aig.mk_or(a.not(), b)
            }
            Ite => {
                let c = self.bit(nm, nm.child(node, 0));
                let t = self.bit(nm, nm.child(node, 1));
                let e = self.bit(nm, nm.child(node, 2));
                self.aig.mk_ite(c, t, e)
            }
            Equal => {
                let lhs = nm.child(node, 0);
                let rhs = nm.child(node, 1);
                let sort = nm.sort(lhs);
                if nm.sorts.is_bool(sort) {
                    let a = self.bit(nm, lhs);
                    let b = self.bit(nm, rhs);
                    self.aig.mk_iff(a, b)
                } else if nm.sorts.is_bv(sort) {
                    let a = self.bits(nm, lhs);
                    let b = self.bits(nm, rhs);
                    self.eq_circuit(&a, &b)
                } else {
                    // Array / function / uninterpreted equality is a
                    // theory literal.
                    self.mk_abstract_bool(node)
                }
            }
            Distinct => {
                // Pairwise disequality; normally eliminated by rewriting.
                let children = nm.children(node).to_vec();
                if children.iter().any(|&c| {
                    let s = nm.sort(c);
                    !nm.sorts.is_bool(s) && !nm.sorts.is_bv(s)
                }) {
                    let r = self.mk_abstract_bool(node);
                    self.bool_map.insert(node, r);
                    return r;
                }
                let mut acc = AigRef::TRUE;
                for i in 0..children.len() {
                    for j in i + 1..children.len() {
                        let eq = if nm.sorts.is_bool(nm.sort(children[i])) {
                            let a = self.bit(nm, children[i]);
                            let b = self.bit(nm, children[j]);
                            self.aig.mk_iff(a, b)
                        } else {
                            let a = self.bits(nm, children[i]);
                            let b = self.bits(nm, children[j]);
                            self.eq_circuit(&a, &b)
                        };
                        acc = self.aig.mk_and(acc, eq.not());
                    }
                }
                acc
            }
            BvUlt => self.cmp_circuit(nm, node, false, false),
            BvUle => self.cmp_circuit(nm, node, false, true),
            BvSlt => self.cmp_circuit(nm, node, true, false),
            BvSle => self.cmp_circuit(nm, node, true, true),
            BvUgt | BvUge | BvSgt | BvSge => {
                // Normalised away at rewrite level >= 1; handle directly
                // for level 0.
                let a = nm.child(node, 0);
                let b = nm.child(node, 1);
                let (signed, or_eq) = match nm.kind(node) {
                    BvUgt => (false, false),
                    BvUge => (false, true),
                    BvSgt => (true, false),
                    _ => (true, true),
                };
                let ab = self.bits(nm, a);
                let bb = self.bits(nm, b);
                self.lt_bits(&bb, &ab, signed, or_eq)
            }
            BvUaddo => {
                let a = self.bits(nm, nm.child(node, 0));
                let b = self.bits(nm, nm.child(node, 1));
                let (_, carry) = self.add_bits(&a, &b, AigRef::FALSE);
                carry
            }
            BvUsubo => {
                let a = self.bits(nm, nm.child(node, 0));
                let b = self.bits(nm, nm.child(node, 1));
                let nb = self.not_bits(&b);
                let (_, carry) = self.add_bits(&a, &nb, AigRef::TRUE);
                carry.not()
            }
            BvSaddo => {
                let a = self.bits(nm, nm.child(node, 0));
                let b = self.bits(nm, nm.child(node, 1));
                let (sum, _) = self.add_bits(&a, &b, AigRef::FALSE);
                let same = self.aig.mk_iff(a[0], b[0]);
                let flipped = self.aig.mk_xor(sum[0], a[0]);
                self.aig.mk_and(same, flipped)
            }
            BvSsubo => {
                let a = self.bits(nm, nm.child(node, 0));
                let b = self.bits(nm, nm.child(node, 1));
                let nb = self.not_bits(&b);
                let (diff, _) = self.add_bits(&a, &nb, AigRef::TRUE);
                let differ = self.aig.mk_xor(a[0], b[0]);
                let flipped = self.aig.mk_xor(diff[0], a[0]);
                self.aig.mk_and(differ, flipped)
            }
            BvUmulo => {
                let a = self.bits(nm, nm.child(node, 0));
                let b = self.bits(nm, nm.child(node, 1));
                let w = a.len();
                let ax = self.extend(&a, w, false);
                let bx = self.extend(&b, w, false);
                let prod = self.mul_bits(&ax, &bx);
                let mut over = AigRef::FALSE;
                for &bit in &prod[..w] {
                    over = self.aig.mk_or(over, bit);
                }
                over
            }
            BvSmulo => {
                let a = self.bits(nm, nm.child(node, 0));
                let b = self.bits(nm, nm.child(node, 1));
                let w = a.len();
                if w == 1 {
                    // Only -1 * -1 overflows at width 1.
                    self.aig.mk_and(a[0], b[0])
                } else {
                    let ax = self.extend(&a, w, true);
                    let bx = self.extend(&b, w, true);
                    let prod = self.mul_bits(&ax, &bx);
                    // Overflow unless the top w+1 bits all equal the sign
                    // bit of the low part (index w in MSB-first order).
                    let sign = prod[w];
                    let mut ok = AigRef::TRUE;
                    for &bit in &prod[..w] {
                        let eq = self.aig.mk_iff(bit, sign);
                        ok = self.aig.mk_and(ok, eq);
                    }
                    ok.not()
                }
            }
            BvSdivo => {
                let a = self.bits(nm, nm.child(node, 0));
                let b = self.bits(nm, nm.child(node, 1));
                let w = a.len();
                let min = self.const_bits(&BvValue::min_signed(w as u64));
                let ones = self.const_bits(&BvValue::ones(w as u64));
                let l = self.eq_circuit(&a, &min);
                let r = self.eq_circuit(&b, &ones);
                self.aig.mk_and(l, r)
            }
            _ => self.mk_abstract_bool(node),
        };
        self.bool_map.insert(node, r);
        r
    }

    /// Encode a bit-vector node as MSB-first AIG references.
    pub fn bits(&mut self, nm: &NodeManager, node: Node) -> Vec<AigRef> {
        debug_assert!(nm.sorts.is_bv(nm.sort(node)));
        if let Some(bits) = self.bv_map.get(&node) {
            return bits.clone();
        }
        use Kind::*;
        let w = nm.bv_width(node) as usize;
        let bits = match nm.kind(node) {
            Value => self.const_bits(nm.bv_value(node).expect("BV value")),
            BvNot => {
                let a = self.bits(nm, nm.child(node, 0));
                self.not_bits(&a)
            }
            BvNeg => {
                let a = self.bits(nm, nm.child(node, 0));
                self.neg_bits(&a)
            }
            BvInc => {
                let a = self.bits(nm, nm.child(node, 0));
                let one = self.const_bits(&BvValue::one(w as u64));
                self.add_bits(&a, &one, AigRef::FALSE).0
            }
            BvDec => {
                let a = self.bits(nm, nm.child(node, 0));
                let ones = self.const_bits(&BvValue::ones(w as u64));
                self.add_bits(&a, &ones, AigRef::FALSE).0
            }
            BvRedand | BvRedor | BvRedxor => {
                let a = self.bits(nm, nm.child(node, 0));
                let r = match nm.kind(node) {
                    BvRedand => self.fold_bits(&a, |aig, x, y| aig.mk_and(x, y)),
                    BvRedor => self.fold_bits(&a, |aig, x, y| aig.mk_or(x, y)),
                    _ => self.fold_bits(&a, |aig, x, y| aig.mk_xor(x, y)),
                };
                vec![r]
            }
            BvAdd => self.fold_bv(nm, node, |bb, a, b| bb.add_bits(a, b, AigRef::FALSE).0),
            BvMul => self.fold_bv(nm, node, |bb, a, b| bb.mul_bits(a, b)),
            BvAnd => self.fold_bv(nm, node, |bb, a, b| bb.bitwise(a, b, |aig, x, y| aig.mk_and(x, y))),
            BvOr => self.fold_bv(nm, node, |bb, a, b| bb.bitwise(a, b, |aig, x, y| aig.mk_or(x, y))),
            BvXor => self.fold_bv(nm, node, |bb, a, b| bb.bitwise(a, b, |aig, x, y| aig.mk_xor(x, y))),
            BvNand => {
                let r = self.binary_bitwise(nm, node, |aig, x, y| aig.mk_and(x, y));
                self.not_bits(&r)
            }
            BvNor => {
                let r = self.binary_bitwise(nm, node, |aig, x, y| aig.mk_or(x, y));
                self.not_bits(&r)
            }
            BvXnor => {
                let r = self.binary_bitwise(nm, node, |aig, x, y| aig.mk_xor(x, y));
                self.not_bits(&r)
            }
            BvSub => {
                let a = self.bits(nm, nm.child(node, 0));
                let b = self.bits(nm, nm.child(node, 1));
                let nb = self.not_bits(&b);
                self.add_bits(&a, &nb, AigRef::TRUE).0
            }
            BvUdiv => {
                let a = self.bits(nm, nm.child(node, 0));
                let b = self.bits(nm, nm.child(node, 1));
                self.udivurem_bits(&a, &b).0
            }
            BvUrem => {
                let a = self.bits(nm, nm.child(node, 0));
                let b = self.bits(nm, nm.child(node, 1));
                self.udivurem_bits(&a, &b).1
            }
            BvSdiv => {
                let (a, b, sa, sb) = self.signed_operands(nm, node);
                let (q, _) = {
                    let aa = self.abs_bits(&a, sa);
                    let ab = self.abs_bits(&b, sb);
                    self.udivurem_bits(&aa, &ab)
                };
                let neg_q = self.neg_bits(&q);
                let flip = self.aig.mk_xor(sa, sb);
                self.mux_bits(flip, &neg_q, &q)
            }
            BvSrem => {
                let (a, b, sa, sb) = self.signed_operands(nm, node);
                let (_, r) = {
                    let aa = self.abs_bits(&a, sa);
                    let ab = self.abs_bits(&b, sb);
                    self.udivurem_bits(&aa, &ab)
                };
                let neg_r = self.neg_bits(&r);
                self.mux_bits(sa, &neg_r, &r)
            }
            BvSmod => {
                let (a, b, sa, sb) = self.signed_operands(nm, node);
                let aa = self.abs_bits(&a, sa);
                let ab = self.abs_bits(&b, sb);
                let (_, u) = self.udivurem_bits(&aa, &ab);
                // bvsmod: zero remainder stays zero; otherwise adjust the
                // sign towards the divisor.
                let zero = self.const_bits(&BvValue::zero(w as u64));
                let u_is_zero = self.eq_circuit(&u, &zero);
                let neg_u = self.neg_bits(&u);
                let neg_u_plus_b = self.add_bits(&neg_u, &b, AigRef::FALSE).0;
                let u_plus_b = self.add_bits(&u, &b, AigRef::FALSE).0;
                let sa_only = self.aig.mk_and(sa, sb.not());
                let sb_only = self.aig.mk_and(sa.not(), sb);
                let both = self.aig.mk_and(sa, sb);
                let r1 = self.mux_bits(both, &neg_u, &u);
                let r2 = self.mux_bits(sb_only, &u_plus_b, &r1);
                let r3 = self.mux_bits(sa_only, &neg_u_plus_b, &r2);
                self.mux_bits(u_is_zero, &zero, &r3)
            }
            BvShl => self.shift_circuit(nm, node, ShiftKind::Left),
            BvShr => self.shift_circuit(nm, node, ShiftKind::Right),
            BvAshr => self.shift_circuit(nm, node, ShiftKind::RightArith),
            BvRol | BvRor => self.rotate_circuit(nm, node),
            BvComp => {
                let a = self.bits(nm, nm.child(node, 0));
                let b = self.bits(nm, nm.child(node, 1));
                vec![self.eq_circuit(&a, &b)]
            }
            BvConcat => {
                let mut out = Vec::with_capacity(w);
                for &c in nm.children(node).to_vec().iter() {
                    out.extend(self.bits(nm, c));
                }
                out
            }
            BvExtract => {
                let a = self.bits(nm, nm.child(node, 0));
                let cw = a.len() as u64;
                let (hi, lo) = (nm.indices(node)[0], nm.indices(node)[1]);
                a[(cw - 1 - hi) as usize..=(cw - 1 - lo) as usize].to_vec()
            }
            BvRepeat => {
                let a = self.bits(nm, nm.child(node, 0));
                let mut out = Vec::with_capacity(w);
                for _ in 0..nm.indices(node)[0] {
                    out.extend_from_slice(&a);
                }
                out
            }
            BvRoli | BvRori => {
                let a = self.bits(nm, nm.child(node, 0));
                let cw = a.len() as u64;
                let n = nm.indices(node)[0] % cw;
                let k = if nm.kind(node) == BvRoli {
                    n
                } else {
                    (cw - n) % cw
                } as usize;
                let mut out = a[k..].to_vec();
                out.extend_from_slice(&a[..k]);
                out
            }
            BvSignExtend => {
                let a = self.bits(nm, nm.child(node, 0));
                self.extend(&a, nm.indices(node)[0] as usize, true)
            }
            BvZeroExtend => {
                let a = self.bits(nm, nm.child(node, 0));
                self.extend(&a, nm.indices(node)[0] as usize, false)
            }
            Ite => {
                let c = self.bit(nm, nm.child(node, 0));
                let t = self.bits(nm, nm.child(node, 1));
                let e = self.bits(nm, nm.child(node, 2));
                self.mux_bits(c, &t, &e)
            }
            _ => {
                // Abstract input: constants, array reads, applications.
                self.inputs.insert(node);
                (0..w).map(|_| self.aig.mk_input()).collect()
            }
        };
        debug_assert_eq!(bits.len(), w);
        self.bv_map.insert(node, bits.clone());
        bits
    }

    fn mk_abstract_bool(&mut self, node: Node) -> AigRef {
        self.inputs.insert(node);
        self.aig.mk_input()
    }

    fn fold_bool(
        &mut self,
        nm: &NodeManager,
        node: Node,
        f: impl Fn(&mut AigManager, AigRef, AigRef) -> AigRef,
    ) -> AigRef {
        let children = nm.children(node).to_vec();
        let mut acc = self.bit(nm, children[0]);
        for &c in &children[1..] {
            let b = self.bit(nm, c);
            acc = f(&mut self.aig, acc, b);
        }
        acc
    }

    fn fold_bv(
        &mut self,
        nm: &NodeManager,
        node: Node,
        f: impl Fn(&mut Self, &[AigRef], &[AigRef]) -> Vec<AigRef>,
    ) -> Vec<AigRef> {
        let children = nm.children(node).to_vec();
        let mut acc = self.bits(nm, children[0]);
        for &c in &children[1..] {
            let b = self.bits(nm, c);
            acc = f(self, &acc, &b);
        }
        acc
    }

    fn binary_bitwise(
        &mut self,
        nm: &NodeManager,
        node: Node,
        f: impl Fn(&mut AigManager, AigRef, AigRef) -> AigRef,
    ) -> Vec<AigRef> {
        let a = self.bits(nm, nm.child(node, 0));
        let b = self.bits(nm, nm.child(node, 1));
        self.bitwise(&a, &b, f)
    }

    fn bitwise(
        &mut self,
        a: &[AigRef],
        b: &[AigRef],
        f: impl Fn(&mut AigManager, AigRef, AigRef) -> AigRef,
    ) -> Vec<AigRef> {
        a.iter()
            .zip(b)
            .map(|(&x, &y)| f(&mut self.aig, x, y))
            .collect()
    }

    fn fold_bits(
        &mut self,
        a: &[AigRef],
        f: impl Fn(&mut AigManager, AigRef, AigRef) -> AigRef,
    ) -> AigRef {
        let mut acc = a[0];
        for &bit in &a[1..] {
            acc = f(&mut self.aig, acc, bit);
        }
        acc
    }

    /// Constant bits from a value, MSB-first.
    pub fn const_bits(&self, v: &BvValue) -> Vec<AigRef> {
        (0..v.width())
            .rev()
            .map(|i| if v.bit(i) { AigRef::TRUE } else { AigRef::FALSE })
            .collect()
    }

    fn not_bits(&self, a: &[AigRef]) -> Vec<AigRef> {
        a.iter().map(|&x| x.not()).collect()
    }

    /// Ripple-carry addition, LSB-up. Returns (sum, carry-out).
    fn add_bits(&mut self, a: &[AigRef], b: &[AigRef], carry_in: AigRef) -> (Vec<AigRef>, AigRef) {
        debug_assert_eq!(a.len(), b.len());
        let mut carry = carry_in;
        let mut sum = vec![AigRef::FALSE; a.len()];
        for i in (0..a.len()).rev() {
            let (x, y) = (a[i], b[i]);
            let xy = self.aig.mk_xor(x, y);
            sum[i] = self.aig.mk_xor(xy, carry);
            let gen = self.aig.mk_and(x, y);
            let prop = self.aig.mk_and(xy, carry);
            carry = self.aig.mk_or(gen, prop);
        }
        (sum, carry)
    }

    fn neg_bits(&mut self, a: &[AigRef]) -> Vec<AigRef> {
        let na = self.not_bits(a);
        let zero: Vec<AigRef> = vec![AigRef::FALSE; a.len()];
        self.add_bits(&na, &zero, AigRef::TRUE).0
    }

    /// Shift-and-add multiplication.
    fn mul_bits(&mut self, a: &[AigRef], b: &[AigRef]) -> Vec<AigRef> {
        let w = a.len();
        let mut acc = vec![AigRef::FALSE; w];
        // Partial product for bit i of b (weight 2^i): a shifted left by i,
        // masked by b's bit.
        for i in 0..w {
            let b_bit = b[w - 1 - i];
            if b_bit.is_false() {
                continue;
            }
            let mut partial = vec![AigRef::FALSE; w];
            for j in 0..w - i {
                // Bit j+i (weight) of partial = bit j of a.
                let a_bit = a[w - 1 - j];
                partial[w - 1 - (j + i)] = self.aig.mk_and(a_bit, b_bit);
            }
            acc = self.add_bits(&acc, &partial, AigRef::FALSE).0;
        }
        acc
    }

    /// Restoring division; returns (quotient, remainder). Division by zero
    /// yields an all-ones quotient and the dividend as remainder, matching
    /// SMT-LIB semantics.
    fn udivurem_bits(&mut self, a: &[AigRef], b: &[AigRef]) -> (Vec<AigRef>, Vec<AigRef>) {
        let w = a.len();
        // Remainder register is one bit wider to absorb the shift.
        let mut rem: Vec<AigRef> = vec![AigRef::FALSE; w + 1];
        let bx = self.extend(b, 1, false);
        let nbx = self.not_bits(&bx);
        let mut quot = vec![AigRef::FALSE; w];
        for i in 0..w {
            // rem = (rem << 1) | a[i]  (a[i] is the next MSB)
            rem.remove(0);
            rem.push(a[i]);
            // ge = rem >= b
            let (diff, carry) = self.add_bits(&rem, &nbx, AigRef::TRUE);
            let ge = carry;
            quot[i] = ge;
            rem = self.mux_bits(ge, &diff, &rem);
        }
        rem.remove(0);
        (quot, rem)
    }

    fn abs_bits(&mut self, a: &[AigRef], sign: AigRef) -> Vec<AigRef> {
        let neg = self.neg_bits(a);
        self.mux_bits(sign, &neg, a)
    }

    fn signed_operands(
        &mut self,
        nm: &NodeManager,
        node: Node,
    ) -> (Vec<AigRef>, Vec<AigRef>, AigRef, AigRef) {
        let a = self.bits(nm, nm.child(node, 0));
        let b = self.bits(nm, nm.child(node, 1));
        let sa = a[0];
        let sb = b[0];
        (a, b, sa, sb)
    }

    /// Bitwise multiplexer: `c ? t : e`.
    fn mux_bits(&mut self, c: AigRef, t: &[AigRef], e: &[AigRef]) -> Vec<AigRef> {
        t.iter()
            .zip(e)
            .map(|(&x, &y)| self.aig.mk_ite(c, x, y))
            .collect()
    }

    /// Prepend `n` sign or zero bits.
    fn extend(&self, a: &[AigRef], n: usize, signed: bool) -> Vec<AigRef> {
        let fill = if signed { a[0] } else { AigRef::FALSE };
        let mut out = vec![fill; n];
        out.extend_from_slice(a);
        out
    }

    /// Equality as the conjunction of per-bit equivalences.
    fn eq_circuit(&mut self, a: &[AigRef], b: &[AigRef]) -> AigRef {
        let mut acc = AigRef::TRUE;
        for (&x, &y) in a.iter().zip(b) {
            let eq = self.aig.mk_iff(x, y);
            acc = self.aig.mk_and(acc, eq);
        }
        acc
    }

    fn cmp_circuit(&mut self, nm: &NodeManager, node: Node, signed: bool, or_eq: bool) -> AigRef {
        let a = self.bits(nm, nm.child(node, 0));
        let b = self.bits(nm, nm.child(node, 1));
        self.lt_bits(&a, &b, signed, or_eq)
    }

    /// `a < b` (or `<=`), unsigned or two's-complement.
    fn lt_bits(&mut self, a: &[AigRef], b: &[AigRef], signed: bool, or_eq: bool) -> AigRef {
        let (a, b) = if signed {
            // Biasing the sign bit reduces signed to unsigned comparison.
            let mut ab = a.to_vec();
            let mut bb = b.to_vec();
            ab[0] = ab[0].not();
            bb[0] = bb[0].not();
            (ab, bb)
        } else {
            (a.to_vec(), b.to_vec())
        };
        // LSB-up ripple comparison.
        let mut lt = if or_eq { AigRef::TRUE } else { AigRef::FALSE };
        for i in (0..a.len()).rev() {
            let (x, y) = (a[i], b[i]);
            let strictly = self.aig.mk_and(x.not(), y);
            let eq = self.aig.mk_iff(x, y);
            let keep = self.aig.mk_and(eq, lt);
            lt = self.aig.mk_or(strictly, keep);
        }
        lt
    }

    fn shift_circuit(&mut self, nm: &NodeManager, node: Node, kind: ShiftKind) -> Vec<AigRef> {
        let a = self.bits(nm, nm.child(node, 0));
        let s = self.bits(nm, nm.child(node, 1));
        self.shift_bits(&a, &s, kind)
    }

    /// Logarithmic barrel shifter with saturation for amounts `>= width`.
    fn shift_bits(&mut self, a: &[AigRef], s: &[AigRef], kind: ShiftKind) -> Vec<AigRef> {
        let w = a.len();
        let fill = match kind {
            ShiftKind::RightArith => a[0],
            _ => AigRef::FALSE,
        };
        let stages = usize::BITS as usize - (w - 1).leading_zeros() as usize;
        let stages = if w == 1 { 1 } else { stages };
        let mut cur = a.to_vec();
        for j in 0..stages.min(w * 8) {
            let amount = 1usize << j;
            if amount >= w {
                break;
            }
            // Shift amount bit j, counted from the LSB of s.
            let ctrl = s[s.len() - 1 - j];
            let shifted = self.shift_const(&cur, amount, kind, fill);
            cur = self.mux_bits(ctrl, &shifted, &cur);
        }
        // Saturate when the amount does not fit the stage bits.
        let width_val = BvValue::from_u64(s.len() as u64, w as u64);
        let wbits = self.const_bits(&width_val);
        let too_big = self.lt_bits(&s, &wbits, false, false).not();
        let sat = vec![fill; w];
        self.mux_bits(too_big, &sat, &cur)
    }

    fn shift_const(
        &mut self,
        a: &[AigRef],
        amount: usize,
        kind: ShiftKind,
        fill: AigRef,
    ) -> Vec<AigRef> {
        let w = a.len();
        match kind {
            ShiftKind::Left => {
                let mut out = a[amount..].to_vec();
                out.extend(std::iter::repeat(AigRef::FALSE).take(amount));
                debug_assert_eq!(out.len(), w);
                out
            }
            ShiftKind::Right | ShiftKind::RightArith => {
                let mut out = vec![fill; amount];
                out.extend_from_slice(&a[..w - amount]);
                out
            }
        }
    }

    fn rotate_circuit(&mut self, nm: &NodeManager, node: Node) -> Vec<AigRef> {
        let a = self.bits(nm, nm.child(node, 0));
        let s = self.bits(nm, nm.child(node, 1));
        let w = a.len();
        let width_val = BvValue::from_u64(w as u64, w as u64);
        let wconst = self.const_bits(&width_val);
        // amount = s mod width
        let (_, amount) = self.udivurem_bits(&s, &wconst);
        let left = nm.kind(node) == Kind::BvRol;
        let (l, r) = if left {
            let l = self.shift_bits(&a, &amount, ShiftKind::Left);
            let nsub = self.sub_const(&wconst, &amount);
            let r = self.shift_bits(&a, &nsub, ShiftKind::Right);
            (l, r)
        } else {
            let l = self.shift_bits(&a, &amount, ShiftKind::Right);
            let nsub = self.sub_const(&wconst, &amount);
            let r = self.shift_bits(&a, &nsub, ShiftKind::Left);
            (l, r)
        };
        self.bitwise(&l, &r, |aig, x, y| aig.mk_or(x, y))
    }

    fn sub_const(&mut self, a: &[AigRef], b: &[AigRef]) -> Vec<AigRef> {
        let nb = self.not_bits(b);
        self.add_bits(a, &nb, AigRef::TRUE).0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftKind {
    Left,
    Right,
    RightArith,
}
