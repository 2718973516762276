//! Rewrite rules for bit-vector kinds.

use bitwuzla_bv::BvValue;

use crate::node::{Kind, Node, NodeManager};
use crate::rewrite::Rewriter;

pub(super) fn rewrite_bv(rw: &mut Rewriter, nm: &mut NodeManager, node: Node) -> Node {
    let level = rw.level();
    match nm.kind(node) {
        Kind::BvNot | Kind::BvNeg => rewrite_involution(nm, node),
        Kind::BvAdd => rewrite_add(nm, node, level),
        Kind::BvMul => rewrite_mul(nm, node, level),
        Kind::BvAnd => rewrite_and(nm, node),
        Kind::BvOr => rewrite_or(nm, node),
        Kind::BvXor => rewrite_xor(nm, node),
        Kind::BvSub => rewrite_sub(nm, node, level),
        Kind::BvUdiv => rewrite_udiv(nm, node),
        Kind::BvUrem => rewrite_urem(nm, node),
        Kind::BvShl | Kind::BvShr | Kind::BvAshr => rewrite_shift(nm, node),
        Kind::BvComp => rewrite_comp(nm, node),
        Kind::BvUgt | Kind::BvUge | Kind::BvSgt | Kind::BvSge => rewrite_gt_to_lt(nm, node),
        Kind::BvUlt | Kind::BvUle | Kind::BvSlt | Kind::BvSle => rewrite_cmp(nm, node, level),
        Kind::BvExtract => rewrite_extract(nm, node, level),
        Kind::BvRepeat => rewrite_repeat(nm, node),
        Kind::BvRoli | Kind::BvRori => rewrite_rotate(nm, node),
        Kind::BvSignExtend | Kind::BvZeroExtend => rewrite_extend(nm, node),
        Kind::BvConcat => rewrite_concat(nm, node, level),
        _ => node,
    }
}

fn bv_value_of(nm: &NodeManager, node: Node) -> Option<BvValue> {
    nm.bv_value(node).cloned()
}

/// `bvnot (bvnot a) -> a`, `bvneg (bvneg a) -> a`.
fn rewrite_involution(nm: &mut NodeManager, node: Node) -> Node {
    let child = nm.child(node, 0);
    if nm.kind(child) == nm.kind(node) {
        return nm.child(child, 0);
    }
    node
}

fn rewrite_add(nm: &mut NodeManager, node: Node, level: u64) -> Node {
    let width = nm.bv_width(node);
    let mut acc = BvValue::zero(width);
    let mut operands = Vec::new();
    for &c in nm.children(node) {
        match bv_value_of(nm, c) {
            Some(v) => acc = acc.add(&v),
            None => operands.push(c),
        }
    }
    if operands.is_empty() {
        return nm.mk_bv_value(acc);
    }
    // Level 1 drops neutral zeros; level 2 folds all value operands into a
    // single summand.
    let merge = acc.is_zero() || level >= 2;
    if !merge {
        return node;
    }
    if !acc.is_zero() {
        operands.push(nm.mk_bv_value(acc));
    }
    if operands.len() == nm.num_children(node) {
        return node;
    }
    crate::node::utils::mk_nary(nm, Kind::BvAdd, &operands)
}

fn rewrite_mul(nm: &mut NodeManager, node: Node, level: u64) -> Node {
    let width = nm.bv_width(node);
    let mut acc = BvValue::one(width);
    let mut operands = Vec::new();
    for &c in nm.children(node) {
        match bv_value_of(nm, c) {
            Some(v) => {
                if v.is_zero() {
                    return nm.mk_bv_value(BvValue::zero(width));
                }
                acc = acc.mul(&v);
            }
            None => operands.push(c),
        }
    }
    if operands.is_empty() {
        return nm.mk_bv_value(acc);
    }
    let merge = acc.is_one() || level >= 2;
    if !merge {
        return node;
    }
    if !acc.is_one() {
        operands.push(nm.mk_bv_value(acc));
    }
    if operands.len() == nm.num_children(node) {
        return node;
    }
    crate::node::utils::mk_nary(nm, Kind::BvMul, &operands)
}

fn rewrite_and(nm: &mut NodeManager, node: Node) -> Node {
    let width = nm.bv_width(node);
    let mut operands: Vec<Node> = Vec::new();
    for &c in nm.children(node) {
        if let Some(v) = bv_value_of(nm, c) {
            if v.is_zero() {
                return nm.mk_bv_value(BvValue::zero(width));
            }
            if v.is_ones() {
                continue;
            }
        }
        if operands.contains(&c) {
            continue;
        }
        operands.push(c);
    }
    // a & ~a -> 0
    for &c in &operands {
        if nm.kind(c) == Kind::BvNot && operands.contains(&nm.child(c, 0)) {
            return nm.mk_bv_value(BvValue::zero(width));
        }
    }
    if operands.is_empty() {
        return nm.mk_bv_value(BvValue::ones(width));
    }
    if operands.len() == nm.num_children(node) {
        return node;
    }
    crate::node::utils::mk_nary(nm, Kind::BvAnd, &operands)
}

fn rewrite_or(nm: &mut NodeManager, node: Node) -> Node {
    let width = nm.bv_width(node);
    let mut operands: Vec<Node> = Vec::new();
    for &c in nm.children(node) {
        if let Some(v) = bv_value_of(nm, c) {
            if v.is_ones() {
                return nm.mk_bv_value(BvValue::ones(width));
            }
            if v.is_zero() {
                continue;
            }
        }
        if operands.contains(&c) {
            continue;
        }
        operands.push(c);
    }
    // a | ~a -> ones
    for &c in &operands {
        if nm.kind(c) == Kind::BvNot && operands.contains(&nm.child(c, 0)) {
            return nm.mk_bv_value(BvValue::ones(width));
        }
    }
    if operands.is_empty() {
        return nm.mk_bv_value(BvValue::zero(width));
    }
    if operands.len() == nm.num_children(node) {
        return node;
    }
    crate::node::utils::mk_nary(nm, Kind::BvOr, &operands)
}

fn rewrite_xor(nm: &mut NodeManager, node: Node) -> Node {
    let width = nm.bv_width(node);
    let mut operands: Vec<Node> = Vec::new();
    for &c in nm.children(node) {
        if let Some(v) = bv_value_of(nm, c) {
            if v.is_zero() {
                continue;
            }
        }
        if let Some(pos) = operands.iter().position(|&o| o == c) {
            operands.remove(pos);
        } else {
            operands.push(c);
        }
    }
    if operands.len() == nm.num_children(node) {
        return node;
    }
    if operands.is_empty() {
        return nm.mk_bv_value(BvValue::zero(width));
    }
    crate::node::utils::mk_nary(nm, Kind::BvXor, &operands)
}

fn rewrite_sub(nm: &mut NodeManager, node: Node, level: u64) -> Node {
    let (a, b) = (nm.child(node, 0), nm.child(node, 1));
    let width = nm.bv_width(node);
    if a == b {
        return nm.mk_bv_value(BvValue::zero(width));
    }
    if let Some(v) = bv_value_of(nm, b) {
        if v.is_zero() {
            return a;
        }
    }
    if level >= 2 {
        // Normalise subtraction into addition of the negation so that the
        // commutative add rules see through it.
        let neg = nm.mk_node(Kind::BvNeg, &[b], &[]);
        return nm.mk_node(Kind::BvAdd, &[a, neg], &[]);
    }
    node
}

fn rewrite_udiv(nm: &mut NodeManager, node: Node) -> Node {
    let (a, b) = (nm.child(node, 0), nm.child(node, 1));
    if let Some(v) = bv_value_of(nm, b) {
        if v.is_one() {
            return a;
        }
    }
    node
}

fn rewrite_urem(nm: &mut NodeManager, node: Node) -> Node {
    let b = nm.child(node, 1);
    let width = nm.bv_width(node);
    if let Some(v) = bv_value_of(nm, b) {
        if v.is_one() {
            return nm.mk_bv_value(BvValue::zero(width));
        }
    }
    node
}

fn rewrite_shift(nm: &mut NodeManager, node: Node) -> Node {
    let (a, b) = (nm.child(node, 0), nm.child(node, 1));
    let width = nm.bv_width(node);
    if let Some(v) = bv_value_of(nm, b) {
        if v.is_zero() {
            return a;
        }
        // Shifting everything out is constant regardless of the operand;
        // arithmetic shift keeps its sign dependence.
        let saturates = v.to_u64().map_or(true, |n| n >= width);
        if saturates && nm.kind(node) != Kind::BvAshr {
            return nm.mk_bv_value(BvValue::zero(width));
        }
    }
    if let Some(v) = bv_value_of(nm, a) {
        if v.is_zero() {
            return nm.mk_bv_value(BvValue::zero(width));
        }
    }
    node
}

fn rewrite_comp(nm: &mut NodeManager, node: Node) -> Node {
    let (a, b) = (nm.child(node, 0), nm.child(node, 1));
    if a == b {
        return nm.mk_bv_value(BvValue::one(1));
    }
    node
}

/// Greater-than forms are normalised to swapped less-than forms.
fn rewrite_gt_to_lt(nm: &mut NodeManager, node: Node) -> Node {
    let (a, b) = (nm.child(node, 0), nm.child(node, 1));
    let kind = match nm.kind(node) {
        Kind::BvUgt => Kind::BvUlt,
        Kind::BvUge => Kind::BvUle,
        Kind::BvSgt => Kind::BvSlt,
        Kind::BvSge => Kind::BvSle,
        _ => unreachable!(),
    };
    nm.mk_node(kind, &[b, a], &[])
}

fn rewrite_cmp(nm: &mut NodeManager, node: Node, level: u64) -> Node {
    let (a, b) = (nm.child(node, 0), nm.child(node, 1));
    let kind = nm.kind(node);
    if a == b {
        let holds = matches!(kind, Kind::BvUle | Kind::BvSle);
        return if holds { nm.mk_true() } else { nm.mk_false() };
    }
    if level < 2 {
        return node;
    }
    let width = nm.bv_width(a);
    // Comparisons against the extreme value of the ordering collapse.
    if let Some(v) = bv_value_of(nm, b) {
        match kind {
            Kind::BvUlt if v.is_zero() => return nm.mk_false(),
            Kind::BvUle if v.is_ones() => return nm.mk_true(),
            Kind::BvSlt if v.is_min_signed() => return nm.mk_false(),
            Kind::BvSle if v.is_max_signed() => return nm.mk_true(),
            // x < min+1 <=> x = min
            Kind::BvUlt if v.is_one() => {
                let zero = nm.mk_bv_value(BvValue::zero(width));
                return nm.mk_eq(a, zero);
            }
            _ => {}
        }
    }
    if let Some(v) = bv_value_of(nm, a) {
        match kind {
            Kind::BvUlt if v.is_ones() => return nm.mk_false(),
            Kind::BvUle if v.is_zero() => return nm.mk_true(),
            Kind::BvSlt if v.is_max_signed() => return nm.mk_false(),
            Kind::BvSle if v.is_min_signed() => return nm.mk_true(),
            _ => {}
        }
    }
    node
}

fn rewrite_extract(nm: &mut NodeManager, node: Node, level: u64) -> Node {
    let child = nm.child(node, 0);
    let (hi, lo) = (nm.indices(node)[0], nm.indices(node)[1]);
    let child_width = nm.bv_width(child);
    if lo == 0 && hi == child_width - 1 {
        return child;
    }
    // extract of extract fuses into a single extract
    if nm.kind(child) == Kind::BvExtract {
        let inner = nm.child(child, 0);
        let inner_lo = nm.indices(child)[1];
        return nm.mk_node(Kind::BvExtract, &[inner], &[inner_lo + hi, inner_lo + lo]);
    }
    if level >= 2 && nm.kind(child) == Kind::BvConcat {
        // When the range falls entirely within one concat segment, extract
        // from that segment directly.
        let mut offset = 0;
        for &seg in nm.children(child).iter().rev() {
            let w = nm.bv_width(seg);
            if lo >= offset && hi < offset + w {
                if lo == offset && hi == offset + w - 1 {
                    return seg;
                }
                return nm.mk_node(Kind::BvExtract, &[seg], &[hi - offset, lo - offset]);
            }
            offset += w;
        }
    }
    node
}

fn rewrite_repeat(nm: &mut NodeManager, node: Node) -> Node {
    if nm.indices(node)[0] == 1 {
        return nm.child(node, 0);
    }
    node
}

fn rewrite_rotate(nm: &mut NodeManager, node: Node) -> Node {
    let child = nm.child(node, 0);
    let width = nm.bv_width(child);
    let n = nm.indices(node)[0];
    if n % width == 0 {
        return child;
    }
    if n >= width {
        let kind = nm.kind(node);
        return nm.mk_node(kind, &[child], &[n % width]);
    }
    node
}

fn rewrite_extend(nm: &mut NodeManager, node: Node) -> Node {
    if nm.indices(node)[0] == 0 {
        return nm.child(node, 0);
    }
    node
}

fn rewrite_concat(nm: &mut NodeManager, node: Node, level: u64) -> Node {
    if level < 2 {
        return node;
    }
    // Flatten nested concats and merge adjacent value segments.
    let mut flat: Vec<Node> = Vec::new();
    let mut changed = false;
    for &c in nm.children(node) {
        if nm.kind(c) == Kind::BvConcat {
            flat.extend_from_slice(nm.children(c));
            changed = true;
        } else {
            flat.push(c);
        }
    }
    let mut merged: Vec<Node> = Vec::new();
    for c in flat {
        if let (Some(last), Some(v)) = (merged.last().copied(), bv_value_of(nm, c)) {
            if let Some(lv) = bv_value_of(nm, last) {
                let combined = nm.mk_bv_value(lv.concat(&v));
                *merged.last_mut().unwrap() = combined;
                changed = true;
                continue;
            }
        }
        merged.push(c);
    }
    if !changed {
        return node;
    }
    crate::node::utils::mk_nary(nm, Kind::BvConcat, &merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::Rewriter;

    fn setup() -> (NodeManager, Rewriter) {
        (NodeManager::new(), Rewriter::new(2))
    }

    #[test]
    fn test_add_identity() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let zero = nm.mk_bv_value(BvValue::zero(8));
        let add = nm.mk_node(Kind::BvAdd, &[x, zero], &[]);
        assert_eq!(rw.rewrite(&mut nm, add), x);
    }

    #[test]
    fn test_add_value_merging() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let three = nm.mk_bv_value(BvValue::from_u64(8, 3));
        let four = nm.mk_bv_value(BvValue::from_u64(8, 4));
        let add = nm.mk_node(Kind::BvAdd, &[three, x, four], &[]);
        let r = rw.rewrite(&mut nm, add);
        let seven = nm.mk_bv_value(BvValue::from_u64(8, 7));
        assert_eq!(r, nm.mk_node(Kind::BvAdd, &[x, seven], &[]));
    }

    #[test]
    fn test_mul_absorption() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let zero = nm.mk_bv_value(BvValue::zero(8));
        let one = nm.mk_bv_value(BvValue::one(8));
        let mul = nm.mk_node(Kind::BvMul, &[x, zero], &[]);
        assert_eq!(rw.rewrite(&mut nm, mul), zero);
        let mul = nm.mk_node(Kind::BvMul, &[x, one], &[]);
        assert_eq!(rw.rewrite(&mut nm, mul), x);
    }

    #[test]
    fn test_bitwise_rules() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let zero = nm.mk_bv_value(BvValue::zero(8));
        let ones = nm.mk_bv_value(BvValue::ones(8));
        let and = nm.mk_node(Kind::BvAnd, &[x, zero], &[]);
        assert_eq!(rw.rewrite(&mut nm, and), zero);
        let and = nm.mk_node(Kind::BvAnd, &[x, ones], &[]);
        assert_eq!(rw.rewrite(&mut nm, and), x);
        let and = nm.mk_node(Kind::BvAnd, &[x, x], &[]);
        assert_eq!(rw.rewrite(&mut nm, and), x);
        let notx = nm.mk_node(Kind::BvNot, &[x], &[]);
        let and = nm.mk_node(Kind::BvAnd, &[x, notx], &[]);
        assert_eq!(rw.rewrite(&mut nm, and), zero);
        let or = nm.mk_node(Kind::BvOr, &[x, notx], &[]);
        assert_eq!(rw.rewrite(&mut nm, or), ones);
        let xor = nm.mk_node(Kind::BvXor, &[x, x], &[]);
        assert_eq!(rw.rewrite(&mut nm, xor), zero);
    }

    #[test]
    fn test_sub_normalisation() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let y = nm.mk_const(bv8, None);
        let sub = nm.mk_node(Kind::BvSub, &[x, x], &[]);
        let zero = nm.mk_bv_value(BvValue::zero(8));
        assert_eq!(rw.rewrite(&mut nm, sub), zero);
        let sub = nm.mk_node(Kind::BvSub, &[x, y], &[]);
        let r = rw.rewrite(&mut nm, sub);
        assert_eq!(nm.kind(r), Kind::BvAdd);
    }

    #[test]
    fn test_gt_normalisation() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let y = nm.mk_const(bv8, None);
        let gt = nm.mk_node(Kind::BvUgt, &[x, y], &[]);
        let expected = nm.mk_node(Kind::BvUlt, &[y, x], &[]);
        assert_eq!(rw.rewrite(&mut nm, gt), expected);
        let sge = nm.mk_node(Kind::BvSge, &[x, y], &[]);
        let expected = nm.mk_node(Kind::BvSle, &[y, x], &[]);
        assert_eq!(rw.rewrite(&mut nm, sge), expected);
    }

    #[test]
    fn test_cmp_extremes() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let zero = nm.mk_bv_value(BvValue::zero(8));
        let ult = nm.mk_node(Kind::BvUlt, &[x, zero], &[]);
        assert_eq!(rw.rewrite(&mut nm, ult), nm.mk_false());
        let ones = nm.mk_bv_value(BvValue::ones(8));
        let ule = nm.mk_node(Kind::BvUle, &[x, ones], &[]);
        assert_eq!(rw.rewrite(&mut nm, ule), nm.mk_true());
        let ult = nm.mk_node(Kind::BvUlt, &[x, x], &[]);
        assert_eq!(rw.rewrite(&mut nm, ult), nm.mk_false());
    }

    #[test]
    fn test_extract_rules() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let full = nm.mk_node(Kind::BvExtract, &[x], &[7, 0]);
        assert_eq!(rw.rewrite(&mut nm, full), x);
        // extract of extract
        let inner = nm.mk_node(Kind::BvExtract, &[x], &[6, 2]);
        let outer = nm.mk_node(Kind::BvExtract, &[inner], &[3, 1]);
        let expected = nm.mk_node(Kind::BvExtract, &[x], &[5, 3]);
        assert_eq!(rw.rewrite(&mut nm, outer), expected);
    }

    #[test]
    fn test_extract_over_concat() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let y = nm.mk_const(bv8, None);
        let cat = nm.mk_node(Kind::BvConcat, &[x, y], &[]);
        // Bits 3..0 live entirely in y.
        let ext = nm.mk_node(Kind::BvExtract, &[cat], &[3, 0]);
        let expected = nm.mk_node(Kind::BvExtract, &[y], &[3, 0]);
        assert_eq!(rw.rewrite(&mut nm, ext), expected);
        // Bits 15..8 are exactly x.
        let ext = nm.mk_node(Kind::BvExtract, &[cat], &[15, 8]);
        assert_eq!(rw.rewrite(&mut nm, ext), x);
    }

    #[test]
    fn test_shift_rules() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let zero = nm.mk_bv_value(BvValue::zero(8));
        let eight = nm.mk_bv_value(BvValue::from_u64(8, 8));
        let shl = nm.mk_node(Kind::BvShl, &[x, zero], &[]);
        assert_eq!(rw.rewrite(&mut nm, shl), x);
        let shl = nm.mk_node(Kind::BvShl, &[x, eight], &[]);
        assert_eq!(rw.rewrite(&mut nm, shl), zero);
        // ashr keeps its sign dependence
        let ashr = nm.mk_node(Kind::BvAshr, &[x, eight], &[]);
        assert_eq!(rw.rewrite(&mut nm, ashr), ashr);
    }

    #[test]
    fn test_concat_value_merging() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let a = nm.mk_bv_value(BvValue::from_u64(4, 0b1010));
        let b = nm.mk_bv_value(BvValue::from_u64(4, 0b0101));
        let cat = nm.mk_node(Kind::BvConcat, &[x, a, b], &[]);
        let r = rw.rewrite(&mut nm, cat);
        let merged = nm.mk_bv_value(BvValue::from_u64(8, 0b1010_0101));
        assert_eq!(r, nm.mk_node(Kind::BvConcat, &[x, merged], &[]));
    }

    #[test]
    fn test_rotate_and_extend() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let rot = nm.mk_node(Kind::BvRoli, &[x], &[8]);
        assert_eq!(rw.rewrite(&mut nm, rot), x);
        let rot = nm.mk_node(Kind::BvRoli, &[x], &[9]);
        let expected = nm.mk_node(Kind::BvRoli, &[x], &[1]);
        assert_eq!(rw.rewrite(&mut nm, rot), expected);
        let se = nm.mk_node(Kind::BvSignExtend, &[x], &[0]);
        assert_eq!(rw.rewrite(&mut nm, se), x);
        let rep = nm.mk_node(Kind::BvRepeat, &[x], &[1]);
        assert_eq!(rw.rewrite(&mut nm, rep), x);
    }
}
