//! Rewrite rules for Boolean structure, equality, ite, arrays and
//! floating-point sign operations.

use crate::node::{Kind, Node, NodeManager};
use crate::rewrite::Rewriter;

pub(super) fn rewrite_core(rw: &mut Rewriter, nm: &mut NodeManager, node: Node) -> Node {
    match nm.kind(node) {
        Kind::Not => rewrite_not(nm, node),
        Kind::And => rewrite_and_or(nm, node, true),
        Kind::Or => rewrite_and_or(nm, node, false),
        Kind::Xor => rewrite_xor(nm, node),
        Kind::Implies => rewrite_implies(nm, node),
        Kind::Equal => rewrite_equal(nm, node),
        Kind::Distinct => rewrite_distinct(rw, nm, node),
        Kind::Ite => rewrite_ite(nm, node),
        _ => node,
    }
}

fn rewrite_not(nm: &mut NodeManager, node: Node) -> Node {
    let child = nm.child(node, 0);
    // not (not a) -> a
    if nm.kind(child) == Kind::Not {
        return nm.child(child, 0);
    }
    node
}

/// `and` and `or` share their structure through duality.
fn rewrite_and_or(nm: &mut NodeManager, node: Node, is_and: bool) -> Node {
    let absorbing = if is_and {
        nm.mk_false()
    } else {
        nm.mk_true()
    };
    let neutral = if is_and { nm.mk_true() } else { nm.mk_false() };
    let mut operands: Vec<Node> = Vec::with_capacity(nm.num_children(node));
    for &c in nm.children(node) {
        if c == absorbing {
            return absorbing;
        }
        if c == neutral || operands.contains(&c) {
            continue;
        }
        operands.push(c);
    }
    // a /\ not a -> false, a \/ not a -> true
    for &c in &operands {
        if nm.kind(c) == Kind::Not && operands.contains(&nm.child(c, 0)) {
            return absorbing;
        }
    }
    if operands.len() == nm.num_children(node) {
        return node;
    }
    if is_and {
        nm.mk_and(&operands)
    } else {
        nm.mk_or(&operands)
    }
}

fn rewrite_xor(nm: &mut NodeManager, node: Node) -> Node {
    let f = nm.mk_false();
    let t = nm.mk_true();
    let mut negate = false;
    let mut operands: Vec<Node> = Vec::new();
    for &c in nm.children(node) {
        if c == f {
            continue;
        }
        if c == t {
            negate = !negate;
            continue;
        }
        // Pairs of identical operands cancel.
        if let Some(pos) = operands.iter().position(|&o| o == c) {
            operands.remove(pos);
        } else {
            operands.push(c);
        }
    }
    if operands.len() == nm.num_children(node) && !negate {
        return node;
    }
    let mut res = match operands.len() {
        0 => nm.mk_false(),
        1 => operands[0],
        _ => nm.mk_node(Kind::Xor, &operands, &[]),
    };
    if negate {
        res = nm.mk_not(res);
    }
    res
}

fn rewrite_implies(nm: &mut NodeManager, node: Node) -> Node {
    let (a, b) = (nm.child(node, 0), nm.child(node, 1));
    let t = nm.mk_true();
    let f = nm.mk_false();
    if a == f || b == t || a == b {
        return t;
    }
    if a == t {
        return b;
    }
    if b == f {
        return nm.mk_not(a);
    }
    node
}

fn rewrite_equal(nm: &mut NodeManager, node: Node) -> Node {
    let (a, b) = (nm.child(node, 0), nm.child(node, 1));
    if a == b {
        return nm.mk_true();
    }
    // Two distinct values can never be equal.
    if nm.is_value(a) && nm.is_value(b) {
        return nm.mk_false();
    }
    if nm.sorts.is_bool(nm.sort(a)) {
        let t = nm.mk_true();
        let f = nm.mk_false();
        for (val, other) in [(a, b), (b, a)] {
            if val == t {
                return other;
            }
            if val == f {
                return nm.mk_not(other);
            }
        }
        // (= a (not a)) -> false
        if nm.kind(a) == Kind::Not && nm.child(a, 0) == b {
            return f;
        }
        if nm.kind(b) == Kind::Not && nm.child(b, 0) == a {
            return f;
        }
    }
    node
}

/// `distinct` is eliminated into pairwise disequalities.
fn rewrite_distinct(rw: &mut Rewriter, nm: &mut NodeManager, node: Node) -> Node {
    let children = nm.children(node).to_vec();
    let mut conjuncts = Vec::new();
    for i in 0..children.len() {
        for j in i + 1..children.len() {
            let eq = nm.mk_eq(children[i], children[j]);
            let eq = rw.rewrite(nm, eq);
            conjuncts.push(nm.mk_not(eq));
        }
    }
    nm.mk_and(&conjuncts)
}

fn rewrite_ite(nm: &mut NodeManager, node: Node) -> Node {
    let (c, t, e) = (nm.child(node, 0), nm.child(node, 1), nm.child(node, 2));
    if t == e {
        return t;
    }
    if c == nm.mk_true() {
        return t;
    }
    if c == nm.mk_false() {
        return e;
    }
    // ite (not c) a b -> ite c b a
    if nm.kind(c) == Kind::Not {
        let inner = nm.child(c, 0);
        return nm.mk_ite(inner, e, t);
    }
    if nm.sorts.is_bool(nm.sort(t)) {
        // ite c true false -> c, ite c false true -> not c
        if t == nm.mk_true() && e == nm.mk_false() {
            return c;
        }
        if t == nm.mk_false() && e == nm.mk_true() {
            return nm.mk_not(c);
        }
    }
    node
}

/// `select` over `store` chains and constant arrays.
pub(super) fn rewrite_select(nm: &mut NodeManager, node: Node) -> Node {
    let (mut array, index) = (nm.child(node, 0), nm.child(node, 1));
    loop {
        match nm.kind(array) {
            Kind::Store => {
                let store_index = nm.child(array, 1);
                if store_index == index {
                    // select (store a i v) i -> v
                    return nm.child(array, 2);
                }
                if nm.is_value(store_index) && nm.is_value(index) {
                    // Distinct value indices cannot alias; skip the store.
                    array = nm.child(array, 0);
                    continue;
                }
                break;
            }
            Kind::ConstArray => return nm.child(array, 0),
            _ => break,
        }
    }
    if array == nm.child(node, 0) {
        node
    } else {
        nm.mk_node(Kind::Select, &[array, index], &[])
    }
}

/// Sign-operation chains on floating-point terms.
pub(super) fn rewrite_fp_sign(nm: &mut NodeManager, node: Node) -> Node {
    let child = nm.child(node, 0);
    match (nm.kind(node), nm.kind(child)) {
        // fp.neg (fp.neg a) -> a
        (Kind::FpNeg, Kind::FpNeg) => nm.child(child, 0),
        // fp.abs (fp.abs a) -> fp.abs a
        (Kind::FpAbs, Kind::FpAbs) => child,
        // fp.abs (fp.neg a) -> fp.abs a
        (Kind::FpAbs, Kind::FpNeg) => {
            let inner = nm.child(child, 0);
            nm.mk_node(Kind::FpAbs, &[inner], &[])
        }
        _ => node,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::Rewriter;
    use bitwuzla_bv::BvValue;

    fn setup() -> (NodeManager, Rewriter) {
        (NodeManager::new(), Rewriter::new(2))
    }

    #[test]
    fn test_double_negation() {
        let (mut nm, mut rw) = setup();
        let b = nm.sorts.mk_bool();
        let p = nm.mk_const(b, None);
        let nn = {
            let n = nm.mk_not(p);
            nm.mk_not(n)
        };
        assert_eq!(rw.rewrite(&mut nm, nn), p);
    }

    #[test]
    fn test_and_contradiction() {
        let (mut nm, mut rw) = setup();
        let b = nm.sorts.mk_bool();
        let p = nm.mk_const(b, None);
        let np = nm.mk_not(p);
        let and = nm.mk_node(Kind::And, &[p, np], &[]);
        assert_eq!(rw.rewrite(&mut nm, and), nm.mk_false());
        let or = nm.mk_node(Kind::Or, &[p, np], &[]);
        assert_eq!(rw.rewrite(&mut nm, or), nm.mk_true());
    }

    #[test]
    fn test_and_identity_and_idempotence() {
        let (mut nm, mut rw) = setup();
        let b = nm.sorts.mk_bool();
        let p = nm.mk_const(b, None);
        let q = nm.mk_const(b, None);
        let t = nm.mk_true();
        let and = nm.mk_node(Kind::And, &[p, t, q, p], &[]);
        let r = rw.rewrite(&mut nm, and);
        assert_eq!(r, nm.mk_node(Kind::And, &[p, q], &[]));
    }

    #[test]
    fn test_xor_cancellation() {
        let (mut nm, mut rw) = setup();
        let b = nm.sorts.mk_bool();
        let p = nm.mk_const(b, None);
        let q = nm.mk_const(b, None);
        let xor = nm.mk_node(Kind::Xor, &[p, q, p], &[]);
        assert_eq!(rw.rewrite(&mut nm, xor), q);
        let t = nm.mk_true();
        let xor = nm.mk_node(Kind::Xor, &[p, t], &[]);
        let r = rw.rewrite(&mut nm, xor);
        assert_eq!(r, nm.mk_not(p));
    }

    #[test]
    fn test_equal_rules() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let eq = nm.mk_eq(x, x);
        assert_eq!(rw.rewrite(&mut nm, eq), nm.mk_true());
        let v1 = nm.mk_bv_value(BvValue::from_u64(8, 1));
        let v2 = nm.mk_bv_value(BvValue::from_u64(8, 2));
        let eq = nm.mk_eq(v1, v2);
        assert_eq!(rw.rewrite(&mut nm, eq), nm.mk_false());
        let b = nm.sorts.mk_bool();
        let p = nm.mk_const(b, None);
        let t = nm.mk_true();
        let eq = nm.mk_eq(p, t);
        assert_eq!(rw.rewrite(&mut nm, eq), p);
    }

    #[test]
    fn test_distinct_elimination() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let y = nm.mk_const(bv8, None);
        let d = nm.mk_node(Kind::Distinct, &[x, y], &[]);
        let r = rw.rewrite(&mut nm, d);
        assert_eq!(nm.kind(r), Kind::Not);
        // distinct with a repeated operand is false
        let d = nm.mk_node(Kind::Distinct, &[x, y, x], &[]);
        assert_eq!(rw.rewrite(&mut nm, d), nm.mk_false());
    }

    #[test]
    fn test_ite_rules() {
        let (mut nm, mut rw) = setup();
        let b = nm.sorts.mk_bool();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let c = nm.mk_const(b, None);
        let x = nm.mk_const(bv8, None);
        let y = nm.mk_const(bv8, None);
        let ite = nm.mk_ite(c, x, x);
        assert_eq!(rw.rewrite(&mut nm, ite), x);
        let t = nm.mk_true();
        let ite = nm.mk_ite(t, x, y);
        assert_eq!(rw.rewrite(&mut nm, ite), x);
        let nc = nm.mk_not(c);
        let ite = nm.mk_ite(nc, x, y);
        assert_eq!(rw.rewrite(&mut nm, ite), nm.mk_ite(c, y, x));
        let f = nm.mk_false();
        let ite = nm.mk_ite(c, t, f);
        assert_eq!(rw.rewrite(&mut nm, ite), c);
    }

    #[test]
    fn test_select_over_store() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let arr_sort = nm.sorts.mk_array(bv8, bv8);
        let a = nm.mk_const(arr_sort, None);
        let i = nm.mk_const(bv8, None);
        let v = nm.mk_const(bv8, None);
        let store = nm.mk_node(Kind::Store, &[a, i, v], &[]);
        let sel = nm.mk_node(Kind::Select, &[store, i], &[]);
        assert_eq!(rw.rewrite(&mut nm, sel), v);
        // Distinct value indices skip the store.
        let i1 = nm.mk_bv_value(BvValue::from_u64(8, 1));
        let i2 = nm.mk_bv_value(BvValue::from_u64(8, 2));
        let store = nm.mk_node(Kind::Store, &[a, i1, v], &[]);
        let sel = nm.mk_node(Kind::Select, &[store, i2], &[]);
        let expected = nm.mk_node(Kind::Select, &[a, i2], &[]);
        assert_eq!(rw.rewrite(&mut nm, sel), expected);
    }

    #[test]
    fn test_const_array_select() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let arr_sort = nm.sorts.mk_array(bv8, bv8);
        let v = nm.mk_bv_value(BvValue::from_u64(8, 7));
        let ca = nm.mk_const_array(arr_sort, v).unwrap();
        let i = nm.mk_const(bv8, None);
        let sel = nm.mk_node(Kind::Select, &[ca, i], &[]);
        assert_eq!(rw.rewrite(&mut nm, sel), v);
    }

    #[test]
    fn test_fp_sign_chains() {
        let (mut nm, mut rw) = setup();
        let f32s = nm.sorts.mk_fp(8, 24).unwrap();
        let a = nm.mk_const(f32s, None);
        let negneg = {
            let n = nm.mk_node(Kind::FpNeg, &[a], &[]);
            nm.mk_node(Kind::FpNeg, &[n], &[])
        };
        assert_eq!(rw.rewrite(&mut nm, negneg), a);
        let absneg = {
            let n = nm.mk_node(Kind::FpNeg, &[a], &[]);
            nm.mk_node(Kind::FpAbs, &[n], &[])
        };
        let expected = nm.mk_node(Kind::FpAbs, &[a], &[]);
        assert_eq!(rw.rewrite(&mut nm, absneg), expected);
    }
}
