//! Node traversal, substitution and construction helpers.

use rustc_hash::{FxHashMap, FxHashSet};

use bitwuzla_bv::BvValue;
use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};

use crate::node::{Kind, Node, NodeManager};
use crate::sort::{Sort, SortKind};

/// All nodes reachable from `roots` in post-order (children before
/// parents), each node exactly once.
pub fn post_order(nm: &NodeManager, roots: &[Node]) -> Vec<Node> {
    let mut result = Vec::new();
    let mut seen: FxHashSet<Node> = FxHashSet::default();
    // (node, children_expanded)
    let mut stack: Vec<(Node, bool)> = roots.iter().rev().map(|&n| (n, false)).collect();
    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            result.push(node);
            continue;
        }
        if !seen.insert(node) {
            continue;
        }
        stack.push((node, true));
        for &c in nm.children(node).iter().rev() {
            stack.push((c, false));
        }
    }
    result
}

/// Collect all free constants reachable from `roots`.
pub fn collect_consts(nm: &NodeManager, roots: &[Node]) -> Vec<Node> {
    let mut consts = Vec::new();
    let mut seen: FxHashSet<Node> = FxHashSet::default();
    let mut stack: Vec<Node> = roots.to_vec();
    while let Some(node) = stack.pop() {
        if !seen.insert(node) {
            continue;
        }
        if nm.is_const(node) {
            consts.push(node);
        }
        stack.extend_from_slice(nm.children(node));
    }
    consts
}

/// True iff `what` occurs anywhere in `node`.
pub fn occurs(nm: &NodeManager, node: Node, what: Node) -> bool {
    let mut seen: FxHashSet<Node> = FxHashSet::default();
    let mut stack = vec![node];
    while let Some(cur) = stack.pop() {
        if cur == what {
            return true;
        }
        if seen.insert(cur) {
            stack.extend_from_slice(nm.children(cur));
        }
    }
    false
}

/// The set of variables occurring free in `node` (not bound by an
/// enclosing binder within `node`).
pub fn free_variables(nm: &NodeManager, node: Node) -> FxHashSet<Node> {
    let mut free: FxHashMap<Node, FxHashSet<Node>> = FxHashMap::default();
    for cur in post_order(nm, &[node]) {
        let mut vars: FxHashSet<Node> = FxHashSet::default();
        if nm.is_var(cur) {
            vars.insert(cur);
        }
        for &c in nm.children(cur) {
            vars.extend(free[&c].iter().copied());
        }
        if nm.kind(cur).is_binder() {
            vars.remove(&nm.child(cur, 0));
        }
        free.insert(cur, vars);
    }
    free.remove(&node).unwrap_or_default()
}

/// Bottom-up substitution of nodes by the given map.
///
/// Occurrences below a binder that rebinds a map key are left untouched
/// (shadowing); when a substituted value would capture a bound variable the
/// binder variable is renamed first.
pub fn substitute(nm: &mut NodeManager, node: Node, map: &FxHashMap<Node, Node>) -> Node {
    if map.is_empty() {
        return node;
    }
    let mut cache = FxHashMap::default();
    subst_rec(nm, node, map, &mut cache)
}

fn subst_rec(
    nm: &mut NodeManager,
    node: Node,
    map: &FxHashMap<Node, Node>,
    cache: &mut FxHashMap<Node, Node>,
) -> Node {
    if let Some(&r) = cache.get(&node) {
        return r;
    }
    if let Some(&r) = map.get(&node) {
        cache.insert(node, r);
        return r;
    }
    let kind = nm.kind(node);
    let res = if kind.is_binder() {
        let var = nm.child(node, 0);
        let body = nm.child(node, 1);
        let mut inner = map.clone();
        inner.remove(&var);
        if inner.is_empty() {
            node
        } else {
            let mut bound = var;
            if inner.values().any(|&v| occurs(nm, v, var)) {
                let sym = nm.symbol(var).map(str::to_owned);
                bound = nm.mk_var(nm.sort(var), sym.as_deref());
                inner.insert(var, bound);
            }
            // The cache is scope-bound: results under this binder are not
            // valid outside of it.
            let mut inner_cache = FxHashMap::default();
            let new_body = subst_rec(nm, body, &inner, &mut inner_cache);
            if bound == var && new_body == body {
                node
            } else {
                nm.mk_node(kind, &[bound, new_body], &[])
            }
        }
    } else if nm.num_children(node) == 0 {
        node
    } else {
        let children = nm.children(node).to_vec();
        let mut changed = false;
        let mut new_children = Vec::with_capacity(children.len());
        for &c in &children {
            let nc = subst_rec(nm, c, map, cache);
            changed |= nc != c;
            new_children.push(nc);
        }
        if changed {
            let indices = nm.indices(node).to_vec();
            nm.mk_node(kind, &new_children, &indices)
        } else {
            node
        }
    };
    cache.insert(node, res);
    res
}

/// Build an n-ary node, collapsing the singleton case.
pub fn mk_nary(nm: &mut NodeManager, kind: Kind, operands: &[Node]) -> Node {
    assert!(!operands.is_empty());
    if operands.len() == 1 {
        operands[0]
    } else {
        nm.mk_node(kind, operands, &[])
    }
}

/// A default value of the given sort, used to complete models for
/// unconstrained terms.
pub fn mk_default_value(nm: &mut NodeManager, sort: Sort) -> Node {
    match nm.sorts.kind(sort).clone() {
        SortKind::Bool => nm.mk_false(),
        SortKind::Bv(w) => nm.mk_bv_value(BvValue::zero(w)),
        SortKind::Fp(e, s) => nm.mk_fp_value(FloatingPoint::zero(FpFormat::new(e, s), false)),
        SortKind::Rm => nm.mk_rm_value(RoundingMode::Rne),
        SortKind::Array(_, element) => {
            let def = mk_default_value(nm, element);
            nm.mk_const_array(sort, def).unwrap()
        }
        SortKind::Fun(types) => {
            let codomain = *types.last().unwrap();
            let body = mk_default_value(nm, codomain);
            let mut res = body;
            for &dom in types[..types.len() - 1].iter().rev() {
                let var = nm.mk_var(dom, None);
                res = nm.mk_node(Kind::Lambda, &[var, res], &[]);
            }
            res
        }
        SortKind::Uninterpreted(_) => nm.mk_const(sort, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_order_children_first() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let y = nm.mk_const(bv8, None);
        let add = nm.mk_node(Kind::BvAdd, &[x, y], &[]);
        let mul = nm.mk_node(Kind::BvMul, &[add, add], &[]);
        let order = post_order(&nm, &[mul]);
        assert_eq!(order.len(), 4); // shared add visited once
        let pos =
            |n: Node| order.iter().position(|&m| m == n).unwrap();
        assert!(pos(x) < pos(add));
        assert!(pos(y) < pos(add));
        assert!(pos(add) < pos(mul));
    }

    #[test]
    fn test_substitute_simple() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        let y = nm.mk_const(bv8, Some("y"));
        let add = nm.mk_node(Kind::BvAdd, &[x, x], &[]);
        let mut map = FxHashMap::default();
        map.insert(x, y);
        let subst = substitute(&mut nm, add, &map);
        assert_eq!(subst, nm.mk_node(Kind::BvAdd, &[y, y], &[]));
        // An untouched term comes back unchanged (same id).
        let z = nm.mk_const(bv8, None);
        assert_eq!(substitute(&mut nm, z, &map), z);
    }

    #[test]
    fn test_substitute_respects_shadowing() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let v = nm.mk_var(bv8, Some("v"));
        let body = nm.mk_node(Kind::BvNeg, &[v], &[]);
        let lam = nm.mk_node(Kind::Lambda, &[v, body], &[]);
        let y = nm.mk_const(bv8, None);
        let mut map = FxHashMap::default();
        map.insert(v, y);
        // The bound occurrence is shadowed; the lambda is unchanged.
        assert_eq!(substitute(&mut nm, lam, &map), lam);
    }

    #[test]
    fn test_substitute_avoids_capture() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let v = nm.mk_var(bv8, Some("v"));
        let x = nm.mk_const(bv8, Some("x"));
        let body = nm.mk_node(Kind::BvAdd, &[v, x], &[]);
        let lam = nm.mk_node(Kind::Lambda, &[v, body], &[]);
        // Substituting x by v would capture; the binder must be renamed.
        let mut map = FxHashMap::default();
        map.insert(x, v);
        let subst = substitute(&mut nm, lam, &map);
        assert_ne!(subst, lam);
        let new_var = nm.child(subst, 0);
        assert_ne!(new_var, v);
        let new_body = nm.child(subst, 1);
        assert_eq!(nm.children(new_body), &[new_var, v]);
    }

    #[test]
    fn test_free_variables() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let v = nm.mk_var(bv8, None);
        let w = nm.mk_var(bv8, None);
        let body = nm.mk_node(Kind::BvAdd, &[v, w], &[]);
        let free = free_variables(&nm, body);
        assert_eq!(free.len(), 2);
        let lam = nm.mk_node(Kind::Lambda, &[v, body], &[]);
        let free = free_variables(&nm, lam);
        assert_eq!(free.into_iter().collect::<Vec<_>>(), vec![w]);
    }

    #[test]
    fn test_collect_consts() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let y = nm.mk_const(bv8, None);
        let five = nm.mk_bv_value(BvValue::from_u64(8, 5));
        let t = nm.mk_node(Kind::BvAdd, &[x, five], &[]);
        let t = nm.mk_node(Kind::BvMul, &[t, y], &[]);
        let mut consts = collect_consts(&nm, &[t]);
        consts.sort();
        assert_eq!(consts, vec![x, y]);
    }

    #[test]
    fn test_default_values() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let def = mk_default_value(&mut nm, bv8);
        assert_eq!(nm.bv_value(def), Some(&BvValue::zero(8)));
        let b = nm.sorts.mk_bool();
        let arr_sort = nm.sorts.mk_array(bv8, b);
        let arr = mk_default_value(&mut nm, arr_sort);
        assert_eq!(nm.kind(arr), Kind::ConstArray);
        let fun_sort = nm.sorts.mk_fun(&[bv8], b).unwrap();
        let lam = mk_default_value(&mut nm, fun_sort);
        assert_eq!(nm.kind(lam), Kind::Lambda);
    }
}
