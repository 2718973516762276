//! Normalising term rewriting.
//!
//! The rewriter applies local simplification rules per node kind, cached by
//! input node. Because every rule's output has rewritten children before
//! rules are applied to the combination, a single top-down pass converges;
//! rewriting is idempotent at the top level.
//!
//! Rule levels:
//! - level 0: identity, no rewriting
//! - level 1: constant folding, idempotence, identity and absorption
//!   elements, trivial ite collapse
//! - level 2: local normalisation on top (commutative operand sorting,
//!   extract/concat distribution, comparison normalisation)

mod bv;
mod core;

use rustc_hash::FxHashMap;

use crate::eval::eval_node;
use crate::node::{Kind, Node, NodeManager, Value as NodeValue};

/// The term rewriter. Owns its cache; safe to reuse across calls since
/// nodes are immutable and rules are deterministic.
pub struct Rewriter {
    level: u64,
    cache: FxHashMap<Node, Node>,
}

impl Rewriter {
    /// Create a rewriter operating at the given level (0..=2).
    pub fn new(level: u64) -> Self {
        debug_assert!(level <= 2);
        Self {
            level,
            cache: FxHashMap::default(),
        }
    }

    /// The configured rewrite level.
    pub fn level(&self) -> u64 {
        self.level
    }

    /// Drop all cached results.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Rewrite a node to its normal form.
    pub fn rewrite(&mut self, nm: &mut NodeManager, node: Node) -> Node {
        if self.level == 0 {
            return node;
        }
        if let Some(&cached) = self.cache.get(&node) {
            return cached;
        }
        let kind = nm.kind(node);
        // Binder bodies are rewritten in place; the bound variable is kept.
        let rebuilt = if kind.is_leaf() {
            node
        } else if kind.is_binder() {
            let var = nm.child(node, 0);
            let body = nm.child(node, 1);
            let new_body = self.rewrite(nm, body);
            if new_body == body {
                node
            } else {
                nm.mk_node(kind, &[var, new_body], &[])
            }
        } else {
            let children = nm.children(node).to_vec();
            let mut changed = false;
            let mut new_children = Vec::with_capacity(children.len());
            for &c in &children {
                let nc = self.rewrite(nm, c);
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
        let applied = self.apply_rules(nm, rebuilt);
        let result = if applied == rebuilt {
            rebuilt
        } else {
            // The rule produced a different node; normalise it in turn.
            self.rewrite(nm, applied)
        };
        self.cache.insert(node, result);
        self.cache.insert(result, result);
        result
    }

    /// One rule application step on a node whose children are already in
    /// normal form.
    fn apply_rules(&mut self, nm: &mut NodeManager, node: Node) -> Node {
        let kind = nm.kind(node);
        if kind.is_leaf() || kind.is_binder() {
            return node;
        }
        // Constant folding applies uniformly when every child is a value.
        if nm.children(node).iter().all(|&c| nm.is_value(c)) {
            let values: Vec<NodeValue> = nm
                .children(node)
                .iter()
                .map(|&c| nm.value(c).unwrap().clone())
                .collect();
            let refs: Vec<&NodeValue> = values.iter().collect();
            if let Some(value) = eval_node(kind, &refs, nm.indices(node)) {
                return nm.mk_value(value);
            }
        }

        use Kind::*;
        let node = match kind {
            Not | And | Or | Xor | Implies | Equal | Distinct | Ite => {
                core::rewrite_core(self, nm, node)
            }
            Select => core::rewrite_select(nm, node),
            BvNot | BvNeg | BvAdd | BvMul | BvAnd | BvOr | BvXor | BvSub | BvUdiv | BvUrem
            | BvShl | BvShr | BvAshr | BvComp | BvUlt | BvUle | BvUgt | BvUge | BvSlt | BvSle
            | BvSgt | BvSge | BvExtract | BvRepeat | BvRoli | BvRori | BvSignExtend
            | BvZeroExtend | BvConcat => bv::rewrite_bv(self, nm, node),
            FpAbs | FpNeg => core::rewrite_fp_sign(nm, node),
            _ => node,
        };

        // Commutative operand sorting is the backbone of level-2
        // normalisation: syntactically equal modulo ordering becomes
        // syntactically equal.
        if self.level >= 2 {
            let kind = nm.kind(node);
            if kind.is_commutative() {
                let mut children = nm.children(node).to_vec();
                if children.windows(2).any(|w| w[0] > w[1]) {
                    children.sort();
                    let indices = nm.indices(node).to_vec();
                    return nm.mk_node(kind, &children, &indices);
                }
            }
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitwuzla_bv::BvValue;

    fn setup() -> (NodeManager, Rewriter) {
        (NodeManager::new(), Rewriter::new(2))
    }

    #[test]
    fn test_level0_is_identity() {
        let (mut nm, _) = setup();
        let mut rw = Rewriter::new(0);
        let t = nm.mk_true();
        let f = nm.mk_false();
        let and = nm.mk_node(Kind::And, &[t, f], &[]);
        assert_eq!(rw.rewrite(&mut nm, and), and);
    }

    #[test]
    fn test_constant_folding() {
        let (mut nm, mut rw) = setup();
        let a = nm.mk_bv_value(BvValue::from_u64(8, 3));
        let b = nm.mk_bv_value(BvValue::from_u64(8, 4));
        let add = nm.mk_node(Kind::BvAdd, &[a, b], &[]);
        let r = rw.rewrite(&mut nm, add);
        assert_eq!(nm.bv_value(r), Some(&BvValue::from_u64(8, 7)));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        let y = nm.mk_const(bv8, Some("y"));
        let zero = nm.mk_bv_value(BvValue::zero(8));
        let t1 = nm.mk_node(Kind::BvAdd, &[x, zero], &[]);
        let t2 = nm.mk_node(Kind::BvMul, &[t1, y], &[]);
        let ugt = nm.mk_node(Kind::BvUgt, &[t2, x], &[]);
        let r1 = rw.rewrite(&mut nm, ugt);
        let r2 = rw.rewrite(&mut nm, r1);
        assert_eq!(r1, r2);
    }

    #[test]
    fn test_nested_folding() {
        let (mut nm, mut rw) = setup();
        // not (and true (or false true)) -> false
        let t = nm.mk_true();
        let f = nm.mk_false();
        let or = nm.mk_node(Kind::Or, &[f, t], &[]);
        let and = nm.mk_node(Kind::And, &[t, or], &[]);
        let not = nm.mk_not(and);
        assert_eq!(rw.rewrite(&mut nm, not), nm.mk_false());
    }

    #[test]
    fn test_commutative_sorting() {
        let (mut nm, mut rw) = setup();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let y = nm.mk_const(bv8, None);
        let a = nm.mk_node(Kind::BvAdd, &[y, x], &[]);
        let b = nm.mk_node(Kind::BvAdd, &[x, y], &[]);
        assert_ne!(a, b);
        assert_eq!(rw.rewrite(&mut nm, a), rw.rewrite(&mut nm, b));
    }

    #[test]
    fn test_sorting_only_at_level2() {
        let mut nm = NodeManager::new();
        let mut rw = Rewriter::new(1);
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, None);
        let y = nm.mk_const(bv8, None);
        let a = nm.mk_node(Kind::BvAdd, &[y, x], &[]);
        assert_eq!(rw.rewrite(&mut nm, a), a);
    }
}
