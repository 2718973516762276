//! Pass: collapse conjunctions containing a term and its negation to
//! `false`.
//!
//! The rewriter catches `x /\ not x` among direct operands; this pass
//! looks through nested conjunctions.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::assertion::AssertionView;
use crate::node::{utils, Kind, Node, NodeManager};

/// Collect the conjuncts of an `and` tree, looking through nested `and`s.
fn flatten(nm: &NodeManager, node: Node, out: &mut FxHashSet<Node>) {
    let mut stack = vec![node];
    while let Some(cur) = stack.pop() {
        for &c in nm.children(cur) {
            if nm.kind(c) == Kind::And {
                stack.push(c);
            } else {
                out.insert(c);
            }
        }
    }
}

pub fn apply(nm: &mut NodeManager, assertions: &mut AssertionView) {
    for i in 0..assertions.len() {
        let a = assertions.get(i);
        let mut contradicting: FxHashMap<Node, Node> = FxHashMap::default();
        for node in utils::post_order(nm, &[a]) {
            if nm.kind(node) != Kind::And {
                continue;
            }
            let mut conjuncts = FxHashSet::default();
            flatten(nm, node, &mut conjuncts);
            let found = conjuncts.iter().any(|&c| {
                nm.kind(c) == Kind::Not && conjuncts.contains(&nm.child(c, 0))
            });
            if found {
                contradicting.insert(node, nm.mk_false());
            }
        }
        if !contradicting.is_empty() {
            let replaced = utils::substitute(nm, a, &contradicting);
            assertions.replace(i, replaced);
        }
    }
}
