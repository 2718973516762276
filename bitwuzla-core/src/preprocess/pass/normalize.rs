//! Pass: normalise arithmetic by flattening nested sums and products.
//!
//! Nested `bvadd`/`bvmul` chains are merged into a single n-ary operation
//! whose operands the rewriter then orders canonically. In share-aware
//! mode a nested chain is only flattened when it has a single parent, so
//! shared subterms keep their sharing.

use rustc_hash::FxHashMap;

use crate::assertion::AssertionView;
use crate::node::{utils, Kind, Node, NodeManager};
use crate::option::Options;
use crate::rewrite::Rewriter;

pub fn apply(
    nm: &mut NodeManager,
    rewriter: &mut Rewriter,
    options: &Options,
    assertions: &mut AssertionView,
) {
    let roots: Vec<Node> = (0..assertions.len()).map(|i| assertions.get(i)).collect();
    // Parent counts decide which chains may be flattened.
    let mut parents: FxHashMap<Node, u32> = FxHashMap::default();
    for node in utils::post_order(nm, &roots) {
        for &c in nm.children(node) {
            *parents.entry(c).or_insert(0) += 1;
        }
    }
    let share_aware = options.pp_normalize_share_aware;
    let mut cache: FxHashMap<Node, Node> = FxHashMap::default();
    for (i, root) in roots.into_iter().enumerate() {
        let flattened = flatten(nm, root, &parents, share_aware, &mut cache);
        let rewritten = rewriter.rewrite(nm, flattened);
        assertions.replace(i, rewritten);
    }
}

fn flatten(
    nm: &mut NodeManager,
    node: Node,
    parents: &FxHashMap<Node, u32>,
    share_aware: bool,
    cache: &mut FxHashMap<Node, Node>,
) -> Node {
    if let Some(&r) = cache.get(&node) {
        return r;
    }
    let kind = nm.kind(node);
    let children = nm.children(node).to_vec();
    let mut new_children = Vec::with_capacity(children.len());
    let mut changed = false;
    for &c in &children {
        let nc = flatten(nm, c, parents, share_aware, cache);
        changed |= nc != c;
        new_children.push(nc);
    }
    let result = if matches!(kind, Kind::BvAdd | Kind::BvMul) {
        let mut operands = Vec::new();
        let mut merged = false;
        for &c in &new_children {
            let mergeable = nm.kind(c) == kind
                && (!share_aware || parents.get(&c).copied().unwrap_or(0) <= 1);
            if mergeable {
                operands.extend_from_slice(nm.children(c));
                merged = true;
            } else {
                operands.push(c);
            }
        }
        if merged {
            utils::mk_nary(nm, kind, &operands)
        } else if changed {
            nm.mk_node(kind, &new_children, &[])
        } else {
            node
        }
    } else if changed {
        let indices = nm.indices(node).to_vec();
        nm.mk_node(kind, &new_children, &indices)
    } else {
        node
    };
    cache.insert(node, result);
    result
}
