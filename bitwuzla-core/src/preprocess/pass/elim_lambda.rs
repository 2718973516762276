//! Pass: eliminate lambda applications by beta reduction.
//!
//! Every `apply` whose function is a lambda chain is reduced by binding
//! the arguments in order and substituting them into the body; reduction
//! results are cached so nested applications reuse earlier work.

use rustc_hash::FxHashMap;

use crate::assertion::AssertionView;
use crate::node::{utils, Kind, Node, NodeManager};

pub struct PassElimLambda {
    cache: FxHashMap<Node, Node>,
}

impl PassElimLambda {
    pub fn new() -> Self {
        Self {
            cache: FxHashMap::default(),
        }
    }

    pub fn apply(&mut self, nm: &mut NodeManager, assertions: &mut AssertionView) {
        for i in 0..assertions.len() {
            let a = assertions.get(i);
            let reduced = self.process(nm, a);
            assertions.replace(i, reduced);
        }
    }

    /// Beta-reduce all lambda applications in `node`.
    pub fn process(&mut self, nm: &mut NodeManager, node: Node) -> Node {
        if let Some(&r) = self.cache.get(&node) {
            return r;
        }
        let kind = nm.kind(node);
        let rebuilt = if nm.num_children(node) == 0 {
            node
        } else {
            let children = nm.children(node).to_vec();
            let mut changed = false;
            let mut new_children = Vec::with_capacity(children.len());
            for &c in &children {
                let nc = self.process(nm, c);
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
        let result = if nm.kind(rebuilt) == Kind::Apply
            && nm.kind(nm.child(rebuilt, 0)) == Kind::Lambda
        {
            // Unfold the lambda chain and bind the arguments in order.
            let args = nm.children(rebuilt)[1..].to_vec();
            let mut vars = Vec::new();
            let mut body = nm.child(rebuilt, 0);
            while nm.kind(body) == Kind::Lambda {
                vars.push(nm.child(body, 0));
                body = nm.child(body, 1);
            }
            debug_assert_eq!(vars.len(), args.len());
            let map: FxHashMap<Node, Node> = vars.into_iter().zip(args).collect();
            let reduced = utils::substitute(nm, body, &map);
            // Substitution may expose further redexes.
            self.process(nm, reduced)
        } else {
            rebuilt
        };
        self.cache.insert(node, result);
        result
    }
}
