//! Pass: infer substitutions `x = t` from asserted equalities and apply
//! them globally.
//!
//! A constant `x` is substitutable by `t` when `x` does not occur in `t`
//! (after flattening `t` through already accepted substitutions), which
//! keeps the accumulated substitution map acyclic. Boolean assertions `c`
//! and `(not c)` contribute `c = true` / `c = false`.

use rustc_hash::FxHashMap;

use bitwuzla_bv::BvValue;

use crate::assertion::AssertionView;
use crate::node::{utils, Kind, Node, NodeManager};
use crate::option::Options;
use crate::rewrite::Rewriter;

pub struct PassVariableSubstitution {
    /// Accepted substitutions, fully flattened (no key occurs in any
    /// value).
    map: FxHashMap<Node, Node>,
    /// Insertion journal `(level, key)` so popped scopes can be rewound.
    journal: Vec<(u64, Node)>,
}

impl PassVariableSubstitution {
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            journal: Vec::new(),
        }
    }

    /// Drop substitutions recorded above `level`.
    pub fn rewind_to(&mut self, level: u64) {
        while let Some(&(l, key)) = self.journal.last() {
            if l <= level {
                break;
            }
            self.map.remove(&key);
            self.journal.pop();
        }
    }

    /// Apply the accumulated substitution map to a single term.
    pub fn process(&self, nm: &mut NodeManager, term: Node) -> Node {
        utils::substitute(nm, term, &self.map)
    }

    pub fn apply(
        &mut self,
        nm: &mut NodeManager,
        rewriter: &mut Rewriter,
        options: &Options,
        assertions: &mut AssertionView,
    ) {
        let level = assertions.level();
        let mut found_new = false;
        for i in 0..assertions.len() {
            let a = assertions.get(i);
            if let Some((var, term)) = self.extract(nm, options, a) {
                if self.map.contains_key(&var) {
                    continue;
                }
                // Flatten through the existing map, then reject cycles.
                let term = utils::substitute(nm, term, &self.map);
                if utils::occurs(nm, term, var) {
                    continue;
                }
                // Keep the map idempotent: eliminate the new key from all
                // recorded values.
                let single: FxHashMap<Node, Node> =
                    [(var, term)].into_iter().collect();
                let keys: Vec<Node> = self.map.keys().copied().collect();
                for k in keys {
                    let v = self.map[&k];
                    let nv = utils::substitute(nm, v, &single);
                    self.map.insert(k, nv);
                }
                self.map.insert(var, term);
                self.journal.push((level, var));
                found_new = true;
            }
        }
        if !found_new && self.map.is_empty() {
            return;
        }
        for i in 0..assertions.len() {
            let a = assertions.get(i);
            let substituted = utils::substitute(nm, a, &self.map);
            let rewritten = rewriter.rewrite(nm, substituted);
            assertions.replace(i, rewritten);
        }
    }

    /// Extract a candidate substitution from one assertion.
    fn extract(
        &self,
        nm: &mut NodeManager,
        options: &Options,
        assertion: Node,
    ) -> Option<(Node, Node)> {
        match nm.kind(assertion) {
            Kind::Constant => {
                let t = nm.mk_true();
                Some((assertion, t))
            }
            Kind::Not if nm.is_const(nm.child(assertion, 0)) => {
                let f = nm.mk_false();
                Some((nm.child(assertion, 0), f))
            }
            Kind::Equal => {
                let (a, b) = (nm.child(assertion, 0), nm.child(assertion, 1));
                if nm.is_const(a) {
                    return Some((a, b));
                }
                if nm.is_const(b) {
                    return Some((b, a));
                }
                if options.pp_variable_subst_norm_eq {
                    // (bvadd x v) = w  with values v, w  becomes  x = w - v.
                    for (lhs, rhs) in [(a, b), (b, a)] {
                        if let Some(w) = nm.bv_value(rhs).cloned() {
                            if let Some((x, v)) = self.addend_of(nm, lhs) {
                                let value = nm.mk_bv_value(w.sub(&v));
                                return Some((x, value));
                            }
                        }
                    }
                }
                None
            }
            Kind::BvUle if options.pp_variable_subst_norm_bv_ineq => {
                // x <= 0 pins x to zero, ones <= x pins x to ones.
                let (a, b) = (nm.child(assertion, 0), nm.child(assertion, 1));
                if nm.is_const(a) {
                    if let Some(v) = nm.bv_value(b) {
                        if v.is_zero() {
                            let zero = nm.mk_bv_value(BvValue::zero(v.width()));
                            return Some((a, zero));
                        }
                    }
                }
                if nm.is_const(b) {
                    if let Some(v) = nm.bv_value(a) {
                        if v.is_ones() {
                            let ones = nm.mk_bv_value(BvValue::ones(v.width()));
                            return Some((b, ones));
                        }
                    }
                }
                None
            }
            _ => None,
        }
    }

    /// Match `(bvadd x v)` with `x` a constant and `v` a value.
    fn addend_of(&self, nm: &NodeManager, node: Node) -> Option<(Node, BvValue)> {
        if nm.kind(node) != Kind::BvAdd || nm.num_children(node) != 2 {
            return None;
        }
        let (a, b) = (nm.child(node, 0), nm.child(node, 1));
        if nm.is_const(a) {
            if let Some(v) = nm.bv_value(b) {
                return Some((a, v.clone()));
            }
        }
        if nm.is_const(b) {
            if let Some(v) = nm.bv_value(a) {
                return Some((b, v.clone()));
            }
        }
        None
    }
}
