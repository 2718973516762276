//! Pass: eliminate constants of uninterpreted sort.
//!
//! Constants of an uninterpreted sort carry no structure beyond equality,
//! so they are encoded as fresh bit-vector constants of a fixed width wide
//! enough for any distinctness constraint the input can express. The pass
//! backs off when uninterpreted sorts flow into function or array sorts or
//! are quantified over.

use rustc_hash::FxHashMap;

use crate::assertion::AssertionView;
use crate::node::{utils, Kind, Node, NodeManager};
use crate::sort::SortKind;

/// Encoded domain width; distinctness of up to `2^32` constants is
/// expressible, far beyond any practical input.
const DOMAIN_BITS: u64 = 32;

pub struct PassElimUninterpreted {
    map: FxHashMap<Node, Node>,
    journal: Vec<(u64, Node)>,
}

impl PassElimUninterpreted {
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            journal: Vec::new(),
        }
    }

    /// Drop encodings recorded above `level`.
    pub fn rewind_to(&mut self, level: u64) {
        while let Some(&(l, key)) = self.journal.last() {
            if l <= level {
                break;
            }
            self.map.remove(&key);
            self.journal.pop();
        }
    }

    /// Apply the accumulated encoding to a single term.
    pub fn process(&self, nm: &mut NodeManager, term: Node) -> Node {
        utils::substitute(nm, term, &self.map)
    }

    pub fn apply(&mut self, nm: &mut NodeManager, assertions: &mut AssertionView) {
        let level = assertions.level();
        let roots: Vec<Node> = (0..assertions.len()).map(|i| assertions.get(i)).collect();
        let mut candidates = Vec::new();
        for node in utils::post_order(nm, &roots) {
            let sort = nm.sort(node);
            match nm.sorts.kind(sort) {
                SortKind::Uninterpreted(_) => {
                    if nm.is_const(node) {
                        if !self.map.contains_key(&node) {
                            candidates.push(node);
                        }
                    } else if nm.kind(node) != Kind::Ite {
                        // Uninterpreted terms built by functions or binders
                        // are beyond this encoding.
                        return;
                    }
                }
                SortKind::Fun(types) => {
                    let escapes = types
                        .iter()
                        .any(|&t| nm.sorts.is_uninterpreted(t));
                    if escapes {
                        return;
                    }
                }
                SortKind::Array(index, element) => {
                    if nm.sorts.is_uninterpreted(*index) || nm.sorts.is_uninterpreted(*element) {
                        return;
                    }
                }
                _ => {}
            }
        }
        if candidates.is_empty() {
            return;
        }
        let bv = nm.sorts.mk_bv(DOMAIN_BITS).unwrap();
        for c in candidates {
            let symbol = nm.symbol(c).map(str::to_owned);
            let fresh = nm.mk_const(bv, symbol.as_deref());
            self.map.insert(c, fresh);
            self.journal.push((level, c));
        }
        for i in 0..assertions.len() {
            let a = assertions.get(i);
            let encoded = utils::substitute(nm, a, &self.map);
            assertions.replace(i, encoded);
        }
    }
}
