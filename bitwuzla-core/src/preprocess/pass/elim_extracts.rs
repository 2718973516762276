//! Pass: eliminate extracts over free constants.
//!
//! A constant that is only ever read through `extract` operations is cut
//! at every extract boundary into fresh slice constants; each extract then
//! becomes a concatenation of whole slices. This removes the extract
//! layer above such constants so the bit-blaster sees independent inputs.
//! The constant itself is remembered as the concatenation of all its
//! slices so model queries still evaluate it.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::assertion::AssertionView;
use crate::node::{utils, Kind, Node, NodeManager};

pub struct PassElimExtracts {
    map: FxHashMap<Node, Node>,
    journal: Vec<(u64, Node)>,
}

impl PassElimExtracts {
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            journal: Vec::new(),
        }
    }

    /// Drop replacements recorded above `level`.
    pub fn rewind_to(&mut self, level: u64) {
        while let Some(&(l, key)) = self.journal.last() {
            if l <= level {
                break;
            }
            self.map.remove(&key);
            self.journal.pop();
        }
    }

    /// Apply the accumulated replacement map to a single term.
    pub fn process(&self, nm: &mut NodeManager, term: Node) -> Node {
        utils::substitute(nm, term, &self.map)
    }

    pub fn apply(&mut self, nm: &mut NodeManager, assertions: &mut AssertionView) {
        let level = assertions.level();
        let roots: Vec<Node> = (0..assertions.len()).map(|i| assertions.get(i)).collect();
        // Collect extract ranges per constant and constants that occur
        // outside of an extract (those must keep their identity).
        let mut ranges: FxHashMap<Node, Vec<(u64, u64)>> = FxHashMap::default();
        let mut direct: FxHashSet<Node> = FxHashSet::default();
        for node in utils::post_order(nm, &roots) {
            if nm.kind(node) == Kind::BvExtract && nm.is_const(nm.child(node, 0)) {
                let child = nm.child(node, 0);
                let (hi, lo) = (nm.indices(node)[0], nm.indices(node)[1]);
                ranges.entry(child).or_default().push((hi, lo));
                continue;
            }
            for &c in nm.children(node) {
                if nm.is_const(c) {
                    direct.insert(c);
                }
            }
        }
        ranges.retain(|c, _| !direct.contains(c) && !self.map.contains_key(c));
        if ranges.is_empty() {
            return;
        }

        for (constant, extracts) in ranges {
            let width = nm.bv_width(constant);
            // Cut points between slices, ascending.
            let mut cuts: Vec<u64> = vec![0, width];
            for &(hi, lo) in &extracts {
                cuts.push(lo);
                cuts.push(hi + 1);
            }
            cuts.sort_unstable();
            cuts.dedup();
            // One fresh constant per slice, indexed by its low bit.
            let mut slices: FxHashMap<u64, (Node, u64)> = FxHashMap::default();
            for pair in cuts.windows(2) {
                let (lo, hi) = (pair[0], pair[1] - 1);
                let sort = nm.sorts.mk_bv(hi - lo + 1).unwrap();
                let slice = nm.mk_const(sort, None);
                slices.insert(lo, (slice, hi));
            }
            let concat_slices = |nm: &mut NodeManager, lo: u64, hi: u64| {
                let mut parts = Vec::new();
                let mut at = lo;
                while at <= hi {
                    let (slice, slice_hi) = slices[&at];
                    parts.push(slice);
                    at = slice_hi + 1;
                }
                parts.reverse();
                utils::mk_nary(nm, Kind::BvConcat, &parts)
            };
            for (hi, lo) in extracts {
                let extract = nm.mk_node(Kind::BvExtract, &[constant], &[hi, lo]);
                let replacement = concat_slices(nm, lo, hi);
                self.map.insert(extract, replacement);
                self.journal.push((level, extract));
            }
            // The constant reconstructs from all slices, for model values.
            let full = concat_slices(nm, 0, width - 1);
            self.map.insert(constant, full);
            self.journal.push((level, constant));
        }
        for i in 0..assertions.len() {
            let a = assertions.get(i);
            let replaced = utils::substitute(nm, a, &self.map);
            assertions.replace(i, replaced);
        }
    }
}
