//! Pass: split top-level conjunctions into individual assertions.

use crate::assertion::AssertionView;
use crate::node::{Kind, NodeManager};

pub fn apply(nm: &mut NodeManager, assertions: &mut AssertionView) {
    let mut i = 0;
    // New assertions appended by the split are themselves visited.
    while i < assertions.len() {
        let a = assertions.get(i);
        if nm.kind(a) == Kind::And {
            let children = nm.children(a).to_vec();
            assertions.replace(i, children[0]);
            for &c in &children[1..] {
                assertions.push_derived(c, i);
            }
        }
        i += 1;
    }
}
