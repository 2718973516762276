//! Pass: substitute asserted constraints embedded in other assertions by
//! `true`.
//!
//! Since every model of the assertion set satisfies each asserted formula,
//! an occurrence of one assertion inside another can be replaced by `true`
//! without changing satisfiability.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::assertion::AssertionView;
use crate::node::{utils, NodeManager};
use crate::rewrite::Rewriter;

pub fn apply(nm: &mut NodeManager, rewriter: &mut Rewriter, assertions: &mut AssertionView) {
    let t = nm.mk_true();
    let asserted: FxHashSet<_> = (0..assertions.len()).map(|i| assertions.get(i)).collect();
    if asserted.len() < 2 {
        return;
    }
    for i in 0..assertions.len() {
        let a = assertions.get(i);
        // Every other assertion occurring strictly below `a` becomes true.
        let map: FxHashMap<_, _> = asserted
            .iter()
            .filter(|&&c| c != a)
            .map(|&c| (c, t))
            .collect();
        let substituted = utils::substitute(nm, a, &map);
        if substituted != a {
            let rewritten = rewriter.rewrite(nm, substituted);
            assertions.replace(i, rewritten);
        }
    }
}
