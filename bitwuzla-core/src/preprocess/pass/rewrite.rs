//! Pass: rewrite every assertion to its normal form.

use crate::assertion::AssertionView;
use crate::node::NodeManager;
use crate::rewrite::Rewriter;

pub fn apply(nm: &mut NodeManager, rewriter: &mut Rewriter, assertions: &mut AssertionView) {
    for i in 0..assertions.len() {
        let a = assertions.get(i);
        let rewritten = rewriter.rewrite(nm, a);
        assertions.replace(i, rewritten);
    }
}
