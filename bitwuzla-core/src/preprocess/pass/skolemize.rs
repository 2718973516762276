//! Pass: skolemise top-level existential quantification.
//!
//! An asserted `(exists ((x S)) P)` is satisfiable exactly when `P` with a
//! fresh constant for `x` is, and likewise `(not (forall ((x S)) P))` for
//! `(not P)`. Only the outermost quantifier structure is touched; inner
//! quantifiers are left for the quantifier module.

use rustc_hash::FxHashMap;

use crate::assertion::AssertionView;
use crate::node::{utils, Kind, Node, NodeManager};

pub fn apply(nm: &mut NodeManager, assertions: &mut AssertionView) {
    for i in 0..assertions.len() {
        let mut cur = assertions.get(i);
        loop {
            match nm.kind(cur) {
                Kind::Exists => {
                    cur = skolemize_body(nm, cur, false);
                }
                Kind::Not if nm.kind(nm.child(cur, 0)) == Kind::Forall => {
                    let forall = nm.child(cur, 0);
                    cur = skolemize_body(nm, forall, true);
                }
                _ => break,
            }
        }
        assertions.replace(i, cur);
    }
}

fn skolemize_body(nm: &mut NodeManager, binder: Node, negate: bool) -> Node {
    let var = nm.child(binder, 0);
    let body = nm.child(binder, 1);
    let symbol = nm.symbol(var).map(str::to_owned);
    let witness = nm.mk_const(nm.sort(var), symbol.as_deref());
    let mut map = FxHashMap::default();
    map.insert(var, witness);
    let instantiated = utils::substitute(nm, body, &map);
    if negate {
        nm.mk_not(instantiated)
    } else {
        instantiated
    }
}
