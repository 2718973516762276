//! Model value reconstruction from SAT-level assignments.
//!
//! Evaluation is bottom-up with a per-round cache: encoded terms read
//! their assignment from the bit-blaster, value nodes are their own
//! value, compound terms evaluate through the shared value semantics, and
//! terms of uninterpreted sort evaluate to their equality-class
//! representative.

use rustc_hash::FxHashMap;

use bitwuzla_fp::{FloatingPoint, FpFormat};
use bitwuzla_core::eval::eval_node;
use bitwuzla_core::node::{utils, Kind, Node, NodeManager, Value};

use crate::bv::BitblastSolver;
use crate::fp::{rm_from_code, FpSolver};

/// Compute the canonical model value node of `node`.
pub fn value_node(
    bb: &BitblastSolver,
    fp: &FpSolver,
    reps: &FxHashMap<Node, Node>,
    nm: &mut NodeManager,
    node: Node,
    cache: &mut FxHashMap<Node, Node>,
) -> Node {
    if let Some(&v) = cache.get(&node) {
        return v;
    }
    let sort = nm.sort(node);
    let result = if nm.is_value(node) {
        node
    } else if nm.sorts.is_bool(sort) {
        match bb.value_bool(node) {
            Some(b) => {
                if b {
                    nm.mk_true()
                } else {
                    nm.mk_false()
                }
            }
            None => eval_structural(bb, fp, reps, nm, node, cache),
        }
    } else if nm.sorts.is_bv(sort) {
        match bb.value_bv(node) {
            Some(v) => nm.mk_bv_value(v),
            None => eval_structural(bb, fp, reps, nm, node, cache),
        }
    } else if nm.sorts.is_fp(sort) {
        let (e, s) = nm.sorts.fp_sizes(sort);
        let fmt = FpFormat::new(e, s);
        match fp.encoding(node) {
            Some(enc) if enc != node => {
                let enc_val = value_node(bb, fp, reps, nm, enc, cache);
                let packed = nm
                    .bv_value(enc_val)
                    .cloned()
                    .unwrap_or_else(|| bitwuzla_bv::BvValue::zero(fmt.width()));
                nm.mk_fp_value(FloatingPoint::from_ieee_bv(fmt, &packed))
            }
            _ => nm.mk_fp_value(FloatingPoint::zero(fmt, false)),
        }
    } else if nm.sorts.is_rm(sort) {
        match fp.encoding(node) {
            Some(enc) if enc != node => {
                let enc_val = value_node(bb, fp, reps, nm, enc, cache);
                let code = nm
                    .bv_value(enc_val)
                    .and_then(|v| v.to_u64())
                    .unwrap_or(0);
                nm.mk_rm_value(rm_from_code(code))
            }
            _ => nm.mk_rm_value(bitwuzla_fp::RoundingMode::Rne),
        }
    } else {
        // Arrays, functions and uninterpreted sorts: the representative.
        reps.get(&node).copied().unwrap_or(node)
    };
    cache.insert(node, result);
    result
}

/// Evaluate an unencoded compound term through its children.
fn eval_structural(
    bb: &BitblastSolver,
    fp: &FpSolver,
    reps: &FxHashMap<Node, Node>,
    nm: &mut NodeManager,
    node: Node,
    cache: &mut FxHashMap<Node, Node>,
) -> Node {
    let kind = nm.kind(node);
    match kind {
        // Unconstrained leaves and theory terms take the default value.
        Kind::Constant | Kind::Select | Kind::Apply | Kind::Exists | Kind::Forall => {
            let sort = nm.sort(node);
            utils::mk_default_value(nm, sort)
        }
        Kind::Equal => {
            let (c0, c1) = (nm.child(node, 0), nm.child(node, 1));
            let a = value_node(bb, fp, reps, nm, c0, cache);
            let b = value_node(bb, fp, reps, nm, c1, cache);
            if a == b {
                nm.mk_true()
            } else {
                nm.mk_false()
            }
        }
        _ => {
            let children = nm.children(node).to_vec();
            let mut values = Vec::with_capacity(children.len());
            for &c in &children {
                let vn = value_node(bb, fp, reps, nm, c, cache);
                match nm.value(vn) {
                    Some(v) => values.push(v.clone()),
                    None => {
                        let sort = nm.sort(node);
                        return utils::mk_default_value(nm, sort);
                    }
                }
            }
            let refs: Vec<&Value> = values.iter().collect();
            match eval_node(kind, &refs, nm.indices(node)) {
                Some(v) => nm.mk_value(v),
                None => {
                    let sort = nm.sort(node);
                    utils::mk_default_value(nm, sort)
                }
            }
        }
    }
}
