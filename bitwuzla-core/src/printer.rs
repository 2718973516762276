//! Deterministic SMT-LIB v2 output for sorts, terms, values and models.
//!
//! Sub-terms referenced more than once are bound in `let` chains with
//! names `_let0`, `_let1`, ... in ascending id order, which coincides with
//! dependency order because children always have smaller ids than their
//! parents. Nodes without a symbol print as `@bzla.const_<id>` (constants)
//! or `@bzla.var_<id>` (variables).

use rustc_hash::{FxHashMap, FxHashSet};

use bitwuzla_fp::FloatingPoint;

use crate::node::{utils, Kind, Node, NodeManager, Value};

/// Print a sort in SMT-LIB syntax.
pub fn print_sort(nm: &NodeManager, sort: crate::sort::Sort) -> String {
    nm.sorts.display(sort)
}

/// Print a term in SMT-LIB syntax with the given numeric base for
/// bit-vector values (2, 10 or 16).
pub fn print_node(nm: &NodeManager, node: Node, base: u32) -> String {
    // Count references; anything referenced twice or more is letified.
    let mut refs: FxHashMap<Node, u32> = FxHashMap::default();
    for cur in utils::post_order(nm, &[node]) {
        for &c in nm.children(cur) {
            *refs.entry(c).or_insert(0) += 1;
        }
    }
    let mut shared: Vec<Node> = refs
        .iter()
        .filter(|&(&n, &count)| {
            count >= 2 && !nm.kind(n).is_leaf() && nm.num_children(n) > 0
        })
        .map(|(&n, _)| n)
        .collect();
    shared.sort();

    let names: FxHashMap<Node, String> = shared
        .iter()
        .enumerate()
        .map(|(i, &n)| (n, format!("_let{i}")))
        .collect();

    let mut out = String::new();
    let mut open = 0;
    let mut bound: FxHashSet<Node> = FxHashSet::default();
    for &s in &shared {
        out.push_str(&format!("(let (({} ", names[&s]));
        render(nm, s, base, &names, &bound, &mut out);
        out.push_str(")) ");
        bound.insert(s);
        open += 1;
    }
    render(nm, node, base, &names, &bound, &mut out);
    for _ in 0..open {
        out.push(')');
    }
    out
}

/// Print a value node for model output.
pub fn print_value(nm: &NodeManager, node: Node, base: u32) -> String {
    let mut out = String::new();
    render(
        nm,
        node,
        base,
        &FxHashMap::default(),
        &FxHashSet::default(),
        &mut out,
    );
    out
}

fn render(
    nm: &NodeManager,
    node: Node,
    base: u32,
    names: &FxHashMap<Node, String>,
    bound: &FxHashSet<Node>,
    out: &mut String,
) {
    if bound.contains(&node) {
        out.push_str(&names[&node]);
        return;
    }
    let kind = nm.kind(node);
    match kind {
        Kind::Constant => match nm.symbol(node) {
            Some(sym) => out.push_str(sym),
            None => out.push_str(&format!("@bzla.const_{}", node.id())),
        },
        Kind::Variable => match nm.symbol(node) {
            Some(sym) => out.push_str(sym),
            None => out.push_str(&format!("@bzla.var_{}", node.id())),
        },
        Kind::Value => render_value(nm, node, base, out),
        Kind::ConstArray => {
            out.push_str(&format!(
                "((as const {}) ",
                nm.sorts.display(nm.sort(node))
            ));
            render(nm, nm.child(node, 0), base, names, bound, out);
            out.push(')');
        }
        Kind::Exists | Kind::Forall | Kind::Lambda => {
            let var = nm.child(node, 0);
            out.push('(');
            out.push_str(kind.info().name);
            out.push_str(" ((");
            render(nm, var, base, names, bound, out);
            out.push(' ');
            out.push_str(&nm.sorts.display(nm.sort(var)));
            out.push_str(")) ");
            render(nm, nm.child(node, 1), base, names, bound, out);
            out.push(')');
        }
        Kind::Apply => {
            out.push('(');
            for (i, &c) in nm.children(node).iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                render(nm, c, base, names, bound, out);
            }
            out.push(')');
        }
        _ => {
            out.push('(');
            let indices = nm.indices(node);
            if indices.is_empty() {
                out.push_str(kind.info().name);
            } else {
                out.push_str("(_ ");
                out.push_str(kind.info().name);
                for &idx in indices {
                    out.push_str(&format!(" {idx}"));
                }
                out.push(')');
            }
            for &c in nm.children(node) {
                out.push(' ');
                render(nm, c, base, names, bound, out);
            }
            out.push(')');
        }
    }
}

fn render_value(nm: &NodeManager, node: Node, base: u32, out: &mut String) {
    match nm.value(node).expect("value node carries a payload") {
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Bv(bv) => match base {
            10 => out.push_str(&format!(
                "(_ bv{} {})",
                bv.to_string_radix(10),
                bv.width()
            )),
            16 if bv.width() % 4 == 0 => {
                out.push_str(&format!("#x{}", bv.to_string_radix(16)));
            }
            _ => out.push_str(&format!("#b{}", bv.to_string_radix(2))),
        },
        Value::Fp(fp) => out.push_str(&print_fp(fp)),
        Value::Rm(rm) => out.push_str(rm.name()),
    }
}

fn print_fp(fp: &FloatingPoint) -> String {
    format!(
        "(fp #b{} #b{} #b{})",
        if fp.sign_bit() { "1" } else { "0" },
        fp.exp_field().to_string_radix(2),
        fp.sig_field().to_string_radix(2)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitwuzla_bv::BvValue;
    use bitwuzla_fp::{FpFormat, RoundingMode};

    #[test]
    fn test_print_leaves() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        assert_eq!(print_node(&nm, x, 2), "x");
        let anon = nm.mk_const(bv8, None);
        assert_eq!(print_node(&nm, anon, 2), format!("@bzla.const_{}", anon.id()));
    }

    #[test]
    fn test_print_values() {
        let mut nm = NodeManager::new();
        let v = nm.mk_bv_value(BvValue::from_u64(8, 10));
        assert_eq!(print_node(&nm, v, 2), "#b00001010");
        assert_eq!(print_node(&nm, v, 16), "#x0a");
        assert_eq!(print_node(&nm, v, 10), "(_ bv10 8)");
        // Width not divisible by four falls back to binary.
        let v5 = nm.mk_bv_value(BvValue::from_u64(5, 10));
        assert_eq!(print_node(&nm, v5, 16), "#b01010");
        let t = nm.mk_true();
        assert_eq!(print_node(&nm, t, 2), "true");
        let rm = nm.mk_rm_value(RoundingMode::Rtn);
        assert_eq!(print_node(&nm, rm, 2), "RTN");
        let fp = nm.mk_fp_value(bitwuzla_fp::FloatingPoint::zero(
            FpFormat::new(3, 5),
            true,
        ));
        assert_eq!(print_node(&nm, fp, 2), "(fp #b1 #b000 #b0000)");
    }

    #[test]
    fn test_print_compound() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        let y = nm.mk_const(bv8, Some("y"));
        let add = nm.mk_node(Kind::BvAdd, &[x, y], &[]);
        assert_eq!(print_node(&nm, add, 2), "(bvadd x y)");
        let ext = nm.mk_node(Kind::BvExtract, &[x], &[5, 2]);
        assert_eq!(print_node(&nm, ext, 2), "((_ extract 5 2) x)");
        let se = nm.mk_node(Kind::BvSignExtend, &[x], &[4]);
        assert_eq!(print_node(&nm, se, 2), "((_ sign_extend 4) x)");
    }

    #[test]
    fn test_print_let_sharing() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        let y = nm.mk_const(bv8, Some("y"));
        let add = nm.mk_node(Kind::BvAdd, &[x, y], &[]);
        let mul = nm.mk_node(Kind::BvMul, &[add, add], &[]);
        assert_eq!(
            print_node(&nm, mul, 2),
            "(let ((_let0 (bvadd x y))) (bvmul _let0 _let0))"
        );
    }

    #[test]
    fn test_print_binder() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let v = nm.mk_var(bv8, Some("v"));
        let zero = nm.mk_bv_value(BvValue::zero(8));
        let body = nm.mk_eq(v, zero);
        let ex = nm.mk_node(Kind::Exists, &[v, body], &[]);
        assert_eq!(
            print_node(&nm, ex, 2),
            "(exists ((v (_ BitVec 8))) (= v #b00000000))"
        );
    }

    #[test]
    fn test_print_apply_and_select() {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(8).unwrap();
        let b = nm.sorts.mk_bool();
        let fs = nm.sorts.mk_fun(&[bv8], b).unwrap();
        let f = nm.mk_const(fs, Some("f"));
        let x = nm.mk_const(bv8, Some("x"));
        let app = nm.mk_node(Kind::Apply, &[f, x], &[]);
        assert_eq!(print_node(&nm, app, 2), "(f x)");
        let arr = nm.sorts.mk_array(bv8, bv8);
        let a = nm.mk_const(arr, Some("a"));
        let sel = nm.mk_node(Kind::Select, &[a, x], &[]);
        assert_eq!(print_node(&nm, sel, 2), "(select a x)");
    }
}
