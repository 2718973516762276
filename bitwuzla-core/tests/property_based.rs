//! Property-based tests for the rewriter: idempotence at the top level
//! and soundness under random assignments (evaluating a term and its
//! rewritten form on concrete inputs yields the same value).

use bitwuzla_bv::BvValue;
use bitwuzla_core::node::{Kind, Node, NodeManager};
use bitwuzla_core::rewrite::Rewriter;
use proptest::prelude::*;
use rustc_hash::FxHashMap;

const WIDTH: u64 = 8;

/// Recipe for a bit-vector term over two inputs.
#[derive(Debug, Clone)]
enum BvT {
    X,
    Y,
    Val(u64),
    Add(Box<BvT>, Box<BvT>),
    Mul(Box<BvT>, Box<BvT>),
    And(Box<BvT>, Box<BvT>),
    Or(Box<BvT>, Box<BvT>),
    Xor(Box<BvT>, Box<BvT>),
    Sub(Box<BvT>, Box<BvT>),
    Not(Box<BvT>),
    Neg(Box<BvT>),
    Extract(Box<BvT>),
    Ite(Box<BoolT>, Box<BvT>, Box<BvT>),
}

/// Recipe for a Boolean term.
#[derive(Debug, Clone)]
enum BoolT {
    Val(bool),
    Ult(Box<BvT>, Box<BvT>),
    Ule(Box<BvT>, Box<BvT>),
    Slt(Box<BvT>, Box<BvT>),
    Eq(Box<BvT>, Box<BvT>),
    Uaddo(Box<BvT>, Box<BvT>),
    Not(Box<BoolT>),
    And(Box<BoolT>, Box<BoolT>),
    Or(Box<BoolT>, Box<BoolT>),
}

fn bv_strategy() -> impl Strategy<Value = BvT> {
    let leaf = prop_oneof![
        Just(BvT::X),
        Just(BvT::Y),
        (0u64..256).prop_map(BvT::Val),
    ];
    leaf.prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BvT::Add(a.into(), b.into())),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BvT::Mul(a.into(), b.into())),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BvT::And(a.into(), b.into())),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BvT::Or(a.into(), b.into())),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BvT::Xor(a.into(), b.into())),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BvT::Sub(a.into(), b.into())),
            inner.clone().prop_map(|a| BvT::Not(a.into())),
            inner.clone().prop_map(|a| BvT::Neg(a.into())),
            inner.clone().prop_map(|a| BvT::Extract(a.into())),
            (inner.clone(), inner.clone(), inner.clone(), inner.clone()).prop_map(
                |(c1, c2, a, b)| {
                    BvT::Ite(Box::new(BoolT::Ult(c1.into(), c2.into())), a.into(), b.into())
                }
            ),
        ]
    })
}

fn bool_strategy() -> impl Strategy<Value = BoolT> {
    let bv = bv_strategy();
    let leaf = prop_oneof![
        any::<bool>().prop_map(BoolT::Val),
        (bv_strategy(), bv_strategy()).prop_map(|(a, b)| BoolT::Ult(a.into(), b.into())),
        (bv_strategy(), bv_strategy()).prop_map(|(a, b)| BoolT::Ule(a.into(), b.into())),
        (bv_strategy(), bv_strategy()).prop_map(|(a, b)| BoolT::Slt(a.into(), b.into())),
        (bv_strategy(), bv_strategy()).prop_map(|(a, b)| BoolT::Eq(a.into(), b.into())),
        (bv, bv_strategy()).prop_map(|(a, b)| BoolT::Uaddo(a.into(), b.into())),
    ];
    leaf.prop_recursive(2, 16, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|a| BoolT::Not(a.into())),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BoolT::And(a.into(), b.into())),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BoolT::Or(a.into(), b.into())),
        ]
    })
}

fn build_bv(nm: &mut NodeManager, t: &BvT, x: Node, y: Node) -> Node {
    match t {
        BvT::X => x,
        BvT::Y => y,
        BvT::Val(v) => nm.mk_bv_value(BvValue::from_u64(WIDTH, *v)),
        BvT::Add(a, b) => bin(nm, Kind::BvAdd, a, b, x, y),
        BvT::Mul(a, b) => bin(nm, Kind::BvMul, a, b, x, y),
        BvT::And(a, b) => bin(nm, Kind::BvAnd, a, b, x, y),
        BvT::Or(a, b) => bin(nm, Kind::BvOr, a, b, x, y),
        BvT::Xor(a, b) => bin(nm, Kind::BvXor, a, b, x, y),
        BvT::Sub(a, b) => bin(nm, Kind::BvSub, a, b, x, y),
        BvT::Not(a) => {
            let a = build_bv(nm, a, x, y);
            nm.mk_node(Kind::BvNot, &[a], &[])
        }
        BvT::Neg(a) => {
            let a = build_bv(nm, a, x, y);
            nm.mk_node(Kind::BvNeg, &[a], &[])
        }
        BvT::Extract(a) => {
            let a = build_bv(nm, a, x, y);
            let ext = nm.mk_node(Kind::BvExtract, &[a], &[5, 2]);
            nm.mk_node(Kind::BvZeroExtend, &[ext], &[WIDTH - 4])
        }
        BvT::Ite(c, a, b) => {
            let c = build_bool(nm, c, x, y);
            let a = build_bv(nm, a, x, y);
            let b = build_bv(nm, b, x, y);
            nm.mk_ite(c, a, b)
        }
    }
}

fn bin(nm: &mut NodeManager, kind: Kind, a: &BvT, b: &BvT, x: Node, y: Node) -> Node {
    let a = build_bv(nm, a, x, y);
    let b = build_bv(nm, b, x, y);
    nm.mk_node(kind, &[a, b], &[])
}

fn build_bool(nm: &mut NodeManager, t: &BoolT, x: Node, y: Node) -> Node {
    match t {
        BoolT::Val(true) => nm.mk_true(),
        BoolT::Val(false) => nm.mk_false(),
        BoolT::Ult(a, b) => bin(nm, Kind::BvUlt, a, b, x, y),
        BoolT::Ule(a, b) => bin(nm, Kind::BvUle, a, b, x, y),
        BoolT::Slt(a, b) => bin(nm, Kind::BvSlt, a, b, x, y),
        BoolT::Eq(a, b) => bin(nm, Kind::Equal, a, b, x, y),
        BoolT::Uaddo(a, b) => bin(nm, Kind::BvUaddo, a, b, x, y),
        BoolT::Not(a) => {
            let a = build_bool(nm, a, x, y);
            nm.mk_not(a)
        }
        BoolT::And(a, b) => {
            let a = build_bool(nm, a, x, y);
            let b = build_bool(nm, b, x, y);
            nm.mk_node(Kind::And, &[a, b], &[])
        }
        BoolT::Or(a, b) => {
            let a = build_bool(nm, a, x, y);
            let b = build_bool(nm, b, x, y);
            nm.mk_node(Kind::Or, &[a, b], &[])
        }
    }
}

/// Evaluate a term by substituting concrete inputs and folding at rewrite
/// level 1.
fn eval_with(
    nm: &mut NodeManager,
    term: Node,
    x: Node,
    y: Node,
    vx: u64,
    vy: u64,
) -> Node {
    let mut map = FxHashMap::default();
    let val_x = nm.mk_bv_value(BvValue::from_u64(WIDTH, vx));
    let val_y = nm.mk_bv_value(BvValue::from_u64(WIDTH, vy));
    map.insert(x, val_x);
    map.insert(y, val_y);
    let concrete = bitwuzla_core::node::utils::substitute(nm, term, &map);
    let mut folder = Rewriter::new(1);
    folder.rewrite(nm, concrete)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rewrite_is_idempotent(recipe in bool_strategy()) {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(WIDTH).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        let y = nm.mk_const(bv8, Some("y"));
        let term = build_bool(&mut nm, &recipe, x, y);
        let mut rw = Rewriter::new(2);
        let once = rw.rewrite(&mut nm, term);
        let twice = rw.rewrite(&mut nm, once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn rewrite_preserves_evaluation(
        recipe in bool_strategy(),
        vx in 0u64..256,
        vy in 0u64..256,
    ) {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(WIDTH).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        let y = nm.mk_const(bv8, Some("y"));
        let term = build_bool(&mut nm, &recipe, x, y);
        let mut rw = Rewriter::new(2);
        let rewritten = rw.rewrite(&mut nm, term);
        let before = eval_with(&mut nm, term, x, y, vx, vy);
        let after = eval_with(&mut nm, rewritten, x, y, vx, vy);
        prop_assert!(nm.is_value(before), "original did not fold to a value");
        prop_assert_eq!(before, after);
    }

    #[test]
    fn bv_rewrites_preserve_evaluation(
        recipe in bv_strategy(),
        vx in 0u64..256,
        vy in 0u64..256,
    ) {
        let mut nm = NodeManager::new();
        let bv8 = nm.sorts.mk_bv(WIDTH).unwrap();
        let x = nm.mk_const(bv8, Some("x"));
        let y = nm.mk_const(bv8, Some("y"));
        let term = build_bv(&mut nm, &recipe, x, y);
        let mut rw = Rewriter::new(2);
        let rewritten = rw.rewrite(&mut nm, term);
        let before = eval_with(&mut nm, term, x, y, vx, vy);
        let after = eval_with(&mut nm, rewritten, x, y, vx, vy);
        prop_assert_eq!(before, after);
    }
}
