//! End-to-end tests of the solving context: bit-blasting, local search,
//! theory refinement, incremental solving and models.

use bitwuzla_bv::BvValue;
use bitwuzla_core::node::Kind;
use bitwuzla_core::option::Options;
use bitwuzla_solver::{SatResult, SolvingContext};

fn ctx() -> SolvingContext {
    SolvingContext::new(Options::default())
}

fn ctx_with(f: impl FnOnce(&mut Options)) -> SolvingContext {
    let mut options = Options::default();
    f(&mut options);
    SolvingContext::new(options)
}

#[test]
fn test_simple_sat_and_model() {
    let mut ctx = ctx_with(|o| o.produce_models = true);
    let nm = ctx.node_manager();
    let bv8 = nm.sorts.mk_bv(8).unwrap();
    let x = nm.mk_const(bv8, Some("x"));
    let forty_two = nm.mk_bv_value(BvValue::from_u64(8, 42));
    let eq = nm.mk_eq(x, forty_two);
    ctx.assert_formula(eq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    let value = ctx.get_value(x).unwrap();
    assert_eq!(
        ctx.nodes().bv_value(value),
        Some(&BvValue::from_u64(8, 42))
    );
}

#[test]
fn test_odd_sum_unsat_bitblast() {
    // x + x = 3 is unsatisfiable: the sum is always even.
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let bv4 = nm.sorts.mk_bv(4).unwrap();
    let x = nm.mk_const(bv4, Some("x"));
    let sum = nm.mk_node(Kind::BvAdd, &[x, x], &[]);
    let three = nm.mk_bv_value(BvValue::from_u64(4, 3));
    let eq = nm.mk_eq(sum, three);
    ctx.assert_formula(eq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
}

#[test]
fn test_odd_sum_unsat_prop() {
    // The local-search engine falls back to bit-blasting on exhaustion,
    // so the prop mode decides unsatisfiable instances too.
    let mut ctx = ctx_with(|o| {
        o.set("bv-solver", "prop").unwrap();
        o.prop_nprops = 2_000;
    });
    let nm = ctx.node_manager();
    let bv4 = nm.sorts.mk_bv(4).unwrap();
    let x = nm.mk_const(bv4, Some("x"));
    let sum = nm.mk_node(Kind::BvAdd, &[x, x], &[]);
    let three = nm.mk_bv_value(BvValue::from_u64(4, 3));
    let eq = nm.mk_eq(sum, three);
    ctx.assert_formula(eq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
}

#[test]
fn test_mul_associativity_unsat() {
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let bv4 = nm.sorts.mk_bv(4).unwrap();
    let x = nm.mk_const(bv4, Some("x"));
    let y = nm.mk_const(bv4, Some("y"));
    let z = nm.mk_const(bv4, Some("z"));
    let yz = nm.mk_node(Kind::BvMul, &[y, z], &[]);
    let left = nm.mk_node(Kind::BvMul, &[x, yz], &[]);
    let xy = nm.mk_node(Kind::BvMul, &[x, y], &[]);
    let right = nm.mk_node(Kind::BvMul, &[xy, z], &[]);
    let eq = nm.mk_eq(left, right);
    let neq = nm.mk_not(eq);
    ctx.assert_formula(neq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
}

#[test]
fn test_prop_mode_sat() {
    let mut ctx = ctx_with(|o| {
        o.set("bv-solver", "prop").unwrap();
        o.produce_models = true;
    });
    let nm = ctx.node_manager();
    let bv8 = nm.sorts.mk_bv(8).unwrap();
    let x = nm.mk_const(bv8, Some("x"));
    let y = nm.mk_const(bv8, Some("y"));
    let sum = nm.mk_node(Kind::BvAdd, &[x, y], &[]);
    let hundred = nm.mk_bv_value(BvValue::from_u64(8, 100));
    let eq = nm.mk_eq(sum, hundred);
    ctx.assert_formula(eq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    let vx = ctx.get_value(x).unwrap();
    let vy = ctx.get_value(y).unwrap();
    let bx = ctx.nodes().bv_value(vx).unwrap().clone();
    let by = ctx.nodes().bv_value(vy).unwrap().clone();
    assert_eq!(bx.add(&by), BvValue::from_u64(8, 100));
}

#[test]
fn test_push_pop_restores_sat() {
    let mut ctx = ctx_with(|o| o.incremental = true);
    let nm = ctx.node_manager();
    let b = nm.sorts.mk_bool();
    let a = nm.mk_const(b, Some("a"));
    let na = nm.mk_not(a);
    ctx.assert_formula(a).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    ctx.push(1);
    ctx.assert_formula(na).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
    ctx.pop(1).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
}

#[test]
fn test_unsat_core() {
    let mut ctx = ctx_with(|o| {
        o.incremental = true;
        o.produce_unsat_cores = true;
    });
    let nm = ctx.node_manager();
    let b = nm.sorts.mk_bool();
    let a = nm.mk_const(b, Some("a"));
    let c = nm.mk_const(b, Some("c"));
    let na = nm.mk_not(a);
    ctx.assert_formula(a).unwrap();
    ctx.assert_formula(na).unwrap();
    ctx.assert_formula(c).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
    let core = ctx.get_unsat_core().unwrap();
    assert!(core.contains(&a));
    assert!(core.contains(&na));
    assert!(!core.contains(&c));
}

#[test]
fn test_unsat_assumptions() {
    let mut ctx = ctx_with(|o| o.incremental = true);
    let nm = ctx.node_manager();
    let b = nm.sorts.mk_bool();
    let p = nm.mk_const(b, Some("p"));
    let q = nm.mk_const(b, Some("q"));
    let imp = nm.mk_implies(p, q);
    let nq = nm.mk_not(q);
    ctx.assert_formula(imp).unwrap();
    assert_eq!(ctx.solve(&[p, nq]).unwrap(), SatResult::Unsat);
    let failed = ctx.get_unsat_assumptions().unwrap();
    assert!(!failed.is_empty());
    for f in &failed {
        assert!(*f == p || *f == nq);
    }
    // Without assumptions the formula is satisfiable.
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
}

#[test]
fn test_array_read_over_write() {
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let bv8 = nm.sorts.mk_bv(8).unwrap();
    let arr_sort = nm.sorts.mk_array(bv8, bv8);
    let a = nm.mk_const(arr_sort, Some("a"));
    let i = nm.mk_const(bv8, Some("i"));
    let v = nm.mk_bv_value(BvValue::from_u64(8, 7));
    let store = nm.mk_node(Kind::Store, &[a, i, v], &[]);
    let sel = nm.mk_node(Kind::Select, &[store, i], &[]);
    // select (store a i 7) i != 7 is unsatisfiable.
    let eq = nm.mk_eq(sel, v);
    let neq = nm.mk_not(eq);
    ctx.assert_formula(neq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
}

#[test]
fn test_array_aliasing() {
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let bv8 = nm.sorts.mk_bv(8).unwrap();
    let arr_sort = nm.sorts.mk_array(bv8, bv8);
    let a = nm.mk_const(arr_sort, Some("a"));
    let i = nm.mk_const(bv8, Some("i"));
    let j = nm.mk_const(bv8, Some("j"));
    // i = j /\ select a i != select a j is unsatisfiable.
    let eq_ij = nm.mk_eq(i, j);
    let si = nm.mk_node(Kind::Select, &[a, i], &[]);
    let sj = nm.mk_node(Kind::Select, &[a, j], &[]);
    let eq_s = nm.mk_eq(si, sj);
    let neq_s = nm.mk_not(eq_s);
    ctx.assert_formula(eq_ij).unwrap();
    ctx.assert_formula(neq_s).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
}

#[test]
fn test_uf_congruence() {
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let bv8 = nm.sorts.mk_bv(8).unwrap();
    let fsort = nm.sorts.mk_fun(&[bv8], bv8).unwrap();
    let f = nm.mk_const(fsort, Some("f"));
    let x = nm.mk_const(bv8, Some("x"));
    let y = nm.mk_const(bv8, Some("y"));
    // x = y /\ f(x) != f(y) is unsatisfiable.
    let eq_xy = nm.mk_eq(x, y);
    let fx = nm.mk_node(Kind::Apply, &[f, x], &[]);
    let fy = nm.mk_node(Kind::Apply, &[f, y], &[]);
    let eq_f = nm.mk_eq(fx, fy);
    let neq_f = nm.mk_not(eq_f);
    ctx.assert_formula(eq_xy).unwrap();
    ctx.assert_formula(neq_f).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
}

#[test]
fn test_uf_function_model() {
    let mut ctx = ctx_with(|o| o.produce_models = true);
    let nm = ctx.node_manager();
    let bv8 = nm.sorts.mk_bv(8).unwrap();
    let fsort = nm.sorts.mk_fun(&[bv8], bv8).unwrap();
    let f = nm.mk_const(fsort, Some("f"));
    let x = nm.mk_const(bv8, Some("x"));
    let fx = nm.mk_node(Kind::Apply, &[f, x], &[]);
    let seven = nm.mk_bv_value(BvValue::from_u64(8, 7));
    let eq = nm.mk_eq(fx, seven);
    ctx.assert_formula(eq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    let fmodel = ctx.get_value(f).unwrap();
    assert_eq!(ctx.nodes().kind(fmodel), Kind::Lambda);
}

#[test]
fn test_fp_nan_comparisons() {
    use bitwuzla_fp::{FloatingPoint, FpFormat};
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let nan = nm.mk_fp_value(FloatingPoint::nan(FpFormat::new(8, 24)));
    // (fp.eq NaN NaN) is false, (fp.isNaN NaN) is true.
    let eq = nm.mk_node(Kind::FpEqual, &[nan, nan], &[]);
    let isnan = nm.mk_node(Kind::FpIsNan, &[nan], &[]);
    let not_eq = nm.mk_not(eq);
    ctx.assert_formula(not_eq).unwrap();
    ctx.assert_formula(isnan).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
}

#[test]
fn test_fp_symbolic_comparison() {
    use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let f32s = nm.sorts.mk_fp(8, 24).unwrap();
    let a = nm.mk_const(f32s, Some("a"));
    let one = nm.mk_fp_value(
        FloatingPoint::from_real(FpFormat::new(8, 24), RoundingMode::Rne, "1").unwrap(),
    );
    let two = nm.mk_fp_value(
        FloatingPoint::from_real(FpFormat::new(8, 24), RoundingMode::Rne, "2").unwrap(),
    );
    // 1 < a < 2 is satisfiable.
    let lt1 = nm.mk_node(Kind::FpLt, &[one, a], &[]);
    let lt2 = nm.mk_node(Kind::FpLt, &[a, two], &[]);
    ctx.assert_formula(lt1).unwrap();
    ctx.assert_formula(lt2).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    // a < 1 together with the above is unsatisfiable.
    let nm = ctx.node_manager();
    let lt0 = nm.mk_node(Kind::FpLt, &[a, one], &[]);
    ctx.assert_formula(lt0).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
}

#[test]
fn test_fp_arithmetic_word_blasting() {
    use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};
    let mut ctx = ctx_with(|o| o.produce_models = true);
    // A small format keeps the adder circuit small.
    let fmt = FpFormat::new(3, 4);
    let nm = ctx.node_manager();
    let f16 = nm.sorts.mk_fp(3, 4).unwrap();
    let a = nm.mk_const(f16, Some("a"));
    let rm = nm.mk_rm_value(RoundingMode::Rne);
    let one = nm
        .mk_fp_value(FloatingPoint::from_real(fmt, RoundingMode::Rne, "1").unwrap());
    let two = nm
        .mk_fp_value(FloatingPoint::from_real(fmt, RoundingMode::Rne, "2").unwrap());
    // a + 1 = 2 forces a = 1.
    let sum = nm.mk_node(Kind::FpAdd, &[rm, a, one], &[]);
    let eq = nm.mk_eq(sum, two);
    ctx.assert_formula(eq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    let va = ctx.get_value(a).unwrap();
    let fp_a = ctx.nodes().fp_value(va).unwrap().clone();
    let sum = fp_a.add(RoundingMode::Rne, &FloatingPoint::from_real(fmt, RoundingMode::Rne, "1").unwrap());
    assert!(sum.fp_eq(&FloatingPoint::from_real(fmt, RoundingMode::Rne, "2").unwrap()));
}

#[test]
fn test_exists_is_skolemized() {
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let bv8 = nm.sorts.mk_bv(8).unwrap();
    let x = nm.mk_var(bv8, Some("x"));
    let c = nm.mk_bv_value(BvValue::from_u64(8, 12));
    let prod = nm.mk_node(Kind::BvMul, &[x, c], &[]);
    let zero = nm.mk_bv_value(BvValue::zero(8));
    let body = nm.mk_eq(zero, prod);
    let exists = nm.mk_node(Kind::Exists, &[x, body], &[]);
    ctx.assert_formula(exists).unwrap();
    // x = 0 always witnesses.
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
}

#[test]
fn test_lambda_elimination() {
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let bv8 = nm.sorts.mk_bv(8).unwrap();
    let v = nm.mk_var(bv8, Some("v"));
    let one = nm.mk_bv_value(BvValue::one(8));
    let body = nm.mk_node(Kind::BvAdd, &[v, one], &[]);
    let lam = nm.mk_node(Kind::Lambda, &[v, body], &[]);
    let five = nm.mk_bv_value(BvValue::from_u64(8, 5));
    let app = nm.mk_node(Kind::Apply, &[lam, five], &[]);
    let six = nm.mk_bv_value(BvValue::from_u64(8, 6));
    let eq = nm.mk_eq(app, six);
    ctx.assert_formula(eq).unwrap();
    // Beta reduction turns the application into 5 + 1 = 6.
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    // No application of a lambda survives preprocessing.
    let roots = ctx.preprocessed_assertions();
    let nm = ctx.nodes();
    for n in bitwuzla_core::node::utils::post_order(nm, &roots) {
        if nm.kind(n) == Kind::Apply {
            assert_ne!(nm.kind(nm.child(n, 0)), Kind::Lambda);
        }
    }
}

#[test]
fn test_signed_division_semantics() {
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let bv8 = nm.sorts.mk_bv(8).unwrap();
    let x = nm.mk_const(bv8, Some("x"));
    let zero = nm.mk_bv_value(BvValue::zero(8));
    // x udiv 0 = ones, for every x.
    let div = nm.mk_node(Kind::BvUdiv, &[x, zero], &[]);
    let ones = nm.mk_bv_value(BvValue::ones(8));
    let eq = nm.mk_eq(div, ones);
    let neq = nm.mk_not(eq);
    ctx.assert_formula(neq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
}

#[test]
fn test_overflow_predicate() {
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let bv8 = nm.sorts.mk_bv(8).unwrap();
    let x = nm.mk_const(bv8, Some("x"));
    let y = nm.mk_const(bv8, Some("y"));
    // uaddo(x, y) /\ x + y >= x is unsatisfiable (overflow wraps below x).
    let ovfl = nm.mk_node(Kind::BvUaddo, &[x, y], &[]);
    let sum = nm.mk_node(Kind::BvAdd, &[x, y], &[]);
    let ge = nm.mk_node(Kind::BvUge, &[sum, x], &[]);
    // Exclude the y = 0 case where the sum equals x without overflow.
    let zero = nm.mk_bv_value(BvValue::zero(8));
    let ynz = {
        let eq = nm.mk_eq(y, zero);
        nm.mk_not(eq)
    };
    ctx.assert_formula(ovfl).unwrap();
    ctx.assert_formula(ge).unwrap();
    ctx.assert_formula(ynz).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
}

#[test]
fn test_terminator_unknown() {
    use std::rc::Rc;
    let mut ctx = ctx();
    let nm = ctx.node_manager();
    let bv16 = nm.sorts.mk_bv(16).unwrap();
    let x = nm.mk_const(bv16, Some("x"));
    let y = nm.mk_const(bv16, Some("y"));
    let prod = nm.mk_node(Kind::BvMul, &[x, y], &[]);
    let big = nm.mk_bv_value(BvValue::from_u64(16, 0xfff1));
    let eq = nm.mk_eq(prod, big);
    ctx.assert_formula(eq).unwrap();
    ctx.set_terminator(Some(Rc::new(|| true)));
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unknown);
    // The session stays usable after termination.
    ctx.set_terminator(None);
    let res = ctx.solve(&[]);
    assert!(res.is_err()); // non-incremental second solve
}

#[test]
fn test_model_satisfies_assertions() {
    let mut ctx = ctx_with(|o| o.produce_models = true);
    let nm = ctx.node_manager();
    let bv8 = nm.sorts.mk_bv(8).unwrap();
    let x = nm.mk_const(bv8, Some("x"));
    let y = nm.mk_const(bv8, Some("y"));
    let ten = nm.mk_bv_value(BvValue::from_u64(8, 10));
    let lt = nm.mk_node(Kind::BvUlt, &[x, ten], &[]);
    let sum = nm.mk_node(Kind::BvAdd, &[x, y], &[]);
    let target = nm.mk_bv_value(BvValue::from_u64(8, 20));
    let eq = nm.mk_eq(sum, target);
    ctx.assert_formula(lt).unwrap();
    ctx.assert_formula(eq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    // Evaluating the asserted formulas under the model yields true.
    for a in [lt, eq] {
        let v = ctx.get_value(a).unwrap();
        assert_eq!(ctx.nodes().bool_value(v), Some(true));
    }
}

#[test]
fn test_fp_mul_circuit() {
    use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};
    let mut ctx = ctx_with(|o| o.produce_models = true);
    let fmt = FpFormat::new(3, 4);
    let nm = ctx.node_manager();
    let sort = nm.sorts.mk_fp(3, 4).unwrap();
    let a = nm.mk_const(sort, Some("a"));
    let rm = nm.mk_rm_value(RoundingMode::Rne);
    let two = nm
        .mk_fp_value(FloatingPoint::from_real(fmt, RoundingMode::Rne, "2").unwrap());
    let four = nm
        .mk_fp_value(FloatingPoint::from_real(fmt, RoundingMode::Rne, "4").unwrap());
    let prod = nm.mk_node(Kind::FpMul, &[rm, a, two], &[]);
    let eq = nm.mk_eq(prod, four);
    ctx.assert_formula(eq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    let va = ctx.get_value(a).unwrap();
    let fa = ctx.nodes().fp_value(va).unwrap().clone();
    let two_v = FloatingPoint::from_real(fmt, RoundingMode::Rne, "2").unwrap();
    let four_v = FloatingPoint::from_real(fmt, RoundingMode::Rne, "4").unwrap();
    assert!(fa.mul(RoundingMode::Rne, &two_v).fp_eq(&four_v));
}

#[test]
fn test_fp_sqrt_circuit() {
    use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};
    let mut ctx = ctx_with(|o| o.produce_models = true);
    let fmt = FpFormat::new(3, 4);
    let nm = ctx.node_manager();
    let sort = nm.sorts.mk_fp(3, 4).unwrap();
    let a = nm.mk_const(sort, Some("a"));
    let rm = nm.mk_rm_value(RoundingMode::Rne);
    let two = nm
        .mk_fp_value(FloatingPoint::from_real(fmt, RoundingMode::Rne, "2").unwrap());
    let root = nm.mk_node(Kind::FpSqrt, &[rm, a], &[]);
    let eq = nm.mk_eq(root, two);
    ctx.assert_formula(eq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    let va = ctx.get_value(a).unwrap();
    let fa = ctx.nodes().fp_value(va).unwrap().clone();
    let two_v = FloatingPoint::from_real(fmt, RoundingMode::Rne, "2").unwrap();
    assert!(fa.sqrt(RoundingMode::Rne).fp_eq(&two_v));
}

#[test]
fn test_fp_div_circuit() {
    use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};
    let mut ctx = ctx_with(|o| o.produce_models = true);
    let fmt = FpFormat::new(3, 4);
    let nm = ctx.node_manager();
    let sort = nm.sorts.mk_fp(3, 4).unwrap();
    let a = nm.mk_const(sort, Some("a"));
    let rm = nm.mk_rm_value(RoundingMode::Rne);
    let two = nm
        .mk_fp_value(FloatingPoint::from_real(fmt, RoundingMode::Rne, "2").unwrap());
    let four = nm
        .mk_fp_value(FloatingPoint::from_real(fmt, RoundingMode::Rne, "4").unwrap());
    let quot = nm.mk_node(Kind::FpDiv, &[rm, four, a], &[]);
    let eq = nm.mk_eq(quot, two);
    ctx.assert_formula(eq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    let va = ctx.get_value(a).unwrap();
    let fa = ctx.nodes().fp_value(va).unwrap().clone();
    let two_v = FloatingPoint::from_real(fmt, RoundingMode::Rne, "2").unwrap();
    let four_v = FloatingPoint::from_real(fmt, RoundingMode::Rne, "4").unwrap();
    assert!(four_v.div(RoundingMode::Rne, &fa).fp_eq(&two_v));
}

#[test]
fn test_fp_rti_circuit() {
    use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};
    let mut ctx = ctx_with(|o| o.produce_models = true);
    let fmt = FpFormat::new(3, 4);
    let nm = ctx.node_manager();
    let sort = nm.sorts.mk_fp(3, 4).unwrap();
    let a = nm.mk_const(sort, Some("a"));
    let rm = nm.mk_rm_value(RoundingMode::Rtp);
    let one = nm
        .mk_fp_value(FloatingPoint::from_real(fmt, RoundingMode::Rne, "1").unwrap());
    let two = nm
        .mk_fp_value(FloatingPoint::from_real(fmt, RoundingMode::Rne, "2").unwrap());
    // Rounding up to 2 while strictly between 1 and 2.
    let rounded = nm.mk_node(Kind::FpRti, &[rm, a], &[]);
    let eq = nm.mk_eq(rounded, two);
    let above = nm.mk_node(Kind::FpLt, &[one, a], &[]);
    let below = nm.mk_node(Kind::FpLt, &[a, two], &[]);
    ctx.assert_formula(eq).unwrap();
    ctx.assert_formula(above).unwrap();
    ctx.assert_formula(below).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    let va = ctx.get_value(a).unwrap();
    let fa = ctx.nodes().fp_value(va).unwrap().clone();
    let two_v = FloatingPoint::from_real(fmt, RoundingMode::Rne, "2").unwrap();
    assert!(fa.rti(RoundingMode::Rtp).fp_eq(&two_v));
}

#[test]
fn test_fp_from_sbv_circuit() {
    use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};
    let mut ctx = ctx_with(|o| o.produce_models = true);
    let fmt = FpFormat::new(3, 4);
    let nm = ctx.node_manager();
    let bv4 = nm.sorts.mk_bv(4).unwrap();
    let x = nm.mk_const(bv4, Some("x"));
    let rm = nm.mk_rm_value(RoundingMode::Rne);
    let three = nm
        .mk_fp_value(FloatingPoint::from_real(fmt, RoundingMode::Rne, "3").unwrap());
    let conv = nm.mk_node(Kind::FpToFpFromSbv, &[rm, x], &[3, 4]);
    let eq = nm.mk_eq(conv, three);
    ctx.assert_formula(eq).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Sat);
    let vx = ctx.get_value(x).unwrap();
    assert_eq!(
        ctx.nodes().bv_value(vx),
        Some(&BvValue::from_u64(4, 3))
    );
}

#[test]
fn test_fp_add_circuit_unsat() {
    use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};
    let mut ctx = ctx();
    let fmt = FpFormat::new(3, 4);
    let nm = ctx.node_manager();
    let sort = nm.sorts.mk_fp(3, 4).unwrap();
    let a = nm.mk_const(sort, Some("a"));
    let rm = nm.mk_rm_value(RoundingMode::Rne);
    let one = nm
        .mk_fp_value(FloatingPoint::from_real(fmt, RoundingMode::Rne, "1").unwrap());
    // a = 1 forces a + a = 2, which is not zero.
    let eq1 = nm.mk_eq(a, one);
    let sum = nm.mk_node(Kind::FpAdd, &[rm, a, a], &[]);
    let zero = nm.mk_node(Kind::FpIsZero, &[sum], &[]);
    ctx.assert_formula(eq1).unwrap();
    ctx.assert_formula(zero).unwrap();
    assert_eq!(ctx.solve(&[]).unwrap(), SatResult::Unsat);
}
