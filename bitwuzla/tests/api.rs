//! Public API tests: session usage contracts, values, models, cores and
//! printing.

use bitwuzla::{Bitwuzla, CheckResult, Error, Kind, Options, RoundingMode};

fn session(f: impl FnOnce(&mut Options)) -> Bitwuzla {
    let mut options = Options::default();
    f(&mut options);
    Bitwuzla::new(options).unwrap()
}

#[test]
fn test_mk_term_determinism() {
    let mut bzla = session(|_| {});
    let bv8 = bzla.mk_bv_sort(8).unwrap();
    let x = bzla.mk_const(bv8, Some("x"));
    let y = bzla.mk_const(bv8, Some("y"));
    let a = bzla.mk_term(Kind::BvAdd, &[x, y], &[]).unwrap();
    let b = bzla.mk_term(Kind::BvAdd, &[x, y], &[]).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_construction_errors() {
    let mut bzla = session(|_| {});
    assert!(matches!(bzla.mk_bv_sort(0), Err(Error::InvalidSize(_))));
    assert!(matches!(bzla.mk_fp_sort(1, 8), Err(Error::InvalidSize(_))));
    let bv8 = bzla.mk_bv_sort(8).unwrap();
    let bv9 = bzla.mk_bv_sort(9).unwrap();
    let x = bzla.mk_const(bv8, None);
    let y = bzla.mk_const(bv9, None);
    assert!(matches!(
        bzla.mk_term(Kind::BvAdd, &[x, y], &[]),
        Err(Error::SortMismatch(_))
    ));
    assert!(matches!(
        bzla.mk_term(Kind::BvNot, &[x, x], &[]),
        Err(Error::ArityMismatch(_))
    ));
    assert!(matches!(
        bzla.mk_term(Kind::BvExtract, &[x], &[9, 0]),
        Err(Error::InvalidIndex(_))
    ));
    assert!(matches!(
        bzla.mk_term(Kind::Value, &[], &[]),
        Err(Error::InvalidKind(_))
    ));
    assert!(matches!(
        bzla.mk_bv_value(bv8, "256", 10),
        Err(Error::InvalidValue(_))
    ));
    assert!(matches!(
        bzla.mk_bv_value(bv8, "zz", 16),
        Err(Error::InvalidValue(_))
    ));
}

#[test]
fn test_usage_gating() {
    let mut bzla = session(|_| {});
    let t = bzla.mk_true();
    // push/pop and assumptions require incremental mode.
    assert!(matches!(bzla.push(1), Err(Error::InvalidUsage(_))));
    assert!(matches!(bzla.pop(1), Err(Error::InvalidUsage(_))));
    assert!(matches!(
        bzla.check_sat_assuming(&[t]),
        Err(Error::InvalidUsage(_))
    ));
    // get-value before any check is rejected.
    assert!(matches!(bzla.get_value(t), Err(Error::InvalidUsage(_))));
    // get-value without produce-models is rejected even after SAT.
    bzla.assert_formula(t).unwrap();
    assert_eq!(bzla.check_sat().unwrap(), CheckResult::Sat);
    assert!(matches!(bzla.get_value(t), Err(Error::InvalidUsage(_))));
    // A second check without incremental is rejected.
    assert!(matches!(bzla.check_sat(), Err(Error::InvalidUsage(_))));
}

#[test]
fn test_core_gating() {
    let mut bzla = session(|o| o.incremental = true);
    let b = bzla.mk_bool_sort();
    let a = bzla.mk_const(b, Some("a"));
    bzla.assert_formula(a).unwrap();
    assert_eq!(bzla.check_sat().unwrap(), CheckResult::Sat);
    // Cores require produce-unsat-cores and an UNSAT result.
    assert!(matches!(
        bzla.get_unsat_core(),
        Err(Error::InvalidUsage(_))
    ));
    assert!(matches!(
        bzla.get_unsat_assumptions(),
        Err(Error::InvalidUsage(_))
    ));
}

#[test]
fn test_invalid_option() {
    let mut bzla = session(|_| {});
    assert!(matches!(
        bzla.set_option("no-such", "1"),
        Err(Error::InvalidOption(_))
    ));
    assert!(matches!(
        bzla.set_option("rewrite-level", "7"),
        Err(Error::InvalidOption(_))
    ));
    bzla.set_option("rewrite-level", "1").unwrap();
    // Options freeze after the first check.
    bzla.check_sat().unwrap();
    assert!(matches!(
        bzla.set_option("rewrite-level", "2"),
        Err(Error::InvalidUsage(_))
    ));
}

#[test]
fn test_oneshot_backend_feature_check() {
    let mut options = Options::default();
    options.set("sat-solver", "oneshot").unwrap();
    options.incremental = true;
    assert!(matches!(
        Bitwuzla::new(options),
        Err(Error::Unsupported(_))
    ));
    let mut options = Options::default();
    options.set("sat-solver", "oneshot").unwrap();
    let mut bzla = Bitwuzla::new(options).unwrap();
    let f = bzla.mk_false();
    bzla.assert_formula(f).unwrap();
    assert_eq!(bzla.check_sat().unwrap(), CheckResult::Unsat);
}

#[test]
fn test_bv_value_roundtrip() {
    let mut bzla = session(|o| o.produce_models = true);
    let bv8 = bzla.mk_bv_sort(8).unwrap();
    for (text, base) in [("10101010", 2), ("170", 10), ("aa", 16), ("-86", 10)] {
        let v = bzla.mk_bv_value(bv8, text, base).unwrap();
        let x = bzla.mk_const(bv8, Some("x"));
        let eq = bzla.mk_term(Kind::Equal, &[x, v], &[]).unwrap();
        bzla.assert_formula(eq).unwrap();
    }
    assert_eq!(bzla.check_sat().unwrap(), CheckResult::Sat);
}

#[test]
fn test_get_values() {
    let mut bzla = session(|o| o.produce_models = true);
    let bv8 = bzla.mk_bv_sort(8).unwrap();
    let x = bzla.mk_const(bv8, Some("x"));
    let v = bzla.mk_bv_value(bv8, "42", 10).unwrap();
    let eq = bzla.mk_term(Kind::Equal, &[x, v], &[]).unwrap();
    bzla.assert_formula(eq).unwrap();
    assert_eq!(bzla.check_sat().unwrap(), CheckResult::Sat);
    assert_eq!(bzla.get_bv_value(x, 10).unwrap(), "42");
    assert_eq!(bzla.get_bv_value(x, 2).unwrap(), "00101010");
    assert_eq!(bzla.get_bv_value(x, 16).unwrap(), "2a");
}

#[test]
fn test_get_rm_and_fp_values() {
    let mut bzla = session(|o| o.produce_models = true);
    let f16 = bzla.mk_fp_sort(5, 11).unwrap();
    let rm_sort = bzla.mk_rm_sort();
    let r = bzla.mk_const(rm_sort, Some("r"));
    let rne = bzla.mk_rm_value(RoundingMode::Rne);
    let eq = bzla.mk_term(Kind::Equal, &[r, rne], &[]).unwrap();
    bzla.assert_formula(eq).unwrap();
    let a = bzla.mk_const(f16, Some("a"));
    let one = bzla
        .mk_fp_value_from_real(f16, RoundingMode::Rne, "1.0")
        .unwrap();
    let eq2 = bzla.mk_term(Kind::Equal, &[a, one], &[]).unwrap();
    bzla.assert_formula(eq2).unwrap();
    assert_eq!(bzla.check_sat().unwrap(), CheckResult::Sat);
    assert_eq!(bzla.get_rm_value(r).unwrap(), RoundingMode::Rne);
    let fp = bzla.get_fp_value(a, 2).unwrap();
    assert_eq!(fp, "(fp #b0 #b01111 #b0000000000)");
}

#[test]
fn test_scenario_unsat_core_with_pop() {
    let mut bzla = session(|o| {
        o.incremental = true;
        o.produce_unsat_cores = true;
    });
    let b = bzla.mk_bool_sort();
    let a = bzla.mk_const(b, Some("a"));
    let na = bzla.mk_term(Kind::Not, &[a], &[]).unwrap();
    bzla.push(1).unwrap();
    bzla.assert_formula(a).unwrap();
    bzla.assert_formula(na).unwrap();
    assert_eq!(bzla.check_sat().unwrap(), CheckResult::Unsat);
    let core = bzla.get_unsat_core().unwrap();
    assert_eq!(core.len(), 2);
    assert!(core.contains(&a) && core.contains(&na));
    bzla.pop(1).unwrap();
    assert_eq!(bzla.check_sat().unwrap(), CheckResult::Sat);
}

#[test]
fn test_fp_value_construction() {
    let mut bzla = session(|_| {});
    let bv1 = bzla.mk_bv_sort(1).unwrap();
    let bv8 = bzla.mk_bv_sort(8).unwrap();
    let bv23 = bzla.mk_bv_sort(23).unwrap();
    let sign = bzla.mk_bv_value_uint64(bv1, 0).unwrap();
    let exp = bzla.mk_bv_value_uint64(bv8, 127).unwrap();
    let sig = bzla.mk_bv_value_uint64(bv23, 0).unwrap();
    let one = bzla.mk_fp_value(sign, exp, sig).unwrap();
    // 1.0 in binary32.
    assert_eq!(
        bzla.term_to_string(one, 2),
        "(fp #b0 #b01111111 #b00000000000000000000000)"
    );
}

#[test]
fn test_printing() {
    let mut bzla = session(|_| {});
    let bv8 = bzla.mk_bv_sort(8).unwrap();
    assert_eq!(bzla.sort_to_string(bv8), "(_ BitVec 8)");
    let x = bzla.mk_const(bv8, Some("x"));
    let y = bzla.mk_const(bv8, Some("y"));
    let add = bzla.mk_term(Kind::BvAdd, &[x, y], &[]).unwrap();
    let mul = bzla.mk_term(Kind::BvMul, &[add, add], &[]).unwrap();
    assert_eq!(
        bzla.term_to_string(mul, 2),
        "(let ((_let0 (bvadd x y))) (bvmul _let0 _let0))"
    );
}

#[test]
fn test_print_model() {
    let mut bzla = session(|o| o.produce_models = true);
    let bv8 = bzla.mk_bv_sort(8).unwrap();
    let x = bzla.mk_const(bv8, Some("x"));
    let v = bzla.mk_bv_value(bv8, "7", 10).unwrap();
    let eq = bzla.mk_term(Kind::Equal, &[x, v], &[]).unwrap();
    bzla.assert_formula(eq).unwrap();
    assert_eq!(bzla.check_sat().unwrap(), CheckResult::Sat);
    let model = bzla.print_model(2).unwrap();
    assert!(model.contains("(define-fun x () (_ BitVec 8) #b00000111)"));
}

#[test]
fn test_two_sessions_are_independent() {
    let mut s1 = session(|_| {});
    let mut s2 = session(|_| {});
    let b1 = s1.mk_bool_sort();
    let b2 = s2.mk_bool_sort();
    let t1 = s1.mk_const(b1, Some("p"));
    let _t2 = s2.mk_const(b2, Some("p"));
    s1.assert_formula(t1).unwrap();
    assert_eq!(s1.check_sat().unwrap(), CheckResult::Sat);
    assert_eq!(s2.check_sat().unwrap(), CheckResult::Sat);
}

#[test]
fn test_simplify_is_usable_alone() {
    let mut bzla = session(|_| {});
    let b = bzla.mk_bool_sort();
    let p = bzla.mk_const(b, Some("p"));
    let t = bzla.mk_true();
    let and = bzla.mk_term(Kind::And, &[p, t], &[]).unwrap();
    bzla.assert_formula(and).unwrap();
    bzla.simplify().unwrap();
    // The assertion log still reports the original formula.
    assert_eq!(bzla.get_assertions(), vec![and]);
}

#[test]
fn test_term_reference_counting() {
    let mut bzla = session(|_| {});
    let bv8 = bzla.mk_bv_sort(8).unwrap();
    let x = bzla.mk_const(bv8, Some("x"));
    let v = bzla.mk_bv_value_uint64(bv8, 9).unwrap();
    let eq = bzla.mk_term(Kind::Equal, &[x, v], &[]).unwrap();
    bzla.assert_formula(eq).unwrap();
    // The session keeps asserted formulas alive even after the creator's
    // handles are released.
    bzla.release_term(eq);
    bzla.release_term(v);
    assert_eq!(bzla.check_sat().unwrap(), CheckResult::Sat);
    // Scratch terms can be retained and released freely.
    let scratch = bzla.mk_term(Kind::BvNot, &[x], &[]).unwrap();
    bzla.retain_term(scratch);
    bzla.release_term(scratch);
    bzla.release_term(scratch);
    assert_eq!(bzla.term_sort(x), bv8);
}
