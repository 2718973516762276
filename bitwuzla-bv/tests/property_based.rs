//! Property-based tests cross-checking bit-vector operations against
//! native integer arithmetic at small widths.

use bitwuzla_bv::BvValue;
use proptest::prelude::*;

const WIDTH: u64 = 8;

fn bv(v: u64) -> BvValue {
    BvValue::from_u64(WIDTH, v)
}

proptest! {
    #[test]
    fn add_matches_wrapping(a in 0u64..256, b in 0u64..256) {
        prop_assert_eq!(bv(a).add(&bv(b)), bv((a + b) % 256));
    }

    #[test]
    fn sub_matches_wrapping(a in 0u64..256, b in 0u64..256) {
        prop_assert_eq!(bv(a).sub(&bv(b)), bv((256 + a - b) % 256));
    }

    #[test]
    fn mul_matches_wrapping(a in 0u64..256, b in 0u64..256) {
        prop_assert_eq!(bv(a).mul(&bv(b)), bv((a * b) % 256));
    }

    #[test]
    fn udiv_urem_reconstruct(a in 0u64..256, b in 1u64..256) {
        let (q, r) = bv(a).udivurem(&bv(b));
        prop_assert_eq!(q.to_u64().unwrap() * b + r.to_u64().unwrap(), a);
        prop_assert!(r.to_u64().unwrap() < b);
    }

    #[test]
    fn uaddo_matches_integers(a in 0u64..256, b in 0u64..256) {
        prop_assert_eq!(bv(a).uaddo(&bv(b)), a + b >= 256);
    }

    #[test]
    fn umulo_matches_integers(a in 0u64..256, b in 0u64..256) {
        prop_assert_eq!(bv(a).umulo(&bv(b)), a * b >= 256);
    }

    #[test]
    fn saddo_matches_integers(a in -128i64..128, b in -128i64..128) {
        let sum = a + b;
        prop_assert_eq!(
            BvValue::from_i64(WIDTH, a).saddo(&BvValue::from_i64(WIDTH, b)),
            !(-128..=127).contains(&sum)
        );
    }

    #[test]
    fn smulo_matches_integers(a in -128i64..128, b in -128i64..128) {
        let prod = a * b;
        prop_assert_eq!(
            BvValue::from_i64(WIDTH, a).smulo(&BvValue::from_i64(WIDTH, b)),
            !(-128..=127).contains(&prod)
        );
    }

    #[test]
    fn signed_order_matches_i64(a in -128i64..128, b in -128i64..128) {
        let x = BvValue::from_i64(WIDTH, a);
        let y = BvValue::from_i64(WIDTH, b);
        prop_assert_eq!(x.slt(&y), a < b);
        prop_assert_eq!(x.sle(&y), a <= b);
    }

    #[test]
    fn shifts_match_native(a in 0u64..256, n in 0u64..16) {
        let x = bv(a);
        let amount = bv(n);
        let expect_shl = if n >= 8 { 0 } else { (a << n) % 256 };
        let expect_shr = if n >= 8 { 0 } else { a >> n };
        prop_assert_eq!(x.shl(&amount), bv(expect_shl));
        prop_assert_eq!(x.shr(&amount), bv(expect_shr));
        let expect_ashr = ((a as i64 - if a >= 128 { 256 } else { 0 }) >> n.min(63)) as u64 % 256;
        prop_assert_eq!(x.ashr(&amount), bv(expect_ashr));
    }

    #[test]
    fn parse_print_roundtrip(a in 0u64..256, base in prop::sample::select(vec![2u32, 10, 16])) {
        let x = bv(a);
        let s = x.to_string_radix(base);
        prop_assert_eq!(BvValue::parse(WIDTH, &s, base).unwrap(), x);
    }

    #[test]
    fn neg_is_sub_from_zero(a in 0u64..256) {
        prop_assert_eq!(bv(a).neg(), bv(0).sub(&bv(a)));
    }

    #[test]
    fn extract_concat_identity(a in 0u64..256) {
        let x = bv(a);
        let hi = x.extract(7, 4);
        let lo = x.extract(3, 0);
        prop_assert_eq!(hi.concat(&lo), x);
    }
}
