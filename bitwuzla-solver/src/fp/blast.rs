//! Symbolic IEEE circuits for the rounding floating-point operations.
//!
//! Every operation follows the same plan as the concrete engine in
//! `bitwuzla-fp`: unpack into sign, unbiased exponent and a normalised
//! significand with the hidden bit explicit, compute the exact result with
//! enough extra significand bits plus a sticky bit, and feed one shared
//! rounding circuit that handles subnormal flushing, overflow by mode and
//! packing. Exponent arithmetic runs in two's complement at a width with
//! enough headroom that no intermediate sum can wrap.
//!
//! Significand registers follow one convention throughout: a register of
//! width `w` with its most significant bit set denotes a value in `[1, 2)`
//! scaled by `2^e`, written `value = (m / 2^(w-1)) * 2^e`.

use bitwuzla_bv::BvValue;
use bitwuzla_fp::{FloatingPoint, FpFormat};
use bitwuzla_core::node::{Kind, Node, NodeManager};

/* ---- widths and constants -------------------------------------------- */

fn bits_for(v: u64) -> u64 {
    64 - v.leading_zeros() as u64
}

/// Exponent circuit width for a format: wide enough for sums of two
/// exponents plus significand-sized offsets.
fn exp_width(fmt: FpFormat) -> u64 {
    fmt.exp_size.max(bits_for(2 * fmt.sig_size + 16)) + 4
}

fn cu(nm: &mut NodeManager, w: u64, v: u64) -> Node {
    nm.mk_bv_value(BvValue::from_u64(w, v))
}

fn ci(nm: &mut NodeManager, w: u64, v: i64) -> Node {
    nm.mk_bv_value(BvValue::from_i64(w, v))
}

fn bias_const(nm: &mut NodeManager, fmt: FpFormat, ew: u64) -> Node {
    // 2^(eb-1) - 1, built with value arithmetic so huge formats still work.
    let shift = BvValue::from_u64(ew, fmt.exp_size - 1);
    let v = BvValue::one(ew).shl(&shift).dec();
    nm.mk_bv_value(v)
}

fn emax_const(nm: &mut NodeManager, fmt: FpFormat, ew: u64) -> Node {
    bias_const(nm, fmt, ew)
}

fn emin_const(nm: &mut NodeManager, fmt: FpFormat, ew: u64) -> Node {
    let shift = BvValue::from_u64(ew, fmt.exp_size - 1);
    let bias = BvValue::one(ew).shl(&shift).dec();
    nm.mk_bv_value(BvValue::one(ew).sub(&bias))
}

/// An exponent below anything a finite operand can carry; used to pin
/// zero operands so magnitude comparisons never pick them.
fn min_exp_const(nm: &mut NodeManager, ew: u64) -> Node {
    let shift = BvValue::from_u64(ew, ew - 2);
    nm.mk_bv_value(BvValue::one(ew).shl(&shift).neg())
}

/* ---- small node builders --------------------------------------------- */

fn bin(nm: &mut NodeManager, kind: Kind, a: Node, b: Node) -> Node {
    nm.mk_node(kind, &[a, b], &[])
}

fn add(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvAdd, a, b)
}

fn sub(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvSub, a, b)
}

fn shl(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvShl, a, b)
}

fn shr(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvShr, a, b)
}

fn band(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvAnd, a, b)
}

fn bor(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvOr, a, b)
}

fn ugt(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvUlt, b, a)
}

fn uge(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvUle, b, a)
}

fn slt(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvSlt, a, b)
}

fn sle(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvSle, a, b)
}

fn sgt(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvSlt, b, a)
}

fn sge(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    bin(nm, Kind::BvSle, b, a)
}

fn bxor(nm: &mut NodeManager, a: Node, b: Node) -> Node {
    nm.mk_node(Kind::Xor, &[a, b], &[])
}

fn extract(nm: &mut NodeManager, x: Node, hi: u64, lo: u64) -> Node {
    nm.mk_node(Kind::BvExtract, &[x], &[hi, lo])
}

fn zext(nm: &mut NodeManager, x: Node, n: u64) -> Node {
    if n == 0 {
        x
    } else {
        nm.mk_node(Kind::BvZeroExtend, &[x], &[n])
    }
}

/// Zero-extend or truncate; truncation requires the value to fit.
fn resize(nm: &mut NodeManager, x: Node, w: u64) -> Node {
    let cur = nm.bv_width(x);
    if w > cur {
        zext(nm, x, w - cur)
    } else if w < cur {
        extract(nm, x, w - 1, 0)
    } else {
        x
    }
}

fn bit(nm: &mut NodeManager, x: Node, i: u64) -> Node {
    let b = extract(nm, x, i, i);
    let one = cu(nm, 1, 1);
    nm.mk_eq(b, one)
}

fn bool_bit(nm: &mut NodeManager, b: Node) -> Node {
    let one = cu(nm, 1, 1);
    let zero = cu(nm, 1, 0);
    nm.mk_ite(b, one, zero)
}

fn is_zero(nm: &mut NodeManager, x: Node) -> Node {
    let w = nm.bv_width(x);
    let z = cu(nm, w, 0);
    nm.mk_eq(x, z)
}

fn non_zero(nm: &mut NodeManager, x: Node) -> Node {
    let e = is_zero(nm, x);
    nm.mk_not(e)
}

/// Count of leading zeros as a value of the operand's width.
fn clz(nm: &mut NodeManager, x: Node) -> Node {
    let w = nm.bv_width(x);
    let mut res = cu(nm, w, w);
    // LSB upwards: more significant set bits override.
    for i in 0..w {
        let b = bit(nm, x, i);
        let v = cu(nm, w, w - 1 - i);
        res = nm.mk_ite(b, v, res);
    }
    res
}

/// `(1 << amt) - 1`, saturating to all-ones for `amt >= width`.
fn low_mask(nm: &mut NodeManager, w: u64, amt: Node) -> Node {
    let one = cu(nm, w, 1);
    let shifted = shl(nm, one, amt);
    sub(nm, shifted, one)
}

/// Logical right shift returning the bits shifted out as a sticky flag.
fn shr_sticky(nm: &mut NodeManager, x: Node, amt: Node) -> (Node, Node) {
    let w = nm.bv_width(x);
    let mask = low_mask(nm, w, amt);
    let dropped = band(nm, x, mask);
    let st = non_zero(nm, dropped);
    (shr(nm, x, amt), st)
}

/// Clamp a (possibly negative) exponent-width distance into `[0, limit]`
/// and resize it for use as a shift amount of width `limit_width`.
fn shift_amount(nm: &mut NodeManager, d: Node, ew: u64, limit: u64) -> Node {
    let zero = cu(nm, ew, 0);
    let lim = cu(nm, ew, limit);
    let neg = slt(nm, d, zero);
    let dp = nm.mk_ite(neg, zero, d);
    let big = sgt(nm, dp, lim);
    let dc = nm.mk_ite(big, lim, dp);
    resize(nm, dc, limit)
}

/// Shift a register left so its most significant bit is set, adjusting
/// the exponent. Zero registers stay zero.
fn normalize(nm: &mut NodeManager, ew: u64, m: Node, e: Node) -> (Node, Node) {
    let z = clz(nm, m);
    let mn = shl(nm, m, z);
    let zew = resize(nm, z, ew);
    let en = sub(nm, e, zew);
    (mn, en)
}

/// Reduce (or pad) a normalised register of width `w` to the rounder's
/// `p + 2` bits, folding dropped bits into the sticky flag.
fn fit_sig(nm: &mut NodeManager, m: Node, w: u64, p: u64, sticky: Node) -> (Node, Node) {
    if w >= p + 2 {
        let sig = extract(nm, m, w - 1, w - p - 2);
        if w > p + 2 {
            let rest = extract(nm, m, w - p - 3, 0);
            let more = non_zero(nm, rest);
            let st = nm.mk_or(&[sticky, more]);
            (sig, st)
        } else {
            (sig, sticky)
        }
    } else {
        let wide = zext(nm, m, p + 2 - w);
        let amt = cu(nm, p + 2, p + 2 - w);
        (shl(nm, wide, amt), sticky)
    }
}

/* ---- packed special values ------------------------------------------- */

fn packed_nan(nm: &mut NodeManager, fmt: FpFormat) -> Node {
    nm.mk_bv_value(FloatingPoint::nan(fmt).as_bv().clone())
}

fn packed_with_sign(nm: &mut NodeManager, sign: Node, exp: BvValue, sig: BvValue) -> Node {
    let s = bool_bit(nm, sign);
    let e = nm.mk_bv_value(exp);
    let m = nm.mk_bv_value(sig);
    nm.mk_node(Kind::BvConcat, &[s, e, m], &[])
}

fn packed_inf(nm: &mut NodeManager, fmt: FpFormat, sign: Node) -> Node {
    packed_with_sign(
        nm,
        sign,
        BvValue::ones(fmt.exp_size),
        BvValue::zero(fmt.sig_size - 1),
    )
}

fn packed_zero(nm: &mut NodeManager, fmt: FpFormat, sign: Node) -> Node {
    packed_with_sign(
        nm,
        sign,
        BvValue::zero(fmt.exp_size),
        BvValue::zero(fmt.sig_size - 1),
    )
}

fn packed_max(nm: &mut NodeManager, fmt: FpFormat, sign: Node) -> Node {
    packed_with_sign(
        nm,
        sign,
        BvValue::ones(fmt.exp_size).dec(),
        BvValue::ones(fmt.sig_size - 1),
    )
}

/* ---- unpacking --------------------------------------------------------- */

struct Unpacked {
    nan: Node,
    inf: Node,
    zero: Node,
    sign: Node,
    /// Unbiased exponent, two's complement at the circuit width.
    exp: Node,
    /// Normalised significand with the hidden bit explicit; zero for
    /// zeros.
    sig: Node,
}

fn unpack(nm: &mut NodeManager, fmt: FpFormat, ew: u64, packed: Node) -> Unpacked {
    let w = fmt.width();
    let p = fmt.sig_size;
    let eb = fmt.exp_size;
    let sign = bit(nm, packed, w - 1);
    let expf = extract(nm, packed, w - 2, p - 1);
    let sigf = extract(nm, packed, p - 2, 0);
    let exp_ones = {
        let ones = nm.mk_bv_value(BvValue::ones(eb));
        nm.mk_eq(expf, ones)
    };
    let exp_zero = is_zero(nm, expf);
    let sig_zero = is_zero(nm, sigf);
    let sig_nonzero = nm.mk_not(sig_zero);
    let nan = nm.mk_and(&[exp_ones, sig_nonzero]);
    let inf = nm.mk_and(&[exp_ones, sig_zero]);
    let zero = nm.mk_and(&[exp_zero, sig_zero]);
    let subnormal = nm.mk_and(&[exp_zero, sig_nonzero]);

    let one1 = cu(nm, 1, 1);
    let sig_norm = nm.mk_node(Kind::BvConcat, &[one1, sigf], &[]);
    let s0 = zext(nm, sigf, 1);
    let c = clz(nm, s0);
    let sig_sub = shl(nm, s0, c);

    let bias = bias_const(nm, fmt, ew);
    let emin = emin_const(nm, fmt, ew);
    let expw = zext(nm, expf, ew - eb);
    let e_norm = sub(nm, expw, bias);
    let cew = resize(nm, c, ew);
    let e_sub = sub(nm, emin, cew);

    let e_fin = nm.mk_ite(subnormal, e_sub, e_norm);
    let min_e = min_exp_const(nm, ew);
    let exp = nm.mk_ite(zero, min_e, e_fin);
    let s_fin = nm.mk_ite(subnormal, sig_sub, sig_norm);
    let zp = cu(nm, p, 0);
    let sig = nm.mk_ite(zero, zp, s_fin);

    Unpacked {
        nan,
        inf,
        zero,
        sign,
        exp,
        sig,
    }
}

/* ---- rounding ---------------------------------------------------------- */

fn round_up(nm: &mut NodeManager, rm: Node, sign: Node, lsb: Node, g: Node, st: Node) -> Node {
    let inexact = nm.mk_or(&[g, st]);
    let tie_breaks = nm.mk_or(&[st, lsb]);
    let rne = nm.mk_and(&[g, tie_breaks]);
    let rna = g;
    let not_sign = nm.mk_not(sign);
    let rtp = nm.mk_and(&[not_sign, inexact]);
    let rtn = nm.mk_and(&[sign, inexact]);
    let f = nm.mk_false();
    // Mode codes follow declaration order: RNE, RNA, RTP, RTN, RTZ.
    let mut res = f;
    for (code, up) in [(3u64, rtn), (2, rtp), (1, rna), (0, rne)] {
        let c = cu(nm, 3, code);
        let is_mode = nm.mk_eq(rm, c);
        res = nm.mk_ite(is_mode, up, res);
    }
    res
}

/// The shared rounding and packing circuit.
///
/// `sig` has `p + 2` bits with the most significant bit set (the caller
/// handles exact zeros); `exp` is the unbiased exponent of that leading
/// bit. Handles subnormal flushing, post-increment carries, overflow by
/// mode and underflow to zero.
fn round_and_pack(
    nm: &mut NodeManager,
    fmt: FpFormat,
    ew: u64,
    rm: Node,
    sign: Node,
    exp: Node,
    sig: Node,
    sticky: Node,
) -> Node {
    let p = fmt.sig_size;
    let eb = fmt.exp_size;
    let emin = emin_const(nm, fmt, ew);
    let emax = emax_const(nm, fmt, ew);
    let bias = bias_const(nm, fmt, ew);

    // Flush into the subnormal range before rounding.
    let d = sub(nm, emin, exp);
    let amt = shift_amount(nm, d, ew, p + 2);
    let (sig1, st1) = shr_sticky(nm, sig, amt);
    let sticky1 = nm.mk_or(&[sticky, st1]);
    let zero_ew = cu(nm, ew, 0);
    let flushed = sgt(nm, d, zero_ew);
    let exp1 = nm.mk_ite(flushed, emin, exp);

    let lsb = bit(nm, sig1, 2);
    let g = bit(nm, sig1, 1);
    let r = bit(nm, sig1, 0);
    let st = nm.mk_or(&[r, sticky1]);
    let up = round_up(nm, rm, sign, lsb, g, st);

    let kept = extract(nm, sig1, p + 1, 2);
    let kept1 = zext(nm, kept, 1);
    let one_p1 = cu(nm, p + 1, 1);
    let zero_p1 = cu(nm, p + 1, 0);
    let inc = nm.mk_ite(up, one_p1, zero_p1);
    let sum = add(nm, kept1, inc);
    let carry = bit(nm, sum, p);
    let high = extract(nm, sum, p, 1);
    let low = extract(nm, sum, p - 1, 0);
    let sig2 = nm.mk_ite(carry, high, low);
    let one_ew = cu(nm, ew, 1);
    let bumped = add(nm, exp1, one_ew);
    let exp2 = nm.mk_ite(carry, bumped, exp1);

    let man_zero = is_zero(nm, sig2);
    let overflow = sgt(nm, exp2, emax);
    // Directed modes overflow towards the largest finite value on the
    // side pointing away from infinity.
    let rne_m = {
        let c = cu(nm, 3, 0);
        nm.mk_eq(rm, c)
    };
    let rna_m = {
        let c = cu(nm, 3, 1);
        nm.mk_eq(rm, c)
    };
    let rtp_m = {
        let c = cu(nm, 3, 2);
        nm.mk_eq(rm, c)
    };
    let rtn_m = {
        let c = cu(nm, 3, 3);
        nm.mk_eq(rm, c)
    };
    let not_sign = nm.mk_not(sign);
    let rtp_inf = nm.mk_and(&[rtp_m, not_sign]);
    let rtn_inf = nm.mk_and(&[rtn_m, sign]);
    let to_inf = nm.mk_or(&[rne_m, rna_m, rtp_inf, rtn_inf]);

    let normal = bit(nm, sig2, p - 1);
    let biased = add(nm, exp2, bias);
    let biased_eb = resize(nm, biased, eb);
    let zero_eb = cu(nm, eb, 0);
    let exp_field = nm.mk_ite(normal, biased_eb, zero_eb);
    let sig_field = extract(nm, sig2, p - 2, 0);
    let sbit = bool_bit(nm, sign);
    let packed = nm.mk_node(Kind::BvConcat, &[sbit, exp_field, sig_field], &[]);

    let inf_p = packed_inf(nm, fmt, sign);
    let max_p = packed_max(nm, fmt, sign);
    let ovfl = nm.mk_ite(to_inf, inf_p, max_p);
    let zero_p = packed_zero(nm, fmt, sign);
    let finite = nm.mk_ite(man_zero, zero_p, packed);
    nm.mk_ite(overflow, ovfl, finite)
}

/* ---- shared magnitude addition ---------------------------------------- */

/// Add two operands given in a common register convention: width `w`,
/// significand top bit at `w - 2` (one carry headroom bit), value
/// `(m / 2^(w-2)) * 2^e`, `m == 0` for zero operands. Produces the packed
/// rounded sum; the caller layers the NaN/infinity cases on top.
#[allow(clippy::too_many_arguments)]
fn sum_core(
    nm: &mut NodeManager,
    fmt: FpFormat,
    ew: u64,
    rm: Node,
    s1: Node,
    e1: Node,
    m1: Node,
    s2: Node,
    e2: Node,
    m2: Node,
    w: u64,
) -> Node {
    let p = fmt.sig_size;
    let min_e = min_exp_const(nm, ew);
    let z1 = is_zero(nm, m1);
    let z2 = is_zero(nm, m2);
    let e1z = nm.mk_ite(z1, min_e, e1);
    let e2z = nm.mk_ite(z2, min_e, e2);

    // Pick the operand of larger magnitude.
    let egt = sgt(nm, e1z, e2z);
    let eeq = nm.mk_eq(e1z, e2z);
    let mge = uge(nm, m1, m2);
    let meq_ge = nm.mk_and(&[eeq, mge]);
    let ge = nm.mk_or(&[egt, meq_ge]);
    let el = nm.mk_ite(ge, e1z, e2z);
    let es = nm.mk_ite(ge, e2z, e1z);
    let ml = nm.mk_ite(ge, m1, m2);
    let ms = nm.mk_ite(ge, m2, m1);
    let sl = nm.mk_ite(ge, s1, s2);
    let ss = nm.mk_ite(ge, s2, s1);

    // Align the smaller operand, folding shifted-out bits into sticky.
    let dist = sub(nm, el, es);
    let amt = shift_amount(nm, dist, ew, w);
    let (mss, st) = shr_sticky(nm, ms, amt);

    let same = nm.mk_eq(sl, ss);
    let summed = add(nm, ml, mss);
    // Effective subtraction: dropped sticky bits make the subtrahend
    // slightly larger, so borrow one and keep the sticky flag.
    let one_w = cu(nm, w, 1);
    let zero_w = cu(nm, w, 0);
    let borrow = nm.mk_ite(st, one_w, zero_w);
    let diff0 = sub(nm, ml, mss);
    let diff = sub(nm, diff0, borrow);
    let m = nm.mk_ite(same, summed, diff);

    // Exact zero: both operands zero, or exact cancellation.
    let mzero = is_zero(nm, m);
    let rtn_m = {
        let c = cu(nm, 3, 3);
        nm.mk_eq(rm, c)
    };
    let zsign = nm.mk_ite(same, sl, rtn_m);

    let one_ew = cu(nm, ew, 1);
    let e_core = add(nm, el, one_ew);
    let (mn, en) = normalize(nm, ew, m, e_core);
    let (sig, st2) = fit_sig(nm, mn, w, p, st);
    let rounded = round_and_pack(nm, fmt, ew, rm, sl, en, sig, st2);
    let zp = packed_zero(nm, fmt, zsign);
    nm.mk_ite(mzero, zp, rounded)
}

/// Embed a normalised `p`-bit significand into the [`sum_core`] register
/// convention at width `w`.
fn embed(nm: &mut NodeManager, sig: Node, p: u64, w: u64) -> Node {
    let wide = zext(nm, sig, w - p);
    let amt = cu(nm, w, w - 1 - p);
    shl(nm, wide, amt)
}

/* ---- operations -------------------------------------------------------- */

/// `fp.add` / `fp.sub` over packed encodings.
pub(super) fn blast_add(
    nm: &mut NodeManager,
    fmt: FpFormat,
    rm: Node,
    a: Node,
    b: Node,
    negate_b: bool,
) -> Node {
    let ew = exp_width(fmt);
    let p = fmt.sig_size;
    let ua = unpack(nm, fmt, ew, a);
    let ub = unpack(nm, fmt, ew, b);
    let sb = if negate_b {
        nm.mk_not(ub.sign)
    } else {
        ub.sign
    };

    let w = p + 4;
    let m1 = embed(nm, ua.sig, p, w);
    let m2 = embed(nm, ub.sig, p, w);
    let core = sum_core(nm, fmt, ew, rm, ua.sign, ua.exp, m1, sb, ub.exp, m2, w);

    let sign_clash = bxor(nm, ua.sign, sb);
    let both_inf = nm.mk_and(&[ua.inf, ub.inf, sign_clash]);
    let nan = nm.mk_or(&[ua.nan, ub.nan, both_inf]);
    let inf_a = packed_inf(nm, fmt, ua.sign);
    let inf_b = packed_inf(nm, fmt, sb);
    let nan_p = packed_nan(nm, fmt);
    let t2 = nm.mk_ite(ub.inf, inf_b, core);
    let t1 = nm.mk_ite(ua.inf, inf_a, t2);
    nm.mk_ite(nan, nan_p, t1)
}

/// `fp.mul` over packed encodings.
pub(super) fn blast_mul(nm: &mut NodeManager, fmt: FpFormat, rm: Node, a: Node, b: Node) -> Node {
    let ew = exp_width(fmt);
    let p = fmt.sig_size;
    let ua = unpack(nm, fmt, ew, a);
    let ub = unpack(nm, fmt, ew, b);
    let sign = bxor(nm, ua.sign, ub.sign);

    let ax = zext(nm, ua.sig, p);
    let bx = zext(nm, ub.sig, p);
    let m = bin(nm, Kind::BvMul, ax, bx);
    let one_ew = cu(nm, ew, 1);
    let esum = add(nm, ua.exp, ub.exp);
    let e = add(nm, esum, one_ew);
    let (mn, en) = normalize(nm, ew, m, e);
    let f = nm.mk_false();
    let (sig, st) = fit_sig(nm, mn, 2 * p, p, f);
    let rounded = round_and_pack(nm, fmt, ew, rm, sign, en, sig, st);

    let ia_zb = nm.mk_and(&[ua.inf, ub.zero]);
    let ib_za = nm.mk_and(&[ub.inf, ua.zero]);
    let nan = nm.mk_or(&[ua.nan, ub.nan, ia_zb, ib_za]);
    let is_inf = nm.mk_or(&[ua.inf, ub.inf]);
    let is_zero_r = nm.mk_or(&[ua.zero, ub.zero]);
    let nan_p = packed_nan(nm, fmt);
    let inf_p = packed_inf(nm, fmt, sign);
    let zero_p = packed_zero(nm, fmt, sign);
    let t2 = nm.mk_ite(is_zero_r, zero_p, rounded);
    let t1 = nm.mk_ite(is_inf, inf_p, t2);
    nm.mk_ite(nan, nan_p, t1)
}

/// `fp.div` over packed encodings.
pub(super) fn blast_div(nm: &mut NodeManager, fmt: FpFormat, rm: Node, a: Node, b: Node) -> Node {
    let ew = exp_width(fmt);
    let p = fmt.sig_size;
    let ua = unpack(nm, fmt, ew, a);
    let ub = unpack(nm, fmt, ew, b);
    let sign = bxor(nm, ua.sign, ub.sign);

    let w = 2 * p + 4;
    let numw = zext(nm, ua.sig, p + 4);
    let shift = cu(nm, w, p + 3);
    let num = shl(nm, numw, shift);
    let den = zext(nm, ub.sig, p + 4);
    let q = bin(nm, Kind::BvUdiv, num, den);
    let rem = bin(nm, Kind::BvUrem, num, den);
    let rstick = non_zero(nm, rem);
    let ediff = sub(nm, ua.exp, ub.exp);
    let poff = cu(nm, ew, p);
    let e = add(nm, ediff, poff);
    let (mn, en) = normalize(nm, ew, q, e);
    let (sig, st) = fit_sig(nm, mn, w, p, rstick);
    let rounded = round_and_pack(nm, fmt, ew, rm, sign, en, sig, st);

    let zz = nm.mk_and(&[ua.zero, ub.zero]);
    let ii = nm.mk_and(&[ua.inf, ub.inf]);
    let nan = nm.mk_or(&[ua.nan, ub.nan, zz, ii]);
    let nan_p = packed_nan(nm, fmt);
    let inf_p = packed_inf(nm, fmt, sign);
    let zero_p = packed_zero(nm, fmt, sign);
    let t4 = nm.mk_ite(ub.zero, inf_p, rounded);
    let t3 = nm.mk_ite(ua.zero, zero_p, t4);
    let t2 = nm.mk_ite(ub.inf, zero_p, t3);
    let t1 = nm.mk_ite(ua.inf, inf_p, t2);
    nm.mk_ite(nan, nan_p, t1)
}

/// `fp.fma` over packed encodings: `a * b + c` with one rounding.
pub(super) fn blast_fma(
    nm: &mut NodeManager,
    fmt: FpFormat,
    rm: Node,
    a: Node,
    b: Node,
    c: Node,
) -> Node {
    let ew = exp_width(fmt);
    let p = fmt.sig_size;
    let ua = unpack(nm, fmt, ew, a);
    let ub = unpack(nm, fmt, ew, b);
    let uc = unpack(nm, fmt, ew, c);
    let spab = bxor(nm, ua.sign, ub.sign);

    // Exact double-width product, renormalised.
    let axx = zext(nm, ua.sig, p);
    let bxx = zext(nm, ub.sig, p);
    let m_ab = bin(nm, Kind::BvMul, axx, bxx);
    let one_ew = cu(nm, ew, 1);
    let esum = add(nm, ua.exp, ub.exp);
    let e_ab = add(nm, esum, one_ew);
    let (mpn, epn) = normalize(nm, ew, m_ab, e_ab);

    let w = 2 * p + 4;
    let mp = {
        let wide = zext(nm, mpn, 4);
        let amt = cu(nm, w, 3);
        shl(nm, wide, amt)
    };
    let mc = embed(nm, uc.sig, p, w);
    let core = sum_core(nm, fmt, ew, rm, spab, epn, mp, uc.sign, uc.exp, mc, w);

    let prod_inf = nm.mk_or(&[ua.inf, ub.inf]);
    let ia_zb = nm.mk_and(&[ua.inf, ub.zero]);
    let ib_za = nm.mk_and(&[ub.inf, ua.zero]);
    let c_clash = {
        let differs = bxor(nm, uc.sign, spab);
        nm.mk_and(&[prod_inf, uc.inf, differs])
    };
    let nan = nm.mk_or(&[ua.nan, ub.nan, uc.nan, ia_zb, ib_za, c_clash]);
    let nan_p = packed_nan(nm, fmt);
    let inf_prod = packed_inf(nm, fmt, spab);
    let inf_c = packed_inf(nm, fmt, uc.sign);
    let t2 = nm.mk_ite(uc.inf, inf_c, core);
    let t1 = nm.mk_ite(prod_inf, inf_prod, t2);
    nm.mk_ite(nan, nan_p, t1)
}

/// `fp.sqrt` over packed encodings: digit-recurrence square root.
pub(super) fn blast_sqrt(nm: &mut NodeManager, fmt: FpFormat, rm: Node, a: Node) -> Node {
    let ew = exp_width(fmt);
    let p = fmt.sig_size;
    let ua = unpack(nm, fmt, ew, a);
    let n = p + 3;
    let xw = 2 * n;

    // Place the radicand so the root comes out with its top bit set; an
    // odd exponent shifts one extra position.
    let odd = bit(nm, ua.exp, 0);
    let wide = zext(nm, ua.sig, xw - p);
    let l0 = cu(nm, xw, xw - p - 1);
    let l1 = cu(nm, xw, xw - p);
    let x_even = shl(nm, wide, l0);
    let x_odd = shl(nm, wide, l1);
    let x = nm.mk_ite(odd, x_odd, x_even);

    let mut rem = cu(nm, n + 2, 0);
    let mut root = cu(nm, n, 0);
    let one_n2 = cu(nm, n + 2, 1);
    let two_n2 = cu(nm, n + 2, 2);
    let one_n = cu(nm, n, 1);
    let zero_n = cu(nm, n, 0);
    for i in (0..n).rev() {
        let pair = extract(nm, x, 2 * i + 1, 2 * i);
        let pair_w = zext(nm, pair, n);
        let rem_sh = shl(nm, rem, two_n2);
        rem = bor(nm, rem_sh, pair_w);
        let root_w = zext(nm, root, 2);
        let root_sh = shl(nm, root_w, one_n2);
        let trial = bor(nm, root_sh, one_n2);
        let ge = uge(nm, rem, trial);
        let reduced = sub(nm, rem, trial);
        rem = nm.mk_ite(ge, reduced, rem);
        let root_up = shl(nm, root, one_n);
        let digit = nm.mk_ite(ge, one_n, zero_n);
        root = bor(nm, root_up, digit);
    }
    let st = non_zero(nm, rem);

    // exponent of the root: (e + 2 - 2n - odd) / 2, always an even split.
    let off = ci(nm, ew, 2 - 2 * n as i64);
    let zero_ew = cu(nm, ew, 0);
    let one_ew = cu(nm, ew, 1);
    let odd_ew = nm.mk_ite(odd, one_ew, zero_ew);
    let biased = add(nm, ua.exp, off);
    let numer = sub(nm, biased, odd_ew);
    let half = bin(nm, Kind::BvAshr, numer, one_ew);
    let noff = cu(nm, ew, n - 1);
    let e = add(nm, half, noff);
    let (sig, st2) = fit_sig(nm, root, n, p, st);
    let fsign = nm.mk_false();
    let rounded = round_and_pack(nm, fmt, ew, rm, fsign, e, sig, st2);

    let nz = nm.mk_not(ua.zero);
    let neg = nm.mk_and(&[ua.sign, nz]);
    let nan = nm.mk_or(&[ua.nan, neg]);
    let nan_p = packed_nan(nm, fmt);
    let pos_inf = packed_inf(nm, fmt, fsign);
    let zero_p = packed_zero(nm, fmt, ua.sign);
    let t2 = nm.mk_ite(ua.inf, pos_inf, rounded);
    let t1 = nm.mk_ite(ua.zero, zero_p, t2);
    nm.mk_ite(nan, nan_p, t1)
}

/// `fp.rem` over packed encodings: gated long-division remainder with a
/// final nearest-even adjustment. Always exact, so no rounding mode.
pub(super) fn blast_rem(nm: &mut NodeManager, fmt: FpFormat, a: Node, b: Node) -> Node {
    let ew = exp_width(fmt);
    let p = fmt.sig_size;
    let eb = fmt.exp_size;
    let ua = unpack(nm, fmt, ew, a);
    let ub = unpack(nm, fmt, ew, b);

    // The largest exponent distance any two finite operands can have.
    let steps = (2u64 << (eb - 1)) + p;
    let ediff = sub(nm, ua.exp, ub.exp);

    // Long division of |a| by |b|, one gated step per quotient bit.
    let wr = p + 1;
    let mut r = zext(nm, ua.sig, 1);
    let mbx = zext(nm, ub.sig, 1);
    let mut q_last = nm.mk_false();
    let one_wr = cu(nm, wr, 1);
    for i in 0..=steps {
        let ic = cu(nm, ew, i);
        let active = sle(nm, ic, ediff);
        let ge = uge(nm, r, mbx);
        let take = nm.mk_and(&[active, ge]);
        let reduced = sub(nm, r, mbx);
        r = nm.mk_ite(take, reduced, r);
        q_last = nm.mk_ite(active, ge, q_last);
        let more = slt(nm, ic, ediff);
        let shifted = shl(nm, r, one_wr);
        r = nm.mk_ite(more, shifted, r);
    }
    // Nearest-even adjustment of the last quotient bit.
    let r2 = {
        let rw = zext(nm, r, 1);
        let one = cu(nm, wr + 1, 1);
        shl(nm, rw, one)
    };
    let mbw = zext(nm, ub.sig, 2);
    let gtm = ugt(nm, r2, mbw);
    let tiem = nm.mk_eq(r2, mbw);
    let tie_odd = nm.mk_and(&[tiem, q_last]);
    let do_sub = nm.mk_or(&[gtm, tie_odd]);
    let m_sub = sub(nm, mbx, r);
    let m_main = nm.mk_ite(do_sub, m_sub, r);
    let one_ew = cu(nm, ew, 1);
    let e_main = add(nm, ub.exp, one_ew);

    // One-below case: compare against half the divisor directly.
    let gt2 = ugt(nm, ua.sig, ub.sig);
    let mb2 = {
        let w1 = zext(nm, ub.sig, 1);
        shl(nm, w1, one_wr)
    };
    let ma_x = zext(nm, ua.sig, 1);
    let m2_sub = sub(nm, mb2, ma_x);
    let m_case2 = nm.mk_ite(gt2, m2_sub, ma_x);
    let e_case2 = ub.exp;

    let below = {
        let one = cu(nm, ew, 1);
        let b1 = sub(nm, ub.exp, one);
        nm.mk_eq(ua.exp, b1)
    };
    let m_r = nm.mk_ite(below, m_case2, m_main);
    let e_r = nm.mk_ite(below, e_case2, e_main);
    let flip = nm.mk_ite(below, gt2, do_sub);
    let sign_r = bxor(nm, ua.sign, flip);

    let rzero = is_zero(nm, m_r);
    let (mn, en) = normalize(nm, ew, m_r, e_r);
    let f = nm.mk_false();
    let (sig, st) = fit_sig(nm, mn, wr, p, f);
    let rne = cu(nm, 3, 0);
    let rounded = round_and_pack(nm, fmt, ew, rne, sign_r, en, sig, st);
    let zero_a_sign = packed_zero(nm, fmt, ua.sign);
    let core = nm.mk_ite(rzero, zero_a_sign, rounded);

    // Far below: |a| < |b| / 2, the dividend is already the remainder.
    let far = {
        let two = cu(nm, ew, 2);
        let b2 = sub(nm, ub.exp, two);
        sle(nm, ua.exp, b2)
    };
    let core2 = nm.mk_ite(far, a, core);

    let nan = nm.mk_or(&[ua.nan, ub.nan, ua.inf, ub.zero]);
    let pass = nm.mk_or(&[ub.inf, ua.zero]);
    let nan_p = packed_nan(nm, fmt);
    let t1 = nm.mk_ite(pass, a, core2);
    nm.mk_ite(nan, nan_p, t1)
}

/// `fp.roundToIntegral` over packed encodings.
pub(super) fn blast_rti(nm: &mut NodeManager, fmt: FpFormat, rm: Node, a: Node) -> Node {
    let ew = exp_width(fmt);
    let p = fmt.sig_size;
    let ua = unpack(nm, fmt, ew, a);
    let w = p + 1;

    let pm1 = cu(nm, ew, p - 1);
    let m = zext(nm, ua.sig, 1);
    let d = sub(nm, pm1, ua.exp);
    let amt = shift_amount(nm, d, ew, w);
    let mi = shr(nm, m, amt);
    let one_w = cu(nm, w, 1);
    let am1 = sub(nm, amt, one_w);
    let gmask = shl(nm, one_w, am1);
    let gbits = band(nm, m, gmask);
    let g = non_zero(nm, gbits);
    let smask = low_mask(nm, w, am1);
    let sbits = band(nm, m, smask);
    let st = non_zero(nm, sbits);
    let lsb = bit(nm, mi, 0);
    let up = round_up(nm, rm, ua.sign, lsb, g, st);
    let zero_w = cu(nm, w, 0);
    let inc = nm.mk_ite(up, one_w, zero_w);
    let mi2 = add(nm, mi, inc);

    let mz = is_zero(nm, mi2);
    let wtop = cu(nm, ew, w - 1);
    let (mn, en) = normalize(nm, ew, mi2, wtop);
    let f = nm.mk_false();
    let (sig, st2) = fit_sig(nm, mn, w, p, f);
    let rounded = round_and_pack(nm, fmt, ew, rm, ua.sign, en, sig, st2);
    let zero_p = packed_zero(nm, fmt, ua.sign);
    let core = nm.mk_ite(mz, zero_p, rounded);

    // Values with no fractional bits round to themselves.
    let integral = sge(nm, ua.exp, pm1);
    let special = nm.mk_or(&[ua.inf, ua.zero, integral]);
    let nan_p = packed_nan(nm, fmt);
    let t1 = nm.mk_ite(special, a, core);
    nm.mk_ite(ua.nan, nan_p, t1)
}

/// `fp.to_sbv` / `fp.to_ubv`: conversion to a bit-vector of width `n`.
/// Unspecified results (NaN, infinities, out of range) evaluate to zero,
/// the same fixed witness the value layer uses.
pub(super) fn blast_to_bv(
    nm: &mut NodeManager,
    fmt: FpFormat,
    rm: Node,
    a: Node,
    n: u64,
    signed: bool,
) -> Node {
    let p = fmt.sig_size;
    let ew = exp_width(fmt).max(bits_for(n) + 4);
    let ua = unpack(nm, fmt, ew, a);
    let w = n.max(p) + 3;

    let pm1 = cu(nm, ew, p - 1);
    let m = zext(nm, ua.sig, w - p);
    let dl = sub(nm, ua.exp, pm1);
    let ls = shift_amount(nm, dl, ew, w);
    let int_l = shl(nm, m, ls);
    let dr = sub(nm, pm1, ua.exp);
    let rs = shift_amount(nm, dr, ew, w);
    let mi = shr(nm, m, rs);
    let one_w = cu(nm, w, 1);
    let rm1 = sub(nm, rs, one_w);
    let gmask = shl(nm, one_w, rm1);
    let gb = band(nm, m, gmask);
    let g = non_zero(nm, gb);
    let smask = low_mask(nm, w, rm1);
    let sb = band(nm, m, smask);
    let st = non_zero(nm, sb);
    let lsb = bit(nm, mi, 0);
    let up = round_up(nm, rm, ua.sign, lsb, g, st);
    let zero_w = cu(nm, w, 0);
    let inc = nm.mk_ite(up, one_w, zero_w);
    let int_r = add(nm, mi, inc);
    let frac = slt(nm, ua.exp, pm1);
    let int_abs = nm.mk_ite(frac, int_r, int_l);

    // Wider exponents would shift value bits out of the register.
    let wtop = cu(nm, ew, w);
    let too_big = sge(nm, ua.exp, wtop);
    let base_invalid = nm.mk_or(&[ua.nan, ua.inf, too_big]);

    let invalid = if signed {
        let lim_pos = {
            let v = BvValue::max_signed(n).zero_extend(w - n);
            nm.mk_bv_value(v)
        };
        let lim_neg = {
            let v = BvValue::min_signed(n).zero_extend(w - n);
            nm.mk_bv_value(v)
        };
        let not_sign = nm.mk_not(ua.sign);
        let over_pos = ugt(nm, int_abs, lim_pos);
        let pos_bad = nm.mk_and(&[not_sign, over_pos]);
        let over_neg = ugt(nm, int_abs, lim_neg);
        let neg_bad = nm.mk_and(&[ua.sign, over_neg]);
        nm.mk_or(&[base_invalid, pos_bad, neg_bad])
    } else {
        let lim = {
            let v = BvValue::ones(n).zero_extend(w - n);
            nm.mk_bv_value(v)
        };
        let nz = non_zero(nm, int_abs);
        let neg_bad = nm.mk_and(&[ua.sign, nz]);
        let over = ugt(nm, int_abs, lim);
        nm.mk_or(&[base_invalid, neg_bad, over])
    };

    let magnitude = if signed {
        let negated = nm.mk_node(Kind::BvNeg, &[int_abs], &[]);
        nm.mk_ite(ua.sign, negated, int_abs)
    } else {
        int_abs
    };
    let result = extract(nm, magnitude, n - 1, 0);
    let zero_n = cu(nm, n, 0);
    nm.mk_ite(invalid, zero_n, result)
}

/// `to_fp` from a signed or unsigned bit-vector.
pub(super) fn blast_from_bv(
    nm: &mut NodeManager,
    fmt: FpFormat,
    rm: Node,
    x: Node,
    signed: bool,
) -> Node {
    let p = fmt.sig_size;
    let n = nm.bv_width(x);
    let ew = exp_width(fmt).max(bits_for(n) + 4);
    let (sign, abs) = if signed {
        let s = bit(nm, x, n - 1);
        let negated = nm.mk_node(Kind::BvNeg, &[x], &[]);
        (s, nm.mk_ite(s, negated, x))
    } else {
        (nm.mk_false(), x)
    };
    let w = n.max(p + 2);
    let ax = zext(nm, abs, w - n);
    let zero = is_zero(nm, ax);
    let wtop = cu(nm, ew, w - 1);
    let (mn, en) = normalize(nm, ew, ax, wtop);
    let f = nm.mk_false();
    let (sig, st) = fit_sig(nm, mn, w, p, f);
    let rounded = round_and_pack(nm, fmt, ew, rm, sign, en, sig, st);
    let fsign = nm.mk_false();
    let zero_p = packed_zero(nm, fmt, fsign);
    nm.mk_ite(zero, zero_p, rounded)
}

/// `to_fp` from another floating-point format.
pub(super) fn blast_from_fp(
    nm: &mut NodeManager,
    from: FpFormat,
    to: FpFormat,
    rm: Node,
    a: Node,
) -> Node {
    let ew = exp_width(from).max(exp_width(to));
    let ua = unpack(nm, from, ew, a);
    let f = nm.mk_false();
    let (sig, st) = fit_sig(nm, ua.sig, from.sig_size, to.sig_size, f);
    let rounded = round_and_pack(nm, to, ew, rm, ua.sign, ua.exp, sig, st);
    let nan_p = packed_nan(nm, to);
    let inf_p = packed_inf(nm, to, ua.sign);
    let zero_p = packed_zero(nm, to, ua.sign);
    let t2 = nm.mk_ite(ua.zero, zero_p, rounded);
    let t1 = nm.mk_ite(ua.inf, inf_p, t2);
    nm.mk_ite(ua.nan, nan_p, t1)
}
