//! Packed floating-point values and their IEEE-754 operations.
//!
//! All arithmetic is performed exactly over rationals (or integers with a
//! sticky bit for square roots) followed by a single correctly rounded
//! conversion into the target format.

use std::cmp::Ordering;
use std::fmt;

use bitwuzla_bv::BvValue;
use num_bigint::{BigInt, BigUint};
use num_integer::{Integer, Roots};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use thiserror::Error;

use crate::{FpFormat, RoundingMode};

/// Errors produced when importing floating-point values from strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FpError {
    /// The given string does not denote a real or rational value.
    #[error("invalid floating-point value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FpClass {
    Nan,
    Inf,
    Zero,
    Subnormal,
    Normal,
}

/// An IEEE-754 floating-point value in packed encoding.
///
/// The NaN payload is canonicalised: every NaN produced by this type is the
/// quiet NaN with a positive sign and an otherwise empty payload.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FloatingPoint {
    format: FpFormat,
    bv: BvValue,
}

impl FloatingPoint {
    /* ---- constructors -------------------------------------------------- */

    /// The canonical quiet NaN.
    pub fn nan(format: FpFormat) -> Self {
        let exp = BvValue::ones(format.exp_size);
        let sig = BvValue::min_signed(format.sig_size - 1);
        let bv = BvValue::zero(1).concat(&exp).concat(&sig);
        Self { format, bv }
    }

    /// Positive or negative infinity.
    pub fn inf(format: FpFormat, sign: bool) -> Self {
        let exp = BvValue::ones(format.exp_size);
        let sig = BvValue::zero(format.sig_size - 1);
        let bv = BvValue::from_bool(sign).concat(&exp).concat(&sig);
        Self { format, bv }
    }

    /// Positive or negative zero.
    pub fn zero(format: FpFormat, sign: bool) -> Self {
        let bv = BvValue::from_bool(sign).concat(&BvValue::zero(format.width() - 1));
        Self { format, bv }
    }

    /// The largest finite value of the format.
    pub fn max_finite(format: FpFormat, sign: bool) -> Self {
        let exp = BvValue::ones(format.exp_size).dec();
        let sig = BvValue::ones(format.sig_size - 1);
        let bv = BvValue::from_bool(sign).concat(&exp).concat(&sig);
        Self { format, bv }
    }

    /// Reinterpret a packed IEEE bit-vector of matching width as a value of
    /// the given format. NaN payloads are canonicalised.
    pub fn from_ieee_bv(format: FpFormat, bv: &BvValue) -> Self {
        assert_eq!(bv.width(), format.width());
        let fp = Self {
            format,
            bv: bv.clone(),
        };
        if fp.classify() == FpClass::Nan {
            Self::nan(format)
        } else {
            fp
        }
    }

    /// Construct from a sign bit, exponent field and significand field
    /// (the `fp` indexed constructor). The format is implied by the widths.
    pub fn from_triple(sign: &BvValue, exp: &BvValue, sig: &BvValue) -> Self {
        assert_eq!(sign.width(), 1);
        let format = FpFormat::new(exp.width(), sig.width() + 1);
        Self::from_ieee_bv(format, &sign.concat(exp).concat(sig))
    }

    /// Convert an unsigned bit-vector to a floating-point value.
    pub fn from_ubv(format: FpFormat, rm: RoundingMode, bv: &BvValue) -> Self {
        let q = BigRational::from_integer(BigInt::from(bv.uint().clone()));
        Self::round_rational(format, rm, &q)
    }

    /// Convert a signed bit-vector to a floating-point value.
    pub fn from_sbv(format: FpFormat, rm: RoundingMode, bv: &BvValue) -> Self {
        let q = BigRational::from_integer(bv.int());
        Self::round_rational(format, rm, &q)
    }

    /// Round a real, given as a decimal string (e.g. `-1.25` or `2.5e-3`),
    /// into the format under the given rounding mode.
    pub fn from_real(format: FpFormat, rm: RoundingMode, real: &str) -> Result<Self, FpError> {
        let q = parse_real(real)
            .ok_or_else(|| FpError::InvalidValue(format!("'{real}' is not a valid real")))?;
        Ok(Self::round_rational(format, rm, &q))
    }

    /// Round the rational `num / den`, both given as decimal integer
    /// strings, into the format under the given rounding mode.
    pub fn from_rational(
        format: FpFormat,
        rm: RoundingMode,
        num: &str,
        den: &str,
    ) -> Result<Self, FpError> {
        let n = parse_int(num)
            .ok_or_else(|| FpError::InvalidValue(format!("'{num}' is not a valid integer")))?;
        let d = parse_int(den)
            .ok_or_else(|| FpError::InvalidValue(format!("'{den}' is not a valid integer")))?;
        if d.is_zero() {
            return Err(FpError::InvalidValue("rational with zero denominator".into()));
        }
        Ok(Self::round_rational(format, rm, &BigRational::new(n, d)))
    }

    /// Convert into another floating-point format.
    pub fn to_fp(&self, format: FpFormat, rm: RoundingMode) -> Self {
        match self.classify() {
            FpClass::Nan => Self::nan(format),
            FpClass::Inf => Self::inf(format, self.sign_bit()),
            FpClass::Zero => Self::zero(format, self.sign_bit()),
            _ => Self::round_rational(format, rm, &self.to_rational().unwrap()),
        }
    }

    /* ---- accessors ----------------------------------------------------- */

    /// The format of this value.
    pub fn format(&self) -> FpFormat {
        self.format
    }

    /// The packed IEEE encoding.
    pub fn as_bv(&self) -> &BvValue {
        &self.bv
    }

    /// The sign bit (true for negative).
    pub fn sign_bit(&self) -> bool {
        self.bv.msb()
    }

    /// The biased exponent field.
    pub fn exp_field(&self) -> BvValue {
        let w = self.format.width();
        self.bv.extract(w - 2, self.format.sig_size - 1)
    }

    /// The significand field (without the hidden bit).
    pub fn sig_field(&self) -> BvValue {
        self.bv.extract(self.format.sig_size - 2, 0)
    }

    fn classify(&self) -> FpClass {
        let exp = self.exp_field();
        let sig = self.sig_field();
        if exp.is_ones() {
            if sig.is_zero() {
                FpClass::Inf
            } else {
                FpClass::Nan
            }
        } else if exp.is_zero() {
            if sig.is_zero() {
                FpClass::Zero
            } else {
                FpClass::Subnormal
            }
        } else {
            FpClass::Normal
        }
    }

    /// The exact rational value; `None` for NaN and infinities.
    pub fn to_rational(&self) -> Option<BigRational> {
        let p = self.format.sig_size;
        let (sig, exp) = match self.classify() {
            FpClass::Nan | FpClass::Inf => return None,
            FpClass::Zero => return Some(BigRational::zero()),
            FpClass::Subnormal => (self.sig_field().uint().clone(), self.format.emin()),
            FpClass::Normal => {
                let hidden = BigUint::one() << (p - 1);
                let sig = self.sig_field().uint().clone() | hidden;
                let exp = self.exp_field().to_u64().unwrap() as i64 - self.format.bias();
                (sig, exp)
            }
        };
        // value = sig * 2^(exp - (p - 1))
        let shift = exp - (p as i64 - 1);
        let mut q = BigRational::from_integer(BigInt::from(sig));
        q *= pow2(shift);
        Some(if self.sign_bit() { -q } else { q })
    }

    /* ---- classification predicates ------------------------------------- */

    /// True iff this is NaN.
    pub fn is_nan(&self) -> bool {
        self.classify() == FpClass::Nan
    }

    /// True iff this is positive or negative infinity.
    pub fn is_inf(&self) -> bool {
        self.classify() == FpClass::Inf
    }

    /// True iff this is positive or negative zero.
    pub fn is_zero(&self) -> bool {
        self.classify() == FpClass::Zero
    }

    /// True iff this is a normal number.
    pub fn is_normal(&self) -> bool {
        self.classify() == FpClass::Normal
    }

    /// True iff this is a subnormal number.
    pub fn is_subnormal(&self) -> bool {
        self.classify() == FpClass::Subnormal
    }

    /// True iff the value is negative (sign bit set and not NaN).
    pub fn is_neg(&self) -> bool {
        !self.is_nan() && self.sign_bit()
    }

    /// True iff the value is positive (sign bit clear and not NaN).
    pub fn is_pos(&self) -> bool {
        !self.is_nan() && !self.sign_bit()
    }

    /* ---- sign operations ------------------------------------------------ */

    /// Absolute value.
    pub fn abs(&self) -> Self {
        if self.is_nan() {
            return Self::nan(self.format);
        }
        let w = self.format.width();
        Self {
            format: self.format,
            bv: BvValue::zero(1).concat(&self.bv.extract(w - 2, 0)),
        }
    }

    /// Negation.
    pub fn neg(&self) -> Self {
        if self.is_nan() {
            return Self::nan(self.format);
        }
        let w = self.format.width();
        let sign = BvValue::from_bool(!self.sign_bit());
        Self {
            format: self.format,
            bv: sign.concat(&self.bv.extract(w - 2, 0)),
        }
    }

    /* ---- arithmetic ----------------------------------------------------- */

    /// IEEE addition.
    pub fn add(&self, rm: RoundingMode, other: &Self) -> Self {
        assert_eq!(self.format, other.format);
        let fmt = self.format;
        if self.is_nan() || other.is_nan() {
            return Self::nan(fmt);
        }
        if self.is_inf() {
            if other.is_inf() && self.sign_bit() != other.sign_bit() {
                return Self::nan(fmt);
            }
            return Self::inf(fmt, self.sign_bit());
        }
        if other.is_inf() {
            return Self::inf(fmt, other.sign_bit());
        }
        let sum = self.to_rational().unwrap() + other.to_rational().unwrap();
        if sum.is_zero() {
            let sign = if self.is_zero() && other.is_zero() && self.sign_bit() == other.sign_bit()
            {
                self.sign_bit()
            } else {
                rm == RoundingMode::Rtn
            };
            return Self::zero(fmt, sign);
        }
        Self::round_rational(fmt, rm, &sum)
    }

    /// IEEE subtraction, `a - b = a + (-b)`.
    pub fn sub(&self, rm: RoundingMode, other: &Self) -> Self {
        self.add(rm, &other.neg())
    }

    /// IEEE multiplication.
    pub fn mul(&self, rm: RoundingMode, other: &Self) -> Self {
        assert_eq!(self.format, other.format);
        let fmt = self.format;
        if self.is_nan() || other.is_nan() {
            return Self::nan(fmt);
        }
        let sign = self.sign_bit() ^ other.sign_bit();
        if self.is_inf() || other.is_inf() {
            if self.is_zero() || other.is_zero() {
                return Self::nan(fmt);
            }
            return Self::inf(fmt, sign);
        }
        if self.is_zero() || other.is_zero() {
            return Self::zero(fmt, sign);
        }
        let prod = self.to_rational().unwrap() * other.to_rational().unwrap();
        Self::round_rational(fmt, rm, &prod)
    }

    /// IEEE division.
    pub fn div(&self, rm: RoundingMode, other: &Self) -> Self {
        assert_eq!(self.format, other.format);
        let fmt = self.format;
        if self.is_nan() || other.is_nan() {
            return Self::nan(fmt);
        }
        let sign = self.sign_bit() ^ other.sign_bit();
        if self.is_inf() {
            if other.is_inf() {
                return Self::nan(fmt);
            }
            return Self::inf(fmt, sign);
        }
        if other.is_inf() {
            return Self::zero(fmt, sign);
        }
        if other.is_zero() {
            if self.is_zero() {
                return Self::nan(fmt);
            }
            return Self::inf(fmt, sign);
        }
        if self.is_zero() {
            return Self::zero(fmt, sign);
        }
        let quot = self.to_rational().unwrap() / other.to_rational().unwrap();
        Self::round_rational(fmt, rm, &quot)
    }

    /// Fused multiply-add, `self * b + c` with a single rounding.
    pub fn fma(&self, rm: RoundingMode, b: &Self, c: &Self) -> Self {
        assert_eq!(self.format, b.format);
        assert_eq!(self.format, c.format);
        let fmt = self.format;
        if self.is_nan() || b.is_nan() || c.is_nan() {
            return Self::nan(fmt);
        }
        let prod_sign = self.sign_bit() ^ b.sign_bit();
        if self.is_inf() || b.is_inf() {
            if self.is_zero() || b.is_zero() {
                return Self::nan(fmt);
            }
            if c.is_inf() && c.sign_bit() != prod_sign {
                return Self::nan(fmt);
            }
            return Self::inf(fmt, prod_sign);
        }
        if c.is_inf() {
            return Self::inf(fmt, c.sign_bit());
        }
        let prod_zero = self.is_zero() || b.is_zero();
        let sum = self.to_rational().unwrap() * b.to_rational().unwrap()
            + c.to_rational().unwrap();
        if sum.is_zero() {
            let sign = if prod_zero && c.is_zero() && prod_sign == c.sign_bit() {
                prod_sign
            } else {
                rm == RoundingMode::Rtn
            };
            return Self::zero(fmt, sign);
        }
        Self::round_rational(fmt, rm, &sum)
    }

    /// IEEE square root.
    pub fn sqrt(&self, rm: RoundingMode) -> Self {
        let fmt = self.format;
        if self.is_nan() {
            return Self::nan(fmt);
        }
        if self.is_zero() {
            return self.clone();
        }
        if self.sign_bit() {
            return Self::nan(fmt);
        }
        if self.is_inf() {
            return Self::inf(fmt, false);
        }
        let q = self.to_rational().unwrap();
        let (n, d) = (
            q.numer().magnitude().clone(),
            q.denom().magnitude().clone(),
        );
        let p = fmt.sig_size;
        // Scale until the integer square root carries enough bits for a
        // correctly rounded result (p + 3 significant bits suffice; the
        // sticky bit accounts for the truncated tail).
        let mut j: u64 = p + 6;
        loop {
            let scaled = &n << (2 * j);
            let (int_part, r1) = scaled.div_rem(&d);
            if int_part.bits() < 2 * p + 8 {
                j += (2 * p + 8 - int_part.bits()) / 2 + 1;
                continue;
            }
            let t = int_part.sqrt();
            let r2 = &int_part - &t * &t;
            let sticky = !r1.is_zero() || !r2.is_zero();
            return Self::round_abs(fmt, rm, false, &t, &(BigUint::one() << j), sticky);
        }
    }

    /// IEEE remainder: `a - b * n` with `n` the integer nearest `a / b`
    /// (ties to even). Always exact; takes no rounding mode.
    pub fn rem(&self, other: &Self) -> Self {
        assert_eq!(self.format, other.format);
        let fmt = self.format;
        if self.is_nan() || other.is_nan() || self.is_inf() || other.is_zero() {
            return Self::nan(fmt);
        }
        if other.is_inf() || self.is_zero() {
            return self.clone();
        }
        let qa = self.to_rational().unwrap();
        let qb = other.to_rational().unwrap();
        let n = round_int_nearest_even(&(&qa / &qb));
        let r = &qa - &qb * BigRational::from_integer(n);
        if r.is_zero() {
            return Self::zero(fmt, self.sign_bit());
        }
        Self::round_rational(fmt, RoundingMode::Rne, &r)
    }

    /// Round to the nearest integral value under the given rounding mode.
    pub fn rti(&self, rm: RoundingMode) -> Self {
        let fmt = self.format;
        match self.classify() {
            FpClass::Nan => return Self::nan(fmt),
            FpClass::Inf | FpClass::Zero => return self.clone(),
            _ => {}
        }
        let q = self.to_rational().unwrap();
        let n = round_int(rm, &q);
        if n.is_zero() {
            return Self::zero(fmt, self.sign_bit());
        }
        Self::round_rational(fmt, rm, &BigRational::from_integer(n))
    }

    /// IEEE minimum. If exactly one argument is NaN the other is returned;
    /// zeros of mixed sign yield negative zero.
    pub fn min(&self, other: &Self) -> Self {
        assert_eq!(self.format, other.format);
        if self.is_nan() {
            return other.clone();
        }
        if other.is_nan() {
            return self.clone();
        }
        if self.is_zero() && other.is_zero() {
            return Self::zero(self.format, self.sign_bit() || other.sign_bit());
        }
        match self.fp_cmp(other) {
            Some(Ordering::Greater) => other.clone(),
            _ => self.clone(),
        }
    }

    /// IEEE maximum. If exactly one argument is NaN the other is returned;
    /// zeros of mixed sign yield positive zero.
    pub fn max(&self, other: &Self) -> Self {
        assert_eq!(self.format, other.format);
        if self.is_nan() {
            return other.clone();
        }
        if other.is_nan() {
            return self.clone();
        }
        if self.is_zero() && other.is_zero() {
            return Self::zero(self.format, self.sign_bit() && other.sign_bit());
        }
        match self.fp_cmp(other) {
            Some(Ordering::Less) => other.clone(),
            _ => self.clone(),
        }
    }

    /* ---- comparisons ----------------------------------------------------- */

    fn fp_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.is_nan() || other.is_nan() {
            return None;
        }
        let rank = |fp: &Self| -> i8 {
            if fp.is_inf() {
                if fp.sign_bit() {
                    -1
                } else {
                    1
                }
            } else {
                0
            }
        };
        let (ra, rb) = (rank(self), rank(other));
        if ra != 0 || rb != 0 {
            return Some(ra.cmp(&rb).then_with(|| Ordering::Equal));
        }
        Some(self.to_rational().unwrap().cmp(&other.to_rational().unwrap()))
    }

    /// IEEE equality (`fp.eq`): false on NaN, `+0 = -0`.
    pub fn fp_eq(&self, other: &Self) -> bool {
        self.fp_cmp(other) == Some(Ordering::Equal)
    }

    /// IEEE less-than: false on NaN.
    pub fn lt(&self, other: &Self) -> bool {
        self.fp_cmp(other) == Some(Ordering::Less)
    }

    /// IEEE less-or-equal: false on NaN.
    pub fn leq(&self, other: &Self) -> bool {
        matches!(self.fp_cmp(other), Some(Ordering::Less | Ordering::Equal))
    }

    /// IEEE greater-than: false on NaN.
    pub fn gt(&self, other: &Self) -> bool {
        self.fp_cmp(other) == Some(Ordering::Greater)
    }

    /// IEEE greater-or-equal: false on NaN.
    pub fn geq(&self, other: &Self) -> bool {
        matches!(self.fp_cmp(other), Some(Ordering::Greater | Ordering::Equal))
    }

    /* ---- conversions to bit-vectors -------------------------------------- */

    /// Convert to an unsigned bit-vector of the given width. Returns `None`
    /// when the result is unspecified (NaN, infinity, out of range).
    pub fn to_ubv(&self, rm: RoundingMode, width: u64) -> Option<BvValue> {
        let q = self.to_rational()?;
        let n = round_int(rm, &q);
        if n.is_negative() || n.bits() > width {
            return None;
        }
        Some(BvValue::new(width, n.to_biguint().unwrap()))
    }

    /// Convert to a signed bit-vector of the given width. Returns `None`
    /// when the result is unspecified (NaN, infinity, out of range).
    pub fn to_sbv(&self, rm: RoundingMode, width: u64) -> Option<BvValue> {
        let q = self.to_rational()?;
        let n = round_int(rm, &q);
        let bound = BigInt::one() << (width - 1);
        if n >= bound || n < -&bound {
            return None;
        }
        let m = BigInt::one() << width;
        Some(BvValue::new(width, n.mod_floor(&m).to_biguint().unwrap()))
    }

    /* ---- rounding core ---------------------------------------------------- */

    /// Round a non-zero rational into the format.
    pub fn round_rational(format: FpFormat, rm: RoundingMode, q: &BigRational) -> Self {
        if q.is_zero() {
            return Self::zero(format, false);
        }
        let sign = q.is_negative();
        let n = q.numer().magnitude().clone();
        let d = q.denom().magnitude().clone();
        Self::round_abs(format, rm, sign, &n, &d, false)
    }

    /// Round the magnitude `n / d > 0` with an optional sticky bit meaning
    /// the true value lies strictly between `n / d` and the next value at
    /// the same granularity.
    fn round_abs(
        format: FpFormat,
        rm: RoundingMode,
        sign: bool,
        n: &BigUint,
        d: &BigUint,
        sticky: bool,
    ) -> Self {
        let p = format.sig_size;
        // Exponent e with 2^e <= n/d < 2^(e+1).
        let mut e = n.bits() as i64 - d.bits() as i64;
        while cmp_pow2(n, d, e) == Ordering::Less {
            e -= 1;
        }
        while cmp_pow2(n, d, e + 1) != Ordering::Less {
            e += 1;
        }
        let target_e = e.max(format.emin());
        // Quantum exponent: the weight of the result's least significand bit.
        let q_exp = target_e - (p as i64 - 1);
        let (num, den) = if q_exp <= 0 {
            (n << (-q_exp) as u64, d.clone())
        } else {
            (n.clone(), d << q_exp as u64)
        };
        let (mut m, r) = num.div_rem(&den);
        let inexact = !r.is_zero() || sticky;
        let round_up = match rm {
            RoundingMode::Rtz => false,
            RoundingMode::Rtp => !sign && inexact,
            RoundingMode::Rtn => sign && inexact,
            RoundingMode::Rne | RoundingMode::Rna => {
                let twice = &r << 1u32;
                match twice.cmp(&den) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => {
                        if sticky {
                            true
                        } else if rm == RoundingMode::Rna {
                            true
                        } else {
                            m.is_odd()
                        }
                    }
                }
            }
        };
        if round_up {
            m += BigUint::one();
        }
        let mut exp = target_e;
        if m.bits() > p {
            m >>= 1u32;
            exp += 1;
        }
        if m.is_zero() {
            return Self::zero(format, sign);
        }
        if exp > format.emax() {
            return Self::round_overflow(format, rm, sign);
        }
        let sign_bv = BvValue::from_bool(sign);
        if m.bits() == p {
            // Normal: strip the hidden bit, store the biased exponent.
            let biased = (exp + format.bias()) as u64;
            let sig_field = BvValue::new(p - 1, m);
            let exp_field = BvValue::from_u64(format.exp_size, biased);
            let bv = sign_bv.concat(&exp_field).concat(&sig_field);
            Self { format, bv }
        } else {
            let sig_field = BvValue::new(p - 1, m);
            let exp_field = BvValue::zero(format.exp_size);
            let bv = sign_bv.concat(&exp_field).concat(&sig_field);
            Self { format, bv }
        }
    }

    fn round_overflow(format: FpFormat, rm: RoundingMode, sign: bool) -> Self {
        match rm {
            RoundingMode::Rne | RoundingMode::Rna => Self::inf(format, sign),
            RoundingMode::Rtz => Self::max_finite(format, sign),
            RoundingMode::Rtp => {
                if sign {
                    Self::max_finite(format, true)
                } else {
                    Self::inf(format, false)
                }
            }
            RoundingMode::Rtn => {
                if sign {
                    Self::inf(format, true)
                } else {
                    Self::max_finite(format, false)
                }
            }
        }
    }
}

/// Compare `n / d` with `2^e`.
fn cmp_pow2(n: &BigUint, d: &BigUint, e: i64) -> Ordering {
    if e >= 0 {
        n.cmp(&(d << e as u64))
    } else {
        (n << (-e) as u64).cmp(d)
    }
}

/// `2^e` as a rational, for possibly negative `e`.
fn pow2(e: i64) -> BigRational {
    if e >= 0 {
        BigRational::from_integer(BigInt::one() << e as u64)
    } else {
        BigRational::new(BigInt::one(), BigInt::one() << (-e) as u64)
    }
}

/// Round a rational to an integer, ties to even.
fn round_int_nearest_even(q: &BigRational) -> BigInt {
    let floor = q.floor().to_integer();
    let frac = q - BigRational::from_integer(floor.clone());
    let half = BigRational::new(BigInt::one(), BigInt::from(2));
    match frac.cmp(&half) {
        Ordering::Less => floor,
        Ordering::Greater => floor + BigInt::one(),
        Ordering::Equal => {
            if floor.is_even() {
                floor
            } else {
                floor + BigInt::one()
            }
        }
    }
}

/// Round a rational to an integer under the given mode.
fn round_int(rm: RoundingMode, q: &BigRational) -> BigInt {
    match rm {
        RoundingMode::Rtn => q.floor().to_integer(),
        RoundingMode::Rtp => q.ceil().to_integer(),
        RoundingMode::Rtz => q.trunc().to_integer(),
        RoundingMode::Rne => round_int_nearest_even(q),
        RoundingMode::Rna => {
            let mag = q.abs();
            let floor = mag.floor().to_integer();
            let frac = &mag - BigRational::from_integer(floor.clone());
            let half = BigRational::new(BigInt::one(), BigInt::from(2));
            let mag_rounded = if frac >= half {
                floor + BigInt::one()
            } else {
                floor
            };
            if q.is_negative() {
                -mag_rounded
            } else {
                mag_rounded
            }
        }
    }
}

/// Parse a decimal real: `[-]digits[.digits][(e|E)[-]digits]`.
fn parse_real(s: &str) -> Option<BigRational> {
    let s = s.trim();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (mantissa, exp10) = match rest.find(['e', 'E']) {
        Some(i) => {
            let exp: i64 = rest[i + 1..].parse().ok()?;
            (&rest[..i], exp)
        }
        None => (rest, 0),
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(i) => (&mantissa[..i], &mantissa[i + 1..]),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let digits: String = format!("{int_part}{frac_part}");
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let num = BigInt::parse_bytes(digits.as_bytes(), 10)?;
    let scale = exp10 - frac_part.len() as i64;
    let ten = BigInt::from(10);
    let mut q = BigRational::from_integer(num);
    if scale >= 0 {
        q *= BigRational::from_integer(ten.pow(scale as u32));
    } else {
        q /= BigRational::from_integer(ten.pow((-scale) as u32));
    }
    Some(if sign { -q } else { q })
}

/// Parse a decimal integer with optional sign.
fn parse_int(s: &str) -> Option<BigInt> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigInt::parse_bytes(s.as_bytes(), 10)
}

impl fmt::Debug for FloatingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FloatingPoint({}, {})",
            self.format,
            self.bv.to_string_radix(2)
        )
    }
}

impl fmt::Display for FloatingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(fp #b{} #b{} #b{})",
            if self.sign_bit() { 1 } else { 0 },
            self.exp_field().to_string_radix(2),
            self.sig_field().to_string_radix(2)
        )
    }
}
