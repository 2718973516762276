//! Fixed-width bit-vector values and their operations.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use thiserror::Error;

/// Errors produced when constructing bit-vector values from strings or
/// native integers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BvError {
    /// The given string does not denote a value of the requested width.
    #[error("invalid bit-vector value: {0}")]
    InvalidValue(String),
}

/// A bit-vector value of a fixed width.
///
/// The value is stored as an unsigned integer `< 2^width`; the signed
/// interpretation is two's complement. All operations preserve the width
/// unless their signature says otherwise (`concat`, `extract`, ...).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BvValue {
    width: u64,
    bits: BigUint,
}

fn mask(width: u64) -> BigUint {
    (BigUint::one() << width) - BigUint::one()
}

impl BvValue {
    /// Create a value of the given width, truncating `value` modulo `2^width`.
    pub fn new(width: u64, value: BigUint) -> Self {
        assert!(width > 0, "bit-vector width must be > 0");
        let bits = value & mask(width);
        Self { width, bits }
    }

    /// The all-zero value.
    pub fn zero(width: u64) -> Self {
        Self::new(width, BigUint::zero())
    }

    /// The value one.
    pub fn one(width: u64) -> Self {
        Self::new(width, BigUint::one())
    }

    /// The all-ones value (unsigned maximum, signed minus one).
    pub fn ones(width: u64) -> Self {
        assert!(width > 0);
        Self {
            width,
            bits: mask(width),
        }
    }

    /// The smallest signed value `10...0`.
    pub fn min_signed(width: u64) -> Self {
        assert!(width > 0);
        Self {
            width,
            bits: BigUint::one() << (width - 1),
        }
    }

    /// The largest signed value `01...1`.
    pub fn max_signed(width: u64) -> Self {
        assert!(width > 0);
        Self {
            width,
            bits: mask(width) >> 1u32,
        }
    }

    /// A width-1 value from a Boolean.
    pub fn from_bool(b: bool) -> Self {
        if b {
            Self::one(1)
        } else {
            Self::zero(1)
        }
    }

    /// Create from a native unsigned integer, truncating to `width` bits.
    pub fn from_u64(width: u64, value: u64) -> Self {
        Self::new(width, BigUint::from(value))
    }

    /// Create from little-endian bytes, truncating to `width` bits.
    pub fn from_le_bytes(width: u64, bytes: &[u8]) -> Self {
        Self::new(width, BigUint::from_bytes_le(bytes))
    }

    /// Create from a native signed integer, truncating to `width` bits.
    pub fn from_i64(width: u64, value: i64) -> Self {
        if value >= 0 {
            Self::new(width, BigUint::from(value as u64))
        } else {
            // Two's complement of the magnitude.
            Self::from_u64(width, 0).sub(&Self::new(width, BigUint::from(value.unsigned_abs())))
        }
    }

    /// Parse a value of the given width from a string in base 2, 10 or 16.
    ///
    /// Decimal strings may carry a leading `-`; the accepted range is
    /// `[-2^(width-1), 2^width - 1]`. Binary and hexadecimal strings must
    /// denote a magnitude that fits in `width` bits.
    pub fn parse(width: u64, s: &str, base: u32) -> Result<Self, BvError> {
        assert!(width > 0);
        if s.is_empty() {
            return Err(BvError::InvalidValue(format!(
                "empty string for bit-vector of size {width}"
            )));
        }
        let (negative, digits) = match (base, s.strip_prefix('-')) {
            (10, Some(rest)) => (true, rest),
            _ => (false, s),
        };
        if !matches!(base, 2 | 10 | 16) {
            return Err(BvError::InvalidValue(format!("invalid base '{base}'")));
        }
        let magnitude = BigUint::parse_bytes(digits.as_bytes(), base).ok_or_else(|| {
            BvError::InvalidValue(format!("'{s}' is not a valid base-{base} value"))
        })?;
        if negative {
            // -2^(width-1) is the smallest representable signed value.
            if magnitude > (BigUint::one() << (width - 1)) {
                return Err(BvError::InvalidValue(format!(
                    "'{s}' does not fit into a bit-vector of size {width}"
                )));
            }
            let m = mask(width);
            let bits = if magnitude.is_zero() {
                BigUint::zero()
            } else {
                ((&m + BigUint::one()) - magnitude) & m
            };
            Ok(Self { width, bits })
        } else {
            if magnitude.bits() > width {
                return Err(BvError::InvalidValue(format!(
                    "'{s}' does not fit into a bit-vector of size {width}"
                )));
            }
            Ok(Self {
                width,
                bits: magnitude,
            })
        }
    }

    /// The width in bits.
    pub fn width(&self) -> u64 {
        self.width
    }

    /// The unsigned interpretation.
    pub fn uint(&self) -> &BigUint {
        &self.bits
    }

    /// The signed (two's complement) interpretation.
    pub fn int(&self) -> BigInt {
        if self.msb() {
            BigInt::from_biguint(Sign::Plus, self.bits.clone())
                - (BigInt::one() << self.width)
        } else {
            BigInt::from_biguint(Sign::Plus, self.bits.clone())
        }
    }

    /// The unsigned value as `u64` if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        self.bits.to_u64()
    }

    /// The signed value as `i64` if it fits.
    pub fn to_i64(&self) -> Option<i64> {
        self.int().to_i64()
    }

    /// Render in the given base (2, 10 or 16). Base 2 is zero-padded to the
    /// width, base 16 to `ceil(width / 4)` digits, base 10 is the plain
    /// unsigned decimal value.
    pub fn to_string_radix(&self, base: u32) -> String {
        match base {
            2 => {
                let s = self.bits.to_str_radix(2);
                let pad = self.width as usize - s.len();
                format!("{}{}", "0".repeat(pad), s)
            }
            16 => {
                let digits = (self.width as usize).div_ceil(4);
                let s = self.bits.to_str_radix(16);
                format!("{}{}", "0".repeat(digits - s.len()), s)
            }
            10 => self.bits.to_str_radix(10),
            _ => panic!("unsupported base {base}"),
        }
    }

    /// The most significant (sign) bit.
    pub fn msb(&self) -> bool {
        self.bits.bit(self.width - 1)
    }

    /// The least significant bit.
    pub fn lsb(&self) -> bool {
        self.bits.bit(0)
    }

    /// Bit at position `i` (0 is the least significant).
    pub fn bit(&self, i: u64) -> bool {
        assert!(i < self.width);
        self.bits.bit(i)
    }

    /// True iff the value is zero.
    pub fn is_zero(&self) -> bool {
        self.bits.is_zero()
    }

    /// True iff the value is one.
    pub fn is_one(&self) -> bool {
        self.bits.is_one()
    }

    /// True iff all bits are set.
    pub fn is_ones(&self) -> bool {
        self.bits == mask(self.width)
    }

    /// True iff this is the smallest signed value.
    pub fn is_min_signed(&self) -> bool {
        self.bits == BigUint::one() << (self.width - 1)
    }

    /// True iff this is the largest signed value.
    pub fn is_max_signed(&self) -> bool {
        self.bits == mask(self.width) >> 1u32
    }

    /// True iff the value is a power of two.
    pub fn is_power_of_two(&self) -> bool {
        !self.bits.is_zero() && (&self.bits & (&self.bits - BigUint::one())).is_zero()
    }

    /// Number of leading zero bits.
    pub fn count_leading_zeros(&self) -> u64 {
        self.width - self.bits.bits()
    }

    /// Number of trailing zero bits.
    pub fn count_trailing_zeros(&self) -> u64 {
        self.bits.trailing_zeros().unwrap_or(self.width)
    }

    fn wrap(&self, value: BigUint) -> Self {
        Self::new(self.width, value)
    }

    fn wrap_int(&self, value: BigInt) -> Self {
        let m = BigInt::one() << self.width;
        let v = value.mod_floor(&m);
        Self {
            width: self.width,
            bits: v.to_biguint().unwrap_or_default(),
        }
    }

    /* ---- arithmetic ---------------------------------------------------- */

    /// Addition modulo `2^width`.
    pub fn add(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        self.wrap(&self.bits + &other.bits)
    }

    /// Subtraction modulo `2^width`.
    pub fn sub(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        let m = BigUint::one() << self.width;
        self.wrap(&self.bits + m - &other.bits)
    }

    /// Multiplication modulo `2^width`.
    pub fn mul(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        self.wrap(&self.bits * &other.bits)
    }

    /// Two's complement negation.
    pub fn neg(&self) -> Self {
        Self::zero(self.width).sub(self)
    }

    /// Increment by one.
    pub fn inc(&self) -> Self {
        self.wrap(&self.bits + BigUint::one())
    }

    /// Decrement by one.
    pub fn dec(&self) -> Self {
        self.sub(&Self::one(self.width))
    }

    /// Unsigned division; division by zero yields all-ones.
    pub fn udiv(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        if other.is_zero() {
            Self::ones(self.width)
        } else {
            self.wrap(&self.bits / &other.bits)
        }
    }

    /// Unsigned remainder; remainder by zero yields the dividend.
    pub fn urem(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        if other.is_zero() {
            self.clone()
        } else {
            self.wrap(&self.bits % &other.bits)
        }
    }

    /// Signed division truncating towards zero. Division by zero yields
    /// all-ones for a non-negative dividend, one otherwise.
    pub fn sdiv(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        if other.is_zero() {
            return if self.msb() {
                Self::one(self.width)
            } else {
                Self::ones(self.width)
            };
        }
        // BigInt division truncates towards zero, matching bvsdiv.
        self.wrap_int(self.int() / other.int())
    }

    /// Signed remainder (sign follows the dividend); by zero yields the
    /// dividend.
    pub fn srem(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        if other.is_zero() {
            return self.clone();
        }
        self.wrap_int(self.int() % other.int())
    }

    /// Signed modulo (sign follows the divisor); by zero yields the dividend.
    pub fn smod(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        if other.is_zero() {
            return self.clone();
        }
        self.wrap_int(self.int().mod_floor(&other.int()))
    }

    /* ---- bitwise ------------------------------------------------------- */

    /// Bitwise complement.
    pub fn bvnot(&self) -> Self {
        Self {
            width: self.width,
            bits: &self.bits ^ mask(self.width),
        }
    }

    /// Bitwise and.
    pub fn and(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        Self {
            width: self.width,
            bits: &self.bits & &other.bits,
        }
    }

    /// Bitwise or.
    pub fn or(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        Self {
            width: self.width,
            bits: &self.bits | &other.bits,
        }
    }

    /// Bitwise xor.
    pub fn xor(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        Self {
            width: self.width,
            bits: &self.bits ^ &other.bits,
        }
    }

    /// Bitwise nand.
    pub fn nand(&self, other: &Self) -> Self {
        self.and(other).bvnot()
    }

    /// Bitwise nor.
    pub fn nor(&self, other: &Self) -> Self {
        self.or(other).bvnot()
    }

    /// Bitwise xnor.
    pub fn xnor(&self, other: &Self) -> Self {
        self.xor(other).bvnot()
    }

    /// And-reduction to a single bit.
    pub fn redand(&self) -> Self {
        Self::from_bool(self.is_ones())
    }

    /// Or-reduction to a single bit.
    pub fn redor(&self) -> Self {
        Self::from_bool(!self.is_zero())
    }

    /// Xor-reduction to a single bit (parity).
    pub fn redxor(&self) -> Self {
        Self::from_bool(self.bits.count_ones() % 2 == 1)
    }

    /* ---- shifts and rotates -------------------------------------------- */

    fn shift_amount(&self, other: &Self) -> Option<u64> {
        // Amounts >= width saturate; the width always fits in u64.
        if other.bits >= BigUint::from(self.width) {
            None
        } else {
            other.bits.to_u64()
        }
    }

    /// Logical left shift; amounts `>= width` yield zero.
    pub fn shl(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        match self.shift_amount(other) {
            Some(n) => self.wrap(&self.bits << n),
            None => Self::zero(self.width),
        }
    }

    /// Logical right shift; amounts `>= width` yield zero.
    pub fn shr(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        match self.shift_amount(other) {
            Some(n) => self.wrap(&self.bits >> n),
            None => Self::zero(self.width),
        }
    }

    /// Arithmetic right shift; amounts `>= width` replicate the sign bit.
    pub fn ashr(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        let fill = self.msb();
        match self.shift_amount(other) {
            Some(n) => {
                let shifted = &self.bits >> n;
                if fill {
                    let ones_fill = mask(self.width) ^ mask(self.width - n);
                    self.wrap(shifted | ones_fill)
                } else {
                    self.wrap(shifted)
                }
            }
            None => {
                if fill {
                    Self::ones(self.width)
                } else {
                    Self::zero(self.width)
                }
            }
        }
    }

    /// Rotate left by the value of `other` modulo the width.
    pub fn rol(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        let n = (&other.bits % BigUint::from(self.width)).to_u64().unwrap_or(0);
        self.roli(n)
    }

    /// Rotate right by the value of `other` modulo the width.
    pub fn ror(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        let n = (&other.bits % BigUint::from(self.width)).to_u64().unwrap_or(0);
        self.rori(n)
    }

    /// Rotate left by an immediate amount.
    pub fn roli(&self, n: u64) -> Self {
        let n = n % self.width;
        if n == 0 {
            return self.clone();
        }
        let hi = &self.bits >> (self.width - n);
        let lo = (&self.bits << n) & mask(self.width);
        self.wrap(lo | hi)
    }

    /// Rotate right by an immediate amount.
    pub fn rori(&self, n: u64) -> Self {
        let n = n % self.width;
        self.roli(self.width - n)
    }

    /* ---- structural ---------------------------------------------------- */

    /// Concatenation; `self` becomes the most significant part.
    pub fn concat(&self, other: &Self) -> Self {
        let width = self.width + other.width;
        Self {
            width,
            bits: (&self.bits << other.width) | &other.bits,
        }
    }

    /// Extract bits `hi` down to `lo` (inclusive).
    pub fn extract(&self, hi: u64, lo: u64) -> Self {
        assert!(lo <= hi && hi < self.width);
        let width = hi - lo + 1;
        Self {
            width,
            bits: (&self.bits >> lo) & mask(width),
        }
    }

    /// Repeat the value `n` times (`n >= 1`).
    pub fn repeat(&self, n: u64) -> Self {
        assert!(n >= 1);
        let mut res = self.clone();
        for _ in 1..n {
            res = res.concat(self);
        }
        res
    }

    /// Extend by `n` sign bits.
    pub fn sign_extend(&self, n: u64) -> Self {
        let width = self.width + n;
        let bits = if self.msb() {
            &self.bits | (mask(n) << self.width)
        } else {
            self.bits.clone()
        };
        Self { width, bits }
    }

    /// Extend by `n` zero bits.
    pub fn zero_extend(&self, n: u64) -> Self {
        Self {
            width: self.width + n,
            bits: self.bits.clone(),
        }
    }

    /* ---- comparisons --------------------------------------------------- */

    /// Unsigned comparison.
    pub fn ucmp(&self, other: &Self) -> Ordering {
        assert_eq!(self.width, other.width);
        self.bits.cmp(&other.bits)
    }

    /// Signed comparison.
    pub fn scmp(&self, other: &Self) -> Ordering {
        assert_eq!(self.width, other.width);
        // Flipping the sign bit biases two's complement into unsigned order.
        let m = BigUint::one() << (self.width - 1);
        (&self.bits ^ &m).cmp(&(&other.bits ^ &m))
    }

    /// Unsigned less-than.
    pub fn ult(&self, other: &Self) -> bool {
        self.ucmp(other) == Ordering::Less
    }

    /// Unsigned less-or-equal.
    pub fn ule(&self, other: &Self) -> bool {
        self.ucmp(other) != Ordering::Greater
    }

    /// Unsigned greater-than.
    pub fn ugt(&self, other: &Self) -> bool {
        self.ucmp(other) == Ordering::Greater
    }

    /// Unsigned greater-or-equal.
    pub fn uge(&self, other: &Self) -> bool {
        self.ucmp(other) != Ordering::Less
    }

    /// Signed less-than.
    pub fn slt(&self, other: &Self) -> bool {
        self.scmp(other) == Ordering::Less
    }

    /// Signed less-or-equal.
    pub fn sle(&self, other: &Self) -> bool {
        self.scmp(other) != Ordering::Greater
    }

    /// Signed greater-than.
    pub fn sgt(&self, other: &Self) -> bool {
        self.scmp(other) == Ordering::Greater
    }

    /// Signed greater-or-equal.
    pub fn sge(&self, other: &Self) -> bool {
        self.scmp(other) != Ordering::Less
    }

    /// Equality comparison as a width-1 bit-vector (`bvcomp`).
    pub fn comp(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width);
        Self::from_bool(self.bits == other.bits)
    }

    /* ---- overflow predicates ------------------------------------------- */

    /// Unsigned addition overflow.
    pub fn uaddo(&self, other: &Self) -> bool {
        assert_eq!(self.width, other.width);
        (&self.bits + &other.bits).bits() > self.width
    }

    /// Signed addition overflow.
    pub fn saddo(&self, other: &Self) -> bool {
        self.signed_out_of_range(self.int() + other.int())
    }

    /// Unsigned subtraction overflow (borrow).
    pub fn usubo(&self, other: &Self) -> bool {
        assert_eq!(self.width, other.width);
        self.bits < other.bits
    }

    /// Signed subtraction overflow.
    pub fn ssubo(&self, other: &Self) -> bool {
        self.signed_out_of_range(self.int() - other.int())
    }

    /// Unsigned multiplication overflow.
    pub fn umulo(&self, other: &Self) -> bool {
        assert_eq!(self.width, other.width);
        (&self.bits * &other.bits).bits() > self.width
    }

    /// Signed multiplication overflow.
    pub fn smulo(&self, other: &Self) -> bool {
        self.signed_out_of_range(self.int() * other.int())
    }

    /// Signed division overflow: `min_signed / -1`.
    pub fn sdivo(&self, other: &Self) -> bool {
        assert_eq!(self.width, other.width);
        self.is_min_signed() && other.is_ones()
    }

    fn signed_out_of_range(&self, v: BigInt) -> bool {
        let bound = BigInt::one() << (self.width - 1);
        v >= bound || v < -bound
    }

    /// Value-level if-then-else on a width-1 condition.
    pub fn ite(cond: &Self, then: &Self, els: &Self) -> Self {
        assert_eq!(cond.width, 1);
        assert_eq!(then.width, els.width);
        if cond.is_one() {
            then.clone()
        } else {
            els.clone()
        }
    }

    /// Combined unsigned division and remainder.
    pub fn udivurem(&self, other: &Self) -> (Self, Self) {
        (self.udiv(other), self.urem(other))
    }

    /// True as width-1 test: non-zero for width 1.
    pub fn is_true(&self) -> bool {
        assert_eq!(self.width, 1);
        self.is_one()
    }
}

impl fmt::Debug for BvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BvValue({}'{})", self.width, self.to_string_radix(2))
    }
}

impl fmt::Display for BvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_radix(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bv(width: u64, v: u64) -> BvValue {
        BvValue::from_u64(width, v)
    }

    #[test]
    fn test_construction_truncates() {
        assert_eq!(bv(4, 16), bv(4, 0));
        assert_eq!(bv(4, 17), bv(4, 1));
        assert_eq!(BvValue::from_i64(4, -1), BvValue::ones(4));
        assert_eq!(BvValue::from_i64(4, -8), BvValue::min_signed(4));
    }

    #[test]
    fn test_special_values() {
        assert!(BvValue::zero(8).is_zero());
        assert!(BvValue::ones(8).is_ones());
        assert!(BvValue::min_signed(8).is_min_signed());
        assert!(BvValue::max_signed(8).is_max_signed());
        assert_eq!(BvValue::min_signed(8).to_i64(), Some(-128));
        assert_eq!(BvValue::max_signed(8).to_i64(), Some(127));
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(BvValue::parse(4, "10", 10).unwrap(), bv(4, 10));
        assert_eq!(BvValue::parse(4, "-1", 10).unwrap(), BvValue::ones(4));
        assert_eq!(BvValue::parse(4, "-8", 10).unwrap(), BvValue::min_signed(4));
        assert_eq!(BvValue::parse(4, "15", 10).unwrap(), BvValue::ones(4));
        assert!(BvValue::parse(4, "16", 10).is_err());
        assert!(BvValue::parse(4, "-9", 10).is_err());
        assert!(BvValue::parse(4, "", 10).is_err());
        assert!(BvValue::parse(4, "12z", 10).is_err());
    }

    #[test]
    fn test_parse_binary_hex() {
        assert_eq!(BvValue::parse(4, "1010", 2).unwrap(), bv(4, 10));
        assert!(BvValue::parse(4, "10101", 2).is_err());
        assert_eq!(BvValue::parse(8, "ff", 16).unwrap(), BvValue::ones(8));
        assert!(BvValue::parse(8, "1ff", 16).is_err());
        assert!(BvValue::parse(8, "fg", 16).is_err());
    }

    #[test]
    fn test_print_roundtrip() {
        for v in [0u64, 1, 7, 127, 128, 200, 255] {
            let x = bv(8, v);
            for base in [2, 10, 16] {
                let s = x.to_string_radix(base);
                assert_eq!(BvValue::parse(8, &s, base).unwrap(), x);
            }
        }
        assert_eq!(bv(8, 5).to_string_radix(2), "00000101");
        assert_eq!(bv(8, 255).to_string_radix(16), "ff");
        assert_eq!(bv(12, 255).to_string_radix(16), "0ff");
    }

    #[test]
    fn test_div_rem_by_zero() {
        let x = bv(8, 42);
        let z = BvValue::zero(8);
        assert_eq!(x.udiv(&z), BvValue::ones(8));
        assert_eq!(x.urem(&z), x);
        assert_eq!(x.sdiv(&z), BvValue::ones(8)); // non-negative dividend
        assert_eq!(BvValue::from_i64(8, -42).sdiv(&z), BvValue::one(8));
        assert_eq!(x.srem(&z), x);
        assert_eq!(x.smod(&z), x);
    }

    #[test]
    fn test_signed_div_rem_mod() {
        let a = BvValue::from_i64(8, -7);
        let b = bv(8, 2);
        assert_eq!(a.sdiv(&b).to_i64(), Some(-3)); // truncates towards zero
        assert_eq!(a.srem(&b).to_i64(), Some(-1)); // sign of dividend
        assert_eq!(a.smod(&b).to_i64(), Some(1)); // sign of divisor
        let c = BvValue::from_i64(8, 7);
        let d = BvValue::from_i64(8, -2);
        assert_eq!(c.sdiv(&d).to_i64(), Some(-3));
        assert_eq!(c.srem(&d).to_i64(), Some(1));
        assert_eq!(c.smod(&d).to_i64(), Some(-1));
    }

    #[test]
    fn test_shift_saturation() {
        let x = bv(8, 0b1100_0101);
        assert_eq!(x.shl(&bv(8, 8)), BvValue::zero(8));
        assert_eq!(x.shr(&bv(8, 200)), BvValue::zero(8));
        assert_eq!(x.ashr(&bv(8, 8)), BvValue::ones(8));
        assert_eq!(bv(8, 5).ashr(&bv(8, 100)), BvValue::zero(8));
        assert_eq!(x.shl(&bv(8, 2)), bv(8, 0b0001_0100));
        assert_eq!(x.shr(&bv(8, 2)), bv(8, 0b0011_0001));
        assert_eq!(x.ashr(&bv(8, 2)), bv(8, 0b1111_0001));
    }

    #[test]
    fn test_rotates() {
        let x = bv(8, 0b1000_0001);
        assert_eq!(x.roli(1), bv(8, 0b0000_0011));
        assert_eq!(x.rori(1), bv(8, 0b1100_0000));
        assert_eq!(x.roli(8), x);
        assert_eq!(x.rol(&bv(8, 9)), x.roli(1));
        assert_eq!(x.ror(&bv(8, 16)), x);
    }

    #[test]
    fn test_structural() {
        let hi = bv(4, 0b1010);
        let lo = bv(4, 0b0101);
        let cat = hi.concat(&lo);
        assert_eq!(cat, bv(8, 0b1010_0101));
        assert_eq!(cat.extract(7, 4), hi);
        assert_eq!(cat.extract(3, 0), lo);
        assert_eq!(cat.extract(5, 2), bv(4, 0b1001));
        assert_eq!(bv(2, 0b10).repeat(3), bv(6, 0b10_10_10));
        assert_eq!(bv(4, 0b1010).sign_extend(4), bv(8, 0b1111_1010));
        assert_eq!(bv(4, 0b0101).sign_extend(4), bv(8, 0b0000_0101));
        assert_eq!(bv(4, 0b1010).zero_extend(4), bv(8, 0b0000_1010));
    }

    #[test]
    fn test_comparisons() {
        let minus_one = BvValue::ones(8);
        let one = BvValue::one(8);
        assert!(one.ult(&minus_one)); // unsigned: 1 < 255
        assert!(minus_one.slt(&one)); // signed: -1 < 1
        assert!(minus_one.sle(&minus_one));
        assert!(one.sgt(&minus_one));
        assert!(minus_one.ugt(&one));
        assert_eq!(one.comp(&one), BvValue::one(1));
        assert_eq!(one.comp(&minus_one), BvValue::zero(1));
    }

    #[test]
    fn test_reductions() {
        assert_eq!(BvValue::ones(4).redand(), BvValue::one(1));
        assert_eq!(bv(4, 0b1110).redand(), BvValue::zero(1));
        assert_eq!(BvValue::zero(4).redor(), BvValue::zero(1));
        assert_eq!(bv(4, 0b0100).redor(), BvValue::one(1));
        assert_eq!(bv(4, 0b0111).redxor(), BvValue::one(1));
        assert_eq!(bv(4, 0b0110).redxor(), BvValue::zero(1));
    }

    #[test]
    fn test_overflow_predicates() {
        assert!(bv(4, 8).uaddo(&bv(4, 8)));
        assert!(!bv(4, 7).uaddo(&bv(4, 8)));
        assert!(bv(4, 7).saddo(&bv(4, 1)));
        assert!(!bv(4, 6).saddo(&bv(4, 1)));
        assert!(BvValue::min_signed(4).ssubo(&bv(4, 1)));
        assert!(bv(4, 0).usubo(&bv(4, 1)));
        assert!(!bv(4, 1).usubo(&bv(4, 1)));
        assert!(bv(4, 4).umulo(&bv(4, 4)));
        assert!(!bv(4, 3).umulo(&bv(4, 5)));
        assert!(bv(4, 4).smulo(&bv(4, 2)));
        assert!(!bv(4, 2).smulo(&bv(4, 2)));
        assert!(BvValue::min_signed(4).sdivo(&BvValue::ones(4)));
        assert!(!BvValue::min_signed(4).sdivo(&BvValue::one(4)));
    }

    #[test]
    fn test_counting() {
        assert_eq!(bv(8, 0b0001_0000).count_leading_zeros(), 3);
        assert_eq!(bv(8, 0b0001_0000).count_trailing_zeros(), 4);
        assert_eq!(BvValue::zero(8).count_leading_zeros(), 8);
        assert_eq!(BvValue::zero(8).count_trailing_zeros(), 8);
    }

    #[test]
    fn test_wide_values() {
        // Exercise widths beyond native integers.
        let w = 200;
        let x = BvValue::ones(w);
        assert_eq!(x.add(&BvValue::one(w)), BvValue::zero(w));
        assert_eq!(x.to_i64(), Some(-1));
        assert_eq!(x.extract(199, 196), BvValue::ones(4));
        assert!(x.mul(&x).is_one()); // (-1) * (-1) = 1 mod 2^w
    }
}
