//! Arbitrary-width bit-vector values.
//!
//! This crate provides [`BvValue`], a fixed-width bit-vector backed by
//! [`num_bigint::BigUint`], implementing the full SMT-LIB bit-vector
//! operation set including the division-by-zero and shift-saturation
//! semantics mandated by the standard:
//!
//! - `bvudiv` by zero yields all-ones, `bvurem` by zero yields the dividend
//! - `bvsdiv` by zero yields all-ones for a non-negative dividend, else one
//! - `bvsrem`/`bvsmod` by zero yield the dividend
//! - shifts by amounts `>= width` saturate to zero (arithmetic right shift
//!   saturates to the replicated sign bit)
//!
//! # Examples
//!
//! ```
//! use bitwuzla_bv::BvValue;
//!
//! let a = BvValue::from_u64(8, 200);
//! let b = BvValue::from_u64(8, 100);
//! assert_eq!(a.add(&b), BvValue::from_u64(8, 44)); // wraps mod 2^8
//! assert!(a.uaddo(&b)); // unsigned overflow
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod value;

pub use value::{BvError, BvValue};
