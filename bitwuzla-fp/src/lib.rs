//! IEEE-754 floating-point values of arbitrary format.
//!
//! A format is a pair `(exp_size, sig_size)` with both sizes at least 2;
//! the significand size includes the implicit (hidden) bit. Values are
//! stored in packed IEEE encoding as a [`bitwuzla_bv::BvValue`] of width
//! `exp_size + sig_size`, with the NaN payload fixed to the canonical
//! quiet NaN.
//!
//! Operations take an explicit [`RoundingMode`] where IEEE requires one
//! and are computed exactly over rationals before a single correctly
//! rounded conversion into the target format, which makes the
//! implementation a bit-exact software reference independent of the host
//! floating-point unit.
//!
//! # Examples
//!
//! ```
//! use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};
//!
//! let f32 = FpFormat::new(8, 24);
//! let a = FloatingPoint::from_real(f32, RoundingMode::Rne, "0.1").unwrap();
//! let b = FloatingPoint::from_real(f32, RoundingMode::Rne, "0.2").unwrap();
//! let sum = a.add(RoundingMode::Rne, &b);
//! // 0.1 + 0.2 rounds to the float nearest 0.3, not 0.3 itself
//! assert!(!sum.is_nan());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod float;
mod format;

pub use float::{FloatingPoint, FpError};
pub use format::{FpFormat, RoundingMode};
