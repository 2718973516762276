//! Bitwuzla: an SMT solver for the theories of fixed-size bit-vectors,
//! floating-point arithmetic, arrays and uninterpreted functions.
//!
//! The [`Bitwuzla`] session object owns a solving context and exposes the
//! full term/sort construction and solving API. `Sort` and `Term` handles
//! are small copyable values comparing by id.
//!
//! # Examples
//!
//! ```
//! use bitwuzla::{Bitwuzla, CheckResult, Kind, Options};
//!
//! let mut options = Options::default();
//! options.produce_models = true;
//! let mut bzla = Bitwuzla::new(options).unwrap();
//!
//! let bv8 = bzla.mk_bv_sort(8).unwrap();
//! let x = bzla.mk_const(bv8, Some("x"));
//! let three = bzla.mk_bv_value_uint64(bv8, 3).unwrap();
//! let prod = bzla.mk_term(Kind::BvMul, &[x, three], &[]).unwrap();
//! let fifteen = bzla.mk_bv_value(bv8, "15", 10).unwrap();
//! let eq = bzla.mk_term(Kind::Equal, &[prod, fifteen], &[]).unwrap();
//!
//! bzla.assert_formula(eq).unwrap();
//! assert_eq!(bzla.check_sat().unwrap(), CheckResult::Sat);
//! assert_eq!(bzla.get_bv_value(x, 10).unwrap(), "5");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod session;

pub use bitwuzla_bv::BvValue;
pub use bitwuzla_core::error::{Error, Result};
pub use bitwuzla_core::node::{Kind, Node as Term};
pub use bitwuzla_core::option::{BvSolverMode, Options, PropPathSelection, SatSolverKind};
pub use bitwuzla_core::sort::Sort;
pub use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};
pub use session::{Bitwuzla, CheckResult};
