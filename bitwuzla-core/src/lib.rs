//! Bitwuzla solver core: hash-consed term DAG, rewriting and
//! preprocessing.
//!
//! This crate provides the foundational types of the solver:
//! - [`NodeManager`]: interned sorts and nodes with structural sharing;
//!   syntactic equality is id equality
//! - [`Rewriter`]: cached, level-configurable local term rewriting
//! - [`Preprocessor`]: assertion-level simplification passes over an
//!   [`AssertionView`]
//! - [`Options`]: typed solver configuration
//! - SMT-LIB v2 printing for sorts, terms and values
//!
//! # Examples
//!
//! ```
//! use bitwuzla_core::node::{Kind, NodeManager};
//! use bitwuzla_bv::BvValue;
//!
//! let mut nm = NodeManager::new();
//! let bv32 = nm.sorts.mk_bv(32).unwrap();
//! let x = nm.mk_const(bv32, Some("x"));
//! let one = nm.mk_bv_value(BvValue::one(32));
//! let inc = nm.mk_node(Kind::BvAdd, &[x, one], &[]);
//! assert_eq!(nm.bv_width(inc), 32);
//! ```

#![deny(unsafe_code)]

pub mod assertion;
pub mod error;
pub mod eval;
pub mod node;
pub mod option;
pub mod preprocess;
pub mod printer;
pub mod rewrite;
pub mod sort;

pub use assertion::{AssertionEntry, AssertionStack, AssertionView, Backtrackable};
pub use error::{Error, Result};
pub use node::{Kind, Node, NodeManager, Value};
pub use option::{BvSolverMode, Options, PropPathSelection, SatSolverKind};
pub use preprocess::Preprocessor;
pub use rewrite::Rewriter;
pub use sort::{Sort, SortKind, SortManager};
