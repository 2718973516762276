//! Error type shared by the solver core.

use thiserror::Error;

/// Result alias used throughout the core crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the solver core.
///
/// These correspond to contract violations at the public boundary; internal
/// invariant violations are debug assertions instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An API call out of sequence, e.g. `get_value` before a satisfiable
    /// `check_sat`.
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// An unknown option name, or a value outside the option's domain.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// A malformed value string or a value that does not fit its sort.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A sort size outside the allowed range.
    #[error("invalid size: {0}")]
    InvalidSize(String),

    /// An operator index outside the allowed range.
    #[error("invalid index: {0}")]
    InvalidIndex(String),

    /// Child terms whose sorts do not satisfy the kind's signature.
    #[error("sort mismatch: {0}")]
    SortMismatch(String),

    /// A child count outside the kind's arity.
    #[error("arity mismatch: {0}")]
    ArityMismatch(String),

    /// A kind that cannot be constructed through this entry point.
    #[error("invalid kind: {0}")]
    InvalidKind(String),

    /// A feature not implemented by the chosen backend or configuration.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Raised internally when a value computation encounters a term whose
    /// value cannot be derived without another solve; consumed at the
    /// session boundary.
    #[error("cannot compute value of term {0}")]
    ComputeValue(u64),
}
