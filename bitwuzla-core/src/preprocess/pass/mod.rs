//! The individual preprocessing passes.

pub mod contradicting_ands;
pub mod elim_extracts;
pub mod elim_lambda;
pub mod elim_uninterpreted;
pub mod embedded_constraints;
pub mod flatten_and;
pub mod normalize;
pub mod rewrite;
pub mod skeleton_preproc;
pub mod skolemize;
pub mod variable_substitution;
