//! Assertion-level preprocessing.
//!
//! The preprocessor runs a fixed-point loop of passes over an
//! [`AssertionView`], level by level: at level `l` only assertions
//! introduced at levels `<= l` are visible, and state bound to popped
//! levels is rewound on `pop`. Passes communicate exclusively through the
//! view (`replace`/`push_derived`), which keeps provenance to the original
//! assertions intact for unsat core reporting.

pub mod pass;

use tracing::debug;

use crate::assertion::{AssertionStack, AssertionView};
use crate::node::{Node, NodeManager};
use crate::option::Options;
use crate::rewrite::Rewriter;

use pass::elim_extracts::PassElimExtracts;
use pass::elim_lambda::PassElimLambda;
use pass::elim_uninterpreted::PassElimUninterpreted;
use pass::variable_substitution::PassVariableSubstitution;

/// Counters of the preprocessing pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreprocessorStats {
    /// Fixed-point iterations over all calls.
    pub num_iterations: u64,
    /// Total assertions modified by any pass.
    pub num_modified: u64,
}

/// Orchestrates the preprocessing passes.
pub struct Preprocessor {
    /// Index into the assertion stack up to which assertions are already
    /// preprocessed.
    watermark: usize,
    pass_variable_substitution: PassVariableSubstitution,
    pass_elim_lambda: PassElimLambda,
    pass_elim_uninterpreted: PassElimUninterpreted,
    pass_elim_extracts: PassElimExtracts,
    stats: PreprocessorStats,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    /// Create a fresh preprocessor.
    pub fn new() -> Self {
        Self {
            watermark: 0,
            pass_variable_substitution: PassVariableSubstitution::new(),
            pass_elim_lambda: PassElimLambda::new(),
            pass_elim_uninterpreted: PassElimUninterpreted::new(),
            pass_elim_extracts: PassElimExtracts::new(),
            stats: PreprocessorStats::default(),
        }
    }

    /// Pipeline counters.
    pub fn stats(&self) -> PreprocessorStats {
        self.stats
    }

    /// Preprocess all assertions not yet processed, level by level.
    pub fn preprocess(
        &mut self,
        nm: &mut NodeManager,
        rewriter: &mut Rewriter,
        options: &Options,
        stack: &mut AssertionStack,
    ) {
        while self.watermark < stack.len() {
            let level = stack.get(self.watermark).level;
            let mut end = self.watermark;
            while end < stack.len() && stack.get(end).level == level {
                end += 1;
            }
            let mut view = AssertionView::new(stack, self.watermark, end);
            self.apply(nm, rewriter, options, &mut view);
            self.watermark = view.stack_end();
        }
    }

    /// Process a single term the way the pipeline would: lambda
    /// elimination, variable substitution, rewriting. Used for value
    /// queries against preprocessed solver state.
    pub fn process(
        &mut self,
        nm: &mut NodeManager,
        rewriter: &mut Rewriter,
        term: Node,
    ) -> Node {
        let term = self.pass_elim_lambda.process(nm, term);
        let term = self.pass_variable_substitution.process(nm, term);
        let term = self.pass_elim_uninterpreted.process(nm, term);
        let term = self.pass_elim_extracts.process(nm, term);
        rewriter.rewrite(nm, term)
    }

    /// Rewind state bound to popped levels.
    pub fn rewind_to(&mut self, level: u64, stack_len: usize) {
        self.watermark = self.watermark.min(stack_len);
        self.pass_variable_substitution.rewind_to(level);
        self.pass_elim_uninterpreted.rewind_to(level);
        self.pass_elim_extracts.rewind_to(level);
    }

    /// The fixed-point pass loop over one level's assertions.
    fn apply(
        &mut self,
        nm: &mut NodeManager,
        rewriter: &mut Rewriter,
        options: &Options,
        assertions: &mut AssertionView,
    ) {
        if assertions.is_empty() {
            return;
        }
        debug!(count = assertions.len(), "preprocessing assertions");
        // Cross-assertion passes would break the provenance map cores rely
        // on, so they are fenced off when core production is enabled.
        let cross_asserting = !options.produce_unsat_cores;
        let mut skeleton_done = false;
        loop {
            assertions.reset_modified();
            self.stats.num_iterations += 1;

            pass::rewrite::apply(nm, rewriter, assertions);

            pass::skolemize::apply(nm, assertions);

            if options.pp_flatten_and {
                pass::flatten_and::apply(nm, assertions);
            }

            if options.pp_variable_subst && cross_asserting {
                self.pass_variable_substitution
                    .apply(nm, rewriter, options, assertions);
            }

            if options.pp_skeleton_preproc && cross_asserting && !skeleton_done {
                pass::skeleton_preproc::apply(nm, assertions);
                skeleton_done = true;
            }

            if options.pp_embedded_constr && cross_asserting {
                pass::embedded_constraints::apply(nm, rewriter, assertions);
            }

            if options.pp_contr_ands {
                pass::contradicting_ands::apply(nm, assertions);
            }

            self.pass_elim_lambda.apply(nm, assertions);

            if cross_asserting {
                self.pass_elim_uninterpreted.apply(nm, assertions);
            }

            if options.pp_elim_bv_extracts && cross_asserting {
                self.pass_elim_extracts.apply(nm, assertions);
            }

            if options.pp_normalize {
                pass::normalize::apply(nm, rewriter, options, assertions);
            }

            self.stats.num_modified += assertions.num_modified();
            if !assertions.modified() {
                break;
            }
            debug!(
                modified = assertions.num_modified(),
                "preprocessing iteration"
            );
        }
    }
}
