//! The solving context: assertion stack, preprocessing, solving and model
//! queries.

use rustc_hash::FxHashSet;

use bitwuzla_core::assertion::{AssertionStack, Backtrackable};
use bitwuzla_core::error::{Error, Result};
use bitwuzla_core::node::{utils, Node, NodeManager};
use bitwuzla_core::option::Options;
use bitwuzla_core::preprocess::Preprocessor;
use bitwuzla_core::rewrite::Rewriter;
use bitwuzla_sat::SatResult;
use tracing::info;

use crate::engine::{SolverEngine, TerminatorRef};

/// Combined statistics of a context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextStats {
    /// Preprocessing fixed-point iterations.
    pub pp_iterations: u64,
    /// Theory lemmas asserted.
    pub num_lemmas: u64,
    /// SAT-level checks.
    pub num_sat_checks: u64,
    /// Top-level solve calls.
    pub num_solves: u64,
}

/// A single solver session: owns the node manager, options, rewriter,
/// preprocessor, assertion stack and solver engine.
pub struct SolvingContext {
    nm: NodeManager,
    options: Options,
    rewriter: Rewriter,
    preprocessor: Preprocessor,
    assertions: AssertionStack,
    engine: Option<SolverEngine>,
    terminator: Option<TerminatorRef>,
    last_result: Option<SatResult>,
    last_assumptions: Vec<Node>,
    num_solves: u64,
}

impl SolvingContext {
    /// Create a context with the given configuration.
    pub fn new(options: Options) -> Self {
        let rewriter = Rewriter::new(options.rewrite_level);
        Self {
            nm: NodeManager::new(),
            options,
            rewriter,
            preprocessor: Preprocessor::new(),
            assertions: AssertionStack::new(),
            engine: None,
            terminator: None,
            last_result: None,
            last_assumptions: Vec::new(),
            num_solves: 0,
        }
    }

    /// The session's node manager.
    pub fn node_manager(&mut self) -> &mut NodeManager {
        &mut self.nm
    }

    /// Read-only access to the node manager.
    pub fn nodes(&self) -> &NodeManager {
        &self.nm
    }

    /// The session's configuration.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Set an option by name. Options are frozen once solving has begun.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        if self.engine.is_some() {
            return Err(Error::InvalidUsage(
                "options cannot change after the first check".into(),
            ));
        }
        self.options.set(name, value)?;
        // The rewriter is configured by the rewrite level.
        if self.rewriter.level() != self.options.rewrite_level {
            self.rewriter = Rewriter::new(self.options.rewrite_level);
        }
        Ok(())
    }

    /// The result of the most recent `solve`, if any.
    pub fn last_result(&self) -> Option<SatResult> {
        self.last_result
    }

    /// All currently asserted formulas, in assertion order.
    pub fn assertions(&self) -> Vec<Node> {
        self.assertions.iter().map(|e| e.original).collect()
    }

    /// The preprocessed forms of the current assertions.
    pub fn preprocessed_assertions(&self) -> Vec<Node> {
        self.assertions.iter().map(|e| e.node).collect()
    }

    /// Install or clear the session terminator.
    pub fn set_terminator(&mut self, t: Option<TerminatorRef>) {
        self.terminator = t.clone();
        if let Some(engine) = &mut self.engine {
            engine.set_terminator(t);
        }
    }

    /// Combined statistics.
    pub fn statistics(&self) -> ContextStats {
        let pp = self.preprocessor.stats();
        let (lemmas, checks) = self
            .engine
            .as_ref()
            .map(|e| (e.stats().num_lemmas, e.stats().num_sat_checks))
            .unwrap_or((0, 0));
        ContextStats {
            pp_iterations: pp.num_iterations,
            num_lemmas: lemmas,
            num_sat_checks: checks,
            num_solves: self.num_solves,
        }
    }

    /// Assert a Boolean formula at the current level. The context takes a
    /// reference on the formula for as long as its scope is open.
    pub fn assert_formula(&mut self, formula: Node) -> Result<()> {
        if !self.nm.sorts.is_bool(self.nm.sort(formula)) {
            return Err(Error::SortMismatch(
                "asserted formula must be Boolean".into(),
            ));
        }
        if self.assertions.push_assertion(formula) {
            self.nm.retain(formula);
        }
        self.last_result = None;
        Ok(())
    }

    /// Enter `n` scopes.
    pub fn push(&mut self, n: u64) {
        for _ in 0..n {
            self.assertions.push();
            if let Some(engine) = &mut self.engine {
                engine.push();
            }
        }
    }

    /// Leave `n` scopes, dropping their assertions and rewinding
    /// scope-bound state.
    pub fn pop(&mut self, n: u64) -> Result<()> {
        if n > self.assertions.level() {
            return Err(Error::InvalidUsage(format!(
                "cannot pop {n} levels, only {} open",
                self.assertions.level()
            )));
        }
        for _ in 0..n {
            let popped_level = self.assertions.level();
            // Drop the context's references on the popped assertions;
            // derived entries share their original's reference.
            let released: FxHashSet<Node> = self
                .assertions
                .iter()
                .filter(|e| e.level == popped_level)
                .map(|e| e.original)
                .collect();
            self.assertions.pop();
            for node in released {
                self.nm.release(node);
            }
            let level = self.assertions.level();
            if let Some(engine) = &mut self.engine {
                engine.pop(level);
            }
        }
        self.preprocessor
            .rewind_to(self.assertions.level(), self.assertions.len());
        self.last_result = None;
        Ok(())
    }

    /// Run preprocessing on the pending assertions without solving.
    pub fn simplify(&mut self) -> Result<()> {
        self.check_no_free_variables()?;
        self.preprocessor.preprocess(
            &mut self.nm,
            &mut self.rewriter,
            &self.options,
            &mut self.assertions,
        );
        Ok(())
    }

    /// Decide satisfiability of the asserted formulas under the given
    /// assumptions.
    pub fn solve(&mut self, assumptions: &[Node]) -> Result<SatResult> {
        if self.num_solves > 0 && !self.options.incremental {
            return Err(Error::InvalidUsage(
                "repeated check-sat requires incremental solving".into(),
            ));
        }
        self.num_solves += 1;
        self.check_no_free_variables()?;
        self.preprocessor.preprocess(
            &mut self.nm,
            &mut self.rewriter,
            &self.options,
            &mut self.assertions,
        );
        if self.engine.is_none() {
            let mut engine = SolverEngine::new(&self.options)?;
            engine.set_terminator(self.terminator.clone());
            // Catch up with scopes opened before the first check.
            for _ in 0..self.assertions.level() {
                engine.push();
            }
            self.engine = Some(engine);
        }
        let nodes: Vec<Node> = self.assertions.iter().map(|e| e.node).collect();
        let processed_assumptions: Vec<Node> = assumptions
            .iter()
            .map(|&a| {
                let p = self.preprocessor.process(&mut self.nm, &mut self.rewriter, a);
                p
            })
            .collect();
        let level = self.assertions.level();
        let engine = self.engine.as_mut().expect("engine initialised");
        let result = engine.solve(
            &mut self.nm,
            &mut self.rewriter,
            &self.options,
            &nodes,
            &processed_assumptions,
            level,
        );
        if self.options.verbosity > 0 {
            info!(?result, solves = self.num_solves, "solve finished");
        }
        if self.options.log_level > 0 {
            let stats = self.statistics();
            info!(
                pp_iterations = stats.pp_iterations,
                lemmas = stats.num_lemmas,
                sat_checks = stats.num_sat_checks,
                "solver statistics"
            );
        }
        self.last_assumptions = assumptions.to_vec();
        self.last_result = Some(result);
        Ok(result)
    }

    /// The model value of `term`; requires the last solve to be
    /// satisfiable.
    pub fn get_value(&mut self, term: Node) -> Result<Node> {
        debug_assert_eq!(self.last_result, Some(SatResult::Sat));
        let processed = self
            .preprocessor
            .process(&mut self.nm, &mut self.rewriter, term);
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| Error::InvalidUsage("no model available".into()))?;
        match engine.value(&mut self.nm, processed) {
            Ok(value) => Ok(value),
            Err(Error::ComputeValue(_)) => {
                // Typically a quantifier whose value would need another
                // solve; hand back the original term.
                Ok(term)
            }
            Err(e) => Err(e),
        }
    }

    /// The failed assumptions of the last unsatisfiable solve, as passed
    /// by the caller.
    pub fn get_unsat_assumptions(&mut self) -> Result<Vec<Node>> {
        debug_assert_eq!(self.last_result, Some(SatResult::Unsat));
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| Error::InvalidUsage("no unsat state available".into()))?;
        let failed: FxHashSet<Node> = engine.failed_assumptions().into_iter().collect();
        let assumptions = self.last_assumptions.clone();
        let mut result = Vec::new();
        for a in assumptions {
            let processed = self
                .preprocessor
                .process(&mut self.nm, &mut self.rewriter, a);
            let engine = self.engine.as_mut().unwrap();
            let image = engine.assumption_image(&mut self.nm, processed);
            if failed.contains(&image) {
                result.push(a);
            }
        }
        Ok(result)
    }

    /// The unsat core of the last unsatisfiable solve, mapped back to the
    /// caller's original assertions.
    pub fn get_unsat_core(&mut self) -> Result<Vec<Node>> {
        debug_assert_eq!(self.last_result, Some(SatResult::Unsat));
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| Error::InvalidUsage("no unsat state available".into()))?;
        let core: FxHashSet<Node> = engine.unsat_core().into_iter().collect();
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        for entry in self.assertions.iter() {
            if core.contains(&entry.node) && seen.insert(entry.original) {
                result.push(entry.original);
            }
        }
        Ok(result)
    }

    fn check_no_free_variables(&self) -> Result<()> {
        for entry in self.assertions.iter() {
            let free = utils::free_variables(&self.nm, entry.node);
            if !free.is_empty() {
                return Err(Error::InvalidUsage(
                    "assertion contains free variables".into(),
                ));
            }
        }
        Ok(())
    }
}
