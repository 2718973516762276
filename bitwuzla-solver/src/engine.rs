//! The solver engine: lemma loop over the configured BV solver and the
//! theory solvers.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use bitwuzla_core::error::{Error, Result};
use bitwuzla_core::node::{utils, Kind, Node, NodeManager, Value};
use bitwuzla_core::option::{BvSolverMode, Options, SatSolverKind};
use bitwuzla_core::rewrite::Rewriter;
use bitwuzla_sat::{Cdcl, Oneshot, SatResult, SatSolver};
use tracing::debug;

use crate::array::ArraySolver;
use crate::bv::{BitblastSolver, PropSolver};
use crate::fp::FpSolver;
use crate::fun::FunSolver;
use crate::model;

/// Default move budget handed to the local-search engine before falling
/// back to bit-blasting.
const PREPROP_BUDGET: u64 = 10_000;
const PROP_FALLBACK_BUDGET: u64 = 100_000;

/// Session terminator: advisory, polled between expensive steps.
pub type TerminatorRef = Rc<dyn Fn() -> bool>;

/// Engine counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    /// Theory lemmas asserted.
    pub num_lemmas: u64,
    /// SAT-level checks performed.
    pub num_sat_checks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelSource {
    Bitblast,
    Prop,
}

/// Coordinates the BV solver and the theory solvers.
pub struct SolverEngine {
    bitblast: BitblastSolver,
    prop: PropSolver,
    array: ArraySolver,
    fun: FunSolver,
    fp: FpSolver,
    /// Theory lemmas with the level they were learnt at.
    lemmas: Vec<(u64, Node)>,
    lemma_set: FxHashSet<Node>,
    /// Equality-class representatives of the last satisfiable check.
    reps: FxHashMap<Node, Node>,
    terminator: Option<TerminatorRef>,
    model_source: ModelSource,
    stats: EngineStats,
}

impl SolverEngine {
    /// Create an engine for the given configuration. Fails with
    /// `Unsupported` when the chosen SAT backend lacks a required feature.
    pub fn new(options: &Options) -> Result<Self> {
        let sat: Box<dyn SatSolver> = match options.sat_solver {
            SatSolverKind::Cdcl => Box::new(Cdcl::new()),
            SatSolverKind::Oneshot => {
                if options.incremental || options.produce_unsat_cores {
                    return Err(Error::Unsupported(
                        "the single-shot SAT backend supports neither incremental \
                         solving nor unsat cores"
                            .into(),
                    ));
                }
                Box::new(Oneshot::new())
            }
        };
        Ok(Self {
            bitblast: BitblastSolver::new(sat, options.produce_unsat_cores),
            prop: PropSolver::new(options.seed),
            array: ArraySolver::new(),
            fun: FunSolver::new(),
            fp: FpSolver::new(),
            lemmas: Vec::new(),
            lemma_set: FxHashSet::default(),
            reps: FxHashMap::default(),
            terminator: None,
            model_source: ModelSource::Bitblast,
            stats: EngineStats::default(),
        })
    }

    /// Engine counters.
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Install the session terminator.
    pub fn set_terminator(&mut self, t: Option<TerminatorRef>) {
        match &t {
            Some(cb) => {
                let cb = Rc::clone(cb);
                self.bitblast
                    .set_terminate(Some(Box::new(move || cb())));
            }
            None => self.bitblast.set_terminate(None),
        }
        self.terminator = t;
    }

    fn terminated(&self) -> bool {
        self.terminator.as_ref().is_some_and(|t| t())
    }

    /// Enter a scope.
    pub fn push(&mut self) {
        self.array.push();
        self.fun.push();
    }

    /// Leave scopes above `level`.
    pub fn pop(&mut self, level: u64) {
        self.array.pop();
        self.fun.pop();
        self.lemmas.retain(|&(l, _)| l <= level);
        self.lemma_set = self.lemmas.iter().map(|&(_, n)| n).collect();
    }

    /// Solve the given preprocessed assertions under the assumptions.
    pub fn solve(
        &mut self,
        nm: &mut NodeManager,
        rewriter: &mut Rewriter,
        options: &Options,
        assertions: &[Node],
        assumptions: &[Node],
        level: u64,
    ) -> SatResult {
        // Quantified formulas surviving preprocessing are out of reach.
        if has_quantifier(nm, assertions) || has_quantifier(nm, assumptions) {
            return SatResult::Unknown;
        }
        // Word-blast floating-point structure away.
        let mut worklist: Vec<Node> = Vec::new();
        for &a in assertions {
            worklist.push(self.fp.word_blast(nm, a));
        }
        for c in self.fp.drain_constraints() {
            worklist.push(c);
        }
        for &(_, l) in &self.lemmas {
            worklist.push(l);
        }
        let blasted_assumptions: Vec<Node> = assumptions
            .iter()
            .map(|&a| self.fp.word_blast(nm, a))
            .collect();
        for c in self.fp.drain_constraints() {
            worklist.push(c);
        }

        // The local-search engine handles pure quantifier-free BV inputs.
        if matches!(options.bv_solver, BvSolverMode::Prop | BvSolverMode::Preprop)
            && assumptions.is_empty()
            && !options.produce_unsat_cores
            && is_pure_bv(nm, &worklist)
        {
            let budget = match options.bv_solver {
                BvSolverMode::Preprop => Some(PREPROP_BUDGET),
                _ => Some(if options.prop_nprops == 0 {
                    PROP_FALLBACK_BUDGET
                } else {
                    options.prop_nprops
                }),
            };
            let terminator = self.terminator.clone();
            let mut stop = move || terminator.as_ref().is_some_and(|t| t());
            let res = self
                .prop
                .solve(nm, &worklist, options, budget, &mut stop);
            match res {
                SatResult::Sat => {
                    self.model_source = ModelSource::Prop;
                    return SatResult::Sat;
                }
                SatResult::Unknown => {
                    debug!("local search inconclusive, falling back to bit-blasting");
                }
                SatResult::Unsat => return SatResult::Unsat,
            }
        }

        self.model_source = ModelSource::Bitblast;
        self.bitblast.retain_assertions(nm, &worklist);
        loop {
            if self.terminated() {
                return SatResult::Unknown;
            }
            for &a in &worklist {
                self.bitblast.assert_formula(nm, a);
            }
            self.register_terms(nm, &worklist);
            self.stats.num_sat_checks += 1;
            match self.bitblast.check(nm, &blasted_assumptions) {
                SatResult::Sat => {}
                other => return other,
            }

            // Floating-point structure is fully word-blasted at assertion
            // time, so only the array and function theories can refute a
            // candidate model.
            let mut lemmas = self.equality_lemmas(nm, &worklist);
            {
                let bitblast = &self.bitblast;
                let fp_ref = &self.fp;
                let reps = &self.reps;
                let mut cache: FxHashMap<Node, Node> = FxHashMap::default();
                let mut eval = |nm: &mut NodeManager, n: Node| {
                    model::value_node(bitblast, fp_ref, reps, nm, n, &mut cache)
                };
                self.array.check(nm, &mut eval, &mut lemmas);
                self.fun.check(nm, &mut eval, &mut lemmas);
            }
            if lemmas.is_empty() {
                debug!(checks = self.stats.num_sat_checks, "theories consistent");
                return SatResult::Sat;
            }

            let mut added = 0;
            for lemma in lemmas {
                let rewritten = rewriter.rewrite(nm, lemma);
                let blasted = self.fp.word_blast(nm, rewritten);
                for c in self.fp.drain_constraints() {
                    if self.lemma_set.insert(c) {
                        self.lemmas.push((level, c));
                        worklist.push(c);
                        added += 1;
                    }
                }
                if blasted == nm.mk_true() {
                    continue;
                }
                if self.lemma_set.insert(blasted) {
                    self.lemmas.push((level, blasted));
                    worklist.push(blasted);
                    self.stats.num_lemmas += 1;
                    added += 1;
                }
            }
            debug!(added, "asserting theory lemmas");
            if added == 0 {
                // No progress is possible; avoid claiming satisfiability
                // on an unrefuted candidate model.
                return SatResult::Unknown;
            }
        }
    }

    /// Register theory leaves reachable from the given roots.
    fn register_terms(&mut self, nm: &NodeManager, roots: &[Node]) {
        for node in utils::post_order(nm, roots) {
            if ArraySolver::is_theory_leaf(nm, node) {
                self.array.register_term(nm, node);
            } else if FunSolver::is_theory_leaf(nm, node) {
                self.fun.register_term(nm, node);
            }
        }
    }

    /// Build equality classes over non-bit-blastable sorts from the
    /// SAT-level assignment of their equality literals; emit transitivity
    /// lemmas for disequalities contradicting the classes.
    fn equality_lemmas(&mut self, nm: &mut NodeManager, roots: &[Node]) -> Vec<Node> {
        // Labelled union-find: child -> (parent, equality justifying the
        // merge).
        let mut parent: FxHashMap<Node, (Node, Node)> = FxHashMap::default();
        fn find(parent: &FxHashMap<Node, (Node, Node)>, mut n: Node, path: &mut Vec<Node>) -> Node {
            while let Some(&(p, eq)) = parent.get(&n) {
                path.push(eq);
                n = p;
            }
            n
        }

        let mut equalities: Vec<Node> = Vec::new();
        for node in utils::post_order(nm, roots) {
            if nm.kind(node) == Kind::Equal {
                let s = nm.sort(nm.child(node, 0));
                if nm.sorts.is_uninterpreted(s) || nm.sorts.is_fun(s) {
                    equalities.push(node);
                }
            }
        }
        let mut lemmas = Vec::new();
        for &eq in &equalities {
            if self.bitblast.value_bool(eq) != Some(true) {
                continue;
            }
            let (a, b) = (nm.child(eq, 0), nm.child(eq, 1));
            let mut path = Vec::new();
            let ra = find(&parent, a, &mut path);
            let rb = find(&parent, b, &mut path);
            if ra != rb {
                parent.insert(ra, (rb, eq));
            }
        }
        for &eq in &equalities {
            if self.bitblast.value_bool(eq) != Some(false) {
                continue;
            }
            let (a, b) = (nm.child(eq, 0), nm.child(eq, 1));
            let mut path = Vec::new();
            let ra = find(&parent, a, &mut path);
            let rb = find(&parent, b, &mut path);
            if ra == rb {
                // The merges imply this equality; make it explicit.
                path.retain(|&e| e != eq);
                let premise = nm.mk_and(&path);
                lemmas.push(nm.mk_implies(premise, eq));
            }
        }
        // Publish representatives for model bucketing.
        self.reps.clear();
        for &eq in &equalities {
            for side in [nm.child(eq, 0), nm.child(eq, 1)] {
                let mut path = Vec::new();
                let root = find(&parent, side, &mut path);
                self.reps.insert(side, root);
            }
        }
        lemmas
    }

    /// The model value of a term; requires a preceding satisfiable check.
    pub fn value(&mut self, nm: &mut NodeManager, node: Node) -> Result<Node> {
        if utils::post_order(nm, &[node])
            .iter()
            .any(|&n| matches!(nm.kind(n), Kind::Forall | Kind::Exists))
        {
            return Err(Error::ComputeValue(node.id()));
        }
        let sort = nm.sort(node);
        if nm.sorts.is_array(sort) {
            let (array, bitblast, fp_ref, reps) =
                (&self.array, &self.bitblast, &self.fp, &self.reps);
            let mut cache = FxHashMap::default();
            let mut eval = |nm: &mut NodeManager, n: Node| {
                model::value_node(bitblast, fp_ref, reps, nm, n, &mut cache)
            };
            return Ok(array.value(nm, node, &mut eval));
        }
        if nm.sorts.is_fun(sort) {
            let (fun, bitblast, fp_ref, reps) =
                (&self.fun, &self.bitblast, &self.fp, &self.reps);
            let mut cache = FxHashMap::default();
            let mut eval = |nm: &mut NodeManager, n: Node| {
                model::value_node(bitblast, fp_ref, reps, nm, n, &mut cache)
            };
            return Ok(fun.value(nm, node, &mut eval));
        }
        if nm.sorts.is_uninterpreted(sort) {
            return Ok(self.reps.get(&node).copied().unwrap_or(node));
        }
        if self.model_source == ModelSource::Prop {
            return Ok(self.prop_value(nm, node));
        }
        // Make sure floating-point terms built after solving still have an
        // encoding to read from.
        if (nm.sorts.is_fp(sort) || nm.sorts.is_rm(sort)) && self.fp.encoding(node).is_none() {
            self.fp.word_blast(nm, node);
        }
        let (bitblast, fp_ref, reps) = (&self.bitblast, &self.fp, &self.reps);
        let mut cache = FxHashMap::default();
        Ok(model::value_node(
            bitblast, fp_ref, reps, nm, node, &mut cache,
        ))
    }

    fn prop_value(&self, nm: &mut NodeManager, node: Node) -> Node {
        let order = utils::post_order(nm, &[node]);
        let mut values: FxHashMap<Node, Value> = FxHashMap::default();
        for n in order {
            let value = if let Some(v) = nm.value(n) {
                v.clone()
            } else if let Some(v) = self.prop.value(n) {
                v.clone()
            } else if nm.num_children(n) > 0 {
                let children: Vec<&Value> = nm.children(n).iter().map(|c| &values[c]).collect();
                match bitwuzla_core::eval::eval_node(nm.kind(n), &children, nm.indices(n)) {
                    Some(v) => v,
                    None => default_value(nm, n),
                }
            } else {
                default_value(nm, n)
            };
            values.insert(n, value);
        }
        let v = values.remove(&node).expect("evaluated");
        nm.mk_value(v)
    }

    /// Failed assumptions of the last unsatisfiable check, in terms of the
    /// word-blasted assumption nodes handed to the SAT layer.
    pub fn failed_assumptions(&self) -> Vec<Node> {
        self.bitblast.failed_assumptions()
    }

    /// Unsat core of the last unsatisfiable check, in terms of asserted
    /// (preprocessed) formulas.
    pub fn unsat_core(&self) -> Vec<Node> {
        self.bitblast.failed_assertions()
    }

    /// The word-blasted image of an assumption, for mapping failed
    /// assumptions back to the caller's terms.
    pub fn assumption_image(&mut self, nm: &mut NodeManager, node: Node) -> Node {
        self.fp.word_blast(nm, node)
    }
}

fn default_value(nm: &mut NodeManager, node: Node) -> Value {
    let sort = nm.sort(node);
    if nm.sorts.is_bool(sort) {
        Value::Bool(false)
    } else {
        Value::Bv(bitwuzla_bv::BvValue::zero(nm.sorts.bv_size(sort)))
    }
}

fn has_quantifier(nm: &NodeManager, roots: &[Node]) -> bool {
    utils::post_order(nm, roots)
        .iter()
        .any(|&n| matches!(nm.kind(n), Kind::Forall | Kind::Exists))
}

/// True iff the formulas mention only Boolean and bit-vector structure.
fn is_pure_bv(nm: &NodeManager, roots: &[Node]) -> bool {
    for node in utils::post_order(nm, roots) {
        let sort = nm.sort(node);
        if !nm.sorts.is_bool(sort) && !nm.sorts.is_bv(sort) {
            return false;
        }
        if matches!(
            nm.kind(node),
            Kind::Select | Kind::Store | Kind::Apply | Kind::Lambda
        ) {
            return false;
        }
    }
    true
}
