//! Lazy uninterpreted function solver (congruence by abstract-then-refine).
//!
//! Function applications are abstracted by the bit-blaster; after each
//! satisfiable SAT call the solver buckets applications of the same
//! function by the model values of their arguments. Two applications in
//! one bucket whose own model values differ violate congruence and yield
//! the lemma `(/\ args_i = args_i') => f(..) = f(..)`.

use rustc_hash::{FxHashMap, FxHashSet};

use bitwuzla_core::node::{utils, Kind, Node, NodeManager};

use crate::array::Eval;

/// The uninterpreted function theory solver.
#[derive(Default)]
pub struct FunSolver {
    applies: Vec<Node>,
    registered: FxHashSet<Node>,
    marks: Vec<usize>,
}

impl FunSolver {
    /// Create an empty solver.
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `node` is a function theory leaf.
    pub fn is_theory_leaf(nm: &NodeManager, node: Node) -> bool {
        nm.kind(node) == Kind::Apply
    }

    /// Track an application.
    pub fn register_term(&mut self, nm: &NodeManager, node: Node) {
        debug_assert_eq!(nm.kind(node), Kind::Apply);
        if self.registered.insert(node) {
            self.applies.push(node);
        }
    }

    /// Number of registered applications.
    pub fn num_applies(&self) -> usize {
        self.applies.len()
    }

    /// Enter a scope.
    pub fn push(&mut self) {
        self.marks.push(self.applies.len());
    }

    /// Leave a scope.
    pub fn pop(&mut self) {
        if let Some(mark) = self.marks.pop() {
            for n in self.applies.drain(mark..) {
                self.registered.remove(&n);
            }
        }
    }

    /// Check congruence of the current assignment; append violated
    /// instances to `lemmas`.
    pub fn check(&mut self, nm: &mut NodeManager, eval: &mut Eval, lemmas: &mut Vec<Node>) {
        // Bucket applications by function and argument model values.
        let mut buckets: FxHashMap<(Node, Vec<Node>), (Node, Node)> = FxHashMap::default();
        let applies = self.applies.clone();
        for apply in applies {
            let fun = nm.child(apply, 0);
            let args: Vec<Node> = nm.children(apply)[1..].to_vec();
            let arg_vals: Vec<Node> = args.iter().map(|&a| eval(nm, a)).collect();
            let value = eval(nm, apply);
            match buckets.get(&(fun, arg_vals.clone())) {
                Some(&(other, other_val)) => {
                    if other_val != value {
                        self.add_congruence_lemma(nm, apply, other, lemmas);
                    }
                }
                None => {
                    buckets.insert((fun, arg_vals), (apply, value));
                }
            }
        }
    }

    fn add_congruence_lemma(
        &self,
        nm: &mut NodeManager,
        a: Node,
        b: Node,
        lemmas: &mut Vec<Node>,
    ) {
        debug_assert_eq!(nm.num_children(a), nm.num_children(b));
        let mut premise = Vec::new();
        for i in 1..nm.num_children(a) {
            let (x, y) = (nm.child(a, i), nm.child(b, i));
            premise.push(nm.mk_eq(x, y));
        }
        let conclusion = nm.mk_eq(a, b);
        let antecedent = nm.mk_and(&premise);
        lemmas.push(nm.mk_implies(antecedent, conclusion));
    }

    /// The model of a function term: a lambda of nested `ite`s covering
    /// every observed application, closed by a default value.
    pub fn value(&self, nm: &mut NodeManager, fun: Node, eval: &mut Eval) -> Node {
        let fun_sort = nm.sort(fun);
        debug_assert!(nm.sorts.is_fun(fun_sort));
        let domain = nm.sorts.fun_domain(fun_sort).to_vec();
        let codomain = nm.sorts.fun_codomain(fun_sort);
        let vars: Vec<Node> = domain.iter().map(|&s| nm.mk_var(s, None)).collect();

        let mut res = utils::mk_default_value(nm, codomain);
        let applies: Vec<Node> = self
            .applies
            .iter()
            .filter(|&&a| nm.child(a, 0) == fun)
            .copied()
            .collect();
        for apply in applies {
            let args: Vec<Node> = nm.children(apply)[1..].to_vec();
            let mut eqs = Vec::new();
            for (var, &arg) in vars.iter().zip(&args) {
                let arg_value = eval(nm, arg);
                eqs.push(nm.mk_eq(*var, arg_value));
            }
            let cond = nm.mk_and(&eqs);
            let apply_value = eval(nm, apply);
            res = nm.mk_ite(cond, apply_value, res);
        }
        for &var in vars.iter().rev() {
            res = nm.mk_node(Kind::Lambda, &[var, res], &[]);
        }
        res
    }
}
