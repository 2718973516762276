//! Lazy array solver.
//!
//! Registered `select`/`store`/array-equality terms are evaluated against
//! the current SAT-level assignment; violated read-over-write axioms and
//! extensionality instances are emitted as lemmas and asserted at the
//! current level.

use rustc_hash::{FxHashMap, FxHashSet};

use bitwuzla_core::node::{Kind, Node, NodeManager};

/// Evaluation callback: the canonical model value node of a term (a value
/// node for bit-vector/Boolean terms, a representative for uninterpreted
/// sorts).
pub type Eval<'a> = dyn FnMut(&mut NodeManager, Node) -> Node + 'a;

/// The array theory solver.
#[derive(Default)]
pub struct ArraySolver {
    selects: Vec<Node>,
    equalities: Vec<Node>,
    registered: FxHashSet<Node>,
    /// Extensionality witness index per array disequality.
    witnesses: FxHashMap<Node, Node>,
    /// (selects, equalities) sizes per scope level.
    marks: Vec<(usize, usize)>,
}

impl ArraySolver {
    /// Create an empty solver.
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `node` is an array theory leaf.
    pub fn is_theory_leaf(nm: &NodeManager, node: Node) -> bool {
        match nm.kind(node) {
            Kind::Select => true,
            Kind::Equal => nm.sorts.is_array(nm.sort(nm.child(node, 0))),
            _ => false,
        }
    }

    /// Track a theory leaf.
    pub fn register_term(&mut self, nm: &NodeManager, node: Node) {
        if !self.registered.insert(node) {
            return;
        }
        match nm.kind(node) {
            Kind::Select => self.selects.push(node),
            Kind::Equal => self.equalities.push(node),
            _ => {}
        }
    }

    /// Number of registered reads.
    pub fn num_selects(&self) -> usize {
        self.selects.len()
    }

    /// Enter a scope.
    pub fn push(&mut self) {
        self.marks.push((self.selects.len(), self.equalities.len()));
    }

    /// Leave a scope, dropping terms registered inside it.
    pub fn pop(&mut self) {
        if let Some((s, e)) = self.marks.pop() {
            for n in self.selects.drain(s..) {
                self.registered.remove(&n);
            }
            for n in self.equalities.drain(e..) {
                self.registered.remove(&n);
            }
        }
    }

    /// Check the current assignment; append violated axiom instances to
    /// `lemmas`.
    pub fn check(&mut self, nm: &mut NodeManager, eval: &mut Eval, lemmas: &mut Vec<Node>) {
        self.check_selects(nm, eval, lemmas);
        self.check_equalities(nm, eval, lemmas);
    }

    fn check_selects(&mut self, nm: &mut NodeManager, eval: &mut Eval, lemmas: &mut Vec<Node>) {
        // Congruence buckets: (chain base, index value) -> representative
        // select and its access premises.
        let mut buckets: FxHashMap<(Node, Node), (Node, Vec<Node>)> = FxHashMap::default();
        let tru = nm.mk_true();
        let selects = self.selects.clone();
        for s in selects {
            let index = nm.child(s, 1);
            let index_val = eval(nm, index);
            let select_val = eval(nm, s);
            // Walk the store chain under the current assignment, recording
            // the disequalities that skip over stores.
            let mut premises: Vec<Node> = Vec::new();
            let mut cur = nm.child(s, 0);
            loop {
                match nm.kind(cur) {
                    Kind::Store => {
                        let j = nm.child(cur, 1);
                        let v = nm.child(cur, 2);
                        if eval(nm, j) == index_val {
                            // Read over a matching write.
                            if eval(nm, v) != select_val {
                                let hit = nm.mk_eq(index, j);
                                premises.push(hit);
                                let conclusion = nm.mk_eq(s, v);
                                lemmas.push(implication(nm, &premises, conclusion));
                            }
                            break;
                        }
                        let miss = nm.mk_eq(index, j);
                        premises.push(nm.mk_not(miss));
                        cur = nm.child(cur, 0);
                    }
                    Kind::ConstArray => {
                        let element = nm.child(cur, 0);
                        if eval(nm, element) != select_val {
                            let conclusion = nm.mk_eq(s, element);
                            lemmas.push(implication(nm, &premises, conclusion));
                        }
                        break;
                    }
                    Kind::Ite => {
                        let cond = nm.child(cur, 0);
                        if eval(nm, cond) == tru {
                            premises.push(cond);
                            cur = nm.child(cur, 1);
                        } else {
                            premises.push(nm.mk_not(cond));
                            cur = nm.child(cur, 2);
                        }
                    }
                    _ => {
                        // Base array: reads at equal indices must agree.
                        let key = (cur, index_val);
                        match buckets.get(&key) {
                            Some((other, other_premises)) => {
                                if eval(nm, *other) != select_val {
                                    let other = *other;
                                    let mut all = premises.clone();
                                    all.extend_from_slice(other_premises);
                                    let other_index = nm.child(other, 1);
                                    all.push(nm.mk_eq(index, other_index));
                                    let conclusion = nm.mk_eq(s, other);
                                    lemmas.push(implication(nm, &all, conclusion));
                                }
                            }
                            None => {
                                buckets.insert(key, (s, premises.clone()));
                            }
                        }
                        break;
                    }
                }
            }
        }
    }

    fn check_equalities(&mut self, nm: &mut NodeManager, eval: &mut Eval, lemmas: &mut Vec<Node>) {
        let tru = nm.mk_true();
        let equalities = self.equalities.clone();
        for eq in equalities {
            let (a, b) = (nm.child(eq, 0), nm.child(eq, 1));
            if eval(nm, eq) == tru {
                // Equal arrays must agree on every read index.
                let indices: Vec<Node> = self
                    .selects
                    .iter()
                    .filter(|&&s| {
                        let arr = nm.child(s, 0);
                        arr == a || arr == b
                    })
                    .map(|&s| nm.child(s, 1))
                    .collect();
                for i in indices {
                    let sa = nm.mk_node(Kind::Select, &[a, i], &[]);
                    let sb = nm.mk_node(Kind::Select, &[b, i], &[]);
                    if eval(nm, sa) != eval(nm, sb) {
                        let conclusion = nm.mk_eq(sa, sb);
                        lemmas.push(implication(nm, &[eq], conclusion));
                    }
                }
            } else {
                // Distinct arrays differ at the witness index.
                let witness = match self.witnesses.get(&eq) {
                    Some(&w) => w,
                    None => {
                        let index_sort = nm.sorts.array_index(nm.sort(a));
                        let w = nm.mk_const(index_sort, None);
                        self.witnesses.insert(eq, w);
                        w
                    }
                };
                let sa = nm.mk_node(Kind::Select, &[a, witness], &[]);
                let sb = nm.mk_node(Kind::Select, &[b, witness], &[]);
                if eval(nm, sa) == eval(nm, sb) {
                    let selects_eq = nm.mk_eq(sa, sb);
                    let differ = nm.mk_not(selects_eq);
                    lemmas.push(nm.mk_or(&[eq, differ]));
                }
            }
        }
    }

    /// The model of an array term: its store chain with evaluated indices,
    /// extended by the observed reads over a constant-array base.
    pub fn value(&self, nm: &mut NodeManager, array: Node, eval: &mut Eval) -> Node {
        debug_assert!(nm.sorts.is_array(nm.sort(array)));
        let sort = nm.sort(array);
        // Observed reads on this array become explicit stores.
        let element_sort = nm.sorts.array_element(sort);
        let default = bitwuzla_core::node::utils::mk_default_value(nm, element_sort);
        let mut res = nm.mk_const_array(sort, default).expect("array sort");
        let reads: Vec<Node> = self
            .selects
            .iter()
            .filter(|&&s| nm.child(s, 0) == array)
            .copied()
            .collect();
        for s in reads {
            let index = nm.child(s, 1);
            let index_val = eval(nm, index);
            let value = eval(nm, s);
            res = nm.mk_node(Kind::Store, &[res, index_val, value], &[]);
        }
        res
    }
}

fn implication(nm: &mut NodeManager, premises: &[Node], conclusion: Node) -> Node {
    if premises.is_empty() {
        return conclusion;
    }
    let premise = nm.mk_and(premises);
    nm.mk_implies(premise, conclusion)
}
