//! Pass: Boolean skeleton simplification.
//!
//! The Boolean structure of the assertions (and/or/not/implies over opaque
//! atoms) is Tseitin-encoded into a SAT instance. Backbone literals of the
//! skeleton, atoms forced to one polarity, are added back as unit
//! assertions; an unsatisfiable skeleton collapses the level to `false`.

use rustc_hash::FxHashMap;

use bitwuzla_sat::{Cdcl, SatResult, SatSolver};

use crate::assertion::AssertionView;
use crate::node::{utils, Kind, Node, NodeManager};

/// Atoms beyond this bound are not backbone-checked; each check is a SAT
/// call.
const MAX_BACKBONE_CHECKS: usize = 128;

struct Skeleton {
    sat: Cdcl,
    vars: FxHashMap<Node, i32>,
    next_var: i32,
    atoms: Vec<Node>,
}

impl Skeleton {
    fn new() -> Self {
        Self {
            sat: Cdcl::new(),
            vars: FxHashMap::default(),
            next_var: 0,
            atoms: Vec::new(),
        }
    }

    fn fresh(&mut self) -> i32 {
        self.next_var += 1;
        self.next_var
    }

    fn clause(&mut self, lits: &[i32]) {
        for &l in lits {
            self.sat.add(l);
        }
        self.sat.add(0);
    }

    /// Tseitin encoding of the Boolean skeleton; anything that is not
    /// Boolean structure is an opaque atom.
    fn encode(&mut self, nm: &NodeManager, node: Node) -> i32 {
        if let Some(&lit) = self.vars.get(&node) {
            return lit;
        }
        let lit = match nm.kind(node) {
            Kind::Value => {
                let v = self.fresh();
                if nm.bool_value(node) == Some(true) {
                    self.clause(&[v]);
                } else {
                    self.clause(&[-v]);
                }
                v
            }
            Kind::Not => {
                let c = self.encode(nm, nm.child(node, 0));
                -c
            }
            Kind::And | Kind::Or => {
                let children: Vec<i32> = nm
                    .children(node)
                    .to_vec()
                    .into_iter()
                    .map(|c| self.encode(nm, c))
                    .collect();
                let v = self.fresh();
                if nm.kind(node) == Kind::And {
                    for &c in &children {
                        self.clause(&[-v, c]);
                    }
                    let mut long: Vec<i32> = children.iter().map(|&c| -c).collect();
                    long.push(v);
                    self.clause(&long);
                } else {
                    for &c in &children {
                        self.clause(&[-c, v]);
                    }
                    let mut long = children.clone();
                    long.push(-v);
                    self.clause(&long);
                }
                v
            }
            Kind::Implies => {
                let a = self.encode(nm, nm.child(node, 0));
                let b = self.encode(nm, nm.child(node, 1));
                let v = self.fresh();
                self.clause(&[-v, -a, b]);
                self.clause(&[a, v]);
                self.clause(&[-b, v]);
                v
            }
            _ => {
                // Opaque atom.
                let v = self.fresh();
                self.atoms.push(node);
                v
            }
        };
        self.vars.insert(node, lit);
        lit
    }
}

pub fn apply(nm: &mut NodeManager, assertions: &mut AssertionView) {
    let mut skel = Skeleton::new();
    for i in 0..assertions.len() {
        let root = skel.encode(nm, assertions.get(i));
        skel.clause(&[root]);
    }
    if skel.sat.solve() == SatResult::Unsat {
        let f = nm.mk_false();
        assertions.replace(0, f);
        return;
    }
    let atoms = skel.atoms.clone();
    let mut forced: FxHashMap<Node, Node> = FxHashMap::default();
    let mut units = Vec::new();
    for atom in atoms.into_iter().take(MAX_BACKBONE_CHECKS) {
        let lit = skel.vars[&atom];
        skel.sat.assume(-lit);
        if skel.sat.solve() == SatResult::Unsat {
            // The skeleton forces the atom; export it as a unit.
            units.push(atom);
            forced.insert(atom, nm.mk_true());
            skel.clause(&[lit]);
            continue;
        }
        skel.sat.assume(lit);
        if skel.sat.solve() == SatResult::Unsat {
            let not_atom = nm.mk_not(atom);
            units.push(not_atom);
            forced.insert(atom, nm.mk_false());
            skel.clause(&[-lit]);
        }
    }
    if forced.is_empty() {
        return;
    }
    // Forced atoms simplify the remaining assertions directly.
    for i in 0..assertions.len() {
        let a = assertions.get(i);
        if units.contains(&a) {
            continue;
        }
        let substituted = utils::substitute(nm, a, &forced);
        assertions.replace(i, substituted);
    }
    for unit in units {
        if (0..assertions.len()).all(|i| assertions.get(i) != unit) {
            assertions.push_derived(unit, 0);
        }
    }
}
