//! Hash-consed node DAG.
//!
//! Nodes are interned over `(kind, children, indices, payload)`; syntactic
//! equality is id equality. Free constants and bound variables are the only
//! kinds exempt from interning, every call creates a fresh node. Records
//! are reference counted behind the weak interning table and reclaimed
//! through [`NodeManager::release`]; ids are never reused.

mod kind;
pub mod utils;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

use bitwuzla_bv::BvValue;
use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};

use crate::error::{Error, Result};
use crate::sort::{Sort, SortManager};

pub use kind::{Kind, KindInfo};

/// A node handle. Compares by id; ids are unique within a [`NodeManager`]
/// and monotonically increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node(pub(crate) u64);

impl Node {
    /// The non-zero id of this node.
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A value payload of a `Value` node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A Boolean literal.
    Bool(bool),
    /// A bit-vector literal.
    Bv(BvValue),
    /// A floating-point literal.
    Fp(FloatingPoint),
    /// A rounding-mode literal.
    Rm(RoundingMode),
}

struct NodeData {
    kind: Kind,
    sort: Sort,
    children: SmallVec<[Node; 4]>,
    indices: SmallVec<[u64; 2]>,
    value: Option<Value>,
    symbol: Option<String>,
    /// External references plus one structural reference per parent.
    refs: u64,
}

#[derive(PartialEq, Eq, Hash)]
struct InternKey {
    kind: Kind,
    children: SmallVec<[Node; 4]>,
    indices: SmallVec<[u64; 2]>,
    value: Option<Value>,
}

/// Owner of all nodes and sorts of a session.
///
/// Construction type-checks the candidate node, looks it up in the
/// interning table and returns the existing node on a hit; on a miss the
/// next id is assigned and the node is recorded together with its sort.
///
/// Records are reference counted: every constructor call counts as one
/// external reference on the returned node (including interning hits), and
/// each compound node holds one structural reference per child. The
/// interning table itself is weak. [`NodeManager::release`] drops a
/// reference; a record whose count reaches zero is purged from the table,
/// releases its children and returns its storage slot to a free list. Ids
/// are monotonically increasing and never reused, so a handle to a
/// released record can never alias a newer node.
pub struct NodeManager {
    /// The sort interning table.
    pub sorts: SortManager,
    slots: Vec<Option<NodeData>>,
    /// Id to storage slot; ids of released records are absent.
    index: FxHashMap<u64, u32>,
    free_list: Vec<u32>,
    next_id: u64,
    table: FxHashMap<InternKey, Node>,
}

impl Default for NodeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            sorts: SortManager::new(),
            slots: Vec::new(),
            index: FxHashMap::default(),
            free_list: Vec::new(),
            // Ids start at 1; 0 is reserved as an invalid id.
            next_id: 1,
            table: FxHashMap::default(),
        }
    }

    fn push_node(&mut self, data: NodeData) -> Node {
        let id = self.next_id;
        self.next_id += 1;
        let slot = match self.free_list.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(data);
                slot
            }
            None => {
                self.slots.push(Some(data));
                (self.slots.len() - 1) as u32
            }
        };
        self.index.insert(id, slot);
        Node(id)
    }

    fn data(&self, node: Node) -> &NodeData {
        let slot = *self
            .index
            .get(&node.0)
            .expect("released or foreign node handle");
        self.slots[slot as usize]
            .as_ref()
            .expect("released or foreign node handle")
    }

    fn data_mut(&mut self, node: Node) -> &mut NodeData {
        let slot = *self
            .index
            .get(&node.0)
            .expect("released or foreign node handle");
        self.slots[slot as usize]
            .as_mut()
            .expect("released or foreign node handle")
    }

    /// Take an additional external reference on a node.
    pub fn retain(&mut self, node: Node) {
        self.data_mut(node).refs += 1;
    }

    /// Drop one reference. When the count reaches zero the record is
    /// purged from the interning table, its structural references on the
    /// children are dropped in turn, and the storage slot is recycled.
    pub fn release(&mut self, node: Node) {
        let mut pending = vec![node];
        while let Some(cur) = pending.pop() {
            {
                let data = self.data_mut(cur);
                debug_assert!(data.refs > 0);
                data.refs -= 1;
                if data.refs > 0 {
                    continue;
                }
            }
            let slot = self.index.remove(&cur.0).expect("live node has a slot");
            let data = self.slots[slot as usize].take().expect("live slot");
            self.free_list.push(slot);
            // Constants and variables are never interned.
            if !matches!(data.kind, Kind::Constant | Kind::Variable) {
                self.table.remove(&InternKey {
                    kind: data.kind,
                    children: data.children.clone(),
                    indices: data.indices.clone(),
                    value: data.value.clone(),
                });
            }
            pending.extend(data.children.iter().copied());
        }
    }

    /* ---- leaf constructors --------------------------------------------- */

    /// Create a fresh free constant of the given sort.
    pub fn mk_const(&mut self, sort: Sort, symbol: Option<&str>) -> Node {
        self.push_node(NodeData {
            kind: Kind::Constant,
            sort,
            children: SmallVec::new(),
            indices: SmallVec::new(),
            value: None,
            symbol: symbol.map(str::to_owned),
            refs: 1,
        })
    }

    /// Create a fresh bound variable of the given sort.
    pub fn mk_var(&mut self, sort: Sort, symbol: Option<&str>) -> Node {
        self.push_node(NodeData {
            kind: Kind::Variable,
            sort,
            children: SmallVec::new(),
            indices: SmallVec::new(),
            value: None,
            symbol: symbol.map(str::to_owned),
            refs: 1,
        })
    }

    /// Intern a value node.
    pub fn mk_value(&mut self, value: Value) -> Node {
        let sort = match &value {
            Value::Bool(_) => self.sorts.mk_bool(),
            Value::Bv(bv) => self.sorts.mk_bv(bv.width()).unwrap(),
            Value::Fp(fp) => {
                let fmt = fp.format();
                self.sorts.mk_fp(fmt.exp_size, fmt.sig_size).unwrap()
            }
            Value::Rm(_) => self.sorts.mk_rm(),
        };
        let key = InternKey {
            kind: Kind::Value,
            children: SmallVec::new(),
            indices: SmallVec::new(),
            value: Some(value.clone()),
        };
        if let Some(&node) = self.table.get(&key) {
            self.data_mut(node).refs += 1;
            return node;
        }
        let node = self.push_node(NodeData {
            kind: Kind::Value,
            sort,
            children: SmallVec::new(),
            indices: SmallVec::new(),
            value: Some(value),
            symbol: None,
            refs: 1,
        });
        self.table.insert(key, node);
        node
    }

    /// The Boolean constant `true`.
    pub fn mk_true(&mut self) -> Node {
        self.mk_value(Value::Bool(true))
    }

    /// The Boolean constant `false`.
    pub fn mk_false(&mut self) -> Node {
        self.mk_value(Value::Bool(false))
    }

    /// A bit-vector value node.
    pub fn mk_bv_value(&mut self, value: BvValue) -> Node {
        self.mk_value(Value::Bv(value))
    }

    /// A floating-point value node.
    pub fn mk_fp_value(&mut self, value: FloatingPoint) -> Node {
        self.mk_value(Value::Fp(value))
    }

    /// A rounding-mode value node.
    pub fn mk_rm_value(&mut self, rm: RoundingMode) -> Node {
        self.mk_value(Value::Rm(rm))
    }

    /// A constant array of the given array sort with all entries equal to
    /// `element`.
    pub fn mk_const_array(&mut self, sort: Sort, element: Node) -> Result<Node> {
        if !self.sorts.is_array(sort) {
            return Err(Error::SortMismatch(
                "const array requires an array sort".into(),
            ));
        }
        if self.sort(element) != self.sorts.array_element(sort) {
            return Err(Error::SortMismatch(
                "const array element sort does not match the array element sort".into(),
            ));
        }
        let key = InternKey {
            kind: Kind::ConstArray,
            children: SmallVec::from_slice(&[element]),
            indices: SmallVec::new(),
            value: None,
        };
        if let Some(&node) = self.table.get(&key) {
            self.data_mut(node).refs += 1;
            return Ok(node);
        }
        self.data_mut(element).refs += 1;
        let node = self.push_node(NodeData {
            kind: Kind::ConstArray,
            sort,
            children: SmallVec::from_slice(&[element]),
            indices: SmallVec::new(),
            value: None,
            symbol: None,
            refs: 1,
        });
        self.table.insert(key, node);
        Ok(node)
    }

    /* ---- compound constructors ----------------------------------------- */

    /// Construct a node, returning an error on any signature violation.
    pub fn try_mk_node(&mut self, kind: Kind, children: &[Node], indices: &[u64]) -> Result<Node> {
        let sort = self.check(kind, children, indices)?;
        let key = InternKey {
            kind,
            children: SmallVec::from_slice(children),
            indices: SmallVec::from_slice(indices),
            value: None,
        };
        if let Some(&node) = self.table.get(&key) {
            self.data_mut(node).refs += 1;
            return Ok(node);
        }
        for &c in children {
            self.data_mut(c).refs += 1;
        }
        let node = self.push_node(NodeData {
            kind,
            sort,
            children: SmallVec::from_slice(children),
            indices: SmallVec::from_slice(indices),
            value: None,
            symbol: None,
            refs: 1,
        });
        self.table.insert(key, node);
        Ok(node)
    }

    /// Construct a node; panics on signature violations. Internal callers
    /// construct well-typed nodes by design, the public API validates
    /// through [`NodeManager::try_mk_node`].
    pub fn mk_node(&mut self, kind: Kind, children: &[Node], indices: &[u64]) -> Node {
        match self.try_mk_node(kind, children, indices) {
            Ok(node) => node,
            Err(e) => panic!("malformed node of kind {kind}: {e}"),
        }
    }

    /* ---- convenience builders ------------------------------------------ */

    /// `not`.
    pub fn mk_not(&mut self, a: Node) -> Node {
        self.mk_node(Kind::Not, &[a], &[])
    }

    /// N-ary `and`; returns `true` for an empty slice and the sole operand
    /// for a singleton.
    pub fn mk_and(&mut self, operands: &[Node]) -> Node {
        match operands.len() {
            0 => self.mk_true(),
            1 => operands[0],
            _ => self.mk_node(Kind::And, operands, &[]),
        }
    }

    /// N-ary `or`; returns `false` for an empty slice and the sole operand
    /// for a singleton.
    pub fn mk_or(&mut self, operands: &[Node]) -> Node {
        match operands.len() {
            0 => self.mk_false(),
            1 => operands[0],
            _ => self.mk_node(Kind::Or, operands, &[]),
        }
    }

    /// `=>`.
    pub fn mk_implies(&mut self, a: Node, b: Node) -> Node {
        self.mk_node(Kind::Implies, &[a, b], &[])
    }

    /// `=`.
    pub fn mk_eq(&mut self, a: Node, b: Node) -> Node {
        self.mk_node(Kind::Equal, &[a, b], &[])
    }

    /// `ite`.
    pub fn mk_ite(&mut self, cond: Node, then: Node, els: Node) -> Node {
        self.mk_node(Kind::Ite, &[cond, then, els], &[])
    }

    /* ---- accessors ------------------------------------------------------ */

    /// The kind of a node.
    pub fn kind(&self, node: Node) -> Kind {
        self.data(node).kind
    }

    /// The sort of a node.
    pub fn sort(&self, node: Node) -> Sort {
        self.data(node).sort
    }

    /// The children of a node, in order.
    pub fn children(&self, node: Node) -> &[Node] {
        &self.data(node).children
    }

    /// Child `i` of a node.
    pub fn child(&self, node: Node, i: usize) -> Node {
        self.data(node).children[i]
    }

    /// The number of children.
    pub fn num_children(&self, node: Node) -> usize {
        self.data(node).children.len()
    }

    /// The operator indices of a node.
    pub fn indices(&self, node: Node) -> &[u64] {
        &self.data(node).indices
    }

    /// The value payload of a `Value` node.
    pub fn value(&self, node: Node) -> Option<&Value> {
        self.data(node).value.as_ref()
    }

    /// The symbol of a node, if one was given at creation.
    pub fn symbol(&self, node: Node) -> Option<&str> {
        self.data(node).symbol.as_deref()
    }

    /// The number of live nodes.
    pub fn num_nodes(&self) -> usize {
        self.index.len()
    }

    /// The current reference count of a node.
    pub fn ref_count(&self, node: Node) -> u64 {
        self.data(node).refs
    }

    /// True iff the node is a value.
    pub fn is_value(&self, node: Node) -> bool {
        self.kind(node) == Kind::Value
    }

    /// True iff the node is a free constant.
    pub fn is_const(&self, node: Node) -> bool {
        self.kind(node) == Kind::Constant
    }

    /// True iff the node is a bound variable.
    pub fn is_var(&self, node: Node) -> bool {
        self.kind(node) == Kind::Variable
    }

    /// The Boolean payload of a Boolean value node.
    pub fn bool_value(&self, node: Node) -> Option<bool> {
        match self.value(node) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// The bit-vector payload of a bit-vector value node.
    pub fn bv_value(&self, node: Node) -> Option<&BvValue> {
        match self.value(node) {
            Some(Value::Bv(bv)) => Some(bv),
            _ => None,
        }
    }

    /// The floating-point payload of a floating-point value node.
    pub fn fp_value(&self, node: Node) -> Option<&FloatingPoint> {
        match self.value(node) {
            Some(Value::Fp(fp)) => Some(fp),
            _ => None,
        }
    }

    /// The rounding-mode payload of a rounding-mode value node.
    pub fn rm_value(&self, node: Node) -> Option<RoundingMode> {
        match self.value(node) {
            Some(Value::Rm(rm)) => Some(*rm),
            _ => None,
        }
    }

    /* ---- type checking --------------------------------------------------- */

    fn check(&mut self, kind: Kind, children: &[Node], indices: &[u64]) -> Result<Sort> {
        let info = kind.info();
        let n = children.len() as u32;
        if n < info.min_arity || n > info.max_arity {
            return Err(Error::ArityMismatch(format!(
                "kind {kind} expects between {} and {} children, got {n}",
                info.min_arity, info.max_arity
            )));
        }
        if indices.len() as u32 != info.num_indices {
            return Err(Error::InvalidIndex(format!(
                "kind {kind} expects {} indices, got {}",
                info.num_indices,
                indices.len()
            )));
        }

        use Kind::*;
        match kind {
            Constant | Variable | Value | ConstArray => Err(Error::InvalidKind(format!(
                "kind {kind} cannot be constructed through mk_term"
            ))),

            Not => {
                self.expect_bool(kind, children[0])?;
                Ok(self.sorts.mk_bool())
            }
            And | Or | Xor => {
                for &c in children {
                    self.expect_bool(kind, c)?;
                }
                Ok(self.sorts.mk_bool())
            }
            Implies => {
                self.expect_bool(kind, children[0])?;
                self.expect_bool(kind, children[1])?;
                Ok(self.sorts.mk_bool())
            }
            Equal | Distinct => {
                let s0 = self.sort(children[0]);
                for &c in &children[1..] {
                    if self.sort(c) != s0 {
                        return Err(Error::SortMismatch(format!(
                            "kind {kind} requires children of identical sort"
                        )));
                    }
                }
                Ok(self.sorts.mk_bool())
            }
            Ite => {
                self.expect_bool(kind, children[0])?;
                if self.sort(children[1]) != self.sort(children[2]) {
                    return Err(Error::SortMismatch(
                        "ite branches must have identical sort".into(),
                    ));
                }
                Ok(self.sort(children[1]))
            }

            Exists | Forall => {
                if self.kind(children[0]) != Kind::Variable {
                    return Err(Error::SortMismatch(format!(
                        "kind {kind} requires a variable as first child"
                    )));
                }
                self.expect_bool(kind, children[1])?;
                Ok(self.sorts.mk_bool())
            }
            Lambda => {
                if self.kind(children[0]) != Kind::Variable {
                    return Err(Error::SortMismatch(
                        "lambda requires a variable as first child".into(),
                    ));
                }
                let var_sort = self.sort(children[0]);
                let body_sort = self.sort(children[1]);
                // Nested lambdas chain through the body; collect domains.
                let (domain, codomain) = if self.sorts.is_fun(body_sort) {
                    let mut dom = vec![var_sort];
                    dom.extend_from_slice(self.sorts.fun_domain(body_sort));
                    (dom, self.sorts.fun_codomain(body_sort))
                } else {
                    (vec![var_sort], body_sort)
                };
                self.sorts.mk_fun(&domain, codomain)
            }

            Select => {
                let arr = self.expect_array(kind, children[0])?;
                if self.sort(children[1]) != self.sorts.array_index(arr) {
                    return Err(Error::SortMismatch(
                        "select index sort does not match the array index sort".into(),
                    ));
                }
                Ok(self.sorts.array_element(arr))
            }
            Store => {
                let arr = self.expect_array(kind, children[0])?;
                if self.sort(children[1]) != self.sorts.array_index(arr) {
                    return Err(Error::SortMismatch(
                        "store index sort does not match the array index sort".into(),
                    ));
                }
                if self.sort(children[2]) != self.sorts.array_element(arr) {
                    return Err(Error::SortMismatch(
                        "store value sort does not match the array element sort".into(),
                    ));
                }
                Ok(arr)
            }

            Apply => {
                let fun_sort = self.sort(children[0]);
                if !self.sorts.is_fun(fun_sort) {
                    return Err(Error::SortMismatch(
                        "apply requires a function as first child".into(),
                    ));
                }
                let arity = self.sorts.fun_arity(fun_sort);
                if children.len() - 1 != arity {
                    return Err(Error::ArityMismatch(format!(
                        "function expects {arity} arguments, got {}",
                        children.len() - 1
                    )));
                }
                for (i, &arg) in children[1..].iter().enumerate() {
                    if self.sort(arg) != self.sorts.fun_domain(fun_sort)[i] {
                        return Err(Error::SortMismatch(format!(
                            "argument {i} does not match the function domain sort"
                        )));
                    }
                }
                Ok(self.sorts.fun_codomain(fun_sort))
            }

            BvNot | BvNeg | BvInc | BvDec => {
                let w = self.expect_bv(kind, children[0])?;
                self.sorts.mk_bv(w)
            }
            BvRedand | BvRedor | BvRedxor => {
                self.expect_bv(kind, children[0])?;
                self.sorts.mk_bv(1)
            }

            BvAdd | BvMul | BvAnd | BvOr | BvXor => {
                let w = self.expect_bv(kind, children[0])?;
                for &c in &children[1..] {
                    if self.expect_bv(kind, c)? != w {
                        return Err(Error::SortMismatch(format!(
                            "kind {kind} requires children of identical width"
                        )));
                    }
                }
                self.sorts.mk_bv(w)
            }
            BvSub | BvUdiv | BvUrem | BvSdiv | BvSrem | BvSmod | BvNand | BvNor | BvXnor
            | BvShl | BvShr | BvAshr | BvRol | BvRor => {
                let w = self.same_bv_width(kind, children[0], children[1])?;
                self.sorts.mk_bv(w)
            }
            BvComp => {
                self.same_bv_width(kind, children[0], children[1])?;
                self.sorts.mk_bv(1)
            }
            BvConcat => {
                let mut w = 0;
                for &c in children {
                    w += self.expect_bv(kind, c)?;
                }
                self.sorts.mk_bv(w)
            }

            BvUlt | BvUle | BvUgt | BvUge | BvSlt | BvSle | BvSgt | BvSge | BvUaddo | BvSaddo
            | BvUsubo | BvSsubo | BvUmulo | BvSmulo | BvSdivo => {
                self.same_bv_width(kind, children[0], children[1])?;
                Ok(self.sorts.mk_bool())
            }

            BvExtract => {
                let w = self.expect_bv(kind, children[0])?;
                let (hi, lo) = (indices[0], indices[1]);
                if lo > hi || hi >= w {
                    return Err(Error::InvalidIndex(format!(
                        "extract indices ({hi}, {lo}) out of bounds for width {w}"
                    )));
                }
                self.sorts.mk_bv(hi - lo + 1)
            }
            BvRepeat => {
                let w = self.expect_bv(kind, children[0])?;
                if indices[0] == 0 {
                    return Err(Error::InvalidIndex("repeat count must be >= 1".into()));
                }
                self.sorts.mk_bv(w * indices[0])
            }
            BvRoli | BvRori => {
                let w = self.expect_bv(kind, children[0])?;
                self.sorts.mk_bv(w)
            }
            BvSignExtend | BvZeroExtend => {
                let w = self.expect_bv(kind, children[0])?;
                self.sorts.mk_bv(w + indices[0])
            }

            FpFp => {
                let ws = self.expect_bv(kind, children[0])?;
                let we = self.expect_bv(kind, children[1])?;
                let wm = self.expect_bv(kind, children[2])?;
                if ws != 1 {
                    return Err(Error::SortMismatch(
                        "fp sign child must have width 1".into(),
                    ));
                }
                if we < 2 {
                    return Err(Error::SortMismatch(
                        "fp exponent child must have width >= 2".into(),
                    ));
                }
                self.sorts.mk_fp(we, wm + 1)
            }
            FpAbs | FpNeg => {
                let (e, s) = self.expect_fp(kind, children[0])?;
                self.sorts.mk_fp(e, s)
            }
            FpIsNan | FpIsInf | FpIsNeg | FpIsPos | FpIsZero | FpIsNormal | FpIsSubnormal => {
                self.expect_fp(kind, children[0])?;
                Ok(self.sorts.mk_bool())
            }
            FpAdd | FpSub | FpMul | FpDiv => {
                self.expect_rm(kind, children[0])?;
                let fmt = self.same_fp_format(kind, children[1], children[2])?;
                self.sorts.mk_fp(fmt.0, fmt.1)
            }
            FpFma => {
                self.expect_rm(kind, children[0])?;
                let fmt = self.same_fp_format(kind, children[1], children[2])?;
                if self.expect_fp(kind, children[3])? != fmt {
                    return Err(Error::SortMismatch(
                        "fma children must have identical format".into(),
                    ));
                }
                self.sorts.mk_fp(fmt.0, fmt.1)
            }
            FpRem | FpMin | FpMax => {
                let fmt = self.same_fp_format(kind, children[0], children[1])?;
                self.sorts.mk_fp(fmt.0, fmt.1)
            }
            FpSqrt | FpRti => {
                self.expect_rm(kind, children[0])?;
                let (e, s) = self.expect_fp(kind, children[1])?;
                self.sorts.mk_fp(e, s)
            }
            FpEqual | FpLeq | FpLt | FpGeq | FpGt => {
                self.same_fp_format(kind, children[0], children[1])?;
                Ok(self.sorts.mk_bool())
            }

            FpToFpFromBv => {
                let w = self.expect_bv(kind, children[0])?;
                let (e, s) = self.fp_indices(indices)?;
                if w != e + s {
                    return Err(Error::SortMismatch(format!(
                        "to_fp from a bit-vector of width {w} requires width {}",
                        e + s
                    )));
                }
                self.sorts.mk_fp(e, s)
            }
            FpToFpFromFp => {
                self.expect_rm(kind, children[0])?;
                self.expect_fp(kind, children[1])?;
                let (e, s) = self.fp_indices(indices)?;
                self.sorts.mk_fp(e, s)
            }
            FpToFpFromSbv | FpToFpFromUbv => {
                self.expect_rm(kind, children[0])?;
                self.expect_bv(kind, children[1])?;
                let (e, s) = self.fp_indices(indices)?;
                self.sorts.mk_fp(e, s)
            }
            FpToSbv | FpToUbv => {
                self.expect_rm(kind, children[0])?;
                self.expect_fp(kind, children[1])?;
                if indices[0] == 0 {
                    return Err(Error::InvalidIndex(
                        "conversion target width must be >= 1".into(),
                    ));
                }
                self.sorts.mk_bv(indices[0])
            }
        }
    }

    fn expect_bool(&self, kind: Kind, node: Node) -> Result<()> {
        if !self.sorts.is_bool(self.sort(node)) {
            return Err(Error::SortMismatch(format!(
                "kind {kind} requires Boolean children"
            )));
        }
        Ok(())
    }

    fn expect_bv(&self, kind: Kind, node: Node) -> Result<u64> {
        let sort = self.sort(node);
        if !self.sorts.is_bv(sort) {
            return Err(Error::SortMismatch(format!(
                "kind {kind} requires bit-vector children"
            )));
        }
        Ok(self.sorts.bv_size(sort))
    }

    fn expect_fp(&self, kind: Kind, node: Node) -> Result<(u64, u64)> {
        let sort = self.sort(node);
        if !self.sorts.is_fp(sort) {
            return Err(Error::SortMismatch(format!(
                "kind {kind} requires floating-point children"
            )));
        }
        Ok(self.sorts.fp_sizes(sort))
    }

    fn expect_rm(&self, kind: Kind, node: Node) -> Result<()> {
        if !self.sorts.is_rm(self.sort(node)) {
            return Err(Error::SortMismatch(format!(
                "kind {kind} requires a rounding-mode child"
            )));
        }
        Ok(())
    }

    fn expect_array(&self, kind: Kind, node: Node) -> Result<Sort> {
        let sort = self.sort(node);
        if !self.sorts.is_array(sort) {
            return Err(Error::SortMismatch(format!(
                "kind {kind} requires an array child"
            )));
        }
        Ok(sort)
    }

    fn same_bv_width(&self, kind: Kind, a: Node, b: Node) -> Result<u64> {
        let wa = self.expect_bv(kind, a)?;
        let wb = self.expect_bv(kind, b)?;
        if wa != wb {
            return Err(Error::SortMismatch(format!(
                "kind {kind} requires children of identical width, got {wa} and {wb}"
            )));
        }
        Ok(wa)
    }

    fn same_fp_format(&self, kind: Kind, a: Node, b: Node) -> Result<(u64, u64)> {
        let fa = self.expect_fp(kind, a)?;
        let fb = self.expect_fp(kind, b)?;
        if fa != fb {
            return Err(Error::SortMismatch(format!(
                "kind {kind} requires children of identical format"
            )));
        }
        Ok(fa)
    }

    fn fp_indices(&self, indices: &[u64]) -> Result<(u64, u64)> {
        let (e, s) = (indices[0], indices[1]);
        if e < 2 || s < 2 {
            return Err(Error::InvalidIndex(format!(
                "floating-point sizes must be >= 2, got ({e}, {s})"
            )));
        }
        Ok((e, s))
    }

    /// The floating-point format of an FP-sorted node.
    pub fn fp_format(&self, node: Node) -> FpFormat {
        let (e, s) = self.sorts.fp_sizes(self.sort(node));
        FpFormat::new(e, s)
    }

    /// The bit-vector width of a BV-sorted node.
    pub fn bv_width(&self, node: Node) -> u64 {
        self.sorts.bv_size(self.sort(node))
    }
}
