//! Hash-consed sorts.
//!
//! Sorts are interned by structural content; two structurally identical
//! sorts share one id and compare equal by id.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// A sort handle. Compares by id; the id is unique within its
/// [`SortManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sort(pub(crate) u64);

impl Sort {
    /// The non-zero id of this sort.
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Structural content of a sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SortKind {
    /// The Boolean sort.
    Bool,
    /// A bit-vector sort of the given width (`>= 1`).
    Bv(u64),
    /// A floating-point sort with exponent and significand sizes (`>= 2`).
    Fp(u64, u64),
    /// The rounding-mode sort.
    Rm,
    /// An array sort `(index, element)`.
    Array(Sort, Sort),
    /// A function sort; the last element is the codomain.
    Fun(Vec<Sort>),
    /// An uninterpreted sort, distinguished by id; the symbol is cosmetic.
    Uninterpreted(u64),
}

struct SortData {
    kind: SortKind,
    symbol: Option<String>,
}

/// Interning table for sorts.
pub struct SortManager {
    sorts: Vec<SortData>,
    table: FxHashMap<SortKind, Sort>,
    next_uninterpreted: u64,
}

impl SortManager {
    pub(crate) fn new() -> Self {
        Self {
            sorts: Vec::new(),
            table: FxHashMap::default(),
            next_uninterpreted: 0,
        }
    }

    fn intern(&mut self, kind: SortKind, symbol: Option<String>) -> Sort {
        if let Some(&sort) = self.table.get(&kind) {
            return sort;
        }
        // Ids start at 1; 0 is reserved as an invalid id.
        let sort = Sort(self.sorts.len() as u64 + 1);
        self.sorts.push(SortData {
            kind: kind.clone(),
            symbol,
        });
        self.table.insert(kind, sort);
        sort
    }

    fn data(&self, sort: Sort) -> &SortData {
        &self.sorts[(sort.0 - 1) as usize]
    }

    /// The Boolean sort.
    pub fn mk_bool(&mut self) -> Sort {
        self.intern(SortKind::Bool, None)
    }

    /// A bit-vector sort; the width must be at least 1.
    pub fn mk_bv(&mut self, width: u64) -> Result<Sort> {
        if width == 0 {
            return Err(Error::InvalidSize("bit-vector size must be > 0".into()));
        }
        Ok(self.intern(SortKind::Bv(width), None))
    }

    /// A floating-point sort; both sizes must be at least 2.
    pub fn mk_fp(&mut self, exp_size: u64, sig_size: u64) -> Result<Sort> {
        if exp_size < 2 || sig_size < 2 {
            return Err(Error::InvalidSize(format!(
                "floating-point sizes must be >= 2, got ({exp_size}, {sig_size})"
            )));
        }
        Ok(self.intern(SortKind::Fp(exp_size, sig_size), None))
    }

    /// The rounding-mode sort.
    pub fn mk_rm(&mut self) -> Sort {
        self.intern(SortKind::Rm, None)
    }

    /// An array sort over arbitrary index and element sorts.
    pub fn mk_array(&mut self, index: Sort, element: Sort) -> Sort {
        self.intern(SortKind::Array(index, element), None)
    }

    /// A function sort. The domain must be non-empty and the codomain must
    /// not itself be a function sort (first-order only).
    pub fn mk_fun(&mut self, domain: &[Sort], codomain: Sort) -> Result<Sort> {
        if domain.is_empty() {
            return Err(Error::InvalidSize(
                "function sort requires at least one domain sort".into(),
            ));
        }
        if self.is_fun(codomain) {
            return Err(Error::SortMismatch(
                "function codomain must not be a function sort".into(),
            ));
        }
        let mut types = domain.to_vec();
        types.push(codomain);
        Ok(self.intern(SortKind::Fun(types), None))
    }

    /// A fresh uninterpreted sort; every call creates a distinct sort.
    pub fn mk_uninterpreted(&mut self, symbol: Option<&str>) -> Sort {
        self.next_uninterpreted += 1;
        self.intern(
            SortKind::Uninterpreted(self.next_uninterpreted),
            symbol.map(str::to_owned),
        )
    }

    /// The structural content of a sort.
    pub fn kind(&self, sort: Sort) -> &SortKind {
        &self.data(sort).kind
    }

    /// The symbol of an uninterpreted sort, if any.
    pub fn symbol(&self, sort: Sort) -> Option<&str> {
        self.data(sort).symbol.as_deref()
    }

    /// True iff `sort` is Bool.
    pub fn is_bool(&self, sort: Sort) -> bool {
        matches!(self.kind(sort), SortKind::Bool)
    }

    /// True iff `sort` is a bit-vector sort.
    pub fn is_bv(&self, sort: Sort) -> bool {
        matches!(self.kind(sort), SortKind::Bv(_))
    }

    /// True iff `sort` is a floating-point sort.
    pub fn is_fp(&self, sort: Sort) -> bool {
        matches!(self.kind(sort), SortKind::Fp(..))
    }

    /// True iff `sort` is the rounding-mode sort.
    pub fn is_rm(&self, sort: Sort) -> bool {
        matches!(self.kind(sort), SortKind::Rm)
    }

    /// True iff `sort` is an array sort.
    pub fn is_array(&self, sort: Sort) -> bool {
        matches!(self.kind(sort), SortKind::Array(..))
    }

    /// True iff `sort` is a function sort.
    pub fn is_fun(&self, sort: Sort) -> bool {
        matches!(self.kind(sort), SortKind::Fun(_))
    }

    /// True iff `sort` is an uninterpreted sort.
    pub fn is_uninterpreted(&self, sort: Sort) -> bool {
        matches!(self.kind(sort), SortKind::Uninterpreted(_))
    }

    /// The width of a bit-vector sort.
    pub fn bv_size(&self, sort: Sort) -> u64 {
        match self.kind(sort) {
            SortKind::Bv(w) => *w,
            _ => panic!("bv_size on non-bit-vector sort"),
        }
    }

    /// The `(exp_size, sig_size)` of a floating-point sort.
    pub fn fp_sizes(&self, sort: Sort) -> (u64, u64) {
        match self.kind(sort) {
            SortKind::Fp(e, s) => (*e, *s),
            _ => panic!("fp_sizes on non-floating-point sort"),
        }
    }

    /// The index sort of an array sort.
    pub fn array_index(&self, sort: Sort) -> Sort {
        match self.kind(sort) {
            SortKind::Array(i, _) => *i,
            _ => panic!("array_index on non-array sort"),
        }
    }

    /// The element sort of an array sort.
    pub fn array_element(&self, sort: Sort) -> Sort {
        match self.kind(sort) {
            SortKind::Array(_, e) => *e,
            _ => panic!("array_element on non-array sort"),
        }
    }

    /// The domain sorts of a function sort.
    pub fn fun_domain(&self, sort: Sort) -> &[Sort] {
        match self.kind(sort) {
            SortKind::Fun(types) => &types[..types.len() - 1],
            _ => panic!("fun_domain on non-function sort"),
        }
    }

    /// The codomain of a function sort.
    pub fn fun_codomain(&self, sort: Sort) -> Sort {
        match self.kind(sort) {
            SortKind::Fun(types) => *types.last().unwrap(),
            _ => panic!("fun_codomain on non-function sort"),
        }
    }

    /// The arity of a function sort.
    pub fn fun_arity(&self, sort: Sort) -> usize {
        match self.kind(sort) {
            SortKind::Fun(types) => types.len() - 1,
            _ => panic!("fun_arity on non-function sort"),
        }
    }

    /// Render a sort in SMT-LIB syntax.
    pub fn display(&self, sort: Sort) -> String {
        match self.kind(sort) {
            SortKind::Bool => "Bool".into(),
            SortKind::Bv(w) => format!("(_ BitVec {w})"),
            SortKind::Fp(e, s) => format!("(_ FloatingPoint {e} {s})"),
            SortKind::Rm => "RoundingMode".into(),
            SortKind::Array(i, e) => {
                format!("(Array {} {})", self.display(*i), self.display(*e))
            }
            SortKind::Fun(types) => {
                let parts: Vec<_> = types.iter().map(|s| self.display(*s)).collect();
                format!("({})", parts.join(" -> "))
            }
            SortKind::Uninterpreted(id) => self
                .symbol(sort)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("@bzla.sort_{id}")),
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorts_are_interned() {
        let mut sm = SortManager::new();
        assert_eq!(sm.mk_bool(), sm.mk_bool());
        assert_eq!(sm.mk_bv(32).unwrap(), sm.mk_bv(32).unwrap());
        assert_ne!(sm.mk_bv(32).unwrap(), sm.mk_bv(33).unwrap());
        let b = sm.mk_bool();
        let a1 = sm.mk_array(b, b);
        let a2 = sm.mk_array(b, b);
        assert_eq!(a1, a2);
    }

    #[test]
    fn test_invalid_sizes() {
        let mut sm = SortManager::new();
        assert!(matches!(sm.mk_bv(0), Err(Error::InvalidSize(_))));
        assert!(matches!(sm.mk_fp(1, 24), Err(Error::InvalidSize(_))));
        assert!(matches!(sm.mk_fp(8, 1), Err(Error::InvalidSize(_))));
    }

    #[test]
    fn test_fun_sort_first_order() {
        let mut sm = SortManager::new();
        let b = sm.mk_bool();
        let bv = sm.mk_bv(8).unwrap();
        let f = sm.mk_fun(&[bv, bv], b).unwrap();
        assert_eq!(sm.fun_arity(f), 2);
        assert_eq!(sm.fun_codomain(f), b);
        assert_eq!(sm.fun_domain(f), &[bv, bv]);
        // Codomain must not be a function.
        assert!(sm.mk_fun(&[b], f).is_err());
        assert!(sm.mk_fun(&[], b).is_err());
    }

    #[test]
    fn test_uninterpreted_sorts_distinct() {
        let mut sm = SortManager::new();
        let u1 = sm.mk_uninterpreted(Some("U"));
        let u2 = sm.mk_uninterpreted(Some("U"));
        assert_ne!(u1, u2);
        assert_eq!(sm.symbol(u1), Some("U"));
    }

    #[test]
    fn test_display() {
        let mut sm = SortManager::new();
        let bv = sm.mk_bv(8).unwrap();
        assert_eq!(sm.display(bv), "(_ BitVec 8)");
        let fp = sm.mk_fp(8, 24).unwrap();
        assert_eq!(sm.display(fp), "(_ FloatingPoint 8 24)");
        let arr = sm.mk_array(bv, fp);
        assert_eq!(sm.display(arr), "(Array (_ BitVec 8) (_ FloatingPoint 8 24))");
    }
}
