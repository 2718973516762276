//! The solver session.

use std::rc::Rc;

use bitwuzla_bv::BvValue;
use bitwuzla_core::error::{Error, Result};
use bitwuzla_core::node::{Kind, Node, NodeManager};
use bitwuzla_core::option::{Options, SatSolverKind};
use bitwuzla_core::printer;
use bitwuzla_core::sort::Sort;
use bitwuzla_fp::{FloatingPoint, FpFormat, RoundingMode};
use bitwuzla_solver::{SatResult, SolvingContext};

/// Result of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    /// The assertions are satisfiable.
    Sat,
    /// The assertions are unsatisfiable.
    Unsat,
    /// The solver could not decide (terminator fired or budget
    /// exhausted).
    Unknown,
}

impl From<SatResult> for CheckResult {
    fn from(r: SatResult) -> Self {
        match r {
            SatResult::Sat => CheckResult::Sat,
            SatResult::Unsat => CheckResult::Unsat,
            SatResult::Unknown => CheckResult::Unknown,
        }
    }
}

/// A solver session.
///
/// Owns the term storage, the assertion stack and the solving engines.
/// Terms and sorts created through one session are only meaningful within
/// it.
pub struct Bitwuzla {
    ctx: SolvingContext,
}

impl Bitwuzla {
    /// Create a session with the given configuration.
    pub fn new(options: Options) -> Result<Self> {
        if options.sat_solver == SatSolverKind::Oneshot
            && (options.incremental || options.produce_unsat_cores)
        {
            return Err(Error::Unsupported(
                "the single-shot SAT backend supports neither incremental \
                 solving nor unsat cores"
                    .into(),
            ));
        }
        Ok(Self {
            ctx: SolvingContext::new(options),
        })
    }

    fn nm(&mut self) -> &mut NodeManager {
        self.ctx.node_manager()
    }

    /// Set an option by short or long name before the first check.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        self.ctx.set_option(name, value)
    }

    /* ---- sorts ---------------------------------------------------------- */

    /// The Boolean sort.
    pub fn mk_bool_sort(&mut self) -> Sort {
        self.nm().sorts.mk_bool()
    }

    /// A bit-vector sort of the given width.
    pub fn mk_bv_sort(&mut self, width: u64) -> Result<Sort> {
        self.nm().sorts.mk_bv(width)
    }

    /// A floating-point sort with the given exponent and significand
    /// sizes.
    pub fn mk_fp_sort(&mut self, exp_size: u64, sig_size: u64) -> Result<Sort> {
        self.nm().sorts.mk_fp(exp_size, sig_size)
    }

    /// The rounding-mode sort.
    pub fn mk_rm_sort(&mut self) -> Sort {
        self.nm().sorts.mk_rm()
    }

    /// An array sort.
    pub fn mk_array_sort(&mut self, index: Sort, element: Sort) -> Sort {
        self.nm().sorts.mk_array(index, element)
    }

    /// A function sort.
    pub fn mk_fun_sort(&mut self, domain: &[Sort], codomain: Sort) -> Result<Sort> {
        self.nm().sorts.mk_fun(domain, codomain)
    }

    /// A fresh uninterpreted sort.
    pub fn mk_uninterpreted_sort(&mut self, symbol: Option<&str>) -> Sort {
        self.nm().sorts.mk_uninterpreted(symbol)
    }

    /// Render a sort in SMT-LIB syntax.
    pub fn sort_to_string(&self, sort: Sort) -> String {
        self.ctx.nodes().sorts.display(sort)
    }

    /* ---- terms ---------------------------------------------------------- */

    /// A fresh free constant.
    pub fn mk_const(&mut self, sort: Sort, symbol: Option<&str>) -> Node {
        self.nm().mk_const(sort, symbol)
    }

    /// A fresh bound variable (for quantifiers and lambdas).
    pub fn mk_var(&mut self, sort: Sort, symbol: Option<&str>) -> Node {
        self.nm().mk_var(sort, symbol)
    }

    /// The Boolean constant `true`.
    pub fn mk_true(&mut self) -> Node {
        self.nm().mk_true()
    }

    /// The Boolean constant `false`.
    pub fn mk_false(&mut self) -> Node {
        self.nm().mk_false()
    }

    /// Construct a term of the given kind.
    pub fn mk_term(&mut self, kind: Kind, args: &[Node], indices: &[u64]) -> Result<Node> {
        self.nm().try_mk_node(kind, args, indices)
    }

    /// A constant array of the given array sort.
    pub fn mk_const_array(&mut self, sort: Sort, element: Node) -> Result<Node> {
        self.nm().mk_const_array(sort, element)
    }

    /// A bit-vector value from a string in base 2, 10 or 16.
    pub fn mk_bv_value(&mut self, sort: Sort, value: &str, base: u32) -> Result<Node> {
        let nm = self.nm();
        if !nm.sorts.is_bv(sort) {
            return Err(Error::SortMismatch(
                "bit-vector value requires a bit-vector sort".into(),
            ));
        }
        let width = nm.sorts.bv_size(sort);
        let bv = BvValue::parse(width, value, base)
            .map_err(|e| Error::InvalidValue(e.to_string()))?;
        Ok(nm.mk_bv_value(bv))
    }

    /// A bit-vector value from a native unsigned integer, truncated to the
    /// sort's width.
    pub fn mk_bv_value_uint64(&mut self, sort: Sort, value: u64) -> Result<Node> {
        let nm = self.nm();
        if !nm.sorts.is_bv(sort) {
            return Err(Error::SortMismatch(
                "bit-vector value requires a bit-vector sort".into(),
            ));
        }
        let width = nm.sorts.bv_size(sort);
        Ok(nm.mk_bv_value(BvValue::from_u64(width, value)))
    }

    /// A bit-vector value from a native signed integer, truncated to the
    /// sort's width.
    pub fn mk_bv_value_int64(&mut self, sort: Sort, value: i64) -> Result<Node> {
        let nm = self.nm();
        if !nm.sorts.is_bv(sort) {
            return Err(Error::SortMismatch(
                "bit-vector value requires a bit-vector sort".into(),
            ));
        }
        let width = nm.sorts.bv_size(sort);
        Ok(nm.mk_bv_value(BvValue::from_i64(width, value)))
    }

    /// A floating-point value from its sign, exponent and significand
    /// bit-vector values.
    pub fn mk_fp_value(&mut self, sign: Node, exponent: Node, significand: Node) -> Result<Node> {
        let nm = self.nm();
        let (Some(s), Some(e), Some(m)) = (
            nm.bv_value(sign).cloned(),
            nm.bv_value(exponent).cloned(),
            nm.bv_value(significand).cloned(),
        ) else {
            return Err(Error::InvalidValue(
                "fp value requires three bit-vector values".into(),
            ));
        };
        if s.width() != 1 {
            return Err(Error::InvalidValue("fp sign must have width 1".into()));
        }
        if e.width() < 2 {
            return Err(Error::InvalidSize(
                "fp exponent must have width >= 2".into(),
            ));
        }
        Ok(nm.mk_fp_value(FloatingPoint::from_triple(&s, &e, &m)))
    }

    /// A floating-point value rounded from a decimal real string.
    pub fn mk_fp_value_from_real(
        &mut self,
        sort: Sort,
        rm: RoundingMode,
        real: &str,
    ) -> Result<Node> {
        let fmt = self.fp_format(sort)?;
        let fp = FloatingPoint::from_real(fmt, rm, real)
            .map_err(|e| Error::InvalidValue(e.to_string()))?;
        Ok(self.nm().mk_fp_value(fp))
    }

    /// A floating-point value rounded from a rational given as two decimal
    /// integer strings.
    pub fn mk_fp_value_from_rational(
        &mut self,
        sort: Sort,
        rm: RoundingMode,
        num: &str,
        den: &str,
    ) -> Result<Node> {
        let fmt = self.fp_format(sort)?;
        let fp = FloatingPoint::from_rational(fmt, rm, num, den)
            .map_err(|e| Error::InvalidValue(e.to_string()))?;
        Ok(self.nm().mk_fp_value(fp))
    }

    /// The canonical NaN of the given floating-point sort.
    pub fn mk_fp_nan(&mut self, sort: Sort) -> Result<Node> {
        let fmt = self.fp_format(sort)?;
        Ok(self.nm().mk_fp_value(FloatingPoint::nan(fmt)))
    }

    /// Positive or negative infinity of the given floating-point sort.
    pub fn mk_fp_inf(&mut self, sort: Sort, negative: bool) -> Result<Node> {
        let fmt = self.fp_format(sort)?;
        Ok(self.nm().mk_fp_value(FloatingPoint::inf(fmt, negative)))
    }

    /// Positive or negative zero of the given floating-point sort.
    pub fn mk_fp_zero(&mut self, sort: Sort, negative: bool) -> Result<Node> {
        let fmt = self.fp_format(sort)?;
        Ok(self.nm().mk_fp_value(FloatingPoint::zero(fmt, negative)))
    }

    /// A rounding-mode value.
    pub fn mk_rm_value(&mut self, rm: RoundingMode) -> Node {
        self.nm().mk_rm_value(rm)
    }

    fn fp_format(&mut self, sort: Sort) -> Result<FpFormat> {
        let nm = self.nm();
        if !nm.sorts.is_fp(sort) {
            return Err(Error::SortMismatch(
                "expected a floating-point sort".into(),
            ));
        }
        let (e, s) = nm.sorts.fp_sizes(sort);
        Ok(FpFormat::new(e, s))
    }

    /// The sort of a term.
    pub fn term_sort(&self, term: Node) -> Sort {
        self.ctx.nodes().sort(term)
    }

    /// Take an additional reference on a term handle.
    pub fn retain_term(&mut self, term: Node) {
        self.nm().retain(term);
    }

    /// Release a term handle. When the last reference is gone the term's
    /// storage is reclaimed; asserted formulas stay referenced by the
    /// session until their scope is popped.
    pub fn release_term(&mut self, term: Node) {
        self.nm().release(term);
    }

    /// Render a term in SMT-LIB syntax with the given base for bit-vector
    /// values.
    pub fn term_to_string(&self, term: Node, base: u32) -> String {
        printer::print_node(self.ctx.nodes(), term, base)
    }

    /* ---- solving --------------------------------------------------------- */

    /// Assert a Boolean formula.
    pub fn assert_formula(&mut self, term: Node) -> Result<()> {
        self.ctx.assert_formula(term)
    }

    /// The currently asserted formulas.
    pub fn get_assertions(&self) -> Vec<Node> {
        self.ctx.assertions()
    }

    /// Push `n` scopes; requires incremental solving.
    pub fn push(&mut self, n: u64) -> Result<()> {
        self.require_incremental("push")?;
        self.ctx.push(n);
        Ok(())
    }

    /// Pop `n` scopes; requires incremental solving.
    pub fn pop(&mut self, n: u64) -> Result<()> {
        self.require_incremental("pop")?;
        self.ctx.pop(n)
    }

    /// Decide satisfiability of the current assertions.
    pub fn check_sat(&mut self) -> Result<CheckResult> {
        Ok(self.ctx.solve(&[])?.into())
    }

    /// Decide satisfiability under the given assumptions; requires
    /// incremental solving.
    pub fn check_sat_assuming(&mut self, assumptions: &[Node]) -> Result<CheckResult> {
        if !assumptions.is_empty() {
            self.require_incremental("check-sat with assumptions")?;
        }
        for &a in assumptions {
            if !self.ctx.nodes().sorts.is_bool(self.ctx.nodes().sort(a)) {
                return Err(Error::SortMismatch("assumptions must be Boolean".into()));
            }
        }
        Ok(self.ctx.solve(assumptions)?.into())
    }

    /// Run preprocessing without a satisfiability check.
    pub fn simplify(&mut self) -> Result<()> {
        self.ctx.simplify()
    }

    /// The result of the most recent check, if any.
    pub fn last_result(&self) -> Option<CheckResult> {
        self.ctx.last_result().map(CheckResult::from)
    }

    /// Counters of the preprocessing pipeline and the solver engine.
    pub fn statistics(&self) -> bitwuzla_solver::ContextStats {
        self.ctx.statistics()
    }

    /// Install or clear the termination callback polled during solving.
    pub fn set_terminator(&mut self, terminator: Option<Rc<dyn Fn() -> bool>>) {
        self.ctx.set_terminator(terminator);
    }

    /* ---- model and core queries ------------------------------------------ */

    /// The model value of a term; requires `produce-models` and a
    /// preceding satisfiable check.
    pub fn get_value(&mut self, term: Node) -> Result<Node> {
        if !self.ctx.options().produce_models {
            return Err(Error::InvalidUsage(
                "get-value requires produce-models".into(),
            ));
        }
        self.require_last(SatResult::Sat, "get-value")?;
        self.ctx.get_value(term)
    }

    /// The bit-vector model value of a term, rendered in the given base.
    pub fn get_bv_value(&mut self, term: Node, base: u32) -> Result<String> {
        let value = self.get_value(term)?;
        match self.ctx.nodes().bv_value(value) {
            Some(bv) => Ok(bv.to_string_radix(base)),
            None => Err(Error::SortMismatch(
                "term does not evaluate to a bit-vector value".into(),
            )),
        }
    }

    /// The floating-point model value of a term, rendered in SMT-LIB
    /// `(fp ...)` syntax.
    pub fn get_fp_value(&mut self, term: Node, base: u32) -> Result<String> {
        let value = self.get_value(term)?;
        if self.ctx.nodes().fp_value(value).is_none() {
            return Err(Error::SortMismatch(
                "term does not evaluate to a floating-point value".into(),
            ));
        }
        Ok(printer::print_value(self.ctx.nodes(), value, base))
    }

    /// The rounding-mode model value of a term.
    pub fn get_rm_value(&mut self, term: Node) -> Result<RoundingMode> {
        let value = self.get_value(term)?;
        self.ctx.nodes().rm_value(value).ok_or_else(|| {
            Error::SortMismatch("term does not evaluate to a rounding mode".into())
        })
    }

    /// The failed assumptions of the last check; requires incremental
    /// solving and an unsatisfiable result.
    pub fn get_unsat_assumptions(&mut self) -> Result<Vec<Node>> {
        self.require_incremental("get-unsat-assumptions")?;
        self.require_last(SatResult::Unsat, "get-unsat-assumptions")?;
        self.ctx.get_unsat_assumptions()
    }

    /// The unsat core in terms of the original assertions; requires
    /// `produce-unsat-cores` and an unsatisfiable result.
    pub fn get_unsat_core(&mut self) -> Result<Vec<Node>> {
        if !self.ctx.options().produce_unsat_cores {
            return Err(Error::InvalidUsage(
                "get-unsat-core requires produce-unsat-cores".into(),
            ));
        }
        self.require_last(SatResult::Unsat, "get-unsat-core")?;
        self.ctx.get_unsat_core()
    }

    /// Print the model of the last satisfiable check as SMT-LIB
    /// `define-fun` commands.
    pub fn print_model(&mut self, base: u32) -> Result<String> {
        if !self.ctx.options().produce_models {
            return Err(Error::InvalidUsage(
                "model printing requires produce-models".into(),
            ));
        }
        self.require_last(SatResult::Sat, "model printing")?;
        let roots = self.ctx.assertions();
        let consts =
            bitwuzla_core::node::utils::collect_consts(self.ctx.nodes(), &roots);
        let mut out = String::from("(\n");
        for c in consts {
            let value = self.ctx.get_value(c)?;
            let nm = self.ctx.nodes();
            let name = match nm.symbol(c) {
                Some(s) => s.to_owned(),
                None => format!("@bzla.const_{}", c.id()),
            };
            let sort = nm.sorts.display(nm.sort(c));
            let rendered = printer::print_node(nm, value, base);
            out.push_str(&format!("  (define-fun {name} () {sort} {rendered})\n"));
        }
        out.push(')');
        Ok(out)
    }

    /* ---- helpers --------------------------------------------------------- */

    fn require_incremental(&self, what: &str) -> Result<()> {
        if !self.ctx.options().incremental {
            return Err(Error::InvalidUsage(format!(
                "{what} requires incremental solving"
            )));
        }
        Ok(())
    }

    fn require_last(&self, expected: SatResult, what: &str) -> Result<()> {
        if self.ctx.last_result() != Some(expected) {
            return Err(Error::InvalidUsage(format!(
                "{what} requires a preceding check-sat returning {expected:?}"
            )));
        }
        Ok(())
    }
}

// Session values are self-contained; a second session is fully
// independent.
impl std::fmt::Debug for Bitwuzla {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitwuzla").finish_non_exhaustive()
    }
}
