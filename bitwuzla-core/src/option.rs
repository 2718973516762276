//! Solver configuration.
//!
//! Every option carries a short name, a long name, a description and a
//! default; numeric options additionally carry `[min, max]` bounds. Options
//! can be set programmatically through the typed fields or by name through
//! [`Options::set`].

use crate::error::{Error, Result};

/// Selection of the bit-vector solving engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvSolverMode {
    /// Eager bit-blasting to SAT.
    Bitblast,
    /// Propagation-based local search.
    Prop,
    /// Local search first, bit-blasting as fallback.
    Preprop,
}

/// Selection of the SAT backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatSolverKind {
    /// The built-in incremental CDCL engine.
    Cdcl,
    /// The built-in engine restricted to single-shot queries (no
    /// assumptions, no failed-literal extraction).
    Oneshot,
}

/// Path selection strategy of the propagation-based solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropPathSelection {
    /// Follow a child whose flip can change the parent's value.
    Essential,
    /// Follow a uniformly random child.
    Random,
}

/// The kind of an option, for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Boolean option.
    Bool,
    /// Numeric option with `[min, max]` bounds.
    Numeric,
    /// Mode option taking one of a fixed set of names.
    Mode,
}

/// Static description of one option.
#[derive(Debug, Clone, Copy)]
pub struct OptionInfo {
    /// Long name (`--<long>` on a command line).
    pub long: &'static str,
    /// Short name (`-<short>`), if any.
    pub short: Option<&'static str>,
    /// Human-readable description.
    pub description: &'static str,
    /// Default value, rendered as a string.
    pub default: &'static str,
    /// The option kind.
    pub kind: OptionKind,
    /// Minimum value for numeric options.
    pub min: u64,
    /// Maximum value for numeric options.
    pub max: u64,
}

macro_rules! info {
    ($long:expr, $short:expr, $desc:expr, $default:expr, $kind:expr, $min:expr, $max:expr) => {
        OptionInfo {
            long: $long,
            short: $short,
            description: $desc,
            default: $default,
            kind: $kind,
            min: $min,
            max: $max,
        }
    };
}

/// All recognised options.
pub const OPTIONS: &[OptionInfo] = &[
    info!("incremental", Some("i"), "incremental solving (push/pop, repeated check-sat)", "false", OptionKind::Bool, 0, 0),
    info!("produce-models", Some("m"), "model production for get-value", "false", OptionKind::Bool, 0, 0),
    info!("produce-unsat-cores", None, "record assertion provenance for unsat cores", "false", OptionKind::Bool, 0, 0),
    info!("verbosity", Some("v"), "verbosity level", "0", OptionKind::Numeric, 0, 4),
    info!("log-level", Some("l"), "log level", "0", OptionKind::Numeric, 0, 3),
    info!("seed", Some("s"), "random number generator seed", "27644437", OptionKind::Numeric, 0, u64::MAX),
    info!("bv-solver", Some("S"), "bit-vector solver engine (bitblast, prop, preprop)", "bitblast", OptionKind::Mode, 0, 0),
    info!("sat-solver", None, "SAT backend (cdcl, oneshot)", "cdcl", OptionKind::Mode, 0, 0),
    info!("rewrite-level", Some("rwl"), "rewrite level", "2", OptionKind::Numeric, 0, 2),
    info!("prop-nprops", None, "max number of propagation steps (0 = no limit)", "0", OptionKind::Numeric, 0, u64::MAX),
    info!("prop-nupdates", None, "max number of cone update steps (0 = no limit)", "0", OptionKind::Numeric, 0, u64::MAX),
    info!("prop-path-sel", None, "propagation path selection (essential, random)", "essential", OptionKind::Mode, 0, 0),
    info!("prop-prob-pick-inv-value", None, "probability of picking an inverse value (in per mille)", "990", OptionKind::Numeric, 0, 1000),
    info!("prop-prob-pick-random-input", None, "probability of picking a random input (in per mille)", "10", OptionKind::Numeric, 0, 1000),
    info!("prop-const-bits", None, "use constant bits domain propagation", "true", OptionKind::Bool, 0, 0),
    info!("prop-ineq-bounds", None, "infer bounds from inequalities", "true", OptionKind::Bool, 0, 0),
    info!("prop-sext", None, "use sign extension inverse value computation", "true", OptionKind::Bool, 0, 0),
    info!("prop-opt-lt-concat-sext", None, "optimize inverse values of concat/sext under inequalities", "false", OptionKind::Bool, 0, 0),
    info!("pp-contr-ands", None, "preprocessing: replace contradicting ands with false", "true", OptionKind::Bool, 0, 0),
    info!("pp-elim-bv-extracts", None, "preprocessing: eliminate extracts on constants", "false", OptionKind::Bool, 0, 0),
    info!("pp-embedded-constr", None, "preprocessing: substitute embedded constraints", "true", OptionKind::Bool, 0, 0),
    info!("pp-flatten-and", None, "preprocessing: flatten top-level ands into assertions", "true", OptionKind::Bool, 0, 0),
    info!("pp-normalize", None, "preprocessing: normalize arithmetic", "false", OptionKind::Bool, 0, 0),
    info!("pp-normalize-share-aware", None, "preprocessing: only normalize unshared subterms", "true", OptionKind::Bool, 0, 0),
    info!("pp-skeleton-preproc", None, "preprocessing: Boolean skeleton simplification", "true", OptionKind::Bool, 0, 0),
    info!("pp-variable-subst", None, "preprocessing: variable substitution", "true", OptionKind::Bool, 0, 0),
    info!("pp-variable-subst-norm-eq", None, "preprocessing: normalize equalities before substitution", "true", OptionKind::Bool, 0, 0),
    info!("pp-variable-subst-norm-bv-ineq", None, "preprocessing: normalize bit-vector inequalities before substitution", "false", OptionKind::Bool, 0, 0),
];

/// Typed option values of a session.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Options {
    pub incremental: bool,
    pub produce_models: bool,
    pub produce_unsat_cores: bool,
    pub verbosity: u64,
    pub log_level: u64,
    pub seed: u64,
    pub bv_solver: BvSolverMode,
    pub sat_solver: SatSolverKind,
    pub rewrite_level: u64,
    pub prop_nprops: u64,
    pub prop_nupdates: u64,
    pub prop_path_sel: PropPathSelection,
    pub prop_prob_pick_inv_value: u64,
    pub prop_prob_pick_random_input: u64,
    pub prop_const_bits: bool,
    pub prop_ineq_bounds: bool,
    pub prop_sext: bool,
    pub prop_opt_lt_concat_sext: bool,
    pub pp_contr_ands: bool,
    pub pp_elim_bv_extracts: bool,
    pub pp_embedded_constr: bool,
    pub pp_flatten_and: bool,
    pub pp_normalize: bool,
    pub pp_normalize_share_aware: bool,
    pub pp_skeleton_preproc: bool,
    pub pp_variable_subst: bool,
    pub pp_variable_subst_norm_eq: bool,
    pub pp_variable_subst_norm_bv_ineq: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            incremental: false,
            produce_models: false,
            produce_unsat_cores: false,
            verbosity: 0,
            log_level: 0,
            seed: 27644437,
            bv_solver: BvSolverMode::Bitblast,
            sat_solver: SatSolverKind::Cdcl,
            rewrite_level: 2,
            prop_nprops: 0,
            prop_nupdates: 0,
            prop_path_sel: PropPathSelection::Essential,
            prop_prob_pick_inv_value: 990,
            prop_prob_pick_random_input: 10,
            prop_const_bits: true,
            prop_ineq_bounds: true,
            prop_sext: true,
            prop_opt_lt_concat_sext: false,
            pp_contr_ands: true,
            pp_elim_bv_extracts: false,
            pp_embedded_constr: true,
            pp_flatten_and: true,
            pp_normalize: false,
            pp_normalize_share_aware: true,
            pp_skeleton_preproc: true,
            pp_variable_subst: true,
            pp_variable_subst_norm_eq: true,
            pp_variable_subst_norm_bv_ineq: false,
        }
    }
}

impl Options {
    /// Create options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the static description of an option by long or short name.
    pub fn find(name: &str) -> Option<&'static OptionInfo> {
        OPTIONS
            .iter()
            .find(|o| o.long == name || o.short == Some(name))
    }

    fn parse_bool(name: &str, value: &str) -> Result<bool> {
        match value {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(Error::InvalidOption(format!(
                "'{value}' is not a Boolean value for option '{name}'"
            ))),
        }
    }

    fn parse_numeric(name: &str, value: &str) -> Result<u64> {
        let info = Self::find(name).unwrap();
        let v: u64 = value.parse().map_err(|_| {
            Error::InvalidOption(format!(
                "'{value}' is not a numeric value for option '{name}'"
            ))
        })?;
        if v < info.min || v > info.max {
            return Err(Error::InvalidOption(format!(
                "value {v} for option '{name}' is outside [{}, {}]",
                info.min, info.max
            )));
        }
        Ok(v)
    }

    /// Set an option by name from a string value.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let info = Self::find(name)
            .ok_or_else(|| Error::InvalidOption(format!("unknown option '{name}'")))?;
        let long = info.long;
        match long {
            "incremental" => self.incremental = Self::parse_bool(long, value)?,
            "produce-models" => self.produce_models = Self::parse_bool(long, value)?,
            "produce-unsat-cores" => self.produce_unsat_cores = Self::parse_bool(long, value)?,
            "verbosity" => self.verbosity = Self::parse_numeric(long, value)?,
            "log-level" => self.log_level = Self::parse_numeric(long, value)?,
            "seed" => self.seed = Self::parse_numeric(long, value)?,
            "bv-solver" => {
                self.bv_solver = match value {
                    "bitblast" => BvSolverMode::Bitblast,
                    "prop" => BvSolverMode::Prop,
                    "preprop" => BvSolverMode::Preprop,
                    _ => {
                        return Err(Error::InvalidOption(format!(
                            "'{value}' is not a valid bv-solver mode"
                        )))
                    }
                }
            }
            "sat-solver" => {
                self.sat_solver = match value {
                    "cdcl" => SatSolverKind::Cdcl,
                    "oneshot" => SatSolverKind::Oneshot,
                    _ => {
                        return Err(Error::InvalidOption(format!(
                            "'{value}' is not a valid sat-solver mode"
                        )))
                    }
                }
            }
            "rewrite-level" => self.rewrite_level = Self::parse_numeric(long, value)?,
            "prop-nprops" => self.prop_nprops = Self::parse_numeric(long, value)?,
            "prop-nupdates" => self.prop_nupdates = Self::parse_numeric(long, value)?,
            "prop-path-sel" => {
                self.prop_path_sel = match value {
                    "essential" => PropPathSelection::Essential,
                    "random" => PropPathSelection::Random,
                    _ => {
                        return Err(Error::InvalidOption(format!(
                            "'{value}' is not a valid prop-path-sel mode"
                        )))
                    }
                }
            }
            "prop-prob-pick-inv-value" => {
                self.prop_prob_pick_inv_value = Self::parse_numeric(long, value)?
            }
            "prop-prob-pick-random-input" => {
                self.prop_prob_pick_random_input = Self::parse_numeric(long, value)?
            }
            "prop-const-bits" => self.prop_const_bits = Self::parse_bool(long, value)?,
            "prop-ineq-bounds" => self.prop_ineq_bounds = Self::parse_bool(long, value)?,
            "prop-sext" => self.prop_sext = Self::parse_bool(long, value)?,
            "prop-opt-lt-concat-sext" => {
                self.prop_opt_lt_concat_sext = Self::parse_bool(long, value)?
            }
            "pp-contr-ands" => self.pp_contr_ands = Self::parse_bool(long, value)?,
            "pp-elim-bv-extracts" => self.pp_elim_bv_extracts = Self::parse_bool(long, value)?,
            "pp-embedded-constr" => self.pp_embedded_constr = Self::parse_bool(long, value)?,
            "pp-flatten-and" => self.pp_flatten_and = Self::parse_bool(long, value)?,
            "pp-normalize" => self.pp_normalize = Self::parse_bool(long, value)?,
            "pp-normalize-share-aware" => {
                self.pp_normalize_share_aware = Self::parse_bool(long, value)?
            }
            "pp-skeleton-preproc" => self.pp_skeleton_preproc = Self::parse_bool(long, value)?,
            "pp-variable-subst" => self.pp_variable_subst = Self::parse_bool(long, value)?,
            "pp-variable-subst-norm-eq" => {
                self.pp_variable_subst_norm_eq = Self::parse_bool(long, value)?
            }
            "pp-variable-subst-norm-bv-ineq" => {
                self.pp_variable_subst_norm_bv_ineq = Self::parse_bool(long, value)?
            }
            _ => unreachable!("option table and setter out of sync"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_table() {
        let opts = Options::default();
        assert!(!opts.incremental);
        assert_eq!(opts.rewrite_level, 2);
        assert_eq!(opts.prop_prob_pick_inv_value, 990);
        assert_eq!(opts.bv_solver, BvSolverMode::Bitblast);
    }

    #[test]
    fn test_set_by_name() {
        let mut opts = Options::default();
        opts.set("incremental", "true").unwrap();
        assert!(opts.incremental);
        opts.set("bv-solver", "prop").unwrap();
        assert_eq!(opts.bv_solver, BvSolverMode::Prop);
        opts.set("rewrite-level", "0").unwrap();
        assert_eq!(opts.rewrite_level, 0);
        // Short names resolve too.
        opts.set("i", "false").unwrap();
        assert!(!opts.incremental);
    }

    #[test]
    fn test_invalid_options() {
        let mut opts = Options::default();
        assert!(matches!(
            opts.set("no-such-option", "1"),
            Err(Error::InvalidOption(_))
        ));
        assert!(matches!(
            opts.set("rewrite-level", "3"),
            Err(Error::InvalidOption(_))
        ));
        assert!(matches!(
            opts.set("bv-solver", "magic"),
            Err(Error::InvalidOption(_))
        ));
        assert!(matches!(
            opts.set("incremental", "maybe"),
            Err(Error::InvalidOption(_))
        ));
        assert!(matches!(
            opts.set("prop-prob-pick-inv-value", "1001"),
            Err(Error::InvalidOption(_))
        ));
    }

    #[test]
    fn test_option_table_complete() {
        // Every table entry round-trips through set() with its default.
        let mut opts = Options::default();
        for info in OPTIONS {
            opts.set(info.long, info.default).unwrap();
        }
    }
}
