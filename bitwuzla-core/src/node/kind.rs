//! Node kinds and their signatures.

use std::fmt;

/// The kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum Kind {
    // Leaves
    Constant,
    Variable,
    Value,
    ConstArray,

    // Boolean
    Not,
    And,
    Or,
    Xor,
    Implies,
    Equal,
    Distinct,
    Ite,

    // Binders
    Exists,
    Forall,
    Lambda,

    // Arrays
    Select,
    Store,

    // Function application
    Apply,

    // Bit-vector, unary
    BvNot,
    BvNeg,
    BvInc,
    BvDec,
    BvRedand,
    BvRedor,
    BvRedxor,

    // Bit-vector, binary and n-ary
    BvAdd,
    BvSub,
    BvMul,
    BvUdiv,
    BvUrem,
    BvSdiv,
    BvSrem,
    BvSmod,
    BvAnd,
    BvOr,
    BvXor,
    BvNand,
    BvNor,
    BvXnor,
    BvShl,
    BvShr,
    BvAshr,
    BvRol,
    BvRor,
    BvComp,
    BvConcat,

    // Bit-vector predicates
    BvUlt,
    BvUle,
    BvUgt,
    BvUge,
    BvSlt,
    BvSle,
    BvSgt,
    BvSge,
    BvUaddo,
    BvSaddo,
    BvUsubo,
    BvSsubo,
    BvUmulo,
    BvSmulo,
    BvSdivo,

    // Bit-vector, indexed
    BvExtract,
    BvRepeat,
    BvRoli,
    BvRori,
    BvSignExtend,
    BvZeroExtend,

    // Floating-point
    FpFp,
    FpAbs,
    FpNeg,
    FpAdd,
    FpSub,
    FpMul,
    FpDiv,
    FpFma,
    FpRem,
    FpSqrt,
    FpRti,
    FpMin,
    FpMax,
    FpEqual,
    FpLeq,
    FpLt,
    FpGeq,
    FpGt,
    FpIsNan,
    FpIsInf,
    FpIsNeg,
    FpIsPos,
    FpIsZero,
    FpIsNormal,
    FpIsSubnormal,

    // Floating-point, indexed conversions
    FpToFpFromBv,
    FpToFpFromFp,
    FpToFpFromSbv,
    FpToFpFromUbv,
    FpToSbv,
    FpToUbv,
}

/// Arity and index signature of a kind.
#[derive(Debug, Clone, Copy)]
pub struct KindInfo {
    /// SMT-LIB style operator name.
    pub name: &'static str,
    /// Minimum number of children.
    pub min_arity: u32,
    /// Maximum number of children; `u32::MAX` for n-ary kinds.
    pub max_arity: u32,
    /// Number of operator indices.
    pub num_indices: u32,
}

impl Kind {
    /// Signature information for this kind.
    pub fn info(self) -> KindInfo {
        use Kind::*;
        let (name, min, max, idx): (&'static str, u32, u32, u32) = match self {
            Constant => ("const", 0, 0, 0),
            Variable => ("var", 0, 0, 0),
            Value => ("value", 0, 0, 0),
            ConstArray => ("const-array", 1, 1, 0),

            Not => ("not", 1, 1, 0),
            And => ("and", 2, u32::MAX, 0),
            Or => ("or", 2, u32::MAX, 0),
            Xor => ("xor", 2, u32::MAX, 0),
            Implies => ("=>", 2, 2, 0),
            Equal => ("=", 2, 2, 0),
            Distinct => ("distinct", 2, u32::MAX, 0),
            Ite => ("ite", 3, 3, 0),

            Exists => ("exists", 2, 2, 0),
            Forall => ("forall", 2, 2, 0),
            Lambda => ("lambda", 2, 2, 0),

            Select => ("select", 2, 2, 0),
            Store => ("store", 3, 3, 0),
            Apply => ("apply", 2, u32::MAX, 0),

            BvNot => ("bvnot", 1, 1, 0),
            BvNeg => ("bvneg", 1, 1, 0),
            BvInc => ("bvinc", 1, 1, 0),
            BvDec => ("bvdec", 1, 1, 0),
            BvRedand => ("bvredand", 1, 1, 0),
            BvRedor => ("bvredor", 1, 1, 0),
            BvRedxor => ("bvredxor", 1, 1, 0),

            BvAdd => ("bvadd", 2, u32::MAX, 0),
            BvSub => ("bvsub", 2, 2, 0),
            BvMul => ("bvmul", 2, u32::MAX, 0),
            BvUdiv => ("bvudiv", 2, 2, 0),
            BvUrem => ("bvurem", 2, 2, 0),
            BvSdiv => ("bvsdiv", 2, 2, 0),
            BvSrem => ("bvsrem", 2, 2, 0),
            BvSmod => ("bvsmod", 2, 2, 0),
            BvAnd => ("bvand", 2, u32::MAX, 0),
            BvOr => ("bvor", 2, u32::MAX, 0),
            BvXor => ("bvxor", 2, u32::MAX, 0),
            BvNand => ("bvnand", 2, 2, 0),
            BvNor => ("bvnor", 2, 2, 0),
            BvXnor => ("bvxnor", 2, 2, 0),
            BvShl => ("bvshl", 2, 2, 0),
            BvShr => ("bvlshr", 2, 2, 0),
            BvAshr => ("bvashr", 2, 2, 0),
            BvRol => ("bvrol", 2, 2, 0),
            BvRor => ("bvror", 2, 2, 0),
            BvComp => ("bvcomp", 2, 2, 0),
            BvConcat => ("concat", 2, u32::MAX, 0),

            BvUlt => ("bvult", 2, 2, 0),
            BvUle => ("bvule", 2, 2, 0),
            BvUgt => ("bvugt", 2, 2, 0),
            BvUge => ("bvuge", 2, 2, 0),
            BvSlt => ("bvslt", 2, 2, 0),
            BvSle => ("bvsle", 2, 2, 0),
            BvSgt => ("bvsgt", 2, 2, 0),
            BvSge => ("bvsge", 2, 2, 0),
            BvUaddo => ("bvuaddo", 2, 2, 0),
            BvSaddo => ("bvsaddo", 2, 2, 0),
            BvUsubo => ("bvusubo", 2, 2, 0),
            BvSsubo => ("bvssubo", 2, 2, 0),
            BvUmulo => ("bvumulo", 2, 2, 0),
            BvSmulo => ("bvsmulo", 2, 2, 0),
            BvSdivo => ("bvsdivo", 2, 2, 0),

            BvExtract => ("extract", 1, 1, 2),
            BvRepeat => ("repeat", 1, 1, 1),
            BvRoli => ("rotate_left", 1, 1, 1),
            BvRori => ("rotate_right", 1, 1, 1),
            BvSignExtend => ("sign_extend", 1, 1, 1),
            BvZeroExtend => ("zero_extend", 1, 1, 1),

            FpFp => ("fp", 3, 3, 0),
            FpAbs => ("fp.abs", 1, 1, 0),
            FpNeg => ("fp.neg", 1, 1, 0),
            FpAdd => ("fp.add", 3, 3, 0),
            FpSub => ("fp.sub", 3, 3, 0),
            FpMul => ("fp.mul", 3, 3, 0),
            FpDiv => ("fp.div", 3, 3, 0),
            FpFma => ("fp.fma", 4, 4, 0),
            FpRem => ("fp.rem", 2, 2, 0),
            FpSqrt => ("fp.sqrt", 2, 2, 0),
            FpRti => ("fp.roundToIntegral", 2, 2, 0),
            FpMin => ("fp.min", 2, 2, 0),
            FpMax => ("fp.max", 2, 2, 0),
            FpEqual => ("fp.eq", 2, 2, 0),
            FpLeq => ("fp.leq", 2, 2, 0),
            FpLt => ("fp.lt", 2, 2, 0),
            FpGeq => ("fp.geq", 2, 2, 0),
            FpGt => ("fp.gt", 2, 2, 0),
            FpIsNan => ("fp.isNaN", 1, 1, 0),
            FpIsInf => ("fp.isInfinite", 1, 1, 0),
            FpIsNeg => ("fp.isNegative", 1, 1, 0),
            FpIsPos => ("fp.isPositive", 1, 1, 0),
            FpIsZero => ("fp.isZero", 1, 1, 0),
            FpIsNormal => ("fp.isNormal", 1, 1, 0),
            FpIsSubnormal => ("fp.isSubnormal", 1, 1, 0),

            FpToFpFromBv => ("to_fp", 1, 1, 2),
            FpToFpFromFp => ("to_fp", 2, 2, 2),
            FpToFpFromSbv => ("to_fp", 2, 2, 2),
            FpToFpFromUbv => ("to_fp_unsigned", 2, 2, 2),
            FpToSbv => ("fp.to_sbv", 2, 2, 1),
            FpToUbv => ("fp.to_ubv", 2, 2, 1),
        };
        KindInfo {
            name,
            min_arity: min,
            max_arity: max,
            num_indices: idx,
        }
    }

    /// True iff this kind is a leaf (never has children).
    pub fn is_leaf(self) -> bool {
        matches!(self, Kind::Constant | Kind::Variable | Kind::Value)
    }

    /// True iff this kind is a binder (`exists`, `forall`, `lambda`).
    pub fn is_binder(self) -> bool {
        matches!(self, Kind::Exists | Kind::Forall | Kind::Lambda)
    }

    /// True iff this kind is commutative and associative, with operands
    /// that may be reordered freely.
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            Kind::And
                | Kind::Or
                | Kind::Xor
                | Kind::Equal
                | Kind::Distinct
                | Kind::BvAdd
                | Kind::BvMul
                | Kind::BvAnd
                | Kind::BvOr
                | Kind::BvXor
                | Kind::BvComp
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_info() {
        assert_eq!(Kind::Not.info().min_arity, 1);
        assert_eq!(Kind::And.info().max_arity, u32::MAX);
        assert_eq!(Kind::BvExtract.info().num_indices, 2);
        assert_eq!(Kind::FpFma.info().min_arity, 4);
        assert_eq!(Kind::Ite.info().min_arity, 3);
    }

    #[test]
    fn test_classification() {
        assert!(Kind::Value.is_leaf());
        assert!(Kind::Lambda.is_binder());
        assert!(Kind::BvAdd.is_commutative());
        assert!(!Kind::BvSub.is_commutative());
        assert!(!Kind::BvConcat.is_commutative());
    }
}
