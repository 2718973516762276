//! Value-level evaluation of node kinds.
//!
//! Shared by the rewriter (constant folding) and the model evaluator: given
//! a kind, fully evaluated children and operator indices, compute the
//! resulting value. Kinds that do not denote a value-level operation (array
//! and function structure, binders) return `None`.

use bitwuzla_bv::BvValue;
use bitwuzla_fp::{FloatingPoint, FpFormat};

use crate::node::{Kind, Value as NodeValue};

fn bv(v: &NodeValue) -> &BvValue {
    match v {
        NodeValue::Bv(bv) => bv,
        _ => panic!("expected bit-vector value"),
    }
}

fn fp(v: &NodeValue) -> &FloatingPoint {
    match v {
        NodeValue::Fp(fp) => fp,
        _ => panic!("expected floating-point value"),
    }
}

fn boolean(v: &NodeValue) -> bool {
    match v {
        NodeValue::Bool(b) => *b,
        _ => panic!("expected Boolean value"),
    }
}

fn rm(v: &NodeValue) -> bitwuzla_fp::RoundingMode {
    match v {
        NodeValue::Rm(rm) => *rm,
        _ => panic!("expected rounding-mode value"),
    }
}

/// Evaluate `kind` over the given child values. The children must be
/// well-typed for the kind; this is the value semantics of the operation.
pub fn eval_node(kind: Kind, children: &[&NodeValue], indices: &[u64]) -> Option<NodeValue> {
    use Kind::*;
    let value = match kind {
        Not => NodeValue::Bool(!boolean(children[0])),
        And => NodeValue::Bool(children.iter().all(|c| boolean(c))),
        Or => NodeValue::Bool(children.iter().any(|c| boolean(c))),
        Xor => NodeValue::Bool(children.iter().filter(|c| boolean(c)).count() % 2 == 1),
        Implies => NodeValue::Bool(!boolean(children[0]) || boolean(children[1])),
        Equal => NodeValue::Bool(children[0] == children[1]),
        Distinct => {
            let mut distinct = true;
            'outer: for i in 0..children.len() {
                for j in i + 1..children.len() {
                    if children[i] == children[j] {
                        distinct = false;
                        break 'outer;
                    }
                }
            }
            NodeValue::Bool(distinct)
        }
        Ite => {
            if boolean(children[0]) {
                children[1].clone()
            } else {
                children[2].clone()
            }
        }

        BvNot => NodeValue::Bv(bv(children[0]).bvnot()),
        BvNeg => NodeValue::Bv(bv(children[0]).neg()),
        BvInc => NodeValue::Bv(bv(children[0]).inc()),
        BvDec => NodeValue::Bv(bv(children[0]).dec()),
        BvRedand => NodeValue::Bv(bv(children[0]).redand()),
        BvRedor => NodeValue::Bv(bv(children[0]).redor()),
        BvRedxor => NodeValue::Bv(bv(children[0]).redxor()),

        BvAdd => NodeValue::Bv(
            children[1..]
                .iter()
                .fold(bv(children[0]).clone(), |acc, c| acc.add(bv(c))),
        ),
        BvMul => NodeValue::Bv(
            children[1..]
                .iter()
                .fold(bv(children[0]).clone(), |acc, c| acc.mul(bv(c))),
        ),
        BvAnd => NodeValue::Bv(
            children[1..]
                .iter()
                .fold(bv(children[0]).clone(), |acc, c| acc.and(bv(c))),
        ),
        BvOr => NodeValue::Bv(
            children[1..]
                .iter()
                .fold(bv(children[0]).clone(), |acc, c| acc.or(bv(c))),
        ),
        BvXor => NodeValue::Bv(
            children[1..]
                .iter()
                .fold(bv(children[0]).clone(), |acc, c| acc.xor(bv(c))),
        ),
        BvConcat => NodeValue::Bv(
            children[1..]
                .iter()
                .fold(bv(children[0]).clone(), |acc, c| acc.concat(bv(c))),
        ),

        BvSub => NodeValue::Bv(bv(children[0]).sub(bv(children[1]))),
        BvUdiv => NodeValue::Bv(bv(children[0]).udiv(bv(children[1]))),
        BvUrem => NodeValue::Bv(bv(children[0]).urem(bv(children[1]))),
        BvSdiv => NodeValue::Bv(bv(children[0]).sdiv(bv(children[1]))),
        BvSrem => NodeValue::Bv(bv(children[0]).srem(bv(children[1]))),
        BvSmod => NodeValue::Bv(bv(children[0]).smod(bv(children[1]))),
        BvNand => NodeValue::Bv(bv(children[0]).nand(bv(children[1]))),
        BvNor => NodeValue::Bv(bv(children[0]).nor(bv(children[1]))),
        BvXnor => NodeValue::Bv(bv(children[0]).xnor(bv(children[1]))),
        BvShl => NodeValue::Bv(bv(children[0]).shl(bv(children[1]))),
        BvShr => NodeValue::Bv(bv(children[0]).shr(bv(children[1]))),
        BvAshr => NodeValue::Bv(bv(children[0]).ashr(bv(children[1]))),
        BvRol => NodeValue::Bv(bv(children[0]).rol(bv(children[1]))),
        BvRor => NodeValue::Bv(bv(children[0]).ror(bv(children[1]))),
        BvComp => NodeValue::Bv(bv(children[0]).comp(bv(children[1]))),

        BvUlt => NodeValue::Bool(bv(children[0]).ult(bv(children[1]))),
        BvUle => NodeValue::Bool(bv(children[0]).ule(bv(children[1]))),
        BvUgt => NodeValue::Bool(bv(children[0]).ugt(bv(children[1]))),
        BvUge => NodeValue::Bool(bv(children[0]).uge(bv(children[1]))),
        BvSlt => NodeValue::Bool(bv(children[0]).slt(bv(children[1]))),
        BvSle => NodeValue::Bool(bv(children[0]).sle(bv(children[1]))),
        BvSgt => NodeValue::Bool(bv(children[0]).sgt(bv(children[1]))),
        BvSge => NodeValue::Bool(bv(children[0]).sge(bv(children[1]))),
        BvUaddo => NodeValue::Bool(bv(children[0]).uaddo(bv(children[1]))),
        BvSaddo => NodeValue::Bool(bv(children[0]).saddo(bv(children[1]))),
        BvUsubo => NodeValue::Bool(bv(children[0]).usubo(bv(children[1]))),
        BvSsubo => NodeValue::Bool(bv(children[0]).ssubo(bv(children[1]))),
        BvUmulo => NodeValue::Bool(bv(children[0]).umulo(bv(children[1]))),
        BvSmulo => NodeValue::Bool(bv(children[0]).smulo(bv(children[1]))),
        BvSdivo => NodeValue::Bool(bv(children[0]).sdivo(bv(children[1]))),

        BvExtract => NodeValue::Bv(bv(children[0]).extract(indices[0], indices[1])),
        BvRepeat => NodeValue::Bv(bv(children[0]).repeat(indices[0])),
        BvRoli => NodeValue::Bv(bv(children[0]).roli(indices[0])),
        BvRori => NodeValue::Bv(bv(children[0]).rori(indices[0])),
        BvSignExtend => NodeValue::Bv(bv(children[0]).sign_extend(indices[0])),
        BvZeroExtend => NodeValue::Bv(bv(children[0]).zero_extend(indices[0])),

        FpFp => NodeValue::Fp(FloatingPoint::from_triple(
            bv(children[0]),
            bv(children[1]),
            bv(children[2]),
        )),
        FpAbs => NodeValue::Fp(fp(children[0]).abs()),
        FpNeg => NodeValue::Fp(fp(children[0]).neg()),
        FpAdd => NodeValue::Fp(fp(children[1]).add(rm(children[0]), fp(children[2]))),
        FpSub => NodeValue::Fp(fp(children[1]).sub(rm(children[0]), fp(children[2]))),
        FpMul => NodeValue::Fp(fp(children[1]).mul(rm(children[0]), fp(children[2]))),
        FpDiv => NodeValue::Fp(fp(children[1]).div(rm(children[0]), fp(children[2]))),
        FpFma => NodeValue::Fp(fp(children[1]).fma(rm(children[0]), fp(children[2]), fp(children[3]))),
        FpRem => NodeValue::Fp(fp(children[0]).rem(fp(children[1]))),
        FpSqrt => NodeValue::Fp(fp(children[1]).sqrt(rm(children[0]))),
        FpRti => NodeValue::Fp(fp(children[1]).rti(rm(children[0]))),
        FpMin => NodeValue::Fp(fp(children[0]).min(fp(children[1]))),
        FpMax => NodeValue::Fp(fp(children[0]).max(fp(children[1]))),

        FpEqual => NodeValue::Bool(fp(children[0]).fp_eq(fp(children[1]))),
        FpLeq => NodeValue::Bool(fp(children[0]).leq(fp(children[1]))),
        FpLt => NodeValue::Bool(fp(children[0]).lt(fp(children[1]))),
        FpGeq => NodeValue::Bool(fp(children[0]).geq(fp(children[1]))),
        FpGt => NodeValue::Bool(fp(children[0]).gt(fp(children[1]))),
        FpIsNan => NodeValue::Bool(fp(children[0]).is_nan()),
        FpIsInf => NodeValue::Bool(fp(children[0]).is_inf()),
        FpIsNeg => NodeValue::Bool(fp(children[0]).is_neg()),
        FpIsPos => NodeValue::Bool(fp(children[0]).is_pos()),
        FpIsZero => NodeValue::Bool(fp(children[0]).is_zero()),
        FpIsNormal => NodeValue::Bool(fp(children[0]).is_normal()),
        FpIsSubnormal => NodeValue::Bool(fp(children[0]).is_subnormal()),

        FpToFpFromBv => {
            let fmt = FpFormat::new(indices[0], indices[1]);
            NodeValue::Fp(FloatingPoint::from_ieee_bv(fmt, bv(children[0])))
        }
        FpToFpFromFp => {
            let fmt = FpFormat::new(indices[0], indices[1]);
            NodeValue::Fp(fp(children[1]).to_fp(fmt, rm(children[0])))
        }
        FpToFpFromSbv => {
            let fmt = FpFormat::new(indices[0], indices[1]);
            NodeValue::Fp(FloatingPoint::from_sbv(fmt, rm(children[0]), bv(children[1])))
        }
        FpToFpFromUbv => {
            let fmt = FpFormat::new(indices[0], indices[1]);
            NodeValue::Fp(FloatingPoint::from_ubv(fmt, rm(children[0]), bv(children[1])))
        }
        // Unspecified conversions (NaN, infinity, out of range) evaluate to
        // zero, giving the solver a fixed witness.
        FpToSbv => NodeValue::Bv(
            fp(children[1])
                .to_sbv(rm(children[0]), indices[0])
                .unwrap_or_else(|| BvValue::zero(indices[0])),
        ),
        FpToUbv => NodeValue::Bv(
            fp(children[1])
                .to_ubv(rm(children[0]), indices[0])
                .unwrap_or_else(|| BvValue::zero(indices[0])),
        ),

        Constant | Variable | Value | ConstArray | Exists | Forall | Lambda | Select | Store
        | Apply => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(x: bool) -> NodeValue {
        NodeValue::Bool(x)
    }

    fn v8(x: u64) -> NodeValue {
        NodeValue::Bv(BvValue::from_u64(8, x))
    }

    #[test]
    fn test_boolean_eval() {
        assert_eq!(eval_node(Kind::And, &[&b(true), &b(false)], &[]), Some(b(false)));
        assert_eq!(eval_node(Kind::Or, &[&b(false), &b(true)], &[]), Some(b(true)));
        assert_eq!(
            eval_node(Kind::Xor, &[&b(true), &b(true), &b(true)], &[]),
            Some(b(true))
        );
        assert_eq!(
            eval_node(Kind::Implies, &[&b(true), &b(false)], &[]),
            Some(b(false))
        );
        assert_eq!(
            eval_node(Kind::Ite, &[&b(false), &v8(1), &v8(2)], &[]),
            Some(v8(2))
        );
    }

    #[test]
    fn test_bv_eval() {
        assert_eq!(
            eval_node(Kind::BvAdd, &[&v8(200), &v8(100)], &[]),
            Some(v8(44))
        );
        assert_eq!(
            eval_node(Kind::BvExtract, &[&v8(0b1010_0101)], &[7, 4]),
            Some(NodeValue::Bv(BvValue::from_u64(4, 0b1010)))
        );
        assert_eq!(
            eval_node(Kind::BvUlt, &[&v8(3), &v8(5)], &[]),
            Some(b(true))
        );
        assert_eq!(
            eval_node(Kind::BvUdiv, &[&v8(7), &v8(0)], &[]),
            Some(v8(255))
        );
    }

    #[test]
    fn test_distinct_eval() {
        assert_eq!(
            eval_node(Kind::Distinct, &[&v8(1), &v8(2), &v8(3)], &[]),
            Some(b(true))
        );
        assert_eq!(
            eval_node(Kind::Distinct, &[&v8(1), &v8(2), &v8(1)], &[]),
            Some(b(false))
        );
    }

    #[test]
    fn test_structural_kinds_not_evaluable() {
        assert_eq!(eval_node(Kind::Select, &[&v8(0), &v8(0)], &[]), None);
        assert_eq!(eval_node(Kind::Apply, &[&v8(0)], &[]), None);
    }
}
