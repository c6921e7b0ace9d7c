//! AST evaluation
//!
//! A straight recursive walk. All type decisions were made by the parser;
//! evaluation promotes operands (narrow integers to `s32`, `f32` to `f64`)
//! and dispatches into the [`Value`] kernels. Dereference nodes read from
//! the supplied [`MemoryTarget`]; an AST without `Var` and `Deref` nodes
//! evaluates to the same result on every call.
//!
//! `&&` and `||` short-circuit: the right operand is evaluated only when
//! the left operand's zero-ness does not already decide the result, so a
//! dereference on the right may be skipped entirely.

use super::ast::{BinOp, Expr, UnOp};
use crate::target::MemoryTarget;
use crate::value::{EvalError, Value};

impl Expr {
    /// Evaluate the tree, dereferencing through `target` when present.
    ///
    /// A dereference without a target fails with the same
    /// [`EvalError::MemoryRead`] a failed read would produce.
    pub fn evaluate(&self, target: Option<&dyn MemoryTarget>) -> Result<Value, EvalError> {
        match self {
            Expr::Value(v) => Ok(*v),

            Expr::Var { slot, .. } => Ok(slot.get()),

            Expr::Cast { vtype, child } => child.evaluate(target)?.cast(*vtype),

            Expr::Deref { vtype, child } => {
                let ptr = child.evaluate(target)?;
                let (pointee, addr) = match ptr {
                    Value::Ptr(pointee, addr) => (pointee, addr),
                    _ => return Err(EvalError::InvalidOperandType),
                };
                let target = target.ok_or(EvalError::MemoryRead(addr, *vtype))?;
                let mut buf = [0u8; 8];
                let buf = &mut buf[..pointee.size()];
                target
                    .read(addr, buf)
                    .map_err(|_| EvalError::MemoryRead(addr, *vtype))?;
                Value::from_ne_bytes(pointee, buf).ok_or(EvalError::MemoryRead(addr, *vtype))
            }

            Expr::Unary { op, child, .. } => {
                let v = child.evaluate(target)?;
                match op {
                    UnOp::Pos => v.promoted(),
                    UnOp::Neg => v.neg(),
                    UnOp::Not => v.logical_not(),
                    UnOp::Compl => v.compl(),
                }
            }

            Expr::Binary {
                op, left, right, ..
            } => match op {
                BinOp::AndCond => {
                    if left.evaluate(target)?.is_zero() {
                        return Ok(Value::S32(0));
                    }
                    Ok(Value::S32(!right.evaluate(target)?.is_zero() as i32))
                }
                BinOp::OrCond => {
                    if !left.evaluate(target)?.is_zero() {
                        return Ok(Value::S32(1));
                    }
                    Ok(Value::S32(!right.evaluate(target)?.is_zero() as i32))
                }
                _ => {
                    let l = left.evaluate(target)?;
                    let r = right.evaluate(target)?;
                    match op {
                        BinOp::Add => l.add(r),
                        BinOp::Sub => l.sub(r),
                        BinOp::Mul => l.mul(r),
                        BinOp::Div => l.div(r),
                        BinOp::Mod => l.rem(r),
                        BinOp::And => l.bit_and(r),
                        BinOp::Xor => l.bit_xor(r),
                        BinOp::Or => l.bit_or(r),
                        BinOp::Shl => l.shl(r),
                        BinOp::Shr => l.shr(r),
                        BinOp::Eq => l.cmp_eq(r),
                        BinOp::Neq => l.cmp_neq(r),
                        BinOp::Lt => l.cmp_lt(r),
                        BinOp::Gt => l.cmp_gt(r),
                        BinOp::Le => l.cmp_le(r),
                        BinOp::Ge => l.cmp_ge(r),
                        BinOp::AndCond | BinOp::OrCond => unreachable!(),
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::BufferTarget;
    use crate::value::{ScalarType, ValueType};

    fn lit(v: Value) -> Box<Expr> {
        Box::new(Expr::Value(v))
    }

    #[test]
    fn short_circuit_skips_right_side_memory() {
        // 0 && *(s32*)0x1000 — the deref would fail (no such address), but
        // the left side already decides the result.
        let deref = Expr::Deref {
            vtype: ValueType::Scalar(ScalarType::S32),
            child: Box::new(Expr::Cast {
                vtype: ValueType::Ptr(ScalarType::S32),
                child: lit(Value::U32(0x1000)),
            }),
        };
        let and = Expr::Binary {
            op: BinOp::AndCond,
            vtype: ValueType::Scalar(ScalarType::S32),
            left: lit(Value::S32(0)),
            right: Box::new(deref.clone()),
        };
        let empty = BufferTarget::new();
        assert_eq!(and.evaluate(Some(&empty)), Ok(Value::S32(0)));

        let or = Expr::Binary {
            op: BinOp::OrCond,
            vtype: ValueType::Scalar(ScalarType::S32),
            left: lit(Value::S32(1)),
            right: Box::new(deref),
        };
        assert_eq!(or.evaluate(Some(&empty)), Ok(Value::S32(1)));
    }

    #[test]
    fn deref_reads_target_memory() {
        let target = BufferTarget::new().segment(0x2000, 7i32.to_ne_bytes().to_vec());
        let deref = Expr::Deref {
            vtype: ValueType::Scalar(ScalarType::S32),
            child: Box::new(Expr::Cast {
                vtype: ValueType::Ptr(ScalarType::S32),
                child: lit(Value::U32(0x2000)),
            }),
        };
        assert_eq!(deref.evaluate(Some(&target)), Ok(Value::S32(7)));
        assert_eq!(
            deref.evaluate(None),
            Err(EvalError::MemoryRead(
                0x2000,
                ValueType::Scalar(ScalarType::S32)
            ))
        );
    }
}
