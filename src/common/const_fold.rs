//! Constant folding
//!
//! Folds operator applications over constant operands using the opcode of
//! the resolved operator symbol. Operands have already been converted to
//! the operator's parameter types; `None` means "not foldable" (division by
//! zero, or operand kinds the opcode does not apply to).

use super::opcodes::{self, *};
use super::types::TypeTag;
use crate::ast::Literal;

pub struct ConstFold;

impl ConstFold {
    /// Fold a unary or binary operator application
    pub fn fold(opcode: u32, operands: &[Literal]) -> Option<Literal> {
        match operands {
            [operand] => Self::fold1(opcode, operand),
            [left, right] => Self::fold2(opcode, left, right),
            _ => None,
        }
    }

    pub fn fold1(opcode: u32, operand: &Literal) -> Option<Literal> {
        let op = u16::try_from(opcode).ok()?;
        match op {
            NOP => Some(operand.clone()),
            INEG => Some(Literal::Int(int_value(operand)?.wrapping_neg())),
            LNEG => Some(Literal::Long(long_value(operand)?.wrapping_neg())),
            FNEG => Some(Literal::Float(-float_value(operand)?)),
            DNEG => Some(Literal::Double(-double_value(operand)?)),
            BOOL_NOT => Some(Literal::Boolean(!bool_value(operand)?)),
            IFEQ => Some(Literal::Boolean(int_value(operand)? == 0)),
            IFNE => Some(Literal::Boolean(int_value(operand)? != 0)),
            IFLT => Some(Literal::Boolean(int_value(operand)? < 0)),
            IFGT => Some(Literal::Boolean(int_value(operand)? > 0)),
            IFLE => Some(Literal::Boolean(int_value(operand)? <= 0)),
            IFGE => Some(Literal::Boolean(int_value(operand)? >= 0)),
            _ => None,
        }
    }

    pub fn fold2(opcode: u32, left: &Literal, right: &Literal) -> Option<Literal> {
        if let Some((cmp, branch)) = opcodes::split(opcode) {
            let compared = Self::fold2(cmp as u32, left, right)?;
            return Self::fold1(branch as u32, &compared);
        }
        let op = u16::try_from(opcode).ok()?;
        if op == STRING_ADD {
            return Some(Literal::String(format!("{}{}", string_value(left)?, string_value(right)?)));
        }
        if let (Literal::Boolean(l), Literal::Boolean(r)) = (left, right) {
            return match op {
                IAND | BOOL_AND => Some(Literal::Boolean(*l && *r)),
                IOR | BOOL_OR => Some(Literal::Boolean(*l || *r)),
                IXOR => Some(Literal::Boolean(l ^ r)),
                IF_ICMPEQ => Some(Literal::Boolean(l == r)),
                IF_ICMPNE => Some(Literal::Boolean(l != r)),
                _ => None,
            };
        }
        match op {
            IADD | ISUB | IMUL | IDIV | IREM | IAND | IOR | IXOR | ISHL | ISHR | IUSHR => {
                let (l, r) = (int_value(left)?, int_value(right)?);
                let v = match op {
                    IADD => l.wrapping_add(r),
                    ISUB => l.wrapping_sub(r),
                    IMUL => l.wrapping_mul(r),
                    IDIV if r == 0 => return None,
                    IDIV => l.wrapping_div(r),
                    IREM if r == 0 => return None,
                    IREM => l.wrapping_rem(r),
                    IAND => l & r,
                    IOR => l | r,
                    IXOR => l ^ r,
                    ISHL => l.wrapping_shl(r as u32),
                    ISHR => l.wrapping_shr(r as u32),
                    _ => ((l as u32).wrapping_shr(r as u32)) as i32,
                };
                Some(Literal::Int(v))
            }
            ISHLL | ISHRL | IUSHRL => {
                let (l, r) = (int_value(left)?, long_value(right)? as u32);
                let v = match op {
                    ISHLL => l.wrapping_shl(r),
                    ISHRL => l.wrapping_shr(r),
                    _ => (l as u32).wrapping_shr(r) as i32,
                };
                Some(Literal::Int(v))
            }
            IF_ICMPEQ | IF_ICMPNE | IF_ICMPLT | IF_ICMPGE | IF_ICMPGT | IF_ICMPLE => {
                let (l, r) = (int_value(left)?, int_value(right)?);
                let v = match op {
                    IF_ICMPEQ => l == r,
                    IF_ICMPNE => l != r,
                    IF_ICMPLT => l < r,
                    IF_ICMPGE => l >= r,
                    IF_ICMPGT => l > r,
                    _ => l <= r,
                };
                Some(Literal::Boolean(v))
            }
            LADD | LSUB | LMUL | LDIV | LREM | LAND | LOR | LXOR => {
                let (l, r) = (long_value(left)?, long_value(right)?);
                let v = match op {
                    LADD => l.wrapping_add(r),
                    LSUB => l.wrapping_sub(r),
                    LMUL => l.wrapping_mul(r),
                    LDIV if r == 0 => return None,
                    LDIV => l.wrapping_div(r),
                    LREM if r == 0 => return None,
                    LREM => l.wrapping_rem(r),
                    LAND => l & r,
                    LOR => l | r,
                    _ => l ^ r,
                };
                Some(Literal::Long(v))
            }
            LSHL | LSHR | LUSHR | LSHLL | LSHRL | LUSHRL => {
                let l = long_value(left)?;
                let r = long_value(right)? as u32;
                let v = match op {
                    LSHL | LSHLL => l.wrapping_shl(r),
                    LSHR | LSHRL => l.wrapping_shr(r),
                    _ => (l as u64).wrapping_shr(r) as i64,
                };
                Some(Literal::Long(v))
            }
            LCMP => {
                let (l, r) = (long_value(left)?, long_value(right)?);
                Some(Literal::Int(l.cmp(&r) as i32))
            }
            FADD | FSUB | FMUL | FDIV | FREM => {
                let (l, r) = (float_value(left)?, float_value(right)?);
                let v = match op {
                    FADD => l + r,
                    FSUB => l - r,
                    FMUL => l * r,
                    FDIV => l / r,
                    _ => l % r,
                };
                Some(Literal::Float(v))
            }
            FCMPL | FCMPG => {
                let (l, r) = (float_value(left)?, float_value(right)?);
                Some(Literal::Int(compare_floating(l as f64, r as f64, op == FCMPG)))
            }
            DADD | DSUB | DMUL | DDIV | DREM => {
                let (l, r) = (double_value(left)?, double_value(right)?);
                let v = match op {
                    DADD => l + r,
                    DSUB => l - r,
                    DMUL => l * r,
                    DDIV => l / r,
                    _ => l % r,
                };
                Some(Literal::Double(v))
            }
            DCMPL | DCMPG => {
                let (l, r) = (double_value(left)?, double_value(right)?);
                Some(Literal::Int(compare_floating(l, r, op == DCMPG)))
            }
            _ => None,
        }
    }

    /// Convert a constant to another primitive type (or String)
    pub fn coerce(value: &Literal, target: TypeTag) -> Option<Literal> {
        if let Literal::Boolean(_) = value {
            return (target == TypeTag::Boolean).then(|| value.clone());
        }
        let v = match target {
            TypeTag::Byte => Literal::Int(long_value(value)? as i8 as i32),
            TypeTag::Short => Literal::Int(long_value(value)? as i16 as i32),
            TypeTag::Char => Literal::Char(long_value(value)? as u16),
            TypeTag::Int => Literal::Int(match value {
                Literal::Float(f) => *f as i32,
                Literal::Double(d) => *d as i32,
                other => long_value(other)? as i32,
            }),
            TypeTag::Long => Literal::Long(match value {
                Literal::Float(f) => *f as i64,
                Literal::Double(d) => *d as i64,
                other => long_value(other)?,
            }),
            TypeTag::Float => Literal::Float(float_value(value)?),
            TypeTag::Double => Literal::Double(double_value(value)?),
            TypeTag::Boolean => return None,
        };
        Some(v)
    }
}

fn compare_floating(l: f64, r: f64, nan_is_greater: bool) -> i32 {
    if l.is_nan() || r.is_nan() {
        if nan_is_greater {
            1
        } else {
            -1
        }
    } else if l < r {
        -1
    } else if l > r {
        1
    } else {
        0
    }
}

pub fn int_value(lit: &Literal) -> Option<i32> {
    match lit {
        Literal::Int(v) => Some(*v),
        Literal::Char(c) => Some(*c as i32),
        Literal::Long(v) => Some(*v as i32),
        _ => None,
    }
}

pub fn long_value(lit: &Literal) -> Option<i64> {
    match lit {
        Literal::Int(v) => Some(*v as i64),
        Literal::Char(c) => Some(*c as i64),
        Literal::Long(v) => Some(*v),
        _ => None,
    }
}

pub fn float_value(lit: &Literal) -> Option<f32> {
    match lit {
        Literal::Float(v) => Some(*v),
        Literal::Double(v) => Some(*v as f32),
        other => long_value(other).map(|v| v as f32),
    }
}

pub fn double_value(lit: &Literal) -> Option<f64> {
    match lit {
        Literal::Float(v) => Some(*v as f64),
        Literal::Double(v) => Some(*v),
        other => long_value(other).map(|v| v as f64),
    }
}

pub fn bool_value(lit: &Literal) -> Option<bool> {
    match lit {
        Literal::Boolean(b) => Some(*b),
        _ => None,
    }
}

/// String conversion used by constant concatenation
pub fn string_value(lit: &Literal) -> Option<String> {
    Some(match lit {
        Literal::String(s) => s.clone(),
        Literal::Int(v) => v.to_string(),
        Literal::Long(v) => v.to_string(),
        Literal::Char(c) => String::from_utf16_lossy(&[*c]),
        Literal::Boolean(b) => b.to_string(),
        Literal::Float(f) => format_floating(*f as f64),
        Literal::Double(d) => format_floating(*d),
        Literal::Null => return None,
    })
}

fn format_floating(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e7 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_wraps() {
        let max = Literal::Int(i32::MAX);
        assert_eq!(ConstFold::fold2(IADD as u32, &max, &Literal::Int(1)), Some(Literal::Int(i32::MIN)));
        assert_eq!(ConstFold::fold2(IDIV as u32, &max, &Literal::Int(0)), None);
        assert_eq!(ConstFold::fold1(INEG as u32, &Literal::Int(5)), Some(Literal::Int(-5)));
    }

    #[test]
    fn compound_comparisons_fold_to_booleans() {
        let lt = opcodes::combine(LCMP, IFLT);
        assert_eq!(ConstFold::fold2(lt, &Literal::Long(1), &Literal::Long(2)), Some(Literal::Boolean(true)));
        let gt = opcodes::combine(DCMPL, IFGT);
        assert_eq!(
            ConstFold::fold2(gt, &Literal::Double(f64::NAN), &Literal::Double(0.0)),
            Some(Literal::Boolean(false))
        );
    }

    #[test]
    fn string_concatenation_converts_operands() {
        let v = ConstFold::fold2(STRING_ADD as u32, &Literal::String("a".into()), &Literal::Char(b'b' as u16));
        assert_eq!(v, Some(Literal::String("ab".into())));
        let v = ConstFold::fold2(STRING_ADD as u32, &Literal::Int(1), &Literal::String("x".into()));
        assert_eq!(v, Some(Literal::String("1x".into())));
    }

    #[test]
    fn coercion_narrows() {
        assert_eq!(ConstFold::coerce(&Literal::Int(300), TypeTag::Byte), Some(Literal::Int(44)));
        assert_eq!(ConstFold::coerce(&Literal::Int(65), TypeTag::Char), Some(Literal::Char(65)));
        assert_eq!(ConstFold::coerce(&Literal::Double(2.9), TypeTag::Int), Some(Literal::Int(2)));
        assert_eq!(ConstFold::coerce(&Literal::Boolean(true), TypeTag::Int), None);
    }
}
