//! Operator resolution
//!
//! Corresponds to JavaC's `com.sun.tools.javac.comp.Operators` class.
//! Operators are grouped into helpers by family. Resolving an operator
//! picks the first helper of its tag whose applicability test accepts the
//! operand types, promotes the operands the way the family requires and
//! looks up the alternative with exactly the promoted signature. Operator
//! symbols are created the first time an alternative is selected and
//! cached from then on, so repeated lookups hand back the same symbol.

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;
use once_cell::unsync::OnceCell;

use crate::ast::{BinaryOp, Span, UnaryOp};
use crate::common::diag::{DiagKind, Log};
use crate::common::opcodes::{self, combine};
use crate::common::symbol::OperatorId;
use crate::common::symtab::Symtab;
use crate::common::types::{Type, TypeTag, Types};

/// A resolved operator: signature plus the opcode code generation uses.
/// Comparison operators carry two combined opcodes, see [`opcodes::combine`].
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorSymbol {
    pub name: &'static str,
    pub params: Vec<Type>,
    pub ret: Type,
    pub opcode: u32,
}

impl OperatorSymbol {
    pub fn is_noop(&self) -> bool {
        self.opcode == opcodes::ILLEGAL as u32
    }
}

/// Operand and result types appearing in operator signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Prim(TypeTag),
    Object,
    String,
    /// The type of `null`
    Bot,
}

impl Operand {
    fn to_type(self, symtab: &Symtab) -> Type {
        match self {
            Operand::Prim(tag) => Type::Prim(tag),
            Operand::Object => Type::class(symtab.predef.object),
            Operand::String => Type::class(symtab.predef.string),
            Operand::Bot => Type::Null,
        }
    }

    /// Whether a (promoted) operand type is exactly this palette entry
    fn matches(self, t: &Type, types: &Types) -> bool {
        match self {
            Operand::Prim(tag) => t.tag() == Some(tag),
            Operand::Object => types.is_object(t),
            Operand::String => types.is_string(t),
            Operand::Bot => matches!(t, Type::Null),
        }
    }
}

const INT: Operand = Operand::Prim(TypeTag::Int);
const LONG: Operand = Operand::Prim(TypeTag::Long);
const FLOAT: Operand = Operand::Prim(TypeTag::Float);
const DOUBLE: Operand = Operand::Prim(TypeTag::Double);
const BOOLEAN: Operand = Operand::Prim(TypeTag::Boolean);
const BYTE: Operand = Operand::Prim(TypeTag::Byte);
const SHORT: Operand = Operand::Prim(TypeTag::Short);
const CHAR: Operand = Operand::Prim(TypeTag::Char);

/// One declared signature of an operator, materialized on first use
struct Alternative {
    params: Vec<Operand>,
    ret: Operand,
    opcode: u32,
    symbol: OnceCell<OperatorId>,
}

impl Alternative {
    fn new(params: Vec<Operand>, ret: Operand, opcode: u32) -> Self {
        Self {
            params,
            ret,
            opcode,
            symbol: OnceCell::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnaryFamily {
    /// Unary `+`, `-`, `~`; applicability is refined by `integral_only`
    Numeric { integral_only: bool },
    Boolean,
    /// `++` and `--`; the operand type is kept, only unboxed
    PrefixPostfix,
    /// Synthetic null check
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryFamily {
    Numeric { integral_only: bool },
    Boolean,
    String,
    Shift,
    Equality,
}

struct UnaryHelper {
    name: &'static str,
    family: UnaryFamily,
    alternatives: Vec<Alternative>,
}

struct BinaryHelper {
    name: &'static str,
    family: BinaryFamily,
    alternatives: Vec<Alternative>,
}

/// How two operands of `==` / `!=` compare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComparisonKind {
    NumericOrBoolean,
    Reference,
    Invalid,
}

pub struct Operators {
    unary: Vec<(UnaryOp, UnaryHelper)>,
    binary: Vec<(BinaryOp, BinaryHelper)>,
    /// Materialized operator symbols, indexed by [`OperatorId`]
    symbols: RefCell<Vec<Rc<OperatorSymbol>>>,
}

impl Default for Operators {
    fn default() -> Self {
        Self::new()
    }
}

impl Operators {
    /// Id of the operator returned when nothing applies
    pub const NOOP: OperatorId = OperatorId(0);

    pub fn new() -> Self {
        let noop = Rc::new(OperatorSymbol {
            name: "<noop>",
            params: Vec::new(),
            ret: Type::Error,
            opcode: opcodes::ILLEGAL as u32,
        });
        Self {
            unary: init_unary_operators(),
            binary: init_binary_operators(),
            symbols: RefCell::new(vec![noop]),
        }
    }

    pub fn get(&self, id: OperatorId) -> Rc<OperatorSymbol> {
        let symbols = self.symbols.borrow();
        symbols
            .get(id.0 as usize)
            .cloned()
            .unwrap_or_else(|| symbols[0].clone())
    }

    /// Number of operator symbols created so far, the no-op included
    pub fn materialized(&self) -> usize {
        self.symbols.borrow().len()
    }

    /// Drop every materialized operator symbol except the no-op.
    /// Alternatives forget their ids so the next lookup materializes again.
    pub(crate) fn clear(&mut self) {
        self.symbols.get_mut().truncate(1);
        let unary = self.unary.iter_mut().flat_map(|(_, h)| h.alternatives.iter_mut());
        let binary = self.binary.iter_mut().flat_map(|(_, h)| h.alternatives.iter_mut());
        for alt in unary.chain(binary) {
            alt.symbol.take();
        }
    }

    pub fn resolve_unary(&self, symtab: &Symtab, log: &mut Log, span: Span, op: UnaryOp, arg: &Type) -> OperatorId {
        let types = Types::new(symtab);
        let found = self
            .unary
            .iter()
            .filter(|(tag, _)| *tag == op)
            .map(|(_, helper)| helper)
            .find(|helper| unary_test(helper.family, arg, &types));
        let resolved = found.map(|helper| {
            let promoted = match helper.family {
                UnaryFamily::Numeric { .. } => unary_promotion(arg, &types),
                UnaryFamily::Boolean | UnaryFamily::PrefixPostfix => types.unboxed_type_or_type(arg),
                UnaryFamily::Reference => types.object_type(),
            };
            self.lookup(helper.name, &helper.alternatives, &[promoted], symtab)
        });
        match resolved {
            Some(id) if id != Self::NOOP => id,
            _ => {
                if !is_unknown(arg, &types) {
                    log.error(
                        DiagKind::OperatorCantBeApplied,
                        span,
                        vec![op.symbol().into(), arg.clone().into()],
                    );
                }
                Self::NOOP
            }
        }
    }

    pub fn resolve_binary(
        &self,
        symtab: &Symtab,
        log: &mut Log,
        span: Span,
        op: BinaryOp,
        left: &Type,
        right: &Type,
    ) -> OperatorId {
        let types = Types::new(symtab);
        let found = self
            .binary
            .iter()
            .filter(|(tag, _)| *tag == op)
            .map(|(_, helper)| helper)
            .find(|helper| binary_test(helper.family, left, right, &types));
        let resolved = found.and_then(|helper| {
            let promoted = match helper.family {
                BinaryFamily::Numeric { .. } | BinaryFamily::Boolean => {
                    let t = binary_promotion(left, right, &types);
                    vec![t.clone(), t]
                }
                BinaryFamily::String => vec![string_promotion(left, &types), string_promotion(right, &types)],
                BinaryFamily::Shift => vec![unary_promotion(left, &types), unary_promotion(right, &types)],
                BinaryFamily::Equality => match comparison_kind(left, right, &types) {
                    ComparisonKind::Reference => vec![types.object_type(), types.object_type()],
                    ComparisonKind::NumericOrBoolean => {
                        let t = binary_promotion(left, right, &types);
                        vec![t.clone(), t]
                    }
                    ComparisonKind::Invalid => return None,
                },
            };
            Some(self.lookup(helper.name, &helper.alternatives, &promoted, symtab))
        });
        match resolved {
            Some(id) if id != Self::NOOP => id,
            _ => {
                if !is_unknown(left, &types) && !is_unknown(right, &types) {
                    log.error(
                        DiagKind::OperatorCantBeApplied1,
                        span,
                        vec![op.symbol().into(), left.clone().into(), right.clone().into()],
                    );
                }
                Self::NOOP
            }
        }
    }

    /// Find the alternative whose parameters are exactly `args`
    fn lookup(&self, name: &'static str, alternatives: &[Alternative], args: &[Type], symtab: &Symtab) -> OperatorId {
        let types = Types::new(symtab);
        let alternative = alternatives.iter().find(|alt| {
            alt.params.len() == args.len() && alt.params.iter().zip(args).all(|(p, a)| p.matches(a, &types))
        });
        match alternative {
            Some(alt) => *alt.symbol.get_or_init(|| {
                let mut symbols = self.symbols.borrow_mut();
                let id = OperatorId(symbols.len() as u32);
                trace!("OPERATORS: materialize {} {:?}", name, alt.params);
                symbols.push(Rc::new(OperatorSymbol {
                    name,
                    params: alt.params.iter().map(|p| p.to_type(symtab)).collect(),
                    ret: alt.ret.to_type(symtab),
                    opcode: alt.opcode,
                }));
                id
            }),
            None => Self::NOOP,
        }
    }
}

fn is_unknown(t: &Type, types: &Types) -> bool {
    types.is_erroneous(t) || t.is_none()
}

fn unary_test(family: UnaryFamily, arg: &Type, types: &Types) -> bool {
    let unboxed = types.unboxed_type_or_type(arg);
    match family {
        UnaryFamily::Numeric { integral_only } => match unboxed.tag() {
            Some(tag) if integral_only => tag.is_integral(),
            Some(tag) => tag.is_numeric(),
            None => false,
        },
        UnaryFamily::Boolean => unboxed.is_boolean(),
        UnaryFamily::PrefixPostfix => unboxed.is_numeric(),
        UnaryFamily::Reference => arg.is_reference(),
    }
}

fn binary_test(family: BinaryFamily, left: &Type, right: &Type, types: &Types) -> bool {
    let l = types.unboxed_type_or_type(left);
    let r = types.unboxed_type_or_type(right);
    match family {
        BinaryFamily::Numeric { integral_only } => match (l.tag(), r.tag()) {
            (Some(a), Some(b)) if integral_only => a.is_integral() && b.is_integral(),
            (Some(a), Some(b)) => a.is_numeric() && b.is_numeric(),
            _ => false,
        },
        BinaryFamily::Boolean => l.is_boolean() && r.is_boolean(),
        BinaryFamily::String => {
            (types.is_string(left) || types.is_string(right)) && !left.is_void() && !right.is_void()
        }
        BinaryFamily::Shift => matches!(
            (l.tag(), r.tag()),
            (Some(a), Some(b)) if a.is_integral() && b.is_integral()
        ),
        BinaryFamily::Equality => {
            let l_ok = l.is_primitive() || left.is_reference();
            let r_ok = r.is_primitive() || right.is_reference();
            l_ok && r_ok
        }
    }
}

/// Unboxing followed by widening of sub-int types to `int`
pub fn unary_promotion(t: &Type, types: &Types) -> Type {
    let unboxed = types.unboxed_type_or_type(t);
    match unboxed.tag() {
        Some(tag) if tag.is_numeric() && tag.is_subrange_of(TypeTag::Int) => Type::Prim(TypeTag::Int),
        _ => unboxed,
    }
}

/// Common type of two operands of a numeric or boolean operator
pub fn binary_promotion(t1: &Type, t2: &Type, types: &Types) -> Type {
    let u1 = types.unboxed_type_or_type(t1);
    let u2 = types.unboxed_type_or_type(t2);
    if u1.is_numeric() && u2.is_numeric() {
        let has = |tag: TypeTag| u1.tag() == Some(tag) || u2.tag() == Some(tag);
        if has(TypeTag::Double) {
            Type::Prim(TypeTag::Double)
        } else if has(TypeTag::Float) {
            Type::Prim(TypeTag::Float)
        } else if has(TypeTag::Long) {
            Type::Prim(TypeTag::Long)
        } else {
            Type::Prim(TypeTag::Int)
        }
    } else if types.is_same_type(&u1, &u2) {
        u1
    } else {
        Type::Error
    }
}

/// Operand type used to pick a string concatenation signature
fn string_promotion(t: &Type, types: &Types) -> Type {
    if t.is_primitive() {
        unary_promotion(t, types)
    } else if types.is_string(t) || matches!(t, Type::Null | Type::Void) {
        t.clone()
    } else {
        types.object_type()
    }
}

fn comparison_kind(left: &Type, right: &Type, types: &Types) -> ComparisonKind {
    let l_prim = left.is_primitive();
    let r_prim = right.is_primitive();
    if l_prim && r_prim {
        ComparisonKind::NumericOrBoolean
    } else if l_prim {
        if unary_promotion(right, types).is_primitive() {
            ComparisonKind::NumericOrBoolean
        } else {
            ComparisonKind::Invalid
        }
    } else if r_prim {
        if unary_promotion(left, types).is_primitive() {
            ComparisonKind::NumericOrBoolean
        } else {
            ComparisonKind::Invalid
        }
    } else if left.is_reference() && right.is_reference() {
        ComparisonKind::Reference
    } else {
        ComparisonKind::Invalid
    }
}

fn unary(name: &'static str, family: UnaryFamily, alts: Vec<(Operand, Operand, u16)>) -> UnaryHelper {
    UnaryHelper {
        name,
        family,
        alternatives: alts
            .into_iter()
            .map(|(arg, ret, opcode)| Alternative::new(vec![arg], ret, opcode as u32))
            .collect(),
    }
}

fn binary(name: &'static str, family: BinaryFamily, alts: Vec<(Operand, Operand, Operand, u32)>) -> BinaryHelper {
    BinaryHelper {
        name,
        family,
        alternatives: alts
            .into_iter()
            .map(|(l, r, ret, opcode)| Alternative::new(vec![l, r], ret, opcode))
            .collect(),
    }
}

fn init_unary_operators() -> Vec<(UnaryOp, UnaryHelper)> {
    use opcodes::*;
    let numeric = UnaryFamily::Numeric { integral_only: false };
    let incdec = |name| {
        unary(
            name,
            UnaryFamily::PrefixPostfix,
            vec![
                (DOUBLE, DOUBLE, DADD),
                (FLOAT, FLOAT, FADD),
                (LONG, LONG, LADD),
                (INT, INT, IADD),
                (CHAR, CHAR, IADD),
                (SHORT, SHORT, IADD),
                (BYTE, BYTE, IADD),
            ],
        )
    };
    vec![
        (
            UnaryOp::Plus,
            unary("+", numeric, vec![(DOUBLE, DOUBLE, NOP), (FLOAT, FLOAT, NOP), (LONG, LONG, NOP), (INT, INT, NOP)]),
        ),
        (
            UnaryOp::Minus,
            unary("-", numeric, vec![(DOUBLE, DOUBLE, DNEG), (FLOAT, FLOAT, FNEG), (LONG, LONG, LNEG), (INT, INT, INEG)]),
        ),
        (
            UnaryOp::BitNot,
            unary(
                "~",
                UnaryFamily::Numeric { integral_only: true },
                vec![(LONG, LONG, LXOR), (INT, INT, IXOR)],
            ),
        ),
        (UnaryOp::PreInc, incdec("++")),
        (UnaryOp::PostInc, incdec("++")),
        (UnaryOp::PreDec, incdec("--")),
        (UnaryOp::PostDec, incdec("--")),
        (UnaryOp::Not, unary("!", UnaryFamily::Boolean, vec![(BOOLEAN, BOOLEAN, BOOL_NOT)])),
        (
            UnaryOp::NullCheck,
            unary("<*nullchk*>", UnaryFamily::Reference, vec![(Operand::Object, Operand::Object, NULLCHK)]),
        ),
    ]
}

fn arithmetic(name: &'static str, ops: [u16; 4]) -> BinaryHelper {
    let [d, f, l, i] = ops;
    binary(
        name,
        BinaryFamily::Numeric { integral_only: false },
        vec![
            (DOUBLE, DOUBLE, DOUBLE, d as u32),
            (FLOAT, FLOAT, FLOAT, f as u32),
            (LONG, LONG, LONG, l as u32),
            (INT, INT, INT, i as u32),
        ],
    )
}

fn relational(name: &'static str, cmp_double: u16, cmp_float: u16, branch: u16, int_branch: u16) -> BinaryHelper {
    use opcodes::*;
    binary(
        name,
        BinaryFamily::Numeric { integral_only: false },
        vec![
            (DOUBLE, DOUBLE, BOOLEAN, combine(cmp_double, branch)),
            (FLOAT, FLOAT, BOOLEAN, combine(cmp_float, branch)),
            (LONG, LONG, BOOLEAN, combine(LCMP, branch)),
            (INT, INT, BOOLEAN, int_branch as u32),
        ],
    )
}

fn equality(name: &'static str, acmp: u16, branch: u16, icmp: u16) -> BinaryHelper {
    use opcodes::*;
    binary(
        name,
        BinaryFamily::Equality,
        vec![
            (Operand::Object, Operand::Object, BOOLEAN, acmp as u32),
            (BOOLEAN, BOOLEAN, BOOLEAN, icmp as u32),
            (DOUBLE, DOUBLE, BOOLEAN, combine(DCMPL, branch)),
            (FLOAT, FLOAT, BOOLEAN, combine(FCMPL, branch)),
            (LONG, LONG, BOOLEAN, combine(LCMP, branch)),
            (INT, INT, BOOLEAN, icmp as u32),
        ],
    )
}

fn bitwise(name: &'static str, bool_op: u16, long_op: u16, int_op: u16) -> [BinaryHelper; 2] {
    [
        binary(name, BinaryFamily::Boolean, vec![(BOOLEAN, BOOLEAN, BOOLEAN, bool_op as u32)]),
        binary(
            name,
            BinaryFamily::Numeric { integral_only: true },
            vec![(LONG, LONG, LONG, long_op as u32), (INT, INT, INT, int_op as u32)],
        ),
    ]
}

fn shift(name: &'static str, ops: [u16; 4]) -> BinaryHelper {
    let [ii, il, li, ll] = ops;
    binary(
        name,
        BinaryFamily::Shift,
        vec![
            (INT, INT, INT, ii as u32),
            (INT, LONG, INT, il as u32),
            (LONG, INT, LONG, li as u32),
            (LONG, LONG, LONG, ll as u32),
        ],
    )
}

fn string_concat() -> BinaryHelper {
    use Operand::{Bot, Object, String as Str};
    let op = opcodes::STRING_ADD as u32;
    let others = [Object, Str, INT, LONG, FLOAT, DOUBLE, BOOLEAN, Bot];
    let mut alts = Vec::new();
    for other in others {
        alts.push((Str, other, Str, op));
    }
    for other in others {
        if other != Str {
            alts.push((other, Str, Str, op));
        }
    }
    binary("+", BinaryFamily::String, alts)
}

fn init_binary_operators() -> Vec<(BinaryOp, BinaryHelper)> {
    use opcodes::*;
    let mut ops = vec![
        (BinaryOp::Add, string_concat()),
        (BinaryOp::Add, arithmetic("+", [DADD, FADD, LADD, IADD])),
        (BinaryOp::Sub, arithmetic("-", [DSUB, FSUB, LSUB, ISUB])),
        (BinaryOp::Mul, arithmetic("*", [DMUL, FMUL, LMUL, IMUL])),
        (BinaryOp::Div, arithmetic("/", [DDIV, FDIV, LDIV, IDIV])),
        (BinaryOp::Mod, arithmetic("%", [DREM, FREM, LREM, IREM])),
        (BinaryOp::Shl, shift("<<", [ISHL, ISHLL, LSHL, LSHLL])),
        (BinaryOp::Shr, shift(">>", [ISHR, ISHRL, LSHR, LSHRL])),
        (BinaryOp::UShr, shift(">>>", [IUSHR, IUSHRL, LUSHR, LUSHRL])),
        (BinaryOp::Lt, relational("<", DCMPG, FCMPG, IFLT, IF_ICMPLT)),
        (BinaryOp::Gt, relational(">", DCMPL, FCMPL, IFGT, IF_ICMPGT)),
        (BinaryOp::Le, relational("<=", DCMPG, FCMPG, IFLE, IF_ICMPLE)),
        (BinaryOp::Ge, relational(">=", DCMPL, FCMPL, IFGE, IF_ICMPGE)),
        (BinaryOp::Eq, equality("==", IF_ACMPEQ, IFEQ, IF_ICMPEQ)),
        (BinaryOp::Ne, equality("!=", IF_ACMPNE, IFNE, IF_ICMPNE)),
        (BinaryOp::And, binary("&&", BinaryFamily::Boolean, vec![(BOOLEAN, BOOLEAN, BOOLEAN, BOOL_AND as u32)])),
        (BinaryOp::Or, binary("||", BinaryFamily::Boolean, vec![(BOOLEAN, BOOLEAN, BOOLEAN, BOOL_OR as u32)])),
    ];
    for (op, name, codes) in [
        (BinaryOp::BitAnd, "&", (IAND, LAND, IAND)),
        (BinaryOp::BitOr, "|", (IOR, LOR, IOR)),
        (BinaryOp::BitXor, "^", (IXOR, LXOR, IXOR)),
    ] {
        let [b, n] = bitwise(name, codes.0, codes.1, codes.2);
        ops.push((op, b));
        ops.push((op, n));
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Symtab, Log, Operators) {
        (Symtab::new(), Log::default(), Operators::new())
    }

    #[test]
    fn int_plus_long_promotes_to_long() {
        let (symtab, mut log, ops) = setup();
        let id = ops.resolve_binary(
            &symtab,
            &mut log,
            Span::at(1),
            BinaryOp::Add,
            &Type::Prim(TypeTag::Int),
            &Type::Prim(TypeTag::Long),
        );
        let sym = ops.get(id);
        assert_eq!(sym.params, vec![Type::Prim(TypeTag::Long), Type::Prim(TypeTag::Long)]);
        assert_eq!(sym.ret, Type::Prim(TypeTag::Long));
        assert_eq!(sym.opcode, opcodes::LADD as u32);
    }

    #[test]
    fn string_concat_is_preferred_for_plus() {
        let (symtab, mut log, ops) = setup();
        let string = Type::class(symtab.predef.string);
        let id = ops.resolve_binary(&symtab, &mut log, Span::at(1), BinaryOp::Add, &string, &Type::Prim(TypeTag::Char));
        let sym = ops.get(id);
        assert_eq!(sym.opcode, opcodes::STRING_ADD as u32);
        assert_eq!(sym.params[1], Type::Prim(TypeTag::Int));
        assert!(!log.has_errors());
    }

    #[test]
    fn boxed_operands_are_unboxed() {
        let (symtab, mut log, ops) = setup();
        let integer = Type::class(symtab.predef.box_class(TypeTag::Int));
        let id = ops.resolve_binary(&symtab, &mut log, Span::at(1), BinaryOp::Mul, &integer, &Type::Prim(TypeTag::Double));
        assert_eq!(ops.get(id).ret, Type::Prim(TypeTag::Double));
    }

    #[test]
    fn comparison_uses_combined_opcode() {
        let (symtab, mut log, ops) = setup();
        let d = Type::Prim(TypeTag::Double);
        let id = ops.resolve_binary(&symtab, &mut log, Span::at(1), BinaryOp::Lt, &d, &d);
        let sym = ops.get(id);
        assert_eq!(sym.opcode, combine(opcodes::DCMPG, opcodes::IFLT));
        assert_eq!(opcodes::split(sym.opcode), Some((opcodes::DCMPG, opcodes::IFLT)));
    }

    #[test]
    fn reference_equality_uses_object_signature() {
        let (symtab, mut log, ops) = setup();
        let string = Type::class(symtab.predef.string);
        let id = ops.resolve_binary(&symtab, &mut log, Span::at(1), BinaryOp::Eq, &string, &Type::Null);
        assert_eq!(ops.get(id).opcode, opcodes::IF_ACMPEQ as u32);
    }

    #[test]
    fn repeated_lookup_returns_the_same_symbol() {
        let (symtab, mut log, ops) = setup();
        let i = Type::Prim(TypeTag::Int);
        let a = ops.resolve_binary(&symtab, &mut log, Span::at(1), BinaryOp::Sub, &i, &i);
        let count = ops.materialized();
        let b = ops.resolve_binary(&symtab, &mut log, Span::at(2), BinaryOp::Sub, &i, &i);
        assert_eq!(a, b);
        assert!(Rc::ptr_eq(&ops.get(a), &ops.get(b)));
        assert_eq!(ops.materialized(), count);
    }

    #[test]
    fn inapplicable_operator_reports_once_and_yields_noop() {
        let (symtab, mut log, ops) = setup();
        let id = ops.resolve_binary(
            &symtab,
            &mut log,
            Span::at(5),
            BinaryOp::Sub,
            &Type::Prim(TypeTag::Boolean),
            &Type::Prim(TypeTag::Int),
        );
        assert_eq!(id, Operators::NOOP);
        assert!(ops.get(id).is_noop());
        assert_eq!(log.count_of(DiagKind::OperatorCantBeApplied1), 1);
    }

    #[test]
    fn erroneous_operands_are_not_reported() {
        let (symtab, mut log, ops) = setup();
        let id = ops.resolve_unary(&symtab, &mut log, Span::at(1), UnaryOp::Not, &Type::Error);
        assert_eq!(id, Operators::NOOP);
        assert!(!log.has_errors());
    }

    #[test]
    fn shift_promotes_each_operand_separately() {
        let (symtab, mut log, ops) = setup();
        let id = ops.resolve_binary(
            &symtab,
            &mut log,
            Span::at(1),
            BinaryOp::Shl,
            &Type::Prim(TypeTag::Byte),
            &Type::Prim(TypeTag::Long),
        );
        let sym = ops.get(id);
        assert_eq!(sym.ret, Type::Prim(TypeTag::Int));
        assert_eq!(sym.opcode, opcodes::ISHLL as u32);
    }

    #[test]
    fn increment_keeps_operand_type() {
        let (symtab, mut log, ops) = setup();
        let id = ops.resolve_unary(&symtab, &mut log, Span::at(1), UnaryOp::PostInc, &Type::Prim(TypeTag::Char));
        assert_eq!(ops.get(id).ret, Type::Prim(TypeTag::Char));
    }

    #[test]
    fn operators_resolve_again_after_clear() {
        let (symtab, mut log, mut ops) = setup();
        let i = Type::Prim(TypeTag::Int);
        let before = ops.resolve_binary(&symtab, &mut log, Span::at(1), BinaryOp::Add, &i, &i);
        let neg = ops.resolve_unary(&symtab, &mut log, Span::at(1), UnaryOp::Minus, &i);
        assert_ne!(before, neg);
        ops.clear();
        assert_eq!(ops.materialized(), 1);

        let after = ops.resolve_binary(&symtab, &mut log, Span::at(2), BinaryOp::Add, &i, &i);
        let sym = ops.get(after);
        assert!(!sym.is_noop());
        assert_eq!(sym.ret, i);
        assert_eq!(sym.opcode, opcodes::IADD as u32);
        assert!(!ops.get(ops.resolve_unary(&symtab, &mut log, Span::at(2), UnaryOp::Minus, &i)).is_noop());
        assert_eq!(ops.materialized(), 3);
        assert!(!log.has_errors());
    }

    #[test]
    fn bitwise_and_on_booleans_picks_boolean_family() {
        let (symtab, mut log, ops) = setup();
        let b = Type::Prim(TypeTag::Boolean);
        let id = ops.resolve_binary(&symtab, &mut log, Span::at(1), BinaryOp::BitAnd, &b, &b);
        assert_eq!(ops.get(id).ret, b);
    }
}
