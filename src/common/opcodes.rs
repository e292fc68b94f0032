//! Operator opcodes
//!
//! The subset of JVM instruction codes that operator symbols are tagged
//! with, plus the pseudo opcodes for operations with no single instruction.
//! Comparison operators carry a compound code: the comparison instruction
//! shifted left by [`PRE_SHIFT`] combined with the branch instruction.

pub const NOP: u16 = 0x00;

pub const IADD: u16 = 0x60;
pub const LADD: u16 = 0x61;
pub const FADD: u16 = 0x62;
pub const DADD: u16 = 0x63;
pub const ISUB: u16 = 0x64;
pub const LSUB: u16 = 0x65;
pub const FSUB: u16 = 0x66;
pub const DSUB: u16 = 0x67;
pub const IMUL: u16 = 0x68;
pub const LMUL: u16 = 0x69;
pub const FMUL: u16 = 0x6a;
pub const DMUL: u16 = 0x6b;
pub const IDIV: u16 = 0x6c;
pub const LDIV: u16 = 0x6d;
pub const FDIV: u16 = 0x6e;
pub const DDIV: u16 = 0x6f;
pub const IREM: u16 = 0x70;
pub const LREM: u16 = 0x71;
pub const FREM: u16 = 0x72;
pub const DREM: u16 = 0x73;
pub const INEG: u16 = 0x74;
pub const LNEG: u16 = 0x75;
pub const FNEG: u16 = 0x76;
pub const DNEG: u16 = 0x77;
pub const ISHL: u16 = 0x78;
pub const LSHL: u16 = 0x79;
pub const ISHR: u16 = 0x7a;
pub const LSHR: u16 = 0x7b;
pub const IUSHR: u16 = 0x7c;
pub const LUSHR: u16 = 0x7d;
pub const IAND: u16 = 0x7e;
pub const LAND: u16 = 0x7f;
pub const IOR: u16 = 0x80;
pub const LOR: u16 = 0x81;
pub const IXOR: u16 = 0x82;
pub const LXOR: u16 = 0x83;

pub const LCMP: u16 = 0x94;
pub const FCMPL: u16 = 0x95;
pub const FCMPG: u16 = 0x96;
pub const DCMPL: u16 = 0x97;
pub const DCMPG: u16 = 0x98;
pub const IFEQ: u16 = 0x99;
pub const IFNE: u16 = 0x9a;
pub const IFLT: u16 = 0x9b;
pub const IFGE: u16 = 0x9c;
pub const IFGT: u16 = 0x9d;
pub const IFLE: u16 = 0x9e;
pub const IF_ICMPEQ: u16 = 0x9f;
pub const IF_ICMPNE: u16 = 0xa0;
pub const IF_ICMPLT: u16 = 0xa1;
pub const IF_ICMPGE: u16 = 0xa2;
pub const IF_ICMPGT: u16 = 0xa3;
pub const IF_ICMPLE: u16 = 0xa4;
pub const IF_ACMPEQ: u16 = 0xa5;
pub const IF_ACMPNE: u16 = 0xa6;

// Pseudo opcodes
pub const STRING_ADD: u16 = 256;
pub const BOOL_NOT: u16 = 257;
pub const BOOL_AND: u16 = 258;
pub const BOOL_OR: u16 = 259;
/// Shifts whose shift distance is a long
pub const ISHLL: u16 = 270;
pub const LSHLL: u16 = 271;
pub const ISHRL: u16 = 272;
pub const LSHRL: u16 = 273;
pub const IUSHRL: u16 = 274;
pub const LUSHRL: u16 = 275;
pub const NULLCHK: u16 = 276;
/// Placeholder of the "no operator" symbol
pub const ILLEGAL: u16 = 277;

pub const PRE_SHIFT: u32 = 9;
pub const PRE_MASK: u32 = (1 << PRE_SHIFT) - 1;

/// Compound code of a comparison followed by a branch
pub const fn combine(cmp: u16, branch: u16) -> u32 {
    ((cmp as u32) << PRE_SHIFT) | branch as u32
}

/// Split a compound code into (comparison, branch); plain codes yield `None`
pub fn split(code: u32) -> Option<(u16, u16)> {
    if code >> PRE_SHIFT == 0 {
        None
    } else {
        Some(((code >> PRE_SHIFT) as u16, (code & PRE_MASK) as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_codes_round_trip() {
        let code = combine(LCMP, IFLT);
        assert_eq!(split(code), Some((LCMP, IFLT)));
        assert_eq!(split(IADD as u32), None);
        assert_eq!(split(STRING_ADD as u32), None);
    }
}
