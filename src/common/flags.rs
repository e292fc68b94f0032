//! Symbol flag set: source modifiers plus compiler-internal markers

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u64);

impl Flags {
    pub const NONE: Flags = Flags(0);

    // Source modifiers
    pub const PUBLIC: Flags = Flags(1 << 0);
    pub const PRIVATE: Flags = Flags(1 << 1);
    pub const PROTECTED: Flags = Flags(1 << 2);
    pub const STATIC: Flags = Flags(1 << 3);
    pub const FINAL: Flags = Flags(1 << 4);
    pub const SYNCHRONIZED: Flags = Flags(1 << 5);
    pub const VOLATILE: Flags = Flags(1 << 6);
    pub const TRANSIENT: Flags = Flags(1 << 7);
    pub const NATIVE: Flags = Flags(1 << 8);
    pub const INTERFACE: Flags = Flags(1 << 9);
    pub const ABSTRACT: Flags = Flags(1 << 10);
    pub const STRICTFP: Flags = Flags(1 << 11);
    pub const DEFAULT: Flags = Flags(1 << 12);

    // Declaration kinds
    pub const SYNTHETIC: Flags = Flags(1 << 13);
    pub const ANNOTATION: Flags = Flags(1 << 14);
    pub const ENUM: Flags = Flags(1 << 15);
    pub const RECORD: Flags = Flags(1 << 16);
    pub const VARARGS: Flags = Flags(1 << 17);
    pub const PARAMETER: Flags = Flags(1 << 18);
    pub const GENERATED_CONSTR: Flags = Flags(1 << 19);
    pub const ANONYMOUS: Flags = Flags(1 << 20);
    pub const HAS_INIT: Flags = Flags(1 << 21);

    // Set by annotation processing
    pub const DEPRECATED: Flags = Flags(1 << 24);
    pub const DEPRECATED_ANNOTATION: Flags = Flags(1 << 25);
    pub const DEPRECATED_REMOVAL: Flags = Flags(1 << 26);
    pub const PREVIEW_API: Flags = Flags(1 << 27);
    pub const PREVIEW_REFLECTIVE: Flags = Flags(1 << 28);
    pub const VALUE_BASED: Flags = Flags(1 << 29);

    // Pattern matching
    pub const MATCH_BINDING: Flags = Flags(1 << 32);
    pub const MATCH_BINDING_TO_OUTER: Flags = Flags(1 << 33);
    pub const CLASH: Flags = Flags(1 << 34);

    // Entry bookkeeping
    pub const CYCLIC: Flags = Flags(1 << 36);
    pub const FROM_LIBRARY: Flags = Flags(1 << 37);
    pub const LOCKED: Flags = Flags(1 << 38);

    pub const ACCESS: Flags = Flags(Self::PUBLIC.0 | Self::PRIVATE.0 | Self::PROTECTED.0);

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }

    pub const fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Flags {
    type Output = Flags;
    fn bitand(self, rhs: Flags) -> Flags {
        Flags(self.0 & rhs.0)
    }
}

impl Not for Flags {
    type Output = Flags;
    fn not(self) -> Flags {
        Flags(!self.0)
    }
}

const NAMES: &[(Flags, &str)] = &[
    (Flags::PUBLIC, "public"),
    (Flags::PRIVATE, "private"),
    (Flags::PROTECTED, "protected"),
    (Flags::STATIC, "static"),
    (Flags::FINAL, "final"),
    (Flags::ABSTRACT, "abstract"),
    (Flags::INTERFACE, "interface"),
    (Flags::ANNOTATION, "annotation"),
    (Flags::ENUM, "enum"),
    (Flags::RECORD, "record"),
    (Flags::VARARGS, "varargs"),
    (Flags::SYNTHETIC, "synthetic"),
    (Flags::DEPRECATED, "deprecated"),
    (Flags::MATCH_BINDING, "match_binding"),
];

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "Flags({:#x}: {})", self.0, names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_operations() {
        let mut flags = Flags::PUBLIC | Flags::STATIC;
        assert!(flags.contains(Flags::PUBLIC));
        assert!(!flags.contains(Flags::PUBLIC | Flags::FINAL));
        assert!(flags.intersects(Flags::ACCESS));
        flags.remove(Flags::PUBLIC);
        assert!(!flags.intersects(Flags::ACCESS));
        flags |= Flags::MATCH_BINDING;
        assert!(flags.contains(Flags::MATCH_BINDING));
    }
}
