//! Abstract Syntax Tree consumed and rewritten by the semantic core
//!
//! Trees arrive from the parser unattributed. Attribution fills in the
//! `sym` and `ty` slots in place; the desugaring passes rewrite subtrees.
//! Every node carries a [`Span`] whose start offset doubles as the node's
//! position key for caches and indices.

mod nodes;
mod visitor;
mod printer;
pub mod maker;
pub mod tree_info;
pub mod differ;
pub mod hasher;

pub use nodes::*;
pub use visitor::*;
pub use printer::*;
pub use maker::TreeMaker;
pub use differ::TreeDiffer;
pub use hasher::TreeHasher;

use std::fmt;

/// Source position key (start offset of a node)
pub type Pos = usize;

/// Source location information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Location {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

/// Span of source code (start and end locations)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// Zero-width span at an offset
    pub fn at(offset: usize) -> Self {
        let loc = Location::new(0, 0, offset);
        Self { start: loc, end: loc }
    }

    pub fn from_to(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start: Location::new(start_line, start_col, 0),
            end: Location::new(end_line, end_col, 0),
        }
    }

    pub fn pos(&self) -> Pos {
        self.start.offset
    }
}

/// One parsed source file
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub type_decls: Vec<ClassDecl>,
    /// File name as given to the compiler, e.g. `Foo.java`
    pub source_file: String,
    pub span: Span,
}

impl CompilationUnit {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            ..Default::default()
        }
    }

    pub fn package_name(&self) -> &str {
        self.package.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }

    /// File name without directories or extension
    pub fn file_stem(&self) -> &str {
        let name = self.source_file.rsplit(['/', '\\']).next().unwrap_or(&self.source_file);
        name.strip_suffix(".java").unwrap_or(name)
    }

    pub fn is_package_info(&self) -> bool {
        self.file_stem() == "package-info"
    }
}

impl fmt::Display for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", AstPrinter::new().print_unit(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_strips_directories_and_extension() {
        let unit = CompilationUnit::new("src/p/package-info.java");
        assert_eq!(unit.file_stem(), "package-info");
        assert!(unit.is_package_info());
        assert!(!CompilationUnit::new("Foo.java").is_package_info());
    }
}
