//! Resolved type information for one package (a directory of `.rs` files).
//!
//! This is the semantic model the loader consumes: named types in a package
//! scope, their underlying shape, struct fields and inherent method sets. It
//! holds plain owned data so it can be shared across threads once built;
//! syntax trees travel separately in [`SemanticModel::files`].

pub mod cfg;
pub mod provider;
pub mod ty;

pub use cfg::BuildFlags;
pub use provider::{SourceProvider, TypeInfoProvider};
pub use ty::{PointerKind, Type};

use proc_macro2::Span;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Line (1-based) and column (0-based, in chars) of a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub(crate) fn start_of(span: Span) -> Self {
        let lc = span.start();
        Self::new(lc.line, lc.column)
    }

    pub(crate) fn end_of(span: Span) -> Self {
        let lc = span.end();
        Self::new(lc.line, lc.column)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column + 1)
    }
}

/// A variable: a struct field, a parameter or a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub name: String,
    pub ty: Type,
    pub exported: bool,
    pub pos: Pos,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Var>,
    /// A tuple return type contributes one result per element.
    pub results: Vec<Var>,
    pub has_receiver: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    pub name: String,
    pub exported: bool,
    pub file: PathBuf,
    pub pos: Pos,
    pub sig: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Underlying {
    Struct(Vec<Var>),
    Enum,
    /// A trait and its declared methods.
    Interface(Vec<Func>),
    /// `type Handler = fn(..)`.
    Signature(Type),
    Alias(Type),
}

/// A type introduced under an explicit name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub name: String,
    pub file: PathBuf,
    pub pos: Pos,
    pub exported: bool,
    pub underlying: Underlying,
    /// Inherent methods, in file-name then source order.
    pub methods: Vec<Func>,
}

impl NamedType {
    pub fn is_struct(&self) -> bool {
        matches!(self.underlying, Underlying::Struct(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    order: Vec<String>,
    objects: HashMap<String, Arc<NamedType>>,
}

impl Scope {
    /// Insert a named type; the first declaration of a name wins.
    pub fn insert(&mut self, named: NamedType) -> bool {
        if self.objects.contains_key(&named.name) {
            return false;
        }
        self.order.push(named.name.clone());
        self.objects.insert(named.name.clone(), Arc::new(named));
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<NamedType>> {
        self.objects.get(name)
    }

    /// Look up a struct by name, following type aliases declared in this scope.
    pub fn lookup_struct(&self, name: &str) -> Option<&Arc<NamedType>> {
        let mut seen = HashSet::new();
        let mut current = name;
        loop {
            if !seen.insert(current) {
                return None;
            }
            let named = self.lookup(current)?;
            match &named.underlying {
                Underlying::Struct(_) => return Some(named),
                Underlying::Alias(target) => current = target.deref_once().local_name()?,
                _ => return None,
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub dir: PathBuf,
    /// Member files, in file-name order.
    pub files: Vec<PathBuf>,
    pub scope: Scope,
}

/// A parsed member file of a package.
pub struct SyntaxFile {
    pub path: PathBuf,
    pub source: String,
    pub syntax: syn::File,
}

/// What a provider returns for one file: the package(s) it belongs to and
/// the syntax of every member file.
pub struct SemanticModel {
    pub packages: Vec<Package>,
    pub files: Vec<SyntaxFile>,
}

/// A provider failure, located where possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub pos: Option<Pos>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "{}:{}: {}", self.path.display(), pos, self.message),
            None => write!(f, "{}: {}", self.path.display(), self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, underlying: Underlying) -> NamedType {
        NamedType {
            name: name.to_string(),
            file: PathBuf::from("lib.rs"),
            pos: Pos::new(1, 0),
            exported: true,
            underlying,
            methods: Vec::new(),
        }
    }

    #[test]
    fn first_declaration_wins() {
        let mut scope = Scope::default();
        assert!(scope.insert(named("Point", Underlying::Struct(Vec::new()))));
        assert!(!scope.insert(named("Point", Underlying::Enum)));
        assert!(scope.lookup("Point").unwrap().is_struct());
        assert_eq!(scope.names().collect::<Vec<_>>(), vec!["Point"]);
    }

    #[test]
    fn aliases_resolve_to_structs() {
        let mut scope = Scope::default();
        scope.insert(named("Point", Underlying::Struct(Vec::new())));
        scope.insert(named("Coord", Underlying::Alias(Type::named("Point"))));
        scope.insert(named("Loop", Underlying::Alias(Type::named("Loop"))));
        assert_eq!(scope.lookup_struct("Coord").unwrap().name, "Point");
        assert!(scope.lookup_struct("Loop").is_none());
        assert!(scope.lookup_struct("Missing").is_none());
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic {
            path: PathBuf::from("src/a.rs"),
            pos: Some(Pos::new(3, 4)),
            message: "expected `;`".into(),
        };
        assert_eq!(d.to_string(), "src/a.rs:3:5: expected `;`");
    }
}
