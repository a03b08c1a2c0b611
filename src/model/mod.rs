//! Declaration model for a parsed Java compilation unit.
//!
//! A [`Unit`] owns its source text and an arena of [`Declaration`]s. Each
//! declaration points back at its owner through a non-owning [`DeclId`]
//! parent link; top-level types have no parent and hang off the unit.

mod annotation;

pub use annotation::{AnnotationArgs, AnnotationTag};

use std::fmt;
use std::path::{Path, PathBuf};

/// Index of a declaration inside its [`Unit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(usize);

impl DeclId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// Class, interface or record.
    Class,
    Enum,
    Field,
    Method,
}

impl DeclKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Class => "class",
            DeclKind::Enum => "enum",
            DeclKind::Field => "field",
            DeclKind::Method => "method",
        }
    }

    /// Whether this kind contributes a segment to a fully qualified name.
    pub fn is_type(&self) -> bool {
        matches!(self, DeclKind::Class | DeclKind::Enum)
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a declaration's annotations live in the source text.
///
/// `start..end` covers the declaration's modifier list (empty when the
/// declaration has none). The printer replaces exactly this range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Byte offset where the declaration starts.
    pub start: usize,
    /// Byte offset where the modifier list ends.
    pub end: usize,
    /// Whether the declaration had a modifier list at all.
    pub has_modifiers: bool,
    /// Non-annotation modifier text, grouped: keyword runs and comments.
    pub residue: Vec<String>,
    /// Text placed between emitted header parts (newline plus indentation).
    pub separator: String,
    /// Line ending of the source, emitted after line comments.
    pub line_break: String,
}

/// A class, enum, field or method declaration.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: DeclKind,
    pub name: String,
    /// Owning declaration, `None` for top-level types.
    pub parent: Option<DeclId>,
    pub annotations: Vec<AnnotationTag>,
    /// Parameter types as spelled in source (methods only).
    pub params: Vec<String>,
    /// Every declared variable name (fields only).
    pub variables: Vec<String>,
    /// Nested declarations in source order.
    pub members: Vec<DeclId>,
    /// Source location, `None` for declarations built by hand.
    pub header: Option<Header>,
    /// Set once the annotation list has been rewritten.
    pub touched: bool,
}

impl Declaration {
    pub fn new(kind: DeclKind, name: impl Into<String>, parent: Option<DeclId>) -> Self {
        Self {
            kind,
            name: name.into(),
            parent,
            annotations: Vec::new(),
            params: Vec::new(),
            variables: Vec::new(),
            members: Vec::new(),
            header: None,
            touched: false,
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<AnnotationTag>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_params(mut self, params: Vec<String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_variables(mut self, variables: Vec<String>) -> Self {
        self.variables = variables;
        self
    }

    /// Name used to look up field annotations.
    ///
    /// Multi-variable declarations (`int a, b;`) are keyed by the first name.
    pub fn field_name(&self) -> &str {
        self.variables
            .first()
            .map(String::as_str)
            .unwrap_or(&self.name)
    }
}

/// One parsed compilation unit.
#[derive(Debug, Clone)]
pub struct Unit {
    path: PathBuf,
    source: String,
    package: Option<String>,
    decls: Vec<Declaration>,
    roots: Vec<DeclId>,
}

impl Unit {
    pub fn new(path: impl AsRef<Path>, source: impl Into<String>, package: Option<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
            package,
            decls: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Top-level type declarations in source order.
    pub fn roots(&self) -> &[DeclId] {
        &self.roots
    }

    /// Add a declaration and link it to its parent (or the unit roots).
    pub fn add_declaration(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId(self.decls.len());
        match decl.parent {
            Some(parent) => {
                if let Some(owner) = self.decls.get_mut(parent.0) {
                    owner.members.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.decls.push(decl);
        id
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.0)
    }

    pub fn get_mut(&mut self, id: DeclId) -> Option<&mut Declaration> {
        self.decls.get_mut(id.0)
    }

    /// All declarations in arena order (parents before children).
    pub fn declarations(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls.iter().enumerate().map(|(i, d)| (DeclId(i), d))
    }

    /// Find the first declaration with the given kind and name.
    pub fn find(&self, kind: DeclKind, name: &str) -> Option<DeclId> {
        self.declarations()
            .find(|(_, d)| d.kind == kind && d.name == name)
            .map(|(id, _)| id)
    }

    /// Whether any declaration's annotations were rewritten.
    pub fn is_touched(&self) -> bool {
        self.decls.iter().any(|d| d.touched)
    }

    pub(crate) fn replace_source(&mut self, source: String) {
        self.source = source;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_declaration_links_members() {
        let mut unit = Unit::new("A.java", "", Some("pkg".to_string()));
        let class = unit.add_declaration(Declaration::new(DeclKind::Class, "A", None));
        let field = unit.add_declaration(
            Declaration::new(DeclKind::Field, "x", Some(class)).with_variables(vec!["x".into()]),
        );

        assert_eq!(unit.roots(), &[class]);
        assert_eq!(unit.get(class).unwrap().members, vec![field]);
        assert_eq!(unit.find(DeclKind::Field, "x"), Some(field));
    }

    #[test]
    fn test_field_name_uses_first_variable() {
        let decl = Declaration::new(DeclKind::Field, "a", None)
            .with_variables(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(decl.field_name(), "a");
    }
}
