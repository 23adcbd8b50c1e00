#![forbid(unsafe_code)]

mod builder;
mod constraint;
mod expr;

use std::fmt;
use std::sync::Arc;

use miette::SourceSpan;

pub use constraint::Constraint;
pub use expr::{BinOp, Expr, ExprKind, Lambda, Literal, PipeOp, UnaryOp};

pub type Span = SourceSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub node: T,
}

impl<T> Spanned<T> {
    pub fn new(span: Span, node: T) -> Self {
        Self { span, node }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            span: self.span,
            node: f(self.node),
        }
    }
}

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

pub type Ident = Spanned<String>;

pub fn ident(name: impl Into<String>, span: Span) -> Ident {
    Spanned::new(span, name.into())
}

/// Opaque identity of one logical source (usually a canonical path).
///
/// Two distinct sources must never share an id; the completer uses it as a
/// map key and as the schema half of every [`TypeRef`] resolution.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(Arc<str>);

impl SourceId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({:?})", &*self.0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One parsed schema file.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub span: Span,
    pub name: Ident,
    pub doc: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
    pub datatypes: Vec<DataTypeDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportDecl {
    pub span: Span,
    pub path: String,
    pub alias: Ident,
}

/// Reference to a type as written: `Name` or `alias.Name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeRef {
    pub span: Span,
    pub qualifier: Option<String>,
    pub name: String,
}

impl TypeRef {
    pub fn is_local(&self) -> bool {
        self.qualifier.is_none()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{q}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    pub span: Span,
    pub name: Ident,
    pub doc: Option<String>,
    pub is_abstract: bool,
    pub is_part: bool,
    pub inherits: Vec<TypeRef>,
    pub properties: Vec<PropertyDecl>,
    pub relations: Vec<RelationDecl>,
    pub invariants: Vec<InvariantDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataTypeDecl {
    pub span: Span,
    pub name: Ident,
    pub doc: Option<String>,
    pub constraint: Constraint,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub span: Span,
    pub name: Ident,
    pub doc: Option<String>,
    pub constraint: Constraint,
    pub optional: bool,
    pub primary_key: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// `-->`
    Association,
    /// `*->`
    Composition,
}

impl RelationKind {
    pub fn display(&self) -> &'static str {
        match self {
            RelationKind::Association => "association",
            RelationKind::Composition => "composition",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Multiplicity {
    pub optional: bool,
    pub many: bool,
}

impl Multiplicity {
    pub const ONE: Multiplicity = Multiplicity {
        optional: false,
        many: false,
    };
    pub const MANY: Multiplicity = Multiplicity {
        optional: true,
        many: true,
    };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backref {
    pub name: Ident,
    pub multiplicity: Multiplicity,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelationDecl {
    pub span: Span,
    pub name: Ident,
    pub doc: Option<String>,
    pub kind: RelationKind,
    pub target: TypeRef,
    pub multiplicity: Multiplicity,
    pub backref: Option<Backref>,
    /// Edge properties carried by the association itself.
    pub properties: Vec<PropertyDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InvariantDecl {
    pub span: Span,
    pub name: String,
    pub doc: Option<String>,
    pub expr: Expr,
}
