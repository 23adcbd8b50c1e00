#![forbid(unsafe_code)]

//! Chainable constructors for building parse models without a parser.
//!
//! Loaders that synthesize declarations and the test suites use these; the
//! grammar front end fills the structs directly.

use crate::{
    ident, Backref, BinOp, Constraint, DataTypeDecl, Expr, ExprKind, ImportDecl, InvariantDecl,
    Lambda, Literal, Model, Multiplicity, PipeOp, PropertyDecl, RelationDecl, RelationKind, Span,
    TypeDecl, TypeRef, UnaryOp,
};

impl Model {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            span,
            name: ident(name, span),
            doc: None,
            imports: Vec::new(),
            types: Vec::new(),
            datatypes: Vec::new(),
        }
    }

    pub fn with_import(mut self, import: ImportDecl) -> Self {
        self.imports.push(import);
        self
    }

    pub fn with_type(mut self, ty: TypeDecl) -> Self {
        self.types.push(ty);
        self
    }

    pub fn with_datatype(mut self, dt: DataTypeDecl) -> Self {
        self.datatypes.push(dt);
        self
    }
}

impl ImportDecl {
    pub fn new(path: impl Into<String>, alias: impl Into<String>, span: Span) -> Self {
        Self {
            span,
            path: path.into(),
            alias: ident(alias, span),
        }
    }
}

impl TypeRef {
    pub fn local(name: impl Into<String>, span: Span) -> Self {
        Self {
            span,
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>, span: Span) -> Self {
        Self {
            span,
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    /// Splits `alias.Name` on the first dot.
    pub fn parse(text: &str, span: Span) -> Self {
        match text.split_once('.') {
            Some((q, n)) => Self::qualified(q, n, span),
            None => Self::local(text, span),
        }
    }
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            span,
            name: ident(name, span),
            doc: None,
            is_abstract: false,
            is_part: false,
            inherits: Vec::new(),
            properties: Vec::new(),
            relations: Vec::new(),
            invariants: Vec::new(),
        }
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn part(mut self) -> Self {
        self.is_part = true;
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// `extends Name` or `extends alias.Name`.
    pub fn extends(mut self, target: &str, span: Span) -> Self {
        self.inherits.push(TypeRef::parse(target, span));
        self
    }

    pub fn property(mut self, prop: PropertyDecl) -> Self {
        self.properties.push(prop);
        self
    }

    pub fn relation(mut self, rel: RelationDecl) -> Self {
        self.relations.push(rel);
        self
    }

    pub fn invariant(mut self, inv: InvariantDecl) -> Self {
        self.invariants.push(inv);
        self
    }
}

impl DataTypeDecl {
    pub fn new(name: impl Into<String>, constraint: Constraint, span: Span) -> Self {
        Self {
            span,
            name: ident(name, span),
            doc: None,
            constraint,
        }
    }
}

impl PropertyDecl {
    /// A required, non-key property.
    pub fn new(name: impl Into<String>, constraint: Constraint, span: Span) -> Self {
        Self {
            span,
            name: ident(name, span),
            doc: None,
            constraint,
            optional: false,
            primary_key: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

impl RelationDecl {
    pub fn new(kind: RelationKind, name: impl Into<String>, target: &str, span: Span) -> Self {
        Self {
            span,
            name: ident(name, span),
            doc: None,
            kind,
            target: TypeRef::parse(target, span),
            multiplicity: Multiplicity::ONE,
            backref: None,
            properties: Vec::new(),
        }
    }

    pub fn association(name: impl Into<String>, target: &str, span: Span) -> Self {
        Self::new(RelationKind::Association, name, target, span)
    }

    pub fn composition(name: impl Into<String>, target: &str, span: Span) -> Self {
        Self::new(RelationKind::Composition, name, target, span)
    }

    pub fn many(mut self) -> Self {
        self.multiplicity = Multiplicity::MANY;
        self
    }

    pub fn optional(mut self) -> Self {
        self.multiplicity.optional = true;
        self
    }

    pub fn backref(mut self, name: impl Into<String>, multiplicity: Multiplicity) -> Self {
        let span = self.span;
        self.backref = Some(Backref {
            name: ident(name, span),
            multiplicity,
        });
        self
    }

    pub fn edge_property(mut self, prop: PropertyDecl) -> Self {
        self.properties.push(prop);
        self
    }
}

impl InvariantDecl {
    pub fn new(name: impl Into<String>, expr: Expr, span: Span) -> Self {
        Self {
            span,
            name: name.into(),
            doc: None,
            expr,
        }
    }
}

impl Expr {
    pub fn name(name: impl Into<String>, span: Span) -> Self {
        Self::new(span, ExprKind::Name(name.into()))
    }

    pub fn var(name: impl Into<String>, span: Span) -> Self {
        Self::new(span, ExprKind::Var(name.into()))
    }

    pub fn self_var(span: Span) -> Self {
        Self::var("self", span)
    }

    pub fn int(value: i64, span: Span) -> Self {
        Self::new(span, ExprKind::Literal(Literal::Int(value)))
    }

    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Self::new(span, ExprKind::Literal(Literal::String(value.into())))
    }

    pub fn member(base: Expr, member: impl Into<String>, span: Span) -> Self {
        Self::new(
            span,
            ExprKind::Member {
                base: Box::new(base),
                member: ident(member, span),
            },
        )
    }

    pub fn unary(op: UnaryOp, expr: Expr, span: Span) -> Self {
        Self::new(
            span,
            ExprKind::Unary {
                op,
                expr: Box::new(expr),
            },
        )
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr, span: Span) -> Self {
        Self::new(
            span,
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
        )
    }

    /// `lhs -> op |params| { body }`
    pub fn pipe_lambda(lhs: Expr, op: PipeOp, params: &[&str], body: Expr, span: Span) -> Self {
        Self::new(
            span,
            ExprKind::Pipeline {
                lhs: Box::new(lhs),
                op,
                args: Vec::new(),
                lambda: Some(Lambda {
                    span,
                    params: params.iter().map(|p| ident(*p, span)).collect(),
                    body: Box::new(body),
                }),
            },
        )
    }

    /// `lhs -> op`
    pub fn pipe(lhs: Expr, op: PipeOp, span: Span) -> Self {
        Self::new(
            span,
            ExprKind::Pipeline {
                lhs: Box::new(lhs),
                op,
                args: Vec::new(),
                lambda: None,
            },
        )
    }
}
