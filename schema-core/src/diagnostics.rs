#![forbid(unsafe_code)]

//! Diagnostics emitted by schema completion.
//!
//! Every rejected input ends up here as a [`SchemaDiagnostic`]: a severity, a
//! stable [`Code`], a message, an optional primary span and any number of
//! related locations ("first defined here"). Diagnostics implement
//! [`miette::Diagnostic`] so callers can render them with `miette::Report`.

use std::fmt;

use miette::LabeledSpan;
use schema_ast::Span;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Should be addressed; does not fail completion
    Warning,
    /// Fails completion; later checks still run
    Error,
    /// Fails completion and stops it
    Fatal,
}

impl Severity {
    pub fn display(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

/// Stable diagnostic codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Code {
    DuplicateType,
    DuplicateDataType,
    DuplicateProperty,
    DuplicateRelation,

    InvalidAlias,
    ReservedAlias,
    DuplicateAlias,
    AliasCollision,
    UnresolvedImport,
    DuplicateImport,
    UnknownImport,
    ImportUnavailable,

    AliasCycle,
    InheritCycle,
    UnknownType,

    PropertyConflict,
    RelationConflict,
    InvalidPrimaryKey,

    ReservedName,
    CaseCollision,
    PropertyRelationCollision,
    RelationCollision,

    InvalidCompositionTarget,
    InvalidAssociationTarget,
    PartAssociation,

    UnknownProperty,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::DuplicateType => "E_DUPLICATE_TYPE",
            Code::DuplicateDataType => "E_DUPLICATE_DATATYPE",
            Code::DuplicateProperty => "E_DUPLICATE_PROPERTY",
            Code::DuplicateRelation => "E_DUPLICATE_RELATION",
            Code::InvalidAlias => "E_INVALID_ALIAS",
            Code::ReservedAlias => "E_RESERVED_ALIAS",
            Code::DuplicateAlias => "E_DUPLICATE_ALIAS",
            Code::AliasCollision => "E_ALIAS_COLLISION",
            Code::UnresolvedImport => "E_UNRESOLVED_IMPORT",
            Code::DuplicateImport => "E_DUPLICATE_IMPORT",
            Code::UnknownImport => "E_UNKNOWN_IMPORT",
            Code::ImportUnavailable => "W_IMPORT_UNAVAILABLE",
            Code::AliasCycle => "E_ALIAS_CYCLE",
            Code::InheritCycle => "E_INHERIT_CYCLE",
            Code::UnknownType => "E_UNKNOWN_TYPE",
            Code::PropertyConflict => "E_PROPERTY_CONFLICT",
            Code::RelationConflict => "E_RELATION_CONFLICT",
            Code::InvalidPrimaryKey => "E_INVALID_PRIMARY_KEY",
            Code::ReservedName => "E_RESERVED_NAME",
            Code::CaseCollision => "E_CASE_COLLISION",
            Code::PropertyRelationCollision => "E_PROPERTY_RELATION_COLLISION",
            Code::RelationCollision => "E_RELATION_COLLISION",
            Code::InvalidCompositionTarget => "E_INVALID_COMPOSITION_TARGET",
            Code::InvalidAssociationTarget => "E_INVALID_ASSOCIATION_TARGET",
            Code::PartAssociation => "E_PART_ASSOCIATION",
            Code::UnknownProperty => "E_UNKNOWN_PROPERTY",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Related location information (e.g., first definition)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Related {
    pub span: Span,
    pub message: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SchemaDiagnostic {
    pub severity: Severity,
    pub code: Code,
    pub message: String,
    pub span: Option<Span>,
    pub related: Vec<Related>,
}

impl SchemaDiagnostic {
    pub fn new(severity: Severity, code: Code, message: impl Into<String>) -> Self {
        SchemaDiagnostic {
            severity,
            code,
            message: message.into(),
            span: None,
            related: Vec::new(),
        }
    }

    pub fn error(code: Code, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn fatal(code: Code, message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, code, message)
    }

    pub fn warning(code: Code, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Add a related location
    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related.push(Related {
            span,
            message: message.into(),
        });
        self
    }

    /// One-line rendering: `error[E_CODE]: message`.
    pub fn display(&self) -> String {
        let mut out = format!("{}[{}]: {}", self.severity.display(), self.code, self.message);
        if let Some(span) = self.span {
            out.push_str(&format!(" (at {}..{})", span.offset(), span.offset() + span.len()));
        }
        out
    }
}

impl miette::Diagnostic for SchemaDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Warning => miette::Severity::Warning,
            Severity::Error | Severity::Fatal => miette::Severity::Error,
        })
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let primary = self.span.map(|s| LabeledSpan::new_with_span(None, s));
        let related = self
            .related
            .iter()
            .map(|r| LabeledSpan::new_with_span(Some(r.message.clone()), r.span));
        Some(Box::new(primary.into_iter().chain(related)))
    }
}

/// Caller-owned sink for diagnostics.
///
/// With a limit set, diagnostics beyond it are counted but not stored;
/// error accounting stays exact so completion still fails correctly.
#[derive(Debug, Default)]
pub struct Collector {
    diagnostics: Vec<SchemaDiagnostic>,
    limit: Option<usize>,
    dropped: usize,
    errors: usize,
    warnings: usize,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        Collector {
            limit,
            ..Self::default()
        }
    }

    pub fn push(&mut self, diag: SchemaDiagnostic) {
        if diag.severity.is_error() {
            self.errors += 1;
        } else {
            self.warnings += 1;
        }

        if let Some(limit) = self.limit {
            if self.diagnostics.len() >= limit {
                if self.dropped == 0 {
                    tracing::warn!(limit, "diagnostic limit reached; further diagnostics are dropped");
                }
                self.dropped += 1;
                return;
            }
        }
        self.diagnostics.push(diag);
    }

    pub fn extend(&mut self, diags: impl IntoIterator<Item = SchemaDiagnostic>) {
        for d in diags {
            self.push(d);
        }
    }

    pub fn diagnostics(&self) -> &[SchemaDiagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<SchemaDiagnostic> {
        self.diagnostics
    }

    /// Errors and fatals pushed so far, including dropped ones.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.errors == 0 && self.warnings == 0
    }

    pub fn has_code(&self, code: Code) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    pub fn with_code(&self, code: Code) -> impl Iterator<Item = &SchemaDiagnostic> {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }
}
