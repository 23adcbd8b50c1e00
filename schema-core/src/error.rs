#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use schema_ast::Span;
use thiserror::Error;

/// Completion produced no schema. The reasons are in the collector.
#[derive(Debug, Error, Diagnostic)]
#[error("completion of schema `{schema}` failed with {errors} error(s)")]
#[diagnostic(code(schema::complete))]
#[allow(unused_assignments)]
pub struct CompleteError {
    pub schema: String,
    pub errors: usize,
    #[label]
    pub span: Span,
}

#[derive(Debug, Error, Diagnostic)]
#[error("config error: {message}")]
#[diagnostic(code(schema::config))]
pub struct ConfigError {
    pub message: String,
}
