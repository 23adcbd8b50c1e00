#![allow(dead_code)]

use schema_ast::{span, Constraint, Model, PropertyDecl, SourceId, Span, TypeDecl};
use schema_core::{
    Code, CompleteConfig, CompleteError, Completer, Collector, Registry, ResolvedImports, Schema,
};

/// Distinct one-byte spans so diagnostics can be told apart.
pub fn sp(at: usize) -> Span {
    span(at, 1)
}

pub fn source(name: &str) -> SourceId {
    SourceId::new(format!("{name}.schema"))
}

pub fn prop(name: &str, constraint: Constraint, at: usize) -> PropertyDecl {
    PropertyDecl::new(name, constraint, sp(at))
}

pub fn ty(name: &str, at: usize) -> TypeDecl {
    TypeDecl::new(name, sp(at))
}

pub fn model(name: &str) -> Model {
    Model::new(name, sp(0))
}

pub struct Outcome {
    pub result: Result<Schema, CompleteError>,
    pub diags: Collector,
}

impl Outcome {
    pub fn schema(&self) -> &Schema {
        match &self.result {
            Ok(s) => s,
            Err(e) => panic!("{e}: {:#?}", self.diags.diagnostics()),
        }
    }

    pub fn codes(&self) -> Vec<Code> {
        self.diags.diagnostics().iter().map(|d| d.code).collect()
    }

    pub fn messages(&self, code: Code) -> Vec<String> {
        self.diags.with_code(code).map(|d| d.message.clone()).collect()
    }

    pub fn assert_ok(&self) -> &Schema {
        assert!(
            self.diags.is_empty(),
            "unexpected diagnostics: {:#?}",
            self.diags.diagnostics()
        );
        self.schema()
    }

    pub fn assert_only(&self, code: Code) {
        assert!(self.result.is_err(), "completion should fail");
        assert!(
            self.diags.diagnostics().iter().all(|d| d.code == code),
            "expected only {code}, got {:#?}",
            self.diags.diagnostics()
        );
        assert!(self.diags.has_code(code), "expected {code}");
    }
}

pub fn complete(m: &Model) -> Outcome {
    complete_in(&source(&m.name.node), m, None, None)
}

pub fn complete_with_config(m: &Model, config: &CompleteConfig) -> Outcome {
    let mut diags = config.collector();
    let result = Completer::new(config).complete(source(&m.name.node), m, &mut diags);
    Outcome { result, diags }
}

pub fn complete_in(
    id: &SourceId,
    m: &Model,
    registry: Option<&dyn Registry>,
    imports: Option<&ResolvedImports>,
) -> Outcome {
    let config = CompleteConfig::default();
    let mut diags = Collector::new();
    let mut completer = Completer::new(&config);
    if let Some(r) = registry {
        completer = completer.with_registry(r);
    }
    if let Some(i) = imports {
        completer = completer.with_resolved_imports(i);
    }
    let result = completer.complete(id.clone(), m, &mut diags);
    Outcome { result, diags }
}

pub fn supertype_names(schema: &Schema, ty: &str) -> Vec<String> {
    schema
        .type_named(ty)
        .expect("type")
        .supertypes()
        .iter()
        .map(|id| id.name.clone())
        .collect()
}

pub fn property_names(schema: &Schema, ty: &str) -> Vec<String> {
    schema
        .type_named(ty)
        .expect("type")
        .all_properties()
        .iter()
        .map(|p| p.name.clone())
        .collect()
}
