#![forbid(unsafe_code)]

use std::collections::HashMap;

use schema_ast::{Constraint, Model, SourceId, Span, TypeRef};
use tracing::debug;

use crate::config::CompleteConfig;
use crate::diagnostics::{Code, Collector, SchemaDiagnostic};
use crate::error::CompleteError;
use crate::model::{DataType, Import, Relation, Schema, Type, TypeId};
use crate::registry::{Registry, ResolvedImports};

/// Turns one parsed [`Model`] into a sealed [`Schema`].
///
/// Without a registry, qualified references are deferred rather than
/// reported; the batch driver recompletes with a registry once every schema
/// of a load has been registered.
pub struct Completer<'a> {
    config: &'a CompleteConfig,
    registry: Option<&'a dyn Registry>,
    resolved_imports: Option<&'a ResolvedImports>,
}

impl<'a> Completer<'a> {
    pub fn new(config: &'a CompleteConfig) -> Self {
        Completer {
            config,
            registry: None,
            resolved_imports: None,
        }
    }

    pub fn with_registry(mut self, registry: &'a dyn Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_resolved_imports(mut self, imports: &'a ResolvedImports) -> Self {
        self.resolved_imports = Some(imports);
        self
    }

    /// Runs every phase. Fails when a fatal phase halts or when any error
    /// was collected along the way; the collector holds the reasons either
    /// way.
    #[tracing::instrument(level = "debug", skip_all, fields(schema = %source))]
    pub fn complete(
        &self,
        source: SourceId,
        model: &Model,
        diags: &mut Collector,
    ) -> Result<Schema, CompleteError> {
        let errors_before = diags.error_count();
        let mut session = Session::new(source, model, self, diags);

        let halted = session.run().is_err();
        let errors = session.diags.error_count() - errors_before;
        if halted || errors > 0 {
            debug!(halted, errors, "completion failed");
            return Err(CompleteError {
                schema: model.name.node.clone(),
                errors,
                span: model.name.span,
            });
        }

        Ok(session.into_schema())
    }
}

/// Marker returned by a fatal phase; the diagnostic is already collected.
#[derive(Debug)]
pub(crate) struct Halt;

pub(crate) type Phase = Result<(), Halt>;

/// Where a type reference points.
pub(crate) enum Resolved<'r> {
    Local(usize),
    Foreign(&'r Type),
    /// Cross-file reference with nothing to resolve it against yet.
    Deferred,
    UnknownImport,
    Missing,
}

/// Working state of one completion: the arena of types under construction
/// plus everything the phases share.
pub(crate) struct Session<'a> {
    pub(crate) source: SourceId,
    pub(crate) model: &'a Model,
    pub(crate) config: &'a CompleteConfig,
    pub(crate) registry: Option<&'a dyn Registry>,
    pub(crate) resolved_imports: Option<&'a ResolvedImports>,
    pub(crate) diags: &'a mut Collector,

    pub(crate) types: Vec<Type>,
    pub(crate) type_index: HashMap<String, usize>,
    pub(crate) datatypes: Vec<DataType>,
    pub(crate) datatype_index: HashMap<String, usize>,
    pub(crate) imports: Vec<Import>,
    pub(crate) alias_memo: HashMap<String, Constraint>,
}

impl<'a> Session<'a> {
    fn new(source: SourceId, model: &'a Model, completer: &Completer<'a>, diags: &'a mut Collector) -> Self {
        Session {
            source,
            model,
            config: completer.config,
            registry: completer.registry,
            resolved_imports: completer.resolved_imports,
            diags,
            types: Vec::new(),
            type_index: HashMap::new(),
            datatypes: Vec::new(),
            datatype_index: HashMap::new(),
            imports: Vec::new(),
            alias_memo: HashMap::new(),
        }
    }

    fn run(&mut self) -> Phase {
        self.index()?;
        debug!(types = self.types.len(), datatypes = self.datatypes.len(), "indexed");

        self.resolve_imports()?;
        debug!(imports = self.imports.len(), "imports resolved");

        self.resolve_aliases()?;
        self.detect_cycles()?;

        self.linearize();
        debug!("linearized");

        self.detect_collisions();
        self.validate_targets();
        self.validate_invariants();
        debug!(errors = self.diags.error_count(), "checks finished");
        Ok(())
    }

    fn into_schema(self) -> Schema {
        let mut types = self.types;
        for t in &mut types {
            t.seal();
        }
        let mut datatypes = self.datatypes;
        for d in &mut datatypes {
            d.seal();
        }

        Schema {
            id: self.source,
            name: self.model.name.node.clone(),
            span: self.model.span,
            doc: self.model.doc.clone(),
            types,
            type_index: self.type_index,
            datatypes,
            datatype_index: self.datatype_index,
            imports: self.imports,
        }
    }

    pub(crate) fn report(&mut self, diag: SchemaDiagnostic) {
        self.diags.push(diag);
    }

    pub(crate) fn type_id(&self, name: &str) -> TypeId {
        TypeId::new(self.source.clone(), name)
    }

    pub(crate) fn import(&self, alias: &str) -> Option<&Import> {
        self.imports.iter().find(|i| i.alias == alias)
    }

    pub(crate) fn resolve_type_ref(&self, r: &TypeRef) -> Resolved<'a> {
        let Some(qualifier) = &r.qualifier else {
            return match self.type_index.get(&r.name) {
                Some(&i) => Resolved::Local(i),
                None => Resolved::Missing,
            };
        };

        let Some(import) = self.import(qualifier) else {
            return Resolved::UnknownImport;
        };
        let (Some(source), Some(registry)) = (&import.source, self.registry) else {
            return Resolved::Deferred;
        };
        let Some(schema) = registry.lookup_by_source_id(source) else {
            return Resolved::Deferred;
        };
        match schema.type_named(&r.name) {
            Some(t) => Resolved::Foreign(t),
            None => Resolved::Missing,
        }
    }

    /// Looks a type up by identity: the arena for this schema, the registry
    /// for anything else.
    pub(crate) fn type_by_id(&self, id: &TypeId) -> Option<&Type> {
        if id.schema == self.source {
            return self.type_index.get(&id.name).map(|&i| &self.types[i]);
        }
        self.registry?.lookup_type(id)
    }

    /// Identity a relation's target denotes, from the recorded target or
    /// from the reference as written in this schema.
    pub(crate) fn relation_target_key(&self, rel: &Relation) -> Option<TypeId> {
        if let Some(id) = &rel.target_id {
            return Some(id.clone());
        }
        if rel.owner.schema != self.source {
            return None;
        }
        match &rel.target.qualifier {
            None => Some(self.type_id(&rel.target.name)),
            Some(q) => {
                let source = self.import(q)?.source.clone()?;
                Some(TypeId::new(source, rel.target.name.clone()))
            }
        }
    }

    pub(crate) fn relations_equal(&self, a: &Relation, b: &Relation) -> bool {
        let at = self.relation_target_key(a);
        let bt = self.relation_target_key(b);
        a.is_equal(b, at.as_ref(), bt.as_ref())
    }

    pub(crate) fn unknown_import(&mut self, qualifier: &str, span: Span) {
        self.report(
            SchemaDiagnostic::error(
                Code::UnknownImport,
                format!("`{qualifier}` is not an import alias of schema `{}`", self.model.name.node),
            )
            .at(span),
        );
    }

    pub(crate) fn unknown_type(&mut self, r: &TypeRef, role: &str) {
        self.report(SchemaDiagnostic::error(Code::UnknownType, format!("unknown {role} type `{r}`")).at(r.span));
    }
}
