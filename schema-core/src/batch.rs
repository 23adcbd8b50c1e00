#![forbid(unsafe_code)]

//! Completion of a set of schemas that import each other.
//!
//! Pass one completes every source on its own, deferring cross-file
//! references. Successful results are registered, the registry is checked
//! for inheritance cycles spanning files, and every schema is completed
//! again with the registry in import-dependency order so deferred
//! references resolve. Schemas that import each other are completed
//! repeatedly until their inherited shapes stop changing.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use schema_ast::{Model, SourceId};
use tracing::{debug, info_span, warn};

use crate::complete::Completer;
use crate::config::CompleteConfig;
use crate::cycles::detect_cross_schema_cycles;
use crate::diagnostics::{Code, Collector, SchemaDiagnostic, Severity};
use crate::error::CompleteError;
use crate::model::{Schema, TypeId};
use crate::registry::{MemoryRegistry, Registry, ResolvedImports};

/// One parsed source plus the loader's resolution of its imports.
#[derive(Clone, Debug)]
pub struct SourceInput {
    pub id: SourceId,
    pub model: Model,
    pub imports: ResolvedImports,
}

impl SourceInput {
    pub fn new(id: SourceId, model: Model) -> Self {
        SourceInput {
            id,
            model,
            imports: ResolvedImports::new(),
        }
    }

    pub fn import(mut self, alias: impl Into<String>, source: SourceId) -> Self {
        self.imports.insert(alias.into(), source);
        self
    }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Every schema that completed in both passes.
    pub registry: MemoryRegistry,
    /// Per source, the diagnostics of its last completion.
    pub diagnostics: BTreeMap<SourceId, Vec<SchemaDiagnostic>>,
    /// Inheritance cycles spanning files.
    pub cross_schema: Vec<SchemaDiagnostic>,
    pub failed: BTreeSet<SourceId>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.failed.is_empty() && !self.cross_schema.iter().any(|d| d.severity.is_error())
    }

    pub fn schema(&self, id: &SourceId) -> Option<&Schema> {
        self.registry.lookup_by_source_id(id)
    }

    pub fn diagnostics_for(&self, id: &SourceId) -> &[SchemaDiagnostic] {
        self.diagnostics.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .values()
            .flatten()
            .chain(&self.cross_schema)
            .filter(|d| d.severity.is_error())
            .count()
    }
}

fn complete_one(
    config: &CompleteConfig,
    registry: Option<&dyn Registry>,
    input: &SourceInput,
    diags: &mut Collector,
) -> Result<Schema, CompleteError> {
    let completer = Completer::new(config).with_resolved_imports(&input.imports);
    let completer = match registry {
        Some(r) => completer.with_registry(r),
        None => completer,
    };
    completer.complete(input.id.clone(), &input.model, diags)
}

#[tracing::instrument(level = "debug", skip_all, fields(sources = inputs.len()))]
pub fn complete_batch(inputs: &[SourceInput], config: &CompleteConfig) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    let local = |input: &SourceInput| {
        let mut diags = config.collector();
        let result = complete_one(config, None, input, &mut diags);
        (input.id.clone(), result, diags)
    };
    let first: Vec<_> = {
        let _span = info_span!("local_pass").entered();
        if config.parallel {
            inputs.par_iter().map(local).collect()
        } else {
            inputs.iter().map(local).collect()
        }
    };

    for (id, result, diags) in first {
        outcome.diagnostics.insert(id.clone(), diags.into_diagnostics());
        match result {
            Ok(schema) => {
                outcome.registry.insert(schema);
            }
            Err(err) => {
                debug!(schema = %id, errors = err.errors, "local completion failed");
                outcome.failed.insert(id);
            }
        }
    }

    let mut cycle_diags = Collector::new();
    let cycles = detect_cross_schema_cycles(&outcome.registry, &mut cycle_diags);
    outcome.cross_schema = cycle_diags.into_diagnostics();
    for cycle in &cycles {
        for id in cycle {
            if outcome.failed.insert(id.schema.clone()) {
                outcome.registry.remove(&id.schema);
            }
        }
    }
    if !cycles.is_empty() {
        warn!(cycles = cycles.len(), "inheritance cycles span schemas");
    }

    let _span = info_span!("linked_pass").entered();
    for component in import_components(inputs) {
        if let [idx] = component.as_slice() {
            link_one(&mut outcome, config, &inputs[*idx]);
            continue;
        }

        // Mutually importing schemas see each other's previous round, so
        // cross-file ancestry settles one hop per round.
        let rounds = component.iter().map(|&i| inputs[i].model.types.len()).sum::<usize>() + 1;
        let mut previous = shapes(&outcome.registry, inputs, &component);
        let mut settled = false;
        for round in 1..=rounds {
            for &idx in &component {
                link_one(&mut outcome, config, &inputs[idx]);
            }
            let current = shapes(&outcome.registry, inputs, &component);
            if current == previous {
                debug!(schemas = component.len(), rounds = round, "import cycle settled");
                settled = true;
                break;
            }
            previous = current;
        }
        if !settled {
            warn!(schemas = component.len(), rounds, "import cycle did not settle");
        }
    }

    debug!(
        registered = outcome.registry.len(),
        failed = outcome.failed.len(),
        "batch finished"
    );
    outcome
}

/// Completes one source against the registry, replacing its earlier result.
fn link_one(outcome: &mut BatchOutcome, config: &CompleteConfig, input: &SourceInput) {
    if outcome.failed.contains(&input.id) {
        return;
    }

    let mut diags = config.collector();
    for (alias, source) in &input.imports {
        if outcome.registry.contains(source) {
            continue;
        }
        let mut warning = SchemaDiagnostic::new(
            Severity::Warning,
            Code::ImportUnavailable,
            format!("imported schema `{source}` (alias `{alias}`) is unavailable; its references stay unchecked"),
        );
        if let Some(decl) = input.model.imports.iter().find(|d| d.alias.node == *alias) {
            warning = warning.at(decl.alias.span);
        }
        diags.push(warning);
    }

    let result = complete_one(config, Some(&outcome.registry as &dyn Registry), input, &mut diags);
    outcome.diagnostics.insert(input.id.clone(), diags.into_diagnostics());
    match result {
        Ok(schema) => {
            outcome.registry.insert(schema);
        }
        Err(err) => {
            debug!(schema = %input.id, errors = err.errors, "linked completion failed");
            outcome.registry.remove(&input.id);
            outcome.failed.insert(input.id.clone());
        }
    }
}

#[derive(Debug, PartialEq)]
struct TypeShape {
    supertypes: Vec<TypeId>,
    properties: Vec<String>,
    relations: Vec<String>,
}

/// Inherited shape of every registered type in `component`; `None` where the
/// schema is not registered.
fn shapes(registry: &MemoryRegistry, inputs: &[SourceInput], component: &[usize]) -> Vec<Option<Vec<TypeShape>>> {
    component
        .iter()
        .map(|&i| {
            let schema = registry.lookup_by_source_id(&inputs[i].id)?;
            let shapes = schema
                .types()
                .iter()
                .map(|t| TypeShape {
                    supertypes: t.supertypes().to_vec(),
                    properties: t.all_properties().iter().map(|p| p.name.clone()).collect(),
                    relations: t.all_relations().iter().map(|r| r.field_name.clone()).collect(),
                })
                .collect();
            Some(shapes)
        })
        .collect()
}

/// Input indices grouped into strongly connected import components. Every
/// component comes after the components it imports; inside a component the
/// indices follow depth-first finishing order.
fn import_components(inputs: &[SourceInput]) -> Vec<Vec<usize>> {
    struct Tarjan<'a> {
        inputs: &'a [SourceInput],
        index: HashMap<&'a SourceId, usize>,
        order: Vec<Option<usize>>,
        low: Vec<usize>,
        finished: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        visited: usize,
        done: usize,
        out: Vec<Vec<usize>>,
    }

    impl Tarjan<'_> {
        fn visit(&mut self, i: usize) {
            self.order[i] = Some(self.visited);
            self.low[i] = self.visited;
            self.visited += 1;
            self.stack.push(i);
            self.on_stack[i] = true;

            let imported: Vec<usize> = self.inputs[i]
                .imports
                .values()
                .filter_map(|source| self.index.get(source).copied())
                .collect();
            for j in imported {
                match self.order[j] {
                    None => {
                        self.visit(j);
                        self.low[i] = self.low[i].min(self.low[j]);
                    }
                    Some(o) if self.on_stack[j] => self.low[i] = self.low[i].min(o),
                    Some(_) => {}
                }
            }

            self.finished[i] = self.done;
            self.done += 1;
            if self.order[i] == Some(self.low[i]) {
                let mut component = Vec::new();
                while let Some(j) = self.stack.pop() {
                    self.on_stack[j] = false;
                    component.push(j);
                    if j == i {
                        break;
                    }
                }
                component.sort_by_key(|&j| self.finished[j]);
                self.out.push(component);
            }
        }
    }

    let n = inputs.len();
    let mut tarjan = Tarjan {
        inputs,
        index: inputs.iter().enumerate().map(|(i, s)| (&s.id, i)).collect(),
        order: vec![None; n],
        low: vec![0; n],
        finished: vec![0; n],
        on_stack: vec![false; n],
        stack: Vec::new(),
        visited: 0,
        done: 0,
        out: Vec::new(),
    };
    for i in 0..n {
        if tarjan.order[i].is_none() {
            tarjan.visit(i);
        }
    }
    tarjan.out
}
