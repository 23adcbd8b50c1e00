#![forbid(unsafe_code)]

use std::collections::HashMap;

use schema_ast::{SourceId, Span};

use crate::complete::{Halt, Phase, Session};
use crate::diagnostics::{Code, SchemaDiagnostic};
use crate::model::Import;
use crate::naming::{is_identifier, is_keyword};

impl<'a> Session<'a> {
    /// Validates import aliases and attaches the loader's resolution. Every
    /// problem found here is fatal.
    pub(crate) fn resolve_imports(&mut self) -> Phase {
        let model = self.model;
        let mut fatal = false;

        for decl in &model.imports {
            let alias = &decl.alias.node;
            let at = decl.alias.span;

            if !is_identifier(alias) {
                self.report(
                    SchemaDiagnostic::fatal(Code::InvalidAlias, format!("`{alias}` is not a valid import alias"))
                        .at(at),
                );
                fatal = true;
                continue;
            }
            if is_keyword(alias) {
                self.report(
                    SchemaDiagnostic::fatal(
                        Code::ReservedAlias,
                        format!("`{alias}` is a reserved word and cannot be used as an import alias"),
                    )
                    .at(at),
                );
                fatal = true;
                continue;
            }
            if let Some(first) = self.import(alias) {
                let first_span = first.span;
                self.report(
                    SchemaDiagnostic::fatal(Code::DuplicateAlias, format!("import alias `{alias}` is used twice"))
                        .at(at)
                        .with_related(first_span, "first used here"),
                );
                fatal = true;
                continue;
            }
            if let Some(&ty) = self.type_index.get(alias) {
                let type_span = self.types[ty].span();
                self.report(
                    SchemaDiagnostic::fatal(
                        Code::AliasCollision,
                        format!("import alias `{alias}` collides with type `{alias}`"),
                    )
                    .at(at)
                    .with_related(type_span, "type defined here"),
                );
                fatal = true;
                continue;
            }

            self.imports.push(Import {
                alias: alias.clone(),
                path: decl.path.clone(),
                span: at,
                source: None,
            });
        }

        if fatal {
            return Err(Halt);
        }

        let Some(resolved) = self.resolved_imports else {
            return Ok(());
        };

        let mut by_source: HashMap<SourceId, Span> = HashMap::new();
        let mut found = Vec::new();
        for import in &mut self.imports {
            match resolved.get(&import.alias) {
                Some(id) if !id.is_empty() => {
                    if let Some(&first) = by_source.get(id) {
                        found.push(
                            SchemaDiagnostic::fatal(
                                Code::DuplicateImport,
                                format!("`{}` is imported multiple times", import.path),
                            )
                            .at(import.span)
                            .with_related(first, "first imported here"),
                        );
                        continue;
                    }
                    by_source.insert(id.clone(), import.span);
                    import.source = Some(id.clone());
                }
                _ => found.push(
                    SchemaDiagnostic::fatal(
                        Code::UnresolvedImport,
                        format!("import `{}` as `{}` could not be resolved", import.path, import.alias),
                    )
                    .at(import.span),
                ),
            }
        }

        if found.is_empty() {
            return Ok(());
        }
        self.diags.extend(found);
        Err(Halt)
    }
}
