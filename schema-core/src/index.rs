#![forbid(unsafe_code)]

use std::collections::HashMap;

use schema_ast::{PropertyDecl, Span, TypeDecl};

use crate::complete::{Halt, Phase, Session};
use crate::diagnostics::{Code, SchemaDiagnostic};
use crate::model::{DataType, Invariant, Property, Relation, Type, TypeId};
use crate::naming::field_name;

impl<'a> Session<'a> {
    /// Builds an empty type or datatype for every declaration. Duplicate
    /// top-level names are fatal, but all of them are reported first.
    pub(crate) fn index(&mut self) -> Phase {
        let model = self.model;
        let mut fatal = false;

        for decl in &model.types {
            let name = &decl.name.node;
            if let Some(&first) = self.type_index.get(name) {
                let first_span = self.types[first].span();
                self.report(
                    SchemaDiagnostic::fatal(Code::DuplicateType, format!("type `{name}` is defined more than once"))
                        .at(decl.name.span)
                        .with_related(first_span, "first defined here"),
                );
                fatal = true;
                continue;
            }

            let id = self.type_id(name);
            let mut ty = Type::new(
                id,
                decl.name.span,
                decl.doc.clone(),
                decl.is_abstract,
                decl.is_part,
                decl.inherits.clone(),
            );
            self.index_members(&mut ty, decl);

            self.type_index.insert(name.clone(), self.types.len());
            self.types.push(ty);
        }

        for decl in &model.datatypes {
            let name = &decl.name.node;
            if let Some(&first) = self.datatype_index.get(name) {
                let first_span = self.datatypes[first].span();
                self.report(
                    SchemaDiagnostic::fatal(
                        Code::DuplicateDataType,
                        format!("datatype `{name}` is defined more than once"),
                    )
                    .at(decl.name.span)
                    .with_related(first_span, "first defined here"),
                );
                fatal = true;
                continue;
            }

            let dt = DataType::new(name.clone(), decl.name.span, decl.doc.clone(), decl.constraint.clone());
            self.datatype_index.insert(name.clone(), self.datatypes.len());
            self.datatypes.push(dt);
        }

        if fatal { Err(Halt) } else { Ok(()) }
    }

    fn index_members(&mut self, ty: &mut Type, decl: &TypeDecl) {
        let owner = ty.id().clone();

        for prop in self.properties(&owner, &decl.properties, &format!("type `{}`", owner.name)) {
            ty.push_own_property(prop);
        }

        let mut seen: HashMap<&str, Span> = HashMap::new();
        for rel in &decl.relations {
            if let Some(&first) = seen.get(rel.name.node.as_str()) {
                self.report(
                    SchemaDiagnostic::error(
                        Code::DuplicateRelation,
                        format!("relation `{}` is declared twice in type `{}`", rel.name.node, owner.name),
                    )
                    .at(rel.name.span)
                    .with_related(first, "first declared here"),
                );
                continue;
            }
            seen.insert(&rel.name.node, rel.name.span);

            let properties = self.properties(
                &owner,
                &rel.properties,
                &format!("relation `{}` of `{}`", rel.name.node, owner.name),
            );
            ty.push_own_relation(Relation {
                name: rel.name.node.clone(),
                field_name: field_name(&rel.name.node),
                span: rel.name.span,
                doc: rel.doc.clone(),
                kind: rel.kind,
                target: rel.target.clone(),
                target_id: None,
                multiplicity: rel.multiplicity,
                backref: rel.backref.clone(),
                properties,
                owner: owner.clone(),
            });
        }

        for inv in &decl.invariants {
            ty.push_own_invariant(Invariant {
                name: inv.name.clone(),
                span: inv.span,
                doc: inv.doc.clone(),
                expr: inv.expr.clone(),
                owner: owner.clone(),
            });
        }
    }

    /// Converts property declarations, dropping (and reporting) repeats.
    fn properties(&mut self, owner: &TypeId, decls: &[PropertyDecl], context: &str) -> Vec<Property> {
        let mut out: Vec<Property> = Vec::with_capacity(decls.len());
        for decl in decls {
            if let Some(first) = out.iter().find(|p| p.name == decl.name.node) {
                let first_span = first.span;
                self.report(
                    SchemaDiagnostic::error(
                        Code::DuplicateProperty,
                        format!("property `{}` is declared twice in {context}", decl.name.node),
                    )
                    .at(decl.name.span)
                    .with_related(first_span, "first declared here"),
                );
                continue;
            }
            out.push(Property {
                name: decl.name.node.clone(),
                span: decl.name.span,
                doc: decl.doc.clone(),
                constraint: decl.constraint.clone(),
                optional: decl.optional,
                primary_key: decl.primary_key,
                owner: owner.clone(),
            });
        }
        out
    }
}
