#![forbid(unsafe_code)]

use schema_ast::RelationKind;
use tracing::trace;

use crate::complete::{Resolved, Session};
use crate::diagnostics::{Code, SchemaDiagnostic};
use crate::model::{Relation, Type, TypeId};

/// Resolved target facts needed by the structural rules.
struct Target {
    id: TypeId,
    is_part: bool,
    is_abstract: bool,
}

impl Target {
    fn of(t: &Type) -> Self {
        Target {
            id: t.id().clone(),
            is_part: t.is_part(),
            is_abstract: t.is_abstract(),
        }
    }
}

impl<'a> Session<'a> {
    /// Resolves every own relation target, applies the part/composition
    /// rules and records the target identity on every local copy.
    pub(crate) fn validate_targets(&mut self) {
        let mut records: Vec<(TypeId, String, TypeId)> = Vec::new();

        for i in 0..self.types.len() {
            let rels = self.types[i].own_relations().to_vec();
            for rel in &rels {
                if self.types[i].is_part() && rel.kind == RelationKind::Association {
                    let diag = SchemaDiagnostic::error(
                        Code::PartAssociation,
                        format!(
                            "part type `{}` cannot declare association `{}`",
                            self.types[i].name(),
                            rel.name
                        ),
                    )
                    .at(rel.span);
                    self.report(diag);
                }

                let target = match self.resolve_type_ref(&rel.target) {
                    Resolved::Local(j) => Target::of(&self.types[j]),
                    Resolved::Foreign(t) => Target::of(t),
                    Resolved::Deferred => {
                        trace!(relation = %rel.name, target = %rel.target, "relation target deferred");
                        continue;
                    }
                    Resolved::UnknownImport => {
                        let qualifier = rel.target.qualifier.clone().unwrap_or_default();
                        self.unknown_import(&qualifier, rel.target.span);
                        continue;
                    }
                    Resolved::Missing => {
                        self.unknown_type(&rel.target, "relation target");
                        continue;
                    }
                };

                self.check_target(rel, &target);
                records.push((rel.owner.clone(), rel.field_name.clone(), target.id));
            }
        }

        for (owner, field, target) in &records {
            for ty in &mut self.types {
                ty.record_target(owner, field, target);
            }
        }
    }

    fn check_target(&mut self, rel: &Relation, target: &Target) {
        let problem = match rel.kind {
            RelationKind::Composition if !target.is_part => Some((
                Code::InvalidCompositionTarget,
                format!(
                    "composition `{}` must target a part type, but `{}` is not one",
                    rel.name, target.id.name
                ),
            )),
            RelationKind::Composition if target.is_abstract => Some((
                Code::InvalidCompositionTarget,
                format!(
                    "composition `{}` must target a concrete part type, but `{}` is abstract",
                    rel.name, target.id.name
                ),
            )),
            RelationKind::Association if target.is_part => Some((
                Code::InvalidAssociationTarget,
                format!(
                    "association `{}` cannot target part type `{}`; use a composition",
                    rel.name, target.id.name
                ),
            )),
            _ => None,
        };

        if let Some((code, message)) = problem {
            self.report(SchemaDiagnostic::error(code, message).at(rel.target.span));
        }
    }
}
