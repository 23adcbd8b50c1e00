#![forbid(unsafe_code)]

use crate::complete::Session;
use crate::diagnostics::{Code, SchemaDiagnostic};
use crate::model::{Relation, Type, TypeId};
use crate::naming::field_name;

impl<'a> Session<'a> {
    /// Naming checks over the merged member sets. Nothing here is fatal.
    pub(crate) fn detect_collisions(&mut self) {
        let mut found = Vec::new();
        for ty in &self.types {
            self.reserved_names(ty, &mut found);
            self.case_collisions(ty, &mut found);
            self.property_relation_collisions(ty, &mut found);
            self.relation_collisions(ty, &mut found);
        }
        self.diags.extend(found);
    }

    /// True when some ancestor of `ty` already holds both owners in its own
    /// closure, in which case the pair was reported while checking it.
    fn reported_by_ancestor(&self, ty: &Type, a: &TypeId, b: &TypeId) -> bool {
        if a == ty.id() || b == ty.id() {
            return false;
        }
        ty.supertypes()
            .iter()
            .filter_map(|s| self.type_by_id(s))
            .any(|s| s.is_subtype_of(a) && s.is_subtype_of(b))
    }

    fn reserved_names(&self, ty: &Type, found: &mut Vec<SchemaDiagnostic>) {
        let prefix = self.config.reserved_prefix.as_str();
        if prefix.is_empty() {
            return;
        }

        let props = ty.own_properties().iter().map(|p| ("property", &p.name, p.span));
        let rels = ty.own_relations().iter().map(|r| ("relation", &r.name, r.span));
        for (what, name, span) in props.chain(rels) {
            if name.starts_with(prefix) {
                found.push(
                    SchemaDiagnostic::error(
                        Code::ReservedName,
                        format!("{what} `{name}` of `{}` uses the reserved prefix `{prefix}`", ty.name()),
                    )
                    .at(span),
                );
            }
        }
    }

    fn case_collisions(&self, ty: &Type, found: &mut Vec<SchemaDiagnostic>) {
        let props = ty.all_properties();
        for (i, a) in props.iter().enumerate() {
            for b in &props[i + 1..] {
                if a.name == b.name || !a.name.eq_ignore_ascii_case(&b.name) {
                    continue;
                }
                if self.reported_by_ancestor(ty, &a.owner, &b.owner) {
                    continue;
                }
                found.push(
                    SchemaDiagnostic::error(
                        Code::CaseCollision,
                        format!(
                            "properties `{}` and `{}` of `{}` differ only in case",
                            a.name,
                            b.name,
                            ty.name()
                        ),
                    )
                    .at(b.span)
                    .with_related(a.span, format!("`{}` declared in `{}`", a.name, a.owner.name)),
                );
            }
        }
    }

    fn property_relation_collisions(&self, ty: &Type, found: &mut Vec<SchemaDiagnostic>) {
        for p in ty.all_properties() {
            let key = field_name(&p.name);
            for r in ty.all_relations() {
                if key != r.field_name {
                    continue;
                }
                if self.reported_by_ancestor(ty, &p.owner, &r.owner) {
                    continue;
                }
                found.push(
                    SchemaDiagnostic::error(
                        Code::PropertyRelationCollision,
                        format!(
                            "property `{}` collides with relation `{}` (field `{}`) in `{}`",
                            p.name,
                            r.name,
                            r.field_name,
                            ty.name()
                        ),
                    )
                    .at(p.span)
                    .with_related(r.span, format!("relation declared in `{}`", r.owner.name)),
                );
            }
        }
    }

    fn relation_collisions(&self, ty: &Type, found: &mut Vec<SchemaDiagnostic>) {
        let mut candidates: Vec<&Relation> = ty.own_relations().iter().collect();
        for s in ty.supertypes().iter().filter_map(|s| self.type_by_id(s)) {
            candidates.extend(s.own_relations());
        }

        for (i, a) in candidates.iter().enumerate() {
            for b in &candidates[i + 1..] {
                if a.field_name != b.field_name || a.name == b.name {
                    continue;
                }
                if self.relations_equal(a, b) || self.reported_by_ancestor(ty, &a.owner, &b.owner) {
                    continue;
                }
                found.push(
                    SchemaDiagnostic::error(
                        Code::RelationCollision,
                        format!(
                            "relations `{}` and `{}` of `{}` both map to field `{}`",
                            a.name,
                            b.name,
                            ty.name(),
                            a.field_name
                        ),
                    )
                    .at(b.span)
                    .with_related(a.span, format!("`{}` declared in `{}`", a.name, a.owner.name)),
                );
            }
        }
    }
}
