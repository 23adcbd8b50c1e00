#![forbid(unsafe_code)]

//! Ancestor linearization and member merging.
//!
//! Ancestors are flattened left to right, depth first, keep-first: a
//! supertype contributes its own linearized ancestors followed by itself,
//! and any `TypeId` already seen is skipped, so a diamond's apex appears
//! once. Each ancestor then contributes only the members it declared.

use std::collections::HashSet;

use schema_ast::Span;
use tracing::trace;

use crate::complete::{Resolved, Session};
use crate::constraint::{primary_key_kind_ok, Comparison};
use crate::diagnostics::{Code, SchemaDiagnostic};
use crate::model::{Invariant, Property, Relation, TypeId};

/// A resolved supertype with its own linearized ancestors.
pub(crate) struct Parent {
    pub id: TypeId,
    pub ancestors: Vec<TypeId>,
}

/// Flattens `parents` (in declaration order) into one ancestor list for
/// `own`, most basic first.
pub(crate) fn linearize_ancestors(own: &TypeId, parents: &[Parent]) -> Vec<TypeId> {
    let mut seen: HashSet<&TypeId> = HashSet::from([own]);
    let mut out = Vec::new();

    for parent in parents {
        if seen.contains(&parent.id) {
            continue;
        }
        for a in &parent.ancestors {
            if seen.insert(a) {
                out.push(a.clone());
            }
        }
        seen.insert(&parent.id);
        out.push(parent.id.clone());
    }
    out
}

fn describe(p: &Property) -> String {
    let mut s = p.constraint.display();
    if p.optional {
        s.push_str(" (optional)");
    }
    if p.primary_key {
        s.push_str(" (primary key)");
    }
    s
}

impl<'a> Session<'a> {
    pub(crate) fn linearize(&mut self) {
        let n = self.types.len();
        let mut completed = vec![false; n];
        let mut active = vec![false; n];
        for i in 0..n {
            self.complete_type(i, &mut completed, &mut active);
        }
        self.populate_subtypes();
    }

    fn complete_type(&mut self, i: usize, completed: &mut [bool], active: &mut [bool]) {
        if completed[i] {
            return;
        }
        if active[i] {
            unreachable!("type `{}` re-entered during linearization", self.types[i].name());
        }
        active[i] = true;

        let mut parents = Vec::new();
        let inherits = self.types[i].inherits().to_vec();
        for r in &inherits {
            match self.resolve_type_ref(r) {
                Resolved::Local(j) => {
                    self.complete_type(j, completed, active);
                    let t = &self.types[j];
                    parents.push(Parent {
                        id: t.id().clone(),
                        ancestors: t.supertypes().to_vec(),
                    });
                }
                Resolved::Foreign(t) => parents.push(Parent {
                    id: t.id().clone(),
                    ancestors: t.supertypes().to_vec(),
                }),
                Resolved::Deferred => trace!(supertype = %r, "supertype deferred"),
                Resolved::UnknownImport => {
                    let qualifier = r.qualifier.clone().unwrap_or_default();
                    self.unknown_import(&qualifier, r.span);
                }
                Resolved::Missing => self.unknown_type(r, "supertype"),
            }
        }

        let own_id = self.types[i].id().clone();
        let ancestors = linearize_ancestors(&own_id, &parents);

        let mut inherited_props = Vec::new();
        let mut inherited_rels = Vec::new();
        let mut inherited_invs = Vec::new();
        for a in &ancestors {
            if let Some(t) = self.type_by_id(a) {
                inherited_props.extend(t.own_properties().iter().cloned());
                inherited_rels.extend(t.own_relations().iter().cloned());
                inherited_invs.extend(t.own_invariants().iter().cloned());
            }
        }

        let properties = self.merge_properties(i, inherited_props);
        let relations = self.merge_relations(i, inherited_rels);
        let invariants = merge_invariants(self.types[i].own_invariants(), inherited_invs);
        let keys = self.primary_keys(&own_id, &properties);

        trace!(
            ty = self.types[i].name(),
            supertypes = ancestors.len(),
            properties = properties.len(),
            relations = relations.len(),
            "type linearized"
        );
        let ty = &mut self.types[i];
        ty.set_merged(ancestors, properties, relations, invariants);
        ty.set_primary_keys(keys);

        active[i] = false;
        completed[i] = true;
    }

    fn merge_properties(&mut self, i: usize, inherited: Vec<Property>) -> Vec<Property> {
        let own_id = self.types[i].id().clone();
        let mut merged: Vec<Property> = self.types[i].own_properties().to_vec();

        for p in inherited {
            let Some(pos) = merged.iter().position(|e| e.name == p.name) else {
                merged.push(p);
                continue;
            };
            let e = &merged[pos];
            if e.is_equal(&p) {
                continue;
            }

            if e.owner == own_id {
                if e.compare(&p) == Comparison::NotNarrower {
                    let diag = self.property_conflict(i, e, &p, e.span);
                    self.report(diag);
                }
                continue;
            }

            match p.compare(e) {
                Comparison::Narrows => merged[pos] = p,
                Comparison::Undecided => {}
                Comparison::NotNarrower => {
                    if e.compare(&p) == Comparison::NotNarrower {
                        let diag = self.property_conflict(i, e, &p, self.types[i].span());
                        self.report(diag);
                    }
                }
            }
        }
        merged
    }

    fn property_conflict(&self, i: usize, existing: &Property, incoming: &Property, at: Span) -> SchemaDiagnostic {
        SchemaDiagnostic::error(
            Code::PropertyConflict,
            format!(
                "property `{}` of `{}` conflicts: {} in `{}` vs {} in `{}`",
                existing.name,
                self.types[i].name(),
                describe(existing),
                existing.owner.name,
                describe(incoming),
                incoming.owner.name,
            ),
        )
        .at(at)
        .with_related(existing.span, format!("declared in `{}`", existing.owner.name))
        .with_related(incoming.span, format!("declared in `{}`", incoming.owner.name))
    }

    fn merge_relations(&mut self, i: usize, inherited: Vec<Relation>) -> Vec<Relation> {
        let mut merged: Vec<Relation> = Vec::new();
        for r in self.types[i].own_relations() {
            if !merged.iter().any(|e| e.field_name == r.field_name) {
                merged.push(r.clone());
            }
        }

        for r in inherited {
            let Some(e) = merged.iter().find(|e| e.field_name == r.field_name) else {
                merged.push(r);
                continue;
            };
            if e.name != r.name || self.relations_equal(e, &r) {
                continue;
            }
            let diag = SchemaDiagnostic::error(
                Code::RelationConflict,
                format!(
                    "relation `{}` of `{}` conflicts with relation `{}` of `{}`",
                    e.name, e.owner.name, r.name, r.owner.name
                ),
            )
            .at(if e.owner == *self.types[i].id() { e.span } else { self.types[i].span() })
            .with_related(e.span, format!("declared in `{}`", e.owner.name))
            .with_related(r.span, format!("declared in `{}`", r.owner.name));
            self.report(diag);
        }
        merged
    }

    fn primary_keys(&mut self, own_id: &TypeId, properties: &[Property]) -> Vec<String> {
        let mut keys = Vec::new();
        for p in properties.iter().filter(|p| p.primary_key) {
            match primary_key_kind_ok(&p.constraint) {
                Some(true) | None => keys.push(p.name.clone()),
                Some(false) => {
                    if p.owner == *own_id {
                        self.report(
                            SchemaDiagnostic::error(
                                Code::InvalidPrimaryKey,
                                format!(
                                    "primary key `{}` of `{}` must be a String, UUID, Date or Timestamp, not {}",
                                    p.name,
                                    own_id.name,
                                    p.constraint.deref().kind_name()
                                ),
                            )
                            .at(p.span),
                        );
                    }
                }
            }
        }
        keys
    }

    fn populate_subtypes(&mut self) {
        for i in 0..self.types.len() {
            let sub = self.types[i].id().clone();
            let supers: Vec<usize> = self.types[i]
                .supertypes()
                .iter()
                .filter(|s| s.schema == self.source)
                .filter_map(|s| self.type_index.get(&s.name).copied())
                .collect();
            for s in supers {
                self.types[s].push_subtype(sub.clone());
            }
        }
    }
}

/// Own invariants first, then inherited ones; the first of each name wins.
fn merge_invariants(own: &[Invariant], inherited: Vec<Invariant>) -> Vec<Invariant> {
    let mut merged: Vec<Invariant> = Vec::with_capacity(own.len() + inherited.len());
    for inv in own.iter().cloned().chain(inherited) {
        if !merged.iter().any(|m| m.name == inv.name) {
            merged.push(inv);
        }
    }
    merged
}
