#![forbid(unsafe_code)]

//! Completed, sealed schema model.
//!
//! Objects here are built empty by the indexer, filled by the later phases
//! (append or replace, never delete) and sealed before the [`Schema`] is
//! handed out. Mutating a sealed object is a bug in the completer and
//! panics.

use std::collections::HashMap;
use std::fmt;

use schema_ast::{
    Backref, Constraint, Expr, Multiplicity, RelationKind, SourceId, Span, TypeRef,
};

use crate::constraint::{self, Comparison};

/// Structural identity of a type across files.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId {
    pub schema: SourceId,
    pub name: String,
}

impl TypeId {
    pub fn new(schema: SourceId, name: impl Into<String>) -> Self {
        TypeId {
            schema,
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.schema)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub name: String,
    pub span: Span,
    pub doc: Option<String>,
    pub constraint: Constraint,
    pub optional: bool,
    pub primary_key: bool,
    /// Type that declared it.
    pub owner: TypeId,
}

impl Property {
    /// Same declaration shape, ignoring where it was declared.
    pub fn is_equal(&self, other: &Property) -> bool {
        self.name == other.name
            && self.optional == other.optional
            && self.primary_key == other.primary_key
            && constraint::equivalent(&self.constraint, &other.constraint)
    }

    /// Whether `self` may stand in for `other`: required narrows optional,
    /// never the reverse, and the constraint must narrow.
    pub fn compare(&self, other: &Property) -> Comparison {
        if self.primary_key != other.primary_key || (self.optional && !other.optional) {
            return Comparison::NotNarrower;
        }
        constraint::compare(&self.constraint, &other.constraint)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    pub name: String,
    /// Lower-snake-case identity used for merging and collisions.
    pub field_name: String,
    pub span: Span,
    pub doc: Option<String>,
    pub kind: RelationKind,
    pub target: TypeRef,
    /// Filled by target validation when the target resolves.
    pub target_id: Option<TypeId>,
    pub multiplicity: Multiplicity,
    pub backref: Option<Backref>,
    pub properties: Vec<Property>,
    pub owner: TypeId,
}

impl Relation {
    /// Compatible definitions: kind, target, multiplicity and backref agree.
    ///
    /// Targets compare by resolved identity when both sides have one,
    /// otherwise by the reference as written.
    pub fn is_equal(&self, other: &Relation, self_target: Option<&TypeId>, other_target: Option<&TypeId>) -> bool {
        let same_target = match (self_target, other_target) {
            (Some(a), Some(b)) => a == b,
            _ => self.target.qualifier == other.target.qualifier && self.target.name == other.target.name,
        };
        let same_backref = match (&self.backref, &other.backref) {
            (None, None) => true,
            (Some(a), Some(b)) => a.name.node == b.name.node && a.multiplicity == b.multiplicity,
            _ => false,
        };
        self.kind == other.kind && same_target && self.multiplicity == other.multiplicity && same_backref
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Invariant {
    pub name: String,
    pub span: Span,
    pub doc: Option<String>,
    pub expr: Expr,
    pub owner: TypeId,
}

#[derive(Clone, Debug)]
pub struct Type {
    id: TypeId,
    span: Span,
    doc: Option<String>,
    is_abstract: bool,
    is_part: bool,
    inherits: Vec<TypeRef>,

    own_properties: Vec<Property>,
    own_relations: Vec<Relation>,
    own_invariants: Vec<Invariant>,

    all_properties: Vec<Property>,
    all_relations: Vec<Relation>,
    all_invariants: Vec<Invariant>,

    supertypes: Vec<TypeId>,
    subtypes: Vec<TypeId>,
    primary_keys: Vec<String>,

    sealed: bool,
}

impl Type {
    pub(crate) fn new(
        id: TypeId,
        span: Span,
        doc: Option<String>,
        is_abstract: bool,
        is_part: bool,
        inherits: Vec<TypeRef>,
    ) -> Self {
        Type {
            id,
            span,
            doc,
            is_abstract,
            is_part,
            inherits,
            own_properties: Vec::new(),
            own_relations: Vec::new(),
            own_invariants: Vec::new(),
            all_properties: Vec::new(),
            all_relations: Vec::new(),
            all_invariants: Vec::new(),
            supertypes: Vec::new(),
            subtypes: Vec::new(),
            primary_keys: Vec::new(),
            sealed: false,
        }
    }

    pub fn id(&self) -> &TypeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_part(&self) -> bool {
        self.is_part
    }

    /// Supertype references as declared.
    pub fn inherits(&self) -> &[TypeRef] {
        &self.inherits
    }

    pub fn own_properties(&self) -> &[Property] {
        &self.own_properties
    }

    pub fn own_relations(&self) -> &[Relation] {
        &self.own_relations
    }

    pub fn own_invariants(&self) -> &[Invariant] {
        &self.own_invariants
    }

    pub fn all_properties(&self) -> &[Property] {
        &self.all_properties
    }

    pub fn all_relations(&self) -> &[Relation] {
        &self.all_relations
    }

    pub fn all_invariants(&self) -> &[Invariant] {
        &self.all_invariants
    }

    /// Linearized ancestors, most basic first, each exactly once.
    pub fn supertypes(&self) -> &[TypeId] {
        &self.supertypes
    }

    pub fn subtypes(&self) -> &[TypeId] {
        &self.subtypes
    }

    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.all_properties.iter().find(|p| p.name == name)
    }

    pub fn relation(&self, field_name: &str) -> Option<&Relation> {
        self.all_relations.iter().find(|r| r.field_name == field_name)
    }

    pub fn invariant(&self, name: &str) -> Option<&Invariant> {
        self.all_invariants.iter().find(|i| i.name == name)
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// `self` plus every linearized ancestor.
    pub fn is_subtype_of(&self, id: &TypeId) -> bool {
        self.id == *id || self.supertypes.contains(id)
    }

    fn assert_open(&self) {
        assert!(!self.sealed, "type `{}` mutated after it was sealed", self.id);
    }

    pub(crate) fn push_own_property(&mut self, prop: Property) {
        self.assert_open();
        self.own_properties.push(prop);
    }

    pub(crate) fn push_own_relation(&mut self, rel: Relation) {
        self.assert_open();
        self.own_relations.push(rel);
    }

    pub(crate) fn push_own_invariant(&mut self, inv: Invariant) {
        self.assert_open();
        self.own_invariants.push(inv);
    }

    pub(crate) fn own_properties_mut(&mut self) -> &mut [Property] {
        self.assert_open();
        &mut self.own_properties
    }

    pub(crate) fn own_relations_mut(&mut self) -> &mut [Relation] {
        self.assert_open();
        &mut self.own_relations
    }

    pub(crate) fn set_merged(
        &mut self,
        supertypes: Vec<TypeId>,
        properties: Vec<Property>,
        relations: Vec<Relation>,
        invariants: Vec<Invariant>,
    ) {
        self.assert_open();
        self.supertypes = supertypes;
        self.all_properties = properties;
        self.all_relations = relations;
        self.all_invariants = invariants;
    }

    pub(crate) fn set_primary_keys(&mut self, keys: Vec<String>) {
        self.assert_open();
        self.primary_keys = keys;
    }

    pub(crate) fn push_subtype(&mut self, id: TypeId) {
        self.assert_open();
        if !self.subtypes.contains(&id) {
            self.subtypes.push(id);
        }
    }

    /// Records the resolved target on every copy of relations declared by
    /// `owner` under `field_name`.
    pub(crate) fn record_target(&mut self, owner: &TypeId, field_name: &str, target: &TypeId) {
        self.assert_open();
        for rel in self.own_relations.iter_mut().chain(self.all_relations.iter_mut()) {
            if rel.owner == *owner && rel.field_name == field_name {
                rel.target_id = Some(target.clone());
            }
        }
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }
}

#[derive(Clone, Debug)]
pub struct DataType {
    name: String,
    span: Span,
    doc: Option<String>,
    constraint: Constraint,
    sealed: bool,
}

impl DataType {
    pub(crate) fn new(name: String, span: Span, doc: Option<String>, constraint: Constraint) -> Self {
        DataType {
            name,
            span,
            doc,
            constraint,
            sealed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn set_constraint(&mut self, constraint: Constraint) {
        assert!(!self.sealed, "datatype `{}` mutated after it was sealed", self.name);
        self.constraint = constraint;
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub alias: String,
    pub path: String,
    pub span: Span,
    /// Present when the loader resolved the import.
    pub source: Option<SourceId>,
}

/// A completed schema. Only produced when completion succeeded.
#[derive(Clone, Debug)]
pub struct Schema {
    pub(crate) id: SourceId,
    pub(crate) name: String,
    pub(crate) span: Span,
    pub(crate) doc: Option<String>,
    pub(crate) types: Vec<Type>,
    pub(crate) type_index: HashMap<String, usize>,
    pub(crate) datatypes: Vec<DataType>,
    pub(crate) datatype_index: HashMap<String, usize>,
    pub(crate) imports: Vec<Import>,
}

impl Schema {
    pub fn id(&self) -> &SourceId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn type_named(&self, name: &str) -> Option<&Type> {
        self.type_index.get(name).map(|&i| &self.types[i])
    }

    pub fn type_by_id(&self, id: &TypeId) -> Option<&Type> {
        if id.schema != self.id {
            return None;
        }
        self.type_named(&id.name)
    }

    pub fn datatypes(&self) -> &[DataType] {
        &self.datatypes
    }

    pub fn datatype_named(&self, name: &str) -> Option<&DataType> {
        self.datatype_index.get(name).map(|&i| &self.datatypes[i])
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn import_named(&self, alias: &str) -> Option<&Import> {
        self.imports.iter().find(|i| i.alias == alias)
    }

    /// Identity of the type a reference written in this schema points at,
    /// without checking that the target exists.
    pub fn reference_target(&self, r: &TypeRef) -> Option<TypeId> {
        match &r.qualifier {
            None => Some(TypeId::new(self.id.clone(), r.name.clone())),
            Some(q) => {
                let source = self.import_named(q)?.source.clone()?;
                Some(TypeId::new(source, r.name.clone()))
            }
        }
    }
}
