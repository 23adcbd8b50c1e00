#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use schema_ast::SourceId;

use crate::model::{Schema, Type, TypeId};

/// Alias -> source mapping produced by the loader for one schema's imports.
pub type ResolvedImports = BTreeMap<String, SourceId>;

/// Read-only view of already completed schemas, used for cross-file lookups.
///
/// Completion never writes through this trait; registering new schemas is
/// the caller's business and must not overlap a completion that reads it.
pub trait Registry: Send + Sync {
    fn lookup_by_source_id(&self, id: &SourceId) -> Option<&Schema>;

    fn all(&self) -> Vec<&Schema>;

    fn lookup_type(&self, id: &TypeId) -> Option<&Type> {
        self.lookup_by_source_id(&id.schema)?.type_named(&id.name)
    }
}

#[derive(Debug, Default)]
pub struct MemoryRegistry {
    schemas: BTreeMap<SourceId, Schema>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `schema`, returning the version it replaces.
    pub fn insert(&mut self, schema: Schema) -> Option<Schema> {
        self.schemas.insert(schema.id().clone(), schema)
    }

    pub fn remove(&mut self, id: &SourceId) -> Option<Schema> {
        self.schemas.remove(id)
    }

    pub fn contains(&self, id: &SourceId) -> bool {
        self.schemas.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl Registry for MemoryRegistry {
    fn lookup_by_source_id(&self, id: &SourceId) -> Option<&Schema> {
        self.schemas.get(id)
    }

    /// Ordered by source id.
    fn all(&self) -> Vec<&Schema> {
        self.schemas.values().collect()
    }
}
