#![forbid(unsafe_code)]

mod alias;
mod collisions;
mod complete;
mod cycles;
mod imports;
mod index;
mod invariants;
mod linearize;
mod targets;

pub mod batch;
pub mod config;
pub mod constraint;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod naming;
pub mod registry;

pub use batch::{complete_batch, BatchOutcome, SourceInput};
pub use complete::Completer;
pub use config::CompleteConfig;
pub use constraint::{compare, narrows, Comparison};
pub use cycles::detect_cross_schema_cycles;
pub use diagnostics::{Code, Collector, Related, SchemaDiagnostic, Severity};
pub use error::{CompleteError, ConfigError};
pub use model::{DataType, Import, Invariant, Property, Relation, Schema, Type, TypeId};
pub use registry::{MemoryRegistry, Registry, ResolvedImports};
