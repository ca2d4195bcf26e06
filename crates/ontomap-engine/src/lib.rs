//! Bidirectional mapping between typed object graphs and semantic graphs.
//!
//! Export side: [`SchemaBuilder`] derives one OWL-style class per type
//! descriptor into a process-wide cache, and [`GraphSerializer`] walks an
//! object graph into a `GraphModel` under a depth budget, with idempotent
//! IRI naming and cycle termination.
//!
//! Import side: [`GraphDeserializer`] materializes typed objects back out of
//! a model through an [`ImportContext`] that holds the per-operation identity
//! cache, type catalog, optional entity store and the [`CustomCodec`]
//! override tables shared by both directions.

pub mod context;
pub mod deserializer;
pub mod error;
pub mod schema;
pub mod serializer;

pub use context::{CustomCodec, ImportContext, OverrideTables};
pub use deserializer::GraphDeserializer;
pub use error::EngineError;
pub use schema::{new_class_cache, DisjointSets, SchemaBuilder, SharedClassCache};
pub use serializer::{ExportOptions, GraphSerializer};
