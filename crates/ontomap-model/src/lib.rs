//! Ontomap graph model and domain descriptors.
//!
//! This crate is the shared vocabulary of the mapping engine:
//!
//! - [`graph`] holds the in-memory semantic graph (`GraphModel`,
//!   `SchemaClass`, `SchemaProperty`, `Individual`) that export produces and
//!   import consumes.
//! - [`descriptor`] is the typed registry that replaces runtime reflection:
//!   each domain type describes its identity accessor and members once, and
//!   the engine walks objects through those descriptors.
//! - [`catalog`] resolves descriptors per logical domain.
//! - [`identity`] extracts stable identifiers for naming and cache keys.
//!
//! Nothing here performs I/O; the textual boundary lives in `ontomap-io` and
//! persistence behind the `ontomap-store` trait.

pub mod catalog;
pub mod descriptor;
pub mod graph;
pub mod identity;
pub mod iri;
pub mod vocab;

pub use catalog::{CatalogSet, ConfigError, TypeCatalog};
pub use descriptor::{
    downcast, downcast_mut, shared, CapabilityMarker, Described, DescriptorRef, DomainObject,
    FieldAccess, FieldDescriptor, FieldError, OperationDescriptor, ScalarValue, SharedObject,
    TypeDescriptor, TypeDescriptorBuilder,
};
pub use graph::{
    property_iri, Cardinality, GraphModel, Individual, Literal, ModelError, PropertyValue,
    SchemaClass, SchemaProperty, SchemaPropertyKind, XsdType,
};
pub use identity::{AnonymousIdPolicy, IdentityError, IdentityResolver};
pub use iri::{Iri, IriError};
