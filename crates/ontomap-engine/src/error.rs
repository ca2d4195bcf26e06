//! Engine-level error type.
//!
//! Configuration, identity, model and store failures are fatal to the running
//! operation and bubble up through this enum. Per-member access failures are
//! deliberately NOT here: the engine logs those and keeps going, so one bad
//! accessor cannot sink a whole graph.

use thiserror::Error;

use ontomap_model::{ConfigError, FieldError, IdentityError, Iri, IriError, ModelError};
use ontomap_store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Iri(#[from] IriError),
    #[error("custom codec for class `{class}` failed: {message}")]
    Codec { class: Iri, message: String },
}
