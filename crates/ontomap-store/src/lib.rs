//! Persistence collaborator for the mapping engine.
//!
//! The engine treats storage as a black box behind [`EntityStore`]: entities
//! come out during import reconciliation and bulk export, and a missing
//! required entity is a first-class [`StoreError::NotFound`] that the engine
//! propagates rather than swallows. [`MemoryStore`] is the reference
//! implementation used by tests and small deployments.
//!
//! No transactions here: the engine runs one synchronous traversal per
//! operation, and storage calls are blocking points inside it.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use thiserror::Error;

use ontomap_model::SharedObject;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no `{type_name}` with id `{id}` in domain `{domain}`")]
    NotFound {
        domain: String,
        type_name: String,
        id: String,
    },
    #[error("unknown domain `{0}`")]
    UnknownDomain(String),
}

/// A page request for bulk streaming. Pages are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    #[must_use]
    pub fn new(number: usize, size: usize) -> Self {
        Self { number, size }
    }

    #[must_use]
    pub fn first(size: usize) -> Self {
        Self { number: 0, size }
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self {
            number: self.number + 1,
            size: self.size,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 0,
            size: 100,
        }
    }
}

/// Black-box persistence interface.
pub trait EntityStore {
    /// Fetches one entity; absence is an error, not `None`.
    fn get_by_id(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
    ) -> Result<SharedObject, StoreError>;

    /// Streams one page of all entities of a type; an empty page signals the
    /// end of the stream.
    fn stream_all(
        &self,
        domain: &str,
        type_name: &str,
        page: Page,
    ) -> Result<Vec<SharedObject>, StoreError>;

    /// Lazy reference lookup in the store's default domain.
    fn get_reference(&self, type_name: &str, id: &str) -> Result<SharedObject, StoreError>;
}

/// In-memory [`EntityStore`].
pub struct MemoryStore {
    default_domain: String,
    entities: RwLock<BTreeMap<(String, String, String), SharedObject>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(default_domain: impl Into<String>) -> Self {
        Self {
            default_domain: default_domain.into(),
            entities: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn insert(
        &self,
        domain: impl Into<String>,
        type_name: impl Into<String>,
        id: impl Into<String>,
        entity: SharedObject,
    ) {
        self.entities
            .write()
            .insert((domain.into(), type_name.into(), id.into()), entity);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}

impl EntityStore for MemoryStore {
    fn get_by_id(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
    ) -> Result<SharedObject, StoreError> {
        let key = (domain.to_string(), type_name.to_string(), id.to_string());
        self.entities
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                domain: domain.to_string(),
                type_name: type_name.to_string(),
                id: id.to_string(),
            })
    }

    fn stream_all(
        &self,
        domain: &str,
        type_name: &str,
        page: Page,
    ) -> Result<Vec<SharedObject>, StoreError> {
        let entities = self.entities.read();
        let matching = entities
            .iter()
            .filter(|((d, t, _), _)| d == domain && t == type_name)
            .map(|(_, v)| v.clone());
        Ok(matching
            .skip(page.number * page.size)
            .take(page.size)
            .collect())
    }

    fn get_reference(&self, type_name: &str, id: &str) -> Result<SharedObject, StoreError> {
        self.get_by_id(&self.default_domain, type_name, id)
    }
}
