//! Import context: per-operation identity cache, type resolution and the
//! typed override tables.
//!
//! One context lives for one import (or one export, for the serialize side of
//! the overrides). The identity cache guarantees that every individual IRI
//! maps to at most one live object per operation, which is what lets cyclic
//! graphs round-trip without duplication.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::debug;

use ontomap_model::{
    downcast, Described, DomainObject, GraphModel, Individual, Iri, SchemaClass, SharedObject,
    TypeCatalog, TypeDescriptor,
};
use ontomap_store::{EntityStore, Page};

use crate::error::EngineError;

/// Replaces the engine's generic treatment of one class in both directions.
///
/// `encode` returning `Ok(None)` means the codec chose to emit nothing for
/// this object; the engine skips it without error.
pub trait CustomCodec<T: Described>: 'static {
    fn encode(&self, value: &T, model: &mut GraphModel) -> Result<Option<Iri>, EngineError>;

    fn decode(
        &self,
        individual: &Individual,
        model: &GraphModel,
        ctx: &mut ImportContext,
    ) -> Result<SharedObject, EngineError>;
}

type SerializeOverride =
    Rc<dyn Fn(&dyn DomainObject, &mut GraphModel) -> Result<Option<Iri>, EngineError>>;
type DeserializeOverride =
    Rc<dyn Fn(&Individual, &GraphModel, &mut ImportContext) -> Result<SharedObject, EngineError>>;

/// Per-class codec overrides, keyed by class IRI. Cloning shares the
/// underlying closures.
#[derive(Clone, Default)]
pub struct OverrideTables {
    serialize: BTreeMap<Iri, SerializeOverride>,
    deserialize: BTreeMap<Iri, DeserializeOverride>,
}

impl OverrideTables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a codec for `T` under the class IRI `namespace + short name`.
    pub fn register_codec<T, C>(&mut self, namespace: &Iri, codec: C)
    where
        T: Described,
        C: CustomCodec<T>,
    {
        let class_iri = namespace.join(<T as Described>::descriptor().short_name());
        let codec = Rc::new(codec);

        let encoder = Rc::clone(&codec);
        let encode: SerializeOverride = Rc::new(move |object, model| {
            let typed = downcast::<T>(object)?;
            encoder.encode(typed, model)
        });

        let decode: DeserializeOverride =
            Rc::new(move |individual, model, ctx| codec.decode(individual, model, ctx));

        self.serialize.insert(class_iri.clone(), encode);
        self.deserialize.insert(class_iri, decode);
    }

    #[must_use]
    pub fn serialize_for(&self, class: &Iri) -> Option<SerializeOverride> {
        self.serialize.get(class).cloned()
    }

    #[must_use]
    pub fn deserialize_for(&self, class: &Iri) -> Option<DeserializeOverride> {
        self.deserialize.get(class).cloned()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.serialize.is_empty() && self.deserialize.is_empty()
    }
}

impl std::fmt::Debug for OverrideTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideTables")
            .field("serialize", &self.serialize.len())
            .field("deserialize", &self.deserialize.len())
            .finish()
    }
}

/// State of one import operation.
pub struct ImportContext {
    namespace: Iri,
    catalog: TypeCatalog,
    cache: HashMap<Iri, SharedObject>,
    overrides: OverrideTables,
    store: Option<Rc<dyn EntityStore>>,
    reference_lists: HashMap<(String, String), Vec<SharedObject>>,
}

impl ImportContext {
    #[must_use]
    pub fn new(namespace: Iri, catalog: TypeCatalog) -> Self {
        Self {
            namespace,
            catalog,
            cache: HashMap::new(),
            overrides: OverrideTables::new(),
            store: None,
            reference_lists: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: Rc<dyn EntityStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: OverrideTables) -> Self {
        self.overrides = overrides;
        self
    }

    #[must_use]
    pub fn namespace(&self) -> &Iri {
        &self.namespace
    }

    pub fn register_codec<T, C>(&mut self, codec: C)
    where
        T: Described,
        C: CustomCodec<T>,
    {
        let namespace = self.namespace.clone();
        self.overrides.register_codec::<T, C>(&namespace, codec);
    }

    #[must_use]
    pub fn overrides(&self) -> &OverrideTables {
        &self.overrides
    }

    /// Resolves the local type of a schema class: the class comment holds the
    /// fully-qualified name, the label the short one.
    #[must_use]
    pub fn resolve_class(&self, class: &SchemaClass) -> Option<&'static TypeDescriptor> {
        self.catalog
            .resolve_full(&class.comment)
            .or_else(|| self.catalog.resolve_short(&class.label))
    }

    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    // ------------------------------------------------------------------
    // Identity cache
    // ------------------------------------------------------------------

    #[must_use]
    pub fn cached(&self, iri: &Iri) -> Option<SharedObject> {
        self.cache.get(iri).cloned()
    }

    pub fn insert(&mut self, iri: Iri, object: SharedObject) {
        self.cache.insert(iri, object);
    }

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    // ------------------------------------------------------------------
    // Store-backed resolution
    // ------------------------------------------------------------------

    /// Resolves an individual IRI that is absent from the model against the
    /// store. The IRI shape `class IRI + '#' + id` carries both the type
    /// short name and the identifier. A `NotFound` from the store propagates.
    pub fn resolve_reference(&mut self, iri: &Iri) -> Result<Option<SharedObject>, EngineError> {
        if let Some(cached) = self.cached(iri) {
            return Ok(Some(cached));
        }
        let Some(store) = self.store.clone() else {
            debug!(iri = iri.as_str(), "no store configured, reference left unresolved");
            return Ok(None);
        };
        let Some((class_part, id)) = iri.as_str().rsplit_once('#') else {
            debug!(iri = iri.as_str(), "reference IRI has no fragment, skipping");
            return Ok(None);
        };
        let type_name = class_part
            .rsplit('/')
            .next()
            .unwrap_or(class_part)
            .to_string();
        let object = store.get_reference(&type_name, id)?;
        self.insert(iri.clone(), object.clone());
        Ok(Some(object))
    }

    /// All entities of a type, streamed once from the store and cached for
    /// the rest of the operation.
    pub fn reference_list(
        &mut self,
        domain: &str,
        type_name: &str,
    ) -> Result<&[SharedObject], EngineError> {
        let key = (domain.to_string(), type_name.to_string());
        if !self.reference_lists.contains_key(&key) {
            let mut all = Vec::new();
            if let Some(store) = self.store.clone() {
                let mut page = Page::default();
                loop {
                    let batch = store.stream_all(domain, type_name, page)?;
                    if batch.is_empty() {
                        break;
                    }
                    all.extend(batch);
                    page = page.next();
                }
            } else {
                debug!(domain, type_name, "no store configured, empty reference list");
            }
            self.reference_lists.insert(key.clone(), all);
        }
        // Just inserted above when absent.
        Ok(self
            .reference_lists
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for ImportContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportContext")
            .field("namespace", &self.namespace)
            .field("cached", &self.cache.len())
            .field("overrides", &self.overrides)
            .finish()
    }
}
