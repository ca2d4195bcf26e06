//! Type catalogs: which descriptors are reachable per logical domain.
//!
//! The external configuration names, per domain, the types eligible for
//! mapping; applications materialize that configuration by registering
//! descriptors here. Lookup failures for a whole domain are configuration
//! errors and fatal to the operation; lookup failures for a single type name
//! are expected (forward compatibility) and surface as `None`.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::descriptor::{Described, TypeDescriptor};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown domain `{0}`")]
    UnknownDomain(String),
    #[error("type `{0}` has no registered factory; cannot be imported")]
    NoFactory(String),
    #[error("missing required namespace for domain `{0}`")]
    MissingNamespace(String),
}

/// Descriptors of one logical domain, resolvable by short or fully-qualified
/// name.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    domain: String,
    by_short: BTreeMap<&'static str, &'static TypeDescriptor>,
    by_full: BTreeMap<&'static str, &'static TypeDescriptor>,
}

impl TypeCatalog {
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            by_short: BTreeMap::new(),
            by_full: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn register<T: Described>(&mut self) {
        self.register_descriptor(<T as Described>::descriptor());
    }

    pub fn register_descriptor(&mut self, descriptor: &'static TypeDescriptor) {
        self.by_short.insert(descriptor.short_name(), descriptor);
        self.by_full.insert(descriptor.full_name(), descriptor);
    }

    #[must_use]
    pub fn resolve_short(&self, short_name: &str) -> Option<&'static TypeDescriptor> {
        self.by_short.get(short_name).copied()
    }

    #[must_use]
    pub fn resolve_full(&self, full_name: &str) -> Option<&'static TypeDescriptor> {
        self.by_full.get(full_name).copied()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static TypeDescriptor> + '_ {
        self.by_short.values().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_short.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_short.is_empty()
    }
}

/// All configured domains.
#[derive(Debug, Default)]
pub struct CatalogSet {
    domains: BTreeMap<String, TypeCatalog>,
}

impl CatalogSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, catalog: TypeCatalog) {
        self.domains.insert(catalog.domain().to_string(), catalog);
    }

    /// Unknown domains are a configuration error, surfaced immediately.
    pub fn domain(&self, name: &str) -> Result<&TypeCatalog, ConfigError> {
        self.domains
            .get(name)
            .ok_or_else(|| ConfigError::UnknownDomain(name.to_string()))
    }

    pub fn domains(&self) -> impl Iterator<Item = &TypeCatalog> {
        self.domains.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DomainObject, TypeDescriptor};
    use std::any::Any;
    use std::sync::OnceLock;

    #[derive(Default)]
    struct Widget;

    impl DomainObject for Widget {
        fn descriptor(&self) -> &'static TypeDescriptor {
            <Widget as Described>::descriptor()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl Described for Widget {
        fn descriptor() -> &'static TypeDescriptor {
            static DESC: OnceLock<TypeDescriptor> = OnceLock::new();
            DESC.get_or_init(|| {
                TypeDescriptor::builder::<Widget>("Widget", "com.example.model.Widget").build()
            })
        }
    }

    #[test]
    fn resolves_by_short_and_full_name() {
        let mut catalog = TypeCatalog::new("demo");
        catalog.register::<Widget>();
        assert!(catalog.resolve_short("Widget").is_some());
        assert!(catalog.resolve_full("com.example.model.Widget").is_some());
        assert!(catalog.resolve_short("Gadget").is_none());
    }

    #[test]
    fn unknown_domain_is_a_config_error() {
        let mut set = CatalogSet::new();
        set.insert(TypeCatalog::new("demo"));
        assert!(set.domain("demo").is_ok());
        assert_eq!(
            set.domain("sales").err(),
            Some(ConfigError::UnknownDomain("sales".to_string()))
        );
    }
}
