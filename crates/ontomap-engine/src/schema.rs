//! Schema derivation: one OWL-style class per domain type descriptor.
//!
//! Derived classes are immutable and identical for a given descriptor, so
//! they are built once per process into a shared [`SharedClassCache`] and
//! attached to per-operation models as cheap `Arc` clones. Concurrent first
//! derivations of the same class race benignly; the cache keeps whichever
//! entry lands first.

use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::warn;

use ontomap_model::{
    property_iri, Cardinality, FieldAccess, GraphModel, Iri, SchemaClass, SchemaProperty,
    SchemaPropertyKind, TypeDescriptor, XsdType,
};

/// Process-wide cache of derived classes, keyed by class IRI.
pub type SharedClassCache = Arc<DashMap<Iri, Arc<SchemaClass>>>;

#[must_use]
pub fn new_class_cache() -> SharedClassCache {
    Arc::new(DashMap::new())
}

/// Descriptor chain from the type itself up to its root ancestor.
pub(crate) fn descriptor_chain(descriptor: &'static TypeDescriptor) -> Vec<&'static TypeDescriptor> {
    let mut chain = vec![descriptor];
    let mut current = descriptor;
    while let Some(parent) = current.superclass() {
        chain.push(parent);
        current = parent;
    }
    chain
}

/// All mappable members of a type, inherited ones included. A member declared
/// lower in the hierarchy shadows a same-named inherited one.
pub(crate) fn field_chain(
    descriptor: &'static TypeDescriptor,
) -> Vec<(&'static TypeDescriptor, &'static ontomap_model::FieldDescriptor)> {
    let mut seen = BTreeSet::new();
    let mut fields = Vec::new();
    for owner in descriptor_chain(descriptor) {
        for field in owner.fields() {
            if seen.insert(field.name) {
                fields.push((owner, field));
            }
        }
    }
    fields
}

/// Tracks which classes carry which capability marker; classes sharing a
/// marker are asserted pairwise disjoint on request.
#[derive(Debug, Default)]
pub struct DisjointSets {
    by_marker: BTreeMap<String, BTreeSet<Iri>>,
}

impl DisjointSets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, marker: &str, class: Iri) {
        self.by_marker
            .entry(marker.to_string())
            .or_default()
            .insert(class);
    }

    /// Emits the pairwise disjointness assertions into the model.
    pub fn apply(&self, model: &mut GraphModel) {
        for classes in self.by_marker.values() {
            let classes: Vec<&Iri> = classes.iter().collect();
            for (i, a) in classes.iter().enumerate() {
                for b in &classes[i + 1..] {
                    model.add_disjoint((*a).clone(), (*b).clone());
                }
            }
        }
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.by_marker.len()
    }
}

/// Derives and caches schema classes under one namespace.
pub struct SchemaBuilder {
    namespace: Iri,
    cache: SharedClassCache,
    include_capabilities: bool,
    include_operations: bool,
}

impl SchemaBuilder {
    #[must_use]
    pub fn new(namespace: Iri, cache: SharedClassCache) -> Self {
        Self {
            namespace,
            cache,
            include_capabilities: false,
            include_operations: false,
        }
    }

    /// Also attach capability-marker classes and record disjointness.
    #[must_use]
    pub fn with_capabilities(mut self, include: bool) -> Self {
        self.include_capabilities = include;
        self
    }

    /// Also expose non-accessor operations as descriptive string properties.
    #[must_use]
    pub fn with_operations(mut self, include: bool) -> Self {
        self.include_operations = include;
        self
    }

    #[must_use]
    pub fn namespace(&self) -> &Iri {
        &self.namespace
    }

    /// Deterministic class IRI: namespace + short type name.
    #[must_use]
    pub fn class_iri(&self, descriptor: &TypeDescriptor) -> Iri {
        self.namespace.join(descriptor.short_name())
    }

    /// The cached class for a descriptor, deriving it on first use.
    #[must_use]
    pub fn class_for(&self, descriptor: &'static TypeDescriptor) -> Arc<SchemaClass> {
        let iri = self.class_iri(descriptor);
        self.cache
            .entry(iri.clone())
            .or_insert_with(|| Arc::new(self.derive_class(iri, descriptor)))
            .clone()
    }

    fn derive_class(&self, iri: Iri, descriptor: &'static TypeDescriptor) -> SchemaClass {
        let mut class = SchemaClass::new(iri, descriptor.short_name(), descriptor.full_name());
        class.superclass = descriptor
            .superclass()
            .map(|parent| self.class_iri(parent));
        if self.include_capabilities {
            class.capabilities = descriptor
                .capabilities()
                .iter()
                .map(|cap| self.namespace.join(cap.short_name))
                .collect();
        }

        // Only members declared directly on this type; inherited ones belong
        // to the ancestor's class.
        let mut names = BTreeSet::new();
        for field in descriptor.fields() {
            if !names.insert(field.name) {
                warn!(
                    type_name = descriptor.short_name(),
                    member = field.name,
                    "duplicate member name, keeping the first declaration"
                );
                continue;
            }
            let kind = match &field.access {
                FieldAccess::Scalar { datatype, .. } => {
                    SchemaPropertyKind::Datatype { range: *datatype }
                }
                FieldAccess::Reference { target, .. } => SchemaPropertyKind::Object {
                    range: self.class_iri(target()),
                },
                FieldAccess::Collection { element, .. } => SchemaPropertyKind::List {
                    range: self.class_iri(element()),
                },
            };
            let cardinality = match &field.access {
                FieldAccess::Collection { .. } => Cardinality::Many,
                _ => Cardinality::Single,
            };
            class.properties.push(SchemaProperty {
                iri: property_iri(&class.iri, field.name),
                name: field.name.to_string(),
                domain: class.iri.clone(),
                kind,
                cardinality,
            });
        }

        if self.include_operations {
            for op in descriptor.operations() {
                if !names.insert(op.name) {
                    continue;
                }
                class.properties.push(SchemaProperty {
                    iri: property_iri(&class.iri, op.name),
                    name: op.name.to_string(),
                    domain: class.iri.clone(),
                    kind: SchemaPropertyKind::Datatype {
                        range: XsdType::String,
                    },
                    cardinality: Cardinality::Single,
                });
            }
        }

        class
    }

    /// Attaches the descriptor's class, its ancestor classes and (when
    /// enabled) its capability-marker classes to the model. Returns the
    /// descriptor's own class.
    pub fn ensure_in_model(
        &self,
        model: &mut GraphModel,
        descriptor: &'static TypeDescriptor,
        mut disjoints: Option<&mut DisjointSets>,
    ) -> Arc<SchemaClass> {
        let mut result = None;
        for owner in descriptor_chain(descriptor) {
            let class = self.class_for(owner);
            if result.is_none() {
                result = Some(class.clone());
            }
            if self.include_capabilities {
                for cap in owner.capabilities() {
                    let marker_iri = self.namespace.join(cap.short_name);
                    let marker = self
                        .cache
                        .entry(marker_iri.clone())
                        .or_insert_with(|| {
                            Arc::new(SchemaClass::new(marker_iri, cap.short_name, cap.full_name))
                        })
                        .clone();
                    model.attach_class(marker);
                    if let Some(sets) = disjoints.as_deref_mut() {
                        sets.record(cap.full_name, class.iri.clone());
                    }
                }
            }
            model.attach_class(class);
        }
        // Chain is never empty; it at least holds the descriptor itself.
        result.unwrap_or_else(|| self.class_for(descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontomap_model::{shared, Described, DomainObject, ScalarValue, SharedObject};
    use std::any::Any;
    use std::sync::OnceLock;

    #[derive(Default)]
    struct Animal {
        name: Option<String>,
    }

    impl DomainObject for Animal {
        fn descriptor(&self) -> &'static TypeDescriptor {
            <Animal as Described>::descriptor()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl Described for Animal {
        fn descriptor() -> &'static TypeDescriptor {
            static DESC: OnceLock<TypeDescriptor> = OnceLock::new();
            DESC.get_or_init(|| {
                TypeDescriptor::builder::<Animal>("Animal", "com.example.model.Animal")
                    .scalar(
                        "name",
                        XsdType::String,
                        |a: &Animal| a.name.clone().map(ScalarValue::String),
                        |a: &mut Animal, v| {
                            if let ScalarValue::String(s) = v {
                                a.name = Some(s);
                            }
                        },
                    )
                    .build()
            })
        }
    }

    #[derive(Default)]
    struct Dog {
        owner: Option<SharedObject>,
    }

    impl DomainObject for Dog {
        fn descriptor(&self) -> &'static TypeDescriptor {
            <Dog as Described>::descriptor()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl Described for Dog {
        fn descriptor() -> &'static TypeDescriptor {
            static DESC: OnceLock<TypeDescriptor> = OnceLock::new();
            DESC.get_or_init(|| {
                TypeDescriptor::builder::<Dog>("Dog", "com.example.model.Dog")
                    .superclass(<Animal as Described>::descriptor)
                    .capability("Pet", "com.example.model.Pet")
                    .reference(
                        "owner",
                        <Animal as Described>::descriptor,
                        |d: &Dog| d.owner.clone(),
                        |d: &mut Dog, v| d.owner = Some(v),
                    )
                    .operation("bark")
                    .build()
            })
        }
    }

    fn namespace() -> Iri {
        Iri::new("http://example.org/ns/").expect("iri")
    }

    #[test]
    fn class_iri_and_property_iris_are_deterministic() {
        let builder = SchemaBuilder::new(namespace(), new_class_cache());
        let class = builder.class_for(<Dog as Described>::descriptor());
        assert_eq!(class.iri.as_str(), "http://example.org/ns/Dog");
        let owner = class.property("owner").expect("owner property");
        assert_eq!(owner.iri.as_str(), "http://example.org/ns/Dog/owner");
        assert!(matches!(owner.kind, SchemaPropertyKind::Object { .. }));
    }

    #[test]
    fn cache_returns_the_same_arc() {
        let builder = SchemaBuilder::new(namespace(), new_class_cache());
        let a = builder.class_for(<Animal as Described>::descriptor());
        let b = builder.class_for(<Animal as Described>::descriptor());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn ensure_in_model_attaches_superclass_chain() {
        let builder = SchemaBuilder::new(namespace(), new_class_cache());
        let mut model = GraphModel::new(namespace());
        builder.ensure_in_model(&mut model, <Dog as Described>::descriptor(), None);
        assert!(model
            .class(&Iri::new("http://example.org/ns/Dog").expect("iri"))
            .is_some());
        assert!(model
            .class(&Iri::new("http://example.org/ns/Animal").expect("iri"))
            .is_some());
    }

    #[test]
    fn capabilities_attach_markers_and_record_disjoints() {
        let builder =
            SchemaBuilder::new(namespace(), new_class_cache()).with_capabilities(true);
        let mut model = GraphModel::new(namespace());
        let mut sets = DisjointSets::new();
        builder.ensure_in_model(&mut model, <Dog as Described>::descriptor(), Some(&mut sets));
        assert!(model
            .class(&Iri::new("http://example.org/ns/Pet").expect("iri"))
            .is_some());
        assert_eq!(sets.marker_count(), 1);
    }

    #[test]
    fn operations_become_descriptive_string_properties() {
        let builder =
            SchemaBuilder::new(namespace(), new_class_cache()).with_operations(true);
        let class = builder.class_for(<Dog as Described>::descriptor());
        let bark = class.property("bark").expect("bark property");
        assert_eq!(
            bark.kind,
            SchemaPropertyKind::Datatype {
                range: XsdType::String
            }
        );
    }

    #[test]
    fn field_chain_includes_inherited_members() {
        let fields = field_chain(<Dog as Described>::descriptor());
        let names: Vec<&str> = fields.iter().map(|(_, f)| f.name).collect();
        assert_eq!(names, vec!["owner", "name"]);
    }

    #[test]
    fn disjoint_sets_emit_pairwise_assertions() {
        let mut sets = DisjointSets::new();
        let a = Iri::new("http://example.org/ns/A").expect("iri");
        let b = Iri::new("http://example.org/ns/B").expect("iri");
        let c = Iri::new("http://example.org/ns/C").expect("iri");
        sets.record("m", a.clone());
        sets.record("m", b.clone());
        sets.record("m", c.clone());
        let mut model = GraphModel::new(Iri::new("http://example.org/ns/").expect("iri"));
        sets.apply(&mut model);
        assert_eq!(model.disjoints().count(), 3);
    }
}
