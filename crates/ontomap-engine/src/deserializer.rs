//! Import: materialize typed objects back out of a `GraphModel`.
//!
//! The freshly instantiated object is registered in the identity cache
//! BEFORE its members are populated; a cycle back to it then resolves to the
//! very same handle instead of recursing forever.
//!
//! Unknown classes and unknown members are skipped at debug level: a model
//! produced by a newer schema must still import what this process can
//! understand.

use tracing::{debug, warn};

use ontomap_model::{
    ConfigError, FieldAccess, GraphModel, Individual, Iri, PropertyValue, ScalarValue,
    SharedObject,
};

use crate::context::ImportContext;
use crate::error::EngineError;
use crate::schema::field_chain;

#[derive(Debug, Default)]
pub struct GraphDeserializer;

impl GraphDeserializer {
    /// Materializes every individual the context can resolve a type for.
    pub fn materialize_all(
        model: &GraphModel,
        ctx: &mut ImportContext,
    ) -> Result<Vec<SharedObject>, EngineError> {
        let mut objects = Vec::new();
        for individual in model.individuals() {
            if let Some(object) = Self::from_individual(individual, model, ctx)? {
                objects.push(object);
            }
        }
        Ok(objects)
    }

    /// Materializes one individual, reusing the identity cache. Returns
    /// `None` when the individual's class cannot be mapped to a local type.
    pub fn from_individual(
        individual: &Individual,
        model: &GraphModel,
        ctx: &mut ImportContext,
    ) -> Result<Option<SharedObject>, EngineError> {
        if let Some(cached) = ctx.cached(&individual.iri) {
            return Ok(Some(cached));
        }

        // Overrides own their class entirely; the generic path never runs.
        if let Some(decode) = ctx.overrides().deserialize_for(&individual.class) {
            let object = decode(individual, model, ctx)?;
            ctx.insert(individual.iri.clone(), object.clone());
            return Ok(Some(object));
        }

        let Some(class) = model.class(&individual.class) else {
            debug!(
                individual = individual.iri.as_str(),
                class = individual.class.as_str(),
                "class not in model, skipping individual"
            );
            return Ok(None);
        };
        let Some(descriptor) = ctx.resolve_class(class) else {
            debug!(
                class = class.iri.as_str(),
                "no local type for class, skipping individual"
            );
            return Ok(None);
        };

        let Some(object) = descriptor.instantiate() else {
            return Err(EngineError::Config(ConfigError::NoFactory(
                descriptor.short_name().to_string(),
            )));
        };
        // Shell registration, before any member is touched.
        ctx.insert(individual.iri.clone(), object.clone());

        for (_, field) in field_chain(descriptor) {
            let Some(value) = individual.property_by_name(field.name) else {
                continue;
            };
            match (&field.access, value) {
                (FieldAccess::Scalar { datatype, set, .. }, PropertyValue::Literal(literal)) => {
                    let Some(set) = set else {
                        debug!(member = field.name, "read-only member, not populated");
                        continue;
                    };
                    match ScalarValue::parse(*datatype, &literal.lexical) {
                        Ok(parsed) => {
                            if let Err(e) = set(&mut *object.borrow_mut(), parsed) {
                                warn!(member = field.name, error = %e, "setter failed");
                            }
                        }
                        // Unparseable literal: the member keeps its zero value.
                        Err(e) => warn!(member = field.name, error = %e, "literal unparseable"),
                    }
                }
                (FieldAccess::Reference { set, .. }, PropertyValue::Ref(target)) => {
                    let Some(set) = set else {
                        debug!(member = field.name, "read-only member, not populated");
                        continue;
                    };
                    if let Some(child) = Self::resolve(target, model, ctx)? {
                        if let Err(e) = set(&mut *object.borrow_mut(), child) {
                            warn!(member = field.name, error = %e, "setter failed");
                        }
                    }
                }
                (FieldAccess::Collection { set, .. }, PropertyValue::List(targets)) => {
                    let Some(set) = set else {
                        debug!(member = field.name, "read-only member, not populated");
                        continue;
                    };
                    let mut elements = Vec::with_capacity(targets.len());
                    for target in targets {
                        if let Some(child) = Self::resolve(target, model, ctx)? {
                            elements.push(child);
                        }
                    }
                    if let Err(e) = set(&mut *object.borrow_mut(), elements) {
                        warn!(member = field.name, error = %e, "setter failed");
                    }
                }
                (access, _) => warn!(
                    member = field.name,
                    kind = access.kind_name(),
                    "property value does not match member kind, skipping"
                ),
            }
        }

        Ok(Some(object))
    }

    /// Resolves a referenced IRI: in-model individuals recurse, everything
    /// else falls back to the store.
    fn resolve(
        target: &Iri,
        model: &GraphModel,
        ctx: &mut ImportContext,
    ) -> Result<Option<SharedObject>, EngineError> {
        match model.individual(target) {
            Some(child) => Self::from_individual(child, model, ctx),
            None => ctx.resolve_reference(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::new_class_cache;
    use crate::serializer::{ExportOptions, GraphSerializer};
    use ontomap_model::{
        downcast, shared, Described, DomainObject, TypeCatalog, TypeDescriptor, XsdType,
    };
    use std::any::Any;
    use std::rc::Rc;
    use std::sync::OnceLock;

    #[derive(Default)]
    struct Node {
        name: Option<String>,
        next: Option<SharedObject>,
    }

    impl DomainObject for Node {
        fn descriptor(&self) -> &'static TypeDescriptor {
            <Node as Described>::descriptor()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl Described for Node {
        fn descriptor() -> &'static TypeDescriptor {
            static DESC: OnceLock<TypeDescriptor> = OnceLock::new();
            DESC.get_or_init(|| {
                TypeDescriptor::builder::<Node>("Node", "com.example.model.Node")
                    .factory(Node::default)
                    .scalar(
                        "name",
                        XsdType::String,
                        |n: &Node| n.name.clone().map(ontomap_model::ScalarValue::String),
                        |n: &mut Node, v| {
                            if let ontomap_model::ScalarValue::String(s) = v {
                                n.name = Some(s);
                            }
                        },
                    )
                    .reference(
                        "next",
                        <Node as Described>::descriptor,
                        |n: &Node| n.next.clone(),
                        |n: &mut Node, v| n.next = Some(v),
                    )
                    .identity("name")
                    .build()
            })
        }
    }

    fn namespace() -> Iri {
        Iri::new("http://example.org/ns/").expect("iri")
    }

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new("demo");
        catalog.register::<Node>();
        catalog
    }

    fn export_pair() -> GraphModel {
        let b = shared(Node {
            name: Some("b".into()),
            next: None,
        });
        let a = shared(Node {
            name: Some("a".into()),
            next: Some(b.clone()),
        });
        // Close the cycle.
        {
            let mut guard = b.borrow_mut();
            let node = ontomap_model::downcast_mut::<Node>(&mut *guard).expect("node");
            node.next = Some(a.clone());
        }
        let mut model = GraphModel::new(namespace());
        let options = ExportOptions::new(namespace())
            .depth(5)
            .follow_reference("next");
        let mut serializer = GraphSerializer::new(options, new_class_cache());
        serializer
            .to_graph(&mut model, Some(&a))
            .expect("export")
            .expect("iri");
        model
    }

    #[test]
    fn cyclic_pair_round_trips_to_two_objects() {
        let model = export_pair();
        let mut ctx = ImportContext::new(namespace(), catalog());
        let objects = GraphDeserializer::materialize_all(&model, &mut ctx).expect("import");
        assert_eq!(objects.len(), 2);
        assert_eq!(ctx.cache_len(), 2);

        let a_iri = namespace().join("Node#a");
        let a = ctx.cached(&a_iri).expect("a");
        let b = {
            let guard = a.borrow();
            let node = downcast::<Node>(&*guard).expect("node");
            node.next.clone().expect("a.next")
        };
        let back = {
            let guard = b.borrow();
            let node = downcast::<Node>(&*guard).expect("node");
            node.next.clone().expect("b.next")
        };
        // The cycle resolves to the same handle, not a copy.
        assert!(Rc::ptr_eq(&a, &back));
    }

    #[test]
    fn materializing_twice_reuses_the_cache() {
        let model = export_pair();
        let mut ctx = ImportContext::new(namespace(), catalog());
        let first = GraphDeserializer::materialize_all(&model, &mut ctx).expect("import");
        let second = GraphDeserializer::materialize_all(&model, &mut ctx).expect("import");
        assert_eq!(first.len(), second.len());
        assert_eq!(ctx.cache_len(), 2);
        assert!(Rc::ptr_eq(&first[0], &second[0]));
    }

    #[test]
    fn unknown_class_is_skipped() {
        let mut model = GraphModel::new(namespace());
        let foreign = std::sync::Arc::new(ontomap_model::SchemaClass::new(
            namespace().join("Alien"),
            "Alien",
            "com.example.model.Alien",
        ));
        model.attach_class(foreign);
        model
            .insert_individual(Individual::new(
                namespace().join("Alien#1"),
                namespace().join("Alien"),
            ))
            .expect("insert");

        let mut ctx = ImportContext::new(namespace(), catalog());
        let objects = GraphDeserializer::materialize_all(&model, &mut ctx).expect("import");
        assert!(objects.is_empty());
    }

    #[test]
    fn unparseable_literal_leaves_the_zero_value() {
        let mut model = GraphModel::new(namespace());
        let cache = new_class_cache();
        let builder = crate::schema::SchemaBuilder::new(namespace(), cache);
        builder.ensure_in_model(&mut model, <Node as Described>::descriptor(), None);

        let class_iri = namespace().join("Node");
        let mut ind = Individual::new(namespace().join("Node#x"), class_iri.clone());
        // "name" is a string member; feed it a Ref to force a kind mismatch,
        // and a bogus literal on a fresh individual for the parse path.
        ind.set_property(
            ontomap_model::property_iri(&class_iri, "name"),
            PropertyValue::Ref(namespace().join("Node#y")),
        );
        model.insert_individual(ind).expect("insert");

        let mut ctx = ImportContext::new(namespace(), catalog());
        let objects = GraphDeserializer::materialize_all(&model, &mut ctx).expect("import");
        assert_eq!(objects.len(), 1);
        let guard = objects[0].borrow();
        let node = downcast::<Node>(&*guard).expect("node");
        assert_eq!(node.name, None);
    }
}
