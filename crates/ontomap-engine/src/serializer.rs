//! Export: walk a typed object graph into a `GraphModel`.
//!
//! Naming is idempotent per operation. Two memos back that up:
//!
//! - a visited map keyed by object address, so two handles to the same
//!   object produce one individual and cycles terminate, and
//! - the model itself, so an object whose IRI is already present is not
//!   serialized twice.
//!
//! Depth is a budget counted down per reference hop; a hop past the budget
//! still yields an individual, just an empty one, so references stay
//! dereferenceable in the output.

use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use ontomap_model::{
    property_iri, AnonymousIdPolicy, FieldAccess, GraphModel, IdentityResolver, Individual, Iri,
    PropertyValue, SharedObject,
};

use crate::context::OverrideTables;
use crate::error::EngineError;
use crate::schema::{field_chain, DisjointSets, SchemaBuilder, SharedClassCache};

/// Knobs of one export operation.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Namespace every class, property and individual IRI hangs under.
    pub namespace: Iri,
    /// Reference hops to follow from the root before truncating.
    pub depth_budget: u32,
    /// To-one reference members to follow; references not listed here are
    /// omitted entirely. Collections are always followed.
    pub included_ref_props: BTreeSet<String>,
    /// Members to omit regardless of kind.
    pub excluded_props: BTreeSet<String>,
    /// Attach capability-marker classes and disjointness assertions.
    pub include_capabilities: bool,
    /// Expose operations as descriptive schema properties.
    pub include_operations: bool,
    pub anonymous_ids: AnonymousIdPolicy,
}

impl ExportOptions {
    #[must_use]
    pub fn new(namespace: Iri) -> Self {
        Self {
            namespace,
            depth_budget: 3,
            included_ref_props: BTreeSet::new(),
            excluded_props: BTreeSet::new(),
            include_capabilities: false,
            include_operations: false,
            anonymous_ids: AnonymousIdPolicy::default(),
        }
    }

    #[must_use]
    pub fn depth(mut self, budget: u32) -> Self {
        self.depth_budget = budget;
        self
    }

    #[must_use]
    pub fn follow_reference(mut self, member: impl Into<String>) -> Self {
        self.included_ref_props.insert(member.into());
        self
    }

    #[must_use]
    pub fn exclude(mut self, member: impl Into<String>) -> Self {
        self.excluded_props.insert(member.into());
        self
    }
}

/// Pending member values gathered under one borrow, resolved afterwards so
/// recursion never overlaps a live borrow of the parent.
enum Pending {
    Literal(Iri, ontomap_model::Literal),
    Reference(Iri, SharedObject),
    Collection(Iri, Vec<SharedObject>),
}

pub struct GraphSerializer {
    options: ExportOptions,
    schema: SchemaBuilder,
    identity: IdentityResolver,
    disjoints: DisjointSets,
    /// Keyed by object address; the handle is retained so the allocator
    /// cannot reuse the address while this memo is alive.
    visited: HashMap<*const (), (Iri, SharedObject)>,
    overrides: OverrideTables,
}

impl GraphSerializer {
    #[must_use]
    pub fn new(options: ExportOptions, cache: SharedClassCache) -> Self {
        let schema = SchemaBuilder::new(options.namespace.clone(), cache)
            .with_capabilities(options.include_capabilities)
            .with_operations(options.include_operations);
        let identity = IdentityResolver::new(options.anonymous_ids);
        Self {
            options,
            schema,
            identity,
            disjoints: DisjointSets::new(),
            visited: HashMap::new(),
            overrides: OverrideTables::new(),
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: OverrideTables) -> Self {
        self.overrides = overrides;
        self
    }

    /// Serializes one root object into the model and returns its IRI.
    ///
    /// A `None` root is not an error: it is logged and the model is left
    /// untouched.
    pub fn to_graph(
        &mut self,
        model: &mut GraphModel,
        root: Option<&SharedObject>,
    ) -> Result<Option<Iri>, EngineError> {
        let Some(root) = root else {
            debug!("nothing to serialize, root object is absent");
            return Ok(None);
        };
        let iri = self.serialize_object(model, root, i64::from(self.options.depth_budget))?;
        if self.options.include_capabilities {
            self.disjoints.apply(model);
        }
        Ok(iri)
    }

    fn serialize_object(
        &mut self,
        model: &mut GraphModel,
        object: &SharedObject,
        budget: i64,
    ) -> Result<Option<Iri>, EngineError> {
        let key = std::rc::Rc::as_ptr(object) as *const ();
        if let Some((known, _)) = self.visited.get(&key) {
            return Ok(Some(known.clone()));
        }

        let descriptor = object.borrow().descriptor();
        let class_iri = self.schema.class_iri(descriptor);
        if let Some(encode) = self.overrides.serialize_for(&class_iri) {
            let iri = encode(&*object.borrow(), model)?;
            if let Some(iri) = &iri {
                self.visited.insert(key, (iri.clone(), object.clone()));
            }
            return Ok(iri);
        }

        let class = self
            .schema
            .ensure_in_model(model, descriptor, Some(&mut self.disjoints));
        let iri = self.identity.individual_iri(&class.iri, &*object.borrow())?;

        if model.individual(&iri).is_some() {
            // Another handle to the same logical entity was exported already.
            self.visited.insert(key, (iri.clone(), object.clone()));
            return Ok(Some(iri));
        }

        // Shell first: cycles back to this object resolve to the IRI alone.
        model.insert_individual(Individual::new(iri.clone(), class.iri.clone()))?;
        self.visited.insert(key, (iri.clone(), object.clone()));

        if budget < 0 {
            // Past the depth budget the individual stays an empty stub.
            return Ok(Some(iri));
        }

        let pending = self.gather_members(object, descriptor)?;
        for item in pending {
            match item {
                Pending::Literal(prop, literal) => {
                    if let Some(ind) = model.individual_mut(&iri) {
                        ind.set_property(prop, PropertyValue::Literal(literal));
                    }
                }
                Pending::Reference(prop, child) => {
                    if let Some(child_iri) = self.serialize_object(model, &child, budget - 1)? {
                        if let Some(ind) = model.individual_mut(&iri) {
                            ind.set_property(prop, PropertyValue::Ref(child_iri));
                        }
                    }
                }
                Pending::Collection(prop, children) => {
                    let mut element_iris = Vec::with_capacity(children.len());
                    for child in &children {
                        if let Some(child_iri) = self.serialize_object(model, child, budget - 1)? {
                            element_iris.push(child_iri);
                        }
                    }
                    if let Some(ind) = model.individual_mut(&iri) {
                        ind.set_property(prop, PropertyValue::List(element_iris));
                    }
                }
            }
        }

        Ok(Some(iri))
    }

    /// Reads all member values under one shared borrow. Per-member accessor
    /// failures are logged and the member is skipped.
    fn gather_members(
        &self,
        object: &SharedObject,
        descriptor: &'static ontomap_model::TypeDescriptor,
    ) -> Result<Vec<Pending>, EngineError> {
        let guard = object.borrow();
        let mut pending = Vec::new();
        for (owner, field) in field_chain(descriptor) {
            if self.options.excluded_props.contains(field.name) {
                continue;
            }
            let owner_class = self.schema.class_iri(owner);
            let prop = property_iri(&owner_class, field.name);
            match &field.access {
                FieldAccess::Scalar { get, .. } => match get(&*guard) {
                    Ok(Some(value)) => pending.push(Pending::Literal(prop, value.to_literal())),
                    Ok(None) => {}
                    Err(e) => warn!(
                        type_name = descriptor.short_name(),
                        member = field.name,
                        error = %e,
                        "scalar member unreadable, skipping"
                    ),
                },
                FieldAccess::Reference { get, .. } => {
                    if !self.options.included_ref_props.contains(field.name) {
                        continue;
                    }
                    match get(&*guard) {
                        Ok(Some(child)) => pending.push(Pending::Reference(prop, child)),
                        Ok(None) => {}
                        Err(e) => warn!(
                            type_name = descriptor.short_name(),
                            member = field.name,
                            error = %e,
                            "reference member unreadable, skipping"
                        ),
                    }
                }
                FieldAccess::Collection { get, .. } => match get(&*guard) {
                    // Empty collections leave no trace in the model.
                    Ok(children) if children.is_empty() => {}
                    Ok(children) => pending.push(Pending::Collection(prop, children)),
                    Err(e) => warn!(
                        type_name = descriptor.short_name(),
                        member = field.name,
                        error = %e,
                        "collection member unreadable, skipping"
                    ),
                },
            }
        }
        Ok(pending)
    }
}

impl std::fmt::Debug for GraphSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSerializer")
            .field("options", &self.options)
            .field("visited", &self.visited.len())
            .finish()
    }
}
