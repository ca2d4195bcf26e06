//! In-memory semantic graph: schema vocabulary plus individuals.
//!
//! One `GraphModel` is owned by one export or import operation. Classes are
//! shared `Arc`s because their canonical copies live in a process-wide
//! registry (see `ontomap-engine`); individuals are operation-local.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;

use crate::iri::Iri;
use crate::vocab;

// ============================================================================
// Schema vocabulary
// ============================================================================

/// XSD datatype of a literal / scalar member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XsdType {
    String,
    Integer,
    Double,
    Boolean,
    DateTime,
}

impl XsdType {
    #[must_use]
    pub fn iri(self) -> &'static str {
        match self {
            XsdType::String => vocab::XSD_STRING,
            XsdType::Integer => vocab::XSD_INTEGER,
            XsdType::Double => vocab::XSD_DOUBLE,
            XsdType::Boolean => vocab::XSD_BOOLEAN,
            XsdType::DateTime => vocab::XSD_DATETIME,
        }
    }

    /// Maps a datatype IRI back to a typed tag; unknown datatypes degrade to
    /// plain strings rather than failing the whole parse.
    #[must_use]
    pub fn from_iri(iri: Option<&str>) -> XsdType {
        match iri {
            Some(vocab::XSD_INTEGER) => XsdType::Integer,
            Some(vocab::XSD_DOUBLE) => XsdType::Double,
            Some(vocab::XSD_BOOLEAN) => XsdType::Boolean,
            Some(vocab::XSD_DATETIME) => XsdType::DateTime,
            _ => XsdType::String,
        }
    }
}

/// Datatype, object, or ordered-list property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaPropertyKind {
    Datatype { range: XsdType },
    Object { range: Iri },
    List { range: Iri },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Single,
    /// 0..*; declared for every list property.
    Many,
}

/// A property owned by exactly one [`SchemaClass`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaProperty {
    pub iri: Iri,
    /// Member name on the domain type; the join key on import.
    pub name: String,
    pub domain: Iri,
    pub kind: SchemaPropertyKind,
    pub cardinality: Cardinality,
}

/// Deterministic property IRI: owner class IRI + `/` + member name.
#[must_use]
pub fn property_iri(class: &Iri, name: &str) -> Iri {
    let mut suffix = String::with_capacity(name.len() + 1);
    suffix.push('/');
    suffix.push_str(name);
    class.join(&suffix)
}

/// A named class mirroring one domain type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaClass {
    pub iri: Iri,
    /// Short type name.
    pub label: String,
    /// Fully-qualified source type name; recovered on import to resolve the
    /// local type.
    pub comment: String,
    /// Direct superclass, excluding the universal root.
    pub superclass: Option<Iri>,
    /// Capability-marker superclasses.
    pub capabilities: Vec<Iri>,
    pub properties: Vec<SchemaProperty>,
}

impl SchemaClass {
    #[must_use]
    pub fn new(iri: Iri, label: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            iri,
            label: label.into(),
            comment: comment.into(),
            superclass: None,
            capabilities: Vec::new(),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

// ============================================================================
// Individuals
// ============================================================================

/// A typed literal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    pub datatype: XsdType,
}

impl Literal {
    #[must_use]
    pub fn new(lexical: impl Into<String>, datatype: XsdType) -> Self {
        Self {
            lexical: lexical.into(),
            datatype,
        }
    }
}

/// Value side of one triple on an individual.
///
/// Externally tagged for serde: the `List` variant wraps a sequence, which
/// internal tagging cannot represent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Literal(Literal),
    /// Reference to another individual, by IRI.
    Ref(Iri),
    /// Ordered list of individual IRIs.
    List(Vec<Iri>),
}

/// A node for one object instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub iri: Iri,
    pub class: Iri,
    properties: Vec<(Iri, PropertyValue)>,
}

impl Individual {
    #[must_use]
    pub fn new(iri: Iri, class: Iri) -> Self {
        Self {
            iri,
            class,
            properties: Vec::new(),
        }
    }

    /// Sets a property value, replacing any previous value for the same
    /// property IRI (one value per property per individual).
    pub fn set_property(&mut self, property: Iri, value: PropertyValue) {
        if let Some(slot) = self.properties.iter_mut().find(|(p, _)| *p == property) {
            slot.1 = value;
        } else {
            self.properties.push((property, value));
        }
    }

    #[must_use]
    pub fn property(&self, property: &Iri) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v)
    }

    /// Looks a property up by its member name (the IRI tail).
    #[must_use]
    pub fn property_by_name(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(p, _)| p.local_name() == name)
            .map(|(_, v)| v)
    }

    pub fn properties(&self) -> impl Iterator<Item = &(Iri, PropertyValue)> {
        self.properties.iter()
    }

    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

// ============================================================================
// Model aggregate
// ============================================================================

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("individual `{0}` already exists in the model")]
    DuplicateIndividual(Iri),
    #[error("individual `{individual}` references unknown class `{class}`")]
    UnknownClass { individual: Iri, class: Iri },
}

/// The in-memory model of one operation: classes, individuals and
/// class-disjointness assertions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphModel {
    base: Iri,
    classes: BTreeMap<Iri, Arc<SchemaClass>>,
    individuals: BTreeMap<Iri, Individual>,
    disjoints: BTreeSet<(Iri, Iri)>,
}

impl GraphModel {
    #[must_use]
    pub fn new(base: Iri) -> Self {
        Self {
            base,
            classes: BTreeMap::new(),
            individuals: BTreeMap::new(),
            disjoints: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn base(&self) -> &Iri {
        &self.base
    }

    /// Attaches a class; returns false if it was already present.
    pub fn attach_class(&mut self, class: Arc<SchemaClass>) -> bool {
        match self.classes.entry(class.iri.clone()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(class);
                true
            }
        }
    }

    #[must_use]
    pub fn class(&self, iri: &Iri) -> Option<&Arc<SchemaClass>> {
        self.classes.get(iri)
    }

    pub fn classes(&self) -> impl Iterator<Item = &Arc<SchemaClass>> {
        self.classes.values()
    }

    /// Inserts an individual whose class must already be attached.
    pub fn insert_individual(&mut self, individual: Individual) -> Result<(), ModelError> {
        if !self.classes.contains_key(&individual.class) {
            return Err(ModelError::UnknownClass {
                individual: individual.iri.clone(),
                class: individual.class.clone(),
            });
        }
        if self.individuals.contains_key(&individual.iri) {
            return Err(ModelError::DuplicateIndividual(individual.iri));
        }
        self.individuals.insert(individual.iri.clone(), individual);
        Ok(())
    }

    #[must_use]
    pub fn individual(&self, iri: &Iri) -> Option<&Individual> {
        self.individuals.get(iri)
    }

    pub fn individual_mut(&mut self, iri: &Iri) -> Option<&mut Individual> {
        self.individuals.get_mut(iri)
    }

    pub fn individuals(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.values()
    }

    pub fn individuals_of<'a>(&'a self, class: &'a Iri) -> impl Iterator<Item = &'a Individual> {
        self.individuals.values().filter(move |i| i.class == *class)
    }

    /// Records a pairwise disjointness assertion (order-normalized).
    pub fn add_disjoint(&mut self, a: Iri, b: Iri) {
        if a == b {
            return;
        }
        let pair = if a < b { (a, b) } else { (b, a) };
        self.disjoints.insert(pair);
    }

    pub fn disjoints(&self) -> impl Iterator<Item = &(Iri, Iri)> {
        self.disjoints.iter()
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn individual_count(&self) -> usize {
        self.individuals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(text: &str) -> Iri {
        Iri::new(text).expect("valid iri")
    }

    fn demo_class() -> Arc<SchemaClass> {
        Arc::new(SchemaClass::new(
            iri("http://example.org/ns/Status"),
            "Status",
            "com.example.model.Status",
        ))
    }

    #[test]
    fn property_iri_is_deterministic() {
        let class = iri("http://example.org/ns/Status");
        assert_eq!(
            property_iri(&class, "label").as_str(),
            "http://example.org/ns/Status/label"
        );
    }

    #[test]
    fn individual_set_property_replaces_by_key() {
        let mut ind = Individual::new(
            iri("http://example.org/ns/Status#5"),
            iri("http://example.org/ns/Status"),
        );
        let prop = property_iri(&ind.class, "label");
        ind.set_property(
            prop.clone(),
            PropertyValue::Literal(Literal::new("OK", XsdType::String)),
        );
        ind.set_property(
            prop.clone(),
            PropertyValue::Literal(Literal::new("KO", XsdType::String)),
        );
        assert_eq!(ind.property_count(), 1);
        assert_eq!(
            ind.property(&prop),
            Some(&PropertyValue::Literal(Literal::new("KO", XsdType::String)))
        );
        assert!(ind.property_by_name("label").is_some());
    }

    #[test]
    fn model_rejects_duplicate_individuals() {
        let mut model = GraphModel::new(iri("http://example.org/ns/"));
        model.attach_class(demo_class());
        let ind = Individual::new(
            iri("http://example.org/ns/Status#5"),
            iri("http://example.org/ns/Status"),
        );
        model.insert_individual(ind.clone()).expect("first insert");
        assert_eq!(
            model.insert_individual(ind),
            Err(ModelError::DuplicateIndividual(iri(
                "http://example.org/ns/Status#5"
            )))
        );
    }

    #[test]
    fn model_rejects_individual_of_unknown_class() {
        let mut model = GraphModel::new(iri("http://example.org/ns/"));
        let ind = Individual::new(
            iri("http://example.org/ns/Status#5"),
            iri("http://example.org/ns/Status"),
        );
        assert!(matches!(
            model.insert_individual(ind),
            Err(ModelError::UnknownClass { .. })
        ));
    }

    #[test]
    fn model_round_trips_through_json() {
        let mut model = GraphModel::new(iri("http://example.org/ns/"));
        model.attach_class(demo_class());
        let json = serde_json::to_string(&model).expect("to json");
        let back: GraphModel = serde_json::from_str(&json).expect("from json");
        assert_eq!(back.class_count(), 1);
        assert_eq!(back.base(), model.base());
    }

    #[test]
    fn every_property_value_kind_survives_json() {
        let values = [
            PropertyValue::Literal(Literal::new("OK", XsdType::String)),
            PropertyValue::Ref(iri("http://example.org/ns/Status#5")),
            PropertyValue::List(vec![
                iri("http://example.org/ns/Status#5"),
                iri("http://example.org/ns/Status#6"),
            ]),
            PropertyValue::List(Vec::new()),
        ];
        for value in values {
            let json = serde_json::to_string(&value).expect("to json");
            let back: PropertyValue = serde_json::from_str(&json).expect("from json");
            assert_eq!(back, value);
        }
    }

    #[test]
    fn disjoint_pairs_are_normalized() {
        let mut model = GraphModel::new(iri("http://example.org/ns/"));
        let a = iri("http://example.org/ns/A");
        let b = iri("http://example.org/ns/B");
        model.add_disjoint(b.clone(), a.clone());
        model.add_disjoint(a.clone(), b.clone());
        model.add_disjoint(a.clone(), a.clone());
        assert_eq!(model.disjoints().count(), 1);
        assert_eq!(model.disjoints().next(), Some(&(a, b)));
    }
}
