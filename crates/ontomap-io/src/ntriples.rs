//! N-Triples writer.
//!
//! One triple per line, full IRIs, every literal carrying its datatype.
//! Ordered lists become `rdf:first`/`rdf:rest` blank-node chains; an empty
//! list collapses to `rdf:nil`.

use std::fmt::Write as _;

use ontomap_model::{vocab, GraphModel, Individual, Iri, PropertyValue, SchemaPropertyKind};

use crate::escape_literal;

pub fn write(model: &GraphModel) -> String {
    let mut out = String::new();
    let mut blank = BlankNodes::default();

    for class in model.classes() {
        triple(
            &mut out,
            &class.iri,
            vocab::RDF_TYPE,
            &format!("<{}>", vocab::OWL_CLASS),
        );
        triple(
            &mut out,
            &class.iri,
            vocab::RDFS_LABEL,
            &string_literal(&class.label),
        );
        if !class.comment.is_empty() {
            triple(
                &mut out,
                &class.iri,
                vocab::RDFS_COMMENT,
                &string_literal(&class.comment),
            );
        }
        if let Some(superclass) = &class.superclass {
            triple(
                &mut out,
                &class.iri,
                vocab::RDFS_SUBCLASS_OF,
                &iri_ref(superclass),
            );
        }
        for marker in &class.capabilities {
            triple(
                &mut out,
                &class.iri,
                vocab::RDFS_SUBCLASS_OF,
                &iri_ref(marker),
            );
        }
        for prop in &class.properties {
            let (prop_type, range) = match &prop.kind {
                SchemaPropertyKind::Datatype { range } => {
                    (vocab::OWL_DATATYPE_PROPERTY, format!("<{}>", range.iri()))
                }
                SchemaPropertyKind::Object { range } => {
                    (vocab::OWL_OBJECT_PROPERTY, iri_ref(range))
                }
                SchemaPropertyKind::List { range } => {
                    (vocab::OWL_OBJECT_PROPERTY, iri_ref(range))
                }
            };
            raw_triple(&mut out, &iri_ref(&prop.iri), vocab::RDF_TYPE, &format!("<{prop_type}>"));
            if matches!(prop.kind, SchemaPropertyKind::List { .. }) {
                // 0..* ordered member; the marker keeps the list kind across
                // a wire round trip.
                raw_triple(
                    &mut out,
                    &iri_ref(&prop.iri),
                    vocab::RDF_TYPE,
                    &format!("<{}>", vocab::RDF_LIST),
                );
            }
            triple(
                &mut out,
                &prop.iri,
                vocab::RDFS_LABEL,
                &string_literal(&prop.name),
            );
            triple(&mut out, &prop.iri, vocab::RDFS_DOMAIN, &iri_ref(&prop.domain));
            raw_triple(&mut out, &iri_ref(&prop.iri), vocab::RDFS_RANGE, &range);
        }
    }

    for (a, b) in model.disjoints() {
        triple(&mut out, a, vocab::OWL_DISJOINT_WITH, &iri_ref(b));
    }

    for individual in model.individuals() {
        write_individual(&mut out, individual, &mut blank);
    }

    out
}

fn write_individual(out: &mut String, individual: &Individual, blank: &mut BlankNodes) {
    triple(
        out,
        &individual.iri,
        vocab::RDF_TYPE,
        &iri_ref(&individual.class),
    );
    for (prop, value) in individual.properties() {
        match value {
            PropertyValue::Literal(literal) => {
                let object = format!(
                    "\"{}\"^^<{}>",
                    escape_literal(&literal.lexical),
                    literal.datatype.iri()
                );
                triple(out, &individual.iri, prop.as_str(), &object);
            }
            PropertyValue::Ref(target) => {
                triple(out, &individual.iri, prop.as_str(), &iri_ref(target));
            }
            PropertyValue::List(elements) if elements.is_empty() => {
                triple(
                    out,
                    &individual.iri,
                    prop.as_str(),
                    &format!("<{}>", vocab::RDF_NIL),
                );
            }
            PropertyValue::List(elements) => {
                let head = blank.next();
                triple(out, &individual.iri, prop.as_str(), &head);
                write_list_chain(out, head, elements, blank);
            }
        }
    }
}

fn write_list_chain(out: &mut String, head: String, elements: &[Iri], blank: &mut BlankNodes) {
    let mut current = head;
    for (i, element) in elements.iter().enumerate() {
        raw_triple(out, &current, vocab::RDF_FIRST, &iri_ref(element));
        let rest = if i + 1 == elements.len() {
            format!("<{}>", vocab::RDF_NIL)
        } else {
            blank.next()
        };
        raw_triple(out, &current, vocab::RDF_REST, &rest);
        current = rest;
    }
}

#[derive(Default)]
struct BlankNodes {
    counter: usize,
}

impl BlankNodes {
    fn next(&mut self) -> String {
        let label = format!("_:l{}", self.counter);
        self.counter += 1;
        label
    }
}

fn iri_ref(iri: &Iri) -> String {
    format!("<{iri}>")
}

fn string_literal(text: &str) -> String {
    format!("\"{}\"", escape_literal(text))
}

fn triple(out: &mut String, subject: &Iri, predicate: &str, object: &str) {
    raw_triple(out, &iri_ref(subject), predicate, object);
}

fn raw_triple(out: &mut String, subject: &str, predicate: &str, object: &str) {
    // Subject may be a blank node label, so it arrives preformatted.
    let _ = writeln!(out, "{subject} <{predicate}> {object} .");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontomap_model::{Literal, SchemaClass, XsdType};
    use std::sync::Arc;

    fn iri(text: &str) -> Iri {
        Iri::new(text).expect("iri")
    }

    fn model_with_status() -> GraphModel {
        let mut model = GraphModel::new(iri("http://example.org/ns/"));
        model.attach_class(Arc::new(SchemaClass::new(
            iri("http://example.org/ns/Status"),
            "Status",
            "com.example.model.Status",
        )));
        let mut ind = Individual::new(
            iri("http://example.org/ns/Status#5"),
            iri("http://example.org/ns/Status"),
        );
        ind.set_property(
            iri("http://example.org/ns/Status/label"),
            PropertyValue::Literal(Literal::new("Open", XsdType::String)),
        );
        model.insert_individual(ind).expect("insert");
        model
    }

    #[test]
    fn writes_type_and_literal_triples() {
        let text = write(&model_with_status());
        assert!(text.contains(
            "<http://example.org/ns/Status#5> \
             <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> \
             <http://example.org/ns/Status> ."
        ));
        assert!(text.contains(
            "<http://example.org/ns/Status/label> \
             \"Open\"^^<http://www.w3.org/2001/XMLSchema#string> ."
        ));
    }

    #[test]
    fn lists_become_first_rest_chains() {
        let mut model = GraphModel::new(iri("http://example.org/ns/"));
        model.attach_class(Arc::new(SchemaClass::new(
            iri("http://example.org/ns/Folder"),
            "Folder",
            "com.example.model.Folder",
        )));
        let mut root = Individual::new(
            iri("http://example.org/ns/Folder#root"),
            iri("http://example.org/ns/Folder"),
        );
        root.set_property(
            iri("http://example.org/ns/Folder/children"),
            PropertyValue::List(vec![
                iri("http://example.org/ns/Folder#a"),
                iri("http://example.org/ns/Folder#b"),
            ]),
        );
        model.insert_individual(root).expect("insert");

        let text = write(&model);
        assert!(text.contains("_:l0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#first> <http://example.org/ns/Folder#a> ."));
        assert!(text.contains("_:l0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#rest> _:l1 ."));
        assert!(text.contains("_:l1 <http://www.w3.org/1999/02/22-rdf-syntax-ns#rest> <http://www.w3.org/1999/02/22-rdf-syntax-ns#nil> ."));
    }
}
