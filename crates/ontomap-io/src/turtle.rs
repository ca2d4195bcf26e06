//! Turtle writer.
//!
//! Prefixed vocabulary, one subject block per class, property and individual.
//! Ordered lists use the collection shorthand `( ... )`, which parses back
//! into the same `rdf:first`/`rdf:rest` chains the N-Triples writer spells
//! out.

use std::fmt::Write as _;

use ontomap_model::{vocab, GraphModel, Individual, Iri, PropertyValue, SchemaPropertyKind, XsdType};

use crate::escape_literal;

pub fn write(model: &GraphModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "@prefix rdf: <{}> .", vocab::RDF);
    let _ = writeln!(out, "@prefix rdfs: <{}> .", vocab::RDFS);
    let _ = writeln!(out, "@prefix owl: <{}> .", vocab::OWL);
    let _ = writeln!(out, "@prefix xsd: <{}> .", vocab::XSD);
    out.push('\n');

    for class in model.classes() {
        let _ = writeln!(out, "<{}> a owl:Class ;", class.iri);
        let _ = write!(out, "    rdfs:label {}", string_literal(&class.label));
        if !class.comment.is_empty() {
            let _ = write!(
                out,
                " ;\n    rdfs:comment {}",
                string_literal(&class.comment)
            );
        }
        if let Some(superclass) = &class.superclass {
            let _ = write!(out, " ;\n    rdfs:subClassOf <{superclass}>");
        }
        for marker in &class.capabilities {
            let _ = write!(out, " ;\n    rdfs:subClassOf <{marker}>");
        }
        out.push_str(" .\n\n");

        for prop in &class.properties {
            let (prop_type, range) = match &prop.kind {
                SchemaPropertyKind::Datatype { range } => ("owl:DatatypeProperty", xsd_name(*range)),
                SchemaPropertyKind::Object { range } => ("owl:ObjectProperty", format!("<{range}>")),
                // The extra type keeps the 0..* list kind across a round trip.
                SchemaPropertyKind::List { range } => {
                    ("owl:ObjectProperty , rdf:List", format!("<{range}>"))
                }
            };
            let _ = writeln!(out, "<{}> a {prop_type} ;", prop.iri);
            let _ = writeln!(out, "    rdfs:label {} ;", string_literal(&prop.name));
            let _ = writeln!(out, "    rdfs:domain <{}> ;", prop.domain);
            let _ = writeln!(out, "    rdfs:range {range} .");
            out.push('\n');
        }
    }

    for (a, b) in model.disjoints() {
        let _ = writeln!(out, "<{a}> owl:disjointWith <{b}> .");
    }
    if model.disjoints().next().is_some() {
        out.push('\n');
    }

    for individual in model.individuals() {
        write_individual(&mut out, individual);
    }

    out
}

fn write_individual(out: &mut String, individual: &Individual) {
    let _ = write!(out, "<{}> a <{}>", individual.iri, individual.class);
    for (prop, value) in individual.properties() {
        let object = match value {
            PropertyValue::Literal(literal) => format!(
                "\"{}\"^^{}",
                escape_literal(&literal.lexical),
                xsd_name(literal.datatype)
            ),
            PropertyValue::Ref(target) => format!("<{target}>"),
            PropertyValue::List(elements) => collection(elements),
        };
        let _ = write!(out, " ;\n    <{prop}> {object}");
    }
    out.push_str(" .\n\n");
}

fn collection(elements: &[Iri]) -> String {
    if elements.is_empty() {
        return "()".to_string();
    }
    let mut text = String::from("(");
    for element in elements {
        let _ = write!(text, " <{element}>");
    }
    text.push_str(" )");
    text
}

fn string_literal(text: &str) -> String {
    format!("\"{}\"", escape_literal(text))
}

fn xsd_name(datatype: XsdType) -> String {
    match datatype {
        XsdType::String => "xsd:string",
        XsdType::Integer => "xsd:integer",
        XsdType::Double => "xsd:double",
        XsdType::Boolean => "xsd:boolean",
        XsdType::DateTime => "xsd:dateTime",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontomap_model::{Literal, SchemaClass};
    use std::sync::Arc;

    fn iri(text: &str) -> Iri {
        Iri::new(text).expect("iri")
    }

    #[test]
    fn writes_prefixes_and_subject_blocks() {
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
            iri("http://example.org/ns/Status/id"),
            PropertyValue::Literal(Literal::new("5", XsdType::Integer)),
        );
        model.insert_individual(ind).expect("insert");

        let text = write(&model);
        assert!(text.starts_with("@prefix rdf:"));
        assert!(text.contains("<http://example.org/ns/Status> a owl:Class ;"));
        assert!(text.contains("<http://example.org/ns/Status#5> a <http://example.org/ns/Status>"));
        assert!(text.contains("\"5\"^^xsd:integer"));
    }

    #[test]
    fn lists_use_collection_shorthand() {
        let mut model = GraphModel::new(iri("http://example.org/ns/"));
        model.attach_class(Arc::new(SchemaClass::new(
            iri("http://example.org/ns/Folder"),
            "Folder",
            "com.example.model.Folder",
        )));
        let mut ind = Individual::new(
            iri("http://example.org/ns/Folder#root"),
            iri("http://example.org/ns/Folder"),
        );
        ind.set_property(
            iri("http://example.org/ns/Folder/children"),
            PropertyValue::List(vec![
                iri("http://example.org/ns/Folder#a"),
                iri("http://example.org/ns/Folder#b"),
            ]),
        );
        model.insert_individual(ind).expect("insert");

        let text = write(&model);
        assert!(text
            .contains("( <http://example.org/ns/Folder#a> <http://example.org/ns/Folder#b> )"));
    }
}
