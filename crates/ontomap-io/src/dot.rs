//! Graphviz DOT writer for eyeballing an exported model.
//!
//! Exploration output only; there is no reader for it. Individuals become
//! boxes labeled with class and identifier plus their literal values, object
//! references become labeled edges, list edges carry the element index.

use std::fmt::Write as _;

use ontomap_model::{GraphModel, PropertyValue};

pub fn write(model: &GraphModel) -> String {
    let mut out = String::new();
    out.push_str("digraph model {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, fontname=\"Helvetica\"];\n");

    for individual in model.individuals() {
        let class_name = individual.class.local_name();
        let mut label = format!("{class_name}\\n{}", escape(individual.iri.local_name()));
        for (prop, value) in individual.properties() {
            if let PropertyValue::Literal(literal) = value {
                let _ = write!(
                    label,
                    "\\n{} = {}",
                    escape(prop.local_name()),
                    escape(&literal.lexical)
                );
            }
        }
        let _ = writeln!(out, "  \"{}\" [label=\"{label}\"];", escape(individual.iri.as_str()));
    }

    for individual in model.individuals() {
        for (prop, value) in individual.properties() {
            match value {
                PropertyValue::Ref(target) => {
                    let _ = writeln!(
                        out,
                        "  \"{}\" -> \"{}\" [label=\"{}\"];",
                        escape(individual.iri.as_str()),
                        escape(target.as_str()),
                        escape(prop.local_name())
                    );
                }
                PropertyValue::List(elements) => {
                    for (i, element) in elements.iter().enumerate() {
                        let _ = writeln!(
                            out,
                            "  \"{}\" -> \"{}\" [label=\"{}[{i}]\"];",
                            escape(individual.iri.as_str()),
                            escape(element.as_str()),
                            escape(prop.local_name())
                        );
                    }
                }
                PropertyValue::Literal(_) => {}
            }
        }
    }

    out.push_str("}\n");
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontomap_model::{Individual, Iri, Literal, SchemaClass, XsdType};
    use std::sync::Arc;

    fn iri(text: &str) -> Iri {
        Iri::new(text).expect("iri")
    }

    #[test]
    fn renders_nodes_and_labeled_edges() {
        let mut model = GraphModel::new(iri("http://example.org/ns/"));
        model.attach_class(Arc::new(SchemaClass::new(
            iri("http://example.org/ns/Task"),
            "Task",
            "com.example.model.Task",
        )));
        let mut a = Individual::new(
            iri("http://example.org/ns/Task#1"),
            iri("http://example.org/ns/Task"),
        );
        a.set_property(
            iri("http://example.org/ns/Task/title"),
            PropertyValue::Literal(Literal::new("Ship it", XsdType::String)),
        );
        a.set_property(
            iri("http://example.org/ns/Task/blockedBy"),
            PropertyValue::Ref(iri("http://example.org/ns/Task#2")),
        );
        model.insert_individual(a).expect("insert a");
        model
            .insert_individual(Individual::new(
                iri("http://example.org/ns/Task#2"),
                iri("http://example.org/ns/Task"),
            ))
            .expect("insert b");

        let text = write(&model);
        assert!(text.starts_with("digraph model {"));
        assert!(text.contains("title = Ship it"));
        assert!(text.contains("[label=\"blockedBy\"]"));
    }
}
