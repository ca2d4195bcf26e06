//! RDF reading: N-Triples / Turtle text back into a `GraphModel`.
//!
//! Sophia does the syntax work; terms are lifted out of their N-Triples
//! display form into a small statement model and assembled from there.
//! Assembly is tolerant by design: unknown vocabulary, unparseable terms and
//! dangling references are logged and dropped, because a model written by a
//! newer producer must still load.

use anyhow::{anyhow, Result};
use sophia::api::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use ontomap_model::{
    vocab, Cardinality, GraphModel, Individual, Iri, Literal, PropertyValue, SchemaClass,
    SchemaProperty, SchemaPropertyKind, XsdType,
};

use crate::IoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfSyntax {
    NTriples,
    Turtle,
}

// ============================================================================
// Statement model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum RdfNode {
    Iri(String),
    Blank(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RdfLiteral {
    lexical: String,
    datatype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RdfObject {
    Node(RdfNode),
    Literal(RdfLiteral),
}

#[derive(Debug, Clone)]
struct RdfStatement {
    subject: RdfNode,
    predicate: String,
    object: RdfObject,
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct RdfSinkError {
    message: String,
}

impl From<anyhow::Error> for RdfSinkError {
    fn from(value: anyhow::Error) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

// ============================================================================
// Term parsing (N-Triples display form)
// ============================================================================

fn unescape_rdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn parse_term_display(term: &str) -> Result<RdfObject> {
    let s = term.trim();

    if let Some(rest) = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok(RdfObject::Node(RdfNode::Iri(rest.to_string())));
    }

    if let Some(rest) = s.strip_prefix("_:") {
        return Ok(RdfObject::Node(RdfNode::Blank(rest.to_string())));
    }

    if s.starts_with('"') {
        let mut end_quote = None;
        let mut prev_was_escape = false;
        for (i, ch) in s.char_indices().skip(1) {
            if ch == '"' && !prev_was_escape {
                end_quote = Some(i);
                break;
            }
            prev_was_escape = ch == '\\' && !prev_was_escape;
            if ch != '\\' {
                prev_was_escape = false;
            }
        }
        let Some(end) = end_quote else {
            return Err(anyhow!("invalid literal term (missing closing quote): {s}"));
        };

        let lexical = unescape_rdf_string(&s[1..end]);
        let rest = s[end + 1..].trim();

        let mut datatype = None;
        if let Some(dt) = rest.strip_prefix("^^") {
            let dt = dt.trim();
            if let Some(dt_iri) = dt.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
                datatype = Some(dt_iri.to_string());
            } else if !dt.is_empty() {
                datatype = Some(dt.to_string());
            }
        }
        // Language tags are dropped; the model has no slot for them.

        return Ok(RdfObject::Literal(RdfLiteral { lexical, datatype }));
    }

    Err(anyhow!("unsupported RDF term form: {s}"))
}

fn parse_node_term_display(term: &str) -> Result<RdfNode> {
    match parse_term_display(term)? {
        RdfObject::Node(node) => Ok(node),
        RdfObject::Literal(_) => Err(anyhow!("expected IRI/blank node, got literal: {term}")),
    }
}

fn parse_statements(text: &str, syntax: RdfSyntax) -> Result<Vec<RdfStatement>> {
    let reader = std::io::BufReader::new(std::io::Cursor::new(text.as_bytes()));
    let mut out: Vec<RdfStatement> = Vec::new();

    let mut sink = |s: String, p: String, o: String| -> std::result::Result<(), RdfSinkError> {
        let subject = parse_node_term_display(&s).map_err(RdfSinkError::from)?;
        let predicate = parse_node_term_display(&p).map_err(RdfSinkError::from)?;
        let RdfNode::Iri(predicate) = predicate else {
            return Ok(());
        };
        let object = parse_term_display(&o).map_err(RdfSinkError::from)?;
        out.push(RdfStatement {
            subject,
            predicate,
            object,
        });
        Ok(())
    };

    match syntax {
        RdfSyntax::NTriples => {
            let mut parser = sophia::turtle::parser::nt::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| sink(t.s().to_string(), t.p().to_string(), t.o().to_string()))
                .map_err(|e| anyhow!("failed to parse N-Triples: {e}"))?;
        }
        RdfSyntax::Turtle => {
            let mut parser = sophia::turtle::parser::turtle::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| sink(t.s().to_string(), t.p().to_string(), t.o().to_string()))
                .map_err(|e| anyhow!("failed to parse Turtle: {e}"))?;
        }
    }

    Ok(out)
}

// ============================================================================
// Model assembly
// ============================================================================

pub fn read(text: &str, syntax: RdfSyntax) -> Result<GraphModel, IoError> {
    let statements = parse_statements(text, syntax)
        .map_err(|e| IoError::technical("failed to parse RDF input", e))?;
    assemble(&statements)
}

fn assemble(statements: &[RdfStatement]) -> Result<GraphModel, IoError> {
    let mut class_subjects: BTreeSet<String> = BTreeSet::new();
    let mut datatype_props: HashSet<String> = HashSet::new();
    let mut object_props: HashSet<String> = HashSet::new();
    let mut list_props: HashSet<String> = HashSet::new();
    let mut labels: HashMap<String, String> = HashMap::new();
    let mut comments: HashMap<String, String> = HashMap::new();
    let mut subclass_of: HashMap<String, Vec<String>> = HashMap::new();
    let mut domains: HashMap<String, String> = HashMap::new();
    let mut ranges: HashMap<String, String> = HashMap::new();
    let mut disjoints: Vec<(String, String)> = Vec::new();
    let mut typed: BTreeMap<String, String> = BTreeMap::new();
    let mut list_first: HashMap<String, String> = HashMap::new();
    let mut list_rest: HashMap<String, RdfNode> = HashMap::new();
    let mut by_subject: HashMap<String, Vec<&RdfStatement>> = HashMap::new();

    for stmt in statements {
        match (&stmt.subject, stmt.predicate.as_str(), &stmt.object) {
            (RdfNode::Iri(s), vocab::RDF_TYPE, RdfObject::Node(RdfNode::Iri(o))) => {
                match o.as_str() {
                    vocab::OWL_CLASS => {
                        class_subjects.insert(s.clone());
                    }
                    vocab::OWL_DATATYPE_PROPERTY => {
                        datatype_props.insert(s.clone());
                    }
                    vocab::OWL_OBJECT_PROPERTY => {
                        object_props.insert(s.clone());
                    }
                    vocab::RDF_LIST => {
                        list_props.insert(s.clone());
                    }
                    _ => {
                        typed.entry(s.clone()).or_insert_with(|| o.clone());
                    }
                }
            }
            (RdfNode::Iri(s), vocab::RDFS_LABEL, RdfObject::Literal(lit)) => {
                labels.insert(s.clone(), lit.lexical.clone());
            }
            (RdfNode::Iri(s), vocab::RDFS_COMMENT, RdfObject::Literal(lit)) => {
                comments.insert(s.clone(), lit.lexical.clone());
            }
            (RdfNode::Iri(s), vocab::RDFS_SUBCLASS_OF, RdfObject::Node(RdfNode::Iri(o))) => {
                subclass_of.entry(s.clone()).or_default().push(o.clone());
            }
            (RdfNode::Iri(s), vocab::RDFS_DOMAIN, RdfObject::Node(RdfNode::Iri(o))) => {
                domains.insert(s.clone(), o.clone());
            }
            (RdfNode::Iri(s), vocab::RDFS_RANGE, RdfObject::Node(RdfNode::Iri(o))) => {
                ranges.insert(s.clone(), o.clone());
            }
            (RdfNode::Iri(s), vocab::OWL_DISJOINT_WITH, RdfObject::Node(RdfNode::Iri(o))) => {
                disjoints.push((s.clone(), o.clone()));
            }
            (RdfNode::Blank(b), vocab::RDF_FIRST, RdfObject::Node(RdfNode::Iri(o))) => {
                list_first.insert(b.clone(), o.clone());
            }
            (RdfNode::Blank(b), vocab::RDF_REST, RdfObject::Node(node)) => {
                list_rest.insert(b.clone(), node.clone());
            }
            (RdfNode::Iri(s), _, _) => {
                by_subject.entry(s.clone()).or_default().push(stmt);
            }
            _ => debug!("unhandled blank-subject statement, skipping"),
        }
    }

    // The base is recovered from the first class namespace; a model without
    // classes gets a placeholder.
    let inferred = class_subjects
        .iter()
        .next()
        .and_then(|c| Iri::new(c.as_str()).ok())
        .and_then(|c| Iri::new(c.namespace()).ok());
    let base = match inferred {
        Some(base) => base,
        None => Iri::new("urn:ontomap:")
            .map_err(|e| IoError::technical("invalid base IRI", e.into()))?,
    };
    let mut model = GraphModel::new(base);

    // Classes, with their labels, comments and superclass assertions.
    let mut classes: BTreeMap<String, SchemaClass> = BTreeMap::new();
    for subject in &class_subjects {
        let Ok(iri) = Iri::new(subject.as_str()) else {
            warn!(class = subject.as_str(), "class IRI invalid, skipping");
            continue;
        };
        let label = labels
            .get(subject)
            .cloned()
            .unwrap_or_else(|| iri.local_name().to_string());
        let comment = comments.get(subject).cloned().unwrap_or_default();
        let mut class = SchemaClass::new(iri, label, comment);
        if let Some(parents) = subclass_of.get(subject) {
            let parents: Vec<Iri> = parents
                .iter()
                .filter_map(|p| Iri::new(p.as_str()).ok())
                .collect();
            // One superclass assertion reads back as the superclass; with
            // several there is no way to tell it from a capability marker.
            if parents.len() == 1 {
                class.superclass = parents.into_iter().next();
            } else {
                class.capabilities = parents;
            }
        }
        classes.insert(subject.clone(), class);
    }

    // Properties hang off their domain class.
    for (prop, is_datatype) in datatype_props
        .iter()
        .map(|p| (p, true))
        .chain(object_props.iter().map(|p| (p, false)))
    {
        let Some(domain) = domains.get(prop) else {
            debug!(property = prop.as_str(), "property has no domain, skipping");
            continue;
        };
        let Some(class) = classes.get_mut(domain) else {
            debug!(property = prop.as_str(), "property domain is not a class, skipping");
            continue;
        };
        let Ok(prop_iri) = Iri::new(prop.as_str()) else {
            continue;
        };
        let name = labels
            .get(prop)
            .cloned()
            .unwrap_or_else(|| prop_iri.local_name().to_string());
        let range = ranges.get(prop);
        let kind = if is_datatype {
            SchemaPropertyKind::Datatype {
                range: XsdType::from_iri(range.map(String::as_str)),
            }
        } else {
            let Some(range) = range.and_then(|r| Iri::new(r.as_str()).ok()) else {
                debug!(property = prop.as_str(), "object property has no range, skipping");
                continue;
            };
            if list_props.contains(prop) {
                SchemaPropertyKind::List { range }
            } else {
                SchemaPropertyKind::Object { range }
            }
        };
        let cardinality = match kind {
            SchemaPropertyKind::List { .. } => Cardinality::Many,
            _ => Cardinality::Single,
        };
        class.properties.push(SchemaProperty {
            iri: prop_iri,
            name,
            domain: class.iri.clone(),
            kind,
            cardinality,
        });
    }

    for class in classes.values() {
        model.attach_class(Arc::new(class.clone()));
    }

    // Individuals: everything typed by one of the declared classes.
    for (subject, class_iri) in &typed {
        if !classes.contains_key(class_iri) {
            debug!(
                individual = subject.as_str(),
                class = class_iri.as_str(),
                "type is not a declared class, skipping"
            );
            continue;
        }
        let (Ok(iri), Ok(class)) = (Iri::new(subject.as_str()), Iri::new(class_iri.as_str()))
        else {
            continue;
        };
        let mut individual = Individual::new(iri, class);
        for stmt in by_subject.get(subject).into_iter().flatten() {
            let Ok(prop) = Iri::new(stmt.predicate.as_str()) else {
                continue;
            };
            let value = match &stmt.object {
                RdfObject::Literal(lit) => PropertyValue::Literal(Literal::new(
                    lit.lexical.clone(),
                    XsdType::from_iri(lit.datatype.as_deref()),
                )),
                RdfObject::Node(RdfNode::Iri(target)) if target == vocab::RDF_NIL => {
                    PropertyValue::List(Vec::new())
                }
                RdfObject::Node(RdfNode::Iri(target)) => {
                    let Ok(target) = Iri::new(target.as_str()) else {
                        continue;
                    };
                    PropertyValue::Ref(target)
                }
                RdfObject::Node(RdfNode::Blank(head)) => {
                    PropertyValue::List(walk_list(head, &list_first, &list_rest))
                }
            };
            individual.set_property(prop, value);
        }
        if let Err(e) = model.insert_individual(individual) {
            warn!(error = %e, "dropping individual");
        }
    }

    for (a, b) in disjoints {
        if let (Ok(a), Ok(b)) = (Iri::new(a), Iri::new(b)) {
            model.add_disjoint(a, b);
        }
    }

    Ok(model)
}

/// Follows an `rdf:first`/`rdf:rest` chain from its head blank node.
fn walk_list(
    head: &str,
    first: &HashMap<String, String>,
    rest: &HashMap<String, RdfNode>,
) -> Vec<Iri> {
    let mut elements = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current = head.to_string();
    loop {
        if !seen.insert(current.clone()) {
            warn!("cyclic rdf list, truncating");
            break;
        }
        if let Some(element) = first.get(&current).and_then(|e| Iri::new(e.as_str()).ok()) {
            elements.push(element);
        }
        match rest.get(&current) {
            Some(RdfNode::Blank(next)) => current = next.clone(),
            Some(RdfNode::Iri(iri)) if iri != vocab::RDF_NIL => {
                warn!("rdf list rest is not nil, truncating");
                break;
            }
            _ => break,
        }
    }
    elements
}
