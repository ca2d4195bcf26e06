//! Textual boundary for graph models.
//!
//! Everything inside the engine works on `GraphModel`; this crate is where
//! models cross into and out of text. Formats:
//!
//! - N-Triples (`.nt`), read and write
//! - Turtle (`.ttl`), read and write
//! - Graphviz DOT (`.dot`), write-only exploration output
//!
//! Ordered members travel as `rdf:first`/`rdf:rest` chains on the wire and
//! come back as in-model lists.

pub mod dot;
pub mod ntriples;
pub mod rdf;
pub mod turtle;

use std::path::Path;
use thiserror::Error;

use ontomap_model::GraphModel;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported model format `{0}` (expected nt|ttl|dot)")]
    Unsupported(String),
    #[error("format `{0}` is write-only")]
    OneWay(&'static str),
    #[error("{message}")]
    Technical {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl IoError {
    pub(crate) fn technical(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Technical {
            message: message.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    NTriples,
    Turtle,
    Dot,
}

impl ModelFormat {
    pub fn parse(s: &str) -> Result<Self, IoError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nt" | "ntriples" => Ok(Self::NTriples),
            "ttl" | "turtle" => Ok(Self::Turtle),
            "dot" | "graphviz" => Ok(Self::Dot),
            other => Err(IoError::Unsupported(other.to_string())),
        }
    }

    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::parse(ext).ok()
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::NTriples => "nt",
            Self::Turtle => "ttl",
            Self::Dot => "dot",
        }
    }
}

/// Writes a model in the given format.
pub fn serialize(model: &GraphModel, format: ModelFormat) -> Result<String, IoError> {
    match format {
        ModelFormat::NTriples => Ok(ntriples::write(model)),
        ModelFormat::Turtle => Ok(turtle::write(model)),
        ModelFormat::Dot => Ok(dot::write(model)),
    }
}

/// Reads a model back from text. DOT is exploration output only.
pub fn deserialize(text: &str, format: ModelFormat) -> Result<GraphModel, IoError> {
    match format {
        ModelFormat::NTriples => rdf::read(text, rdf::RdfSyntax::NTriples),
        ModelFormat::Turtle => rdf::read(text, rdf::RdfSyntax::Turtle),
        ModelFormat::Dot => Err(IoError::OneWay("dot")),
    }
}

/// Escapes a literal's lexical form for N-Triples / Turtle quoting.
pub(crate) fn escape_literal(lexical: &str) -> String {
    let mut out = String::with_capacity(lexical.len());
    for c in lexical.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing_and_extensions() {
        assert_eq!(ModelFormat::parse("nt").expect("nt"), ModelFormat::NTriples);
        assert_eq!(
            ModelFormat::parse("Turtle").expect("ttl"),
            ModelFormat::Turtle
        );
        assert!(ModelFormat::parse("xml").is_err());
        assert_eq!(
            ModelFormat::from_path(Path::new("out/model.ttl")),
            Some(ModelFormat::Turtle)
        );
        assert_eq!(ModelFormat::Dot.extension(), "dot");
    }

    #[test]
    fn dot_is_write_only() {
        assert!(matches!(
            deserialize("digraph {}", ModelFormat::Dot),
            Err(IoError::OneWay("dot"))
        ));
    }

    #[test]
    fn literal_escaping() {
        assert_eq!(escape_literal(r#"a "b" \c"#), r#"a \"b\" \\c"#);
        assert_eq!(escape_literal("line\nbreak"), "line\\nbreak");
    }
}
