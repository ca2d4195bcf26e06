//! IRI value object.
//!
//! A deliberately small validation surface: the engine only mints IRIs from
//! configured namespaces plus sanitized local parts, so the checks here guard
//! against the mistakes that actually happen (empty strings, whitespace,
//! missing scheme) rather than attempting full RFC 3987 conformance.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A validated IRI reference.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iri(String);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    #[error("IRI must not be empty")]
    Empty,
    #[error("IRI `{0}` contains whitespace")]
    Whitespace(String),
    #[error("IRI `{0}` has no scheme")]
    MissingScheme(String),
}

impl Iri {
    pub fn new(text: impl Into<String>) -> Result<Self, IriError> {
        let text = text.into();
        if text.is_empty() {
            return Err(IriError::Empty);
        }
        if text.chars().any(char::is_whitespace) {
            return Err(IriError::Whitespace(text));
        }
        if !text.contains(':') {
            return Err(IriError::MissingScheme(text));
        }
        Ok(Self(text))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends a local part, replacing characters that would corrupt the IRI.
    #[must_use]
    pub fn join(&self, suffix: &str) -> Iri {
        let mut out = self.0.clone();
        for c in suffix.chars() {
            if c.is_whitespace() || c == '<' || c == '>' || c == '"' {
                out.push('_');
            } else {
                out.push(c);
            }
        }
        Iri(out)
    }

    /// The fragment/path tail after the last `#` or `/`.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.0
            .rsplit(['#', '/'])
            .next()
            .unwrap_or(self.0.as_str())
    }

    /// Everything up to and including the last `#` or `/`.
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self.0.rfind(['#', '/']) {
            Some(pos) => &self.0[..=pos],
            None => self.0.as_str(),
        }
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Iri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_iris() {
        let iri = Iri::new("http://example.org/model/Status").expect("valid");
        assert_eq!(iri.local_name(), "Status");
        assert_eq!(iri.namespace(), "http://example.org/model/");
    }

    #[test]
    fn rejects_empty_whitespace_and_schemeless() {
        assert_eq!(Iri::new(""), Err(IriError::Empty));
        assert!(matches!(
            Iri::new("http://example.org/a b"),
            Err(IriError::Whitespace(_))
        ));
        assert!(matches!(Iri::new("no-scheme"), Err(IriError::MissingScheme(_))));
    }

    #[test]
    fn join_sanitizes_local_parts() {
        let base = Iri::new("http://example.org/ns/").expect("valid");
        let joined = base.join("Status#some id");
        assert_eq!(joined.as_str(), "http://example.org/ns/Status#some_id");
    }

    #[test]
    fn local_name_of_fragment_iri() {
        let iri = Iri::new("http://example.org/ns/Status#5").expect("valid");
        assert_eq!(iri.local_name(), "5");
    }
}
