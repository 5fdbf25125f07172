//! RDF terms for the trust graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vocab::{RDF_LANG_STRING, XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER, XSD_STRING};

/// A literal value with datatype and optional language tag.
///
/// Implements `Ord` so literals can key deterministic indexes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// Lexical form.
    pub lexical: String,
    /// Datatype IRI.
    pub datatype: String,
    /// Language tag (only for `rdf:langString`).
    pub language: Option<String>,
}

impl Literal {
    /// Create a typed literal.
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// Create an `xsd:string` literal.
    pub fn string(lexical: impl Into<String>) -> Self {
        Self::typed(lexical, XSD_STRING)
    }

    /// Create a language-tagged string.
    pub fn lang_string(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: RDF_LANG_STRING.to_string(),
            language: Some(language.into().to_lowercase()),
        }
    }

    /// Create an `xsd:boolean` literal.
    pub fn boolean(value: bool) -> Self {
        Self::typed(if value { "true" } else { "false" }, XSD_BOOLEAN)
    }

    /// Create an `xsd:integer` literal.
    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), XSD_INTEGER)
    }

    /// Create an `xsd:double` literal in canonical `1.5E0` form.
    pub fn double(value: f64) -> Self {
        Self::typed(canonical_double(value), XSD_DOUBLE)
    }

    /// Interpret as a boolean, if the literal is an `xsd:boolean`.
    pub fn as_bool(&self) -> Option<bool> {
        if self.datatype != XSD_BOOLEAN {
            return None;
        }
        match self.lexical.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

/// Canonical lexical form for `xsd:double`.
fn canonical_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let formatted = format!("{:E}", value);
    // `{:E}` renders 1.0 as "1E0"; the canonical form keeps one fraction digit.
    match formatted.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{}.0E{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

/// An RDF term: IRI, blank node, or literal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    /// Absolute (or document-relative, when no base was available) IRI.
    Iri(String),
    /// Blank node label, without the `_:` prefix.
    BlankNode(String),
    /// Literal value.
    Literal(Literal),
}

impl Term {
    /// Create an IRI term.
    pub fn iri(value: impl Into<String>) -> Self {
        Self::Iri(value.into())
    }

    /// Create a blank node term.
    pub fn blank(label: impl Into<String>) -> Self {
        Self::BlankNode(label.into())
    }

    /// Create a literal term.
    pub fn literal(literal: Literal) -> Self {
        Self::Literal(literal)
    }

    /// Parse an identifier as used by callers: `_:x` becomes a blank node,
    /// anything else an IRI.
    pub fn from_identifier(id: &str) -> Self {
        match id.strip_prefix("_:") {
            Some(label) => Self::BlankNode(label.to_string()),
            None => Self::Iri(id.to_string()),
        }
    }

    /// The identifier string for IRIs and blank nodes (`_:label`).
    ///
    /// Literals have no identity and return `None`.
    pub fn identifier(&self) -> Option<String> {
        match self {
            Self::Iri(iri) => Some(iri.clone()),
            Self::BlankNode(label) => Some(format!("_:{}", label)),
            Self::Literal(_) => None,
        }
    }

    /// The IRI, if this is an IRI term.
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// The literal, if this is a literal term.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Human-readable value: the IRI, `_:label`, or the literal's lexical form.
    pub fn value(&self) -> String {
        match self {
            Self::Literal(lit) => lit.lexical.clone(),
            other => other.identifier().unwrap_or_default(),
        }
    }

    /// Whether this term is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Whether this term is a literal `true` of type `xsd:boolean`.
    pub fn is_true(&self) -> bool {
        self.as_literal().and_then(Literal::as_bool) == Some(true)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{}>", iri),
            Self::BlankNode(label) => write!(f, "_:{}", label),
            Self::Literal(lit) => {
                write!(f, "\"{}\"", lit.lexical.replace('\\', "\\\\").replace('"', "\\\""))?;
                match &lit.language {
                    Some(lang) => write!(f, "@{}", lang),
                    None if lit.datatype == XSD_STRING => Ok(()),
                    None => write!(f, "^^<{}>", lit.datatype),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_double() {
        assert_eq!(Literal::double(1.5).lexical, "1.5E0");
        assert_eq!(Literal::double(1.0).lexical, "1.0E0");
        assert_eq!(Literal::double(1200.0).lexical, "1.2E3");
    }

    #[test]
    fn test_identifier_round_trip() {
        let blank = Term::from_identifier("_:b0");
        assert_eq!(blank, Term::blank("b0"));
        assert_eq!(blank.identifier().as_deref(), Some("_:b0"));

        let iri = Term::from_identifier("did:web:example.com");
        assert_eq!(iri.as_iri(), Some("did:web:example.com"));
        assert!(Term::literal(Literal::string("x")).identifier().is_none());
    }

    #[test]
    fn test_is_true() {
        assert!(Term::literal(Literal::boolean(true)).is_true());
        assert!(!Term::literal(Literal::boolean(false)).is_true());
        assert!(!Term::literal(Literal::string("true")).is_true());
    }

    #[test]
    fn test_display() {
        assert_eq!(Term::iri("urn:a").to_string(), "<urn:a>");
        assert_eq!(Term::literal(Literal::string("hi")).to_string(), "\"hi\"");
        assert_eq!(
            Term::literal(Literal::boolean(true)).to_string(),
            format!("\"true\"^^<{}>", XSD_BOOLEAN)
        );
    }
}
