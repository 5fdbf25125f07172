//! JSON-LD to quads, through `sophia_jsonld`.
//!
//! The document must already carry its contexts inline (see
//! [`super::context`]). Parser blank node labels are prefixed with the
//! document digest so labels never collide across documents.

use serde_json::Value;
use sophia_api::parser::QuadParser;
use sophia_api::quad::Quad as _;
use sophia_api::source::{QuadSource as _, StreamError};
use sophia_api::term::{Term as RdfTerm, TermKind};
use sophia_jsonld::JsonLdParser;

use super::LoadError;
use crate::types::{Literal, Quad, Term};

/// Convert a document with inline contexts to quads.
///
/// Quads of the default graph are labelled with `graph`; quads the document
/// places in a named graph of its own keep that name.
pub(crate) fn to_quads(document: &Value, graph: Option<&Term>, blank_prefix: &str) -> Result<Vec<Quad>, LoadError> {
    let text = serde_json::to_string(document).map_err(|e| LoadError::JsonLd(e.to_string()))?;
    let parser = JsonLdParser::new();
    let mut source = parser.parse_str(&text);

    let mut quads = Vec::new();
    let result = source.try_for_each_quad(|quad| {
        let subject = convert(quad.s(), blank_prefix)?;
        let predicate = convert(quad.p(), blank_prefix)?;
        let object = convert(quad.o(), blank_prefix)?;
        let graph = match quad.g() {
            Some(name) => Some(convert(name, blank_prefix)?),
            None => graph.cloned(),
        };
        quads.push(Quad::new(subject, predicate, object, graph));
        Ok::<_, LoadError>(())
    });

    match result {
        Ok(()) => Ok(quads),
        Err(StreamError::SourceError(e)) => Err(LoadError::JsonLd(e.to_string())),
        Err(StreamError::SinkError(e)) => Err(e),
    }
}

fn convert<T: RdfTerm>(term: T, blank_prefix: &str) -> Result<Term, LoadError> {
    let converted = match term.kind() {
        TermKind::Iri => term.iri().map(|iri| Term::iri(iri.as_str())),
        TermKind::BlankNode => term
            .bnode_id()
            .map(|id| Term::blank(format!("{}-{}", blank_prefix, id.as_str().trim_start_matches("_:")))),
        TermKind::Literal => literal(&term).map(Term::literal),
        _ => None,
    };
    converted.ok_or_else(|| LoadError::JsonLd("parser produced a term that is not an IRI, blank node or literal".to_string()))
}

fn literal<T: RdfTerm>(term: &T) -> Option<Literal> {
    let lexical = term.lexical_form()?.to_string();
    if let Some(tag) = term.language_tag() {
        return Some(Literal::lang_string(lexical, tag.as_str()));
    }
    term.datatype().map(|datatype| Literal::typed(lexical, datatype.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{RDF_FIRST, RDF_JSON, RDF_NIL, RDF_REST, RDF_TYPE, XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER};
    use serde_json::json;

    fn expand(document: Value) -> Vec<Quad> {
        to_quads(&document, None, "abc").unwrap()
    }

    fn objects<'q>(quads: &'q [Quad], predicate: &str) -> Vec<&'q Term> {
        quads
            .iter()
            .filter(|q| q.predicate == Term::iri(predicate))
            .map(|q| &q.object)
            .collect()
    }

    fn is_document_blank(term: &Term) -> bool {
        matches!(term, Term::BlankNode(label) if label.starts_with("abc-"))
    }

    #[test]
    fn test_simple_node() {
        let quads = expand(json!({
            "@context": {"@vocab": "https://ex/", "id": "@id", "type": "@type"},
            "id": "https://ex/thing",
            "type": "Thing",
            "label": "hello"
        }));
        assert_eq!(quads.len(), 2);
        assert_eq!(objects(&quads, RDF_TYPE), vec![&Term::iri("https://ex/Thing")]);
        assert_eq!(objects(&quads, "https://ex/label"), vec![&Term::literal(Literal::string("hello"))]);
        assert!(quads.iter().all(|q| q.subject == Term::iri("https://ex/thing")));
    }

    #[test]
    fn test_nested_node_gets_prefixed_blank() {
        let quads = expand(json!({
            "@context": {"@vocab": "https://ex/"},
            "@id": "https://ex/parent",
            "child": {"name": "kid"}
        }));
        let child = objects(&quads, "https://ex/child")[0];
        assert!(is_document_blank(child));
        assert!(quads.iter().any(|q| &q.subject == child));
    }

    #[test]
    fn test_native_literals() {
        let quads = expand(json!({
            "@context": {"@vocab": "https://ex/"},
            "@id": "https://ex/s",
            "flag": true,
            "count": 3,
            "ratio": 1.5
        }));
        let flag = objects(&quads, "https://ex/flag")[0].as_literal().unwrap();
        assert_eq!((flag.lexical.as_str(), flag.datatype.as_str()), ("true", XSD_BOOLEAN));
        let count = objects(&quads, "https://ex/count")[0].as_literal().unwrap();
        assert_eq!((count.lexical.as_str(), count.datatype.as_str()), ("3", XSD_INTEGER));
        let ratio = objects(&quads, "https://ex/ratio")[0].as_literal().unwrap();
        assert_eq!((ratio.lexical.as_str(), ratio.datatype.as_str()), ("1.5E0", XSD_DOUBLE));
    }

    #[test]
    fn test_undefined_terms_are_dropped() {
        let quads = expand(json!({
            "@context": {"known": "https://ex/known"},
            "@id": "https://ex/s",
            "known": 1,
            "unknown": 2
        }));
        assert_eq!(quads.len(), 1);
    }

    #[test]
    fn test_list_container() {
        let quads = expand(json!({
            "@context": {"steps": {"@id": "https://ex/steps", "@container": "@list"}},
            "@id": "https://ex/s",
            "steps": ["a", "b"]
        }));
        assert_eq!(objects(&quads, RDF_FIRST).len(), 2);
        assert!(objects(&quads, RDF_REST).contains(&&Term::iri(RDF_NIL)));
    }

    #[test]
    fn test_type_scoped_context_does_not_propagate() {
        let quads = expand(json!({
            "@context": {
                "@vocab": "https://ex/",
                "Credential": {"@id": "https://ex/Credential", "@context": {"issuer": {"@id": "https://vc/issuer", "@type": "@id"}}}
            },
            "@id": "https://ex/cred",
            "@type": "Credential",
            "issuer": "did:example:1",
            "subject": {"issuer": "plain"}
        }));
        assert_eq!(objects(&quads, "https://vc/issuer"), vec![&Term::iri("did:example:1")]);
        assert_eq!(objects(&quads, "https://ex/issuer"), vec![&Term::literal(Literal::string("plain"))]);
    }

    #[test]
    fn test_value_objects_and_language() {
        let quads = expand(json!({
            "@context": {"@vocab": "https://ex/", "@language": "en"},
            "@id": "https://ex/s",
            "title": "Hello",
            "when": {"@value": "2024-01-01", "@type": "http://www.w3.org/2001/XMLSchema#date"}
        }));
        let title = objects(&quads, "https://ex/title")[0].as_literal().unwrap();
        assert_eq!(title.language.as_deref(), Some("en"));
        let when = objects(&quads, "https://ex/when")[0].as_literal().unwrap();
        assert_eq!(when.datatype, "http://www.w3.org/2001/XMLSchema#date");
    }

    #[test]
    fn test_json_literal() {
        let quads = expand(json!({
            "@context": {"raw": {"@id": "https://ex/raw", "@type": "@json"}},
            "@id": "https://ex/s",
            "raw": {"@context": "https://unknown.example/ctx", "k": 1}
        }));
        let raw = objects(&quads, "https://ex/raw")[0].as_literal().unwrap();
        assert_eq!(raw.datatype, RDF_JSON);
        assert!(raw.lexical.contains("https://unknown.example/ctx"));
    }

    #[test]
    fn test_top_level_graph_container() {
        let quads = expand(json!({
            "@context": {"@vocab": "https://ex/"},
            "@graph": [
                {"@id": "https://ex/a", "p": 1},
                {"@id": "https://ex/b", "p": 2}
            ]
        }));
        assert_eq!(quads.len(), 2);
        assert!(quads.iter().all(|q| q.graph.is_none()));
    }

    #[test]
    fn test_default_graph_is_labelled() {
        let label = Term::iri("urn:graph:doc");
        let quads = to_quads(
            &json!({"@context": {"@vocab": "https://ex/"}, "@id": "https://ex/s", "p": 1}),
            Some(&label),
            "abc",
        )
        .unwrap();
        assert_eq!(quads[0].graph, Some(label));
    }

    #[test]
    fn test_document_blank_labels_are_relabelled() {
        let quads = expand(json!({
            "@context": {"@vocab": "https://ex/", "knows": {"@id": "https://ex/knows", "@type": "@id"}},
            "@id": "_:me",
            "knows": "_:me"
        }));
        assert_eq!(quads.len(), 1);
        assert!(is_document_blank(&quads[0].subject));
        assert_eq!(quads[0].subject, quads[0].object);
    }

    #[test]
    fn test_same_document_same_quads() {
        let document = json!({
            "@context": {"@vocab": "https://ex/"},
            "a": {"b": {"c": 1}},
            "d": [{"e": 2}, {"f": 3}]
        });
        assert_eq!(expand(document.clone()), expand(document));
    }

    #[test]
    fn test_invalid_document_is_rejected() {
        let result = to_quads(&json!({"@context": {"@vocab": 5}, "x": 1}), None, "abc");
        assert!(matches!(result, Err(LoadError::JsonLd(_))));
    }
}
