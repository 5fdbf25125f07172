//! Quad type for the trust graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::term::Term;

/// A subject–predicate–object fact, optionally scoped to a named graph.
///
/// Implements `Ord` for deterministic ordering: (subject, predicate, object, graph).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quad {
    /// Subject (IRI or blank node).
    pub subject: Term,
    /// Predicate (IRI).
    pub predicate: Term,
    /// Object (any term).
    pub object: Term,
    /// Named graph, `None` for the shared view.
    pub graph: Option<Term>,
}

impl Quad {
    /// Create a quad in the given graph.
    pub fn new(subject: Term, predicate: Term, object: Term, graph: Option<Term>) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
        }
    }

    /// Create a quad in the shared view (no named graph).
    pub fn triple(subject: Term, predicate: Term, object: Term) -> Self {
        Self::new(subject, predicate, object, None)
    }

    /// Whether two quads state the same triple, ignoring the graph label.
    pub fn same_triple(&self, other: &Quad) -> bool {
        self.subject == other.subject
            && self.predicate == other.predicate
            && self.object == other.object
    }

    /// Copy of this quad with the graph label removed.
    pub fn without_graph(&self) -> Quad {
        Quad::triple(
            self.subject.clone(),
            self.predicate.clone(),
            self.object.clone(),
        )
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(graph) = &self.graph {
            write!(f, " {}", graph)?;
        }
        write!(f, " .")
    }
}
