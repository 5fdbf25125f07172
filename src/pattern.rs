//! Triple patterns and basic-graph-pattern solving.
//!
//! Shared by the inference engine (rule bodies) and the query layer (WHERE
//! clauses). Patterns are joined left to right in the order written, so the
//! discovery order of solutions follows the store's insertion order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::QuadSource;
use crate::types::{Quad, Term};

/// Variable bindings for one solution.
///
/// BTreeMap keeps iteration order stable for hashing.
pub type Bindings = BTreeMap<String, Term>;

/// A position in a triple pattern: a variable or a constant term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PatternTerm {
    /// Named variable (without the `?`).
    Variable(String),
    /// Constant term.
    Constant(Term),
}

impl PatternTerm {
    /// Variable shorthand.
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// IRI constant shorthand.
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Constant(Term::iri(iri))
    }

    /// Resolve against bindings: constants resolve to themselves, bound
    /// variables to their value, unbound variables to `None`.
    pub fn resolve(&self, bindings: &Bindings) -> Option<Term> {
        match self {
            Self::Variable(name) => bindings.get(name).cloned(),
            Self::Constant(term) => Some(term.clone()),
        }
    }

    /// The variable name, if this is a variable.
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            Self::Constant(_) => None,
        }
    }
}

/// A subject–predicate–object pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriplePattern {
    /// Subject position.
    pub subject: PatternTerm,
    /// Predicate position.
    pub predicate: PatternTerm,
    /// Object position.
    pub object: PatternTerm,
}

impl TriplePattern {
    /// Create a new pattern.
    pub fn new(subject: PatternTerm, predicate: PatternTerm, object: PatternTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Variables mentioned by this pattern, in position order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .filter_map(PatternTerm::as_variable)
    }

    /// Apply a transformation to every position.
    pub fn map_terms(&self, f: impl Fn(&PatternTerm) -> PatternTerm) -> Self {
        Self::new(f(&self.subject), f(&self.predicate), f(&self.object))
    }

    /// Instantiate as a triple. Returns `None` if any variable is unbound.
    pub fn instantiate(&self, bindings: &Bindings) -> Option<Quad> {
        Some(Quad::triple(
            self.subject.resolve(bindings)?,
            self.predicate.resolve(bindings)?,
            self.object.resolve(bindings)?,
        ))
    }

    /// Try to extend `bindings` so that this pattern matches `quad`.
    fn unify(&self, quad: &Quad, bindings: &Bindings) -> Option<Bindings> {
        let mut extended = bindings.clone();
        for (position, term) in [
            (&self.subject, &quad.subject),
            (&self.predicate, &quad.predicate),
            (&self.object, &quad.object),
        ] {
            match position {
                PatternTerm::Constant(expected) => {
                    if expected != term {
                        return None;
                    }
                }
                PatternTerm::Variable(name) => match extended.get(name) {
                    Some(bound) if bound != term => return None,
                    Some(_) => {}
                    None => {
                        extended.insert(name.clone(), term.clone());
                    }
                },
            }
        }
        Some(extended)
    }
}

/// Solve a conjunction of patterns, starting from `seed` bindings.
///
/// Returns every solution extending `seed`, in discovery order. Errors from
/// the underlying store propagate unchanged.
pub fn solve<S: QuadSource + ?Sized>(
    source: &S,
    patterns: &[TriplePattern],
    seed: Bindings,
) -> Result<Vec<Bindings>, S::Error> {
    let mut solutions = vec![seed];

    for pattern in patterns {
        let mut next = Vec::new();
        for bindings in &solutions {
            let subject = pattern.subject.resolve(bindings);
            let predicate = pattern.predicate.resolve(bindings);
            let object = pattern.object.resolve(bindings);

            let matches = source.match_pattern(subject.as_ref(), predicate.as_ref(), object.as_ref())?;
            next.extend(matches.iter().filter_map(|quad| pattern.unify(quad, bindings)));
        }
        if next.is_empty() {
            return Ok(Vec::new());
        }
        solutions = next;
    }

    Ok(solutions)
}

/// Check whether at least one solution extends `seed`.
pub fn exists<S: QuadSource + ?Sized>(
    source: &S,
    patterns: &[TriplePattern],
    seed: &Bindings,
) -> Result<bool, S::Error> {
    Ok(!solve(source, patterns, seed.clone())?.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryQuadStore, QuadStore};

    fn store() -> InMemoryQuadStore {
        let mut store = InMemoryQuadStore::new();
        for (s, p, o) in [
            ("urn:dpp", "urn:claim", "urn:c1"),
            ("urn:dpp", "urn:claim", "urn:c2"),
            ("urn:c1", "urn:criterion", "urn:k1"),
            ("urn:c2", "urn:criterion", "urn:k2"),
            ("urn:k1", "urn:self", "urn:k1"),
        ] {
            store.insert(Quad::triple(Term::iri(s), Term::iri(p), Term::iri(o))).unwrap();
        }
        store
    }

    #[test]
    fn test_join_in_discovery_order() {
        let patterns = vec![
            TriplePattern::new(PatternTerm::iri("urn:dpp"), PatternTerm::iri("urn:claim"), PatternTerm::var("c")),
            TriplePattern::new(PatternTerm::var("c"), PatternTerm::iri("urn:criterion"), PatternTerm::var("k")),
        ];
        let solutions = solve(&store(), &patterns, Bindings::new()).unwrap();
        assert_eq!(solutions.len(), 2);
        assert_eq!(solutions[0]["k"], Term::iri("urn:k1"));
        assert_eq!(solutions[1]["k"], Term::iri("urn:k2"));
    }

    #[test]
    fn test_repeated_variable_unifies() {
        let patterns = vec![TriplePattern::new(
            PatternTerm::var("x"),
            PatternTerm::var("p"),
            PatternTerm::var("x"),
        )];
        let solutions = solve(&store(), &patterns, Bindings::new()).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0]["x"], Term::iri("urn:k1"));
    }

    #[test]
    fn test_seed_constrains() {
        let mut seed = Bindings::new();
        seed.insert("c".into(), Term::iri("urn:c2"));
        let patterns = vec![TriplePattern::new(
            PatternTerm::var("c"),
            PatternTerm::iri("urn:criterion"),
            PatternTerm::var("k"),
        )];
        let solutions = solve(&store(), &patterns, seed).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0]["k"], Term::iri("urn:k2"));
    }

    #[test]
    fn test_no_patterns_yields_seed() {
        let solutions = solve(&store(), &[], Bindings::new()).unwrap();
        assert_eq!(solutions, vec![Bindings::new()]);
    }

    #[test]
    fn test_instantiate_requires_bound_variables() {
        let pattern = TriplePattern::new(PatternTerm::var("a"), PatternTerm::iri("urn:p"), PatternTerm::var("b"));
        let mut bindings = Bindings::new();
        bindings.insert("a".into(), Term::iri("urn:x"));
        assert!(pattern.instantiate(&bindings).is_none());
        bindings.insert("b".into(), Term::iri("urn:y"));
        assert!(pattern.instantiate(&bindings).is_some());
    }
}
