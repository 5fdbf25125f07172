//! In-memory quad store.

use std::collections::BTreeMap;

use crate::types::{Quad, Term};
use super::{QuadSource, QuadStore};

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// A literal cannot be the subject of a statement.
    #[error("Literal in subject position: {0}")]
    LiteralSubject(Term),
    /// Predicates must be IRIs.
    #[error("Predicate must be an IRI: {0}")]
    InvalidPredicate(Term),
}

/// In-memory append-only quad store.
///
/// Quads live in a `Vec` in insertion order; BTreeMap indexes by subject,
/// predicate and object hold positions into it, so every lookup returns
/// matches in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuadStore {
    /// All quads, in insertion order.
    quads: Vec<Quad>,
    /// Subject -> positions.
    by_subject: BTreeMap<Term, Vec<usize>>,
    /// Predicate -> positions.
    by_predicate: BTreeMap<Term, Vec<usize>>,
    /// Object -> positions.
    by_object: BTreeMap<Term, Vec<usize>>,
}

impl InMemoryQuadStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate matching quads without cloning.
    pub fn find<'a>(
        &'a self,
        subject: Option<&'a Term>,
        predicate: Option<&'a Term>,
        object: Option<&'a Term>,
    ) -> impl Iterator<Item = &'a Quad> + 'a {
        // Drive the scan from the most selective bound position.
        let candidates: Option<&'a [usize]> = [
            subject.map(|s| Self::positions(&self.by_subject, s)),
            predicate.map(|p| Self::positions(&self.by_predicate, p)),
            object.map(|o| Self::positions(&self.by_object, o)),
        ]
        .into_iter()
        .flatten()
        .min_by_key(|positions| positions.len());

        let positions: Box<dyn Iterator<Item = usize> + 'a> = match candidates {
            Some(positions) => Box::new(positions.iter().copied()),
            None => Box::new(0..self.quads.len()),
        };

        positions
            .map(move |i| &self.quads[i])
            .filter(move |q| {
                subject.map_or(true, |s| &q.subject == s)
                    && predicate.map_or(true, |p| &q.predicate == p)
                    && object.map_or(true, |o| &q.object == o)
            })
    }

    fn positions<'a>(index: &'a BTreeMap<Term, Vec<usize>>, key: &Term) -> &'a [usize] {
        index.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check whether the triple is present in any graph.
    pub fn has_triple(&self, subject: &Term, predicate: &Term, object: &Term) -> bool {
        self.find(Some(subject), Some(predicate), Some(object)).next().is_some()
    }

    /// Get all quads, in insertion order.
    pub fn all_quads(&self) -> &[Quad] {
        &self.quads
    }

    /// Get the quads labelled with a named graph.
    pub fn quads_in_graph(&self, graph: &Term) -> Vec<&Quad> {
        self.quads
            .iter()
            .filter(|q| q.graph.as_ref() == Some(graph))
            .collect()
    }

    /// Get number of quads.
    pub fn num_quads(&self) -> usize {
        self.quads.len()
    }

    fn validate(quad: &Quad) -> Result<(), InMemoryError> {
        if quad.subject.is_literal() {
            return Err(InMemoryError::LiteralSubject(quad.subject.clone()));
        }
        if quad.predicate.as_iri().is_none() {
            return Err(InMemoryError::InvalidPredicate(quad.predicate.clone()));
        }
        Ok(())
    }
}

impl QuadSource for InMemoryQuadStore {
    type Error = InMemoryError;

    fn match_pattern(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<Vec<Quad>, Self::Error> {
        Ok(self.find(subject, predicate, object).cloned().collect())
    }

    fn contains_triple(&self, subject: &Term, predicate: &Term, object: &Term) -> Result<bool, Self::Error> {
        Ok(self.has_triple(subject, predicate, object))
    }

    fn len(&self) -> usize {
        self.quads.len()
    }
}

impl QuadStore for InMemoryQuadStore {
    fn insert(&mut self, quad: Quad) -> Result<(), Self::Error> {
        Self::validate(&quad)?;
        let position = self.quads.len();

        self.by_subject
            .entry(quad.subject.clone())
            .or_default()
            .push(position);
        self.by_predicate
            .entry(quad.predicate.clone())
            .or_default()
            .push(position);
        self.by_object
            .entry(quad.object.clone())
            .or_default()
            .push(position);

        self.quads.push(quad);
        Ok(())
    }
}
