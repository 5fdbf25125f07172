//! Graph storage backends.

pub mod memory;

use crate::types::{Quad, Term};

/// Read access to a set of quads.
///
/// Pattern matches see the union of all named graphs. Implementations must
/// return matches in a stable order (insertion order for the in-memory store).
pub trait QuadSource: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch every quad matching the pattern; `None` is a wildcard.
    fn match_pattern(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<Vec<Quad>, Self::Error>;

    /// Check whether any quad states the triple, in any graph.
    fn contains_triple(&self, subject: &Term, predicate: &Term, object: &Term) -> Result<bool, Self::Error> {
        Ok(!self
            .match_pattern(Some(subject), Some(predicate), Some(object))?
            .is_empty())
    }

    /// Number of quads.
    fn len(&self) -> usize;

    /// Check if the store holds no quads.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Append-only quad storage.
///
/// There is no update or delete: once added, a quad stays for the lifetime
/// of the store.
pub trait QuadStore: QuadSource {
    /// Append one quad. Duplicates are not collapsed.
    fn insert(&mut self, quad: Quad) -> Result<(), Self::Error>;

    /// Append many quads, returning how many were added.
    fn extend_quads(&mut self, quads: Vec<Quad>) -> Result<usize, Self::Error> {
        let count = quads.len();
        for quad in quads {
            self.insert(quad)?;
        }
        Ok(count)
    }
}

pub use memory::{InMemoryQuadStore, InMemoryError};
