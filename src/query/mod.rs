//! Read-only queries over the enriched graph.
//!
//! Queries are written in a small SPARQL subset and parsed when executed:
//!
//! ```text
//! PREFIX ex: <http://example.org/>
//! SELECT DISTINCT ?claim ?topic WHERE {
//!   ?dpp untp:conformityClaim ?claim .
//!   OPTIONAL { ?claim untp:conformityTopic ?topic }
//!   FILTER NOT EXISTS { ?claim inf:verified true }
//! }
//! ```
//!
//! Triple blocks and `OPTIONAL` groups are evaluated in the order written;
//! `FILTER NOT EXISTS` applies to the whole group. Solutions keep discovery
//! order. Parse and store failures are returned, never swallowed.

pub mod products;

use std::collections::BTreeSet;

use crate::pattern::{exists, solve, Bindings, PatternTerm, TriplePattern};
use crate::store::QuadSource;
use crate::syntax::{Parser, Statement, SyntaxError, Token};
use crate::types::Term;

pub use products::{list_products, resolve_verifiers};

/// Query errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The query text does not parse.
    #[error("Query syntax error at {0}")]
    Syntax(#[from] SyntaxError),

    /// The query parses but is not supported.
    #[error("Invalid query: {0}")]
    Invalid(String),

    /// The store failed while matching.
    #[error("Store error: {0}")]
    StoreError(String),
}

impl QueryError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::StoreError(e.to_string())
    }
}

/// Variables returned by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `SELECT *`.
    All,
    /// `SELECT ?a ?b`.
    Variables(Vec<String>),
}

/// One element of a WHERE group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupElement {
    /// Required triple patterns.
    Triples(Vec<TriplePattern>),
    /// `OPTIONAL { ... }`.
    Optional(Vec<TriplePattern>),
    /// `FILTER NOT EXISTS { ... }`.
    NotExists(Vec<TriplePattern>),
}

/// A parsed SELECT query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    projection: Projection,
    distinct: bool,
    group: Vec<GroupElement>,
    seed: Bindings,
}

impl Query {
    /// Parse a query.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let mut parser = Parser::new(text)?;

        loop {
            if parser.eat_word("PREFIX") {
                parser.parse_prefix_declaration(false)?;
            } else if parser.eat(&Token::AtPrefix) {
                parser.parse_prefix_declaration(true)?;
            } else {
                break;
            }
        }

        if !parser.eat_word("SELECT") {
            return Err(parser.error("expected SELECT").into());
        }
        let distinct = parser.eat_word("DISTINCT");

        let projection = if parser.eat(&Token::Star) {
            Projection::All
        } else {
            let mut variables = Vec::new();
            while let Some(Token::Variable(name)) = parser.peek() {
                variables.push(name.clone());
                parser.next()?;
            }
            if variables.is_empty() {
                return Err(parser.error("expected '*' or variables after SELECT").into());
            }
            Projection::Variables(variables)
        };

        parser.eat_word("WHERE");
        parser.expect(&Token::LBrace)?;
        let group = parse_group(&mut parser)?;
        parser.expect(&Token::RBrace)?;

        if !parser.at_end() {
            return Err(parser.error("unexpected input after query").into());
        }

        Ok(Self {
            projection,
            distinct,
            group,
            seed: Bindings::new(),
        })
    }

    /// Pre-bind a variable before execution.
    pub fn with_binding(mut self, variable: impl Into<String>, value: Term) -> Self {
        self.seed.insert(variable.into(), value);
        self
    }

    /// The projection.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Run the query.
    pub fn execute<S: QuadSource + ?Sized>(&self, source: &S) -> Result<Vec<Bindings>, QueryError> {
        self.execute_from(source, self.seed.clone())
    }

    /// Run the query with extra pre-bound variables, leaving it reusable.
    pub fn execute_with<S: QuadSource + ?Sized>(
        &self,
        source: &S,
        bindings: &[(&str, &Term)],
    ) -> Result<Vec<Bindings>, QueryError> {
        let mut seed = self.seed.clone();
        for (variable, value) in bindings {
            seed.insert(variable.to_string(), (*value).clone());
        }
        self.execute_from(source, seed)
    }

    fn execute_from<S: QuadSource + ?Sized>(&self, source: &S, seed: Bindings) -> Result<Vec<Bindings>, QueryError> {
        let mut solutions = vec![seed];

        for element in &self.group {
            match element {
                GroupElement::Triples(patterns) => {
                    let mut next = Vec::new();
                    for bindings in solutions {
                        next.extend(solve(source, patterns, bindings).map_err(QueryError::from_store)?);
                    }
                    solutions = next;
                }
                GroupElement::Optional(patterns) => {
                    let mut next = Vec::new();
                    for bindings in solutions {
                        let extended = solve(source, patterns, bindings.clone()).map_err(QueryError::from_store)?;
                        if extended.is_empty() {
                            next.push(bindings);
                        } else {
                            next.extend(extended);
                        }
                    }
                    solutions = next;
                }
                GroupElement::NotExists(_) => {}
            }
        }

        for element in &self.group {
            if let GroupElement::NotExists(patterns) = element {
                let mut kept = Vec::new();
                for bindings in solutions {
                    if !exists(source, patterns, &bindings).map_err(QueryError::from_store)? {
                        kept.push(bindings);
                    }
                }
                solutions = kept;
            }
        }

        let projected = solutions.into_iter().map(|bindings| self.project(bindings));
        if !self.distinct {
            return Ok(projected.collect());
        }
        let mut seen = BTreeSet::new();
        Ok(projected.filter(|b| seen.insert(b.clone())).collect())
    }

    fn project(&self, bindings: Bindings) -> Bindings {
        match &self.projection {
            Projection::All => bindings,
            Projection::Variables(variables) => bindings
                .into_iter()
                .filter(|(name, _)| variables.contains(name))
                .collect(),
        }
    }
}

/// Parse a group body up to (not including) its closing `}`.
fn parse_group(parser: &mut Parser) -> Result<Vec<GroupElement>, QueryError> {
    let mut group = Vec::new();
    loop {
        if parser.eat_word("OPTIONAL") {
            group.push(GroupElement::Optional(parse_block(parser)?));
        } else if parser.eat_word("FILTER") {
            if !(parser.eat_word("NOT") && parser.eat_word("EXISTS")) {
                return Err(QueryError::Invalid("only FILTER NOT EXISTS is supported".to_string()));
            }
            group.push(GroupElement::NotExists(parse_block(parser)?));
        } else if matches!(parser.peek(), Some(Token::RBrace)) {
            return Ok(group);
        } else {
            let statements = parser.parse_statements_until_brace()?;
            if !statements.is_empty() {
                group.push(GroupElement::Triples(to_patterns(statements)?));
            }
        }
    }
}

fn parse_block(parser: &mut Parser) -> Result<Vec<TriplePattern>, QueryError> {
    parser.expect(&Token::LBrace)?;
    let statements = parser.parse_statements_until_brace()?;
    parser.expect(&Token::RBrace)?;
    parser.eat(&Token::Dot);
    to_patterns(statements)
}

/// Convert statements to patterns; blank nodes act as variables.
fn to_patterns(statements: Vec<Statement>) -> Result<Vec<TriplePattern>, QueryError> {
    statements
        .into_iter()
        .map(|statement| {
            statement
                .into_pattern()
                .map(|pattern| {
                    pattern.map_terms(|term| match term {
                        PatternTerm::Constant(Term::BlankNode(label)) => PatternTerm::var(format!("_:{}", label)),
                        other => other.clone(),
                    })
                })
                .map_err(QueryError::Invalid)
        })
        .collect()
}
