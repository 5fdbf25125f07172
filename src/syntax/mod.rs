//! Text notations for rules and queries.
//!
//! Both notations share one tokenizer and one statement grammar:
//!
//! ```text
//! statement  := subject predicate object (',' object)* (';' predicate object ...)*
//! term       := <iri> | prefix:local | ?var | _:label | [] | literal | a | true | false
//! object     := term | '{' statement ('.' statement)* '}'     (formulas, rules only)
//! ```
//!
//! The rule notation (`inference::rule`) and the query notation (`query`)
//! drive [`Parser`] with their own top-level productions.

pub mod lexer;

use std::collections::BTreeMap;

use crate::pattern::{PatternTerm, TriplePattern};
use crate::types::{Literal, Term};
use crate::vocab::{DEFAULT_PREFIXES, RDF_TYPE, XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER};

pub use lexer::{tokenize, Spanned, Token};

/// A syntax error with its source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct SyntaxError {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    /// What went wrong.
    pub message: String,
}

impl SyntaxError {
    /// Create a new syntax error.
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Object position of a parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedObject {
    /// A plain term.
    Term(PatternTerm),
    /// A quoted formula `{ ... }`.
    Formula(Vec<Statement>),
}

/// One parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Subject.
    pub subject: PatternTerm,
    /// Predicate.
    pub predicate: PatternTerm,
    /// Object.
    pub object: ParsedObject,
}

impl Statement {
    /// Convert to a triple pattern; formulas are rejected.
    pub fn into_pattern(self) -> Result<TriplePattern, String> {
        match self.object {
            ParsedObject::Term(object) => Ok(TriplePattern::new(self.subject, self.predicate, object)),
            ParsedObject::Formula(_) => Err("formula not allowed in this position".to_string()),
        }
    }
}

/// Recursive-descent parser over a token stream.
pub struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
    prefixes: BTreeMap<String, String>,
    anonymous: usize,
}

impl Parser {
    /// Tokenize `input` and create a parser with the default prefixes declared.
    pub fn new(input: &str) -> Result<Self, SyntaxError> {
        let prefixes = DEFAULT_PREFIXES
            .iter()
            .map(|(p, iri)| (p.to_string(), iri.to_string()))
            .collect();
        Ok(Self {
            tokens: tokenize(input)?,
            position: 0,
            prefixes,
            anonymous: 0,
        })
    }

    /// Peek at the next token.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|s| &s.token)
    }

    /// Whether all input was consumed.
    pub fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// Consume and return the next token.
    pub fn next(&mut self) -> Result<Token, SyntaxError> {
        match self.tokens.get(self.position) {
            Some(spanned) => {
                self.position += 1;
                Ok(spanned.token.clone())
            }
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// Build an error at the current token.
    pub fn error(&self, message: impl Into<String>) -> SyntaxError {
        let (line, column) = self
            .tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|s| (s.line, s.column))
            .unwrap_or((1, 1));
        SyntaxError::new(line, column, message)
    }

    /// Consume the next token, requiring it to equal `expected`.
    pub fn expect(&mut self, expected: &Token) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(token) if token == expected => {
                self.position += 1;
                Ok(())
            }
            Some(other) => Err(self.error(format!("expected {:?}, found {:?}", expected, other))),
            None => Err(self.error(format!("expected {:?}, found end of input", expected))),
        }
    }

    /// Consume the next token if it equals `token`.
    pub fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consume the next token if it is the bare word `word`.
    pub fn eat_word(&mut self, word: &str) -> bool {
        if self.peek().map_or(false, |t| t.is_word(word)) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Parse the rest of a prefix declaration after `@prefix` / `PREFIX`.
    ///
    /// `terminated` requires the trailing `.` of the N3 form.
    pub fn parse_prefix_declaration(&mut self, terminated: bool) -> Result<(), SyntaxError> {
        let prefix = match self.next()? {
            Token::PrefixedName(prefix, local) if local.is_empty() => prefix,
            other => return Err(self.error(format!("expected prefix name, found {:?}", other))),
        };
        let iri = match self.next()? {
            Token::IriRef(iri) => iri,
            other => return Err(self.error(format!("expected IRI, found {:?}", other))),
        };
        self.prefixes.insert(prefix, iri);
        if terminated {
            self.expect(&Token::Dot)?;
        }
        Ok(())
    }

    /// Parse statements up to (not including) the closing `}`.
    pub fn parse_statements_until_brace(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => break,
                None => return Err(self.error("unterminated block, expected '}'")),
                Some(Token::Dot) => {
                    self.position += 1;
                    continue;
                }
                Some(_) => {}
            }
            if self.block_keyword_ahead() {
                break;
            }
            self.parse_statement(&mut statements)?;
            match self.peek() {
                Some(Token::Dot) => self.position += 1,
                Some(Token::RBrace) => break,
                _ if self.block_keyword_ahead() => break,
                Some(other) => {
                    return Err(self.error(format!("expected '.' or '}}', found {:?}", other)))
                }
                None => return Err(self.error("unterminated block, expected '}'")),
            }
        }
        Ok(statements)
    }

    /// Query-level keywords that start a nested group instead of a statement.
    fn block_keyword_ahead(&self) -> bool {
        self.peek()
            .map_or(false, |t| t.is_word("OPTIONAL") || t.is_word("FILTER"))
    }

    /// Parse one subject with its predicate-object list, appending to `out`.
    pub fn parse_statement(&mut self, out: &mut Vec<Statement>) -> Result<(), SyntaxError> {
        let subject = self.parse_term()?;
        loop {
            let predicate = self.parse_predicate()?;
            loop {
                let object = self.parse_object()?;
                out.push(Statement {
                    subject: subject.clone(),
                    predicate: predicate.clone(),
                    object,
                });
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            if !self.eat(&Token::Semicolon) {
                break;
            }
            // Allow a trailing ';' before the terminator.
            if matches!(self.peek(), Some(Token::Dot) | Some(Token::RBrace) | None) {
                break;
            }
        }
        Ok(())
    }

    fn parse_predicate(&mut self) -> Result<PatternTerm, SyntaxError> {
        if self.eat_word("a") {
            return Ok(PatternTerm::iri(RDF_TYPE));
        }
        let term = self.parse_term()?;
        if let PatternTerm::Constant(Term::Literal(_)) = term {
            return Err(self.error("literal in predicate position"));
        }
        Ok(term)
    }

    fn parse_object(&mut self) -> Result<ParsedObject, SyntaxError> {
        if self.eat(&Token::LBrace) {
            let statements = self.parse_statements_until_brace()?;
            self.expect(&Token::RBrace)?;
            return Ok(ParsedObject::Formula(statements));
        }
        Ok(ParsedObject::Term(self.parse_term()?))
    }

    /// Parse one term.
    pub fn parse_term(&mut self) -> Result<PatternTerm, SyntaxError> {
        let token = self.next()?;
        let term = match token {
            Token::IriRef(iri) => PatternTerm::Constant(Term::iri(iri)),
            Token::PrefixedName(prefix, local) => {
                PatternTerm::Constant(Term::iri(self.expand_prefixed(&prefix, &local)?))
            }
            Token::Variable(name) => PatternTerm::Variable(name),
            Token::BlankNode(label) => PatternTerm::Constant(Term::blank(label)),
            Token::LBracket => {
                self.expect(&Token::RBracket)?;
                self.anonymous += 1;
                PatternTerm::Constant(Term::blank(format!("anon{}", self.anonymous)))
            }
            Token::StringLit(lexical) => PatternTerm::Constant(Term::literal(self.finish_string(lexical)?)),
            Token::Integer(lexical) => PatternTerm::Constant(Term::literal(Literal::typed(lexical, XSD_INTEGER))),
            Token::Decimal(lexical) => PatternTerm::Constant(Term::literal(Literal::typed(lexical, XSD_DECIMAL))),
            Token::Double(lexical) => PatternTerm::Constant(Term::literal(Literal::typed(lexical, XSD_DOUBLE))),
            Token::Word(word) if word == "true" => PatternTerm::Constant(Term::literal(Literal::boolean(true))),
            Token::Word(word) if word == "false" => PatternTerm::Constant(Term::literal(Literal::boolean(false))),
            other => {
                self.position -= 1;
                return Err(self.error(format!("expected a term, found {:?}", other)));
            }
        };
        Ok(term)
    }

    fn finish_string(&mut self, lexical: String) -> Result<Literal, SyntaxError> {
        match self.peek().cloned() {
            Some(Token::LangTag(lang)) => {
                self.position += 1;
                Ok(Literal::lang_string(lexical, lang))
            }
            Some(Token::DatatypeMarker) => {
                self.position += 1;
                match self.parse_term()? {
                    PatternTerm::Constant(Term::Iri(datatype)) => Ok(Literal::typed(lexical, datatype)),
                    _ => Err(self.error("datatype must be an IRI")),
                }
            }
            _ => Ok(Literal::string(lexical)),
        }
    }

    fn expand_prefixed(&self, prefix: &str, local: &str) -> Result<String, SyntaxError> {
        match self.prefixes.get(prefix) {
            Some(namespace) => Ok(format!("{}{}", namespace, local)),
            None => Err(self.error(format!("undeclared prefix '{}:'", prefix))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_object_lists() {
        let mut parser = Parser::new("?x a untp:Claim ; untp:referenceCriteria ?a , ?b }").unwrap();
        let statements = parser.parse_statements_until_brace().unwrap();
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0].predicate, PatternTerm::iri(RDF_TYPE));
        assert_eq!(
            statements[2].object,
            ParsedObject::Term(PatternTerm::var("b"))
        );
    }

    #[test]
    fn test_declared_prefix() {
        let mut parser = Parser::new("@prefix ex: <http://ex.org/> . ex:a ex:b \"c\"@en }").unwrap();
        assert_eq!(parser.next().unwrap(), Token::AtPrefix);
        parser.parse_prefix_declaration(true).unwrap();
        let statements = parser.parse_statements_until_brace().unwrap();
        assert_eq!(statements[0].subject, PatternTerm::iri("http://ex.org/a"));
        assert_eq!(
            statements[0].object,
            ParsedObject::Term(PatternTerm::Constant(Term::literal(Literal::lang_string("c", "en"))))
        );
    }

    #[test]
    fn test_undeclared_prefix_fails() {
        let mut parser = Parser::new("nope:a ?p ?o }").unwrap();
        let err = parser.parse_statements_until_brace().unwrap_err();
        assert!(err.message.contains("undeclared prefix"));
    }

    #[test]
    fn test_formula_object() {
        let mut parser = Parser::new("?s log:notIncludes { ?x inf:verified true } }").unwrap();
        let statements = parser.parse_statements_until_brace().unwrap();
        match &statements[0].object {
            ParsedObject::Formula(inner) => assert_eq!(inner.len(), 1),
            other => panic!("expected formula, got {:?}", other),
        }
    }

    #[test]
    fn test_typed_literal() {
        let mut parser = Parser::new("\"5\"^^xsd:integer").unwrap();
        let term = parser.parse_term().unwrap();
        assert_eq!(term, PatternTerm::Constant(Term::literal(Literal::integer(5))));
    }
}
