//! Rule module compilation.
//!
//! A module is a small N3 document: prefix declarations, rules
//! `{ body } => { head } .`, and ground facts. Compilation checks that every
//! conclusion variable is bound by a positive premise and that builtin
//! arguments are bound before they are tested.

use std::collections::BTreeSet;

use serde::Serialize;

use super::InferenceError;
use crate::canonical::canonical_hash_hex;
use crate::pattern::{Bindings, PatternTerm, TriplePattern};
use crate::syntax::{ParsedObject, Parser, Statement, Token};
use crate::types::{Quad, Term};
use crate::vocab::{LOG_EQUAL_TO, LOG_NOT_EQUAL_TO, LOG_NOT_INCLUDES};

/// Prefix given to variables that stand in for body blank nodes.
const BLANK_VARIABLE_PREFIX: &str = "_bnode_";

const BUILTINS: &[&str] = &[LOG_NOT_INCLUDES, LOG_EQUAL_TO, LOG_NOT_EQUAL_TO];

/// One premise of a rule body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyAtom {
    /// Triple pattern that must match.
    Match(TriplePattern),
    /// `log:notIncludes`: none of the patterns may match jointly.
    NotIncludes(Vec<TriplePattern>),
    /// `log:equalTo`.
    Equal(PatternTerm, PatternTerm),
    /// `log:notEqualTo`.
    NotEqual(PatternTerm, PatternTerm),
}

/// A compiled rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Position of the rule in its module (0-based).
    pub index: usize,
    /// Premises in source order.
    pub body: Vec<BodyAtom>,
    /// Conclusions; blank nodes here are skolemized per solution.
    pub head: Vec<TriplePattern>,
}

impl Rule {
    /// Positive premises, in source order.
    pub fn patterns(&self) -> Vec<TriplePattern> {
        self.body
            .iter()
            .filter_map(|atom| match atom {
                BodyAtom::Match(pattern) => Some(pattern.clone()),
                _ => None,
            })
            .collect()
    }

    /// Ground the head for one solution.
    ///
    /// Head blank nodes become `sk-<hash>` labels derived from the module,
    /// the rule, the blank label, and the solution, so re-running a rule on
    /// the same data names the same nodes.
    pub fn instantiate_head(&self, module: &str, bindings: &Bindings) -> Vec<Quad> {
        self.head
            .iter()
            .filter_map(|pattern| {
                pattern
                    .map_terms(|term| match term {
                        PatternTerm::Constant(Term::BlankNode(label)) => {
                            PatternTerm::Constant(Term::blank(skolem_label(module, self.index, label, bindings)))
                        }
                        other => other.clone(),
                    })
                    .instantiate(bindings)
            })
            .collect()
    }
}

#[derive(Serialize)]
struct SkolemKey<'a> {
    module: &'a str,
    rule: usize,
    label: &'a str,
    bindings: &'a Bindings,
}

fn skolem_label(module: &str, rule: usize, label: &str, bindings: &Bindings) -> String {
    let key = SkolemKey {
        module,
        rule,
        label,
        bindings,
    };
    format!("sk-{}", canonical_hash_hex(&key))
}

/// A parsed and validated rule module.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModule {
    /// Module name.
    pub name: String,
    /// Rules in source order.
    pub rules: Vec<Rule>,
    /// Ground facts asserted by the module.
    pub facts: Vec<Quad>,
}

/// Parse and validate a rule module.
pub fn compile_module(name: &str, text: &str) -> Result<CompiledModule, InferenceError> {
    let mut parser = Parser::new(text)?;
    let mut rules = Vec::new();
    let mut facts = Vec::new();

    while let Some(token) = parser.peek().cloned() {
        match token {
            Token::AtPrefix => {
                parser.next()?;
                parser.parse_prefix_declaration(true)?;
            }
            t if t.is_word("PREFIX") => {
                parser.next()?;
                parser.parse_prefix_declaration(false)?;
            }
            Token::LBrace => {
                parser.next()?;
                let body = parser.parse_statements_until_brace()?;
                parser.expect(&Token::RBrace)?;
                parser.expect(&Token::Implies)?;
                parser.expect(&Token::LBrace)?;
                let head = parser.parse_statements_until_brace()?;
                parser.expect(&Token::RBrace)?;
                parser.expect(&Token::Dot)?;
                rules.push(compile_rule(rules.len(), body, head)?);
            }
            _ => {
                let mut statements = Vec::new();
                parser.parse_statement(&mut statements)?;
                parser.expect(&Token::Dot)?;
                for statement in statements {
                    facts.push(compile_fact(name, statement)?);
                }
            }
        }
    }

    Ok(CompiledModule {
        name: name.to_string(),
        rules,
        facts,
    })
}

fn compile_rule(index: usize, body: Vec<Statement>, head: Vec<Statement>) -> Result<Rule, InferenceError> {
    let invalid = |reason: String| InferenceError::InvalidRule { rule: index, reason };

    let mut atoms = Vec::new();
    for statement in body {
        let builtin = match &statement.predicate {
            PatternTerm::Constant(Term::Iri(iri)) => BUILTINS.iter().copied().find(|b| *b == iri.as_str()),
            _ => None,
        };
        let atom = match (builtin, statement.object) {
            (Some(LOG_NOT_INCLUDES), ParsedObject::Formula(inner)) => {
                let mut patterns = Vec::new();
                for statement in inner {
                    patterns.push(body_pattern(statement).map_err(invalid)?);
                }
                BodyAtom::NotIncludes(patterns)
            }
            (Some(LOG_NOT_INCLUDES), ParsedObject::Term(_)) => {
                return Err(invalid("log:notIncludes needs a formula object".to_string()))
            }
            (Some(LOG_EQUAL_TO), ParsedObject::Term(object)) => {
                BodyAtom::Equal(blank_to_variable(&statement.subject), blank_to_variable(&object))
            }
            (Some(LOG_NOT_EQUAL_TO), ParsedObject::Term(object)) => {
                BodyAtom::NotEqual(blank_to_variable(&statement.subject), blank_to_variable(&object))
            }
            (_, object) => BodyAtom::Match(
                body_pattern(Statement {
                    subject: statement.subject,
                    predicate: statement.predicate,
                    object,
                })
                .map_err(invalid)?,
            ),
        };
        atoms.push(atom);
    }

    let mut conclusions = Vec::new();
    for statement in head {
        conclusions.push(statement.into_pattern().map_err(invalid)?);
    }

    let rule = Rule {
        index,
        body: atoms,
        head: conclusions,
    };
    validate(&rule)?;
    Ok(rule)
}

/// Body pattern with blank nodes turned into variables.
fn body_pattern(statement: Statement) -> Result<TriplePattern, String> {
    Ok(statement.into_pattern()?.map_terms(blank_to_variable))
}

fn blank_to_variable(term: &PatternTerm) -> PatternTerm {
    match term {
        PatternTerm::Constant(Term::BlankNode(label)) => {
            PatternTerm::Variable(format!("{}{}", BLANK_VARIABLE_PREFIX, label))
        }
        other => other.clone(),
    }
}

fn validate(rule: &Rule) -> Result<(), InferenceError> {
    let bound: BTreeSet<&str> = rule
        .body
        .iter()
        .filter_map(|atom| match atom {
            BodyAtom::Match(pattern) => Some(pattern),
            _ => None,
        })
        .flat_map(TriplePattern::variables)
        .collect();

    for pattern in &rule.head {
        for variable in pattern.variables() {
            if !bound.contains(variable) {
                return Err(InferenceError::UnboundHeadVariable {
                    rule: rule.index,
                    variable: variable.to_string(),
                });
            }
        }
    }

    for atom in &rule.body {
        let (builtin, operands) = match atom {
            BodyAtom::Equal(a, b) => ("log:equalTo", [a, b]),
            BodyAtom::NotEqual(a, b) => ("log:notEqualTo", [a, b]),
            _ => continue,
        };
        for operand in operands {
            if let Some(variable) = operand.as_variable() {
                if !bound.contains(variable) {
                    return Err(InferenceError::UnboundBuiltinArgument {
                        rule: rule.index,
                        builtin: builtin.to_string(),
                        variable: variable.to_string(),
                    });
                }
            }
        }
    }

    Ok(())
}

fn compile_fact(module: &str, statement: Statement) -> Result<Quad, InferenceError> {
    let pattern = statement
        .into_pattern()
        .map_err(InferenceError::InvalidFact)?;
    if let Some(variable) = pattern.variables().next() {
        return Err(InferenceError::InvalidFact(format!("variable ?{} in a ground fact", variable)));
    }

    // Fact blank nodes are scoped to the module.
    let scoped = pattern.map_terms(|term| match term {
        PatternTerm::Constant(Term::BlankNode(label)) => {
            PatternTerm::Constant(Term::blank(format!("{}-{}", canonical_hash_hex(&module), label)))
        }
        other => other.clone(),
    });
    scoped
        .instantiate(&Bindings::new())
        .ok_or_else(|| InferenceError::InvalidFact("fact is not ground".to_string()))
}
