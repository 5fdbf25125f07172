//! Staged forward-chaining inference.
//!
//! Rule modules run once each, in ascending name order, against everything
//! loaded or derived so far:
//!
//! ```text
//! store ──▶ 00-a.n3 ──▶ merge ──▶ 10-b.n3 ──▶ merge ──▶ ... ──▶ enriched store
//! ```
//!
//! A later module sees an earlier module's output, never the reverse, which
//! is what makes negation (`log:notIncludes`) in later modules meaningful.
//! Within a module the rules are saturated: they run in rounds until a round
//! derives nothing new, bounded by [`InferenceConfig::max_rounds_per_module`].
//! The final, empty round counts towards the limit. Positive premises see the
//! module's own output as it grows; `log:notIncludes` sees only the module's
//! input, so a module cannot negate what it derives itself.
//!
//! A module's output is collected in an overlay and merged into the store
//! only if the whole module succeeds. Failures are logged, recorded in the
//! [`InferenceReport`], and do not stop the run.

pub mod rule;
pub mod source;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::pattern::{exists, solve, Bindings, PatternTerm};
use crate::store::{InMemoryQuadStore, QuadSource, QuadStore};
use crate::syntax::SyntaxError;
use crate::types::{Quad, Term};

pub use crate::config::InferenceConfig;
pub use rule::{compile_module, BodyAtom, CompiledModule, Rule};
pub use source::{
    BundledRules, DirectoryRuleSource, RuleModuleSource, RuleSource, RuleSourceError, StaticRuleSource,
};

/// Errors that fail a single rule module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    /// The module text does not parse.
    #[error("Syntax error at {0}")]
    Syntax(#[from] SyntaxError),

    /// A rule is malformed.
    #[error("Rule {rule}: {reason}")]
    InvalidRule {
        /// Rule index within the module.
        rule: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// A conclusion uses a variable no positive premise binds.
    #[error("Rule {rule}: variable ?{variable} in the conclusion is not bound by the premise")]
    UnboundHeadVariable {
        /// Rule index within the module.
        rule: usize,
        /// The unbound variable.
        variable: String,
    },

    /// A builtin is applied to an unbound variable.
    #[error("Rule {rule}: {builtin} argument ?{variable} is not bound")]
    UnboundBuiltinArgument {
        /// Rule index within the module.
        rule: usize,
        /// The builtin.
        builtin: String,
        /// The unbound variable.
        variable: String,
    },

    /// A ground fact is malformed.
    #[error("Invalid fact: {0}")]
    InvalidFact(String),

    /// The module kept deriving new statements.
    #[error("Module did not saturate within {0} rounds")]
    RoundLimitExceeded(usize),

    /// A rule produced a statement the store cannot hold.
    #[error("Derived statement rejected: {0}")]
    InvalidDerivation(String),

    /// Reading or writing the store failed.
    #[error("Store error: {0}")]
    StoreError(String),
}

impl InferenceError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::StoreError(e.to_string())
    }
}

/// What happened to one rule module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModuleOutcome {
    /// The module ran and its output was merged.
    Applied {
        /// Module name.
        module: String,
        /// New statements merged into the store.
        derived: usize,
        /// Saturation rounds used.
        rounds: usize,
    },
    /// The module failed; the store is unchanged by it.
    Failed {
        /// Module name.
        module: String,
        /// Error description.
        error: String,
    },
}

impl ModuleOutcome {
    /// Module name.
    pub fn module(&self) -> &str {
        match self {
            Self::Applied { module, .. } | Self::Failed { module, .. } => module,
        }
    }

    /// Whether the module failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-module outcomes of an inference run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceReport {
    /// Outcomes in execution (name) order.
    pub outcomes: Vec<ModuleOutcome>,
}

impl InferenceReport {
    /// Whether every module applied.
    pub fn is_complete(&self) -> bool {
        !self.outcomes.iter().any(ModuleOutcome::is_failed)
    }

    /// Failed modules.
    pub fn failures(&self) -> impl Iterator<Item = &ModuleOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    /// Total statements derived across modules.
    pub fn derived_total(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                ModuleOutcome::Applied { derived, .. } => *derived,
                ModuleOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// Outcome for a module by name.
    pub fn outcome(&self, module: &str) -> Option<&ModuleOutcome> {
        self.outcomes.iter().find(|o| o.module() == module)
    }
}

/// Output of one module, before merging.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDerivation {
    /// New statements, in derivation order.
    pub quads: Vec<Quad>,
    /// Saturation rounds used.
    pub rounds: usize,
}

/// The store plus a module's pending output.
struct Overlay<'a, S> {
    base: &'a S,
    derived: &'a InMemoryQuadStore,
}

impl<S: QuadSource> QuadSource for Overlay<'_, S> {
    type Error = InferenceError;

    fn match_pattern(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<Vec<Quad>, Self::Error> {
        let mut matches = self
            .base
            .match_pattern(subject, predicate, object)
            .map_err(InferenceError::from_store)?;
        matches.extend(self.derived.find(subject, predicate, object).cloned());
        Ok(matches)
    }

    fn len(&self) -> usize {
        self.base.len() + self.derived.len()
    }
}

/// Runs rule modules over a store.
#[derive(Debug, Clone, Default)]
pub struct InferenceEngine {
    config: InferenceConfig,
}

impl InferenceEngine {
    /// Create an engine.
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Run every module once, in name order, merging each module's output
    /// before the next one starts.
    pub fn run<S: QuadStore>(&self, store: &mut S, mut modules: Vec<RuleModuleSource>) -> InferenceReport {
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        let mut report = InferenceReport::default();

        for module in &modules {
            let result = self
                .apply_module(&*store, module)
                .and_then(|derivation| {
                    let rounds = derivation.rounds;
                    store
                        .extend_quads(derivation.quads)
                        .map(|derived| (derived, rounds))
                        .map_err(InferenceError::from_store)
                });

            let outcome = match result {
                Ok((derived, rounds)) => {
                    tracing::info!(module = %module.name, derived, rounds, "Applied rule module");
                    ModuleOutcome::Applied {
                        module: module.name.clone(),
                        derived,
                        rounds,
                    }
                }
                Err(e) => {
                    tracing::warn!(module = %module.name, error = %e, "Rule module failed, skipping");
                    ModuleOutcome::Failed {
                        module: module.name.clone(),
                        error: e.to_string(),
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        report
    }

    /// Compute a module's new statements without touching the store.
    pub fn apply_module<S: QuadSource>(
        &self,
        store: &S,
        module: &RuleModuleSource,
    ) -> Result<ModuleDerivation, InferenceError> {
        let compiled = compile_module(&module.name, &module.text)?;
        let mut derived = InMemoryQuadStore::new();

        for fact in &compiled.facts {
            let view = Overlay { base: store, derived: &derived };
            if !view.contains_triple(&fact.subject, &fact.predicate, &fact.object)? {
                derived
                    .insert(fact.clone())
                    .map_err(|e| InferenceError::InvalidDerivation(e.to_string()))?;
            }
        }

        let mut rounds = 0;
        loop {
            if rounds == self.config.max_rounds_per_module {
                return Err(InferenceError::RoundLimitExceeded(self.config.max_rounds_per_module));
            }
            rounds += 1;

            // Every rule in a round sees the same snapshot.
            let mut pending = Vec::new();
            let mut seen = BTreeSet::new();
            {
                let view = Overlay { base: store, derived: &derived };
                for rule in &compiled.rules {
                    for bindings in solutions(&view, store, rule)? {
                        for quad in rule.instantiate_head(&compiled.name, &bindings) {
                            if view.contains_triple(&quad.subject, &quad.predicate, &quad.object)? {
                                continue;
                            }
                            if seen.insert(quad.clone()) {
                                pending.push(quad);
                            }
                        }
                    }
                }
            }

            if pending.is_empty() {
                break;
            }
            for quad in pending {
                derived
                    .insert(quad)
                    .map_err(|e| InferenceError::InvalidDerivation(e.to_string()))?;
            }
        }

        Ok(ModuleDerivation {
            quads: derived.all_quads().to_vec(),
            rounds,
        })
    }
}

/// Solutions of a rule body: positive premises joined over `view`, then
/// filters applied. Negation is checked against `input` alone.
fn solutions<S: QuadSource>(
    view: &Overlay<'_, S>,
    input: &S,
    rule: &Rule,
) -> Result<Vec<Bindings>, InferenceError> {
    let candidates = solve(view, &rule.patterns(), Bindings::new())?;
    let mut accepted = Vec::new();

    'candidates: for bindings in candidates {
        for atom in &rule.body {
            let holds = match atom {
                BodyAtom::Match(_) => true,
                BodyAtom::NotIncludes(patterns) => {
                    !exists(input, patterns, &bindings).map_err(InferenceError::from_store)?
                }
                BodyAtom::Equal(left, right) => {
                    let (l, r) = operands(rule, "log:equalTo", left, right, &bindings)?;
                    l == r
                }
                BodyAtom::NotEqual(left, right) => {
                    let (l, r) = operands(rule, "log:notEqualTo", left, right, &bindings)?;
                    l != r
                }
            };
            if !holds {
                continue 'candidates;
            }
        }
        accepted.push(bindings);
    }

    Ok(accepted)
}

fn operands(
    rule: &Rule,
    builtin: &str,
    left: &PatternTerm,
    right: &PatternTerm,
    bindings: &Bindings,
) -> Result<(Term, Term), InferenceError> {
    let resolve = |operand: &PatternTerm| {
        operand
            .resolve(bindings)
            .ok_or_else(|| InferenceError::UnboundBuiltinArgument {
                rule: rule.index,
                builtin: builtin.to_string(),
                variable: operand.as_variable().unwrap_or_default().to_string(),
            })
    };
    Ok((resolve(left)?, resolve(right)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Literal;
    use crate::vocab::{INF_NS, INF_VERIFIED};

    fn iri(s: &str) -> Term {
        Term::iri(s)
    }

    fn inf(local: &str) -> Term {
        Term::iri(format!("{}{}", INF_NS, local))
    }

    fn store_with(triples: &[(&str, &str, &str)]) -> InMemoryQuadStore {
        let mut store = InMemoryQuadStore::new();
        for (s, p, o) in triples {
            store.insert(Quad::triple(iri(s), inf(p), iri(o))).unwrap();
        }
        store
    }

    fn module(name: &str, text: &str) -> RuleModuleSource {
        RuleModuleSource::new(name, text)
    }

    #[test]
    fn test_saturates_within_module() {
        let mut store = store_with(&[("urn:a", "next", "urn:b"), ("urn:b", "next", "urn:c")]);
        let report = InferenceEngine::default().run(
            &mut store,
            vec![module(
                "reach",
                "{ ?x inf:next ?y } => { ?x inf:reaches ?y } .\n\
                 { ?x inf:reaches ?y . ?y inf:next ?z } => { ?x inf:reaches ?z } .",
            )],
        );
        assert!(report.is_complete());
        assert!(store.has_triple(&iri("urn:a"), &inf("reaches"), &iri("urn:c")));
        assert_eq!(report.derived_total(), 3);
    }

    #[test]
    fn test_modules_run_in_name_order_once() {
        let mut store = store_with(&[("urn:c", "criterion", "urn:k")]);
        let modules = vec![
            module(
                "20-flag",
                "{ ?c inf:criterion ?k . ?s log:notIncludes { ?k inf:verified true } } => { ?c inf:flagged ?k } .",
            ),
            module("10-verify", "{ ?c inf:criterion ?k } => { ?k inf:verified true } ."),
        ];
        let report = InferenceEngine::default().run(&mut store, modules);

        assert_eq!(report.outcomes[0].module(), "10-verify");
        assert!(store.has_triple(&iri("urn:k"), &iri(INF_VERIFIED), &Term::literal(Literal::boolean(true))));
        // Negation ran after verification, so nothing is flagged.
        assert!(!store.has_triple(&iri("urn:c"), &inf("flagged"), &iri("urn:k")));
    }

    #[test]
    fn test_negation_ignores_same_module_output() {
        let mut store = store_with(&[("urn:c", "criterion", "urn:k")]);
        let report = InferenceEngine::default().run(
            &mut store,
            vec![module(
                "10-both",
                "{ ?c inf:criterion ?k } => { ?k inf:verified true } .\n\
                 { ?c inf:criterion ?k . ?s log:notIncludes { ?k inf:verified true } } => { ?c inf:flagged ?k } .",
            )],
        );

        assert!(report.is_complete());
        assert!(store.has_triple(&iri("urn:k"), &iri(INF_VERIFIED), &Term::literal(Literal::boolean(true))));
        // Nothing was verified before the module ran, so the negation holds.
        assert!(store.has_triple(&iri("urn:c"), &inf("flagged"), &iri("urn:k")));

        // Running it again: the negation now sees the verification.
        let mut rerun = store_with(&[("urn:c", "criterion", "urn:k")]);
        rerun
            .insert(Quad::triple(iri("urn:k"), iri(INF_VERIFIED), Term::literal(Literal::boolean(true))))
            .unwrap();
        InferenceEngine::default().run(
            &mut rerun,
            vec![module(
                "10-both",
                "{ ?c inf:criterion ?k . ?s log:notIncludes { ?k inf:verified true } } => { ?c inf:flagged ?k } .",
            )],
        );
        assert!(!rerun.has_triple(&iri("urn:c"), &inf("flagged"), &iri("urn:k")));
    }

    #[test]
    fn test_failed_module_leaves_store_unchanged_and_run_continues() {
        let mut store = store_with(&[("urn:a", "p", "urn:b")]);
        let before = store.len();
        let report = InferenceEngine::default().run(
            &mut store,
            vec![
                module("10-broken", "{ ?x inf:p ?y } => { ?x inf:q ?y "),
                module("20-unbound", "{ ?x inf:p ?y } => { ?x inf:q ?z } ."),
                module("30-ok", "{ ?x inf:p ?y } => { ?y inf:back ?x } ."),
            ],
        );

        assert_eq!(report.failures().count(), 2);
        assert!(matches!(report.outcome("30-ok"), Some(ModuleOutcome::Applied { derived: 1, .. })));
        assert_eq!(store.len(), before + 1);
    }

    #[test]
    fn test_round_limit_is_a_module_failure() {
        let mut store = store_with(&[("urn:a", "next", "urn:b")]);
        let engine = InferenceEngine::new(InferenceConfig { max_rounds_per_module: 4 });
        let before = store.len();
        let report = engine.run(
            &mut store,
            vec![module("runaway", "{ ?x inf:next ?y } => { ?y inf:next _:successor } .")],
        );

        match &report.outcomes[0] {
            ModuleOutcome::Failed { error, .. } => assert!(error.contains("4 rounds")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(store.len(), before);
    }

    #[test]
    fn test_rerun_derives_nothing() {
        let mut store = store_with(&[("urn:a", "p", "urn:b")]);
        let modules = vec![module("m", "{ ?x inf:p ?y } => { ?y inf:q _:n } .")];
        let engine = InferenceEngine::default();

        engine.run(&mut store, modules.clone());
        let after_first = store.len();
        let report = engine.run(&mut store, modules);
        assert_eq!(store.len(), after_first);
        assert_eq!(report.derived_total(), 0);
    }

    #[test]
    fn test_equality_builtins() {
        let mut store = store_with(&[("urn:a", "p", "urn:a"), ("urn:a", "p", "urn:b")]);
        InferenceEngine::default().run(
            &mut store,
            vec![module(
                "eq",
                "{ ?x inf:p ?y . ?x log:equalTo ?y } => { ?x inf:self ?y } .\n\
                 { ?x inf:p ?y . ?x log:notEqualTo ?y } => { ?x inf:other ?y } .",
            )],
        );
        assert!(store.has_triple(&iri("urn:a"), &inf("self"), &iri("urn:a")));
        assert!(!store.has_triple(&iri("urn:a"), &inf("self"), &iri("urn:b")));
        assert!(store.has_triple(&iri("urn:a"), &inf("other"), &iri("urn:b")));
    }

    #[test]
    fn test_module_facts_are_asserted_once() {
        let mut store = store_with(&[("urn:a", "p", "urn:b")]);
        let report = InferenceEngine::default().run(
            &mut store,
            vec![module("facts", "<urn:a> inf:p <urn:b> . <urn:x> inf:p <urn:y> .")],
        );
        assert_eq!(report.derived_total(), 1);
    }

    #[test]
    fn test_literal_subject_derivation_fails_module() {
        let mut store = InMemoryQuadStore::new();
        store
            .insert(Quad::triple(iri("urn:a"), inf("label"), Term::literal(Literal::string("x"))))
            .unwrap();
        let report = InferenceEngine::default().run(
            &mut store,
            vec![module("bad", "{ ?s inf:label ?l } => { ?l inf:of ?s } .")],
        );
        assert!(!report.is_complete());
        assert_eq!(store.len(), 1);
    }
}
