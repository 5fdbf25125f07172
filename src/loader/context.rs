//! Remote context resolution.
//!
//! The JSON-LD parser runs without a document loader of its own. Every remote
//! context a document names is fetched through the [`ContextResolver`] first
//! and then written into the document in place, so the parser only ever sees
//! embedded contexts.
//!
//! Values of terms typed `@json` are literals. A `@context` key inside one is
//! payload, never a context reference, so the walk does not descend into them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use serde_json::{Map, Value};

use super::{ContextError, ContextResolver, LoadError};

/// Whether `value` starts with an IRI scheme.
pub fn is_absolute_iri(value: &str) -> bool {
    static SCHEME: OnceLock<regex_lite::Regex> = OnceLock::new();
    SCHEME
        .get_or_init(|| {
            regex_lite::Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("scheme pattern is valid")
        })
        .is_match(value)
}

/// Remote contexts of one document, keyed by URL.
///
/// Each entry holds the `@context` member of the fetched context document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedContexts {
    contexts: BTreeMap<String, Value>,
    max_depth: usize,
}

impl ResolvedContexts {
    /// Fetch every remote context `document` needs, transitively.
    ///
    /// Contexts referenced from other remote contexts are followed up to
    /// `max_depth` levels. A context is only looked for once the contexts
    /// around it are known, so references inside `@json` values defined by
    /// a remote context are never fetched.
    pub async fn resolve<R: ContextResolver + ?Sized>(
        resolver: &R,
        document: &Value,
        max_depth: usize,
    ) -> Result<Self, LoadError> {
        let mut resolved = Self {
            contexts: BTreeMap::new(),
            max_depth,
        };

        for _ in 0..=max_depth {
            let pending = resolved.missing(document)?;
            if pending.is_empty() {
                return Ok(resolved);
            }
            for url in pending {
                let fetched = resolver.resolve(&url).await?;
                let context = fetched
                    .get("@context")
                    .cloned()
                    .ok_or_else(|| ContextError::Malformed { url: url.clone() })?;
                resolved.contexts.insert(url, context);
            }
        }

        if resolved.missing(document)?.is_empty() {
            Ok(resolved)
        } else {
            Err(ContextError::TooDeep(max_depth).into())
        }
    }

    /// Number of remote contexts fetched.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Check if the document needed no remote contexts.
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Whether the context at `url` was fetched.
    pub fn contains(&self, url: &str) -> bool {
        self.contexts.contains_key(url)
    }

    /// Copy of `document` with every remote context reference replaced by
    /// the context it names.
    pub fn inline(&self, document: &Value) -> Result<Value, LoadError> {
        let mut missing = Vec::new();
        let inlined = self.node(document, &BTreeSet::new(), &mut missing)?;
        match missing.into_iter().next() {
            Some(url) => Err(ContextError::NotFound(url).into()),
            None => Ok(inlined),
        }
    }

    fn missing(&self, document: &Value) -> Result<Vec<String>, LoadError> {
        let mut missing = Vec::new();
        self.node(document, &BTreeSet::new(), &mut missing)?;
        Ok(missing)
    }

    /// Walk node objects, inlining each `@context`.
    ///
    /// A node whose context is incomplete is returned as is: its children are
    /// visited once the missing contexts have been fetched.
    fn node(&self, value: &Value, opaque: &BTreeSet<String>, missing: &mut Vec<String>) -> Result<Value, LoadError> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| self.node(item, opaque, missing))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) if !map.contains_key("@value") => {
                let mut opaque = opaque.clone();
                let mut out = Map::new();

                if let Some(local) = map.get("@context") {
                    match self.context(local, 0, missing)? {
                        Some(context) => {
                            json_terms(&context, &mut opaque);
                            out.insert("@context".to_string(), context);
                        }
                        None => return Ok(value.clone()),
                    }
                }

                for (key, child) in map {
                    if key == "@context" {
                        continue;
                    }
                    let child = if opaque.contains(key) {
                        child.clone()
                    } else {
                        self.node(child, &opaque, missing)?
                    };
                    out.insert(key.clone(), child);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other.clone()),
        }
    }

    /// Inline one context value. `None` when a remote context is missing.
    fn context(&self, value: &Value, depth: usize, missing: &mut Vec<String>) -> Result<Option<Value>, LoadError> {
        match value {
            Value::String(url) => self.remote(url, depth, missing),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                let mut complete = true;
                for item in items {
                    match self.context(item, depth, missing)? {
                        Some(Value::Array(inner)) => out.extend(inner),
                        Some(other) => out.push(other),
                        None => complete = false,
                    }
                }
                Ok(complete.then_some(Value::Array(out)))
            }
            Value::Object(map) => {
                let mut out = Map::new();
                let mut complete = true;

                if let Some(import) = map.get("@import") {
                    let url = import
                        .as_str()
                        .ok_or_else(|| LoadError::InvalidContext("@import must be a string".to_string()))?;
                    match self.remote(url, depth, missing)? {
                        Some(Value::Object(imported)) => out = imported,
                        Some(_) => {
                            return Err(LoadError::InvalidContext(format!(
                                "imported context {} is not an object",
                                url
                            )))
                        }
                        None => complete = false,
                    }
                }

                for (key, definition) in map {
                    if key == "@import" {
                        continue;
                    }
                    let definition = match definition {
                        Value::Object(def) => match def.get("@context") {
                            Some(local) => {
                                let mut def = def.clone();
                                match self.context(local, depth, missing)? {
                                    Some(scoped) => {
                                        def.insert("@context".to_string(), scoped);
                                    }
                                    None => complete = false,
                                }
                                Value::Object(def)
                            }
                            None => Value::Object(def.clone()),
                        },
                        other => other.clone(),
                    };
                    out.insert(key.clone(), definition);
                }

                Ok(complete.then_some(Value::Object(out)))
            }
            other => Ok(Some(other.clone())),
        }
    }

    fn remote(&self, url: &str, depth: usize, missing: &mut Vec<String>) -> Result<Option<Value>, LoadError> {
        if depth >= self.max_depth {
            return Err(ContextError::TooDeep(self.max_depth).into());
        }
        match self.contexts.get(url) {
            Some(context) => self.context(context, depth + 1, missing),
            None => {
                if !missing.iter().any(|u| u == url) {
                    missing.push(url.to_string());
                }
                Ok(None)
            }
        }
    }
}

/// Collect terms typed `@json`, including those of scoped contexts.
fn json_terms(context: &Value, out: &mut BTreeSet<String>) {
    match context {
        Value::Array(items) => items.iter().for_each(|item| json_terms(item, out)),
        Value::Object(map) => {
            for (term, definition) in map {
                if let Value::Object(definition) = definition {
                    if definition.get("@type").and_then(Value::as_str) == Some("@json") {
                        out.insert(term.clone());
                    }
                    if let Some(scoped) = definition.get("@context") {
                        json_terms(scoped, out);
                    }
                }
            }
        }
        _ => {}
    }
}
