//! Where rule modules come from.
//!
//! The engine never looks for rules on its own; callers inject a
//! [`RuleSource`]. Three are provided: a fixed list, a directory of `*.n3`
//! files, and the rule set bundled with the crate.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// File extension of rule modules on disk.
pub const RULE_FILE_EXTENSION: &str = "n3";

/// The text of one rule module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleModuleSource {
    /// Module name; modules run in ascending name order.
    pub name: String,
    /// Rule text.
    pub text: String,
}

impl RuleModuleSource {
    /// Create a module from a name and its text.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Rule source errors.
#[derive(Debug, thiserror::Error)]
pub enum RuleSourceError {
    /// Reading a rule file or directory failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A rule file name is not valid UTF-8.
    #[error("Rule file name is not valid UTF-8: {0}")]
    InvalidName(PathBuf),
}

/// Supplies the rule modules for a run.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Fetch all modules. Order does not matter; the engine sorts by name.
    async fn modules(&self) -> Result<Vec<RuleModuleSource>, RuleSourceError>;
}

/// A fixed list of modules.
#[derive(Debug, Clone, Default)]
pub struct StaticRuleSource {
    modules: Vec<RuleModuleSource>,
}

impl StaticRuleSource {
    /// Create a source over the given modules.
    pub fn new(modules: Vec<RuleModuleSource>) -> Self {
        Self { modules }
    }

    /// Add a module.
    pub fn with_module(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.modules.push(RuleModuleSource::new(name, text));
        self
    }
}

#[async_trait]
impl RuleSource for StaticRuleSource {
    async fn modules(&self) -> Result<Vec<RuleModuleSource>, RuleSourceError> {
        Ok(self.modules.clone())
    }
}

/// Every `*.n3` file in a directory; the module name is the file name.
#[derive(Debug, Clone)]
pub struct DirectoryRuleSource {
    dir: PathBuf,
}

impl DirectoryRuleSource {
    /// Create a source reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory being read.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl RuleSource for DirectoryRuleSource {
    async fn modules(&self) -> Result<Vec<RuleModuleSource>, RuleSourceError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| RuleSourceError::Io { path, source }
        };

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_error(&self.dir))?;
        let mut modules = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(io_error(&self.dir))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RULE_FILE_EXTENSION) {
                continue;
            }
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| RuleSourceError::InvalidName(path.clone()))?
                .to_string();
            let text = tokio::fs::read_to_string(&path).await.map_err(io_error(&path))?;
            modules.push(RuleModuleSource { name, text });
        }

        modules.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!(dir = %self.dir.display(), modules = modules.len(), "Read rule modules");
        Ok(modules)
    }
}

/// The UNTP rule set shipped with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledRules;

impl BundledRules {
    /// The bundled modules, in name order.
    pub fn module_sources() -> Vec<RuleModuleSource> {
        vec![
            RuleModuleSource::new("00-attestation.n3", include_str!("../../rules/00-attestation.n3")),
            RuleModuleSource::new("10-criteria.n3", include_str!("../../rules/10-criteria.n3")),
            RuleModuleSource::new("20-unverified.n3", include_str!("../../rules/20-unverified.n3")),
            RuleModuleSource::new("30-claims.n3", include_str!("../../rules/30-claims.n3")),
        ]
    }
}

#[async_trait]
impl RuleSource for BundledRules {
    async fn modules(&self) -> Result<Vec<RuleModuleSource>, RuleSourceError> {
        Ok(Self::module_sources())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::rule::compile_module;

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticRuleSource::default().with_module("b", "").with_module("a", "");
        let modules = source.modules().await.unwrap();
        assert_eq!(modules.len(), 2);
    }

    #[tokio::test]
    async fn test_directory_source_reads_n3_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20-b.n3"), "# second").unwrap();
        std::fs::write(dir.path().join("10-a.n3"), "# first").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let modules = DirectoryRuleSource::new(dir.path()).modules().await.unwrap();
        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["10-a.n3", "20-b.n3"]);
        assert_eq!(modules[0].text, "# first");
    }

    #[tokio::test]
    async fn test_directory_source_missing_dir() {
        let result = DirectoryRuleSource::new("/definitely/not/here").modules().await;
        assert!(matches!(result, Err(RuleSourceError::Io { .. })));
    }

    #[test]
    fn test_bundled_rules_compile() {
        for module in BundledRules::module_sources() {
            let compiled = compile_module(&module.name, &module.text)
                .unwrap_or_else(|e| panic!("{} failed to compile: {}", module.name, e));
            assert!(!compiled.rules.is_empty(), "{} has no rules", module.name);
        }
    }
}
