//! Page clustering by ordered glob rules

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::paths::PAGE_EXTENSION;

/// A configured cluster: a name and the glob patterns that select its pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRule {
    pub name: String,
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl ClusterRule {
    pub fn new(name: impl Into<String>, patterns: &[&str]) -> Self {
        ClusterRule {
            name: name.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Cluster name used for every node belonging to another project.
pub fn external_cluster_name(project: &str) -> String {
    format!("{project} (external)")
}

/// Strip a leading separator and the page extension.
pub fn normalize_page_path(page_path: &str) -> &str {
    let path = page_path.trim_start_matches('/');
    path.strip_suffix(PAGE_EXTENSION).unwrap_or(path)
}

/// Rules compiled once for repeated classification.
#[derive(Debug, Clone)]
pub struct ClusterClassifier {
    rules: Vec<(String, GlobSet)>,
    auto_by_directory: bool,
}

impl ClusterClassifier {
    /// Compile `rules`. Invalid patterns are reported and skipped; the rest of
    /// their rule still applies.
    pub fn new(rules: &[ClusterRule], auto_by_directory: bool) -> Self {
        let rules = rules
            .iter()
            .map(|rule| (rule.name.clone(), compile_rule(rule)))
            .collect();
        ClusterClassifier {
            rules,
            auto_by_directory,
        }
    }

    /// Cluster for `page_path`: first matching rule, then the directory fallback.
    pub fn classify(&self, page_path: &str) -> Option<String> {
        let normalized = normalize_page_path(page_path);

        if let Some((name, _)) = self.rules.iter().find(|(_, set)| set.is_match(normalized)) {
            return Some(name.clone());
        }

        if self.auto_by_directory {
            if let Some((directory, _)) = normalized.split_once('/') {
                if !directory.is_empty() {
                    return Some(directory.to_string());
                }
            }
        }
        None
    }
}

fn compile_rule(rule: &ClusterRule) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in &rule.patterns {
        match compile_pattern(&rule.name, pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!("Skipping cluster pattern: {}", e),
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Cluster `{}` disabled: {}", rule.name, e);
        GlobSet::empty()
    })
}

fn compile_pattern(cluster: &str, pattern: &str) -> Result<Glob> {
    Glob::new(pattern).map_err(|source| GraphError::InvalidPattern {
        cluster: cluster.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

/// One-shot classification. Compiles `rules` on every call.
pub fn classify(page_path: &str, rules: &[ClusterRule], auto_by_directory: bool) -> Option<String> {
    ClusterClassifier::new(rules, auto_by_directory).classify(page_path)
}
