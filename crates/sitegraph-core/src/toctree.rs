//! Document hierarchy from table-of-contents inclusions

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::aggregation::PAGE_PATH_PREFIX;
use crate::model::Titles;
use crate::paths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocNode {
    pub id: String,
    pub label: String,
    pub path: String,
    pub children: Vec<TocNode>,
}

/// Build the hierarchy rooted at `root_doc` from `(parent, children)` entries.
///
/// Each document appears once; later occurrences are skipped so cycles terminate.
pub fn build_toctree(entries: &[(String, Vec<String>)], titles: &Titles, root_doc: &str) -> TocNode {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for (parent, kids) in entries {
        children
            .entry(parent.as_str())
            .or_default()
            .extend(kids.iter().map(String::as_str));
    }

    let mut visited = HashSet::new();
    visit(root_doc, &children, titles, &mut visited)
}

fn visit<'a>(
    doc: &'a str,
    children: &HashMap<&'a str, Vec<&'a str>>,
    titles: &Titles,
    visited: &mut HashSet<&'a str>,
) -> TocNode {
    visited.insert(doc);
    let mut node = TocNode {
        id: doc.to_string(),
        label: titles.get(doc).cloned().unwrap_or_else(|| doc.to_string()),
        path: format!("{PAGE_PATH_PREFIX}{}", paths::page_for_doc(doc)),
        children: Vec::new(),
    };
    for &child in children.get(doc).map(Vec::as_slice).unwrap_or_default() {
        if visited.contains(child) {
            continue;
        }
        node.children.push(visit(child, children, titles, visited));
    }
    node
}
