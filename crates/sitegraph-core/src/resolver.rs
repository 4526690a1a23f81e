//! Resolution of external reference targets against known projects

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::paths;

/// Object types conventionally used for whole-page references, searched first.
pub const PRIORITY_TYPES: &[&str] = &["std:doc", "std:label"];

/// Inventory display name meaning "no explicit name".
pub const DISPLAY_PLACEHOLDER: &str = "-";

/// A project other pages may link into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub base_url: String,
}

/// Known external projects in configuration order.
#[derive(Debug, Clone, Default)]
pub struct ProjectTable {
    projects: Vec<Project>,
}

impl ProjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a project.
    pub fn insert(&mut self, name: impl Into<String>, base_url: impl Into<String>) {
        let project = Project {
            name: name.into(),
            base_url: base_url.into(),
        };
        match self.projects.iter_mut().find(|p| p.name == project.name) {
            Some(existing) => *existing = project,
            None => self.projects.push(project),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Project whose base URL equals `url` (fragment ignored) or is a
    /// `/`-bounded prefix of it.
    ///
    /// When several base URLs match, the longest wins; equal lengths keep
    /// configuration order.
    pub fn resolve_project(&self, url: &str) -> Option<&Project> {
        let url = paths::strip_fragment(url);
        let mut best: Option<&Project> = None;
        for project in &self.projects {
            if project.base_url.is_empty() || !paths::is_under(url, &project.base_url) {
                continue;
            }
            let longer = best.is_none_or(|current| {
                paths::trim_trailing_slash(&project.base_url).len()
                    > paths::trim_trailing_slash(&current.base_url).len()
            });
            if longer {
                best = Some(project);
            }
        }
        best
    }
}

/// One inventory object: `(owning project, version, uri, display name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub project: String,
    pub version: String,
    pub uri: String,
    #[serde(default = "placeholder")]
    pub display_name: String,
}

fn placeholder() -> String {
    DISPLAY_PLACEHOLDER.to_string()
}

/// A project's published object table: type tag -> target key -> item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    objects: BTreeMap<String, BTreeMap<String, InventoryItem>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object_type: impl Into<String>, key: impl Into<String>, item: InventoryItem) {
        self.objects
            .entry(object_type.into())
            .or_default()
            .insert(key.into(), item);
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Human-readable name for the object published at `url`.
    pub fn resolve_display_name(&self, url: &str) -> Option<String> {
        for tag in PRIORITY_TYPES {
            if let Some(name) = self.objects.get(*tag).and_then(|items| find_in(items, url)) {
                return Some(name);
            }
        }
        self.objects
            .iter()
            .filter(|(tag, _)| !PRIORITY_TYPES.contains(&tag.as_str()))
            .find_map(|(_, items)| find_in(items, url))
    }
}

/// Exact URI first, then the same page ignoring fragments.
fn find_in(items: &BTreeMap<String, InventoryItem>, url: &str) -> Option<String> {
    let url_base = paths::strip_fragment(url);
    items
        .iter()
        .find(|(_, item)| item.uri == url)
        .or_else(|| {
            items
                .iter()
                .find(|(_, item)| paths::strip_fragment(&item.uri) == url_base)
        })
        .map(|(key, item)| display_name(key, item))
}

fn display_name(key: &str, item: &InventoryItem) -> String {
    if !item.display_name.is_empty() && item.display_name != DISPLAY_PLACEHOLDER {
        return item.display_name.clone();
    }
    key.rsplit('.').next().unwrap_or(key).to_string()
}

/// Display name for `url` using the inventory of `project`, if one is loaded.
pub fn resolve_display_name(url: &str, project: &str, inventories: &HashMap<String, Inventory>) -> Option<String> {
    inventories.get(project)?.resolve_display_name(url)
}
