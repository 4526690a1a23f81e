//! Core data structures for the page graph

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::paths;

/// Dense node identifier, assigned in first-seen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primary type used when an edge folds more than one reference type.
pub const GENERIC_EDGE_TYPE: &str = "ref";

/// Document titles keyed by document name (`guides/intro`).
pub type Titles = HashMap<String, String>;

/// Key identifying any participant of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PageId {
    /// Site-relative page path, e.g. `/guides/intro.html`.
    Internal(String),
    /// Placeholder for a reference into another project's inventory.
    Intersphinx {
        project: String,
        url: String,
        display: Option<String>,
    },
    /// A peer project's page, disambiguated by the offset it was imported with.
    ExternalProject {
        project: String,
        offset: u64,
        path: String,
    },
}

impl PageId {
    /// Internal page key. Any fragment is dropped so anchors never split a page.
    pub fn internal(path: impl AsRef<str>) -> Self {
        PageId::Internal(paths::strip_fragment(path.as_ref()).to_string())
    }

    pub fn for_doc(doc: &str) -> Self {
        PageId::Internal(paths::page_for_doc(doc))
    }

    pub fn intersphinx(project: impl Into<String>, url: impl Into<String>, display: Option<String>) -> Self {
        PageId::Intersphinx {
            project: project.into(),
            url: url.into(),
            display,
        }
    }

    /// Decode a string key, accepting the legacy encodings.
    ///
    /// `external:<project>:<url>` is the current stub encoding. The older
    /// `external:<url>` form has no project; the URL host stands in for it.
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix("external:") {
            return parse_stub(rest);
        }
        if let Some(rest) = raw.strip_prefix("project:") {
            let mut parts = rest.splitn(3, ':');
            if let (Some(project), Some(offset), Some(path)) = (parts.next(), parts.next(), parts.next()) {
                if let Ok(offset) = offset.parse() {
                    return PageId::ExternalProject {
                        project: project.to_string(),
                        offset,
                        path: path.to_string(),
                    };
                }
            }
            tracing::debug!("Unrecognised project key, treating as page: {}", raw);
        }
        PageId::internal(raw)
    }

    /// Key used to group references. Only internal pages are normalised.
    pub fn aggregation_key(&self) -> PageId {
        match self {
            PageId::Internal(path) => PageId::internal(path),
            other => other.clone(),
        }
    }

    /// Document name for internal pages.
    pub fn doc_name(&self) -> Option<&str> {
        match self {
            PageId::Internal(path) => Some(paths::doc_for_page(path)),
            _ => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, PageId::Internal(_))
    }
}

fn parse_stub(rest: &str) -> PageId {
    if let Some((head, tail)) = rest.split_once(':') {
        // `external:https://...` is the legacy form: the head is a URL scheme.
        let is_scheme = tail.starts_with("//");
        if !is_scheme && !head.is_empty() {
            return PageId::intersphinx(head, tail, None);
        }
    }
    let url = rest.to_string();
    let project = url_host(&url).unwrap_or(&url).to_string();
    PageId::Intersphinx {
        project,
        url,
        display: None,
    }
}

fn url_host(url: &str) -> Option<&str> {
    let (_, after_scheme) = url.split_once("://")?;
    let host = after_scheme.split(['/', '?', '#']).next()?;
    if host.is_empty() { None } else { Some(host) }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageId::Internal(path) => write!(f, "{path}"),
            PageId::Intersphinx { project, url, .. } => write!(f, "external:{project}:{url}"),
            PageId::ExternalProject { project, offset, path } => {
                write!(f, "project:{project}:{offset}:{path}")
            }
        }
    }
}

/// One raw reference occurrence as recorded during document processing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawReference {
    pub source: PageId,
    pub target: PageId,
    pub kind: String,
}

impl RawReference {
    pub fn new(source: PageId, target: PageId, kind: impl Into<String>) -> Self {
        RawReference {
            source,
            target,
            kind: kind.into(),
        }
    }
}

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Page,
    External,
    Intersphinx,
    ExternalProject,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Page => "page",
            NodeKind::External => "external",
            NodeKind::Intersphinx => "intersphinx",
            NodeKind::ExternalProject => "external_project",
        }
    }

    /// Decode an interchange label. Unknown labels read as plain pages.
    pub fn from_label(label: &str) -> Self {
        match label {
            "external" => NodeKind::External,
            "intersphinx" => NodeKind::Intersphinx,
            "external_project" => NodeKind::ExternalProject,
            _ => NodeKind::Page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeFlags {
    pub is_external: bool,
    pub is_intersphinx: bool,
    pub is_external_project: bool,
    pub has_home_connection: bool,
}

/// A single node of the page graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub path: String,
    pub cluster: Option<String>,
    pub kind: NodeKind,
    pub flags: NodeFlags,
    /// Owning peer project for imported nodes.
    pub external_project_name: Option<String>,
}

impl Node {
    pub fn page(id: NodeId, label: impl Into<String>, path: impl Into<String>, cluster: Option<String>) -> Self {
        Node {
            id,
            label: label.into(),
            path: path.into(),
            cluster,
            kind: NodeKind::Page,
            flags: NodeFlags::default(),
            external_project_name: None,
        }
    }

    /// True for the placeholders federation may substitute.
    pub fn is_stub(&self) -> bool {
        self.flags.is_intersphinx
    }
}

/// An aggregated, deduplicated edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub reference_count: u32,
    pub types: BTreeSet<String>,
    pub primary_type: String,
    pub is_external_project: bool,
    pub external_project_name: Option<String>,
    pub has_home_connection: bool,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Edge {
            source,
            target,
            reference_count: 0,
            types: BTreeSet::new(),
            primary_type: GENERIC_EDGE_TYPE.to_string(),
            is_external_project: false,
            external_project_name: None,
            has_home_connection: false,
        }
    }

    /// Fold `count` occurrences of reference type `kind` into this edge.
    pub fn record(&mut self, kind: &str, count: u32) {
        self.reference_count += count;
        self.types.insert(kind.to_string());
        self.primary_type = primary_type(&self.types);
    }
}

/// The single type when there is exactly one, otherwise the generic type.
pub fn primary_type(types: &BTreeSet<String>) -> String {
    match types.len() {
        1 => types.iter().next().cloned().unwrap_or_else(|| GENERIC_EDGE_TYPE.to_string()),
        _ => GENERIC_EDGE_TYPE.to_string(),
    }
}
