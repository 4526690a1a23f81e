//! Interchange document rendering and parsing
//!
//! The document holds `vertices`, `edges` and `clusters` in a GraphSON-like
//! shape. The same types are used to publish a project's graph and to read a
//! peer's published graph back, so every optional field tolerates absence.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterRule;
use crate::error::{GraphError, Result};
use crate::graph::SiteGraph;
use crate::model::{Edge, Node, NodeFlags, NodeId, NodeKind, primary_type};

/// Constant edge strength expected by the front end.
pub const EDGE_STRENGTH: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    #[serde(default)]
    pub edges: Vec<DocumentEdge>,
    #[serde(default)]
    pub clusters: Vec<ClusterDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DocumentMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub generator: String,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: u64,
    /// `page`, `external`, `intersphinx` or `external_project`.
    pub label: String,
    #[serde(default)]
    pub properties: VertexProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexProperties {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_external: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_intersphinx: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_external_project: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_home_connection: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEdge {
    pub id: u64,
    /// Primary reference type.
    pub label: String,
    #[serde(rename = "inV")]
    pub in_v: u64,
    #[serde(rename = "outV")]
    pub out_v: u64,
    #[serde(default)]
    pub properties: EdgeProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeProperties {
    #[serde(default = "default_strength")]
    pub strength: u32,
    #[serde(default = "default_count")]
    pub reference_count: u32,
    #[serde(default)]
    pub types: Vec<String>,
}

impl Default for EdgeProperties {
    fn default() -> Self {
        EdgeProperties {
            strength: EDGE_STRENGTH,
            reference_count: 1,
            types: Vec::new(),
        }
    }
}

fn default_strength() -> u32 {
    EDGE_STRENGTH
}

fn default_count() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterDecl {
    pub name: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_external_project: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_only_connected_by_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_hidden: Option<bool>,
}

impl ClusterDecl {
    fn plain(name: &str, patterns: Vec<String>) -> Self {
        ClusterDecl {
            name: name.to_string(),
            patterns,
            is_external_project: None,
            external_project_name: None,
            show_only_connected_by_default: None,
            default_hidden: None,
        }
    }
}

impl GraphDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        let document: GraphDocument = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let document: GraphDocument = serde_json::from_slice(bytes)?;
        document.validate()?;
        Ok(document)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for vertex in &self.vertices {
            if !ids.insert(vertex.id) {
                return Err(GraphError::MalformedDocument(format!("duplicate vertex id {}", vertex.id)));
            }
        }
        Ok(())
    }

    /// Rebuild a graph from a document. Edges to unknown vertices are dropped.
    pub fn to_site_graph(&self) -> SiteGraph {
        let nodes = self.vertices.iter().map(vertex_to_node).collect();
        let edges = self.edges.iter().map(document_edge_to_edge).collect();
        SiteGraph::from_parts(nodes, edges)
    }
}

fn vertex_to_node(vertex: &Vertex) -> Node {
    let props = &vertex.properties;
    let kind = NodeKind::from_label(&vertex.label);
    Node {
        id: NodeId(vertex.id),
        label: props.name.clone(),
        path: props.path.clone(),
        cluster: props.cluster.clone(),
        kind,
        flags: NodeFlags {
            is_external: props.is_external.unwrap_or(false),
            is_intersphinx: props.is_intersphinx.unwrap_or(kind == NodeKind::Intersphinx),
            is_external_project: props.is_external_project.unwrap_or(kind == NodeKind::ExternalProject),
            has_home_connection: props.has_home_connection.unwrap_or(false),
        },
        external_project_name: props.external_project_name.clone(),
    }
}

fn document_edge_to_edge(edge: &DocumentEdge) -> Edge {
    let mut types: BTreeSet<String> = edge.properties.types.iter().cloned().collect();
    if types.is_empty() {
        types.insert(edge.label.clone());
    }
    Edge {
        source: NodeId(edge.out_v),
        target: NodeId(edge.in_v),
        reference_count: edge.properties.reference_count,
        primary_type: if types.len() == 1 { primary_type(&types) } else { edge.label.clone() },
        types,
        is_external_project: false,
        external_project_name: None,
        has_home_connection: false,
    }
}

fn flag(value: bool) -> Option<bool> {
    value.then_some(true)
}

fn node_to_vertex(node: &Node) -> Vertex {
    Vertex {
        id: node.id.0,
        label: node.kind.as_str().to_string(),
        properties: VertexProperties {
            name: node.label.clone(),
            path: node.path.clone(),
            cluster: node.cluster.clone(),
            is_external: flag(node.flags.is_external),
            is_intersphinx: flag(node.flags.is_intersphinx),
            is_external_project: flag(node.flags.is_external_project),
            external_project_name: node.external_project_name.clone(),
            has_home_connection: node.flags.is_external_project.then_some(node.flags.has_home_connection),
        },
    }
}

/// Cluster declarations: configured clusters first, then every cluster seen on
/// a node that was not configured, in node order.
///
/// Clusters holding peer-project nodes are shown only when connected, and are
/// hidden entirely when none of their nodes connects to the home project.
pub fn declare_clusters<'a>(configured: &[ClusterRule], nodes: impl IntoIterator<Item = &'a Node>) -> Vec<ClusterDecl> {
    let mut declared: Vec<ClusterDecl> = configured
        .iter()
        .map(|rule| ClusterDecl::plain(&rule.name, rule.patterns.clone()))
        .collect();
    let mut positions: HashMap<String, usize> = declared
        .iter()
        .enumerate()
        .map(|(i, decl)| (decl.name.clone(), i))
        .collect();
    let configured_count = declared.len();

    struct Observed {
        project: Option<String>,
        connected: bool,
    }
    let mut observed: HashMap<usize, Observed> = HashMap::new();

    for node in nodes {
        let Some(cluster) = node.cluster.as_deref() else {
            continue;
        };
        let position = *positions.entry(cluster.to_string()).or_insert_with(|| {
            declared.push(ClusterDecl::plain(cluster, Vec::new()));
            declared.len() - 1
        });
        if position < configured_count {
            continue;
        }
        let entry = observed.entry(position).or_insert(Observed {
            project: None,
            connected: false,
        });
        if node.flags.is_external_project {
            if entry.project.is_none() {
                entry.project = node.external_project_name.clone().or_else(|| Some(cluster.to_string()));
            }
            entry.connected |= node.flags.has_home_connection;
        }
    }

    for (position, seen) in observed {
        let Some(project) = seen.project else {
            continue;
        };
        let decl = &mut declared[position];
        decl.is_external_project = Some(true);
        decl.external_project_name = Some(project);
        decl.show_only_connected_by_default = Some(true);
        if !seen.connected {
            decl.default_hidden = Some(true);
        }
    }
    declared
}

/// Render a graph into the interchange document.
pub fn render(graph: &SiteGraph, configured: &[ClusterRule]) -> GraphDocument {
    let vertices = graph.nodes().map(node_to_vertex).collect();
    let edges = graph
        .edges()
        .enumerate()
        .map(|(idx, edge)| DocumentEdge {
            id: idx as u64,
            label: edge.primary_type.clone(),
            in_v: edge.target.0,
            out_v: edge.source.0,
            properties: EdgeProperties {
                strength: EDGE_STRENGTH,
                reference_count: edge.reference_count,
                types: edge.types.iter().cloned().collect(),
            },
        })
        .collect();

    GraphDocument {
        vertices,
        edges,
        clusters: declare_clusters(configured, graph.nodes()),
        meta: Some(DocumentMeta {
            generator: format!("sitegraph {}", env!("CARGO_PKG_VERSION")),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }),
    }
}

/// Node shape consumed directly by the rendering front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatNode {
    pub id: u64,
    pub label: String,
    pub path: String,
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_external: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_intersphinx: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_external_project: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_project_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_home_connection: bool,
}

/// Link shape consumed directly by the rendering front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatLink {
    pub source: u64,
    pub target: u64,
    pub strength: u32,
    pub reference_count: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_external_project: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_project_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_home_connection: bool,
}

pub fn flat_nodes(graph: &SiteGraph) -> Vec<FlatNode> {
    graph
        .nodes()
        .map(|node| FlatNode {
            id: node.id.0,
            label: node.label.clone(),
            path: node.path.clone(),
            cluster: node.cluster.clone(),
            is_external: node.flags.is_external,
            is_intersphinx: node.flags.is_intersphinx,
            is_external_project: node.flags.is_external_project,
            external_project_name: node.external_project_name.clone(),
            has_home_connection: node.flags.has_home_connection,
        })
        .collect()
}

pub fn flat_links(graph: &SiteGraph) -> Vec<FlatLink> {
    graph
        .edges()
        .map(|edge| FlatLink {
            source: edge.source.0,
            target: edge.target.0,
            strength: EDGE_STRENGTH,
            reference_count: edge.reference_count,
            kind: edge.primary_type.clone(),
            types: edge.types.iter().cloned().collect(),
            is_external_project: edge.is_external_project,
            external_project_name: edge.external_project_name.clone(),
            has_home_connection: edge.has_home_connection,
        })
        .collect()
}

/// `var <name> = <json>;` as loaded by the front-end scripts.
pub fn js_assignment<T: Serialize + ?Sized>(name: &str, value: &T) -> Result<String> {
    Ok(format!("var {} = {};", name, serde_json::to_string_pretty(value)?))
}
