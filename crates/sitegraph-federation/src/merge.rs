//! Splicing peer graphs into the home graph
//!
//! A peer's pages are imported under a fresh ID range above every home ID.
//! Home stubs pointing at an imported page are removed and their edges moved
//! onto that page; no other home node is touched.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use sitegraph_core::aggregation::PAGE_PATH_PREFIX;
use sitegraph_core::paths::{is_under, is_url, normalize_segments, strip_fragment};
use sitegraph_core::{
    Edge, GraphDocument, Node, NodeFlags, NodeId, NodeKind, SiteGraph, Vertex, external_cluster_name,
};

use crate::fetch::{GraphSource, PeerLocation};

/// A fetched peer document and where it came from.
#[derive(Debug, Clone)]
pub struct PeerGraph {
    pub project: String,
    pub base: String,
    pub document: GraphDocument,
}

impl PeerGraph {
    pub fn new(location: &PeerLocation, document: GraphDocument) -> Self {
        PeerGraph {
            project: location.project.clone(),
            base: location.base.clone(),
            document,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Added to every peer vertex ID.
    pub offset: u64,
    pub imported_nodes: usize,
    pub imported_edges: usize,
    /// Stubs replaced by imported pages.
    pub replaced_stubs: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPeer {
    pub project: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct FederationReport {
    pub merged: Vec<(String, MergeOutcome)>,
    pub skipped: Vec<SkippedPeer>,
}

/// Stub path as an absolute location. Relative paths are resolved against `source_dir`.
fn absolute_target(path: &str, source_dir: &Path) -> String {
    if is_url(path) || path.starts_with('/') {
        return path.to_string();
    }
    let joined = source_dir.join(path);
    normalize_segments(&joined.to_string_lossy())
}

fn is_first_degree(vertex: &Vertex) -> bool {
    let props = &vertex.properties;
    !matches!(vertex.label.as_str(), "external" | "intersphinx" | "external_project")
        && !props.is_external.unwrap_or(false)
        && !props.is_intersphinx.unwrap_or(false)
        && !props.is_external_project.unwrap_or(false)
}

fn peer_url(base: &str, path: &str) -> String {
    let relative = path.strip_prefix(PAGE_PATH_PREFIX).map(|p| p.trim_start_matches('/'));
    match relative {
        Some(relative) => format!("{base}/{relative}"),
        None => path.to_string(),
    }
}

/// Merge one peer graph into `graph`.
pub fn merge_peer(graph: &mut SiteGraph, peer: &PeerGraph, source_dir: &Path) -> MergeOutcome {
    let offset = graph.next_free_id();
    let base = strip_fragment(&peer.base);

    // Home stubs that point into this peer, with their absolute targets.
    let stubs: Vec<(NodeId, String)> = graph
        .nodes()
        .filter(|node| node.is_stub())
        .map(|node| (node.id, absolute_target(&node.path, source_dir)))
        .filter(|(_, target)| is_under(strip_fragment(target), base))
        .collect();
    let connected_exact: HashSet<&str> = stubs.iter().map(|(_, t)| t.as_str()).collect();
    let connected_base: HashSet<&str> = stubs.iter().map(|(_, t)| strip_fragment(t)).collect();

    let mut by_url: HashMap<String, NodeId> = HashMap::new();
    let mut imported: HashSet<NodeId> = HashSet::new();
    let cluster = external_cluster_name(&peer.project);

    for vertex in &peer.document.vertices {
        if !is_first_degree(vertex) {
            continue;
        }
        let Some(id) = vertex.id.checked_add(offset).map(NodeId) else {
            tracing::warn!("Peer '{}' vertex {} is out of ID range; skipping it", peer.project, vertex.id);
            continue;
        };
        let url = peer_url(&peer.base, &vertex.properties.path);
        let url_base = strip_fragment(&url).to_string();
        let has_home_connection =
            connected_exact.contains(url.as_str()) || connected_base.contains(url_base.as_str());

        let node = Node {
            id,
            label: vertex.properties.name.clone(),
            path: url.clone(),
            cluster: Some(cluster.clone()),
            kind: NodeKind::ExternalProject,
            flags: NodeFlags {
                is_external_project: true,
                has_home_connection,
                ..NodeFlags::default()
            },
            external_project_name: Some(peer.project.clone()),
        };
        if !graph.insert_node(node) {
            tracing::warn!("Peer '{}' vertex {} collides with an existing node", peer.project, vertex.id);
            continue;
        }
        imported.insert(id);
        by_url.entry(url).or_insert(id);
        by_url.entry(url_base).or_insert(id);
    }

    let mut replaced_stubs = 0;
    for (stub, target) in &stubs {
        let matched = by_url
            .get(target.as_str())
            .or_else(|| by_url.get(strip_fragment(target)));
        if let Some(&real) = matched {
            if graph.redirect_node(*stub, real).is_some() {
                replaced_stubs += 1;
            }
        }
    }

    let mut imported_edges = 0;
    for edge in &peer.document.edges {
        let (Some(source), Some(target)) = (edge.out_v.checked_add(offset), edge.in_v.checked_add(offset)) else {
            tracing::warn!("Peer '{}' edge {} is out of ID range; skipping it", peer.project, edge.id);
            continue;
        };
        let (source, target) = (NodeId(source), NodeId(target));
        if !imported.contains(&source) || !imported.contains(&target) {
            continue;
        }
        let connected = [source, target]
            .iter()
            .any(|id| graph.node(*id).is_some_and(|n| n.flags.has_home_connection));

        let mut types: BTreeSet<String> = edge.properties.types.iter().cloned().collect();
        if types.is_empty() {
            types.insert(edge.label.clone());
        }
        let merged = Edge {
            source,
            target,
            reference_count: edge.properties.reference_count,
            types,
            primary_type: edge.label.clone(),
            is_external_project: true,
            external_project_name: Some(peer.project.clone()),
            has_home_connection: connected,
        };
        if graph.add_edge(merged) {
            imported_edges += 1;
        }
    }

    let outcome = MergeOutcome {
        offset,
        imported_nodes: imported.len(),
        imported_edges,
        replaced_stubs,
    };
    tracing::info!(
        "Merged '{}': {} nodes, {} edges, {} stubs replaced (offset {})",
        peer.project,
        outcome.imported_nodes,
        outcome.imported_edges,
        outcome.replaced_stubs,
        outcome.offset
    );
    outcome
}

/// Fetch and merge each peer in order. Failures are logged and skipped.
pub async fn merge_peers(
    graph: &mut SiteGraph,
    peers: &[PeerLocation],
    source: &dyn GraphSource,
    source_dir: &Path,
) -> FederationReport {
    let mut report = FederationReport::default();
    let mut done: HashSet<&str> = HashSet::new();

    for peer in peers {
        if !done.insert(peer.project.as_str()) {
            tracing::warn!("Peer '{}' listed more than once; merging it once", peer.project);
            continue;
        }
        match source.fetch(peer).await {
            Ok(document) => {
                let outcome = merge_peer(graph, &PeerGraph::new(peer, document), source_dir);
                report.merged.push((peer.project.clone(), outcome));
            }
            Err(e) => {
                tracing::warn!("Skipping peer '{}': {}", peer.project, e);
                report.skipped.push(SkippedPeer {
                    project: peer.project.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    report
}
