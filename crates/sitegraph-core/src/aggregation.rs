//! Aggregation of raw reference events into nodes and deduplicated edges

use std::collections::HashMap;

use crate::cluster::{ClusterClassifier, external_cluster_name};
use crate::model::{Edge, Node, NodeFlags, NodeId, NodeKind, PageId, RawReference, Titles};

/// Relative prefix the front end expects in front of internal page paths.
pub const PAGE_PATH_PREFIX: &str = "../../..";

/// Build the base graph from drained events.
///
/// IDs are assigned densely in the order of `seen`. References whose source
/// or target was never seen are dropped.
pub fn aggregate(
    references: &[RawReference],
    seen: &[PageId],
    titles: &Titles,
    classifier: &ClusterClassifier,
) -> (Vec<Node>, Vec<Edge>) {
    let mut ids: HashMap<PageId, NodeId> = HashMap::new();
    let mut ordered: Vec<(PageId, NodeId)> = Vec::new();
    for page in seen {
        let key = page.aggregation_key();
        if ids.contains_key(&key) {
            continue;
        }
        let id = NodeId(ordered.len() as u64);
        ids.insert(key.clone(), id);
        ordered.push((key, id));
    }

    let mut edges: Vec<Edge> = Vec::new();
    let mut edge_index: HashMap<(NodeId, NodeId), usize> = HashMap::new();
    let mut dangling = 0usize;

    for reference in references {
        let source = ids.get(&reference.source.aggregation_key());
        let target = ids.get(&reference.target.aggregation_key());
        let (Some(&source), Some(&target)) = (source, target) else {
            dangling += 1;
            continue;
        };

        let slot = *edge_index.entry((source, target)).or_insert_with(|| {
            edges.push(Edge::new(source, target));
            edges.len() - 1
        });
        edges[slot].record(&reference.kind, 1);
    }

    if dangling > 0 {
        tracing::debug!("Dropped {} dangling references", dangling);
    }

    let nodes = ordered
        .iter()
        .map(|(page, id)| build_node(page, *id, titles, classifier))
        .collect();

    (nodes, edges)
}

fn build_node(page: &PageId, id: NodeId, titles: &Titles, classifier: &ClusterClassifier) -> Node {
    match page {
        PageId::Internal(path) => {
            let label = page
                .doc_name()
                .and_then(|doc| titles.get(doc))
                .cloned()
                .unwrap_or_else(|| path.clone());
            Node::page(id, label, format!("{PAGE_PATH_PREFIX}{path}"), classifier.classify(path))
        }
        PageId::Intersphinx { project, url, display } => Node {
            id,
            label: display.clone().unwrap_or_else(|| project.clone()),
            path: url.clone(),
            cluster: Some(external_cluster_name(project)),
            kind: NodeKind::Intersphinx,
            flags: NodeFlags {
                is_external: true,
                is_intersphinx: true,
                ..NodeFlags::default()
            },
            external_project_name: None,
        },
        PageId::ExternalProject { project, path, .. } => Node {
            id,
            label: path.clone(),
            path: path.clone(),
            cluster: Some(external_cluster_name(project)),
            kind: NodeKind::ExternalProject,
            flags: NodeFlags {
                is_external_project: true,
                ..NodeFlags::default()
            },
            external_project_name: Some(project.clone()),
        },
    }
}
