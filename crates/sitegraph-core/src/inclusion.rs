//! Secondary graph of documents and the files they include

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Edge type of every inclusion link.
pub const INCLUDE_EDGE_TYPE: &str = "include";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeKind {
    Document,
    Include,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeNode {
    pub id: u64,
    pub label: String,
    pub kind: IncludeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeLink {
    pub source: u64,
    pub target: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub reference_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionGraph {
    pub nodes: Vec<IncludeNode>,
    pub links: Vec<IncludeLink>,
}

/// Build the inclusion graph from `(document, included file)` pairs.
///
/// Nodes are numbered in first-seen order; repeated pairs are counted.
pub fn build_inclusion_graph(dependencies: &[(String, String)]) -> InclusionGraph {
    let mut graph = InclusionGraph::default();
    let mut ids: HashMap<(IncludeKind, &str), u64> = HashMap::new();
    let mut links: HashMap<(u64, u64), usize> = HashMap::new();

    for (doc, included) in dependencies {
        let source = intern(&mut graph.nodes, &mut ids, IncludeKind::Document, doc);
        let target = intern(&mut graph.nodes, &mut ids, IncludeKind::Include, included);

        match links.get(&(source, target)) {
            Some(&slot) => graph.links[slot].reference_count += 1,
            None => {
                links.insert((source, target), graph.links.len());
                graph.links.push(IncludeLink {
                    source,
                    target,
                    kind: INCLUDE_EDGE_TYPE.to_string(),
                    reference_count: 1,
                });
            }
        }
    }
    graph
}

fn intern<'a>(
    nodes: &mut Vec<IncludeNode>,
    ids: &mut HashMap<(IncludeKind, &'a str), u64>,
    kind: IncludeKind,
    label: &'a str,
) -> u64 {
    *ids.entry((kind, label)).or_insert_with(|| {
        let id = nodes.len() as u64;
        nodes.push(IncludeNode {
            id,
            label: label.to_string(),
            kind,
        });
        id
    })
}
