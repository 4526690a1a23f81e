//! Sitegraph Core: page identity, reference aggregation and the interchange document

pub mod model;
pub mod error;
pub mod paths;
pub mod events;
pub mod cluster;
pub mod resolver;
pub mod ingest;
pub mod aggregation;
pub mod graph;
pub mod inclusion;
pub mod stats;
pub mod toctree;
pub mod graphson;

#[cfg(test)]
pub mod tests;

pub use model::{NodeId, PageId, NodeKind, NodeFlags, Node, Edge, RawReference, Titles, GENERIC_EDGE_TYPE};
pub use error::{GraphError, Result};
pub use events::{EventStore, EventSink, Drained, TermReference};
pub use cluster::{ClusterRule, ClusterClassifier, classify, normalize_page_path, external_cluster_name};
pub use resolver::{Project, ProjectTable, Inventory, InventoryItem, resolve_display_name};
pub use ingest::{HostEvent, ReferenceEvent, ReferenceContext, ingest_reference, reference_type};
pub use aggregation::aggregate;
pub use graph::SiteGraph;
pub use inclusion::{InclusionGraph, IncludeNode, IncludeLink, build_inclusion_graph};
pub use stats::{TermStats, TermCount, term_statistics};
pub use toctree::{TocNode, build_toctree};
pub use graphson::{GraphDocument, Vertex, VertexProperties, DocumentEdge, EdgeProperties, ClusterDecl, FlatNode, FlatLink, render, declare_clusters, flat_nodes, flat_links, js_assignment};
