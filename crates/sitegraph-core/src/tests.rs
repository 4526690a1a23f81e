//! Unit tests for sitegraph-core module

use crate::*;
use std::collections::{BTreeSet, HashSet};

fn page(doc: &str) -> PageId {
    PageId::for_doc(doc)
}

fn no_clusters() -> ClusterClassifier {
    ClusterClassifier::new(&[], false)
}

fn build(references: &[RawReference], seen: &[PageId]) -> (Vec<Node>, Vec<Edge>) {
    aggregate(references, seen, &Titles::new(), &no_clusters())
}

#[test]
fn test_node_ids_follow_first_seen_order() {
    let seen = vec![page("b"), page("a"), page("c")];
    let (first, _) = build(&[], &seen);
    let (second, _) = build(&[], &seen);

    let ids: Vec<(u64, String)> = first.iter().map(|n| (n.id.0, n.path.clone())).collect();
    assert_eq!(
        ids,
        vec![
            (0, "../../../b.html".to_string()),
            (1, "../../../a.html".to_string()),
            (2, "../../../c.html".to_string()),
        ]
    );
    assert_eq!(first, second);
}

#[test]
fn test_repeated_event_folds_into_one_edge() {
    let seen = vec![page("a"), page("b")];
    let references: Vec<RawReference> = (0..5).map(|_| RawReference::new(page("a"), page("b"), "ref")).collect();
    let (_, edges) = build(&references, &seen);

    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].reference_count, 5);
    assert_eq!(edges[0].types, BTreeSet::from(["ref".to_string()]));
    assert_eq!(edges[0].primary_type, "ref");
}

#[test]
fn test_type_union_uses_generic_primary_type() {
    let seen = vec![page("a"), page("b")];
    let references = vec![
        RawReference::new(page("a"), page("b"), "doc"),
        RawReference::new(page("a"), page("b"), "term"),
    ];
    let (_, edges) = build(&references, &seen);

    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].reference_count, 2);
    assert_eq!(edges[0].types, BTreeSet::from(["doc".to_string(), "term".to_string()]));
    assert_eq!(edges[0].primary_type, GENERIC_EDGE_TYPE);
    assert_ne!(edges[0].primary_type, "doc");

    let single = vec![RawReference::new(page("a"), page("b"), "term")];
    let (_, edges) = build(&single, &seen);
    assert_eq!(edges[0].primary_type, "term");
}

#[test]
fn test_fragments_do_not_split_pages() {
    let seen = vec![PageId::Internal("/a.html".to_string()), PageId::Internal("/b.html#part".to_string())];
    let references = vec![
        RawReference::new(page("a"), PageId::Internal("/b.html#one".to_string()), "ref"),
        RawReference::new(page("a"), PageId::Internal("/b.html".to_string()), "ref"),
    ];
    let (nodes, edges) = build(&references, &seen);

    assert_eq!(nodes.len(), 2);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].reference_count, 2);
}

#[test]
fn test_dangling_references_are_dropped() {
    let seen = vec![page("a")];
    let references = vec![
        RawReference::new(page("a"), page("missing"), "ref"),
        RawReference::new(page("ghost"), page("a"), "ref"),
    ];
    let (nodes, edges) = build(&references, &seen);

    assert_eq!(nodes.len(), 1);
    assert!(edges.is_empty());
}

#[test]
fn test_page_seen_without_edges_still_gets_a_node() {
    let seen = vec![page("lonely"), page("a"), page("b")];
    let references = vec![RawReference::new(page("a"), page("b"), "ref")];
    let (nodes, edges) = build(&references, &seen);

    assert_eq!(nodes.len(), 3);
    assert_eq!(edges[0].source, NodeId(1));
    assert_eq!(edges[0].target, NodeId(2));
}

#[test]
fn test_node_labels_and_clusters() {
    let seen = vec![
        page("guides/intro"),
        page("index"),
        PageId::intersphinx("peer", "https://peer.org/x.html", Some("X Page".to_string())),
        PageId::intersphinx("peer", "https://peer.org/y.html", None),
    ];
    let mut titles = Titles::new();
    titles.insert("guides/intro".to_string(), "Introduction".to_string());
    let classifier = ClusterClassifier::new(&[ClusterRule::new("guides", &["guides/*"])], false);

    let (nodes, _) = aggregate(&[], &seen, &titles, &classifier);

    assert_eq!(nodes[0].label, "Introduction");
    assert_eq!(nodes[0].cluster.as_deref(), Some("guides"));
    assert_eq!(nodes[1].label, "/index.html");
    assert_eq!(nodes[1].cluster, None);

    assert_eq!(nodes[2].kind, NodeKind::Intersphinx);
    assert_eq!(nodes[2].label, "X Page");
    assert_eq!(nodes[2].path, "https://peer.org/x.html");
    assert_eq!(nodes[2].cluster.as_deref(), Some("peer (external)"));
    assert!(nodes[2].flags.is_external && nodes[2].flags.is_intersphinx);
    assert_eq!(nodes[3].label, "peer");
}

#[test]
fn test_page_id_parsing_current_and_legacy() {
    assert_eq!(
        PageId::parse("external:peer:https://peer.org/a.html"),
        PageId::intersphinx("peer", "https://peer.org/a.html", None)
    );
    assert_eq!(
        PageId::parse("external:https://peer.org/a.html"),
        PageId::intersphinx("peer.org", "https://peer.org/a.html", None)
    );
    assert_eq!(
        PageId::parse("external:not-a-url"),
        PageId::intersphinx("not-a-url", "not-a-url", None)
    );
    assert_eq!(PageId::parse("/a/b.html#frag"), PageId::Internal("/a/b.html".to_string()));

    let stub = PageId::intersphinx("peer", "https://peer.org/a.html", None);
    assert_eq!(PageId::parse(&stub.to_string()), stub);
    let imported = PageId::ExternalProject {
        project: "peer".to_string(),
        offset: 42,
        path: "https://peer.org/a.html".to_string(),
    };
    assert_eq!(PageId::parse(&imported.to_string()), imported);
}

#[test]
fn test_graph_redirect_keeps_other_ids() {
    let nodes = vec![
        Node::page(NodeId(0), "a", "/a", None),
        Node::page(NodeId(1), "stub", "/stub", None),
        Node::page(NodeId(7), "real", "/real", None),
    ];
    let mut to_stub = Edge::new(NodeId(0), NodeId(1));
    to_stub.record("ref", 3);
    let mut from_stub = Edge::new(NodeId(1), NodeId(0));
    from_stub.record("ref", 1);
    let mut graph = SiteGraph::from_parts(nodes, vec![to_stub, from_stub]);

    assert_eq!(graph.redirect_node(NodeId(1), NodeId(7)), Some(2));
    assert!(!graph.contains(NodeId(1)));
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.edges().all(|e| e.source != NodeId(1) && e.target != NodeId(1)));
    assert_eq!(graph.edges_to(NodeId(7)).map(|e| e.reference_count).sum::<u32>(), 3);
    assert_eq!(graph.edges_from(NodeId(7)).count(), 1);
    assert_eq!(graph.next_free_id(), 8);
}

#[test]
fn test_from_parts_drops_unknown_endpoints() {
    let nodes = vec![Node::page(NodeId(0), "a", "/a", None)];
    let graph = SiteGraph::from_parts(nodes, vec![Edge::new(NodeId(0), NodeId(9))]);
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.next_free_id(), 1);
    assert_eq!(SiteGraph::new().next_free_id(), 0);
}

#[test]
fn test_round_trip_preserves_counts_and_triples() {
    let seen = vec![
        page("a"),
        page("b"),
        page("c"),
        PageId::intersphinx("peer", "https://peer.org/x.html", None),
    ];
    let references = vec![
        RawReference::new(page("a"), page("b"), "ref"),
        RawReference::new(page("a"), page("b"), "term"),
        RawReference::new(page("b"), page("c"), "doc"),
        RawReference::new(page("c"), seen[3].clone(), "intersphinx"),
    ];
    let (nodes, edges) = build(&references, &seen);
    let graph = SiteGraph::from_parts(nodes, edges);

    let document = render(&graph, &[]);
    let json = document.to_json_pretty().unwrap();
    let parsed = GraphDocument::from_json(&json).unwrap();

    assert_eq!(parsed.vertices.len(), document.vertices.len());
    assert_eq!(parsed.edges.len(), document.edges.len());
    let triples = |doc: &GraphDocument| -> HashSet<(u64, u64, String)> {
        doc.edges.iter().map(|e| (e.out_v, e.in_v, e.label.clone())).collect()
    };
    assert_eq!(triples(&parsed), triples(&document));
    assert!(triples(&parsed).contains(&(0, 1, "ref".to_string())));

    let rebuilt = parsed.to_site_graph();
    assert_eq!(rebuilt.node_count(), 4);
    assert_eq!(rebuilt.edge_count(), 3);
    assert!(rebuilt.node(NodeId(3)).is_some_and(|n| n.is_stub()));
}

#[test]
fn test_vertex_shape() {
    let graph = SiteGraph::from_parts(vec![Node::page(NodeId(0), "Home", "../../../index.html", None)], Vec::new());
    let value = serde_json::to_value(render(&graph, &[])).unwrap();

    assert_eq!(value["vertices"][0]["label"], "page");
    assert_eq!(value["vertices"][0]["properties"]["name"], "Home");
    assert!(value["vertices"][0]["properties"].get("cluster").is_none());
    assert!(value["vertices"][0]["properties"].get("is_external").is_none());
}

#[test]
fn test_malformed_documents_are_rejected() {
    assert!(GraphDocument::from_json("not json").is_err());
    let duplicate = r#"{"vertices":[{"id":1,"label":"page"},{"id":1,"label":"page"}],"edges":[]}"#;
    assert!(matches!(GraphDocument::from_json(duplicate), Err(GraphError::MalformedDocument(_))));
}

#[test]
fn test_cluster_declarations() {
    let configured = vec![ClusterRule::new("api", &["api/*"])];
    let mut connected = Node::page(NodeId(5), "p", "https://peer.org/p.html", Some("peer (external)".to_string()));
    connected.kind = NodeKind::ExternalProject;
    connected.flags.is_external_project = true;
    connected.flags.has_home_connection = true;
    connected.external_project_name = Some("peer".to_string());
    let mut lonely = connected.clone();
    lonely.id = NodeId(6);
    lonely.cluster = Some("other (external)".to_string());
    lonely.flags.has_home_connection = false;
    lonely.external_project_name = Some("other".to_string());

    let nodes = vec![
        Node::page(NodeId(0), "a", "/a", Some("api".to_string())),
        Node::page(NodeId(1), "g", "/g", Some("guides".to_string())),
        connected,
        lonely,
    ];
    let clusters = declare_clusters(&configured, &nodes);

    let names: Vec<&str> = clusters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["api", "guides", "peer (external)", "other (external)"]);
    assert_eq!(clusters[0].patterns, vec!["api/*".to_string()]);
    assert_eq!(clusters[1].is_external_project, None);
    assert_eq!(clusters[2].show_only_connected_by_default, Some(true));
    assert_eq!(clusters[2].default_hidden, None);
    assert_eq!(clusters[3].external_project_name.as_deref(), Some("other"));
    assert_eq!(clusters[3].default_hidden, Some(true));
}

#[test]
fn test_js_assignment() {
    let text = js_assignment("nodes_data", &vec![1, 2]).unwrap();
    assert!(text.starts_with("var nodes_data = ["));
    assert!(text.ends_with("];"));
}
