//! Integration tests for Sitegraph
//!
//! These tests drive the CLI over event files and check the published
//! documents, including federation between two locally built projects.

use std::fs;
use std::path::Path;
use std::process::Command;

use sitegraph_core::GraphDocument;
use tempfile::TempDir;

const PEER_EVENTS: &str = r#"{"kind":"title","doc_id":"index","text":"Peer Home"}
{"kind":"title","doc_id":"guide","text":"Peer Guide"}
{"kind":"reference","source_doc":"index","target_url":"guide.html","internal":true,"classes":["std-doc"]}
{"kind":"reference","source_doc":"index","target_url":"guide.html#install","internal":true,"classes":["std-ref"]}
"#;

const HOME_EVENTS: &str = r#"{"kind":"title","doc_id":"index","text":"Home"}
{"kind":"reference","source_doc":"index","target_url":"api/core.html","internal":true,"classes":["std-ref"]}
{"kind":"reference","source_doc":"index","target_url":"../peer_site/guide.html#setup","internal":false,"classes":[]}
{"kind":"reference","source_doc":"api/core","target_url":"https://elsewhere.org/","internal":false}
{"kind":"reference","source_doc":"api/core","target_url":"../glossary.html#term-sink","internal":true,"classes":["std-term"],"text":"Sink"}
{"kind":"dependency","doc_id":"index","included_file":"snippets/intro.rst"}
{"kind":"toctree","parent":"index","children":["api/core"]}
this line is not an event
"#;

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_sitegraph"))
        .args(args)
        .output()
        .expect("Failed to execute sitegraph")
}

fn build(config: &Path, events: &Path, out: &Path) {
    let output = run(&[
        "--config",
        config.to_str().unwrap(),
        "build",
        "--events",
        events.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--jobs",
        "1",
    ]);
    assert!(
        output.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn read_graph(path: &Path) -> GraphDocument {
    GraphDocument::from_json(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Build the peer project into `<root>/peer_site`.
fn build_peer(root: &Path) {
    let events = root.join("peer_events.jsonl");
    fs::write(&events, PEER_EVENTS).unwrap();
    build(&root.join("no-config.toml"), &events, &root.join("peer_site"));
}

fn write_home(root: &Path, peer_base: &str) -> (std::path::PathBuf, std::path::PathBuf) {
    let home = root.join("home");
    fs::create_dir_all(&home).unwrap();
    let config = home.join("sitegraph.toml");
    fs::write(
        &config,
        format!(
            r#"
federate = ["peer"]

[[clusters]]
name = "api"
patterns = ["api/*"]

[projects.peer]
base_url = "{peer_base}"
"#
        ),
    )
    .unwrap();
    let events = home.join("events.jsonl");
    fs::write(&events, HOME_EVENTS).unwrap();
    (config, events)
}

#[test]
fn test_cli_invocation() {
    let output = run(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Link graphs for documentation sites"));
}

#[test]
fn test_single_project_build() {
    let root = TempDir::new().unwrap();
    build_peer(root.path());
    let out = root.path().join("peer_site");

    let graph = read_graph(&out.join("graph.json"));
    assert_eq!(graph.vertices.len(), 2);
    assert_eq!(graph.edges.len(), 1);

    let edge = &graph.edges[0];
    assert_eq!(edge.properties.reference_count, 2);
    assert_eq!(edge.properties.types, vec!["doc".to_string(), "ref".to_string()]);
    assert_eq!(edge.label, "ref");

    let names: Vec<&str> = graph.vertices.iter().map(|v| v.properties.name.as_str()).collect();
    assert_eq!(names, vec!["Peer Home", "Peer Guide"]);

    for file in ["nodes.js", "links.js", "toctree.js", "includes.js", "glossary.js"] {
        assert!(out.join("js").join(file).exists(), "missing {file}");
    }
    let nodes = fs::read_to_string(out.join("js/nodes.js")).unwrap();
    assert!(nodes.starts_with("var nodes_data = "));
}

#[test]
fn test_federated_build_replaces_stub() {
    let root = TempDir::new().unwrap();
    build_peer(root.path());
    let (config, events) = write_home(root.path(), "../peer_site");
    let out = root.path().join("home/_build");
    build(&config, &events, &out);

    let graph = read_graph(&out.join("graph.json"));

    // index, api/core, glossary, plus both peer pages; the stub is gone.
    let labels: Vec<&str> = graph.vertices.iter().map(|v| v.label.as_str()).collect();
    assert_eq!(labels.iter().filter(|l| **l == "page").count(), 3);
    assert_eq!(labels.iter().filter(|l| **l == "external_project").count(), 2);
    assert!(!labels.contains(&"intersphinx"));

    let ids: std::collections::HashSet<u64> = graph.vertices.iter().map(|v| v.id).collect();
    assert!(graph.edges.iter().all(|e| ids.contains(&e.in_v) && ids.contains(&e.out_v)));

    let guide = graph
        .vertices
        .iter()
        .find(|v| v.properties.name == "Peer Guide")
        .unwrap();
    assert_eq!(guide.properties.has_home_connection, Some(true));
    assert!(graph.edges.iter().any(|e| e.in_v == guide.id && e.label == "intersphinx"));

    let peer_cluster = graph.clusters.iter().find(|c| c.name == "peer (external)").unwrap();
    assert_eq!(peer_cluster.show_only_connected_by_default, Some(true));
    assert_eq!(peer_cluster.default_hidden, None);
    assert_eq!(graph.clusters[0].name, "api");

    let glossary = fs::read_to_string(out.join("js/glossary.js")).unwrap();
    assert!(glossary.contains("\"sink\""));
    let includes = fs::read_to_string(out.join("js/includes.js")).unwrap();
    assert!(includes.contains("snippets/intro.rst"));
}

#[test]
fn test_missing_peer_does_not_fail_build() {
    let root = TempDir::new().unwrap();
    let (config, events) = write_home(root.path(), "../peer_site");
    let out = root.path().join("home/_build");
    build(&config, &events, &out);

    let graph = read_graph(&out.join("graph.json"));
    let stub = graph.vertices.iter().find(|v| v.label == "intersphinx").unwrap();
    assert_eq!(stub.properties.cluster.as_deref(), Some("peer (external)"));
    assert_eq!(graph.vertices.len(), 4);
}

#[test]
fn test_merge_and_inspect_commands() {
    let root = TempDir::new().unwrap();
    let (config, events) = write_home(root.path(), "../peer_site");
    let unmerged = root.path().join("home/_build");
    build(&config, &events, &unmerged);
    build_peer(root.path());

    let merged = root.path().join("merged.json");
    let output = run(&[
        "--config",
        config.to_str().unwrap(),
        "merge",
        "--graph",
        unmerged.join("graph.json").to_str().unwrap(),
        "--out",
        merged.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let graph = read_graph(&merged);
    assert!(graph.vertices.iter().all(|v| v.label != "intersphinx"));

    let output = run(&["inspect", "--graph", merged.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("vertices: 5"));
    assert!(stdout.contains("external_project: 2"));
}
