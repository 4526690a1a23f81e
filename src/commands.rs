//! CLI command implementations

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::Context;
use rayon::prelude::*;
use sitegraph_core::{
    EventSink, EventStore, GraphDocument, HostEvent, ReferenceContext, SiteGraph, Titles, aggregate,
    build_inclusion_graph, build_toctree, flat_links, flat_nodes, ingest_reference, js_assignment, render,
    term_statistics,
};
use sitegraph_federation::{DefaultSource, merge_peers};

use crate::config::Config;

/// Host events split by who consumes them.
#[derive(Default)]
struct HostInput {
    titles: Titles,
    toctree: Vec<(String, Vec<String>)>,
    /// Reference and dependency events grouped per document.
    documents: Vec<(String, Vec<HostEvent>)>,
}

fn read_events(path: &Path) -> anyhow::Result<HostInput> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open events file {}", path.display()))?;

    let mut input = HostInput::default();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for (line_no, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: HostEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Skipping malformed event on line {}: {}", line_no + 1, e);
                skipped += 1;
                continue;
            }
        };
        match event {
            HostEvent::Title { doc_id, text } => {
                input.titles.insert(doc_id, text);
            }
            HostEvent::Toctree { parent, children } => input.toctree.push((parent, children)),
            other => {
                let doc = other.document().to_string();
                let slot = *positions.entry(doc.clone()).or_insert_with(|| {
                    input.documents.push((doc, Vec::new()));
                    input.documents.len() - 1
                });
                input.documents[slot].1.push(other);
            }
        }
    }

    tracing::info!(
        "Read {} documents, {} titles from {} ({} malformed lines skipped)",
        input.documents.len(),
        input.titles.len(),
        path.display(),
        skipped
    );
    Ok(input)
}

/// Work done by one worker for one document.
fn process_document(sink: &EventSink, events: &[HostEvent], ctx: ReferenceContext<'_>) {
    for event in events {
        match event {
            HostEvent::Reference(reference) => {
                ingest_reference(sink, reference, ctx);
            }
            HostEvent::Dependency { doc_id, included_file } => sink.record_dependency(doc_id, included_file),
            HostEvent::Title { .. } | HostEvent::Toctree { .. } => {}
        }
    }
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

async fn federate(config: &Config, graph: &mut SiteGraph) {
    let peers = config.peer_locations(&config.project_table());
    if peers.is_empty() {
        return;
    }
    let source = DefaultSource::new(config.fetch_timeout());
    let report = merge_peers(graph, &peers, &source, &config.source_dir()).await;
    tracing::info!(
        "Federation: {} peers merged, {} skipped",
        report.merged.len(),
        report.skipped.len()
    );
}

pub async fn build(config: &Config, events_path: &Path, out: &Path, jobs: Option<usize>) -> anyhow::Result<()> {
    let input = read_events(events_path)?;
    let projects = config.project_table();
    let inventories = config.inventories();
    let ctx = ReferenceContext {
        projects: &projects,
        inventories: &inventories,
    };

    let store = EventStore::new();
    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool.build().context("Failed to start worker pool")?;
    pool.install(|| {
        input
            .documents
            .par_iter()
            .for_each_with(store.sink(), |sink, (_, events)| process_document(sink, events, ctx));
    });

    let drained = store.drain();
    let classifier = config.classifier();
    let (nodes, edges) = aggregate(&drained.references, &drained.seen, &input.titles, &classifier);
    let mut graph = SiteGraph::from_parts(nodes, edges);
    tracing::info!("Built graph: {} nodes, {} edges", graph.node_count(), graph.edge_count());

    federate(config, &mut graph).await;

    let document = render(&graph, &config.clusters);
    write_file(&out.join(&config.graph_document), &document.to_json_pretty()?)?;

    let js = out.join("js");
    write_file(&js.join("nodes.js"), &js_assignment("nodes_data", &flat_nodes(&graph))?)?;
    write_file(&js.join("links.js"), &js_assignment("links_data", &flat_links(&graph))?)?;
    let toctree = build_toctree(&input.toctree, &input.titles, &config.root_doc);
    write_file(&js.join("toctree.js"), &js_assignment("toctree", &toctree)?)?;
    let includes = build_inclusion_graph(&drained.dependencies);
    write_file(&js.join("includes.js"), &js_assignment("includes_data", &includes)?)?;
    let glossary = term_statistics(&drained.terms);
    write_file(&js.join("glossary.js"), &js_assignment("glossary_data", &glossary)?)?;

    tracing::info!("Wrote outputs to {}", out.display());
    Ok(())
}

fn read_document(path: &Path) -> anyhow::Result<GraphDocument> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph document {}", path.display()))?;
    GraphDocument::from_json(&json).with_context(|| format!("Invalid graph document {}", path.display()))
}

pub async fn merge(config: &Config, graph_path: &Path, out: &Path) -> anyhow::Result<()> {
    let mut graph = read_document(graph_path)?.to_site_graph();
    tracing::info!("Loaded graph: {} nodes, {} edges", graph.node_count(), graph.edge_count());

    federate(config, &mut graph).await;

    let document = render(&graph, &config.clusters);
    write_file(out, &document.to_json_pretty()?)?;
    tracing::info!("Wrote merged graph to {}", out.display());
    Ok(())
}

pub fn inspect(graph_path: &Path) -> anyhow::Result<()> {
    let document = read_document(graph_path)?;
    let mut by_label: HashMap<&str, usize> = HashMap::new();
    for vertex in &document.vertices {
        *by_label.entry(vertex.label.as_str()).or_insert(0) += 1;
    }
    let mut labels: Vec<_> = by_label.into_iter().collect();
    labels.sort();

    println!("vertices: {}", document.vertices.len());
    for (label, count) in labels {
        println!("  {label}: {count}");
    }
    println!("edges: {}", document.edges.len());
    println!("clusters: {}", document.clusters.len());
    for cluster in &document.clusters {
        let hidden = if cluster.default_hidden == Some(true) { " (hidden)" } else { "" };
        println!("  {}{}", cluster.name, hidden);
    }
    Ok(())
}
