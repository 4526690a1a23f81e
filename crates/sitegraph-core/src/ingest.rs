//! Translation of host build events into recorded graph events

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::events::EventSink;
use crate::model::PageId;
use crate::paths;
use crate::resolver::{Inventory, ProjectTable};

/// Event emitted by the documentation host while processing documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    Reference(ReferenceEvent),
    Title { doc_id: String, text: String },
    Dependency { doc_id: String, included_file: String },
    Toctree { parent: String, children: Vec<String> },
}

impl HostEvent {
    /// Document whose processing produced this event.
    pub fn document(&self) -> &str {
        match self {
            HostEvent::Reference(reference) => &reference.source_doc,
            HostEvent::Title { doc_id, .. } | HostEvent::Dependency { doc_id, .. } => doc_id,
            HostEvent::Toctree { parent, .. } => parent,
        }
    }
}

/// A hyperlink-like node found in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEvent {
    pub source_doc: String,
    pub target_url: String,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub classes: BTreeSet<String>,
    /// Rendered link text, used for glossary terms.
    #[serde(default)]
    pub text: Option<String>,
    /// Target already encoded by the host (`external:<project>:<url>`, the
    /// legacy `external:<url>`, or a page path). Takes precedence over
    /// `target_url`.
    #[serde(default)]
    pub target_key: Option<String>,
}

/// Lookup tables needed to classify external targets.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceContext<'a> {
    pub projects: &'a ProjectTable,
    pub inventories: &'a HashMap<String, Inventory>,
}

/// Edge type for an internal reference, from its role classes.
pub fn reference_type(classes: &BTreeSet<String>) -> &'static str {
    if classes.contains("std-term") {
        "term"
    } else if classes.contains("std-doc") {
        "doc"
    } else {
        "ref"
    }
}

/// Record one host reference. Returns false when the target was dropped.
///
/// Internal targets become page-to-page references. External targets are kept
/// only when they fall under a known project; any other URL is dropped.
pub fn ingest_reference(sink: &EventSink, event: &ReferenceEvent, ctx: ReferenceContext<'_>) -> bool {
    if let Some(key) = event.target_key.as_deref().filter(|k| !k.is_empty()) {
        ingest_encoded(sink, event, key);
        return true;
    }
    if event.target_url.is_empty() {
        return false;
    }
    let source = PageId::for_doc(&event.source_doc);

    if event.internal {
        let target = PageId::Internal(paths::resolve_internal(&event.source_doc, &event.target_url));
        let kind = reference_type(&event.classes);
        if kind == "term" {
            sink.record_term(&event.source_doc, term_name(event));
        }
        sink.record_reference(source.clone(), target.clone(), kind);
        sink.mark_page_seen(source);
        sink.mark_page_seen(target);
        return true;
    }

    let url = paths::strip_fragment(&event.target_url);
    let Some(project) = ctx.projects.resolve_project(url) else {
        return false;
    };
    let display = ctx
        .inventories
        .get(&project.name)
        .and_then(|inventory| inventory.resolve_display_name(&event.target_url));
    let target = PageId::intersphinx(&project.name, url, display);

    sink.record_reference(source.clone(), target.clone(), "intersphinx");
    sink.mark_page_seen(source);
    sink.mark_page_seen(target);
    true
}

fn ingest_encoded(sink: &EventSink, event: &ReferenceEvent, key: &str) {
    let source = PageId::for_doc(&event.source_doc);
    let target = PageId::parse(key);
    let kind = if target.is_internal() {
        reference_type(&event.classes)
    } else {
        "intersphinx"
    };
    tracing::debug!("Recorded encoded target {} from {}", target, event.source_doc);
    sink.record_reference(source.clone(), target.clone(), kind);
    sink.mark_page_seen(source);
    sink.mark_page_seen(target);
}

fn term_name(event: &ReferenceEvent) -> String {
    if let Some(text) = event.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return text.to_lowercase();
    }
    let (_, fragment) = paths::split_fragment(&event.target_url);
    let fragment = fragment.unwrap_or(&event.target_url);
    fragment.strip_prefix("term-").unwrap_or(fragment).to_lowercase()
}
