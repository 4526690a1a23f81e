//! Append-only event collection shared by document workers
//!
//! Workers receive an [`EventSink`] and append to it concurrently. The build
//! step owning the [`EventStore`] drains everything exactly once after all
//! workers have finished.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::model::{PageId, RawReference};

/// A reference to a glossary term made from a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TermReference {
    pub source_doc: String,
    pub term: String,
}

#[derive(Debug)]
enum Recorded {
    Reference(RawReference),
    Dependency { doc: String, included: String },
    Term(TermReference),
}

/// Everything accumulated during one build.
#[derive(Debug, Default)]
pub struct Drained {
    pub references: Vec<RawReference>,
    /// Seen identifiers in first-seen order.
    pub seen: Vec<PageId>,
    pub dependencies: Vec<(String, String)>,
    pub terms: Vec<TermReference>,
}

impl Drained {
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
            && self.seen.is_empty()
            && self.dependencies.is_empty()
            && self.terms.is_empty()
    }
}

struct SeenPages {
    order: DashMap<PageId, u64>,
    sequence: AtomicU64,
}

/// Cloneable handle handed to each worker. Thread-safe.
#[derive(Clone)]
pub struct EventSink {
    tx: Sender<Recorded>,
    seen: Arc<SeenPages>,
}

impl EventSink {
    /// Append one raw reference event.
    pub fn record_reference(&self, source: PageId, target: PageId, kind: impl Into<String>) {
        self.send(Recorded::Reference(RawReference::new(source, target, kind)));
    }

    /// Add an identifier to the known-page set. Repeated marks keep the first position.
    pub fn mark_page_seen(&self, id: PageId) {
        self.seen
            .order
            .entry(id)
            .or_insert_with(|| self.seen.sequence.fetch_add(1, Ordering::SeqCst));
    }

    pub fn record_dependency(&self, doc: impl Into<String>, included: impl Into<String>) {
        self.send(Recorded::Dependency {
            doc: doc.into(),
            included: included.into(),
        });
    }

    pub fn record_term(&self, source_doc: impl Into<String>, term: impl Into<String>) {
        self.send(Recorded::Term(TermReference {
            source_doc: source_doc.into(),
            term: term.into(),
        }));
    }

    fn send(&self, event: Recorded) {
        // The store owns the receiver, so this only fails once the store is gone.
        if self.tx.send(event).is_err() {
            tracing::warn!("Event store dropped before all events were recorded");
        }
    }
}

/// Process-wide collector for one build.
pub struct EventStore {
    sink: EventSink,
    rx: Mutex<Receiver<Recorded>>,
}

impl EventStore {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        EventStore {
            sink: EventSink {
                tx,
                seen: Arc::new(SeenPages {
                    order: DashMap::new(),
                    sequence: AtomicU64::new(0),
                }),
            },
            rx: Mutex::new(rx),
        }
    }

    /// A handle for a worker.
    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    pub fn record_reference(&self, source: PageId, target: PageId, kind: impl Into<String>) {
        self.sink.record_reference(source, target, kind);
    }

    pub fn mark_page_seen(&self, id: PageId) {
        self.sink.mark_page_seen(id);
    }

    /// Take all accumulated data. Later calls return only what arrived since.
    pub fn drain(&self) -> Drained {
        let mut drained = Drained::default();

        let rx = self.rx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for event in rx.try_iter() {
            match event {
                Recorded::Reference(reference) => drained.references.push(reference),
                Recorded::Dependency { doc, included } => drained.dependencies.push((doc, included)),
                Recorded::Term(term) => drained.terms.push(term),
            }
        }
        drop(rx);

        let order = &self.sink.seen.order;
        let mut seen: Vec<(u64, PageId)> = order
            .iter()
            .map(|entry| (*entry.value(), entry.key().clone()))
            .collect();
        seen.sort_by_key(|(sequence, _)| *sequence);
        for (_, id) in &seen {
            order.remove(id);
        }
        drained.seen = seen.into_iter().map(|(_, id)| id).collect();

        tracing::debug!(
            "Drained {} references, {} pages, {} dependencies, {} term references",
            drained.references.len(),
            drained.seen.len(),
            drained.dependencies.len(),
            drained.terms.len()
        );
        drained
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}
