//! Glossary term statistics

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::events::TermReference;

/// How many terms are listed in [`TermStats::top_terms`].
pub const TOP_TERMS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStats {
    pub total_terms: usize,
    pub total_references: usize,
    pub referencing_pages: usize,
    pub top_terms: Vec<TermCount>,
}

/// Summarise term references. Ties in the top list are broken alphabetically.
pub fn term_statistics(terms: &[TermReference]) -> TermStats {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    let mut pages: HashSet<&str> = HashSet::new();
    for reference in terms {
        *counts.entry(reference.term.as_str()).or_insert(0) += 1;
        pages.insert(reference.source_doc.as_str());
    }

    let mut ranked: Vec<TermCount> = counts
        .iter()
        .map(|(term, count)| TermCount {
            term: term.to_string(),
            count: *count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    ranked.truncate(TOP_TERMS);

    TermStats {
        total_terms: counts.len(),
        total_references: terms.len(),
        referencing_pages: pages.len(),
        top_terms: ranked,
    }
}
