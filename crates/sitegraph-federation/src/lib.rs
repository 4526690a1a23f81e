//! Cross-project federation for Sitegraph
//!
//! This crate fetches the graph documents published by peer projects and
//! splices them into the home graph, replacing reference stubs with the
//! peer's real pages.

pub mod error;
pub mod fetch;
pub mod merge;


pub use error::FetchError;
pub use fetch::{GraphSource, PeerLocation, DefaultSource, DEFAULT_TIMEOUT};
pub use merge::{PeerGraph, MergeOutcome, FederationReport, SkippedPeer, merge_peer, merge_peers};
