//! Dedup ledger of already-posted image URLs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Append-only set of image URLs that have already been published.
///
/// Membership is exact string equality; URLs are never normalized. A sorted
/// set keeps the serialized snapshot deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DedupLedger {
    entries: BTreeSet<String>,
}

impl DedupLedger {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains(url)
    }

    /// Keep only candidates not yet in the ledger, preserving their
    /// original relative order.
    pub fn filter_unseen(&self, candidates: &[String]) -> Vec<String> {
        candidates
            .iter()
            .filter(|url| !self.entries.contains(*url))
            .cloned()
            .collect()
    }

    /// Record URLs as posted. Re-inserting a known URL is a no-op, so a
    /// replay after a partial failure cannot corrupt the ledger.
    pub fn commit<I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.entries.extend(urls);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
