//! Crawl frontier: the queue of (URL, depth) pairs awaiting a fetch
//!
//! This module handles:
//! - Deduplication of URLs across the whole run (the visited set)
//! - Enforcement of the maximum crawl depth on insertion
//! - Breadth-first ordering: lower depths are always handed out first, and a
//!   whole depth layer can be taken at once for concurrent dispatch

use crate::state::CrawlTarget;
use std::collections::{BTreeMap, HashSet, VecDeque};

/// Set of normalized URLs already enqueued or fetched in this run
///
/// Membership check and insertion are a single operation, so a URL can never be
/// accepted twice.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<String>,
}

impl VisitedSet {
    /// Creates an empty visited set
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a URL, returning false if it was already present
    pub fn insert(&mut self, url: &str) -> bool {
        self.seen.insert(url.to_string())
    }

    /// Returns whether a URL has been seen
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Number of distinct URLs seen
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns whether nothing has been seen yet
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Outcome of offering a target to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Accepted and queued
    Queued,
    /// URL already enqueued or fetched earlier in the run
    Duplicate,
    /// Target depth exceeds the maximum crawl depth
    TooDeep,
}

/// Frontier manages pending crawl targets, grouped by depth
pub struct Frontier {
    /// Maximum depth a target may have
    max_depth: u32,

    /// URLs accepted so far in this run
    visited: VisitedSet,

    /// Pending targets keyed by depth, each layer in discovery order
    layers: BTreeMap<u32, VecDeque<CrawlTarget>>,
}

impl Frontier {
    /// Creates an empty frontier for a crawl limited to `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            visited: VisitedSet::new(),
            layers: BTreeMap::new(),
        }
    }

    /// Offers a target, reporting why it was rejected if it was
    ///
    /// A URL already seen is a duplicate at any depth. Unseen targets deeper
    /// than the maximum depth are rejected without entering the visited set.
    pub fn try_push(&mut self, target: CrawlTarget) -> PushOutcome {
        if self.visited.contains(target.url.as_str()) {
            return PushOutcome::Duplicate;
        }

        if target.depth > self.max_depth {
            return PushOutcome::TooDeep;
        }

        self.visited.insert(target.url.as_str());

        self.layers
            .entry(target.depth)
            .or_default()
            .push_back(target);

        PushOutcome::Queued
    }

    /// Adds a target to the frontier
    ///
    /// Returns false (and does nothing) if the URL was already seen or the
    /// target is deeper than the maximum depth.
    pub fn push(&mut self, target: CrawlTarget) -> bool {
        self.try_push(target) == PushOutcome::Queued
    }

    /// Records a URL as fetched without queueing it
    ///
    /// Used for the final URL of a redirected page, so later links to it are
    /// duplicates. Returns false if the URL was already seen.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url)
    }

    /// Removes the next target, shallowest depth first
    pub fn pop(&mut self) -> Option<CrawlTarget> {
        let mut entry = self.layers.first_entry()?;
        let target = entry.get_mut().pop_front();
        if entry.get().is_empty() {
            entry.remove();
        }
        target
    }

    /// Removes and returns every pending target of the shallowest depth
    ///
    /// Targets are returned in the order they were pushed.
    pub fn take_layer(&mut self) -> Vec<CrawlTarget> {
        self.layers
            .pop_first()
            .map(|(_, layer)| layer.into_iter().collect())
            .unwrap_or_default()
    }

    /// Depth of the next layer, if any targets are pending
    pub fn current_depth(&self) -> Option<u32> {
        self.layers.keys().next().copied()
    }

    /// Number of pending targets
    pub fn len(&self) -> usize {
        self.layers.values().map(VecDeque::len).sum()
    }

    /// Returns whether no targets are pending
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Returns whether a URL was ever accepted into the frontier
    pub fn has_seen(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Number of distinct URLs accepted during the run
    pub fn seen_count(&self) -> usize {
        self.visited.len()
    }

    /// Maximum depth enforced on insertion
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}
