use crate::links::CrawlUrl;
use std::collections::{HashSet, VecDeque};

/// FIFO work queue of URLs waiting for a visit.
///
/// A URL is held at most once at any time; [`Frontier::push`] refuses a URL
/// that is already waiting.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<CrawlUrl>,
    queued: HashSet<CrawlUrl>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(seed: CrawlUrl) -> Self {
        let mut frontier = Self::new();
        frontier.push(seed);
        frontier
    }

    /// Queue `url` at the back. Returns false if it was already waiting.
    pub fn push(&mut self, url: CrawlUrl) -> bool {
        if !self.queued.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    /// Take up to `n` URLs from the front, oldest first.
    pub fn pop_batch(&mut self, n: usize) -> Vec<CrawlUrl> {
        let take = n.min(self.queue.len());
        let batch: Vec<CrawlUrl> = self.queue.drain(..take).collect();
        for url in &batch {
            self.queued.remove(url);
        }
        batch
    }

    pub fn contains(&self, url: &CrawlUrl) -> bool {
        self.queued.contains(url)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Grow-only record of visited URLs, remembering visit order.
#[derive(Debug, Default)]
pub struct VisitedSet {
    order: Vec<CrawlUrl>,
    seen: HashSet<CrawlUrl>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `url` visited. Returns false if it already was.
    pub fn insert(&mut self, url: CrawlUrl) -> bool {
        if !self.seen.insert(url.clone()) {
            return false;
        }
        self.order.push(url);
        true
    }

    pub fn contains(&self, url: &CrawlUrl) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CrawlUrl> {
        self.order.iter()
    }

    pub fn into_vec(self) -> Vec<CrawlUrl> {
        self.order
    }
}
