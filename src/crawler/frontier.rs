//! URL frontier for a single-origin crawl
//!
//! The frontier owns four sets of bookkeeping:
//! - `queue`: URLs waiting for a worker (FIFO, retries go to the front)
//! - `in_flight`: URLs handed to a worker and not yet completed
//! - `visited`: URLs with a terminal outcome (written or permanently failed)
//! - `discovered`: every URL ever accepted; never shrinks
//!
//! A URL is in at most one of `queue`, `in_flight` and `visited` at a time,
//! and `discovered` is a superset of all three.

use crate::config::CrawlJob;
use crate::url::{is_same_domain, ExcludeMatcher};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Outcome of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueDecision {
    /// Added to the back of the queue
    Accepted,
    /// Host differs from the origin domain
    OffDomain,
    AlreadyVisited,
    AlreadyQueued,
    /// Currently being processed by a worker
    InFlight,
    /// Matched an exclude pattern
    Excluded,
    /// Accepting it would exceed the page cap
    LimitReached,
}

impl EnqueueDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Discovered/visited bookkeeping and the work queue
#[derive(Debug, Clone)]
pub struct Frontier {
    origin_domain: String,
    exclude: ExcludeMatcher,
    max_pages: usize,

    queue: VecDeque<Url>,
    queued: HashSet<String>,
    in_flight: HashSet<String>,
    visited: HashSet<String>,
    discovered: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier confined to `origin_domain`
    pub fn new(
        origin_domain: impl Into<String>,
        exclude: ExcludeMatcher,
        max_pages: usize,
    ) -> Self {
        Self {
            origin_domain: origin_domain.into(),
            exclude,
            max_pages,
            queue: VecDeque::new(),
            queued: HashSet::new(),
            in_flight: HashSet::new(),
            visited: HashSet::new(),
            discovered: HashSet::new(),
        }
    }

    /// Creates an empty frontier using the job's origin, excludes and page cap
    pub fn for_job(job: &CrawlJob) -> Self {
        Self::new(job.origin_domain.clone(), job.exclude.clone(), job.max_pages)
    }

    /// Offers a normalized URL to the frontier
    ///
    /// The URL is accepted only if it is on the origin host, has not been
    /// visited, is neither queued nor in flight, matches no exclude pattern,
    /// and the page cap still has room. Accepted URLs join the back of the
    /// queue and the discovered set.
    pub fn enqueue(&mut self, url: &Url) -> EnqueueDecision {
        if !is_same_domain(url, &self.origin_domain) {
            return EnqueueDecision::OffDomain;
        }

        let key = url.as_str();
        if self.visited.contains(key) {
            return EnqueueDecision::AlreadyVisited;
        }
        if self.queued.contains(key) {
            return EnqueueDecision::AlreadyQueued;
        }
        if self.in_flight.contains(key) {
            return EnqueueDecision::InFlight;
        }
        if self.exclude.is_excluded(key) {
            return EnqueueDecision::Excluded;
        }
        if self.committed() >= self.max_pages {
            return EnqueueDecision::LimitReached;
        }

        self.queued.insert(key.to_string());
        self.discovered.insert(key.to_string());
        self.queue.push_back(url.clone());
        EnqueueDecision::Accepted
    }

    /// Takes up to `n` URLs from the head of the queue and marks them in flight
    pub fn dequeue_up_to(&mut self, n: usize) -> Vec<Url> {
        let take = n.min(self.queue.len());
        let mut batch = Vec::with_capacity(take);

        for _ in 0..take {
            if let Some(url) = self.queue.pop_front() {
                self.queued.remove(url.as_str());
                self.in_flight.insert(url.to_string());
                batch.push(url);
            }
        }

        batch
    }

    /// Takes every queued URL and marks them in flight
    pub fn dequeue_all(&mut self) -> Vec<Url> {
        self.dequeue_up_to(self.queue.len())
    }

    /// Puts an in-flight URL back at the head of the queue for a retry
    pub fn requeue_front(&mut self, url: Url) {
        let key = url.to_string();
        if self.visited.contains(&key) || self.queued.contains(&key) {
            return;
        }

        self.in_flight.remove(&key);
        self.discovered.insert(key.clone());
        self.queued.insert(key);
        self.queue.push_front(url);
    }

    /// Records a terminal outcome: the URL leaves flight and becomes visited
    pub fn complete(&mut self, url: &Url) {
        self.in_flight.remove(url.as_str());
        self.visited.insert(url.to_string());
    }

    /// Drops an in-flight URL without visiting it
    pub fn release(&mut self, url: &Url) {
        self.in_flight.remove(url.as_str());
    }

    /// Rebuilds the frontier from a checkpoint
    ///
    /// Entries of `to_visit` that are already visited, unparseable or no
    /// longer acceptable are dropped; the rest are queued in their saved
    /// order. Existing state is replaced.
    pub fn restore<V, T, D>(&mut self, visited: V, to_visit: T, discovered: D)
    where
        V: IntoIterator<Item = String>,
        T: IntoIterator<Item = String>,
        D: IntoIterator<Item = String>,
    {
        self.queue.clear();
        self.queued.clear();
        self.in_flight.clear();
        self.visited = visited.into_iter().collect();
        self.discovered = discovered.into_iter().collect();
        self.discovered.extend(self.visited.iter().cloned());

        for raw in to_visit {
            match Url::parse(&raw) {
                Ok(url) => {
                    let decision = self.enqueue(&url);
                    if !decision.is_accepted() {
                        tracing::debug!("Dropping restored URL {} ({:?})", raw, decision);
                    }
                }
                Err(e) => tracing::warn!("Dropping unparseable restored URL {}: {}", raw, e),
            }
        }
    }

    /// Returns true when nothing is queued and nothing is in flight
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn discovered_len(&self) -> usize {
        self.discovered.len()
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Visited URLs, sorted
    pub fn visited_sorted(&self) -> Vec<String> {
        sorted(&self.visited)
    }

    /// Discovered URLs, sorted
    pub fn discovered_sorted(&self) -> Vec<String> {
        sorted(&self.discovered)
    }

    /// URLs still owed work: in-flight URLs first (sorted), then the queue in order
    ///
    /// This is what a checkpoint saves as `toVisit`, so a crash mid-fetch
    /// retries the interrupted pages on resume.
    pub fn pending(&self) -> Vec<String> {
        let mut pending = sorted(&self.in_flight);
        pending.extend(self.queue.iter().map(|url| url.to_string()));
        pending
    }

    /// URLs counted against the page cap
    fn committed(&self) -> usize {
        self.visited.len() + self.queue.len() + self.in_flight.len()
    }
}

fn sorted(set: &HashSet<String>) -> Vec<String> {
    let mut items: Vec<String> = set.iter().cloned().collect();
    items.sort();
    items
}
