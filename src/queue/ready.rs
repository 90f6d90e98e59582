// src/queue/ready.rs

//! Min-ordered queue of ready jobs.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::job::{JobKey, Priority};

/// Ordering key of a ready job: `(priority, sequence)`.
///
/// The derived `Ord` compares `priority` first and then the submission
/// sequence carried by `key`. Sequences are unique, so two entries never
/// compare equal and equal priorities come out in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueEntry {
    pub priority: Priority,
    pub key: JobKey,
}

/// Priority queue over ready jobs.
///
/// `BinaryHeap` is a max-heap, so entries are stored wrapped in `Reverse`
/// to pop the smallest `(priority, sequence)` first.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    heap: BinaryHeap<Reverse<QueueEntry>>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a ready job. O(log n).
    pub fn push(&mut self, priority: Priority, key: JobKey) {
        trace!(?priority, sequence = key.sequence(), "ready queue push");
        self.heap.push(Reverse(QueueEntry { priority, key }));
    }

    /// Remove and return the entry with the smallest `(priority, sequence)`.
    /// O(log n). `None` simply means nothing is ready.
    pub fn pop_min(&mut self) -> Option<QueueEntry> {
        self.heap.pop().map(|Reverse(entry)| entry)
    }

    /// The entry `pop_min` would return, without removing it. O(1).
    pub fn peek_min(&self) -> Option<QueueEntry> {
        self.heap.peek().map(|Reverse(entry)| *entry)
    }

    /// Remove a specific job from the queue. O(n).
    ///
    /// Only used off the dispatch path (purging, or completing a job that
    /// was never dispatched). Returns whether the job was present.
    pub fn remove(&mut self, key: JobKey) -> bool {
        let before = self.heap.len();
        self.heap.retain(|Reverse(entry)| entry.key != key);
        self.heap.len() != before
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
