//! Bounded handoff queue between the poller and the display thread.
//!
//! A single `Mutex<VecDeque<_>>` guards `push`, `drain_all` and `clear`, so a
//! clear during a ticker switch can never interleave with a half-finished drain.
//! When the queue is full the oldest snapshot is dropped to admit the newest one.
use std::collections::VecDeque;
use std::sync::Mutex;

use log::debug;
use options_common::model::FetchResult;
use options_common::{Result, TrackerError};

/// Thread-safe, bounded, drop-oldest queue of `FetchResult`s.
#[derive(Debug)]
pub struct HandoffChannel {
    queue: Mutex<VecDeque<FetchResult>>,
    capacity: usize,
}

impl HandoffChannel {
    /// Create a channel holding at most `capacity` snapshots.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TrackerError::InvalidConfig(
                "handoff capacity must be at least 1".to_string(),
            ));
        }
        Ok(HandoffChannel {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        })
    }

    /// Enqueue without blocking. Returns how many old snapshots were dropped to make room.
    pub fn push(&self, result: FetchResult) -> Result<usize> {
        let mut queue = self.queue.lock()?;
        let mut dropped = 0;
        while queue.len() >= self.capacity {
            if let Some(old) = queue.pop_front() {
                debug!(
                    "handoff full, dropping {} {} fetched at {}",
                    old.ticker, old.generation, old.fetched_at
                );
                dropped += 1;
            }
        }
        queue.push_back(result);
        Ok(dropped)
    }

    /// Remove and return everything queued, oldest first.
    pub fn drain_all(&self) -> Result<Vec<FetchResult>> {
        let mut queue = self.queue.lock()?;
        Ok(queue.drain(..).collect())
    }

    /// Discard everything queued. Returns how many snapshots were discarded.
    pub fn clear(&self) -> Result<usize> {
        let mut queue = self.queue.lock()?;
        let discarded = queue.len();
        queue.clear();
        Ok(discarded)
    }

    /// Number of queued snapshots.
    pub fn len(&self) -> Result<usize> {
        Ok(self.queue.lock()?.len())
    }

    /// `true` when nothing is queued.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.queue.lock()?.is_empty())
    }

    /// Maximum number of queued snapshots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
