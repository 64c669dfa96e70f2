use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use crate::Priority;

use log::trace;

/// Per-priority FIFO buckets.
///
/// Knows nothing about ordering between priorities; that is the job of
/// [`PriorityIndex`](crate::index::PriorityIndex).
#[derive(Debug, Clone)]
pub struct BucketStore<P, T> {
    buckets: HashMap<P, VecDeque<T>>,
}

impl<P: Priority, T> BucketStore<P, T> {
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    /// Make sure a bucket exists for `priority`. Returns true if it had to be
    /// created, which tells the caller to register the priority in the index.
    pub fn ensure_bucket(&mut self, priority: P) -> bool {
        match self.buckets.entry(priority) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                trace!("creating bucket for priority {:?}", priority);
                slot.insert(VecDeque::new());
                true
            }
        }
    }

    /// Append to an existing bucket. Call `ensure_bucket` first.
    pub fn append(&mut self, priority: P, item: T) {
        let bucket = self.buckets.get_mut(&priority);
        debug_assert!(bucket.is_some(), "append to missing bucket {:?}", priority);
        if let Some(bucket) = bucket {
            bucket.push_back(item);
        }
    }

    /// Remove the oldest value at `priority`, reporting whether the bucket is
    /// now empty.
    pub fn pop_front(&mut self, priority: P) -> Option<(T, bool)> {
        let bucket = self.buckets.get_mut(&priority)?;
        let item = bucket.pop_front()?;
        Some((item, bucket.is_empty()))
    }

    pub fn front(&self, priority: P) -> Option<&T> {
        self.buckets.get(&priority)?.front()
    }

    /// Drop the bucket at `priority` if it holds nothing.
    pub fn remove_if_empty(&mut self, priority: P) -> bool {
        match self.buckets.entry(priority) {
            Entry::Occupied(slot) if slot.get().is_empty() => {
                trace!("reclaiming bucket for priority {:?}", priority);
                slot.remove();
                true
            }
            _ => false,
        }
    }

    /// True when there is no bucket at `priority` or it holds nothing.
    pub fn is_empty_at(&self, priority: P) -> bool {
        self.buckets.get(&priority).is_none_or(VecDeque::is_empty)
    }

    /// Drop every empty bucket, returning the priorities that were dropped.
    pub fn drop_empty(&mut self) -> Vec<P> {
        let dropped: Vec<P> = self
            .buckets
            .iter()
            .filter(|(_, bucket)| bucket.is_empty())
            .map(|(&priority, _)| priority)
            .collect();
        for priority in &dropped {
            self.buckets.remove(priority);
        }
        dropped
    }

    /// Number of buckets, empty ones included.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of buckets holding at least one value.
    pub fn occupied_count(&self) -> usize {
        self.buckets.values().filter(|b| !b.is_empty()).count()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

impl<P: Priority, T> Default for BucketStore<P, T> {
    fn default() -> Self {
        Self::new()
    }
}
