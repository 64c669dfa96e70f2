use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::error::QueueEmpty;
use crate::{Priority, Queue};

struct Sequenced<P, T> {
    priority: P,
    seq: u64,
    item: T,
}

// Ordered by (priority, seq) only, the item never takes part.
impl<P: Ord, T> Ord for Sequenced<P, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then(self.seq.cmp(&other.seq))
    }
}

impl<P: Ord, T> PartialOrd for Sequenced<P, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: Ord, T> PartialEq for Sequenced<P, T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<P: Ord, T> Eq for Sequenced<P, T> {}

/// A priority queue with one heap entry per value.
///
/// Ties are broken by a sequence number assigned at push time. Every push and
/// pop costs O(log n) in the number of values rather than the number of
/// distinct priorities.
pub struct SequencedHeap<P, T> {
    heap: BinaryHeap<Reverse<Sequenced<P, T>>>,
    seq: u64,
}

impl<P: Priority, T> SequencedHeap<P, T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    pub fn push(&mut self, priority: P, item: T) {
        self.heap.push(Reverse(Sequenced {
            priority,
            seq: self.seq,
            item,
        }));
        self.seq += 1;
    }

    pub fn push_default(&mut self, item: T)
    where
        P: Default,
    {
        self.push(P::default(), item);
    }

    pub fn push_opt(&mut self, priority: Option<P>, item: T)
    where
        P: Default,
    {
        self.push(priority.unwrap_or_default(), item);
    }

    pub fn pop(&mut self) -> Result<T, QueueEmpty> {
        self.heap
            .pop()
            .map(|Reverse(entry)| entry.item)
            .ok_or(QueueEmpty)
    }

    pub fn peek(&self) -> Result<(P, &T), QueueEmpty> {
        self.heap
            .peek()
            .map(|Reverse(entry)| (entry.priority, &entry.item))
            .ok_or(QueueEmpty)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl<P: Priority, T> Default for SequencedHeap<P, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Priority + Default, T> Queue<P, T> for SequencedHeap<P, T> {
    fn name(&self) -> String {
        "sequenced".to_string()
    }

    fn push_opt(&mut self, priority: Option<P>, item: T) {
        SequencedHeap::push_opt(self, priority, item);
    }

    fn pop(&mut self) -> Result<T, QueueEmpty> {
        SequencedHeap::pop(self)
    }

    fn len(&self) -> usize {
        SequencedHeap::len(self)
    }
}
