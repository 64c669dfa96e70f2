use std::collections::HashSet;

use log::{debug, trace};

use crate::bucket::BucketStore;
use crate::error::QueueEmpty;
use crate::index::PriorityIndex;
use crate::policy::Reclamation;
use crate::{Priority, Queue};

/// A bucketed priority queue which pops the lowest priority first and keeps
/// FIFO order among equal priorities.
///
/// Only distinct priorities go into the heap. Values sharing a priority wait
/// in that priority's bucket, so pushing onto an existing priority is O(1) and
/// the heap never grows with the number of values.
pub struct PriorityQueue<P, T> {
    index: PriorityIndex<P>,
    buckets: BucketStore<P, T>,
    policy: Reclamation,
    len: usize,
}

impl<P: Priority, T> PriorityQueue<P, T> {
    pub fn new() -> Self {
        Self::with_policy(Reclamation::default())
    }

    pub fn with_policy(policy: Reclamation) -> Self {
        Self {
            index: PriorityIndex::new(),
            buckets: BucketStore::new(),
            policy,
            len: 0,
        }
    }

    pub fn policy(&self) -> Reclamation {
        self.policy
    }

    pub fn push(&mut self, priority: P, item: T) {
        // A bucket that already exists (even an empty one left by a lazy pop)
        // is already indexed.
        if self.buckets.ensure_bucket(priority) {
            self.index.insert(priority);
        }
        self.buckets.append(priority, item);
        self.len += 1;
    }

    /// Push at the neutral priority, `P::default()`.
    pub fn push_default(&mut self, item: T)
    where
        P: Default,
    {
        self.push(P::default(), item);
    }

    /// Push with an optional priority; `None` is the same as `P::default()`.
    pub fn push_opt(&mut self, priority: Option<P>, item: T)
    where
        P: Default,
    {
        self.push(priority.unwrap_or_default(), item);
    }

    /// Remove and return the oldest value at the lowest priority.
    pub fn pop(&mut self) -> Result<T, QueueEmpty> {
        if self.len == 0 {
            return Err(QueueEmpty);
        }
        let priority = self.min_priority()?;
        let (item, now_empty) = self.buckets.pop_front(priority).ok_or(QueueEmpty)?;
        self.len -= 1;

        if now_empty && self.policy == Reclamation::Eager {
            self.index.extract_min()?;
            self.buckets.remove_if_empty(priority);
        }

        Ok(item)
    }

    /// The value `pop` would return next, with its priority.
    ///
    /// Takes `&mut self` because the lazy policy may discard stale index
    /// entries on the way.
    pub fn peek(&mut self) -> Result<(P, &T), QueueEmpty> {
        if self.len == 0 {
            return Err(QueueEmpty);
        }
        let priority = self.min_priority()?;
        let item = self.buckets.front(priority).ok_or(QueueEmpty)?;
        Ok((priority, item))
    }

    /// Total number of values across all priorities.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_non_empty(&self) -> bool {
        !self.is_empty()
    }

    /// Number of distinct priorities that currently hold values.
    pub fn priority_count(&self) -> usize {
        match self.policy {
            Reclamation::Eager => self.index.len(),
            Reclamation::Lazy => self.buckets.occupied_count(),
        }
    }

    /// Number of priorities in the index, stale ones included.
    pub fn indexed_priorities(&self) -> usize {
        self.index.len()
    }

    /// Drop the buckets (and, for the lazy policy, the index entries) of
    /// priorities that no longer hold values. Returns how many were dropped.
    ///
    /// Never changes what later pops return.
    pub fn compact(&mut self) -> usize {
        let dropped = self.buckets.drop_empty();
        if dropped.is_empty() {
            return 0;
        }
        // The index must lose these too: a later push would otherwise create
        // a fresh bucket and index the same priority a second time.
        let dropped_set: HashSet<P> = dropped.iter().copied().collect();
        self.index.retain(|p| !dropped_set.contains(p));
        debug!(
            "compacted {} empty buckets, {} priorities still indexed",
            dropped.len(),
            self.index.len()
        );
        dropped.len()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.buckets.clear();
        self.len = 0;
    }

    /// Pop every value in order.
    pub fn drain(&mut self) -> Drain<'_, P, T> {
        Drain { queue: self }
    }

    /// Lowest priority whose bucket holds a value, discarding stale entries
    /// on the way.
    fn min_priority(&mut self) -> Result<P, QueueEmpty> {
        loop {
            let priority = self.index.peek_min()?;
            if !self.buckets.is_empty_at(priority) {
                return Ok(priority);
            }
            trace!("skipping stale priority {:?}", priority);
            self.index.extract_min()?;
            self.buckets.remove_if_empty(priority);
        }
    }
}

impl<P: Priority, T> Default for PriorityQueue<P, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Priority, T> Extend<(P, T)> for PriorityQueue<P, T> {
    fn extend<I: IntoIterator<Item = (P, T)>>(&mut self, iter: I) {
        for (priority, item) in iter {
            self.push(priority, item);
        }
    }
}

impl<P: Priority, T> FromIterator<(P, T)> for PriorityQueue<P, T> {
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let mut queue = Self::new();
        queue.extend(iter);
        queue
    }
}

impl<P: Priority + Default, T> Queue<P, T> for PriorityQueue<P, T> {
    fn name(&self) -> String {
        self.policy.to_string()
    }

    fn push_opt(&mut self, priority: Option<P>, item: T) {
        PriorityQueue::push_opt(self, priority, item);
    }

    fn pop(&mut self) -> Result<T, QueueEmpty> {
        PriorityQueue::pop(self)
    }

    fn len(&self) -> usize {
        PriorityQueue::len(self)
    }

    fn compact(&mut self) {
        PriorityQueue::compact(self);
    }
}

/// Iterator returned by [`PriorityQueue::drain`].
pub struct Drain<'a, P: Priority, T> {
    queue: &'a mut PriorityQueue<P, T>,
}

impl<P: Priority, T> Iterator for Drain<'_, P, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.pop().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.queue.len(), Some(self.queue.len()))
    }
}

impl<P: Priority, T> ExactSizeIterator for Drain<'_, P, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequenced::SequencedHeap;
    use crate::testing::{Op, POLICIES, init_test, random_ops};

    fn drain_all<T>(pq: &mut PriorityQueue<i32, T>) -> Vec<T> {
        pq.drain().collect()
    }

    #[test]
    fn test_push_pop_single() {
        for policy in POLICIES {
            let mut pq = PriorityQueue::with_policy(policy);
            pq.push(10, "hello");
            assert_eq!(pq.pop(), Ok("hello"));
            assert_eq!(pq.pop(), Err(QueueEmpty));
        }
    }

    #[test]
    fn test_push_pop_ordered() {
        for policy in POLICIES {
            let mut pq = PriorityQueue::with_policy(policy);
            pq.push(10, "low");
            pq.push(5, "lower");
            pq.push(15, "high");

            assert_eq!(pq.pop(), Ok("lower"));
            assert_eq!(pq.pop(), Ok("low"));
            assert_eq!(pq.pop(), Ok("high"));
            assert_eq!(pq.pop(), Err(QueueEmpty));
        }
    }

    #[test]
    fn test_push_pop_same_priority() {
        for policy in POLICIES {
            let mut pq = PriorityQueue::with_policy(policy);
            pq.push(10, "first");
            pq.push(10, "second");
            pq.push(10, "third");

            assert_eq!(pq.indexed_priorities(), 1);
            assert_eq!(pq.pop(), Ok("first"));
            assert_eq!(pq.pop(), Ok("second"));
            assert_eq!(pq.pop(), Ok("third"));
            assert_eq!(pq.pop(), Err(QueueEmpty));
        }
    }

    #[test]
    fn test_push_pop_mixed() {
        for policy in POLICIES {
            let mut pq = PriorityQueue::with_policy(policy);
            pq.push(100, "a");
            pq.push(50, "b");
            assert_eq!(pq.pop(), Ok("b"));
            pq.push(25, "c");
            pq.push(75, "d");
            assert_eq!(pq.pop(), Ok("c"));
            assert_eq!(pq.pop(), Ok("d"));
            assert_eq!(pq.pop(), Ok("a"));
        }
    }

    #[test]
    fn test_extreme_priorities() {
        let mut pq = PriorityQueue::new();
        pq.push(0i64, "zero");
        pq.push(i64::MAX, "max");
        pq.push(i64::MIN, "min");
        pq.push(-1, "negative");

        assert_eq!(pq.pop(), Ok("min"));
        assert_eq!(pq.pop(), Ok("negative"));
        assert_eq!(pq.pop(), Ok("zero"));
        assert_eq!(pq.pop(), Ok("max"));
    }

    #[test]
    fn test_empty_queue() {
        for policy in POLICIES {
            let mut pq: PriorityQueue<i32, i32> = PriorityQueue::with_policy(policy);
            assert_eq!(pq.pop(), Err(QueueEmpty));
            assert!(pq.peek().is_err());
            assert_eq!(pq.len(), 0);
            assert!(pq.is_empty());
            assert!(!pq.is_non_empty());
        }
    }

    #[test]
    fn test_mixed_dataset_pops_in_order() {
        let dataset = [
            (Some(80), "8"),
            (Some(-10), "1"),
            (None, "3"),
            (Some(0), "4"),
            (None, "5"),
            (Some(10), "6"),
            (Some(100), "9"),
            (Some(50), "7"),
            (Some(-20), "0"),
            (Some(-10), "2"),
        ];
        for policy in POLICIES {
            let mut pq = PriorityQueue::with_policy(policy);
            for (priority, value) in dataset {
                pq.push_opt(priority, value);
            }
            assert_eq!(pq.len(), 10);
            assert_eq!(pq.priority_count(), 7);
            assert_eq!(
                drain_all(&mut pq),
                vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]
            );
        }
    }

    #[test]
    fn test_later_lower_priority_jumps_ahead() {
        for policy in POLICIES {
            let mut pq = PriorityQueue::with_policy(policy);
            pq.push(5, 'A');
            pq.push(5, 'B');
            pq.push(5, 'C');
            pq.push(1, 'D');
            assert_eq!(drain_all(&mut pq), vec!['D', 'A', 'B', 'C']);
        }
    }

    #[test]
    fn test_alternating_push_pop_is_fifo() {
        for policy in POLICIES {
            let mut pq = PriorityQueue::with_policy(policy);
            for p in 1..=3 {
                pq.push(p, p * 10);
                assert_eq!(pq.pop(), Ok(p * 10));
                assert!(pq.is_empty());
            }
        }
    }

    #[test]
    fn test_default_priority_equivalence() {
        for policy in POLICIES {
            let mut implicit = PriorityQueue::with_policy(policy);
            let mut explicit = PriorityQueue::with_policy(policy);
            for (i, p) in [1, 0, -1, 0, 2, 0].into_iter().enumerate() {
                if p == 0 {
                    implicit.push_default(i);
                } else {
                    implicit.push(p, i);
                }
                explicit.push(p, i);
            }
            assert_eq!(implicit.priority_count(), explicit.priority_count());
            assert_eq!(drain_all(&mut implicit), drain_all(&mut explicit));
        }
    }

    #[test]
    fn test_count_conservation() {
        for policy in POLICIES {
            let mut pq = PriorityQueue::with_policy(policy);
            for i in 0..20 {
                pq.push(i % 4, i);
            }
            for popped in 1..=20 {
                pq.pop().unwrap();
                assert_eq!(pq.len(), 20 - popped);
                assert_eq!(pq.is_non_empty(), pq.len() > 0);
            }
            assert_eq!(pq.pop(), Err(QueueEmpty));
            assert_eq!(pq.len(), 0);
        }
    }

    #[test]
    fn test_peek_matches_pop() {
        for policy in POLICIES {
            let mut pq = PriorityQueue::with_policy(policy);
            pq.push(3, "c");
            pq.push(-3, "a");
            pq.push(-3, "b");

            assert_eq!(pq.peek(), Ok((-3, &"a")));
            assert_eq!(pq.len(), 3);
            assert_eq!(pq.pop(), Ok("a"));
            assert_eq!(pq.peek(), Ok((-3, &"b")));
            assert_eq!(pq.pop(), Ok("b"));
            assert_eq!(pq.peek(), Ok((3, &"c")));
        }
    }

    #[test]
    fn test_eager_reclaims_immediately() {
        let mut pq = PriorityQueue::with_policy(Reclamation::Eager);
        pq.push(1, 'a');
        pq.push(2, 'b');
        assert_eq!(pq.pop(), Ok('a'));
        assert_eq!(pq.indexed_priorities(), 1);
        assert_eq!(pq.compact(), 0);
    }

    #[test]
    fn test_lazy_keeps_emptied_priority_until_seen() {
        let mut pq = PriorityQueue::with_policy(Reclamation::Lazy);
        pq.push(1, 'a');
        pq.push(2, 'b');
        assert_eq!(pq.pop(), Ok('a'));

        // Priority 1 is stale but still indexed
        assert_eq!(pq.indexed_priorities(), 2);
        assert_eq!(pq.priority_count(), 1);

        // Reusing it must not index it twice
        pq.push(1, 'c');
        assert_eq!(pq.indexed_priorities(), 2);
        assert_eq!(pq.pop(), Ok('c'));

        // Popping 'b' walks past the stale entry for 1
        assert_eq!(pq.pop(), Ok('b'));
        assert_eq!(pq.indexed_priorities(), 1);
        assert_eq!(pq.pop(), Err(QueueEmpty));
        assert!(pq.is_empty());
    }

    #[test]
    fn test_lazy_compact_drops_stale_entries() {
        init_test();
        let mut pq = PriorityQueue::with_policy(Reclamation::Lazy);
        for (p, v) in [(5, 'a'), (4, 'b'), (3, 'c')] {
            pq.push(p, v);
            assert_eq!(pq.pop(), Ok(v));
        }
        // Each pop emptied the minimum without reclaiming it
        assert!(pq.is_empty());
        assert_eq!(pq.indexed_priorities(), 3);
        assert_eq!(pq.compact(), 3);
        assert_eq!(pq.indexed_priorities(), 0);
        assert_eq!(pq.compact(), 0);

        pq.push(4, 'd');
        pq.push(9, 'e');
        pq.push(-1, 'f');
        assert_eq!(pq.indexed_priorities(), 3);
        assert_eq!(drain_all(&mut pq), vec!['f', 'd', 'e']);
    }

    #[test]
    fn test_compact_is_neutral() {
        init_test();
        for policy in POLICIES {
            let ops = random_ops(0xc0ffee, 2000, -8, 8);
            let mut compacted = PriorityQueue::with_policy(policy);
            let mut untouched = PriorityQueue::with_policy(policy);
            for op in ops {
                match op {
                    Op::Push(priority, id) => {
                        compacted.push_opt(priority, id);
                        untouched.push_opt(priority, id);
                    }
                    Op::Pop => {
                        compacted.compact();
                        assert_eq!(compacted.pop(), untouched.pop());
                    }
                    Op::Compact => {
                        compacted.compact();
                    }
                }
                assert_eq!(compacted.len(), untouched.len());
            }
            assert_eq!(drain_all(&mut compacted), drain_all(&mut untouched));
        }
    }

    #[test]
    fn test_matches_sequenced_heap() {
        init_test();
        for (seed, (lo, hi)) in [(1, (-4, 3)), (2, (-1024, 1024)), (3, (0, 0))] {
            for policy in POLICIES {
                let mut pq = PriorityQueue::with_policy(policy);
                let mut reference = SequencedHeap::new();
                for op in random_ops(seed, 5000, lo, hi) {
                    match op {
                        Op::Push(priority, id) => {
                            pq.push_opt(priority, id);
                            reference.push_opt(priority, id);
                        }
                        Op::Pop => assert_eq!(pq.pop(), reference.pop()),
                        Op::Compact => {
                            pq.compact();
                        }
                    }
                    assert_eq!(pq.len(), reference.len());
                    assert_eq!(pq.is_empty(), reference.is_empty());
                }
                while let Ok(expected) = reference.pop() {
                    assert_eq!(pq.pop(), Ok(expected));
                }
                assert_eq!(pq.pop(), Err(QueueEmpty));
            }
        }
    }

    #[test]
    fn test_values_need_no_ordering() {
        struct Job {
            id: u32,
        }

        let mut pq = PriorityQueue::new();
        pq.push(2, Job { id: 0 });
        pq.push(1, Job { id: 1 });
        assert_eq!(pq.pop().map(|job| job.id), Ok(1));
        assert_eq!(pq.pop().map(|job| job.id), Ok(0));
    }

    #[test]
    fn test_collect_and_clear() {
        let mut pq: PriorityQueue<i8, char> =
            [(3, 'c'), (1, 'a'), (2, 'b')].into_iter().collect();
        assert_eq!(pq.len(), 3);
        pq.clear();
        assert!(pq.is_empty());
        assert_eq!(pq.indexed_priorities(), 0);

        pq.extend([(2, 'y'), (1, 'x')]);
        assert_eq!(pq.drain().len(), 2);
        assert_eq!(pq.drain().collect::<String>(), "xy");
    }

    #[test]
    fn test_queue_trait_object() {
        let mut queues: Vec<Box<dyn Queue<i32, u32>>> = vec![
            Box::new(PriorityQueue::with_policy(Reclamation::Eager)),
            Box::new(PriorityQueue::with_policy(Reclamation::Lazy)),
            Box::new(SequencedHeap::new()),
        ];
        let names: Vec<String> = queues.iter().map(|q| q.name()).collect();
        assert_eq!(names, vec!["eager", "lazy", "sequenced"]);

        for queue in queues.iter_mut() {
            queue.push_opt(Some(1), 1);
            queue.push_opt(None, 0);
            queue.compact();
            assert_eq!(queue.len(), 2);
            assert_eq!(queue.pop(), Ok(0));
            assert_eq!(queue.pop(), Ok(1));
            assert!(queue.is_empty());
        }
    }
}
