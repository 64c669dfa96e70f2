use crate::Priority;
use crate::error::QueueEmpty;

fn left(parent: usize) -> usize {
    parent * 2 + 1
}

fn right(parent: usize) -> usize {
    parent * 2 + 2
}

fn parent(child: usize) -> usize {
    (child - 1) / 2
}

/// Binary min-heap over the distinct priorities currently in use.
///
/// Each priority is held at most once. The queue keeps that true by only
/// inserting a priority when its bucket was just created.
#[derive(Debug, Clone)]
pub struct PriorityIndex<P> {
    heap: Vec<P>,
}

impl<P: Priority> PriorityIndex<P> {
    pub fn new() -> Self {
        Self { heap: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Adds a priority that is not already present.
    pub fn insert(&mut self, priority: P) {
        debug_assert!(
            !self.heap.contains(&priority),
            "priority {:?} is already indexed",
            priority
        );
        self.heap.push(priority);
        self.sift_up(self.heap.len() - 1);
        self.check();
    }

    pub fn peek_min(&self) -> Result<P, QueueEmpty> {
        self.heap.first().copied().ok_or(QueueEmpty)
    }

    /// Removes and returns the smallest priority.
    pub fn extract_min(&mut self) -> Result<P, QueueEmpty> {
        if self.heap.is_empty() {
            return Err(QueueEmpty);
        }
        let result = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        self.check();
        Ok(result)
    }

    /// Keeps only the priorities for which `keep` returns true, then restores
    /// heap order in O(n).
    pub fn retain<F: FnMut(&P) -> bool>(&mut self, keep: F) {
        self.heap.retain(keep);
        for i in (0..self.heap.len() / 2).rev() {
            self.sift_down(i);
        }
        self.check();
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = parent(i);
            if self.heap[parent] <= self.heap[i] {
                break;
            }
            self.heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.heap.len();
        loop {
            let mut smallest = i;
            let left = left(i);
            if left < len && self.heap[left] < self.heap[smallest] {
                smallest = left;
            }
            let right = right(i);
            if right < len && self.heap[right] < self.heap[smallest] {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.heap.swap(i, smallest);
            i = smallest;
        }
    }

    #[cfg(debug_assertions)]
    fn check(&self) {
        for i in 1..self.heap.len() {
            debug_assert!(self.heap[parent(i)] <= self.heap[i]);
        }
    }

    #[cfg(not(debug_assertions))]
    fn check(&self) {}
}

impl<P: Priority> Default for PriorityIndex<P> {
    fn default() -> Self {
        Self::new()
    }
}
