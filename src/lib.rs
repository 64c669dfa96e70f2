//! Priority queues that pop the lowest priority first and keep insertion
//! order among equal priorities.
//!
//! [`PriorityQueue`] indexes each distinct priority once in a min-heap and
//! keeps the values for that priority in a FIFO bucket. [`SequencedHeap`] is
//! the plain one-heap-entry-per-value alternative with a sequence counter for
//! tie-breaking; it is kept as a baseline and as a reference model.
//!
//! ```
//! use bucketq::PriorityQueue;
//!
//! let mut pq: PriorityQueue<i32, &str> = PriorityQueue::new();
//! pq.push(5, "a");
//! pq.push(5, "b");
//! pq.push_default("c");
//! pq.push(-1, "d");
//!
//! assert_eq!(pq.pop(), Ok("d"));
//! assert_eq!(pq.pop(), Ok("c"));
//! assert_eq!(pq.pop(), Ok("a"));
//! assert_eq!(pq.pop(), Ok("b"));
//! assert!(pq.pop().is_err());
//! ```

pub mod bucket;
pub mod error;
pub mod index;
pub mod policy;
pub mod pqueue;
pub mod sequenced;

#[cfg(test)]
mod testing;

use std::fmt::Debug;
use std::hash::Hash;

pub use error::QueueEmpty;
pub use policy::Reclamation;
pub use pqueue::PriorityQueue;
pub use sequenced::SequencedHeap;

/// Keys usable as priorities. Lower values pop first.
///
/// Floating point keys need a totally ordered wrapper.
pub trait Priority: Ord + Hash + Copy + Debug {}

impl<P: Ord + Hash + Copy + Debug> Priority for P {}

/// The operations a driver (benchmark, correctness check) needs from a queue.
pub trait Queue<P: Priority + Default, T> {
    /// Short label used in reports.
    fn name(&self) -> String;

    /// Push with an optional priority; `None` means `P::default()`.
    fn push_opt(&mut self, priority: Option<P>, item: T);

    fn pop(&mut self) -> Result<T, QueueEmpty>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release memory held for priorities that no longer have values.
    fn compact(&mut self) {}
}
