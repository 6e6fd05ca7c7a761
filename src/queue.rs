//! Shared queue of rendered statements.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// A rendered statement, numbered in enqueue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    seq: u64,
    sql: String,
}

impl WorkItem {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn into_sql(self) -> String {
        self.sql
    }
}

/// Unbounded multi-producer, multi-consumer statement queue.
///
/// Neither side ever blocks: `try_dequeue` returns `None` as soon as the queue
/// is empty. Consumers treat an empty queue as "done", so every enqueue must
/// happen before draining starts.
#[derive(Debug, Default)]
pub struct QueryQueue {
    state: Mutex<QueueState>,
}

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<WorkItem>,
    next_seq: u64,
}

impl QueryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement and return its sequence number.
    pub fn enqueue(&self, sql: impl Into<String>) -> u64 {
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.items.push_back(WorkItem {
            seq,
            sql: sql.into(),
        });
        seq
    }

    /// Take the oldest statement, if any.
    pub fn try_dequeue(&self) -> Option<WorkItem> {
        self.lock().items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Total statements ever enqueued.
    pub fn enqueued(&self) -> u64 {
        self.lock().next_seq
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // a panicking holder cannot leave the deque half-modified
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: Into<String>> FromIterator<S> for QueryQueue {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let queue = Self::new();
        for sql in iter {
            queue.enqueue(sql);
        }
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_and_sequence() {
        let queue = QueryQueue::new();
        assert_eq!(queue.enqueue("a"), 0);
        assert_eq!(queue.enqueue("b"), 1);
        assert_eq!(queue.len(), 2);

        let first = queue.try_dequeue().unwrap();
        assert_eq!((first.seq(), first.sql()), (0, "a"));
        assert_eq!(queue.try_dequeue().unwrap().into_sql(), "b");
        assert!(queue.try_dequeue().is_none());
        assert!(queue.is_empty());
        assert_eq!(queue.enqueued(), 2);
    }

    #[test]
    fn test_concurrent_drain_delivers_each_item_once() {
        let queue: Arc<QueryQueue> = Arc::new((0..10_000).map(|i| i.to_string()).collect());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(item) = queue.try_dequeue() {
                        seen.push(item.seq());
                    }
                    seen
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for seq in handle.join().unwrap() {
                assert!(all.insert(seq), "seq {seq} delivered twice");
            }
        }
        assert_eq!(all.len(), 10_000);
    }

    #[test]
    fn test_concurrent_producers() {
        let queue = Arc::new(QueryQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..250 {
                        queue.enqueue(format!("{t}-{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.len(), 1000);
        assert_eq!(queue.enqueued(), 1000);

        // sequence numbers follow queue order even with racing producers
        let seqs: Vec<u64> = std::iter::from_fn(|| queue.try_dequeue())
            .map(|item| item.seq())
            .collect();
        assert_eq!(seqs, (0..1000).collect::<Vec<u64>>());
    }
}
