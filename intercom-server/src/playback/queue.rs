//! In-process command queue
//!
//! FIFO handoff of command identifiers from producers (HTTP handlers) to
//! the dispatcher. Ephemeral: nothing here survives a restart.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

/// Shared FIFO of command identifiers
#[derive(Clone, Default)]
pub struct CommandQueue {
    inner: Arc<QueueInner>,
}

#[derive(Default)]
struct QueueInner {
    ids: Mutex<VecDeque<i64>>,
    notify: Notify,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn ids(&self) -> MutexGuard<'_, VecDeque<i64>> {
        // A panic while holding the lock cannot leave the deque half-updated
        self.inner
            .ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an identifier to the back of the queue; never blocks
    pub fn enqueue(&self, id: i64) {
        self.ids().push_back(id);
        self.inner.notify.notify_one();
    }

    /// Pop the oldest identifier, waiting up to `timeout` for one to arrive
    ///
    /// Returns `None` when the wait times out with the queue still empty.
    pub async fn dequeue(&self, timeout: Duration) -> Option<i64> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Register interest before checking so an enqueue between the
            // check and the await is not missed
            let notified = self.inner.notify.notified();
            if let Some(id) = self.try_dequeue() {
                return Some(id);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.try_dequeue();
            }
        }
    }

    /// Pop the oldest identifier without waiting
    pub fn try_dequeue(&self) -> Option<i64> {
        self.ids().pop_front()
    }

    /// Remove and return every queued identifier without dispatching them
    pub fn drain(&self) -> Vec<i64> {
        self.ids().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }

    /// Snapshot of queued identifiers, front first
    pub fn snapshot(&self) -> Vec<i64> {
        self.ids().iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = CommandQueue::new();
        queue.enqueue(3);
        queue.enqueue(1);
        queue.enqueue(2);

        let timeout = Duration::from_millis(10);
        assert_eq!(queue.dequeue(timeout).await, Some(3));
        assert_eq!(queue.dequeue(timeout).await, Some(1));
        assert_eq!(queue.dequeue(timeout).await, Some(2));
    }

    #[tokio::test]
    async fn test_dequeue_times_out_when_empty() {
        let queue = CommandQueue::new();
        assert_eq!(queue.dequeue(Duration::from_millis(20)).await, None);
    }

    #[tokio::test]
    async fn test_dequeue_wakes_on_enqueue() {
        let queue = CommandQueue::new();
        let producer = queue.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.enqueue(42);
        });

        assert_eq!(queue.dequeue(Duration::from_secs(5)).await, Some(42));
        handle.await.unwrap();
    }

    #[test]
    fn test_drain_empties_queue() {
        let queue = CommandQueue::new();
        for id in 1..=3 {
            queue.enqueue(id);
        }
        assert_eq!(queue.drain(), vec![1, 2, 3]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_requeue_goes_to_back() {
        let queue = CommandQueue::new();
        queue.enqueue(1);
        queue.enqueue(2);
        let first = queue.try_dequeue().unwrap();
        queue.enqueue(first);
        assert_eq!(queue.snapshot(), vec![2, 1]);
    }
}
