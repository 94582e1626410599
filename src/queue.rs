//! Blocking thread-safe FIFO queue.
//!
//! A [`BlockingQueue`] is a multi-producer/multi-consumer channel: any
//! number of threads may [`push`] and any number may [`pop`] through a
//! shared reference. Elements come out in the order they went in, where
//! "the order they went in" is the order in which producers acquired the
//! internal lock: a single global FIFO across all producers, not a
//! per-producer merge.
//!
//! [`pop`] blocks while the queue is empty. The wait is predicate-guarded:
//! a woken consumer re-checks "queue is non-empty" before consuming, so
//! neither spurious wakeups nor a faster competing consumer can make
//! [`pop`] return without an element in hand.
//!
//! The queue is unbounded by default. A [`bounded`] queue additionally
//! blocks producers while it is full, which gives backpressure at the
//! cost of producers now being able to wait.
//!
//! [`push`]: BlockingQueue::push
//! [`pop`]: BlockingQueue::pop
//! [`bounded`]: BlockingQueue::bounded

use std::{
    collections::VecDeque,
    fmt,
    sync::{Condvar, Mutex, MutexGuard},
};

use crate::spinlock::WouldBlock;

/// A FIFO channel with blocking `pop` (and blocking `push` when bounded).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use symposium::queue::BlockingQueue;
///
/// let queue = Arc::new(BlockingQueue::new());
///
/// let producer = {
///     let queue = Arc::clone(&queue);
///     thread::spawn(move || {
///         for i in 1..=5 {
///             queue.push(i);
///         }
///     })
/// };
///
/// // `pop` blocks until an element is available, so the consumer can
/// // start before the producer has pushed anything.
/// let received: Vec<i32> = (0..5).map(|_| queue.pop()).collect();
/// assert_eq!(received, [1, 2, 3, 4, 5]);
/// producer.join().unwrap();
/// ```
pub struct BlockingQueue<T> {
    inner: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Option<usize>,
}

impl<T> BlockingQueue<T> {
    /// Creates an empty unbounded queue.
    ///
    /// [`push`] on an unbounded queue never blocks.
    ///
    /// [`push`]: Self::push
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: None,
        }
    }

    /// Creates an empty bounded queue holding at most `capacity` elements.
    ///
    /// [`push`] on a full bounded queue blocks until a consumer makes
    /// room.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; a rendezvous channel is not a queue.
    ///
    /// [`push`]: Self::push
    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "bounded queue capacity must be nonzero");
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: Some(capacity),
        }
    }

    /// Appends `value` to the tail of the queue and wakes one consumer.
    ///
    /// On an unbounded queue this never blocks. On a [`bounded`] queue it
    /// blocks while the queue is full.
    ///
    /// [`bounded`]: Self::bounded
    pub fn push(&self, value: T) {
        let mut inner = self.lock_inner();
        if let Some(capacity) = self.capacity {
            inner = self
                .not_full
                .wait_while(inner, |queue| queue.len() == capacity)
                .expect("queue mutex poisoned");
        }
        inner.push_back(value);
        drop(inner);
        self.not_empty.notify_one();
    }

    /// Removes and returns the head of the queue, blocking while the
    /// queue is empty.
    ///
    /// Elements are returned in push order across all producers combined.
    /// When several consumers are blocked, each push wakes exactly one of
    /// them; the woken consumer re-checks emptiness under the lock before
    /// taking the element.
    pub fn pop(&self) -> T {
        let mut inner = self
            .not_empty
            .wait_while(self.lock_inner(), |queue| queue.is_empty())
            .expect("queue mutex poisoned");
        let value = inner
            .pop_front()
            .expect("woken from not_empty with an empty queue");
        drop(inner);
        if self.capacity.is_some() {
            self.not_full.notify_one();
        }
        value
    }

    /// Attempts to remove and return the head of the queue.
    ///
    /// This function does not block.
    ///
    /// # Errors
    ///
    /// Returns [`WouldBlock`] if the queue is empty.
    pub fn try_pop(&self) -> Result<T, WouldBlock> {
        let mut inner = self.lock_inner();
        let value = inner.pop_front().ok_or(WouldBlock)?;
        drop(inner);
        if self.capacity.is_some() {
            self.not_full.notify_one();
        }
        Ok(value)
    }

    /// Returns the number of elements currently in the queue.
    ///
    /// The answer is immediately stale in the presence of concurrent
    /// producers and consumers; use it for telemetry, not for flow
    /// control.
    pub fn len(&self) -> usize {
        self.lock_inner().len()
    }

    /// Returns `true` if the queue currently holds no elements.
    pub fn is_empty(&self) -> bool {
        self.lock_inner().is_empty()
    }

    /// Returns the capacity of a bounded queue, or `None` if unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn lock_inner(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.inner.lock().expect("queue mutex poisoned")
    }
}

impl<T> Default for BlockingQueue<T> {
    /// Creates an unbounded queue.
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread, time::Duration};

    #[test]
    fn fifo_single_thread() {
        let queue = BlockingQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.pop(), 1);
        assert_eq!(queue.pop(), 2);
        assert_eq!(queue.pop(), 3);
    }

    #[test]
    fn try_pop_empty() {
        let queue: BlockingQueue<u8> = BlockingQueue::new();
        assert!(queue.try_pop().is_err());
        queue.push(9);
        assert_eq!(queue.try_pop().unwrap(), 9);
    }

    #[test]
    fn len_and_capacity() {
        let queue = BlockingQueue::bounded(2);
        assert_eq!(queue.capacity(), Some(2));
        assert!(queue.is_empty());
        queue.push('a');
        assert_eq!(queue.len(), 1);
    }

    #[test]
    #[should_panic(expected = "capacity must be nonzero")]
    fn zero_capacity_panics() {
        let _ = BlockingQueue::<()>::bounded(0);
    }

    #[test]
    fn bounded_push_blocks_while_full() {
        let queue = Arc::new(BlockingQueue::bounded(1));
        queue.push(1);

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(2))
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished());

        assert_eq!(queue.pop(), 1);
        producer.join().unwrap();
        assert_eq!(queue.pop(), 2);
    }
}
