//! # Symposium: Classic Thread-Synchronization Primitives
//!
//! Multithreaded programs must coordinate access to shared resources
//! among multiple threads of execution. This coordination is vital to
//! ensure data consistency, prevent race conditions, and keep every
//! thread making progress.
//!
//! This crate is a small, self-contained collection of the classic
//! coordination primitives, each built from first principles on OS
//! threads, mutexes, condition variables, and atomics. There is no
//! `async`, no scheduler integration, and no timeout machinery.
//! Every primitive is a leaf: none
//! depends on another, each owns exactly one internal lock guarding its
//! own state, and none ever locks a second primitive, so no lock-ordering
//! hazard can exist between them. (The one deliberate composition is the
//! dining-philosophers arbiter, which signals waiters through this
//! crate's own [`Semaphore`].)
//!
//! The primitives:
//!
//! - [`SpinLock`]: mutual exclusion by atomic test-and-set. The waiter
//!   burns CPU instead of sleeping, which is the right trade only for
//!   very short critical sections on multi-core hardware.
//!
//! - [`RwLock`]: many concurrent readers or one exclusive writer, with a
//!   **writer-preference** policy: a waiting writer blocks newly
//!   arriving readers so a read-heavy workload cannot starve writes.
//!
//! - [`BlockingQueue`]: a FIFO channel whose `pop` blocks until an
//!   element arrives, with an optional capacity bound that makes `push`
//!   block for backpressure.
//!
//! - [`Semaphore`]: a counting semaphore for limiting concurrent access
//!   to a resource pool, and (zero-initialized) for event signaling.
//!
//! - [`philosophers`]: the dining-philosophers problem solved by
//!   centralized arbitration, as a worked demonstration that the pieces
//!   above compose into a deadlock-free resource allocator.
//!
//! Different primitives suit different concurrency patterns:
//!
//! | Primitive         | Blocks thread? | Admits concurrently | Typical use case                            |
//! |-------------------|----------------|---------------------|---------------------------------------------|
//! | [`SpinLock`]      | No (busy wait) | 1                   | Short, uncontended critical sections        |
//! | [`RwLock`]        | Yes            | N readers / 1 writer| Read-mostly shared data                     |
//! | [`BlockingQueue`] | Yes            | producers+consumers | Handing work between threads                |
//! | [`Semaphore`]     | Yes            | up to `permits`     | Bounded resource pools, event signaling     |
//!
//! # Blocking model
//!
//! Every blocking wait in this crate is a **predicate-guarded condition
//! wait**: the condition is checked under the lock, re-checked after
//! every wakeup, and never trusted on the strength of a single
//! wait/notify pair. Spurious wakeups and multi-consumer races are
//! absorbed by the re-check rather than defended against case by case.
//!
//! None of the operations take timeouts and none can be cancelled: a
//! blocked thread waits indefinitely. That is the baseline contract of
//! these primitives, not an oversight. Callers who need bounded waits
//! need a different design, not a flag on this one.
//!
//! # Failure model
//!
//! Under correct usage nothing here fails, so there is no error taxonomy
//! to handle. The non-blocking `try_*` variants return [`WouldBlock`],
//! which is flow control, not failure. Misuse (a zero-capacity bounded
//! queue, an out-of-range seat index, releasing forks that were never
//! granted) is a precondition violation and panics immediately rather
//! than limping along with corrupted state.

#![deny(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod philosophers;
pub mod queue;
pub mod rwlock;
pub mod semaphore;
pub mod spinlock;

pub use queue::BlockingQueue;
pub use rwlock::{RwLock, RwLockReadGuard, RwLockWriteGuard};
pub use semaphore::{Semaphore, SemaphorePermits};
pub use spinlock::{SpinLock, SpinLockGuard, WouldBlock};
