//! Reader-writer lock with writer preference.
//!
//! This type of lock allows a number of readers or at most one writer at
//! any point in time. The write portion of this lock typically allows
//! modification of the underlying data (exclusive access) and the read
//! portion of this lock typically allows for read-only access (shared
//! access).
//!
//! Unlike the standard library's `RwLock`, whose priority policy is
//! whatever the underlying OS provides, this lock commits to **writer
//! preference**: the moment a writer is waiting, new readers stop being
//! admitted, even though the lock is only read-held. The waiting writer
//! gets the lock as soon as the current readers drain. This trades reader
//! throughput for a bounded writer wait: under a continuous stream of
//! writers, readers can starve, and that is the deliberate policy, not an
//! accident.
//!
//! All four state transitions (reader in/out, writer in/out) run under a
//! single internal mutex guarding three counters; blocking uses
//! predicate-guarded condition-variable waits, re-checked after every
//! wakeup.

use std::{
    cell::UnsafeCell,
    fmt,
    ops::{Deref, DerefMut},
    sync::{Condvar, Mutex, MutexGuard},
};

use crate::spinlock::WouldBlock;

/// Bookkeeping shared by every reader and writer of one lock.
///
/// Invariants, maintained under the state mutex:
/// `writer_active` implies `active_readers == 0`, and
/// `active_readers > 0` implies `!writer_active`.
struct RwState {
    active_readers: usize,
    waiting_writers: usize,
    writer_active: bool,
}

/// A reader-writer lock with writer preference.
///
/// The type parameter `T` represents the data that this lock protects. It
/// is required that `T` satisfies [`Send`] to be shared across threads
/// and [`Sync`] to allow concurrent access through readers. The RAII
/// guards returned from the locking methods implement [`Deref`] (and
/// [`DerefMut`] for the `write` method) to allow access to the content of
/// the lock.
///
/// # Examples
///
/// ```
/// use symposium::rwlock::RwLock;
///
/// let lock = RwLock::new(5);
///
/// // Many readers can hold the lock at once.
/// {
///     let r1 = lock.read();
///     let r2 = lock.read();
///     assert_eq!(*r1 + *r2, 10);
/// } // read guards dropped here
///
/// // Only one writer at a time, with no concurrent readers.
/// {
///     let mut w = lock.write();
///     *w += 1;
///     assert_eq!(*w, 6);
/// } // write guard dropped here
/// ```
pub struct RwLock<T>
where
    T: ?Sized + Send,
{
    state: Mutex<RwState>,
    /// Readers park here; woken all at once when the last writer leaves.
    readers: Condvar,
    /// Writers park here; woken one at a time.
    writers: Condvar,
    data: UnsafeCell<T>,
}

unsafe impl<T: ?Sized + Send> Send for RwLock<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for RwLock<T> {}

impl<T> RwLock<T>
where
    T: Send,
{
    /// Creates a new instance of an `RwLock<T>` which is unlocked.
    pub fn new(data: T) -> RwLock<T> {
        RwLock {
            state: Mutex::new(RwState {
                active_readers: 0,
                waiting_writers: 0,
                writer_active: false,
            }),
            readers: Condvar::new(),
            writers: Condvar::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// Consumes this `RwLock`, returning the underlying data.
    #[inline]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T> RwLock<T>
where
    T: ?Sized + Send,
{
    /// Locks this rwlock with shared read access, blocking the current
    /// thread until it can be acquired.
    ///
    /// The calling thread blocks while a writer holds the lock **or any
    /// writer is waiting for it**: a reader arriving after a waiting
    /// writer queues behind that writer rather than jumping ahead. There
    /// may be other readers inside the lock when this method returns.
    ///
    /// Returns an RAII guard which will release this thread's shared
    /// access once it is dropped.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        let mut state = self
            .readers
            .wait_while(self.lock_state(), |s| {
                s.waiting_writers > 0 || s.writer_active
            })
            .expect("rwlock state mutex poisoned");
        state.active_readers += 1;
        drop(state);
        RwLockReadGuard {
            lock: self,
            data: unsafe { &*self.data.get() },
        }
    }

    /// Attempts to acquire this rwlock with shared read access.
    ///
    /// This function does not block. The writer-preference policy applies
    /// here too: the attempt fails while any writer is waiting, not just
    /// while one is active.
    ///
    /// # Errors
    ///
    /// Returns [`WouldBlock`] if the access could not be granted at this
    /// time.
    pub fn try_read(&self) -> Result<RwLockReadGuard<'_, T>, WouldBlock> {
        let mut state = self.lock_state();
        if state.waiting_writers > 0 || state.writer_active {
            return Err(WouldBlock);
        }
        state.active_readers += 1;
        drop(state);
        Ok(RwLockReadGuard {
            lock: self,
            data: unsafe { &*self.data.get() },
        })
    }

    /// Locks this rwlock with exclusive write access, blocking the
    /// current thread until it can be acquired.
    ///
    /// The calling thread first registers itself as a waiting writer
    /// (from that moment no new reader is admitted) and then blocks until
    /// the active readers have drained and no other writer holds the
    /// lock.
    ///
    /// Returns an RAII guard which will drop the write access of this
    /// rwlock when dropped.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        let mut state = self.lock_state();
        state.waiting_writers += 1;
        let mut state = self
            .writers
            .wait_while(state, |s| s.active_readers > 0 || s.writer_active)
            .expect("rwlock state mutex poisoned");
        state.waiting_writers -= 1;
        state.writer_active = true;
        drop(state);
        RwLockWriteGuard {
            lock: self,
            data: unsafe { &mut *self.data.get() },
        }
    }

    /// Attempts to lock this rwlock with exclusive write access.
    ///
    /// This function does not block, and unlike [`write`] it does not
    /// register the caller as a waiting writer on failure.
    ///
    /// # Errors
    ///
    /// Returns [`WouldBlock`] if the lock could not be acquired because
    /// it is read- or write-held.
    ///
    /// [`write`]: Self::write
    pub fn try_write(&self) -> Result<RwLockWriteGuard<'_, T>, WouldBlock> {
        let mut state = self.lock_state();
        if state.active_readers > 0 || state.writer_active {
            return Err(WouldBlock);
        }
        state.writer_active = true;
        drop(state);
        Ok(RwLockWriteGuard {
            lock: self,
            data: unsafe { &mut *self.data.get() },
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, RwState> {
        self.state.lock().expect("rwlock state mutex poisoned")
    }
}

impl<T: Send> fmt::Debug for RwLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("RwLock")
            .field("active_readers", &state.active_readers)
            .field("waiting_writers", &state.waiting_writers)
            .field("writer_active", &state.writer_active)
            .finish_non_exhaustive()
    }
}

/// RAII structure used to release the shared read access of a lock when
/// dropped.
///
/// This structure is created by the [`read`] and [`try_read`] methods on
/// [`RwLock`].
///
/// [`read`]: RwLock::read
/// [`try_read`]: RwLock::try_read
pub struct RwLockReadGuard<'a, T>
where
    T: ?Sized + Send + 'a,
{
    lock: &'a RwLock<T>,
    data: &'a T,
}

/// RAII structure used to release the exclusive write access of a lock
/// when dropped.
///
/// This structure is created by the [`write`] and [`try_write`] methods
/// on [`RwLock`].
///
/// [`write`]: RwLock::write
/// [`try_write`]: RwLock::try_write
pub struct RwLockWriteGuard<'a, T>
where
    T: ?Sized + Send + 'a,
{
    lock: &'a RwLock<T>,
    data: &'a mut T,
}

impl<T> Deref for RwLockReadGuard<'_, T>
where
    T: ?Sized + Send,
{
    type Target = T;

    fn deref(&self) -> &T {
        self.data
    }
}

impl<T> Deref for RwLockWriteGuard<'_, T>
where
    T: ?Sized + Send,
{
    type Target = T;

    fn deref(&self) -> &T {
        self.data
    }
}

impl<T> DerefMut for RwLockWriteGuard<'_, T>
where
    T: ?Sized + Send,
{
    fn deref_mut(&mut self) -> &mut T {
        self.data
    }
}

impl<T> Drop for RwLockReadGuard<'_, T>
where
    T: ?Sized + Send,
{
    fn drop(&mut self) {
        let mut state = self.lock.lock_state();
        debug_assert!(!state.writer_active);
        state.active_readers -= 1;
        // The last reader out hands the lock to one waiting writer.
        if state.active_readers == 0 && state.waiting_writers > 0 {
            self.lock.writers.notify_one();
        }
    }
}

impl<T> Drop for RwLockWriteGuard<'_, T>
where
    T: ?Sized + Send,
{
    fn drop(&mut self) {
        let mut state = self.lock.lock_state();
        debug_assert!(state.writer_active && state.active_readers == 0);
        state.writer_active = false;
        // Writer priority: a queued writer goes before the readers; only
        // when no writer is waiting do all readers get back in at once.
        if state.waiting_writers > 0 {
            self.lock.writers.notify_one();
        } else {
            self.lock.readers.notify_all();
        }
    }
}
