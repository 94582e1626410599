//! Atomic-flag spinlock.
//!
//! A spinlock acquires mutual exclusion by repeatedly attempting an atomic
//! test-and-set on a single flag, without ever suspending the calling
//! thread. There is no waiter queue and no interaction with the OS
//! scheduler: a contended [`lock`] burns CPU until the holder releases the
//! flag.
//!
//! This makes the spinlock the cheapest primitive in this crate when the
//! critical section is a handful of instructions and the lock is rarely
//! contended, and the most expensive one everywhere else. Under
//! oversubscription (more runnable threads than cores) a spinning thread
//! can occupy the very core the lock holder needs to make progress.
//! When a critical section may block, sleep, or take more than a few
//! hundred nanoseconds, use [`RwLock`] or a queue instead.
//!
//! # Memory ordering
//!
//! The entire correctness argument of the spinlock is its ordering
//! contract: the flag is set with [`Ordering::Acquire`] and cleared with
//! [`Ordering::Release`]. The release-store of one critical section
//! synchronizes-with the acquire-swap of the next, so every write made
//! while the lock was held is visible to the next thread that acquires
//! it. Nothing stronger is required, and nothing weaker is sound.
//!
//! [`lock`]: SpinLock::lock
//! [`RwLock`]: crate::rwlock::RwLock

use std::{
    cell::UnsafeCell,
    fmt,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicBool, Ordering},
};

use crossbeam_utils::{Backoff, CachePadded};

/// The lock could not be acquired at this time because the operation would
/// otherwise block.
#[derive(Debug)]
pub struct WouldBlock;

/// A mutual exclusion primitive useful for protecting shared data.
///
/// This spinlock will busy-wait threads waiting for the lock to become
/// available. The spinlock can be created via a [`new`] constructor. Each
/// spinlock has a type parameter which represents the data that it is
/// protecting. The data can only be accessed through the guards returned
/// from [`lock`] and [`try_lock`], which guarantees that the data is only
/// ever accessed when the spinlock is locked.
///
/// The flag lives on its own cache line so that contended spinning does
/// not invalidate neighboring data.
///
/// [`new`]: Self::new
/// [`lock`]: Self::lock
/// [`try_lock`]: Self::try_lock
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use symposium::spinlock::SpinLock;
///
/// const N: usize = 10;
///
/// // Spawn a few threads to increment a shared variable (non-atomically),
/// // and let the main thread know once all increments are done.
/// //
/// // Here we're using an Arc to share memory among threads, and the data
/// // inside the Arc is protected with a spinlock.
/// let data = Arc::new(SpinLock::new(0));
///
/// let handles: Vec<_> = (0..N)
///     .map(|_| {
///         let data = Arc::clone(&data);
///         thread::spawn(move || {
///             // The shared state can only be accessed once the lock is
///             // held. Our non-atomic increment is safe because we're the
///             // only thread which can access the shared state when the
///             // lock is held.
///             let mut guard = data.lock();
///             *guard += 1;
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(*data.lock(), N);
/// ```
pub struct SpinLock<T: ?Sized> {
    locked: CachePadded<AtomicBool>,
    data: UnsafeCell<T>,
}

unsafe impl<T: ?Sized + Send> Send for SpinLock<T> {}
unsafe impl<T: ?Sized + Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Creates a new spinlock in an unlocked state ready for use.
    ///
    /// # Examples
    ///
    /// ```
    /// use symposium::spinlock::SpinLock;
    ///
    /// let spinlock = SpinLock::new(0);
    /// ```
    #[inline]
    pub const fn new(t: T) -> SpinLock<T> {
        SpinLock {
            locked: CachePadded::new(AtomicBool::new(false)),
            data: UnsafeCell::new(t),
        }
    }

    /// Consumes this spinlock, returning the underlying data.
    ///
    /// # Examples
    ///
    /// ```
    /// use symposium::spinlock::SpinLock;
    ///
    /// let spinlock = SpinLock::new(0);
    /// assert_eq!(spinlock.into_inner(), 0);
    /// ```
    #[inline]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> SpinLock<T> {
    /// Acquires the spinlock, busy-waiting until it is able to do so.
    ///
    /// This function spins until no other thread holds the lock. Upon
    /// returning, the calling thread is the only thread with the lock
    /// held. A guard is returned to allow scoped access to the data; the
    /// lock is released when the guard is dropped.
    ///
    /// The wait loop never yields to the scheduler. It backs off with
    /// progressively longer sequences of spin-loop hints
    /// ([`Backoff::spin`]), which eases contention on the flag's cache
    /// line but still occupies the core for the full wait.
    ///
    /// The exact behavior on locking a spinlock in the thread which
    /// already holds the lock is left unspecified. However, this function
    /// will not return on the second call: the thread spins forever
    /// against itself.
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        let backoff = Backoff::new();
        while self.locked.swap(true, Ordering::Acquire) {
            backoff.spin();
        }
        SpinLockGuard {
            lock: self,
            data: unsafe { &mut *self.data.get() },
        }
    }

    /// Attempts to acquire this lock.
    ///
    /// If the lock could not be acquired at this time, then [`Err`] is
    /// returned. Otherwise, a guard is returned and the lock will be
    /// released when the guard is dropped.
    ///
    /// This function does not block.
    ///
    /// # Errors
    ///
    /// If the spinlock could not be acquired because it is already locked,
    /// then this call will return the [`WouldBlock`] error.
    ///
    /// # Examples
    ///
    /// ```
    /// use symposium::spinlock::SpinLock;
    ///
    /// let spinlock = SpinLock::new(0);
    ///
    /// let guard = spinlock.lock();
    /// assert!(spinlock.try_lock().is_err());
    /// drop(guard);
    /// assert!(spinlock.try_lock().is_ok());
    /// ```
    pub fn try_lock(&self) -> Result<SpinLockGuard<'_, T>, WouldBlock> {
        if self.locked.swap(true, Ordering::Acquire) {
            Err(WouldBlock)
        } else {
            Ok(SpinLockGuard {
                lock: self,
                data: unsafe { &mut *self.data.get() },
            })
        }
    }
}

impl<T: Default> Default for SpinLock<T> {
    /// Creates a `SpinLock<T>`, with the `Default` value for T.
    fn default() -> SpinLock<T> {
        SpinLock::new(Default::default())
    }
}

impl<T: ?Sized> fmt::Debug for SpinLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLock")
            .field("locked", &self.locked.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// An RAII implementation of a "scoped lock" of a spinlock. When this
/// structure is dropped (falls out of scope), the lock will be released.
///
/// The data protected by the spinlock can be accessed through this guard
/// via its [`Deref`] and [`DerefMut`] implementations.
///
/// This structure is created by the [`lock`] and [`try_lock`] methods on
/// [`SpinLock`].
///
/// [`lock`]: SpinLock::lock
/// [`try_lock`]: SpinLock::try_lock
pub struct SpinLockGuard<'a, T: ?Sized + 'a> {
    lock: &'a SpinLock<T>,
    data: &'a mut T,
}

impl<T: ?Sized> SpinLockGuard<'_, T> {
    /// Releases the underlying [`SpinLock`].
    ///
    /// Dropping the guard has the same effect; this method exists to make
    /// the release point explicit at the call site.
    #[inline]
    pub fn unlock(self) {
        drop(self);
    }
}

impl<T: ?Sized> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.data
    }
}

impl<T: ?Sized> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.data
    }
}

impl<T: ?Sized> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke() {
        let lock = SpinLock::new(7);
        {
            let mut guard = lock.lock();
            *guard += 1;
        }
        assert_eq!(lock.into_inner(), 8);
    }

    #[test]
    fn try_lock_contended() {
        let lock = SpinLock::new(());
        let guard = lock.lock();
        assert!(lock.try_lock().is_err());
        guard.unlock();
        assert!(lock.try_lock().is_ok());
    }

    #[test]
    fn released_on_drop() {
        let lock = SpinLock::new(0u32);
        drop(lock.lock());
        drop(lock.lock());
        assert_eq!(*lock.lock(), 0);
    }

    #[test]
    fn default_is_unlocked() {
        let lock: SpinLock<u64> = Default::default();
        assert_eq!(*lock.lock(), 0);
    }
}
