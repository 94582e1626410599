//! Counting semaphore.
//!
//! A **semaphore** is a synchronization primitive used to regulate
//! concurrent access to a finite set of resources. It maintains an
//! internal count representing the number of available "permits." Each
//! permit grants a thread the right to access a shared resource.
//!
//! A semaphore differs from a lock in that it can allow more than one
//! concurrent caller at a time: a semaphore initialized with `n` permits
//! admits up to `n` holders before the `n + 1`-th caller blocks.
//!
//! The other canonical use is **event signaling**. A semaphore initialized
//! with zero permits serves as a one-shot or repeating signal: one thread
//! blocks in [`wait`] until another thread raises the signal with
//! [`signal`]. Exactly one waiter wakes per signal, and a signal posted
//! before anyone waits is not lost; the permit stays available for the
//! next [`wait`]. The dining-philosophers arbiter in
//! [`philosophers`](crate::philosophers) uses one zero-initialized
//! semaphore per seat in exactly this way.
//!
//! Internally the semaphore is a mutex-guarded counter and a condition
//! variable; [`wait`] is a predicate-guarded wait for a nonzero count, so
//! spurious wakeups simply re-check and go back to sleep.
//!
//! [`wait`]: Semaphore::wait
//! [`signal`]: Semaphore::signal

use std::{
    ops::Deref,
    sync::{Condvar, Mutex, MutexGuard},
};

/// Counting semaphore.
///
/// A semaphore maintains a set of permits and a resource. Permits are used
/// to synchronize access to the shared resource. A semaphore differs from
/// a mutex in that it can allow more than one concurrent caller to access
/// the shared resource at a time.
///
/// The resource type defaults to `()` for semaphores used purely as
/// signals or concurrency limiters.
///
/// # Examples
///
/// ```
/// use symposium::semaphore::Semaphore;
///
/// // Allows up to 3 concurrent holders of the state.
/// let sema = Semaphore::new(3, "shared state");
///
/// // Acquire a permit (blocks if unavailable).
/// let permit = sema.wait();
/// assert_eq!(*permit, "shared state");
///
/// // The permit is released when `permit` goes out of scope; you can
/// // also release it explicitly with `drop(permit)`.
/// ```
pub struct Semaphore<T = ()> {
    permits: Mutex<usize>,
    available: Condvar,
    resource: T,
}

impl<T> Semaphore<T> {
    /// Creates a new semaphore initialized with a specified number of
    /// permits.
    ///
    /// # Arguments
    ///
    /// * `permits` - The initial number of available permits. Zero is
    ///   valid and makes the semaphore a pure signal.
    /// * `resource` - A resource guarded by this semaphore, reachable
    ///   through the permits handed out by [`wait`].
    ///
    /// [`wait`]: Self::wait
    pub fn new(permits: usize, resource: T) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
            resource,
        }
    }

    /// Waits until a permit becomes available and then acquires it.
    ///
    /// If no permits are available, this function will block the current
    /// thread until another thread calls [`signal`] to release a permit.
    ///
    /// This method returns a [`SemaphorePermits`] RAII guard. When the
    /// guard is dropped, it will automatically release the acquired
    /// permit; call [`SemaphorePermits::forget`] to consume the permit
    /// instead.
    ///
    /// [`signal`]: Self::signal
    pub fn wait(&self) -> SemaphorePermits<'_, T> {
        let mut permits = self
            .available
            .wait_while(self.lock_permits(), |permits| *permits == 0)
            .expect("semaphore state mutex poisoned");
        *permits -= 1;
        drop(permits);
        SemaphorePermits { sema: self }
    }

    /// Releases a permit back to the semaphore.
    ///
    /// This method increases the number of available permits by one, and
    /// if any threads are blocked in [`wait`], one will be woken up to
    /// acquire the newly released permit.
    ///
    /// Normally you don't call this directly except for signaling an
    /// event with a zero-initialized semaphore. Otherwise it is invoked
    /// when a [`SemaphorePermits`] guard is dropped.
    ///
    /// [`wait`]: Self::wait
    pub fn signal(&self) {
        let mut permits = self.lock_permits();
        *permits += 1;
        drop(permits);
        self.available.notify_one();
    }

    fn lock_permits(&self) -> MutexGuard<'_, usize> {
        self.permits.lock().expect("semaphore state mutex poisoned")
    }
}

/// An RAII implementation of a "scoped semaphore". When this structure is
/// dropped (falls out of scope), the semaphore will be signaled.
///
/// The resource guarded by the semaphore can be accessed through this
/// guard via its [`Deref`] implementation.
///
/// This structure is created by the [`wait`] method on [`Semaphore`].
///
/// [`wait`]: Semaphore::wait
pub struct SemaphorePermits<'a, T> {
    sema: &'a Semaphore<T>,
}

impl<T> SemaphorePermits<'_, T> {
    /// Consumes the permit without signaling the semaphore.
    ///
    /// The permit count stays decremented, which turns a prior [`signal`]
    /// into a consumed one-shot event. This is the "wait until signaled,
    /// then consume one signal" half of an event-signaling protocol.
    ///
    /// [`signal`]: Semaphore::signal
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

impl<T> Deref for SemaphorePermits<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.sema.resource
    }
}

impl<T> Drop for SemaphorePermits<'_, T> {
    fn drop(&mut self) {
        self.sema.signal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        thread,
        time::Duration,
    };

    #[test]
    fn permit_derefs_to_resource() {
        let sema = Semaphore::new(1, 42);
        let permit = sema.wait();
        assert_eq!(*permit, 42);
    }

    #[test]
    fn permit_drop_returns_permit() {
        let sema = Semaphore::new(1, ());
        drop(sema.wait());
        // A second wait must succeed immediately; a leaked permit would
        // deadlock here.
        drop(sema.wait());
    }

    #[test]
    fn forget_consumes_permit() {
        let sema = Arc::new(Semaphore::new(1, ()));
        sema.wait().forget();

        let sema2 = Arc::clone(&sema);
        let blocked = thread::spawn(move || {
            sema2.wait().forget();
        });
        thread::sleep(Duration::from_millis(50));
        assert!(!blocked.is_finished());
        sema.signal();
        blocked.join().unwrap();
    }

    #[test]
    fn zero_initialized_signal() {
        let sema = Arc::new(Semaphore::new(0, ()));
        let woken = Arc::new(AtomicBool::new(false));

        let waiter = {
            let (sema, woken) = (Arc::clone(&sema), Arc::clone(&woken));
            thread::spawn(move || {
                sema.wait().forget();
                woken.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!woken.load(Ordering::SeqCst));

        sema.signal();
        waiter.join().unwrap();
        assert!(woken.load(Ordering::SeqCst));
    }

    #[test]
    fn signal_before_wait_is_not_lost() {
        let sema = Semaphore::new(0, ());
        sema.signal();
        sema.wait().forget();
    }
}
