//! Dining-philosophers resource arbiter.
//!
//! N philosophers sit around a table, one fork between each pair of
//! neighbors; eating requires both adjacent forks. Grabbing forks one at
//! a time deadlocks the moment every philosopher holds exactly one fork.
//!
//! The arbiter solves this by never handing out a single fork. All seat
//! states live in one [`Table`], guarded by one mutex; a philosopher is
//! granted the `Eating` state only if neither neighbor is eating (the
//! **adjacency check**), and the grant is all-or-nothing, decided
//! atomically under that lock. No philosopher ever holds one resource
//! while waiting for another, so the circular-wait condition for deadlock
//! structurally cannot form.
//!
//! A philosopher whose request cannot be granted parks on a per-seat
//! zero-initialized [`Semaphore`] until a neighbor putting its forks down
//! re-runs the check and posts the grant.
//!
//! Starvation is a different story: two alternating neighbors can keep
//! the seat between them hungry indefinitely under adversarial
//! scheduling. The arbiter makes no fairness guarantee. This is the
//! documented tradeoff of the design, preserved rather than patched over
//! with a priority scheme.
//!
//! State transitions are emitted as [`tracing`] events (seat index plus
//! the new state). This narration is illustrative telemetry for humans
//! watching a run, not an API.

use std::{
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use tracing::info;

use crate::semaphore::Semaphore;

/// What a philosopher is doing, as decided by the arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhilosopherState {
    /// Not interested in the forks.
    Thinking,
    /// Requested the forks and waiting for the grant.
    Hungry,
    /// Holding both forks.
    Eating,
}

/// The shared table: seat states, one grant semaphore per seat, and
/// per-seat meal counters.
///
/// The table is the single arbiter for all fork handouts. Every state
/// transition (going hungry, being granted the forks, putting them down)
/// happens under the one internal state mutex, which is what makes the
/// no-adjacent-eaters invariant checkable and the grants race-free.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use symposium::philosophers::{self, Table};
///
/// let table = Table::new(5);
/// philosophers::run(&table, 3, Duration::from_millis(1), Duration::from_millis(1));
/// for seat in 0..table.seats() {
///     assert_eq!(table.meals(seat), 3);
/// }
/// ```
pub struct Table {
    state: Mutex<Vec<PhilosopherState>>,
    /// One zero-permit semaphore per seat; posted exactly once per grant.
    slots: Vec<Semaphore>,
    meals: Vec<AtomicUsize>,
}

impl Table {
    /// Creates a table with `seats` philosophers, all `Thinking`.
    ///
    /// # Panics
    ///
    /// Panics if `seats < 2`; with fewer than two seats there is no
    /// neighbor to arbitrate against.
    pub fn new(seats: usize) -> Self {
        assert!(seats >= 2, "a table needs at least two seats");
        Self {
            state: Mutex::new(vec![PhilosopherState::Thinking; seats]),
            slots: (0..seats).map(|_| Semaphore::new(0, ())).collect(),
            meals: (0..seats).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    /// Number of seats at the table.
    pub fn seats(&self) -> usize {
        self.slots.len()
    }

    /// Requests both forks for `seat`, blocking until they are granted.
    ///
    /// The seat is marked `Hungry` and the adjacency check runs
    /// immediately; if either neighbor is eating, the calling thread
    /// parks on the seat's semaphore until a neighbor's
    /// [`put_forks`] grants the request. On return the seat is `Eating`.
    ///
    /// # Panics
    ///
    /// Panics if `seat` is out of range, or if the seat is already
    /// `Hungry` or `Eating` (each seat belongs to one philosopher
    /// thread).
    ///
    /// [`put_forks`]: Self::put_forks
    pub fn take_forks(&self, seat: usize) {
        let mut state = self.lock_state();
        assert_eq!(
            state[seat],
            PhilosopherState::Thinking,
            "seat {seat} requested forks twice"
        );
        state[seat] = PhilosopherState::Hungry;
        info!(seat, "is hungry");
        self.grant_if_eligible(seat, &mut state);
        drop(state);

        // Either the grant above already posted the permit, or a
        // neighbor's put_forks will; both ways exactly one wait consumes
        // exactly one grant.
        self.slots[seat].wait().forget();
        self.meals[seat].fetch_add(1, Ordering::Relaxed);
        info!(seat, "is eating");
    }

    /// Releases both forks for `seat` and re-arbitrates the neighbors.
    ///
    /// The seat goes back to `Thinking`; each neighbor that is `Hungry`
    /// and now has two free forks is granted `Eating` and woken.
    ///
    /// # Panics
    ///
    /// Panics if `seat` is out of range or was not `Eating`; putting
    /// down forks you were never granted is a call-order bug.
    pub fn put_forks(&self, seat: usize) {
        let mut state = self.lock_state();
        assert_eq!(
            state[seat],
            PhilosopherState::Eating,
            "seat {seat} put forks down without eating"
        );
        state[seat] = PhilosopherState::Thinking;
        info!(seat, "is thinking");
        self.grant_if_eligible(self.left_of(seat), &mut state);
        self.grant_if_eligible(self.right_of(seat), &mut state);
    }

    /// Grants `Eating` to `seat` iff it is hungry and neither neighbor
    /// is eating. Runs under the state lock; the all-or-nothing grant
    /// decided here is what rules out deadlock.
    fn grant_if_eligible(&self, seat: usize, state: &mut [PhilosopherState]) {
        if state[seat] == PhilosopherState::Hungry
            && state[self.left_of(seat)] != PhilosopherState::Eating
            && state[self.right_of(seat)] != PhilosopherState::Eating
        {
            state[seat] = PhilosopherState::Eating;
            self.slots[seat].signal();
        }
    }

    /// Returns a copy of all seat states at one instant.
    ///
    /// Taken under the state lock, so the snapshot itself always
    /// satisfies the no-adjacent-eaters invariant.
    pub fn snapshot(&self) -> Vec<PhilosopherState> {
        self.lock_state().clone()
    }

    /// How many times `seat` has been granted the forks so far.
    pub fn meals(&self, seat: usize) -> usize {
        self.meals[seat].load(Ordering::Relaxed)
    }

    fn left_of(&self, seat: usize) -> usize {
        (seat + self.seats() - 1) % self.seats()
    }

    fn right_of(&self, seat: usize) -> usize {
        (seat + 1) % self.seats()
    }

    fn lock_state(&self) -> MutexGuard<'_, Vec<PhilosopherState>> {
        self.state.lock().expect("table state mutex poisoned")
    }
}

/// The philosopher loop for one seat: think, take forks, eat, put forks,
/// `rounds` times over.
///
/// The reference behavior loops forever; the `rounds` bound exists so
/// that demonstrations and tests terminate. Pass a large count for a
/// long-running simulation.
pub fn dine(table: &Table, seat: usize, rounds: usize, think: Duration, eat: Duration) {
    for _ in 0..rounds {
        thread::sleep(think);
        table.take_forks(seat);
        thread::sleep(eat);
        table.put_forks(seat);
    }
}

/// Spawns one [`dine`] thread per seat and joins them all.
///
/// Returns once every philosopher has finished its `rounds`.
pub fn run(table: &Table, rounds: usize, think: Duration, eat: Duration) {
    thread::scope(|s| {
        for seat in 0..table.seats() {
            s.spawn(move || dine(table, seat, rounds, think, eat));
        }
    });
}
