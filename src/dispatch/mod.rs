//! Cooperative poll-list scheduler.
//!
//! This module provides the top of the no-OS dispatch loop: a [`Scheduler`]
//! owns an ordered collection of poll functions and drives repeated zero-delay
//! poll rounds until every component is quiescent, then dispatches the
//! poll-event list once and reports how long the caller may sleep.
//!
//! # The poll contract
//!
//! A poll function never blocks. It checks its timers and hardware state,
//! does a bounded amount of work, and returns a [`PollInterval`]:
//!
//! - [`PollInterval::RunAgain`]: state changed, run another settle round
//!   before sleeping (the signal other components react to on *their* next
//!   poll).
//! - [`PollInterval::SleepFor`]: nothing to do for this many milliseconds.
//! - [`PollInterval::Idle`]: no news; check again whenever convenient.
//!
//! Events are never delivered synchronously across components inside a round:
//! a component that wants to notify others marks its state, returns
//! `RunAgain`, and lets the scheduler's settle loop carry the change. This is
//! what guarantees a chain of dependent components reaches steady state
//! within a single [`Scheduler::run_once`] call, before any sleep is issued.
//!
//! # Usage
//!
//! ```rust
//! use libdweet::dispatch::{Clock, PollInterval, Scheduler};
//!
//! struct TickClock(u32);
//! impl Clock for TickClock {
//!     fn now_ms(&self) -> u32 {
//!         self.0
//!     }
//! }
//!
//! struct App {
//!     pending: bool,
//!     served: u32,
//! }
//!
//! fn poll_app(app: &mut App, _now: u32) -> PollInterval {
//!     if app.pending {
//!         app.pending = false;
//!         app.served += 1;
//!         PollInterval::RunAgain
//!     } else {
//!         PollInterval::Idle
//!     }
//! }
//!
//! let mut scheduler: Scheduler<App, 4> = Scheduler::new();
//! scheduler.register(poll_app);
//!
//! let mut app = App { pending: true, served: 0 };
//! let sleep = scheduler.run_once(&mut app, &TickClock(0), 1_000);
//! assert_eq!(app.served, 1);
//! assert_eq!(sleep, 1_000); // fully quiescent, sleep the maximum
//! ```

pub(crate) mod slots;

use slots::{Arena, RawHandle};

/// A component's requested delay before its next poll.
///
/// Replaces the classic convention of overloading a returned `0` as "run me
/// again" and a large sentinel as "no news": the three cases are explicit
/// variants, and `SleepFor(0)` is treated identically to `RunAgain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollInterval {
    /// State changed; run another zero-delay settle round before sleeping.
    RunAgain,
    /// Nothing to do for this many milliseconds.
    SleepFor(u32),
    /// No news; poll again whenever the rest of the system next wakes.
    Idle,
}

impl PollInterval {
    fn weight(self) -> u64 {
        match self {
            PollInterval::RunAgain => 0,
            PollInterval::SleepFor(ms) => ms as u64,
            PollInterval::Idle => u64::MAX,
        }
    }

    /// Fold two requested intervals, keeping the more urgent one.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if other.weight() < self.weight() { other } else { self }
    }

    /// True for `RunAgain` and `SleepFor(0)`: another settle round is wanted
    /// right now.
    pub fn is_ready_now(self) -> bool {
        matches!(self, PollInterval::RunAgain | PollInterval::SleepFor(0))
    }

    /// Convert to a concrete sleep duration, clamped to `max_ms`.
    /// `Idle` sleeps the full `max_ms`.
    pub fn sleep_ms(self, max_ms: u32) -> u32 {
        match self {
            PollInterval::RunAgain => 0,
            PollInterval::SleepFor(ms) => ms.min(max_ms),
            PollInterval::Idle => max_ms,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PollInterval {
    fn format(&self, f: defmt::Formatter) {
        match self {
            PollInterval::RunAgain => defmt::write!(f, "RunAgain"),
            PollInterval::SleepFor(ms) => defmt::write!(f, "SleepFor({})", ms),
            PollInterval::Idle => defmt::write!(f, "Idle"),
        }
    }
}

/// Monotonic millisecond clock.
///
/// The counter is expected to wrap at `u32::MAX`; all due-time arithmetic in
/// this crate is wraparound-safe (see [`crate::timer::is_due`]).
pub trait Clock {
    /// Current monotonic time in milliseconds.
    fn now_ms(&self) -> u32;
}

/// A registered poll function: borrows the application context and the
/// current time, returns the next requested poll delay.
pub type PollFn<A> = fn(&mut A, u32) -> PollInterval;

/// Handle identifying one pollable registration in a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollHandle(RawHandle);

/// The cooperative dispatch loop context.
///
/// Owns the global pollable list and the separate poll-event list as explicit
/// state (no process-wide statics), so independent scheduler instances can
/// coexist in tests. `A` is the application context every poll function
/// borrows; `N` bounds both lists.
///
/// Registrations are visited in deterministic slot order. That order is a
/// property of the implementation, useful for reproducible tests; application
/// logic must not rely on any cross-component ordering, only on the
/// guarantee that all components settle before a sleep is issued.
pub struct Scheduler<A, const N: usize = 8> {
    pollables: Arena<PollFn<A>, N>,
    poll_events: Arena<PollFn<A>, N>,
}

impl<A, const N: usize> Scheduler<A, N> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            pollables: Arena::new(),
            poll_events: Arena::new(),
        }
    }

    /// Number of registered pollables.
    pub fn len(&self) -> usize {
        self.pollables.len()
    }

    /// True when no pollables are registered.
    pub fn is_empty(&self) -> bool {
        self.pollables.is_empty()
    }

    /// Register a pollable.
    ///
    /// # Panics
    ///
    /// Panics when the pollable list is full: list capacity is a build-time
    /// decision and exhausting it is a configuration bug, not a runtime
    /// condition.
    pub fn register(&mut self, poll: PollFn<A>) -> PollHandle {
        match self.pollables.insert(poll) {
            Some(handle) => PollHandle(handle),
            None => panic!("scheduler pollable list full"),
        }
    }

    /// Unregister a pollable.
    ///
    /// # Panics
    ///
    /// Panics when `handle` is not currently registered; unregistering an
    /// absent entry is a contract violation.
    pub fn unregister(&mut self, handle: PollHandle) {
        if self.pollables.remove(handle.0).is_none() {
            panic!("unregister of pollable that is not registered");
        }
    }

    /// Register on the poll-event list, dispatched once per
    /// [`run_once`](Self::run_once) after the settle rounds. For components
    /// that are not structurally part of the pollable list.
    ///
    /// # Panics
    ///
    /// Panics when the poll-event list is full.
    pub fn register_poll_event(&mut self, poll: PollFn<A>) -> PollHandle {
        match self.poll_events.insert(poll) {
            Some(handle) => PollHandle(handle),
            None => panic!("scheduler poll-event list full"),
        }
    }

    /// Unregister from the poll-event list.
    ///
    /// # Panics
    ///
    /// Panics when `handle` is not currently registered.
    pub fn unregister_poll_event(&mut self, handle: PollHandle) {
        if self.poll_events.remove(handle.0).is_none() {
            panic!("unregister of poll event that is not registered");
        }
    }

    /// Run one full scheduler round and return how many milliseconds the
    /// caller may sleep (0 ⇒ re-invoke immediately).
    ///
    /// Phase 1 repeatedly walks the pollable list, looping again at zero
    /// delay whenever any component reported
    /// [`PollInterval::RunAgain`], so chained state changes fully settle
    /// before any sleep. Phase 2 dispatches the poll-event list once and
    /// folds its result into the same minimum.
    ///
    /// There is no per-component error path: a component stuck returning
    /// `RunAgain` forever is a design bug, guarded by the platform watchdog,
    /// not by this loop. The caller must resume unconditionally after the
    /// sleep (watchdog-safe) and call `run_once` again.
    pub fn run_once(&mut self, app: &mut A, clock: &impl Clock, max_sleep_ms: u32) -> u32 {
        let mut settled = PollInterval::Idle;
        loop {
            let now = clock.now_ms();
            let mut round = PollInterval::Idle;
            for handle in self.pollables.handles() {
                let poll = match self.pollables.get(handle) {
                    Some(poll) => *poll,
                    None => continue,
                };
                round = round.min(poll(app, now));
            }
            settled = round;
            if !round.is_ready_now() {
                break;
            }
        }

        let now = clock.now_ms();
        for handle in self.poll_events.handles() {
            let poll = match self.poll_events.get(handle) {
                Some(poll) => *poll,
                None => continue,
            };
            settled = settled.min(poll(app, now));
        }

        settled.sleep_ms(max_sleep_ms)
    }
}

impl<A, const N: usize> Default for Scheduler<A, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, const N: usize> core::fmt::Debug for Scheduler<A, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pollables", &self.pollables.len())
            .field("poll_events", &self.poll_events.len())
            .finish()
    }
}
