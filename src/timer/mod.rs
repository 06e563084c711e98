//! Interval timers over a wrapping millisecond clock.
//!
//! A [`TimerList`] holds interval registrations, each with an absolute due
//! time on the 32-bit monotonic millisecond clock. Due-ness is computed with
//! signed wraparound-safe subtraction ([`is_due`]) so counter rollover every
//! ~49.7 days never misfires or stalls a timer.
//!
//! Polling advances an expired registration's due time by its interval
//! *before* invoking the callback, so a callback that cancels and
//! re-registers (or calls [`TimerList::reschedule`]) always observes a
//! consistent due time. The poll result is the minimum of all callbacks'
//! requested delays and all remaining times-to-due, capped to the list's own
//! minimum registered interval.

use crate::dispatch::PollInterval;
use crate::dispatch::slots::{Arena, RawHandle};

/// Wraparound-safe "has `due` arrived" test for a wrapping u32 millisecond
/// clock: true when `now` is at or past `due`, even across rollover.
///
/// ```rust
/// use libdweet::timer::is_due;
///
/// assert!(is_due(1_000, 1_000));
/// assert!(!is_due(999, 1_000));
/// // one millisecond past a due time sitting right before rollover
/// assert!(is_due(0, u32::MAX));
/// ```
pub fn is_due(now: u32, due: u32) -> bool {
    now.wrapping_sub(due) as i32 >= 0
}

/// A timer callback: borrows the application context and the current time,
/// returns the callback's requested next poll delay.
pub type TimerFn<A> = fn(&mut A, u32) -> PollInterval;

/// Handle identifying one registration in a [`TimerList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(RawHandle);

/// Timer registration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The timer list has no free slot.
    ListFull,
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            TimerError::ListFull => defmt::write!(f, "ListFull"),
        }
    }
}

struct TimerSlot<A> {
    callback: TimerFn<A>,
    interval_ms: u32,
    due_ms: u32,
}

/// A bounded list of interval timer registrations.
///
/// `A` is the application context every callback borrows, `N` the capacity.
/// Expired registrations are dispatched in deterministic slot order.
pub struct TimerList<A, const N: usize = 8> {
    timers: Arena<TimerSlot<A>, N>,
    /// Smallest registered interval; `u32::MAX` when empty. Used as the
    /// list's own poll granularity.
    min_interval_ms: u32,
}

impl<A, const N: usize> TimerList<A, N> {
    /// Create an empty timer list.
    pub fn new() -> Self {
        Self {
            timers: Arena::new(),
            min_interval_ms: u32::MAX,
        }
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Register an interval timer. The first fire is due at
    /// `now + interval_ms`; subsequent fires every `interval_ms` after that.
    ///
    /// Fails with [`TimerError::ListFull`] (logged, never fatal) when no
    /// slot is free.
    ///
    /// # Panics
    ///
    /// Panics on a zero interval: a zero-period timer would pin the
    /// scheduler in an infinite settle loop, which is a bug, not a runtime
    /// condition.
    pub fn register(
        &mut self,
        now: u32,
        interval_ms: u32,
        callback: TimerFn<A>,
    ) -> Result<TimerHandle, TimerError> {
        assert!(interval_ms != 0, "zero timer interval");
        let slot = TimerSlot {
            callback,
            interval_ms,
            due_ms: now.wrapping_add(interval_ms),
        };
        match self.timers.insert(slot) {
            Some(handle) => {
                self.min_interval_ms = self.min_interval_ms.min(interval_ms);
                Ok(TimerHandle(handle))
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("timer list full, registration dropped");
                Err(TimerError::ListFull)
            }
        }
    }

    /// Cancel a registration. Returns `false` (logged, silent) when `handle`
    /// is stale; a cancel/fire race is an expected runtime condition, not a
    /// contract violation. On success the minimum interval is recomputed
    /// from the remaining registrations so the next idle sleep can be as
    /// long as possible.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if self.timers.remove(handle.0).is_none() {
            #[cfg(feature = "defmt")]
            defmt::warn!("cancel of timer that is not registered");
            return false;
        }
        self.recompute_min_interval();
        true
    }

    /// Change a registration's interval without reissuing its handle.
    ///
    /// The next due time is rebased on the previous fire point
    /// (`due - old_interval + new_interval`), so shortening an interval can
    /// make the timer immediately due. Returns `false` when `handle` is
    /// stale.
    ///
    /// # Panics
    ///
    /// Panics on a zero interval.
    pub fn reschedule(&mut self, handle: TimerHandle, interval_ms: u32) -> bool {
        assert!(interval_ms != 0, "zero timer interval");
        let Some(slot) = self.timers.get_mut(handle.0) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("reschedule of timer that is not registered");
            return false;
        };
        slot.due_ms = slot
            .due_ms
            .wrapping_sub(slot.interval_ms)
            .wrapping_add(interval_ms);
        slot.interval_ms = interval_ms;
        self.recompute_min_interval();
        true
    }

    /// The interval of a live registration.
    pub fn interval_ms(&self, handle: TimerHandle) -> Option<u32> {
        self.timers.get(handle.0).map(|slot| slot.interval_ms)
    }

    /// True when `handle` refers to a live registration.
    pub fn contains(&self, handle: TimerHandle) -> bool {
        self.timers.contains(handle.0)
    }

    fn recompute_min_interval(&mut self) {
        self.min_interval_ms = self
            .timers
            .iter()
            .map(|slot| slot.interval_ms)
            .fold(u32::MAX, u32::min);
    }

    /// Walk all registrations once: advance and dispatch every expired
    /// timer, fold non-expired registrations' remaining time-to-due and
    /// every callback's requested delay into one minimum, and cap the
    /// result to the list's own minimum interval. Returns
    /// [`PollInterval::Idle`] when the list is empty.
    ///
    /// The list is reached through `list` (an accessor into `app`), so
    /// callbacks may register, cancel, or reschedule timers on this same
    /// list via `app`: due times were already advanced, and handles are
    /// re-checked for liveness before each dispatch.
    pub fn poll(app: &mut A, list: fn(&mut A) -> &mut Self, now: u32) -> PollInterval {
        let mut min = PollInterval::Idle;
        let mut fired: heapless::Vec<(RawHandle, TimerFn<A>), N> = heapless::Vec::new();

        {
            let this = list(app);
            for handle in this.timers.handles() {
                let Some(slot) = this.timers.get_mut(handle) else {
                    continue;
                };
                if is_due(now, slot.due_ms) {
                    // Advance before dispatch so re-registration from the
                    // callback sees a consistent due time.
                    slot.due_ms = slot.due_ms.wrapping_add(slot.interval_ms);
                    let _ = fired.push((handle, slot.callback));
                } else {
                    min = min.min(PollInterval::SleepFor(slot.due_ms.wrapping_sub(now)));
                }
            }
        }

        for (handle, callback) in fired {
            if !list(app).timers.contains(handle) {
                continue; // cancelled by an earlier callback this round
            }
            min = min.min(callback(app, now));
        }

        let this = list(app);
        if this.timers.is_empty() {
            min
        } else {
            min.min(PollInterval::SleepFor(this.min_interval_ms))
        }
    }
}

impl<A, const N: usize> Default for TimerList<A, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, const N: usize> core::fmt::Debug for TimerList<A, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerList")
            .field("len", &self.timers.len())
            .field("min_interval_ms", &self.min_interval_ms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_comparison_survives_wraparound() {
        assert!(is_due(5, u32::MAX - 5)); // 11ms past due, across the wrap
        assert!(!is_due(u32::MAX - 5, 5)); // 11ms early, across the wrap
        assert!(is_due(0, 0));
    }
}
