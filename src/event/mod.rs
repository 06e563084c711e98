//! Event registration lists and ordered dispatch.
//!
//! An [`EventList`] is a bounded arena of `(callback, handle)` registrations
//! bound to one event. Dispatch walks the registrations, invoking each
//! callback with the shared application context and the event arguments, and
//! folds every callback's requested next poll time into a single minimum.
//!
//! # Iteration rule
//!
//! Dispatch captures a snapshot of live handles before any callback runs and
//! re-checks each handle immediately before invoking it. Callbacks may
//! therefore register or unregister entries on this list (through the
//! application context) without corrupting the walk: entries removed
//! mid-dispatch are skipped, entries added mid-dispatch fire on the next
//! dispatch. Callbacks must not re-invoke dispatch on the list currently
//! being dispatched; a callback that needs follow-up work marks its state
//! and returns [`PollInterval::RunAgain`], which the scheduler honors with
//! another settle round.

use crate::dispatch::PollInterval;
use crate::dispatch::slots::{Arena, RawHandle};

/// An event callback: borrows the application context and the event
/// arguments, returns the callback's requested next poll delay.
pub type EventFn<A, E> = fn(&mut A, &E) -> PollInterval;

/// Handle identifying one registration in an [`EventList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHandle(RawHandle);

/// A bounded list of event registrations with snapshot-based dispatch.
///
/// `A` is the application context, `E` the event argument type, `N` the
/// registration capacity. Registrations are dispatched in deterministic slot
/// order; application logic must not attach meaning to that order.
pub struct EventList<A, E, const N: usize = 8> {
    registrations: Arena<EventFn<A, E>, N>,
}

impl<A, E, const N: usize> EventList<A, E, N> {
    /// Create an empty event list.
    pub fn new() -> Self {
        Self {
            registrations: Arena::new(),
        }
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Register a callback.
    ///
    /// Every call mints a fresh handle, so double registration of the same
    /// logical listener is a caller-side bookkeeping matter; the handle is
    /// the only token that pairs with [`unregister`](Self::unregister).
    ///
    /// # Panics
    ///
    /// Panics when the list is full: capacity is a build-time decision and
    /// exhausting it is a configuration bug.
    pub fn register(&mut self, callback: EventFn<A, E>) -> EventHandle {
        match self.registrations.insert(callback) {
            Some(handle) => EventHandle(handle),
            None => panic!("event list full"),
        }
    }

    /// Unregister a callback. Register and unregister must pair exactly.
    ///
    /// # Panics
    ///
    /// Panics when `handle` is not currently registered; unregistering an
    /// absent entry indicates a bug and halting beats masking it.
    pub fn unregister(&mut self, handle: EventHandle) {
        if self.registrations.remove(handle.0).is_none() {
            panic!("unregister of event registration that is not registered");
        }
    }

    /// True when `handle` refers to a live registration.
    pub fn contains(&self, handle: EventHandle) -> bool {
        self.registrations.contains(handle.0)
    }

    /// Dispatch the event to every registration, returning the minimum
    /// requested poll delay across all callbacks ([`PollInterval::Idle`]
    /// when the list is empty).
    ///
    /// The list is reached through `list` (an accessor into `app`) so it can
    /// live inside the context being dispatched: between callback
    /// invocations the list is re-borrowed only to check handle liveness,
    /// leaving callbacks free to mutate registrations via `app`.
    pub fn dispatch(app: &mut A, list: fn(&mut A) -> &mut Self, args: &E) -> PollInterval {
        let snapshot = list(app).registrations.handles();
        let mut min = PollInterval::Idle;
        for handle in snapshot {
            let callback = match list(app).registrations.get(handle) {
                Some(callback) => *callback,
                None => continue, // unregistered mid-dispatch
            };
            min = min.min(callback(app, args));
        }
        min
    }
}

impl<A, E, const N: usize> Default for EventList<A, E, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, E, const N: usize> core::fmt::Debug for EventList<A, E, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventList")
            .field("len", &self.registrations.len())
            .finish()
    }
}
