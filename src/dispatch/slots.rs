//! Fixed-capacity generational slot arena backing the registration lists.
//!
//! Handles are `(index, generation)` pairs; removing an entry bumps the slot
//! generation so stale handles can never reach a recycled entry.

use core::array;

/// Untyped handle into an [`Arena`]. Public list types wrap this in their own
/// newtype so handles from different lists cannot be mixed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawHandle {
    pub(crate) index: u16,
    pub(crate) generation: u16,
}

pub(crate) struct Arena<T, const N: usize> {
    slots: [Option<T>; N],
    generations: [u16; N],
    len: usize,
}

impl<T, const N: usize> Arena<T, N> {
    pub(crate) fn new() -> Self {
        Self {
            slots: array::from_fn(|_| None),
            generations: [0; N],
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert into the lowest free slot. Returns `None` when the arena is
    /// full.
    pub(crate) fn insert(&mut self, value: T) -> Option<RawHandle> {
        for i in 0..N {
            if self.slots[i].is_none() {
                self.slots[i] = Some(value);
                self.len += 1;
                return Some(RawHandle {
                    index: i as u16,
                    generation: self.generations[i],
                });
            }
        }
        None
    }

    /// Remove the entry behind `handle`. Returns `None` for stale or never
    /// issued handles.
    pub(crate) fn remove(&mut self, handle: RawHandle) -> Option<T> {
        let i = handle.index as usize;
        if i >= N || self.generations[i] != handle.generation {
            return None;
        }
        let value = self.slots[i].take()?;
        self.generations[i] = self.generations[i].wrapping_add(1);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn contains(&self, handle: RawHandle) -> bool {
        let i = handle.index as usize;
        i < N && self.generations[i] == handle.generation && self.slots[i].is_some()
    }

    pub(crate) fn get(&self, handle: RawHandle) -> Option<&T> {
        let i = handle.index as usize;
        if i < N && self.generations[i] == handle.generation {
            self.slots[i].as_ref()
        } else {
            None
        }
    }

    pub(crate) fn get_mut(&mut self, handle: RawHandle) -> Option<&mut T> {
        let i = handle.index as usize;
        if i < N && self.generations[i] == handle.generation {
            self.slots[i].as_mut()
        } else {
            None
        }
    }

    /// Snapshot of all live handles in slot order. Dispatch loops capture
    /// this before invoking any callback and re-check liveness per entry,
    /// so callbacks are free to mutate the arena mid-walk.
    pub(crate) fn handles(&self) -> heapless::Vec<RawHandle, N> {
        let mut out = heapless::Vec::new();
        for i in 0..N {
            if self.slots[i].is_some() {
                // Capacity N always fits N slots.
                let _ = out.push(RawHandle {
                    index: i as u16,
                    generation: self.generations[i],
                });
            }
        }
        out
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }
}
