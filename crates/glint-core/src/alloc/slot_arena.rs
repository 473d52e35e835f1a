//! Generational arena addressed by integer handles.
//!
//! Removing an entry pushes its index onto a free list and bumps the
//! generation, so stale handles are detected instead of aliasing whatever
//! reuses the index.

use std::num::NonZeroU64;

use crate::profiling::profile_function;

/// Handle into a [`SlotArena`]: a 32-bit index plus a 32-bit generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotHandle(NonZeroU64);

impl SlotHandle {
    pub fn new(generation: u32, idx: u32) -> Self {
        let raw = ((generation as u64) << 32) | (idx as u64 + 1);
        // The low half is `idx + 1` computed in 64 bits, so it is never zero.
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    pub fn generation(&self) -> u32 {
        (self.0.get() >> 32) as u32
    }

    pub fn index(&self) -> u32 {
        ((self.0.get() & u32::MAX as u64) - 1) as u32
    }
}

#[derive(Debug)]
struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational arena with index reuse.
#[derive(Debug)]
pub struct SlotArena<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Insert a value, reusing a freed index when one is available.
    pub fn push(&mut self, value: T) -> SlotHandle {
        profile_function!();
        self.len += 1;
        if let Some(idx) = self.free.pop() {
            let entry = &mut self.entries[idx as usize];
            entry.value = Some(value);
            SlotHandle::new(entry.generation, idx)
        } else {
            let idx = self.entries.len() as u32;
            self.entries.push(Entry {
                generation: 0,
                value: Some(value),
            });
            SlotHandle::new(0, idx)
        }
    }

    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        self.entries
            .get(handle.index() as usize)
            .filter(|entry| entry.generation == handle.generation())
            .and_then(|entry| entry.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        self.entries
            .get_mut(handle.index() as usize)
            .filter(|entry| entry.generation == handle.generation())
            .and_then(|entry| entry.value.as_mut())
    }

    pub fn contains(&self, handle: SlotHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Remove the value behind `handle`. Stale handles return `None`.
    pub fn remove(&mut self, handle: SlotHandle) -> Option<T> {
        profile_function!();
        let index = handle.index();
        let entry = self.entries.get_mut(index as usize)?;
        if entry.generation != handle.generation() {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(index);
        self.len -= 1;
        Some(value)
    }

    /// Remove every value. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            if entry.value.take().is_some() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(idx as u32);
            }
        }
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate live values with their handles, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotHandle, &T)> {
        self.entries.iter().enumerate().filter_map(|(idx, entry)| {
            entry
                .value
                .as_ref()
                .map(|value| (SlotHandle::new(entry.generation, idx as u32), value))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotHandle, &mut T)> {
        self.entries.iter_mut().enumerate().filter_map(|(idx, entry)| {
            let generation = entry.generation;
            entry
                .value
                .as_mut()
                .map(|value| (SlotHandle::new(generation, idx as u32), value))
        })
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_eq_size!(SlotHandle, Option<SlotHandle>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_arena_push() {
        let mut arena = SlotArena::<u8>::new();
        let idx = arena.push(15);
        assert_eq!(idx.generation(), 0);
        assert_eq!(idx.index(), 0);
        assert_eq!(arena.get(idx), Some(&15));
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut arena = SlotArena::<u8>::new();
        let _ = arena.push(15);
        let idx = SlotHandle::new(1, 0);
        assert_eq!(arena.get(idx), None);
    }

    #[test]
    fn test_slot_arena_remove_reuses_index() {
        let mut arena = SlotArena::<u8>::new();
        let idx = arena.push(15);
        assert_eq!(arena.remove(idx), Some(15));
        let new_idx = arena.push(45);
        assert_eq!(idx.index(), new_idx.index());
        assert_ne!(idx.generation(), new_idx.generation());
        assert_eq!(arena.remove(idx), None);
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut arena = SlotArena::new();
        let a = arena.push(1);
        let b = arena.push(2);
        arena.clear();
        assert!(arena.is_empty());
        assert!(!arena.contains(a));
        assert!(!arena.contains(b));
    }
}
