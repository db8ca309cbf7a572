//! Borrowed views over pack storage
//!
//! A [`View`] wraps caller-owned storage together with the memory traits the
//! reducer may rely on. Views never own or free what they point at, so every
//! view carries [`MemoryTraits::UNMANAGED`].

use bitflags::bitflags;
use std::ops::Index;

bitflags! {
    /// Access properties of the storage behind a [`View`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemoryTraits: u8 {
        /// Storage is borrowed; the view never frees it
        const UNMANAGED = 1 << 0;
        /// Reads are scattered rather than streaming
        const RANDOM_ACCESS = 1 << 1;
        /// Element updates go through atomics
        const ATOMIC = 1 << 2;
        /// Start of storage is aligned to a full pack
        const ALIGNED = 1 << 3;
        /// No other view aliases this storage
        const RESTRICT = 1 << 4;
    }
}

impl Default for MemoryTraits {
    fn default() -> Self {
        MemoryTraits::UNMANAGED
    }
}

/// Read-only, unmanaged view of a contiguous sequence
#[derive(Debug, Clone, Copy)]
pub struct View<'a, T> {
    data: &'a [T],
    traits: MemoryTraits,
}

impl<'a, T> View<'a, T> {
    pub fn new(data: &'a [T]) -> Self {
        Self {
            data,
            traits: MemoryTraits::default(),
        }
    }

    /// Add `traits` to the view. `UNMANAGED` always stays set.
    pub fn with_traits(mut self, traits: MemoryTraits) -> Self {
        self.traits = traits | MemoryTraits::UNMANAGED;
        self
    }

    pub fn traits(&self) -> MemoryTraits {
        self.traits
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.data.get(index)
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
}

impl<'a, T> From<&'a [T]> for View<'a, T> {
    fn from(data: &'a [T]) -> Self {
        Self::new(data)
    }
}

impl<'a, T> From<&'a Vec<T>> for View<'a, T> {
    fn from(data: &'a Vec<T>) -> Self {
        Self::new(data.as_slice())
    }
}

impl<T> Index<usize> for View<'_, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}
