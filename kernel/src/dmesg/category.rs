//! Category enable mask
//!
//! Callers check the mask before emitting; the ring store never sees it.

use bitflags::bitflags;
use core::sync::atomic::{AtomicU32, Ordering};

bitflags! {
    /// Event classes that can be switched on and off at runtime
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Category: u32 {
        /// Interrupt entry/exit
        const INTERRUPT = 0b0001;
        /// Task switches
        const SWITCH    = 0b0010;
        /// System calls
        const SYSCALL   = 0b0100;
    }
}

/// Runtime set of enabled categories
#[derive(Debug)]
pub struct CategoryMask(AtomicU32);

impl CategoryMask {
    pub const fn new(initial: Category) -> Self {
        Self(AtomicU32::new(initial.bits()))
    }

    /// Replaces the whole mask. Unknown bits are dropped.
    pub fn set(&self, categories: Category) {
        self.0.store(categories.bits(), Ordering::Relaxed);
    }

    /// Replaces the mask from raw bits, as passed in by a system call.
    pub fn set_bits(&self, bits: u32) {
        self.set(Category::from_bits_truncate(bits));
    }

    pub fn get(&self) -> Category {
        Category::from_bits_truncate(self.0.load(Ordering::Relaxed))
    }

    pub fn enable(&self, categories: Category) {
        self.0.fetch_or(categories.bits(), Ordering::Relaxed);
    }

    pub fn disable(&self, categories: Category) {
        self.0.fetch_and(!categories.bits(), Ordering::Relaxed);
    }

    /// True when every category in `categories` is enabled
    pub fn is_enabled(&self, categories: Category) -> bool {
        self.get().contains(categories)
    }
}

impl Default for CategoryMask {
    fn default() -> Self {
        Self::new(Category::all())
    }
}
