//! Tick source
//!
//! Provides the monotonic counter used to stamp log messages

use core::sync::atomic::{AtomicU64, Ordering};

/// Something that reports the current tick count
pub trait TickSource {
    fn ticks(&self) -> u64;
}

/// Monotonic tick counter, advanced by the timer interrupt
#[derive(Debug)]
pub struct Ticks(AtomicU64);

impl Ticks {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub const fn starting_at(ticks: u64) -> Self {
        Self(AtomicU64::new(ticks))
    }

    /// Advances the counter by one and returns the new value
    #[inline]
    pub fn tick(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for Ticks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for Ticks {
    #[inline]
    fn ticks(&self) -> u64 {
        self.get()
    }
}

impl<T: TickSource + ?Sized> TickSource for &T {
    #[inline]
    fn ticks(&self) -> u64 {
        (**self).ticks()
    }
}

/// Global tick counter
pub static TICKS: Ticks = Ticks::new();

/// Timer interrupt hook
#[inline]
pub fn timer_tick() -> u64 {
    TICKS.tick()
}
