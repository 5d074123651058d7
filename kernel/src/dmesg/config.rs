//! Log configuration

use super::category::Category;
use crate::error::ConfigError;

pub const PAGE_SIZE: usize = 4096;

/// Ten pages of log text
pub const DEFAULT_CAPACITY: usize = 10 * PAGE_SIZE;

/// Largest capacity whose cursors still fit the `i32` export fields
pub const MAX_CAPACITY: usize = i32::MAX as usize - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Ring size in bytes, excluding the spare slot
    pub capacity: usize,
    /// Prefix every message with `"[ticks] "`
    pub timestamps: bool,
    /// Initially enabled categories
    pub categories: Category,
}

impl LogConfig {
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            timestamps: true,
            categories: Category::all(),
        }
    }

    pub const fn without_timestamps(self) -> Self {
        Self {
            timestamps: false,
            ..self
        }
    }

    pub const fn with_categories(self, categories: Category) -> Self {
        Self { categories, ..self }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity < 2 {
            return Err(ConfigError::CapacityTooSmall {
                capacity: self.capacity,
            });
        }
        if self.capacity > MAX_CAPACITY {
            return Err(ConfigError::CapacityTooLarge {
                capacity: self.capacity,
                max: MAX_CAPACITY,
            });
        }
        Ok(())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
