//! Appender: timestamps, formats and stores one message under the lock

use alloc::vec::Vec;
use core::fmt;
use spin::Mutex;

use super::category::{Category, CategoryMask};
use super::config::LogConfig;
use super::format::{self, Arg, TICK_PREFIX_LEN};
use super::snapshot::Snapshot;
use super::store::RingStore;
use crate::error::{ConfigError, ExportError, LogError, Result};
use crate::time::{TickSource, Ticks};

/// A log instance: one ring store behind one lock
pub struct KernelLog<T: TickSource = &'static Ticks> {
    store: Mutex<RingStore>,
    ticks: T,
    timestamps: bool,
    categories: CategoryMask,
}

impl<T: TickSource> KernelLog<T> {
    pub fn new(config: LogConfig, ticks: T) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        log::debug!(
            "kmsg: {} byte log, timestamps {}",
            config.capacity,
            if config.timestamps { "on" } else { "off" }
        );
        Ok(Self::from_validated(config, ticks))
    }

    pub(crate) fn from_validated(config: LogConfig, ticks: T) -> Self {
        Self {
            store: Mutex::new(RingStore::new(config.capacity)),
            ticks,
            timestamps: config.timestamps,
            categories: CategoryMask::new(config.categories),
        }
    }

    /// Appends `template` expanded with `args`.
    pub fn append(&self, template: &str, args: &[Arg<'_>]) -> Result<()> {
        self.store_body(&compose(template, args))
    }

    /// Appends a message built with Rust formatting.
    pub fn append_fmt(&self, args: fmt::Arguments<'_>) -> Result<()> {
        let mut body: Vec<u8> = alloc::fmt::format(args).into_bytes();
        format::sanitize(&mut body);
        self.store_body(&body)
    }

    /// Appends unless `category` is disabled. Returns whether a message was
    /// stored: a disabled category or an empty untimestamped body store nothing.
    pub fn log(
        &self,
        category: Option<Category>,
        template: &str,
        args: &[Arg<'_>],
    ) -> Result<bool> {
        if let Some(category) = category {
            if !self.categories.is_enabled(category) {
                return Ok(false);
            }
        }
        let body = compose(template, args);
        if body.is_empty() && !self.timestamps {
            return Ok(false);
        }
        self.store_body(&body).map(|()| true)
    }

    fn store_body(&self, body: &[u8]) -> Result<()> {
        let result = {
            let mut store = self.store.lock();
            if self.timestamps {
                let mut buf = [0u8; TICK_PREFIX_LEN];
                let prefix = format::tick_prefix(&mut buf, self.ticks.ticks());
                store.reserve_and_write(&[prefix, body])
            } else {
                store.reserve_and_write(&[body])
            }
        };

        // reported after unlocking: a `log` bridge may route this back here
        if let Err(err) = result {
            if err.is_fatal() {
                log::error!("kmsg: {}; log disabled", err);
            }
        }
        result
    }

    /// Copies the raw ring state into `dest` using the export layout.
    pub fn export(&self, dest: &mut [u8]) -> core::result::Result<usize, ExportError> {
        self.store.lock().export(dest)
    }

    /// Owned copy of the ring state, for decoding without the lock
    pub fn snapshot(&self) -> Snapshot {
        self.store.lock().snapshot()
    }

    /// Bytes an export destination must hold
    pub fn export_len(&self) -> usize {
        Snapshot::encoded_len(self.capacity())
    }

    pub fn capacity(&self) -> usize {
        self.store.lock().capacity()
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_poisoned(&self) -> bool {
        self.store.lock().is_poisoned()
    }

    pub fn categories(&self) -> &CategoryMask {
        &self.categories
    }

    /// Runs `f` with the store locked. Test hook.
    #[cfg(test)]
    pub(crate) fn with_store<R>(&self, f: impl FnOnce(&mut RingStore) -> R) -> R {
        f(&mut self.store.lock())
    }
}

fn compose(template: &str, args: &[Arg<'_>]) -> Vec<u8> {
    let mut body = format::format(template, args);
    format::sanitize(&mut body);
    body
}

impl<T: TickSource> fmt::Debug for KernelLog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelLog")
            .field("store", &*self.store.lock())
            .field("timestamps", &self.timestamps)
            .field("categories", &self.categories.get())
            .finish()
    }
}
