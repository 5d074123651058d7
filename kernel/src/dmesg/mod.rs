//! Kernel message buffer (dmesg)
//!
//! A fixed-capacity ring of NUL-terminated text messages. Producers append
//! through [`KernelLog`]; consumers take a [`Snapshot`] (or export its raw
//! bytes) and walk it without holding the lock.

pub mod category;
pub mod config;
pub mod format;
pub mod klog;
pub mod ring;
pub mod snapshot;
pub mod store;

pub use category::{Category, CategoryMask};
pub use config::{LogConfig, DEFAULT_CAPACITY, MAX_CAPACITY, PAGE_SIZE};
pub use format::Arg;
pub use klog::KernelLog;
pub use snapshot::{Message, Messages, RawDump, Snapshot};
pub use store::RingStore;
