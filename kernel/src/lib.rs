// kernel/src/lib.rs
// In-kernel message buffer: fixed-capacity ring of timestamped text messages
#![no_std]

extern crate alloc;

pub mod dmesg;
pub mod error;
pub mod logger;
pub mod time;

// Réexportations
pub use dmesg::{Arg, Category, KernelLog, LogConfig, Snapshot};
pub use error::{ConfigError, DecodeError, ExportError, LogError, Result};

/// Brings up the global kernel log and routes the `log` facade into it.
pub fn init(config: LogConfig) -> core::result::Result<&'static KernelLog, ConfigError> {
    let klog = logger::init_dmesg(config)?;
    if logger::init().is_err() {
        log::warn!("kmsg: another logger is already installed");
    }
    log::trace!("kmsg initialized");
    Ok(klog)
}
