//! Global kernel log and `log` facade bridge
//!
//! Holds the process-wide [`KernelLog`], the `pr_msg!`/`pr_event!` producer
//! macros, and a `log::Log` implementation that forwards records into the
//! ring so ordinary `log::info!` calls show up in dmesg.

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

use crate::dmesg::{Arg, Category, KernelLog, LogConfig};
use crate::error::{ConfigError, ExportError, LogError};
use crate::time;

/// The kernel-wide log, set once by [`init_dmesg`]
static KERNEL_LOG: spin::Once<KernelLog> = spin::Once::new();

/// Creates the global log. Later calls return the existing instance and
/// ignore `config`.
pub fn init_dmesg(config: LogConfig) -> Result<&'static KernelLog, ConfigError> {
    config.validate()?;
    let klog = KERNEL_LOG.call_once(|| KernelLog::from_validated(config, &time::TICKS));
    log::debug!("kmsg: kernel log ready ({} bytes)", klog.capacity());
    Ok(klog)
}

/// The global log, if initialized
#[inline]
pub fn kernel_log() -> Option<&'static KernelLog> {
    KERNEL_LOG.get()
}

/// Appends to the global log. Does nothing before [`init_dmesg`].
pub fn pr_msg(template: &str, args: &[Arg<'_>]) {
    if let Some(klog) = kernel_log() {
        report(klog.append(template, args));
    }
}

/// Appends to the global log if `category` is enabled.
pub fn pr_event(category: Category, template: &str, args: &[Arg<'_>]) {
    if let Some(klog) = kernel_log() {
        report(klog.log(Some(category), template, args).map(|_| ()));
    }
}

/// Fire-and-forget producers drop errors; only the non-fatal ones are
/// reported here, fatal ones were already reported by the log itself.
fn report(result: Result<(), LogError>) {
    if let Err(err) = result {
        if !err.is_fatal() && err != LogError::Poisoned {
            log::warn!("kmsg: message dropped: {}", err);
        }
    }
}

/// Exports the global log into `dest`.
pub fn dmesg(dest: &mut [u8]) -> Result<usize, ExportError> {
    kernel_log().ok_or(ExportError::Unavailable)?.export(dest)
}

/// Replaces the global category mask from raw bits.
pub fn set_categories(bits: u32) {
    if let Some(klog) = kernel_log() {
        klog.categories().set_bits(bits);
    }
}

/// Appends a printf-style message to the global kernel log.
///
/// ```ignore
/// pr_msg!("pid %d exited with %d", pid, code);
/// ```
#[macro_export]
macro_rules! pr_msg {
    ($template:expr $(, $arg:expr)* $(,)?) => {
        $crate::logger::pr_msg($template, &[$($crate::dmesg::Arg::from($arg)),*])
    };
}

/// Like [`pr_msg!`], gated on a [`Category`](crate::dmesg::Category).
#[macro_export]
macro_rules! pr_event {
    ($category:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::logger::pr_event(
            $category,
            $template,
            &[$($crate::dmesg::Arg::from($arg)),*],
        )
    };
}

/// Forwards `log` records into the global kernel log
struct KmsgLogger;

impl log::Log for KmsgLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(klog) = kernel_log() else {
            return;
        };

        // Format: LEVEL target: message
        let level_str = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN ",
            Level::Info => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        let _ = klog.append_fmt(format_args!(
            "{} {}: {}",
            level_str,
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {}
}

static LOGGER: KmsgLogger = KmsgLogger;

/// Installs the bridge with the `Info` level.
pub fn init() -> Result<(), SetLoggerError> {
    init_with_level(LevelFilter::Info)
}

/// Installs the bridge with a specific level
pub fn init_with_level(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}
