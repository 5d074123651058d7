// kernel/src/error.rs
use core::fmt;

/// Result type for ring store and appender operations
pub type Result<T> = core::result::Result<T, LogError>;

/// Failures raised while appending to the ring store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogError {
    /// A byte that must be free (NUL) is occupied, or a message has no terminator
    Corrupted {
        /// Offending storage index
        pos: usize,
    },

    /// The `begin`/`end`/`count` cursors contradict each other
    IndexInvariant {
        begin: usize,
        end: usize,
        count: usize,
    },

    /// A single message does not fit even in an empty buffer
    Oversized {
        /// Message length including its terminator
        len: usize,
        capacity: usize,
    },

    /// The message body contains a NUL byte
    EmbeddedNul {
        /// Offset of the NUL inside the body
        offset: usize,
    },

    /// An earlier corruption made this store unusable
    Poisoned,
}

impl LogError {
    /// Returns true for errors that leave the store in an undefined state.
    ///
    /// Such errors poison the store: every later append fails with
    /// [`LogError::Poisoned`].
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LogError::Corrupted { .. } | LogError::IndexInvariant { .. }
        )
    }
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LogError::Corrupted { pos } => {
                write!(f, "write to uncleared space at {}", pos)
            }
            LogError::IndexInvariant { begin, end, count } => write!(
                f,
                "cursor invariant violated (begin {}, end {}, count {})",
                begin, end, count
            ),
            LogError::Oversized { len, capacity } => write!(
                f,
                "message of {} bytes exceeds capacity of {} bytes",
                len, capacity
            ),
            LogError::EmbeddedNul { offset } => {
                write!(f, "message contains NUL at offset {}", offset)
            }
            LogError::Poisoned => write!(f, "log store poisoned by earlier corruption"),
        }
    }
}

/// Failures of the snapshot export path. Never mutates the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportError {
    /// The destination cannot hold the full snapshot layout
    DestinationTooSmall { needed: usize, available: usize },

    /// No log instance has been initialized yet
    Unavailable,
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ExportError::DestinationTooSmall { needed, available } => write!(
                f,
                "destination too small: need {} bytes, have {}",
                needed, available
            ),
            ExportError::Unavailable => write!(f, "kernel log not initialized"),
        }
    }
}

/// Failures while parsing or walking an exported snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Capacity outside what a store can be created with
    InvalidCapacity { capacity: usize },

    /// Fewer bytes than the layout for this capacity requires
    Truncated { needed: usize, available: usize },

    /// A cursor lies outside the buffer, `end` is not a terminator, or the
    /// count cannot fit the buffer
    BadHeader { begin: i32, end: i32, count: i32 },

    /// No NUL terminator found for the message starting at `pos`
    MissingTerminator { pos: usize },

    /// A NUL sits where a message should start
    EmptyMessage { pos: usize },

    /// The walk went once around the ring without meeting `end`
    EndNotReached { end: usize },

    /// The walk from `begin` to `end` did not meet exactly `count` messages
    CountMismatch { expected: usize, found: usize },

    /// A message byte outside the printable ASCII range
    Unprintable { pos: usize, byte: u8 },

    /// The output sink refused the rendered text
    Output,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DecodeError::InvalidCapacity { capacity } => {
                write!(f, "invalid snapshot capacity {}", capacity)
            }
            DecodeError::Truncated { needed, available } => write!(
                f,
                "snapshot truncated: need {} bytes, got {}",
                needed, available
            ),
            DecodeError::BadHeader { begin, end, count } => write!(
                f,
                "invalid snapshot header (begin {}, end {}, count {})",
                begin, end, count
            ),
            DecodeError::MissingTerminator { pos } => {
                write!(f, "message at {} has no terminator", pos)
            }
            DecodeError::EmptyMessage { pos } => write!(f, "empty message at {}", pos),
            DecodeError::EndNotReached { end } => {
                write!(f, "walk wrapped around without reaching end {}", end)
            }
            DecodeError::CountMismatch { expected, found } => write!(
                f,
                "snapshot claims {} messages, walk found {}",
                expected, found
            ),
            DecodeError::Unprintable { pos, byte } => {
                write!(f, "unprintable character {:#04x} at {}", byte, pos)
            }
            DecodeError::Output => write!(f, "output sink error"),
        }
    }
}

impl From<fmt::Error> for DecodeError {
    fn from(_: fmt::Error) -> Self {
        DecodeError::Output
    }
}

/// Invalid [`LogConfig`](crate::dmesg::LogConfig) values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Capacity too small to hold any non-empty message
    CapacityTooSmall { capacity: usize },

    /// Capacity does not fit the `i32` cursors of the export layout
    CapacityTooLarge { capacity: usize, max: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConfigError::CapacityTooSmall { capacity } => {
                write!(f, "capacity {} too small (minimum 2)", capacity)
            }
            ConfigError::CapacityTooLarge { capacity, max } => {
                write!(f, "capacity {} exceeds maximum {}", capacity, max)
            }
        }
    }
}
