//! Index arithmetic shared by the ring store and the snapshot decoder
//!
//! Both sides walk the same byte layout: messages are runs of non-NUL bytes
//! closed by a single NUL, stored back to back and wrapping at `capacity`.
//! Keeping the walk in one place keeps the producer and an offline decoder
//! bit-compatible.

/// Position following `pos` in a ring of `capacity` bytes
#[inline]
pub const fn next_pos(pos: usize, capacity: usize) -> usize {
    (pos + 1) % capacity
}

/// Position preceding `pos` in a ring of `capacity` bytes
#[inline]
pub const fn prev_pos(pos: usize, capacity: usize) -> usize {
    (pos + capacity - 1) % capacity
}

/// Locates the NUL that closes the message starting at `pos`.
///
/// Scans forward to the physical end of the ring, then wraps once to the
/// start. Returns `None` if no NUL exists among the `capacity` bytes.
pub fn find_terminator(storage: &[u8], capacity: usize, pos: usize) -> Option<usize> {
    let ring = &storage[..capacity];
    if let Some(off) = ring[pos..].iter().position(|&b| b == 0) {
        return Some(pos + off);
    }
    ring[..pos].iter().position(|&b| b == 0)
}

/// Splits the message bytes `[start, term)` into at most two contiguous runs.
///
/// The second run is non-empty only when the message wraps past the
/// physical end of the ring.
pub fn message_slices(
    storage: &[u8],
    capacity: usize,
    start: usize,
    term: usize,
) -> (&[u8], &[u8]) {
    if start <= term {
        (&storage[start..term], &[])
    } else {
        (&storage[start..capacity], &storage[..term])
    }
}

/// Bytes free after `end` when `count` messages start at `begin`.
///
/// Returns `None` when `begin == end` with messages present: a stored
/// message is at least two bytes long, so that state is unreachable.
pub const fn free_space(capacity: usize, begin: usize, end: usize, count: usize) -> Option<usize> {
    if count == 0 {
        Some(capacity)
    } else if begin == end {
        None
    } else if begin < end {
        Some(capacity - end - 1 + begin)
    } else {
        Some(begin - end - 1)
    }
}
