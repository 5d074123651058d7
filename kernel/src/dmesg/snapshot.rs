//! Snapshot export layout and lock-free decoder
//!
//! Export layout for a store of capacity `C` (all integers little-endian):
//!
//! ```text
//! offset              size        field
//! 0                   C + 1       storage (last byte is the spare slot, always NUL)
//! C + 1               pad         zero padding up to a 4-byte boundary
//! align4(C + 1)       4           begin  (i32)
//! align4(C + 1) + 4   4           end    (i32)
//! align4(C + 1) + 8   4           count  (i32)
//! ```
//!
//! A [`Snapshot`] is an owned copy; walking it needs no lock.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use super::config::MAX_CAPACITY;
use super::ring::{find_terminator, message_slices, next_pos, prev_pos};
use crate::error::{DecodeError, ExportError};

const CURSOR_SIZE: usize = core::mem::size_of::<i32>();

#[inline]
const fn header_offset(capacity: usize) -> usize {
    (capacity + 1 + CURSOR_SIZE - 1) & !(CURSOR_SIZE - 1)
}

/// Serializes raw ring state into `dest`. `storage` includes the spare slot.
pub(crate) fn encode(
    storage: &[u8],
    begin: usize,
    end: usize,
    count: usize,
    dest: &mut [u8],
) -> Result<usize, ExportError> {
    let capacity = storage.len() - 1;
    let needed = Snapshot::encoded_len(capacity);
    if dest.len() < needed {
        return Err(ExportError::DestinationTooSmall {
            needed,
            available: dest.len(),
        });
    }

    let header = header_offset(capacity);
    dest[..storage.len()].copy_from_slice(storage);
    dest[storage.len()..header].fill(0);
    // LogConfig caps the capacity at i32::MAX - 1, so the casts are lossless
    for (i, value) in [begin, end, count].into_iter().enumerate() {
        let at = header + i * CURSOR_SIZE;
        dest[at..at + CURSOR_SIZE].copy_from_slice(&(value as i32).to_le_bytes());
    }
    Ok(needed)
}

/// Immutable copy of a ring store's storage and cursors
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    storage: Box<[u8]>,
    capacity: usize,
    begin: usize,
    end: usize,
    count: usize,
}

impl Snapshot {
    /// Size in bytes of the export layout for `capacity`
    pub const fn encoded_len(capacity: usize) -> usize {
        header_offset(capacity) + 3 * CURSOR_SIZE
    }

    pub(crate) fn from_parts(
        storage: Box<[u8]>,
        capacity: usize,
        begin: usize,
        end: usize,
        count: usize,
    ) -> Self {
        Self {
            storage,
            capacity,
            begin,
            end,
            count,
        }
    }

    /// Parses an exported snapshot of a store with the given capacity.
    ///
    /// Trailing bytes past the layout are ignored.
    pub fn from_bytes(bytes: &[u8], capacity: usize) -> Result<Self, DecodeError> {
        if !(2..=MAX_CAPACITY).contains(&capacity) {
            return Err(DecodeError::InvalidCapacity { capacity });
        }
        let needed = Self::encoded_len(capacity);
        if bytes.len() < needed {
            return Err(DecodeError::Truncated {
                needed,
                available: bytes.len(),
            });
        }

        let header = header_offset(capacity);
        let field = |i: usize| {
            let at = header + i * CURSOR_SIZE;
            let mut raw = [0u8; CURSOR_SIZE];
            raw.copy_from_slice(&bytes[at..at + CURSOR_SIZE]);
            i32::from_le_bytes(raw)
        };
        let (begin, end, count) = (field(0), field(1), field(2));

        let bad = DecodeError::BadHeader { begin, end, count };
        let in_ring = |v: i32| v >= 0 && (v as usize) < capacity;
        if !in_ring(begin) || !in_ring(end) || count < 0 {
            return Err(bad);
        }
        let (begin, end, count) = (begin as usize, end as usize, count as usize);
        // every message takes at least two bytes
        if count > capacity / 2 {
            return Err(bad);
        }
        if count == 0 && end != prev_pos(begin, capacity) {
            return Err(bad);
        }
        if count > 0 && bytes[end] != 0 {
            return Err(bad);
        }

        let mut storage = vec![0u8; capacity + 1].into_boxed_slice();
        storage[..capacity].copy_from_slice(&bytes[..capacity]);

        Ok(Self {
            storage,
            capacity,
            begin,
            end,
            count,
        })
    }

    /// Serializes into a freshly allocated buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::encoded_len(self.capacity)];
        let written = encode(&self.storage, self.begin, self.end, self.count, &mut out);
        debug_assert_eq!(written, Ok(out.len()));
        out
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn begin(&self) -> usize {
        self.begin
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Message count recorded in the snapshot
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Walks the stored messages, oldest first.
    pub fn messages(&self) -> Messages<'_> {
        Messages {
            snapshot: self,
            pos: self.begin,
            found: 0,
            walked: 0,
            done: self.count == 0,
        }
    }

    /// Prints every message followed by a newline.
    ///
    /// The whole walk is checked before anything is written: on error `out`
    /// is left untouched. Returns the number of messages rendered.
    pub fn render<W: fmt::Write>(&self, out: &mut W) -> Result<usize, DecodeError> {
        for message in self.messages() {
            message?.check_printable()?;
        }

        let mut rendered = 0;
        for message in self.messages() {
            let (head, tail) = message?.as_slices();
            for &b in head.iter().chain(tail) {
                out.write_char(b as char)?;
            }
            out.write_char('\n')?;
            rendered += 1;
        }
        Ok(rendered)
    }

    /// Debug view: `[begin end] ` followed by every ring byte, NUL shown as `#`.
    pub fn raw(&self) -> RawDump<'_> {
        RawDump(self)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("capacity", &self.capacity)
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

/// Iterator over the messages of a [`Snapshot`].
///
/// Stops after the message closed at the snapshot's `end`, and checks that
/// exactly `count` messages were met on the way. Never walks more than one
/// lap of the ring. Any inconsistency yields one error and ends the walk.
pub struct Messages<'a> {
    snapshot: &'a Snapshot,
    pos: usize,
    found: usize,
    /// Ring bytes covered so far, terminators included
    walked: usize,
    done: bool,
}

impl<'a> Iterator for Messages<'a> {
    type Item = Result<Message<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let snap = self.snapshot;
        let start = self.pos;

        let term = match find_terminator(&snap.storage, snap.capacity, start) {
            Some(term) if term == start => {
                self.done = true;
                return Some(Err(DecodeError::EmptyMessage { pos: start }));
            }
            Some(term) => term,
            None => {
                self.done = true;
                return Some(Err(DecodeError::MissingTerminator { pos: start }));
            }
        };

        let last = term == snap.end;
        self.walked += (term + snap.capacity - start) % snap.capacity + 1;
        if !last && self.walked >= snap.capacity {
            self.done = true;
            return Some(Err(DecodeError::EndNotReached { end: snap.end }));
        }

        self.found += 1;
        if last != (self.found == snap.count) {
            self.done = true;
            return Some(Err(DecodeError::CountMismatch {
                expected: snap.count,
                found: if last { self.found } else { self.found + 1 },
            }));
        }

        self.done = last;
        self.pos = next_pos(term, snap.capacity);
        let (head, tail) = message_slices(&snap.storage, snap.capacity, start, term);
        Some(Ok(Message { start, head, tail }))
    }
}

impl core::iter::FusedIterator for Messages<'_> {}

/// One message borrowed from a snapshot, split where it wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    start: usize,
    head: &'a [u8],
    tail: &'a [u8],
}

impl<'a> Message<'a> {
    /// Ring index of the first byte
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Length without the terminator
    #[inline]
    pub fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The message bytes as two runs; the second is empty unless it wraps.
    #[inline]
    pub fn as_slices(&self) -> (&'a [u8], &'a [u8]) {
        (self.head, self.tail)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(self.head);
        out.extend_from_slice(self.tail);
        out
    }

    /// Fails on the first byte outside printable ASCII.
    pub fn check_printable(&self) -> Result<(), DecodeError> {
        for (i, &byte) in self.head.iter().chain(self.tail).enumerate() {
            if !(0x20..=0x7e).contains(&byte) {
                let pos = if i < self.head.len() {
                    self.start + i
                } else {
                    i - self.head.len()
                };
                return Err(DecodeError::Unprintable { pos, byte });
            }
        }
        Ok(())
    }
}

impl PartialEq<[u8]> for Message<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        other.len() == self.len()
            && other[..self.head.len()] == *self.head
            && other[self.head.len()..] == *self.tail
    }
}

impl fmt::Display for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.head.iter().chain(self.tail) {
            fmt::Write::write_char(f, b as char)?;
        }
        Ok(())
    }
}

/// See [`Snapshot::raw`].
pub struct RawDump<'a>(&'a Snapshot);

impl fmt::Display for RawDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.0;
        write!(f, "[{} {}] ", snap.begin, snap.end)?;
        for &b in &snap.storage[..snap.capacity] {
            let c = match b {
                0 => '#',
                0x20..=0x7e => b as char,
                _ => '?',
            };
            fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}
