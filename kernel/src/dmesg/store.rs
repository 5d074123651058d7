//! Ring store: the circular byte buffer behind the kernel log
//!
//! Invariants kept between operations:
//! - every byte outside a stored message is NUL,
//! - walking from `begin` meets exactly `count` NUL-terminated messages,
//!   the last one closed at `end`,
//! - an empty store has `end == prev_pos(begin)`.
//!
//! `reserve_and_write` and `evict_oldest` are the only mutators.

use alloc::boxed::Box;
use alloc::vec;

use super::ring::{self, find_terminator, next_pos, prev_pos};
use super::snapshot::{self, Snapshot};
use crate::error::{ExportError, LogError, Result};

pub struct RingStore {
    /// `capacity` ring bytes plus one spare slot that always stays NUL
    storage: Box<[u8]>,
    capacity: usize,
    begin: usize,
    end: usize,
    count: usize,
    poisoned: bool,
}

impl RingStore {
    /// Creates an empty store. `capacity` must already be validated
    /// (see [`LogConfig::validate`](super::LogConfig::validate)).
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity + 1].into_boxed_slice(),
            capacity,
            begin: 0,
            end: capacity - 1,
            count: 0,
            poisoned: false,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of complete messages stored
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn begin(&self) -> usize {
        self.begin
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Bytes available for a new message without evicting anything
    pub fn free_space(&self) -> Result<usize> {
        ring::free_space(self.capacity, self.begin, self.end, self.count).ok_or(
            LogError::IndexInvariant {
                begin: self.begin,
                end: self.end,
                count: self.count,
            },
        )
    }

    /// Bytes occupied by stored messages, terminators included
    pub fn used(&self) -> Result<usize> {
        Ok(self.capacity - self.free_space()?)
    }

    /// Clears the oldest message and advances `begin` past it.
    pub fn evict_oldest(&mut self) -> Result<()> {
        if self.count == 0 {
            return Err(LogError::IndexInvariant {
                begin: self.begin,
                end: self.end,
                count: self.count,
            });
        }

        let term = find_terminator(&self.storage, self.capacity, self.begin)
            .ok_or(LogError::Corrupted { pos: self.begin })?;
        if term == self.begin {
            return Err(LogError::Corrupted { pos: self.begin });
        }

        if self.begin < term {
            self.storage[self.begin..=term].fill(0);
        } else {
            self.storage[self.begin..self.capacity].fill(0);
            self.storage[..=term].fill(0);
        }

        self.begin = next_pos(term, self.capacity);
        self.count -= 1;

        if self.count == 0 && term != self.end {
            return Err(LogError::IndexInvariant {
                begin: self.begin,
                end: self.end,
                count: 0,
            });
        }
        Ok(())
    }

    /// Appends one message made of `parts` followed by a NUL terminator.
    ///
    /// Evicts exactly as many old messages as the new one needs. A message
    /// longer than the capacity is rejected before anything is evicted or
    /// written. An empty body stores nothing: a lone NUL cannot be told
    /// apart from free space.
    ///
    /// Corruption detected on the way poisons the store.
    pub fn reserve_and_write(&mut self, parts: &[&[u8]]) -> Result<()> {
        if self.poisoned {
            return Err(LogError::Poisoned);
        }

        let mut body_len = 0;
        for part in parts {
            if let Some(off) = part.iter().position(|&b| b == 0) {
                return Err(LogError::EmbeddedNul {
                    offset: body_len + off,
                });
            }
            body_len += part.len();
        }
        if body_len == 0 {
            return Ok(());
        }

        let len = body_len + 1;
        if len > self.capacity {
            return Err(LogError::Oversized {
                len,
                capacity: self.capacity,
            });
        }

        let result = self.write_message(parts, len);
        if let Err(err) = result {
            if err.is_fatal() {
                self.poisoned = true;
            }
        }
        result
    }

    fn write_message(&mut self, parts: &[&[u8]], len: usize) -> Result<()> {
        while self.free_space()? < len {
            self.evict_oldest()?;
        }

        let mut pos = next_pos(self.end, self.capacity);
        for &byte in parts.iter().flat_map(|part| part.iter()) {
            self.put(pos, byte)?;
            pos = next_pos(pos, self.capacity);
        }
        self.put(pos, 0)?;

        self.end = pos;
        self.count += 1;
        Ok(())
    }

    #[inline]
    fn put(&mut self, pos: usize, byte: u8) -> Result<()> {
        if self.storage[pos] != 0 {
            return Err(LogError::Corrupted { pos });
        }
        self.storage[pos] = byte;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.storage
    }

    /// Owned copy of the raw state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_parts(
            self.storage.clone(),
            self.capacity,
            self.begin,
            self.end,
            self.count,
        )
    }

    /// Writes the raw state into `dest` using the export layout.
    pub fn export(&self, dest: &mut [u8]) -> core::result::Result<usize, ExportError> {
        snapshot::encode(&self.storage, self.begin, self.end, self.count, dest)
    }

    /// Checks every invariant by walking the buffer. Used by tests.
    pub fn check_invariants(&self) -> bool {
        if self.count == 0 {
            return self.end == prev_pos(self.begin, self.capacity)
                && self.storage.iter().all(|&b| b == 0);
        }

        let mut occupied = vec![false; self.capacity];
        let mut pos = self.begin;
        for i in 0..self.count {
            let term = match find_terminator(&self.storage, self.capacity, pos) {
                Some(term) if term != pos => term,
                _ => return false,
            };
            let mut p = pos;
            loop {
                occupied[p] = true;
                if p == term {
                    break;
                }
                p = next_pos(p, self.capacity);
            }
            if (i + 1 == self.count) != (term == self.end) {
                return false;
            }
            pos = next_pos(term, self.capacity);
        }

        self.storage[self.capacity] == 0
            && occupied
                .iter()
                .zip(self.storage.iter())
                .all(|(&used, &b)| used || b == 0)
    }
}

impl core::fmt::Debug for RingStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RingStore")
            .field("capacity", &self.capacity)
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("count", &self.count)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}
