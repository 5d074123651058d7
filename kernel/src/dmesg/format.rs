//! Message formatter
//!
//! `%d` decimal, `%x` hex, `%p` pointer, `%s` string, `%%` literal percent.
//! Pure: produces bytes, never touches the ring.

use alloc::vec::Vec;
use core::fmt;

const DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Hex digits printed for `%p`
pub const PTR_HEX_WIDTH: usize = core::mem::size_of::<usize>() * 2;

/// A formatter argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
    Int(i64),
    Ptr(usize),
    /// `None` prints as `(null)`
    Str(Option<&'a str>),
}

impl Arg<'_> {
    fn as_int(&self) -> Option<i64> {
        match *self {
            Arg::Int(v) => Some(v),
            Arg::Ptr(p) => Some(p as i64),
            Arg::Str(_) => None,
        }
    }

    fn as_ptr(&self) -> Option<usize> {
        match *self {
            Arg::Int(v) => Some(v as usize),
            Arg::Ptr(p) => Some(p),
            Arg::Str(_) => None,
        }
    }
}

macro_rules! int_arg {
    ($($t:ty),*) => {
        $(impl From<$t> for Arg<'_> {
            fn from(v: $t) -> Self {
                Arg::Int(v as i64)
            }
        })*
    };
}

int_arg!(i8, i16, i32, i64, u8, u16, u32, isize);

impl From<usize> for Arg<'_> {
    fn from(v: usize) -> Self {
        Arg::Ptr(v)
    }
}

impl<T> From<*const T> for Arg<'_> {
    fn from(p: *const T) -> Self {
        Arg::Ptr(p as usize)
    }
}

impl<T> From<*mut T> for Arg<'_> {
    fn from(p: *mut T) -> Self {
        Arg::Ptr(p as usize)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Str(Some(s))
    }
}

impl<'a> From<Option<&'a str>> for Arg<'a> {
    fn from(s: Option<&'a str>) -> Self {
        Arg::Str(s)
    }
}

/// Formats `template` with `args` into a new buffer.
pub fn format(template: &str, args: &[Arg<'_>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(template.len() + 16 * args.len());
    format_into(&mut out, template.as_bytes(), args);
    out
}

/// Appends the expansion of `template` to `out`.
///
/// Unknown directives are kept as `%c`. A missing argument, or one of the
/// wrong kind, also leaves its directive verbatim. A lone trailing `%` is
/// dropped.
pub fn format_into(out: &mut Vec<u8>, template: &[u8], args: &[Arg<'_>]) {
    let mut args = args.iter();
    let mut bytes = template.iter().copied();

    while let Some(c) = bytes.next() {
        if c != b'%' {
            out.push(c);
            continue;
        }
        let Some(directive) = bytes.next() else {
            break;
        };

        let done = match directive {
            b'd' => args.next().and_then(Arg::as_int).map(|v| push_int(out, v, 10)),
            b'x' => args.next().and_then(Arg::as_int).map(|v| push_int(out, v, 16)),
            b'p' => args.next().and_then(Arg::as_ptr).map(|p| push_ptr(out, p)),
            b's' => match args.next() {
                Some(Arg::Str(s)) => {
                    out.extend_from_slice(s.unwrap_or("(null)").as_bytes());
                    Some(())
                }
                _ => None,
            },
            b'%' => {
                out.push(b'%');
                Some(())
            }
            _ => None,
        };

        if done.is_none() {
            out.push(b'%');
            out.push(directive);
        }
    }
}

/// Signed integer in `base`, `-` prefixed when negative
fn push_int(out: &mut Vec<u8>, value: i64, base: u64) {
    let mut digits = [0u8; 64];
    let mut n = value.unsigned_abs();
    let mut i = digits.len();
    loop {
        i -= 1;
        digits[i] = DIGITS[(n % base) as usize];
        n /= base;
        if n == 0 {
            break;
        }
    }
    if value < 0 {
        out.push(b'-');
    }
    out.extend_from_slice(&digits[i..]);
}

/// `0x` followed by a zero-padded, full-width hex value
fn push_ptr(out: &mut Vec<u8>, value: usize) {
    out.extend_from_slice(b"0x");
    for shift in (0..PTR_HEX_WIDTH).rev() {
        out.push(DIGITS[(value >> (shift * 4)) & 0xf]);
    }
}

/// Replaces bytes outside printable ASCII with `?`.
pub fn sanitize(bytes: &mut [u8]) {
    for b in bytes.iter_mut() {
        if !(0x20..=0x7e).contains(b) {
            *b = b'?';
        }
    }
}

/// Fixed buffer sink for `core::fmt`, truncating silently when full
pub struct BufferWriter<'a> {
    pub buffer: &'a mut [u8],
    pub pos: usize,
}

impl<'a> BufferWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, pos: 0 }
    }

    /// The bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.pos]
    }
}

impl fmt::Write for BufferWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buffer.len() - self.pos;
        let to_write = bytes.len().min(remaining);

        if to_write > 0 {
            self.buffer[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
        }

        Ok(())
    }
}

/// Longest `"[ticks] "` prefix: 20 digits of `u64::MAX` plus `[`, `]` and a space
pub const TICK_PREFIX_LEN: usize = 23;

/// Writes `"[ticks] "` into `buf` and returns the used part.
pub fn tick_prefix(buf: &mut [u8; TICK_PREFIX_LEN], ticks: u64) -> &[u8] {
    let mut writer = BufferWriter::new(&mut buf[..]);
    let _ = fmt::Write::write_fmt(&mut writer, format_args!("[{}] ", ticks));
    let len = writer.pos;
    &buf[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(template: &str, args: &[Arg<'_>]) -> alloc::string::String {
        alloc::string::String::from_utf8(format(template, args)).unwrap()
    }

    #[test]
    fn test_literal_passthrough() {
        assert_eq!(expand("plain text", &[]), "plain text");
    }

    #[test]
    fn test_decimal() {
        assert_eq!(expand("pid %d", &[Arg::Int(42)]), "pid 42");
        assert_eq!(expand("%d", &[Arg::Int(-17)]), "-17");
        assert_eq!(expand("%d", &[Arg::Int(0)]), "0");
        assert_eq!(expand("%d", &[Arg::Int(i64::MIN)]), "-9223372036854775808");
    }

    #[test]
    fn test_hex() {
        assert_eq!(expand("%x", &[Arg::Int(255)]), "ff");
        assert_eq!(expand("%x", &[Arg::Int(-16)]), "-10");
    }

    #[test]
    fn test_pointer_is_full_width() {
        let out = expand("%p", &[Arg::Ptr(0xdead)]);
        assert_eq!(out.len(), 2 + PTR_HEX_WIDTH);
        assert!(out.starts_with("0x"));
        assert!(out.ends_with("dead"));
        assert!(out[2..out.len() - 4].bytes().all(|b| b == b'0'));
    }

    #[test]
    fn test_strings() {
        assert_eq!(expand("[%s]", &[Arg::from("disk")]), "[disk]");
        assert_eq!(expand("[%s]", &[Arg::Str(None)]), "[(null)]");
    }

    #[test]
    fn test_percent_and_unknown() {
        assert_eq!(expand("100%%", &[]), "100%");
        assert_eq!(expand("%q", &[]), "%q");
        assert_eq!(expand("trailing %", &[]), "trailing ");
    }

    #[test]
    fn test_missing_or_mismatched_args() {
        assert_eq!(expand("%d and %d", &[Arg::Int(1)]), "1 and %d");
        assert_eq!(expand("%s", &[Arg::Int(1)]), "%s");
        assert_eq!(expand("%d", &[Arg::from("x")]), "%d");
        assert_eq!(expand("%d", &[Arg::Ptr(12)]), "12");
    }

    #[test]
    fn test_sanitize() {
        let mut bytes = *b"a\nb\x7fc";
        sanitize(&mut bytes);
        assert_eq!(&bytes, b"a?b?c");
    }

    #[test]
    fn test_tick_prefix() {
        let mut buf = [0u8; TICK_PREFIX_LEN];
        assert_eq!(tick_prefix(&mut buf, 0), b"[0] ");
        assert_eq!(tick_prefix(&mut buf, u64::MAX), b"[18446744073709551615] ");
    }

    #[test]
    fn test_buffer_writer_truncates() {
        use core::fmt::Write;
        let mut buf = [0u8; 4];
        let mut w = BufferWriter::new(&mut buf);
        write!(w, "{}", 123456).unwrap();
        assert_eq!(w.as_bytes(), b"1234");
    }
}
