//! Bulk-export stream adapter.
//!
//! Bulk loaders pull bytes; exporters produce rows. [`RowStream`] bridges
//! the two: it wraps an iterator of text rows as a [`Read`] source,
//! buffering exactly one pending chunk and serving partial reads from it.

use std::borrow::Cow;
use std::io::{self, Read};

/// Escape one field for tab-separated bulk loading.
///
/// An absent value becomes `\N`; embedded backslashes and newlines are
/// escaped so they cannot break the row framing.
pub fn escape_field(value: Option<&str>) -> Cow<'_, str> {
    match value {
        None => Cow::Borrowed(r"\N"),
        Some(v) if v.contains('\\') || v.contains('\n') => {
            Cow::Owned(v.replace('\\', r"\\").replace('\n', r"\n"))
        }
        Some(v) => Cow::Borrowed(v),
    }
}

/// Pull-model byte source over generated rows.
pub struct RowStream<I> {
    rows: I,
    pending: Vec<u8>,
    offset: usize,
}

impl<I> RowStream<I>
where
    I: Iterator<Item = String>,
{
    pub fn new(rows: I) -> Self {
        Self {
            rows,
            pending: Vec::new(),
            offset: 0,
        }
    }

    /// Pull the next non-empty row into the pending buffer.
    fn refill(&mut self) -> bool {
        for row in self.rows.by_ref() {
            if !row.is_empty() {
                self.pending = row.into_bytes();
                self.offset = 0;
                return true;
            }
        }
        false
    }
}

impl<I> Read for RowStream<I>
where
    I: Iterator<Item = String>,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            if self.offset >= self.pending.len() && !self.refill() {
                break;
            }
            let available = &self.pending[self.offset..];
            let n = available.len().min(buf.len() - written);
            buf[written..written + n].copy_from_slice(&available[..n]);
            self.offset += n;
            written += n;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(rows: &[&str]) -> RowStream<std::vec::IntoIter<String>> {
        let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        RowStream::new(rows.into_iter())
    }

    #[test]
    fn reads_all_rows_into_one_buffer() {
        let mut out = String::new();
        stream(&["a\t1\n", "b\t2\n"])
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "a\t1\nb\t2\n");
    }

    #[test]
    fn serves_partial_reads_from_the_pending_chunk() {
        let mut s = stream(&["abcdef\n"]);
        let mut buf = [0u8; 4];

        assert_eq!(s.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(s.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"ef\n");
        assert_eq!(s.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn small_reads_span_row_boundaries() {
        let mut s = stream(&["ab", "cd"]);
        let mut buf = [0u8; 3];

        assert_eq!(s.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"abc");
        assert_eq!(s.read(&mut buf).unwrap(), 1);
        assert_eq!(&buf[..1], b"d");
    }

    #[test]
    fn empty_rows_are_transparent() {
        let mut out = String::new();
        stream(&["", "a\n", "", "b\n"])
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn empty_iterator_is_immediately_exhausted() {
        let mut buf = [0u8; 8];
        assert_eq!(stream(&[]).read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn escape_field_maps_absent_to_null_marker() {
        assert_eq!(escape_field(None), r"\N");
    }

    #[test]
    fn escape_field_passes_plain_values_through() {
        assert!(matches!(
            escape_field(Some("plain value")),
            Cow::Borrowed("plain value")
        ));
    }

    #[test]
    fn escape_field_escapes_backslashes_then_newlines() {
        assert_eq!(escape_field(Some("a\nb")), r"a\nb");
        assert_eq!(escape_field(Some(r"a\b")), r"a\\b");
        assert_eq!(escape_field(Some("a\\\nb")), r"a\\\nb");
    }
}
