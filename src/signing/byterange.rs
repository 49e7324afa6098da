//! The `/ByteRange` entry of a signature dictionary.
//!
//! A PDF signature covers two half-open spans of the file: everything before
//! the `/Contents` placeholder and everything after it. The entry is written
//! as four integers `[offset1 length1 offset2 length2]`. Because the entry is
//! rewritten *after* the document is serialized, every integer is encoded at
//! a fixed width so the rewrite never moves a byte.

use std::ops::Range;

use super::types::Placeholder;
use crate::error::{Error, Result};

/// Decimal digits reserved for each `/ByteRange` integer.
///
/// Ten digits cover files up to ~9.9 GB, far beyond any document this
/// protocol is asked to handle.
pub const BYTE_RANGE_DIGITS: usize = 10;

/// The four `/ByteRange` integers `[o1, l1, o2, l2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange([i64; 4]);

impl ByteRange {
    /// Wrap an existing four-integer array.
    pub fn new(values: [i64; 4]) -> Self {
        Self(values)
    }

    /// Compute the range covering everything except the placeholder.
    pub fn around_placeholder(file_len: usize, placeholder: &Placeholder) -> Self {
        let span = placeholder.span();
        Self([
            0,
            span.start as i64,
            span.end as i64,
            (file_len - span.end) as i64,
        ])
    }

    /// The raw `[o1, l1, o2, l2]` array.
    pub fn as_array(&self) -> [i64; 4] {
        self.0
    }

    /// First covered span, `[0, o1 + l1)`.
    pub fn first_span(&self) -> Range<usize> {
        self.0[0] as usize..(self.0[0] + self.0[1]) as usize
    }

    /// Second covered span, `[o2, o2 + l2)`.
    pub fn second_span(&self) -> Range<usize> {
        self.0[2] as usize..(self.0[2] + self.0[3]) as usize
    }

    /// Check the covering invariants against a concrete file.
    ///
    /// The two spans must be non-negative, start at byte 0, be contiguous
    /// with the placeholder on both sides, and together with the placeholder
    /// cover `[0, file_len)` exactly once.
    pub fn validate(&self, file_len: usize, placeholder: Range<usize>) -> Result<()> {
        let [o1, l1, o2, l2] = self.0;

        if o1 < 0 || l1 < 0 || o2 < 0 || l2 < 0 {
            return Err(Error::InvalidDocument(format!(
                "ByteRange contains negative values: [{} {} {} {}]",
                o1, l1, o2, l2
            )));
        }
        if o1 != 0 {
            return Err(Error::InvalidDocument(format!(
                "ByteRange must start at offset 0, got {}",
                o1
            )));
        }
        if (o1 + l1) as usize != placeholder.start {
            return Err(Error::InvalidDocument(format!(
                "first span ends at {} but placeholder starts at {}",
                o1 + l1,
                placeholder.start
            )));
        }
        if o2 as usize != placeholder.end {
            return Err(Error::InvalidDocument(format!(
                "second span starts at {} but placeholder ends at {}",
                o2, placeholder.end
            )));
        }
        if (o2 + l2) as usize != file_len {
            return Err(Error::InvalidDocument(format!(
                "ByteRange must end at file length {}, got {}",
                file_len,
                o2 + l2
            )));
        }
        Ok(())
    }

    /// Borrow the two covered spans of `data`, in order.
    pub fn spans<'a>(&self, data: &'a [u8]) -> Result<[&'a [u8]; 2]> {
        let first = self.first_span();
        let second = self.second_span();
        if first.end > data.len() || second.end > data.len() {
            return Err(Error::InvalidDocument(format!(
                "ByteRange [{} {} {} {}] exceeds file length {}",
                self.0[0],
                self.0[1],
                self.0[2],
                self.0[3],
                data.len()
            )));
        }
        Ok([&data[first], &data[second]])
    }

    /// Extract and concatenate the covered bytes.
    pub fn covered_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let [first, second] = self.spans(data)?;
        let mut covered = Vec::with_capacity(first.len() + second.len());
        covered.extend_from_slice(first);
        covered.extend_from_slice(second);
        Ok(covered)
    }

    /// Render the four integers at fixed width, single-space separated.
    ///
    /// This is the exact text written between the `[` and `]` of the
    /// pre-sized `/ByteRange` entry.
    pub fn render_fixed_width(&self) -> Result<String> {
        let limit = 10i64.pow(BYTE_RANGE_DIGITS as u32);
        for value in self.0 {
            if !(0..limit).contains(&value) {
                return Err(Error::DocumentModel(format!(
                    "ByteRange value {} does not fit in {} decimal digits",
                    value, BYTE_RANGE_DIGITS
                )));
            }
        }
        Ok(format!(
            "{:0w$} {:0w$} {:0w$} {:0w$}",
            self.0[0],
            self.0[1],
            self.0[2],
            self.0[3],
            w = BYTE_RANGE_DIGITS
        ))
    }

    /// Width in bytes of the fixed-width rendering.
    pub const fn fixed_width() -> usize {
        BYTE_RANGE_DIGITS * 4 + 3
    }

    /// Rewrite the pre-sized `/ByteRange` text in place.
    ///
    /// `span` is the interior of the bracketed entry as located by the
    /// document model. The rendered text must fill it exactly, so the file
    /// length cannot change.
    pub fn write_into(&self, buffer: &mut [u8], span: Range<usize>) -> Result<()> {
        let rendered = self.render_fixed_width()?;
        if rendered.len() != span.len() || span.end > buffer.len() {
            return Err(Error::DocumentModel(format!(
                "pre-sized ByteRange span is {} bytes, rendered text is {}",
                span.len(),
                rendered.len()
            )));
        }
        buffer[span].copy_from_slice(rendered.as_bytes());
        Ok(())
    }
}
