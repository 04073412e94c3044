// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use crate::{Endpoint, Error, TextStorage};

/// A byte range checked against a text: ordered, in bounds and on char boundaries.
///
/// The check says nothing about later versions of the text. Validate again after an edit.
///
/// ## Example
///
/// ```
/// use spannable::TextRange;
///
/// let text = "first\nsecond\nthird";
/// let range = TextRange::new(&text, 8..9).unwrap();
/// assert_eq!(range.as_range(), 8..9);
/// assert_eq!(range.to_paragraphs(&text).as_range(), 6..13);
/// assert!(TextRange::new(&"é", 0..1).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextRange {
    start: usize,
    end: usize,
}

impl TextRange {
    /// Checks `range` against `text`.
    #[inline]
    pub fn new<T: TextStorage + ?Sized>(text: &T, range: Range<usize>) -> Result<Self, Error> {
        validate_range(text, &range)?;
        Ok(Self {
            start: range.start,
            end: range.end,
        })
    }

    /// The first byte of the range.
    #[must_use]
    #[inline]
    pub const fn start(self) -> usize {
        self.start
    }

    /// One past the last byte of the range.
    #[must_use]
    #[inline]
    pub const fn end(self) -> usize {
        self.end
    }

    /// The number of bytes covered.
    #[must_use]
    #[inline]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    /// Whether the range covers no byte.
    #[must_use]
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Returns the range as a `Range<usize>`.
    #[must_use]
    #[inline]
    pub fn as_range(self) -> Range<usize> {
        self.start..self.end
    }

    /// Widens the range to the whole paragraphs it touches in `text`.
    ///
    /// The start moves back to just after the previous `'\n'`. The end moves forward to just
    /// after the next `'\n'` at or past it, or to the end of the text. An empty range sitting
    /// on a paragraph boundary still widens to the paragraph that follows.
    #[must_use]
    pub fn to_paragraphs<T: TextStorage + ?Sized>(self, text: &T) -> Self {
        let len = text.len();
        let start = text
            .last_index_of('\n', 0..self.start)
            .map_or(0, |i| i + 1);
        let end = text.index_of('\n', self.end..len).map_or(len, |i| i + 1);
        Self { start, end }
    }
}

impl From<TextRange> for Range<usize> {
    #[inline]
    fn from(value: TextRange) -> Self {
        value.as_range()
    }
}

/// Whether a span endpoint flagged as a paragraph boundary may sit at `index`.
///
/// Both ends of the text qualify, as does any offset right after a `'\n'`.
pub fn is_paragraph_boundary<T: TextStorage + ?Sized>(text: &T, index: usize) -> bool {
    index == 0 || index == text.len() || text.char_before(index) == Some('\n')
}

pub(crate) fn validate_range<T: TextStorage + ?Sized>(
    text: &T,
    range: &Range<usize>,
) -> Result<(), Error> {
    let len = text.len();
    if range.start > range.end {
        return Err(Error::invalid_range(range.start, range.end, len));
    }
    if range.end > len {
        return Err(Error::invalid_bounds(range.start, range.end, len));
    }
    for (which, offset) in [(Endpoint::Start, range.start), (Endpoint::End, range.end)] {
        if !text.is_char_boundary(offset) {
            return Err(Error::not_on_char_boundary(
                text,
                range.start,
                range.end,
                which,
                offset,
            ));
        }
    }
    Ok(())
}
