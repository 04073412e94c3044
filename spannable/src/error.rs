// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::TextStorage;

/// Rich error type for span storage operations.
///
/// Carries a non-exhaustive [`ErrorKind`] plus the attempted range, the text length at the time
/// of failure and, for boundary problems, the offending index.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// The non-exhaustive category describing this error.
    kind: ErrorKind,

    /// The start byte index of the caller-provided range.
    start: usize,

    /// The end byte index (exclusive) of the caller-provided range.
    end: usize,

    /// The length in bytes of the underlying text at the time of failure.
    len: usize,

    /// Extra detail for boundary-related errors, when available.
    boundary: Option<BoundaryInfo>,
}

#[expect(
    clippy::len_without_is_empty,
    reason = "`Error::len` reports source text length context; an `is_empty` method would be misleading and unused."
)]
impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The start byte index of the range provided by the caller.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The end byte index of the range provided by the caller.
    pub fn end(&self) -> usize {
        self.end
    }

    /// The length in bytes of the underlying text at the time of the error.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Extra details for boundary-related errors, if available.
    pub fn boundary(&self) -> Option<BoundaryInfo> {
        self.boundary
    }

    pub(crate) fn invalid_bounds(start: usize, end: usize, len: usize) -> Self {
        Self {
            kind: ErrorKind::InvalidBounds,
            start,
            end,
            len,
            boundary: None,
        }
    }

    pub(crate) fn invalid_range(start: usize, end: usize, len: usize) -> Self {
        Self {
            kind: ErrorKind::InvalidRange,
            start,
            end,
            len,
            boundary: None,
        }
    }

    pub(crate) fn not_on_char_boundary<T: TextStorage + ?Sized>(
        text: &T,
        start: usize,
        end: usize,
        which: Endpoint,
        index: usize,
    ) -> Self {
        let (cs, ce) = enclosing_char_span(text, index).unwrap_or((index, index));
        Self {
            kind: ErrorKind::NotOnCharBoundary,
            start,
            end,
            len: text.len(),
            boundary: Some(BoundaryInfo {
                which,
                index,
                char_start: cs,
                char_end: ce,
            }),
        }
    }

    /// A `PARAGRAPH` endpoint at `index` that does not follow a newline.
    pub(crate) fn invalid_paragraph<T: TextStorage + ?Sized>(
        text: &T,
        start: usize,
        end: usize,
        which: Endpoint,
        index: usize,
    ) -> Self {
        let char_start = text
            .char_before(index)
            .map_or(index, |c| index - c.len_utf8());
        Self {
            kind: ErrorKind::InvalidParagraph,
            start,
            end,
            len: text.len(),
            boundary: Some(BoundaryInfo {
                which,
                index,
                char_start,
                char_end: index,
            }),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::InvalidBounds => write!(
                f,
                "range {}..{} out of bounds for len {}",
                self.start, self.end, self.len
            ),
            ErrorKind::InvalidRange => {
                write!(f, "invalid range {}..{}: start > end", self.start, self.end)
            }
            ErrorKind::NotOnCharBoundary => {
                if let Some(b) = self.boundary {
                    write!(
                        f,
                        "range {}..{}: {} index {} not on UTF-8 boundary (char {}..{})",
                        self.start,
                        self.end,
                        b.which.name(),
                        b.index,
                        b.char_start,
                        b.char_end
                    )
                } else {
                    write!(
                        f,
                        "range {}..{} not on UTF-8 boundary",
                        self.start, self.end
                    )
                }
            }
            ErrorKind::InvalidParagraph => {
                if let Some(b) = self.boundary {
                    write!(
                        f,
                        "PARAGRAPH span {}..{} must {} at a paragraph boundary ({} follows char {}..{})",
                        self.start,
                        self.end,
                        b.which.name(),
                        b.index,
                        b.char_start,
                        b.char_end
                    )
                } else {
                    write!(
                        f,
                        "PARAGRAPH span {}..{} is not at a paragraph boundary",
                        self.start, self.end
                    )
                }
            }
        }
    }
}

impl core::error::Error for Error {}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Provided range indices were out of bounds relative to the text length.
    InvalidBounds,

    /// The provided range had `start > end`.
    InvalidRange,

    /// Either `start` or `end` was not aligned to a UTF-8 character boundary.
    NotOnCharBoundary,

    /// A span flagged [`SpanFlags::PARAGRAPH`] had an endpoint that is neither a text edge nor
    /// directly after a `'\n'`.
    ///
    /// [`SpanFlags::PARAGRAPH`]: crate::SpanFlags::PARAGRAPH
    InvalidParagraph,
}

/// Identifies which endpoint of a range failed validation.
///
/// This type is surfaced via [`BoundaryInfo`], which is attached to [`Error`]
/// for boundary-related failures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// The `start` endpoint of the range.
    Start,

    /// The `end` endpoint of the range.
    End,
}

impl Endpoint {
    fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// Details about an offending index.
///
/// For [`ErrorKind::NotOnCharBoundary`] the char range is the UTF-8 codepoint enclosing the
/// index. For [`ErrorKind::InvalidParagraph`] it is the codepoint directly preceding the index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoundaryInfo {
    /// Which endpoint (`start` or `end`) was invalid.
    pub which: Endpoint,

    /// The offending byte index.
    pub index: usize,

    /// The start byte index of the relevant UTF-8 codepoint.
    pub char_start: usize,

    /// The end byte index (exclusive) of the relevant UTF-8 codepoint.
    pub char_end: usize,
}

fn enclosing_char_span<T: TextStorage + ?Sized>(text: &T, index: usize) -> Option<(usize, usize)> {
    let len = text.len();
    if index > len {
        return None;
    }
    if text.is_char_boundary(index) {
        return Some((index, index));
    }

    // A UTF-8 codepoint spans at most 4 bytes, and index 0 is always a boundary.
    let mut s = index;
    while s > 0 && index - s < 4 {
        s -= 1;
        if text.is_char_boundary(s) {
            break;
        }
    }

    let mut e = index;
    while e < len && e - index < 4 {
        e += 1;
        if text.is_char_boundary(e) {
            break;
        }
    }

    if s <= e { Some((s, e)) } else { None }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::{Endpoint, Error, ErrorKind};

    #[test]
    fn paragraph_error_points_at_preceding_char() {
        let t = "ab\ncd";
        let err = Error::invalid_paragraph(&t, 1, 3, Endpoint::Start, 1);
        assert_eq!(err.kind(), ErrorKind::InvalidParagraph);
        let b = err.boundary().expect("boundary info");
        assert_eq!(b.which, Endpoint::Start);
        assert_eq!((b.char_start, b.char_end), (0, 1));
        assert!(
            err.to_string().contains("must start at a paragraph boundary"),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn boundary_error_reports_enclosing_codepoint() {
        // "€" is 3 bytes in UTF-8.
        let t = "a€b";
        let err = Error::not_on_char_boundary(&t, 2, 4, Endpoint::Start, 2);
        let b = err.boundary().expect("boundary info");
        assert_eq!((b.char_start, b.char_end), (1, 4));
        assert_eq!(err.len(), 5);
    }
}
