// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Range;

use crate::{SpanFlags, TextStorage};

/// Text with spans of type `S` attached to byte ranges.
///
/// Spans are compared by identity (the address of their allocation), never by value.
pub trait Spanned<S: ?Sized>: TextStorage {
    /// Returns the spans accepted by `filter` that overlap `range`.
    ///
    /// A span overlaps when it touches the range and either it is empty, the range is empty, or
    /// the two share more than a single endpoint. Results are ordered by descending priority,
    /// then by insertion order.
    fn get_spans(&self, range: Range<usize>, filter: &dyn Fn(&S) -> bool) -> Vec<Rc<S>>;

    /// The start offset of `span`, or `None` if it is not attached.
    fn span_start(&self, span: &S) -> Option<usize>;

    /// The end offset of `span`, or `None` if it is not attached.
    fn span_end(&self, span: &S) -> Option<usize>;

    /// The flags `span` was attached with, or empty flags if it is not attached.
    fn span_flags(&self, span: &S) -> SpanFlags;

    /// Returns the first offset in `(start, limit)` where a span accepted by `filter` begins
    /// or ends, or `limit` if there is none.
    fn next_span_transition(&self, start: usize, limit: usize, filter: &dyn Fn(&S) -> bool)
    -> usize;

    /// The range of `span`, or `None` if it is not attached.
    fn span_range(&self, span: &S) -> Option<Range<usize>> {
        Some(self.span_start(span)?..self.span_end(span)?)
    }
}

/// Query predicate shared by every span container.
#[inline]
pub(crate) fn span_overlaps(span_start: usize, span_end: usize, start: usize, end: usize) -> bool {
    span_start <= end
        && span_end >= start
        && (span_start == span_end || start == end || (span_start != end && span_end != start))
}

/// The identity of a span: the address of its data, without any pointer metadata.
#[inline]
pub(crate) fn span_address<S: ?Sized>(span: &S) -> usize {
    core::ptr::from_ref(span).cast::<()>().addr()
}

macro_rules! impl_plain_spanned {
    ($ty:ty) => {
        impl<S: ?Sized> Spanned<S> for $ty {
            fn get_spans(&self, _range: Range<usize>, _filter: &dyn Fn(&S) -> bool) -> Vec<Rc<S>> {
                Vec::new()
            }

            fn span_start(&self, _span: &S) -> Option<usize> {
                None
            }

            fn span_end(&self, _span: &S) -> Option<usize> {
                None
            }

            fn span_flags(&self, _span: &S) -> SpanFlags {
                SpanFlags::empty()
            }

            fn next_span_transition(
                &self,
                _start: usize,
                limit: usize,
                _filter: &dyn Fn(&S) -> bool,
            ) -> usize {
                limit
            }
        }
    };
}

impl_plain_spanned!(&str);
impl_plain_spanned!(String);
impl_plain_spanned!(Arc<str>);

#[cfg(test)]
mod tests {
    use super::span_overlaps;

    #[test]
    fn touching_ranges_only_overlap_when_empty() {
        assert!(!span_overlaps(0, 3, 3, 6), "abutting spans");
        assert!(span_overlaps(3, 3, 3, 6), "empty span at query start");
        assert!(span_overlaps(0, 3, 3, 3), "empty query at span end");
        assert!(span_overlaps(0, 4, 3, 6));
        assert!(!span_overlaps(7, 9, 3, 6));
    }
}
