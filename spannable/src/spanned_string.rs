// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::ops::Range;

use crate::spanned::{span_address, span_overlaps};
use crate::text_range::validate_range;
use crate::{Error, SpanFlags, Spanned, TextStorage};

struct SpanEntry<S: ?Sized> {
    span: Rc<S>,
    start: usize,
    end: usize,
    flags: SpanFlags,
}

impl<S: ?Sized> Clone for SpanEntry<S> {
    fn clone(&self) -> Self {
        Self {
            span: self.span.clone(),
            start: self.start,
            end: self.end,
            flags: self.flags,
        }
    }
}

/// An immutable snapshot of text and its spans.
///
/// Lookups are linear in the number of spans, which suits the short replacement strings that
/// input filters produce.
pub struct SpannedString<S: ?Sized> {
    text: String,
    spans: Vec<SpanEntry<S>>,
}

impl<S: ?Sized> SpannedString<S> {
    /// Creates a snapshot without spans.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    /// Copies `range` of `source` together with the spans overlapping it, clipped and rebased
    /// to the copy.
    pub fn from_spanned(source: &dyn Spanned<S>, range: Range<usize>) -> Result<Self, Error> {
        validate_range(source, &range)?;
        Ok(Self::copy_of(source, range))
    }

    pub(crate) fn copy_of(source: &dyn Spanned<S>, range: Range<usize>) -> Self {
        let mut text = String::with_capacity(range.len());
        source.get_chars(range.clone(), &mut text);
        let mut spans = Vec::new();
        for span in source.get_spans(range.clone(), &|_| true) {
            let (Some(start), Some(end)) = (source.span_start(&span), source.span_end(&span))
            else {
                continue;
            };
            spans.push(SpanEntry {
                start: start.clamp(range.start, range.end) - range.start,
                end: end.clamp(range.start, range.end) - range.start,
                flags: source.span_flags(&span),
                span,
            });
        }
        Self { text, spans }
    }

    /// The text of this snapshot.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn entry(&self, span: &S) -> Option<&SpanEntry<S>> {
        let address = span_address(span);
        self.spans
            .iter()
            .find(|e| span_address::<S>(&e.span) == address)
    }
}

impl<S: ?Sized> Clone for SpannedString<S> {
    fn clone(&self) -> Self {
        Self {
            text: self.text.clone(),
            spans: self.spans.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for SpannedString<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpannedString")
            .field("text", &self.text)
            .field("spans", &self.spans.len())
            .finish()
    }
}

impl<S: ?Sized> fmt::Display for SpannedString<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl<S: ?Sized> From<&str> for SpannedString<S> {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl<S: ?Sized> TextStorage for SpannedString<S> {
    fn len(&self) -> usize {
        self.text.len()
    }

    fn is_char_boundary(&self, index: usize) -> bool {
        self.text.is_char_boundary(index)
    }

    fn slices(&self, range: Range<usize>) -> (&str, &str) {
        (self.text.get(range).unwrap_or_default(), "")
    }
}

impl<S: ?Sized> Spanned<S> for SpannedString<S> {
    fn get_spans(&self, range: Range<usize>, filter: &dyn Fn(&S) -> bool) -> Vec<Rc<S>> {
        let mut found: Vec<&SpanEntry<S>> = self
            .spans
            .iter()
            .filter(|e| span_overlaps(e.start, e.end, range.start, range.end) && filter(&e.span))
            .collect();
        // Stable, so equal priorities keep insertion order.
        found.sort_by(|a, b| b.flags.priority().cmp(&a.flags.priority()));
        found.into_iter().map(|e| e.span.clone()).collect()
    }

    fn span_start(&self, span: &S) -> Option<usize> {
        self.entry(span).map(|e| e.start)
    }

    fn span_end(&self, span: &S) -> Option<usize> {
        self.entry(span).map(|e| e.end)
    }

    fn span_flags(&self, span: &S) -> SpanFlags {
        self.entry(span).map_or(SpanFlags::empty(), |e| e.flags)
    }

    fn next_span_transition(
        &self,
        start: usize,
        limit: usize,
        filter: &dyn Fn(&S) -> bool,
    ) -> usize {
        let mut limit = limit;
        for e in &self.spans {
            if !filter(&e.span) {
                continue;
            }
            if e.start > start && e.start < limit {
                limit = e.start;
            }
            if e.end > start && e.end < limit {
                limit = e.end;
            }
        }
        limit
    }
}
