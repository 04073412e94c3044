// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use crate::{SpannableStringBuilder, Spanned, SpannedString, TextStorage};

/// Rewrites text before it is inserted into a [`SpannableStringBuilder`].
///
/// Filters run in order; each sees the output of the previous one.
pub trait InputFilter<S: ?Sized> {
    /// Called when `source[source_range]` is about to replace `dest[dest_range]`.
    ///
    /// Returns the text to insert instead, or `None` to accept the source unchanged.
    fn filter(
        &self,
        source: &dyn Spanned<S>,
        source_range: Range<usize>,
        dest: &SpannableStringBuilder<S>,
        dest_range: Range<usize>,
    ) -> Option<SpannedString<S>>;
}

/// Caps the number of `char`s the destination may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthFilter {
    max: usize,
}

impl LengthFilter {
    /// Creates a filter that keeps at most `max` chars.
    pub const fn new(max: usize) -> Self {
        Self { max }
    }

    /// The maximum length in chars.
    pub const fn max(&self) -> usize {
        self.max
    }
}

impl<S: ?Sized> InputFilter<S> for LengthFilter {
    fn filter(
        &self,
        source: &dyn Spanned<S>,
        source_range: Range<usize>,
        dest: &SpannableStringBuilder<S>,
        dest_range: Range<usize>,
    ) -> Option<SpannedString<S>> {
        let kept = dest.char_count(0..dest.len()) - dest.char_count(dest_range);
        let keep = self.max.saturating_sub(kept);
        if keep == 0 {
            return Some(SpannedString::new(""));
        }
        if keep >= source.char_count(source_range.clone()) {
            return None;
        }
        let (a, b) = source.slices(source_range.clone());
        let cut = a
            .char_indices()
            .map(|(i, _)| i)
            .chain(b.char_indices().map(|(i, _)| a.len() + i))
            .nth(keep)
            .unwrap_or(a.len() + b.len());
        Some(SpannedString::copy_of(
            source,
            source_range.start..source_range.start + cut,
        ))
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::ToString;

    use super::LengthFilter;
    use crate::SpannableStringBuilder;

    #[test]
    fn length_filter_truncates_on_char_boundaries() {
        let mut text = SpannableStringBuilder::<str>::from_text("ab");
        text.set_filters(alloc::vec![Box::new(LengthFilter::new(4))]);
        text.append("€€€").unwrap();
        assert_eq!(text.to_string(), "ab€€");
        text.append("x").unwrap();
        assert_eq!(text.to_string(), "ab€€", "full text rejects further input");
        text.replace_str(0..1, "yz").unwrap();
        assert_eq!(text.to_string(), "yb€€");
    }
}
