// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::sync::Arc;
use core::ops::Range;

/// A block of UTF-8 text that may be stored non-contiguously.
///
/// A storage exposes any byte range as at most two string slices, which is what a gap buffer
/// can hand out without copying. All indices are byte offsets. Ranges passed to
/// [`slices`](Self::slices) are expected to be in bounds and on char boundaries; out-of-range
/// requests yield empty slices rather than panicking.
pub trait TextStorage {
    /// The length of the underlying text.
    fn len(&self) -> usize;

    /// Return `true` if the underlying text is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return whether `index` is a UTF-8 character boundary in the text.
    fn is_char_boundary(&self, index: usize) -> bool;

    /// Returns the text in `range` as two consecutive slices.
    ///
    /// The second slice is empty unless the range straddles a discontinuity in the storage.
    fn slices(&self, range: Range<usize>) -> (&str, &str);

    /// Appends the text in `range` to `dest`.
    fn get_chars(&self, range: Range<usize>, dest: &mut String) {
        let (a, b) = self.slices(range);
        dest.push_str(a);
        dest.push_str(b);
    }

    /// Returns the number of `char`s in `range`.
    fn char_count(&self, range: Range<usize>) -> usize {
        let (a, b) = self.slices(range);
        a.chars().count() + b.chars().count()
    }

    /// Returns the char starting at `index`.
    fn char_at(&self, index: usize) -> Option<char> {
        if index >= self.len() || !self.is_char_boundary(index) {
            return None;
        }
        let mut end = index + 1;
        while end < self.len() && !self.is_char_boundary(end) {
            end += 1;
        }
        let (a, b) = self.slices(index..end);
        a.chars().next().or_else(|| b.chars().next())
    }

    /// Returns the char ending at `index`.
    fn char_before(&self, index: usize) -> Option<char> {
        if index == 0 || index > self.len() || !self.is_char_boundary(index) {
            return None;
        }
        let mut start = index - 1;
        while start > 0 && !self.is_char_boundary(start) {
            start -= 1;
        }
        let (a, b) = self.slices(start..index);
        b.chars().next_back().or_else(|| a.chars().next_back())
    }

    /// Returns the offset of the first `ch` in `range`.
    fn index_of(&self, ch: char, range: Range<usize>) -> Option<usize> {
        let start = range.start;
        let (a, b) = self.slices(range);
        a.find(ch)
            .map(|i| start + i)
            .or_else(|| b.find(ch).map(|i| start + a.len() + i))
    }

    /// Returns the offset of the last `ch` in `range`.
    fn last_index_of(&self, ch: char, range: Range<usize>) -> Option<usize> {
        let start = range.start;
        let (a, b) = self.slices(range);
        b.rfind(ch)
            .map(|i| start + a.len() + i)
            .or_else(|| a.rfind(ch).map(|i| start + i))
    }
}

impl TextStorage for String {
    fn len(&self) -> usize {
        Self::len(self)
    }

    fn is_char_boundary(&self, index: usize) -> bool {
        self.as_str().is_char_boundary(index)
    }

    fn slices(&self, range: Range<usize>) -> (&str, &str) {
        (self.get(range).unwrap_or_default(), "")
    }
}

impl TextStorage for &str {
    fn len(&self) -> usize {
        str::len(self)
    }

    fn is_char_boundary(&self, index: usize) -> bool {
        str::is_char_boundary(self, index)
    }

    fn slices(&self, range: Range<usize>) -> (&str, &str) {
        (self.get(range).unwrap_or_default(), "")
    }
}

impl TextStorage for Arc<str> {
    fn len(&self) -> usize {
        str::len(self)
    }

    fn is_char_boundary(&self, index: usize) -> bool {
        str::is_char_boundary(self, index)
    }

    fn slices(&self, range: Range<usize>) -> (&str, &str) {
        (self.get(range).unwrap_or_default(), "")
    }
}

#[cfg(test)]
mod tests {
    use super::TextStorage;
    use alloc::string::{String, ToString};
    use alloc::sync::Arc;

    fn assert_boundaries<T: TextStorage>(t: &T, trues: &[usize], falses: &[usize]) {
        for &i in trues {
            assert!(t.is_char_boundary(i), "index {i} should be boundary");
        }
        for &i in falses {
            assert!(!t.is_char_boundary(i), "index {i} should not be boundary");
        }
    }

    #[test]
    fn is_char_boundary_multibyte() {
        let s = "éclair";
        assert_boundaries(&s, &[0, 2, s.len()], &[1]);

        let owned = s.to_string();
        assert_boundaries(&owned, &[0, 2, owned.len()], &[1]);

        let arc: Arc<str> = Arc::from(s);
        assert_boundaries(&arc, &[0, 2, arc.len()], &[1]);
    }

    #[test]
    fn char_lookup_around_multibyte() {
        let s = "a€b";
        assert_eq!(s.char_at(0), Some('a'));
        assert_eq!(s.char_at(1), Some('€'));
        assert_eq!(s.char_at(2), None, "index inside a codepoint");
        assert_eq!(s.char_at(5), None, "index at the end");
        assert_eq!(s.char_before(4), Some('€'));
        assert_eq!(s.char_before(0), None);
        assert_eq!(s.char_count(0..5), 3);
    }

    #[test]
    fn searches_are_range_relative() {
        let s = "a\nb\nc";
        assert_eq!(s.index_of('\n', 0..5), Some(1));
        assert_eq!(s.index_of('\n', 2..5), Some(3));
        assert_eq!(s.last_index_of('\n', 0..3), Some(1));
        assert_eq!(s.last_index_of('\n', 4..5), None);

        let mut out = String::new();
        s.get_chars(2..5, &mut out);
        assert_eq!(out, "b\nc");
    }

    #[test]
    fn out_of_range_slices_are_empty() {
        let s = "abc";
        assert_eq!(s.slices(1..9), ("", ""));
    }
}
