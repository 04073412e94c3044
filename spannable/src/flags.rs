// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::{BitOr, BitOrAssign};

pub(crate) const MARK: u32 = 1;
pub(crate) const POINT: u32 = 2;
pub(crate) const PARAGRAPH: u32 = 3;

pub(crate) const START_MASK: u32 = 0xF0;
pub(crate) const END_MASK: u32 = 0x0F;
pub(crate) const START_SHIFT: u32 = 4;

// Transient bookkeeping bits, live only during a single replacement.
pub(crate) const SPAN_ADDED: u32 = 0x800;
pub(crate) const SPAN_START_AT_START: u32 = 0x1000;
pub(crate) const SPAN_START_AT_END: u32 = 0x2000;
pub(crate) const SPAN_END_AT_START: u32 = 0x4000;
pub(crate) const SPAN_END_AT_END: u32 = 0x8000;
pub(crate) const SPAN_START_END_MASK: u32 = 0xF000;
const INTERNAL_MASK: u32 = SPAN_ADDED | SPAN_START_END_MASK;

/// Behaviour of a span's endpoints under editing, plus its priority.
///
/// The low byte describes each endpoint as a *mark* (text inserted at the endpoint goes after
/// it, so the endpoint stays put), a *point* (the endpoint moves past the inserted text) or a
/// *paragraph* boundary (the endpoint must follow a `'\n'` or sit at either edge of the text).
/// The start kind lives in bits 4..8 and the end kind in bits 0..4.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SpanFlags(u32);

impl SpanFlags {
    /// Start and end are both marks: insertion at the start expands the span, at the end does not.
    pub const MARK_MARK: Self = Self(0x11);
    /// Start is a mark, end is a point: insertion at either end expands the span.
    pub const MARK_POINT: Self = Self(0x12);
    /// Start is a point, end is a mark: insertion at either end stays outside the span.
    pub const POINT_MARK: Self = Self(0x21);
    /// Start and end are both points: insertion at the end expands the span, at the start does not.
    pub const POINT_POINT: Self = Self(0x22);
    /// Both endpoints must be paragraph boundaries.
    pub const PARAGRAPH: Self = Self(0x33);

    /// Alias of [`MARK_MARK`](Self::MARK_MARK).
    pub const INCLUSIVE_EXCLUSIVE: Self = Self::MARK_MARK;
    /// Alias of [`MARK_POINT`](Self::MARK_POINT).
    pub const INCLUSIVE_INCLUSIVE: Self = Self::MARK_POINT;
    /// Alias of [`POINT_MARK`](Self::POINT_MARK).
    pub const EXCLUSIVE_EXCLUSIVE: Self = Self::POINT_MARK;
    /// Alias of [`POINT_POINT`](Self::POINT_POINT).
    pub const EXCLUSIVE_INCLUSIVE: Self = Self::POINT_POINT;

    /// Marks a span as part of an in-progress input method composition.
    pub const COMPOSING: Self = Self(0x100);
    /// Suppresses watcher notifications for this change; a later change will follow.
    pub const INTERMEDIATE: Self = Self(0x200);

    /// Bit offset of the priority byte.
    pub const PRIORITY_SHIFT: u32 = 16;
    /// Mask of the priority byte. Higher priorities are returned first by span queries.
    pub const PRIORITY: Self = Self(0xFF << Self::PRIORITY_SHIFT);

    /// No flags.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates flags from raw bits, dropping any reserved bookkeeping bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & !INTERNAL_MASK)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns these flags with the priority byte replaced.
    #[must_use]
    pub const fn with_priority(self, priority: u8) -> Self {
        Self((self.0 & !Self::PRIORITY.0) | ((priority as u32) << Self::PRIORITY_SHIFT))
    }

    /// Returns the priority byte.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "The value is masked to a single byte before the cast."
    )]
    pub const fn priority(self) -> u8 {
        ((self.0 & Self::PRIORITY.0) >> Self::PRIORITY_SHIFT) as u8
    }
}

impl BitOr for SpanFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SpanFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::{SPAN_ADDED, SpanFlags};

    #[test]
    fn priority_round_trips_without_touching_kind() {
        let flags = SpanFlags::POINT_MARK.with_priority(7);
        assert_eq!(flags.priority(), 7);
        assert!(flags.contains(SpanFlags::POINT_MARK));
        assert_eq!(flags.with_priority(0), SpanFlags::POINT_MARK);
    }

    #[test]
    fn bookkeeping_bits_are_not_public() {
        let flags = SpanFlags::from_bits(SpanFlags::MARK_POINT.bits() | SPAN_ADDED);
        assert_eq!(flags, SpanFlags::MARK_POINT);
    }

    #[test]
    fn paragraph_contains_exclusive_pattern() {
        // Both removal-eligible kinds share the bits of `POINT_MARK`.
        assert!(SpanFlags::PARAGRAPH.contains(SpanFlags::EXCLUSIVE_EXCLUSIVE));
        assert!(!SpanFlags::POINT_POINT.contains(SpanFlags::EXCLUSIVE_EXCLUSIVE));
    }
}
