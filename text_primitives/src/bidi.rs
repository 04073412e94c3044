// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// A resolved paragraph or run direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Left-to-right.
    #[default]
    Ltr,
    /// Right-to-left.
    Rtl,
}

impl Direction {
    /// Returns the direction implied by a bidi embedding level: even levels are
    /// left-to-right, odd levels right-to-left.
    pub const fn from_level(level: u8) -> Self {
        if level & 1 == 0 { Self::Ltr } else { Self::Rtl }
    }

    /// Returns `true` for [`Direction::Rtl`].
    pub const fn is_rtl(self) -> bool {
        matches!(self, Self::Rtl)
    }

    /// The paragraph embedding level for this direction.
    pub const fn level(self) -> u8 {
        match self {
            Self::Ltr => 0,
            Self::Rtl => 1,
        }
    }
}

/// Policy used to pick the base direction of a paragraph.
///
/// The first-strong heuristics implement steps P2 and P3 of UAX #9, with the
/// named fallback used when no strong character occurs outside an isolate.
/// See <https://www.unicode.org/reports/tr9/>.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TextDirectionHeuristic {
    /// Always left-to-right.
    Ltr,
    /// Always right-to-left.
    Rtl,
    /// First strong character decides, left-to-right if there is none.
    #[default]
    FirstStrongLtr,
    /// First strong character decides, right-to-left if there is none.
    FirstStrongRtl,
    /// Right-to-left if any strong right-to-left character is present, otherwise
    /// left-to-right.
    AnyRtlLtr,
    /// The direction of the user locale.
    ///
    /// No locale data is consulted by this family of crates, so this resolves
    /// to left-to-right.
    Locale,
}

impl TextDirectionHeuristic {
    /// Whether this heuristic resolves to left-to-right for text that contains no
    /// strong right-to-left characters.
    ///
    /// Layout uses this to skip bidi resolution for text that cannot be affected
    /// by it.
    pub const fn is_ltr_biased(self) -> bool {
        matches!(self, Self::Ltr | Self::FirstStrongLtr | Self::AnyRtlLtr)
    }

    /// The direction used when the text itself does not decide.
    pub const fn default_direction(self) -> Direction {
        match self {
            Self::Rtl | Self::FirstStrongRtl => Direction::Rtl,
            Self::Ltr | Self::FirstStrongLtr | Self::AnyRtlLtr | Self::Locale => Direction::Ltr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, TextDirectionHeuristic};

    #[test]
    fn level_parity() {
        assert_eq!(Direction::from_level(0), Direction::Ltr);
        assert_eq!(Direction::from_level(1), Direction::Rtl);
        assert_eq!(Direction::from_level(2), Direction::Ltr);
        assert_eq!(Direction::Rtl.level(), 1);
    }

    #[test]
    fn ltr_bias() {
        assert!(TextDirectionHeuristic::Ltr.is_ltr_biased());
        assert!(TextDirectionHeuristic::AnyRtlLtr.is_ltr_biased());
        assert!(!TextDirectionHeuristic::FirstStrongRtl.is_ltr_biased());
        assert!(!TextDirectionHeuristic::Locale.is_ltr_biased());
    }
}
