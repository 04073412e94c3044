// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Weight requested for a run of text, from 1 to 1000.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight(u16);

impl FontWeight {
    /// The lightest weight there is.
    pub const MIN: Self = Self(1);

    /// Weight 400, used when nothing else is asked for.
    pub const NORMAL: Self = Self(400);

    /// Weight 700.
    pub const BOLD: Self = Self(700);

    /// The heaviest weight there is.
    pub const MAX: Self = Self(1000);

    /// Creates a weight, clamping it into `1..=1000`.
    pub fn new(weight: u16) -> Self {
        Self(weight.clamp(Self::MIN.0, Self::MAX.0))
    }

    /// Returns the numeric weight.
    pub fn value(self) -> u16 {
        self.0
    }

    /// Whether a face of `face` weight has to be emboldened to look like this weight.
    ///
    /// A face substitutes for a bold request only when it is itself bold.
    pub fn needs_synthetic_bold(self, face: Self) -> bool {
        self >= Self::BOLD && face < Self::BOLD
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Slant requested for a run of text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// Upright glyphs.
    #[default]
    Normal,
    /// Italic glyphs.
    Italic,
}

impl FontStyle {
    /// Horizontal skew applied when a face without italics has to stand in for an italic one.
    pub fn synthetic_skew(self) -> f32 {
        match self {
            Self::Normal => 0.0,
            Self::Italic => -0.25,
        }
    }
}
