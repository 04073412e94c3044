// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use paralayout::{FontMetrics, RunMetrics, TextPaint, TextShaper};

/// A shaper that gives every visible character the width of the font size.
///
/// At size 10 the font has a top of -10, an ascent of -8, a descent of 2 and a bottom of 3.
/// Other sizes scale these linearly. Line breaks, byte order marks and bidi controls have no
/// width.
///
/// Characters from the CJK blocks onwards can be made to reach beyond the font's ascent and
/// descent, like glyphs taken from a taller fallback font.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonospaceShaper {
    tall_extent: i32,
}

impl MonospaceShaper {
    /// A shaper without tall characters.
    pub const fn new() -> Self {
        Self { tall_extent: 0 }
    }

    /// A shaper whose CJK characters extend `extent` pixels above the ascent and below the
    /// descent at size 10.
    pub const fn with_tall_glyphs(extent: i32) -> Self {
        Self {
            tall_extent: extent,
        }
    }

    fn is_tall(c: char) -> bool {
        c >= '\u{2E80}'
    }
}

fn is_zero_width(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\u{FEFF}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2066}'..='\u{2069}'
    )
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "metrics of any sensible font size fit in i32"
)]
fn scale(paint: &TextPaint, value: i32) -> i32 {
    (value as f32 * paint.size / 10.0).round() as i32
}

impl TextShaper for MonospaceShaper {
    fn font_metrics(&self, paint: &TextPaint) -> FontMetrics {
        FontMetrics {
            top: scale(paint, -10),
            ascent: scale(paint, -8),
            descent: scale(paint, 2),
            bottom: scale(paint, 3),
            leading: 0,
        }
    }

    fn measure(
        &self,
        text: &str,
        _rtl: bool,
        paint: &TextPaint,
        advances: &mut [f32],
    ) -> RunMetrics {
        advances.fill(0.0);
        let mut advance = 0.0;
        let mut tall = false;
        for (i, c) in text.char_indices() {
            if is_zero_width(c) {
                continue;
            }
            advances[i] = paint.size;
            advance += paint.size;
            tall |= Self::is_tall(c);
        }
        let extra = if tall { self.tall_extent } else { 0 };
        RunMetrics {
            advance,
            ascent: scale(paint, -8 - extra),
            descent: scale(paint, 2 + extra),
        }
    }
}
