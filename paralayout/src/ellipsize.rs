// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shortening text to a width with an ellipsis.

use alloc::borrow::Cow;
use alloc::string::String;
use core::ops::Range;

use text_primitives::{TextDirectionHeuristic, TruncateAt};

use crate::text_line::ELLIPSIS;
use crate::{MeasuredParagraph, TextPaint};

/// Stands in for elided characters when the length of the text is preserved.
pub const ELLIPSIS_FILLER: char = '\u{FEFF}';

/// Returns `text` shortened with an ellipsis so that it fits into `avail` pixels.
///
/// Text that already fits is returned unchanged. Otherwise the range chosen by `at` is
/// dropped. With `preserve_length`, the dropped range is replaced by one ellipsis followed by
/// [`ELLIPSIS_FILLER`]s, keeping the number of chars. Without it, the ellipsis alone takes the
/// place of the dropped range, and nothing at all is returned if no character remains.
///
/// `callback` receives the dropped byte range, which is empty if nothing was dropped.
pub fn ellipsize<'t>(
    text: &'t str,
    paint: &TextPaint,
    avail: f32,
    at: TruncateAt,
    preserve_length: bool,
    callback: Option<&mut dyn FnMut(Range<usize>)>,
) -> Cow<'t, str> {
    let len = text.len();
    let mp = MeasuredParagraph::analyze_and_measure(
        paint,
        &text,
        0..len,
        TextDirectionHeuristic::FirstStrongLtr,
        None,
    );
    if mp.advance_range(0..len) <= avail {
        if let Some(callback) = callback {
            callback(0..0);
        }
        return Cow::Borrowed(text);
    }

    let dropped = elided_range(&mp, avail - paint.measure_text(ELLIPSIS), at);
    if let Some(callback) = callback {
        callback(dropped.clone());
    }
    if preserve_length {
        return Cow::Owned(fill_elided(text, dropped));
    }
    if dropped.len() == len {
        return Cow::Borrowed("");
    }
    let mut out = String::with_capacity(len - dropped.len() + ELLIPSIS.len());
    out.push_str(&text[..dropped.start]);
    out.push_str(ELLIPSIS);
    out.push_str(&text[dropped.end..]);
    Cow::Owned(out)
}

/// The range of a measured paragraph to drop so that the rest plus an ellipsis fits.
///
/// `avail` is the width left once the ellipsis is accounted for. If it is negative, the whole
/// text is dropped.
pub(crate) fn elided_range(mp: &MeasuredParagraph, avail: f32, at: TruncateAt) -> Range<usize> {
    let len = mp.text_len();
    let mut left = 0;
    let mut right = len;
    if avail >= 0.0 {
        match at {
            TruncateAt::Start => right = len - mp.break_text(len, false, avail),
            TruncateAt::End => left = mp.break_text(len, true, avail),
            TruncateAt::Middle => {
                right = len - mp.break_text(len, false, avail / 2.0);
                let avail = avail - mp.advance_range(right..len);
                left = mp.break_text(right, true, avail);
            }
        }
    }
    left..right
}

/// Replaces `dropped` with an ellipsis and fillers, one char for each char dropped.
///
/// The ellipsis is left out when nothing else would remain.
pub(crate) fn fill_elided(text: &str, dropped: Range<usize>) -> String {
    let removed = text[dropped.clone()].chars().count();
    let remaining = text.chars().count() - removed;
    let mut out = String::with_capacity(text.len() + 2 * removed);
    out.push_str(&text[..dropped.start]);
    let mut fillers = removed;
    if remaining > 0 && removed > 0 {
        out.push_str(ELLIPSIS);
        fillers -= 1;
    }
    out.extend(core::iter::repeat_n(ELLIPSIS_FILLER, fillers));
    out.push_str(&text[dropped.end..]);
    out
}
