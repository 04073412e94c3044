// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paragraph direction heuristics and bidi level resolution.

use alloc::vec::Vec;

use text_primitives::{Direction, TextDirectionHeuristic};
use unicode_bidi::{BidiClass, BidiInfo, Level, bidi_class};

/// Returns `true` if `c` could cause text to need bidi analysis.
///
/// This is a cheap over-approximation: a `false` answer for every char of a text means the
/// text is safely laid out left to right.
pub fn could_affect_rtl(c: char) -> bool {
    matches!(
        c,
        '\u{0590}'..='\u{08FF}'
            | '\u{200E}'
            | '\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FB1D}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFE}'
    ) || u32::from(c) > 0xFFFF
}

/// Returns `true` if any char of `text` [could affect RTL layout](could_affect_rtl).
pub fn text_could_affect_rtl(text: &str) -> bool {
    text.chars().any(could_affect_rtl)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Strong {
    Ltr,
    Rtl,
    Unknown,
}

fn strong_direction(c: char) -> Strong {
    match bidi_class(c) {
        BidiClass::L => Strong::Ltr,
        BidiClass::R | BidiClass::AL => Strong::Rtl,
        _ => Strong::Unknown,
    }
}

/// Tracks nesting of the isolate controls U+2066..U+2069.
#[derive(Default)]
struct Isolates(usize);

impl Isolates {
    /// Consumes `c`, returning `true` if it sits outside any isolate and is not itself a control.
    fn visible(&mut self, c: char) -> bool {
        match c {
            '\u{2066}'..='\u{2068}' => {
                self.0 += 1;
                false
            }
            '\u{2069}' => {
                self.0 = self.0.saturating_sub(1);
                false
            }
            _ => self.0 == 0,
        }
    }
}

fn first_strong(text: &str) -> Strong {
    let mut isolates = Isolates::default();
    for c in text.chars() {
        if isolates.visible(c) {
            let strong = strong_direction(c);
            if strong != Strong::Unknown {
                return strong;
            }
        }
    }
    Strong::Unknown
}

fn any_rtl(text: &str) -> Strong {
    let mut isolates = Isolates::default();
    let mut seen_ltr = false;
    for c in text.chars() {
        if isolates.visible(c) {
            match strong_direction(c) {
                Strong::Rtl => return Strong::Rtl,
                Strong::Ltr => seen_ltr = true,
                Strong::Unknown => {}
            }
        }
    }
    if seen_ltr { Strong::Ltr } else { Strong::Unknown }
}

/// Decides the paragraph direction of `text` under `heuristic`.
pub fn resolve_direction(heuristic: TextDirectionHeuristic, text: &str) -> Direction {
    let strong = match heuristic {
        TextDirectionHeuristic::Ltr => Strong::Ltr,
        TextDirectionHeuristic::Rtl => Strong::Rtl,
        TextDirectionHeuristic::AnyRtlLtr => any_rtl(text),
        _ => first_strong(text),
    };
    match strong {
        Strong::Ltr => Direction::Ltr,
        Strong::Rtl => Direction::Rtl,
        Strong::Unknown => heuristic.default_direction(),
    }
}

/// Returns `true` if `text` must go through full bidi resolution under `heuristic`.
pub fn needs_bidi(heuristic: TextDirectionHeuristic, text: &str) -> bool {
    !heuristic.is_ltr_biased() || text_could_affect_rtl(text)
}

/// Resolves per-byte embedding levels for `text`.
///
/// `levels` is cleared. It stays empty when the text needs no bidi analysis, which means the
/// text is entirely left to right. Otherwise it holds one level per byte, with the whitespace
/// rules applied as if the whole text were a single line.
pub(crate) fn resolve_levels(
    heuristic: TextDirectionHeuristic,
    text: &str,
    levels: &mut Vec<u8>,
) -> Direction {
    levels.clear();
    if !needs_bidi(heuristic, text) {
        return Direction::Ltr;
    }
    let direction = resolve_direction(heuristic, text);
    let para_level = match direction {
        Direction::Ltr => Level::ltr(),
        Direction::Rtl => Level::rtl(),
    };
    let info = BidiInfo::new(text, Some(para_level));
    for para in &info.paragraphs {
        let resolved = info.reordered_levels(para, para.range.clone());
        levels.extend(resolved[para.range.clone()].iter().map(|level| level.number()));
    }
    levels.resize(text.len(), direction.level());
    direction
}
