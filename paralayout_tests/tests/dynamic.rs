// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental reflow of edited text.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use paralayout::spannable::{SpanFlags, TextStorage};
use paralayout::{
    BLOCK_MINIMUM_CHARACTER_LENGTH, DynamicLayout, INVALID_BLOCK_INDEX, Layout, TextSpan,
};
use paralayout_dev::{InlineBox, SizeSpan, TextSamples, Underline};

use crate::util::{Text, assert_matches_static, paint, span};

/// One step of an edit script.
enum Edit {
    Insert(usize, &'static str),
    Delete(Range<usize>),
    Replace(Range<usize>, &'static str),
    SetSpan(Rc<dyn TextSpan>, Range<usize>),
    RemoveSpan(Rc<dyn TextSpan>),
}

fn apply(text: &mut Text, edit: &Edit) {
    match edit {
        Edit::Insert(at, s) => {
            text.insert(*at, s).unwrap();
        }
        Edit::Delete(range) => {
            text.delete(range.clone()).unwrap();
        }
        Edit::Replace(range, s) => {
            text.replace_str(range.clone(), s).unwrap();
        }
        Edit::SetSpan(span, range) => {
            text.set_span(span.clone(), range.clone(), SpanFlags::EXCLUSIVE_EXCLUSIVE)
                .unwrap();
        }
        Edit::RemoveSpan(span) => text.remove_span(&**span),
    }
}

/// Runs `script` on `initial` with an attached layout, checking it after every step.
fn check_script(initial: &str, width: i32, spacing_add: f32, script: &[Edit]) {
    let p = paint();
    let mut text = Text::from_text(initial);
    let layout = Rc::new(RefCell::new(
        DynamicLayout::builder(&text, &p, width)
            .line_spacing(spacing_add, 1.0)
            .build(),
    ));
    DynamicLayout::attach(&layout, &mut text);
    assert_matches_static(&layout.borrow(), &text, &p, width, spacing_add, "initial text");
    for (step, edit) in script.iter().enumerate() {
        apply(&mut text, edit);
        let case = format!("step {step} giving {:?}", text.to_string());
        assert_matches_static(&layout.borrow(), &text, &p, width, spacing_add, &case);
    }
}

#[test]
fn dynamic_typing_matches_static_layout() {
    let mut at = 0;
    let script: Vec<Edit> = ["Hello", " ", "world", ",", " this", " wraps", "\n", "and", " on"]
        .into_iter()
        .map(|piece| {
            let edit = Edit::Insert(at, piece);
            at += piece.len();
            edit
        })
        .collect();
    check_script("", 60, 0.0, &script);
}

#[test]
fn dynamic_paragraph_edits_match_static_layout() {
    let script = [
        Edit::Insert(0, "first\n"),
        Edit::Delete(6..12),
        Edit::Replace(0..5, "one two three"),
        Edit::Insert(14, "\n\n"),
        Edit::Delete(13..15),
        Edit::Replace(3..8, "\u{e9}\u{e8}\n\u{ea}"),
        Edit::Delete(0..3),
    ];
    check_script("alpha beta\ngamma delta\nepsilon", 55, 0.0, &script);
}

#[test]
fn dynamic_samples_match_static_layout() {
    let samples = TextSamples::new();
    let latin = samples.latin.text;
    let second = latin.find('\n').unwrap() + 1;
    let script = [
        Edit::Insert(second, "Inserted words at a paragraph start. "),
        Edit::Delete(0..second),
        Edit::Insert(0, samples.mixed.text),
        Edit::Insert(0, "\n"),
        Edit::Replace(10..20, ""),
    ];
    check_script(latin, 150, 0.0, &script);
}

#[test]
fn dynamic_span_changes_match_static_layout() {
    let big = span(SizeSpan(2.0));
    let inline = span(InlineBox {
        width: 25.0,
        ascent: -14,
        descent: 5,
        color: 0xFF00_FF00,
    });
    let underline = span(Underline);
    let script = [
        Edit::SetSpan(big.clone(), 0..5),
        Edit::SetSpan(inline.clone(), 12..13),
        Edit::SetSpan(big.clone(), 14..20),
        Edit::Insert(2, "xx"),
        Edit::SetSpan(underline.clone(), 0..8),
        Edit::RemoveSpan(inline),
        Edit::Delete(0..4),
        Edit::RemoveSpan(big),
        Edit::RemoveSpan(underline),
    ];
    check_script("aaaa bbbb\ncccc dddd\neeee", 85, 0.0, &script);
}

#[test]
fn dynamic_line_spacing_matches_static_layout() {
    let script = [
        Edit::Insert(3, " more words"),
        Edit::Insert(0, "\n"),
        Edit::Delete(0..1),
        Edit::Replace(0..2, "x\ny\nz"),
    ];
    check_script("aa bb cc\ndd ee", 55, 3.0, &script);
}

#[test]
fn dynamic_edit_touches_only_its_paragraph() {
    let p = paint();
    let mut text = Text::from_text("line one\nline two");
    let layout = Rc::new(RefCell::new(DynamicLayout::builder(&text, &p, 200).build()));
    DynamicLayout::attach(&layout, &mut text);
    let before = layout.borrow().lines().to_vec();
    assert_eq!(layout.borrow().line_count(), 2);
    assert_eq!(before[1].start, 9);

    text.insert(4, "X").unwrap();
    let layout = layout.borrow();
    let after = layout.lines();
    assert_eq!(after.len(), before.len());
    assert_eq!(after[1].start, before[1].start + 1, "paragraph 1 shifts by one");
    assert_eq!(after[1].top, before[1].top);
    assert_eq!(after[1].descent, before[1].descent);
    assert_eq!(after[1].directions, before[1].directions);
    assert_eq!(after[2].start, text.len());
}

#[test]
fn dynamic_blocks_keep_untouched_indices() {
    let p = paint();
    let mut source = "x".repeat(BLOCK_MINIMUM_CHARACTER_LENGTH);
    source.push_str(" one\nline two");
    let mut text = Text::from_text(&source);
    let layout = Rc::new(RefCell::new(
        DynamicLayout::builder(&text, &p, 100_000).build(),
    ));
    DynamicLayout::attach(&layout, &mut text);
    {
        let mut layout = layout.borrow_mut();
        assert_eq!(layout.number_of_blocks(), 2);
        assert_eq!(layout.block_end_lines(), &[0, 1]);
        layout.set_block_index(0, 1);
        layout.set_block_index(1, 2);
        layout.set_index_first_changed_block(2);
    }

    text.insert(4, "X").unwrap();
    {
        let layout = layout.borrow();
        assert_eq!(layout.block_end_lines(), &[0, 1]);
        assert_eq!(layout.block_indices()[0], INVALID_BLOCK_INDEX, "edited block");
        assert_eq!(layout.block_indices()[1], 2, "paragraph 1 keeps its cached block");
        assert_eq!(layout.index_first_changed_block(), 2, "no line moved");
    }

    // A new paragraph moves the lines of every block after it.
    text.insert(2, "\n").unwrap();
    let layout = layout.borrow();
    assert_eq!(layout.line_count(), 3);
    assert_eq!(layout.block_end_lines().last(), Some(&2));
    assert_eq!(layout.block_indices().last(), Some(&2));
    assert!(layout.index_first_changed_block() < layout.number_of_blocks());
}

#[test]
fn dynamic_blocks_split_multibyte_paragraphs() {
    let p = paint();
    let euros = "€".repeat(200);
    let source = format!("{euros}\n{euros}\ntail");
    assert!(!source.is_char_boundary(BLOCK_MINIMUM_CHARACTER_LENGTH));
    let text = Text::from_text(&source);
    let layout = DynamicLayout::builder(&text, &p, 100_000).build();
    assert_eq!(layout.line_count(), 3);
    assert_eq!(layout.block_end_lines(), &[0, 1, 2]);
}

#[test]
fn dynamic_blocks_with_inline_objects_are_always_redrawn() {
    let p = paint();
    let mut source = "x".repeat(BLOCK_MINIMUM_CHARACTER_LENGTH);
    source.push_str("\nimage");
    let mut text = Text::from_text(&source);
    let layout = Rc::new(RefCell::new(
        DynamicLayout::builder(&text, &p, 100_000).build(),
    ));
    DynamicLayout::attach(&layout, &mut text);
    assert!(layout.borrow().blocks_always_need_to_be_redrawn().is_empty());

    let start = BLOCK_MINIMUM_CHARACTER_LENGTH + 1;
    let inline = span(InlineBox {
        width: 10.0,
        ascent: -30,
        descent: 10,
        color: 0xFF00_0000,
    });
    text.set_span(inline, start..start + 5, SpanFlags::EXCLUSIVE_EXCLUSIVE)
        .unwrap();
    let layout = layout.borrow();
    let last = layout.number_of_blocks() - 1;
    assert!(layout.blocks_always_need_to_be_redrawn().contains(&last));
    assert!(!layout.blocks_always_need_to_be_redrawn().contains(&0));
}

#[test]
fn dynamic_dropped_layout_stops_listening() {
    let mut text = Text::from_text("ab");
    let layout = Rc::new(RefCell::new(DynamicLayout::builder(&text, &paint(), 100).build()));
    DynamicLayout::attach(&layout, &mut text);
    drop(layout);
    text.append("\ncd").unwrap();
    assert_eq!(text.to_string(), "ab\ncd");
}

#[test]
fn dynamic_explicit_reflow_without_attaching() {
    let p = paint();
    let mut text = Text::from_text("aa bb");
    let mut layout = DynamicLayout::builder(&text, &p, 55).build();
    text.insert(5, " cc dd").unwrap();
    layout.reflow(&text, 5, 0, 6).unwrap();
    assert_matches_static(&layout, &text, &p, 55, 0.0, "after reflow");
    assert_eq!(layout.line_count(), 2);
    assert!(layout.reflow(&text, 10, 0, 10).is_err(), "past the end");
}
