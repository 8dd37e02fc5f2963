//! Motion sub-dispatch (cursor movement).
//!
//! Pure cursor movement: no buffer mutation, only the document's cursor
//! field and (for Visual-char mode) the persistent selection anchor.
//! Page motions also adjust the view's scroll offset directly, since a
//! half-page jump is defined in terms of the current viewport height.

use super::DispatchResult;
use crate::{with_cursor, MotionKind};
use core_model::View;
use core_state::{EditorState, Mode, SelectionKind, SelectionSpan};
use core_text::motion;

pub(crate) fn handle_motion(
    kind: MotionKind,
    count: u32,
    state: &mut EditorState,
    view: &mut View,
    sticky_visual_col: &mut Option<usize>,
) -> DispatchResult {
    let before = state.document().cursor;
    let count = count.max(1);

    match kind {
        MotionKind::Left => {
            repeat(state, count, motion::left);
            *sticky_visual_col = None;
        }
        MotionKind::Right => {
            repeat(state, count, motion::right);
            *sticky_visual_col = None;
        }
        MotionKind::LineStart => {
            with_cursor(state, |doc, pos| motion::line_start(doc, pos));
            *sticky_visual_col = None;
        }
        MotionKind::LineEnd => {
            with_cursor(state, |doc, pos| motion::line_end(doc, pos));
            *sticky_visual_col = None;
        }
        MotionKind::WordForward => {
            repeat(state, count, motion::word_forward);
            *sticky_visual_col = None;
        }
        MotionKind::WordBackward => {
            repeat(state, count, motion::word_backward);
            *sticky_visual_col = None;
        }
        MotionKind::Up => {
            for _ in 0..count {
                *sticky_visual_col =
                    with_cursor(state, |doc, pos| motion::up(doc, pos, *sticky_visual_col));
            }
        }
        MotionKind::Down => {
            for _ in 0..count {
                *sticky_visual_col =
                    with_cursor(state, |doc, pos| motion::down(doc, pos, *sticky_visual_col));
            }
        }
        MotionKind::PageHalfUp => page_half(state, view, sticky_visual_col, count, true),
        MotionKind::PageHalfDown => page_half(state, view, sticky_visual_col, count, false),
    }

    if !matches!(state.document().mode, Mode::Insert | Mode::Replace | Mode::ColInsert) {
        with_cursor(state, |doc, pos| motion::normalize_normal_mode_position(doc, pos));
    }

    if matches!(
        state.document().mode,
        Mode::CharSelection | Mode::LineSelection | Mode::ColSelection
    ) {
        expand_selection(state);
    }

    let text_height = state.last_text_height;
    view.auto_scroll(state, text_height);

    if state.document().cursor == before {
        DispatchResult::clean()
    } else {
        DispatchResult::dirty()
    }
}

fn repeat(
    state: &mut EditorState,
    count: u32,
    f: impl Fn(&core_text::Document, &mut core_text::Position),
) {
    for _ in 0..count {
        with_cursor(state, |doc, pos| f(doc, pos));
    }
}

fn page_half(
    state: &mut EditorState,
    view: &mut View,
    sticky_visual_col: &mut Option<usize>,
    count: u32,
    up: bool,
) {
    let height = state.last_text_height.max(1);
    let jump = ((height / 2).max(1)) * count as usize;
    for _ in 0..jump {
        *sticky_visual_col = with_cursor(state, |doc, pos| {
            if up {
                motion::up(doc, pos, *sticky_visual_col)
            } else {
                motion::down(doc, pos, *sticky_visual_col)
            }
        });
    }
    let total_lines = state.document().line_count();
    let max_first = total_lines.saturating_sub(height);
    if up {
        view.viewport_first_line = view.viewport_first_line.saturating_sub(jump);
    } else {
        view.viewport_first_line = (view.viewport_first_line + jump).min(max_first);
    }
}

/// Keep the persistent Visual-char selection anchored while the cursor
/// moves: the anchor is whatever was already there when selection mode
/// was entered, and the moving endpoint is always the live cursor.
fn expand_selection(state: &mut EditorState) {
    let anchor = state
        .selection()
        .map(|s| if s.start == state.document().cursor { s.end } else { s.start })
        .unwrap_or(state.document().cursor);
    let cursor = state.document().cursor;
    let kind = match state.document().mode {
        Mode::LineSelection => SelectionKind::Linewise,
        Mode::ColSelection => SelectionKind::Blockwise,
        _ => SelectionKind::Characterwise,
    };
    state.selection_mut().set(SelectionSpan::anchored(anchor, cursor, kind));
}
