//! Dispatcher applying `Action` to mutable editor state.
//!
//! Decomposed into focused sub-modules:
//! * `motion`  - cursor movement semantics
//! * `mode`    - mode transitions (Normal <-> Insert <-> Visual-char)
//! * `command` - command line editing & execution (:q, :e, :w, :metrics)
//! * `edit`    - text mutation (insert/delete/backspace/newline)
//! * `undo`    - undo / redo dispatch
//!
//! The public surface (`dispatch`, `DispatchResult`) is what every other
//! crate (mainly `vedit-bin`'s run loop) depends on.

use crate::{Action, ActionObserver, EditKind, ModeChange, MotionKind, OperatorKind, SearchDirection};
use core_model::EditorModel;
use core_state::{EditorState, Mode, PasteSource, SelectionKind, SelectionSpan};
use core_text::{Document, Position};

mod command;
mod command_parser;
mod edit;
mod mode;
mod motion;
mod search;
mod undo;

/// Result of dispatching a single `Action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    pub dirty: bool,
    pub quit: bool,
    /// A structural buffer replacement occurred (`:e` loaded a new file, a
    /// line-count-changing edit ran). The render layer must escalate to a
    /// full render instead of a partial one regardless of the ordinary
    /// dirty heuristic.
    pub buffer_replaced: bool,
}

impl DispatchResult {
    pub fn dirty() -> Self {
        Self {
            dirty: true,
            quit: false,
            buffer_replaced: false,
        }
    }
    pub fn clean() -> Self {
        Self {
            dirty: false,
            quit: false,
            buffer_replaced: false,
        }
    }
    pub fn quit() -> Self {
        Self {
            dirty: true,
            quit: true,
            buffer_replaced: false,
        }
    }
    pub fn buffer_replaced() -> Self {
        Self {
            dirty: true,
            quit: false,
            buffer_replaced: true,
        }
    }
}

/// Stable identifier handed to `ActionObserver`s, independent of the
/// dispatcher's own control flow.
pub(crate) fn action_id(action: &Action) -> core_keymap::ActionId {
    use core_keymap::ActionId;
    let s = match action {
        Action::Motion(_) | Action::MotionWithCount { .. } => "motion",
        Action::ModeChange(ModeChange::EnterInsert) => "enter_insert",
        Action::ModeChange(ModeChange::LeaveInsert) => "leave_insert",
        Action::ModeChange(ModeChange::EnterVisualChar) => "enter_visual_char",
        Action::ModeChange(ModeChange::LeaveVisualChar) => "leave_visual_char",
        Action::ModeChange(ModeChange::EnterLineSelection) => "enter_visual_line",
        Action::ModeChange(ModeChange::LeaveLineSelection) => "escape_to_normal",
        Action::ModeChange(ModeChange::EnterColSelection) => "enter_visual_block",
        Action::ModeChange(ModeChange::LeaveColSelection) => "escape_to_normal",
        Action::ModeChange(ModeChange::EnterReplace) => "enter_replace",
        Action::ModeChange(ModeChange::LeaveReplace) => "escape_to_normal",
        Action::ModeChange(ModeChange::EnterColInsert) => "enter_col_insert",
        Action::ModeChange(ModeChange::LeaveColInsert) => "exit_col_insert",
        Action::SearchStart(SearchDirection::Forward) => "enter_search_forward",
        Action::SearchStart(SearchDirection::Backward) => "enter_search_backward",
        Action::SearchExecute(_) => "search_execute",
        Action::CommandStart => "enter_command",
        Action::CommandChar(_) => "command_char",
        Action::CommandBackspace => "command_backspace",
        Action::CommandCancel => "command_cancel",
        Action::CommandExecute(_) => "command_execute",
        Action::Edit(EditKind::InsertChar(_)) => "insert_char",
        Action::Edit(EditKind::InsertNewline) => "insert_newline",
        Action::Edit(EditKind::Backspace) => "backspace",
        Action::Edit(EditKind::DeleteUnder { .. }) => "delete_under",
        Action::Edit(EditKind::ReplaceChar(_)) => "replace_char",
        Action::Undo => "undo",
        Action::Redo => "redo",
        Action::PasteAfter { .. } => "paste_after",
        Action::PasteBefore { .. } => "paste_before",
        Action::ApplyOperator { op, .. } | Action::LinewiseOperator { op, .. } => match op {
            OperatorKind::Delete => "operator_delete",
            OperatorKind::Yank => "operator_yank",
            OperatorKind::Change => "operator_change",
        },
        Action::VisualOperator { op, .. } => match op {
            OperatorKind::Delete => "visual_delete",
            OperatorKind::Yank => "visual_yank",
            OperatorKind::Change => "visual_change",
        },
        Action::Quit => "quit",
    };
    ActionId(s)
}

/// Apply an action to editor state. Returns `DispatchResult` describing whether
/// a render is needed (`dirty`) or the editor should exit (`quit`).
pub fn dispatch(
    action: Action,
    model: &mut EditorModel,
    sticky_visual_col: &mut Option<usize>,
    observers: &[Box<dyn ActionObserver>],
) -> DispatchResult {
    let id = action_id(&action);

    // Safe split borrow (encapsulated unsafety lives in `EditorModel::split_state_and_active_view`).
    let (state, view) = model.split_state_and_active_view();

    let result = match action {
        Action::Motion(kind) => motion::handle_motion(kind, 1, state, view, sticky_visual_col),
        Action::MotionWithCount {
            motion: kind,
            count,
        } => motion::handle_motion(kind, count, state, view, sticky_visual_col),
        Action::ModeChange(mc) => mode::handle_mode_change(mc, state),
        Action::CommandStart
        | Action::CommandChar(_)
        | Action::CommandBackspace
        | Action::CommandCancel
        | Action::CommandExecute(_) => command::handle_command_action(action, state),
        Action::Edit(kind) => {
            let in_col_insert = state.document().mode == Mode::ColInsert;
            let tracked = kind.clone();
            let r = edit::handle_edit(kind, state);
            if in_col_insert {
                track_col_insert_typed(&tracked, state);
            }
            r
        }
        Action::Undo => undo::handle_undo(state),
        Action::Redo => undo::handle_redo(state),
        Action::PasteAfter { register } => paste(state, register, false),
        Action::PasteBefore { register } => paste(state, register, true),
        Action::Quit => DispatchResult::quit(),
        Action::ApplyOperator {
            op,
            motion,
            count,
            register,
        } => apply_operator(state, op, motion, count, register),
        Action::LinewiseOperator { op, count, register } => {
            linewise_operator(state, op, count, register)
        }
        Action::VisualOperator { op, register } => visual_operator(state, op, register),
        Action::SearchStart(dir) => search::handle_search_start(dir, state),
        Action::SearchExecute(raw) => search::handle_search_execute(&raw, state),
    };

    if result.buffer_replaced {
        crate::syntax_support::recalc_full(state);
    } else if result.dirty {
        crate::syntax_support::recalc_from_cursor(state);
    }

    for obs in observers {
        obs.on_action(id, model);
    }
    result
}

/// Mirror what the anchor line of a `COL_INSERT` block just received, so
/// `ModeChange::LeaveColInsert` can replay the same text onto the rest of
/// the block (spec.md §8 scenario 6).
fn track_col_insert_typed(kind: &EditKind, state: &mut EditorState) {
    let Some(ci) = state.col_insert.as_mut() else { return };
    match kind {
        EditKind::InsertChar(ch) => ci.typed.push(*ch),
        EditKind::Backspace => {
            ci.typed.pop();
        }
        _ => {}
    }
}

fn register_source(register: Option<char>) -> PasteSource {
    register
        .and_then(|c| {
            if c.is_ascii_alphabetic() {
                Some(PasteSource::Named(c))
            } else if c.is_ascii_digit() {
                Some(PasteSource::Numbered((c as u8 - b'0') as usize))
            } else {
                None
            }
        })
        .unwrap_or(PasteSource::Unnamed)
}

fn paste(state: &mut EditorState, register: Option<char>, before: bool) -> DispatchResult {
    match state.paste(register_source(register), before) {
        Ok(true) => DispatchResult::buffer_replaced(),
        Ok(false) => DispatchResult::dirty(),
        Err(_) => DispatchResult::clean(),
    }
}

/// Trim the trailing whitespace `cw`/`c2w` leave behind so the typed
/// replacement lands where Vim's `cw` puts it (word boundary, not the
/// next word's start).
fn adjust_change_end(doc: &Document, motion: MotionKind, span: SelectionSpan) -> SelectionSpan {
    if !matches!(motion, MotionKind::WordForward) || span.start.line != span.end.line {
        return span;
    }
    let Some(line) = doc.line(span.start.line) else {
        return span;
    };
    let cells = line.cells();
    let lo = span.start.cell.min(cells.len());
    let hi = (span.end.cell + 1).min(cells.len());
    if hi <= lo {
        return span;
    }
    let all_ws = cells[lo..hi]
        .iter()
        .all(|c| c.ch().map(|ch| ch.is_whitespace()).unwrap_or(false));
    if all_ws {
        return span;
    }
    let mut new_hi = hi;
    while new_hi > lo && cells[new_hi - 1].ch().is_some_and(|ch| ch.is_whitespace()) {
        new_hi -= 1;
    }
    if new_hi == hi {
        return span;
    }
    SelectionSpan::new(span.start, Position::new(span.start.line, new_hi - 1), span.kind)
}

fn span_text(doc: &Document, span: SelectionSpan) -> String {
    let lines = span.collect_cells(doc);
    let joined = lines
        .iter()
        .map(|l| l.to_string_lossy())
        .collect::<Vec<_>>()
        .join("\n");
    if matches!(span.kind, SelectionKind::Linewise) {
        format!("{}\n", joined)
    } else {
        joined
    }
}

fn apply_operator(
    state: &mut EditorState,
    op: OperatorKind,
    motion: MotionKind,
    count: u32,
    register: Option<char>,
) -> DispatchResult {
    let start_pos = state.document().cursor;
    let span = crate::span_resolver::resolve_selection(state.document(), start_pos, motion, count);
    if span.is_empty() {
        return DispatchResult::clean();
    }
    match op {
        OperatorKind::Delete => {
            let (removed, structural) = state.delete_span(span);
            state.registers_facade().write_delete(removed, register);
            if structural {
                DispatchResult::buffer_replaced()
            } else {
                DispatchResult::dirty()
            }
        }
        OperatorKind::Yank => {
            let text = span_text(state.document(), span);
            state.registers_facade().write_yank(text, register);
            state.document_mut().cursor = span.start;
            DispatchResult::dirty()
        }
        OperatorKind::Change => {
            let span = adjust_change_end(state.document(), motion, span);
            if span.is_empty() {
                return DispatchResult::clean();
            }
            let (removed, structural) = state.delete_span(span);
            state.registers_facade().write_change(removed, register);
            state.document_mut().mode = Mode::Insert;
            if structural {
                DispatchResult::buffer_replaced()
            } else {
                DispatchResult::dirty()
            }
        }
    }
}

fn linewise_operator(
    state: &mut EditorState,
    op: OperatorKind,
    count: u32,
    register: Option<char>,
) -> DispatchResult {
    let cursor = state.document().cursor;
    let last_line = state.document().line_count().saturating_sub(1);
    let end_line = (cursor.line + count.max(1) as usize - 1).min(last_line);
    let span = SelectionSpan::new(
        cursor,
        Position::new(end_line, 0),
        SelectionKind::Linewise,
    );
    match op {
        OperatorKind::Delete => {
            let (removed, _) = state.delete_span(span);
            state.registers_facade().write_delete(removed, register);
            DispatchResult::buffer_replaced()
        }
        OperatorKind::Yank => {
            let text = span_text(state.document(), span);
            state.registers_facade().write_yank(text, register);
            DispatchResult::dirty()
        }
        OperatorKind::Change => {
            let (removed, _) = state.delete_span(span);
            state.registers_facade().write_change(removed, register);
            let cursor = state.document().cursor;
            let _ = state.document_mut().add_line(cursor.line, core_text::Line::new());
            state.document_mut().cursor = Position::new(cursor.line, 0);
            state.document_mut().mode = Mode::Insert;
            DispatchResult::buffer_replaced()
        }
    }
}

fn visual_operator(state: &mut EditorState, op: OperatorKind, register: Option<char>) -> DispatchResult {
    if !matches!(
        state.document().mode,
        Mode::CharSelection | Mode::LineSelection | Mode::ColSelection
    ) {
        return DispatchResult::clean();
    }
    let Some(span) = state.selection() else {
        return DispatchResult::clean();
    };
    if span.is_empty() {
        return DispatchResult::clean();
    }
    match op {
        OperatorKind::Delete => {
            let (removed, structural) = state.delete_span(span);
            state.registers_facade().write_delete(removed, register);
            state.clear_selection();
            state.document_mut().mode = Mode::Normal;
            if structural {
                DispatchResult::buffer_replaced()
            } else {
                DispatchResult::dirty()
            }
        }
        OperatorKind::Yank => {
            let text = span_text(state.document(), span);
            state.registers_facade().write_yank(text, register);
            state.document_mut().cursor = span.start;
            state.clear_selection();
            state.document_mut().mode = Mode::Normal;
            DispatchResult::dirty()
        }
        OperatorKind::Change => {
            let (removed, structural) = state.delete_span(span);
            state.registers_facade().write_change(removed, register);
            state.clear_selection();
            state.document_mut().mode = Mode::Insert;
            if structural {
                DispatchResult::buffer_replaced()
            } else {
                DispatchResult::dirty()
            }
        }
    }
}
