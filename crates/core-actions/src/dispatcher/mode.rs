//! Mode transition handling (Normal <-> Insert <-> Visual-char <-> ...).

use super::DispatchResult;
use crate::ModeChange;
use core_state::{ColInsertState, EditorState, Mode, SelectionKind, SelectionSpan};

fn enter_selection(state: &mut EditorState, mode: Mode, kind: SelectionKind) -> DispatchResult {
    let pos = state.document().cursor;
    let span = SelectionSpan::new(pos, pos, kind);
    state.selection_mut().set(span);
    state.selection_mut().anchor = Some(pos);
    state.document_mut().mode = mode;
    DispatchResult::dirty()
}

fn leave_selection(state: &mut EditorState) -> DispatchResult {
    state.clear_selection();
    state.document_mut().mode = Mode::Normal;
    DispatchResult::dirty()
}

pub(crate) fn handle_mode_change(mc: ModeChange, state: &mut EditorState) -> DispatchResult {
    match mc {
        ModeChange::EnterInsert => {
            state.document_mut().mode = Mode::Insert;
            DispatchResult::dirty()
        }
        ModeChange::LeaveInsert => {
            let cursor = state.document().cursor;
            if cursor.cell > 0 {
                state.document_mut().cursor.cell -= 1;
            }
            state.document_mut().mode = Mode::Normal;
            state.set_history_break();
            DispatchResult::dirty()
        }
        ModeChange::EnterVisualChar => enter_selection(state, Mode::CharSelection, SelectionKind::Characterwise),
        ModeChange::LeaveVisualChar => leave_selection(state),
        ModeChange::EnterLineSelection => enter_selection(state, Mode::LineSelection, SelectionKind::Linewise),
        ModeChange::LeaveLineSelection => leave_selection(state),
        ModeChange::EnterColSelection => enter_selection(state, Mode::ColSelection, SelectionKind::Blockwise),
        ModeChange::LeaveColSelection => leave_selection(state),
        ModeChange::EnterReplace => {
            state.document_mut().mode = Mode::Replace;
            DispatchResult::dirty()
        }
        ModeChange::LeaveReplace => {
            let cursor = state.document().cursor;
            if cursor.cell > 0 {
                state.document_mut().cursor.cell -= 1;
            }
            state.document_mut().mode = Mode::Normal;
            state.set_history_break();
            DispatchResult::dirty()
        }
        ModeChange::EnterColInsert => {
            let Some(span) = state.selection() else {
                return DispatchResult::clean();
            };
            let first_line = span.start.line.min(span.end.line);
            let last_line = span.start.line.max(span.end.line);
            let col = span.start.cell.min(span.end.cell);
            state.clear_selection();
            state.col_insert = Some(ColInsertState {
                first_line,
                last_line,
                col,
                typed: String::new(),
            });
            state.document_mut().cursor = core_text::Position::new(first_line, col);
            state.document_mut().mode = Mode::ColInsert;
            DispatchResult::dirty()
        }
        ModeChange::LeaveColInsert => {
            let cursor = state.document().cursor;
            if cursor.cell > 0 {
                state.document_mut().cursor.cell -= 1;
            }
            state.document_mut().mode = Mode::Normal;
            state.set_history_break();
            let Some(ci) = state.col_insert.take() else {
                return DispatchResult::dirty();
            };
            if ci.typed.is_empty() {
                return DispatchResult::dirty();
            }
            for line_no in ci.first_line..=ci.last_line {
                if line_no == ci.first_line {
                    continue;
                }
                let Some(line) = state.document_mut().line_mut(line_no) else { continue };
                let at = ci.col.min(line.len());
                for (i, ch) in ci.typed.chars().enumerate() {
                    let _ = line.insert(at + i, ch);
                }
            }
            DispatchResult::buffer_replaced()
        }
    }
}
