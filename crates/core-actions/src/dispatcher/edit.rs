//! Text edit action handling (insert/backspace/delete-under).
//!
//! Each call here is one undo unit of its own except runs of plain
//! character insertion, which the history layer leaves uncoalesced;
//! `set_history_break` on mode exit is what turns a run of `InsertChar`
//! into a single undo step in practice (Vim's insert-run convention).

use super::DispatchResult;
use crate::EditKind;
use core_state::EditorState;

pub(crate) fn handle_edit(kind: EditKind, state: &mut EditorState) -> DispatchResult {
    match kind {
        EditKind::InsertChar(ch) => {
            state.insert_char(ch);
            DispatchResult::dirty()
        }
        EditKind::InsertNewline => {
            let before_lines = state.document().line_count();
            state.split_line_at_cursor();
            let after_lines = state.document().line_count();
            if after_lines > before_lines {
                DispatchResult::buffer_replaced()
            } else {
                DispatchResult::dirty()
            }
        }
        EditKind::Backspace => {
            let cursor = state.document().cursor;
            if cursor.cell == 0 {
                if cursor.line == 0 {
                    return DispatchResult::clean();
                }
                state.document_mut().cursor.line -= 1;
                if state.merge_current_with_next() {
                    DispatchResult::buffer_replaced()
                } else {
                    DispatchResult::clean()
                }
            } else if state.delete_char_before() {
                DispatchResult::dirty()
            } else {
                DispatchResult::clean()
            }
        }
        EditKind::ReplaceChar(ch) => {
            let cursor = state.document().cursor;
            let at_eol = state
                .document()
                .line(cursor.line)
                .is_none_or(|l| cursor.cell >= l.len());
            if at_eol {
                state.insert_char(ch);
            } else if state.replace_char(ch) {
                state.document_mut().cursor.cell += 1;
            } else {
                return DispatchResult::clean();
            }
            DispatchResult::dirty()
        }
        EditKind::DeleteUnder { count, register } => {
            let repeat = count.max(1);
            let mut removed = String::new();
            let mut any = false;
            for _ in 0..repeat {
                let cursor = state.document().cursor;
                let Some(line) = state.document().line(cursor.line) else { break };
                let Some(cell) = line.cell(cursor.cell) else { break };
                let ch = cell.ch().unwrap_or(' ');
                if !state.delete_char_at() {
                    break;
                }
                removed.push(ch);
                any = true;
            }
            if any {
                if !removed.is_empty() {
                    state.registers_facade().write_delete(removed, register);
                }
                DispatchResult::dirty()
            } else {
                DispatchResult::clean()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Document;

    fn state(text: &str) -> EditorState {
        EditorState::new(Document::from_text(text))
    }

    #[test]
    fn insert_char_advances_cursor() {
        let mut st = state("bc\n");
        st.document_mut().mode = core_state::Mode::Insert;
        let res = handle_edit(EditKind::InsertChar('a'), &mut st);
        assert!(res.dirty);
        assert_eq!(st.document().to_text(), "abc\n");
        assert_eq!(st.document().cursor.cell, 1);
    }

    #[test]
    fn backspace_at_column_zero_merges_lines() {
        let mut st = state("abc\ndef\n");
        st.document_mut().cursor = core_text::Position::new(1, 0);
        let res = handle_edit(EditKind::Backspace, &mut st);
        assert!(res.buffer_replaced);
        assert_eq!(st.document().to_text(), "abcdef\n");
    }

    #[test]
    fn delete_under_writes_register() {
        let mut st = state("abc\n");
        let res = handle_edit(
            EditKind::DeleteUnder {
                count: 2,
                register: None,
            },
            &mut st,
        );
        assert!(res.dirty);
        assert_eq!(st.document().to_text(), "c\n");
        assert_eq!(st.registers.unnamed, "ab");
    }

    #[test]
    fn delete_under_stops_at_end_of_line() {
        let mut st = state("ab\n");
        st.document_mut().cursor.cell = 1;
        let res = handle_edit(
            EditKind::DeleteUnder {
                count: 5,
                register: None,
            },
            &mut st,
        );
        assert!(res.dirty);
        assert_eq!(st.document().to_text(), "a\n");
    }
}
