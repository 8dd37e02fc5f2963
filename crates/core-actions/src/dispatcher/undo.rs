//! Undo / Redo handling extraction.
//!
//! Delegates to the reversible edit log owned by `core_state::History`;
//! this module only has to translate the resulting `ChangeCounts` into
//! the render-path hint the rest of the dispatcher speaks.

use super::DispatchResult;
use core_state::EditorState;

pub(crate) fn handle_undo(state: &mut EditorState) -> DispatchResult {
    match state.undo() {
        Some(counts) => {
            tracing::trace!(target: "actions.dispatch", op = "undo", lines_changed = counts.lines, "undo");
            if counts.lines > 0 {
                DispatchResult::buffer_replaced()
            } else {
                DispatchResult::dirty()
            }
        }
        None => DispatchResult::clean(),
    }
}

pub(crate) fn handle_redo(state: &mut EditorState) -> DispatchResult {
    match state.redo() {
        Some(counts) => {
            tracing::trace!(target: "actions.dispatch", op = "redo", lines_changed = counts.lines, "redo");
            if counts.lines > 0 {
                DispatchResult::buffer_replaced()
            } else {
                DispatchResult::dirty()
            }
        }
        None => DispatchResult::clean(),
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
    fn undo_with_empty_history_is_clean() {
        let mut st = state("abc\n");
        assert!(!handle_undo(&mut st).dirty);
    }

    #[test]
    fn undo_after_insert_restores_text() {
        let mut st = state("abc\n");
        st.insert_char('x');
        st.set_history_break();
        let res = handle_undo(&mut st);
        assert!(res.dirty);
        assert_eq!(st.document().to_text(), "abc\n");
    }

    #[test]
    fn redo_replays_the_undone_edit() {
        let mut st = state("abc\n");
        st.insert_char('x');
        st.set_history_break();
        handle_undo(&mut st);
        let res = handle_redo(&mut st);
        assert!(res.dirty);
        assert_eq!(st.document().to_text(), "xabc\n");
    }
}
