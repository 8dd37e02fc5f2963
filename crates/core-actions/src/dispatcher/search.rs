//! `/`/`?` search overlay (spec.md §4.5, §8 scenario 3).
//!
//! Shares `EditorState::command_line` with the `:` command overlay: the
//! leading sentinel character (`/` or `?`) both drives the prefix-based
//! routing in `key_translator` and tells `handle_search_execute` which
//! direction to scan.

use super::DispatchResult;
use crate::SearchDirection;
use core_search::{Pattern, SearchOptions, find_match, find_match_backwards};
use core_state::EditorState;

pub(crate) fn handle_search_start(dir: SearchDirection, state: &mut EditorState) -> DispatchResult {
    let prefix = match dir {
        SearchDirection::Forward => '/',
        SearchDirection::Backward => '?',
    };
    state.command_line.begin(prefix);
    DispatchResult::dirty()
}

/// `raw` is the full overlay buffer, e.g. `"/apple"` or `"?apple"`.
pub(crate) fn handle_search_execute(raw: &str, state: &mut EditorState) -> DispatchResult {
    let mut chars = raw.chars();
    let dir = match chars.next() {
        Some('/') => SearchDirection::Forward,
        Some('?') => SearchDirection::Backward,
        _ => {
            state.command_line.clear();
            return DispatchResult::dirty();
        }
    };
    let pattern_src = chars.as_str();
    state.command_line.clear();
    if pattern_src.is_empty() {
        return DispatchResult::dirty();
    }
    let pattern = Pattern::compile(pattern_src);
    let opts = SearchOptions {
        smart_case: true,
        search_wraps: true,
    };
    let cursor = state.document().cursor;
    let hit = match dir {
        SearchDirection::Forward => find_match(state.document(), &pattern, cursor.line, cursor.cell + 1, opts),
        SearchDirection::Backward => find_match_backwards(state.document(), &pattern, cursor.line, cursor.cell, opts),
    };
    match hit {
        Some(hit) => {
            state.document_mut().cursor = core_text::Position::new(hit.line, hit.col);
            DispatchResult::dirty()
        }
        None => {
            state.set_ephemeral(
                format!("pattern not found: {pattern_src}"),
                std::time::Duration::from_secs(3),
            );
            DispatchResult::dirty()
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
    fn search_start_begins_command_line_with_prefix() {
        let mut st = state("abc\n");
        handle_search_start(SearchDirection::Forward, &mut st);
        assert_eq!(st.command_line.buffer(), "/");
    }

    #[test]
    fn forward_search_jumps_to_next_match() {
        let mut st = state("one two three\n");
        let res = handle_search_execute("/two", &mut st);
        assert!(res.dirty);
        assert_eq!(st.document().cursor, core_text::Position::new(0, 4));
        assert!(st.command_line.buffer().is_empty());
    }

    #[test]
    fn backward_search_jumps_to_previous_match() {
        let mut st = state("apple banana apple\n");
        st.document_mut().cursor.cell = 18;
        let res = handle_search_execute("?apple", &mut st);
        assert!(res.dirty);
        assert_eq!(st.document().cursor, core_text::Position::new(0, 13));
    }

    #[test]
    fn smart_case_search_is_case_insensitive_for_lowercase_pattern() {
        let mut st = state("Apple pie\n");
        let res = handle_search_execute("/apple", &mut st);
        assert!(res.dirty);
        assert_eq!(st.document().cursor, core_text::Position::new(0, 0));
    }

    #[test]
    fn no_match_sets_ephemeral_and_clears_overlay() {
        let mut st = state("abc\n");
        handle_search_execute("/zzz", &mut st);
        assert_eq!(
            st.ephemeral_status.as_ref().map(|m| m.text.as_str()),
            Some("pattern not found: zzz")
        );
        assert!(st.command_line.buffer().is_empty());
    }
}
