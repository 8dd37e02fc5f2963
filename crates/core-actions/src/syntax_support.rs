//! Wires `core_syntax`'s per-line recalculation into the dispatch loop
//! (spec.md §2: "...-> Syntax recalculates affected lines -> Renderer
//! repaints").
//!
//! The registry is process-wide and built once: per-language tables are
//! out of scope (spec.md §1), so every buffer shares the same small
//! built-in set keyed by file extension.

use std::sync::OnceLock;

use core_state::EditorState;
use core_syntax::Registry;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::builtin)
}

/// Resolve the syntax name a file name maps to, by extension. Called once
/// on load (`:e`, startup); `None` for untitled/extensionless/unrecognized
/// files, which leaves the buffer with no syntax assigned.
pub fn registry_for_filename(filename: &str) -> Option<String> {
    registry().for_filename(filename).map(|def| def.name.clone())
}

/// Re-highlight starting at the document's current cursor line, called
/// after an edit that did not change the line count.
pub fn recalc_from_cursor(state: &mut EditorState) {
    let line = state.document().cursor.line;
    core_syntax::recalculate_syntax(state.document_mut(), registry(), line);
}

/// Re-highlight the whole document, called after a structural edit
/// (line insert/removal, paste, undo/redo, file reload) where the line
/// carrying a stale entry state is no longer known precisely.
pub fn recalc_full(state: &mut EditorState) {
    core_syntax::recalculate_syntax_full(state.document_mut(), registry());
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Document;

    #[test]
    fn resolves_known_extension() {
        assert_eq!(registry_for_filename("main.rs").as_deref(), Some("comment-aware"));
    }

    #[test]
    fn unknown_extension_resolves_to_none() {
        assert_eq!(registry_for_filename("notes.txt"), None);
    }

    #[test]
    fn recalc_from_cursor_paints_comment() {
        let mut st = EditorState::new(Document::from_text("let x = 1; // note\n"));
        st.document_mut().syntax_id = registry_for_filename("main.rs");
        recalc_full(&mut st);
        let line = st.document().line(0).unwrap();
        let comment_start = line.to_string_lossy().find("//").unwrap();
        assert_eq!(
            line.cell(comment_start).unwrap().flags().syntax_class(),
            core_text::SyntaxClass::Comment
        );
    }
}
