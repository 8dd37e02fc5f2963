//! Forward/backward pattern search, `:s` replacement, and paren matching
//! (spec.md §4.5).
//!
//! The dialect is intentionally small and hand-rolled rather than backed
//! by the `regex` crate: spec.md names an exact, closed set of constructs
//! (`.`, `.*`, `.*?`, `^`, `$`, a handful of escapes) and nothing else —
//! compiling that into a general regex engine would both be overkill and
//! accept patterns the spec does not define behavior for.

pub mod matcher;
pub mod paren;
pub mod pattern;
pub mod replace;

pub use matcher::{Hit, SearchOptions, effective_ignorecase, find_match, find_match_backwards, subsearch_matches};
pub use paren::find_matching_paren;
pub use pattern::Pattern;
pub use replace::replace_range;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use core_text::Document;

    #[test]
    fn end_to_end_replace_scenario() {
        // spec.md §8 scenario 4: `:%s/foo/qux/g`.
        let mut doc = Document::from_text("foo bar foo\nbaz foo");
        let pattern = Pattern::compile("foo");
        let replaced = replace_range(&mut doc, 0, doc.line_count() - 1, &pattern, "qux", true, false);
        assert_eq!(replaced, 3);
        assert_eq!(doc.to_text(), "qux bar qux\nbaz qux");
    }

    #[test]
    fn search_then_jump_to_match_column() {
        let doc = Document::from_text("one two three");
        let pattern = Pattern::compile("two");
        let opts = SearchOptions { smart_case: true, search_wraps: false };
        let hit = find_match(&doc, &pattern, 0, 0, opts).unwrap();
        assert_eq!((hit.line, hit.col, hit.len), (0, 4, 3));
    }
}
