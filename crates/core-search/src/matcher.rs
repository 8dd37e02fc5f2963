//! The match primitive (`subsearch_matches`) and the forward/backward
//! scanners built on top of it (spec.md §4.5).

use core_text::{Document, Line};

use crate::pattern::{Pattern, Token};

fn chars_of(line: &Line) -> Vec<char> {
    line.cells().iter().filter_map(|c| c.ch()).collect()
}

fn eq_char(a: char, b: char, ignorecase: bool) -> bool {
    if ignorecase {
        a.to_lowercase().eq(b.to_lowercase())
    } else {
        a == b
    }
}

/// Try to match `pattern` against `chars` starting exactly at `start`.
/// Returns the matched length on success. This is the recursive engine
/// behind [`subsearch_matches`]; `.*`/`.*?` branch by trying every
/// admissible split point (greedy tries longest-first, lazy
/// shortest-first), so pattern compilation has no backtracking bytecode —
/// the recursion *is* the backtracking.
fn match_from(chars: &[char], start: usize, tokens: &[Token], ti: usize, ci: usize, ignorecase: bool) -> Option<usize> {
    if ti == tokens.len() {
        return Some(ci - start);
    }
    match &tokens[ti] {
        Token::StartAnchor => {
            if ci == 0 {
                match_from(chars, start, tokens, ti + 1, ci, ignorecase)
            } else {
                None
            }
        }
        Token::EndAnchor => {
            if ci == chars.len() {
                match_from(chars, start, tokens, ti + 1, ci, ignorecase)
            } else {
                None
            }
        }
        Token::Literal(expect) => {
            if ci < chars.len() && eq_char(chars[ci], *expect, ignorecase) {
                match_from(chars, start, tokens, ti + 1, ci + 1, ignorecase)
            } else {
                None
            }
        }
        Token::AnyChar => {
            if ci < chars.len() {
                match_from(chars, start, tokens, ti + 1, ci + 1, ignorecase)
            } else {
                None
            }
        }
        Token::Star { lazy } => {
            if *lazy {
                (ci..=chars.len()).find_map(|k| match_from(chars, start, tokens, ti + 1, k, ignorecase))
            } else {
                (ci..=chars.len())
                    .rev()
                    .find_map(|k| match_from(chars, start, tokens, ti + 1, k, ignorecase))
            }
        }
    }
}

/// Try to match `pattern` anchored at cell offset `j` of `line`. Returns
/// the matched length (in cells) on success.
pub fn subsearch_matches(line: &Line, j: usize, pattern: &Pattern, ignorecase: bool) -> Option<usize> {
    let chars = chars_of(line);
    if j > chars.len() {
        return None;
    }
    match_from(&chars, j, &pattern.tokens, 0, j, ignorecase)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub smart_case: bool,
    pub search_wraps: bool,
}

/// Whether a search for `pattern` under `opts` should be case-insensitive:
/// smart-case is on and the pattern contains no uppercase codepoint
/// (spec.md §4.5).
pub fn effective_ignorecase(pattern: &Pattern, opts: SearchOptions) -> bool {
    opts.smart_case && pattern.is_all_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub line: usize,
    pub col: usize,
    pub len: usize,
}

fn scan_line_range(
    doc: &Document,
    row: usize,
    lo: usize,
    hi_exclusive: usize,
    pattern: &Pattern,
    ignorecase: bool,
) -> Option<Hit> {
    let line = doc.line(row)?;
    let len = line.len();
    let hi = hi_exclusive.min(len + 1);
    (lo..hi).find_map(|col| {
        subsearch_matches(line, col, pattern, ignorecase).map(|l| Hit { line: row, col, len: l })
    })
}

fn scan_line_range_rev(
    doc: &Document,
    row: usize,
    lo: usize,
    hi_exclusive: usize,
    pattern: &Pattern,
    ignorecase: bool,
) -> Option<Hit> {
    let line = doc.line(row)?;
    let len = line.len();
    let hi = hi_exclusive.min(len + 1);
    (lo..hi).rev().find_map(|col| {
        subsearch_matches(line, col, pattern, ignorecase).map(|l| Hit { line: row, col, len: l })
    })
}

/// Scan forward from `(from_line, from_col)` for the first match,
/// wrapping at end-of-file when `opts.search_wraps` is set (spec.md §4.5).
pub fn find_match(
    doc: &Document,
    pattern: &Pattern,
    from_line: usize,
    from_col: usize,
    opts: SearchOptions,
) -> Option<Hit> {
    let n = doc.line_count();
    if n == 0 {
        return None;
    }
    let from_line = from_line.min(n - 1);
    let ignorecase = effective_ignorecase(pattern, opts);

    if let Some(hit) = scan_line_range(doc, from_line, from_col, usize::MAX, pattern, ignorecase) {
        return Some(hit);
    }
    for row in (from_line + 1)..n {
        if let Some(hit) = scan_line_range(doc, row, 0, usize::MAX, pattern, ignorecase) {
            return Some(hit);
        }
    }
    if opts.search_wraps {
        for row in 0..from_line {
            if let Some(hit) = scan_line_range(doc, row, 0, usize::MAX, pattern, ignorecase) {
                return Some(hit);
            }
        }
        if let Some(hit) = scan_line_range(doc, from_line, 0, from_col, pattern, ignorecase) {
            return Some(hit);
        }
    }
    None
}

/// Scan backward from `(from_line, from_col)` for the nearest preceding
/// match, wrapping at start-of-file when `opts.search_wraps` is set.
pub fn find_match_backwards(
    doc: &Document,
    pattern: &Pattern,
    from_line: usize,
    from_col: usize,
    opts: SearchOptions,
) -> Option<Hit> {
    let n = doc.line_count();
    if n == 0 {
        return None;
    }
    let from_line = from_line.min(n - 1);
    let ignorecase = effective_ignorecase(pattern, opts);

    if let Some(hit) = scan_line_range_rev(doc, from_line, 0, from_col, pattern, ignorecase) {
        return Some(hit);
    }
    for row in (0..from_line).rev() {
        if let Some(hit) = scan_line_range_rev(doc, row, 0, usize::MAX, pattern, ignorecase) {
            return Some(hit);
        }
    }
    if opts.search_wraps {
        for row in ((from_line + 1)..n).rev() {
            if let Some(hit) = scan_line_range_rev(doc, row, 0, usize::MAX, pattern, ignorecase) {
                return Some(hit);
            }
        }
        if let Some(hit) = scan_line_range_rev(doc, from_line, from_col, usize::MAX, pattern, ignorecase) {
            return Some(hit);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Line;

    fn opts(wraps: bool) -> SearchOptions {
        SearchOptions { smart_case: true, search_wraps: wraps }
    }

    #[test]
    fn literal_match() {
        let line = Line::from_str("hello world");
        let p = Pattern::compile("world");
        assert_eq!(subsearch_matches(&line, 6, &p, false), Some(5));
        assert_eq!(subsearch_matches(&line, 0, &p, false), None);
    }

    #[test]
    fn anychar_and_star() {
        let line = Line::from_str("foobar");
        let p = Pattern::compile("f.*r");
        assert_eq!(subsearch_matches(&line, 0, &p, false), Some(6));
    }

    #[test]
    fn lazy_star_matches_shortest() {
        let line = Line::from_str("aXbXc");
        let p = Pattern::compile("a.*?X");
        assert_eq!(subsearch_matches(&line, 0, &p, false), Some(2));
    }

    #[test]
    fn greedy_star_matches_longest() {
        let line = Line::from_str("aXbXc");
        let p = Pattern::compile("a.*X");
        assert_eq!(subsearch_matches(&line, 0, &p, false), Some(4));
    }

    #[test]
    fn star_dollar_on_empty_line_matches_empty() {
        let line = Line::from_str("");
        let p = Pattern::compile(".*$");
        assert_eq!(subsearch_matches(&line, 0, &p, false), Some(0));
        let p2 = Pattern::compile(".*?$");
        assert_eq!(subsearch_matches(&line, 0, &p2, false), Some(0));
    }

    #[test]
    fn caret_anchors_to_column_zero_only() {
        let line = Line::from_str("ab ab");
        let p = Pattern::compile("^ab");
        assert_eq!(subsearch_matches(&line, 0, &p, false), Some(2));
        assert_eq!(subsearch_matches(&line, 3, &p, false), None);
    }

    #[test]
    fn dollar_anchors_to_end_of_line_only() {
        let line = Line::from_str("ab ab");
        let p = Pattern::compile("ab$");
        assert_eq!(subsearch_matches(&line, 0, &p, false), None);
        assert_eq!(subsearch_matches(&line, 3, &p, false), Some(2));
    }

    #[test]
    fn smart_case_lowercase_pattern_is_insensitive() {
        let doc = Document::from_text("Apple\napple\nAPPLE");
        let p = Pattern::compile("apple");
        let hit = find_match(&doc, &p, 0, 0, opts(false)).unwrap();
        assert_eq!((hit.line, hit.col), (0, 0));
        let hit2 = find_match(&doc, &p, 0, 1, opts(false)).unwrap();
        assert_eq!((hit2.line, hit2.col), (1, 0));
    }

    #[test]
    fn smart_case_uppercase_pattern_is_sensitive() {
        let doc = Document::from_text("Apple\napple\nAPPLE");
        let p = Pattern::compile("Apple");
        let hit = find_match(&doc, &p, 0, 0, opts(false)).unwrap();
        assert_eq!(hit.line, 0);
        let hit2 = find_match(&doc, &p, 0, 1, opts(false));
        assert!(hit2.is_none(), "no other line contains exact-case 'Apple'");
    }

    #[test]
    fn find_match_wraps_to_start() {
        let doc = Document::from_text("x\ny\nneedle\nz");
        let p = Pattern::compile("needle");
        // Searching forward from past the match should wrap to find it.
        let hit = find_match(&doc, &p, 3, 0, opts(true)).unwrap();
        assert_eq!(hit.line, 2);
    }

    #[test]
    fn find_match_without_wrap_stops_at_eof() {
        let doc = Document::from_text("needle\ny\nz");
        let p = Pattern::compile("needle");
        assert!(find_match(&doc, &p, 1, 0, opts(false)).is_none());
    }

    #[test]
    fn find_match_backwards_basic() {
        let doc = Document::from_text("needle here\nsomething else");
        let p = Pattern::compile("needle");
        let hit = find_match_backwards(&doc, &p, 1, 0, opts(false)).unwrap();
        assert_eq!(hit.line, 0);
    }
}
