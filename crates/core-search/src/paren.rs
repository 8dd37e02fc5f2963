//! `find_matching_paren` (spec.md §4.5): picks a search direction from the
//! bracket under the cursor, then walks the document counting same-class
//! brackets until nesting returns to zero. "Same-class" means the
//! cell's [`core_text::SyntaxClass`] must match the origin cell's — a `)`
//! sitting in a comment does not close a `(` sitting in code.

use core_text::Document;

fn classify(ch: char) -> Option<(char, char, bool)> {
    match ch {
        '(' => Some(('(', ')', true)),
        ')' => Some(('(', ')', false)),
        '[' => Some(('[', ']', true)),
        ']' => Some(('[', ']', false)),
        '{' => Some(('{', '}', true)),
        '}' => Some(('{', '}', false)),
        _ => None,
    }
}

fn next_pos(doc: &Document, line: usize, col: usize) -> Option<(usize, usize)> {
    let len = doc.line(line)?.len();
    if col + 1 < len {
        Some((line, col + 1))
    } else if line + 1 < doc.line_count() {
        Some((line + 1, 0))
    } else {
        None
    }
}

fn prev_pos(doc: &Document, line: usize, col: usize) -> Option<(usize, usize)> {
    if col > 0 {
        Some((line, col - 1))
    } else if line > 0 {
        let prev_len = doc.line(line - 1)?.len();
        Some((line - 1, prev_len.saturating_sub(1)))
    } else {
        None
    }
}

/// Find the bracket matching the one at `(line, col)`, honoring syntax-class
/// equality. Returns `None` if the cell is not a bracket, or no matching
/// bracket is found before document bounds.
pub fn find_matching_paren(doc: &Document, line: usize, col: usize) -> Option<(usize, usize)> {
    let origin_cell = doc.line(line)?.cell(col)?;
    let ch = origin_cell.ch()?;
    let origin_class = origin_cell.flags().syntax_class();
    let (open, close, forward) = classify(ch)?;

    let mut depth = 0i32;
    let mut cur = if forward {
        next_pos(doc, line, col)
    } else {
        prev_pos(doc, line, col)
    };
    while let Some((l, c)) = cur {
        if let Some(cell) = doc.line(l).and_then(|ln| ln.cell(c))
            && cell.flags().syntax_class() == origin_class
            && let Some(cc) = cell.ch()
        {
            if forward {
                if cc == open {
                    depth += 1;
                } else if cc == close {
                    if depth == 0 {
                        return Some((l, c));
                    }
                    depth -= 1;
                }
            } else if cc == close {
                depth += 1;
            } else if cc == open {
                if depth == 0 {
                    return Some((l, c));
                }
                depth -= 1;
            }
        }
        cur = if forward { next_pos(doc, l, c) } else { prev_pos(doc, l, c) };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::SyntaxClass;

    #[test]
    fn matches_simple_pair() {
        let doc = Document::from_text("(a(b)c)");
        let (l, c) = find_matching_paren(&doc, 0, 0).unwrap();
        assert_eq!((l, c), (0, 6));
        let (l2, c2) = find_matching_paren(&doc, 0, 6).unwrap();
        assert_eq!((l2, c2), (0, 0));
    }

    #[test]
    fn matches_nested_pair_is_involution() {
        let doc = Document::from_text("(a(b)c)");
        let (l, c) = find_matching_paren(&doc, 0, 2).unwrap();
        assert_eq!((l, c), (0, 4));
        let (l2, c2) = find_matching_paren(&doc, 0, 4).unwrap();
        assert_eq!((l2, c2), (0, 2));
    }

    #[test]
    fn matches_across_lines() {
        let doc = Document::from_text("foo(\nbar\n)baz");
        let (l, c) = find_matching_paren(&doc, 0, 3).unwrap();
        assert_eq!((l, c), (2, 0));
    }

    #[test]
    fn non_bracket_cell_returns_none() {
        let doc = Document::from_text("abc");
        assert!(find_matching_paren(&doc, 0, 1).is_none());
    }

    #[test]
    fn syntax_class_mismatch_prevents_match() {
        let mut doc = Document::from_text("(a)");
        // Paint the closing paren as a comment; the opening paren stays
        // classless, so it must not be treated as a match.
        let line = doc.line_mut(0).unwrap();
        let cell = line.cell_mut(2).unwrap();
        let mut flags = cell.flags();
        flags.set_syntax(SyntaxClass::Comment);
        cell.set_flags(flags);
        assert!(find_matching_paren(&doc, 0, 0).is_none());
    }
}
