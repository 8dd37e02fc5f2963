//! Cursor helpers a [`crate::Highlighter`] uses to walk a line and paint
//! cells, in place of the source editor's `paint`/`charat`/`nextchar`
//! macros (spec.md §9 design note: "replace with inlined helper methods on
//! the highlighter state object; keep the state-carry integer abstraction
//! intact").

use core_text::{CellFlags, Line, SyntaxClass};

/// A single forward pass over one [`Line`]'s cells. Highlighters hold one
/// of these for the duration of a `calculate` call; it never outlives the
/// line it scans.
pub struct Scanner<'a> {
    line: &'a mut Line,
    i: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(line: &'a mut Line) -> Self {
        Scanner { line, i: 0 }
    }

    /// Current cursor position within the line (the `i` in the spec's
    /// `{line, line_no, state, i}` highlighter contract).
    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn at_end(&self) -> bool {
        self.i >= self.line.len()
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    /// The codepoint at the cursor, or `None` past end of line.
    pub fn charat(&self) -> Option<char> {
        self.line.cell(self.i).and_then(|c| c.ch())
    }

    /// The codepoint `offset` cells ahead of the cursor.
    pub fn peek(&self, offset: usize) -> Option<char> {
        self.line.cell(self.i + offset).and_then(|c| c.ch())
    }

    /// Advance the cursor one cell and return the codepoint it lands on.
    pub fn nextchar(&mut self) -> Option<char> {
        self.i += 1;
        self.charat()
    }

    pub fn advance(&mut self, n: usize) {
        self.i = (self.i + n).min(self.line.len());
    }

    /// Apply `class` to the cell at the cursor.
    pub fn paint(&mut self, class: SyntaxClass) {
        if let Some(cell) = self.line.cell_mut(self.i) {
            let mut flags = cell.flags();
            flags.set_syntax(class);
            cell.set_flags(flags);
        }
    }

    /// Apply `class` to every cell in `[start, end)`, used by highlighters
    /// that recognize a whole token (keyword, number literal) at once
    /// rather than cell-by-cell.
    pub fn paint_range(&mut self, start: usize, end: usize, class: SyntaxClass) {
        let end = end.min(self.line.len());
        for idx in start..end {
            if let Some(cell) = self.line.cell_mut(idx) {
                let mut flags = cell.flags();
                flags.set_syntax(class);
                cell.set_flags(flags);
            }
        }
    }

    /// True if the codepoints starting at the cursor match `word` exactly
    /// and are not themselves bordered by further word characters (a crude
    /// but sufficient keyword-boundary check for the line-oriented
    /// highlighter contract).
    pub fn matches_word(&self, word: &str) -> bool {
        let chars: Vec<char> = word.chars().collect();
        for (offset, &expect) in chars.iter().enumerate() {
            if self.peek(offset) != Some(expect) {
                return false;
            }
        }
        let after = self.peek(chars.len());
        !after.map(core_text::is_word_char).unwrap_or(false)
    }
}

/// Clear the classification bits (syntax class + SEARCH/ERROR/NOTICE) on
/// every cell of `line`, per spec.md §4.4 step 1 ("zero all cell flags on
/// the line"). The SELECT bit is left untouched: selection highlighting is
/// a live view-layer concern owned by the renderer/dispatcher, not
/// recomputed by a syntax pass, and spec.md's own color-priority rule
/// (SELECT wins over everything else) would be meaningless if syntax
/// recalculation could erase an active selection mid-edit.
pub fn clear_classification(line: &mut Line) {
    for idx in 0..line.len() {
        if let Some(cell) = line.cell_mut(idx) {
            let mut flags = cell.flags();
            flags.set_syntax(SyntaxClass::None);
            flags.set(CellFlags::SEARCH, false);
            flags.set(CellFlags::ERROR, false);
            flags.set(CellFlags::NOTICE, false);
            cell.set_flags(flags);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Line;

    #[test]
    fn scanner_walks_and_paints() {
        let mut line = Line::from_str("let x");
        {
            let mut s = Scanner::new(&mut line);
            assert!(s.matches_word("let"));
            s.paint_range(0, 3, SyntaxClass::Keyword);
            s.advance(3);
            assert_eq!(s.charat(), Some(' '));
        }
        assert_eq!(line.cell(0).unwrap().flags().syntax_class(), SyntaxClass::Keyword);
        assert_eq!(line.cell(2).unwrap().flags().syntax_class(), SyntaxClass::Keyword);
        assert_eq!(line.cell(4).unwrap().flags().syntax_class(), SyntaxClass::None);
    }

    #[test]
    fn clear_classification_preserves_select() {
        let mut line = Line::from_str("ab");
        {
            let cell = line.cell_mut(0).unwrap();
            let mut flags = cell.flags();
            flags.set_syntax(SyntaxClass::String);
            flags.set(CellFlags::SELECT, true);
            flags.set(CellFlags::SEARCH, true);
            cell.set_flags(flags);
        }
        clear_classification(&mut line);
        let flags = line.cell(0).unwrap().flags();
        assert_eq!(flags.syntax_class(), SyntaxClass::None);
        assert!(!flags.is_search());
        assert!(flags.is_select());
    }
}
