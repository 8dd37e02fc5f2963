//! Yank (copy/cut) buffer. Tracks whether the stored text came from a
//! line-wise or character-wise operation, since paste behavior differs:
//! a line yank is inserted as whole line(s) above/below the cursor, while
//! a char yank is spliced into the current line at the cursor.

use core_text::{Cell, Line};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YankKind {
    Line,
    Char,
}

#[derive(Debug, Clone)]
pub struct YankBuffer {
    kind: YankKind,
    lines: Vec<Vec<Cell>>,
}

impl YankBuffer {
    pub fn empty() -> Self {
        YankBuffer { kind: YankKind::Char, lines: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn kind(&self) -> &YankKind {
        &self.kind
    }

    /// Store a single span of cells as a character-wise yank.
    pub fn set_char_span(&mut self, cells: Vec<Cell>) {
        self.kind = YankKind::Char;
        self.lines = vec![cells];
    }

    /// Store one or more whole lines as a line-wise yank.
    pub fn set_lines(&mut self, lines: Vec<Line>) {
        self.kind = YankKind::Line;
        self.lines = lines.into_iter().map(|l| l.cells().to_vec()).collect();
    }

    /// The yanked content as fresh [`Line`]s, ready for `add_line`
    /// (line-wise) or `insert_cells` (char-wise, single span only).
    pub fn as_lines(&self) -> Vec<Line> {
        self.lines
            .iter()
            .map(|cells| {
                let mut line = Line::new();
                if !cells.is_empty() {
                    line.insert_cells(0, cells).expect("fresh line always accepts insert at 0");
                }
                line
            })
            .collect()
    }

    /// The single cell span for a character-wise paste. Empty if this
    /// buffer holds a line-wise yank or nothing at all.
    pub fn as_char_span(&self) -> &[Cell] {
        if self.kind == YankKind::Char {
            self.lines.first().map(Vec::as_slice).unwrap_or(&[])
        } else {
            &[]
        }
    }
}

impl Default for YankBuffer {
    fn default() -> Self {
        YankBuffer::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Document;

    #[test]
    fn char_yank_roundtrips_span() {
        let mut yank = YankBuffer::empty();
        let doc = Document::from_text("hello");
        let cells = doc.line(0).unwrap().cells()[1..4].to_vec();
        yank.set_char_span(cells.clone());
        assert_eq!(yank.as_char_span(), cells.as_slice());
        assert_eq!(*yank.kind(), YankKind::Char);
    }

    #[test]
    fn line_yank_produces_fresh_lines() {
        let mut yank = YankBuffer::empty();
        let doc = Document::from_text("one\ntwo\nthree");
        yank.set_lines(vec![doc.line(0).unwrap().clone(), doc.line(1).unwrap().clone()]);
        let produced = yank.as_lines();
        assert_eq!(produced.len(), 2);
        assert_eq!(produced[0].to_string_lossy(), "one");
        assert_eq!(produced[1].to_string_lossy(), "two");
        assert!(yank.as_char_span().is_empty(), "line yank has no char span");
    }

    #[test]
    fn empty_buffer_reports_empty() {
        let yank = YankBuffer::empty();
        assert!(yank.is_empty());
        assert!(yank.as_lines().is_empty());
    }
}
