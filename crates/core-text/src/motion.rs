//! Cursor motion helpers.
//!
//! These operate purely on a `Document` + `Position` pair and are free of
//! global editor state. Because a `Cell` already IS one display unit (no
//! grapheme-cluster segmentation needed, unlike a raw `String` buffer),
//! "one cell" and "one character" are the same step here.

use crate::{Document, Position};

/// Normalize a position for Vim Normal-mode semantics: if the cursor
/// rests one cell past the last real cell of a non-empty line, clamp it
/// back onto that last cell so the block cursor always rests on real
/// content outside Insert-family modes.
pub fn normalize_normal_mode_position(doc: &Document, pos: &mut Position) {
    if pos.line >= doc.line_count() {
        return;
    }
    let Some(line) = doc.line(pos.line) else { return };
    let len = line.len();
    if len == 0 {
        return;
    }
    if pos.cell >= len {
        pos.cell = len - 1;
    }
}

pub fn left(doc: &Document, pos: &mut Position) {
    let _ = doc;
    if pos.cell > 0 {
        pos.cell -= 1;
    }
}

pub fn right(doc: &Document, pos: &mut Position) {
    if let Some(line) = doc.line(pos.line)
        && pos.cell < line.len()
    {
        pos.cell += 1;
    }
}

pub fn line_start(_doc: &Document, pos: &mut Position) {
    pos.cell = 0;
}

pub fn line_end(doc: &Document, pos: &mut Position) {
    pos.cell = doc.line(pos.line).map(|l| l.len()).unwrap_or(0);
}

fn visual_col(doc: &Document, line: usize, cell: usize) -> usize {
    let Some(l) = doc.line(line) else { return 0 };
    l.cells()
        .iter()
        .take(cell)
        .map(|c| c.display_width() as usize)
        .sum()
}

fn cell_for_visual_col(doc: &Document, line: usize, target_col: usize) -> usize {
    let Some(l) = doc.line(line) else { return 0 };
    let mut col = 0usize;
    for (idx, c) in l.cells().iter().enumerate() {
        let w = c.display_width().max(1) as usize;
        if col + w > target_col {
            return idx;
        }
        col += w;
    }
    l.len()
}

/// Move up one line preserving a target visual column (sticky). Returns
/// the updated sticky column for the caller to carry into the next call.
pub fn up(doc: &Document, pos: &mut Position, mut sticky_col: Option<usize>) -> Option<usize> {
    if pos.line == 0 {
        return sticky_col;
    }
    if sticky_col.is_none() {
        sticky_col = Some(visual_col(doc, pos.line, pos.cell));
    }
    pos.line -= 1;
    pos.cell = cell_for_visual_col(doc, pos.line, sticky_col.unwrap());
    sticky_col
}

pub fn down(doc: &Document, pos: &mut Position, mut sticky_col: Option<usize>) -> Option<usize> {
    if pos.line + 1 >= doc.line_count() {
        return sticky_col;
    }
    if sticky_col.is_none() {
        sticky_col = Some(visual_col(doc, pos.line, pos.cell));
    }
    pos.line += 1;
    pos.cell = cell_for_visual_col(doc, pos.line, sticky_col.unwrap());
    sticky_col
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Word,
    Blank,
    Other,
}

fn classify(ch: char) -> CellKind {
    if crate::is_word_char(ch) || ch == '\'' {
        CellKind::Word
    } else if ch.is_whitespace() {
        CellKind::Blank
    } else {
        CellKind::Other
    }
}

fn cell_char(doc: &Document, line: usize, cell: usize) -> Option<char> {
    doc.line(line).and_then(|l| l.cell(cell)).and_then(|c| c.ch())
}

fn skip_blanks_forward(doc: &Document, line: &mut usize, cell: &mut usize) -> bool {
    loop {
        let len = doc.line(*line).map(|l| l.len()).unwrap_or(0);
        if *cell >= len {
            if *line + 1 >= doc.line_count() {
                *cell = len;
                return false;
            }
            *line += 1;
            *cell = 0;
            if doc.line(*line).map(|l| l.is_empty()).unwrap_or(true) {
                continue;
            }
        }
        let Some(ch) = cell_char(doc, *line, *cell) else { return true };
        if classify(ch) == CellKind::Blank {
            *cell += 1;
            continue;
        }
        return true;
    }
}

fn skip_kind_in_line(doc: &Document, line: usize, mut cell: usize, kind: CellKind) -> usize {
    let len = doc.line(line).map(|l| l.len()).unwrap_or(0);
    while cell < len {
        let Some(ch) = cell_char(doc, line, cell) else { break };
        if classify(ch) != kind {
            break;
        }
        cell += 1;
    }
    cell
}

fn retreat_line(doc: &Document, line: &mut usize, cell: &mut usize) -> bool {
    if *line == 0 {
        return false;
    }
    *line -= 1;
    *cell = doc.line(*line).map(|l| l.len()).unwrap_or(0);
    true
}

/// Move forward to the start of the next token following Vim `w` semantics.
/// Word tokens are letters/digits/underscore/apostrophe; punctuation tokens
/// are standalone stops; whitespace (including blank lines) is skipped.
pub fn word_forward(doc: &Document, pos: &mut Position) {
    if doc.line_count() == 0 {
        return;
    }
    let mut line = pos.line.min(doc.line_count() - 1);
    let len = doc.line(line).map(|l| l.len()).unwrap_or(0);
    let mut cell = pos.cell.min(len);
    if cell >= len {
        let _ = skip_blanks_forward(doc, &mut line, &mut cell);
        pos.line = line;
        pos.cell = cell;
        return;
    }
    let kind = classify(cell_char(doc, line, cell).unwrap_or(' '));
    cell = match kind {
        CellKind::Blank => cell + 1,
        CellKind::Word | CellKind::Other => skip_kind_in_line(doc, line, cell, kind),
    };
    let _ = skip_blanks_forward(doc, &mut line, &mut cell);
    pos.line = line;
    pos.cell = cell;
}

/// Move backward to the start of the previous token following Vim `b` semantics.
pub fn word_backward(doc: &Document, pos: &mut Position) {
    if doc.line_count() == 0 {
        return;
    }
    let mut line = pos.line.min(doc.line_count() - 1);
    let len = doc.line(line).map(|l| l.len()).unwrap_or(0);
    let mut cell = pos.cell.min(len);

    loop {
        if cell == 0 {
            if !retreat_line(doc, &mut line, &mut cell) {
                pos.line = 0;
                pos.cell = 0;
                return;
            }
            continue;
        }
        let prev = cell - 1;
        let Some(ch) = cell_char(doc, line, prev) else {
            if !retreat_line(doc, &mut line, &mut cell) {
                pos.line = 0;
                pos.cell = 0;
                return;
            }
            continue;
        };
        let kind = classify(ch);
        match kind {
            CellKind::Blank => {
                cell = prev;
                continue;
            }
            CellKind::Word | CellKind::Other => {
                cell = prev;
                while cell > 0 {
                    let Some(before) = cell_char(doc, line, cell - 1) else { break };
                    if classify(before) != kind {
                        break;
                    }
                    cell -= 1;
                }
                pos.line = line;
                pos.cell = cell;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    #[test]
    fn horizontal_and_line_boundaries() {
        let doc = Document::from_text("abc");
        let mut pos = Position::new(0, 0);
        while pos.cell < doc.line(0).unwrap().len() {
            right(&doc, &mut pos);
        }
        let end = doc.line(0).unwrap().len();
        assert_eq!(pos.cell, end);
        left(&doc, &mut pos);
        left(&doc, &mut pos);
        assert!(pos.cell < end);
        line_start(&doc, &mut pos);
        assert_eq!(pos.cell, 0);
        line_end(&doc, &mut pos);
        assert_eq!(pos.cell, end);
    }

    #[test]
    fn vertical_motion_sticky_column() {
        let doc = Document::from_text("ab\nx\nlonger line here");
        let mut pos = Position::new(0, 2);
        let mut sticky = None;
        sticky = down(&doc, &mut pos, sticky);
        assert_eq!(pos.line, 1);
        assert_eq!(pos.cell, 1, "clamped to short line length");
        sticky = down(&doc, &mut pos, sticky);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.cell, 2, "sticky column restored on longer line");
        up(&doc, &mut pos, sticky);
        assert_eq!(pos.line, 1);
    }

    #[test]
    fn word_forward_and_backward_basic() {
        let doc = Document::from_text("foo, bar can't stop 123!");
        let line0 = doc.line(0).unwrap().to_string_lossy();
        let comma_idx = line0.find(',').unwrap();
        let bar_idx = line0.find("bar").unwrap();
        let cant_idx = line0.find("can't").unwrap();
        let stop_idx = line0.find("stop").unwrap();
        let digits_idx = line0.find("123").unwrap();
        let excl_idx = line0.find('!').unwrap();

        let mut pos = Position::new(0, 0);
        word_forward(&doc, &mut pos);
        assert_eq!(pos.cell, comma_idx);
        word_forward(&doc, &mut pos);
        assert_eq!(pos.cell, bar_idx);
        word_forward(&doc, &mut pos);
        assert_eq!(pos.cell, cant_idx);
        word_forward(&doc, &mut pos);
        assert_eq!(pos.cell, stop_idx);
        word_forward(&doc, &mut pos);
        assert_eq!(pos.cell, digits_idx);
        word_forward(&doc, &mut pos);
        assert_eq!(pos.cell, excl_idx);

        pos.cell = doc.line(0).unwrap().len();
        word_backward(&doc, &mut pos);
        assert_eq!(pos.cell, excl_idx);
        word_backward(&doc, &mut pos);
        assert_eq!(pos.cell, digits_idx);
        word_backward(&doc, &mut pos);
        assert_eq!(pos.cell, stop_idx);
        word_backward(&doc, &mut pos);
        assert_eq!(pos.cell, cant_idx);
        word_backward(&doc, &mut pos);
        assert_eq!(pos.cell, bar_idx);
        word_backward(&doc, &mut pos);
        assert_eq!(pos.cell, comma_idx);
        word_backward(&doc, &mut pos);
        assert_eq!(pos.cell, 0);
    }

    #[test]
    fn word_motion_cross_line_edges() {
        let doc = Document::from_text("alpha\n\n beta gamma\n    \nemoji tok\n");
        let mut pos = Position::new(0, 0);
        word_forward(&doc, &mut pos);
        assert_eq!(pos.line, 2);
        let beta_idx = doc.line(2).unwrap().to_string_lossy().find("beta").unwrap();
        assert_eq!(pos.cell, beta_idx);

        word_forward(&doc, &mut pos);
        let gamma_idx = doc.line(2).unwrap().to_string_lossy().find("gamma").unwrap();
        assert_eq!(pos.cell, gamma_idx);

        word_forward(&doc, &mut pos);
        assert_eq!(pos.line, 4);
        word_backward(&doc, &mut pos);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.cell, gamma_idx);
    }
}
