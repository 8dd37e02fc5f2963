//! Turns a motion + count into the span an operator (`d`, `y`, `c`) acts
//! on, by replaying the motion against a scratch copy of the cursor and
//! comparing before/after. Vertical motions resolve to whole-line spans;
//! horizontal/word motions are exclusive (Vim convention: the cell the
//! cursor lands on is not itself part of the span) and resolve to a
//! characterwise span one cell short of the landing position.

use crate::MotionKind;
use core_state::{SelectionKind, SelectionSpan};
use core_text::{motion, Document, Position};

fn step_back_one_cell(doc: &Document, pos: Position) -> Position {
    if pos.cell > 0 {
        Position::new(pos.line, pos.cell - 1)
    } else if pos.line > 0 {
        let prev = pos.line - 1;
        let len = doc.line(prev).map(|l| l.len()).unwrap_or(0);
        Position::new(prev, len.saturating_sub(1))
    } else {
        pos
    }
}

/// Replay `motion_kind` `count` times starting from `start`, returning
/// the resulting `SelectionSpan` for an operator to consume.
pub fn resolve_selection(
    doc: &Document,
    start: Position,
    motion_kind: MotionKind,
    count: u32,
) -> SelectionSpan {
    let count = count.max(1);
    let mut end = start;
    let mut sticky: Option<usize> = None;

    let linewise = matches!(
        motion_kind,
        MotionKind::Up | MotionKind::Down | MotionKind::PageHalfUp | MotionKind::PageHalfDown
    );

    for _ in 0..count {
        match motion_kind {
            MotionKind::Left => motion::left(doc, &mut end),
            MotionKind::Right => motion::right(doc, &mut end),
            MotionKind::LineStart => motion::line_start(doc, &mut end),
            MotionKind::LineEnd => motion::line_end(doc, &mut end),
            MotionKind::WordForward => motion::word_forward(doc, &mut end),
            MotionKind::WordBackward => motion::word_backward(doc, &mut end),
            MotionKind::Up => sticky = motion::up(doc, &mut end, sticky),
            MotionKind::Down => sticky = motion::down(doc, &mut end, sticky),
            MotionKind::PageHalfUp => {
                for _ in 0..(doc.line_count().max(1) / 2).max(1) {
                    sticky = motion::up(doc, &mut end, sticky);
                }
            }
            MotionKind::PageHalfDown => {
                for _ in 0..(doc.line_count().max(1) / 2).max(1) {
                    sticky = motion::down(doc, &mut end, sticky);
                }
            }
        }
    }

    if linewise {
        return SelectionSpan::new(start, end, SelectionKind::Linewise);
    }

    if end == start {
        return SelectionSpan::new(start, end, SelectionKind::Characterwise);
    }

    // Exclusive motion: the landing cell itself isn't part of the span,
    // so back it off by one before handing to the inclusive-end
    // `collect_cells` convention.
    let (lo, hi) = if greater(&end, &start) { (start, end) } else { (end, start) };
    let hi = step_back_one_cell(doc, hi);
    SelectionSpan::new(lo, hi, SelectionKind::Characterwise)
}

fn greater(a: &Position, b: &Position) -> bool {
    a.line > b.line || (a.line == b.line && a.cell > b.cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Document;

    #[test]
    fn selection_right_multiple() {
        let doc = Document::from_text("hello world\n");
        let span = resolve_selection(&doc, Position::new(0, 0), MotionKind::Right, 3);
        assert!(!span.is_empty());
        let cells = span.collect_cells(&doc);
        assert_eq!(cells[0].to_string_lossy(), "hel");
    }

    #[test]
    fn selection_word_forward() {
        let doc = Document::from_text("hello world\n");
        let span = resolve_selection(&doc, Position::new(0, 0), MotionKind::WordForward, 1);
        let cells = span.collect_cells(&doc);
        assert_eq!(cells[0].to_string_lossy(), "hello ");
    }

    #[test]
    fn selection_left_no_movement() {
        let doc = Document::from_text("hello\n");
        let span = resolve_selection(&doc, Position::new(0, 0), MotionKind::Left, 1);
        assert!(span.is_empty());
    }

    #[test]
    fn selection_down_is_linewise() {
        let doc = Document::from_text("one\ntwo\nthree\n");
        let span = resolve_selection(&doc, Position::new(0, 0), MotionKind::Down, 1);
        let cells = span.collect_cells(&doc);
        assert_eq!(cells.len(), 2);
    }
}
