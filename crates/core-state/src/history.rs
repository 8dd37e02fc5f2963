//! Reversible edit history: a timeline of tagged [`Record`]s with
//! breakpoint markers (spec.md §3 "History Record", §4.3 "History").
//!
//! The source keeps this as a doubly-linked list with a mutable tail and
//! raw back/forward pointers; per spec.md §9's design note ("History
//! back/forward pointers become indices into a pool to avoid cyclic
//! ownership") this is a flat `Vec<Node>` pool instead. Since only one
//! branch is ever live (appending after an undo prunes everything ahead of
//! the cursor), a pool plus a single `current` index gives the same
//! semantics as the doubly-linked list without unsafe or `Rc`/`RefCell`.

use core_text::{Cell, Document, Line, Position};
use tracing::trace;

/// One reversible unit of edit history (spec.md §3).
#[derive(Debug, Clone)]
pub enum Record {
    Insert { line: usize, offset: usize, cell: Cell },
    Delete { line: usize, offset: usize, cell: Cell },
    Replace { line: usize, offset: usize, cell: Cell, old_cell: Cell },
    AddLine { line: usize },
    RemoveLine { line: usize, old_contents: Line },
    ReplaceLine { line: usize, old_contents: Line, new_contents: Line },
    SplitLine { line: usize, split_col: usize },
    MergeLines { line: usize, split_col: usize },
    /// User-visible boundary between undoable units.
    Break,
    /// Immutable root of the timeline; never removed, never matched by
    /// undo/redo traversal beyond stopping at it.
    Sentinel,
}

impl Record {
    fn is_break(&self) -> bool {
        matches!(self, Record::Break)
    }

    fn is_sentinel(&self) -> bool {
        matches!(self, Record::Sentinel)
    }

    fn is_boundary(&self) -> bool {
        self.is_break() || self.is_sentinel()
    }
}

struct Node {
    record: Record,
    /// Cursor position at the time this record was appended; restored
    /// when undo consumes this record (spec.md §3: "each record also
    /// stores the cursor position at record time").
    cursor: Position,
}

/// A doubly-linked timeline of [`Record`]s, represented as an append-only
/// pool truncated on branch (see module docs).
pub struct History {
    nodes: Vec<Node>,
    /// Index of the most recently applied record (the "tail"). Index `0`
    /// is always the `Sentinel`.
    current: usize,
}

/// Counts reported by [`History::undo_to_breakpoint`]/[`History::redo_to_breakpoint`]
/// (spec.md §4.3: "Reports counts of characters and lines changed").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeCounts {
    pub chars: usize,
    pub lines: usize,
}

impl Default for History {
    fn default() -> Self {
        History::new()
    }
}

impl History {
    pub fn new() -> Self {
        History {
            nodes: vec![Node { record: Record::Sentinel, cursor: Position::new(0, 0) }],
            current: 0,
        }
    }

    fn current_record(&self) -> &Record {
        &self.nodes[self.current].record
    }

    /// Append `record` at the current position, pruning any forward
    /// branch the timeline was pointing into (spec.md §3: "Appending a
    /// record while pointing into history prunes the forward branch").
    /// Two consecutive `Break`s (or a `Break` immediately after the
    /// `Sentinel`) collapse into a no-op (spec.md §4.3).
    pub fn push(&mut self, record: Record, cursor: Position) {
        if record.is_break() && self.current_record().is_boundary() {
            trace!(target: "state.history", "break_collapsed");
            return;
        }
        self.nodes.truncate(self.current + 1);
        self.nodes.push(Node { record, cursor });
        self.current = self.nodes.len() - 1;
        trace!(target: "state.history", depth = self.current, "push");
    }

    /// Equivalent to `push(Record::Break, cursor)`; named separately to
    /// mirror the source's `set_history_break()` call sites (left/right
    /// motion, search jump, mode change, file load end, save).
    pub fn set_history_break(&mut self, cursor: Position) {
        self.push(Record::Break, cursor);
    }

    /// Index identifying the current position in the timeline, suitable
    /// for comparing against a saved marker to compute `modified`
    /// (spec.md §3: `modified ⇔ history ≠ last_save_history`).
    pub fn position(&self) -> usize {
        self.current
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.nodes.len()
    }

    /// Undo the most recently completed unit of edits: skip the boundary
    /// marker `current` may be resting on, then walk backward inverting
    /// every record until the previous boundary, leaving `current`
    /// parked on that boundary (ready for the next undo/redo call).
    pub fn undo_to_breakpoint(&mut self, doc: &mut Document) -> Option<(Position, ChangeCounts)> {
        if !self.can_undo() {
            return None;
        }
        if self.current_record().is_boundary() {
            self.current -= 1;
        }
        let mut counts = ChangeCounts::default();
        let mut restore_cursor = None;
        while self.current > 0 {
            if self.current_record().is_boundary() {
                break;
            }
            let record = self.nodes[self.current].record.clone();
            restore_cursor = Some(self.nodes[self.current].cursor);
            apply(doc, &record, false, &mut counts);
            self.current -= 1;
        }
        trace!(target: "state.history", depth = self.current, "undo");
        restore_cursor.map(|c| (c, counts))
    }

    /// Redo the unit of edits just ahead of `current`: walk forward
    /// applying records until the next boundary, leaving `current`
    /// parked on that boundary.
    pub fn redo_to_breakpoint(&mut self, doc: &mut Document) -> Option<(Position, ChangeCounts)> {
        if !self.can_redo() {
            return None;
        }
        let mut counts = ChangeCounts::default();
        let mut restore_cursor = None;
        loop {
            if self.current + 1 >= self.nodes.len() {
                break;
            }
            self.current += 1;
            let record = self.nodes[self.current].record.clone();
            if record.is_boundary() {
                break;
            }
            apply(doc, &record, true, &mut counts);
            restore_cursor = Some(self.nodes[self.current].cursor);
        }
        trace!(target: "state.history", depth = self.current, "redo");
        restore_cursor.map(|c| (c, counts))
    }
}

/// Apply `record` to `doc` in the given direction, tallying the change
/// into `counts`. This is the single place both the initial edit path
/// (forward) and undo/redo (either direction) funnel through, so the two
/// can never drift apart (spec.md §8: `apply(undo(apply(e, D))) == apply(e, D)`).
pub fn apply(doc: &mut Document, record: &Record, forward: bool, counts: &mut ChangeCounts) {
    match record {
        Record::Insert { line, offset, cell } => {
            if forward {
                let _ = doc
                    .line_mut(*line)
                    .map(|l| l.insert_cells(*offset, std::slice::from_ref(cell)));
            } else if let Some(l) = doc.line_mut(*line) {
                let _ = l.delete(*offset, 1);
            }
            counts.chars += 1;
        }
        Record::Delete { line, offset, cell } => {
            if forward {
                if let Some(l) = doc.line_mut(*line) {
                    let _ = l.delete(*offset, 1);
                }
            } else if let Some(l) = doc.line_mut(*line) {
                let _ = l.insert_cells(*offset, std::slice::from_ref(cell));
            }
            counts.chars += 1;
        }
        Record::Replace { line, offset, cell, old_cell } => {
            let target = if forward { *cell } else { *old_cell };
            if let Some(l) = doc.line_mut(*line)
                && let Some(c) = l.cell_mut(*offset)
            {
                *c = target;
            }
            counts.chars += 1;
        }
        Record::AddLine { line } => {
            if forward {
                let _ = doc.add_line(*line, Line::new());
            } else {
                let _ = doc.remove_line(*line);
            }
            counts.lines += 1;
        }
        Record::RemoveLine { line, old_contents } => {
            if forward {
                let _ = doc.remove_line(*line);
            } else {
                let _ = doc.add_line(*line, old_contents.clone());
            }
            counts.lines += 1;
        }
        Record::ReplaceLine { line, old_contents, new_contents } => {
            let content = if forward { new_contents.clone() } else { old_contents.clone() };
            let _ = doc.replace_line(*line, content);
            counts.lines += 1;
        }
        Record::SplitLine { line, split_col } => {
            if forward {
                let _ = doc.split_line(*line, *split_col);
            } else {
                let _ = doc.merge_lines(*line);
            }
            counts.lines += 1;
        }
        Record::MergeLines { line, split_col } => {
            if forward {
                let _ = doc.merge_lines(*line);
            } else {
                let _ = doc.split_line(*line, *split_col);
            }
            counts.lines += 1;
        }
        Record::Break | Record::Sentinel => {}
    }
    doc.clamp_cursor();
}
