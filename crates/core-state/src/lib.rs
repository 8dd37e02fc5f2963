//! Editor state: the buffer collection, undo history, registers, and
//! ancillary UI-adjacent state (command line, ephemeral status, overlay).
//!
//! Text storage and motion live in `core-text`; this crate is what turns
//! a bare `Document` into something a modal editor can operate, undo, and
//! report on. `core-model` layers split-view geometry on top of the
//! `EditorState` this crate defines.

pub mod error;
pub mod history;
pub mod yank;

pub use error::EditorError;
pub use history::{ChangeCounts, History, Record};
pub use yank::{YankBuffer, YankKind};

use core_text::{Cell, Document, Line, Position};
use tracing::trace;

pub use core_text::Mode;

/// Selection shape: whole lines, an arbitrary character span, or a
/// rectangular column block (`spec.md` §4.6 `COL_SELECTION`/`COL_INSERT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Characterwise,
    Linewise,
    Blockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSpan {
    pub start: Position,
    pub end: Position,
    pub kind: SelectionKind,
}

impl SelectionSpan {
    /// Construct a new span, normalizing ordering so that `start <= end`.
    pub fn new(mut a: Position, mut b: Position, kind: SelectionKind) -> Self {
        if Self::greater(&a, &b) {
            std::mem::swap(&mut a, &mut b);
        }
        Self { start: a, end: b, kind }
    }

    /// Construct a span preserving the supplied ordering (used when a
    /// persistent anchor must remain `start` even if it sorts after the
    /// cursor). Caller guarantees invariants.
    pub fn anchored(anchor: Position, other: Position, kind: SelectionKind) -> Self {
        Self { start: anchor, end: other, kind }
    }

    fn greater(a: &Position, b: &Position) -> bool {
        a.line > b.line || (a.line == b.line && a.cell > b.cell)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Collect the cells covered by this span from `doc`. Linewise spans
    /// include every cell of every covered line (including the last);
    /// characterwise spans include the endpoint cell under `end` too,
    /// matching the inclusive-both-ends convention of a visual selection.
    pub fn collect_cells(&self, doc: &Document) -> Vec<Line> {
        match self.kind {
            SelectionKind::Linewise => (self.start.line..=self.end.line)
                .filter_map(|l| doc.line(l).cloned())
                .collect(),
            SelectionKind::Characterwise => {
                if self.start.line == self.end.line {
                    let Some(line) = doc.line(self.start.line) else {
                        return Vec::new();
                    };
                    let end = (self.end.cell + 1).min(line.len());
                    let mut out = Line::new();
                    if end > self.start.cell {
                        let _ = out.insert_cells(0, &line.cells()[self.start.cell..end]);
                    }
                    vec![out]
                } else {
                    let mut out = Vec::new();
                    for l in self.start.line..=self.end.line {
                        let Some(line) = doc.line(l) else { continue };
                        let mut piece = Line::new();
                        let cells = if l == self.start.line {
                            &line.cells()[self.start.cell.min(line.len())..]
                        } else if l == self.end.line {
                            &line.cells()[..(self.end.cell + 1).min(line.len())]
                        } else {
                            line.cells()
                        };
                        let _ = piece.insert_cells(0, cells);
                        out.push(piece);
                    }
                    out
                }
            }
            SelectionKind::Blockwise => {
                let lo = self.start.cell.min(self.end.cell);
                let hi = self.start.cell.max(self.end.cell);
                (self.start.line..=self.end.line)
                    .filter_map(|l| {
                        let line = doc.line(l)?;
                        let end = (hi + 1).min(line.len());
                        let mut piece = Line::new();
                        if end > lo && lo < line.len() {
                            let _ = piece.insert_cells(0, &line.cells()[lo..end]);
                        }
                        Some(piece)
                    })
                    .collect()
            }
        }
    }
}

/// Persistent (optionally empty) selection model, driving the highlight
/// overlay in the render layer and the span operators act on.
#[derive(Debug, Default, Clone)]
pub struct SelectionModel {
    pub active: Option<SelectionSpan>,
    pub anchor: Option<Position>,
}

impl SelectionModel {
    pub fn clear(&mut self) {
        self.active = None;
        self.anchor = None;
    }
    pub fn set(&mut self, span: SelectionSpan) {
        self.active = Some(span);
    }
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

/// Registers: the unnamed register, a 10-slot numbered ring (newest at
/// index 0), and named registers `a`-`z` (uppercase append).
#[derive(Debug, Default, Clone)]
pub struct Registers {
    pub unnamed: String,
    numbered: Vec<String>,
    named: [String; 26],
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OperatorMetricsSnapshot {
    pub operator_delete: u64,
    pub operator_yank: u64,
    pub operator_change: u64,
    pub register_writes: u64,
    pub numbered_ring_rotations: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteSource {
    Unnamed,
    Numbered(usize),
    Named(char),
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteError {
    OutOfRange,
    Empty,
}

#[derive(Debug, Default, Clone)]
pub struct OperatorMetrics {
    operator_delete: u64,
    operator_yank: u64,
    operator_change: u64,
    register_writes: u64,
    numbered_ring_rotations: u64,
}

impl OperatorMetrics {
    pub fn snapshot(&self) -> OperatorMetricsSnapshot {
        OperatorMetricsSnapshot {
            operator_delete: self.operator_delete,
            operator_yank: self.operator_yank,
            operator_change: self.operator_change,
            register_writes: self.register_writes,
            numbered_ring_rotations: self.numbered_ring_rotations,
        }
    }
    pub fn incr_delete(&mut self) {
        self.operator_delete += 1;
    }
    pub fn incr_yank(&mut self) {
        self.operator_yank += 1;
    }
    pub fn incr_change(&mut self) {
        self.operator_change += 1;
    }
    pub fn note_register_write(&mut self, rotated: bool) {
        self.register_writes += 1;
        if rotated {
            self.numbered_ring_rotations += 1;
        }
    }
}

/// Facade concentrating register mutation + metrics bookkeeping so
/// callers don't reach into `EditorState` for ad-hoc field writes.
pub struct RegistersFacade<'state> {
    registers: &'state mut Registers,
    metrics: &'state mut OperatorMetrics,
}

impl<'state> RegistersFacade<'state> {
    pub fn new(registers: &'state mut Registers, metrics: &'state mut OperatorMetrics) -> Self {
        Self { registers, metrics }
    }

    pub fn write_delete<S: Into<String>>(&mut self, payload: S, target: Option<char>) {
        self.metrics.incr_delete();
        let text = payload.into();
        if let Some(named) = target.filter(|c| c.is_ascii_alphabetic()) {
            self.registers.record_delete_named(named, text, self.metrics);
        } else {
            self.registers.record_delete(text, self.metrics);
        }
    }

    pub fn write_yank<S: Into<String>>(&mut self, payload: S, target: Option<char>) {
        self.metrics.incr_yank();
        let text = payload.into();
        if let Some(named) = target.filter(|c| c.is_ascii_alphabetic()) {
            self.registers.record_yank_named(named, text, self.metrics);
        } else {
            self.registers.record_yank(text, self.metrics);
        }
    }

    pub fn write_change<S: Into<String>>(&mut self, payload: S, target: Option<char>) {
        self.metrics.incr_change();
        let text = payload.into();
        if let Some(named) = target.filter(|c| c.is_ascii_alphabetic()) {
            self.registers.record_delete_named(named, text, self.metrics);
        } else {
            self.registers.record_delete(text, self.metrics);
        }
    }

    pub fn read_paste(&self, source: PasteSource) -> Result<String, PasteError> {
        let registers: &Registers = self.registers;
        match source {
            PasteSource::Unnamed => {
                if registers.unnamed.is_empty() {
                    Err(PasteError::Empty)
                } else {
                    Ok(registers.unnamed.clone())
                }
            }
            PasteSource::Numbered(idx) => {
                let entry = registers.numbered.get(idx).ok_or(PasteError::OutOfRange)?;
                if entry.is_empty() { Err(PasteError::Empty) } else { Ok(entry.clone()) }
            }
            PasteSource::Named(c) => {
                let slot = c.to_ascii_lowercase();
                if !slot.is_ascii_lowercase() {
                    return Err(PasteError::OutOfRange);
                }
                let entry = &registers.named[(slot as u8 - b'a') as usize];
                if entry.is_empty() { Err(PasteError::Empty) } else { Ok(entry.clone()) }
            }
            PasteSource::System => Err(PasteError::Empty),
        }
    }
}

impl Registers {
    pub const MAX: usize = 10;

    pub fn new() -> Self {
        Self { unnamed: String::new(), numbered: Vec::new(), named: std::array::from_fn(|_| String::new()) }
    }

    pub fn record_yank<S: Into<String>>(&mut self, text: S, metrics: &mut OperatorMetrics) {
        let s = text.into();
        self.unnamed = s.clone();
        let rotated = self.unshift_numbered(s);
        metrics.note_register_write(rotated);
    }

    pub fn record_delete<S: Into<String>>(&mut self, text: S, metrics: &mut OperatorMetrics) {
        let s = text.into();
        self.unnamed = s.clone();
        let rotated = self.unshift_numbered(s);
        metrics.note_register_write(rotated);
    }

    pub fn numbered(&self) -> &[String] {
        &self.numbered
    }

    fn unshift_numbered(&mut self, s: String) -> bool {
        let rotated = self.numbered.len() == Self::MAX;
        if rotated {
            self.numbered.pop();
        }
        self.numbered.insert(0, s);
        rotated
    }

    fn named_index(c: char) -> Option<usize> {
        c.is_ascii_alphabetic().then(|| (c.to_ascii_lowercase() as u8 - b'a') as usize)
    }

    pub fn get_named(&self, c: char) -> Option<&str> {
        Self::named_index(c).map(|i| self.named[i].as_str())
    }

    pub fn named_snapshot(&self) -> Vec<(char, &str)> {
        self.named
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_empty())
            .map(|(i, s)| ((b'a' + i as u8) as char, s.as_str()))
            .collect()
    }

    pub fn record_yank_named<S: Into<String>>(&mut self, c: char, text: S, metrics: &mut OperatorMetrics) {
        let Some(idx) = Self::named_index(c) else { return };
        let mut payload = text.into();
        let append = c.is_ascii_uppercase();
        if append && !self.named[idx].is_empty() {
            self.named[idx].push_str(&payload);
            payload = self.named[idx].clone();
        } else {
            self.named[idx] = payload.clone();
        }
        self.unnamed = payload.clone();
        let rotated = self.unshift_numbered(payload);
        metrics.note_register_write(rotated);
    }

    pub fn record_delete_named<S: Into<String>>(&mut self, c: char, text: S, metrics: &mut OperatorMetrics) {
        self.record_yank_named(c, text, metrics);
    }
}

/// Optional diagnostic overlay shown above the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    None,
    Metrics {
        lines: u16,
    },
}

pub const METRICS_OVERLAY_DEFAULT_LINES: u16 = 2;

/// Lightweight, non-atomic copies of render path metrics, mirrored here
/// so commands can surface snapshot data without `core-state` depending
/// on `core-render` (which depends on `core-state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderPathSnapshotLite {
    pub full_frames: u64,
    pub partial_frames: u64,
    pub cursor_only_frames: u64,
    pub lines_frames: u64,
    pub dirty_lines_repainted: u64,
    pub last_full_render_ns: u64,
    pub last_partial_render_ns: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderDeltaSnapshotLite {
    pub full: u64,
    pub lines: u64,
    pub scroll: u64,
    pub status_line: u64,
    pub cursor_only: u64,
}

/// Minimal command-line state: the raw buffer including its leading `:`
/// or `/` prefix while active.
#[derive(Debug, Default, Clone)]
pub struct CommandLineState {
    buf: String,
}

impl CommandLineState {
    pub fn is_active(&self) -> bool {
        !self.buf.is_empty()
    }
    pub fn buffer(&self) -> &str {
        &self.buf
    }
    pub fn clear(&mut self) {
        self.buf.clear();
    }
    pub fn begin(&mut self, prefix: char) {
        self.buf.clear();
        self.buf.push(prefix);
    }
    pub fn push_char(&mut self, ch: char) {
        if self.buf.is_empty() {
            self.buf.push(':');
        }
        self.buf.push(ch);
    }
    pub fn backspace(&mut self) {
        if self.buf.len() > 1 {
            self.buf.pop();
        } else {
            self.buf.clear();
        }
    }
}

/// Tracks an in-progress `COL_INSERT` broadcast (`spec.md` §8 scenario 6):
/// the rectangular block entered from `COL_SELECTION`, and the text typed
/// at `col` on the anchor line so it can be replayed onto every other line
/// in the block once `Esc` leaves the mode.
#[derive(Debug, Clone)]
pub struct ColInsertState {
    pub first_line: usize,
    pub last_line: usize,
    pub col: usize,
    pub typed: String,
}

/// Entries listed while `DIRECTORY_BROWSE` is active, plus the currently
/// highlighted row.
#[derive(Debug, Clone, Default)]
pub struct DirectoryBrowseState {
    pub dir: std::path::PathBuf,
    pub entries: Vec<std::path::PathBuf>,
    pub selected: usize,
}

#[derive(Debug, Clone)]
pub struct EphemeralMessage {
    pub text: String,
    pub expires_at: std::time::Instant,
}

/// Line ending style detected from a loaded file, including the lone-CR
/// "classic Mac" convention `core_text::LineEnding` doesn't model (that
/// type only distinguishes LF/CRLF, the two conventions a document can be
/// *saved* with; CR-only files are normalized to LF on load here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedLineEnding {
    Lf,
    Cr,
    CrLf,
}

pub struct NormalizedText {
    pub normalized: String,
    pub original: DetectedLineEnding,
    pub had_trailing_newline: bool,
    pub mixed: bool,
}

/// Detect and normalize line endings of `input` to LF-only. Counts CRLF,
/// LF, and solitary CR occurrences; picks the majority (ties resolved by
/// precedence CRLF > LF > CR). `mixed` is true when more than one style
/// is present and at least one count differs from the majority.
pub fn normalize_line_endings(input: &str) -> NormalizedText {
    let bytes = input.as_bytes();
    let mut i = 0usize;
    let (mut crlf, mut lf, mut cr) = (0usize, 0usize, 0usize);
    while i < bytes.len() {
        match bytes[i] {
            b'\r' if i + 1 < bytes.len() && bytes[i + 1] == b'\n' => {
                crlf += 1;
                i += 2;
            }
            b'\r' => {
                cr += 1;
                i += 1;
            }
            b'\n' => {
                lf += 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    let had_trailing_newline =
        !input.is_empty() && (input.ends_with("\r\n") || input.ends_with('\n') || input.ends_with('\r'));
    let mut original = DetectedLineEnding::Lf;
    let mut max = 0usize;
    for (style, count) in [(DetectedLineEnding::CrLf, crlf), (DetectedLineEnding::Lf, lf), (DetectedLineEnding::Cr, cr)]
    {
        if count > max {
            max = count;
            original = style;
        }
    }
    let non_zero = [crlf, lf, cr].iter().filter(|c| **c > 0).count();
    let mixed = non_zero > 1 && [crlf, lf, cr].iter().any(|c| *c > 0 && *c != max);
    if crlf == 0 && cr == 0 {
        return NormalizedText { normalized: input.to_string(), original, had_trailing_newline, mixed };
    }
    let mut out = String::with_capacity(input.len());
    let mut seg_start = 0usize;
    let mut j = 0usize;
    while j < bytes.len() {
        if bytes[j] == b'\r' {
            if seg_start < j {
                out.push_str(&input[seg_start..j]);
            }
            out.push('\n');
            j += if j + 1 < bytes.len() && bytes[j + 1] == b'\n' { 2 } else { 1 };
            seg_start = j;
        } else {
            j += 1;
        }
    }
    if seg_start < input.len() {
        out.push_str(&input[seg_start..]);
    }
    NormalizedText { normalized: out, original, had_trailing_newline, mixed }
}

/// One open document paired with its own undo timeline and save marker.
pub struct BufferSlot {
    pub document: Document,
    pub history: History,
    /// `history.position()` at the time of the last save; `modified` is
    /// derived by comparing against this rather than tracked separately
    /// (spec.md §3: `modified ⇔ history ≠ last_save_history`).
    pub last_save_history: usize,
    /// Absolute path this buffer was loaded from / last saved to, if any.
    pub file_name: Option<std::path::PathBuf>,
    /// Line ending style detected at load time, re-applied on save so a
    /// CRLF file round-trips CRLF (spec.md §6 "Saved file").
    pub original_line_ending: DetectedLineEnding,
    pub had_trailing_newline: bool,
}

impl BufferSlot {
    pub fn new(document: Document) -> Self {
        BufferSlot {
            document,
            history: History::new(),
            last_save_history: 0,
            file_name: None,
            original_line_ending: DetectedLineEnding::Lf,
            had_trailing_newline: true,
        }
    }

    pub fn modified(&self) -> bool {
        self.history.position() != self.last_save_history
    }

    pub fn mark_saved(&mut self) {
        self.last_save_history = self.history.position();
    }
}

/// Top-level editor state: the open buffer collection plus everything
/// that isn't part of a single document (registers, command line,
/// ephemeral status, overlay, the shared yank buffer).
pub struct EditorState {
    pub buffers: Vec<BufferSlot>,
    pub active: usize,
    pub last_text_height: usize,
    pub command_line: CommandLineState,
    pub ephemeral_status: Option<EphemeralMessage>,
    pub registers: Registers,
    pub operator_metrics: OperatorMetrics,
    pub yank: YankBuffer,
    pub last_render_path: Option<RenderPathSnapshotLite>,
    pub last_render_delta: Option<RenderDeltaSnapshotLite>,
    pub selection: SelectionModel,
    pub overlay_mode: OverlayMode,
    /// Desired top/bottom scroll margin in rows, applied by
    /// `core-model`'s auto-scroll; configurable via `core-config`.
    pub config_vertical_margin: usize,
    /// Live while `COL_INSERT` is active; `None` the rest of the time.
    pub col_insert: Option<ColInsertState>,
}

impl EditorState {
    pub fn new(document: Document) -> Self {
        Self {
            buffers: vec![BufferSlot::new(document)],
            active: 0,
            last_text_height: 0,
            command_line: CommandLineState::default(),
            ephemeral_status: None,
            registers: Registers::new(),
            operator_metrics: OperatorMetrics::default(),
            yank: YankBuffer::empty(),
            last_render_path: None,
            last_render_delta: None,
            selection: SelectionModel::default(),
            overlay_mode: OverlayMode::default(),
            config_vertical_margin: 2,
            col_insert: None,
        }
    }

    pub fn set_ephemeral<S: Into<String>>(&mut self, msg: S, ttl: std::time::Duration) {
        self.ephemeral_status = Some(EphemeralMessage { text: msg.into(), expires_at: std::time::Instant::now() + ttl });
    }

    pub fn tick_ephemeral(&mut self) -> bool {
        if let Some(m) = &self.ephemeral_status
            && std::time::Instant::now() >= m.expires_at
        {
            self.ephemeral_status = None;
            return true;
        }
        false
    }

    pub fn set_last_text_height(&mut self, h: usize) {
        self.last_text_height = h;
    }

    pub fn active_slot(&self) -> &BufferSlot {
        &self.buffers[self.active]
    }
    pub fn active_slot_mut(&mut self) -> &mut BufferSlot {
        &mut self.buffers[self.active]
    }
    pub fn document(&self) -> &Document {
        &self.buffers[self.active].document
    }
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.buffers[self.active].document
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }
    pub fn operator_metrics_mut(&mut self) -> &mut OperatorMetrics {
        &mut self.operator_metrics
    }
    pub fn operator_metrics_snapshot(&self) -> OperatorMetricsSnapshot {
        self.operator_metrics.snapshot()
    }
    pub fn registers_facade(&mut self) -> RegistersFacade<'_> {
        RegistersFacade::new(&mut self.registers, &mut self.operator_metrics)
    }

    pub fn selection(&self) -> Option<SelectionSpan> {
        self.selection.active
    }
    pub fn selection_mut(&mut self) -> &mut SelectionModel {
        &mut self.selection
    }
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn overlay_mode(&self) -> OverlayMode {
        self.overlay_mode
    }
    pub fn set_overlay_mode(&mut self, mode: OverlayMode) {
        self.overlay_mode = mode;
    }
    pub fn toggle_metrics_overlay(&mut self, default_lines: u16) -> OverlayMode {
        self.overlay_mode = match self.overlay_mode {
            OverlayMode::None => OverlayMode::Metrics { lines: default_lines },
            OverlayMode::Metrics { .. } => OverlayMode::None,
        };
        self.overlay_mode
    }

    /// Insert `ch` at the cursor, recording an undoable [`Record::Insert`].
    pub fn insert_char(&mut self, ch: char) {
        let cursor = self.document().cursor;
        let line_no = cursor.line;
        let offset = cursor.cell;
        let slot = self.active_slot_mut();
        let Some(line) = slot.document.line_mut(line_no) else { return };
        if line.insert(offset, ch).is_err() {
            return;
        }
        let cell = slot.document.line(line_no).and_then(|l| l.cell(offset)).unwrap_or(Cell::from_char(ch));
        slot.history.push(Record::Insert { line: line_no, offset, cell }, cursor);
        slot.document.cursor.cell = offset + 1;
        slot.document.sync_preferred_column();
        trace!(target: "state.edit", line = line_no, offset, "insert_char");
    }

    /// Delete the cell before the cursor (backspace). No-op at column 0
    /// on the first line; merges with the previous line otherwise is the
    /// caller's responsibility (dispatcher decides backspace-at-bol policy).
    pub fn delete_char_before(&mut self) -> bool {
        let cursor = self.document().cursor;
        if cursor.cell == 0 {
            return false;
        }
        let offset = cursor.cell - 1;
        let line_no = cursor.line;
        let slot = self.active_slot_mut();
        let Some(line) = slot.document.line_mut(line_no) else { return false };
        let Some(cell) = line.cell(offset) else { return false };
        if line.delete(offset, 1).is_err() {
            return false;
        }
        slot.history.push(Record::Delete { line: line_no, offset, cell }, cursor);
        slot.document.cursor.cell = offset;
        slot.document.sync_preferred_column();
        true
    }

    /// Delete the cell under the cursor (`x`).
    pub fn delete_char_at(&mut self) -> bool {
        let cursor = self.document().cursor;
        let line_no = cursor.line;
        let offset = cursor.cell;
        let slot = self.active_slot_mut();
        let Some(line) = slot.document.line_mut(line_no) else { return false };
        let Some(cell) = line.cell(offset) else { return false };
        if line.delete(offset, 1).is_err() {
            return false;
        }
        slot.history.push(Record::Delete { line: line_no, offset, cell }, cursor);
        slot.document.clamp_cursor();
        true
    }

    /// Replace the cell under the cursor with `ch` (`r`).
    pub fn replace_char(&mut self, ch: char) -> bool {
        let cursor = self.document().cursor;
        let line_no = cursor.line;
        let offset = cursor.cell;
        let slot = self.active_slot_mut();
        let Some(line) = slot.document.line_mut(line_no) else { return false };
        let Some(old_cell) = line.cell(offset) else { return false };
        let Some(cell_ref) = line.cell_mut(offset) else { return false };
        let new_cell = Cell::from_char(ch);
        *cell_ref = new_cell;
        slot.history.push(Record::Replace { line: line_no, offset, cell: new_cell, old_cell }, cursor);
        true
    }

    /// Split the current line at the cursor (Enter in insert mode).
    pub fn split_line_at_cursor(&mut self) {
        let cursor = self.document().cursor;
        let line_no = cursor.line;
        let split_col = cursor.cell;
        let slot = self.active_slot_mut();
        let Ok(tail_idx) = slot.document.split_line(line_no, split_col) else { return };
        slot.history.push(Record::SplitLine { line: line_no, split_col }, cursor);
        slot.document.cursor = Position::new(tail_idx, 0);
        slot.document.sync_preferred_column();
    }

    /// Merge the current line with the next (`J`, or backspace at column 0).
    pub fn merge_current_with_next(&mut self) -> bool {
        let cursor = self.document().cursor;
        let line_no = cursor.line;
        let slot = self.active_slot_mut();
        let Some(line) = slot.document.line(line_no) else { return false };
        let split_col = line.len();
        let Ok(join_at) = slot.document.merge_lines(line_no) else { return false };
        slot.history.push(Record::MergeLines { line: line_no, split_col }, cursor);
        slot.document.cursor = Position::new(line_no, join_at);
        slot.document.sync_preferred_column();
        true
    }

    /// Remove the current line entirely (`dd`), yanking it line-wise first.
    pub fn remove_current_line(&mut self) {
        let cursor = self.document().cursor;
        let line_no = cursor.line;
        let slot = self.active_slot_mut();
        let Some(removed) = slot.document.line(line_no).cloned() else { return };
        self.yank.set_lines(vec![removed.clone()]);
        let text = format!("{}\n", removed.to_string_lossy());
        self.registers_facade().write_delete(text, None);
        let slot = self.active_slot_mut();
        if slot.document.remove_line(line_no).is_ok() {
            slot.history.push(Record::RemoveLine { line: line_no, old_contents: removed }, cursor);
            slot.document.clamp_cursor();
        }
    }

    /// Insert a boundary between undo units (Esc, motion, mode change,
    /// search jump, load end, save — per spec.md §4.3's call sites).
    pub fn set_history_break(&mut self) {
        let cursor = self.document().cursor;
        self.active_slot_mut().history.set_history_break(cursor);
    }

    pub fn undo(&mut self) -> Option<ChangeCounts> {
        let slot = self.active_slot_mut();
        let (cursor, counts) = slot.history.undo_to_breakpoint(&mut slot.document)?;
        slot.document.cursor = cursor;
        slot.document.clamp_cursor();
        Some(counts)
    }

    pub fn redo(&mut self) -> Option<ChangeCounts> {
        let slot = self.active_slot_mut();
        let (cursor, counts) = slot.history.redo_to_breakpoint(&mut slot.document)?;
        slot.document.cursor = cursor;
        slot.document.clamp_cursor();
        Some(counts)
    }

    /// Paste the unnamed register's text before/after the cursor
    /// (`p`/`P`). Multi-line payloads are inserted as whole lines;
    /// single-line payloads are spliced into the current line.
    pub fn paste(&mut self, source: PasteSource, before: bool) -> Result<bool, PasteError> {
        let text = self.registers_facade().read_paste(source)?;
        let structural = text.contains('\n');
        let cursor = self.document().cursor;
        if !structural {
            let line_no = cursor.line;
            let offset = if before { cursor.cell } else { (cursor.cell + 1).min(self.document().line(line_no).map_or(0, |l| l.len())) };
            let slot = self.active_slot_mut();
            for (i, ch) in text.chars().enumerate() {
                let at = offset + i;
                let Some(line) = slot.document.line_mut(line_no) else { break };
                if line.insert(at, ch).is_err() {
                    break;
                }
                let cell = slot.document.line(line_no).and_then(|l| l.cell(at)).unwrap_or(Cell::from_char(ch));
                slot.history.push(Record::Insert { line: line_no, offset: at, cell }, cursor);
            }
            slot.document.cursor = Position::new(line_no, offset + text.chars().count().saturating_sub(1));
            slot.document.sync_preferred_column();
            slot.history.set_history_break(slot.document.cursor);
        } else {
            let mut at = if before { cursor.line } else { cursor.line + 1 };
            let slot = self.active_slot_mut();
            for raw in text.split_inclusive('\n') {
                let content = raw.strip_suffix('\n').unwrap_or(raw);
                let line = Line::from_str(content);
                if slot.document.add_line(at, line).is_ok() {
                    slot.history.push(Record::AddLine { line: at }, cursor);
                    at += 1;
                }
            }
            slot.document.cursor = Position::new(if before { cursor.line } else { cursor.line + 1 }, 0);
            slot.history.set_history_break(slot.document.cursor);
        }
        Ok(structural)
    }

    /// Delete every cell covered by `span` (operator/visual delete target),
    /// returning the removed text and whether the document's line count
    /// changed (callers use this to decide between a partial and a full
    /// render, mirroring the `structural` flag `paste` already reports).
    pub fn delete_span(&mut self, span: SelectionSpan) -> (String, bool) {
        match span.kind {
            SelectionKind::Linewise => self.delete_lines_span(span.start.line, span.end.line),
            SelectionKind::Characterwise => {
                if span.start.line == span.end.line {
                    let text =
                        self.delete_chars_same_line(span.start.line, span.start.cell, span.end.cell);
                    (text, false)
                } else {
                    self.delete_chars_span(span)
                }
            }
            SelectionKind::Blockwise => self.delete_block_span(span),
        }
    }

    /// Remove lines `first..=last` wholesale, pushing one `RemoveLine` per
    /// line removed at the constant index `first` (every removal shifts
    /// the next line up into that slot, so undo replays them in order).
    fn delete_lines_span(&mut self, first: usize, last: usize) -> (String, bool) {
        let cursor = self.document().cursor;
        let count = last.saturating_sub(first) + 1;
        let mut removed = String::new();
        for _ in 0..count {
            let slot = self.active_slot_mut();
            if first >= slot.document.line_count() {
                break;
            }
            let Ok(old) = slot.document.remove_line(first) else { break };
            removed.push_str(&old.to_string_lossy());
            removed.push('\n');
            slot.history
                .push(Record::RemoveLine { line: first, old_contents: old }, cursor);
        }
        let slot = self.active_slot_mut();
        let last_line = slot.document.line_count().saturating_sub(1);
        slot.document.cursor = Position::new(first.min(last_line), 0);
        slot.document.clamp_cursor();
        (removed, true)
    }

    /// Delete cells `[start_cell, end_cell]` (inclusive) from a single
    /// line, one cell at a time at the constant offset `start_cell` (each
    /// deletion shifts the next cell into that slot).
    fn delete_chars_same_line(&mut self, line_no: usize, start_cell: usize, end_cell: usize) -> String {
        let cursor = self.document().cursor;
        let count = end_cell.saturating_sub(start_cell) + 1;
        let mut removed = String::new();
        let slot = self.active_slot_mut();
        for _ in 0..count {
            let Some(line) = slot.document.line_mut(line_no) else { break };
            if start_cell >= line.len() {
                break;
            }
            let Some(cell) = line.cell(start_cell) else { break };
            if line.delete(start_cell, 1).is_err() {
                break;
            }
            removed.push(cell.ch().unwrap_or(' '));
            slot.history
                .push(Record::Delete { line: line_no, offset: start_cell, cell }, cursor);
        }
        slot.document.cursor = Position::new(line_no, start_cell);
        slot.document.clamp_cursor();
        removed
    }

    /// Delete a characterwise span crossing two or more lines: trim the
    /// tail of the first line, drop every fully-covered interior line,
    /// trim the head of the last line, then merge what remains of the
    /// last line back onto the first.
    fn delete_chars_span(&mut self, span: SelectionSpan) -> (String, bool) {
        let cursor = self.document().cursor;
        let first = span.start.line;
        let last = span.end.line;
        let removed = span
            .collect_cells(self.document())
            .iter()
            .map(|l| l.to_string_lossy())
            .collect::<Vec<_>>()
            .join("\n");

        let tail_start = {
            let slot = self.active_slot_mut();
            match slot.document.line_mut(first) {
                Some(line) => {
                    let len = line.len();
                    let start = span.start.cell.min(len);
                    if let Ok(cells) = line.delete(start, len - start) {
                        for cell in cells {
                            slot.history
                                .push(Record::Delete { line: first, offset: start, cell }, cursor);
                        }
                    }
                    start
                }
                None => 0,
            }
        };

        for _ in 0..last.saturating_sub(first + 1) {
            let slot = self.active_slot_mut();
            if first + 1 >= slot.document.line_count() {
                break;
            }
            let Ok(old) = slot.document.remove_line(first + 1) else { break };
            slot.history
                .push(Record::RemoveLine { line: first + 1, old_contents: old }, cursor);
        }

        {
            let slot = self.active_slot_mut();
            if let Some(line) = slot.document.line_mut(first + 1) {
                let end = (span.end.cell + 1).min(line.len());
                if end > 0
                    && let Ok(cells) = line.delete(0, end)
                {
                    for cell in cells {
                        slot.history
                            .push(Record::Delete { line: first + 1, offset: 0, cell }, cursor);
                    }
                }
            }
        }

        {
            let slot = self.active_slot_mut();
            if first + 1 < slot.document.line_count() && slot.document.merge_lines(first).is_ok() {
                slot.history
                    .push(Record::MergeLines { line: first, split_col: tail_start }, cursor);
            }
        }

        let slot = self.active_slot_mut();
        slot.document.cursor = Position::new(first, tail_start);
        slot.document.clamp_cursor();
        (removed, true)
    }

    /// Delete the rectangular cell range `[lo, hi]` from every line in
    /// the span, line by line; never changes the line count.
    fn delete_block_span(&mut self, span: SelectionSpan) -> (String, bool) {
        let cursor = self.document().cursor;
        let lo = span.start.cell.min(span.end.cell);
        let hi = span.start.cell.max(span.end.cell);
        let mut removed = Vec::new();
        for line_no in span.start.line..=span.end.line {
            let slot = self.active_slot_mut();
            let Some(line) = slot.document.line_mut(line_no) else { continue };
            let len = line.len();
            if lo >= len {
                removed.push(String::new());
                continue;
            }
            let end = (hi + 1).min(len);
            let Ok(cells) = line.delete(lo, end - lo) else { continue };
            for cell in &cells {
                slot.history
                    .push(Record::Delete { line: line_no, offset: lo, cell: *cell }, cursor);
            }
            removed.push(cells.iter().filter_map(|c| c.ch()).collect::<String>());
        }
        let slot = self.active_slot_mut();
        slot.document.cursor = Position::new(span.start.line, lo);
        slot.document.clamp_cursor();
        (removed.join("\n"), false)
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
    fn insert_and_undo_restores_text() {
        // spec.md §8 scenario 1.
        let mut st = state("hello");
        st.document_mut().cursor = Position::new(0, 5);
        for ch in '!'.to_string().chars() {
            st.insert_char(ch);
        }
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "hello!");
        st.set_history_break();
        assert!(st.undo().is_some());
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "hello");
    }

    #[test]
    fn split_line_and_undo() {
        // spec.md §8 scenario 2.
        let mut st = state("abcdef");
        st.document_mut().cursor = Position::new(0, 3);
        st.split_line_at_cursor();
        st.set_history_break();
        assert_eq!(st.document().line_count(), 2);
        assert!(st.undo().is_some());
        assert_eq!(st.document().line_count(), 1);
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "abcdef");
    }

    #[test]
    fn delete_line_then_paste_line_yank() {
        // spec.md §8 scenario 5 (line-yank paste).
        let mut st = state("one\ntwo\nthree");
        st.document_mut().cursor = Position::new(1, 0);
        st.remove_current_line();
        assert_eq!(st.document().line_count(), 2);
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "one");

        st.document_mut().cursor = Position::new(0, 0);
        let structural = st.paste(PasteSource::Unnamed, false).unwrap();
        assert!(structural);
        assert_eq!(st.document().line_count(), 3);
        assert_eq!(st.document().line(1).unwrap().to_string_lossy(), "two");
    }

    #[test]
    fn modified_tracks_history_position() {
        let mut st = state("abc");
        assert!(!st.active_slot().modified());
        st.document_mut().cursor = Position::new(0, 3);
        st.insert_char('!');
        st.set_history_break();
        assert!(st.active_slot().modified());
        st.active_slot_mut().mark_saved();
        assert!(!st.active_slot().modified());
    }

    #[test]
    fn replace_char_records_old_cell_for_undo() {
        let mut st = state("abc");
        st.document_mut().cursor = Position::new(0, 1);
        assert!(st.replace_char('X'));
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "aXc");
        st.set_history_break();
        st.undo();
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "abc");
    }
}

#[cfg(test)]
mod register_tests {
    use super::{OperatorMetrics, Registers};

    #[test]
    fn yank_populates_unnamed_and_ring() {
        let mut r = Registers::new();
        let mut m = OperatorMetrics::default();
        r.record_yank("alpha", &mut m);
        assert_eq!(r.unnamed, "alpha");
        assert_eq!(r.numbered(), &["alpha".to_string()]);
    }

    #[test]
    fn delete_rotates_ring_capped() {
        let mut r = Registers::new();
        let mut m = OperatorMetrics::default();
        for i in 0..12 {
            r.record_delete(format!("d{i}"), &mut m);
        }
        assert_eq!(r.numbered().len(), Registers::MAX);
        assert_eq!(r.numbered()[0], "d11");
        assert_eq!(r.numbered().last().unwrap(), "d2");
    }

    #[test]
    fn named_register_uppercase_append() {
        let mut r = Registers::new();
        let mut m = OperatorMetrics::default();
        r.record_yank_named('a', "foo", &mut m);
        r.record_yank_named('A', "bar", &mut m);
        assert_eq!(r.get_named('a'), Some("foobar"));
        assert_eq!(r.unnamed, "foobar");
    }
}

#[cfg(test)]
mod line_ending_tests {
    use super::*;

    #[test]
    fn normalize_crlf() {
        let n = normalize_line_endings("a\r\nb\r\n");
        assert_eq!(n.normalized, "a\nb\n");
        assert_eq!(n.original, DetectedLineEnding::CrLf);
        assert!(n.had_trailing_newline);
        assert!(!n.mixed);
    }

    #[test]
    fn normalize_mixed_majority() {
        let n = normalize_line_endings("a\r\nb\nc\r\n");
        assert_eq!(n.normalized, "a\nb\nc\n");
        assert_eq!(n.original, DetectedLineEnding::CrLf);
        assert!(n.mixed);
    }

    #[test]
    fn normalize_cr_only() {
        let n = normalize_line_endings("a\rb\r");
        assert_eq!(n.normalized, "a\nb\n");
        assert_eq!(n.original, DetectedLineEnding::Cr);
    }
}


#[cfg(test)]
mod delete_span_tests {
    use super::*;
    use core_text::Document;

    fn state(text: &str) -> EditorState {
        EditorState::new(Document::from_text(text))
    }

    #[test]
    fn characterwise_same_line_delete() {
        let mut st = state("one two three\n");
        let span = SelectionSpan::new(Position::new(0, 0), Position::new(0, 3), SelectionKind::Characterwise);
        let (removed, structural) = st.delete_span(span);
        assert_eq!(removed, "one ");
        assert!(!structural);
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "two three");
        assert_eq!(st.document().cursor, Position::new(0, 0));
    }

    #[test]
    fn characterwise_same_line_delete_undoes() {
        let mut st = state("one two three\n");
        let span = SelectionSpan::new(Position::new(0, 0), Position::new(0, 3), SelectionKind::Characterwise);
        st.delete_span(span);
        st.set_history_break();
        assert!(st.undo().is_some());
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "one two three");
    }

    #[test]
    fn characterwise_multiline_delete_merges_lines() {
        let mut st = state("abc\ndef\nghi\n");
        let span = SelectionSpan::new(Position::new(0, 1), Position::new(2, 1), SelectionKind::Characterwise);
        let (_removed, structural) = st.delete_span(span);
        assert!(structural);
        assert_eq!(st.document().line_count(), 1);
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "ahi");
    }

    #[test]
    fn characterwise_multiline_delete_undoes() {
        let mut st = state("abc\ndef\nghi\n");
        let span = SelectionSpan::new(Position::new(0, 1), Position::new(2, 1), SelectionKind::Characterwise);
        st.delete_span(span);
        st.set_history_break();
        assert!(st.undo().is_some());
        assert_eq!(st.document().line_count(), 3);
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "abc");
        assert_eq!(st.document().line(1).unwrap().to_string_lossy(), "def");
        assert_eq!(st.document().line(2).unwrap().to_string_lossy(), "ghi");
    }

    #[test]
    fn linewise_delete_removes_whole_lines_and_undoes() {
        let mut st = state("l1\nl2\nl3\nl4\n");
        let span = SelectionSpan::new(Position::new(0, 0), Position::new(1, 0), SelectionKind::Linewise);
        let (removed, structural) = st.delete_span(span);
        assert!(structural);
        assert_eq!(removed, "l1\nl2\n");
        assert_eq!(st.document().line_count(), 2);
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "l3");
        st.set_history_break();
        assert!(st.undo().is_some());
        assert_eq!(st.document().line_count(), 4);
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "l1");
        assert_eq!(st.document().line(1).unwrap().to_string_lossy(), "l2");
    }

    #[test]
    fn blockwise_delete_trims_column_range_per_line() {
        let mut st = state("abcdef\nghijkl\n");
        let span = SelectionSpan::new(Position::new(0, 1), Position::new(1, 2), SelectionKind::Blockwise);
        let (removed, structural) = st.delete_span(span);
        assert!(!structural);
        assert_eq!(removed, "bcd\nhij");
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "aef");
        assert_eq!(st.document().line(1).unwrap().to_string_lossy(), "gkl");
    }
}
