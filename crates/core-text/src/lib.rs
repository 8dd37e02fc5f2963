//! Packed-cell line buffer and document model.
//!
//! A [`Cell`] packs a Unicode codepoint, a small flag set and a display
//! width into a single `u32`. A [`Line`] is a growable array of cells plus
//! the syntax carry state left behind by the last highlighter pass. A
//! [`Document`] is an ordered sequence of lines plus cursor/scroll/mode
//! bookkeeping; it does not know how to undo itself — that is
//! `core-state`'s job, which records `core_text::edit` operations as
//! reversible history entries.

use anyhow::{Result, bail};

pub mod motion;
pub mod width;

pub use width::{display_width, is_word_char};

/// Bits used by [`Cell`]'s packed representation: 21 for the codepoint, 7
/// for flags, 4 for display width. `u32` has room to spare; the spec's
/// 32-bit triple is mirrored exactly (21 + 7 + 4 == 32).
const CODEPOINT_BITS: u32 = 21;
const FLAGS_BITS: u32 = 7;
const WIDTH_BITS: u32 = 4;

const CODEPOINT_MASK: u32 = (1 << CODEPOINT_BITS) - 1;
const FLAGS_MASK: u32 = (1 << FLAGS_BITS) - 1;
const WIDTH_MASK: u32 = (1 << WIDTH_BITS) - 1;

const FLAGS_SHIFT: u32 = CODEPOINT_BITS;
const WIDTH_SHIFT: u32 = CODEPOINT_BITS + FLAGS_BITS;

/// Per-line highlight classification. Packed into the low 3 bits of a
/// cell's flag byte; the remaining 4 bits are independent overlay
/// markers (select/search/error/notice) that win the render color
/// priority race regardless of syntax class (see `core-render`'s color
/// selection, which implements SELECT > SEARCH/ERROR/NOTICE > syntax > default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyntaxClass {
    None = 0,
    Comment = 1,
    String = 2,
    Keyword = 3,
    Type = 4,
    Number = 5,
    Pragma = 6,
    Escape = 7,
}

impl SyntaxClass {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => SyntaxClass::None,
            1 => SyntaxClass::Comment,
            2 => SyntaxClass::String,
            3 => SyntaxClass::Keyword,
            4 => SyntaxClass::Type,
            5 => SyntaxClass::Number,
            6 => SyntaxClass::Pragma,
            _ => SyntaxClass::Escape,
        }
    }
}

/// Cell flag overlay bits, occupying bits 3-6 of the flag byte (bits 0-2
/// hold the [`SyntaxClass`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellFlags(u8);

impl CellFlags {
    pub const SELECT: u8 = 1 << 3;
    pub const SEARCH: u8 = 1 << 4;
    pub const ERROR: u8 = 1 << 5;
    pub const NOTICE: u8 = 1 << 6;

    pub fn empty() -> Self {
        CellFlags(0)
    }

    pub fn with_syntax(class: SyntaxClass) -> Self {
        CellFlags(class as u8)
    }

    pub fn syntax_class(self) -> SyntaxClass {
        SyntaxClass::from_bits(self.0)
    }

    pub fn set_syntax(&mut self, class: SyntaxClass) {
        self.0 = (self.0 & !0b111) | (class as u8);
    }

    pub fn is_select(self) -> bool {
        self.0 & Self::SELECT != 0
    }
    pub fn is_search(self) -> bool {
        self.0 & Self::SEARCH != 0
    }
    pub fn is_error(self) -> bool {
        self.0 & Self::ERROR != 0
    }
    pub fn is_notice(self) -> bool {
        self.0 & Self::NOTICE != 0
    }

    pub fn set(&mut self, bit: u8, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    fn bits(self) -> u8 {
        self.0 & (FLAGS_MASK as u8)
    }

    fn from_raw(bits: u8) -> Self {
        CellFlags(bits & (FLAGS_MASK as u8))
    }
}

/// A single codepoint cell: codepoint + flags + display width, packed
/// into a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell(u32);

impl Cell {
    pub fn new(ch: char, flags: CellFlags, width: u8) -> Self {
        let cp = (ch as u32) & CODEPOINT_MASK;
        let f = (flags.bits() as u32) & FLAGS_MASK;
        let w = (width as u32) & WIDTH_MASK;
        Cell(cp | (f << FLAGS_SHIFT) | (w << WIDTH_SHIFT))
    }

    /// Build a cell for `ch`, classifying its display width automatically.
    pub fn from_char(ch: char) -> Self {
        Cell::new(ch, CellFlags::empty(), display_width(ch))
    }

    pub fn codepoint(self) -> u32 {
        self.0 & CODEPOINT_MASK
    }

    /// The codepoint as a `char`, or `None` if the packed value is not a
    /// valid scalar value (should not happen for cells built through
    /// [`Cell::from_char`] or [`Cell::new`], but a corrupted/foreign cell
    /// is handled rather than panicking).
    pub fn ch(self) -> Option<char> {
        char::from_u32(self.codepoint())
    }

    pub fn flags(self) -> CellFlags {
        CellFlags::from_raw(((self.0 >> FLAGS_SHIFT) & FLAGS_MASK) as u8)
    }

    pub fn set_flags(&mut self, flags: CellFlags) {
        self.0 = (self.0 & !(FLAGS_MASK << FLAGS_SHIFT)) | ((flags.bits() as u32) << FLAGS_SHIFT);
    }

    pub fn display_width(self) -> u8 {
        ((self.0 >> WIDTH_SHIFT) & WIDTH_MASK) as u8
    }

    pub fn set_display_width(&mut self, width: u8) {
        self.0 =
            (self.0 & !(WIDTH_MASK << WIDTH_SHIFT)) | (((width as u32) & WIDTH_MASK) << WIDTH_SHIFT);
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::from_char(' ')
    }
}

/// Whether a line needs to be re-diffed against its on-disk/undo
/// revision marker before saving (used by the renderer's gutter to show
/// a modified-line indicator and by history to detect no-op edits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevStatus {
    /// Unchanged since the buffer was loaded or last saved.
    Unchanged,
    /// Modified since load/save.
    Modified,
}

/// A single line: a growable array of cells plus the syntax carry state
/// left by the last `recalculate_syntax` pass over it.
///
/// `istate == -1` means "syntax complete on this line, no continuation
/// state to carry to the next line" (spec's sentinel for the highlighter
/// contract); any other value is an opaque carry state understood only by
/// the highlighter that produced it.
#[derive(Debug, Clone)]
pub struct Line {
    cells: Vec<Cell>,
    pub istate: i32,
    pub is_current: bool,
    pub rev_status: RevStatus,
}

const INITIAL_CAPACITY: usize = 32;

impl Line {
    pub fn new() -> Self {
        Line {
            cells: Vec::with_capacity(INITIAL_CAPACITY),
            istate: -1,
            is_current: false,
            rev_status: RevStatus::Unchanged,
        }
    }

    pub fn from_str(s: &str) -> Self {
        let mut line = Line::new();
        for ch in s.chars() {
            line.cells.push(Cell::from_char(ch));
        }
        line
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, idx: usize) -> Option<Cell> {
        self.cells.get(idx).copied()
    }

    pub fn cell_mut(&mut self, idx: usize) -> Option<&mut Cell> {
        self.cells.get_mut(idx)
    }

    /// Total visual width of the line, i.e. `sum(display_width)`.
    pub fn visual_width(&self) -> usize {
        self.cells.iter().map(|c| c.display_width() as usize).sum()
    }

    pub fn to_string_lossy(&self) -> String {
        self.cells.iter().filter_map(|c| c.ch()).collect()
    }

    /// Ensure spare capacity follows the growth-doubling policy described
    /// in spec.md §4.1: start at 32, double whenever more room is needed.
    fn reserve_for(&mut self, additional: usize) {
        let needed = self.cells.len() + additional;
        if needed <= self.cells.capacity() {
            return;
        }
        let mut cap = self.cells.capacity().max(INITIAL_CAPACITY);
        while cap < needed {
            cap *= 2;
        }
        self.cells.reserve(cap - self.cells.len());
    }

    /// Insert `ch` at cell index `at`. `at == len()` appends.
    pub fn insert(&mut self, at: usize, ch: char) -> Result<()> {
        if at > self.cells.len() {
            bail!("insert index {at} out of bounds (len {})", self.cells.len());
        }
        self.reserve_for(1);
        self.cells.insert(at, Cell::from_char(ch));
        self.rev_status = RevStatus::Modified;
        Ok(())
    }

    /// Insert a run of cells at `at`, preserving their existing flags
    /// (used when replaying yanked/undone cell runs verbatim).
    pub fn insert_cells(&mut self, at: usize, cells: &[Cell]) -> Result<()> {
        if at > self.cells.len() {
            bail!("insert index {at} out of bounds (len {})", self.cells.len());
        }
        self.reserve_for(cells.len());
        self.cells.splice(at..at, cells.iter().copied());
        self.rev_status = RevStatus::Modified;
        Ok(())
    }

    /// Delete `len` cells starting at `at`, returning the removed cells.
    /// A zero-length delete (`len == 0`) is a documented no-op: it
    /// succeeds without mutating the line or marking it modified (spec.md
    /// Open Question, preserved rather than "fixed").
    pub fn delete(&mut self, at: usize, len: usize) -> Result<Vec<Cell>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        if at + len > self.cells.len() {
            bail!(
                "delete range {at}..{} out of bounds (len {})",
                at + len,
                self.cells.len()
            );
        }
        let removed: Vec<Cell> = self.cells.splice(at..at + len, std::iter::empty()).collect();
        self.rev_status = RevStatus::Modified;
        Ok(removed)
    }

    /// Replace `len` cells at `at` with `ch`'s single cell. Used for the
    /// `r` (replace-char) family of actions.
    pub fn replace(&mut self, at: usize, len: usize, ch: char) -> Result<Vec<Cell>> {
        let removed = self.delete(at, len)?;
        self.insert(at, ch)?;
        Ok(removed)
    }

    /// Split the line at cell index `at`, returning the new tail line.
    /// `self` retains cells `[0, at)`.
    pub fn split_at(&mut self, at: usize) -> Result<Line> {
        if at > self.cells.len() {
            bail!("split index {at} out of bounds (len {})", self.cells.len());
        }
        let tail_cells: Vec<Cell> = self.cells.split_off(at);
        self.rev_status = RevStatus::Modified;
        let mut tail = Line::new();
        tail.cells = tail_cells;
        tail.rev_status = RevStatus::Modified;
        Ok(tail)
    }

    /// Append another line's cells onto the end of this one (used by
    /// line-merge edits). Returns the byte offset (cell index) where the
    /// join occurred, so callers can place the cursor there.
    pub fn merge(&mut self, mut other: Line) -> usize {
        let join_at = self.cells.len();
        self.reserve_for(other.cells.len());
        self.cells.append(&mut other.cells);
        self.rev_status = RevStatus::Modified;
        join_at
    }

    /// Recompute which cells are tab-expansion placeholders is not
    /// modeled at the cell level (tabs are stored as single cells with
    /// `display_width` equal to the distance to the next tab stop);
    /// this recomputes every tab cell's width after a `tabstop` change
    /// or an edit earlier in the line shifts column alignment.
    pub fn recompute_tabs(&mut self, tabstop: u8) {
        let mut col = 0usize;
        for cell in self.cells.iter_mut() {
            if cell.ch() == Some('\t') {
                let tabstop = tabstop.max(1) as usize;
                let next_stop = ((col / tabstop) + 1) * tabstop;
                let w = (next_stop - col).min(WIDTH_MASK as usize).max(1) as u8;
                cell.set_display_width(w);
                col = next_stop;
            } else {
                col += cell.display_width() as usize;
            }
        }
    }
}

impl Default for Line {
    fn default() -> Self {
        Line::new()
    }
}

/// Cursor position within a [`Document`]: zero-based line index and
/// zero-based cell index within that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub cell: usize,
}

impl Position {
    pub fn new(line: usize, cell: usize) -> Self {
        Position { line, cell }
    }
}

/// Modal editing mode. Carried here (rather than in `core-state`) because
/// `Document` needs to know whether it is in `Insert`-family modes to
/// apply the "extra cursor cell" convention from spec.md §4.2 (the cursor
/// may rest one cell past the last real cell only while inserting).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Insert,
    Replace,
    LineSelection,
    CharSelection,
    ColSelection,
    ColInsert,
    DirectoryBrowse,
    Command,
    Search,
}

impl Mode {
    pub fn is_insert_like(self) -> bool {
        matches!(self, Mode::Insert | Mode::Replace | Mode::ColInsert)
    }
}

/// Newline convention used when saving a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

/// Ordered sequence of lines plus the cursor/viewport/mode bookkeeping
/// spec.md §3 describes for `Document`/`Buffer`. Undo history and the
/// yank buffer live one layer up, in `core-state`, since they need to
/// observe edits made through this type's mutators.
#[derive(Debug, Clone)]
pub struct Document {
    lines: Vec<Line>,
    pub cursor: Position,
    pub preferred_column: usize,
    pub scroll_line: usize,
    pub scroll_col: usize,
    pub mode: Mode,
    pub selection_anchor: Option<Position>,
    pub syntax_id: Option<String>,
    pub tabstop: u8,
    pub expand_tabs: bool,
    pub filename: Option<String>,
    pub modified: bool,
    pub readonly: bool,
    pub indent_on_newline: bool,
    pub line_ending: LineEnding,
}

impl Document {
    pub fn new() -> Self {
        Document {
            lines: vec![Line::new()],
            cursor: Position::origin_zero(),
            preferred_column: 0,
            scroll_line: 0,
            scroll_col: 0,
            mode: Mode::Normal,
            selection_anchor: None,
            syntax_id: None,
            tabstop: 8,
            expand_tabs: false,
            filename: None,
            modified: false,
            readonly: false,
            indent_on_newline: true,
            line_ending: LineEnding::Lf,
        }
    }

    pub fn from_text(text: &str) -> Self {
        let mut doc = Document::new();
        doc.lines.clear();
        let ends_crlf = text.contains("\r\n");
        let normalized = text.replace("\r\n", "\n");
        let mut iter = normalized.split('\n').peekable();
        while let Some(raw) = iter.next() {
            doc.lines.push(Line::from_str(raw));
            if iter.peek().is_none() {
                break;
            }
        }
        if doc.lines.is_empty() {
            doc.lines.push(Line::new());
        }
        doc.line_ending = if ends_crlf {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };
        doc
    }

    pub fn to_text(&self) -> String {
        let sep = match self.line_ending {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        };
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            out.push_str(&line.to_string_lossy());
        }
        out
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, idx: usize) -> Option<&Line> {
        self.lines.get(idx)
    }

    pub fn line_mut(&mut self, idx: usize) -> Option<&mut Line> {
        self.lines.get_mut(idx)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Maximum valid cursor cell index for `line`, honoring the
    /// insert-mode "extra cell" convention (spec.md §4.2): in
    /// insert-like modes the cursor may rest one past the last real
    /// cell (to type after the end of the line); in Normal-family modes
    /// it must rest on a real cell (clamped to `len - 1`).
    pub fn max_cursor_cell(&self, line_idx: usize) -> usize {
        let len = self.lines.get(line_idx).map(Line::len).unwrap_or(0);
        if self.mode.is_insert_like() {
            len
        } else {
            len.saturating_sub(1)
        }
    }

    pub fn clamp_cursor(&mut self) {
        if self.lines.is_empty() {
            self.cursor = Position::origin_zero();
            return;
        }
        if self.cursor.line >= self.lines.len() {
            self.cursor.line = self.lines.len() - 1;
        }
        let max_cell = self.max_cursor_cell(self.cursor.line);
        if self.cursor.cell > max_cell {
            self.cursor.cell = max_cell;
        }
    }

    /// Add a new line containing `content` at index `at` (`at ==
    /// line_count()` appends at the end).
    pub fn add_line(&mut self, at: usize, content: Line) -> Result<()> {
        if at > self.lines.len() {
            bail!("add_line index {at} out of bounds (len {})", self.lines.len());
        }
        self.lines.insert(at, content);
        self.modified = true;
        Ok(())
    }

    /// Remove and return the line at `at`. The document always retains at
    /// least one line: removing the last remaining line replaces it with
    /// an empty one instead of leaving a zero-line document.
    pub fn remove_line(&mut self, at: usize) -> Result<Line> {
        if at >= self.lines.len() {
            bail!("remove_line index {at} out of bounds (len {})", self.lines.len());
        }
        let removed = if self.lines.len() == 1 {
            std::mem::replace(&mut self.lines[0], Line::new())
        } else {
            self.lines.remove(at)
        };
        self.modified = true;
        Ok(removed)
    }

    pub fn replace_line(&mut self, at: usize, content: Line) -> Result<Line> {
        if at >= self.lines.len() {
            bail!("replace_line index {at} out of bounds (len {})", self.lines.len());
        }
        let old = std::mem::replace(&mut self.lines[at], content);
        self.modified = true;
        Ok(old)
    }

    /// Split line `line_idx` at cell `at` into two lines. The second half
    /// becomes a new line immediately following. Returns the index of the
    /// new (tail) line.
    pub fn split_line(&mut self, line_idx: usize, at: usize) -> Result<usize> {
        let tail = {
            let line = self
                .lines
                .get_mut(line_idx)
                .ok_or_else(|| anyhow::anyhow!("split_line index {line_idx} out of bounds"))?;
            line.split_at(at)?
        };
        self.lines.insert(line_idx + 1, tail);
        self.modified = true;
        Ok(line_idx + 1)
    }

    /// Merge line `line_idx + 1` onto the end of `line_idx`, removing the
    /// former. Returns the cell index where the join occurred (new cursor
    /// landing spot).
    pub fn merge_lines(&mut self, line_idx: usize) -> Result<usize> {
        if line_idx + 1 >= self.lines.len() {
            bail!("merge_lines: no following line at {}", line_idx + 1);
        }
        let next = self.lines.remove(line_idx + 1);
        let join_at = self.lines[line_idx].merge(next);
        self.modified = true;
        Ok(join_at)
    }

    /// Compute the indentation to inherit on a newline opened below
    /// `line_idx`, following the algorithm in spec.md §4.2:
    /// 1. If `line_idx` is inside a block comment (its `istate` carries a
    ///    continuation state, i.e. `!= -1`), copy its leading whitespace
    ///    and append a ` * ` continuation prefix.
    /// 2. Otherwise copy leading whitespace from `line_idx`.
    /// 3. If the last non-whitespace cell (ignoring trailing comments and
    ///    spaces) is `{` or `:`, add one `tabstop`-worth of indent (a tab
    ///    cell if `!expand_tabs`, else `tabstop` spaces).
    /// 4. If the line is entirely whitespace, inherit nothing (avoid
    ///    indent creep on repeated blank lines).
    /// 5. Indentation is returned as a cell run ready to insert verbatim
    ///    at the start of the new line, not re-derived from column math.
    /// 6. Callers decide whether to apply this (respecting
    ///    `indent_on_newline`); `Document` only computes it.
    pub fn inherited_indent(&self, line_idx: usize) -> Vec<Cell> {
        let Some(line) = self.lines.get(line_idx) else {
            return Vec::new();
        };
        if !self.indent_on_newline {
            return Vec::new();
        }
        let mut indent: Vec<Cell> = Vec::new();
        let mut all_whitespace = true;
        for cell in line.cells() {
            match cell.ch() {
                Some(c) if c == ' ' || c == '\t' => indent.push(*cell),
                Some(_) => {
                    all_whitespace = false;
                    break;
                }
                None => break,
            }
        }
        if all_whitespace {
            return Vec::new();
        }
        if line.istate != -1 {
            for ch in [' ', '*', ' '] {
                indent.push(Cell::from_char(ch));
            }
            return indent;
        }
        let opens_block = line
            .cells()
            .iter()
            .rev()
            .find_map(|c| c.ch())
            .map(|c| matches!(c, '{' | ':'))
            .unwrap_or(false);
        if opens_block {
            if self.expand_tabs {
                for _ in 0..self.tabstop {
                    indent.push(Cell::from_char(' '));
                }
            } else {
                indent.push(Cell::from_char('\t'));
            }
        }
        indent
    }

    /// Vertical-motion cursor landing algorithm (spec.md §4.2): moving
    /// up/down preserves `preferred_column` (the visual column the
    /// cursor "wants" to be at) rather than the raw cell index, so moving
    /// through a short line and back to a long one restores the original
    /// column.
    pub fn move_vertical(&mut self, delta: isize) {
        if self.lines.is_empty() {
            return;
        }
        let new_line = (self.cursor.line as isize + delta)
            .clamp(0, self.lines.len() as isize - 1) as usize;
        self.cursor.line = new_line;
        self.cursor.cell = self.cell_for_visual_column(new_line, self.preferred_column);
    }

    /// Find the cell index on `line_idx` whose visual column is closest
    /// to (without exceeding, unless the line is shorter) `target_col`.
    fn cell_for_visual_column(&self, line_idx: usize, target_col: usize) -> usize {
        let Some(line) = self.lines.get(line_idx) else {
            return 0;
        };
        let mut col = 0usize;
        for (i, cell) in line.cells().iter().enumerate() {
            if col >= target_col {
                return i;
            }
            col += cell.display_width() as usize;
        }
        self.max_cursor_cell(line_idx)
    }

    /// Update `preferred_column` from the cursor's current visual
    /// position. Callers invoke this after any horizontal motion (left/
    /// right/word/line-start/line-end); vertical motions must NOT call
    /// this, or they would never recover a previously-wider column.
    pub fn sync_preferred_column(&mut self) {
        let Some(line) = self.lines.get(self.cursor.line) else {
            self.preferred_column = 0;
            return;
        };
        self.preferred_column = line
            .cells()
            .iter()
            .take(self.cursor.cell)
            .map(|c| c.display_width() as usize)
            .sum();
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Position {
    fn origin_zero() -> Self {
        Position { line: 0, cell: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_packs_and_unpacks() {
        let mut flags = CellFlags::empty();
        flags.set_syntax(SyntaxClass::Keyword);
        flags.set(CellFlags::SELECT, true);
        let cell = Cell::new('x', flags, 1);
        assert_eq!(cell.ch(), Some('x'));
        assert_eq!(cell.display_width(), 1);
        assert_eq!(cell.flags().syntax_class(), SyntaxClass::Keyword);
        assert!(cell.flags().is_select());
        assert!(!cell.flags().is_search());
    }

    #[test]
    fn cell_codepoint_roundtrips_astral() {
        let cell = Cell::from_char('😀');
        assert_eq!(cell.ch(), Some('😀'));
        assert_eq!(cell.display_width(), 2);
    }

    #[test]
    fn line_insert_and_delete() {
        let mut line = Line::from_str("hello");
        line.insert(5, '!').unwrap();
        assert_eq!(line.to_string_lossy(), "hello!");
        let removed = line.delete(0, 1).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(line.to_string_lossy(), "ello!");
    }

    #[test]
    fn line_delete_zero_length_is_noop() {
        let mut line = Line::from_str("abc");
        line.rev_status = RevStatus::Unchanged;
        let removed = line.delete(1, 0).unwrap();
        assert!(removed.is_empty());
        assert_eq!(line.to_string_lossy(), "abc");
        assert_eq!(line.rev_status, RevStatus::Unchanged);
    }

    #[test]
    fn line_growth_doubles_from_32() {
        let line = Line::new();
        assert_eq!(line.cells.capacity(), INITIAL_CAPACITY);
    }

    #[test]
    fn line_split_and_merge_roundtrip() {
        let mut line = Line::from_str("hello world");
        let tail = line.split_at(5).unwrap();
        assert_eq!(line.to_string_lossy(), "hello");
        assert_eq!(tail.to_string_lossy(), " world");
        let join_at = line.merge(tail);
        assert_eq!(join_at, 5);
        assert_eq!(line.to_string_lossy(), "hello world");
    }

    #[test]
    fn document_split_and_merge_lines() {
        let mut doc = Document::from_text("hello world\nsecond");
        let tail_idx = doc.split_line(0, 5).unwrap();
        assert_eq!(tail_idx, 1);
        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.line(0).unwrap().to_string_lossy(), "hello");
        assert_eq!(doc.line(1).unwrap().to_string_lossy(), " world");
        let join_at = doc.merge_lines(0).unwrap();
        assert_eq!(join_at, 5);
        assert_eq!(doc.line(0).unwrap().to_string_lossy(), "hello world");
    }

    #[test]
    fn document_round_trips_crlf() {
        let doc = Document::from_text("a\r\nb\r\n");
        assert_eq!(doc.line_ending, LineEnding::CrLf);
        assert_eq!(doc.to_text(), "a\r\nb\r\n");
    }

    #[test]
    fn visual_width_matches_sum_of_cells() {
        let line = Line::from_str("a界b");
        assert_eq!(line.visual_width(), 1 + 2 + 1);
    }

    #[test]
    fn preferred_column_restored_through_short_line() {
        let mut doc = Document::from_text("hello world\nhi\nhello world");
        doc.cursor = Position::new(0, 8);
        doc.sync_preferred_column();
        doc.move_vertical(1);
        assert_eq!(doc.cursor.line, 1);
        assert!(doc.cursor.cell <= doc.line(1).unwrap().len());
        doc.move_vertical(1);
        assert_eq!(doc.cursor.line, 2);
        assert_eq!(doc.cursor.cell, 8);
    }

    #[test]
    fn inherited_indent_adds_one_level_after_open_brace() {
        let mut doc = Document::from_text("    if x {\n");
        doc.expand_tabs = true;
        doc.tabstop = 4;
        let indent = doc.inherited_indent(0);
        let s: String = indent.iter().filter_map(|c| c.ch()).collect();
        assert_eq!(s, "        "); // 4 inherited + 4 new
    }

    #[test]
    fn inherited_indent_blank_line_inherits_nothing() {
        let doc = Document::from_text("    \n");
        assert!(doc.inherited_indent(0).is_empty());
    }

    #[test]
    fn inherited_indent_adds_one_level_after_colon() {
        let mut doc = Document::from_text("    match x:\n");
        doc.expand_tabs = true;
        doc.tabstop = 4;
        let indent = doc.inherited_indent(0);
        let s: String = indent.iter().filter_map(|c| c.ch()).collect();
        assert_eq!(s, "        ");
    }

    #[test]
    fn inherited_indent_does_not_trigger_on_paren_or_bracket() {
        let mut doc = Document::from_text("    f(x\n");
        doc.expand_tabs = true;
        doc.tabstop = 4;
        let indent = doc.inherited_indent(0);
        let s: String = indent.iter().filter_map(|c| c.ch()).collect();
        assert_eq!(s, "    ");
    }

    #[test]
    fn inherited_indent_inside_block_comment_adds_star_continuation() {
        let mut doc = Document::from_text("    /* hello\n");
        doc.line_mut(0).unwrap().istate = 1;
        let indent = doc.inherited_indent(0);
        let s: String = indent.iter().filter_map(|c| c.ch()).collect();
        assert_eq!(s, "     * ");
    }
}
