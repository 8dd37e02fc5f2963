//! Mode table: `Action`/`KeyBinding`/`KeyMap`, and the nav-buffer decimal
//! accumulator, per the linear first-match dispatch model.
//!
//! Dispatch order for a single key: the primary mode's `KeyMap`, then the
//! shared `NAVIGATION` map, then the shared `ESCAPE` map (function keys,
//! arrows, mouse). Each map is an ordered `Vec<KeyBinding>`; lookup is
//! linear first-match, not a trie -- later bindings with the same key are
//! unreachable dead weight, mirroring how the tables read as documentation.

use core_events::{KeyCode, KeyModifiers};
use smallvec::SmallVec;
use std::fmt;

bitflags::bitflags! {
    /// Option flags attached to a `KeyBinding`, controlling how the
    /// dispatcher invokes the bound `Action`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ActionOptions: u8 {
        /// Action repeats according to the numeric nav buffer (`3j` -> down 3).
        const REP  = 0b0000_0001;
        /// Action takes a fixed int argument baked into the keymap entry.
        const ARG  = 0b0000_0010;
        /// Before invocation, prompt for one codepoint and pass it.
        const CHAR = 0b0000_0100;
        /// Same as CHAR but reads exactly one raw byte.
        const BYTE = 0b0000_1000;
        /// Consume the nav buffer as the argument (rather than repeating).
        const NAV  = 0b0001_0000;
        /// Refuse silently (with a user-visible error) when the buffer is readonly.
        const RW   = 0b0010_0000;
        /// On return, transition to NORMAL mode.
        const NORM = 0b0100_0000;
    }
}

/// Modal editing modes, plus overlay modes layered on top of any primary
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Normal,
    Insert,
    Replace,
    LineSelection,
    CharSelection,
    ColSelection,
    ColInsert,
    DirectoryBrowse,
}

/// Overlay modes route all keys through an input-line sub-dispatcher
/// instead of the primary mode's `KeyMap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    Command,
    SearchForward,
    SearchBackward,
}

/// Stable identifier for a bound action. The dispatcher owns the actual
/// handler function; this crate only names and orders bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(pub &'static str);

#[derive(Debug, Clone)]
pub struct Action {
    pub id: ActionId,
    pub options: ActionOptions,
    pub description: &'static str,
}

impl Action {
    pub const fn new(id: &'static str, options: ActionOptions, description: &'static str) -> Self {
        Self {
            id: ActionId(id),
            options,
            description,
        }
    }
}

/// One raw key chord: a code plus the modifier bits that must match
/// exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl Key {
    pub const fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::empty(),
        }
    }

    pub const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            mods: KeyModifiers::CTRL,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}+{:?}", self.mods, self.code)
    }
}

#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: Key,
    pub action: Action,
    /// Fixed argument baked into the binding (used when `ARG` is set).
    pub arg: i64,
}

impl KeyBinding {
    pub const fn new(key: Key, action: Action) -> Self {
        Self { key, action, arg: 0 }
    }

    pub const fn with_arg(key: Key, action: Action, arg: i64) -> Self {
        Self { key, action, arg }
    }
}

/// An ordered, linearly-searched table of bindings for one mode (or one of
/// the two shared fallback tables).
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    bindings: SmallVec<[KeyBinding; 32]>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self {
            bindings: SmallVec::new(),
        }
    }

    pub fn bind(&mut self, binding: KeyBinding) -> &mut Self {
        self.bindings.push(binding);
        self
    }

    /// First matching binding for `key`, in insertion order.
    pub fn lookup(&self, key: Key) -> Option<&KeyBinding> {
        self.bindings.iter().find(|b| b.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Result of resolving one key through a `ModeTable`.
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    pub binding: &'a KeyBinding,
    /// The nav buffer's accumulated count at resolution time, if any digits
    /// had been entered (`None` means "no explicit count", which callers
    /// should usually treat as `1` for REP actions).
    pub count: Option<u32>,
}

/// Per-mode keymaps plus the two shared fallback tables (NAVIGATION,
/// ESCAPE) and the nav-buffer decimal accumulator.
pub struct ModeTable {
    normal: KeyMap,
    insert: KeyMap,
    replace: KeyMap,
    line_selection: KeyMap,
    char_selection: KeyMap,
    col_selection: KeyMap,
    col_insert: KeyMap,
    directory_browse: KeyMap,
    navigation: KeyMap,
    escape: KeyMap,
    command_overlay: KeyMap,
    search_overlay: KeyMap,
    nav_buffer: NavBuffer,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeTable {
    pub fn new() -> Self {
        Self {
            normal: KeyMap::new(),
            insert: KeyMap::new(),
            replace: KeyMap::new(),
            line_selection: KeyMap::new(),
            char_selection: KeyMap::new(),
            col_selection: KeyMap::new(),
            col_insert: KeyMap::new(),
            directory_browse: KeyMap::new(),
            navigation: KeyMap::new(),
            escape: KeyMap::new(),
            command_overlay: KeyMap::new(),
            search_overlay: KeyMap::new(),
            nav_buffer: NavBuffer::new(),
        }
    }

    pub fn map_mut(&mut self, mode: Mode) -> &mut KeyMap {
        match mode {
            Mode::Normal => &mut self.normal,
            Mode::Insert => &mut self.insert,
            Mode::Replace => &mut self.replace,
            Mode::LineSelection => &mut self.line_selection,
            Mode::CharSelection => &mut self.char_selection,
            Mode::ColSelection => &mut self.col_selection,
            Mode::ColInsert => &mut self.col_insert,
            Mode::DirectoryBrowse => &mut self.directory_browse,
        }
    }

    pub fn map(&self, mode: Mode) -> &KeyMap {
        match mode {
            Mode::Normal => &self.normal,
            Mode::Insert => &self.insert,
            Mode::Replace => &self.replace,
            Mode::LineSelection => &self.line_selection,
            Mode::CharSelection => &self.char_selection,
            Mode::ColSelection => &self.col_selection,
            Mode::ColInsert => &self.col_insert,
            Mode::DirectoryBrowse => &self.directory_browse,
        }
    }

    pub fn navigation_mut(&mut self) -> &mut KeyMap {
        &mut self.navigation
    }

    pub fn escape_mut(&mut self) -> &mut KeyMap {
        &mut self.escape
    }

    pub fn overlay_mut(&mut self, overlay: Overlay) -> &mut KeyMap {
        match overlay {
            Overlay::Command => &mut self.command_overlay,
            Overlay::SearchForward | Overlay::SearchBackward => &mut self.search_overlay,
        }
    }

    pub fn overlay(&self, overlay: Overlay) -> &KeyMap {
        match overlay {
            Overlay::Command => &self.command_overlay,
            Overlay::SearchForward | Overlay::SearchBackward => &self.search_overlay,
        }
    }

    pub fn nav_buffer(&mut self) -> &mut NavBuffer {
        &mut self.nav_buffer
    }

    /// Resolve a key while an overlay is active: overlay map only (no
    /// fallback to NAVIGATION/ESCAPE -- overlays own cursor motion, history
    /// scroll, word-delete, and tab-completion themselves via their own
    /// bindings).
    pub fn resolve_overlay(&self, overlay: Overlay, key: Key) -> Option<&KeyBinding> {
        self.overlay(overlay).lookup(key)
    }

    /// Resolve a key for a primary mode: nav-buffer digits are consumed
    /// first (NORMAL/selection modes only -- INSERT/REPLACE/COL_INSERT take
    /// literal digits), then the mode's own map, then NAVIGATION, then
    /// ESCAPE.
    pub fn resolve(&mut self, mode: Mode, key: Key) -> NavOutcome<'_> {
        if mode_accepts_nav_digits(mode) {
            if let KeyCode::Char(c) = key.code {
                if key.mods.is_empty() && self.nav_buffer.accepts(c) {
                    self.nav_buffer.push(c);
                    return NavOutcome::BufferedDigit;
                }
            }
        }
        let count = self.nav_buffer.take();
        let binding = self
            .map(mode)
            .lookup(key)
            .or_else(|| self.navigation.lookup(key))
            .or_else(|| self.escape.lookup(key));
        match binding {
            Some(b) => NavOutcome::Resolved(Resolved { binding: b, count }),
            None => NavOutcome::Unbound { count },
        }
    }
}

fn mode_accepts_nav_digits(mode: Mode) -> bool {
    matches!(
        mode,
        Mode::Normal | Mode::LineSelection | Mode::CharSelection | Mode::ColSelection
    )
}

#[derive(Debug)]
pub enum NavOutcome<'a> {
    /// The key was a nav-buffer digit; no action fires yet.
    BufferedDigit,
    Resolved(Resolved<'a>),
    Unbound { count: Option<u32> },
}

/// Small decimal accumulator: digits `1-9` (and `0` after the first digit)
/// append; any other key triggers action evaluation with the accumulated
/// count and clears the buffer. Capped at 10 digits (spec: "up to 10
/// digits") to bound both the accumulator and the resulting repeat count.
#[derive(Debug, Default)]
pub struct NavBuffer {
    digits: SmallVec<[u8; 10]>,
}

impl NavBuffer {
    pub fn new() -> Self {
        Self {
            digits: SmallVec::new(),
        }
    }

    pub fn accepts(&self, c: char) -> bool {
        if !c.is_ascii_digit() {
            return false;
        }
        if self.digits.is_empty() && c == '0' {
            // A leading zero is not a count digit (it is `0` the motion,
            // "go to column 0"); only append once a non-zero digit started
            // the buffer.
            return false;
        }
        self.digits.len() < 10
    }

    pub fn push(&mut self, c: char) {
        debug_assert!(c.is_ascii_digit());
        self.digits.push(c as u8 - b'0');
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Consume and clear the buffer, returning the accumulated count if any
    /// digits had been entered.
    pub fn take(&mut self) -> Option<u32> {
        if self.digits.is_empty() {
            return None;
        }
        let mut n: u32 = 0;
        for &d in self.digits.iter() {
            n = n.saturating_mul(10).saturating_add(d as u32);
        }
        self.digits.clear();
        Some(n)
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }
}

/// Baseline NORMAL-mode action ids the dispatcher recognizes. Kept here as
/// named constants (rather than magic strings scattered through
/// `core-actions`) so the keymap table and the dispatcher's match arms stay
/// in lockstep.
pub mod actions {
    use super::{Action, ActionOptions as Opt};

    pub const MOVE_LEFT: Action = Action::new("move_left", Opt::REP, "move cursor left");
    pub const MOVE_RIGHT: Action = Action::new("move_right", Opt::REP, "move cursor right");
    pub const MOVE_UP: Action = Action::new("move_up", Opt::REP, "move cursor up");
    pub const MOVE_DOWN: Action = Action::new("move_down", Opt::REP, "move cursor down");
    pub const MOVE_WORD_FORWARD: Action =
        Action::new("move_word_forward", Opt::REP, "move to next word start");
    pub const MOVE_WORD_BACKWARD: Action =
        Action::new("move_word_backward", Opt::REP, "move to previous word start");
    pub const MOVE_LINE_START: Action =
        Action::new("move_line_start", Opt::empty(), "move to column 0");
    pub const MOVE_LINE_FIRST_NONBLANK: Action = Action::new(
        "move_line_first_nonblank",
        Opt::empty(),
        "move to first non-blank",
    );
    pub const MOVE_LINE_END: Action =
        Action::new("move_line_end", Opt::empty(), "move to end of line");
    pub const MOVE_FILE_START: Action =
        Action::new("move_file_start", Opt::NAV, "move to a line (default 1)");
    pub const MOVE_FILE_END: Action =
        Action::new("move_file_end", Opt::NAV, "move to a line (default last)");

    pub const ENTER_INSERT: Action =
        Action::new("enter_insert", Opt::empty(), "enter INSERT before cursor");
    pub const ENTER_INSERT_AFTER: Action = Action::new(
        "enter_insert_after",
        Opt::empty(),
        "enter INSERT after cursor",
    );
    pub const ENTER_INSERT_LINE_START: Action = Action::new(
        "enter_insert_line_start",
        Opt::empty(),
        "enter INSERT at first non-blank",
    );
    pub const ENTER_INSERT_LINE_END: Action =
        Action::new("enter_insert_line_end", Opt::empty(), "enter INSERT at EOL");
    pub const OPEN_LINE_BELOW: Action = Action::new(
        "open_line_below",
        Opt::RW,
        "open a new line below and enter INSERT",
    );
    pub const OPEN_LINE_ABOVE: Action = Action::new(
        "open_line_above",
        Opt::RW,
        "open a new line above and enter INSERT",
    );
    pub const ESCAPE_TO_NORMAL: Action =
        Action::new("escape_to_normal", Opt::NORM, "return to NORMAL mode");

    pub const DELETE_UNDER: Action = Action::new(
        "delete_under",
        Opt::REP.union(Opt::RW),
        "delete the character under the cursor",
    );
    pub const DELETE_LEFT: Action = Action::new(
        "delete_left",
        Opt::REP.union(Opt::RW),
        "delete the character before the cursor",
    );
    pub const INSERT_NEWLINE: Action =
        Action::new("insert_newline", Opt::RW, "split the line at the cursor");
    pub const BACKSPACE: Action =
        Action::new("backspace", Opt::RW, "delete backward, joining lines at BOL");
    pub const INSERT_CHAR: Action = Action::new(
        "insert_char",
        Opt::CHAR.union(Opt::RW),
        "insert one codepoint at the cursor",
    );
    pub const REPLACE_CHAR: Action = Action::new(
        "replace_char",
        Opt::CHAR.union(Opt::RW).union(Opt::NORM),
        "replace the character under the cursor",
    );
    pub const ENTER_REPLACE: Action =
        Action::new("enter_replace", Opt::empty(), "enter REPLACE mode");

    pub const UNDO: Action = Action::new("undo", Opt::REP.union(Opt::RW), "undo to breakpoint");
    pub const REDO: Action = Action::new("redo", Opt::REP.union(Opt::RW), "redo to breakpoint");
    pub const SET_BREAK: Action = Action::new(
        "set_history_break",
        Opt::empty(),
        "insert an undo breakpoint",
    );

    pub const YANK_LINE: Action = Action::new("yank_line", Opt::REP, "yank the current line(s)");
    pub const DELETE_LINE: Action = Action::new(
        "delete_line",
        Opt::REP.union(Opt::RW),
        "delete the current line(s)",
    );
    pub const PASTE_AFTER: Action = Action::new(
        "paste_after",
        Opt::REP.union(Opt::RW),
        "paste after the cursor",
    );
    pub const PASTE_BEFORE: Action = Action::new(
        "paste_before",
        Opt::REP.union(Opt::RW),
        "paste before the cursor",
    );

    pub const BEGIN_OP_DELETE: Action =
        Action::new("begin_op_delete", Opt::NAV, "begin a delete operator-motion");
    pub const BEGIN_OP_YANK: Action =
        Action::new("begin_op_yank", Opt::NAV, "begin a yank operator-motion");
    pub const BEGIN_OP_CHANGE: Action = Action::new(
        "begin_op_change",
        Opt::NAV.union(Opt::RW),
        "begin a change operator-motion",
    );

    pub const ENTER_VISUAL_CHAR: Action =
        Action::new("enter_visual_char", Opt::empty(), "enter CHAR_SELECTION mode");
    pub const ENTER_VISUAL_LINE: Action =
        Action::new("enter_visual_line", Opt::empty(), "enter LINE_SELECTION mode");
    pub const ENTER_VISUAL_BLOCK: Action =
        Action::new("enter_visual_block", Opt::empty(), "enter COL_SELECTION mode");
    pub const VISUAL_DELETE: Action = Action::new(
        "visual_delete",
        Opt::RW.union(Opt::NORM),
        "delete the active selection",
    );
    pub const VISUAL_YANK: Action =
        Action::new("visual_yank", Opt::NORM, "yank the active selection");
    pub const VISUAL_CHANGE: Action = Action::new(
        "visual_change",
        Opt::RW,
        "delete the selection and enter INSERT",
    );

    pub const ENTER_COMMAND: Action =
        Action::new("enter_command", Opt::empty(), "open the `:` command line");
    pub const ENTER_SEARCH_FORWARD: Action =
        Action::new("enter_search_forward", Opt::empty(), "open `/` search");
    pub const ENTER_SEARCH_BACKWARD: Action =
        Action::new("enter_search_backward", Opt::empty(), "open `?` search");
    pub const REPEAT_SEARCH: Action = Action::new(
        "repeat_search",
        Opt::REP,
        "repeat the last search, same direction",
    );
    pub const REPEAT_SEARCH_REVERSE: Action = Action::new(
        "repeat_search_reverse",
        Opt::REP,
        "repeat the last search, opposite direction",
    );

    pub const MATCH_PAREN: Action =
        Action::new("match_paren", Opt::empty(), "jump to the matching paren");

    pub const OVERLAY_CONFIRM: Action = Action::new(
        "overlay_confirm",
        Opt::empty(),
        "execute the overlay's input line",
    );
    pub const OVERLAY_CANCEL: Action =
        Action::new("overlay_cancel", Opt::NORM, "cancel and close the overlay");
    pub const OVERLAY_BACKSPACE: Action = Action::new(
        "overlay_backspace",
        Opt::empty(),
        "backspace in the overlay input line",
    );
    pub const OVERLAY_INSERT_CHAR: Action = Action::new(
        "overlay_insert_char",
        Opt::CHAR,
        "insert one codepoint into the overlay input line",
    );

    pub const QUIT: Action = Action::new("quit", Opt::empty(), "quit (refuses if modified)");
    pub const FORCE_QUIT: Action =
        Action::new("force_quit", Opt::empty(), "quit, discarding changes");
    pub const SAVE: Action = Action::new("save", Opt::empty(), "write the current buffer");

    pub const ENTER_COL_INSERT: Action = Action::new(
        "enter_col_insert",
        Opt::RW,
        "broadcast insert across the column block",
    );
    pub const EXIT_COL_INSERT: Action = Action::new(
        "exit_col_insert",
        Opt::NORM,
        "apply the broadcast insert and return to NORMAL",
    );
}

/// Construct a `ModeTable` with the baseline bindings spec.md §4.6 implies
/// from its worked examples (`3j`, `dw`, operator+motion composition via
/// `begin_op_*` + the motion map, visual-mode `d`/`y`/`c`, `:`/`/`/`?`
/// overlays). Callers (the dispatcher, or a config layer) may add to or
/// override these via `map_mut`/`navigation_mut`/`escape_mut`.
pub fn baseline() -> ModeTable {
    use actions::*;

    let mut table = ModeTable::new();

    {
        let nav = table.navigation_mut();
        nav.bind(KeyBinding::new(Key::plain(KeyCode::Left), MOVE_LEFT));
        nav.bind(KeyBinding::new(Key::plain(KeyCode::Right), MOVE_RIGHT));
        nav.bind(KeyBinding::new(Key::plain(KeyCode::Up), MOVE_UP));
        nav.bind(KeyBinding::new(Key::plain(KeyCode::Down), MOVE_DOWN));
        nav.bind(KeyBinding::new(Key::plain(KeyCode::Home), MOVE_LINE_START));
        nav.bind(KeyBinding::new(Key::plain(KeyCode::End), MOVE_LINE_END));
    }

    {
        let esc = table.escape_mut();
        esc.bind(KeyBinding::new(Key::plain(KeyCode::Esc), ESCAPE_TO_NORMAL));
    }

    {
        let n = table.map_mut(Mode::Normal);
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('h')), MOVE_LEFT));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('l')), MOVE_RIGHT));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('k')), MOVE_UP));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('j')), MOVE_DOWN));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('w')), MOVE_WORD_FORWARD));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('b')), MOVE_WORD_BACKWARD));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('0')), MOVE_LINE_START));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('^')), MOVE_LINE_FIRST_NONBLANK));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('$')), MOVE_LINE_END));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('G')), MOVE_FILE_END));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('i')), ENTER_INSERT));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('a')), ENTER_INSERT_AFTER));
        n.bind(KeyBinding::new(
            Key::plain(KeyCode::Char('I')),
            ENTER_INSERT_LINE_START,
        ));
        n.bind(KeyBinding::new(
            Key::plain(KeyCode::Char('A')),
            ENTER_INSERT_LINE_END,
        ));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('o')), OPEN_LINE_BELOW));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('O')), OPEN_LINE_ABOVE));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('x')), DELETE_UNDER));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('X')), DELETE_LEFT));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('r')), REPLACE_CHAR));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('R')), ENTER_REPLACE));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('u')), UNDO));
        n.bind(KeyBinding::new(Key::ctrl('r'), REDO));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('y')), BEGIN_OP_YANK));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('d')), BEGIN_OP_DELETE));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('c')), BEGIN_OP_CHANGE));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('Y')), YANK_LINE));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('D')), DELETE_LINE));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('p')), PASTE_AFTER));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('P')), PASTE_BEFORE));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('v')), ENTER_VISUAL_CHAR));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('V')), ENTER_VISUAL_LINE));
        n.bind(KeyBinding::new(Key::ctrl('v'), ENTER_VISUAL_BLOCK));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('%')), MATCH_PAREN));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char('n')), REPEAT_SEARCH));
        n.bind(KeyBinding::new(
            Key::plain(KeyCode::Char('N')),
            REPEAT_SEARCH_REVERSE,
        ));
        n.bind(KeyBinding::new(Key::plain(KeyCode::Char(':')), ENTER_COMMAND));
        n.bind(KeyBinding::new(
            Key::plain(KeyCode::Char('/')),
            ENTER_SEARCH_FORWARD,
        ));
        n.bind(KeyBinding::new(
            Key::plain(KeyCode::Char('?')),
            ENTER_SEARCH_BACKWARD,
        ));
    }

    for mode in [Mode::LineSelection, Mode::CharSelection, Mode::ColSelection] {
        let m = table.map_mut(mode);
        m.bind(KeyBinding::new(Key::plain(KeyCode::Char('h')), MOVE_LEFT));
        m.bind(KeyBinding::new(Key::plain(KeyCode::Char('l')), MOVE_RIGHT));
        m.bind(KeyBinding::new(Key::plain(KeyCode::Char('k')), MOVE_UP));
        m.bind(KeyBinding::new(Key::plain(KeyCode::Char('j')), MOVE_DOWN));
        m.bind(KeyBinding::new(Key::plain(KeyCode::Char('d')), VISUAL_DELETE));
        m.bind(KeyBinding::new(Key::plain(KeyCode::Char('x')), VISUAL_DELETE));
        m.bind(KeyBinding::new(Key::plain(KeyCode::Char('y')), VISUAL_YANK));
        m.bind(KeyBinding::new(Key::plain(KeyCode::Char('c')), VISUAL_CHANGE));
    }

    {
        let col = table.map_mut(Mode::ColSelection);
        col.bind(KeyBinding::new(Key::plain(KeyCode::Char('I')), ENTER_COL_INSERT));
    }

    {
        let i = table.map_mut(Mode::Insert);
        i.bind(KeyBinding::new(Key::plain(KeyCode::Enter), INSERT_NEWLINE));
        i.bind(KeyBinding::new(Key::plain(KeyCode::Backspace), BACKSPACE));
    }

    {
        let r = table.map_mut(Mode::Replace);
        r.bind(KeyBinding::new(Key::plain(KeyCode::Backspace), BACKSPACE));
    }

    {
        let ci = table.map_mut(Mode::ColInsert);
        ci.bind(KeyBinding::new(Key::plain(KeyCode::Esc), EXIT_COL_INSERT));
        ci.bind(KeyBinding::new(Key::plain(KeyCode::Backspace), BACKSPACE));
    }

    {
        let cmd = table.overlay_mut(Overlay::Command);
        cmd.bind(KeyBinding::new(Key::plain(KeyCode::Enter), OVERLAY_CONFIRM));
        cmd.bind(KeyBinding::new(Key::plain(KeyCode::Esc), OVERLAY_CANCEL));
        cmd.bind(KeyBinding::new(
            Key::plain(KeyCode::Backspace),
            OVERLAY_BACKSPACE,
        ));
    }
    {
        let search = table.overlay_mut(Overlay::SearchForward);
        search.bind(KeyBinding::new(Key::plain(KeyCode::Enter), OVERLAY_CONFIRM));
        search.bind(KeyBinding::new(Key::plain(KeyCode::Esc), OVERLAY_CANCEL));
        search.bind(KeyBinding::new(
            Key::plain(KeyCode::Backspace),
            OVERLAY_BACKSPACE,
        ));
    }

    table
}
