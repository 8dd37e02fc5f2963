//! Dispatcher: translates a resolved key sequence into edits against a
//! `core_model::EditorModel`.
//!
//! `core-keymap` names and orders the bindings a user or `:dump-mappings`
//! can introspect; this crate owns the multi-key composition state a
//! single keypress can't carry on its own (an operator awaiting its
//! motion, a count prefix, a register prefix) and the handler behind
//! every resulting [`Action`].

pub mod dispatcher;
pub mod io_ops;
pub mod key_translator;
pub mod span_resolver;
pub mod syntax_support;

pub use dispatcher::DispatchResult;
pub use key_translator::KeyTranslator;

use core_keymap::ActionId;
use core_model::EditorModel;
use core_text::Position;

/// A cursor motion, named independently of any particular key binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    WordForward,
    WordBackward,
    PageHalfUp,
    PageHalfDown,
}

/// A single-keystroke text edit (everything that doesn't need an operator
/// composing with a motion first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    InsertChar(char),
    InsertNewline,
    Backspace,
    DeleteUnder { count: u32, register: Option<char> },
    /// Overwrite the cell under the cursor (`R` mode); appends instead of
    /// overwriting once the cursor reaches end of line.
    ReplaceChar(char),
}

/// An operator awaiting (or paired with) a motion: `d`, `y`, `c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Delete,
    Yank,
    Change,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    EnterInsert,
    LeaveInsert,
    EnterVisualChar,
    LeaveVisualChar,
    /// `V`: whole-line visual selection.
    EnterLineSelection,
    LeaveLineSelection,
    /// Block (column) visual selection, conventionally entered with `Ctrl-V`.
    EnterColSelection,
    LeaveColSelection,
    /// `R`.
    EnterReplace,
    LeaveReplace,
    /// `I` from `COL_SELECTION`: broadcasts subsequently typed text onto
    /// every line of the block once the mode is left (spec.md §8 scenario
    /// 6).
    EnterColInsert,
    LeaveColInsert,
}

/// `/` (forward) or `?` (backward) search overlay direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Everything the key translator can hand the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Motion(MotionKind),
    MotionWithCount { motion: MotionKind, count: u32 },
    ModeChange(ModeChange),
    CommandStart,
    CommandChar(char),
    CommandBackspace,
    CommandCancel,
    CommandExecute(String),
    Edit(EditKind),
    Undo,
    Redo,
    PasteAfter { register: Option<char> },
    PasteBefore { register: Option<char> },
    /// `dw`, `2d3w`, `ciw` and friends: an operator paired with a motion
    /// and the multiplicative count built from prefix/post-operator
    /// digits.
    ApplyOperator {
        op: OperatorKind,
        motion: MotionKind,
        count: u32,
        register: Option<char>,
    },
    /// `dd`, `yy`, `cc`: operator doubled on itself, whole-line scope.
    LinewiseOperator {
        op: OperatorKind,
        count: u32,
        register: Option<char>,
    },
    /// An operator applied to the active Visual-mode selection.
    VisualOperator {
        op: OperatorKind,
        register: Option<char>,
    },
    /// `/` or `?`: opens the search overlay (spec.md §4.5).
    SearchStart(SearchDirection),
    /// Enter pressed while the search overlay is active; `String` is the
    /// raw buffer including its `/`/`?` prefix.
    SearchExecute(String),
    Quit,
}

/// Stable identifier used for observer/telemetry purposes; not consulted
/// by the dispatcher's own control flow (see `dispatcher::action_id`).
pub fn action_id(action: &Action) -> ActionId {
    dispatcher::action_id(action)
}

/// Observes every dispatched action, whether or not it changed anything.
/// The scripting-host contract in `core-plugin` is the intended home for
/// a real implementation; the dispatcher only needs the trait object.
pub trait ActionObserver {
    fn on_action(&self, id: ActionId, model: &EditorModel);
}

/// An `ActionObserver` that does nothing, used when no observers are wired.
pub struct NoopActionObserver;
impl ActionObserver for NoopActionObserver {
    fn on_action(&self, _id: ActionId, _model: &EditorModel) {}
}

/// Run a motion primitive against a document cursor without holding two
/// simultaneous borrows of `Document` (it owns the cursor it would also
/// need to pass `&mut`). Every dispatcher submodule goes through one of
/// these instead of borrowing `state.document_mut().cursor` directly.
pub(crate) fn with_cursor<R>(
    state: &mut core_state::EditorState,
    f: impl FnOnce(&core_text::Document, &mut Position) -> R,
) -> R {
    let mut pos = state.document().cursor;
    let r = f(state.document(), &mut pos);
    state.document_mut().cursor = pos;
    r
}
