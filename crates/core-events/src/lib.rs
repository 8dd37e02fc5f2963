//! Event vocabulary shared between the terminal decoder and the run loop.
//!
//! The editor's run loop is single-threaded and cooperative: bytes are read
//! from the terminal one at a time (with a timeout), decoded into an
//! `Event` by direct function call, and dispatched immediately. There is no
//! channel, no background task, and no `Send`/`'static` bound anywhere in
//! this crate — `tokio` is not a dependency here at all; a single-threaded
//! cooperative core does not need an async runtime to move events from a
//! decoder to a dispatcher in the same call stack.

use std::fmt;

/// Top-level event consumed by the run loop.
#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Command(CommandEvent),
    RenderRequested,
    /// Coalescing tick, fired when the terminal's read-with-timeout lapses
    /// with nothing to decode. Drives ephemeral-message expiry and deferred
    /// repaint flushes during INSERT mode.
    Tick,
    Resize(u16, u16),
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum CommandEvent {
    Quit,
}

/// Normalized input events produced by `core-terminal`'s key/mouse decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    CtrlC,
    Mouse(MouseEvent),
    PasteStart,
    PasteChunk(String),
    PasteEnd,
    FocusGained,
    FocusLost,
}

/// Hooks observing events at the dispatch boundary. Implementations run
/// synchronously and must not block; there is no task to hand work off to.
pub trait EventHooks {
    fn pre_handle(&self, _event: &Event) {}
    fn post_handle(&self, _event: &Event) {}
}

pub struct NoopEventHooks;
impl EventHooks for NoopEventHooks {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub column: u16,
    pub row: u16,
    pub mods: KeyModifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Down(MouseButton),
    Up(MouseButton),
    Drag(MouseButton),
    ScrollUp,
    ScrollDown,
    Moved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    F(u8),
}

/// Identity normalization hook retained as an extension point for future raw
/// platform translations; currently a no-op.
pub fn normalize_keycode(code: KeyCode) -> KeyCode {
    code
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const CTRL  = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const SHIFT = 0b0000_0100;
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.code, self.mods)
    }
}

pub type EventResult<T> = anyhow::Result<T>;
