//! Terminal backend abstraction and crossterm implementation.
//!
//! Refactor R3: Introduced `TerminalCapabilities` stub (scroll region support flag)
//! consumed by the render engine to gate forthcoming scroll-delta optimizations.

use anyhow::Result;
use crossterm::event::{self, Event as CEvent};
use crossterm::{
    cursor::Hide,
    cursor::Show,
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};
use std::io::{Write, stdout};
use std::time::Duration;

pub mod capabilities;
pub mod decoder;
pub use capabilities::TerminalCapabilities;
pub use decoder::KeyDecoder;

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
}

/// The synchronous terminal I/O surface the run loop drives directly: read a
/// byte with a timeout (the editor's only blocking call, spec §5), write
/// output, and query the current size.
pub trait TerminalIo {
    fn read_byte(&mut self, timeout_ms: u64) -> Result<Option<u8>>;
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
    fn size(&self) -> Result<(u16, u16)>;
}

/// `TerminalIo` implementation backed by crossterm's polling event reader.
/// crossterm hands back whole key/resize events rather than raw bytes; this
/// adapter re-serializes each event to the byte sequence a terminal would
/// actually have sent, so `KeyDecoder` stays the single source of truth for
/// interpreting escape sequences regardless of where the bytes originated.
#[derive(Default)]
pub struct CrosstermIo {
    pending: Vec<u8>,
}

impl CrosstermIo {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    fn push_key(&mut self, key: event::KeyEvent) {
        use event::{KeyCode as CCode, KeyModifiers as CMods};
        match key.code {
            CCode::Char(c) => {
                if key.modifiers.contains(CMods::CONTROL) && c.is_ascii_alphabetic() {
                    self.pending.push((c.to_ascii_lowercase() as u8) & 0x1f);
                } else {
                    let mut buf = [0u8; 4];
                    self.pending.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
            CCode::Enter => self.pending.push(b'\r'),
            CCode::Tab => self.pending.push(b'\t'),
            CCode::Backspace => self.pending.push(0x7f),
            CCode::Esc => self.pending.push(0x1b),
            CCode::Up => self.pending.extend_from_slice(b"\x1b[A"),
            CCode::Down => self.pending.extend_from_slice(b"\x1b[B"),
            CCode::Right => self.pending.extend_from_slice(b"\x1b[C"),
            CCode::Left => self.pending.extend_from_slice(b"\x1b[D"),
            CCode::Home => self.pending.extend_from_slice(b"\x1b[H"),
            CCode::End => self.pending.extend_from_slice(b"\x1b[F"),
            CCode::PageUp => self.pending.extend_from_slice(b"\x1b[5~"),
            CCode::PageDown => self.pending.extend_from_slice(b"\x1b[6~"),
            CCode::Delete => self.pending.extend_from_slice(b"\x1b[3~"),
            CCode::Insert => self.pending.extend_from_slice(b"\x1b[2~"),
            _ => {}
        }
    }
}

impl TerminalIo for CrosstermIo {
    fn read_byte(&mut self, timeout_ms: u64) -> Result<Option<u8>> {
        if let Some(b) = self.pending.first().copied() {
            self.pending.remove(0);
            return Ok(Some(b));
        }
        if event::poll(Duration::from_millis(timeout_ms))? {
            match event::read()? {
                CEvent::Key(k) => self.push_key(k),
                CEvent::Resize(_, _) => {}
                _ => {}
            }
            if let Some(b) = self.pending.first().copied() {
                self.pending.remove(0);
                return Ok(Some(b));
            }
        }
        Ok(None)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        stdout().write_all(bytes)?;
        stdout().flush()?;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok((rows, cols))
    }
}

pub struct CrosstermBackend {
    entered: bool,
}

/// RAII guard ensuring terminal state restoration even if caller early-returns or panics.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
    active: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter and return a guard that will leave on drop.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard {
            backend: self,
            active: true,
        })
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
            self.entered = true;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(stdout(), LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        execute!(stdout(), SetTitle(title))?;
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl<'a> Drop for TerminalGuard<'a> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.backend.leave();
        }
    }
}
