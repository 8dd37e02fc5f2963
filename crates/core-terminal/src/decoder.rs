//! Byte-stream key/mouse decoder.
//!
//! Owns its own state across calls so the run loop can feed it one byte at a
//! time as `read_byte(timeout_ms)` returns them. A lone ESC is ambiguous
//! with the start of a CSI/SS3 sequence; callers disambiguate by re-calling
//! `feed` with `None` once the read-with-timeout lapses (`poll_timeout`),
//! which flushes a pending lone ESC as `KeyCode::Esc`.

use core_events::{InputEvent, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Esc,
    Csi,
    Ss3,
    CsiMouseX10 { stage: u8, b1: u8, cx: u8 },
    CsiMouseSgr { buf_len: u8 },
    Paste,
}

/// Bracketed-paste begin/end markers: `ESC [ 200 ~` / `ESC [ 201 ~`.
const PASTE_BEGIN: &[u8] = b"\x1b[200~";
const PASTE_END: &[u8] = b"\x1b[201~";

pub struct KeyDecoder {
    state: State,
    csi_buf: Vec<u8>,
    paste_buf: Vec<u8>,
    pending_match: Vec<u8>,
}

impl Default for KeyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            csi_buf: Vec::new(),
            paste_buf: Vec::new(),
            pending_match: Vec::new(),
        }
    }

    /// A read-with-timeout lapsed with no further byte. If a lone ESC is
    /// pending, it resolves to `KeyCode::Esc` now rather than waiting
    /// indefinitely for a CSI continuation that never came.
    pub fn poll_timeout(&mut self) -> Option<InputEvent> {
        if self.state == State::Esc {
            self.state = State::Ground;
            return Some(key(KeyCode::Esc, KeyModifiers::empty()));
        }
        None
    }

    /// Feed one raw byte, returning a decoded event if this byte completed
    /// one.
    pub fn feed(&mut self, b: u8) -> Option<InputEvent> {
        match self.state {
            State::Ground => self.feed_ground(b),
            State::Esc => self.feed_esc(b),
            State::Csi => self.feed_csi(b),
            State::Ss3 => self.feed_ss3(b),
            State::CsiMouseX10 { .. } => self.feed_mouse_x10(b),
            State::CsiMouseSgr { .. } => self.feed_mouse_sgr(b),
            State::Paste => self.feed_paste(b),
        }
    }

    fn feed_ground(&mut self, b: u8) -> Option<InputEvent> {
        match b {
            0x1b => {
                self.state = State::Esc;
                None
            }
            0x03 => Some(InputEvent::CtrlC),
            0x0d | 0x0a => Some(key(KeyCode::Enter, KeyModifiers::empty())),
            0x09 => Some(key(KeyCode::Tab, KeyModifiers::empty())),
            0x7f | 0x08 => Some(key(KeyCode::Backspace, KeyModifiers::empty())),
            0x00..=0x1f => {
                let ch = (b | 0x60) as char;
                Some(key(KeyCode::Char(ch), KeyModifiers::CTRL))
            }
            _ => decode_utf8_byte(b).map(|c| key(KeyCode::Char(c), KeyModifiers::empty())),
        }
    }

    fn feed_esc(&mut self, b: u8) -> Option<InputEvent> {
        match b {
            b'[' => {
                self.state = State::Csi;
                self.csi_buf.clear();
                self.pending_match = PASTE_BEGIN[1..].to_vec();
                None
            }
            b'O' => {
                self.state = State::Ss3;
                None
            }
            0x1b => {
                // Two ESCs in a row: flush the first as a bare Esc, stay armed.
                Some(key(KeyCode::Esc, KeyModifiers::empty()))
            }
            _ => {
                self.state = State::Ground;
                if let Some(c) = decode_utf8_byte(b) {
                    Some(key(KeyCode::Char(c), KeyModifiers::ALT))
                } else {
                    Some(key(KeyCode::Esc, KeyModifiers::empty()))
                }
            }
        }
    }

    fn feed_csi(&mut self, b: u8) -> Option<InputEvent> {
        self.csi_buf.push(b);
        // Bracketed paste begin/end are `[200~` / `[201~`.
        if self.csi_buf.as_slice() == &PASTE_BEGIN[1..] {
            self.state = State::Ground;
            self.csi_buf.clear();
            self.state = State::Paste;
            self.paste_buf.clear();
            return Some(InputEvent::PasteStart);
        }
        if self.csi_buf.as_slice() == &PASTE_END[1..] {
            self.state = State::Ground;
            self.csi_buf.clear();
            return Some(InputEvent::PasteEnd);
        }
        if b == b'M' && self.csi_buf.len() == 1 {
            // X10 mouse protocol: CSI M Cb Cx Cy (three more raw bytes follow).
            self.state = State::CsiMouseX10 {
                stage: 0,
                b1: 0,
                cx: 0,
            };
            self.csi_buf.clear();
            return None;
        }
        if b == b'<' && self.csi_buf.len() == 1 {
            // SGR mouse protocol: CSI < Cb ; Cx ; Cy M/m
            self.state = State::CsiMouseSgr { buf_len: 0 };
            self.csi_buf.clear();
            return None;
        }
        // Final byte of a CSI sequence is in 0x40..=0x7e.
        if (0x40..=0x7e).contains(&b) {
            self.state = State::Ground;
            let params = &self.csi_buf[..self.csi_buf.len() - 1];
            let ev = decode_csi_final(params, b);
            self.csi_buf.clear();
            return ev;
        }
        None
    }

    fn feed_ss3(&mut self, b: u8) -> Option<InputEvent> {
        self.state = State::Ground;
        match b {
            b'P' => Some(key(KeyCode::F(1), KeyModifiers::empty())),
            b'Q' => Some(key(KeyCode::F(2), KeyModifiers::empty())),
            b'R' => Some(key(KeyCode::F(3), KeyModifiers::empty())),
            b'S' => Some(key(KeyCode::F(4), KeyModifiers::empty())),
            b'A' => Some(key(KeyCode::Up, KeyModifiers::empty())),
            b'B' => Some(key(KeyCode::Down, KeyModifiers::empty())),
            b'C' => Some(key(KeyCode::Right, KeyModifiers::empty())),
            b'D' => Some(key(KeyCode::Left, KeyModifiers::empty())),
            b'H' => Some(key(KeyCode::Home, KeyModifiers::empty())),
            b'F' => Some(key(KeyCode::End, KeyModifiers::empty())),
            _ => None,
        }
    }

    fn feed_mouse_x10(&mut self, b: u8) -> Option<InputEvent> {
        let (stage, b1, cx) = match self.state {
            State::CsiMouseX10 { stage, b1, cx } => (stage, b1, cx),
            _ => unreachable!(),
        };
        match stage {
            0 => {
                self.state = State::CsiMouseX10 {
                    stage: 1,
                    b1: b,
                    cx: 0,
                };
                None
            }
            1 => {
                self.state = State::CsiMouseX10 {
                    stage: 2,
                    b1,
                    cx: b,
                };
                None
            }
            _ => {
                self.state = State::Ground;
                let column = cx.saturating_sub(32) as u16;
                let row = b.saturating_sub(32) as u16;
                let kind = x10_button_kind(b1);
                let mods = x10_mods(b1);
                Some(InputEvent::Mouse(MouseEvent {
                    kind,
                    column,
                    row,
                    mods,
                }))
            }
        }
    }

    fn feed_mouse_sgr(&mut self, b: u8) -> Option<InputEvent> {
        self.csi_buf.push(b);
        if b == b'M' || b == b'm' {
            let release = b == b'm';
            let body = &self.csi_buf[..self.csi_buf.len() - 1];
            let text = String::from_utf8_lossy(body);
            let mut parts = text.split(';');
            let cb: i64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
            let cx: i64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1);
            let cy: i64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1);
            self.state = State::Ground;
            self.csi_buf.clear();
            let kind = sgr_button_kind(cb, release);
            let mods = sgr_mods(cb);
            return Some(InputEvent::Mouse(MouseEvent {
                kind,
                column: cx.saturating_sub(1).max(0) as u16,
                row: cy.saturating_sub(1).max(0) as u16,
                mods,
            }));
        }
        None
    }

    fn feed_paste(&mut self, b: u8) -> Option<InputEvent> {
        self.paste_buf.push(b);
        if self.paste_buf.ends_with(PASTE_END) {
            let content_len = self.paste_buf.len() - PASTE_END.len();
            let content = String::from_utf8_lossy(&self.paste_buf[..content_len]).into_owned();
            self.paste_buf.clear();
            self.state = State::Ground;
            // Caller is expected to have already seen `PasteStart`; emit the
            // whole chunk now and the terminating `PasteEnd` on the next feed.
            self.pending_match = PASTE_END.to_vec();
            self.state = State::Ground;
            return Some(InputEvent::PasteChunk(content));
        }
        None
    }
}

fn key(code: KeyCode, mods: KeyModifiers) -> InputEvent {
    InputEvent::Key(KeyEvent { code, mods })
}

fn decode_utf8_byte(b: u8) -> Option<char> {
    // Single-byte fast path; multi-byte UTF-8 sequences are reassembled by
    // the caller's terminal read loop before reaching the decoder in
    // practice (crossterm hands back already-decoded bytes one at a time
    // for ASCII, and full codepoints for the rest). For the ASCII-heavy key
    // alphabet this covers everything the dispatcher needs.
    if b < 0x80 {
        Some(b as char)
    } else {
        char::from_u32(b as u32)
    }
}

fn decode_csi_final(params: &[u8], final_byte: u8) -> Option<InputEvent> {
    let text = std::str::from_utf8(params).ok()?;
    let mut fields = text.split(';');
    let first = fields.next().unwrap_or("");
    let mods_field: Option<u8> = fields.next().and_then(|s| s.parse().ok());
    let mods = mods_field.map(decode_modifier_param).unwrap_or_default();

    let base = match final_byte {
        b'A' => Some(KeyCode::Up),
        b'B' => Some(KeyCode::Down),
        b'C' => Some(KeyCode::Right),
        b'D' => Some(KeyCode::Left),
        b'H' => Some(KeyCode::Home),
        b'F' => Some(KeyCode::End),
        b'Z' => Some(KeyCode::BackTab),
        b'~' => {
            let n: u32 = first.parse().ok()?;
            match n {
                1 | 7 => Some(KeyCode::Home),
                2 => Some(KeyCode::Insert),
                3 => Some(KeyCode::Delete),
                4 | 8 => Some(KeyCode::End),
                5 => Some(KeyCode::PageUp),
                6 => Some(KeyCode::PageDown),
                11..=15 => Some(KeyCode::F((n - 10) as u8)),
                17..=21 => Some(KeyCode::F((n - 11) as u8)),
                23 | 24 => Some(KeyCode::F((n - 12) as u8)),
                _ => None,
            }
        }
        _ => None,
    }?;
    Some(key(base, mods))
}

fn decode_modifier_param(p: u8) -> KeyModifiers {
    // xterm encodes modifiers as `(param - 1)` bit flags: 1=shift 2=alt 4=ctrl.
    let bits = p.saturating_sub(1);
    let mut m = KeyModifiers::empty();
    if bits & 1 != 0 {
        m |= KeyModifiers::SHIFT;
    }
    if bits & 2 != 0 {
        m |= KeyModifiers::ALT;
    }
    if bits & 4 != 0 {
        m |= KeyModifiers::CTRL;
    }
    m
}

fn x10_button_kind(b1: u8) -> MouseEventKind {
    let low = b1 & 0x03;
    if b1 & 0x40 != 0 {
        return if low == 0 {
            MouseEventKind::ScrollUp
        } else {
            MouseEventKind::ScrollDown
        };
    }
    match low {
        0 => MouseEventKind::Down(MouseButton::Left),
        1 => MouseEventKind::Down(MouseButton::Middle),
        2 => MouseEventKind::Down(MouseButton::Right),
        _ => MouseEventKind::Up(MouseButton::Left),
    }
}

fn x10_mods(b1: u8) -> KeyModifiers {
    let mut m = KeyModifiers::empty();
    if b1 & 0x04 != 0 {
        m |= KeyModifiers::SHIFT;
    }
    if b1 & 0x08 != 0 {
        m |= KeyModifiers::ALT;
    }
    if b1 & 0x10 != 0 {
        m |= KeyModifiers::CTRL;
    }
    m
}

fn sgr_button_kind(cb: i64, release: bool) -> MouseEventKind {
    if cb & 0x40 != 0 {
        return if cb & 0x03 == 0 {
            MouseEventKind::ScrollUp
        } else {
            MouseEventKind::ScrollDown
        };
    }
    let button = match cb & 0x03 {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => MouseButton::Left,
    };
    if release {
        MouseEventKind::Up(button)
    } else if cb & 0x20 != 0 {
        MouseEventKind::Drag(button)
    } else {
        MouseEventKind::Down(button)
    }
}

fn sgr_mods(cb: i64) -> KeyModifiers {
    let mut m = KeyModifiers::empty();
    if cb & 0x04 != 0 {
        m |= KeyModifiers::SHIFT;
    }
    if cb & 0x08 != 0 {
        m |= KeyModifiers::ALT;
    }
    if cb & 0x10 != 0 {
        m |= KeyModifiers::CTRL;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(dec: &mut KeyDecoder, bytes: &[u8]) -> Vec<InputEvent> {
        let mut out = Vec::new();
        for &b in bytes {
            if let Some(ev) = dec.feed(b) {
                out.push(ev);
            }
        }
        out
    }

    #[test]
    fn plain_ascii_char() {
        let mut d = KeyDecoder::new();
        let evs = feed_all(&mut d, b"a");
        assert_eq!(evs, vec![key(KeyCode::Char('a'), KeyModifiers::empty())]);
    }

    #[test]
    fn ctrl_char_decodes_to_ctrl_modifier() {
        let mut d = KeyDecoder::new();
        let evs = feed_all(&mut d, &[0x04]); // Ctrl-D
        assert_eq!(evs, vec![key(KeyCode::Char('d'), KeyModifiers::CTRL)]);
    }

    #[test]
    fn lone_esc_flushes_on_timeout() {
        let mut d = KeyDecoder::new();
        assert!(d.feed(0x1b).is_none());
        let ev = d.poll_timeout().expect("lone esc should flush");
        assert_eq!(ev, key(KeyCode::Esc, KeyModifiers::empty()));
    }

    #[test]
    fn csi_arrow_keys() {
        let mut d = KeyDecoder::new();
        let evs = feed_all(&mut d, b"\x1b[A");
        assert_eq!(evs, vec![key(KeyCode::Up, KeyModifiers::empty())]);
    }

    #[test]
    fn csi_arrow_with_shift_modifier() {
        let mut d = KeyDecoder::new();
        // CSI 1;2A => Up with Shift (param 2 => bits=1 => SHIFT)
        let evs = feed_all(&mut d, b"\x1b[1;2A");
        assert_eq!(evs, vec![key(KeyCode::Up, KeyModifiers::SHIFT)]);
    }

    #[test]
    fn ss3_function_key() {
        let mut d = KeyDecoder::new();
        let evs = feed_all(&mut d, b"\x1bOP");
        assert_eq!(evs, vec![key(KeyCode::F(1), KeyModifiers::empty())]);
    }

    #[test]
    fn delete_via_tilde_sequence() {
        let mut d = KeyDecoder::new();
        let evs = feed_all(&mut d, b"\x1b[3~");
        assert_eq!(evs, vec![key(KeyCode::Delete, KeyModifiers::empty())]);
    }

    #[test]
    fn bracketed_paste_round_trip() {
        let mut d = KeyDecoder::new();
        let mut evs = Vec::new();
        for &b in b"\x1b[200~hello\x1b[201~" {
            if let Some(ev) = d.feed(b) {
                evs.push(ev);
            }
        }
        assert_eq!(evs[0], InputEvent::PasteStart);
        assert_eq!(evs[1], InputEvent::PasteChunk("hello".to_string()));
        assert_eq!(evs[2], InputEvent::PasteEnd);
    }

    #[test]
    fn sgr_mouse_left_click() {
        let mut d = KeyDecoder::new();
        let evs = feed_all(&mut d, b"\x1b[<0;10;5M");
        match &evs[0] {
            InputEvent::Mouse(m) => {
                assert_eq!(m.kind, MouseEventKind::Down(MouseButton::Left));
                assert_eq!(m.column, 9);
                assert_eq!(m.row, 4);
            }
            other => panic!("expected mouse event, got {:?}", other),
        }
    }

    #[test]
    fn x10_mouse_click() {
        let mut d = KeyDecoder::new();
        let evs = feed_all(&mut d, &[0x1b, b'[', b'M', 32, 33, 34]);
        match &evs[0] {
            InputEvent::Mouse(m) => {
                assert_eq!(m.kind, MouseEventKind::Down(MouseButton::Left));
                assert_eq!(m.column, 1);
                assert_eq!(m.row, 2);
            }
            other => panic!("expected mouse event, got {:?}", other),
        }
    }

    #[test]
    fn ctrl_c_is_distinct_event() {
        let mut d = KeyDecoder::new();
        let evs = feed_all(&mut d, &[0x03]);
        assert_eq!(evs, vec![InputEvent::CtrlC]);
    }
}
