//! Terminal capability probing (Refactor R3 Step 10).
//!
//! Breadth-first placeholder that records a minimal set of booleans the
//! renderer / scheduler can consult when deciding whether to attempt
//! scroll-region based optimizations or fall back to full line clears.
//!
//! Design considerations:
//! * Must be cheap: detection runs once at startup.
//! * Cross-platform: for now we optimistically enable scroll region support
//!   on all platforms where crossterm is used; later phases may refine by
//!   emitting a probe sequence and measuring terminal response.
//! * Extensible: struct is non-exhaustive (private field) so additional
//!   capabilities can be added without breaking downstream code.
//!
//! Future extensions (Phase 4+):
//! * Distinguish between absolute & relative scroll support.
//! * Detect truecolor vs 256-color fallbacks.
//! * Query bracketed paste / focus events / kitty keyboard protocols.
//! * Terminal width change debounce timings.
//!
//! Testing approach: current test asserts the optimistic defaults. Platform
//! divergence logic (when added) will come with targeted tests per branch.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct TerminalCapabilities {
    pub supports_scroll_region: bool,
    pub supports_alt_screen: bool,
    pub supports_bracketed_paste: bool,
    pub supports_mouse: bool,
    pub supports_truecolor: bool,
    pub supports_bce: bool,
}

impl TerminalCapabilities {
    pub fn detect() -> Self {
        // Optimistic defaults: crossterm emits the relevant escape sequences
        // on every terminal we target, and feature toggles (`-O noscroll`,
        // `-O nomouse`, ...) are the mechanism for opting back out rather
        // than runtime probing.
        Self {
            supports_scroll_region: true,
            supports_alt_screen: true,
            supports_bracketed_paste: true,
            supports_mouse: true,
            supports_truecolor: true,
            supports_bce: true,
        }
    }

    /// Apply `-O` feature-toggle names (spec §6: `noaltscreen`, `noscroll`,
    /// `nomouse`, `nounicode`, `nobright`, `nohideshow`, `nosyntax`,
    /// `nohistory`, `notitle`, `nobce`). Toggles unrelated to terminal
    /// capabilities (e.g. `nosyntax`, `nohistory`) are ignored here; they are
    /// applied by the caller against `Config`.
    pub fn apply_toggle(&mut self, name: &str) {
        match name {
            "noaltscreen" => self.supports_alt_screen = false,
            "noscroll" => self.supports_scroll_region = false,
            "nomouse" => self.supports_mouse = false,
            "nobce" => self.supports_bce = false,
            _ => {}
        }
    }
}
