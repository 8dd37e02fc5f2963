//! Highlighter registration, keyed by syntax name and file extension.
//!
//! spec.md §3's Syntax Registry is `name -> {extensions[], calculate,
//! prefers_spaces, optional completion callbacks}`. The source populates a
//! global array of these via linker-constructor attributes (spec.md §9);
//! here a [`Registry`] is built explicitly at startup instead (the
//! "Constructor-based plugin registration" design note's prescribed fix).

use std::collections::HashMap;
use std::sync::Arc;

use core_text::{Line, SyntaxClass};

use crate::scanner::Scanner;

/// The per-line incremental highlighter contract (spec.md §4.4).
///
/// `calculate` receives the carry state entering `line` and must return the
/// carry state leaving it. `-1` conventionally means "line complete, no
/// continuation"; any other value is opaque to everything except the
/// highlighter that produced it (spec.md's nested-highlighter band
/// partitioning relies on this opacity).
pub trait Highlighter: Send + Sync {
    fn calculate(&self, line: &mut Line, state: i32) -> i32;
}

/// A highlighter with no knowledge of syntax at all: every line is
/// complete in one pass, no cells are painted. Used as the registry's
/// fallback for files with no recognized syntax and for `-S none`.
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn calculate(&self, _line: &mut Line, _state: i32) -> i32 {
        -1
    }
}

/// Illustrative highlighter for C-style `//` line comments and `/* ... */`
/// block comments that may span lines (spec.md §1 scopes per-language
/// tables out; this exercises the carry-state contract itself, not a real
/// grammar). Carry state `-1` means "not in a comment", `1` means "inside
/// an unterminated block comment".
pub struct CommentAwareHighlighter;

impl Highlighter for CommentAwareHighlighter {
    fn calculate(&self, line: &mut Line, state: i32) -> i32 {
        let mut scanner = Scanner::new(line);
        let mut in_block = state == 1;
        if in_block {
            loop {
                if scanner.at_end() {
                    return 1;
                }
                if scanner.charat() == Some('*') && scanner.peek(1) == Some('/') {
                    scanner.paint(SyntaxClass::Comment);
                    scanner.advance(1);
                    scanner.paint(SyntaxClass::Comment);
                    scanner.advance(1);
                    in_block = false;
                    break;
                }
                scanner.paint(SyntaxClass::Comment);
                scanner.advance(1);
            }
        }
        while !scanner.at_end() {
            if !in_block && scanner.charat() == Some('/') && scanner.peek(1) == Some('/') {
                while !scanner.at_end() {
                    scanner.paint(SyntaxClass::Comment);
                    scanner.advance(1);
                }
                break;
            }
            if !in_block && scanner.charat() == Some('/') && scanner.peek(1) == Some('*') {
                scanner.paint(SyntaxClass::Comment);
                scanner.advance(1);
                scanner.paint(SyntaxClass::Comment);
                scanner.advance(1);
                in_block = true;
                continue;
            }
            scanner.advance(1);
        }
        if in_block { 1 } else { -1 }
    }
}

#[derive(Clone)]
pub struct SyntaxDef {
    pub name: String,
    pub extensions: Vec<String>,
    /// Whether this language's idiomatic indent style prefers spaces over
    /// tabs (consulted by `core-text::Document::inherited_indent` callers
    /// when choosing how to materialize a new indent level).
    pub prefers_spaces: bool,
    pub highlighter: Arc<dyn Highlighter>,
}

impl SyntaxDef {
    pub fn new(name: impl Into<String>, highlighter: impl Highlighter + 'static) -> Self {
        SyntaxDef {
            name: name.into(),
            extensions: Vec::new(),
            prefers_spaces: false,
            highlighter: Arc::new(highlighter),
        }
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn prefers_spaces(mut self, prefers: bool) -> Self {
        self.prefers_spaces = prefers;
        self
    }
}

/// Registry of known syntaxes, keyed by name with a secondary
/// extension-to-name index for `open file.rs` lookups.
#[derive(Default)]
pub struct Registry {
    by_name: HashMap<String, SyntaxDef>,
    by_extension: HashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// A registry seeded with just the no-op [`PlainHighlighter`], the
    /// fallback every buffer starts with before a real syntax is detected
    /// or assigned.
    pub fn with_plain() -> Self {
        let mut reg = Registry::new();
        reg.register(SyntaxDef::new("plain", PlainHighlighter));
        reg
    }

    /// The registry the running editor seeds itself with: `plain` plus the
    /// illustrative comment-aware highlighter, registered against the
    /// common C-style-comment source extensions.
    pub fn builtin() -> Self {
        let mut reg = Registry::with_plain();
        reg.register(
            SyntaxDef::new("comment-aware", CommentAwareHighlighter)
                .with_extensions(&[
                    "rs", "c", "h", "cpp", "hpp", "cc", "js", "ts", "jsx", "tsx", "go", "java",
                ]),
        );
        reg
    }

    pub fn register(&mut self, def: SyntaxDef) {
        for ext in &def.extensions {
            self.by_extension.insert(ext.to_ascii_lowercase(), def.name.clone());
        }
        self.by_name.insert(def.name.clone(), def);
    }

    pub fn get(&self, name: &str) -> Option<&SyntaxDef> {
        self.by_name.get(name)
    }

    /// Resolve a syntax by the file's extension, e.g. `"rs"` -> the
    /// registered language whose `extensions` list includes it.
    pub fn for_extension(&self, ext: &str) -> Option<&SyntaxDef> {
        self.by_extension
            .get(&ext.to_ascii_lowercase())
            .and_then(|name| self.by_name.get(name))
    }

    /// Resolve a syntax for a filename by its trailing extension (the part
    /// after the last `.`), falling back to `None` for extensionless names.
    pub fn for_filename(&self, filename: &str) -> Option<&SyntaxDef> {
        let ext = filename.rsplit('.').next()?;
        if ext == filename {
            return None; // no dot at all
        }
        self.for_extension(ext)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        let mut reg = Registry::with_plain();
        reg.register(SyntaxDef::new("plain", PlainHighlighter).with_extensions(&["txt"]));
        assert!(reg.for_extension("TXT").is_some());
        assert!(reg.for_filename("notes.TXT").is_some());
        assert!(reg.for_filename("noext").is_none());
    }
}
