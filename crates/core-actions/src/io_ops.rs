//! File IO helpers used by the `:e`/`:w` command handlers.
//!
//! Loading normalizes whatever line ending convention the file used
//! into the cell model, then records the detected convention on the
//! `Document` so a later save round-trips it faithfully. Trailing
//! newline presence needs no separate bookkeeping: `Document::from_text`
//! / `to_text` already encode it as a trailing empty line.

use core_state::{BufferSlot, DetectedLineEnding, normalize_line_endings};
use core_text::{Document, LineEnding};

/// Result of attempting to open a file.
#[derive(Debug)]
pub enum OpenFileResult {
    Success(OpenSuccess),
    Error,
}

#[derive(Debug)]
pub struct OpenSuccess {
    pub slot: BufferSlot,
    pub mixed_line_endings: bool,
}

/// Load `path` into a fresh `BufferSlot`, normalizing whatever line
/// ending convention it was written with.
pub fn open_file(path: &std::path::Path) -> OpenFileResult {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let norm = normalize_line_endings(&content);
            let mut document = Document::from_text(&norm.normalized);
            document.line_ending = match norm.original {
                DetectedLineEnding::CrLf => LineEnding::CrLf,
                DetectedLineEnding::Lf | DetectedLineEnding::Cr => LineEnding::Lf,
            };
            let mut slot = BufferSlot::new(document);
            slot.file_name = Some(path.to_path_buf());
            slot.original_line_ending = norm.original;
            slot.had_trailing_newline = norm.had_trailing_newline;
            slot.mark_saved();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                slot.document.syntax_id = crate::syntax_support::registry_for_filename(name);
            }
            OpenFileResult::Success(OpenSuccess {
                slot,
                mixed_line_endings: norm.mixed,
            })
        }
        Err(e) => {
            tracing::error!(target: "io", ?e, "file_open_error");
            OpenFileResult::Error
        }
    }
}

/// Result of a write attempt.
#[derive(Debug)]
pub enum WriteFileResult {
    Success,
    NoFilename,
    Error,
}

/// Write the active buffer's contents to `target`, or its own
/// `file_name` when `target` is `None`.
pub fn write_file(
    slot: &mut BufferSlot,
    target: Option<&std::path::Path>,
) -> WriteFileResult {
    let path = match target.map(|p| p.to_path_buf()).or_else(|| slot.file_name.clone()) {
        Some(p) => p,
        None => return WriteFileResult::NoFilename,
    };
    match std::fs::write(&path, slot.document.to_text()) {
        Ok(()) => {
            slot.file_name = Some(path);
            slot.mark_saved();
            WriteFileResult::Success
        }
        Err(e) => {
            tracing::error!(target: "io", ?e, "file_write_error");
            WriteFileResult::Error
        }
    }
}
