//! `:s/pattern/replacement/g?i?` (spec.md §4.5).
//!
//! Operates directly on `core_text::Document`; history recording is the
//! caller's responsibility (the dispatcher layer wraps each cell
//! delete/insert pair it performs here into `core-state` history records,
//! the same way any other edit is recorded).

use core_text::Document;

use crate::matcher::subsearch_matches;
use crate::pattern::Pattern;

/// Replace matches of `pattern` with `replacement` across
/// `[from_line, to_line]` inclusive. `global` mirrors the `g` flag: continue
/// scanning the rest of the line after a replacement instead of stopping at
/// the first match per line. Returns the total number of replacements
/// performed (spec.md §4.5: "Reports total replacement count").
pub fn replace_range(
    doc: &mut Document,
    from_line: usize,
    to_line: usize,
    pattern: &Pattern,
    replacement: &str,
    global: bool,
    ignorecase: bool,
) -> usize {
    let replacement_chars: Vec<char> = replacement.chars().collect();
    let mut total = 0usize;
    if doc.line_count() == 0 {
        return 0;
    }
    let last = to_line.min(doc.line_count() - 1);
    for line_no in from_line..=last {
        let mut col = 0usize;
        loop {
            let matched_len = {
                let Some(line) = doc.line(line_no) else { break };
                if col > line.len() {
                    break;
                }
                subsearch_matches(line, col, pattern, ignorecase)
            };
            let Some(matched_len) = matched_len else {
                col += 1;
                continue;
            };
            let line = doc.line_mut(line_no).expect("checked above");
            line.delete(col, matched_len).expect("match length within bounds");
            if !replacement_chars.is_empty() {
                line.insert_cells(col, &replacement_chars.iter().map(|c| core_text::Cell::from_char(*c)).collect::<Vec<_>>())
                    .expect("insert at valid offset");
            }
            total += 1;
            col += replacement_chars.len();
            if matched_len == 0 && replacement_chars.is_empty() {
                col += 1; // guarantee forward progress on a zero-width, zero-length replace
            }
            if !global {
                break;
            }
        }
    }
    total
}
