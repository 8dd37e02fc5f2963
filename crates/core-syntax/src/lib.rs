//! Per-line incremental syntax highlighting (spec.md §4.4).
//!
//! A [`Registry`] maps a syntax name to a [`Highlighter`]. [`recalculate_syntax`]
//! re-paints a [`core_text::Document`] starting at a given line, carrying an
//! opaque `i32` state from line to line and stopping once the carry state
//! converges (the line that follows already has the state this pass would
//! hand it). This is the *contract* only: the source editor's actual
//! per-language tables are out of scope (spec.md §1); tests here exercise a
//! couple of small illustrative highlighters instead of a real grammar.

pub mod nested;
pub mod registry;
pub mod scanner;

pub use nested::BandDelegate;
pub use registry::{Highlighter, PlainHighlighter, Registry, SyntaxDef};
pub use scanner::{Scanner, clear_classification};

use core_text::Document;
use tracing::trace;

/// Re-run the active syntax's highlighter over `doc` starting at
/// `start_line`, per spec.md §4.4:
///
/// 1. Zero classification flags on the line.
/// 2. Run the highlighter until it returns a terminal/next-line state.
/// 3. If that state differs from the *next* line's stored entry state,
///    overwrite it and recurse onto that next line; this terminates
///    because the line count is finite and istate differences strictly
///    decrease the remaining suffix that can disagree.
///
/// Returns the number of lines actually re-painted. A no-op (returns `0`)
/// when the document has no assigned syntax or the assigned name is not
/// registered.
pub fn recalculate_syntax(doc: &mut Document, registry: &Registry, start_line: usize) -> usize {
    let Some(name) = doc.syntax_id.clone() else {
        return 0;
    };
    let Some(def) = registry.get(&name) else {
        trace!(target: "syntax", %name, "no highlighter registered, skipping recalculation");
        return 0;
    };

    let mut line_no = start_line;
    let mut touched = 0usize;
    loop {
        if line_no >= doc.line_count() {
            break;
        }
        let entry_state = doc.line(line_no).map(|l| l.istate).unwrap_or(-1);
        let exit_state = {
            let line = doc
                .line_mut(line_no)
                .expect("line_no checked in bounds above");
            clear_classification(line);
            def.highlighter.calculate(line, entry_state)
        };
        touched += 1;
        trace!(target: "syntax", line_no, entry_state, exit_state, "recalculated line");

        if line_no + 1 >= doc.line_count() {
            break;
        }
        let next_entry = doc.line(line_no + 1).map(|l| l.istate).unwrap_or(-1);
        if next_entry == exit_state {
            break; // converged: downstream lines already assume this state
        }
        doc.line_mut(line_no + 1).expect("bounds checked above").istate = exit_state;
        line_no += 1;
    }
    touched
}

/// Recalculate the whole document from line 0, used after a full reload
/// (spec.md §4.3: history recording is suppressed while loading, but
/// syntax still needs an initial full pass once loading completes).
pub fn recalculate_syntax_full(doc: &mut Document, registry: &Registry) -> usize {
    if let Some(line) = doc.line_mut(0) {
        line.istate = -1;
    }
    recalculate_syntax(doc, registry, 0)
}
