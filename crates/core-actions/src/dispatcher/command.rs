//! Command line editing & execution (`:q`, `:e <file>`, `:w`, `:metrics`).

use super::DispatchResult;
use super::command_parser::{CommandParser, ParsedCommand};
use crate::Action;
use crate::io_ops::{OpenFileResult, WriteFileResult, open_file, write_file};
use core_state::EditorState;

pub(crate) fn handle_command_action(action: Action, state: &mut EditorState) -> DispatchResult {
    match action {
        Action::CommandStart => {
            state.command_line.begin(':');
            DispatchResult::dirty()
        }
        Action::CommandChar(ch) => {
            state.command_line.push_char(ch);
            DispatchResult::dirty()
        }
        Action::CommandBackspace => {
            state.command_line.backspace();
            DispatchResult::dirty()
        }
        Action::CommandCancel => {
            state.command_line.clear();
            DispatchResult::dirty()
        }
        Action::CommandExecute(cmd) => execute_command(cmd, state),
        _ => unreachable!("non-command action routed to command handler"),
    }
}

fn execute_command(raw: String, state: &mut EditorState) -> DispatchResult {
    let parsed = CommandParser::parse(&raw);
    let result = match parsed {
        ParsedCommand::Quit { force } => {
            if !force && state.active_slot().modified() {
                state.set_ephemeral(
                    "Unsaved changes (use :q! to discard)",
                    std::time::Duration::from_secs(3),
                );
                DispatchResult::dirty()
            } else {
                DispatchResult::quit()
            }
        }
        ParsedCommand::Write { path, .. } => handle_write(path, state),
        ParsedCommand::Edit { force, path } => handle_edit(force, path, state),
        ParsedCommand::Metrics => {
            use core_state::{METRICS_OVERLAY_DEFAULT_LINES, OverlayMode};
            let new_mode = state.toggle_metrics_overlay(METRICS_OVERLAY_DEFAULT_LINES);
            match new_mode {
                OverlayMode::Metrics { lines } => {
                    state.set_ephemeral(
                        format!("Metrics overlay ON ({} lines)", lines),
                        std::time::Duration::from_secs(2),
                    );
                }
                OverlayMode::None => {
                    state.set_ephemeral("Metrics overlay OFF", std::time::Duration::from_secs(2));
                }
            }
            tracing::info!(target: "runtime.metrics", kind = ":metrics_toggle", mode = ?new_mode);
            DispatchResult::dirty()
        }
        ParsedCommand::Substitute {
            whole_file,
            pattern,
            replacement,
            global,
            ignorecase,
        } => handle_substitute(whole_file, &pattern, &replacement, global, ignorecase, state),
        ParsedCommand::Unknown(_) => DispatchResult::dirty(),
    };
    state.command_line.clear();
    result
}

fn handle_edit(
    force: bool,
    path: Option<std::path::PathBuf>,
    state: &mut EditorState,
) -> DispatchResult {
    let Some(path) = path else {
        state.set_ephemeral("No filename", std::time::Duration::from_secs(3));
        return DispatchResult::dirty();
    };
    if !force && state.active_slot().modified() {
        state.set_ephemeral(
            "Unsaved changes (use :e! to discard)",
            std::time::Duration::from_secs(3),
        );
        return DispatchResult::dirty();
    }
    match open_file(&path) {
        OpenFileResult::Success(s) => {
            let active = state.active;
            state.buffers[active] = s.slot;
            state.clear_selection();
            state.set_ephemeral("Opened", std::time::Duration::from_secs(3));
            if s.mixed_line_endings {
                tracing::warn!(target: "io", "mixed_line_endings_detected");
            }
            DispatchResult::buffer_replaced()
        }
        OpenFileResult::Error => {
            state.set_ephemeral("Open failed", std::time::Duration::from_secs(3));
            DispatchResult::dirty()
        }
    }
}

/// `:s/pattern/replacement/flags` and `:%s/.../.../flags` (spec.md §4.5,
/// §8 scenario 4). An explicit `i` flag forces case-insensitivity;
/// otherwise smart-case applies the same as interactive search.
fn handle_substitute(
    whole_file: bool,
    pattern: &str,
    replacement: &str,
    global: bool,
    ignorecase: bool,
    state: &mut EditorState,
) -> DispatchResult {
    let compiled = core_search::Pattern::compile(pattern);
    let opts = core_search::SearchOptions {
        smart_case: true,
        search_wraps: false,
    };
    let effective_ignorecase = ignorecase || core_search::effective_ignorecase(&compiled, opts);
    let last_line = state.document().line_count().saturating_sub(1);
    let (from, to) = if whole_file {
        (0, last_line)
    } else {
        let cursor_line = state.document().cursor.line;
        (cursor_line, cursor_line)
    };
    let count = core_search::replace_range(
        state.document_mut(),
        from,
        to,
        &compiled,
        replacement,
        global,
        effective_ignorecase,
    );
    if count > 0 {
        state.set_ephemeral(
            format!("replaced {count} instances of {pattern}"),
            std::time::Duration::from_secs(3),
        );
        DispatchResult::buffer_replaced()
    } else {
        state.set_ephemeral(
            format!("pattern not found: {pattern}"),
            std::time::Duration::from_secs(3),
        );
        DispatchResult::dirty()
    }
}

fn handle_write(path: Option<std::path::PathBuf>, state: &mut EditorState) -> DispatchResult {
    match write_file(state.active_slot_mut(), path.as_deref()) {
        WriteFileResult::Success => {
            state.set_ephemeral("Wrote", std::time::Duration::from_secs(3));
        }
        WriteFileResult::NoFilename => {
            tracing::error!(target: "runtime.command", "write_no_filename");
            state.set_ephemeral("No filename", std::time::Duration::from_secs(3));
        }
        WriteFileResult::Error => {
            state.set_ephemeral("Write failed", std::time::Duration::from_secs(3));
        }
    }
    DispatchResult::dirty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;
    use core_text::Document;

    fn state(text: &str) -> EditorState {
        EditorState::new(Document::from_text(text))
    }

    #[test]
    fn metrics_command_sets_ephemeral() {
        let mut st = state("abc\n");
        let _ = handle_command_action(Action::CommandStart, &mut st);
        let res = handle_command_action(
            Action::CommandExecute(":metrics".to_string()),
            &mut st,
        );
        assert!(res.dirty, "metrics command should mark dirty for status repaint");
        let eph = st.ephemeral_status.as_ref().expect("ephemeral status set");
        assert!(
            eph.text.starts_with("Metrics overlay ON"),
            "expected overlay toggle confirmation, got: {}",
            eph.text
        );
    }

    #[test]
    fn quit_without_force_on_clean_buffer_quits() {
        let mut st = state("abc\n");
        handle_command_action(Action::CommandStart, &mut st);
        let res = handle_command_action(Action::CommandExecute(":q".into()), &mut st);
        assert!(res.quit);
    }

    #[test]
    fn quit_without_force_on_modified_buffer_refuses() {
        let mut st = state("abc\n");
        st.insert_char('x');
        st.set_history_break();
        handle_command_action(Action::CommandStart, &mut st);
        let res = handle_command_action(Action::CommandExecute(":q".into()), &mut st);
        assert!(!res.quit);
        assert_eq!(
            st.ephemeral_status.as_ref().map(|m| m.text.as_str()),
            Some("Unsaved changes (use :q! to discard)")
        );
    }

    #[test]
    fn quit_force_on_modified_buffer_quits() {
        let mut st = state("abc\n");
        st.insert_char('x');
        st.set_history_break();
        handle_command_action(Action::CommandStart, &mut st);
        let res = handle_command_action(Action::CommandExecute(":q!".into()), &mut st);
        assert!(res.quit);
    }

    #[test]
    fn write_command_writes_file() {
        use std::io::Read;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("write_test.txt");
        let mut st = state("hello\n");
        st.active_slot_mut().file_name = Some(file_path.clone());
        handle_command_action(Action::CommandStart, &mut st);
        let res = handle_command_action(Action::CommandExecute(":w".into()), &mut st);
        assert!(res.dirty);
        assert!(!st.active_slot().modified(), "dirty flag should clear after write");
        let mut f = std::fs::File::open(&file_path).unwrap();
        let mut s = String::new();
        f.read_to_string(&mut s).unwrap();
        assert!(s.starts_with("hello"));
    }

    #[test]
    fn write_command_without_filename_keeps_modified() {
        let mut st = state("scratch\n");
        st.insert_char('!');
        st.set_history_break();
        handle_command_action(Action::CommandStart, &mut st);
        let res = handle_command_action(Action::CommandExecute(":w".into()), &mut st);
        assert!(res.dirty);
        assert!(st.active_slot().modified(), "dirty flag should remain when no filename");
        assert_eq!(
            st.ephemeral_status.as_ref().map(|m| m.text.as_str()),
            Some("No filename")
        );
    }

    #[test]
    fn edit_command_opens_file() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("sample.txt");
        {
            let mut f = std::fs::File::create(&file_path).unwrap();
            writeln!(f, "Hello Edit Command").unwrap();
        }
        let mut st = state("initial\n");
        handle_command_action(Action::CommandStart, &mut st);
        let res = handle_command_action(
            Action::CommandExecute(format!(":e {}", file_path.display())),
            &mut st,
        );
        assert!(res.dirty);
        assert!(st.active_slot().file_name.is_some());
        assert!(st.document().to_text().starts_with("Hello Edit Command"));
        assert!(!st.active_slot().modified(), "buffer must be clean after load");
        assert_eq!(
            st.ephemeral_status.as_ref().map(|m| m.text.as_str()),
            Some("Opened")
        );
    }

    #[test]
    fn edit_command_open_failure_sets_ephemeral() {
        let mut st = state("initial\n");
        handle_command_action(Action::CommandStart, &mut st);
        handle_command_action(
            Action::CommandExecute(":e non_existent_file_12345".into()),
            &mut st,
        );
        assert_eq!(
            st.ephemeral_status.as_ref().map(|m| m.text.as_str()),
            Some("Open failed")
        );
    }

    #[test]
    fn substitute_whole_file_global_reports_count() {
        let mut st = state("foo bar foo\nbaz foo\n");
        handle_command_action(Action::CommandStart, &mut st);
        let res = handle_command_action(
            Action::CommandExecute(":%s/foo/qux/g".into()),
            &mut st,
        );
        assert!(res.buffer_replaced);
        assert_eq!(st.document().to_text(), "qux bar qux\nbaz qux\n");
        assert_eq!(
            st.ephemeral_status.as_ref().map(|m| m.text.as_str()),
            Some("replaced 3 instances of foo")
        );
    }

    #[test]
    fn substitute_without_range_targets_current_line_only() {
        let mut st = state("foo\nfoo\n");
        handle_command_action(Action::CommandStart, &mut st);
        let res = handle_command_action(Action::CommandExecute(":s/foo/bar/".into()), &mut st);
        assert!(res.buffer_replaced);
        assert_eq!(st.document().line(0).unwrap().to_string_lossy(), "bar");
        assert_eq!(st.document().line(1).unwrap().to_string_lossy(), "foo");
    }

    #[test]
    fn substitute_no_match_reports_not_found() {
        let mut st = state("abc\n");
        handle_command_action(Action::CommandStart, &mut st);
        let res = handle_command_action(Action::CommandExecute(":%s/zzz/y/g".into()), &mut st);
        assert!(!res.buffer_replaced);
        assert_eq!(
            st.ephemeral_status.as_ref().map(|m| m.text.as_str()),
            Some("pattern not found: zzz")
        );
    }
}
