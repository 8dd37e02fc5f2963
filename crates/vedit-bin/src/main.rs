//! vedit entrypoint: CLI parsing, startup diagnostics, and the synchronous
//! run loop that drives terminal I/O straight into the dispatcher.
use anyhow::Result;
use clap::Parser;
use core_actions::dispatcher::dispatch;
use core_actions::{Action, EditKind, KeyTranslator};
use core_config::{Config, ConfigContext, ConfigPlatformTraits};
use core_events::{InputEvent, KeyEvent};
use core_model::{EditorModel, Layout};
use core_render::apply::{
    CursorOnlyFrame, FrameSnapshot, LinesPartialFrame, ScrollShiftFrame, apply_cursor_only,
    apply_full, apply_lines_partial, apply_scroll_shift,
};
use core_render::dirty::DirtyLinesTracker;
use core_render::render_engine::{RenderEngine, build_status_line_with_ephemeral};
use core_render::scheduler::{RenderDelta, RenderDeltaMetricsSnapshot, RenderScheduler};
use core_render::timing::record_last_render_ns;
use core_state::{BufferSlot, EditorState, RenderDeltaSnapshotLite, RenderPathSnapshotLite};
use core_terminal::{CrosstermBackend, CrosstermIo, KeyDecoder, TerminalBackend, TerminalIo};
use std::io::Read as _;
use std::path::PathBuf;
use std::sync::Once;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const STATUS_ROWS: u16 = 1;
const POLL_TIMEOUT_MS: u64 = 80;

/// Supported `:` commands, mirrored here for `--dump-commands` since the
/// parser that owns this list lives private to `core-actions`.
const COMMANDS: &[(&str, &str)] = &[
    ("q", "quit, refusing if the active buffer is modified"),
    ("q!", "quit, discarding unsaved changes"),
    ("w", "write the active buffer to its file name"),
    ("w!", "write, overwriting a read-only target"),
    ("e", "replace the active buffer with another file"),
    ("e!", "replace, discarding unsaved changes"),
    ("metrics", "toggle the render/operator metrics overlay"),
];

/// CLI surface. Positional paths may carry a trailing `:line` (e.g.
/// `src/main.rs:42`); `-` reads the initial buffer from stdin.
#[derive(Parser, Debug)]
#[command(name = "vedit", version, about = "A modal terminal text editor core")]
struct Args {
    /// Files to open. Each may end in `:line` to place the cursor there.
    /// `-` reads the first buffer from stdin.
    paths: Vec<String>,

    /// Open every buffer read-only.
    #[arg(short = 'R', long = "readonly")]
    readonly: bool,

    /// Load configuration from this file instead of discovering `vedit.toml`.
    #[arg(short = 'u', long = "config")]
    config: Option<PathBuf>,

    /// Session file to restore/persist through (accepted and logged; no
    /// session format beyond the config-adjacent persistence contract).
    #[arg(short = 'S', long = "session")]
    session: Option<PathBuf>,

    /// Run this `:` command on startup. Repeatable; runs in order after
    /// buffers are loaded and before the first frame is drawn.
    #[arg(short = 'c', long = "command")]
    command: Vec<String>,

    /// Enable legacy-compatibility behavior.
    #[arg(short = 'C', long = "compat")]
    compat: bool,

    /// Toggle an optional feature. Repeatable.
    #[arg(short = 'O', long = "feature")]
    feature: Vec<String>,

    /// Unsupported in this core; reports `EditorError::Unsupported` and exits.
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// Print the active key->action table and exit.
    #[arg(long = "dump-mappings")]
    dump_mappings: bool,

    /// Print the supported `:` commands and exit.
    #[arg(long = "dump-commands")]
    dump_commands: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long = "dump-config")]
    dump_config: bool,
}

/// Split `path[:line]`. A trailing `:N` is consumed only when it parses and
/// the remaining path is non-empty, so Windows-style drive letters and
/// ordinary colon-free paths fall through unchanged.
fn parse_path_spec(spec: &str) -> (&str, Option<usize>) {
    if spec == "-" {
        return (spec, None);
    }
    if let Some(idx) = spec.rfind(':') {
        let (path, tail) = spec.split_at(idx);
        let line = &tail[1..];
        if !path.is_empty() {
            if let Ok(n) = line.parse::<usize>() {
                return (path, Some(n));
            }
        }
    }
    (spec, None)
}

fn place_cursor_at_line(slot: &mut BufferSlot, line: usize) {
    let target = line.saturating_sub(1).min(slot.document.line_count().saturating_sub(1));
    slot.document.cursor.line = target;
    slot.document.cursor.cell = 0;
}

fn load_stdin_slot() -> Result<BufferSlot> {
    let mut content = String::new();
    std::io::stdin().read_to_string(&mut content)?;
    let norm = core_state::normalize_line_endings(&content);
    let document = core_text::Document::from_text(&norm.normalized);
    Ok(BufferSlot::new(document))
}

fn dump_mappings() {
    use core_keymap::{Mode as KMode, Overlay};
    let mut table = core_keymap::baseline();
    let modes = [
        (KMode::Normal, "normal"),
        (KMode::Insert, "insert"),
        (KMode::Replace, "replace"),
        (KMode::LineSelection, "line_selection"),
        (KMode::CharSelection, "char_selection"),
        (KMode::ColSelection, "col_selection"),
        (KMode::ColInsert, "col_insert"),
        (KMode::DirectoryBrowse, "directory_browse"),
    ];
    for (mode, name) in modes {
        for binding in table.map(mode).iter() {
            println!(
                "{:<16} {:<16} {:<28} {}",
                name, binding.key, binding.action.id.0, binding.action.description
            );
        }
    }
    for binding in table.navigation_mut().iter() {
        println!(
            "{:<16} {:<16} {:<28} {}",
            "navigation", binding.key, binding.action.id.0, binding.action.description
        );
    }
    for binding in table.escape_mut().iter() {
        println!(
            "{:<16} {:<16} {:<28} {}",
            "escape", binding.key, binding.action.id.0, binding.action.description
        );
    }
    for (overlay, name) in [
        (Overlay::Command, "command_overlay"),
        (Overlay::SearchForward, "search_overlay"),
    ] {
        for binding in table.overlay_mut(overlay).iter() {
            println!(
                "{:<16} {:<16} {:<28} {}",
                name, binding.key, binding.action.id.0, binding.action.description
            );
        }
    }
}

fn dump_commands() {
    for (name, description) in COMMANDS {
        println!(":{:<10} {}", name, description);
    }
}

/// Owns the terminal and the log appender guard across the process
/// lifetime; everything that must run before a frame can be drawn lives
/// behind `run`.
struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

struct RuntimeContext<'a> {
    model: EditorModel,
    config: Config,
    platform_traits: ConfigPlatformTraits,
    terminal_guard: core_terminal::TerminalGuard<'a>,
}

struct EditorBootstrap {
    model: EditorModel,
    config: Config,
    platform_traits: ConfigPlatformTraits,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    fn run<'a>(&'a mut self, args: &Args) -> Result<RuntimeContext<'a>> {
        self.configure_logging()?;
        Self::install_panic_hook();

        info!(target: "runtime", "startup");
        self.backend.set_title("vedit")?;
        let guard = self.backend.enter_guard()?;

        let bootstrap = Self::load_editor_state(args)?;
        if let Some(session) = &args.session {
            info!(target: "runtime.startup", session = %session.display(), "session_flag_accepted");
        }
        info!(
            target: "runtime.startup",
            buffers = bootstrap.model.state().buffers.len(),
            readonly = args.readonly,
            compat = bootstrap.config.file.compat,
            effective_margin = bootstrap.config.effective_vertical_margin,
            "bootstrap_complete"
        );

        Ok(RuntimeContext {
            model: bootstrap.model,
            config: bootstrap.config,
            platform_traits: bootstrap.platform_traits,
            terminal_guard: guard,
        })
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = std::path::Path::new(".");
        let log_path = log_dir.join("vedit.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "vedit.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => self.log_guard = Some(guard),
            Err(_) => {}
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }

    fn load_editor_state(args: &Args) -> Result<EditorBootstrap> {
        let (mut slots, open_failed) = load_buffer_slots(args)?;

        // `EditorState::new` only accepts a bare `Document` to seed slot 0,
        // so build the state around a placeholder document and then swap
        // in the fully populated first slot (file name, history, detected
        // line ending) that `io_ops::open_file` already built.
        let mut state = EditorState::new(core_text::Document::new());
        state.buffers[0] = slots.remove(0);
        state.buffers.extend(slots);
        state.active = 0;

        if open_failed {
            state.set_ephemeral("Open failed", std::time::Duration::from_secs(3));
        }

        let mut config = core_config::load_from(args.config.clone())?;
        config.file.compat = config.file.compat || args.compat;
        for feature in &args.feature {
            if !config.file.features.contains(feature) {
                config.file.features.push(feature.clone());
            }
        }

        let terminal_caps = core_terminal::TerminalCapabilities::detect();
        let platform_traits =
            ConfigPlatformTraits::new(cfg!(windows), terminal_caps.supports_scroll_region);
        if let Ok((w, h)) = crossterm::terminal::size() {
            let ctx = ConfigContext::new(w, h, STATUS_ROWS, 0, platform_traits);
            config.apply_context(ctx);
        }
        let mut model = EditorModel::new(state);
        model.state_mut().config_vertical_margin = config.effective_vertical_margin as usize;

        for raw in &args.command {
            let cmd = if raw.starts_with(':') {
                raw.clone()
            } else {
                format!(":{raw}")
            };
            let mut sticky = None;
            let result = dispatch(
                Action::CommandExecute(cmd),
                &mut model,
                &mut sticky,
                &[],
            );
            if result.quit {
                break;
            }
        }

        Ok(EditorBootstrap {
            model,
            config,
            platform_traits,
        })
    }
}

/// Loads one `BufferSlot` per CLI path argument (or a single scratch buffer
/// when none were given). Additional paths beyond the first become extra
/// buffers rather than extra views or splits; `core-model`'s view manager
/// currently asserts a single active view, so multi-file startup widens the
/// buffer list instead of attempting a real split.
fn load_buffer_slots(args: &Args) -> Result<(Vec<BufferSlot>, bool)> {
    let mut slots = Vec::new();
    let mut open_failed = false;

    if args.paths.is_empty() {
        slots.push(BufferSlot::new(core_text::Document::new()));
        return Ok((slots, open_failed));
    }

    for spec in &args.paths {
        let (path_str, line) = parse_path_spec(spec);
        let mut slot = if path_str == "-" {
            load_stdin_slot()?
        } else {
            match core_actions::io_ops::open_file(std::path::Path::new(path_str)) {
                core_actions::io_ops::OpenFileResult::Success(success) => {
                    if success.mixed_line_endings {
                        warn!(target: "io", path = path_str, "mixed_line_endings_detected_startup");
                    }
                    success.slot
                }
                core_actions::io_ops::OpenFileResult::Error => {
                    error!(target: "io", path = path_str, "file_open_error");
                    open_failed = true;
                    let mut slot = BufferSlot::new(core_text::Document::new());
                    slot.file_name = Some(PathBuf::from(path_str));
                    slot
                }
            }
        };
        if args.readonly {
            slot.document.readonly = true;
        }
        if let Some(line) = line {
            place_cursor_at_line(&mut slot, line);
        }
        slots.push(slot);
    }
    Ok((slots, open_failed))
}

fn lite_path_snapshot(m: &core_render::partial_metrics::RenderPathMetricsSnapshot) -> RenderPathSnapshotLite {
    RenderPathSnapshotLite {
        full_frames: m.full_frames,
        partial_frames: m.partial_frames,
        cursor_only_frames: m.cursor_only_frames,
        lines_frames: m.lines_frames,
        dirty_lines_repainted: m.dirty_lines_repainted,
        last_full_render_ns: m.last_full_render_ns,
        last_partial_render_ns: m.last_partial_render_ns,
    }
}

fn lite_delta_snapshot(m: &RenderDeltaMetricsSnapshot) -> RenderDeltaSnapshotLite {
    RenderDeltaSnapshotLite {
        full: m.full,
        lines: m.lines,
        scroll: m.scroll,
        status_line: m.status_line,
        cursor_only: m.cursor_only,
    }
}

fn render_frame(
    engine: &mut RenderEngine,
    scheduler: &mut RenderScheduler,
    dirty: &mut DirtyLinesTracker,
    model: &EditorModel,
    w: u16,
    h: u16,
) -> Result<()> {
    let Some(decision) = scheduler.consume() else {
        return Ok(());
    };
    let state = model.state();
    let view = model.active_view();
    let layout = Layout::single(w, h);
    let status_line = build_status_line_with_ephemeral(state, view, w);
    let snapshot = FrameSnapshot::new(state, view, &layout, w, h, &status_line);

    match decision.effective {
        RenderDelta::Full => {
            let start = Instant::now();
            apply_full(engine, snapshot)?;
            record_last_render_ns(start.elapsed().as_nanos() as u64);
        }
        RenderDelta::CursorOnly | RenderDelta::StatusLine => {
            apply_cursor_only(engine, CursorOnlyFrame::new(snapshot))?;
        }
        RenderDelta::Lines(range) => {
            if !range.is_empty() {
                dirty.mark_range(range.start, range.end - 1);
            }
            apply_lines_partial(engine, LinesPartialFrame::new(snapshot, dirty))?;
        }
        RenderDelta::Scroll {
            old_first,
            new_first,
        } => {
            apply_scroll_shift(engine, ScrollShiftFrame::new(snapshot, old_first, new_first))?;
        }
    }
    Ok(())
}

/// Returns `true` when the editor should quit.
fn handle_input_event(
    event: InputEvent,
    model: &mut EditorModel,
    translator: &mut KeyTranslator,
    sticky_visual_col: &mut Option<usize>,
    scheduler: &mut RenderScheduler,
) -> Result<bool> {
    match event {
        InputEvent::CtrlC => Ok(true),
        InputEvent::Key(key) => Ok(handle_key(key, model, translator, sticky_visual_col, scheduler)),
        InputEvent::PasteStart | InputEvent::PasteEnd => Ok(false),
        InputEvent::PasteChunk(text) => {
            for ch in text.chars() {
                let result = dispatch(
                    Action::Edit(EditKind::InsertChar(ch)),
                    model,
                    sticky_visual_col,
                    &[],
                );
                if result.quit {
                    return Ok(true);
                }
            }
            scheduler.mark(RenderDelta::Full);
            Ok(false)
        }
        InputEvent::Resize(_, _) => {
            scheduler.mark(RenderDelta::Full);
            Ok(false)
        }
        InputEvent::Mouse(_) | InputEvent::FocusGained | InputEvent::FocusLost => Ok(false),
    }
}

fn handle_key(
    key: KeyEvent,
    model: &mut EditorModel,
    translator: &mut KeyTranslator,
    sticky_visual_col: &mut Option<usize>,
    scheduler: &mut RenderScheduler,
) -> bool {
    let mode = model.state().document().mode;
    let pending_command = model.state().command_line.buffer().to_string();
    let Some(action) = translator.translate(mode, &pending_command, &key) else {
        return false;
    };
    let is_command_action = matches!(
        action,
        Action::CommandStart
            | Action::CommandChar(_)
            | Action::CommandBackspace
            | Action::CommandCancel
            | Action::CommandExecute(_)
            | Action::SearchStart(_)
            | Action::SearchExecute(_)
    );
    let is_motion = matches!(action, Action::Motion(_) | Action::MotionWithCount { .. });

    let result = dispatch(action, model, sticky_visual_col, &[]);

    if result.buffer_replaced {
        scheduler.mark(RenderDelta::Full);
    } else if is_command_action {
        scheduler.mark_status();
    } else if is_motion {
        scheduler.mark(RenderDelta::CursorOnly);
    } else if result.dirty {
        let line = model.state().document().cursor.line;
        scheduler.mark(RenderDelta::Lines(line..line + 1));
    }

    result.quit
}

fn run_editor(ctx: &mut RuntimeContext<'_>) -> Result<()> {
    let mut io = CrosstermIo::new();
    let mut decoder = KeyDecoder::new();
    let mut translator = KeyTranslator::new();
    let mut sticky_visual_col: Option<usize> = None;
    let mut scheduler = RenderScheduler::new();
    let mut engine = RenderEngine::new();
    let mut dirty_tracker = DirtyLinesTracker::new();

    scheduler.mark(RenderDelta::Full);

    loop {
        let (w, h) = crossterm::terminal::size()?;
        let text_height = h.saturating_sub(STATUS_ROWS);
        {
            let (state, view) = ctx.model.split_state_and_active_view();
            let old_first = view.viewport_first_line;
            if view.auto_scroll(state, text_height as usize) {
                scheduler.mark(RenderDelta::Scroll {
                    old_first,
                    new_first: view.viewport_first_line,
                });
            }
        }

        render_frame(&mut engine, &mut scheduler, &mut dirty_tracker, &ctx.model, w, h)?;
        ctx.model.state_mut().last_render_path =
            Some(lite_path_snapshot(&engine.metrics_snapshot()));
        ctx.model.state_mut().last_render_delta =
            Some(lite_delta_snapshot(&scheduler.metrics_snapshot()));

        match io.read_byte(POLL_TIMEOUT_MS)? {
            Some(byte) => {
                if let Some(event) = decoder.feed(byte) {
                    if handle_input_event(
                        event,
                        &mut ctx.model,
                        &mut translator,
                        &mut sticky_visual_col,
                        &mut scheduler,
                    )? {
                        break;
                    }
                }
            }
            None => {
                if let Some(event) = decoder.poll_timeout() {
                    if handle_input_event(
                        event,
                        &mut ctx.model,
                        &mut translator,
                        &mut sticky_visual_col,
                        &mut scheduler,
                    )? {
                        break;
                    }
                }
                if ctx.model.state_mut().tick_ephemeral() {
                    scheduler.mark_status();
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.dump_mappings {
        dump_mappings();
        return Ok(());
    }
    if args.dump_commands {
        dump_commands();
        return Ok(());
    }
    if args.dump_config {
        let config = core_config::load_from(args.config.clone())?;
        print!("{}", config.dump_toml()?);
        return Ok(());
    }
    if let Some(path) = &args.html {
        let err = core_state::EditorError::Unsupported("--html");
        eprintln!("{}: {}", path.display(), err);
        std::process::exit(1);
    }

    let mut startup = AppStartup::new();
    let mut ctx = startup.run(&args)?;
    // `ctx.terminal_guard` restores the terminal on drop; scoping `run_editor`
    // ahead of it is enough, no explicit teardown call needed.
    run_editor(&mut ctx)
}
