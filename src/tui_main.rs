//! Terminal front end for quicklaunch.
//!
//! Uses ratatui + crossterm to draw the launcher popup and the config editor
//! from the `DisplayRow`s produced by `render::build_rows`.
//!
//! **No model logic here.** Tree edits go through `core::Editor`, launches
//! and filtering through `core::LauncherView`.

use std::cell::Cell;
use std::io::{self, Stdout};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::crossterm::event::{
    self as ct_event, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Color as RColor;
use ratatui::Terminal;
use tracing::{info, warn};

use crate::core::{
    ConfigStore, ConfigWatcher, Editor, EditorAction, EntryId, HotkeyEvent, LauncherAction,
    LauncherView, ProcessSpawner,
};
use crate::icons;
use crate::render::{Color, DisplayRow, Theme};

// ─── Layout constants ─────────────────────────────────────────────────────────

const DETAIL_WIDTH: u16 = 40;
const PAGE_ROWS: isize = 10;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const LAUNCHER_HELP: &str =
    " Enter launch  \u{2191}\u{2193} move  type to search  Esc hide  Ctrl+E editor  Ctrl+Q quit";
const EDITOR_HELP: &str =
    " a app  f folder  e edit  d delete  m move  t move to top  s save  r reload  Esc back";

// ─── Session state ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pane {
    Launcher,
    Editor,
}

/// Which editor command a run of form prompts feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FormOp {
    AddApp,
    AddFolder,
    Edit { is_app: bool },
}

impl FormOp {
    fn wants_command(self) -> bool {
        matches!(self, FormOp::AddApp | FormOp::Edit { is_app: true })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FormField {
    Name,
    Command,
    Icon,
}

/// What the command-line prompt is collecting.
#[derive(Clone, Debug)]
enum PromptKind {
    Field(FormOp, FormField),
    DeleteConfirm(String),
}

/// State for an active prompt shown in the command line area.
struct EditorPrompt {
    kind: PromptKind,
    input: String,
}

struct App {
    launcher: LauncherView,
    editor: Editor,
    pane: Pane,
    prompt: Option<EditorPrompt>,
    /// Entry picked up with `m`, waiting for a drop target.
    moving: Option<EntryId>,
    /// Outcome of the last editor command. An error stays on the status
    /// line until the next key acknowledges it.
    last_action: EditorAction,
    /// Set by the editor's save hook, consumed by the event loop.
    saved: Rc<Cell<bool>>,
    watcher: Option<ConfigWatcher>,
    spawner: ProcessSpawner,
    quit: bool,
}

impl App {
    fn new(store: ConfigStore) -> Self {
        let launcher = LauncherView::new(store.clone());
        let mut editor = Editor::new(store.clone());

        let saved = Rc::new(Cell::new(false));
        let flag = saved.clone();
        editor.notifier_mut().attach(move || flag.set(true));

        let watcher = match ConfigWatcher::new(store.path()) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!("config watcher unavailable: {}", e);
                None
            }
        };

        Self {
            launcher,
            editor,
            pane: Pane::Launcher,
            prompt: None,
            moving: None,
            last_action: EditorAction::None,
            saved,
            watcher,
            spawner: ProcessSpawner,
            quit: false,
        }
    }

    /// Deliver pending change notifications.
    fn tick(&mut self) {
        if self.saved.replace(false) {
            self.launcher.on_config_changed();
        }
        if self.watcher.as_ref().is_some_and(|w| w.poll()) {
            self.launcher.on_config_changed();
            let action = self.editor.on_external_change();
            self.record(action);
        }
    }

    fn record(&mut self, action: EditorAction) {
        self.last_action = action;
    }

    fn has_error(&self) -> bool {
        self.last_action == EditorAction::Error
    }

    fn hotkey(&mut self, event: HotkeyEvent) {
        match self.launcher.handle_hotkey(event) {
            LauncherAction::OpenEditor => self.pane = Pane::Editor,
            LauncherAction::None => self.pane = Pane::Launcher,
        }
    }

    // =======================================================================
    // Key dispatch
    // =======================================================================

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => {
                    self.quit = true;
                    return;
                }
                KeyCode::Char(' ') | KeyCode::Null => {
                    self.hotkey(HotkeyEvent::ToggleVisibility);
                    return;
                }
                KeyCode::Char('e') => {
                    self.hotkey(HotkeyEvent::OpenEditor);
                    return;
                }
                _ => {}
            }
        }
        if let Some(prompt) = self.prompt.take() {
            self.handle_prompt_key(prompt, key);
            return;
        }
        if self.pane == Pane::Editor && self.has_error() {
            // The key only dismisses the error.
            self.last_action = EditorAction::None;
            self.editor.clear_message();
            return;
        }
        match self.pane {
            Pane::Launcher => self.launcher_key(key),
            Pane::Editor => self.editor_key(key),
        }
    }

    fn launcher_key(&mut self, key: KeyEvent) {
        if !self.launcher.is_visible() {
            return;
        }
        self.launcher.clear_status();
        match key.code {
            KeyCode::Up => self.launcher.move_selection(-1),
            KeyCode::Down => self.launcher.move_selection(1),
            KeyCode::PageUp => self.launcher.move_selection(-PAGE_ROWS),
            KeyCode::PageDown => self.launcher.move_selection(PAGE_ROWS),
            KeyCode::Home => self.launcher.select(0),
            KeyCode::End => self.launcher.select(usize::MAX),
            KeyCode::Enter => self.launcher.activate_selected(&self.spawner),
            KeyCode::Left | KeyCode::Right => {
                let expand = key.code == KeyCode::Right;
                let target = self
                    .launcher
                    .selected_row()
                    .filter(|row| row.is_folder && row.is_expanded != expand)
                    .and_then(|row| row.entry);
                if let Some(id) = target {
                    self.launcher.toggle_folder(id);
                }
            }
            KeyCode::Esc => {
                if self.launcher.query().is_empty() {
                    self.hotkey(HotkeyEvent::ToggleVisibility);
                } else {
                    self.launcher.set_query("");
                }
            }
            KeyCode::Backspace => {
                let mut query = self.launcher.query().to_string();
                query.pop();
                self.launcher.set_query(&query);
            }
            KeyCode::Char(c) => {
                let query = format!("{}{}", self.launcher.query(), c);
                self.launcher.set_query(&query);
            }
            _ => {}
        }
    }

    fn editor_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                if self.moving.take().is_some() {
                    self.editor.clear_message();
                } else {
                    self.pane = Pane::Launcher;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.editor.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.editor.move_selection(1),
            KeyCode::PageUp => self.editor.move_selection(-PAGE_ROWS),
            KeyCode::PageDown => self.editor.move_selection(PAGE_ROWS),
            KeyCode::Char('a') => self.start_form(FormOp::AddApp),
            KeyCode::Char('f') => self.start_form(FormOp::AddFolder),
            KeyCode::Char('e') | KeyCode::Enter => {
                if self.moving.is_some() {
                    self.drop_moving(false);
                    return;
                }
                let Some(is_app) = self
                    .editor
                    .selected()
                    .and_then(|id| self.editor.tree().get(id))
                    .map(|e| !e.is_folder())
                else {
                    let action = self.editor.edit_selected();
                    self.record(action);
                    return;
                };
                let action = self.editor.edit_selected();
                self.record(action);
                self.prompt = Some(EditorPrompt {
                    kind: PromptKind::Field(FormOp::Edit { is_app }, FormField::Name),
                    input: self.editor.form.name.clone(),
                });
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let name = self
                    .editor
                    .selected()
                    .and_then(|id| self.editor.tree().get(id))
                    .map(|entry| entry.name.clone());
                match name {
                    Some(name) => {
                        self.prompt = Some(EditorPrompt {
                            kind: PromptKind::DeleteConfirm(name),
                            input: String::new(),
                        });
                    }
                    None => {
                        let action = self.editor.remove_selected();
                        self.record(action);
                    }
                }
            }
            KeyCode::Char('m') => {
                if self.moving.is_some() {
                    self.drop_moving(false);
                } else if let Some(id) = self.editor.selected() {
                    self.moving = Some(id);
                }
            }
            KeyCode::Char('t') => {
                if self.moving.is_some() {
                    self.drop_moving(true);
                }
            }
            KeyCode::Char('s') => {
                let action = self.editor.save();
                self.record(action);
            }
            KeyCode::Char('r') => {
                let action = self.editor.reload_from_disk();
                self.record(action);
            }
            _ => {}
        }
    }

    fn start_form(&mut self, op: FormOp) {
        self.editor.cancel_edit();
        self.prompt = Some(EditorPrompt {
            kind: PromptKind::Field(op, FormField::Name),
            input: String::new(),
        });
    }

    /// Place the entry picked up with `m`: into the selected folder, before
    /// the selected app, or at the end of the top level.
    fn drop_moving(&mut self, to_top: bool) {
        let Some(moving) = self.moving.take() else {
            return;
        };
        let (parent, index) = if to_top {
            (None, None)
        } else {
            let Some(target) = self.editor.selected().filter(|t| *t != moving) else {
                return;
            };
            let tree = self.editor.tree();
            match tree.get(target) {
                Some(entry) if entry.is_folder() => (Some(target), None),
                Some(entry) => {
                    let index = tree
                        .children(entry.parent)
                        .iter()
                        .filter(|id| **id != moving)
                        .position(|id| *id == target);
                    (entry.parent, index)
                }
                None => return,
            }
        };
        self.editor.select(Some(moving));
        let action = self.editor.move_selected(parent, index);
        self.record(action);
    }

    // =======================================================================
    // Prompt handling
    // =======================================================================

    fn handle_prompt_key(&mut self, mut prompt: EditorPrompt, key: KeyEvent) {
        if let PromptKind::DeleteConfirm(_) = prompt.kind {
            if key.code == KeyCode::Char('y') {
                let action = self.editor.remove_selected();
                self.record(action);
            }
            return;
        }
        match key.code {
            KeyCode::Esc => self.editor.cancel_edit(),
            KeyCode::Enter => self.submit_prompt(prompt),
            KeyCode::Backspace => {
                prompt.input.pop();
                self.prompt = Some(prompt);
            }
            KeyCode::Char(c) => {
                prompt.input.push(c);
                self.prompt = Some(prompt);
            }
            _ => self.prompt = Some(prompt),
        }
    }

    fn submit_prompt(&mut self, prompt: EditorPrompt) {
        let PromptKind::Field(op, field) = prompt.kind else {
            return;
        };
        let form = &mut self.editor.form;
        let next = match field {
            FormField::Name => {
                form.name = prompt.input;
                Some(if op.wants_command() {
                    FormField::Command
                } else {
                    FormField::Icon
                })
            }
            FormField::Command => {
                form.command = prompt.input;
                Some(FormField::Icon)
            }
            FormField::Icon => {
                form.icon = prompt.input;
                None
            }
        };

        match next {
            Some(field) => {
                let input = match field {
                    FormField::Name => form.name.clone(),
                    FormField::Command => form.command.clone(),
                    FormField::Icon => form.icon.clone(),
                };
                self.prompt = Some(EditorPrompt {
                    kind: PromptKind::Field(op, field),
                    input,
                });
            }
            None => {
                let action = match op {
                    FormOp::AddApp => self.editor.add_app(),
                    FormOp::AddFolder => self.editor.add_folder(),
                    FormOp::Edit { .. } => self.editor.apply_edit(),
                };
                self.record(action);
            }
        }
    }
}

// ─── Public entry point ───────────────────────────────────────────────────────

/// Load both document copies, set up the terminal, run the event loop, and
/// restore the terminal on exit.
pub fn run(store: ConfigStore) -> anyhow::Result<()> {
    let mut app = App::new(store);

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().context("clear terminal")?;

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        event_loop(&mut terminal, &mut app)
    }));

    restore_terminal(&mut terminal);

    match result {
        Ok(result) => result,
        Err(e) => std::panic::resume_unwind(e),
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) {
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
}

// ─── Event loop ───────────────────────────────────────────────────────────────

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> anyhow::Result<()> {
    let theme = Theme::onedark();
    info!(entries = app.launcher.tree().len(), "launcher ready");

    while !app.quit {
        app.tick();
        terminal
            .draw(|frame| draw_frame(frame, app, &theme))
            .context("draw frame")?;

        if !ct_event::poll(POLL_INTERVAL).context("poll terminal events")? {
            continue;
        }
        if let Event::Key(key) = ct_event::read().context("read terminal event")? {
            app.handle_key(key);
        }
    }
    Ok(())
}

// ─── Frame rendering ──────────────────────────────────────────────────────────

fn draw_frame(frame: &mut ratatui::Frame, app: &App, theme: &Theme) {
    let area = frame.area();
    let buf = frame.buffer_mut();
    fill(buf, area, rc(theme.foreground), rc(theme.background));

    if app.pane == Pane::Launcher && !app.launcher.is_visible() {
        render_hidden(buf, area, theme);
        return;
    }

    // ── Vertical split: [header(1)] / [main] / [status(1)] / [cmd(1)] ────────
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);
    let (header_area, main_area, status_area, cmd_area) =
        (v_chunks[0], v_chunks[1], v_chunks[2], v_chunks[3]);

    match app.pane {
        Pane::Launcher => {
            let launcher = &app.launcher;
            let header = format!(" \u{f002} {}", launcher.query());
            render_line(buf, header_area, &header, rc(theme.prompt_fg), rc(theme.background));
            render_rows(
                buf,
                main_area,
                launcher.rows(),
                Some(launcher.selected()),
                None,
                theme,
            );
            let left = launcher.status().map(|s| format!(" {s}")).unwrap_or_default();
            let right = format!("{} entries ", launcher.tree().len());
            render_status_line(buf, status_area, &left, &right, rc(theme.status_fg), theme);
            render_line(buf, cmd_area, LAUNCHER_HELP, rc(theme.subtitle_fg), rc(theme.background));
        }
        Pane::Editor => {
            let editor = &app.editor;
            let dirty = if editor.is_dirty() { " [+]" } else { "" };
            let header = format!(
                " CONFIG EDITOR  {}{}",
                editor.store().path().display(),
                dirty
            );
            render_line(buf, header_area, &header, rc(theme.status_fg), rc(theme.status_bg));

            let h_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(DETAIL_WIDTH)])
                .split(main_area);
            render_rows(
                buf,
                h_chunks[0],
                editor.rows(),
                editor.selected_index(),
                app.moving,
                theme,
            );
            render_details(buf, h_chunks[1], app, theme);

            let left = match (app.moving, editor.message()) {
                (Some(_), _) => {
                    " Moving: select a folder or entry and press m (t for top level)".to_string()
                }
                (None, Some(msg)) => format!(" {msg}"),
                (None, None) => String::new(),
            };
            if app.has_error() {
                let right = "any key to dismiss ";
                render_status_line(buf, status_area, &left, right, rc(theme.error_fg), theme);
            } else {
                render_status_line(buf, status_area, &left, "", rc(theme.status_fg), theme);
            }

            match &app.prompt {
                Some(prompt) => {
                    let text = prompt_text(prompt);
                    render_prompt_line(buf, cmd_area, &text, theme);
                }
                None => {
                    render_line(buf, cmd_area, EDITOR_HELP, rc(theme.subtitle_fg), rc(theme.background))
                }
            }
        }
    }
}

fn prompt_text(prompt: &EditorPrompt) -> String {
    match &prompt.kind {
        PromptKind::Field(op, field) => {
            let what = match op {
                FormOp::AddApp => "New app",
                FormOp::AddFolder => "New folder",
                FormOp::Edit { .. } => "Edit",
            };
            let label = match field {
                FormField::Name => "name",
                FormField::Command => "command",
                FormField::Icon => "icon path (optional)",
            };
            format!(" {what} {label}: {}", prompt.input)
        }
        PromptKind::DeleteConfirm(name) => format!(" Delete '{}'? (y/n)", name),
    }
}

fn render_hidden(buf: &mut Buffer, area: Rect, theme: &Theme) {
    let text = "quicklaunch is hidden. Ctrl+Space to show, Ctrl+Q to quit.";
    let y = area.y + area.height / 2;
    let width = text.chars().count() as u16;
    let x = area.x + area.width.saturating_sub(width) / 2;
    put_str(buf, x, y, area.x + area.width, text, rc(theme.subtitle_fg), rc(theme.background));
}

// ─── Entry list ───────────────────────────────────────────────────────────────

fn render_rows(
    buf: &mut Buffer,
    area: Rect,
    rows: &[DisplayRow],
    selected: Option<usize>,
    marked: Option<EntryId>,
    theme: &Theme,
) {
    if area.height == 0 {
        return;
    }
    if rows.is_empty() {
        put_str(
            buf,
            area.x + 1,
            area.y,
            area.x + area.width,
            "No entries",
            rc(theme.subtitle_fg),
            rc(theme.background),
        );
        return;
    }

    let height = area.height as usize;
    let scroll_top = selected.map_or(0, |s| s.saturating_sub(height - 1));
    let right = area.x + area.width;

    for (i, row) in rows.iter().skip(scroll_top).take(height).enumerate() {
        let y = area.y + i as u16;
        let is_selected = selected == Some(scroll_top + i);
        let (label_fg, sub_fg, bg) = if is_selected {
            (rc(theme.selection_fg), rc(theme.selection_fg), rc(theme.selection_bg))
        } else if marked.is_some() && marked == row.entry {
            (rc(theme.marked_fg), rc(theme.marked_fg), rc(theme.background))
        } else if row.is_folder {
            (rc(theme.folder_fg), rc(theme.subtitle_fg), rc(theme.background))
        } else {
            (rc(theme.app_fg), rc(theme.subtitle_fg), rc(theme.background))
        };

        for x in area.x..right {
            set_cell(buf, x, y, ' ', label_fg, bg);
        }
        let mut x = area.x + 1 + (row.depth as u16) * 2;
        x = put_str(buf, x, y, right, icons::entry_icon(row), label_fg, bg);
        x = put_str(buf, x + 1, y, right, &row.label, label_fg, bg);
        if !row.is_folder && !row.subtitle.is_empty() {
            put_str(buf, x + 2, y, right, &row.subtitle, sub_fg, bg);
        }
    }
}

fn render_details(buf: &mut Buffer, area: Rect, app: &App, theme: &Theme) {
    let editor = &app.editor;
    let fg = rc(theme.foreground);
    let dim = rc(theme.subtitle_fg);
    let bg = rc(theme.status_bg);
    fill(buf, area, fg, bg);
    if area.width == 0 {
        return;
    }
    for y in area.y..area.y + area.height {
        set_cell(buf, area.x, y, '\u{2502}', rc(theme.border), bg);
    }
    let left = area.x + 1;
    let right = area.x + area.width;

    let mut lines: Vec<(String, RColor)> = Vec::new();
    match editor.selected().and_then(|id| editor.tree().get(id)) {
        Some(entry) => {
            let kind = if entry.is_folder() { "Folder" } else { "App" };
            lines.push((format!(" {kind}"), rc(theme.prompt_fg)));
            lines.push((format!(" Name:    {}", entry.name), fg));
            if let Some(command) = entry.command() {
                lines.push((format!(" Command: {command}"), fg));
            } else {
                lines.push((format!(" Entries: {}", entry.children().len()), fg));
            }
            let icon = entry.icon.as_deref().unwrap_or("-");
            lines.push((format!(" Icon:    {icon}"), fg));
        }
        None => lines.push((" Nothing selected".to_string(), dim)),
    }

    if editor.editing().is_some() || app.prompt.is_some() {
        let form = &editor.form;
        lines.push((String::new(), fg));
        lines.push((" Form".to_string(), rc(theme.prompt_fg)));
        lines.push((format!(" Name:    {}", form.name), fg));
        lines.push((format!(" Command: {}", form.command), fg));
        lines.push((format!(" Icon:    {}", form.icon), fg));
    }

    for (i, (text, color)) in lines.iter().enumerate() {
        if i as u16 >= area.height {
            break;
        }
        put_str(buf, left, area.y + i as u16, right, text, *color, bg);
    }
}

// ─── Status / prompt line ─────────────────────────────────────────────────────

fn render_status_line(
    buf: &mut Buffer,
    area: Rect,
    left: &str,
    right: &str,
    fg: RColor,
    theme: &Theme,
) {
    let bg = rc(theme.status_bg);
    render_line(buf, area, left, fg, bg);

    let right_len = right.chars().count() as u16;
    if right_len <= area.width {
        let rx = area.x + area.width - right_len;
        put_str(buf, rx, area.y, area.x + area.width, right, fg, bg);
    }
}

/// Render a one-line prompt in the command area with a block cursor.
fn render_prompt_line(buf: &mut Buffer, area: Rect, text: &str, theme: &Theme) {
    let fg = rc(theme.prompt_fg);
    let bg = rc(theme.background);
    render_line(buf, area, text, fg, bg);
    let x = area.x + text.chars().count() as u16;
    if x < area.x + area.width {
        if let Some(cell) = buf.cell_mut((x, area.y)) {
            cell.set_fg(bg).set_bg(fg);
        }
    }
}

// ─── Cell helpers ─────────────────────────────────────────────────────────────

/// Set a single buffer cell, ignoring coordinates outside the buffer.
fn set_cell(buf: &mut Buffer, x: u16, y: u16, ch: char, fg: RColor, bg: RColor) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_char(ch).set_fg(fg).set_bg(bg);
    }
}

/// Write `text` from `x` up to (not including) `max_x`. Returns the column
/// after the last character written.
fn put_str(buf: &mut Buffer, x: u16, y: u16, max_x: u16, text: &str, fg: RColor, bg: RColor) -> u16 {
    let mut x = x;
    for ch in text.chars() {
        if x >= max_x {
            break;
        }
        set_cell(buf, x, y, ch, fg, bg);
        x += 1;
    }
    x
}

fn render_line(buf: &mut Buffer, area: Rect, text: &str, fg: RColor, bg: RColor) {
    for x in area.x..area.x + area.width {
        set_cell(buf, x, area.y, ' ', fg, bg);
    }
    put_str(buf, area.x, area.y, area.x + area.width, text, fg, bg);
}

fn fill(buf: &mut Buffer, area: Rect, fg: RColor, bg: RColor) {
    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            set_cell(buf, x, y, ' ', fg, bg);
        }
    }
}

/// Convert a `render::Color` to a ratatui `Color::Rgb`.
#[inline]
fn rc(c: Color) -> RColor {
    RColor::Rgb(c.r, c.g, c.b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::crossterm::event::KeyEventState;
    use tempfile::{tempdir, TempDir};

    fn app() -> (TempDir, App) {
        let dir = tempdir().unwrap();
        let app = App::new(ConfigStore::new(dir.path().join("config.json")));
        (dir, app)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char(c))
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        let theme = Theme::onedark();
        terminal.draw(|f| draw_frame(f, app, &theme)).unwrap();
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_type_to_search_and_escape() {
        let (_dir, mut app) = app();
        type_text(&mut app, "calc");
        assert_eq!(app.launcher.query(), "calc");
        assert_eq!(app.launcher.rows().len(), 1);
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.launcher.query(), "cal");
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.launcher.query(), "");
        assert!(app.launcher.is_visible());
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.launcher.is_visible());
    }

    #[test]
    fn test_hotkeys_switch_panes() {
        let (_dir, mut app) = app();
        app.handle_key(ctrl('e'));
        assert_eq!(app.pane, Pane::Editor);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.pane, Pane::Launcher);
        app.handle_key(ctrl(' '));
        assert!(!app.launcher.is_visible());
        app.handle_key(ctrl('q'));
        assert!(app.quit);
    }

    #[test]
    fn test_add_app_through_prompts_then_save_reloads_launcher() {
        let (_dir, mut app) = app();
        app.handle_key(ctrl('e'));
        app.handle_key(key(KeyCode::Char('a')));
        type_text(&mut app, "Calc");
        app.handle_key(key(KeyCode::Enter));
        type_text(&mut app, "calc.exe");
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        assert!(app.prompt.is_none());
        assert_eq!(app.editor.current_document().apps.len(), 4);
        assert!(app.editor.is_dirty());

        app.handle_key(key(KeyCode::Char('s')));
        assert!(!app.editor.is_dirty());
        app.tick();
        assert_eq!(app.launcher.rows().len(), 5);
        assert_eq!(app.launcher.status(), Some("Config reloaded"));
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let (_dir, mut app) = app();
        app.handle_key(ctrl('e'));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char('d')));
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.editor.tree().len(), 4);

        app.handle_key(key(KeyCode::Char('d')));
        app.handle_key(key(KeyCode::Char('y')));
        assert_eq!(app.editor.tree().len(), 3);
    }

    #[test]
    fn test_move_before_app() {
        let (_dir, mut app) = app();
        app.handle_key(ctrl('e'));
        // Select Calculator, pick it up, drop it on Notepad.
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char('m')));
        app.handle_key(key(KeyCode::Up));
        app.handle_key(key(KeyCode::Char('m')));
        let names: Vec<String> = app
            .editor
            .current_document()
            .apps
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["Calculator", "Notepad", "Utilities"]);
    }

    #[test]
    fn test_launcher_screen_lists_entries() {
        let (_dir, app) = app();
        let text = screen_text(&app);
        assert!(text.contains("Notepad"));
        assert!(text.contains("notepad.exe"));
        assert!(text.contains("Command Prompt"));
        assert!(text.contains("4 entries"));
    }

    #[test]
    fn test_editor_screen_shows_details() {
        let (_dir, mut app) = app();
        app.handle_key(ctrl('e'));
        app.handle_key(key(KeyCode::Down));
        let text = screen_text(&app);
        assert!(text.contains("CONFIG EDITOR"));
        assert!(text.contains("Name:    Notepad"));
    }

    #[test]
    fn test_failed_save_shows_error_until_acknowledged() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes every write fail.
        let mut app = App::new(ConfigStore::new(dir.path()));
        app.handle_key(ctrl('e'));
        app.handle_key(key(KeyCode::Char('s')));
        assert_eq!(app.last_action, EditorAction::Error);

        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        let theme = Theme::onedark();
        terminal.draw(|f| draw_frame(f, &app, &theme)).unwrap();
        let buf = terminal.backend().buffer();
        let status_y = buf.area.height - 2;
        let status: String = (0..buf.area.width)
            .map(|x| buf[(x, status_y)].symbol())
            .collect();
        assert!(status.contains("Failed to write config file"), "{status}");
        assert!(status.contains("any key to dismiss"));
        assert_eq!(buf[(1, status_y)].fg, rc(theme.error_fg));

        // The acknowledging key is not treated as a command.
        let selected = app.editor.selected_index();
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.last_action, EditorAction::None);
        assert_eq!(app.editor.message(), None);
        assert_eq!(app.editor.selected_index(), selected);
        assert!(!screen_text(&app).contains("Failed to write"));

        app.handle_key(key(KeyCode::Down));
        assert_ne!(app.editor.selected_index(), selected);
    }

    #[test]
    fn test_refused_form_shows_error() {
        let (_dir, mut app) = app();
        app.handle_key(ctrl('e'));
        app.handle_key(key(KeyCode::Char('f')));
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.last_action, EditorAction::Error);
        assert!(screen_text(&app).contains("any key to dismiss"));
        assert_eq!(app.editor.tree().len(), 4);
    }

    #[test]
    fn test_details_panel_has_border() {
        let (_dir, mut app) = app();
        app.handle_key(ctrl('e'));
        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        let theme = Theme::onedark();
        terminal.draw(|f| draw_frame(f, &app, &theme)).unwrap();
        let buf = terminal.backend().buffer();
        let x = 100 - DETAIL_WIDTH;
        assert_eq!(buf[(x, 1)].symbol(), "\u{2502}");
        assert_eq!(buf[(x, 1)].fg, rc(theme.border));
    }
}
