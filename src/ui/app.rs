//! # Controller
//!
//! [`App`] owns everything the screen shows and reacts to input:
//!
//! - keyboard focus and the single activated button
//! - the status line and the shared command-output log
//! - the registry of dynamic labels started at launch
//! - the [`ProcessRunner`] every command is spawned through
//!
//! Output events are applied on the thread that calls [`App::pump_output`],
//! so none of this state is ever shared.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::style::Style;

use crate::command::{CellPos, CommandTable, Grid};
use crate::config::{Config, DisplayOptions};
use crate::process::{OutputTarget, ProcessRunner, ReplaceSink, RollingLogSink, StreamEvent};
use crate::ui::palette::{self, Palette};
use crate::warnings::Warnings;

/// How a button is drawn.
///
/// A button is either activated or not. When it is not, it shows its focus
/// look: `Focused` under the keyboard cursor, `Normal` everywhere else. A
/// button that loses activation to a click elsewhere therefore drops back
/// to one of these two, whichever its focus says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    /// Not activated and not under the keyboard cursor: the `button` style.
    Normal,
    /// Not activated, under the keyboard cursor: the `focused_button` style.
    Focused,
    /// The single activated button: the `activated_button` style.
    Activated,
}

impl ButtonState {
    pub fn palette_name(self) -> &'static str {
        match self {
            ButtonState::Normal => palette::BUTTON,
            ButtonState::Focused => palette::FOCUSED_BUTTON,
            ButtonState::Activated => palette::ACTIVATED_BUTTON,
        }
    }
}

/// A label whose text comes from a long-running process.
#[derive(Debug, Clone)]
pub struct DynamicLabelEntry {
    /// Label of the command, also the text shown before any output.
    pub label: String,
    /// Index of the command to run. Entries without one stay static.
    pub command: Option<usize>,
    /// Every grid cell showing this label.
    pub positions: Vec<CellPos>,
    pub sink: ReplaceSink,
    /// Palette entry the text is drawn with.
    pub style: String,
}

/// Direction for keyboard focus movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

pub struct App {
    pub commands: CommandTable,
    pub grid: Grid,
    pub options: DisplayOptions,
    pub palette: Palette,
    pub warnings: Warnings,
    pub status: String,
    pub command_output: RollingLogSink,
    pub dynamic_labels: Vec<DynamicLabelEntry>,
    pub focus: Option<CellPos>,
    pub active: Option<CellPos>,
    pub should_quit: bool,
    styles: HashMap<String, Style>,
    runner: ProcessRunner,
}

impl App {
    pub fn new(config: Config, grid: Grid, mut warnings: Warnings) -> Self {
        let Config {
            commands,
            display,
            palette,
            ..
        } = config;

        let dynamic_labels = register_dynamic_labels(&grid, &commands);
        let styles = resolve_styles(&palette, &display, &dynamic_labels, &mut warnings);
        let focus = grid.button_positions().first().copied();

        Self {
            commands,
            grid,
            options: display,
            palette,
            warnings,
            status: String::new(),
            command_output: RollingLogSink::new(),
            dynamic_labels,
            focus,
            active: None,
            should_quit: false,
            styles,
            runner: ProcessRunner::new(),
        }
    }

    /// Start the process behind every dynamic label. Failures are recorded
    /// as warnings and leave the label showing its own name.
    pub fn prime_dynamic_labels(&mut self) {
        for (index, entry) in self.dynamic_labels.iter().enumerate() {
            let Some(command) = entry.command.and_then(|i| self.commands.by_index(i)) else {
                continue;
            };
            match self
                .runner
                .spawn(&command.exec, OutputTarget::DynamicLabel { index })
            {
                Ok(id) => tracing::debug!(id, label = %entry.label, "started dynamic label"),
                Err(e) => self.warnings.error(format!(
                    "Error handling dynamic label creation ({}): {e}",
                    entry.label
                )),
            }
        }
    }

    /// Activate the button at `pos`: it becomes the focused and the
    /// activated button, the status line names it and its command is run.
    /// Positions that hold no button are ignored.
    pub fn click(&mut self, pos: CellPos) {
        let Some(cell) = self.grid.cell(pos).filter(|c| c.kind.is_button()) else {
            return;
        };
        let Some(command) = self.commands.by_index(cell.command) else {
            return;
        };

        self.status = format!("Last clicked: {}", command.label);
        if !self.palette.contains(palette::ACTIVATED_BUTTON) {
            self.warnings.warn(format!(
                "'{}' is missing from the PALETTE in your config.",
                palette::ACTIVATED_BUTTON
            ));
        }
        if let Some(previous) = self.active.replace(pos) {
            tracing::debug!(?previous, "deactivated button");
        }
        self.focus = Some(pos);

        let target = OutputTarget::CommandLog {
            label: command.label.clone(),
        };
        match self.runner.spawn(&command.exec, target) {
            Ok(id) => tracing::debug!(id, label = %command.label, "button command started"),
            Err(e) => self
                .warnings
                .error(format!("Error handling click ({}): {e}", command.label)),
        }
    }

    pub fn activate_focused(&mut self) {
        if let Some(pos) = self.focus {
            self.click(pos);
        }
    }

    /// Activation wins over focus. See [`ButtonState`].
    pub fn button_state(&self, pos: CellPos) -> ButtonState {
        if self.active == Some(pos) {
            ButtonState::Activated
        } else if self.focus == Some(pos) {
            ButtonState::Focused
        } else {
            ButtonState::Normal
        }
    }

    /// Style for a palette name. Names that were never resolved use the
    /// default style.
    pub fn style(&self, name: &str) -> Style {
        self.styles.get(name).copied().unwrap_or_default()
    }

    /// Text currently shown by the dynamic label in `pos`, if any.
    pub fn dynamic_text(&self, pos: CellPos) -> Option<&DynamicLabelEntry> {
        self.dynamic_labels
            .iter()
            .find(|entry| entry.positions.contains(&pos))
    }

    /// Apply pending output events, at most one channel's worth per call so
    /// a flooding process cannot hold up the next frame. Returns whether
    /// anything changed.
    pub fn pump_output(&mut self) -> bool {
        let events = self.runner.drain();
        let changed = !events.is_empty();
        for event in events {
            self.apply_event(event);
        }
        changed
    }

    /// Wait for the next output event and apply it. Returns `false` once no
    /// process can produce any more events.
    pub async fn next_output(&mut self) -> bool {
        match self.runner.next_event().await {
            Some(event) => {
                self.apply_event(event);
                true
            }
            None => false,
        }
    }

    pub fn apply_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Chunk {
                target: OutputTarget::CommandLog { label },
                bytes,
                ..
            } => self.command_output.push_chunk(&label, &bytes),
            StreamEvent::Chunk {
                target: OutputTarget::DynamicLabel { index },
                bytes,
                ..
            } => {
                if let Some(entry) = self.dynamic_labels.get_mut(index) {
                    entry.sink.apply_chunk(&bytes);
                }
            }
            StreamEvent::Closed { id, stream, .. } => {
                tracing::debug!(id, ?stream, "output stream closed");
            }
            StreamEvent::Exited { id, target, code } => {
                tracing::debug!(id, ?target, ?code, "process exited");
            }
        }
    }

    pub fn running_processes(&self) -> usize {
        self.runner.running_count()
    }

    /// Handle a key press. Releases and repeats are ignored.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => self.move_focus(Direction::Left),
            KeyCode::Right | KeyCode::Char('l') => self.move_focus(Direction::Right),
            KeyCode::Up | KeyCode::Char('k') => self.move_focus(Direction::Up),
            KeyCode::Down | KeyCode::Char('j') => self.move_focus(Direction::Down),
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_previous(),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_focused(),
            _ => {}
        }
    }

    /// Move focus to the next button in reading order, wrapping around.
    pub fn focus_next(&mut self) {
        self.step_focus(true);
    }

    pub fn focus_previous(&mut self) {
        self.step_focus(false);
    }

    fn step_focus(&mut self, forward: bool) {
        let buttons = self.grid.button_positions();
        if buttons.is_empty() {
            return;
        }
        let current = self
            .focus
            .and_then(|pos| buttons.iter().position(|p| *p == pos));
        let next = match (current, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % buttons.len(),
            (Some(i), false) => (i + buttons.len() - 1) % buttons.len(),
        };
        self.focus = Some(buttons[next]);
    }

    /// Move focus to the nearest button in `direction`. Stays put at the
    /// edges of the grid.
    pub fn move_focus(&mut self, direction: Direction) {
        let buttons = self.grid.button_positions();
        let Some(current) = self.focus else {
            self.focus = buttons.first().copied();
            return;
        };

        let target = match direction {
            Direction::Left => buttons
                .iter()
                .filter(|p| p.row == current.row && p.col < current.col)
                .max_by_key(|p| p.col),
            Direction::Right => buttons
                .iter()
                .filter(|p| p.row == current.row && p.col > current.col)
                .min_by_key(|p| p.col),
            Direction::Up => nearest_in_row(
                &buttons,
                buttons
                    .iter()
                    .filter(|p| p.row < current.row)
                    .map(|p| p.row)
                    .max(),
                current.col,
            ),
            Direction::Down => nearest_in_row(
                &buttons,
                buttons
                    .iter()
                    .filter(|p| p.row > current.row)
                    .map(|p| p.row)
                    .min(),
                current.col,
            ),
        };

        if let Some(pos) = target {
            self.focus = Some(*pos);
        }
    }

    /// Kill every process still running.
    pub async fn shutdown(&mut self) {
        self.runner.shutdown().await;
    }
}

fn nearest_in_row(buttons: &[CellPos], row: Option<usize>, col: usize) -> Option<&CellPos> {
    let row = row?;
    buttons
        .iter()
        .filter(|p| p.row == row)
        .min_by_key(|p| p.col.abs_diff(col))
}

/// One registry entry per distinct dynamic label, in grid order.
fn register_dynamic_labels(grid: &Grid, commands: &CommandTable) -> Vec<DynamicLabelEntry> {
    let mut entries: Vec<DynamicLabelEntry> = Vec::new();
    for (pos, cell) in grid.cells().filter(|(_, c)| c.kind.is_dynamic()) {
        if let Some(entry) = entries.iter_mut().find(|e| e.label == cell.label) {
            entry.positions.push(pos);
            continue;
        }
        entries.push(DynamicLabelEntry {
            label: cell.label.clone(),
            command: commands.by_index(cell.command).map(|_| cell.command),
            positions: vec![pos],
            sink: ReplaceSink::new(&cell.label),
            style: cell
                .formatter
                .clone()
                .unwrap_or_else(|| palette::DYNAMIC_LABEL.to_string()),
        });
    }
    entries
}

/// Look up every style the screen can draw with, warning once for each
/// name the palette lacks.
fn resolve_styles(
    palette: &Palette,
    display: &DisplayOptions,
    dynamic_labels: &[DynamicLabelEntry],
    warnings: &mut Warnings,
) -> HashMap<String, Style> {
    let mut names = vec![palette::BUTTON, palette::FOCUSED_BUTTON];
    if display.show_header {
        names.push(palette::HEADER);
    }
    if display.show_status_line {
        names.push(palette::STATUS_LINE);
    }
    if display.show_command_output {
        names.push(palette::COMMAND_OUTPUT);
    }
    if display.show_footer {
        names.push(palette::FOOTER);
    }
    names.extend(dynamic_labels.iter().map(|e| e.style.as_str()));

    let mut styles: HashMap<String, Style> = names
        .into_iter()
        .map(|name| (name.to_string(), palette.markup(name, warnings)))
        .collect();

    // Without an activated style the activated button keeps its focus look.
    let activated = palette
        .style(palette::ACTIVATED_BUTTON)
        .unwrap_or_else(|| styles.get(palette::FOCUSED_BUTTON).copied().unwrap_or_default());
    styles.insert(palette::ACTIVATED_BUTTON.to_string(), activated);
    styles
}
