//! Screen geometry and drawing.
//!
//! [`screen_layout`] is the single source of truth for where everything
//! goes; [`render`] draws into it and [`hit_test`] maps mouse positions back
//! onto grid cells using the same rectangles.

use ratatui::{
    layout::{Constraint, Direction, Flex, Layout, Position, Rect},
    text::{Line, Text},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::command::{CellPos, ResolvedCell};
use crate::ui::app::App;
use crate::ui::box_button::{self, HorizontalPadding};
use crate::ui::palette;

/// Rectangles for every section of the screen. Hidden sections are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenLayout {
    pub header: Option<Rect>,
    pub rows: Vec<Vec<(CellPos, Rect)>>,
    pub status: Option<Rect>,
    pub output: Option<Rect>,
    pub footer: Option<Rect>,
}

fn text_height(text: &str) -> u16 {
    u16::try_from(text.lines().count().max(1)).unwrap_or(u16::MAX)
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn row_height(app: &App, row: usize, cells: &[ResolvedCell]) -> u16 {
    if cells.is_empty() {
        return 1;
    }
    if cells.iter().any(|c| c.kind.is_button()) {
        return to_u16(box_button::box_height(app.options.vertical_padding));
    }
    let lines = (0..cells.len())
        .filter_map(|col| app.dynamic_text(CellPos::new(row, col)))
        .map(|entry| entry.sink.line_count())
        .max()
        .unwrap_or(1);
    to_u16(lines.max(1))
}

/// Width available to buttons: `--term-width` when given, else the frame.
fn layout_width(app: &App, area: Rect) -> usize {
    usize::from(app.options.term_width.unwrap_or(area.width))
}

fn column_constraints(app: &App, cells: &[ResolvedCell], area: Rect) -> Vec<Constraint> {
    match app.options.horizontal_padding {
        HorizontalPadding::Auto => {
            let width = box_button::cell_width(Some(layout_width(app, area)), cells.len())
                .unwrap_or_default();
            vec![Constraint::Length(to_u16(width)); cells.len()]
        }
        HorizontalPadding::Fixed { left, right } => cells
            .iter()
            .map(|cell| {
                if cell.kind.is_button() {
                    Constraint::Length(to_u16(box_button::fixed_column_width(
                        &cell.label,
                        left,
                        right,
                        &app.options.borders,
                    )))
                } else {
                    Constraint::Fill(1)
                }
            })
            .collect(),
    }
}

/// Compute where every section and grid cell is drawn within `area`.
pub fn screen_layout(app: &App, area: Rect) -> ScreenLayout {
    let options = &app.options;

    let mut constraints = Vec::new();
    if options.show_header {
        constraints.push(Constraint::Length(text_height(&options.header_text)));
    }
    for (row, cells) in app.grid.rows.iter().enumerate() {
        constraints.push(Constraint::Length(row_height(app, row, cells)));
    }
    if options.show_status_line {
        constraints.push(Constraint::Length(1));
    }
    if options.show_command_output {
        constraints.push(Constraint::Length(to_u16(app.command_output.len().max(1))));
    }
    if options.show_footer {
        constraints.push(Constraint::Length(text_height(&options.footer_text)));
    }
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    let mut chunks = chunks.iter().copied();

    let mut layout = ScreenLayout::default();
    if options.show_header {
        layout.header = chunks.next();
    }
    for (row, cells) in app.grid.rows.iter().enumerate() {
        let Some(row_area) = chunks.next() else {
            break;
        };
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .flex(Flex::Start)
            .constraints(column_constraints(app, cells, area))
            .split(row_area);
        layout.rows.push(
            columns
                .iter()
                .enumerate()
                .map(|(col, rect)| (CellPos::new(row, col), *rect))
                .collect(),
        );
    }
    if options.show_status_line {
        layout.status = chunks.next();
    }
    if options.show_command_output {
        layout.output = chunks.next();
    }
    if options.show_footer {
        layout.footer = chunks.next();
    }
    layout
}

/// The grid cell under a screen position, if any.
pub fn hit_test(layout: &ScreenLayout, column: u16, row: u16) -> Option<CellPos> {
    let position = Position::new(column, row);
    layout
        .rows
        .iter()
        .flatten()
        .find(|(_, rect)| rect.contains(position))
        .map(|(pos, _)| *pos)
}

/// Click whatever button is drawn at the given screen position.
pub fn click_at(app: &mut App, area: Rect, column: u16, row: u16) -> bool {
    let layout = screen_layout(app, area);
    match hit_test(&layout, column, row) {
        Some(pos) if app.grid.cell(pos).is_some_and(|c| c.kind.is_button()) => {
            app.click(pos);
            true
        }
        _ => false,
    }
}

pub fn render(frame: &mut Frame, app: &App) {
    let layout = screen_layout(app, frame.area());

    if let Some(area) = layout.header {
        let header = Paragraph::new(app.options.header_text.as_str())
            .style(app.style(palette::HEADER));
        frame.render_widget(header, area);
    }

    for (pos, area) in layout.rows.iter().flatten() {
        render_cell(frame, app, *pos, *area);
    }

    if let Some(area) = layout.status {
        let status = Paragraph::new(app.status.as_str()).style(app.style(palette::STATUS_LINE));
        frame.render_widget(status, area);
    }

    if let Some(area) = layout.output {
        let lines: Vec<Line> = app.command_output.lines().map(Line::from).collect();
        let output = Paragraph::new(Text::from(lines)).style(app.style(palette::COMMAND_OUTPUT));
        frame.render_widget(output, area);
    }

    if let Some(area) = layout.footer {
        let footer = Paragraph::new(app.options.footer_text.as_str())
            .style(app.style(palette::FOOTER));
        frame.render_widget(footer, area);
    }
}

fn render_cell(frame: &mut Frame, app: &App, pos: CellPos, area: Rect) {
    let Some(cell) = app.grid.cell(pos) else {
        return;
    };

    if cell.kind.is_dynamic() {
        let Some(entry) = app.dynamic_text(pos) else {
            return;
        };
        let lines: Vec<Line> = entry.sink.lines().map(Line::from).collect();
        let label = Paragraph::new(Text::from(lines))
            .style(app.style(&entry.style))
            .wrap(Wrap { trim: false });
        frame.render_widget(label, area);
        return;
    }

    let lines = box_button::render_box(
        &cell.label,
        Some(usize::from(area.width)),
        app.options.vertical_padding,
        app.options.horizontal_padding,
        &app.options.borders,
    );
    let style = app.style(app.button_state(pos).palette_name());
    let button = Paragraph::new(Text::from(
        lines.into_iter().map(Line::from).collect::<Vec<_>>(),
    ))
    .style(style);
    frame.render_widget(button, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{plan, CommandTable, ExecSpec};
    use crate::config::{Config, DisplayOptions};
    use crate::ui::palette::Palette;
    use crate::warnings::Warnings;
    use ratatui::{backend::TestBackend, Terminal};

    fn app(layout: Option<&str>, display: DisplayOptions) -> App {
        let commands: CommandTable = [
            ("Play", ExecSpec::Args(vec!["true".to_string()])),
            ("Stop", ExecSpec::Args(vec!["true".to_string()])),
            ("clock_dynamic_label", ExecSpec::Shell("date".to_string())),
        ]
        .into_iter()
        .collect();
        let grid = plan(layout, &commands).expect("plan");
        let mut warnings = Warnings::new();
        let config = Config {
            commands,
            display,
            palette: Palette::from_entries(&palette::default_entries(), &mut warnings),
            layout_file: None,
        };
        App::new(config, grid, warnings)
    }

    fn screen(app: &App, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal.draw(|f| render(f, app)).expect("draw");
        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_layout_sections_stack_vertically() {
        let app = app(Some("Play, Stop\n\nclock_dynamic_label"), DisplayOptions::default());
        let layout = screen_layout(&app, Rect::new(0, 0, 40, 30));

        assert_eq!(layout.header, Some(Rect::new(0, 0, 40, 1)));
        assert_eq!(layout.rows.len(), 3);
        assert_eq!(layout.rows[0][0].1, Rect::new(0, 1, 20, 3));
        assert_eq!(layout.rows[0][1].1, Rect::new(20, 1, 20, 3));
        assert!(layout.rows[1].is_empty());
        assert_eq!(layout.rows[2][0].1.y, 5);
        assert_eq!(layout.status, Some(Rect::new(0, 6, 40, 1)));
        assert_eq!(layout.output.map(|r| r.y), Some(7));
    }

    #[test]
    fn test_hidden_sections_have_no_area() {
        let display = DisplayOptions {
            show_header: false,
            show_status_line: false,
            show_command_output: false,
            show_footer: false,
            ..DisplayOptions::default()
        };
        let app = app(Some("Play"), display);
        let layout = screen_layout(&app, Rect::new(0, 0, 30, 10));
        assert!(layout.header.is_none());
        assert!(layout.status.is_none());
        assert!(layout.output.is_none());
        assert!(layout.footer.is_none());
        assert_eq!(layout.rows[0][0].1.y, 0);
    }

    #[test]
    fn test_term_width_overrides_frame_width() {
        let display = DisplayOptions {
            term_width: Some(20),
            ..DisplayOptions::default()
        };
        let app = app(Some("Play, Stop"), display);
        let layout = screen_layout(&app, Rect::new(0, 0, 80, 20));
        assert_eq!(layout.rows[0][0].1.width, 10);
        assert_eq!(layout.rows[0][1].1.x, 10);
    }

    #[test]
    fn test_fixed_padding_sizes_columns_from_labels() {
        let display = DisplayOptions {
            horizontal_padding: HorizontalPadding::Fixed { left: 1, right: 1 },
            ..DisplayOptions::default()
        };
        let app = app(Some("Play, Stop"), display);
        let layout = screen_layout(&app, Rect::new(0, 0, 80, 20));
        // 4 label chars + 2 border columns + 1 + 1 padding
        assert_eq!(layout.rows[0][0].1, Rect::new(0, 1, 8, 3));
        assert_eq!(layout.rows[0][1].1.x, 8);
    }

    #[test]
    fn test_hit_test_finds_cells() {
        let app = app(Some("Play, Stop"), DisplayOptions::default());
        let layout = screen_layout(&app, Rect::new(0, 0, 40, 20));
        assert_eq!(hit_test(&layout, 5, 2), Some(CellPos::new(0, 0)));
        assert_eq!(hit_test(&layout, 25, 3), Some(CellPos::new(0, 1)));
        assert_eq!(hit_test(&layout, 5, 0), None);
    }

    #[test]
    fn test_render_draws_boxes_and_text() {
        let mut app = app(Some("Play, Stop"), DisplayOptions::default());
        app.status = "Last clicked: Play".to_string();
        let lines = screen(&app, 40, 12);

        assert!(lines[0].starts_with("TUI launcher"));
        assert_eq!(lines[1], format!("╭{}╮╭{}╮", "─".repeat(18), "─".repeat(18)));
        assert!(lines[2].starts_with("│       Play       │"));
        assert_eq!(lines[4].trim_end(), "Last clicked: Play");
    }

    #[test]
    fn test_render_shows_dynamic_label_name_before_output() {
        let app = app(Some("clock_dynamic_label"), DisplayOptions::default());
        let lines = screen(&app, 40, 10);
        assert_eq!(lines[1].trim_end(), "clock_dynamic_label");
    }
}
