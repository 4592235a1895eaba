//! # TUI Launcher CLI Entry Point
//!
//! Shows a grid of box buttons; clicking one (or pressing Enter on it) runs
//! the command bound to it and streams its output into the log below the
//! grid.
//!
//! ## Usage
//!
//! ```bash
//! # Use ~/.config/tui-launcher/config.toml, or the built-in default
//! tui-launcher
//!
//! # Explicit config and layout
//! tui-launcher --config-file media.toml --layout-file media.txt
//!
//! # Lay the buttons out for a fixed width
//! tui-launcher --term-width 80 --header-text "Media"
//! ```
//!
//! ## Startup
//!
//! 1. **Config**: load the command table, palette and display options
//! 2. **Layout**: resolve every layout token to a command and plan the grid
//! 3. **Dynamic labels**: start the processes that feed them
//! 4. **UI**: run the event loop until `q`, `Q` or `Esc`
//! 5. **Shutdown**: restore the terminal, kill children, print warnings
//!
//! ## Key Bindings
//!
//! - `q` / `Q` / `Esc` - Quit
//! - Arrows / `h` `j` `k` `l` - Move focus between buttons
//! - `Tab` / `Shift+Tab` - Next / previous button
//! - `Enter` / `Space` - Run the focused button
//! - Left mouse button - Run the button under the pointer

use tui_launcher::command::{layout, plan};
use tui_launcher::config::{self, Config};
use tui_launcher::ui::{self, App};
use tui_launcher::warnings::Warnings;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::fs;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Trait for reading terminal events (allows dependency injection for testing)
trait EventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

/// Production event reader that uses crossterm's event polling + read
struct CrosstermEventReader;

impl EventReader for CrosstermEventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout).context("Failed to poll for events")? {
            Ok(Some(event::read().context("Failed to read terminal event")?))
        } else {
            Ok(None)
        }
    }
}

/// Run shell commands from a grid of box buttons in your terminal
#[derive(Parser, Debug)]
#[command(name = "tui-launcher")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run commands from a grid of box buttons", long_about = None)]
struct Args {
    /// Config file to load instead of the one in the user config directory
    #[arg(long, value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Lay buttons out for this many columns instead of the terminal width
    #[arg(long, value_name = "COLUMNS")]
    term_width: Option<u16>,

    /// Layout file to use instead of the one named in the config
    #[arg(long, value_name = "FILE")]
    layout_file: Option<PathBuf>,

    /// Header text; also shows the header when the config hides it
    #[arg(long, value_name = "TEXT")]
    header_text: Option<String>,

    /// Footer text; also shows the footer when the config hides it
    #[arg(long, value_name = "TEXT")]
    footer_text: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging();

    // Set up panic hook to ensure terminal is restored on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let result = run_application(args).await;

    let _ = panic::take_hook();

    result
}

/// Log to a file; stdout belongs to the TUI. Failing to set this up only
/// means running without logs.
fn init_logging() {
    let Some(path) = config::log_file_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        if fs::create_dir_all(dir).is_err() {
            return;
        }
    }
    let Ok(file) = fs::OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

/// Everything up to the point where the terminal is taken over.
fn prepare_app(args: Args) -> Result<App> {
    let mut warnings = Warnings::new();

    let mut config = Config::load(args.config_file.as_deref(), &mut warnings)?;
    if let Some(text) = args.header_text {
        config.display.override_header(text);
    }
    if let Some(text) = args.footer_text {
        config.display.override_footer(text);
    }
    config.display.term_width = args.term_width;

    let layout_path = args.layout_file.or_else(|| config.layout_file.clone());
    let layout_text = layout::load_layout(layout_path.as_deref())?;
    let grid = plan(layout_text.as_deref(), &config.commands).context("Failed to plan layout")?;
    tracing::info!(
        rows = grid.row_count(),
        buttons = grid.button_positions().len(),
        "planned grid"
    );

    Ok(App::new(config, grid, warnings))
}

async fn run_application(args: Args) -> Result<()> {
    let mut app = prepare_app(args)?;
    app.prime_dynamic_labels();

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Run the app and ensure cleanup happens even on error
    let mut event_reader = CrosstermEventReader;
    let run_result = run_app(&mut terminal, &mut app, &mut event_reader);

    // Restore terminal (always runs, even if run_app failed)
    let cleanup_result = cleanup_terminal(&mut terminal);

    app.shutdown().await;

    if let Some(report) = app.warnings.report() {
        print!("{report}");
    }

    // Return the first error that occurred, or Ok if both succeeded
    run_result?;
    cleanup_result?;

    Ok(())
}

/// Clean up terminal state
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to restore terminal")?;

    terminal.show_cursor().context("Failed to show cursor")?;

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    event_reader: &mut dyn EventReader,
) -> Result<()> {
    let mut area = Rect::default();
    loop {
        app.pump_output();

        terminal
            .draw(|f| {
                area = f.area();
                ui::render(f, app);
            })
            .context("Failed to draw terminal UI")?;

        if let Some(event) = event_reader.read_event(POLL_TIMEOUT)? {
            handle_event(app, event, area);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Route one terminal event to the controller. `area` is the frame the
/// screen was last drawn into, used to find the button under the mouse.
fn handle_event(app: &mut App, event: Event, area: Rect) {
    match event {
        Event::Key(key) => app.handle_key(key),
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            ..
        }) => {
            ui::click_at(app, area, column, row);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::collections::VecDeque;
    use tempfile::TempDir;
    use tui_launcher::command::CellPos;

    /// Mock event reader for testing that returns a predetermined sequence of events
    struct MockEventReader {
        events: VecDeque<Event>,
    }

    impl MockEventReader {
        fn new(events: Vec<Event>) -> Self {
            Self {
                events: VecDeque::from(events),
            }
        }
    }

    impl EventReader for MockEventReader {
        fn read_event(&mut self, _timeout: Duration) -> Result<Option<Event>> {
            Ok(self.events.pop_front())
        }
    }

    fn key_event(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    fn args(config_file: Option<PathBuf>) -> Args {
        Args {
            config_file,
            term_width: None,
            layout_file: None,
            header_text: None,
            footer_text: None,
        }
    }

    fn write_config(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, text).expect("write config");
        path
    }

    const CONFIG: &str = r#"
horizontal_padding = "auto"
vertical_padding = [0, 0]
hide_header = true

[commands]
Play = ["echo", "ok"]
Stop = "echo stopped"
"#;

    #[test]
    fn test_mock_event_reader() {
        let mut reader = MockEventReader::new(vec![
            key_event(KeyCode::Char('a')),
            key_event(KeyCode::Enter),
        ]);

        assert!(matches!(
            reader.read_event(Duration::from_millis(10)).unwrap(),
            Some(Event::Key(KeyEvent {
                code: KeyCode::Char('a'),
                ..
            }))
        ));
        assert!(matches!(
            reader.read_event(Duration::from_millis(10)).unwrap(),
            Some(Event::Key(KeyEvent {
                code: KeyCode::Enter,
                ..
            }))
        ));
        assert!(reader
            .read_event(Duration::from_millis(10))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_crossterm_event_reader_type() {
        let _reader: Box<dyn EventReader> = Box::new(CrosstermEventReader);
    }

    #[test]
    fn test_args_parsing() {
        let args = Args::try_parse_from([
            "tui-launcher",
            "--config-file",
            "a.toml",
            "--term-width",
            "80",
            "--layout-file",
            "rows.txt",
            "--header-text",
            "Hi",
            "--footer-text",
            "Bye",
        ])
        .unwrap();
        assert_eq!(args.config_file, Some(PathBuf::from("a.toml")));
        assert_eq!(args.term_width, Some(80));
        assert_eq!(args.layout_file, Some(PathBuf::from("rows.txt")));
        assert_eq!(args.header_text.as_deref(), Some("Hi"));
        assert_eq!(args.footer_text.as_deref(), Some("Bye"));
    }

    #[test]
    fn test_args_parsing_defaults() {
        let args = Args::try_parse_from(["tui-launcher"]).unwrap();
        assert!(args.config_file.is_none());
        assert!(args.term_width.is_none());
    }

    #[test]
    fn test_args_reject_non_numeric_width() {
        assert!(Args::try_parse_from(["tui-launcher", "--term-width", "wide"]).is_err());
    }

    #[test]
    fn test_prepare_app_missing_config() {
        let result = prepare_app(args(Some(PathBuf::from("/nonexistent/tui-launcher.toml"))));
        let err = result.err().unwrap();
        assert!(err.to_string().contains("could not find config at"));
    }

    #[test]
    fn test_prepare_app_header_flag_forces_header() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, CONFIG);
        let app = prepare_app(Args {
            header_text: Some("Media".to_string()),
            term_width: Some(60),
            ..args(Some(path))
        })
        .unwrap();
        assert!(app.options.show_header);
        assert_eq!(app.options.header_text, "Media");
        assert_eq!(app.options.term_width, Some(60));
        assert_eq!(app.grid.rows.len(), 1);
    }

    #[test]
    fn test_prepare_app_layout_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, CONFIG);
        let layout = dir.path().join("rows.txt");
        fs::write(&layout, "stop\nplay\n").unwrap();

        let app = prepare_app(Args {
            layout_file: Some(layout),
            ..args(Some(path))
        })
        .unwrap();
        let labels: Vec<&str> = app
            .grid
            .cells()
            .map(|(_, cell)| cell.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Stop", "Play"]);
    }

    #[test]
    fn test_prepare_app_missing_layout_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, CONFIG);
        let result = prepare_app(Args {
            layout_file: Some(dir.path().join("missing.txt")),
            ..args(Some(path))
        });
        let err = result.err().unwrap();
        assert!(format!("{err:#}").contains("does not exist"));
    }

    #[test]
    fn test_prepare_app_unresolved_token() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, CONFIG);
        let layout = dir.path().join("rows.txt");
        fs::write(&layout, "Play, Eject\n").unwrap();

        let result = prepare_app(Args {
            layout_file: Some(layout),
            ..args(Some(path))
        });
        let err = result.err().unwrap();
        assert!(format!("{err:#}").contains("could not find command key: Eject"));
    }

    #[tokio::test]
    async fn test_handle_event_keys_and_mouse() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, CONFIG);
        let mut app = prepare_app(args(Some(path))).unwrap();
        let area = Rect::new(0, 0, 40, 10);

        let mut reader = MockEventReader::new(vec![
            key_event(KeyCode::Tab),
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 3,
                row: 1,
                modifiers: KeyModifiers::empty(),
            }),
            key_event(KeyCode::Char('q')),
        ]);
        while let Some(event) = reader.read_event(POLL_TIMEOUT).unwrap() {
            handle_event(&mut app, event, area);
        }

        // The header is hidden, so row 1 is inside the first button.
        assert_eq!(app.active, Some(CellPos::new(0, 0)));
        assert_eq!(app.focus, Some(CellPos::new(0, 0)));
        assert_eq!(app.status, "Last clicked: Play");
        assert!(app.should_quit);
        app.shutdown().await;
    }
}
