//! # Layout Planning
//!
//! Turns layout text into a [`Grid`] of resolved, classified cells.
//!
//! ## Layout Format
//!
//! ```text
//! # comment lines are ignored
//! Play, Stop, Pause
//!
//! {clock}date_dynamic_label
//! ```
//!
//! - one row per line, tokens separated by commas
//! - each token is a case-insensitive substring of a command label,
//!   optionally prefixed with a `{formatter}` palette name
//! - blank lines become empty rows, which render as vertical spacing
//! - without a layout, every command is placed in a single row

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::command::resolver::{KeyResolver, LayoutToken};
use crate::command::table::CommandTable;
use crate::error::ConfigError;

/// Labels ending in this suffix run continuously and display their output.
pub const DYNAMIC_LABEL_SUFFIX: &str = "_dynamic_label";

/// Labels ending in this suffix are the static header for a dynamic label.
pub const HEADER_DYNAMIC_LABEL_SUFFIX: &str = "_header_dynamic_label";

/// What a grid cell is and how it behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// A clickable box button that runs its command on activation.
    Button,
    /// A text region fed by a process started at launch.
    DynamicLabel,
    /// The static heading placed above a dynamic label. Its process is
    /// started at launch like any other dynamic label.
    DynamicHeader,
}

impl CellKind {
    /// Classify a label (formatter prefix already removed) by its suffix.
    pub fn classify(label: &str) -> Self {
        if label.ends_with(HEADER_DYNAMIC_LABEL_SUFFIX) {
            CellKind::DynamicHeader
        } else if label.ends_with(DYNAMIC_LABEL_SUFFIX) {
            CellKind::DynamicLabel
        } else {
            CellKind::Button
        }
    }

    pub fn is_button(&self) -> bool {
        matches!(self, CellKind::Button)
    }

    pub fn is_dynamic(&self) -> bool {
        !self.is_button()
    }
}

/// Position of a cell in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A layout token bound to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCell {
    /// Display label, with any `{formatter}` prefix removed.
    pub label: String,
    /// Index of the command in the [`CommandTable`].
    pub command: usize,
    /// Palette entry requested by the layout (or embedded in the label).
    pub formatter: Option<String>,
    pub kind: CellKind,
}

impl ResolvedCell {
    fn new(
        command_label: &str,
        command: usize,
        token_formatter: Option<String>,
    ) -> Result<Self, ConfigError> {
        let (label_formatter, label) = match LayoutToken::parse(command_label)? {
            Some(token) => (token.formatter, token.query),
            None => (None, command_label.to_string()),
        };
        let kind = CellKind::classify(&label);
        Ok(Self {
            label,
            command,
            formatter: token_formatter.or(label_formatter),
            kind,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    pub rows: Vec<Vec<ResolvedCell>>,
}

impl Grid {
    pub fn cell(&self, pos: CellPos) -> Option<&ResolvedCell> {
        self.rows.get(pos.row).and_then(|row| row.get(pos.col))
    }

    /// All cells with their positions, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (CellPos, &ResolvedCell)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, cell)| (CellPos::new(r, c), cell))
        })
    }

    /// Positions of every button, in reading order.
    pub fn button_positions(&self) -> Vec<CellPos> {
        self.cells()
            .filter(|(_, cell)| cell.kind.is_button())
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Plan a grid from optional layout text.
///
/// Fails on the first token that matches no command.
pub fn plan(layout: Option<&str>, commands: &CommandTable) -> Result<Grid, ConfigError> {
    let resolver = KeyResolver::new(commands);
    let mut rows = Vec::new();

    for line in layout.unwrap_or_default().lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }

        let mut row = Vec::new();
        if !line.is_empty() {
            for item in line.split(',') {
                let item = item.trim();
                let command = resolver.resolve(item)?;
                let token = LayoutToken::parse(item)?;
                let index = commands
                    .index_of(&command.label)
                    .ok_or_else(|| ConfigError::UnresolvedKey {
                        token: item.to_string(),
                    })?;
                row.push(ResolvedCell::new(
                    &command.label,
                    index,
                    token.and_then(|t| t.formatter),
                )?);
            }
        }
        tracing::debug!(row = rows.len(), cells = row.len(), "planned layout row");
        rows.push(row);
    }

    if rows.is_empty() {
        rows.push(
            commands
                .iter()
                .enumerate()
                .map(|(index, command)| ResolvedCell::new(&command.label, index, None))
                .collect::<Result<Vec<_>, _>>()?,
        );
    }

    Ok(Grid { rows })
}

/// Read layout text from disk. An explicitly named file that does not exist
/// is a configuration error; no path means no layout.
pub fn load_layout(path: Option<&Path>) -> Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !path.exists() {
        return Err(ConfigError::MissingLayoutFile {
            path: path.to_path_buf(),
        }
        .into());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout file: {}", path.display()))?;
    Ok(Some(text))
}
