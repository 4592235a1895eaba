//! # Box Buttons
//!
//! Pure geometry for the bordered buttons in the grid: given a label and the
//! width of its cell, [`render_box`] produces the text lines of the button.
//!
//! ```text
//! ╭──────────────╮
//! │              │   <- vertical padding (top)
//! │    ▶ Play    │
//! │              │   <- vertical padding (bottom)
//! ╰──────────────╯
//! ```
//!
//! Wide glyphs (CJK, most emoji) take two terminal columns but count as one
//! `char`, so they are counted separately and added back wherever the
//! border length is computed.

use serde::{Deserialize, Serialize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Glyphs used to draw a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Borders {
    pub top_vertical_padding_character: String,
    pub bottom_vertical_padding_character: String,
    pub middle_padding_left_character: String,
    pub middle_padding_right_character: String,
    pub top_left: String,
    pub top_right: String,
    pub top_center: String,
    pub middle_left: String,
    pub middle_right: String,
    pub bottom_left: String,
    pub bottom_right: String,
    pub bottom_center: String,
}

impl Default for Borders {
    fn default() -> Self {
        Self {
            top_vertical_padding_character: " ".to_string(),
            bottom_vertical_padding_character: " ".to_string(),
            middle_padding_left_character: " ".to_string(),
            middle_padding_right_character: " ".to_string(),
            top_left: "╭".to_string(),
            top_right: "╮".to_string(),
            top_center: "─".to_string(),
            middle_left: "│".to_string(),
            middle_right: "│".to_string(),
            bottom_left: "╰".to_string(),
            bottom_right: "╯".to_string(),
            bottom_center: "─".to_string(),
        }
    }
}

impl Borders {
    pub fn top(&self, center_width: usize) -> String {
        format!(
            "{}{}{}",
            self.top_left,
            self.top_center.repeat(center_width),
            self.top_right
        )
    }

    pub fn bottom(&self, center_width: usize) -> String {
        format!(
            "{}{}{}",
            self.bottom_left,
            self.bottom_center.repeat(center_width),
            self.bottom_right
        )
    }

    pub fn top_vertical_padding(&self, center_width: usize) -> String {
        format!(
            "{}{}{}",
            self.middle_left,
            self.top_vertical_padding_character.repeat(center_width),
            self.middle_right
        )
    }

    pub fn bottom_vertical_padding(&self, center_width: usize) -> String {
        format!(
            "{}{}{}",
            self.middle_left,
            self.bottom_vertical_padding_character.repeat(center_width),
            self.middle_right
        )
    }

    /// Columns taken by the left and right border of the content line.
    pub fn side_width(&self) -> usize {
        self.middle_left.width() + self.middle_right.width()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HorizontalPadding {
    /// Centre the label in the available width.
    #[default]
    Auto,
    Fixed { left: usize, right: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerticalPadding {
    pub top: usize,
    pub bottom: usize,
}

impl VerticalPadding {
    pub fn new(top: usize, bottom: usize) -> Self {
        Self { top, bottom }
    }
}

/// Number of glyphs in `label` that occupy two terminal columns.
pub fn wide_char_count(label: &str) -> usize {
    label.chars().filter(|c| c.width() == Some(2)).count()
}

/// Character count plus one extra column per wide glyph.
pub fn visible_length(label: &str) -> usize {
    label.chars().count() + wide_char_count(label)
}

/// Total height of a button in lines.
pub fn box_height(vertical: VerticalPadding) -> usize {
    3 + vertical.top + vertical.bottom
}

/// Even share of the terminal width for one of `count` cells in a row.
pub fn cell_width(term_width: Option<usize>, count: usize) -> Option<usize> {
    match term_width {
        Some(width) if count > 0 => Some(width / count),
        _ => None,
    }
}

/// Width of a button drawn with fixed horizontal padding.
pub fn fixed_column_width(label: &str, left: usize, right: usize, borders: &Borders) -> usize {
    visible_length(label)
        + borders.side_width()
        + left * borders.middle_padding_left_character.chars().count()
        + right * borders.middle_padding_right_character.chars().count()
}

/// Produce the lines of a box button.
///
/// Without a `target_width` there is no room to distribute, so horizontal
/// padding collapses to zero whatever mode was requested. In
/// [`HorizontalPadding::Auto`] mode an odd remainder goes to the left.
pub fn render_box(
    label: &str,
    target_width: Option<usize>,
    vertical: VerticalPadding,
    horizontal: HorizontalPadding,
    borders: &Borders,
) -> Vec<String> {
    let wide = wide_char_count(label);

    let (left, right) = match (target_width, horizontal) {
        (None, _) => (0, 0),
        (Some(width), HorizontalPadding::Auto) => {
            let spare = width.saturating_sub(visible_length(label) + borders.side_width());
            (spare.div_ceil(2), spare / 2)
        }
        (Some(_), HorizontalPadding::Fixed { left, right }) => (left, right),
    };

    let padded_label = format!(
        "{}{}{}",
        borders.middle_padding_left_character.repeat(left),
        label,
        borders.middle_padding_right_character.repeat(right)
    );
    let center_width = padded_label.chars().count() + wide;
    tracing::trace!(
        label,
        wide,
        left,
        right,
        center_width,
        ?target_width,
        "box geometry"
    );

    let mut lines = Vec::with_capacity(box_height(vertical));
    lines.push(borders.top(center_width));
    for _ in 0..vertical.top {
        lines.push(borders.top_vertical_padding(center_width));
    }
    lines.push(format!(
        "{}{}{}",
        borders.middle_left, padded_label, borders.middle_right
    ));
    for _ in 0..vertical.bottom {
        lines.push(borders.bottom_vertical_padding(center_width));
    }
    lines.push(borders.bottom(center_width));
    lines
}
