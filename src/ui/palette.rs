//! # Palette
//!
//! Named display styles, configured as `[name, foreground, background]`
//! triples:
//!
//! ```toml
//! palette = [
//!     ["button", "dark green", ""],
//!     ["activated_button", "italics,yellow", ""],
//!     ["header", "dark green,bold,underline", "black"],
//! ]
//! ```
//!
//! The foreground field is a comma-separated list holding at most one colour
//! plus any attributes (`bold`, `italics`, `underline`, `blink`, `standout`,
//! `strikethrough`). Colours use the classic 16-colour names (`dark red`,
//! `light gray`, `yellow`, ...) or `#rrggbb`.
//!
//! A name referenced by the UI but absent from the palette is not an error:
//! a warning is recorded and the default style is used.

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

use crate::warnings::Warnings;

pub const BUTTON: &str = "button";
pub const FOCUSED_BUTTON: &str = "focused_button";
pub const ACTIVATED_BUTTON: &str = "activated_button";
pub const HEADER: &str = "header";
pub const FOOTER: &str = "footer";
pub const STATUS_LINE: &str = "status_line";
pub const COMMAND_OUTPUT: &str = "command_output";
pub const DYNAMIC_LABEL: &str = "dynamic_label";

/// Deprecated name for [`FOCUSED_BUTTON`].
pub const LEGACY_HIGHLIGHT: &str = "highlight";

/// One configured palette entry: name, foreground spec, background spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry(pub String, pub String, pub String);

impl PaletteEntry {
    pub fn new(name: &str, fg: &str, bg: &str) -> Self {
        Self(name.to_string(), fg.to_string(), bg.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// The palette used when the config does not provide one.
pub fn default_entries() -> Vec<PaletteEntry> {
    vec![
        PaletteEntry::new("normal", "", ""),
        PaletteEntry::new("bold", "bold", ""),
        PaletteEntry::new("blue", "bold", "dark blue"),
        PaletteEntry::new(BUTTON, "dark green", ""),
        PaletteEntry::new(FOCUSED_BUTTON, "yellow", ""),
        PaletteEntry::new(ACTIVATED_BUTTON, "italics,yellow", ""),
        PaletteEntry::new(HEADER, "dark green,bold,underline", "black"),
        PaletteEntry::new(STATUS_LINE, "light gray", "black"),
        PaletteEntry::new(COMMAND_OUTPUT, "dark green", "black"),
        PaletteEntry::new(FOOTER, "dark green,bold", "black"),
        PaletteEntry::new(DYNAMIC_LABEL, "dark red,bold", "yellow"),
        PaletteEntry::new("item_header", "white,bold", "dark blue"),
    ]
}

/// Resolved palette: style names mapped to `ratatui` styles, in
/// configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palette {
    styles: Vec<(String, Style)>,
}

impl Palette {
    /// Build a palette from config entries. Unknown colour or attribute names
    /// are reported and ignored. A legacy `highlight` entry stands in for a
    /// missing `focused_button`.
    pub fn from_entries(entries: &[PaletteEntry], warnings: &mut Warnings) -> Self {
        let mut styles: Vec<(String, Style)> = Vec::with_capacity(entries.len() + 1);
        for PaletteEntry(name, fg, bg) in entries {
            let style = parse_style(fg, bg).unwrap_or_else(|unknown| {
                warnings.warn(format!(
                    "Palette entry '{name}' uses unknown colour or attribute names: {}",
                    unknown.join(", ")
                ));
                lenient_style(fg, bg)
            });
            styles.push((name.clone(), style));
        }

        let mut palette = Self { styles };
        if !palette.contains(FOCUSED_BUTTON) {
            match palette.style(LEGACY_HIGHLIGHT) {
                Some(style) => {
                    warnings.warn(
                        "PALETTE in your config is missing a 'focused_button' markup item, but has \
                         the deprecated 'highlight' item; we'll use that, but please update your \
                         config to rename 'highlight' to 'focused_button'",
                    );
                    palette.styles.push((FOCUSED_BUTTON.to_string(), style));
                }
                None => {
                    warnings.warn("PALETTE in your config is missing a 'focused_button' markup item");
                }
            }
        }
        palette
    }

    pub fn contains(&self, name: &str) -> bool {
        self.styles.iter().any(|(n, _)| n == name)
    }

    pub fn style(&self, name: &str) -> Option<Style> {
        self.styles
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, style)| *style)
    }

    /// Style for `name`, recording a warning and falling back to the default
    /// style when the palette does not define it.
    pub fn markup(&self, name: &str, warnings: &mut Warnings) -> Style {
        self.style(name).unwrap_or_else(|| {
            warnings.warn(format!("'{name}' is missing from the PALETTE in your config."));
            Style::default()
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().map(|(n, _)| n.as_str())
    }
}

/// Parse a foreground/background pair. On failure returns every name that
/// could not be understood.
pub fn parse_style(fg: &str, bg: &str) -> Result<Style, Vec<String>> {
    let mut style = Style::default();
    let mut unknown = Vec::new();

    for part in split_spec(fg) {
        if let Some(modifier) = parse_modifier(part) {
            style = style.add_modifier(modifier);
        } else if let Some(color) = parse_color(part) {
            style = style.fg(color);
        } else {
            unknown.push(part.to_string());
        }
    }

    for part in split_spec(bg) {
        match parse_color(part) {
            Some(color) => style = style.bg(color),
            None => unknown.push(part.to_string()),
        }
    }

    if unknown.is_empty() {
        Ok(style)
    } else {
        Err(unknown)
    }
}

fn lenient_style(fg: &str, bg: &str) -> Style {
    let mut style = Style::default();
    for part in split_spec(fg) {
        if let Some(modifier) = parse_modifier(part) {
            style = style.add_modifier(modifier);
        } else if let Some(color) = parse_color(part) {
            style = style.fg(color);
        }
    }
    if let Some(color) = split_spec(bg).find_map(parse_color) {
        style = style.bg(color);
    }
    style
}

fn split_spec(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_modifier(name: &str) -> Option<Modifier> {
    match name.to_lowercase().as_str() {
        "bold" => Some(Modifier::BOLD),
        "italics" | "italic" => Some(Modifier::ITALIC),
        "underline" => Some(Modifier::UNDERLINED),
        "blink" => Some(Modifier::SLOW_BLINK),
        "standout" | "reverse" => Some(Modifier::REVERSED),
        "strikethrough" => Some(Modifier::CROSSED_OUT),
        _ => None,
    }
}

/// Parse a classic 16-colour name or a `#rrggbb` value.
pub fn parse_color(name: &str) -> Option<Color> {
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        return Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
    }

    let color = match name.to_lowercase().as_str() {
        "default" => Color::Reset,
        "black" => Color::Black,
        "dark red" => Color::Red,
        "dark green" => Color::Green,
        "brown" => Color::Yellow,
        "dark blue" => Color::Blue,
        "dark magenta" => Color::Magenta,
        "dark cyan" => Color::Cyan,
        "light gray" | "light grey" => Color::Gray,
        "dark gray" | "dark grey" => Color::DarkGray,
        "light red" => Color::LightRed,
        "light green" => Color::LightGreen,
        "yellow" => Color::LightYellow,
        "light blue" => Color::LightBlue,
        "light magenta" => Color::LightMagenta,
        "light cyan" => Color::LightCyan,
        "white" => Color::White,
        _ => return None,
    };
    Some(color)
}
