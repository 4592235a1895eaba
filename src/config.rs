//! # Configuration
//!
//! Loads the launcher configuration: the command table, display options,
//! palette and border glyphs.
//!
//! ## File Location
//!
//! The first of these that applies is used:
//!
//! 1. the path given with `--config-file` (must exist)
//! 2. `config.toml` in the platform config directory, e.g.
//!    `~/.config/tui-launcher/config.toml`
//! 3. the built-in default configuration
//!
//! Files ending in `.json` are read as JSON, everything else as TOML. The
//! `directories` crate resolves the platform-appropriate directories.
//!
//! Optional settings that are missing or invalid fall back to defaults and
//! leave a warning behind, so a half-finished config still starts.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::command::CommandTable;
use crate::error::ConfigError;
use crate::ui::box_button::{Borders, HorizontalPadding, VerticalPadding};
use crate::ui::palette::{self, Palette, PaletteEntry};
use crate::warnings::Warnings;

const APP_NAME: &str = "tui-launcher";
const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "tui-launcher.log";

const BUILT_IN_CONFIG: &str = include_str!("../configs/default.toml");

/// Raw padding value as written in a config file: `"auto"`, `false`, a
/// single integer or a `[first, second]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaddingValue {
    Flag(bool),
    Uniform(i64),
    Pair(Vec<i64>),
    Mode(String),
}

/// The config file as written on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default = "default_header_text")]
    pub header_text: String,
    #[serde(default = "default_footer_text")]
    pub footer_text: String,
    #[serde(default)]
    pub hide_header: bool,
    #[serde(default)]
    pub hide_status_line: bool,
    #[serde(default)]
    pub hide_command_output: bool,
    #[serde(default)]
    pub hide_footer: bool,
    #[serde(default)]
    pub horizontal_padding: Option<PaddingValue>,
    #[serde(default)]
    pub vertical_padding: Option<PaddingValue>,
    #[serde(default)]
    pub layout_file: Option<PathBuf>,
    #[serde(default)]
    pub borders: Borders,
    #[serde(default = "palette::default_entries")]
    pub palette: Vec<PaletteEntry>,
    #[serde(default)]
    pub commands: CommandTable,
}

fn default_header_text() -> String {
    "TUI launcher".to_string()
}

fn default_footer_text() -> String {
    format!(
        "TUI launcher v{}\n\nExit by pressing q or Esc.",
        env!("CARGO_PKG_VERSION")
    )
}

/// Serialization format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

impl ConfigFile {
    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Toml => toml::from_str(text).context("Invalid TOML config"),
            ConfigFormat::Json => serde_json::from_str(text).context("Invalid JSON config"),
        }
    }

    /// Apply defaults and validation. Relative layout paths are resolved
    /// against `base_dir`, the directory of the config file.
    pub fn resolve(self, base_dir: Option<&Path>, warnings: &mut Warnings) -> Config {
        let horizontal_padding = resolve_horizontal_padding(self.horizontal_padding.as_ref(), warnings);
        let vertical_padding = resolve_vertical_padding(self.vertical_padding.as_ref(), warnings);
        let palette = Palette::from_entries(&self.palette, warnings);

        let layout_file = self.layout_file.map(|path| match base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        });

        Config {
            commands: self.commands,
            display: DisplayOptions {
                header_text: self.header_text,
                footer_text: self.footer_text,
                show_header: !self.hide_header,
                show_status_line: !self.hide_status_line,
                show_command_output: !self.hide_command_output,
                show_footer: !self.hide_footer,
                horizontal_padding,
                vertical_padding,
                borders: self.borders,
                term_width: None,
            },
            palette,
            layout_file,
        }
    }
}

/// How the grid and the surrounding sections are drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub header_text: String,
    pub footer_text: String,
    pub show_header: bool,
    pub show_status_line: bool,
    pub show_command_output: bool,
    pub show_footer: bool,
    pub horizontal_padding: HorizontalPadding,
    pub vertical_padding: VerticalPadding,
    pub borders: Borders,
    /// Width to lay buttons out for, instead of the terminal's own width.
    pub term_width: Option<u16>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            header_text: default_header_text(),
            footer_text: default_footer_text(),
            show_header: true,
            show_status_line: true,
            show_command_output: true,
            show_footer: true,
            horizontal_padding: HorizontalPadding::Auto,
            vertical_padding: VerticalPadding::default(),
            borders: Borders::default(),
            term_width: None,
        }
    }
}

impl DisplayOptions {
    /// Replace the header text. An explicit header is always shown.
    pub fn override_header(&mut self, text: String) {
        self.header_text = text;
        self.show_header = true;
    }

    /// Replace the footer text. An explicit footer is always shown.
    pub fn override_footer(&mut self, text: String) {
        self.footer_text = text;
        self.show_footer = true;
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub commands: CommandTable,
    pub display: DisplayOptions,
    pub palette: Palette,
    pub layout_file: Option<PathBuf>,
}

impl Config {
    /// Load the configuration following the lookup order described in the
    /// module docs.
    pub fn load(explicit: Option<&Path>, warnings: &mut Warnings) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::MissingConfigFile {
                    path: path.to_path_buf(),
                }
                .into());
            }
            return Self::load_from(path, warnings);
        }

        if let Some(path) = default_config_path().filter(|p| p.exists()) {
            return Self::load_from(&path, warnings);
        }

        tracing::info!("no config file found, using the built-in default");
        Self::built_in(warnings)
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path, warnings: &mut Warnings) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let file = ConfigFile::parse(&contents, ConfigFormat::from_path(path))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::info!(path = %path.display(), commands = file.commands.len(), "loaded config");
        Ok(file.resolve(path.parent(), warnings))
    }

    /// The configuration compiled into the binary.
    pub fn built_in(warnings: &mut Warnings) -> Result<Self> {
        let file = ConfigFile::parse(BUILT_IN_CONFIG, ConfigFormat::Toml)
            .context("Failed to parse built-in config")?;
        Ok(file.resolve(None, warnings))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Path of the per-user config file.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Path of the log file.
pub fn log_file_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_local_dir().join(LOG_FILE_NAME))
}

fn padding_pair(values: &[i64]) -> Option<(usize, usize)> {
    match values {
        [first, second] => Some((usize::try_from(*first).ok()?, usize::try_from(*second).ok()?)),
        _ => None,
    }
}

fn resolve_horizontal_padding(value: Option<&PaddingValue>, warnings: &mut Warnings) -> HorizontalPadding {
    let Some(value) = value else {
        warnings.warn(
            "'horizontal_padding' not specified in your config. Defaulting to \"auto\". \
             Set it to \"auto\" to spread buttons across the full width, false for a compact \
             view, or a pair such as [5, 2] for explicit left and right padding.",
        );
        return HorizontalPadding::Auto;
    };

    let fixed = match value {
        PaddingValue::Mode(mode) if mode == "auto" => return HorizontalPadding::Auto,
        PaddingValue::Flag(false) => Some((0, 0)),
        PaddingValue::Uniform(n) => usize::try_from(*n).ok().map(|n| (n, n)),
        PaddingValue::Pair(values) => padding_pair(values),
        _ => None,
    };
    match fixed {
        Some((left, right)) => HorizontalPadding::Fixed { left, right },
        None => {
            warnings.warn(format!(
                "horizontal_padding ({value:?}) is not a valid value. Using default of \"auto\"."
            ));
            HorizontalPadding::Auto
        }
    }
}

fn resolve_vertical_padding(value: Option<&PaddingValue>, warnings: &mut Warnings) -> VerticalPadding {
    let Some(value) = value else {
        warnings.warn(
            "'vertical_padding' not specified in your config. Defaulting to [0, 0]. \
             The first number is the padding above the label, the second below it.",
        );
        return VerticalPadding::default();
    };

    let padding = match value {
        PaddingValue::Uniform(n) => usize::try_from(*n).ok().map(|n| (n, n)),
        PaddingValue::Pair(values) => padding_pair(values),
        _ => None,
    };
    match padding {
        Some((top, bottom)) => VerticalPadding::new(top, bottom),
        None => {
            warnings.warn(format!(
                "vertical_padding ({value:?}) is not a valid value. Using [1, 1]."
            ));
            VerticalPadding::new(1, 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ExecSpec;
    use tempfile::TempDir;

    #[test]
    fn test_built_in_config_is_valid() {
        let mut warnings = Warnings::new();
        let config = Config::built_in(&mut warnings).expect("built-in config");
        assert!(!config.commands.is_empty());
        assert!(config.layout_file.is_none());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn test_minimal_config_uses_defaults_and_warns() {
        let mut warnings = Warnings::new();
        let file = ConfigFile::parse("", ConfigFormat::Toml).expect("parse");
        let config = file.resolve(None, &mut warnings);
        assert_eq!(config.display.header_text, "TUI launcher");
        assert!(config.display.show_header);
        assert_eq!(config.display.horizontal_padding, HorizontalPadding::Auto);
        assert_eq!(config.display.vertical_padding, VerticalPadding::new(0, 0));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_padding_forms() {
        let cases = [
            ("horizontal_padding = \"auto\"", HorizontalPadding::Auto),
            (
                "horizontal_padding = false",
                HorizontalPadding::Fixed { left: 0, right: 0 },
            ),
            (
                "horizontal_padding = 3",
                HorizontalPadding::Fixed { left: 3, right: 3 },
            ),
            (
                "horizontal_padding = [5, 2]",
                HorizontalPadding::Fixed { left: 5, right: 2 },
            ),
        ];
        for (text, expected) in cases {
            let mut warnings = Warnings::new();
            let text = format!("{text}\nvertical_padding = 1");
            let config = ConfigFile::parse(&text, ConfigFormat::Toml)
                .expect("parse")
                .resolve(None, &mut warnings);
            assert_eq!(config.display.horizontal_padding, expected, "{text}");
            assert_eq!(config.display.vertical_padding, VerticalPadding::new(1, 1));
            assert!(warnings.is_empty(), "{text}: {warnings:?}");
        }
    }

    #[test]
    fn test_invalid_padding_warns_and_defaults() {
        let mut warnings = Warnings::new();
        let text = "horizontal_padding = \"wide\"\nvertical_padding = [1, 2, 3]";
        let config = ConfigFile::parse(text, ConfigFormat::Toml)
            .expect("parse")
            .resolve(None, &mut warnings);
        assert_eq!(config.display.horizontal_padding, HorizontalPadding::Auto);
        assert_eq!(config.display.vertical_padding, VerticalPadding::new(1, 1));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_load_json_config() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join("launcher.json");
        fs::write(
            &path,
            r#"{
                "horizontal_padding": [1, 1],
                "vertical_padding": [0, 0],
                "hide_footer": true,
                "commands": {"Play": ["echo", "ok"], "List": "ls | head"}
            }"#,
        )
        .expect("write");

        let mut warnings = Warnings::new();
        let config = Config::load(Some(&path), &mut warnings).expect("load");
        assert!(!config.display.show_footer);
        let labels: Vec<&str> = config.commands.labels().collect();
        assert_eq!(labels, vec!["Play", "List"]);
        assert_eq!(
            config.commands.get("Play").map(|c| &c.exec),
            Some(&ExecSpec::Args(vec!["echo".into(), "ok".into()]))
        );
    }

    #[test]
    fn test_relative_layout_file_resolves_against_config_dir() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "layout_file = \"layouts/main.txt\"\n").expect("write");

        let mut warnings = Warnings::new();
        let config = Config::load_from(&path, &mut warnings).expect("load");
        assert_eq!(
            config.layout_file,
            Some(temp_dir.path().join("layouts/main.txt"))
        );
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join("nope.toml");
        let mut warnings = Warnings::new();
        let err = Config::load(Some(&path), &mut warnings).expect_err("missing");
        assert!(err.to_string().contains("could not find config at"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = ConfigFile::parse("no_such_option = true", ConfigFormat::Toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_override_header_forces_visibility() {
        let mut display = DisplayOptions {
            show_header: false,
            show_footer: false,
            ..DisplayOptions::default()
        };
        display.override_header("Custom".to_string());
        display.override_footer("Bye".to_string());
        assert!(display.show_header);
        assert!(display.show_footer);
        assert_eq!(display.header_text, "Custom");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("config")), ConfigFormat::Toml);
    }
}
