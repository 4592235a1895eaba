//! # UI Module
//!
//! The terminal interface of the launcher.
//!
//! ## Components
//!
//! - [`App`] - Controller: focus, activation, sinks and running processes
//! - [`box_button`] - Bordered button text blocks
//! - [`palette`] - Named styles parsed from the config
//! - [`mod@render`] - Screen geometry, drawing and mouse hit-testing
//!
//! ## Layout
//!
//! Sections are stacked top to bottom; hidden ones take no space:
//!
//! ```text
//! Header text
//! ╭──────────╮╭──────────╮╭──────────╮
//! │   Play   ││   Stop   ││  Pause   │   <- one line per layout row
//! ╰──────────╯╰──────────╯╰──────────╯
//! 202406011200.05                        <- dynamic label
//! Last clicked: Play                     <- status line
//! [Play] playing                         <- command output (last 10 lines)
//! Footer text
//! ```

pub mod app;
pub mod box_button;
pub mod palette;
pub mod render;

pub use app::App;
pub use render::{click_at, hit_test, render, screen_layout, ScreenLayout};
