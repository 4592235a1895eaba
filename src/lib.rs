//! TUI Launcher - run commands from a grid of box buttons in the terminal
//!
//! This library provides the core functionality for resolving a row-based
//! layout into a grid of commands, rendering box buttons, and streaming the
//! output of spawned processes back into the UI.

pub mod command;
pub mod config;
pub mod error;
pub mod process;
pub mod ui;
pub mod warnings;
