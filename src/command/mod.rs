//! # Command Module
//!
//! The command table and everything that turns a layout description into a
//! grid of commands.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`table::CommandTable`] | ordered label → exec spec map loaded from config |
//! | [`resolver::KeyResolver`] | fuzzy, case-insensitive label lookup |
//! | [`layout::plan`] | layout text → [`layout::Grid`] of classified cells |

pub mod layout;
pub mod resolver;
pub mod table;

pub use layout::{plan, CellKind, CellPos, Grid, ResolvedCell};
pub use resolver::{KeyResolver, LayoutToken};
pub use table::{Command, CommandTable, ExecSpec};
