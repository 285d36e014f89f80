//! Protocol module containing the command vocabulary and line framing.

pub mod command;
pub mod line;

pub use command::{Command, DOWN_COMMAND, EXIT_COMMAND, WELCOME_LINE};
pub use line::{line_reader, write_line};
