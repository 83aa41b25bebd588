//! A tiny interactive shell.
//!
//! Each input line is split into arguments by a quoting-aware lexer ([`lexer`]), then
//! dispatched either to a builtin from the [`BuiltinTable`] (`exit`, `cd`, `pwd`, `echo`,
//! `type`) or to an external program found on `PATH`, which the shell runs and waits for.
//!
//! The main entry point is [`Interpreter`]. Line input is abstracted by [`LineReader`] so
//! the loop can be driven by a terminal editor or by any buffered reader.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod external;
mod interpreter;
pub mod lexer;
pub mod reader;
mod registry;

pub use config::ShellConfig;
pub use interpreter::{CommandOutcome, Interpreter};
pub use reader::LineReader;
pub use registry::BuiltinTable;
