//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes defining commands, parsing arguments, wiring the services together
//! and rendering query results as terminal tables.

mod commands;
mod render;

pub use commands::*;
