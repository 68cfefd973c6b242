//! Command-line interface
//!
//! Argument parsing and command handlers for the `gliderqc` binary.

pub mod args;
pub mod commands;
