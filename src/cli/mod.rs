//! CLI module for the bgremove-client library
//!
//! This module is only available when the "cli" feature is enabled.

#[path = "main.rs"]
mod main_impl;

pub use main_impl::{main, Cli, CliEngine, Command};
