//! Library half of the `intent-json` command-line tool.

pub mod config;
pub mod error;
pub mod input;
