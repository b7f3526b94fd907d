//! # shardtalk-cli
//!
//! Argument parsing and env config for the `shardtalk` binary.

pub mod cli;

pub use cli::{load_sync_settings, Cli, Commands};
