//! CLI module for minirag
//!
//! Handles command-line argument parsing.

pub mod args;

pub use args::{Args, Commands, Verbosity, DEFAULT_QUERY};
