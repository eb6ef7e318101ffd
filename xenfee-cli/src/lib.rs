//! Command line front end for the MyXenPay fee engine.
//!
//! # Modules
//!
//! - [`config`] — TOML configuration with environment variable expansion
//! - [`commands`] — Clap command definitions and their JSON output

pub mod commands;
pub mod config;

pub use commands::{Cli, Command, CommandError, execute};
pub use config::{ConfigError, XenfeeConfig};
