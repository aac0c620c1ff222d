//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, show, path)
//! - [`fetch`] - Fetch and decode images through the dispatcher

pub mod common;
pub mod config;
pub mod fetch;
