//! Subcommand implementations.

pub mod auth;
pub mod keys;
pub mod namespace;
pub mod transfer;
pub mod watch;
