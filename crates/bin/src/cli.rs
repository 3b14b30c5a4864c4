//! CLI argument definitions for the scopekv binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    /// Aligned tables and plain lines
    Human,
    /// One JSON document per result (one per line for `watch`)
    Json,
}

/// Per-user namespaced storage and session watcher
#[derive(Parser, Debug)]
#[command(name = "scopekv")]
#[command(about = "ScopeKV: per-user namespaced storage with session liveness monitoring")]
#[command(version)]
pub struct Cli {
    /// Store file shared by every process using the same profile
    #[arg(
        short,
        long,
        global = true,
        default_value = "scopekv.json",
        env = "SCOPEKV_STORE"
    )]
    pub store: PathBuf,

    /// JSON file with watcher settings (poll_interval_ms, idle_timeout_ms, ...)
    #[arg(short, long, global = true, env = "SCOPEKV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "human")]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the active namespace and session state
    Namespace,
    /// List every stored key grouped by namespace
    Inspect,
    /// Read a key through the namespacing layer
    Get(KeyArgs),
    /// Write a key through the namespacing layer
    Set(SetArgs),
    /// Remove a key through the namespacing layer
    Remove(KeyArgs),
    /// List the logical keys visible to the active user
    Keys,
    /// Clear the active namespace (everything when signed out)
    Clear,
    /// Record a login for a user
    Login(LoginArgs),
    /// End the current session
    Logout(LogoutArgs),
    /// Delete every namespace except the active one
    Purge,
    /// Export the active user's data as JSON
    Export(ExportArgs),
    /// Import a JSON object into the active user's namespace
    Import(ImportArgs),
    /// Run the session watcher and print each event until Ctrl-C
    Watch,
}

/// A logical key
#[derive(clap::Args, Debug)]
pub struct KeyArgs {
    /// Logical key, e.g. `favorites`
    pub key: String,
}

/// Arguments for the set command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Logical key, e.g. `favorites`
    pub key: String,
    /// Value to store verbatim
    pub value: String,
}

/// Arguments for the login command
#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Email identifying the user
    pub email: String,

    /// Session token to store
    #[arg(short, long, default_value = "cli-session")]
    pub token: String,

    /// Mark the profile as not yet verified
    #[arg(long)]
    pub unverified: bool,
}

/// Arguments for the logout command
#[derive(clap::Args, Debug)]
pub struct LogoutArgs {
    /// Log out as the user would (reported as manual-logout instead of system-logout)
    #[arg(short, long)]
    pub manual: bool,
}

/// Arguments for the export command
#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the import command
#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// JSON file holding an object of logical key to value
    pub file: PathBuf,
}
