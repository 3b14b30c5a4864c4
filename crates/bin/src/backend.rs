//! Store and runtime creation.

use std::sync::Arc;

use scopekv::{Config, JsonFile, SessionRuntime, Storage};

use crate::cli::Cli;

/// Load the watcher configuration, falling back to the defaults
pub fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    match &cli.config {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            Ok(Config::from_file(path)?)
        }
        None => Ok(Config::default()),
    }
}

/// Open the shared store and install the namespacing layer over it
pub fn open_runtime(cli: &Cli) -> Result<SessionRuntime, Box<dyn std::error::Error>> {
    let config = load_config(cli)?;
    tracing::debug!("Using store at {}", cli.store.display());
    let raw: Arc<dyn Storage> = Arc::new(JsonFile::open(&cli.store));
    Ok(SessionRuntime::open(raw, config)?)
}
