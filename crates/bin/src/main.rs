use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("scopekv=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format);
    let runtime = backend::open_runtime(&cli)?;

    match &cli.command {
        Commands::Namespace => commands::namespace::show(&runtime, format),
        Commands::Inspect => commands::namespace::inspect(&runtime, format),
        Commands::Get(args) => commands::keys::get(&runtime, args, format),
        Commands::Set(args) => commands::keys::set(&runtime, args, format),
        Commands::Remove(args) => commands::keys::remove(&runtime, args, format),
        Commands::Keys => commands::keys::list(&runtime, format),
        Commands::Clear => commands::keys::clear(&runtime, format),
        Commands::Login(args) => commands::auth::login(&runtime, args, format),
        Commands::Logout(args) => commands::auth::logout(&runtime, args, format),
        Commands::Purge => commands::namespace::purge(&runtime, format),
        Commands::Export(args) => commands::transfer::export(&runtime, args, format),
        Commands::Import(args) => commands::transfer::import(&runtime, args, format),
        Commands::Watch => commands::watch::run(&runtime, format).await,
    }
}
