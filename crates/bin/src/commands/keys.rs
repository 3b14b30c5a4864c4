//! Key commands - reads and writes through the namespacing layer.

use scopekv::{SessionRuntime, Storage};

use crate::cli::{KeyArgs, SetArgs};
use crate::output::{OutputFormat, preview, print_json, print_table};

/// Run the `get` command
pub fn get(
    runtime: &SessionRuntime,
    args: &KeyArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let value = runtime.storage().get_item(&args.key)?;

    match format {
        OutputFormat::Human => match &value {
            Some(value) => println!("{value}"),
            None => {
                eprintln!("{}: not found", args.key);
                std::process::exit(1);
            }
        },
        OutputFormat::Json => print_json(&serde_json::json!({
            "key": args.key,
            "value": value,
        }))?,
    }

    Ok(())
}

/// Run the `set` command
pub fn set(
    runtime: &SessionRuntime,
    args: &SetArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = runtime.storage();
    storage.set_item(&args.key, &args.value)?;
    // Write failures are absorbed by the namespacing layer; read back to report them.
    let stored = storage.get_item(&args.key)?.as_deref() == Some(args.value.as_str());

    match format {
        OutputFormat::Human if stored => println!("Stored {}", args.key),
        OutputFormat::Human => eprintln!("{}: not stored", args.key),
        OutputFormat::Json => print_json(&serde_json::json!({
            "key": args.key,
            "stored": stored,
        }))?,
    }

    Ok(())
}

/// Run the `remove` command
pub fn remove(
    runtime: &SessionRuntime,
    args: &KeyArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    runtime.storage().remove_item(&args.key)?;

    match format {
        OutputFormat::Human => println!("Removed {}", args.key),
        OutputFormat::Json => print_json(&serde_json::json!({ "removed": args.key }))?,
    }

    Ok(())
}

/// Run the `keys` command
pub fn list(runtime: &SessionRuntime, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let storage = runtime.storage();
    let keys = storage.keys()?;

    match format {
        OutputFormat::Human => {
            if keys.is_empty() {
                println!("No keys found.");
                return Ok(());
            }

            let mut rows = Vec::with_capacity(keys.len());
            for key in &keys {
                let value = storage.get_item(key)?.unwrap_or_default();
                rows.push(vec![key.clone(), preview(&value, 48)]);
            }
            print_table(&["KEY", "VALUE"], &rows);
        }
        OutputFormat::Json => print_json(&serde_json::json!(keys))?,
    }

    Ok(())
}

/// Run the `clear` command
pub fn clear(runtime: &SessionRuntime, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let scope = runtime
        .namespaced()
        .namespace()
        .map(|ns| ns.to_string());
    runtime.storage().clear()?;

    match format {
        OutputFormat::Human => match &scope {
            Some(ns) => println!("Cleared namespace {ns}"),
            None => println!("Cleared store"),
        },
        OutputFormat::Json => print_json(&serde_json::json!({ "cleared": scope }))?,
    }

    Ok(())
}
