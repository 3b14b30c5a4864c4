//! Export and import of the active user's data.

use scopekv::SessionRuntime;

use crate::cli::{ExportArgs, ImportArgs};
use crate::output::{OutputFormat, print_json};

/// Run the `export` command
pub fn export(
    runtime: &SessionRuntime,
    args: &ExportArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = runtime.namespaced();
    if storage.namespace().is_none() {
        return Err("no user is signed in; nothing to export".into());
    }
    let data = serde_json::Value::Object(storage.export_user_data());

    match &args.out {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(&data)?)?;
            let count = data.as_object().map(|m| m.len()).unwrap_or(0);
            match format {
                OutputFormat::Human => {
                    println!("Exported {count} keys to {}", path.display())
                }
                OutputFormat::Json => print_json(&serde_json::json!({
                    "exported": count,
                    "path": path.display().to_string(),
                }))?,
            }
        }
        None => match format {
            OutputFormat::Human => println!("{}", serde_json::to_string_pretty(&data)?),
            OutputFormat::Json => print_json(&data)?,
        },
    }

    Ok(())
}

/// Run the `import` command
pub fn import(
    runtime: &SessionRuntime,
    args: &ImportArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = runtime.namespaced();
    if storage.namespace().is_none() {
        return Err("no user is signed in; refusing to import".into());
    }

    let json = std::fs::read_to_string(&args.file)?;
    let data: serde_json::Value = serde_json::from_str(&json)?;
    let Some(entries) = data.as_object() else {
        return Err(format!("{} must contain a JSON object", args.file.display()).into());
    };
    let written = storage.import_user_data(entries);

    match format {
        OutputFormat::Human => println!("Imported {written} of {} keys", entries.len()),
        OutputFormat::Json => print_json(&serde_json::json!({
            "imported": written,
            "total": entries.len(),
        }))?,
    }

    Ok(())
}
