//! Namespace commands - shows the active namespace, the raw layout, and purges.

use std::collections::BTreeMap;

use scopekv::{KeyClass, Namespace, SessionRuntime, Storage, auth::is_authenticated, classify};

use crate::output::{OutputFormat, preview, print_json, print_table};

fn class_label(class: KeyClass) -> &'static str {
    match class {
        KeyClass::System => "system",
        KeyClass::UserData => "user-data",
        KeyClass::UserPattern => "user-pattern",
        KeyClass::Shared => "shared",
    }
}

/// Run the `namespace` command
pub fn show(runtime: &SessionRuntime, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let storage = runtime.namespaced();
    let namespace = storage.namespace();
    let authenticated = is_authenticated(runtime.raw().as_ref());
    let user_keys = storage.get_user_keys().len();

    match format {
        OutputFormat::Human => {
            match &namespace {
                Some(ns) => println!("Namespace:      {ns}"),
                None => println!("Namespace:      (none)"),
            }
            println!("Authenticated:  {authenticated}");
            println!("User keys:      {user_keys}");
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "namespace": namespace.as_ref().map(Namespace::as_str),
            "authenticated": authenticated,
            "user_keys": user_keys,
        }))?,
    }

    Ok(())
}

/// Run the `inspect` command
pub fn inspect(
    runtime: &SessionRuntime,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = runtime.raw();
    let mut groups: BTreeMap<String, Vec<(String, KeyClass, String)>> = BTreeMap::new();
    for physical in raw.keys()? {
        let value = raw.get_item(&physical)?.unwrap_or_default();
        let (group, logical) = match Namespace::parse(&physical) {
            Some((ns, logical)) => (ns.to_string(), logical.to_string()),
            None => (String::new(), physical.clone()),
        };
        let class = classify(&logical);
        groups.entry(group).or_default().push((logical, class, value));
    }

    match format {
        OutputFormat::Human => {
            if groups.is_empty() {
                println!("Store is empty.");
                return Ok(());
            }

            let rows: Vec<Vec<String>> = groups
                .iter()
                .flat_map(|(group, entries)| {
                    entries.iter().map(move |(key, class, value)| {
                        let group = if group.is_empty() { "-" } else { group.as_str() };
                        vec![
                            group.to_string(),
                            key.clone(),
                            class_label(*class).to_string(),
                            preview(value, 40),
                        ]
                    })
                })
                .collect();
            print_table(&["NAMESPACE", "KEY", "CLASS", "VALUE"], &rows);
        }
        OutputFormat::Json => {
            let value: serde_json::Map<String, serde_json::Value> = groups
                .into_iter()
                .map(|(group, entries)| {
                    let entries: Vec<_> = entries
                        .into_iter()
                        .map(|(key, class, value)| {
                            serde_json::json!({
                                "key": key,
                                "class": class_label(class),
                                "value": value,
                            })
                        })
                        .collect();
                    (group, serde_json::Value::Array(entries))
                })
                .collect();
            print_json(&serde_json::Value::Object(value))?;
        }
    }

    Ok(())
}

/// Run the `purge` command
pub fn purge(runtime: &SessionRuntime, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let manager = runtime.namespaced().manager();
    let active = manager.current();
    let purged = manager.purge_stale_namespaces(active.as_ref());

    match format {
        OutputFormat::Human => println!("Purged {purged} keys"),
        OutputFormat::Json => print_json(&serde_json::json!({ "purged": purged }))?,
    }

    Ok(())
}
