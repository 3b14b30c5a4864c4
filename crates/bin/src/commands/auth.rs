//! Login and logout commands - write the session keys the way the login screen does.

use scopekv::{
    AuthSignal, Namespace, SessionRuntime,
    auth::{begin_manual_logout, clear_session, store_login},
    namespace::NamespaceRefresh,
    profile::UserProfile,
};

use crate::cli::{LoginArgs, LogoutArgs};
use crate::output::{OutputFormat, print_json};

fn report(
    action: &str,
    refresh: &NamespaceRefresh,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => {
            match &refresh.namespace {
                Some(ns) => println!("{action}; namespace {ns}"),
                None => println!("{action}; no namespace active"),
            }
            if refresh.purged > 0 {
                println!("Purged {} keys from other namespaces", refresh.purged);
            }
            if refresh.migrated > 0 {
                println!("Migrated {} legacy keys", refresh.migrated);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "action": action,
            "namespace": refresh.namespace.as_ref().map(Namespace::as_str),
            "purged": refresh.purged,
            "migrated": refresh.migrated,
        }))?,
    }
    Ok(())
}

/// Run the `login` command
pub fn login(
    runtime: &SessionRuntime,
    args: &LoginArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let profile = UserProfile::new(args.email.trim(), !args.unverified);
    if profile.identifier().is_none() {
        return Err("email must not be blank".into());
    }
    store_login(runtime.storage().as_ref(), &args.token, &profile)?;
    tracing::info!(email = %args.email.trim(), "Login recorded");

    let refresh = runtime.namespaced().manager().refresh();
    report("Logged in", &refresh, format)
}

/// Run the `logout` command
pub fn logout(
    runtime: &SessionRuntime,
    args: &LogoutArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = runtime.storage();
    let signal = if args.manual {
        begin_manual_logout(storage.as_ref())?;
        AuthSignal::ManualLogout
    } else {
        clear_session(storage.as_ref())?;
        AuthSignal::Logout
    };
    tracing::info!(manual = args.manual, "Session keys cleared");

    let refresh = runtime
        .namespaced()
        .manager()
        .handle_signal(&signal)
        .unwrap_or_else(|| runtime.namespaced().manager().refresh());
    report("Logged out", &refresh, format)
}
