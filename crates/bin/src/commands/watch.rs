//! Watch command - runs the session watcher against the store and prints events.

use scopekv::{SessionEvent, SessionRuntime, events::LogoutReason};
use tokio::sync::broadcast::error::RecvError;

use crate::output::{OutputFormat, print_json};

fn describe(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Login {
            identifier,
            timestamp,
        } => format!(
            "[{timestamp}] login {}",
            identifier.as_deref().unwrap_or("(unknown user)")
        ),
        SessionEvent::ManualLogout { timestamp } => format!("[{timestamp}] manual-logout"),
        SessionEvent::SystemLogout(detail) => {
            let reason = match detail.reason {
                LogoutReason::SessionExpired => "session expired",
                LogoutReason::TokenExpired => "token_expired",
            };
            format!(
                "[{}] system-logout ({reason}): {}",
                detail.timestamp, detail.message
            )
        }
        SessionEvent::AuthError(notice) => format!(
            "[{}] auth-error ({:?}): {}",
            notice.timestamp, notice.kind, notice.message
        ),
    }
}

/// Run the `watch` command
pub async fn run(runtime: &SessionRuntime, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = runtime.subscribe();
    let handle = runtime.start_watcher()?;

    if format == OutputFormat::Human {
        match runtime.namespaced().namespace() {
            Some(ns) => println!(
                "Watching {ns} (polling every {}ms)",
                runtime.config().poll_interval.as_millis()
            ),
            None => println!("Watching (signed out)"),
        }
        println!("Press Ctrl+C to stop");
    }

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => match format {
                    OutputFormat::Human => println!("{}", describe(&event)),
                    OutputFormat::Json => print_json(&serde_json::to_value(&event)?)?,
                },
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Dropped {missed} session events");
                }
                Err(RecvError::Closed) => break,
            },

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    handle.shutdown().await?;
    Ok(())
}
