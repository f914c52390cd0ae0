//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::str::FromStr;

use netwatch_core::EntityId;

use crate::config::NetMonitor;
use crate::error::CliError;

/// Resolve a device identifier (ID or IP address) against the topology.
pub async fn resolve_device_id(monitor: &NetMonitor, identifier: &str) -> Result<EntityId, CliError> {
    let devices = monitor.list_devices().await?;
    devices
        .iter()
        .find(|d| {
            d.id.to_string() == identifier || d.ip.is_some_and(|ip| ip.to_string() == identifier)
        })
        .map(|d| d.id.clone())
        .ok_or_else(|| CliError::NotFound {
            resource_type: "device".into(),
            identifier: identifier.into(),
            list_command: "devices list".into(),
        })
}

/// Parse a case-insensitive wire name (`UP`, `cat6`, `link_down`).
pub fn parse_name<T: FromStr>(field: &str, value: &str) -> Result<T, CliError> {
    value.parse::<T>().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("unknown value '{value}'"),
    })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Spinner on stderr while a long operation runs. Hidden when quiet or
/// when stderr is not a terminal.
pub fn spinner(message: String, quiet: bool) -> indicatif::ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return indicatif::ProgressBar::hidden();
    }
    let bar = indicatif::ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}
