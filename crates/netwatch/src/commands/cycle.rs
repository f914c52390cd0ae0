//! `netwatch cycle`: one full monitoring pass.

use netwatch_core::CycleSummary;

use crate::cli::GlobalOpts;
use crate::config::Session;
use crate::error::CliError;
use crate::output;

pub(crate) fn detail(s: &CycleSummary) -> String {
    let mut lines = vec![
        format!("Started:   {}", s.started_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Duration:  {} ms", s.duration_ms),
        format!(
            "Devices:   {} checked, {} up, {} down, {} unreachable, {} errors",
            s.devices.total, s.devices.up, s.devices.down, s.devices.unreachable, s.devices.errored
        ),
        format!(
            "Links:     {} checked, {} up, {} degraded, {} down, {} errors",
            s.links.total, s.links.up, s.links.degraded, s.links.down, s.links.errored
        ),
        format!("Committed: {}", if s.committed { "yes" } else { "no" }),
    ];
    if let Some(ref err) = s.error {
        lines.push(format!("Error:     {err}"));
    }
    lines.join("\n")
}

pub async fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let bar = super::util::spinner("Running monitoring cycle".into(), global.quiet);
    let summary = session.monitor.run_cycle().await;
    bar.finish_and_clear();

    let out = output::render_single(&global.output, &summary, detail, |s| {
        if s.is_ok() { "ok".into() } else { "failed".into() }
    })?;
    output::print_output(&out, global.quiet);

    match summary.error {
        None => session.save(),
        Some(message) => Err(CliError::CycleFailed { message }),
    }
}
