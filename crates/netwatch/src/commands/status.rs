//! `netwatch status`

use netwatch_core::MonitorStatus;

use crate::cli::GlobalOpts;
use crate::config::Session;
use crate::error::CliError;
use crate::output;

fn detail(s: &MonitorStatus, color: bool) -> String {
    let h = &s.health;
    let mut lines = vec![
        format!(
            "Network health:    {:.1} {}",
            h.overall_score,
            output::paint_health(h.status, color)
        ),
        format!(
            "  Devices up:      {}/{} ({:.1}%)",
            h.counts.devices_up, h.counts.total_devices, h.device_health
        ),
        format!(
            "  Links up:        {}/{} ({:.1}%)",
            h.counts.links_up, h.counts.total_links, h.link_health
        ),
        format!(
            "  Critical (1h):   {} unacknowledged ({:.1})",
            h.counts.critical_events, h.event_impact
        ),
        String::new(),
        format!(
            "Scheduler:         {}",
            s.interval_secs
                .map_or_else(|| "idle".into(), |i| format!("running every {i}s"))
        ),
        format!("Cycles completed:  {}", s.cycles_completed),
        format!("Monitored devices: {}", s.monitored_devices),
        format!("Monitored links:   {}", s.monitored_links),
        format!("Open events:       {}", s.open_events),
        format!("Events (last 1h):  {}", s.recent_events),
    ];
    if let Some(ref cycle) = s.last_cycle {
        lines.push(String::new());
        lines.push(super::cycle::detail(cycle));
    }
    lines.join("\n")
}

pub async fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let status = session.monitor.status().await?;
    let color = output::should_color(&global.color);
    let out = output::render_single(&global.output, &status, |s| detail(s, color), |s| {
        s.open_events.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
