//! Link command handlers.

use tabled::Tabled;

use netwatch_core::{CableReport, Link, LinkCheck, LinkFilter, RecommendationLevel};

use crate::cli::{GlobalOpts, LinksArgs, LinksCommand};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Jitter")]
    jitter: String,
    #[tabled(rename = "Loss")]
    loss: String,
    #[tabled(rename = "Medium")]
    medium: String,
}

impl LinkRow {
    fn new(l: &Link, color: bool) -> Self {
        Self {
            id: l.id.to_string(),
            name: l.display_name(),
            status: output::paint_status(l.status, color),
            score: l.health_score.map(|s| s.to_string()).unwrap_or_default(),
            latency: output::opt_f64(l.latency_ms, " ms"),
            jitter: output::opt_f64(l.jitter_ms, " ms"),
            loss: output::opt_f64(l.packet_loss_pct, "%"),
            medium: l
                .medium
                .as_ref()
                .map(|m| m.medium_type.to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Was")]
    previous: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Note")]
    note: String,
}

impl CheckRow {
    fn new(c: &LinkCheck, color: bool) -> Self {
        Self {
            id: c.link_id.to_string(),
            name: c.name.clone(),
            status: output::paint_status(c.status, color),
            previous: c.previous_status.to_string(),
            score: c.health_score.map(|s| s.to_string()).unwrap_or_default(),
            latency: output::opt_f64(c.latency_ms, " ms"),
            note: c.error.clone().unwrap_or_default(),
        }
    }
}

fn check_detail(c: &LinkCheck) -> String {
    let mut lines = vec![
        format!("Link:     {} ({})", c.name, c.link_id),
        format!("Status:   {} (was {})", c.status, c.previous_status),
        format!(
            "Score:    {}",
            c.health_score.map_or_else(|| "-".into(), |s| s.to_string())
        ),
        format!("Latency:  {}", output::opt_f64(c.latency_ms, " ms")),
        format!("Jitter:   {}", output::opt_f64(c.jitter_ms, " ms")),
        format!("Loss:     {}", output::opt_f64(c.packet_loss_pct, "%")),
    ];
    if c.status_changed {
        lines.push("Changed:  yes".into());
    }
    if let Some(ref err) = c.error {
        lines.push(format!("Error:    {err}"));
    }
    lines.join("\n")
}

fn report_detail(r: &CableReport, color: bool) -> String {
    let s = &r.sample;
    let mut lines = vec![
        format!("Link:        {} ({})", r.name, r.link_id),
        format!(
            "Health:      {} ({}/100)",
            output::paint_health(s.status, color),
            s.score
        ),
        format!("Reachable:   {}", s.reachable),
        format!("Latency:     {}", output::opt_f64(s.latency_avg_ms, " ms")),
        format!(
            "Range:       {} .. {}",
            output::opt_f64(s.latency_min_ms, " ms"),
            output::opt_f64(s.latency_max_ms, " ms")
        ),
        format!("Jitter:      {}", output::opt_f64(s.jitter_ms, " ms")),
        format!("Packet loss: {:.1}%", s.loss_pct),
    ];
    if let Some(ref v) = r.validation {
        lines.push(format!(
            "Medium:      {} rated {} Mbps, measured {:.0} Mbps ({:.1}%)",
            v.medium_type, v.expected_speed_mbps, v.actual_speed_mbps, v.utilization_pct
        ));
    }
    if !r.recommendations.is_empty() {
        lines.push(String::new());
        lines.push("Recommendations:".into());
        for rec in &r.recommendations {
            let marker = match rec.level {
                RecommendationLevel::Critical => "!!",
                RecommendationLevel::Warning => " !",
                RecommendationLevel::Ok => "ok",
            };
            lines.push(format!("  {marker} {}", rec.message));
        }
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &Session, args: LinksArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = &session.monitor;
    let color = output::should_color(&global.color);

    match args.command {
        LinksCommand::List { monitored, device } => {
            let filter = match device {
                Some(d) => LinkFilter::ByDevice(util::resolve_device_id(monitor, &d).await?),
                None if monitored => LinkFilter::Monitored,
                None => LinkFilter::All,
            };
            let links: Vec<Link> = monitor
                .list_links()
                .await?
                .into_iter()
                .filter(|l| filter.matches(l) && (!monitored || l.is_monitored))
                .collect();

            let out = output::render_list(
                &global.output,
                &links,
                |l| LinkRow::new(l, color),
                |l| l.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LinksCommand::Check { link } => {
            let check = monitor.check_link(&link.as_str().into()).await?;
            session.save()?;
            let out = output::render_single(&global.output, &check, check_detail, |c| {
                c.status.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LinksCommand::CheckAll => {
            let bar = util::spinner("Measuring links".into(), global.quiet);
            let sweep = monitor.check_all_links().await;
            bar.finish_and_clear();
            let sweep = sweep?;
            session.save()?;

            let out = output::render_list(
                &global.output,
                &sweep.checks,
                |c| CheckRow::new(c, color),
                |c| format!("{} {}", c.link_id, c.status),
            )?;
            output::print_output(&out, global.quiet);
            if !global.quiet {
                let s = sweep.summary;
                eprintln!(
                    "{} links: {} up, {} degraded, {} down, {} errors",
                    s.total, s.up, s.degraded, s.down, s.errored
                );
            }
            Ok(())
        }

        LinksCommand::Report { link } => {
            let bar = util::spinner(format!("Measuring link {link}"), global.quiet);
            let report = monitor.cable_report(&link.as_str().into()).await;
            bar.finish_and_clear();
            let report = report?;
            let out = output::render_single(
                &global.output,
                &report,
                |r| report_detail(r, color),
                |r| r.sample.score.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
