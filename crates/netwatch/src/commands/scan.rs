//! Discovery handlers: `scan`, `probe`, `ping`.

use std::net::IpAddr;

use tabled::Tabled;

use netwatch_core::{Candidate, DiscoveryIssue, DiscoverySummary, PingResult};

use crate::cli::{GlobalOpts, ScanArgs};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Latency")]
    latency: String,
}

impl CandidateRow {
    fn new(c: &Candidate, color: bool) -> Self {
        Self {
            ip: c.ip.to_string(),
            mac: c.mac.as_ref().map(ToString::to_string).unwrap_or_default(),
            hostname: c.hostname.clone().unwrap_or_default(),
            dtype: c.device_type.to_string(),
            status: output::paint_status(c.status, color),
            latency: output::opt_f64(c.latency_ms.or(c.response_time_ms), " ms"),
        }
    }
}

#[derive(Tabled)]
struct PingRow {
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Alive")]
    alive: String,
    #[tabled(rename = "Avg")]
    avg: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Loss")]
    loss: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&PingResult> for PingRow {
    fn from(p: &PingResult) -> Self {
        Self {
            ip: p.ip.to_string(),
            alive: if p.alive { "yes" } else { "no" }.into(),
            avg: output::opt_f64(p.latency_ms, " ms"),
            min: output::opt_f64(p.min_rtt_ms, " ms"),
            max: output::opt_f64(p.max_rtt_ms, " ms"),
            loss: format!("{:.0}%", p.packet_loss_pct),
            error: p.error.clone().unwrap_or_default(),
        }
    }
}

fn summary_detail(s: &DiscoverySummary) -> String {
    [
        format!("Range:      {}", s.network_range),
        format!("Discovered: {}", s.total_discovered),
        format!("New:        {}", s.new_devices),
        format!("Updated:    {}", s.updated_devices),
        format!("Errors:     {}", s.errors.len()),
    ]
    .join("\n")
}

fn candidate_detail(c: &Candidate) -> String {
    [
        format!("IP:          {}", c.ip),
        format!(
            "MAC:         {}",
            c.mac.as_ref().map_or_else(|| "-".into(), ToString::to_string)
        ),
        format!("Hostname:    {}", c.hostname.as_deref().unwrap_or("-")),
        format!("Description: {}", c.description.as_deref().unwrap_or("-")),
        format!("Type:        {}", c.device_type),
        format!("Status:      {}", c.status),
        format!("Latency:     {}", output::opt_f64(c.latency_ms, " ms")),
        format!("Loss:        {}", output::opt_f64(c.packet_loss_pct, "%")),
    ]
    .join("\n")
}

fn warn_issues(issues: &[DiscoveryIssue], quiet: bool) {
    if quiet {
        return;
    }
    for issue in issues {
        match issue.ip {
            Some(ip) => eprintln!("warning: {ip}: {}", issue.message),
            None => eprintln!("warning: {}", issue.message),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(session: &Session, args: ScanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = &session.monitor;
    let range_label = args
        .range
        .clone()
        .unwrap_or_else(|| monitor.config().discovery.default_range.to_string());
    let bar = util::spinner(format!("Scanning {range_label}"), global.quiet);

    if args.save {
        let summary = monitor.discover_and_save(args.range.as_deref()).await;
        bar.finish_and_clear();
        let summary = summary?;
        session.save()?;

        warn_issues(&summary.errors, global.quiet);
        let out = output::render_single(&global.output, &summary, summary_detail, |s| {
            s.total_discovered.to_string()
        })?;
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let report = monitor
        .scan_network(args.range.as_deref(), !args.no_verify)
        .await;
    bar.finish_and_clear();
    let report = report?;

    warn_issues(&report.errors, global.quiet);
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &report.candidates,
        |c| CandidateRow::new(c, color),
        |c| c.ip.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn probe(session: &Session, ip: IpAddr, global: &GlobalOpts) -> Result<(), CliError> {
    match session.monitor.scan_single(ip).await? {
        Some(candidate) => {
            let out = output::render_single(&global.output, &candidate, candidate_detail, |c| {
                c.device_type.to_string()
            })?;
            output::print_output(&out, global.quiet);
        }
        None => {
            if !global.quiet {
                eprintln!("{ip}: no response");
            }
        }
    }
    Ok(())
}

pub async fn ping(session: &Session, ips: &[IpAddr], global: &GlobalOpts) -> Result<(), CliError> {
    let results = session.monitor.batch_ping(ips).await?;
    let out = output::render_list(&global.output, &results, |p| PingRow::from(p), |p| {
        format!("{} {}", p.ip, if p.alive { "up" } else { "down" })
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
