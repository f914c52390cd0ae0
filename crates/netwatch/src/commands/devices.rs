//! Device command handlers.

use tabled::Tabled;

use netwatch_core::{Device, DeviceCheck, DeviceFilter, DeviceType, Status, SystemDescription};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Loss")]
    loss: String,
    #[tabled(rename = "Monitored")]
    monitored: String,
}

impl DeviceRow {
    fn new(d: &Device, color: bool) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            ip: d.ip.map(|ip| ip.to_string()).unwrap_or_default(),
            dtype: d.device_type.to_string(),
            status: output::paint_status(d.status, color),
            latency: output::opt_f64(d.latency_ms, " ms"),
            loss: output::opt_f64(d.packet_loss_pct, "%"),
            monitored: if d.is_monitored { "yes" } else { "no" }.into(),
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
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Loss")]
    loss: String,
    #[tabled(rename = "Note")]
    note: String,
}

impl CheckRow {
    fn new(c: &DeviceCheck, color: bool) -> Self {
        Self {
            id: c.device_id.to_string(),
            name: c.name.clone(),
            status: output::paint_status(c.status, color),
            previous: c.previous_status.to_string(),
            latency: output::opt_f64(c.latency_ms, " ms"),
            loss: output::opt_f64(c.packet_loss_pct, "%"),
            note: c.error.clone().unwrap_or_default(),
        }
    }
}

fn detail(d: &Device) -> String {
    [
        format!("ID:           {}", d.id),
        format!("Name:         {}", d.name),
        format!(
            "IP:           {}",
            d.ip.map_or_else(|| "-".into(), |ip| ip.to_string())
        ),
        format!(
            "MAC:          {}",
            d.mac.as_ref().map_or_else(|| "-".into(), ToString::to_string)
        ),
        format!("Hostname:     {}", d.hostname.as_deref().unwrap_or("-")),
        format!("Type:         {}", d.device_type),
        format!("Status:       {}", d.status),
        format!("Monitored:    {}", d.is_monitored),
        format!("Latency:      {}", output::opt_f64(d.latency_ms, " ms")),
        format!("Packet loss:  {}", output::opt_f64(d.packet_loss_pct, "%")),
        format!(
            "Last seen:    {}",
            d.last_seen.map_or_else(|| "-".into(), |t| t.to_rfc3339())
        ),
        format!(
            "Last checked: {}",
            d.last_checked_at.map_or_else(|| "-".into(), |t| t.to_rfc3339())
        ),
    ]
    .join("\n")
}

fn check_detail(c: &DeviceCheck) -> String {
    let mut lines = vec![
        format!("Device:   {} ({})", c.name, c.device_id),
        format!("Status:   {} (was {})", c.status, c.previous_status),
        format!("Latency:  {}", output::opt_f64(c.latency_ms, " ms")),
        format!("Loss:     {}", output::opt_f64(c.packet_loss_pct, "%")),
    ];
    if c.status_changed {
        lines.push("Changed:  yes, event recorded".into());
    }
    if let Some(ref err) = c.error {
        lines.push(format!("Error:    {err}"));
    }
    lines.join("\n")
}

fn description_detail(d: &SystemDescription) -> String {
    [
        format!("IP:          {}", d.ip),
        format!("Name:        {}", d.name.as_deref().unwrap_or("-")),
        format!("Description: {}", d.description),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &Session, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = &session.monitor;
    let color = output::should_color(&global.color);

    match args.command {
        DevicesCommand::List {
            monitored,
            status,
            device_type,
        } => {
            let mut filters = Vec::new();
            if monitored {
                filters.push(DeviceFilter::Monitored);
            }
            if let Some(s) = status {
                filters.push(DeviceFilter::ByStatus(util::parse_name::<Status>("status", &s)?));
            }
            if let Some(t) = device_type {
                filters.push(DeviceFilter::ByType(util::parse_name::<DeviceType>("type", &t)?));
            }

            let devices: Vec<Device> = monitor
                .list_devices()
                .await?
                .into_iter()
                .filter(|d| filters.iter().all(|f| f.matches(d)))
                .collect();

            let out = output::render_list(
                &global.output,
                &devices,
                |d| DeviceRow::new(d, color),
                |d| d.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let id = util::resolve_device_id(monitor, &device).await?;
            let found = monitor.device(&id).await?;
            let out = output::render_single(&global.output, &found, detail, |d| d.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Check { device } => {
            let id = util::resolve_device_id(monitor, &device).await?;
            let check = monitor.check_device(&id).await?;
            session.save()?;
            let out = output::render_single(&global.output, &check, check_detail, |c| {
                c.status.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::CheckAll => {
            let bar = util::spinner("Checking devices".into(), global.quiet);
            let sweep = monitor.check_all_devices().await;
            bar.finish_and_clear();
            let sweep = sweep?;
            session.save()?;

            let out = output::render_list(
                &global.output,
                &sweep.checks,
                |c| CheckRow::new(c, color),
                |c| format!("{} {}", c.device_id, c.status),
            )?;
            output::print_output(&out, global.quiet);
            if !global.quiet {
                let s = sweep.summary;
                eprintln!(
                    "{} devices: {} up, {} down, {} unreachable, {} errors",
                    s.total, s.up, s.down, s.unreachable, s.errored
                );
            }
            Ok(())
        }

        DevicesCommand::Describe { device } => {
            let id = util::resolve_device_id(monitor, &device).await?;
            let description = monitor.describe_device(&id).await?;
            let out = output::render_single(&global.output, &description, description_detail, |d| {
                d.description.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
