//! `netwatch watch`: continuous monitoring until Ctrl-C or `--cycles`.

use std::sync::Arc;
use std::time::Duration;

use owo_colors::OwoColorize;
use tracing::info;

use netwatch_core::CycleSummary;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

/// How often the last-cycle slot is checked for a new summary.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn cycle_line(n: u64, s: &CycleSummary, color: bool) -> String {
    let line = format!(
        "[{}] cycle {n}: devices {}/{} up, links {}/{} up ({} degraded), {} errors, {} ms",
        s.finished_at.format("%H:%M:%S"),
        s.devices.up,
        s.devices.total,
        s.links.up,
        s.links.total,
        s.links.degraded,
        s.devices.errored + s.links.errored,
        s.duration_ms,
    );
    match (&s.error, color) {
        (Some(err), true) => format!("{} {}", line.red(), err.red()),
        (Some(err), false) => format!("{line} FAILED: {err}"),
        (None, _) => line,
    }
}

fn print_cycle(n: u64, s: &CycleSummary, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            cycle_line(n, s, output::should_color(&global.color))
        }
        // One document per cycle, so line-oriented consumers can follow along.
        _ => output::render_single(&OutputFormat::JsonCompact, s, |_| String::new(), |_| {
            String::new()
        })?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(session: &Session, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = &session.monitor;
    monitor
        .start_continuous(args.interval.map(Duration::from_secs))
        .await?;
    if !global.quiet {
        eprintln!("Monitoring started, press Ctrl-C to stop");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut poll = tokio::time::interval(POLL_INTERVAL);
    let mut last: Option<Arc<CycleSummary>> = None;
    let mut seen = 0u64;

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                break Ok(());
            }
            _ = poll.tick() => {
                let Some(current) = monitor.last_cycle() else { continue };
                if last.as_ref().is_some_and(|prev| Arc::ptr_eq(prev, &current)) {
                    continue;
                }
                seen += 1;
                if let Err(e) = print_cycle(seen, &current, global).and_then(|()| session.save()) {
                    break Err(e);
                }
                last = Some(current);
                if args.cycles.is_some_and(|n| seen >= n) {
                    break Ok(());
                }
            }
        }
    };

    monitor.stop().await;
    session.save()?;
    if !global.quiet {
        eprintln!("Monitoring stopped after {seen} cycle(s)");
    }
    result
}
