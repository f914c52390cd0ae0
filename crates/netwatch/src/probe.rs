// ── System prober ──
//
// Echo tests shell out to the platform `ping` binary and parse its summary
// lines. Address resolution is a bounded ping sweep followed by a read of
// the kernel neighbour table for MAC addresses. Management queries are not
// available and fall back to the trait's `Unsupported` default.

use std::net::IpAddr;
use std::process::Stdio;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use tokio::process::Command;
use tracing::{debug, trace};

use netwatch_core::{EchoReply, MacAddress, NetworkRange, ProbeError, Prober, ResolvedHost};

/// Linux neighbour table.
const ARP_TABLE: &str = "/proc/net/arp";

/// Slack on top of `count * timeout` before the child is abandoned.
const PING_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct SystemProber {
    sweep_concurrency: usize,
}

impl SystemProber {
    pub fn new(sweep_concurrency: usize) -> Self {
        Self {
            sweep_concurrency: sweep_concurrency.max(1),
        }
    }

    async fn ping(&self, ip: IpAddr, count: u32, timeout: Duration) -> Result<EchoReply, ProbeError> {
        let target = ip.to_string();
        let wait_secs = timeout.as_secs().max(1).to_string();

        let mut cmd = Command::new("ping");
        if ip.is_ipv6() {
            cmd.arg("-6");
        }
        cmd.args(["-n", "-q", "-c", &count.max(1).to_string(), "-W", &wait_secs])
            .arg(&target)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let budget = timeout * count.max(1) + PING_GRACE;
        let output = tokio::time::timeout(budget, cmd.output())
            .await
            .map_err(|_| ProbeError::Timeout {
                target: target.clone(),
                timeout_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
            })?
            .map_err(|e| ProbeError::Transport {
                target: target.clone(),
                reason: format!("failed to run ping: {e}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!(%target, status = ?output.status.code(), "ping finished");

        parse_ping_output(&stdout).ok_or_else(|| {
            let stderr = String::from_utf8_lossy(&output.stderr);
            ProbeError::Transport {
                target,
                reason: first_line(&stderr).unwrap_or("no summary in ping output").to_owned(),
            }
        })
    }
}

impl Prober for SystemProber {
    async fn echo(&self, ip: IpAddr, count: u32, timeout: Duration) -> Result<EchoReply, ProbeError> {
        self.ping(ip, count, timeout).await
    }

    async fn resolve(
        &self,
        range: &NetworkRange,
        timeout: Duration,
        retries: u32,
    ) -> Result<Vec<ResolvedHost>, ProbeError> {
        let started = Instant::now();
        let alive: Vec<(IpAddr, f64)> = stream::iter(range.hosts().map(IpAddr::V4))
            .map(|ip| async move {
                for _ in 0..=retries {
                    match self.ping(ip, 1, timeout).await {
                        Ok(reply) if reply.alive => return Some((ip, reply.avg_rtt_ms)),
                        _ => {}
                    }
                }
                None
            })
            .buffer_unordered(self.sweep_concurrency)
            .filter_map(|hit| async move { hit })
            .collect()
            .await;

        let neighbours = match tokio::fs::read_to_string(ARP_TABLE).await {
            Ok(text) => parse_arp_table(&text),
            Err(e) => {
                debug!(error = %e, "neighbour table unavailable, skipping MAC lookup");
                Vec::new()
            }
        };

        debug!(
            %range,
            alive = alive.len(),
            elapsed = ?started.elapsed(),
            "ping sweep complete"
        );

        Ok(alive
            .into_iter()
            .map(|(ip, rtt)| ResolvedHost {
                ip,
                mac: neighbours
                    .iter()
                    .find(|(n, _)| *n == ip)
                    .map(|(_, mac)| mac.clone()),
                hostname: None,
                response_time_ms: Some(rtt),
            })
            .collect())
    }
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}

// ── Output parsing ───────────────────────────────────────────────────

/// Parse the summary of iputils or BSD `ping -q`.
///
/// ```text
/// 3 packets transmitted, 2 received, 33.3333% packet loss, time 2003ms
/// rtt min/avg/max/mdev = 0.045/0.060/0.071/0.011 ms
/// ```
pub(crate) fn parse_ping_output(text: &str) -> Option<EchoReply> {
    let stats = text.lines().find(|l| l.contains("packets transmitted"))?;
    let loss_pct = stats
        .split(',')
        .map(str::trim)
        .find(|part| part.ends_with("packet loss"))
        .and_then(|part| part.split('%').next())
        .and_then(|pct| pct.trim().parse::<f64>().ok())?;
    let loss_fraction = (loss_pct / 100.0).clamp(0.0, 1.0);

    let rtts: Option<Vec<f64>> = text
        .lines()
        .find(|l| l.contains("min/avg/max"))
        .and_then(|l| l.split('=').nth(1))
        .map(|values| {
            values
                .trim()
                .trim_end_matches("ms")
                .split('/')
                .filter_map(|v| v.trim().parse::<f64>().ok())
                .collect()
        });

    match rtts.as_deref() {
        Some([min, avg, max, ..]) if loss_fraction < 1.0 => Some(EchoReply {
            alive: true,
            avg_rtt_ms: *avg,
            min_rtt_ms: *min,
            max_rtt_ms: *max,
            loss_fraction,
        }),
        _ => Some(EchoReply {
            loss_fraction: 1.0,
            ..EchoReply::silent()
        }),
    }
}

/// Parse `/proc/net/arp`, skipping incomplete entries.
pub(crate) fn parse_arp_table(text: &str) -> Vec<(IpAddr, MacAddress)> {
    text.lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let ip = fields.next()?.parse::<IpAddr>().ok()?;
            let mac = fields.nth(2)?;
            if mac == "00:00:00:00:00:00" {
                return None;
            }
            MacAddress::parse(mac).ok().map(|mac| (ip, mac))
        })
        .collect()
}
