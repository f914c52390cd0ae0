// ── Probe capabilities ──
//
// The raw wire work (ICMP echo, ARP sweeps, SNMP) lives outside the
// core. A `Prober` exposes it as three async capabilities; the optional
// ones default to `ProbeError::Unsupported`.

use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{MacAddress, NetworkRange};

#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("probe to {target} failed: {reason}")]
    Transport { target: String, reason: String },

    #[error("probe to {target} timed out after {timeout_ms}ms")]
    Timeout { target: String, timeout_ms: u64 },

    #[error("{capability} is not supported")]
    Unsupported { capability: String },
}

impl ProbeError {
    pub fn unsupported(capability: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: capability.into(),
        }
    }
}

/// Outcome of a multi-packet echo test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EchoReply {
    pub alive: bool,
    pub avg_rtt_ms: f64,
    pub min_rtt_ms: f64,
    pub max_rtt_ms: f64,
    /// Lost packets as a fraction in `0.0..=1.0`.
    pub loss_fraction: f64,
}

impl EchoReply {
    /// A host that answered nothing.
    pub fn silent() -> Self {
        Self {
            alive: false,
            avg_rtt_ms: 0.0,
            min_rtt_ms: 0.0,
            max_rtt_ms: 0.0,
            loss_fraction: 1.0,
        }
    }
}

/// One host answering an address-resolution sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedHost {
    pub ip: IpAddr,
    pub mac: Option<MacAddress>,
    pub hostname: Option<String>,
    pub response_time_ms: Option<f64>,
}

/// Answer to a management-protocol system query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDescription {
    pub ip: IpAddr,
    pub description: String,
    pub name: Option<String>,
}

/// Network probing primitives consumed by checkers and discovery.
pub trait Prober: Send + Sync + 'static {
    /// Send `count` echo requests, waiting up to `timeout` for each.
    fn echo(
        &self,
        ip: IpAddr,
        count: u32,
        timeout: Duration,
    ) -> impl Future<Output = Result<EchoReply, ProbeError>> + Send;

    /// Sweep `range` and report every host that answered.
    fn resolve(
        &self,
        range: &NetworkRange,
        timeout: Duration,
        retries: u32,
    ) -> impl Future<Output = Result<Vec<ResolvedHost>, ProbeError>> + Send {
        let _ = (range, timeout, retries);
        async { Err(ProbeError::unsupported("address resolution")) }
    }

    /// Query a host's management agent for its system description.
    fn describe(
        &self,
        ip: IpAddr,
    ) -> impl Future<Output = Result<SystemDescription, ProbeError>> + Send {
        let _ = ip;
        async { Err(ProbeError::unsupported("management query")) }
    }
}
