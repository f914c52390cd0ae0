// ── IPv4 network ranges ──

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An IPv4 range in CIDR notation, normalized to its network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkRange {
    network: Ipv4Addr,
    prefix: u8,
}

impl NetworkRange {
    pub const DEFAULT: Self = Self {
        network: Ipv4Addr::new(192, 168, 1, 0),
        prefix: 24,
    };

    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, CoreError> {
        if prefix > 32 {
            return Err(CoreError::invalid(
                "network range",
                format!("prefix /{prefix} exceeds /32"),
            ));
        }
        let network = Ipv4Addr::from(u32::from(addr) & mask(prefix));
        Ok(Self { network, prefix })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => u32::from(v4) & mask(self.prefix) == u32::from(self.network),
            IpAddr::V6(_) => false,
        }
    }

    /// Number of usable host addresses.
    pub fn host_count(&self) -> u64 {
        let total = 1u64 << (32 - u32::from(self.prefix));
        if self.prefix >= 31 { total } else { total - 2 }
    }

    /// Iterate usable host addresses (network and broadcast excluded below /31).
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        let base = u64::from(u32::from(self.network));
        let total = 1u64 << (32 - u32::from(self.prefix));
        let (first, last) = if self.prefix >= 31 {
            (base, base + total - 1)
        } else {
            (base + 1, base + total - 2)
        };
        (first..=last).filter_map(|n| u32::try_from(n).ok().map(Ipv4Addr::from))
    }
}

fn mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for NetworkRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => {
                let prefix = prefix.parse::<u8>().map_err(|_| {
                    CoreError::invalid("network range", format!("bad prefix in '{s}'"))
                })?;
                (addr, prefix)
            }
            None => (s, 32),
        };
        let addr = addr.parse::<Ipv4Addr>().map_err(|_| {
            CoreError::invalid("network range", format!("'{s}' is not an IPv4 CIDR range"))
        })?;
        Self::new(addr, prefix)
    }
}

impl TryFrom<String> for NetworkRange {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NetworkRange> for String {
    fn from(range: NetworkRange) -> Self {
        range.to_string()
    }
}
