//! Clap derive structures for the `netwatch` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netwatch -- network topology health monitor
#[derive(Debug, Parser)]
#[command(
    name = "netwatch",
    version,
    about = "Monitor network topology health from the command line",
    long_about = "Probes the devices and links of a network topology, scores link health,\n\
        raises events on status transitions and discovers hosts on a subnet.\n\n\
        The topology (devices, links and events) lives in a JSON file selected\n\
        by the active profile or --topology.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "NETWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "NETWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Topology file (overrides profile)
    #[arg(long, short = 't', env = "NETWATCH_TOPOLOGY", global = true)]
    pub topology: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NETWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one monitoring cycle over every monitored device and link
    Cycle,

    /// Run monitoring cycles continuously until interrupted
    Watch(WatchArgs),

    /// Inspect and check devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Inspect and check links
    #[command(alias = "l")]
    Links(LinksArgs),

    /// Discover hosts on a subnet
    Scan(ScanArgs),

    /// Probe a single address as a discovery candidate
    Probe {
        /// Address to probe
        ip: IpAddr,
    },

    /// Echo-test one or more addresses
    Ping {
        /// Addresses to ping
        #[arg(required = true)]
        ips: Vec<IpAddr>,
    },

    /// List and manage events
    #[command(alias = "ev")]
    Events(EventsArgs),

    /// Physical medium utilities
    Medium(MediumArgs),

    /// Show monitor status and topology counts
    Status,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between cycle starts (overrides config)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many cycles
    #[arg(long, short = 'n')]
    pub cycles: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices in the topology
    #[command(alias = "ls")]
    List {
        /// Only monitored devices
        #[arg(long, short = 'm')]
        monitored: bool,

        /// Filter by status (UP, DOWN, UNREACHABLE, UNKNOWN)
        #[arg(long, short = 's')]
        status: Option<String>,

        /// Filter by device type (ROUTER, SWITCH, SERVER, AP, ...)
        #[arg(long = "type")]
        device_type: Option<String>,
    },

    /// Show device details
    Get {
        /// Device ID or IP address
        device: String,
    },

    /// Echo-test one device and record its status
    Check {
        /// Device ID or IP address
        device: String,
    },

    /// Echo-test every monitored device
    CheckAll,

    /// Query a device's management agent for its system description
    Describe {
        /// Device ID or IP address
        device: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LINKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LinksArgs {
    #[command(subcommand)]
    pub command: LinksCommand,
}

#[derive(Debug, Subcommand)]
pub enum LinksCommand {
    /// List links in the topology
    #[command(alias = "ls")]
    List {
        /// Only monitored links
        #[arg(long, short = 'm')]
        monitored: bool,

        /// Only links touching this device (ID or IP address)
        #[arg(long, short = 'd')]
        device: Option<String>,
    },

    /// Measure one link and record its health
    Check {
        /// Link ID
        link: String,
    },

    /// Measure every monitored link
    CheckAll,

    /// Measure a link and print a health report with recommendations
    Report {
        /// Link ID
        link: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SCAN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// CIDR range to scan (defaults to the profile's range)
    pub range: Option<String>,

    /// Skip the per-host echo verification
    #[arg(long, conflicts_with = "save")]
    pub no_verify: bool,

    /// Add new hosts to the topology and update known ones
    #[arg(long, short = 's')]
    pub save: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EVENTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// List events, newest first
    #[command(alias = "ls")]
    List(EventListArgs),

    /// Acknowledge an event
    Ack {
        /// Event ID
        event: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Resolve an event (acknowledging it if needed)
    Resolve {
        /// Event ID
        event: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Acknowledge several events at once
    BulkAck {
        /// Event IDs
        #[arg(required = true)]
        events: Vec<String>,

        #[command(flatten)]
        actor: ActorArgs,
    },
}

#[derive(Debug, Args)]
pub struct EventListArgs {
    /// Only unresolved events
    #[arg(long, short = 'a')]
    pub active: bool,

    /// Only unacknowledged events
    #[arg(long, short = 'u')]
    pub unacknowledged: bool,

    /// Minimum severity (INFO, LOW, MEDIUM, HIGH, CRITICAL)
    #[arg(long, short = 's')]
    pub severity: Option<String>,

    /// Event type (DEVICE_DOWN, LINK_DEGRADED, ...)
    #[arg(long = "type")]
    pub event_type: Option<String>,

    /// Only events about this device ID
    #[arg(long, conflicts_with = "link")]
    pub device: Option<String>,

    /// Only events about this link ID
    #[arg(long)]
    pub link: Option<String>,

    /// Only events created within this many hours
    #[arg(long)]
    pub within: Option<u32>,

    /// Max results
    #[arg(long, short = 'l', default_value = "100")]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct ActorArgs {
    /// Operator recorded on the event
    #[arg(long, env = "NETWATCH_OPERATOR", default_value = "cli")]
    pub by: String,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MEDIUM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MediumArgs {
    #[command(subcommand)]
    pub command: MediumCommand,
}

#[derive(Debug, Subcommand)]
pub enum MediumCommand {
    /// Compare a measured speed against a medium's rated capacity
    Validate {
        /// Measured speed in Mbps
        speed_mbps: f64,

        /// Medium type (CAT5E, CAT6, FIBER_SM, ...)
        medium: String,
    },

    /// List known medium types and their rated speeds
    Types,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
