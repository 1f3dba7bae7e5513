pub mod clear;
pub mod history;
pub mod monitor;
pub mod scan;
pub mod watch;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use subtrack_common::config::{Config, DEFAULT_BATCH_SIZE};

#[derive(Parser)]
#[command(name = "subtrack")]
#[command(about = "Subdomain discovery, reachability probing and change monitoring.")]
#[command(version)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// File the scan history is kept in
    #[arg(long, global = true, env = "SUBTRACK_STATE", default_value = "subtrack-history.json")]
    pub state: PathBuf,

    /// Remote monitoring service; the in-process monitor is used when unset
    #[arg(long, global = true, env = "SUBTRACK_MONITOR_URL")]
    pub monitor_url: Option<String>,

    /// Third-party finder binary
    #[arg(long, global = true, env = "SUBFINDER_BIN", default_value = "subfinder")]
    pub subfinder_bin: String,

    /// Per-source discovery timeout in seconds
    #[arg(long, global = true, env = "SUBFINDER_TIMEOUT", default_value_t = 45)]
    pub source_timeout: u64,

    /// Per-host probe timeout in milliseconds (at least 1000)
    #[arg(long, global = true, default_value_t = 4_000)]
    pub timeout_ms: u64,

    /// Hosts per probe batch
    #[arg(long, global = true, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Monitor poll period in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub poll_secs: u64,

    /// Less output; repeat for even less
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover and probe the subdomains of a domain
    #[command(alias = "s")]
    Scan {
        domain: String,

        /// Skip the reachability probe
        #[arg(long)]
        no_probe: bool,
    },
    /// Show stored scans
    #[command(alias = "h")]
    History { domain: Option<String> },
    /// Turn monitoring of a domain on or off
    #[command(alias = "m")]
    Monitor {
        domain: String,

        #[arg(long, conflicts_with = "disable", required_unless_present = "disable")]
        enable: bool,

        #[arg(long)]
        disable: bool,

        /// Rescan interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Print monitoring events as they arrive, until Ctrl-C
    #[command(alias = "w")]
    Watch {
        domains: Vec<String>,

        /// Rescan interval in seconds for the in-process monitor
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Delete all stored scans
    Clear,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        let g: &GlobalArgs = &self.global;
        let mut cfg = Config {
            batch_size: g.batch_size,
            probe_timeout: Duration::from_millis(g.timeout_ms),
            source_timeout: Duration::from_secs(g.source_timeout),
            poll_interval: Duration::from_secs(g.poll_secs),
            subfinder_bin: g.subfinder_bin.clone(),
            state_file: g.state.clone(),
            monitor_url: g.monitor_url.clone(),
            quiet: g.quiet,
            ..Config::default()
        };

        match &self.command {
            Commands::Scan { no_probe, .. } => cfg.no_probe = *no_probe,
            Commands::Monitor {
                interval: Some(secs),
                ..
            }
            | Commands::Watch {
                interval: Some(secs),
                ..
            } => cfg.monitor_interval = Duration::from_secs(*secs),
            _ => {}
        }
        cfg
    }
}
