use anyhow::bail;
use colored::*;
use subtrack_common::config::Config;
use subtrack_common::hostname::Hostname;
use subtrack_common::models::MonitorBaseline;
use subtrack_common::{error, success};
use subtrack_core::Engine;

use crate::terminal::{colors, print};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Toggles monitoring on the remote service. The in-process monitor only
/// lives as long as `watch` runs, so there is nothing to toggle without one.
pub async fn monitor(raw_domain: &str, enable: bool, engine: &Engine, cfg: &Config) -> anyhow::Result<()> {
    if cfg.monitor_url.is_none() {
        bail!("no monitoring service configured; pass --monitor-url or use `subtrack watch`");
    }
    let domain: Hostname = Hostname::parse_domain(raw_domain)?;

    let baseline: MonitorBaseline = match engine.toggle_monitoring(&domain, enable).await {
        Ok(baseline) => baseline,
        Err(err) => {
            error!("Monitoring of {} unchanged: {}", domain, err);
            return Err(err.into());
        }
    };

    let state: ColoredString = if baseline.enabled {
        "enabled".green().bold()
    } else {
        "disabled".yellow().bold()
    };
    success!("Monitoring {} for {}", state, domain);

    if cfg.quiet == 0 {
        print_baseline(&baseline);
    }
    Ok(())
}

fn print_baseline(baseline: &MonitorBaseline) {
    print::set_key_width(["Interval", "Baseline", "Last new", "Updated"]);
    print::aligned_line("Interval", format!("{}s", baseline.interval_secs));
    print::aligned_line("Baseline", format!("{} hosts", baseline.last_results.len()));
    print::aligned_line(
        "Last new",
        baseline.last_new.len().to_string().color(colors::NEW_HOST),
    );
    print::aligned_line("Updated", baseline.updated_at.format(TIME_FORMAT).to_string());
}
