use colored::*;
use subtrack_common::config::Config;
use subtrack_common::hostname::Hostname;
use subtrack_common::models::{DomainHistory, HistoryStats, ScanRecord};
use subtrack_common::warn;
use subtrack_core::Engine;

use crate::mprint;
use crate::terminal::{colors, format, print};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub async fn history(domain: Option<&str>, engine: &Engine, cfg: &Config) -> anyhow::Result<()> {
    match domain {
        Some(raw) => {
            let domain: Hostname = Hostname::parse_domain(raw)?;
            match engine.history_for(&domain).await {
                Some(history) => print_domain(&history, cfg),
                None => warn!("No scans stored for {}", domain),
            }
        }
        None => {
            let all: Vec<DomainHistory> = engine.history().await;
            if all.is_empty() {
                warn!("History is empty");
                return Ok(());
            }
            for (idx, history) in all.iter().enumerate() {
                print_overview(idx, history);
            }
        }
    }

    print_stats(engine.stats().await, cfg);
    Ok(())
}

fn print_overview(idx: usize, history: &DomainHistory) {
    print::tree_head(idx, history.domain.as_str());
    let mut details: Vec<format::Detail> = vec![
        ("Scans".to_string(), history.scans().len().to_string().normal()),
        (
            "Hosts".to_string(),
            history.total_subdomains().to_string().green().bold(),
        ),
    ];
    if let Some(first) = history.first_scan_time() {
        details.push(("First".to_string(), first.format(TIME_FORMAT).to_string().normal()));
    }
    if let Some(last) = history.last_scan_time() {
        details.push(("Last".to_string(), last.format(TIME_FORMAT).to_string().normal()));
    }
    print::as_tree_one_level(details);
}

fn print_domain(history: &DomainHistory, cfg: &Config) {
    for (idx, scan) in history.scans().iter().enumerate() {
        print_scan(idx, scan);
        if cfg.quiet == 0 {
            mprint!();
        }
    }
}

fn print_scan(idx: usize, scan: &ScanRecord) {
    let when: String = scan.timestamp().format(TIME_FORMAT).to_string();
    print::tree_head(idx, &when);

    let up: usize = scan
        .metadata()
        .values()
        .filter(|record| record.status_code.is_some())
        .count();

    print::as_tree_one_level(vec![
        ("Id".to_string(), scan.id().to_string().color(colors::SEPARATOR)),
        ("Hosts".to_string(), scan.count().to_string().green().bold()),
        ("Answered".to_string(), up.to_string().normal()),
    ]);
}

fn print_stats(stats: HistoryStats, cfg: &Config) {
    if cfg.quiet > 0 {
        return;
    }
    mprint!();
    print::set_key_width(["Domains", "Scans", "Subdomains"]);
    print::aligned_line("Domains", stats.total_domains.to_string());
    print::aligned_line("Scans", stats.total_scans.to_string());
    print::aligned_line("Subdomains", stats.total_subdomains.to_string());
}
