use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use colored::*;
use subtrack_common::config::Config;
use subtrack_common::hostname::Hostname;
use subtrack_common::models::ScanRecord;
use subtrack_common::{error, success, warn};
use subtrack_core::{Engine, ScanSession};

use crate::mprint;
use crate::terminal::{colors, format, print, spinner};

pub async fn scan(domain: &str, engine: &Engine, cfg: &Config) -> anyhow::Result<()> {
    let start_time: Instant = Instant::now();

    if cfg.monitor_url.is_some() {
        sync_baseline(domain, engine).await;
    }

    let discovery = spinner::discovery(domain);
    let outcome = engine.run_scan(domain).await;
    drop(discovery);

    let session: ScanSession = match outcome {
        Ok(session) => session,
        Err(err) => {
            error!("{err}");
            print::no_results();
            return Err(err.into());
        }
    };

    announce_results(&session, cfg);

    let new_hosts: BTreeSet<Hostname> = session.new_hosts().iter().cloned().collect();
    let record: ScanRecord = if session.batch_count() == 0 {
        list_unprobed(&session, &new_hosts, cfg);
        session.finish().await
    } else {
        probe_progressively(session, &new_hosts, cfg).await
    };

    print_summary(&record, new_hosts.len(), start_time.elapsed(), cfg);
    Ok(())
}

/// Pulls the remote baseline so new hosts can be highlighted. A failure only
/// costs the highlighting.
async fn sync_baseline(domain: &str, engine: &Engine) {
    let Ok(domain) = Hostname::parse_domain(domain) else {
        return;
    };
    if let Err(err) = engine.sync_monitoring(&domain).await {
        warn!("Monitoring status unavailable: {}", err);
    }
}

fn announce_results(session: &ScanSession, cfg: &Config) {
    let total: ColoredString = format!("{} hosts", session.results().len()).green().bold();
    success!("Found {} for {}", total, session.domain());

    if !session.new_hosts().is_empty() {
        let new: ColoredString = format!("{} new", session.new_hosts().len())
            .color(colors::NEW_HOST)
            .bold();
        warn!("{} since the monitoring baseline", new);
    }

    if cfg.quiet == 0 {
        mprint!();
    }
}

fn list_unprobed(session: &ScanSession, new_hosts: &BTreeSet<Hostname>, cfg: &Config) {
    if cfg.quiet > 1 {
        return;
    }
    for host in session.results() {
        let mut line: String = host.as_str().color(colors::HOSTNAME).to_string();
        if new_hosts.contains(host) {
            line.push_str(&format!(" {}", "NEW".color(colors::NEW_HOST).bold()));
        }
        print::print_status(line);
    }
}

async fn probe_progressively(
    mut session: ScanSession,
    new_hosts: &BTreeSet<Hostname>,
    cfg: &Config,
) -> ScanRecord {
    let total: usize = session.results().len();
    let progress = spinner::enrichment(session.batch_count());
    let mut probed: usize = 0;

    while let Some(records) = session.next_update().await {
        probed += records.len();
        spinner::report_probe_progress(&progress, probed, total);

        if cfg.quiet > 1 {
            continue;
        }
        for record in &records {
            print::print_status(format::record_line(record, new_hosts.contains(&record.host)));
        }
    }
    drop(progress);

    session.finish().await
}

fn print_summary(record: &ScanRecord, new_count: usize, total_time: Duration, cfg: &Config) {
    let summary = format::health_summary(record.metadata().values());

    if cfg.quiet == 0 {
        mprint!();
        print::header("summary", cfg.quiet);

        let mut details: Vec<format::Detail> = summary
            .iter()
            .map(|(health, count)| {
                let value: ColoredString =
                    count.to_string().color(format::health_color(*health)).bold();
                (format::health_label(*health).to_string(), value)
            })
            .collect();
        details.push(("New".to_string(), new_count.to_string().color(colors::NEW_HOST)));
        print::tree_head(0, record.domain().as_str());
        print::as_tree_one_level(details);
        print::fat_separator();
    }

    let hosts: ColoredString = format!("{} hosts", record.count()).bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: ColoredString =
        format!("Scan Complete: {hosts} recorded in {total_time}").color(colors::TEXT_DEFAULT);

    match cfg.quiet {
        0 => print::centerln(&output),
        _ => success!("{}", output),
    }
}
