use anyhow::bail;
use colored::*;
use subtrack_common::config::Config;
use subtrack_common::hostname::Hostname;
use subtrack_common::models::Event;
use subtrack_common::{info, success, warn};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::Runtime;
use crate::terminal::{colors, print, spinner};

pub async fn watch(raw_domains: &[String], runtime: &Runtime, cfg: &Config) -> anyhow::Result<()> {
    let domains: Vec<Hostname> = raw_domains
        .iter()
        .map(|raw| Hostname::parse_domain(raw))
        .collect::<Result<_, _>>()?;

    let mut scheduler: Option<JoinHandle<()>> = None;
    if let Some(local) = &runtime.local_monitor {
        if domains.is_empty() {
            bail!("name at least one domain to watch without --monitor-url");
        }
        for domain in &domains {
            runtime.engine.toggle_monitoring(domain, true).await?;
        }
        let every = cfg.poll_interval;
        scheduler = Some(tokio::spawn(local.clone().run(every)));
        info!(
            "Rescanning {} domains every {}s",
            domains.len(),
            cfg.monitor_interval.as_secs()
        );
    }

    let mut events = runtime.engine.subscribe();
    let poller: JoinHandle<()> = runtime.engine.spawn_poller(domains);
    let waiting = spinner::waiting("Waiting for new assets (Ctrl-C to stop)");

    let mut seen: usize = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(event) => {
                    seen += 1;
                    print_event(&event, cfg);
                }
                Err(RecvError::Lagged(skipped)) => warn!("{} events skipped while busy", skipped),
                Err(RecvError::Closed) => break,
            },
        }
    }

    drop(waiting);
    poller.abort();
    if let Some(scheduler) = scheduler {
        scheduler.abort();
    }

    success!("Stopped watching after {} events", seen);
    Ok(())
}

fn print_event(event: &Event, cfg: &Config) {
    let count: ColoredString = format!("{} new", event.count).color(colors::NEW_HOST).bold();
    success!(
        "{} on {} at {}",
        count,
        event.domain,
        event.timestamp.format("%H:%M:%S")
    );

    if cfg.quiet > 0 {
        return;
    }
    for host in &event.new_subdomains {
        print::print_status(host.as_str().color(colors::HOSTNAME).to_string());
    }
}
