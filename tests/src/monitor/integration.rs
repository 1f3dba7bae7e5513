use std::sync::Arc;
use std::time::{Duration, Instant};

use subtrack_common::error::MonitorError;
use subtrack_common::models::Event;
use subtrack_common::ports::MonitorBackend;
use subtrack_core::monitor::TickOutcome;
use subtrack_core::MonitorPoller;
use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::fakes::*;

const WAIT: Duration = Duration::from_secs(2);

fn new_assets(names: &[&str]) -> Event {
    Event::new_assets(host("example.com"), hosts(names))
}

#[tokio::test]
async fn enabling_seeds_from_history_and_later_scans_highlight_only_new_hosts() {
    let cfg = test_config();
    let source = FakeSource::answering("finder", &["a.example.com", "b.example.com"]);
    let h = harness(vec![source.clone()], &cfg);
    let domain = host("example.com");

    h.engine.run_scan("example.com").await.unwrap().finish().await;

    let baseline = h.engine.toggle_monitoring(&domain, true).await.unwrap();
    assert!(baseline.enabled);
    assert_eq!(
        baseline.last_results.to_vec(),
        hosts(&["a.example.com", "b.example.com"])
    );
    assert!(baseline.last_new.is_empty());

    source.answer(&["a.example.com", "b.example.com", "z.example.com"]);
    let session = h.engine.run_scan("example.com").await.unwrap();
    assert_eq!(session.new_hosts().to_vec(), hosts(&["z.example.com"]));
    session.finish().await;

    let moved = h.engine.baseline_for(&domain).await.unwrap();
    assert_eq!(moved.last_new.to_vec(), hosts(&["z.example.com"]));
    assert!(moved.last_results.contains(&host("z.example.com")));

    let again = h.engine.run_scan("example.com").await.unwrap();
    assert!(again.new_hosts().is_empty());
}

#[tokio::test]
async fn superseded_scan_finishing_late_cannot_roll_the_baseline_back() {
    let cfg = test_config();
    let source = FakeSource::answering("finder", &["a.example.com"]);
    let h = harness(vec![source.clone()], &cfg);
    let domain = host("example.com");

    h.engine.run_scan("example.com").await.unwrap().finish().await;
    h.engine.toggle_monitoring(&domain, true).await.unwrap();

    let stale = h.engine.run_scan("example.com").await.unwrap();
    source.answer(&["a.example.com", "z.example.com"]);
    let fresh = h.engine.run_scan("example.com").await.unwrap();
    assert_eq!(fresh.new_hosts().to_vec(), hosts(&["z.example.com"]));

    fresh.finish().await;
    stale.finish().await;

    let baseline = h.engine.baseline_for(&domain).await.unwrap();
    assert!(baseline.last_results.contains(&host("z.example.com")));
    assert_eq!(baseline.last_new.to_vec(), hosts(&["z.example.com"]));

    let again = h.engine.run_scan("example.com").await.unwrap();
    assert!(again.new_hosts().is_empty(), "z.example.com must not resurface");
    again.finish().await;

    let history = h.engine.history_for(&domain).await.unwrap();
    assert_eq!(history.scans().len(), 4);
}

#[tokio::test]
async fn disabled_monitoring_highlights_nothing() {
    let cfg = test_config();
    let source = FakeSource::answering("finder", &["a.example.com"]);
    let h = harness(vec![source.clone()], &cfg);
    let domain = host("example.com");

    h.engine.run_scan("example.com").await.unwrap().finish().await;
    h.engine.toggle_monitoring(&domain, true).await.unwrap();
    h.engine.toggle_monitoring(&domain, false).await.unwrap();

    source.answer(&["a.example.com", "z.example.com"]);
    let session = h.engine.run_scan("example.com").await.unwrap();
    assert!(session.new_hosts().is_empty());
    session.finish().await;

    let kept = h.engine.baseline_for(&domain).await.unwrap();
    assert!(!kept.enabled);
    assert!(!kept.last_results.contains(&host("z.example.com")));
}

#[tokio::test]
async fn failed_toggle_leaves_the_mirror_untouched() {
    let cfg = test_config();
    let h = harness(vec![FakeSource::answering("finder", &["a.example.com"])], &cfg);
    let domain = host("example.com");

    h.monitor.set_down(true);
    let result = h.engine.toggle_monitoring(&domain, true).await;
    assert!(matches!(result, Err(MonitorError::Transient(_))));
    assert!(h.engine.baseline_for(&domain).await.is_none());

    h.monitor.set_down(false);
    assert!(h.engine.toggle_monitoring(&domain, true).await.is_ok());
    assert!(h.engine.baseline_for(&domain).await.is_some());
}

#[tokio::test]
async fn sync_pulls_the_backend_view_into_the_mirror() {
    let cfg = test_config();
    let h = harness(vec![FakeSource::answering("finder", &["a.example.com"])], &cfg);
    let domain = host("example.com");

    assert!(h.engine.sync_monitoring(&domain).await.unwrap().is_none());

    h.monitor
        .set_status(&domain, true, Duration::from_secs(600))
        .await
        .unwrap();
    let synced = h.engine.sync_monitoring(&domain).await.unwrap().unwrap();
    assert_eq!(synced.interval(), Duration::from_secs(600));
    assert!(h.engine.baseline_for(&domain).await.unwrap().enabled);
}

#[tokio::test]
async fn poller_survives_an_outage_without_losing_or_repeating_events() {
    let monitor = FakeMonitor::new();
    let (tx, mut rx) = broadcast::channel(16);
    let mut poller = MonitorPoller::new(
        monitor.clone() as Arc<dyn MonitorBackend>,
        tx,
        Duration::from_secs(30),
    );

    monitor.publish(new_assets(&["a.example.com"]));
    assert_eq!(poller.tick().await, TickOutcome::Delivered(1));

    monitor.set_down(true);
    monitor.publish(new_assets(&["b.example.com"]));
    assert_eq!(poller.tick().await, TickOutcome::Skipped);
    assert_eq!(poller.cursor().unwrap().as_str(), "1");

    monitor.set_down(false);
    assert_eq!(poller.tick().await, TickOutcome::Delivered(1));
    assert_eq!(poller.tick().await, TickOutcome::Delivered(0));

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.new_subdomains, hosts(&["a.example.com"]));
    assert_eq!(second.new_subdomains, hosts(&["b.example.com"]));
    assert!(rx.try_recv().is_err());
    assert_eq!(monitor.polls(), 4);
}

#[tokio::test]
async fn engine_poller_streams_events_to_subscribers() {
    let cfg = test_config();
    let h = harness(vec![FakeSource::answering("finder", &["a.example.com"])], &cfg);

    let mut events = h.engine.subscribe();
    let poller = h.engine.spawn_poller(vec![host("example.com")]);

    h.monitor.publish(new_assets(&["z.example.com"]));
    h.monitor.publish(Event::new_assets(
        host("example.org"),
        hosts(&["x.example.org"]),
    ));
    h.monitor.publish(new_assets(&["y.example.com", "w.example.com"]));

    let first = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    let second = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert_eq!(first.count, 1);
    assert_eq!(second.count, 2);
    assert_eq!(second.domain, host("example.com"));

    poller.abort();
}

#[tokio::test]
async fn local_monitor_detects_new_assets_end_to_end() {
    let cfg = test_config();
    let source = FakeSource::answering("finder", &["a.example.com"]);
    let (engine, local) = local_harness(vec![source.clone()], &cfg);
    let domain = host("example.com");

    engine.toggle_monitoring(&domain, true).await.unwrap();

    let start = Instant::now();
    assert_eq!(local.check_due(start).await, 0, "first check only seeds");

    source.answer(&["a.example.com", "z.example.com"]);
    assert_eq!(local.check_due(start + Duration::from_secs(61)).await, 1);

    let mut events = engine.subscribe();
    let poller = engine.spawn_poller(vec![domain.clone()]);

    let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert_eq!(event.domain, domain);
    assert_eq!(event.new_subdomains, hosts(&["z.example.com"]));

    let status = engine.sync_monitoring(&domain).await.unwrap().unwrap();
    assert_eq!(status.last_new.to_vec(), hosts(&["z.example.com"]));

    poller.abort();
}
