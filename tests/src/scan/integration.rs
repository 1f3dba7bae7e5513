use subtrack_common::error::ScanError;
use subtrack_common::models::{Health, StatusClass};

use crate::fakes::*;

/// The certificate, archive and finder sources overlap; the merged answer is
/// deduplicated and sorted.
#[tokio::test]
async fn three_sources_merge_into_one_sorted_set() {
    let cfg = test_config();
    let h = harness(
        vec![
            FakeSource::answering("certificates", &["a.example.com", "example.com"]),
            FakeSource::answering("archive", &["b.example.com"]),
            FakeSource::answering("finder", &["a.example.com", "c.example.com"]),
        ],
        &cfg,
    );

    let session = h.engine.run_scan("example.com").await.unwrap();
    assert_eq!(
        session.results().to_vec(),
        hosts(&["a.example.com", "b.example.com", "c.example.com", "example.com"])
    );
    assert!(session.new_hosts().is_empty(), "nothing is new without a baseline");
    session.finish().await;
}

#[tokio::test]
async fn foreign_and_malformed_entries_never_reach_the_result() {
    let cfg = test_config();
    let h = harness(
        vec![FakeSource::answering(
            "noisy",
            &[
                "example.com.evil.com",
                "notexample.com",
                "  WWW.Example.com. ",
                "*.api.example.com",
                "bad host.example.com",
                "",
            ],
        )],
        &cfg,
    );

    let session = h.engine.run_scan("example.com").await.unwrap();
    assert_eq!(
        session.results().to_vec(),
        hosts(&["api.example.com", "www.example.com"])
    );
}

#[tokio::test]
async fn every_source_failing_exhausts_the_aggregation() {
    let cfg = test_config();
    let h = harness(
        vec![
            FakeSource::failing("certificates"),
            FakeSource::hanging("archive"),
            FakeSource::answering("finder", &["unrelated.org"]),
        ],
        &cfg,
    );

    let result = h.engine.run_scan("example.com").await;
    assert!(matches!(
        result,
        Err(ScanError::AggregationExhausted { ref domain }) if domain == "example.com"
    ));
    assert!(h.engine.history().await.is_empty());
}

#[tokio::test]
async fn one_surviving_source_is_enough() {
    let cfg = test_config();
    let h = harness(
        vec![
            FakeSource::failing("certificates"),
            FakeSource::hanging("archive"),
            FakeSource::answering("finder", &["c.example.com", "c.example.com"]),
        ],
        &cfg,
    );

    let session = h.engine.run_scan("example.com").await.unwrap();
    assert_eq!(session.results().to_vec(), hosts(&["c.example.com"]));
}

#[tokio::test]
async fn invalid_domain_is_rejected_before_any_source_is_asked() {
    let cfg = test_config();
    let source = FakeSource::answering("finder", &["a.example.com"]);
    let h = harness(vec![source.clone()], &cfg);

    for input in ["", "*", "localhost", "exa mple.com"] {
        let result = h.engine.run_scan(input).await;
        assert!(
            matches!(result, Err(ScanError::ValidationRejected { .. })),
            "{input:?} should be rejected"
        );
    }
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn unchanged_upstream_gives_identical_results() {
    let cfg = test_config();
    let h = harness(
        vec![FakeSource::answering("finder", &["b.example.com", "a.example.com"])],
        &cfg,
    );

    let first = h.engine.run_scan("example.com").await.unwrap().finish().await;
    let second = h.engine.run_scan("example.com").await.unwrap().finish().await;
    assert_eq!(first.subdomains(), second.subdomains());
    assert_ne!(first.id(), second.id());
}

#[tokio::test]
async fn not_found_is_a_warning_and_a_stalled_probe_is_no_response() {
    let cfg = subtrack_common::config::Config {
        batch_size: 1,
        ..test_config()
    };
    let h = harness(
        vec![FakeSource::answering("finder", &["a.example.com", "b.example.com"])],
        &cfg,
    );
    h.prober.rule("a.example.com", ProbeRule::Status(404));
    h.prober.rule("b.example.com", ProbeRule::Stall);

    let record = h.engine.run_scan("example.com").await.unwrap().finish().await;

    let a = &record.metadata()[&host("a.example.com")];
    assert_eq!(a.status_class(), StatusClass::ClientError);
    assert_eq!(a.status_class().health(), Health::Warn);

    let b = &record.metadata()[&host("b.example.com")];
    assert_eq!(b.status_class(), StatusClass::NoResponse);
    assert_eq!(b.status_class().health(), Health::Unknown);
    assert!(b.error.is_some());
}

#[tokio::test]
async fn silent_host_leaves_its_batch_neighbours_answered() {
    let cfg = test_config();
    let h = harness(
        vec![FakeSource::answering(
            "finder",
            &["a.example.com", "b.example.com", "c.example.com"],
        )],
        &cfg,
    );
    h.prober.rule("a.example.com", ProbeRule::Status(404));
    h.prober.rule("b.example.com", ProbeRule::Silent);

    let mut session = h.engine.run_scan("example.com").await.unwrap();
    assert_eq!(session.batch_count(), 1);
    let first = session.next_update().await.unwrap();
    assert_eq!(first.len(), 3);
    let record = session.finish().await;

    let a = &record.metadata()[&host("a.example.com")];
    assert_eq!(a.status_class(), StatusClass::ClientError);

    let b = &record.metadata()[&host("b.example.com")];
    assert_eq!(b.status_class(), StatusClass::NoResponse);
    assert!(b.error.is_some());

    let c = &record.metadata()[&host("c.example.com")];
    assert_eq!(c.status_code, Some(200));
    assert_eq!(c.status_class().health(), Health::Up);
}

#[tokio::test]
async fn sixty_hosts_probe_in_three_batches_streamed_one_by_one() {
    let cfg = test_config();
    let names: Vec<String> = (0..60).map(|i| format!("h{i:02}.example.com")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let h = harness(vec![FakeSource::answering("finder", &refs)], &cfg);

    let mut session = h.engine.run_scan("example.com").await.unwrap();
    assert_eq!(session.batch_count(), 3);

    let mut updates = 0;
    let mut seen = 0;
    while let Some(records) = session.next_update().await {
        updates += 1;
        seen += records.len();
    }
    assert_eq!(updates, 3);
    assert_eq!(seen, 60);
    assert_eq!(h.prober.batches(), 3);

    let record = session.finish().await;
    assert!(record.metadata().values().all(|r| r.status_code == Some(200)));
}

#[tokio::test]
async fn failed_batch_leaves_only_its_hosts_unknown() {
    let cfg = subtrack_common::config::Config {
        batch_size: 2,
        ..test_config()
    };
    let h = harness(
        vec![FakeSource::answering(
            "finder",
            &["a.example.com", "b.example.com", "c.example.com", "d.example.com"],
        )],
        &cfg,
    );
    h.prober.rule("c.example.com", ProbeRule::Fail);

    let record = h.engine.run_scan("example.com").await.unwrap().finish().await;
    let status = |name: &str| record.metadata()[&host(name)].status_code;

    assert_eq!(status("a.example.com"), Some(200));
    assert_eq!(status("b.example.com"), Some(200));
    assert_eq!(status("c.example.com"), None);
    assert_eq!(status("d.example.com"), None);
}

#[tokio::test]
async fn a_failed_rerun_never_shows_stale_metadata() {
    let cfg = test_config();
    let h = harness(vec![FakeSource::answering("finder", &["a.example.com"])], &cfg);

    let first = h.engine.run_scan("example.com").await.unwrap().finish().await;
    assert_eq!(first.metadata()[&host("a.example.com")].status_code, Some(200));

    h.prober.rule("a.example.com", ProbeRule::Fail);
    let second = h.engine.run_scan("example.com").await.unwrap().finish().await;
    assert_eq!(second.metadata()[&host("a.example.com")].status_code, None);

    let board = h.engine.metadata_for(&host("example.com")).await;
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].status_code, None);
}

#[tokio::test]
async fn skipping_the_probe_keeps_every_host_unknown() {
    let cfg = subtrack_common::config::Config {
        no_probe: true,
        ..test_config()
    };
    let h = harness(vec![FakeSource::answering("finder", &["a.example.com"])], &cfg);

    let session = h.engine.run_scan("example.com").await.unwrap();
    assert_eq!(session.batch_count(), 0);
    let record = session.finish().await;

    assert_eq!(h.prober.batches(), 0);
    assert_eq!(record.metadata()[&host("a.example.com")].status_code, None);
}
