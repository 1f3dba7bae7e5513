use subtrack_common::models::HistoryStats;

use crate::fakes::*;

#[tokio::test]
async fn scans_accumulate_per_domain_and_fold_into_stats() {
    let cfg = test_config();
    let source = FakeSource::answering("finder", &["a.example.com", "example.org"]);
    let h = harness(vec![source.clone()], &cfg);

    h.engine.run_scan("example.com").await.unwrap().finish().await;
    source.answer(&["a.example.com", "b.example.com"]);
    h.engine.run_scan("example.com").await.unwrap().finish().await;
    source.answer(&["www.example.org"]);
    h.engine.run_scan("example.org").await.unwrap().finish().await;

    let com = h.engine.history_for(&host("example.com")).await.unwrap();
    assert_eq!(com.scans().len(), 2);
    assert_eq!(com.scans()[0].count(), 1);
    assert_eq!(com.total_subdomains(), 2);
    assert!(com.first_scan_time() <= com.last_scan_time());

    assert_eq!(
        h.engine.stats().await,
        HistoryStats {
            total_domains: 2,
            total_scans: 3,
            total_subdomains: 3,
        }
    );
}

#[tokio::test]
async fn clearing_empties_memory_and_storage() {
    let cfg = test_config();
    let store = SharedStore::default();
    let h = harness_with_store(
        vec![FakeSource::answering("finder", &["a.example.com"])],
        &cfg,
        Box::new(store.clone()),
    );

    h.engine.run_scan("example.com").await.unwrap().finish().await;
    h.engine.clear_history().await;

    assert!(h.engine.history().await.is_empty());
    assert_eq!(h.engine.stats().await, HistoryStats::default());

    let reopened = harness_with_store(vec![FakeSource::answering("finder", &[])], &cfg, Box::new(store));
    assert!(reopened.engine.history().await.is_empty());
}

#[tokio::test]
async fn refused_writes_cost_durability_but_not_the_scan() {
    let cfg = test_config();
    let h = harness_with_store(
        vec![FakeSource::answering("finder", &["a.example.com"])],
        &cfg,
        Box::new(QuotaExceeded),
    );

    let record = h.engine.run_scan("example.com").await.unwrap().finish().await;

    let history = h.engine.history_for(&host("example.com")).await.unwrap();
    assert_eq!(history.latest().map(|scan| scan.id()), Some(record.id()));

    h.engine.clear_history().await;
    assert!(h.engine.history().await.is_empty());
}

#[tokio::test]
async fn history_survives_a_restart() {
    let cfg = test_config();
    let store = SharedStore::default();

    let first = harness_with_store(
        vec![FakeSource::answering("finder", &["a.example.com", "b.example.com"])],
        &cfg,
        Box::new(store.clone()),
    );
    let record = first.engine.run_scan("example.com").await.unwrap().finish().await;
    assert_eq!(store.saves(), 1);
    drop(first);

    let second = harness_with_store(vec![FakeSource::answering("finder", &[])], &cfg, Box::new(store));
    let restored = second.engine.history_for(&host("example.com")).await.unwrap();
    assert_eq!(restored.latest(), Some(&record));
    assert_eq!(
        restored.latest().unwrap().metadata()[&host("a.example.com")].status_code,
        Some(200)
    );
}
