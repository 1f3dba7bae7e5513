use subtrack_common::success;
use subtrack_core::Engine;

pub async fn clear(engine: &Engine) -> anyhow::Result<()> {
    let before = engine.stats().await;
    engine.clear_history().await;
    success!(
        "Cleared {} scans across {} domains",
        before.total_scans,
        before.total_domains
    );
    Ok(())
}
