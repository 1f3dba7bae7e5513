use colored::*;
use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICK_STRINGS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICK_STRINGS)
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg} [{bar:24.green/white}] {pos}/{len} batches")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(TICK_STRINGS)
        .progress_chars("█▓░")
}

/// Spinner shown while the discovery sources are queried. The bar lives as
/// long as the returned span.
pub fn discovery(domain: &str) -> Span {
    let span = info_span!("discovery", indicatif.pb_show = true);
    span.pb_set_style(&spinner_style());
    span.pb_set_message(&format!("Querying sources for {}...", domain.green().bold()));
    span.pb_start();
    span
}

/// Bar counting finished probe batches.
pub fn enrichment(batches: usize) -> Span {
    let span = info_span!("enrichment", indicatif.pb_show = true);
    span.pb_set_style(&bar_style());
    span.pb_set_length(batches as u64);
    span.pb_set_message("Probing hosts");
    span.pb_start();
    span
}

pub fn report_probe_progress(span: &Span, probed: usize, total: usize) {
    span.pb_inc(1);
    span.pb_set_message(&format!(
        "Probed {} of {} hosts",
        probed.to_string().green().bold(),
        total
    ));
}

/// Idle spinner for long-running watches.
pub fn waiting(msg: &str) -> Span {
    let span = info_span!("watch", indicatif.pb_show = true);
    span.pb_set_style(&spinner_style());
    span.pb_set_message(msg);
    span.pb_start();
    span
}
